//! Speech-recognition messages: capture events and decoder tuning.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ffi::types::{CAsrModelParameters, CTextCapturedMessage};
use crate::ffi::{read_opt_string, read_string};

/// Text the ASR decoded from the audio stream. Delivered both as the final
/// capture of a listening phase and, when partial text is enabled, as
/// intermediate hypotheses along the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextCapturedMessage {
    pub text: String,
    /// Decoder confidence in `[0, 1]`.
    pub likelihood: f32,
    /// Length of the captured audio.
    pub seconds: f32,
    pub site_id: String,
    pub session_id: Option<String>,
}

impl TextCapturedMessage {
    pub(crate) unsafe fn from_c(raw: &CTextCapturedMessage) -> Result<Self> {
        Ok(Self {
            text: read_string(raw.text)?,
            likelihood: raw.likelihood,
            seconds: raw.seconds,
            site_id: read_string(raw.site_id)?,
            session_id: read_opt_string(raw.session_id),
        })
    }
}

/// Decoder tuning knobs. Unset fields keep the engine's built-in defaults;
/// on the wire they travel as the -1 / -1.0 sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsrModelParameters {
    pub beam_size: Option<u32>,
    pub lm_weight: Option<f32>,
    pub endpointing_ms: Option<u32>,
}

impl AsrModelParameters {
    pub(crate) fn to_c(self) -> CAsrModelParameters {
        CAsrModelParameters {
            beam_size: self.beam_size.map_or(-1, |v| v as i32),
            lm_weight: self.lm_weight.unwrap_or(-1.0),
            endpointing_ms: self.endpointing_ms.map_or(-1, |v| v as i32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_parameters_encode_as_sentinels() {
        let raw = AsrModelParameters::default().to_c();
        assert_eq!(raw.beam_size, -1);
        assert_eq!(raw.lm_weight, -1.0);
        assert_eq!(raw.endpointing_ms, -1);
    }

    #[test]
    fn set_parameters_encode_verbatim() {
        let raw = AsrModelParameters {
            beam_size: Some(8),
            lm_weight: Some(0.7),
            endpointing_ms: Some(350),
        }
        .to_c();
        assert_eq!(raw.beam_size, 8);
        assert_eq!(raw.lm_weight, 0.7);
        assert_eq!(raw.endpointing_ms, 350);
    }
}
