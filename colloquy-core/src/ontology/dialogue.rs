//! Dialogue control messages: session start / continue / end requests and the
//! session lifecycle events the engine reports back.
//!
//! Request types expose `with_c_repr`, which materializes the C form, runs the
//! caller's body against a pointer that is valid only inside the closure, and
//! tears every foreign allocation down when the bracket exits. The `from_c`
//! decoders are also used by the in-tree stub engine to snapshot what a test
//! actually sent over the wire.

use std::os::raw::{c_char, c_int, c_void};

use serde::{Deserialize, Serialize};

use crate::error::{ColloquyError, Result};
use crate::ffi::types::*;
use crate::ffi::{
    opt_array_ptr, read_opt_string, read_string, read_string_array, BoxedGuard, CStringArrayGuard,
    CStringGuard, PtrArrayGuard,
};

// ---------------------------------------------------------------------------
// Session initialization
// ---------------------------------------------------------------------------

/// How a new session opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionInit {
    /// Interactive session: optionally speak `text`, then listen for an
    /// intent. A null filter means every intent may answer; an empty filter
    /// rejects all of them.
    #[serde(rename_all = "camelCase")]
    Action {
        text: Option<String>,
        intent_filter: Option<Vec<String>>,
        can_be_enqueued: bool,
        send_intent_not_recognized: bool,
    },
    /// Speak `text` and end the session, no listening phase.
    #[serde(rename_all = "camelCase")]
    Notification { text: String },
}

/// Encoded form of a [`SessionInit`]; owns every nested allocation.
pub(crate) struct SessionInitGuard {
    pub(crate) init_type: c_int,
    pub(crate) value: *const c_void,
    _text: Option<CStringGuard>,
    _filter: Option<CStringArrayGuard>,
    _action: Option<BoxedGuard<CActionSessionInit>>,
}

impl SessionInit {
    pub(crate) fn to_c_guard(&self) -> Result<SessionInitGuard> {
        match self {
            Self::Action {
                text,
                intent_filter,
                can_be_enqueued,
                send_intent_not_recognized,
            } => {
                let text = CStringGuard::new(text.as_deref())?;
                let filter = match intent_filter {
                    Some(filter) => Some(CStringArrayGuard::new(filter)?),
                    None => None,
                };
                let action = BoxedGuard::new(CActionSessionInit {
                    text: text.as_ptr(),
                    intent_filter: opt_array_ptr(&filter),
                    can_be_enqueued: u8::from(*can_be_enqueued),
                    send_intent_not_recognized: u8::from(*send_intent_not_recognized),
                });
                Ok(SessionInitGuard {
                    init_type: SESSION_INIT_TYPE_ACTION,
                    value: action.as_ptr() as *const c_void,
                    _text: Some(text),
                    _filter: filter,
                    _action: Some(action),
                })
            }
            Self::Notification { text } => {
                let text = CStringGuard::new(Some(text))?;
                Ok(SessionInitGuard {
                    init_type: SESSION_INIT_TYPE_NOTIFICATION,
                    value: text.as_ptr() as *const c_void,
                    _text: Some(text),
                    _filter: None,
                    _action: None,
                })
            }
        }
    }

    pub(crate) unsafe fn from_c(raw: &CSessionInit) -> Result<Self> {
        match raw.init_type {
            SESSION_INIT_TYPE_ACTION => {
                if raw.value.is_null() {
                    return Err(ColloquyError::Protocol("null action init payload".into()));
                }
                let action = &*(raw.value as *const CActionSessionInit);
                let intent_filter = if action.intent_filter.is_null() {
                    None
                } else {
                    Some(read_string_array(action.intent_filter)?)
                };
                Ok(Self::Action {
                    text: read_opt_string(action.text),
                    intent_filter,
                    can_be_enqueued: action.can_be_enqueued != 0,
                    send_intent_not_recognized: action.send_intent_not_recognized != 0,
                })
            }
            SESSION_INIT_TYPE_NOTIFICATION => Ok(Self::Notification {
                text: read_string(raw.value as *const c_char)?,
            }),
            other => Err(ColloquyError::Protocol(format!(
                "unknown session init discriminant {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionMessage {
    pub init: SessionInit,
    /// Opaque payload echoed back on every event of the session.
    pub custom_data: Option<String>,
    /// None lets the engine pick its default site.
    pub site_id: Option<String>,
}

impl StartSessionMessage {
    pub(crate) fn with_c_repr<T>(
        &self,
        body: impl FnOnce(*const CStartSessionMessage) -> Result<T>,
    ) -> Result<T> {
        let init = self.init.to_c_guard()?;
        let custom_data = CStringGuard::new(self.custom_data.as_deref())?;
        let site_id = CStringGuard::new(self.site_id.as_deref())?;
        let message = CStartSessionMessage {
            init: CSessionInit {
                init_type: init.init_type,
                value: init.value,
            },
            custom_data: custom_data.as_ptr(),
            site_id: site_id.as_ptr(),
        };
        body(&message)
    }

    pub(crate) unsafe fn from_c(raw: &CStartSessionMessage) -> Result<Self> {
        Ok(Self {
            init: SessionInit::from_c(&raw.init)?,
            custom_data: read_opt_string(raw.custom_data),
            site_id: read_opt_string(raw.site_id),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueSessionMessage {
    pub session_id: String,
    /// Text to speak before listening again.
    pub text: Option<String>,
    pub intent_filter: Option<Vec<String>>,
    pub custom_data: Option<String>,
    pub send_intent_not_recognized: bool,
}

impl ContinueSessionMessage {
    pub(crate) fn with_c_repr<T>(
        &self,
        body: impl FnOnce(*const CContinueSessionMessage) -> Result<T>,
    ) -> Result<T> {
        let session_id = CStringGuard::new(Some(&self.session_id))?;
        let text = CStringGuard::new(self.text.as_deref())?;
        let filter = match &self.intent_filter {
            Some(filter) => Some(CStringArrayGuard::new(filter)?),
            None => None,
        };
        let custom_data = CStringGuard::new(self.custom_data.as_deref())?;
        let message = CContinueSessionMessage {
            session_id: session_id.as_ptr(),
            text: text.as_ptr(),
            intent_filter: opt_array_ptr(&filter),
            custom_data: custom_data.as_ptr(),
            send_intent_not_recognized: u8::from(self.send_intent_not_recognized),
        };
        body(&message)
    }

    pub(crate) unsafe fn from_c(raw: &CContinueSessionMessage) -> Result<Self> {
        let intent_filter = if raw.intent_filter.is_null() {
            None
        } else {
            Some(read_string_array(raw.intent_filter)?)
        };
        Ok(Self {
            session_id: read_string(raw.session_id)?,
            text: read_opt_string(raw.text),
            intent_filter,
            custom_data: read_opt_string(raw.custom_data),
            send_intent_not_recognized: raw.send_intent_not_recognized != 0,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionMessage {
    pub session_id: String,
    /// Farewell text to speak before the session closes.
    pub text: Option<String>,
}

impl EndSessionMessage {
    pub(crate) fn with_c_repr<T>(
        &self,
        body: impl FnOnce(*const CEndSessionMessage) -> Result<T>,
    ) -> Result<T> {
        let session_id = CStringGuard::new(Some(&self.session_id))?;
        let text = CStringGuard::new(self.text.as_deref())?;
        let message = CEndSessionMessage {
            session_id: session_id.as_ptr(),
            text: text.as_ptr(),
        };
        body(&message)
    }

    pub(crate) unsafe fn from_c(raw: &CEndSessionMessage) -> Result<Self> {
        Ok(Self {
            session_id: read_string(raw.session_id)?,
            text: read_opt_string(raw.text),
        })
    }
}

/// Host acknowledgment that delegated TTS output finished playing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SayFinishedMessage {
    pub message_id: Option<String>,
    pub session_id: Option<String>,
}

impl SayFinishedMessage {
    pub(crate) fn with_c_repr<T>(
        &self,
        body: impl FnOnce(*const CSayFinishedMessage) -> Result<T>,
    ) -> Result<T> {
        let message_id = CStringGuard::new(self.message_id.as_deref())?;
        let session_id = CStringGuard::new(self.session_id.as_deref())?;
        let message = CSayFinishedMessage {
            message_id: message_id.as_ptr(),
            session_id: session_id.as_ptr(),
        };
        body(&message)
    }

    pub(crate) unsafe fn from_c(raw: &CSayFinishedMessage) -> Result<Self> {
        Ok(Self {
            message_id: read_opt_string(raw.message_id),
            session_id: read_opt_string(raw.session_id),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueConfigureIntent {
    pub intent_id: String,
    pub enable: bool,
}

/// Per-site enable/disable switches for individual intents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueConfigureMessage {
    pub site_id: Option<String>,
    pub intents: Vec<DialogueConfigureIntent>,
}

impl DialogueConfigureMessage {
    pub(crate) fn with_c_repr<T>(
        &self,
        body: impl FnOnce(*const CDialogueConfigureMessage) -> Result<T>,
    ) -> Result<T> {
        let site_id = CStringGuard::new(self.site_id.as_deref())?;
        let mut ids = Vec::with_capacity(self.intents.len());
        let mut entries = Vec::with_capacity(self.intents.len());
        for intent in &self.intents {
            let id = CStringGuard::new(Some(&intent.intent_id))?;
            entries.push(BoxedGuard::new(CDialogueConfigureIntent {
                intent_id: id.as_ptr(),
                enable: u8::from(intent.enable),
            }));
            ids.push(id);
        }
        let ptrs = PtrArrayGuard::new(entries.iter().map(|e| e.as_ptr()).collect());
        let array = BoxedGuard::new(CDialogueConfigureIntentArray {
            entries: ptrs.as_ptr(),
            count: entries.len() as c_int,
        });
        let message = CDialogueConfigureMessage {
            site_id: site_id.as_ptr(),
            intents: array.as_ptr(),
        };
        body(&message)
    }

    pub(crate) unsafe fn from_c(raw: &CDialogueConfigureMessage) -> Result<Self> {
        let mut intents = Vec::new();
        if !raw.intents.is_null() {
            let array = &*raw.intents;
            intents.reserve(array.count as usize);
            for i in 0..array.count as usize {
                let entry = *array.entries.add(i);
                if entry.is_null() {
                    return Err(ColloquyError::Protocol("null configure entry".into()));
                }
                let entry = &*entry;
                intents.push(DialogueConfigureIntent {
                    intent_id: read_string(entry.intent_id)?,
                    enable: entry.enable != 0,
                });
            }
        }
        Ok(Self {
            site_id: read_opt_string(raw.site_id),
            intents,
        })
    }
}

// ---------------------------------------------------------------------------
// Session lifecycle events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartedMessage {
    pub session_id: String,
    pub custom_data: Option<String>,
    pub site_id: String,
    /// Set when this session was promoted from the queue after another one
    /// ended.
    pub reactivated_from_session_id: Option<String>,
}

impl SessionStartedMessage {
    pub(crate) unsafe fn from_c(raw: &CSessionStartedMessage) -> Result<Self> {
        Ok(Self {
            session_id: read_string(raw.session_id)?,
            custom_data: read_opt_string(raw.custom_data),
            site_id: read_string(raw.site_id)?,
            reactivated_from_session_id: read_opt_string(raw.reactivated_from_session_id),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQueuedMessage {
    pub session_id: String,
    pub custom_data: Option<String>,
    pub site_id: String,
}

impl SessionQueuedMessage {
    pub(crate) unsafe fn from_c(raw: &CSessionQueuedMessage) -> Result<Self> {
        Ok(Self {
            session_id: read_string(raw.session_id)?,
            custom_data: read_opt_string(raw.custom_data),
            site_id: read_string(raw.site_id)?,
        })
    }
}

/// Why a session closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionTerminationType {
    /// The dialogue ran to completion (or the host ended it).
    Nominal,
    SiteUnavailable,
    AbortedByUser,
    IntentNotRecognized,
    Timeout,
    Error,
}

impl SessionTerminationType {
    pub(crate) fn from_c(raw: c_int) -> Result<Self> {
        match raw {
            TERMINATION_TYPE_NOMINAL => Ok(Self::Nominal),
            TERMINATION_TYPE_SITE_UNAVAILABLE => Ok(Self::SiteUnavailable),
            TERMINATION_TYPE_ABORTED_BY_USER => Ok(Self::AbortedByUser),
            TERMINATION_TYPE_INTENT_NOT_RECOGNIZED => Ok(Self::IntentNotRecognized),
            TERMINATION_TYPE_TIMEOUT => Ok(Self::Timeout),
            TERMINATION_TYPE_ERROR => Ok(Self::Error),
            other => Err(ColloquyError::Protocol(format!(
                "unknown termination discriminant {other}"
            ))),
        }
    }

    pub(crate) fn to_c(self) -> c_int {
        match self {
            Self::Nominal => TERMINATION_TYPE_NOMINAL,
            Self::SiteUnavailable => TERMINATION_TYPE_SITE_UNAVAILABLE,
            Self::AbortedByUser => TERMINATION_TYPE_ABORTED_BY_USER,
            Self::IntentNotRecognized => TERMINATION_TYPE_INTENT_NOT_RECOGNIZED,
            Self::Timeout => TERMINATION_TYPE_TIMEOUT,
            Self::Error => TERMINATION_TYPE_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTermination {
    pub termination_type: SessionTerminationType,
    /// Engine-supplied detail, populated for `Error`.
    pub data: Option<String>,
}

impl SessionTermination {
    pub(crate) unsafe fn from_c(raw: &CSessionTermination) -> Result<Self> {
        Ok(Self {
            termination_type: SessionTerminationType::from_c(raw.termination_type)?,
            data: read_opt_string(raw.data),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndedMessage {
    pub session_id: String,
    pub custom_data: Option<String>,
    pub site_id: String,
    pub termination: SessionTermination,
}

impl SessionEndedMessage {
    pub(crate) unsafe fn from_c(raw: &CSessionEndedMessage) -> Result<Self> {
        Ok(Self {
            session_id: read_string(raw.session_id)?,
            custom_data: read_opt_string(raw.custom_data),
            site_id: read_string(raw.site_id)?,
            termination: SessionTermination::from_c(&raw.termination)?,
        })
    }
}

/// Text the host should speak when TTS is delegated. Answer with
/// [`SayFinishedMessage`] once playback completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SayMessage {
    pub text: String,
    pub lang: Option<String>,
    pub message_id: Option<String>,
    pub site_id: String,
    pub session_id: Option<String>,
}

impl SayMessage {
    pub(crate) unsafe fn from_c(raw: &CSayMessage) -> Result<Self> {
        Ok(Self {
            text: read_string(raw.text)?,
            lang: read_opt_string(raw.lang),
            message_id: read_opt_string(raw.id),
            site_id: read_string(raw.site_id)?,
            session_id: read_opt_string(raw.session_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_init_round_trips_through_c() {
        let message = StartSessionMessage {
            init: SessionInit::Action {
                text: Some("what can I do for you?".into()),
                intent_filter: Some(vec!["searchWeatherForecast".into()]),
                can_be_enqueued: true,
                send_intent_not_recognized: true,
            },
            custom_data: Some("abc".into()),
            site_id: None,
        };
        let decoded = message
            .with_c_repr(|raw| unsafe { StartSessionMessage::from_c(&*raw) })
            .unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn notification_init_round_trips_through_c() {
        let message = StartSessionMessage {
            init: SessionInit::Notification {
                text: "Hello".into(),
            },
            custom_data: None,
            site_id: Some("kitchen".into()),
        };
        let decoded = message
            .with_c_repr(|raw| unsafe { StartSessionMessage::from_c(&*raw) })
            .unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn empty_filter_stays_distinct_from_absent_filter() {
        let empty = StartSessionMessage {
            init: SessionInit::Action {
                text: None,
                intent_filter: Some(vec![]),
                can_be_enqueued: false,
                send_intent_not_recognized: false,
            },
            custom_data: None,
            site_id: None,
        };
        empty
            .with_c_repr(|raw| {
                let raw = unsafe { &*raw };
                let action = unsafe { &*(raw.init.value as *const CActionSessionInit) };
                assert!(!action.intent_filter.is_null());
                assert_eq!(unsafe { (*action.intent_filter).size }, 0);
                Ok(())
            })
            .unwrap();

        let absent = StartSessionMessage {
            init: SessionInit::Action {
                text: None,
                intent_filter: None,
                can_be_enqueued: false,
                send_intent_not_recognized: false,
            },
            custom_data: None,
            site_id: None,
        };
        absent
            .with_c_repr(|raw| {
                let action = unsafe { &*((*raw).init.value as *const CActionSessionInit) };
                assert!(action.intent_filter.is_null());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn encode_bracket_propagates_body_errors() {
        let message = ContinueSessionMessage {
            session_id: "session-1".into(),
            text: Some("and then?".into()),
            intent_filter: Some(vec!["turnOnLights".into()]),
            custom_data: None,
            send_intent_not_recognized: false,
        };
        let result: Result<()> =
            message.with_c_repr(|_| Err(ColloquyError::Protocol("boom".into())));
        assert!(result.is_err());
    }

    #[test]
    fn dialogue_configure_round_trips_through_c() {
        let message = DialogueConfigureMessage {
            site_id: Some("default".into()),
            intents: vec![
                DialogueConfigureIntent {
                    intent_id: "searchWeatherForecast".into(),
                    enable: false,
                },
                DialogueConfigureIntent {
                    intent_id: "turnOnLights".into(),
                    enable: true,
                },
            ],
        };
        let decoded = message
            .with_c_repr(|raw| unsafe { DialogueConfigureMessage::from_c(&*raw) })
            .unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn unknown_termination_discriminant_is_a_protocol_error() {
        assert!(matches!(
            SessionTerminationType::from_c(77).unwrap_err(),
            ColloquyError::Protocol(_)
        ));
    }
}
