//! NLU results: detected intents, resolved slot values and the
//! not-recognized counterpart.

use std::os::raw::{c_char, c_int};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{ColloquyError, Result};
use crate::ffi::types::*;
use crate::ffi::{read_opt_string, read_string};

/// A fully resolved intent, delivered when the NLU classifies a captured
/// utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMessage {
    pub session_id: String,
    pub custom_data: Option<String>,
    pub site_id: String,
    /// The text the ASR captured.
    pub input: String,
    /// None when the engine emits an unclassified result.
    pub intent: Option<IntentClassifierResult>,
    pub slots: Vec<Slot>,
}

impl IntentMessage {
    /// # Safety
    /// `raw` must point at a well-formed engine message.
    pub(crate) unsafe fn from_c(raw: &CIntentMessage) -> Result<Self> {
        let intent = if raw.intent.is_null() {
            None
        } else {
            Some(IntentClassifierResult::from_c(&*raw.intent)?)
        };
        let slots = if raw.slots.is_null() {
            Vec::new()
        } else {
            let list = &*raw.slots;
            let mut slots = Vec::with_capacity(list.size as usize);
            for i in 0..list.size as usize {
                slots.push(Slot::from_c(&*list.slots.add(i))?);
            }
            slots
        };
        Ok(Self {
            session_id: read_string(raw.session_id)?,
            custom_data: read_opt_string(raw.custom_data),
            site_id: read_string(raw.site_id)?,
            input: read_string(raw.input)?,
            intent,
            slots,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentClassifierResult {
    pub intent_name: String,
    pub confidence_score: f32,
}

impl IntentClassifierResult {
    pub(crate) unsafe fn from_c(raw: &CIntentClassifierResult) -> Result<Self> {
        Ok(Self {
            intent_name: read_string(raw.intent_name)?,
            confidence_score: raw.confidence_score,
        })
    }
}

/// One extracted slot, with both the verbatim input span and the resolved
/// value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub raw_value: String,
    pub value: SlotValue,
    /// Character range of the slot inside the input utterance.
    pub range: Range<usize>,
    pub entity: String,
    pub slot_name: String,
}

impl Slot {
    pub(crate) unsafe fn from_c(raw: &CSlot) -> Result<Self> {
        Ok(Self {
            raw_value: read_string(raw.raw_value)?,
            value: SlotValue::from_c(&raw.value)?,
            range: raw.range_start as usize..raw.range_end as usize,
            entity: read_string(raw.entity)?,
            slot_name: read_string(raw.slot_name)?,
        })
    }
}

/// Resolved slot payload. The wire form is a tagged union; a discriminant this
/// revision does not know is surfaced as [`ColloquyError::Protocol`] rather
/// than silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SlotValue {
    Custom(String),
    Number(f64),
    Ordinal(i64),
    InstantTime(InstantTimeValue),
    TimeInterval(TimeIntervalValue),
    AmountOfMoney(AmountOfMoneyValue),
    Temperature(TemperatureValue),
    Duration(DurationValue),
    Percentage(f64),
}

impl SlotValue {
    pub(crate) unsafe fn from_c(raw: &CSlotValue) -> Result<Self> {
        if raw.value.is_null() {
            return Err(ColloquyError::Protocol("null slot value payload".into()));
        }
        match raw.value_type {
            SLOT_VALUE_TYPE_CUSTOM => Ok(Self::Custom(read_string(raw.value as *const c_char)?)),
            SLOT_VALUE_TYPE_NUMBER => Ok(Self::Number(*(raw.value as *const f64))),
            SLOT_VALUE_TYPE_ORDINAL => Ok(Self::Ordinal(*(raw.value as *const i64))),
            SLOT_VALUE_TYPE_INSTANT_TIME => {
                InstantTimeValue::from_c(&*(raw.value as *const CInstantTimeValue))
                    .map(Self::InstantTime)
            }
            SLOT_VALUE_TYPE_TIME_INTERVAL => {
                TimeIntervalValue::from_c(&*(raw.value as *const CTimeIntervalValue))
                    .map(Self::TimeInterval)
            }
            SLOT_VALUE_TYPE_AMOUNT_OF_MONEY => {
                AmountOfMoneyValue::from_c(&*(raw.value as *const CAmountOfMoneyValue))
                    .map(Self::AmountOfMoney)
            }
            SLOT_VALUE_TYPE_TEMPERATURE => {
                TemperatureValue::from_c(&*(raw.value as *const CTemperatureValue))
                    .map(Self::Temperature)
            }
            SLOT_VALUE_TYPE_DURATION => {
                DurationValue::from_c(&*(raw.value as *const CDurationValue)).map(Self::Duration)
            }
            SLOT_VALUE_TYPE_PERCENTAGE => Ok(Self::Percentage(*(raw.value as *const f64))),
            other => Err(ColloquyError::Protocol(format!(
                "unknown slot value discriminant {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Grain {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

impl Grain {
    pub(crate) fn from_c(raw: c_int) -> Result<Self> {
        match raw {
            GRAIN_YEAR => Ok(Self::Year),
            GRAIN_QUARTER => Ok(Self::Quarter),
            GRAIN_MONTH => Ok(Self::Month),
            GRAIN_WEEK => Ok(Self::Week),
            GRAIN_DAY => Ok(Self::Day),
            GRAIN_HOUR => Ok(Self::Hour),
            GRAIN_MINUTE => Ok(Self::Minute),
            GRAIN_SECOND => Ok(Self::Second),
            other => Err(ColloquyError::Protocol(format!(
                "unknown grain discriminant {other}"
            ))),
        }
    }

    pub(crate) fn to_c(self) -> c_int {
        match self {
            Self::Year => GRAIN_YEAR,
            Self::Quarter => GRAIN_QUARTER,
            Self::Month => GRAIN_MONTH,
            Self::Week => GRAIN_WEEK,
            Self::Day => GRAIN_DAY,
            Self::Hour => GRAIN_HOUR,
            Self::Minute => GRAIN_MINUTE,
            Self::Second => GRAIN_SECOND,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Precision {
    Approximate,
    Exact,
}

impl Precision {
    pub(crate) fn from_c(raw: c_int) -> Result<Self> {
        match raw {
            PRECISION_APPROXIMATE => Ok(Self::Approximate),
            PRECISION_EXACT => Ok(Self::Exact),
            other => Err(ColloquyError::Protocol(format!(
                "unknown precision discriminant {other}"
            ))),
        }
    }

    pub(crate) fn to_c(self) -> c_int {
        match self {
            Self::Approximate => PRECISION_APPROXIMATE,
            Self::Exact => PRECISION_EXACT,
        }
    }
}

/// A single point in time, ISO 8601 formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantTimeValue {
    pub value: String,
    pub grain: Grain,
    pub precision: Precision,
}

impl InstantTimeValue {
    pub(crate) unsafe fn from_c(raw: &CInstantTimeValue) -> Result<Self> {
        Ok(Self {
            value: read_string(raw.value)?,
            grain: Grain::from_c(raw.grain)?,
            precision: Precision::from_c(raw.precision)?,
        })
    }
}

/// A time span. Either bound may be open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeIntervalValue {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl TimeIntervalValue {
    pub(crate) unsafe fn from_c(raw: &CTimeIntervalValue) -> Result<Self> {
        Ok(Self {
            from: read_opt_string(raw.from),
            to: read_opt_string(raw.to),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountOfMoneyValue {
    pub value: f32,
    pub precision: Precision,
    pub unit: Option<String>,
}

impl AmountOfMoneyValue {
    pub(crate) unsafe fn from_c(raw: &CAmountOfMoneyValue) -> Result<Self> {
        Ok(Self {
            value: raw.value,
            precision: Precision::from_c(raw.precision)?,
            unit: read_opt_string(raw.unit),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureValue {
    pub value: f32,
    pub unit: Option<String>,
}

impl TemperatureValue {
    pub(crate) unsafe fn from_c(raw: &CTemperatureValue) -> Result<Self> {
        Ok(Self {
            value: raw.value,
            unit: read_opt_string(raw.unit),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationValue {
    pub years: i64,
    pub quarters: i64,
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub precision: Precision,
}

impl DurationValue {
    pub(crate) unsafe fn from_c(raw: &CDurationValue) -> Result<Self> {
        Ok(Self {
            years: raw.years,
            quarters: raw.quarters,
            months: raw.months,
            weeks: raw.weeks,
            days: raw.days,
            hours: raw.hours,
            minutes: raw.minutes,
            seconds: raw.seconds,
            precision: Precision::from_c(raw.precision)?,
        })
    }
}

/// Emitted when a session was opened with `send_intent_not_recognized` and
/// the NLU could not classify the utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentNotRecognizedMessage {
    pub site_id: String,
    pub session_id: String,
    pub input: Option<String>,
    pub custom_data: Option<String>,
    pub confidence_score: f32,
}

impl IntentNotRecognizedMessage {
    pub(crate) unsafe fn from_c(raw: &CIntentNotRecognizedMessage) -> Result<Self> {
        Ok(Self {
            site_id: read_string(raw.site_id)?,
            session_id: read_string(raw.session_id)?,
            input: read_opt_string(raw.input),
            custom_data: read_opt_string(raw.custom_data),
            confidence_score: raw.confidence_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::os::raw::c_void;

    #[test]
    fn custom_slot_value_decodes() {
        let payload = CString::new("red").unwrap();
        let raw = CSlotValue {
            value: payload.as_ptr() as *const c_void,
            value_type: SLOT_VALUE_TYPE_CUSTOM,
        };
        let value = unsafe { SlotValue::from_c(&raw) }.unwrap();
        assert_eq!(value, SlotValue::Custom("red".into()));
    }

    #[test]
    fn numeric_slot_values_decode() {
        let number = 21.5f64;
        let raw = CSlotValue {
            value: &number as *const f64 as *const c_void,
            value_type: SLOT_VALUE_TYPE_NUMBER,
        };
        assert_eq!(
            unsafe { SlotValue::from_c(&raw) }.unwrap(),
            SlotValue::Number(21.5)
        );

        let ordinal = 3i64;
        let raw = CSlotValue {
            value: &ordinal as *const i64 as *const c_void,
            value_type: SLOT_VALUE_TYPE_ORDINAL,
        };
        assert_eq!(
            unsafe { SlotValue::from_c(&raw) }.unwrap(),
            SlotValue::Ordinal(3)
        );
    }

    #[test]
    fn instant_time_decodes_grain_and_precision() {
        let when = CString::new("2026-08-23 00:00:00 +00:00").unwrap();
        let payload = CInstantTimeValue {
            value: when.as_ptr(),
            grain: GRAIN_DAY,
            precision: PRECISION_EXACT,
        };
        let raw = CSlotValue {
            value: &payload as *const CInstantTimeValue as *const c_void,
            value_type: SLOT_VALUE_TYPE_INSTANT_TIME,
        };
        let value = unsafe { SlotValue::from_c(&raw) }.unwrap();
        assert_eq!(
            value,
            SlotValue::InstantTime(InstantTimeValue {
                value: "2026-08-23 00:00:00 +00:00".into(),
                grain: Grain::Day,
                precision: Precision::Exact,
            })
        );
    }

    #[test]
    fn unknown_slot_discriminant_is_a_protocol_error() {
        let number = 1.0f64;
        let raw = CSlotValue {
            value: &number as *const f64 as *const c_void,
            value_type: 42,
        };
        let err = unsafe { SlotValue::from_c(&raw) }.unwrap_err();
        assert!(matches!(err, ColloquyError::Protocol(_)));
    }

    #[test]
    fn null_slot_payload_is_a_protocol_error() {
        let raw = CSlotValue {
            value: std::ptr::null(),
            value_type: SLOT_VALUE_TYPE_CUSTOM,
        };
        let err = unsafe { SlotValue::from_c(&raw) }.unwrap_err();
        assert!(matches!(err, ColloquyError::Protocol(_)));
    }

    #[test]
    fn unknown_grain_is_a_protocol_error() {
        assert!(matches!(
            Grain::from_c(99).unwrap_err(),
            ColloquyError::Protocol(_)
        ));
    }
}
