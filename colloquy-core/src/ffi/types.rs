//! `#[repr(C)]` mirrors of the engine's wire structures.
//!
//! Conventions, shared with the native header:
//! - strings are NUL-terminated; a null pointer means "absent", which is
//!   distinct from the empty string
//! - arrays are length-prefixed (`data` + `size`); a null array pointer means
//!   "absent" where the schema allows it, a zero `size` means "empty"
//! - booleans travel as `u8` (0 / 1)
//! - tagged unions carry an explicit `c_int` discriminant next to an untyped
//!   value pointer; every discriminant this revision understands is listed
//!   below, and anything else is a protocol violation on decode

use std::os::raw::{c_char, c_float, c_int, c_void};

// ---------------------------------------------------------------------------
// Discriminants
// ---------------------------------------------------------------------------

pub const SESSION_INIT_TYPE_ACTION: c_int = 1;
pub const SESSION_INIT_TYPE_NOTIFICATION: c_int = 2;

pub const SLOT_VALUE_TYPE_CUSTOM: c_int = 1;
pub const SLOT_VALUE_TYPE_NUMBER: c_int = 2;
pub const SLOT_VALUE_TYPE_ORDINAL: c_int = 3;
pub const SLOT_VALUE_TYPE_INSTANT_TIME: c_int = 4;
pub const SLOT_VALUE_TYPE_TIME_INTERVAL: c_int = 5;
pub const SLOT_VALUE_TYPE_AMOUNT_OF_MONEY: c_int = 6;
pub const SLOT_VALUE_TYPE_TEMPERATURE: c_int = 7;
pub const SLOT_VALUE_TYPE_DURATION: c_int = 8;
pub const SLOT_VALUE_TYPE_PERCENTAGE: c_int = 9;

pub const GRAIN_YEAR: c_int = 0;
pub const GRAIN_QUARTER: c_int = 1;
pub const GRAIN_MONTH: c_int = 2;
pub const GRAIN_WEEK: c_int = 3;
pub const GRAIN_DAY: c_int = 4;
pub const GRAIN_HOUR: c_int = 5;
pub const GRAIN_MINUTE: c_int = 6;
pub const GRAIN_SECOND: c_int = 7;

pub const PRECISION_APPROXIMATE: c_int = 0;
pub const PRECISION_EXACT: c_int = 1;

pub const TERMINATION_TYPE_NOMINAL: c_int = 1;
pub const TERMINATION_TYPE_SITE_UNAVAILABLE: c_int = 2;
pub const TERMINATION_TYPE_ABORTED_BY_USER: c_int = 3;
pub const TERMINATION_TYPE_INTENT_NOT_RECOGNIZED: c_int = 4;
pub const TERMINATION_TYPE_TIMEOUT: c_int = 5;
pub const TERMINATION_TYPE_ERROR: c_int = 6;

pub const INJECTION_KIND_ADD: c_int = 1;
pub const INJECTION_KIND_ADD_FROM_VANILLA: c_int = 2;

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CStringArray {
    pub data: *const *const c_char,
    pub size: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CMapStringToStringArrayEntry {
    pub key: *const c_char,
    pub value: *const CStringArray,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CMapStringToStringArray {
    pub entries: *const *const CMapStringToStringArrayEntry,
    pub count: c_int,
}

// ---------------------------------------------------------------------------
// Request messages (host → engine)
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CActionSessionInit {
    /// Text the TTS should say to open the session; nullable.
    pub text: *const c_char,
    /// Nullable: null = unrestricted, size 0 = reject every intent.
    pub intent_filter: *const CStringArray,
    pub can_be_enqueued: u8,
    pub send_intent_not_recognized: u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CSessionInit {
    /// One of `SESSION_INIT_TYPE_*`.
    pub init_type: c_int,
    /// `CActionSessionInit*` for action, `c_char*` for notification.
    pub value: *const c_void,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CStartSessionMessage {
    pub init: CSessionInit,
    pub custom_data: *const c_char,
    pub site_id: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CContinueSessionMessage {
    pub session_id: *const c_char,
    pub text: *const c_char,
    pub intent_filter: *const CStringArray,
    pub custom_data: *const c_char,
    pub send_intent_not_recognized: u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CEndSessionMessage {
    pub session_id: *const c_char,
    pub text: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CSayFinishedMessage {
    pub message_id: *const c_char,
    pub session_id: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CInjectionRequestOperation {
    pub values: *const CMapStringToStringArray,
    /// One of `INJECTION_KIND_*`.
    pub kind: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CInjectionRequestOperations {
    pub operations: *const *const CInjectionRequestOperation,
    pub count: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CInjectionRequestMessage {
    pub operations: *const CInjectionRequestOperations,
    pub lexicon: *const CMapStringToStringArray,
    pub cross_language: *const c_char,
    pub id: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CDialogueConfigureIntent {
    pub intent_id: *const c_char,
    pub enable: u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CDialogueConfigureIntentArray {
    pub entries: *const *const CDialogueConfigureIntent,
    pub count: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CDialogueConfigureMessage {
    pub site_id: *const c_char,
    pub intents: *const CDialogueConfigureIntentArray,
}

/// ASR tuning. The wire format has no optional primitives, so "unset" is the
/// sentinel: -1 for integers, -1.0 for floats.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CAsrModelParameters {
    pub beam_size: c_int,
    pub lm_weight: c_float,
    pub endpointing_ms: c_int,
}

// ---------------------------------------------------------------------------
// Event messages (engine → host)
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CIntentClassifierResult {
    pub intent_name: *const c_char,
    pub confidence_score: c_float,
}

/// Tagged union: `value` points at a payload whose layout is selected by
/// `value_type` (one of `SLOT_VALUE_TYPE_*`).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CSlotValue {
    pub value: *const c_void,
    pub value_type: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CSlot {
    pub raw_value: *const c_char,
    pub value: CSlotValue,
    pub range_start: c_int,
    pub range_end: c_int,
    pub entity: *const c_char,
    pub slot_name: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CSlotList {
    pub slots: *const CSlot,
    pub size: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CInstantTimeValue {
    pub value: *const c_char,
    pub grain: c_int,
    pub precision: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CTimeIntervalValue {
    pub from: *const c_char,
    pub to: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CAmountOfMoneyValue {
    pub value: c_float,
    pub precision: c_int,
    pub unit: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CTemperatureValue {
    pub value: c_float,
    pub unit: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CDurationValue {
    pub years: i64,
    pub quarters: i64,
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub precision: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CIntentMessage {
    pub session_id: *const c_char,
    pub custom_data: *const c_char,
    pub site_id: *const c_char,
    pub input: *const c_char,
    /// Null when the input could not be classified.
    pub intent: *const CIntentClassifierResult,
    /// Nullable; null and size 0 both decode to "no slots".
    pub slots: *const CSlotList,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CIntentNotRecognizedMessage {
    pub site_id: *const c_char,
    pub session_id: *const c_char,
    pub input: *const c_char,
    pub custom_data: *const c_char,
    pub confidence_score: c_float,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CSessionStartedMessage {
    pub session_id: *const c_char,
    pub custom_data: *const c_char,
    pub site_id: *const c_char,
    pub reactivated_from_session_id: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CSessionQueuedMessage {
    pub session_id: *const c_char,
    pub custom_data: *const c_char,
    pub site_id: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CSessionTermination {
    /// One of `TERMINATION_TYPE_*`.
    pub termination_type: c_int,
    /// Extra detail for `TERMINATION_TYPE_ERROR`; nullable.
    pub data: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CSessionEndedMessage {
    pub session_id: *const c_char,
    pub custom_data: *const c_char,
    pub site_id: *const c_char,
    pub termination: CSessionTermination,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CSayMessage {
    pub text: *const c_char,
    pub lang: *const c_char,
    pub id: *const c_char,
    pub site_id: *const c_char,
    pub session_id: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CTextCapturedMessage {
    pub text: *const c_char,
    pub likelihood: c_float,
    pub seconds: c_float,
    pub site_id: *const c_char,
    pub session_id: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CInjectionCompleteMessage {
    pub request_id: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CComponentLoadedMessage {
    pub component: *const c_char,
}
