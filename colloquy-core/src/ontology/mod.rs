//! The typed message catalog exchanged with the engine.
//!
//! Requests (host → engine) encode through a bracketed scope: callers hand a
//! body closure to `with_c_repr`, the encoded pointer is only valid inside
//! it, and every foreign allocation is released when the bracket exits —
//! normally, by `?`, or by unwind. Events (engine → host) decode as pure
//! reads; the dispatch registry destroys the engine-owned payload after the
//! handler returns.
//!
//! This is the latest protocol revision: earlier variants (no
//! `sendIntentNotRecognized`, no percentage slots, no injection request ids)
//! are superseded, not merged.

pub mod asr;
pub mod dialogue;
pub mod injection;
pub mod intent;

pub use asr::{AsrModelParameters, TextCapturedMessage};
pub use dialogue::{
    ContinueSessionMessage, DialogueConfigureIntent, DialogueConfigureMessage, EndSessionMessage,
    SayFinishedMessage, SayMessage, SessionEndedMessage, SessionInit, SessionQueuedMessage,
    SessionStartedMessage, SessionTermination, SessionTerminationType, StartSessionMessage,
};
pub use injection::{
    ComponentLoadedMessage, InjectionCompleteMessage, InjectionKind, InjectionRequestMessage,
    InjectionRequestOperation,
};
pub use intent::{
    AmountOfMoneyValue, DurationValue, Grain, InstantTimeValue, IntentClassifierResult,
    IntentMessage, IntentNotRecognizedMessage, Precision, Slot, SlotValue, TemperatureValue,
    TimeIntervalValue,
};

use serde::{Deserialize, Serialize};

/// Every asynchronous engine event, as a single union for queue-based
/// consumption (see `ColloquyPlatform::subscribe`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum PlatformEvent {
    IntentDetected(IntentMessage),
    IntentNotRecognized(IntentNotRecognizedMessage),
    HotwordDetected,
    ListeningStateChanged(bool),
    SessionStarted(SessionStartedMessage),
    SessionQueued(SessionQueuedMessage),
    SessionEnded(SessionEndedMessage),
    Say(SayMessage),
    TextCaptured(TextCapturedMessage),
    PartialTextCaptured(TextCapturedMessage),
    InjectionComplete(InjectionCompleteMessage),
    ComponentLoaded(ComponentLoadedMessage),
    Watch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_camel_case_tags() {
        let event = PlatformEvent::SessionEnded(SessionEndedMessage {
            session_id: "session-1".into(),
            custom_data: None,
            site_id: "default".into(),
            termination: SessionTermination {
                termination_type: SessionTerminationType::Timeout,
                data: None,
            },
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "sessionEnded");
        assert_eq!(json["payload"]["sessionId"], "session-1");
        assert_eq!(json["payload"]["termination"]["terminationType"], "timeout");
    }

    #[test]
    fn slot_values_serialize_tagged() {
        let value = SlotValue::Temperature(TemperatureValue {
            value: 21.5,
            unit: Some("celsius".into()),
        });
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["kind"], "temperature");
        assert_eq!(json["value"]["unit"], "celsius");

        let back: SlotValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, value);
    }
}
