//! Engine-to-host event delivery: injection completions, ASR captures, TTS
//! delegation, intents with resolved slots, and payload reclamation.

use std::collections::HashMap;
use std::sync::Arc;

use colloquy_core::{
    ColloquyPlatform, ComponentLoadedMessage, DialogueConfigureIntent, DialogueConfigureMessage,
    InjectionKind, InjectionRequestMessage, InjectionRequestOperation, IntentClassifierResult,
    IntentMessage, PlatformConfig, PlatformEvent, SayFinishedMessage, SayMessage, Slot, SlotValue,
    StubEngine, TextCapturedMessage,
};

fn platform() -> (Arc<StubEngine>, ColloquyPlatform) {
    let stub = Arc::new(StubEngine::new());
    let platform =
        ColloquyPlatform::with_driver(stub.clone(), &PlatformConfig::new("/opt/assistant"))
            .expect("platform creation");
    (stub, platform)
}

fn drain(rx: &crossbeam_channel::Receiver<PlatformEvent>) -> Vec<PlatformEvent> {
    rx.try_iter().collect()
}

#[test]
fn injection_request_completes_exactly_once() {
    let (stub, platform) = platform();
    let rx = platform.subscribe().unwrap();
    platform.start().unwrap();

    let mut entities = HashMap::new();
    entities.insert("locality".to_string(), vec!["wonderland".to_string()]);
    let request = InjectionRequestMessage {
        operations: vec![InjectionRequestOperation {
            entities,
            kind: InjectionKind::Add,
        }],
        lexicon: HashMap::new(),
        cross_language: None,
        request_id: Some("req-42".into()),
    };
    platform.request_injection(&request).unwrap();

    let events = drain(&rx);
    let [PlatformEvent::InjectionComplete(complete)] = events.as_slice() else {
        panic!("expected one injectionComplete, got {events:?}");
    };
    assert_eq!(complete.request_id.as_deref(), Some("req-42"));
    assert_eq!(stub.injection_requests(), vec![request]);
    assert_eq!(stub.outstanding_event_payloads(), 0);
}

#[test]
fn dialogue_configure_reaches_the_engine_intact() {
    let (stub, platform) = platform();
    platform.start().unwrap();

    let message = DialogueConfigureMessage {
        site_id: None,
        intents: vec![DialogueConfigureIntent {
            intent_id: "searchWeatherForecast".into(),
            enable: false,
        }],
    };
    platform.configure_dialogue(&message).unwrap();
    assert_eq!(stub.configure_requests(), vec![message]);
}

#[test]
fn intent_event_arrives_with_resolved_slots() {
    let (stub, platform) = platform();
    let rx = platform.subscribe().unwrap();
    platform.start().unwrap();

    let intent = IntentMessage {
        session_id: "session-1".into(),
        custom_data: None,
        site_id: "default".into(),
        input: "what is the weather in wonderland".into(),
        intent: Some(IntentClassifierResult {
            intent_name: "searchWeatherForecast".into(),
            confidence_score: 0.92,
        }),
        slots: vec![Slot {
            raw_value: "wonderland".into(),
            value: SlotValue::Custom("wonderland".into()),
            range: 23..33,
            entity: "locality".into(),
            slot_name: "forecastLocality".into(),
        }],
    };
    stub.emit_intent(&intent);

    let events = drain(&rx);
    let [PlatformEvent::IntentDetected(received)] = events.as_slice() else {
        panic!("expected intentDetected, got {events:?}");
    };
    assert_eq!(*received, intent);
    assert_eq!(stub.outstanding_event_payloads(), 0);
}

#[test]
fn partial_and_final_captures_use_separate_handlers() {
    let (stub, platform) = platform();
    let rx = platform.subscribe().unwrap();
    platform.start().unwrap();

    let partial = TextCapturedMessage {
        text: "what is".into(),
        likelihood: 0.4,
        seconds: 0.8,
        site_id: "default".into(),
        session_id: Some("session-1".into()),
    };
    let fin = TextCapturedMessage {
        text: "what is the weather".into(),
        likelihood: 0.95,
        seconds: 2.1,
        site_id: "default".into(),
        session_id: Some("session-1".into()),
    };
    stub.emit_partial_text_captured(&partial);
    stub.emit_text_captured(&fin);

    let events = drain(&rx);
    assert_eq!(events.len(), 2);
    assert!(
        matches!(&events[0], PlatformEvent::PartialTextCaptured(m) if m.text == "what is")
    );
    assert!(
        matches!(&events[1], PlatformEvent::TextCaptured(m) if m.text == "what is the weather")
    );
    assert_eq!(stub.outstanding_event_payloads(), 0);
}

#[test]
fn delegated_tts_round_trips_through_say_finished() {
    let (stub, platform) = platform();
    let rx = platform.subscribe().unwrap();
    platform.start().unwrap();

    let say = SayMessage {
        text: "Hello".into(),
        lang: Some("en".into()),
        message_id: Some("say-7".into()),
        site_id: "default".into(),
        session_id: Some("session-1".into()),
    };
    stub.emit_say(&say);

    let events = drain(&rx);
    let [PlatformEvent::Say(received)] = events.as_slice() else {
        panic!("expected say, got {events:?}");
    };
    assert_eq!(*received, say);

    let finished = SayFinishedMessage {
        message_id: received.message_id.clone(),
        session_id: received.session_id.clone(),
    };
    platform.notify_speech_ended(&finished).unwrap();
    assert_eq!(stub.say_finished_requests(), vec![finished]);
    assert_eq!(stub.outstanding_event_payloads(), 0);
}

#[test]
fn hotword_listening_component_and_watch_events_fan_out() {
    let (stub, platform) = platform();
    let rx = platform.subscribe().unwrap();
    platform.start().unwrap();

    stub.emit_hotword_detected();
    stub.emit_listening_state(true);
    stub.emit_component_loaded(&ComponentLoadedMessage {
        component: "nlu".into(),
    });
    stub.emit_watch("[asr] capture started");
    stub.emit_listening_state(false);

    let events = drain(&rx);
    assert_eq!(events.len(), 5, "got {events:?}");
    assert!(matches!(events[0], PlatformEvent::HotwordDetected));
    assert!(matches!(events[1], PlatformEvent::ListeningStateChanged(true)));
    assert!(
        matches!(&events[2], PlatformEvent::ComponentLoaded(m) if m.component == "nlu")
    );
    assert!(matches!(&events[3], PlatformEvent::Watch(line) if line.contains("capture started")));
    assert!(matches!(events[4], PlatformEvent::ListeningStateChanged(false)));
    assert_eq!(stub.outstanding_event_payloads(), 0);
}

#[test]
fn events_without_a_registered_handler_are_dropped_cleanly() {
    let (stub, _platform) = platform();

    // No handlers registered at all: nothing is allocated, nothing leaks.
    stub.emit_hotword_detected();
    stub.emit_say(&SayMessage {
        text: "nobody listens".into(),
        lang: None,
        message_id: None,
        site_id: "default".into(),
        session_id: None,
    });
    assert_eq!(stub.outstanding_event_payloads(), 0);
}

#[test]
fn audio_frames_are_forwarded_with_their_length() {
    let (stub, platform) = platform();
    platform.start().unwrap();

    let frames = vec![0i16; 1_600];
    platform.append_buffer(&frames).unwrap();
    assert!(stub
        .calls()
        .iter()
        .any(|c| matches!(c, colloquy_core::EngineCall::SendAudio { frames: 1_600 })));
}
