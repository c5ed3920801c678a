//! Foreign-memory accounting across the full request surface.
//!
//! Single test on purpose: `live_foreign_allocations` is process-global, so
//! concurrent tests in the same binary would race the counter.

use std::collections::HashMap;
use std::sync::Arc;

use colloquy_core::{
    AsrModelParameters, ColloquyError, ColloquyPlatform, ContinueSessionMessage,
    DialogueConfigureIntent, DialogueConfigureMessage, InjectionKind, InjectionRequestMessage,
    InjectionRequestOperation, PlatformConfig, SayFinishedMessage, SessionInit,
    StartSessionMessage, StubEngine, live_foreign_allocations,
};

#[test]
fn every_request_path_releases_its_foreign_memory() {
    assert_eq!(live_foreign_allocations(), 0);

    let stub = Arc::new(StubEngine::new());
    let mut config = PlatformConfig::new("/opt/assistant");
    config.enable_logs = true;
    config.enable_asr_partial_text = true;
    config.asr_model_parameters = Some(AsrModelParameters {
        beam_size: Some(4),
        lm_weight: None,
        endpointing_ms: Some(400),
    });
    config.enable_injection = true;
    config.user_data_dir = Some(std::env::temp_dir().join("colloquy-alloc-test"));
    let platform = ColloquyPlatform::with_driver(stub.clone(), &config).unwrap();
    let rx = platform.subscribe().unwrap();
    platform.start().unwrap();

    // The whole dialogue surface, happy path.
    platform
        .start_session(&StartSessionMessage {
            init: SessionInit::Action {
                text: Some("yes?".into()),
                intent_filter: Some(vec!["searchWeatherForecast".into()]),
                can_be_enqueued: false,
                send_intent_not_recognized: true,
            },
            custom_data: Some("abc".into()),
            site_id: Some("kitchen".into()),
        })
        .unwrap();
    let session_id = stub.active_session_id().unwrap();
    platform
        .continue_session(&ContinueSessionMessage {
            session_id: session_id.clone(),
            text: Some("which city?".into()),
            intent_filter: None,
            custom_data: None,
            send_intent_not_recognized: false,
        })
        .unwrap();
    platform
        .notify_speech_ended(&SayFinishedMessage {
            message_id: Some("say-1".into()),
            session_id: Some(session_id.clone()),
        })
        .unwrap();
    platform.end_session(&session_id, Some("bye")).unwrap();

    let mut entities = HashMap::new();
    entities.insert("locality".to_string(), vec!["oz".to_string()]);
    let mut lexicon = HashMap::new();
    lexicon.insert("oz".to_string(), vec!["Oh z".to_string()]);
    platform
        .request_injection(&InjectionRequestMessage {
            operations: vec![InjectionRequestOperation {
                entities,
                kind: InjectionKind::AddFromVanilla,
            }],
            lexicon,
            cross_language: Some("en".into()),
            request_id: Some("req-1".into()),
        })
        .unwrap();
    platform
        .configure_dialogue(&DialogueConfigureMessage {
            site_id: Some("kitchen".into()),
            intents: vec![DialogueConfigureIntent {
                intent_id: "searchWeatherForecast".into(),
                enable: true,
            }],
        })
        .unwrap();
    platform.append_buffer(&[0i16; 320]).unwrap();
    platform
        .set_asr_model_parameters(AsrModelParameters::default())
        .unwrap();
    platform.set_hotword_sensitivity(0.7).unwrap();

    // Failure paths must release just the same.
    let err = platform
        .start_notification("broken\0payload", None)
        .unwrap_err();
    assert!(matches!(err, ColloquyError::InteriorNul(_)));

    stub.fail_next_call("decoder busy");
    let err = platform.end_session(&session_id, None).unwrap_err();
    assert!(matches!(err, ColloquyError::Engine(m) if m == "decoder busy"));

    platform.destroy().unwrap();
    drop(platform);
    drop(rx);

    assert_eq!(live_foreign_allocations(), 0, "encode-side memory leaked");
    assert_eq!(
        stub.outstanding_event_payloads(),
        0,
        "event payloads were not reclaimed"
    );
}
