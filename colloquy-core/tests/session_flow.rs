//! Dialogue session flows against the stub engine: event ordering, custom
//! data round-trips, queueing, and termination reasons.

use std::sync::Arc;

use colloquy_core::{
    ColloquyPlatform, PlatformConfig, PlatformEvent, SessionInit, SessionTerminationType,
    StartSessionMessage, StubEngine,
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
fn notification_session_starts_and_ends_nominally() {
    let (_stub, platform) = platform();
    let rx = platform.subscribe().unwrap();
    platform.start().unwrap();

    platform.start_notification("Hello", Some("abc")).unwrap();
    let events = drain(&rx);
    let [PlatformEvent::SessionStarted(started)] = events.as_slice() else {
        panic!("expected a single sessionStarted, got {events:?}");
    };
    assert_eq!(started.custom_data.as_deref(), Some("abc"));
    assert_eq!(started.site_id, "default");

    platform.end_session(&started.session_id, None).unwrap();
    let events = drain(&rx);
    let [PlatformEvent::SessionEnded(ended)] = events.as_slice() else {
        panic!("expected a single sessionEnded, got {events:?}");
    };
    assert_eq!(ended.session_id, started.session_id);
    assert_eq!(ended.custom_data.as_deref(), Some("abc"));
    assert_eq!(
        ended.termination.termination_type,
        SessionTerminationType::Nominal
    );
}

#[test]
fn empty_intent_filter_terminates_with_intent_not_recognized() {
    let (_stub, platform) = platform();
    let rx = platform.subscribe().unwrap();
    platform.start().unwrap();

    platform.start_action(Some("yes?"), Some(&[]), false, false).unwrap();
    let events = drain(&rx);
    assert_eq!(events.len(), 2, "got {events:?}");
    assert!(matches!(events[0], PlatformEvent::SessionStarted(_)));
    let PlatformEvent::SessionEnded(ended) = &events[1] else {
        panic!("expected sessionEnded, got {:?}", events[1]);
    };
    assert_eq!(
        ended.termination.termination_type,
        SessionTerminationType::IntentNotRecognized
    );
}

#[test]
fn unknown_intent_in_filter_terminates_with_error() {
    let (stub, platform) = platform();
    stub.set_known_intents(["searchWeatherForecast"]);
    let rx = platform.subscribe().unwrap();
    platform.start().unwrap();

    platform
        .start_action(None, Some(&["searchWeatherForecast", "makeCoffee"]), false, false)
        .unwrap();
    let events = drain(&rx);
    let Some(PlatformEvent::SessionEnded(ended)) = events.last() else {
        panic!("expected sessionEnded, got {events:?}");
    };
    assert_eq!(
        ended.termination.termination_type,
        SessionTerminationType::Error
    );
    let detail = ended.termination.data.as_deref().unwrap();
    assert!(detail.contains("makeCoffee"), "detail was {detail:?}");
}

#[test]
fn enqueued_session_is_promoted_when_the_active_one_ends() {
    let (_stub, platform) = platform();
    let rx = platform.subscribe().unwrap();
    platform.start().unwrap();

    platform.start_action(None, None, false, false).unwrap();
    let events = drain(&rx);
    let [PlatformEvent::SessionStarted(first)] = events.as_slice() else {
        panic!("expected sessionStarted, got {events:?}");
    };
    let first_id = first.session_id.clone();

    platform.start_action(None, None, true, false).unwrap();
    let events = drain(&rx);
    let [PlatformEvent::SessionQueued(queued)] = events.as_slice() else {
        panic!("expected sessionQueued, got {events:?}");
    };
    let queued_id = queued.session_id.clone();
    assert_ne!(queued_id, first_id);

    platform.end_session(&first_id, None).unwrap();
    let events = drain(&rx);
    assert_eq!(events.len(), 2, "got {events:?}");
    let PlatformEvent::SessionEnded(ended) = &events[0] else {
        panic!("expected sessionEnded first, got {:?}", events[0]);
    };
    assert_eq!(ended.session_id, first_id);
    let PlatformEvent::SessionStarted(promoted) = &events[1] else {
        panic!("expected sessionStarted second, got {:?}", events[1]);
    };
    assert_eq!(promoted.session_id, queued_id);
    assert_eq!(
        promoted.reactivated_from_session_id.as_deref(),
        Some(first_id.as_str())
    );
}

#[test]
fn ending_an_unknown_session_is_acknowledged_without_events() {
    let (_stub, platform) = platform();
    let rx = platform.subscribe().unwrap();
    platform.start().unwrap();

    platform.end_session("no-such-session", None).unwrap();
    assert!(drain(&rx).is_empty());
}

#[test]
fn start_request_reaches_the_engine_intact() {
    let (stub, platform) = platform();
    platform.start().unwrap();

    let message = StartSessionMessage {
        init: SessionInit::Action {
            text: Some("speak up".into()),
            intent_filter: Some(vec!["turnOnLights".into()]),
            can_be_enqueued: false,
            send_intent_not_recognized: true,
        },
        custom_data: Some("{\"room\":\"kitchen\"}".into()),
        site_id: Some("kitchen".into()),
    };
    platform.start_session(&message).unwrap();

    let requests = stub.start_session_requests();
    assert_eq!(requests, vec![message]);
}

#[test]
fn two_platform_instances_dispatch_independently() {
    let (stub_a, platform_a) = platform();
    let (stub_b, platform_b) = platform();
    let rx_a = platform_a.subscribe().unwrap();
    let rx_b = platform_b.subscribe().unwrap();
    platform_a.start().unwrap();
    platform_b.start().unwrap();

    platform_a.start_notification("only on a", None).unwrap();
    assert_eq!(drain(&rx_a).len(), 1);
    assert!(drain(&rx_b).is_empty());
    assert!(stub_b.start_session_requests().is_empty());
    assert_eq!(stub_a.start_session_requests().len(), 1);
}
