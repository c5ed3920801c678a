//! Lifecycle state machine: transition validation, destroy semantics, and
//! handler attach/detach behavior.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use colloquy_core::{
    ColloquyError, ColloquyPlatform, EngineCall, LifecycleState, PlatformConfig, StubEngine,
};

fn platform() -> (Arc<StubEngine>, ColloquyPlatform) {
    let stub = Arc::new(StubEngine::new());
    let platform =
        ColloquyPlatform::with_driver(stub.clone(), &PlatformConfig::new("/opt/assistant"))
            .expect("platform creation");
    (stub, platform)
}

#[test]
fn start_pause_unpause_walks_the_state_machine() {
    let (_stub, platform) = platform();
    assert_eq!(platform.state(), LifecycleState::Created);

    platform.start().unwrap();
    assert_eq!(platform.state(), LifecycleState::Started);

    platform.pause().unwrap();
    assert_eq!(platform.state(), LifecycleState::Paused);

    platform.unpause().unwrap();
    assert_eq!(platform.state(), LifecycleState::Started);
}

#[test]
fn start_resumes_a_paused_platform() {
    let (_stub, platform) = platform();
    platform.start().unwrap();
    platform.pause().unwrap();

    platform.start().unwrap();
    assert_eq!(platform.state(), LifecycleState::Started);
}

#[test]
fn out_of_order_transitions_are_rejected_locally() {
    let (stub, platform) = platform();
    let calls_before = stub.calls().len();

    let err = platform.pause().unwrap_err();
    assert!(matches!(err, ColloquyError::InvalidState { operation: "pause", .. }));

    platform.start().unwrap();
    let err = platform.start().unwrap_err();
    assert!(matches!(err, ColloquyError::InvalidState { operation: "start", .. }));

    // Only the one successful start() reached the engine.
    let starts = stub
        .calls()
        .iter()
        .skip(calls_before)
        .filter(|c| matches!(c, EngineCall::Start))
        .count();
    assert_eq!(starts, 1);
}

#[test]
fn engine_failure_surfaces_the_last_error_and_keeps_state() {
    let (stub, platform) = platform();
    stub.fail_next_call("model checksum mismatch");

    let err = platform.start().unwrap_err();
    let ColloquyError::Engine(message) = err else {
        panic!("expected an engine error, got {err:?}");
    };
    assert_eq!(message, "model checksum mismatch");
    assert_eq!(platform.state(), LifecycleState::Created);

    // The failure was transient; a retry goes through.
    platform.start().unwrap();
    assert_eq!(platform.state(), LifecycleState::Started);
}

#[test]
fn create_failure_reports_the_engine_message() {
    let stub = Arc::new(StubEngine::new());
    stub.fail_next_call("assistant dir not found");
    let err = ColloquyPlatform::with_driver(stub, &PlatformConfig::new("/missing")).unwrap_err();
    assert!(matches!(err, ColloquyError::Engine(m) if m == "assistant dir not found"));
}

#[test]
fn configuration_failure_destroys_the_half_built_instance() {
    let stub = Arc::new(StubEngine::new());
    stub.fail_on_call("enable_streaming", "streaming unsupported");

    let err = ColloquyPlatform::with_driver(stub.clone(), &PlatformConfig::new("/opt/assistant"))
        .unwrap_err();
    assert!(matches!(err, ColloquyError::Engine(m) if m == "streaming unsupported"));

    let calls = stub.calls();
    assert!(calls.iter().any(|c| matches!(c, EngineCall::Create { .. })));
    let destroys = calls
        .iter()
        .filter(|c| matches!(c, EngineCall::Destroy))
        .count();
    assert_eq!(destroys, 1, "the fresh handle must be torn down");
}

#[test]
fn destroy_is_idempotent_and_terminal() {
    let (stub, platform) = platform();
    platform.start().unwrap();

    platform.destroy().unwrap();
    assert_eq!(platform.state(), LifecycleState::Destroyed);
    platform.destroy().unwrap();

    let err = platform.start().unwrap_err();
    assert!(matches!(err, ColloquyError::EngineNotAvailable));
    let err = platform.append_buffer(&[0i16; 320]).unwrap_err();
    assert!(matches!(err, ColloquyError::EngineNotAvailable));
    let err = platform.start_notification("hi", None).unwrap_err();
    assert!(matches!(err, ColloquyError::EngineNotAvailable));

    drop(platform);
    let destroys = stub
        .calls()
        .iter()
        .filter(|c| matches!(c, EngineCall::Destroy))
        .count();
    assert_eq!(destroys, 1, "native destroy must run exactly once");
}

#[test]
fn destroy_detaches_every_handler_first() {
    let (stub, platform) = platform();
    let _rx = platform.subscribe().unwrap();
    platform.start().unwrap();
    let calls_before = stub.calls().len();

    platform.destroy().unwrap();
    let calls = stub.calls();
    let detachments = calls[calls_before..]
        .iter()
        .filter(|c| matches!(c, EngineCall::SetHandler { attached: false, .. }))
        .count();
    assert_eq!(detachments, 13);
    // Detachment precedes the native destroy.
    let destroy_at = calls
        .iter()
        .position(|c| matches!(c, EngineCall::Destroy))
        .unwrap();
    let last_detach = calls
        .iter()
        .rposition(|c| matches!(c, EngineCall::SetHandler { attached: false, .. }))
        .unwrap();
    assert!(last_detach < destroy_at);
}

#[test]
fn cleared_handlers_no_longer_fire() {
    let (stub, platform) = platform();
    platform.start().unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    platform
        .on_hotword_detected(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    stub.emit_hotword_detected();
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    platform.clear_hotword_detected().unwrap();
    stub.emit_hotword_detected();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn registering_a_handler_replaces_the_previous_one() {
    let (stub, platform) = platform();
    platform.start().unwrap();

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    {
        let first = first.clone();
        platform
            .on_listening_state_changed(move |_| {
                first.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }
    {
        let second = second.clone();
        platform
            .on_listening_state_changed(move |_| {
                second.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    stub.emit_listening_state(true);
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn panicking_handler_does_not_poison_dispatch() {
    let (stub, platform) = platform();
    platform.start().unwrap();

    platform
        .on_listening_state_changed(|_| panic!("handler bug"))
        .unwrap();
    // The panic is caught at the dispatch boundary.
    stub.emit_listening_state(true);

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    platform
        .on_listening_state_changed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    stub.emit_listening_state(false);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}
