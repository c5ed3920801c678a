//! Event dispatch: the bridge from engine trampolines to host handlers.
//!
//! The engine calls back on its own threads with a context pointer and a
//! borrowed C payload. Each trampoline here:
//!
//! 1. recovers the [`DispatchContext`] from the context pointer,
//! 2. arms a reclaim guard so the payload's `destroy_*` runs on every exit,
//! 3. decodes the payload into an owned message,
//! 4. hands the message to the registered handler, fenced by `catch_unwind`
//!    so a panicking handler cannot unwind across the C boundary.
//!
//! Handler state lives on the context, not in process-wide storage, so two
//! platform instances in one process dispatch independently.

use std::os::raw::{c_char, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ffi::driver::EngineDriver;
use crate::ffi::read_opt_string;
use crate::ffi::types::*;
use crate::ontology::{
    ComponentLoadedMessage, InjectionCompleteMessage, IntentMessage, IntentNotRecognizedMessage,
    SayMessage, SessionEndedMessage, SessionQueuedMessage, SessionStartedMessage,
    TextCapturedMessage,
};

/// One registered handler. Cloned out under the lock and invoked after it is
/// released, so a handler may re-enter the platform freely.
pub(crate) struct HandlerSlot<T> {
    handler: Mutex<Option<Arc<dyn Fn(T) + Send + Sync>>>,
}

impl<T> Default for HandlerSlot<T> {
    fn default() -> Self {
        Self {
            handler: Mutex::new(None),
        }
    }
}

impl<T> HandlerSlot<T> {
    pub(crate) fn set(&self, handler: impl Fn(T) + Send + Sync + 'static) {
        *self.handler.lock() = Some(Arc::new(handler));
    }

    pub(crate) fn clear(&self) {
        *self.handler.lock() = None;
    }

    fn current(&self) -> Option<Arc<dyn Fn(T) + Send + Sync>> {
        self.handler.lock().clone()
    }
}

/// The full handler registry, one slot per event kind.
#[derive(Default)]
pub(crate) struct HandlerSlots {
    pub(crate) intent: HandlerSlot<IntentMessage>,
    pub(crate) intent_not_recognized: HandlerSlot<IntentNotRecognizedMessage>,
    pub(crate) hotword: HandlerSlot<()>,
    pub(crate) listening_state: HandlerSlot<bool>,
    pub(crate) session_started: HandlerSlot<SessionStartedMessage>,
    pub(crate) session_queued: HandlerSlot<SessionQueuedMessage>,
    pub(crate) session_ended: HandlerSlot<SessionEndedMessage>,
    pub(crate) say: HandlerSlot<SayMessage>,
    pub(crate) text_captured: HandlerSlot<TextCapturedMessage>,
    pub(crate) partial_text_captured: HandlerSlot<TextCapturedMessage>,
    pub(crate) injection_complete: HandlerSlot<InjectionCompleteMessage>,
    pub(crate) component_loaded: HandlerSlot<ComponentLoadedMessage>,
    pub(crate) watch: HandlerSlot<String>,
}

impl HandlerSlots {
    pub(crate) fn clear_all(&self) {
        self.intent.clear();
        self.intent_not_recognized.clear();
        self.hotword.clear();
        self.listening_state.clear();
        self.session_started.clear();
        self.session_queued.clear();
        self.session_ended.clear();
        self.say.clear();
        self.text_captured.clear();
        self.partial_text_captured.clear();
        self.injection_complete.clear();
        self.component_loaded.clear();
        self.watch.clear();
    }
}

/// Per-instance dispatch state. Its address is the `user_data` registered
/// with the engine; it must stay pinned behind an `Arc` until every handler
/// registration has been detached.
pub(crate) struct DispatchContext {
    pub(crate) driver: Arc<dyn EngineDriver>,
    pub(crate) slots: HandlerSlots,
}

impl DispatchContext {
    pub(crate) fn new(driver: Arc<dyn EngineDriver>) -> Self {
        Self {
            driver,
            slots: HandlerSlots::default(),
        }
    }
}

/// # Safety
/// `ptr` must be the address of a live `DispatchContext` registered by this
/// crate.
unsafe fn context_from_raw<'a>(ptr: *mut c_void) -> &'a DispatchContext {
    &*(ptr as *const DispatchContext)
}

fn deliver<T>(slot: &HandlerSlot<T>, kind: &'static str, value: T) {
    if let Some(handler) = slot.current() {
        if catch_unwind(AssertUnwindSafe(|| handler(value))).is_err() {
            tracing::error!(event = kind, "event handler panicked");
        }
    }
}

// ─── Trampolines ───────────────────────────────────────────────────────────

macro_rules! message_trampoline {
    ($name:ident, $ctype:ty, $slot:ident, $message:ty, $destroy:ident, $kind:literal) => {
        pub(crate) extern "C" fn $name(context: *mut c_void, message: *const $ctype) {
            if context.is_null() || message.is_null() {
                tracing::error!(event = $kind, "engine delivered a null event");
                return;
            }
            let ctx = unsafe { context_from_raw(context) };

            struct Reclaim<'a> {
                driver: &'a dyn EngineDriver,
                message: *mut $ctype,
            }
            impl Drop for Reclaim<'_> {
                fn drop(&mut self) {
                    unsafe { self.driver.$destroy(self.message) };
                }
            }
            let _reclaim = Reclaim {
                driver: &*ctx.driver,
                message: message as *mut $ctype,
            };

            match unsafe { <$message>::from_c(&*message) } {
                Ok(value) => deliver(&ctx.slots.$slot, $kind, value),
                Err(err) => {
                    tracing::error!(event = $kind, error = %err, "failed to decode engine event")
                }
            }
        }
    };
}

message_trampoline!(
    intent_trampoline,
    CIntentMessage,
    intent,
    IntentMessage,
    destroy_intent_message,
    "intentDetected"
);
message_trampoline!(
    intent_not_recognized_trampoline,
    CIntentNotRecognizedMessage,
    intent_not_recognized,
    IntentNotRecognizedMessage,
    destroy_intent_not_recognized_message,
    "intentNotRecognized"
);
message_trampoline!(
    session_started_trampoline,
    CSessionStartedMessage,
    session_started,
    SessionStartedMessage,
    destroy_session_started_message,
    "sessionStarted"
);
message_trampoline!(
    session_queued_trampoline,
    CSessionQueuedMessage,
    session_queued,
    SessionQueuedMessage,
    destroy_session_queued_message,
    "sessionQueued"
);
message_trampoline!(
    session_ended_trampoline,
    CSessionEndedMessage,
    session_ended,
    SessionEndedMessage,
    destroy_session_ended_message,
    "sessionEnded"
);
message_trampoline!(
    say_trampoline,
    CSayMessage,
    say,
    SayMessage,
    destroy_say_message,
    "say"
);
message_trampoline!(
    text_captured_trampoline,
    CTextCapturedMessage,
    text_captured,
    TextCapturedMessage,
    destroy_text_captured_message,
    "textCaptured"
);
message_trampoline!(
    partial_text_captured_trampoline,
    CTextCapturedMessage,
    partial_text_captured,
    TextCapturedMessage,
    destroy_text_captured_message,
    "partialTextCaptured"
);
message_trampoline!(
    injection_complete_trampoline,
    CInjectionCompleteMessage,
    injection_complete,
    InjectionCompleteMessage,
    destroy_injection_complete_message,
    "injectionComplete"
);
message_trampoline!(
    component_loaded_trampoline,
    CComponentLoadedMessage,
    component_loaded,
    ComponentLoadedMessage,
    destroy_component_loaded_message,
    "componentLoaded"
);

pub(crate) extern "C" fn hotword_trampoline(context: *mut c_void) {
    if context.is_null() {
        return;
    }
    let ctx = unsafe { context_from_raw(context) };
    deliver(&ctx.slots.hotword, "hotwordDetected", ());
}

pub(crate) extern "C" fn listening_state_trampoline(context: *mut c_void, listening: u8) {
    if context.is_null() {
        return;
    }
    let ctx = unsafe { context_from_raw(context) };
    deliver(&ctx.slots.listening_state, "listeningStateChanged", listening != 0);
}

pub(crate) extern "C" fn watch_trampoline(context: *mut c_void, line: *const c_char) {
    if context.is_null() {
        return;
    }
    let ctx = unsafe { context_from_raw(context) };
    let copied = unsafe { read_opt_string(line) };
    unsafe { ctx.driver.destroy_string(line as *mut c_char) };
    if let Some(line) = copied {
        deliver(&ctx.slots.watch, "watch", line);
    }
}
