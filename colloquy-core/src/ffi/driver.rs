//! The engine call table, expressed as a trait.
//!
//! `EngineDriver` is the seam between the binding and the opaque engine:
//! production code links the real C symbols behind it (see `ffi::linked`,
//! cargo feature `linked`), while tests drive the whole crate through
//! `ffi::stub::StubEngine`. Methods mirror the native signatures one-to-one,
//! raw pointers included, so the trait adds no marshalling of its own.
//!
//! Handler registration carries a `user_data` context pointer alongside the
//! trampoline, which the engine passes back verbatim on every invocation.
//! That is what lets handler state live on the platform instance instead of
//! in process-wide storage.

use std::os::raw::{c_char, c_float, c_int, c_void};

use super::types::*;

/// Status code for a successful engine call; anything else is a failure and
/// the detail is available through [`EngineDriver::get_last_error`].
pub const STATUS_OK: c_int = 0;
/// Generic failure status.
pub const STATUS_ERROR: c_int = 1;

/// Opaque engine instance pointer.
pub type RawHandle = *mut c_void;

// Trampoline signatures, one per event kind. The first argument is always
// the `user_data` context supplied at registration.
pub type IntentTrampoline = extern "C" fn(*mut c_void, *const CIntentMessage);
pub type IntentNotRecognizedTrampoline =
    extern "C" fn(*mut c_void, *const CIntentNotRecognizedMessage);
pub type HotwordTrampoline = extern "C" fn(*mut c_void);
pub type ListeningStateTrampoline = extern "C" fn(*mut c_void, u8);
pub type SessionStartedTrampoline = extern "C" fn(*mut c_void, *const CSessionStartedMessage);
pub type SessionQueuedTrampoline = extern "C" fn(*mut c_void, *const CSessionQueuedMessage);
pub type SessionEndedTrampoline = extern "C" fn(*mut c_void, *const CSessionEndedMessage);
pub type SayTrampoline = extern "C" fn(*mut c_void, *const CSayMessage);
pub type TextCapturedTrampoline = extern "C" fn(*mut c_void, *const CTextCapturedMessage);
pub type InjectionCompleteTrampoline =
    extern "C" fn(*mut c_void, *const CInjectionCompleteMessage);
pub type ComponentLoadedTrampoline = extern "C" fn(*mut c_void, *const CComponentLoadedMessage);
pub type WatchTrampoline = extern "C" fn(*mut c_void, *const c_char);

/// The native call table.
///
/// All methods are `unsafe`: callers must uphold the native contract (live
/// handle, well-formed message pointers, context outliving registrations).
/// Implementations must be callable from any thread — the engine invokes
/// trampolines from its own internal threads, and registration may race with
/// delivery.
#[allow(clippy::missing_safety_doc)]
pub trait EngineDriver: Send + Sync {
    // -- lifecycle ----------------------------------------------------------
    unsafe fn create(&self, assistant_dir: *const c_char, out_handle: *mut RawHandle) -> c_int;
    unsafe fn destroy(&self, handle: RawHandle) -> c_int;
    unsafe fn start(&self, handle: RawHandle) -> c_int;
    unsafe fn pause(&self, handle: RawHandle) -> c_int;
    unsafe fn unpause(&self, handle: RawHandle) -> c_int;

    // -- configuration ------------------------------------------------------
    unsafe fn enable_streaming(&self, handle: RawHandle, enabled: u8) -> c_int;
    unsafe fn enable_logs(&self, handle: RawHandle, enabled: u8) -> c_int;
    unsafe fn enable_watch_html(&self, handle: RawHandle, enabled: u8) -> c_int;
    unsafe fn enable_asr_partial(&self, handle: RawHandle, enabled: u8) -> c_int;
    unsafe fn set_asr_partial_period_ms(&self, handle: RawHandle, period_ms: u32) -> c_int;
    unsafe fn set_hotword_sensitivity(&self, handle: RawHandle, sensitivity: c_float) -> c_int;
    unsafe fn set_asr_model_parameters(
        &self,
        handle: RawHandle,
        parameters: *const CAsrModelParameters,
    ) -> c_int;
    unsafe fn enable_injection(
        &self,
        handle: RawHandle,
        user_data_dir: *const c_char,
        g2p_resources_dir: *const c_char,
    ) -> c_int;

    // -- audio --------------------------------------------------------------
    unsafe fn send_audio_buffer(
        &self,
        handle: RawHandle,
        frames: *const i16,
        frame_count: u32,
    ) -> c_int;

    // -- dialogue -----------------------------------------------------------
    unsafe fn dialogue_start_session(
        &self,
        handle: RawHandle,
        message: *const CStartSessionMessage,
    ) -> c_int;
    unsafe fn dialogue_continue_session(
        &self,
        handle: RawHandle,
        message: *const CContinueSessionMessage,
    ) -> c_int;
    unsafe fn dialogue_end_session(
        &self,
        handle: RawHandle,
        message: *const CEndSessionMessage,
    ) -> c_int;
    unsafe fn notify_tts_finished(
        &self,
        handle: RawHandle,
        message: *const CSayFinishedMessage,
    ) -> c_int;
    unsafe fn request_injection(
        &self,
        handle: RawHandle,
        message: *const CInjectionRequestMessage,
    ) -> c_int;
    unsafe fn dialogue_configure(
        &self,
        handle: RawHandle,
        message: *const CDialogueConfigureMessage,
    ) -> c_int;

    // -- event handler registration (None detaches) -------------------------
    unsafe fn set_intent_detected_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<IntentTrampoline>,
    ) -> c_int;
    unsafe fn set_intent_not_recognized_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<IntentNotRecognizedTrampoline>,
    ) -> c_int;
    unsafe fn set_hotword_detected_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<HotwordTrampoline>,
    ) -> c_int;
    unsafe fn set_listening_state_changed_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<ListeningStateTrampoline>,
    ) -> c_int;
    unsafe fn set_session_started_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SessionStartedTrampoline>,
    ) -> c_int;
    unsafe fn set_session_queued_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SessionQueuedTrampoline>,
    ) -> c_int;
    unsafe fn set_session_ended_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SessionEndedTrampoline>,
    ) -> c_int;
    unsafe fn set_tts_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SayTrampoline>,
    ) -> c_int;
    unsafe fn set_text_captured_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<TextCapturedTrampoline>,
    ) -> c_int;
    unsafe fn set_partial_text_captured_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<TextCapturedTrampoline>,
    ) -> c_int;
    unsafe fn set_injection_complete_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<InjectionCompleteTrampoline>,
    ) -> c_int;
    unsafe fn set_component_loaded_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<ComponentLoadedTrampoline>,
    ) -> c_int;
    unsafe fn set_watch_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<WatchTrampoline>,
    ) -> c_int;

    // -- errors & foreign-memory teardown -----------------------------------
    unsafe fn get_last_error(&self, out_message: *mut *const c_char) -> c_int;
    unsafe fn destroy_string(&self, string: *mut c_char);
    unsafe fn destroy_intent_message(&self, message: *mut CIntentMessage);
    unsafe fn destroy_intent_not_recognized_message(
        &self,
        message: *mut CIntentNotRecognizedMessage,
    );
    unsafe fn destroy_session_started_message(&self, message: *mut CSessionStartedMessage);
    unsafe fn destroy_session_queued_message(&self, message: *mut CSessionQueuedMessage);
    unsafe fn destroy_session_ended_message(&self, message: *mut CSessionEndedMessage);
    unsafe fn destroy_say_message(&self, message: *mut CSayMessage);
    unsafe fn destroy_text_captured_message(&self, message: *mut CTextCapturedMessage);
    unsafe fn destroy_injection_complete_message(&self, message: *mut CInjectionCompleteMessage);
    unsafe fn destroy_component_loaded_message(&self, message: *mut CComponentLoadedMessage);
}
