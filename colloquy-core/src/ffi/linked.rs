//! Real engine bindings (`clq_*` symbols from `libcolloquy_engine`).
//!
//! Only compiled under the `linked` cargo feature so that the crate and its
//! test suite build on machines without the native library installed; tests
//! use [`super::stub::StubEngine`] instead.

use std::os::raw::{c_char, c_float, c_int, c_void};

use super::driver::*;
use super::types::*;

#[link(name = "colloquy_engine")]
extern "C" {
    fn clq_create(assistant_dir: *const c_char, out_handle: *mut RawHandle) -> c_int;
    fn clq_destroy(handle: RawHandle) -> c_int;
    fn clq_start(handle: RawHandle) -> c_int;
    fn clq_pause(handle: RawHandle) -> c_int;
    fn clq_unpause(handle: RawHandle) -> c_int;

    fn clq_enable_streaming(handle: RawHandle, enabled: u8) -> c_int;
    fn clq_enable_logs(handle: RawHandle, enabled: u8) -> c_int;
    fn clq_enable_watch_html(handle: RawHandle, enabled: u8) -> c_int;
    fn clq_enable_asr_partial(handle: RawHandle, enabled: u8) -> c_int;
    fn clq_set_asr_partial_period_ms(handle: RawHandle, period_ms: u32) -> c_int;
    fn clq_set_hotword_sensitivity(handle: RawHandle, sensitivity: c_float) -> c_int;
    fn clq_set_asr_model_parameters(
        handle: RawHandle,
        parameters: *const CAsrModelParameters,
    ) -> c_int;
    fn clq_enable_injection(
        handle: RawHandle,
        user_data_dir: *const c_char,
        g2p_resources_dir: *const c_char,
    ) -> c_int;

    fn clq_send_audio_buffer(handle: RawHandle, frames: *const i16, frame_count: u32) -> c_int;

    fn clq_dialogue_start_session(
        handle: RawHandle,
        message: *const CStartSessionMessage,
    ) -> c_int;
    fn clq_dialogue_continue_session(
        handle: RawHandle,
        message: *const CContinueSessionMessage,
    ) -> c_int;
    fn clq_dialogue_end_session(handle: RawHandle, message: *const CEndSessionMessage) -> c_int;
    fn clq_notify_tts_finished(handle: RawHandle, message: *const CSayFinishedMessage) -> c_int;
    fn clq_request_injection(
        handle: RawHandle,
        message: *const CInjectionRequestMessage,
    ) -> c_int;
    fn clq_dialogue_configure(
        handle: RawHandle,
        message: *const CDialogueConfigureMessage,
    ) -> c_int;

    fn clq_set_intent_detected_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<IntentTrampoline>,
    ) -> c_int;
    fn clq_set_intent_not_recognized_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<IntentNotRecognizedTrampoline>,
    ) -> c_int;
    fn clq_set_hotword_detected_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<HotwordTrampoline>,
    ) -> c_int;
    fn clq_set_listening_state_changed_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<ListeningStateTrampoline>,
    ) -> c_int;
    fn clq_set_session_started_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SessionStartedTrampoline>,
    ) -> c_int;
    fn clq_set_session_queued_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SessionQueuedTrampoline>,
    ) -> c_int;
    fn clq_set_session_ended_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SessionEndedTrampoline>,
    ) -> c_int;
    fn clq_set_tts_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SayTrampoline>,
    ) -> c_int;
    fn clq_set_text_captured_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<TextCapturedTrampoline>,
    ) -> c_int;
    fn clq_set_partial_text_captured_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<TextCapturedTrampoline>,
    ) -> c_int;
    fn clq_set_injection_complete_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<InjectionCompleteTrampoline>,
    ) -> c_int;
    fn clq_set_component_loaded_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<ComponentLoadedTrampoline>,
    ) -> c_int;
    fn clq_set_watch_handler(
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<WatchTrampoline>,
    ) -> c_int;

    fn clq_get_last_error(out_message: *mut *const c_char) -> c_int;
    fn clq_destroy_string(string: *mut c_char);
    fn clq_destroy_intent_message(message: *mut CIntentMessage);
    fn clq_destroy_intent_not_recognized_message(message: *mut CIntentNotRecognizedMessage);
    fn clq_destroy_session_started_message(message: *mut CSessionStartedMessage);
    fn clq_destroy_session_queued_message(message: *mut CSessionQueuedMessage);
    fn clq_destroy_session_ended_message(message: *mut CSessionEndedMessage);
    fn clq_destroy_say_message(message: *mut CSayMessage);
    fn clq_destroy_text_captured_message(message: *mut CTextCapturedMessage);
    fn clq_destroy_injection_complete_message(message: *mut CInjectionCompleteMessage);
    fn clq_destroy_component_loaded_message(message: *mut CComponentLoadedMessage);
}

/// [`EngineDriver`] backed by the dynamically linked native engine.
#[derive(Debug, Default)]
pub struct LinkedEngine;

impl LinkedEngine {
    pub fn new() -> Self {
        Self
    }
}

impl EngineDriver for LinkedEngine {
    unsafe fn create(&self, assistant_dir: *const c_char, out_handle: *mut RawHandle) -> c_int {
        clq_create(assistant_dir, out_handle)
    }

    unsafe fn destroy(&self, handle: RawHandle) -> c_int {
        clq_destroy(handle)
    }

    unsafe fn start(&self, handle: RawHandle) -> c_int {
        clq_start(handle)
    }

    unsafe fn pause(&self, handle: RawHandle) -> c_int {
        clq_pause(handle)
    }

    unsafe fn unpause(&self, handle: RawHandle) -> c_int {
        clq_unpause(handle)
    }

    unsafe fn enable_streaming(&self, handle: RawHandle, enabled: u8) -> c_int {
        clq_enable_streaming(handle, enabled)
    }

    unsafe fn enable_logs(&self, handle: RawHandle, enabled: u8) -> c_int {
        clq_enable_logs(handle, enabled)
    }

    unsafe fn enable_watch_html(&self, handle: RawHandle, enabled: u8) -> c_int {
        clq_enable_watch_html(handle, enabled)
    }

    unsafe fn enable_asr_partial(&self, handle: RawHandle, enabled: u8) -> c_int {
        clq_enable_asr_partial(handle, enabled)
    }

    unsafe fn set_asr_partial_period_ms(&self, handle: RawHandle, period_ms: u32) -> c_int {
        clq_set_asr_partial_period_ms(handle, period_ms)
    }

    unsafe fn set_hotword_sensitivity(&self, handle: RawHandle, sensitivity: c_float) -> c_int {
        clq_set_hotword_sensitivity(handle, sensitivity)
    }

    unsafe fn set_asr_model_parameters(
        &self,
        handle: RawHandle,
        parameters: *const CAsrModelParameters,
    ) -> c_int {
        clq_set_asr_model_parameters(handle, parameters)
    }

    unsafe fn enable_injection(
        &self,
        handle: RawHandle,
        user_data_dir: *const c_char,
        g2p_resources_dir: *const c_char,
    ) -> c_int {
        clq_enable_injection(handle, user_data_dir, g2p_resources_dir)
    }

    unsafe fn send_audio_buffer(
        &self,
        handle: RawHandle,
        frames: *const i16,
        frame_count: u32,
    ) -> c_int {
        clq_send_audio_buffer(handle, frames, frame_count)
    }

    unsafe fn dialogue_start_session(
        &self,
        handle: RawHandle,
        message: *const CStartSessionMessage,
    ) -> c_int {
        clq_dialogue_start_session(handle, message)
    }

    unsafe fn dialogue_continue_session(
        &self,
        handle: RawHandle,
        message: *const CContinueSessionMessage,
    ) -> c_int {
        clq_dialogue_continue_session(handle, message)
    }

    unsafe fn dialogue_end_session(
        &self,
        handle: RawHandle,
        message: *const CEndSessionMessage,
    ) -> c_int {
        clq_dialogue_end_session(handle, message)
    }

    unsafe fn notify_tts_finished(
        &self,
        handle: RawHandle,
        message: *const CSayFinishedMessage,
    ) -> c_int {
        clq_notify_tts_finished(handle, message)
    }

    unsafe fn request_injection(
        &self,
        handle: RawHandle,
        message: *const CInjectionRequestMessage,
    ) -> c_int {
        clq_request_injection(handle, message)
    }

    unsafe fn dialogue_configure(
        &self,
        handle: RawHandle,
        message: *const CDialogueConfigureMessage,
    ) -> c_int {
        clq_dialogue_configure(handle, message)
    }

    unsafe fn set_intent_detected_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<IntentTrampoline>,
    ) -> c_int {
        clq_set_intent_detected_handler(handle, context, trampoline)
    }

    unsafe fn set_intent_not_recognized_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<IntentNotRecognizedTrampoline>,
    ) -> c_int {
        clq_set_intent_not_recognized_handler(handle, context, trampoline)
    }

    unsafe fn set_hotword_detected_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<HotwordTrampoline>,
    ) -> c_int {
        clq_set_hotword_detected_handler(handle, context, trampoline)
    }

    unsafe fn set_listening_state_changed_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<ListeningStateTrampoline>,
    ) -> c_int {
        clq_set_listening_state_changed_handler(handle, context, trampoline)
    }

    unsafe fn set_session_started_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SessionStartedTrampoline>,
    ) -> c_int {
        clq_set_session_started_handler(handle, context, trampoline)
    }

    unsafe fn set_session_queued_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SessionQueuedTrampoline>,
    ) -> c_int {
        clq_set_session_queued_handler(handle, context, trampoline)
    }

    unsafe fn set_session_ended_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SessionEndedTrampoline>,
    ) -> c_int {
        clq_set_session_ended_handler(handle, context, trampoline)
    }

    unsafe fn set_tts_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SayTrampoline>,
    ) -> c_int {
        clq_set_tts_handler(handle, context, trampoline)
    }

    unsafe fn set_text_captured_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<TextCapturedTrampoline>,
    ) -> c_int {
        clq_set_text_captured_handler(handle, context, trampoline)
    }

    unsafe fn set_partial_text_captured_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<TextCapturedTrampoline>,
    ) -> c_int {
        clq_set_partial_text_captured_handler(handle, context, trampoline)
    }

    unsafe fn set_injection_complete_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<InjectionCompleteTrampoline>,
    ) -> c_int {
        clq_set_injection_complete_handler(handle, context, trampoline)
    }

    unsafe fn set_component_loaded_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<ComponentLoadedTrampoline>,
    ) -> c_int {
        clq_set_component_loaded_handler(handle, context, trampoline)
    }

    unsafe fn set_watch_handler(
        &self,
        handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<WatchTrampoline>,
    ) -> c_int {
        clq_set_watch_handler(handle, context, trampoline)
    }

    unsafe fn get_last_error(&self, out_message: *mut *const c_char) -> c_int {
        clq_get_last_error(out_message)
    }

    unsafe fn destroy_string(&self, string: *mut c_char) {
        clq_destroy_string(string)
    }

    unsafe fn destroy_intent_message(&self, message: *mut CIntentMessage) {
        clq_destroy_intent_message(message)
    }

    unsafe fn destroy_intent_not_recognized_message(
        &self,
        message: *mut CIntentNotRecognizedMessage,
    ) {
        clq_destroy_intent_not_recognized_message(message)
    }

    unsafe fn destroy_session_started_message(&self, message: *mut CSessionStartedMessage) {
        clq_destroy_session_started_message(message)
    }

    unsafe fn destroy_session_queued_message(&self, message: *mut CSessionQueuedMessage) {
        clq_destroy_session_queued_message(message)
    }

    unsafe fn destroy_session_ended_message(&self, message: *mut CSessionEndedMessage) {
        clq_destroy_session_ended_message(message)
    }

    unsafe fn destroy_say_message(&self, message: *mut CSayMessage) {
        clq_destroy_say_message(message)
    }

    unsafe fn destroy_text_captured_message(&self, message: *mut CTextCapturedMessage) {
        clq_destroy_text_captured_message(message)
    }

    unsafe fn destroy_injection_complete_message(&self, message: *mut CInjectionCompleteMessage) {
        clq_destroy_injection_complete_message(message)
    }

    unsafe fn destroy_component_loaded_message(&self, message: *mut CComponentLoadedMessage) {
        clq_destroy_component_loaded_message(message)
    }
}
