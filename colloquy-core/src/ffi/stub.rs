//! A scripted in-process engine for tests.
//!
//! `StubEngine` implements the whole [`EngineDriver`] call table without any
//! native code. It records every call it receives, can be told to fail the
//! next one, and runs a small dialogue autopilot so session requests produce
//! the event sequences a real engine would: started, queued, ended with a
//! termination reason, injection completions.
//!
//! Event payloads are real heap-allocated C structures, handed to the
//! registered trampoline and reclaimed through the driver's `destroy_*`
//! methods, so the stub exercises the exact ownership protocol the linked
//! engine uses. `outstanding_event_payloads` exposes the balance.
//!
//! No stub lock is held while a trampoline runs: handlers are allowed to call
//! straight back into the driver.

use std::collections::{HashSet, VecDeque};
use std::ffi::CString;
use std::os::raw::{c_char, c_float, c_int, c_void};
use std::sync::atomic::{AtomicIsize, Ordering};

use parking_lot::Mutex;

use super::driver::*;
use super::types::*;
use crate::error::Result;
use crate::ontology::{
    ComponentLoadedMessage, ContinueSessionMessage, DialogueConfigureMessage, EndSessionMessage,
    InjectionRequestMessage, IntentMessage, IntentNotRecognizedMessage, SayFinishedMessage,
    SayMessage, SessionEndedMessage, SessionInit, SessionQueuedMessage, SessionStartedMessage,
    SessionTermination, SessionTerminationType, SlotValue, StartSessionMessage,
    TextCapturedMessage,
};

// ---------------------------------------------------------------------------
// Call log
// ---------------------------------------------------------------------------

/// One recorded driver invocation, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Create { assistant_dir: String },
    Destroy,
    Start,
    Pause,
    Unpause,
    EnableStreaming(bool),
    EnableLogs(bool),
    EnableWatchHtml(bool),
    EnableAsrPartial(bool),
    SetAsrPartialPeriodMs(u32),
    SetHotwordSensitivity(f32),
    SetAsrModelParameters { beam_size: i32, lm_weight: f32, endpointing_ms: i32 },
    EnableInjection { user_data_dir: String, g2p_resources_dir: Option<String> },
    SendAudio { frames: u32 },
    StartSession,
    ContinueSession,
    EndSession,
    NotifyTtsFinished,
    RequestInjection,
    DialogueConfigure,
    SetHandler { kind: &'static str, attached: bool },
}

impl EngineCall {
    fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Destroy => "destroy",
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::EnableStreaming(_) => "enable_streaming",
            Self::EnableLogs(_) => "enable_logs",
            Self::EnableWatchHtml(_) => "enable_watch_html",
            Self::EnableAsrPartial(_) => "enable_asr_partial",
            Self::SetAsrPartialPeriodMs(_) => "set_asr_partial_period_ms",
            Self::SetHotwordSensitivity(_) => "set_hotword_sensitivity",
            Self::SetAsrModelParameters { .. } => "set_asr_model_parameters",
            Self::EnableInjection { .. } => "enable_injection",
            Self::SendAudio { .. } => "send_audio_buffer",
            Self::StartSession => "start_session",
            Self::ContinueSession => "continue_session",
            Self::EndSession => "end_session",
            Self::NotifyTtsFinished => "notify_tts_finished",
            Self::RequestInjection => "request_injection",
            Self::DialogueConfigure => "dialogue_configure",
            Self::SetHandler { .. } => "set_handler",
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct LiveSession {
    session_id: String,
    custom_data: Option<String>,
    site_id: String,
}

#[derive(Default)]
struct StubState {
    calls: Vec<EngineCall>,
    fail_next: Option<String>,
    fail_op: Option<(String, String)>,
    last_error: Option<String>,
    next_session: u64,
    active: Option<LiveSession>,
    queue: VecDeque<LiveSession>,
    /// None accepts every intent name; Some restricts filters to this set.
    known_intents: Option<HashSet<String>>,
    start_sessions: Vec<StartSessionMessage>,
    continue_sessions: Vec<ContinueSessionMessage>,
    end_sessions: Vec<EndSessionMessage>,
    say_finished: Vec<SayFinishedMessage>,
    injections: Vec<InjectionRequestMessage>,
    configures: Vec<DialogueConfigureMessage>,
}

type Slot<F> = Mutex<Option<(usize, F)>>;

#[derive(Default)]
struct Handlers {
    intent: Slot<IntentTrampoline>,
    intent_not_recognized: Slot<IntentNotRecognizedTrampoline>,
    hotword: Slot<HotwordTrampoline>,
    listening_state: Slot<ListeningStateTrampoline>,
    session_started: Slot<SessionStartedTrampoline>,
    session_queued: Slot<SessionQueuedTrampoline>,
    session_ended: Slot<SessionEndedTrampoline>,
    say: Slot<SayTrampoline>,
    text_captured: Slot<TextCapturedTrampoline>,
    partial_text_captured: Slot<TextCapturedTrampoline>,
    injection_complete: Slot<InjectionCompleteTrampoline>,
    component_loaded: Slot<ComponentLoadedTrampoline>,
    watch: Slot<WatchTrampoline>,
}

/// Events decided under the state lock, fired after it is released.
enum PendingEvent {
    Started(SessionStartedMessage),
    Queued(SessionQueuedMessage),
    Ended(SessionEndedMessage),
    InjectionComplete(Option<String>),
}

/// The scripted engine.
#[derive(Default)]
pub struct StubEngine {
    state: Mutex<StubState>,
    handlers: Handlers,
    outstanding: AtomicIsize,
}

impl StubEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // -- test controls ------------------------------------------------------

    /// Makes the next fallible driver call return `STATUS_ERROR` with this
    /// message retrievable through `get_last_error`.
    pub fn fail_next_call(&self, message: impl Into<String>) {
        self.state.lock().fail_next = Some(message.into());
    }

    /// Makes the first call of the named kind fail (e.g. `"enable_streaming"`,
    /// `"start_session"`). Calls of other kinds pass through untouched.
    pub fn fail_on_call(&self, operation: impl Into<String>, message: impl Into<String>) {
        self.state.lock().fail_op = Some((operation.into(), message.into()));
    }

    /// Restricts intent filters: a start request whose filter names an intent
    /// outside this set ends its session with an error termination.
    pub fn set_known_intents(&self, intents: impl IntoIterator<Item = impl Into<String>>) {
        self.state.lock().known_intents =
            Some(intents.into_iter().map(Into::into).collect());
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    pub fn start_session_requests(&self) -> Vec<StartSessionMessage> {
        self.state.lock().start_sessions.clone()
    }

    pub fn continue_session_requests(&self) -> Vec<ContinueSessionMessage> {
        self.state.lock().continue_sessions.clone()
    }

    pub fn end_session_requests(&self) -> Vec<EndSessionMessage> {
        self.state.lock().end_sessions.clone()
    }

    pub fn say_finished_requests(&self) -> Vec<SayFinishedMessage> {
        self.state.lock().say_finished.clone()
    }

    pub fn injection_requests(&self) -> Vec<InjectionRequestMessage> {
        self.state.lock().injections.clone()
    }

    pub fn configure_requests(&self) -> Vec<DialogueConfigureMessage> {
        self.state.lock().configures.clone()
    }

    pub fn active_session_id(&self) -> Option<String> {
        self.state.lock().active.as_ref().map(|s| s.session_id.clone())
    }

    /// Event payloads handed out minus payloads destroyed. Zero once every
    /// delivered event has been reclaimed.
    pub fn outstanding_event_payloads(&self) -> isize {
        self.outstanding.load(Ordering::SeqCst)
    }

    // -- scripted event sources ---------------------------------------------

    pub fn emit_hotword_detected(&self) {
        let registration = *self.handlers.hotword.lock();
        if let Some((ctx, trampoline)) = registration {
            trampoline(ctx as *mut c_void);
        }
    }

    pub fn emit_listening_state(&self, listening: bool) {
        let registration = *self.handlers.listening_state.lock();
        if let Some((ctx, trampoline)) = registration {
            trampoline(ctx as *mut c_void, u8::from(listening));
        }
    }

    pub fn emit_intent(&self, message: &IntentMessage) {
        let registration = *self.handlers.intent.lock();
        if let Some((ctx, trampoline)) = registration {
            let payload = encode_intent(message);
            self.outstanding.fetch_add(1, Ordering::SeqCst);
            trampoline(ctx as *mut c_void, payload);
        }
    }

    pub fn emit_intent_not_recognized(&self, message: &IntentNotRecognizedMessage) {
        let registration = *self.handlers.intent_not_recognized.lock();
        if let Some((ctx, trampoline)) = registration {
            let payload = encode_intent_not_recognized(message);
            self.outstanding.fetch_add(1, Ordering::SeqCst);
            trampoline(ctx as *mut c_void, payload);
        }
    }

    pub fn emit_say(&self, message: &SayMessage) {
        let registration = *self.handlers.say.lock();
        if let Some((ctx, trampoline)) = registration {
            let payload = encode_say(message);
            self.outstanding.fetch_add(1, Ordering::SeqCst);
            trampoline(ctx as *mut c_void, payload);
        }
    }

    pub fn emit_text_captured(&self, message: &TextCapturedMessage) {
        let registration = *self.handlers.text_captured.lock();
        if let Some((ctx, trampoline)) = registration {
            let payload = encode_text_captured(message);
            self.outstanding.fetch_add(1, Ordering::SeqCst);
            trampoline(ctx as *mut c_void, payload);
        }
    }

    pub fn emit_partial_text_captured(&self, message: &TextCapturedMessage) {
        let registration = *self.handlers.partial_text_captured.lock();
        if let Some((ctx, trampoline)) = registration {
            let payload = encode_text_captured(message);
            self.outstanding.fetch_add(1, Ordering::SeqCst);
            trampoline(ctx as *mut c_void, payload);
        }
    }

    pub fn emit_component_loaded(&self, message: &ComponentLoadedMessage) {
        let registration = *self.handlers.component_loaded.lock();
        if let Some((ctx, trampoline)) = registration {
            let payload = Box::into_raw(Box::new(CComponentLoadedMessage {
                component: leak_string(&message.component),
            }));
            self.outstanding.fetch_add(1, Ordering::SeqCst);
            trampoline(ctx as *mut c_void, payload);
        }
    }

    pub fn emit_watch(&self, line: &str) {
        let registration = *self.handlers.watch.lock();
        if let Some((ctx, trampoline)) = registration {
            let payload = leak_string(line);
            self.outstanding.fetch_add(1, Ordering::SeqCst);
            trampoline(ctx as *mut c_void, payload);
        }
    }

    // -- internals ----------------------------------------------------------

    /// Consumes a scripted failure, if one is armed. Inspects the call just
    /// logged to match operation-targeted failures.
    fn gate(&self, state: &mut StubState) -> c_int {
        if let Some(message) = state.fail_next.take() {
            state.last_error = Some(message);
            return STATUS_ERROR;
        }
        if let Some((operation, message)) = state.fail_op.take() {
            if state.calls.last().map(EngineCall::name) == Some(operation.as_str()) {
                state.last_error = Some(message);
                return STATUS_ERROR;
            }
            state.fail_op = Some((operation, message));
        }
        STATUS_OK
    }

    fn next_session_id(state: &mut StubState) -> String {
        state.next_session += 1;
        format!("session-{}", state.next_session)
    }

    fn filter_rejects(state: &StubState, init: &SessionInit) -> Option<SessionTermination> {
        let SessionInit::Action {
            intent_filter: Some(filter),
            ..
        } = init
        else {
            return None;
        };
        if filter.is_empty() {
            return Some(SessionTermination {
                termination_type: SessionTerminationType::IntentNotRecognized,
                data: None,
            });
        }
        if let Some(known) = &state.known_intents {
            if let Some(unknown) = filter.iter().find(|name| !known.contains(*name)) {
                return Some(SessionTermination {
                    termination_type: SessionTerminationType::Error,
                    data: Some(format!("unknown intent {unknown}")),
                });
            }
        }
        None
    }

    fn fire(&self, events: Vec<PendingEvent>) {
        for event in events {
            match event {
                PendingEvent::Started(message) => {
                    let registration = *self.handlers.session_started.lock();
                    if let Some((ctx, trampoline)) = registration {
                        let payload = encode_session_started(&message);
                        self.outstanding.fetch_add(1, Ordering::SeqCst);
                        trampoline(ctx as *mut c_void, payload);
                    }
                }
                PendingEvent::Queued(message) => {
                    let registration = *self.handlers.session_queued.lock();
                    if let Some((ctx, trampoline)) = registration {
                        let payload = encode_session_queued(&message);
                        self.outstanding.fetch_add(1, Ordering::SeqCst);
                        trampoline(ctx as *mut c_void, payload);
                    }
                }
                PendingEvent::Ended(message) => {
                    let registration = *self.handlers.session_ended.lock();
                    if let Some((ctx, trampoline)) = registration {
                        let payload = encode_session_ended(&message);
                        self.outstanding.fetch_add(1, Ordering::SeqCst);
                        trampoline(ctx as *mut c_void, payload);
                    }
                }
                PendingEvent::InjectionComplete(request_id) => {
                    let registration = *self.handlers.injection_complete.lock();
                    if let Some((ctx, trampoline)) = registration {
                        let payload = Box::into_raw(Box::new(CInjectionCompleteMessage {
                            request_id: leak_opt_string(request_id.as_deref()),
                        }));
                        self.outstanding.fetch_add(1, Ordering::SeqCst);
                        trampoline(ctx as *mut c_void, payload);
                    }
                }
            }
        }
    }

    /// Ends `session` and promotes the queue head, collecting the events to
    /// fire once the lock is gone.
    fn close_session(
        state: &mut StubState,
        session: LiveSession,
        termination: SessionTermination,
        events: &mut Vec<PendingEvent>,
    ) {
        let ended_id = session.session_id.clone();
        events.push(PendingEvent::Ended(SessionEndedMessage {
            session_id: session.session_id,
            custom_data: session.custom_data,
            site_id: session.site_id,
            termination,
        }));
        if let Some(next) = state.queue.pop_front() {
            events.push(PendingEvent::Started(SessionStartedMessage {
                session_id: next.session_id.clone(),
                custom_data: next.custom_data.clone(),
                site_id: next.site_id.clone(),
                reactivated_from_session_id: Some(ended_id),
            }));
            state.active = Some(next);
        }
    }

    fn decode_or_fail<T>(state: &mut StubState, decoded: Result<T>) -> std::result::Result<T, c_int> {
        match decoded {
            Ok(value) => Ok(value),
            Err(err) => {
                state.last_error = Some(err.to_string());
                Err(STATUS_ERROR)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Driver implementation
// ---------------------------------------------------------------------------

macro_rules! stub_set_handler {
    ($self:ident, $slot:ident, $kind:expr, $context:ident, $trampoline:ident) => {{
        $self
            .state
            .lock()
            .calls
            .push(EngineCall::SetHandler { kind: $kind, attached: $trampoline.is_some() });
        *$self.handlers.$slot.lock() = $trampoline.map(|t| ($context as usize, t));
        STATUS_OK
    }};
}

impl EngineDriver for StubEngine {
    unsafe fn create(&self, assistant_dir: *const c_char, out_handle: *mut RawHandle) -> c_int {
        let mut state = self.state.lock();
        let dir = super::read_string(assistant_dir).unwrap_or_default();
        state.calls.push(EngineCall::Create { assistant_dir: dir });
        if self.gate(&mut state) != STATUS_OK {
            return STATUS_ERROR;
        }
        *out_handle = Box::into_raw(Box::new(0u8)) as RawHandle;
        STATUS_OK
    }

    unsafe fn destroy(&self, handle: RawHandle) -> c_int {
        self.state.lock().calls.push(EngineCall::Destroy);
        if !handle.is_null() {
            drop(Box::from_raw(handle as *mut u8));
        }
        STATUS_OK
    }

    unsafe fn start(&self, _handle: RawHandle) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Start);
        self.gate(&mut state)
    }

    unsafe fn pause(&self, _handle: RawHandle) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Pause);
        self.gate(&mut state)
    }

    unsafe fn unpause(&self, _handle: RawHandle) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Unpause);
        self.gate(&mut state)
    }

    unsafe fn enable_streaming(&self, _handle: RawHandle, enabled: u8) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::EnableStreaming(enabled != 0));
        self.gate(&mut state)
    }

    unsafe fn enable_logs(&self, _handle: RawHandle, enabled: u8) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::EnableLogs(enabled != 0));
        self.gate(&mut state)
    }

    unsafe fn enable_watch_html(&self, _handle: RawHandle, enabled: u8) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::EnableWatchHtml(enabled != 0));
        self.gate(&mut state)
    }

    unsafe fn enable_asr_partial(&self, _handle: RawHandle, enabled: u8) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::EnableAsrPartial(enabled != 0));
        self.gate(&mut state)
    }

    unsafe fn set_asr_partial_period_ms(&self, _handle: RawHandle, period_ms: u32) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::SetAsrPartialPeriodMs(period_ms));
        self.gate(&mut state)
    }

    unsafe fn set_hotword_sensitivity(&self, _handle: RawHandle, sensitivity: c_float) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::SetHotwordSensitivity(sensitivity));
        self.gate(&mut state)
    }

    unsafe fn set_asr_model_parameters(
        &self,
        _handle: RawHandle,
        parameters: *const CAsrModelParameters,
    ) -> c_int {
        let mut state = self.state.lock();
        let p = &*parameters;
        state.calls.push(EngineCall::SetAsrModelParameters {
            beam_size: p.beam_size,
            lm_weight: p.lm_weight,
            endpointing_ms: p.endpointing_ms,
        });
        self.gate(&mut state)
    }

    unsafe fn enable_injection(
        &self,
        _handle: RawHandle,
        user_data_dir: *const c_char,
        g2p_resources_dir: *const c_char,
    ) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::EnableInjection {
            user_data_dir: super::read_string(user_data_dir).unwrap_or_default(),
            g2p_resources_dir: super::read_opt_string(g2p_resources_dir),
        });
        self.gate(&mut state)
    }

    unsafe fn send_audio_buffer(
        &self,
        _handle: RawHandle,
        _frames: *const i16,
        frame_count: u32,
    ) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::SendAudio { frames: frame_count });
        self.gate(&mut state)
    }

    unsafe fn dialogue_start_session(
        &self,
        _handle: RawHandle,
        message: *const CStartSessionMessage,
    ) -> c_int {
        let mut events = Vec::new();
        {
            let mut state = self.state.lock();
            state.calls.push(EngineCall::StartSession);
            if self.gate(&mut state) != STATUS_OK {
                return STATUS_ERROR;
            }
            let request = match Self::decode_or_fail(&mut state, StartSessionMessage::from_c(&*message)) {
                Ok(request) => request,
                Err(status) => return status,
            };
            state.start_sessions.push(request.clone());

            let session = LiveSession {
                session_id: Self::next_session_id(&mut state),
                custom_data: request.custom_data.clone(),
                site_id: request.site_id.clone().unwrap_or_else(|| "default".to_string()),
            };
            let enqueueable = !matches!(
                request.init,
                SessionInit::Action { can_be_enqueued: false, .. }
            );
            if state.active.is_some() {
                if enqueueable {
                    events.push(PendingEvent::Queued(SessionQueuedMessage {
                        session_id: session.session_id.clone(),
                        custom_data: session.custom_data.clone(),
                        site_id: session.site_id.clone(),
                    }));
                    state.queue.push_back(session);
                }
                // Busy and not enqueueable: the request is dropped.
            } else if let Some(termination) = Self::filter_rejects(&state, &request.init) {
                events.push(PendingEvent::Started(SessionStartedMessage {
                    session_id: session.session_id.clone(),
                    custom_data: session.custom_data.clone(),
                    site_id: session.site_id.clone(),
                    reactivated_from_session_id: None,
                }));
                Self::close_session(&mut state, session, termination, &mut events);
            } else {
                events.push(PendingEvent::Started(SessionStartedMessage {
                    session_id: session.session_id.clone(),
                    custom_data: session.custom_data.clone(),
                    site_id: session.site_id.clone(),
                    reactivated_from_session_id: None,
                }));
                state.active = Some(session);
            }
        }
        self.fire(events);
        STATUS_OK
    }

    unsafe fn dialogue_continue_session(
        &self,
        _handle: RawHandle,
        message: *const CContinueSessionMessage,
    ) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::ContinueSession);
        if self.gate(&mut state) != STATUS_OK {
            return STATUS_ERROR;
        }
        match Self::decode_or_fail(&mut state, ContinueSessionMessage::from_c(&*message)) {
            Ok(request) => {
                state.continue_sessions.push(request);
                STATUS_OK
            }
            Err(status) => status,
        }
    }

    unsafe fn dialogue_end_session(
        &self,
        _handle: RawHandle,
        message: *const CEndSessionMessage,
    ) -> c_int {
        let mut events = Vec::new();
        {
            let mut state = self.state.lock();
            state.calls.push(EngineCall::EndSession);
            if self.gate(&mut state) != STATUS_OK {
                return STATUS_ERROR;
            }
            let request = match Self::decode_or_fail(&mut state, EndSessionMessage::from_c(&*message)) {
                Ok(request) => request,
                Err(status) => return status,
            };
            state.end_sessions.push(request.clone());

            let matches_active = state
                .active
                .as_ref()
                .is_some_and(|s| s.session_id == request.session_id);
            if matches_active {
                if let Some(session) = state.active.take() {
                    Self::close_session(
                        &mut state,
                        session,
                        SessionTermination {
                            termination_type: SessionTerminationType::Nominal,
                            data: None,
                        },
                        &mut events,
                    );
                }
            }
            // Unknown session ids are acknowledged without an event.
        }
        self.fire(events);
        STATUS_OK
    }

    unsafe fn notify_tts_finished(
        &self,
        _handle: RawHandle,
        message: *const CSayFinishedMessage,
    ) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::NotifyTtsFinished);
        if self.gate(&mut state) != STATUS_OK {
            return STATUS_ERROR;
        }
        match Self::decode_or_fail(&mut state, SayFinishedMessage::from_c(&*message)) {
            Ok(request) => {
                state.say_finished.push(request);
                STATUS_OK
            }
            Err(status) => status,
        }
    }

    unsafe fn request_injection(
        &self,
        _handle: RawHandle,
        message: *const CInjectionRequestMessage,
    ) -> c_int {
        let request_id;
        {
            let mut state = self.state.lock();
            state.calls.push(EngineCall::RequestInjection);
            if self.gate(&mut state) != STATUS_OK {
                return STATUS_ERROR;
            }
            let request = match Self::decode_or_fail(&mut state, InjectionRequestMessage::from_c(&*message)) {
                Ok(request) => request,
                Err(status) => return status,
            };
            request_id = request.request_id.clone();
            state.injections.push(request);
        }
        self.fire(vec![PendingEvent::InjectionComplete(request_id)]);
        STATUS_OK
    }

    unsafe fn dialogue_configure(
        &self,
        _handle: RawHandle,
        message: *const CDialogueConfigureMessage,
    ) -> c_int {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::DialogueConfigure);
        if self.gate(&mut state) != STATUS_OK {
            return STATUS_ERROR;
        }
        match Self::decode_or_fail(&mut state, DialogueConfigureMessage::from_c(&*message)) {
            Ok(request) => {
                state.configures.push(request);
                STATUS_OK
            }
            Err(status) => status,
        }
    }

    unsafe fn set_intent_detected_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<IntentTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, intent, "intentDetected", context, trampoline)
    }

    unsafe fn set_intent_not_recognized_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<IntentNotRecognizedTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, intent_not_recognized, "intentNotRecognized", context, trampoline)
    }

    unsafe fn set_hotword_detected_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<HotwordTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, hotword, "hotwordDetected", context, trampoline)
    }

    unsafe fn set_listening_state_changed_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<ListeningStateTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, listening_state, "listeningStateChanged", context, trampoline)
    }

    unsafe fn set_session_started_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SessionStartedTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, session_started, "sessionStarted", context, trampoline)
    }

    unsafe fn set_session_queued_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SessionQueuedTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, session_queued, "sessionQueued", context, trampoline)
    }

    unsafe fn set_session_ended_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SessionEndedTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, session_ended, "sessionEnded", context, trampoline)
    }

    unsafe fn set_tts_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<SayTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, say, "say", context, trampoline)
    }

    unsafe fn set_text_captured_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<TextCapturedTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, text_captured, "textCaptured", context, trampoline)
    }

    unsafe fn set_partial_text_captured_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<TextCapturedTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, partial_text_captured, "partialTextCaptured", context, trampoline)
    }

    unsafe fn set_injection_complete_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<InjectionCompleteTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, injection_complete, "injectionComplete", context, trampoline)
    }

    unsafe fn set_component_loaded_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<ComponentLoadedTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, component_loaded, "componentLoaded", context, trampoline)
    }

    unsafe fn set_watch_handler(
        &self,
        _handle: RawHandle,
        context: *mut c_void,
        trampoline: Option<WatchTrampoline>,
    ) -> c_int {
        stub_set_handler!(self, watch, "watch", context, trampoline)
    }

    unsafe fn get_last_error(&self, out_message: *mut *const c_char) -> c_int {
        let state = self.state.lock();
        match &state.last_error {
            Some(message) => {
                *out_message = leak_string(message);
                self.outstanding.fetch_add(1, Ordering::SeqCst);
                STATUS_OK
            }
            None => STATUS_ERROR,
        }
    }

    unsafe fn destroy_string(&self, string: *mut c_char) {
        if !string.is_null() {
            drop(CString::from_raw(string));
            self.outstanding.fetch_sub(1, Ordering::SeqCst);
        }
    }

    unsafe fn destroy_intent_message(&self, message: *mut CIntentMessage) {
        let message = Box::from_raw(message);
        free_string(message.session_id);
        free_string(message.custom_data);
        free_string(message.site_id);
        free_string(message.input);
        if !message.intent.is_null() {
            let intent = Box::from_raw(message.intent as *mut CIntentClassifierResult);
            free_string(intent.intent_name);
        }
        if !message.slots.is_null() {
            let list = Box::from_raw(message.slots as *mut CSlotList);
            let slots = Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                list.slots as *mut CSlot,
                list.size as usize,
            ));
            for slot in slots.iter() {
                free_string(slot.raw_value);
                free_string(slot.entity);
                free_string(slot.slot_name);
                free_slot_value(&slot.value);
            }
        }
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }

    unsafe fn destroy_intent_not_recognized_message(
        &self,
        message: *mut CIntentNotRecognizedMessage,
    ) {
        let message = Box::from_raw(message);
        free_string(message.site_id);
        free_string(message.session_id);
        free_string(message.input);
        free_string(message.custom_data);
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }

    unsafe fn destroy_session_started_message(&self, message: *mut CSessionStartedMessage) {
        let message = Box::from_raw(message);
        free_string(message.session_id);
        free_string(message.custom_data);
        free_string(message.site_id);
        free_string(message.reactivated_from_session_id);
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }

    unsafe fn destroy_session_queued_message(&self, message: *mut CSessionQueuedMessage) {
        let message = Box::from_raw(message);
        free_string(message.session_id);
        free_string(message.custom_data);
        free_string(message.site_id);
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }

    unsafe fn destroy_session_ended_message(&self, message: *mut CSessionEndedMessage) {
        let message = Box::from_raw(message);
        free_string(message.session_id);
        free_string(message.custom_data);
        free_string(message.site_id);
        free_string(message.termination.data);
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }

    unsafe fn destroy_say_message(&self, message: *mut CSayMessage) {
        let message = Box::from_raw(message);
        free_string(message.text);
        free_string(message.lang);
        free_string(message.id);
        free_string(message.site_id);
        free_string(message.session_id);
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }

    unsafe fn destroy_text_captured_message(&self, message: *mut CTextCapturedMessage) {
        let message = Box::from_raw(message);
        free_string(message.text);
        free_string(message.site_id);
        free_string(message.session_id);
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }

    unsafe fn destroy_injection_complete_message(&self, message: *mut CInjectionCompleteMessage) {
        let message = Box::from_raw(message);
        free_string(message.request_id);
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }

    unsafe fn destroy_component_loaded_message(&self, message: *mut CComponentLoadedMessage) {
        let message = Box::from_raw(message);
        free_string(message.component);
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Event payload encoders
// ---------------------------------------------------------------------------

fn leak_string(s: &str) -> *mut c_char {
    CString::new(s)
        .unwrap_or_else(|_| CString::default())
        .into_raw()
}

fn leak_opt_string(s: Option<&str>) -> *mut c_char {
    s.map_or(std::ptr::null_mut(), leak_string)
}

unsafe fn free_string(ptr: *const c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr as *mut c_char));
    }
}

fn encode_slot_value(value: &SlotValue) -> CSlotValue {
    fn boxed<T>(value: T) -> *const c_void {
        Box::into_raw(Box::new(value)) as *const c_void
    }
    match value {
        SlotValue::Custom(s) => CSlotValue {
            value: leak_string(s) as *const c_void,
            value_type: SLOT_VALUE_TYPE_CUSTOM,
        },
        SlotValue::Number(n) => CSlotValue {
            value: boxed(*n),
            value_type: SLOT_VALUE_TYPE_NUMBER,
        },
        SlotValue::Ordinal(n) => CSlotValue {
            value: boxed(*n),
            value_type: SLOT_VALUE_TYPE_ORDINAL,
        },
        SlotValue::InstantTime(v) => CSlotValue {
            value: boxed(CInstantTimeValue {
                value: leak_string(&v.value),
                grain: v.grain.to_c(),
                precision: v.precision.to_c(),
            }),
            value_type: SLOT_VALUE_TYPE_INSTANT_TIME,
        },
        SlotValue::TimeInterval(v) => CSlotValue {
            value: boxed(CTimeIntervalValue {
                from: leak_opt_string(v.from.as_deref()),
                to: leak_opt_string(v.to.as_deref()),
            }),
            value_type: SLOT_VALUE_TYPE_TIME_INTERVAL,
        },
        SlotValue::AmountOfMoney(v) => CSlotValue {
            value: boxed(CAmountOfMoneyValue {
                value: v.value,
                precision: v.precision.to_c(),
                unit: leak_opt_string(v.unit.as_deref()),
            }),
            value_type: SLOT_VALUE_TYPE_AMOUNT_OF_MONEY,
        },
        SlotValue::Temperature(v) => CSlotValue {
            value: boxed(CTemperatureValue {
                value: v.value,
                unit: leak_opt_string(v.unit.as_deref()),
            }),
            value_type: SLOT_VALUE_TYPE_TEMPERATURE,
        },
        SlotValue::Duration(v) => CSlotValue {
            value: boxed(CDurationValue {
                years: v.years,
                quarters: v.quarters,
                months: v.months,
                weeks: v.weeks,
                days: v.days,
                hours: v.hours,
                minutes: v.minutes,
                seconds: v.seconds,
                precision: v.precision.to_c(),
            }),
            value_type: SLOT_VALUE_TYPE_DURATION,
        },
        SlotValue::Percentage(n) => CSlotValue {
            value: boxed(*n),
            value_type: SLOT_VALUE_TYPE_PERCENTAGE,
        },
    }
}

unsafe fn free_slot_value(value: &CSlotValue) {
    unsafe fn unbox<T>(ptr: *const c_void) {
        drop(Box::from_raw(ptr as *mut T));
    }
    match value.value_type {
        SLOT_VALUE_TYPE_CUSTOM => free_string(value.value as *const c_char),
        SLOT_VALUE_TYPE_NUMBER | SLOT_VALUE_TYPE_PERCENTAGE => unbox::<f64>(value.value),
        SLOT_VALUE_TYPE_ORDINAL => unbox::<i64>(value.value),
        SLOT_VALUE_TYPE_INSTANT_TIME => {
            let v = Box::from_raw(value.value as *mut CInstantTimeValue);
            free_string(v.value);
        }
        SLOT_VALUE_TYPE_TIME_INTERVAL => {
            let v = Box::from_raw(value.value as *mut CTimeIntervalValue);
            free_string(v.from);
            free_string(v.to);
        }
        SLOT_VALUE_TYPE_AMOUNT_OF_MONEY => {
            let v = Box::from_raw(value.value as *mut CAmountOfMoneyValue);
            free_string(v.unit);
        }
        SLOT_VALUE_TYPE_TEMPERATURE => {
            let v = Box::from_raw(value.value as *mut CTemperatureValue);
            free_string(v.unit);
        }
        SLOT_VALUE_TYPE_DURATION => unbox::<CDurationValue>(value.value),
        _ => {}
    }
}

fn encode_intent(message: &IntentMessage) -> *mut CIntentMessage {
    let intent = message.intent.as_ref().map_or(std::ptr::null(), |intent| {
        Box::into_raw(Box::new(CIntentClassifierResult {
            intent_name: leak_string(&intent.intent_name),
            confidence_score: intent.confidence_score,
        })) as *const CIntentClassifierResult
    });
    let slots = if message.slots.is_empty() {
        std::ptr::null()
    } else {
        let slots: Vec<CSlot> = message
            .slots
            .iter()
            .map(|slot| CSlot {
                raw_value: leak_string(&slot.raw_value),
                value: encode_slot_value(&slot.value),
                range_start: slot.range.start as c_int,
                range_end: slot.range.end as c_int,
                entity: leak_string(&slot.entity),
                slot_name: leak_string(&slot.slot_name),
            })
            .collect();
        let size = slots.len() as c_int;
        let slots = Box::into_raw(slots.into_boxed_slice()) as *const CSlot;
        Box::into_raw(Box::new(CSlotList { slots, size })) as *const CSlotList
    };
    Box::into_raw(Box::new(CIntentMessage {
        session_id: leak_string(&message.session_id),
        custom_data: leak_opt_string(message.custom_data.as_deref()),
        site_id: leak_string(&message.site_id),
        input: leak_string(&message.input),
        intent,
        slots,
    }))
}

fn encode_intent_not_recognized(
    message: &IntentNotRecognizedMessage,
) -> *mut CIntentNotRecognizedMessage {
    Box::into_raw(Box::new(CIntentNotRecognizedMessage {
        site_id: leak_string(&message.site_id),
        session_id: leak_string(&message.session_id),
        input: leak_opt_string(message.input.as_deref()),
        custom_data: leak_opt_string(message.custom_data.as_deref()),
        confidence_score: message.confidence_score,
    }))
}

fn encode_session_started(message: &SessionStartedMessage) -> *mut CSessionStartedMessage {
    Box::into_raw(Box::new(CSessionStartedMessage {
        session_id: leak_string(&message.session_id),
        custom_data: leak_opt_string(message.custom_data.as_deref()),
        site_id: leak_string(&message.site_id),
        reactivated_from_session_id: leak_opt_string(
            message.reactivated_from_session_id.as_deref(),
        ),
    }))
}

fn encode_session_queued(message: &SessionQueuedMessage) -> *mut CSessionQueuedMessage {
    Box::into_raw(Box::new(CSessionQueuedMessage {
        session_id: leak_string(&message.session_id),
        custom_data: leak_opt_string(message.custom_data.as_deref()),
        site_id: leak_string(&message.site_id),
    }))
}

fn encode_session_ended(message: &SessionEndedMessage) -> *mut CSessionEndedMessage {
    Box::into_raw(Box::new(CSessionEndedMessage {
        session_id: leak_string(&message.session_id),
        custom_data: leak_opt_string(message.custom_data.as_deref()),
        site_id: leak_string(&message.site_id),
        termination: CSessionTermination {
            termination_type: message.termination.termination_type.to_c(),
            data: leak_opt_string(message.termination.data.as_deref()),
        },
    }))
}

fn encode_say(message: &SayMessage) -> *mut CSayMessage {
    Box::into_raw(Box::new(CSayMessage {
        text: leak_string(&message.text),
        lang: leak_opt_string(message.lang.as_deref()),
        id: leak_opt_string(message.message_id.as_deref()),
        site_id: leak_string(&message.site_id),
        session_id: leak_opt_string(message.session_id.as_deref()),
    }))
}

fn encode_text_captured(message: &TextCapturedMessage) -> *mut CTextCapturedMessage {
    Box::into_raw(Box::new(CTextCapturedMessage {
        text: leak_string(&message.text),
        likelihood: message.likelihood,
        seconds: message.seconds,
        site_id: leak_string(&message.site_id),
        session_id: leak_opt_string(message.session_id.as_deref()),
    }))
}
