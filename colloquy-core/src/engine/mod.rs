//! `ColloquyPlatform` — top-level lifecycle controller.
//!
//! ## Lifecycle
//!
//! ```text
//! ColloquyPlatform::with_driver()
//!     └─► start()            → engine processing, state = Started
//!         ├─► pause()        → processing suspended, state = Paused
//!         │     └─► unpause() → back to Started
//!         └─► destroy()      → handlers detached, native handle freed,
//!                              state = Destroyed (terminal)
//! ```
//!
//! Transitions are validated locally before the native call is made: an
//! out-of-order request (`pause()` while `Created`, `start()` twice) returns
//! `ColloquyError::InvalidState` without touching the engine. Every operation
//! after `destroy()` returns `ColloquyError::EngineNotAvailable`. `destroy()`
//! itself is idempotent, and dropping the platform destroys it.
//!
//! ## Threading
//!
//! The platform is `Send + Sync`; all mutability is interior. Engine events
//! arrive on engine-owned threads and are dispatched through the instance's
//! own [`dispatch::DispatchContext`], so two platforms in one process never
//! share handler state.

mod dispatch;

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{ColloquyError, Result};
use crate::ffi::driver::{EngineDriver, RawHandle, STATUS_OK};
use crate::ffi::CStringGuard;
use crate::ontology::{
    AsrModelParameters, ComponentLoadedMessage, ContinueSessionMessage, DialogueConfigureMessage,
    EndSessionMessage, InjectionCompleteMessage, InjectionRequestMessage, IntentMessage,
    IntentNotRecognizedMessage, PlatformEvent, SayFinishedMessage, SayMessage, SessionEndedMessage,
    SessionInit, SessionQueuedMessage, SessionStartedMessage, StartSessionMessage,
    TextCapturedMessage,
};

use dispatch::DispatchContext;

/// Where the platform handle is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Configured, engine idle.
    Created,
    /// Processing audio and dialogue.
    Started,
    /// Suspended; `unpause()` resumes.
    Paused,
    /// Native handle released. Terminal.
    Destroyed,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Paused => "paused",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Configuration for `ColloquyPlatform`.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Directory holding the trained assistant (models, dialogue metadata).
    pub assistant_dir: PathBuf,
    /// Hotword detector sensitivity in `[0, 1]`; higher triggers more easily.
    /// Default: 0.5.
    pub hotword_sensitivity: f32,
    /// Emit `watch` diagnostics as HTML instead of plain text. Default: false.
    pub enable_html: bool,
    /// Forward engine-internal logs to the host process. Default: false.
    pub enable_logs: bool,
    /// Emit intermediate ASR hypotheses while a capture is in progress.
    /// Default: false.
    pub enable_asr_partial_text: bool,
    /// Interval between partial hypotheses, in milliseconds. Only meaningful
    /// with `enable_asr_partial_text`. Default: 1000.
    pub asr_partial_text_period_ms: u32,
    /// Decoder tuning; `None` keeps the engine defaults.
    pub asr_model_parameters: Option<AsrModelParameters>,
    /// Allow runtime vocabulary injection. Requires `user_data_dir`.
    /// Default: false.
    pub enable_injection: bool,
    /// Writable directory for injection output. Created if missing.
    pub user_data_dir: Option<PathBuf>,
    /// Pronunciation resources for generating phonemes of injected words.
    pub g2p_resources_dir: Option<PathBuf>,
}

impl PlatformConfig {
    pub fn new(assistant_dir: impl Into<PathBuf>) -> Self {
        Self {
            assistant_dir: assistant_dir.into(),
            hotword_sensitivity: 0.5,
            enable_html: false,
            enable_logs: false,
            enable_asr_partial_text: false,
            asr_partial_text_period_ms: 1_000,
            asr_model_parameters: None,
            enable_injection: false,
            user_data_dir: None,
            g2p_resources_dir: None,
        }
    }
}

macro_rules! handler_accessors {
    ($on:ident, $clear:ident, $slot:ident, $register:ident, $trampoline:path, $message:ty) => {
        /// Registers the handler for this event kind. Replaces any previous
        /// one; the engine-side registration is installed once and reused.
        pub fn $on(&self, handler: impl Fn($message) + Send + Sync + 'static) -> Result<()> {
            self.with_engine(|d, raw| {
                self.dispatch.slots.$slot.set(handler);
                check(
                    d,
                    unsafe { d.$register(raw, self.context_ptr(), Some($trampoline)) },
                    stringify!($on),
                )
            })
        }

        /// Detaches the handler. The engine registration is removed first, so
        /// no delivery can land on an empty slot.
        pub fn $clear(&self) -> Result<()> {
            self.with_engine(|d, raw| {
                check(
                    d,
                    unsafe { d.$register(raw, ptr::null_mut(), None) },
                    stringify!($clear),
                )?;
                self.dispatch.slots.$slot.clear();
                Ok(())
            })
        }
    };
}

/// The top-level platform handle.
///
/// All engine access funnels through an [`EngineDriver`], which keeps the
/// whole crate testable without the native library. Wrap in `Arc` to share
/// between threads; every method takes `&self`.
pub struct ColloquyPlatform {
    /// Pinned: its address is registered with the engine as handler context.
    dispatch: Arc<DispatchContext>,
    raw: RawHandle,
    state: Mutex<LifecycleState>,
}

// The raw handle is a thread-safe engine object; the driver contract requires
// all methods to be callable from any thread.
unsafe impl Send for ColloquyPlatform {}
unsafe impl Sync for ColloquyPlatform {}

impl std::fmt::Debug for ColloquyPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColloquyPlatform")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl ColloquyPlatform {
    /// Creates a platform backed by the linked native engine.
    #[cfg(feature = "linked")]
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        Self::with_driver(Arc::new(crate::ffi::linked::LinkedEngine::new()), config)
    }

    /// Creates a platform on an explicit driver. The engine instance is
    /// created and fully configured before this returns; on any failure the
    /// half-built instance is destroyed.
    pub fn with_driver(driver: Arc<dyn EngineDriver>, config: &PlatformConfig) -> Result<Self> {
        let assistant_dir = CStringGuard::new(Some(path_str(&config.assistant_dir)?))?;
        let mut raw: RawHandle = ptr::null_mut();
        check(
            &*driver,
            unsafe { driver.create(assistant_dir.as_ptr(), &mut raw) },
            "create",
        )?;

        // Destroys the fresh instance if configuration bails out early.
        struct CreateGuard {
            driver: Arc<dyn EngineDriver>,
            raw: RawHandle,
            armed: bool,
        }
        impl Drop for CreateGuard {
            fn drop(&mut self) {
                if self.armed {
                    unsafe { self.driver.destroy(self.raw) };
                }
            }
        }
        let mut guard = CreateGuard {
            driver: driver.clone(),
            raw,
            armed: true,
        };

        configure(&*driver, raw, config)?;
        guard.armed = false;

        info!(assistant_dir = %config.assistant_dir.display(), "platform created");
        Ok(Self {
            dispatch: Arc::new(DispatchContext::new(driver)),
            raw,
            state: Mutex::new(LifecycleState::Created),
        })
    }

    /// Current lifecycle state (snapshot).
    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Starts audio and dialogue processing. Also resumes a paused platform,
    /// equivalent to `unpause()`.
    pub fn start(&self) -> Result<()> {
        self.transition(
            &[LifecycleState::Created, LifecycleState::Paused],
            LifecycleState::Started,
            "start",
            |d, raw| unsafe { d.start(raw) },
        )?;
        info!("platform started");
        Ok(())
    }

    /// Suspends processing. Only valid while started.
    pub fn pause(&self) -> Result<()> {
        self.transition(&[LifecycleState::Started], LifecycleState::Paused, "pause", |d, raw| unsafe {
            d.pause(raw)
        })
    }

    /// Resumes a paused platform.
    pub fn unpause(&self) -> Result<()> {
        self.transition(&[LifecycleState::Paused], LifecycleState::Started, "unpause", |d, raw| unsafe {
            d.unpause(raw)
        })
    }

    /// Releases the native engine. Safe to call more than once; subsequent
    /// calls are no-ops. Handlers are detached before the handle goes away so
    /// no event can race the teardown.
    ///
    /// Session and audio calls on other threads are not serialized against
    /// this: a call that already passed its lifecycle check may reach the
    /// engine while the handle is being destroyed. Callers sharing a platform
    /// across threads must quiesce their own calls before destroying it.
    pub fn destroy(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state == LifecycleState::Destroyed {
            return Ok(());
        }
        self.detach_all_registrations();
        self.dispatch.slots.clear_all();
        let status = unsafe { self.dispatch.driver.destroy(self.raw) };
        *state = LifecycleState::Destroyed;
        check(&*self.dispatch.driver, status, "destroy")?;
        info!("platform destroyed");
        Ok(())
    }

    // ── Dialogue ─────────────────────────────────────────────────────────────

    /// Opens a new dialogue session.
    pub fn start_session(&self, message: &StartSessionMessage) -> Result<()> {
        self.with_engine(|d, raw| {
            message.with_c_repr(|ptr| {
                check(d, unsafe { d.dialogue_start_session(raw, ptr) }, "startSession")
            })
        })
    }

    /// Opens an action session: speak `text` (if any), then listen.
    pub fn start_action(
        &self,
        text: Option<&str>,
        intent_filter: Option<&[&str]>,
        can_be_enqueued: bool,
        send_intent_not_recognized: bool,
    ) -> Result<()> {
        self.start_session(&StartSessionMessage {
            init: SessionInit::Action {
                text: text.map(str::to_owned),
                intent_filter: intent_filter
                    .map(|filter| filter.iter().map(|s| (*s).to_owned()).collect()),
                can_be_enqueued,
                send_intent_not_recognized,
            },
            custom_data: None,
            site_id: None,
        })
    }

    /// Opens a notification session: speak `text`, no listening phase.
    pub fn start_notification(&self, text: &str, custom_data: Option<&str>) -> Result<()> {
        self.start_session(&StartSessionMessage {
            init: SessionInit::Notification {
                text: text.to_owned(),
            },
            custom_data: custom_data.map(str::to_owned),
            site_id: None,
        })
    }

    /// Keeps a session alive for another exchange.
    pub fn continue_session(&self, message: &ContinueSessionMessage) -> Result<()> {
        self.with_engine(|d, raw| {
            message.with_c_repr(|ptr| {
                check(d, unsafe { d.dialogue_continue_session(raw, ptr) }, "continueSession")
            })
        })
    }

    /// Ends a session, optionally speaking `text` first.
    pub fn end_session(&self, session_id: &str, text: Option<&str>) -> Result<()> {
        let message = EndSessionMessage {
            session_id: session_id.to_owned(),
            text: text.map(str::to_owned),
        };
        self.with_engine(|d, raw| {
            message.with_c_repr(|ptr| {
                check(d, unsafe { d.dialogue_end_session(raw, ptr) }, "endSession")
            })
        })
    }

    /// Tells the engine that host-side TTS playback finished for a `say`
    /// request, unblocking the dialogue.
    pub fn notify_speech_ended(&self, message: &SayFinishedMessage) -> Result<()> {
        self.with_engine(|d, raw| {
            message.with_c_repr(|ptr| {
                check(d, unsafe { d.notify_tts_finished(raw, ptr) }, "notifySpeechEnded")
            })
        })
    }

    /// Enables or disables individual intents per site.
    pub fn configure_dialogue(&self, message: &DialogueConfigureMessage) -> Result<()> {
        self.with_engine(|d, raw| {
            message.with_c_repr(|ptr| {
                check(d, unsafe { d.dialogue_configure(raw, ptr) }, "configureDialogue")
            })
        })
    }

    /// Submits a vocabulary injection request. Completion is reported through
    /// the `injection_complete` event.
    pub fn request_injection(&self, message: &InjectionRequestMessage) -> Result<()> {
        self.with_engine(|d, raw| {
            message.with_c_repr(|ptr| {
                check(d, unsafe { d.request_injection(raw, ptr) }, "requestInjection")
            })
        })
    }

    // ── Audio & tuning ───────────────────────────────────────────────────────

    /// Feeds captured audio to the engine: 16 kHz mono signed 16-bit frames.
    pub fn append_buffer(&self, frames: &[i16]) -> Result<()> {
        let frame_count = u32::try_from(frames.len())
            .map_err(|_| ColloquyError::AudioBufferTooLarge(frames.len()))?;
        self.with_engine(|d, raw| {
            check(
                d,
                unsafe { d.send_audio_buffer(raw, frames.as_ptr(), frame_count) },
                "appendBuffer",
            )
        })
    }

    /// Adjusts hotword sensitivity at runtime. Values are clamped to `[0, 1]`.
    pub fn set_hotword_sensitivity(&self, sensitivity: f32) -> Result<()> {
        let sensitivity = sensitivity.clamp(0.0, 1.0);
        self.with_engine(|d, raw| {
            check(
                d,
                unsafe { d.set_hotword_sensitivity(raw, sensitivity) },
                "setHotwordSensitivity",
            )
        })
    }

    /// Applies new decoder tuning at runtime.
    pub fn set_asr_model_parameters(&self, parameters: AsrModelParameters) -> Result<()> {
        let raw_parameters = parameters.to_c();
        self.with_engine(|d, raw| {
            check(
                d,
                unsafe { d.set_asr_model_parameters(raw, &raw_parameters) },
                "setAsrModelParameters",
            )
        })
    }

    // ── Event handlers ───────────────────────────────────────────────────────

    handler_accessors!(
        on_intent_detected,
        clear_intent_detected,
        intent,
        set_intent_detected_handler,
        dispatch::intent_trampoline,
        IntentMessage
    );
    handler_accessors!(
        on_intent_not_recognized,
        clear_intent_not_recognized,
        intent_not_recognized,
        set_intent_not_recognized_handler,
        dispatch::intent_not_recognized_trampoline,
        IntentNotRecognizedMessage
    );
    handler_accessors!(
        on_listening_state_changed,
        clear_listening_state_changed,
        listening_state,
        set_listening_state_changed_handler,
        dispatch::listening_state_trampoline,
        bool
    );
    handler_accessors!(
        on_session_started,
        clear_session_started,
        session_started,
        set_session_started_handler,
        dispatch::session_started_trampoline,
        SessionStartedMessage
    );
    handler_accessors!(
        on_session_queued,
        clear_session_queued,
        session_queued,
        set_session_queued_handler,
        dispatch::session_queued_trampoline,
        SessionQueuedMessage
    );
    handler_accessors!(
        on_session_ended,
        clear_session_ended,
        session_ended,
        set_session_ended_handler,
        dispatch::session_ended_trampoline,
        SessionEndedMessage
    );
    handler_accessors!(
        on_say,
        clear_say,
        say,
        set_tts_handler,
        dispatch::say_trampoline,
        SayMessage
    );
    handler_accessors!(
        on_text_captured,
        clear_text_captured,
        text_captured,
        set_text_captured_handler,
        dispatch::text_captured_trampoline,
        TextCapturedMessage
    );
    handler_accessors!(
        on_partial_text_captured,
        clear_partial_text_captured,
        partial_text_captured,
        set_partial_text_captured_handler,
        dispatch::partial_text_captured_trampoline,
        TextCapturedMessage
    );
    handler_accessors!(
        on_injection_complete,
        clear_injection_complete,
        injection_complete,
        set_injection_complete_handler,
        dispatch::injection_complete_trampoline,
        InjectionCompleteMessage
    );
    handler_accessors!(
        on_component_loaded,
        clear_component_loaded,
        component_loaded,
        set_component_loaded_handler,
        dispatch::component_loaded_trampoline,
        ComponentLoadedMessage
    );
    handler_accessors!(
        on_watch,
        clear_watch,
        watch,
        set_watch_handler,
        dispatch::watch_trampoline,
        String
    );

    /// Registers the hotword handler. Replaces any previous one.
    pub fn on_hotword_detected(&self, handler: impl Fn() + Send + Sync + 'static) -> Result<()> {
        self.with_engine(|d, raw| {
            self.dispatch.slots.hotword.set(move |()| handler());
            check(
                d,
                unsafe {
                    d.set_hotword_detected_handler(
                        raw,
                        self.context_ptr(),
                        Some(dispatch::hotword_trampoline),
                    )
                },
                "onHotwordDetected",
            )
        })
    }

    /// Detaches the hotword handler; pending engine deliveries stop first.
    pub fn clear_hotword_detected(&self) -> Result<()> {
        self.with_engine(|d, raw| {
            check(
                d,
                unsafe { d.set_hotword_detected_handler(raw, ptr::null_mut(), None) },
                "clearHotwordDetected",
            )?;
            self.dispatch.slots.hotword.clear();
            Ok(())
        })
    }

    /// Funnels every event kind into one channel. Claims all handler slots:
    /// handlers registered before or after this call are replaced or replace
    /// the subscription respectively.
    pub fn subscribe(&self) -> Result<Receiver<PlatformEvent>> {
        let (tx, rx) = crossbeam_channel::unbounded();
        macro_rules! forward {
            ($on:ident, $variant:ident) => {{
                let tx = tx.clone();
                self.$on(move |message| {
                    let _ = tx.send(PlatformEvent::$variant(message));
                })?;
            }};
        }
        forward!(on_intent_detected, IntentDetected);
        forward!(on_intent_not_recognized, IntentNotRecognized);
        forward!(on_listening_state_changed, ListeningStateChanged);
        forward!(on_session_started, SessionStarted);
        forward!(on_session_queued, SessionQueued);
        forward!(on_session_ended, SessionEnded);
        forward!(on_say, Say);
        forward!(on_text_captured, TextCaptured);
        forward!(on_partial_text_captured, PartialTextCaptured);
        forward!(on_injection_complete, InjectionComplete);
        forward!(on_component_loaded, ComponentLoaded);
        forward!(on_watch, Watch);
        {
            let tx = tx.clone();
            self.on_hotword_detected(move || {
                let _ = tx.send(PlatformEvent::HotwordDetected);
            })?;
        }
        Ok(rx)
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn context_ptr(&self) -> *mut c_void {
        Arc::as_ptr(&self.dispatch) as *mut c_void
    }

    /// Runs `body` against a live engine. The state lock is released before
    /// `body` so handlers fired during the call may re-enter the platform.
    fn with_engine<T>(&self, body: impl FnOnce(&dyn EngineDriver, RawHandle) -> Result<T>) -> Result<T> {
        {
            let state = self.state.lock();
            if *state == LifecycleState::Destroyed {
                return Err(ColloquyError::EngineNotAvailable);
            }
        }
        body(&*self.dispatch.driver, self.raw)
    }

    fn transition(
        &self,
        from: &[LifecycleState],
        to: LifecycleState,
        operation: &'static str,
        call: impl FnOnce(&dyn EngineDriver, RawHandle) -> c_int,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if *state == LifecycleState::Destroyed {
            return Err(ColloquyError::EngineNotAvailable);
        }
        if !from.contains(&*state) {
            return Err(ColloquyError::InvalidState {
                operation,
                state: *state,
            });
        }
        check(
            &*self.dispatch.driver,
            call(&*self.dispatch.driver, self.raw),
            operation,
        )?;
        *state = to;
        Ok(())
    }

    /// Detaches every engine-side registration. Teardown path; statuses are
    /// ignored because the handle is about to be destroyed anyway.
    fn detach_all_registrations(&self) {
        let d = &*self.dispatch.driver;
        let raw = self.raw;
        unsafe {
            let _ = d.set_intent_detected_handler(raw, ptr::null_mut(), None);
            let _ = d.set_intent_not_recognized_handler(raw, ptr::null_mut(), None);
            let _ = d.set_hotword_detected_handler(raw, ptr::null_mut(), None);
            let _ = d.set_listening_state_changed_handler(raw, ptr::null_mut(), None);
            let _ = d.set_session_started_handler(raw, ptr::null_mut(), None);
            let _ = d.set_session_queued_handler(raw, ptr::null_mut(), None);
            let _ = d.set_session_ended_handler(raw, ptr::null_mut(), None);
            let _ = d.set_tts_handler(raw, ptr::null_mut(), None);
            let _ = d.set_text_captured_handler(raw, ptr::null_mut(), None);
            let _ = d.set_partial_text_captured_handler(raw, ptr::null_mut(), None);
            let _ = d.set_injection_complete_handler(raw, ptr::null_mut(), None);
            let _ = d.set_component_loaded_handler(raw, ptr::null_mut(), None);
            let _ = d.set_watch_handler(raw, ptr::null_mut(), None);
        }
    }
}

impl Drop for ColloquyPlatform {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            warn!(error = %err, "engine destroy failed during drop");
        }
    }
}

// ── Free helpers ─────────────────────────────────────────────────────────────

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| ColloquyError::NonUtf8Path(path.to_path_buf()))
}

/// Pulls the engine's last error message and wraps it. The engine owns the
/// returned string until we copy it, then `destroy_string` releases it.
fn engine_error(driver: &dyn EngineDriver, operation: &'static str) -> ColloquyError {
    let mut raw: *const c_char = ptr::null();
    let message = unsafe {
        if driver.get_last_error(&mut raw) == STATUS_OK && !raw.is_null() {
            let message = CStr::from_ptr(raw).to_string_lossy().into_owned();
            driver.destroy_string(raw as *mut c_char);
            message
        } else {
            format!("{operation} failed without detail")
        }
    };
    ColloquyError::Engine(message)
}

fn check(driver: &dyn EngineDriver, status: c_int, operation: &'static str) -> Result<()> {
    if status == STATUS_OK {
        Ok(())
    } else {
        Err(engine_error(driver, operation))
    }
}

/// Applies the whole [`PlatformConfig`] to a fresh engine instance.
fn configure(driver: &dyn EngineDriver, raw: RawHandle, config: &PlatformConfig) -> Result<()> {
    unsafe {
        // The host owns audio capture, so streaming input is always on.
        check(driver, driver.enable_streaming(raw, 1), "enableStreaming")?;
        check(
            driver,
            driver.set_hotword_sensitivity(raw, config.hotword_sensitivity.clamp(0.0, 1.0)),
            "setHotwordSensitivity",
        )?;
        check(
            driver,
            driver.enable_watch_html(raw, u8::from(config.enable_html)),
            "enableWatchHtml",
        )?;
        check(
            driver,
            driver.enable_logs(raw, u8::from(config.enable_logs)),
            "enableLogs",
        )?;
        check(
            driver,
            driver.enable_asr_partial(raw, u8::from(config.enable_asr_partial_text)),
            "enableAsrPartial",
        )?;
        if config.enable_asr_partial_text {
            check(
                driver,
                driver.set_asr_partial_period_ms(raw, config.asr_partial_text_period_ms),
                "setAsrPartialPeriod",
            )?;
        }
        if let Some(parameters) = config.asr_model_parameters {
            let raw_parameters = parameters.to_c();
            check(
                driver,
                driver.set_asr_model_parameters(raw, &raw_parameters),
                "setAsrModelParameters",
            )?;
        }
        if config.enable_injection {
            let user_data_dir = config.user_data_dir.as_deref().ok_or_else(|| {
                ColloquyError::Other(anyhow::anyhow!(
                    "injection enabled but no user data dir configured"
                ))
            })?;
            std::fs::create_dir_all(user_data_dir)?;
            let user_data = CStringGuard::new(Some(path_str(user_data_dir)?))?;
            let g2p = CStringGuard::new(
                config
                    .g2p_resources_dir
                    .as_deref()
                    .map(path_str)
                    .transpose()?,
            )?;
            check(
                driver,
                driver.enable_injection(raw, user_data.as_ptr(), g2p.as_ptr()),
                "enableInjection",
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_are_conservative() {
        let config = PlatformConfig::new("/assistant");
        assert_eq!(config.hotword_sensitivity, 0.5);
        assert!(!config.enable_logs);
        assert!(!config.enable_asr_partial_text);
        assert_eq!(config.asr_partial_text_period_ms, 1_000);
        assert!(!config.enable_injection);
    }

    #[test]
    fn lifecycle_state_displays_lowercase() {
        assert_eq!(LifecycleState::Created.to_string(), "created");
        assert_eq!(LifecycleState::Destroyed.to_string(), "destroyed");
    }
}
