use crate::engine::LifecycleState;
use thiserror::Error;

/// All errors produced by colloquy-core.
///
/// Only synchronous call failures surface here. Dialogue-level failures
/// (stale session id, unknown intent in a filter, recognition timeout) are
/// reported by the engine through a `SessionEnded` event with a non-nominal
/// termination and are never raised as errors.
#[derive(Debug, Error)]
pub enum ColloquyError {
    /// The engine returned a non-OK status. Carries the engine's last-error
    /// message, fetched and freed at the call site.
    #[error("engine error: {0}")]
    Engine(String),

    /// An operation was attempted outside the lifecycle state machine's
    /// allowed transitions.
    #[error("cannot {operation} while engine is {state}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },

    /// The engine handle was already destroyed.
    #[error("engine is no longer available (destroyed)")]
    EngineNotAvailable,

    /// Malformed or unrecognized data crossed the engine boundary. This is a
    /// version-mismatch defect, not a recoverable runtime condition.
    #[error("engine protocol violation: {0}")]
    Protocol(String),

    /// A host string contained an interior NUL byte and cannot cross the
    /// C boundary.
    #[error("string contains an interior nul byte")]
    InteriorNul(#[from] std::ffi::NulError),

    /// A configured path is not representable as UTF-8 for the engine.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(std::path::PathBuf),

    /// `append_buffer` was handed more frames than the wire format's u32
    /// frame count can describe.
    #[error("audio buffer of {0} frames exceeds the engine's u32 frame limit")]
    AudioBufferTooLarge(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ColloquyError>;
