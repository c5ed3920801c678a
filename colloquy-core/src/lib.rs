//! # colloquy-core
//!
//! Host-side bindings for the Colloquy voice assistant engine.
//!
//! ## Architecture
//!
//! ```text
//! Host audio → ColloquyPlatform::append_buffer ─► engine (C ABI)
//!                                                    │
//!                                       hotword / ASR / NLU / dialogue
//!                                                    │
//!                    trampolines (engine threads) ◄──┘
//!                                 │
//!                    DispatchContext → owned messages → host handlers
//! ```
//!
//! Every value that crosses the C boundary is copied: requests encode through
//! RAII guards that release on all exit paths, events decode to owned Rust
//! messages before the engine payload is destroyed. The engine itself sits
//! behind the [`EngineDriver`] trait, so the whole crate runs against the
//! in-process [`StubEngine`] in tests and against the linked native library
//! (cargo feature `linked`) in production.

#![warn(clippy::all)]

pub mod engine;
pub mod error;
pub mod ffi;
pub mod ontology;

// Convenience re-exports for downstream crates
pub use engine::{ColloquyPlatform, LifecycleState, PlatformConfig};
pub use error::{ColloquyError, Result};
pub use ffi::driver::EngineDriver;
pub use ffi::live_foreign_allocations;
pub use ffi::stub::{EngineCall, StubEngine};
pub use ontology::{
    AsrModelParameters, ComponentLoadedMessage, ContinueSessionMessage, DialogueConfigureIntent,
    DialogueConfigureMessage, EndSessionMessage, InjectionCompleteMessage, InjectionKind,
    InjectionRequestMessage, InjectionRequestOperation, IntentClassifierResult, IntentMessage,
    IntentNotRecognizedMessage, PlatformEvent, SayFinishedMessage, SayMessage,
    SessionEndedMessage, SessionInit, SessionQueuedMessage, SessionStartedMessage,
    SessionTermination, SessionTerminationType, Slot, SlotValue, StartSessionMessage,
    TextCapturedMessage,
};
