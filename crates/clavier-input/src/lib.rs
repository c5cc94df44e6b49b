//! OS input layer for the clavier auto-player
//!
//! This crate provides:
//! - Capability traits for key injection, global hotkeys and
//!   foreground-window probing (the scheduler only ever sees these)
//! - A bounded worker pool for deferred key release
//! - A synthetic in-memory backend for tests and dry runs
//! - A Win32 backend (SendInput + low-level keyboard hook)
//!
//! # Architecture
//!
//! ```text
//! OS key press → hook callback → flume channel → scheduler thread
//! scheduler thread → KeySink::key_down (immediate)
//!                  → ReleasePool → worker sleeps hold → KeySink::key_up
//! ```
//!
//! Hook callbacks run on the hook's own thread and must never block;
//! they only send on channels or store atomics.

mod backend;
mod release;
mod synthetic;
#[cfg(windows)]
mod win32;

pub use backend::{ActiveWindow, HotkeyHook, KeySink};
pub use release::{ReleasePool, RELEASE_QUEUE_CAPACITY, RELEASE_WORKERS};
pub use synthetic::{KeyAction, KeyEvent, SyntheticBackend};
#[cfg(windows)]
pub use win32::{ForegroundWindow, LowLevelHotkeys, SendInputSink};

/// Error type for input layer operations
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to register hotkey hook: {0}")]
    HookRegistration(String),

    #[error("failed to inject key '{key}': {reason}")]
    Injection { key: String, reason: String },

    #[error("no scan code translation for key '{0}'")]
    UntranslatableKey(String),

    #[error("deferred release queue is full")]
    ReleaseQueueFull,

    #[error("release pool is shut down")]
    ReleasePoolClosed,
}
