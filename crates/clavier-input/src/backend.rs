//! Capability traits the scheduler drives the OS through
//!
//! Global hotkey hooks and synthetic input are process-wide OS state;
//! exposing them as injected capabilities keeps that out of the
//! scheduler's type and makes it testable against the synthetic
//! backend, which fires events without touching the OS.

use crate::InputError;
use clavier_core::{PhysicalKey, ScanCode};

/// Synthetic key event injection into the OS input stream
pub trait KeySink: Send + Sync {
    /// Press a key. Issued synchronously, in chord order.
    fn key_down(&self, key: &PhysicalKey) -> Result<(), InputError>;

    /// Release a key. May be issued from release-pool workers.
    fn key_up(&self, key: &PhysicalKey) -> Result<(), InputError>;
}

/// Global hotkey registration
///
/// Callbacks fire from an arbitrary thread context and must not block:
/// store an atomic or send on a channel, nothing else.
pub trait HotkeyHook: Send + Sync {
    /// Invoke `callback` every time the key with `scan_code` is pressed.
    fn on_press(
        &self,
        scan_code: ScanCode,
        callback: Box<dyn Fn() + Send + Sync>,
    ) -> Result<(), InputError>;

    /// Drop all registrations made through this hook.
    fn unregister_all(&self);
}

/// Foreground window identity probe
pub trait ActiveWindow: Send + Sync {
    /// Title of the currently focused window, if any.
    fn active_title(&self) -> Option<String>;
}
