//! Synthetic input backend
//!
//! Implements every capability trait in memory: injected keys land in a
//! timestamped event log, hotkeys fire when the test (or dry-run
//! driver) calls [`SyntheticBackend::press`], and the foreground title
//! is whatever was last set. No OS state is touched.

use crate::backend::{ActiveWindow, HotkeyHook, KeySink};
use crate::InputError;
use clavier_core::{PhysicalKey, ScanCode};
use std::sync::Mutex;
use std::time::Instant;

/// Direction of a logged key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

/// One logged key event with its wall-clock timestamp
#[derive(Debug, Clone)]
pub struct KeyEvent {
    pub at: Instant,
    pub action: KeyAction,
    pub key: PhysicalKey,
}

type Callback = Box<dyn Fn() + Send + Sync>;

/// In-memory implementation of all input capabilities
#[derive(Default)]
pub struct SyntheticBackend {
    events: Mutex<Vec<KeyEvent>>,
    hooks: Mutex<Vec<(ScanCode, Callback)>>,
    title: Mutex<Option<String>>,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title reported as the foreground window.
    pub fn set_active_title(&self, title: &str) {
        if let Ok(mut current) = self.title.lock() {
            *current = Some(title.to_string());
        }
    }

    /// Report no foreground window at all.
    pub fn clear_active_title(&self) {
        if let Ok(mut current) = self.title.lock() {
            *current = None;
        }
    }

    /// Fire every callback registered for `scan_code`, as the OS hook
    /// would on a physical press.
    pub fn press(&self, scan_code: ScanCode) {
        if let Ok(hooks) = self.hooks.lock() {
            for (code, callback) in hooks.iter() {
                if *code == scan_code {
                    callback();
                }
            }
        }
    }

    /// Snapshot of the injected key events so far.
    pub fn events(&self) -> Vec<KeyEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Just the `(action, key)` pairs, for order assertions.
    pub fn actions(&self) -> Vec<(KeyAction, PhysicalKey)> {
        self.events()
            .into_iter()
            .map(|e| (e.action, e.key))
            .collect()
    }

    fn log(&self, action: KeyAction, key: &PhysicalKey) {
        if let Ok(mut events) = self.events.lock() {
            events.push(KeyEvent {
                at: Instant::now(),
                action,
                key: key.clone(),
            });
        }
    }
}

impl KeySink for SyntheticBackend {
    fn key_down(&self, key: &PhysicalKey) -> Result<(), InputError> {
        self.log(KeyAction::Down, key);
        Ok(())
    }

    fn key_up(&self, key: &PhysicalKey) -> Result<(), InputError> {
        self.log(KeyAction::Up, key);
        Ok(())
    }
}

impl HotkeyHook for SyntheticBackend {
    fn on_press(
        &self,
        scan_code: ScanCode,
        callback: Box<dyn Fn() + Send + Sync>,
    ) -> Result<(), InputError> {
        self.hooks
            .lock()
            .map_err(|_| InputError::HookRegistration("hook registry poisoned".into()))?
            .push((scan_code, callback));
        Ok(())
    }

    fn unregister_all(&self) {
        if let Ok(mut hooks) = self.hooks.lock() {
            hooks.clear();
        }
    }
}

impl ActiveWindow for SyntheticBackend {
    fn active_title(&self) -> Option<String> {
        self.title.lock().ok().and_then(|title| title.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_press_fires_matching_hooks_only() {
        let backend = SyntheticBackend::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        backend
            .on_press(ScanCode(47), Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        backend.press(ScanCode(47));
        backend.press(ScanCode(48));
        backend.press(ScanCode(47));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unregister_all_silences_hooks() {
        let backend = SyntheticBackend::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        backend
            .on_press(ScanCode(47), Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        backend.unregister_all();
        backend.press(ScanCode(47));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_event_log_orders_actions() {
        let backend = SyntheticBackend::new();
        let key = PhysicalKey::from("y");
        backend.key_up(&key).unwrap();
        backend.key_down(&key).unwrap();
        assert_eq!(
            backend.actions(),
            vec![(KeyAction::Up, key.clone()), (KeyAction::Down, key)]
        );
    }

    #[test]
    fn test_active_title() {
        let backend = SyntheticBackend::new();
        assert_eq!(backend.active_title(), None);
        backend.set_active_title("Sky: Children of the Light");
        assert_eq!(
            backend.active_title().as_deref(),
            Some("Sky: Children of the Light")
        );
        backend.clear_active_title();
        assert_eq!(backend.active_title(), None);
    }
}
