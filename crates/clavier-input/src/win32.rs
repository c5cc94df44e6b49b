//! Win32 input backend
//!
//! Key injection goes through `SendInput` with hardware scan codes;
//! games commonly read scan codes from DirectInput and ignore plain
//! virtual-key messages. Hotkeys use a `WH_KEYBOARD_LL` hook, which
//! needs a thread running a message loop; that thread is owned by
//! [`LowLevelHotkeys`] and shut down with `WM_QUIT` on drop.
//!
//! The hook procedure is a free function, so callback registrations
//! live in a process-wide registry. The registry is an implementation
//! detail behind the [`HotkeyHook`] trait; the rest of the crate never
//! sees it.

use crate::backend::{ActiveWindow, HotkeyHook, KeySink};
use crate::InputError;
use clavier_core::{PhysicalKey, ScanCode};
use std::collections::HashMap;
use std::mem::size_of;
use std::sync::Mutex;
use std::thread::JoinHandle;

use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    MapVirtualKeyW, SendInput, VkKeyScanW, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT,
    KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP, KEYEVENTF_SCANCODE, MAPVK_VK_TO_VSC, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetForegroundWindow, GetMessageW, GetWindowTextW,
    PostThreadMessageW, SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx,
    KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL, WM_KEYDOWN, WM_QUIT, WM_SYSKEYDOWN,
};

type Callback = Box<dyn Fn() + Send + Sync>;

/// Process-wide registry the hook procedure dispatches against
static HOTKEY_REGISTRY: Mutex<Vec<(u32, Callback)>> = Mutex::new(Vec::new());

/// Key injection via `SendInput` scan-code events
pub struct SendInputSink {
    /// Key name → scan code translations, resolved once per key
    scan_cache: Mutex<HashMap<String, u16>>,
}

impl SendInputSink {
    pub fn new() -> Self {
        Self { scan_cache: Mutex::new(HashMap::new()) }
    }

    fn scan_code_for(&self, key: &PhysicalKey) -> Result<u16, InputError> {
        if let Ok(cache) = self.scan_cache.lock() {
            if let Some(scan) = cache.get(key.as_str()) {
                return Ok(*scan);
            }
        }

        let ch = key
            .as_str()
            .chars()
            .next()
            .ok_or_else(|| InputError::UntranslatableKey(key.to_string()))?;
        let vk_and_shift = unsafe { VkKeyScanW(ch as u16) };
        if vk_and_shift == -1 {
            return Err(InputError::UntranslatableKey(key.to_string()));
        }
        let vk = (vk_and_shift & 0xFF) as u32;
        let scan = unsafe { MapVirtualKeyW(vk, MAPVK_VK_TO_VSC) } as u16;
        if scan == 0 {
            return Err(InputError::UntranslatableKey(key.to_string()));
        }

        if let Ok(mut cache) = self.scan_cache.lock() {
            cache.insert(key.as_str().to_string(), scan);
        }
        Ok(scan)
    }

    fn send(&self, key: &PhysicalKey, flags: KEYBD_EVENT_FLAGS) -> Result<(), InputError> {
        let scan = self.scan_code_for(key)?;
        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(0),
                    wScan: scan,
                    dwFlags: KEYEVENTF_SCANCODE | flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };
        let sent = unsafe { SendInput(&[input], size_of::<INPUT>() as i32) };
        if sent == 0 {
            return Err(InputError::Injection {
                key: key.to_string(),
                reason: "SendInput injected 0 events".into(),
            });
        }
        Ok(())
    }
}

impl Default for SendInputSink {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySink for SendInputSink {
    fn key_down(&self, key: &PhysicalKey) -> Result<(), InputError> {
        self.send(key, KEYBD_EVENT_FLAGS(0))
    }

    fn key_up(&self, key: &PhysicalKey) -> Result<(), InputError> {
        self.send(key, KEYEVENTF_KEYUP)
    }
}

/// Global hotkeys via a low-level keyboard hook
///
/// Owns the hook thread; dropping posts `WM_QUIT` and joins it.
pub struct LowLevelHotkeys {
    thread_id: u32,
    thread: Option<JoinHandle<()>>,
}

impl LowLevelHotkeys {
    pub fn new() -> Result<Self, InputError> {
        let (ready_tx, ready_rx) = flume::bounded::<Result<u32, String>>(1);

        let thread = std::thread::Builder::new()
            .name("hotkey-hook".into())
            .spawn(move || Self::run(ready_tx))
            .map_err(|e| InputError::HookRegistration(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => Ok(Self { thread_id, thread: Some(thread) }),
            Ok(Err(reason)) => Err(InputError::HookRegistration(reason)),
            Err(_) => Err(InputError::HookRegistration("hook thread died".into())),
        }
    }

    fn run(ready_tx: flume::Sender<Result<u32, String>>) {
        // the LL hook must be installed by the thread that pumps messages
        let hook = match unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(hook_proc), None, 0) } {
            Ok(hook) => hook,
            Err(e) => {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }
        };
        let _ = ready_tx.send(Ok(unsafe { GetCurrentThreadId() }));
        log::info!("keyboard hook installed");

        let mut msg = MSG::default();
        unsafe {
            while GetMessageW(&mut msg, None, 0, 0).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
            if let Err(e) = UnhookWindowsHookEx(hook) {
                log::warn!("failed to remove keyboard hook: {e}");
            }
        }
        log::info!("keyboard hook removed");
    }
}

impl HotkeyHook for LowLevelHotkeys {
    fn on_press(
        &self,
        scan_code: ScanCode,
        callback: Box<dyn Fn() + Send + Sync>,
    ) -> Result<(), InputError> {
        HOTKEY_REGISTRY
            .lock()
            .map_err(|_| InputError::HookRegistration("hotkey registry poisoned".into()))?
            .push((scan_code.0, callback));
        Ok(())
    }

    fn unregister_all(&self) {
        if let Ok(mut registry) = HOTKEY_REGISTRY.lock() {
            registry.clear();
        }
    }
}

impl Drop for LowLevelHotkeys {
    fn drop(&mut self) {
        self.unregister_all();
        unsafe {
            if let Err(e) = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) {
                log::warn!("failed to stop hook thread: {e}");
            }
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Dispatches key-down events to registered callbacks.
///
/// Runs on the hook thread inside the OS input path: match, fire, pass
/// the event along. Callbacks are bound to not block.
unsafe extern "system" fn hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code >= 0 {
        let message = wparam.0 as u32;
        if message == WM_KEYDOWN || message == WM_SYSKEYDOWN {
            let event = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
            if let Ok(registry) = HOTKEY_REGISTRY.lock() {
                for (scan, callback) in registry.iter() {
                    if *scan == event.scanCode {
                        callback();
                    }
                }
            }
        }
    }
    unsafe { CallNextHookEx(None, code, wparam, lparam) }
}

/// Foreground window title via `GetForegroundWindow`
pub struct ForegroundWindow;

impl ActiveWindow for ForegroundWindow {
    fn active_title(&self) -> Option<String> {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.is_invalid() {
                return None;
            }
            let mut title = [0u16; 512];
            let len = GetWindowTextW(hwnd, &mut title);
            if len <= 0 {
                return None;
            }
            Some(String::from_utf16_lossy(&title[..len as usize]))
        }
    }
}
