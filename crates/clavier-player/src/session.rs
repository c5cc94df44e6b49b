//! Hotkey-gated playback session
//!
//! One scheduler thread owns the state machine:
//!
//! ```text
//! Idle → Armed → Playing → Paused → (Armed again)
//!                        ↘ Stopped
//! ```
//!
//! The thread blocks on a wake channel. The start hotkey callback and
//! `quit()` both send on it, so quitting always wakes the scheduler and
//! the join completes in bounded time. The stop hotkey callback only
//! stores an atomic pause flag; the playback loop re-checks it at every
//! chord boundary, so cancellation is cooperative and never lands
//! mid-chord.
//!
//! A pass that runs to its final chord stops the session: playback is
//! one-shot per arm. A paused pass rearms instead, waiting for the next
//! start press.

use clavier_core::sheet::Chord;
use clavier_core::ScanCode;
use clavier_input::{ActiveWindow, HotkeyHook, InputError, KeySink, ReleasePool};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::progress::Progress;

/// Fixed offset before the first chord of a pass, absorbing hook latency
pub const PASS_LEAD_IN: Duration = Duration::from_millis(250);

/// How long a key stays down before its deferred release
pub const KEY_HOLD: Duration = Duration::from_millis(40);

/// Longest `quit()` waits for the scheduler thread before detaching it
const QUIT_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Armed = 1,
    Playing = 2,
    Paused = 3,
    Stopped = 4,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Armed,
            2 => Self::Playing,
            3 => Self::Paused,
            _ => Self::Stopped,
        }
    }
}

/// Why a playback pass ended
enum PassOutcome {
    /// Reached the final chord
    Completed,
    /// Stop hotkey fired; remaining chords abandoned
    Paused,
    /// Quit requested or the release pool rejected a submission
    Aborted,
}

/// Wake signals for the blocked scheduler thread
enum Wake {
    Start,
    Quit,
}

/// The capabilities a session drives the OS through
pub struct SessionBackend {
    pub sink: Arc<dyn KeySink>,
    pub hotkeys: Arc<dyn HotkeyHook>,
    pub window: Arc<dyn ActiveWindow>,
}

/// Hotkey bindings and the window gate for one session
pub struct SessionParams {
    pub start_key: ScanCode,
    pub stop_key: ScanCode,
    pub target_window: String,
}

/// Handle to a running playback session
///
/// Dropping the handle quits the session.
pub struct PlaybackSession {
    progress: Arc<Progress>,
    state: Arc<AtomicU8>,
    exit: Arc<AtomicBool>,
    wake_tx: flume::Sender<Wake>,
    hotkeys: Arc<dyn HotkeyHook>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackSession {
    /// Register hotkeys and start the scheduler thread in `Armed` state.
    ///
    /// `chords` must be sorted ascending by time, which is what
    /// [`clavier_core::sheet::group_chords`] produces.
    pub fn spawn(
        chords: Vec<Chord>,
        params: SessionParams,
        backend: SessionBackend,
    ) -> Result<Self, InputError> {
        let progress = Arc::new(Progress::new());
        let state = Arc::new(AtomicU8::new(SessionState::Idle as u8));
        let pause = Arc::new(AtomicBool::new(false));
        let exit = Arc::new(AtomicBool::new(false));
        let (wake_tx, wake_rx) = flume::bounded(8);

        {
            let tx = wake_tx.clone();
            backend.hotkeys.on_press(
                params.start_key,
                Box::new(move || {
                    let _ = tx.try_send(Wake::Start);
                }),
            )?;
        }
        {
            let pause = Arc::clone(&pause);
            backend.hotkeys.on_press(
                params.stop_key,
                Box::new(move || pause.store(true, Ordering::Relaxed)),
            )?;
        }

        let scheduler = Scheduler {
            chords,
            target_window: params.target_window,
            sink: backend.sink,
            window: backend.window,
            state: Arc::clone(&state),
            pause,
            exit: Arc::clone(&exit),
            progress: Arc::clone(&progress),
            wake_rx,
        };
        let thread = std::thread::Builder::new()
            .name("playback-scheduler".into())
            .spawn(move || scheduler.run())
            .expect("Failed to spawn playback scheduler thread");

        log::info!("playback session armed");
        Ok(Self {
            progress,
            state,
            exit,
            wake_tx,
            hotkeys: backend.hotkeys,
            thread: Some(thread),
        })
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Relaxed))
    }

    /// A session stays alive until it reaches `Stopped`.
    pub fn is_alive(&self) -> bool {
        self.state() != SessionState::Stopped
    }

    /// Shared progress counters for external polling.
    pub fn progress(&self) -> Arc<Progress> {
        Arc::clone(&self.progress)
    }

    /// Stop the session: wake the scheduler, release all hotkey hooks
    /// and join the thread with a bounded wait. Quitting an already
    /// stopped session is a no-op.
    pub fn quit(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        log::info!("quitting playback session");
        self.exit.store(true, Ordering::Relaxed);
        let _ = self.wake_tx.try_send(Wake::Quit);
        self.hotkeys.unregister_all();

        let deadline = Instant::now() + QUIT_JOIN_TIMEOUT;
        while !thread.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        if thread.is_finished() {
            let _ = thread.join();
        } else {
            log::warn!(
                "scheduler thread still busy after {:?}, detaching",
                QUIT_JOIN_TIMEOUT
            );
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.quit();
    }
}

/// State owned by the scheduler thread
struct Scheduler {
    chords: Vec<Chord>,
    target_window: String,
    sink: Arc<dyn KeySink>,
    window: Arc<dyn ActiveWindow>,
    state: Arc<AtomicU8>,
    pause: Arc<AtomicBool>,
    exit: Arc<AtomicBool>,
    progress: Arc<Progress>,
    wake_rx: flume::Receiver<Wake>,
}

impl Scheduler {
    fn run(self) {
        let pool = ReleasePool::new(Arc::clone(&self.sink));

        'session: loop {
            // presses that arrived while playing are stale, not queued
            // replays; only a pending quit matters
            for wake in self.wake_rx.drain() {
                if matches!(wake, Wake::Quit) {
                    break 'session;
                }
            }

            self.set_state(SessionState::Armed);
            let wake = match self.wake_rx.recv() {
                Ok(wake) => wake,
                Err(_) => break,
            };
            if self.exit.load(Ordering::Relaxed) || matches!(wake, Wake::Quit) {
                break;
            }

            self.pause.store(false, Ordering::Relaxed);
            if !self.gate_passes() {
                log::debug!("start press ignored, target window not active");
                continue;
            }

            self.set_state(SessionState::Playing);
            log::info!("starting playback pass ({} chords)", self.chords.len());
            match self.play_pass(&pool) {
                PassOutcome::Completed => {
                    log::info!("playback pass completed");
                    break;
                }
                PassOutcome::Paused => {
                    self.set_state(SessionState::Paused);
                    log::info!("playback paused, rearming");
                }
                PassOutcome::Aborted => break,
            }
        }

        self.set_state(SessionState::Stopped);
        self.progress.finish();
        log::info!("playback session stopped");
    }

    /// One pass over the chord sequence against the monotonic clock.
    fn play_pass(&self, pool: &ReleasePool) -> PassOutcome {
        let (Some(first), Some(last)) = (self.chords.first(), self.chords.last()) else {
            return PassOutcome::Completed;
        };
        self.progress.begin_pass(last.time_sec.round() as u64);

        let started = Instant::now();
        let base = first.time_sec;
        let lead_in = PASS_LEAD_IN.as_secs_f64();

        for chord in &self.chords {
            // absolute targets, so sleep jitter does not accumulate
            let target = chord.time_sec - base + lead_in;
            let remaining = target - started.elapsed().as_secs_f64();
            if remaining > 0.0 {
                std::thread::sleep(Duration::from_secs_f64(remaining));
            }

            if self.exit.load(Ordering::Relaxed) {
                return PassOutcome::Aborted;
            }
            if self.pause.load(Ordering::Relaxed) {
                return PassOutcome::Paused;
            }

            log::debug!("chord at {:.3}s, {} key(s)", chord.time_sec, chord.keys.len());
            for key in &chord.keys {
                // release first: if the OS still considers the key held
                // from a prior chord, the down would not retrigger
                if let Err(e) = self.sink.key_up(key) {
                    log::warn!("key-up '{key}' failed: {e}");
                }
                if let Err(e) = self.sink.key_down(key) {
                    log::warn!("key-down '{key}' failed: {e}");
                }
                if let Err(e) = pool.submit(key.clone(), KEY_HOLD) {
                    log::error!("deferred release submission failed: {e}");
                    return PassOutcome::Aborted;
                }
            }
            self.progress.set_current(chord.time_sec.round() as u64);
        }
        PassOutcome::Completed
    }

    /// The press only counts when the target application is focused.
    fn gate_passes(&self) -> bool {
        match self.window.active_title() {
            Some(title) => title.split_whitespace().next() == Some(self.target_window.as_str()),
            None => false,
        }
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }
}
