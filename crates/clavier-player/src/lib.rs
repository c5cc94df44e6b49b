//! Playback scheduling engine for the clavier auto-player
//!
//! Takes the chord sequence produced by `clavier-core`, arms a
//! hotkey-gated session and plays it into whatever `clavier-input`
//! backend it was given. The binary in this crate is the headless
//! shell; a graphical shell would consume the same two modules.

pub mod progress;
pub mod session;

pub use progress::Progress;
pub use session::{
    PlaybackSession, SessionBackend, SessionParams, SessionState, KEY_HOLD, PASS_LEAD_IN,
};
