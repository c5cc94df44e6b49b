//! Clavier Core - sheet model, storage and note derivation
//!
//! This crate holds everything about a piece of music *before* it is
//! played: the on-disk sheet format (JSON, with an external converter
//! fallback for other formats), the note deriver that turns tempo
//! columns into absolute-time events, the chord grouper that resolves
//! note labels into physical key sets, and the user configuration
//! consumed by the player.

pub mod config;
pub mod error;
pub mod library;
pub mod sheet;
pub mod types;

pub use error::{SheetError, SheetResult};
pub use types::*;
