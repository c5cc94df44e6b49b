//! Sheet domain: file model, derivation, chord grouping and storage
//!
//! The pipeline runs left to right:
//!
//! ```text
//! SheetStore::load → derive_notes → group_chords → (player crate)
//! ```
//!
//! `store` owns the on-disk format and the external-converter fallback,
//! `derive` turns tempo columns into absolute-time note events, and
//! `chord` resolves those events into the physical key sets the
//! scheduler dispatches.

mod chord;
mod convert;
mod derive;
mod model;
mod pretty;
mod store;

pub use chord::{group_chords, Chord};
pub use convert::{Converter, CACHE_SUFFIX, CONVERTER_BIN, NATIVE_EXTENSIONS, SHEET_EXTENSION};
pub use derive::{derive_notes, DERIVE_LEAD_IN_MS};
pub use model::{Column, DerivedNote, RawNote, Sheet};
pub use pretty::pretty_json;
pub use store::SheetStore;
