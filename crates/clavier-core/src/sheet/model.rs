//! On-disk sheet data model
//!
//! A sheet file is UTF-8 JSON: either one sheet object or an array of
//! them. A sheet comes in two forms that can coexist in one object:
//! the column form (`bpm` + `columns`, the editable source) and the
//! derived form (`songNotes`, absolute-time events the player consumes).
//! Any other fields (title, author, …) are preserved verbatim across
//! load/save via the flattened `extra` map.

use serde::{Deserialize, Serialize};

/// One musical piece
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    /// Beats per minute; one beat is `60000 / bpm` milliseconds
    pub bpm: f64,

    /// Column form: ordered time slices, each with its own subdivision
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Column>,

    /// Derived form: flat ordered note events with absolute times
    #[serde(rename = "songNotes", default, skip_serializing_if = "Vec::is_empty")]
    pub song_notes: Vec<DerivedNote>,

    /// Unknown metadata fields, carried through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Sheet {
    /// Create a bare sheet with no notes
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            columns: Vec::new(),
            song_notes: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A time slice at a given tempo subdivision
///
/// Serialized as `[tempo_exponent, [[position, layer_mask], ...]]`.
/// The column lasts `beat_ms / 2^tempo_exponent` milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column(pub u32, pub Vec<RawNote>);

impl Column {
    pub fn tempo_exponent(&self) -> u32 {
        self.0
    }

    pub fn notes(&self) -> &[RawNote] {
        &self.1
    }
}

/// A note inside a column: key index plus hex-encoded voice bitmask
///
/// Serialized as `[position, layer_mask]`. The mask's population count
/// is the number of overlapping voices on this note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNote(pub u32, pub String);

impl RawNote {
    pub fn position(&self) -> u32 {
        self.0
    }

    pub fn layer_mask(&self) -> &str {
        &self.1
    }
}

/// A derived note event: label plus absolute time in milliseconds
///
/// The label format is `"<layer_count>Key<position>"`, e.g. `"1Key3"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedNote {
    pub key: String,
    pub time: u64,
}
