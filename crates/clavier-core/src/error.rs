//! Sheet loading and conversion error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, converting or saving sheets
#[derive(Error, Debug)]
pub enum SheetError {
    /// File is neither valid sheet JSON nor convertible
    #[error(
        "invalid sheet file {path:?}: not valid sheet JSON. If this is a MIDI \
         or other music file, install the hyperchoron converter to play it"
    )]
    InvalidSheetFormat { path: PathBuf },

    /// No converter is installed for a non-native format
    #[error("no sheet converter available for {path:?} (hyperchoron not found on PATH)")]
    ConversionUnavailable { path: PathBuf },

    /// Converter was located but could not be executed
    #[error("sheet converter failed on {path:?}: {reason}")]
    ConversionFailed { path: PathBuf, reason: String },

    /// A note's layer mask is not a hex string
    #[error("invalid layer mask {mask:?} in column {column}")]
    InvalidLayerMask { mask: String, column: usize },

    /// Sheet bpm must be positive to derive timings
    #[error("sheet bpm must be positive, got {bpm}")]
    InvalidBpm { bpm: f64 },

    /// File parsed but holds no sheets (empty JSON array)
    #[error("sheet file {path:?} contains no sheets")]
    EmptySheet { path: PathBuf },

    /// File I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure outside of format detection
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for sheet operations
pub type SheetResult<T> = Result<T, SheetError>;
