//! Shared key identifier types
//!
//! These types name keys at two different levels: `PhysicalKey` is the
//! OS-facing identifier of a keyboard key (what gets injected into the
//! input stream), `ScanCode` is the hardware-level code hotkey hooks
//! match against. Both are consumed by the input and player crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a physical keyboard key, as the OS input layer names it
///
/// For the in-game keyboard this is a single character (`"y"`, `";"`, …),
/// but nothing in the engine assumes single-character names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicalKey(String);

impl PhysicalKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhysicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhysicalKey {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Hardware scan code of a key, used for global hotkey matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanCode(pub u32);

impl fmt::Display for ScanCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
