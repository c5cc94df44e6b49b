//! External sheet converter integration
//!
//! Non-native formats (MIDI and friends) are handled by shelling out to
//! the `hyperchoron` CLI rather than linking a decoder. The tool is
//! probed once at startup with `-lf`; if it is absent the store simply
//! runs in native-format-only mode.

use crate::error::{SheetError, SheetResult};
use std::collections::BTreeSet;
use std::path::Path;
use std::process::{Command, Stdio};

/// Converter executable, resolved through PATH
pub const CONVERTER_BIN: &str = "hyperchoron";

/// Formats parseable without any converter
pub const NATIVE_EXTENSIONS: &[&str] = &["txt", "json", "skysheet"];

/// Canonical extension written by `SheetStore::save`
pub const SHEET_EXTENSION: &str = "skysheet";

/// Suffix of the cached conversion artifact written next to the source
pub const CACHE_SUFFIX: &str = "~";

/// Handle to a located converter and the input formats it decodes
pub struct Converter {
    extra_extensions: BTreeSet<String>,
}

impl Converter {
    /// Probe for the converter on PATH.
    ///
    /// Runs `hyperchoron -lf` and parses the decoder list from its
    /// output. Returns `None` when the tool is missing or the output is
    /// not in the expected shape, and the store degrades to native-only.
    pub fn detect() -> Option<Self> {
        let output = match Command::new(CONVERTER_BIN)
            .arg("-lf")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
        {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                log::debug!("converter probe exited with {:?}", output.status.code());
                return None;
            }
            Err(e) => {
                log::info!("no sheet converter found ({CONVERTER_BIN}: {e}), native formats only");
                return None;
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let extra_extensions = parse_format_listing(&stdout)?;
        log::info!(
            "converter {CONVERTER_BIN} found, {} extra input format(s)",
            extra_extensions.len()
        );
        Some(Self { extra_extensions })
    }

    /// Input extensions the converter decodes, beyond the native set
    pub fn extra_extensions(&self) -> impl Iterator<Item = &str> {
        self.extra_extensions.iter().map(String::as_str)
    }

    /// Convert `input` into the native sheet format at `output`.
    ///
    /// A spawn failure is `ConversionFailed`; a non-zero exit is only
    /// logged; the caller decides by parsing whatever was produced.
    pub fn convert(&self, input: &Path, output: &Path) -> SheetResult<()> {
        log::info!("converting {input:?} → {output:?}");
        let status = Command::new(CONVERTER_BIN)
            .arg("-i")
            .arg(input)
            .arg("-si")
            .arg("-f")
            .arg(SHEET_EXTENSION)
            .arg("-o")
            .arg(output)
            .status()
            .map_err(|e| SheetError::ConversionFailed {
                path: input.to_path_buf(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            log::warn!("converter exited with {:?} for {input:?}", status.code());
        }
        Ok(())
    }
}

/// Parse the `-lf` listing: everything after the `# Decoders:` header is
/// one input extension per line.
fn parse_format_listing(stdout: &str) -> Option<BTreeSet<String>> {
    let (_, after_encoders) = stdout.split_once("# Encoders:\n")?;
    let (_, decoders) = after_encoders.split_once("\n# Decoders:\n")?;
    Some(
        decoders
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    )
}
