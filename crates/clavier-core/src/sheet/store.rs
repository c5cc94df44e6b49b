//! Sheet store: load, save and convert sheet files
//!
//! Loading is a two-stage affair: parse the bytes as sheet JSON, and on
//! failure fall back to the external converter, caching its output at a
//! sibling path (`<file>~`) so the conversion runs at most once per
//! source file. A zero-byte cache counts as "not yet converted"; an
//! interrupted conversion must not wedge the file forever.

use crate::error::{SheetError, SheetResult};
use crate::sheet::convert::{Converter, CACHE_SUFFIX, NATIVE_EXTENSIONS, SHEET_EXTENSION};
use crate::sheet::derive::derive_notes;
use crate::sheet::model::Sheet;
use crate::sheet::pretty::pretty_json;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Sheet file storage with optional converter fallback
pub struct SheetStore {
    converter: Option<Converter>,
}

impl SheetStore {
    /// Create a store, probing PATH for the external converter once.
    pub fn new() -> Self {
        Self { converter: Converter::detect() }
    }

    /// Create a store without converter support (native formats only).
    pub fn native_only() -> Self {
        Self { converter: None }
    }

    /// All input extensions this store can load.
    pub fn supported_extensions(&self) -> BTreeSet<String> {
        let mut extensions: BTreeSet<String> =
            NATIVE_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        if let Some(converter) = &self.converter {
            extensions.extend(converter.extra_extensions().map(str::to_string));
        }
        extensions
    }

    /// Load all sheets from a file.
    ///
    /// Accepts a single JSON object or an array of them; always returns
    /// at least one sheet. Unparseable files go through the converter
    /// cache when a converter is present.
    pub fn load(&self, path: &Path) -> SheetResult<Vec<Sheet>> {
        let bytes = fs::read(path)?;
        let sheets = match parse_sheets(&bytes) {
            Ok(sheets) => sheets,
            Err(e) => {
                log::debug!("{path:?} is not sheet JSON ({e}), trying converter");
                self.load_via_converter(path)?
            }
        };
        if sheets.is_empty() {
            return Err(SheetError::EmptySheet { path: path.to_path_buf() });
        }
        Ok(sheets)
    }

    /// Save sheets in the canonical pretty form.
    ///
    /// The extension is normalized to `.skysheet`; the path actually
    /// written is returned.
    pub fn save(&self, sheets: &[Sheet], path: &Path) -> SheetResult<PathBuf> {
        let path = normalize_extension(path);
        let value = serde_json::to_value(sheets)?;
        fs::write(&path, pretty_json(&value))?;
        Ok(path)
    }

    /// Change a file's tempo: load, set sheet 0's bpm, re-derive its
    /// notes and save under the canonical extension.
    pub fn update_bpm(&self, path: &Path, bpm: f64) -> SheetResult<PathBuf> {
        let mut sheets = self.load(path)?;
        sheets[0].bpm = bpm;
        derive_notes(&mut sheets[0])?;
        let saved = self.save(&sheets, path)?;
        log::info!("updated bpm of {path:?} to {bpm}, saved as {saved:?}");
        Ok(saved)
    }

    fn load_via_converter(&self, path: &Path) -> SheetResult<Vec<Sheet>> {
        let Some(converter) = &self.converter else {
            // native-extension files that fail to parse are just broken;
            // anything else needed the converter we don't have
            return if has_native_extension(path) {
                Err(SheetError::InvalidSheetFormat { path: path.to_path_buf() })
            } else {
                Err(SheetError::ConversionUnavailable { path: path.to_path_buf() })
            };
        };

        let cache = cache_path(path);
        if cache_is_stale(&cache) {
            converter.convert(path, &cache)?;
        } else {
            log::debug!("reusing conversion cache {cache:?}");
        }

        let bytes = match fs::read(&cache) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // converter ran but produced nothing
                return Err(SheetError::InvalidSheetFormat { path: path.to_path_buf() });
            }
            Err(e) => return Err(e.into()),
        };
        parse_sheets(&bytes)
            .map_err(|_| SheetError::InvalidSheetFormat { path: path.to_path_buf() })
    }
}

impl Default for SheetStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse file bytes as one sheet object or an array of them.
fn parse_sheets(bytes: &[u8]) -> Result<Vec<Sheet>, serde_json::Error> {
    let value: Value = serde_json::from_slice(bytes)?;
    match value {
        Value::Array(items) => items.into_iter().map(serde_json::from_value).collect(),
        other => Ok(vec![serde_json::from_value(other)?]),
    }
}

/// Cache artifact path: the source path with the reserved suffix appended.
fn cache_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(CACHE_SUFFIX);
    PathBuf::from(name)
}

/// Missing or zero-byte caches need (re)conversion.
fn cache_is_stale(cache: &Path) -> bool {
    match fs::metadata(cache) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    }
}

fn has_native_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| NATIVE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn normalize_extension(path: &Path) -> PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some(SHEET_EXTENSION) {
        path.to_path_buf()
    } else {
        path.with_extension(SHEET_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::model::{Column, DerivedNote, RawNote};

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_single_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "one.skysheet", r#"{"bpm": 120, "songNotes": []}"#);
        let sheets = SheetStore::native_only().load(&path).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].bpm, 120.0);
    }

    #[test]
    fn test_load_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "two.json", r#"[{"bpm": 100}, {"bpm": 200}]"#);
        let sheets = SheetStore::native_only().load(&path).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[1].bpm, 200.0);
    }

    #[test]
    fn test_load_empty_array_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "none.json", "[]");
        assert!(matches!(
            SheetStore::native_only().load(&path),
            Err(SheetError::EmptySheet { .. })
        ));
    }

    #[test]
    fn test_load_garbage_native_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "broken.json", "{not json");
        assert!(matches!(
            SheetStore::native_only().load(&path),
            Err(SheetError::InvalidSheetFormat { .. })
        ));
    }

    #[test]
    fn test_load_foreign_extension_without_converter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "song.mid", "MThd\x00\x00");
        assert!(matches!(
            SheetStore::native_only().load(&path),
            Err(SheetError::ConversionUnavailable { .. })
        ));
    }

    #[test]
    fn test_missing_file_propagates_io() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.skysheet");
        assert!(matches!(
            SheetStore::native_only().load(&missing),
            Err(SheetError::Io(_))
        ));
    }

    #[test]
    fn test_save_normalizes_extension_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SheetStore::native_only();

        let mut sheet = Sheet::new(120.0);
        sheet.columns = vec![Column(0, vec![RawNote(3, "1".into())])];
        sheet.song_notes = vec![DerivedNote { key: "1Key3".into(), time: 100 }];
        sheet.extra.insert("name".into(), "Round Trip".into());

        let saved = store.save(&[sheet.clone()], &dir.path().join("song.json")).unwrap();
        assert_eq!(saved.extension().unwrap(), "skysheet");

        let loaded = store.load(&saved).unwrap();
        assert_eq!(loaded, vec![sheet]);
    }

    #[test]
    fn test_save_keeps_canonical_extension() {
        let dir = tempfile::tempdir().unwrap();
        let saved = SheetStore::native_only()
            .save(&[Sheet::new(90.0)], &dir.path().join("keep.skysheet"))
            .unwrap();
        assert_eq!(saved.file_name().unwrap(), "keep.skysheet");
    }

    #[test]
    fn test_update_bpm_rederives() {
        let dir = tempfile::tempdir().unwrap();
        let store = SheetStore::native_only();

        let mut sheet = Sheet::new(120.0);
        sheet.columns = vec![
            Column(0, vec![RawNote(3, "1".into())]),
            Column(0, vec![RawNote(5, "1".into())]),
        ];
        let path = store.save(&[sheet], &dir.path().join("song.skysheet")).unwrap();

        // halving the tempo doubles the column duration
        let saved = store.update_bpm(&path, 60.0).unwrap();
        let sheets = store.load(&saved).unwrap();
        assert_eq!(sheets[0].bpm, 60.0);
        assert_eq!(sheets[0].song_notes[0].time, 100);
        assert_eq!(sheets[0].song_notes[1].time, 1100);
    }

    #[test]
    fn test_cache_staleness() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("song.mid~");
        assert!(cache_is_stale(&cache), "missing cache needs conversion");

        fs::write(&cache, "").unwrap();
        assert!(cache_is_stale(&cache), "zero-byte cache needs conversion");

        fs::write(&cache, r#"{"bpm": 120}"#).unwrap();
        assert!(!cache_is_stale(&cache));
    }

    #[test]
    fn test_cache_path_appends_suffix() {
        assert_eq!(
            cache_path(Path::new("/tmp/song.mid")),
            PathBuf::from("/tmp/song.mid~")
        );
    }

    #[test]
    fn test_supported_extensions_native_only() {
        let extensions = SheetStore::native_only().supported_extensions();
        assert!(extensions.contains("skysheet"));
        assert!(extensions.contains("json"));
        assert!(extensions.contains("txt"));
        assert!(!extensions.contains("mid"));
    }
}
