//! Sheet library directory scanning

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// List playable sheet files in a library directory, sorted by name.
///
/// Creates the directory on first run so the user has somewhere to drop
/// files into. Only extensions from `extensions` are listed, which
/// keeps conversion caches and stray files out of the song list.
pub fn scan_library(dir: &Path, extensions: &BTreeSet<String>) -> io::Result<Vec<PathBuf>> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        log::info!("created sheet library directory {dir:?}");
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_supported_extension(path, extensions))
        .collect();
    files.sort();
    Ok(files)
}

fn has_supported_extension(path: &Path, extensions: &BTreeSet<String>) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.skysheet", "a.skysheet", "notes.txt", "cover.png", "a.skysheet~"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }

        let files = scan_library(dir.path(), &extensions(&["skysheet", "txt"])).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.skysheet", "b.skysheet", "notes.txt"]);
    }

    #[test]
    fn test_scan_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("library");
        let files = scan_library(&library, &extensions(&["skysheet"])).unwrap();
        assert!(files.is_empty());
        assert!(library.is_dir());
    }
}
