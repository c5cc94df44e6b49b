//! Chord grouper: derived notes → timed physical key sets
//!
//! Notes that share a millisecond timestamp collapse into one chord.
//! Grouping through a `BTreeMap` keyed on the timestamp gives the
//! ascending-time invariant the scheduler relies on for free, and the
//! per-chord `BTreeSet` makes intra-chord key order deterministic.

use crate::sheet::model::DerivedNote;
use crate::types::PhysicalKey;
use std::collections::{BTreeMap, BTreeSet};

/// A set of physical keys scheduled for the same instant
#[derive(Debug, Clone, PartialEq)]
pub struct Chord {
    /// Scheduled time in seconds from sheet start
    pub time_sec: f64,
    /// Keys to press, in sorted order, no duplicates
    pub keys: Vec<PhysicalKey>,
}

/// Group derived notes into chords, resolving labels to physical keys.
///
/// The key map is keyed by the label's position suffix (the part after
/// `"Key"`); the layer-count prefix only matters for voice counting.
/// Splitting at the `"Key"` marker instead of a fixed prefix width keeps
/// two-digit layer counts resolving to the same physical key as
/// single-digit ones. Labels with no mapping are dropped, not fatal.
pub fn group_chords(
    notes: &[DerivedNote],
    key_map: &BTreeMap<String, PhysicalKey>,
) -> Vec<Chord> {
    let mut grouped: BTreeMap<u64, BTreeSet<PhysicalKey>> = BTreeMap::new();

    for note in notes {
        let Some(key) = resolve_label(&note.key, key_map) else {
            log::debug!("no key mapping for note label {:?}, dropping", note.key);
            continue;
        };
        grouped.entry(note.time).or_default().insert(key);
    }

    grouped
        .into_iter()
        .map(|(time_ms, keys)| Chord {
            time_sec: time_ms as f64 / 1000.0,
            keys: keys.into_iter().collect(),
        })
        .collect()
}

/// Map a `"<layer_count>Key<position>"` label to its physical key
fn resolve_label(
    label: &str,
    key_map: &BTreeMap<String, PhysicalKey>,
) -> Option<PhysicalKey> {
    let (_, position) = label.split_once("Key")?;
    key_map.get(position).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_map(pairs: &[(&str, &str)]) -> BTreeMap<String, PhysicalKey> {
        pairs
            .iter()
            .map(|(pos, key)| (pos.to_string(), PhysicalKey::from(*key)))
            .collect()
    }

    fn note(key: &str, time: u64) -> DerivedNote {
        DerivedNote { key: key.to_string(), time }
    }

    #[test]
    fn test_equal_times_collapse_into_one_chord() {
        let map = key_map(&[("3", "y"), ("5", "u")]);
        let chords = group_chords(&[note("1Key3", 100), note("1Key5", 100)], &map);
        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].time_sec, 0.1);
        assert_eq!(chords[0].keys, vec![PhysicalKey::from("u"), PhysicalKey::from("y")]);
    }

    #[test]
    fn test_chords_sorted_ascending() {
        let map = key_map(&[("0", "y"), ("1", "u"), ("2", "i")]);
        let chords = group_chords(
            &[note("1Key0", 600), note("1Key1", 100), note("1Key2", 350)],
            &map,
        );
        let times: Vec<f64> = chords.iter().map(|c| c.time_sec).collect();
        assert_eq!(times, vec![0.1, 0.35, 0.6]);
    }

    #[test]
    fn test_unmapped_label_dropped() {
        let map = key_map(&[("0", "y")]);
        let chords = group_chords(&[note("1Key0", 100), note("1Key9", 100)], &map);
        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].keys, vec![PhysicalKey::from("y")]);
    }

    #[test]
    fn test_duplicate_keys_within_chord_deduplicated() {
        // two voices of the same position at the same instant press one key
        let map = key_map(&[("4", "p")]);
        let chords = group_chords(&[note("1Key4", 100), note("2Key4", 100)], &map);
        assert_eq!(chords[0].keys, vec![PhysicalKey::from("p")]);
    }

    #[test]
    fn test_two_digit_layer_count_resolves() {
        let map = key_map(&[("3", "y")]);
        let chords = group_chords(&[note("12Key3", 100)], &map);
        assert_eq!(chords[0].keys, vec![PhysicalKey::from("y")]);
    }

    #[test]
    fn test_two_digit_position_resolves() {
        let map = key_map(&[("14", "/")]);
        let chords = group_chords(&[note("1Key14", 100)], &map);
        assert_eq!(chords[0].keys, vec![PhysicalKey::from("/")]);
    }

    #[test]
    fn test_label_without_marker_dropped() {
        let map = key_map(&[("0", "y")]);
        assert!(group_chords(&[note("garbage", 100)], &map).is_empty());
    }
}
