//! Note deriver: tempo columns → absolute-time note events
//!
//! Single forward pass over the columns. Each column contributes its
//! notes at the running timestamp, then advances it by its subdivided
//! beat duration. The derived events replace the sheet's `songNotes`.

use crate::error::{SheetError, SheetResult};
use crate::sheet::model::{DerivedNote, Sheet};

/// Fixed lead-in before the first note, in milliseconds
///
/// Gives the input hooks time to settle before the first key lands,
/// independent of bpm.
pub const DERIVE_LEAD_IN_MS: f64 = 100.0;

/// Derive absolute-time note events from a sheet's columns.
///
/// No-op when the sheet carries no column data: it was supplied in
/// pre-derived form, or already derived. Re-running on such a sheet
/// never accumulates offsets twice.
pub fn derive_notes(sheet: &mut Sheet) -> SheetResult<()> {
    if sheet.columns.is_empty() {
        return Ok(());
    }
    if sheet.bpm <= 0.0 {
        return Err(SheetError::InvalidBpm { bpm: sheet.bpm });
    }

    let beat_ms = 60_000.0 / sheet.bpm;
    let mut timestamp = DERIVE_LEAD_IN_MS;
    let mut notes = Vec::new();

    for (idx, column) in sheet.columns.iter().enumerate() {
        let tempo = 0.5f64.powi(column.tempo_exponent() as i32);
        for note in column.notes() {
            let count = layer_count(note.layer_mask()).ok_or_else(|| {
                SheetError::InvalidLayerMask {
                    mask: note.layer_mask().to_string(),
                    column: idx,
                }
            })?;
            notes.push(DerivedNote {
                key: format!("{}Key{}", count, note.position()),
                time: timestamp.round() as u64,
            });
        }
        timestamp += beat_ms * tempo;
    }

    sheet.song_notes = notes;
    Ok(())
}

/// Number of voices in a hex layer mask (its population count)
fn layer_count(mask: &str) -> Option<u32> {
    u64::from_str_radix(mask, 16).ok().map(|m| m.count_ones())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::model::{Column, RawNote};

    fn sheet_with_columns(bpm: f64, columns: Vec<Column>) -> Sheet {
        let mut sheet = Sheet::new(bpm);
        sheet.columns = columns;
        sheet
    }

    #[test]
    fn test_worked_example() {
        // bpm 120 → beat 500 ms; column 0 runs at full beat, column 1 at half
        let mut sheet = sheet_with_columns(
            120.0,
            vec![
                Column(0, vec![RawNote(3, "1".into())]),
                Column(1, vec![RawNote(5, "2".into())]),
            ],
        );
        derive_notes(&mut sheet).unwrap();
        assert_eq!(
            sheet.song_notes,
            vec![
                DerivedNote { key: "1Key3".into(), time: 100 },
                DerivedNote { key: "1Key5".into(), time: 600 },
            ]
        );
    }

    #[test]
    fn test_first_note_at_lead_in_regardless_of_bpm() {
        for bpm in [30.0, 120.0, 960.0] {
            let mut sheet =
                sheet_with_columns(bpm, vec![Column(0, vec![RawNote(0, "1".into())])]);
            derive_notes(&mut sheet).unwrap();
            assert_eq!(sheet.song_notes[0].time, 100, "bpm {}", bpm);
        }
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let columns = (0..8)
            .map(|i| Column(i % 3, vec![RawNote(i, "f".into()), RawNote(i + 1, "3".into())]))
            .collect();
        let mut sheet = sheet_with_columns(173.0, columns);
        derive_notes(&mut sheet).unwrap();
        let times: Vec<u64> = sheet.song_notes.iter().map(|n| n.time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]), "{times:?}");
    }

    #[test]
    fn test_layer_count_is_popcount() {
        // "f" has four bits set, "11" (hex) has two
        let mut sheet = sheet_with_columns(
            120.0,
            vec![Column(0, vec![RawNote(2, "f".into()), RawNote(7, "11".into())])],
        );
        derive_notes(&mut sheet).unwrap();
        assert_eq!(sheet.song_notes[0].key, "4Key2");
        assert_eq!(sheet.song_notes[1].key, "2Key7");
    }

    #[test]
    fn test_idempotent_on_derived_sheet() {
        let mut sheet = Sheet::new(120.0);
        sheet.song_notes = vec![DerivedNote { key: "1Key0".into(), time: 100 }];
        let before = sheet.clone();
        derive_notes(&mut sheet).unwrap();
        assert_eq!(sheet, before);
    }

    #[test]
    fn test_empty_columns_in_column_list_advance_time() {
        // a column with no notes still occupies its time slice
        let mut sheet = sheet_with_columns(
            120.0,
            vec![
                Column(0, vec![]),
                Column(0, vec![RawNote(1, "1".into())]),
            ],
        );
        derive_notes(&mut sheet).unwrap();
        assert_eq!(sheet.song_notes, vec![DerivedNote { key: "1Key1".into(), time: 600 }]);
    }

    #[test]
    fn test_bad_layer_mask_rejected() {
        let mut sheet =
            sheet_with_columns(120.0, vec![Column(0, vec![RawNote(0, "xyz".into())])]);
        assert!(matches!(
            derive_notes(&mut sheet),
            Err(SheetError::InvalidLayerMask { .. })
        ));
    }

    #[test]
    fn test_non_positive_bpm_rejected() {
        let mut sheet = sheet_with_columns(0.0, vec![Column(0, vec![RawNote(0, "1".into())])]);
        assert!(matches!(derive_notes(&mut sheet), Err(SheetError::InvalidBpm { .. })));
    }
}
