//! Row-level diffing of two grid snapshots

use crate::grid::{Grid, Row};

/// A reported change to one row
///
/// Only columns A and B decide whether a row is reported; column C rides
/// along as status context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDiff {
    /// 1-based row number, matching the sheet's own numbering
    pub row: usize,
    /// Row before the change
    pub old: Row,
    /// Row after the change
    pub new: Row,
}

/// Compare two grids and return the rows whose column A or B changed
///
/// Both grids must have the same row count; the watcher guarantees this by
/// normalizing every fetch to the same expected size.
pub fn diff_rows(old: &Grid, new: &Grid) -> Vec<RowDiff> {
    debug_assert_eq!(old.len(), new.len(), "diffed grids must have equal row counts");

    old.rows()
        .iter()
        .zip(new.rows())
        .enumerate()
        .filter(|(_, (before, after))| before[0] != after[0] || before[1] != after[1])
        .map(|(i, (before, after))| RowDiff {
            row: i + 1,
            old: before.clone(),
            new: after.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Grid {
        Grid::from_rows(vec![
            ["Alice".into(), "10".into(), "open".into()],
            ["Bob".into(), "20".into(), "open".into()],
            ["".into(), "".into(), "".into()],
        ])
    }

    #[test]
    fn test_identical_grids_have_no_diff() {
        assert!(diff_rows(&base(), &base()).is_empty());
    }

    #[test]
    fn test_column_a_and_b_changes_are_reported() {
        let new = base().with_cell(0, 0, "Alicia").with_cell(2, 1, "30");
        let diffs = diff_rows(&base(), &new);

        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].row, 1);
        assert_eq!(diffs[0].old[0], "Alice");
        assert_eq!(diffs[0].new[0], "Alicia");
        assert_eq!(diffs[1].row, 3);
        assert_eq!(diffs[1].old[1], "");
        assert_eq!(diffs[1].new[1], "30");
    }

    #[test]
    fn test_column_c_only_change_is_ignored() {
        let new = base().with_cell(0, 2, "closed").with_cell(1, 2, "closed");
        assert!(diff_rows(&base(), &new).is_empty());
    }

    #[test]
    fn test_diff_carries_full_rows_including_status() {
        let new = base().with_cell(1, 1, "25").with_cell(1, 2, "closed");
        let diffs = diff_rows(&base(), &new);

        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].row, 2);
        assert_eq!(diffs[0].old, ["Bob".to_string(), "20".to_string(), "open".to_string()]);
        assert_eq!(diffs[0].new, ["Bob".to_string(), "25".to_string(), "closed".to_string()]);
    }

    #[test]
    fn test_diffs_are_in_ascending_row_order() {
        let new = base()
            .with_cell(2, 0, "z")
            .with_cell(0, 1, "y")
            .with_cell(1, 0, "x");
        let rows: Vec<_> = diff_rows(&base(), &new).iter().map(|d| d.row).collect();
        assert_eq!(rows, vec![1, 2, 3]);
    }
}
