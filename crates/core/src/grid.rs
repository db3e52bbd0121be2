//! Fixed-width grid snapshots of the watched range

use std::sync::Arc;

/// Number of columns tracked per row (A, B, C)
pub const COLUMNS: usize = 3;

/// One row of the watched range: columns A, B and C
pub type Row = [String; COLUMNS];

/// An immutable snapshot of the watched range
///
/// Every row has exactly [`COLUMNS`] cells. Clones share the same rows, so
/// holding the baseline and a pending pair at once costs nothing extra.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    rows: Arc<[Row]>,
}

impl Grid {
    /// Normalize raw source rows into a grid of at least `expected_rows` rows
    ///
    /// Short rows are padded with empty cells, cells past column C are
    /// dropped, and missing rows are filled with empty rows. Extra rows are
    /// kept.
    pub fn normalize(raw: Vec<Vec<String>>, expected_rows: usize) -> Self {
        let total = raw.len().max(expected_rows);
        let mut rows: Vec<Row> = Vec::with_capacity(total);

        for cells in raw {
            let mut cells = cells.into_iter();
            rows.push(std::array::from_fn(|_| cells.next().unwrap_or_default()));
        }
        rows.resize_with(total, Row::default);

        Self { rows: rows.into() }
    }

    /// Build a grid from already-shaped rows
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows: rows.into() }
    }

    /// All rows in source order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the grid has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Return this grid padded with empty rows up to `rows`
    ///
    /// Shares the existing rows when no padding is needed.
    pub fn padded_to(&self, rows: usize) -> Self {
        if self.rows.len() >= rows {
            return self.clone();
        }
        let mut padded = self.rows.to_vec();
        padded.resize_with(rows, Row::default);
        Self { rows: padded.into() }
    }

    /// Return a copy of this grid with one cell replaced
    ///
    /// Grows the grid with empty rows when `row` is past the end.
    pub fn with_cell(&self, row: usize, column: usize, value: impl Into<String>) -> Self {
        let mut rows = self.rows.to_vec();
        if row >= rows.len() {
            rows.resize_with(row + 1, Row::default);
        }
        if let Some(cell) = rows[row].get_mut(column) {
            *cell = value.into();
        }
        Self { rows: rows.into() }
    }
}
