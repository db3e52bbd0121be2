//! Range descriptors for the watched block of cells

use crate::error::CoreError;
use crate::Result;

/// Row count assumed when the range does not carry a usable row span
pub const DEFAULT_ROWS: usize = 100;

/// Largest row span accepted; a Google Sheet holds at most 10 million cells
pub const MAX_ROWS: u64 = 10_000_000;

/// The watched range: a sheet plus an A1-notation cell block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    sheet: String,
    cells: String,
    /// Inclusive (start, end) row numbers, when both ends name a row
    span: Option<(u64, u64)>,
}

impl RangeSpec {
    /// Parse a range such as `A1:C100` on the given sheet
    ///
    /// A range without a row span (`A:C`, `B2`) or with an inverted span is
    /// accepted; its expected row count falls back to [`DEFAULT_ROWS`]. A span
    /// longer than [`MAX_ROWS`] is rejected.
    pub fn parse(sheet: &str, cells: &str) -> Result<Self> {
        let sheet = sheet.trim();
        let cells = cells.trim();
        if sheet.is_empty() {
            return Err(CoreError::EmptySheetName);
        }
        if cells.is_empty() {
            return Err(CoreError::EmptyRange);
        }

        // Tolerate a sheet-qualified range; the explicit sheet wins.
        let cells = cells.rsplit('!').next().unwrap_or(cells);

        let span = row_span(cells);
        if let Some((start, end)) = span {
            let rows = end - start + 1;
            if rows > MAX_ROWS {
                return Err(CoreError::RangeTooLarge { rows, max: MAX_ROWS });
            }
        }

        Ok(Self {
            sheet: sheet.to_string(),
            cells: cells.to_string(),
            span,
        })
    }

    /// Sheet (tab) name
    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Cell block in A1 notation, without the sheet
    pub fn cells(&self) -> &str {
        &self.cells
    }

    /// Number of rows every normalized grid must have
    pub fn expected_rows(&self) -> usize {
        match self.span {
            Some((start, end)) => (end - start + 1) as usize,
            None => DEFAULT_ROWS,
        }
    }

    /// Sheet-qualified range for the source API (`Sheet1!A1:C100`)
    ///
    /// Sheet names with anything beyond ASCII alphanumerics and `_` are
    /// quoted, with embedded quotes doubled.
    pub fn qualified(&self) -> String {
        let plain = self
            .sheet
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if plain {
            format!("{}!{}", self.sheet, self.cells)
        } else {
            format!("'{}'!{}", self.sheet.replace('\'', "''"), self.cells)
        }
    }
}

impl std::fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// Extract `(start, end)` from `<col><row>:<col><row>`
fn row_span(cells: &str) -> Option<(u64, u64)> {
    let (from, to) = cells.split_once(':')?;
    let start = cell_row(from)?;
    let end = cell_row(to)?;
    (start >= 1 && end >= start).then_some((start, end))
}

/// Row number of a cell reference such as `C100` (letters then digits)
fn cell_row(cell: &str) -> Option<u64> {
    let cell = cell.trim().trim_start_matches('$');
    let digits_at = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(digits_at);
    let letters = letters.trim_end_matches('$');
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
