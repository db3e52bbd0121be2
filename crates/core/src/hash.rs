//! BLAKE3 fingerprints for cheap grid equality checks

use crate::grid::Grid;

/// Terminator after each row (ASCII record separator)
const ROW_TERMINATOR: &[u8] = b"\x1e";

/// A BLAKE3 digest of a grid's content (32 bytes)
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex characters, enough for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Fingerprint a grid
///
/// Each cell is hashed as its byte length (u64, little endian) followed by
/// its bytes, and every row ends with a record separator. The encoding is
/// unambiguous, so any changed cell or reordered row yields a different
/// digest.
pub fn fingerprint(grid: &Grid) -> Fingerprint {
    let mut hasher = blake3::Hasher::new();
    for row in grid.rows() {
        for cell in row {
            hasher.update(&(cell.len() as u64).to_le_bytes());
            hasher.update(cell.as_bytes());
        }
        hasher.update(ROW_TERMINATOR);
    }
    Fingerprint(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Row;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn grid(rows: &[[&str; 3]]) -> Grid {
        Grid::from_rows(rows.iter().map(|r| r.map(str::to_string)).collect())
    }

    fn random_grid(rng: &mut ChaCha8Rng, rows: usize) -> Grid {
        let rows = (0..rows)
            .map(|_| -> Row {
                std::array::from_fn(|_| {
                    let len = rng.gen_range(0..6);
                    (0..len).map(|_| rng.gen_range('a'..='e')).collect()
                })
            })
            .collect();
        Grid::from_rows(rows)
    }

    #[test]
    fn test_fingerprint_consistency() {
        let g = grid(&[["a", "b", "c"], ["", "", ""]]);
        assert_eq!(fingerprint(&g), fingerprint(&g));
        assert_eq!(fingerprint(&g), fingerprint(&g.clone()));
    }

    #[test]
    fn test_single_cell_change_changes_fingerprint() {
        let g = grid(&[["a", "b", "c"], ["d", "e", "f"]]);
        for row in 0..2 {
            for col in 0..3 {
                let edited = g.with_cell(row, col, "changed");
                assert_ne!(fingerprint(&g), fingerprint(&edited), "cell ({row}, {col})");
            }
        }
    }

    #[test]
    fn test_row_order_matters() {
        let g1 = grid(&[["a", "b", "c"], ["d", "e", "f"]]);
        let g2 = grid(&[["d", "e", "f"], ["a", "b", "c"]]);
        assert_ne!(fingerprint(&g1), fingerprint(&g2));
    }

    #[test]
    fn test_cell_boundaries_matter() {
        let g1 = grid(&[["ab", "", ""]]);
        let g2 = grid(&[["a", "b", ""]]);
        assert_ne!(fingerprint(&g1), fingerprint(&g2));

        // Shifting text across a row boundary must not collide either
        let g3 = grid(&[["a", "b", "cd"], ["", "", ""]]);
        let g4 = grid(&[["a", "b", "c"], ["d", "", ""]]);
        assert_ne!(fingerprint(&g3), fingerprint(&g4));
    }

    #[test]
    fn test_separator_text_inside_cells() {
        let g1 = grid(&[["a||b", "c", ""]]);
        let g2 = grid(&[["a", "b||c", ""]]);
        assert_ne!(fingerprint(&g1), fingerprint(&g2));
        assert_eq!(crate::diff::diff_rows(&g1, &g2).len(), 1);

        let g3 = grid(&[["x\u{1e}", "", ""]]);
        let g4 = grid(&[["x", "\u{1e}", ""]]);
        assert_ne!(fingerprint(&g3), fingerprint(&g4));
    }

    #[test]
    fn test_trailing_empty_rows_matter() {
        let g1 = grid(&[["a", "b", "c"]]);
        let g2 = grid(&[["a", "b", "c"], ["", "", ""]]);
        assert_ne!(fingerprint(&g1), fingerprint(&g2));
    }

    #[test]
    fn test_randomized_single_edits() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let g = random_grid(&mut rng, 20);
            let row = rng.gen_range(0..g.len());
            let col = rng.gen_range(0..3);
            let mut value = g.rows()[row][col].clone();
            value.push('z');
            let edited = g.with_cell(row, col, value);
            assert_ne!(fingerprint(&g), fingerprint(&edited));
        }
    }

    #[test]
    fn test_hex_and_short_form() {
        let fp = fingerprint(&grid(&[["x", "y", "z"]]));
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(hex.starts_with(&fp.short()));
        assert_eq!(fp.short().len(), 12);
        assert_eq!(fp.to_string(), hex);
    }
}
