// ============================================================
// CELL GRID
// ============================================================
// Decoded sheet content, one classified cell per position.
// Immutable once built by a decoder.

/// A single spreadsheet cell, already classified by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl Cell {
    /// Text cell with non-whitespace content. Header detection only
    /// counts these, never numbers rendered as strings.
    pub fn is_text(&self) -> bool {
        matches!(self, Cell::Text(s) if !s.trim().is_empty())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Number(_))
    }

    /// Cell content flattened to display text, trimmed.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Blank => String::new(),
        }
    }
}

/// A rectangular-ish grid of cells. Rows may have different lengths;
/// positions past the end of a row read as blank.
#[derive(Debug, Clone, Default)]
pub struct CellGrid {
    rows: Vec<Vec<Cell>>,
}

impl CellGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// Cell at (row, col); missing positions are blank.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Blank)
    }

    /// Widest row in the grid.
    pub fn max_cols(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }
}
