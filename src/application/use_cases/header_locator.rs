// ============================================================
// HEADER LOCATOR
// ============================================================
// Real-world exports open with title and metadata rows before the
// actual column headers. A header row has several short text labels
// and sits directly above a row dominated by numeric data; leading
// prose rows do not. The thresholds below were tuned against the
// sheets callers actually upload, so they are kept exactly as-is.

use crate::domain::grid::CellGrid;

/// Find the zero-based index of the header row, scanning adjacent
/// row pairs top to bottom. `None` means the sheet is not tabular;
/// callers skip such a sheet rather than failing the upload.
pub fn locate_header(grid: &CellGrid) -> Option<usize> {
    let max_cols = grid.max_cols();
    let rows = grid.row_count();
    if rows < 2 {
        return None;
    }

    (0..rows - 1).find(|&i| is_header_pair(grid, i, max_cols))
}

fn is_header_pair(grid: &CellGrid, row: usize, max_cols: usize) -> bool {
    let (text, num) = classify_row(grid, row, max_cols);
    let (next_text, next_num) = classify_row(grid, row + 1, max_cols);

    text > 1 && text >= num && next_num >= next_text
}

/// Count (text, numeric) cells in a row, padded to `max_cols`.
/// Missing trailing cells count as blank, never as either kind.
fn classify_row(grid: &CellGrid, row: usize, max_cols: usize) -> (usize, usize) {
    let mut text = 0;
    let mut num = 0;
    for col in 0..max_cols {
        let cell = grid.cell(row, col);
        if cell.is_text() {
            text += 1;
        } else if cell.is_numeric() {
            num += 1;
        }
    }
    (text, num)
}
