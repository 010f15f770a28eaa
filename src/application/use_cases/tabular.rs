// ============================================================
// TABULAR EXTRACTOR
// ============================================================
// Turns a grid plus a known header row into row records. Column
// names come from the header cells; data rows shorter than the
// header pad with empty strings, and rows with no content at all
// are dropped without comment.

use super::header_locator::locate_header;
use crate::domain::grid::CellGrid;
use crate::domain::record::RowRecord;

/// Whole-sheet pipeline: locate the header, then collect every data
/// row. `None` means the sheet has no detectable header and should be
/// excluded from the selectable set, not reported as an error.
pub fn sheet_records(grid: &CellGrid) -> Option<Vec<RowRecord>> {
    let header_row = locate_header(grid)?;
    Some(records(grid, header_row).collect())
}

/// Trimmed header-cell text, position-indexed over the header row.
pub fn header_names(grid: &CellGrid, header_row: usize) -> Vec<String> {
    grid.row(header_row)
        .unwrap_or(&[])
        .iter()
        .map(|cell| cell.display())
        .collect()
}

/// Lazy sequence of records for every row strictly below the header.
/// Duplicate header names are not deduplicated; the last column with
/// a given name wins, as headers are the caller's keys to keep unique.
pub fn records(grid: &CellGrid, header_row: usize) -> impl Iterator<Item = RowRecord> + '_ {
    let headers = header_names(grid, header_row);

    (header_row + 1..grid.row_count()).filter_map(move |row| {
        let mut record = RowRecord::new();
        let mut any_value = false;

        for (col, name) in headers.iter().enumerate() {
            let value = grid.cell(row, col).display();
            if !value.is_empty() {
                any_value = true;
            }
            record.insert(name.clone(), value);
        }

        any_value.then_some(record)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Cell;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn sample_grid() -> CellGrid {
        CellGrid::new(vec![
            vec![text("Informe de notas")],
            vec![text("generado el 12/09/2022")],
            vec![text("Año académico"), text("Nota")],
            vec![text("2021-22"), Cell::Number(8.5)],
        ])
    }

    #[test]
    fn test_extracts_records_below_the_header() {
        let grid = sample_grid();
        let rows: Vec<_> = records(&grid, 2).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Año académico"], "2021-22");
        assert_eq!(rows[0]["Nota"], "8.5");
    }

    #[test]
    fn test_short_data_rows_pad_with_empty_strings() {
        let grid = CellGrid::new(vec![
            vec![text("Id"), text("Curso"), text("Nota")],
            vec![text("7"), text("2020-21")],
        ]);
        let rows: Vec<_> = records(&grid, 0).collect();
        assert_eq!(rows[0]["Nota"], "");
    }

    #[test]
    fn test_fully_blank_rows_are_dropped_silently() {
        let grid = CellGrid::new(vec![
            vec![text("Id"), text("Nota")],
            vec![Cell::Blank, text("   ")],
            vec![text("1"), Cell::Number(5.0)],
        ]);
        let rows: Vec<_> = records(&grid, 0).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Id"], "1");
    }

    #[test]
    fn test_header_names_are_trimmed() {
        let grid = CellGrid::new(vec![vec![text("  Nota  "), Cell::Number(3.0)]]);
        assert_eq!(header_names(&grid, 0), vec!["Nota", "3"]);
    }

    #[test]
    fn test_duplicate_headers_last_column_wins() {
        let grid = CellGrid::new(vec![
            vec![text("Valor"), text("Valor")],
            vec![text("a"), text("b")],
        ]);
        let rows: Vec<_> = records(&grid, 0).collect();
        assert_eq!(rows[0]["Valor"], "b");
    }

    #[test]
    fn test_sheet_records_skips_non_tabular_sheets() {
        let prose_only = CellGrid::new(vec![
            vec![text("Portada")],
            vec![text("sin datos")],
        ]);
        assert!(sheet_records(&prose_only).is_none());

        let rows = sheet_records(&sample_grid()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Nota"], "8.5");
    }

    #[test]
    fn test_sequence_is_restartable() {
        let grid = sample_grid();
        assert_eq!(records(&grid, 2).count(), 1);
        assert_eq!(records(&grid, 2).count(), 1);
    }
}
