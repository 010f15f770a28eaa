// ============================================================
// WORKBOOK DECODER
// ============================================================
// Reads every sheet of an .xls/.xlsx upload into a cell grid with
// cells classified text / numeric / blank, the only distinction the
// header heuristic needs. No formulas, styles or merged-cell
// resolution: each cell flattens to what it displays as.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::domain::error::{AppError, Result};
use crate::domain::grid::{Cell, CellGrid};

#[derive(Debug)]
pub struct DecodedSheet {
    pub name: String,
    pub grid: CellGrid,
}

/// Decode all sheets of a workbook, in workbook order.
pub fn decode_workbook(bytes: &[u8]) -> Result<Vec<DecodedSheet>> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| AppError::ParseError(format!("Failed to open workbook: {}", e)))?;

    Ok(workbook
        .worksheets()
        .into_iter()
        .map(|(name, range)| DecodedSheet {
            grid: grid_from_range(&range),
            name,
        })
        .collect())
}

fn grid_from_range(range: &Range<Data>) -> CellGrid {
    CellGrid::new(
        range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect(),
    )
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Blank,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        // Excel stores dates as day serials; they count as numeric
        // content for header detection, like any other number.
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(_) => Cell::Blank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_classification_from_workbook_data() {
        assert_eq!(cell_from_data(&Data::Empty), Cell::Blank);
        assert_eq!(
            cell_from_data(&Data::String("Nota".into())),
            Cell::Text("Nota".into())
        );
        assert_eq!(cell_from_data(&Data::Float(8.5)), Cell::Number(8.5));
        assert_eq!(cell_from_data(&Data::Int(120)), Cell::Number(120.0));
        assert_eq!(
            cell_from_data(&Data::Bool(true)),
            Cell::Text("TRUE".into())
        );
    }

    #[test]
    fn test_garbage_bytes_are_a_parse_error() {
        let err = decode_workbook(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }
}
