// ============================================================
// SPREADSHEET DECODERS
// ============================================================
// Flatten uploaded files into domain types: delimited text into row
// records directly (first record is the header), workbooks into one
// classified cell grid per sheet for header detection downstream.

pub mod csv;
pub mod xlsx;

pub use self::csv::DelimitedDecoder;
pub use xlsx::{decode_workbook, DecodedSheet};
