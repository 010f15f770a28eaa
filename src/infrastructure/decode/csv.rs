// ============================================================
// DELIMITED TEXT DECODER
// ============================================================
// Exports arrive as ';'-separated text more often than true CSV,
// with no guarantee about encoding. Decode bytes with a Windows-1252
// fallback, sniff the delimiter from a sample, and flatten records
// into header -> value maps. The first record is the header here;
// header detection only applies to workbook sheets.

use csv::ReaderBuilder;

use crate::domain::error::{AppError, Result};
use crate::domain::record::RowRecord;

pub struct DelimitedDecoder {
    delimiter: u8,
}

impl Default for DelimitedDecoder {
    fn default() -> Self {
        Self { delimiter: b';' }
    }
}

impl DelimitedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Decode raw bytes, sniffing the delimiter from the first few lines.
    pub fn decode_auto(bytes: &[u8]) -> Result<Vec<RowRecord>> {
        let content = decode_text(bytes);
        let delimiter = Self::detect_delimiter(&content);
        Self::default().with_delimiter(delimiter).decode_content(&content)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<RowRecord>> {
        self.decode_content(&decode_text(bytes))
    }

    fn decode_content(&self, content: &str) -> Result<Vec<RowRecord>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true) // rows may be shorter or longer than the header
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            let row: RowRecord = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    (header.clone(), record.get(i).unwrap_or("").to_string())
                })
                .collect();
            rows.push(row);
        }

        Ok(rows)
    }

    /// Detect delimiter from content (semicolon, comma, tab, pipe) by
    /// scoring each candidate's per-line frequency and consistency.
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b';', b',', b'\t', b'|'];

        let mut best_delimiter = b';';
        let mut best_score = 0.0f32;

        let sample_lines: Vec<_> = content.lines().take(10).collect();

        for &delimiter in &candidates {
            if sample_lines.is_empty() {
                continue;
            }

            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// UTF-8 with BOM sniffing, falling back to Windows-1252 when the
/// bytes are not valid UTF-8.
fn decode_text(bytes: &[u8]) -> String {
    let (content, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if !had_errors {
        return content.into_owned();
    }
    encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_semicolon_separated_content() {
        let rows =
            DelimitedDecoder::new().decode(b"Curso;Nota\n2021-22;8,5\n2022-23;7,9").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Curso"], "2021-22");
        assert_eq!(rows[1]["Nota"], "7,9");
    }

    #[test]
    fn test_short_rows_pad_missing_columns() {
        let rows = DelimitedDecoder::new().decode(b"a;b;c\n1;2").unwrap();
        assert_eq!(rows[0]["c"], "");
    }

    #[test]
    fn test_headers_are_trimmed_but_values_are_not() {
        let rows = DelimitedDecoder::new().decode(b" Nota ;Curso\n 8,5 ;2021-22").unwrap();
        assert_eq!(rows[0]["Nota"], " 8,5 ");
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(DelimitedDecoder::detect_delimiter("a;b;c\nd;e;f"), b';');
        assert_eq!(DelimitedDecoder::detect_delimiter("a,b,c\nd,e,f"), b',');
        assert_eq!(DelimitedDecoder::detect_delimiter("a\tb\nc\td"), b'\t');
    }

    #[test]
    fn test_windows_1252_fallback() {
        // "Año académico" encoded as Windows-1252: ñ = 0xF1, é = 0xE9.
        let bytes = b"A\xf1o;Nota\n2021-22;bi\xe9n";
        let rows = DelimitedDecoder::new().decode(bytes).unwrap();
        assert_eq!(rows[0]["Año"], "2021-22");
        assert_eq!(rows[0]["Nota"], "bién");
    }

    #[test]
    fn test_utf8_bom_is_stripped_from_first_header() {
        let bytes = b"\xef\xbb\xbfCurso;Nota\n2021-22;5";
        let rows = DelimitedDecoder::new().decode(bytes).unwrap();
        assert_eq!(rows[0]["Curso"], "2021-22");
    }
}
