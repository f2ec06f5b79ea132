use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use thiserror::Error;

use crate::taxonomy::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    DelimitedText,
    Spreadsheet,
}

impl SourceFormat {
    /// `.csv`, `.tsv` and `.txt` are read as text; everything else as a workbook.
    pub fn from_file_name(file_name: &str) -> Self {
        let lower = file_name.to_ascii_lowercase();
        if [".csv", ".tsv", ".txt"]
            .iter()
            .any(|extension| lower.ends_with(extension))
        {
            Self::DelimitedText
        } else {
            Self::Spreadsheet
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to parse delimited text: {0}")]
    Delimited(#[from] csv::Error),
    #[error("failed to open workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("workbook has no sheets")]
    NoSheets,
}

pub type Grid = Vec<Vec<CellValue>>;

pub fn decode_grid(file_name: &str, bytes: &[u8]) -> Result<Grid, DecodeError> {
    match SourceFormat::from_file_name(file_name) {
        SourceFormat::DelimitedText => decode_delimited(bytes),
        SourceFormat::Spreadsheet => decode_workbook(bytes),
    }
}

pub fn decode_delimited(bytes: &[u8]) -> Result<Grid, DecodeError> {
    let content = bytes_to_utf8(bytes);
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let delimiter = sniff_delimiter(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(
            record
                .iter()
                .map(|field| CellValue::Text(field.to_string()))
                .collect(),
        );
    }

    Ok(grid)
}

/// Excel-exported CSVs are often Windows-1252 rather than UTF-8.
fn bytes_to_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Picks the candidate producing the most consistent field count (>1) over
/// the first lines.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for &delimiter in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delimiter)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|record| record.ok())
                    .map(|record| record.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|count| **count == target).count();
        let score = consistent * target;
        if score > best_score {
            best_score = score;
            best = delimiter;
        }
    }

    best
}

pub fn decode_workbook(bytes: &[u8]) -> Result<Grid, DecodeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DecodeError::NoSheets)??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect())
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(value) => CellValue::Text(value.clone()),
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(value) => CellValue::Text(value.to_string()),
        Data::DateTimeIso(value) | Data::DurationIso(value) => CellValue::Text(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_format_follows_extension() {
        assert_eq!(
            SourceFormat::from_file_name("Categorias.CSV"),
            SourceFormat::DelimitedText
        );
        assert_eq!(
            SourceFormat::from_file_name("articulos.xlsx"),
            SourceFormat::Spreadsheet
        );
        assert_eq!(SourceFormat::from_file_name("legacy.xls"), SourceFormat::Spreadsheet);
    }

    #[test]
    fn delimited_text_sniffs_semicolons_and_keeps_leading_zeros() {
        let grid = decode_delimited("codigo;categoria\n007;Mujer\n008;Hombre\n".as_bytes())
            .expect("semicolon csv should decode");

        assert_eq!(grid.len(), 3);
        assert_eq!(grid[1][0], CellValue::Text("007".to_string()));
        assert_eq!(grid[2][1], CellValue::Text("Hombre".to_string()));
    }

    #[test]
    fn delimited_text_strips_bom_and_handles_quoted_commas() {
        let grid = decode_delimited("\u{feff}codigo,categoria\n1,\"Ropa, interior\"\n".as_bytes())
            .expect("csv should decode");

        assert_eq!(grid[0][0], CellValue::Text("codigo".to_string()));
        assert_eq!(grid[1][1], CellValue::Text("Ropa, interior".to_string()));
    }

    #[test]
    fn windows_1252_bytes_fall_back_to_latin_decoding() {
        let bytes = b"codigo,categoria\n1,Ni\xf1os\n";
        let grid = decode_delimited(bytes).expect("latin csv should decode");

        assert_eq!(grid[1][1], CellValue::Text("Niños".to_string()));
    }

    #[test]
    fn garbage_workbook_bytes_are_a_decode_error() {
        let result = decode_grid("categorias.xlsx", b"definitely not a zip archive");
        assert!(result.is_err());
    }
}
