// ============================================================
// TABLE READER
// ============================================================
// Read uploaded reports into a raw grid by trial and error

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use csv::{ReaderBuilder, Trim};

use super::decoder::decode_candidates;
use crate::domain::error::{AppError, Result};
use crate::domain::report::{ParserConfig, RawTable};

/// How an uploaded file is read, decided by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// CSV/TSV text of unknown encoding and delimiter
    Delimited,

    /// Excel or OpenDocument workbook
    Spreadsheet,
}

impl FileKind {
    pub const SUPPORTED_EXTENSIONS: [&'static str; 7] =
        ["csv", "tsv", "txt", "xlsx", "xlsm", "xls", "ods"];

    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "tsv" | "txt" => Ok(FileKind::Delimited),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(FileKind::Spreadsheet),
            _ => Err(AppError::ValidationError(format!(
                "Invalid file format '{}'. Please upload CSV or Excel files.",
                file_name
            ))),
        }
    }
}

/// Reads raw tables, trying encodings and delimiters until one fits
pub struct TableReader {
    config: ParserConfig,
}

impl Default for TableReader {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl TableReader {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn read(&self, bytes: &[u8], kind: FileKind) -> Result<RawTable> {
        match kind {
            FileKind::Delimited => self.read_delimited(bytes),
            FileKind::Spreadsheet => self.read_spreadsheet(bytes),
        }
    }

    /// Try every decoded candidate with every delimiter; the first usable
    /// table (more than one column, at least one row) wins.
    pub fn read_delimited(&self, bytes: &[u8]) -> Result<RawTable> {
        let candidates = decode_candidates(bytes, &self.config.encodings);
        if candidates.is_empty() {
            return Err(AppError::ParseError(
                "Could not decode file with any configured encoding".to_string(),
            ));
        }

        for candidate in &candidates {
            for &delimiter in &self.config.delimiters {
                let rows = parse_delimited(&candidate.text, delimiter);
                let table = RawTable::new(rows, candidate.encoding.name(), Some(delimiter));

                if table.is_usable() {
                    tracing::info!(
                        encoding = candidate.encoding.name(),
                        delimiter = ?delimiter,
                        rows = table.len(),
                        columns = table.column_count(),
                        "Read delimited report"
                    );
                    return Ok(table);
                }

                tracing::debug!(
                    encoding = candidate.encoding.name(),
                    delimiter = ?delimiter,
                    columns = table.column_count(),
                    "Delimiter produced no usable table"
                );
            }
        }

        Err(AppError::ParseError(
            "Could not read file with any encoding/delimiter combination".to_string(),
        ))
    }

    /// Read the first worksheet of an in-memory workbook
    pub fn read_spreadsheet(&self, bytes: &[u8]) -> Result<RawTable> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| AppError::ParseError(format!("Failed to open workbook: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::ParseError("No worksheet found".to_string()))?
            .map_err(|e| AppError::ParseError(format!("Failed to read worksheet: {}", e)))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
            .filter(|row| !is_blank(row))
            .collect();

        if rows.is_empty() {
            return Err(AppError::ParseError("Worksheet is empty".to_string()));
        }

        tracing::info!(rows = rows.len(), "Read spreadsheet report");
        Ok(RawTable::new(rows, "spreadsheet", None))
    }
}

/// Parse delimited text without headers, skipping blank and unreadable records
fn parse_delimited(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .trim(Trim::All)
        .flexible(true) // Preamble lines have a single field
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
                if !is_blank(&row) {
                    rows.push(row);
                }
            }
            Err(e) => {
                tracing::debug!(record = index, error = %e, "Skipping unreadable record");
            }
        }
    }
    rows
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITEIMPROVE_TSV: &str = "Created: 1/3/2025 8:51:10 AM\n\
Site: example.com\n\
\n\
Word\tSpelling suggestion\tLanguage\tFirst detected\tPages\n\
teh\tthe\tEnglish\t1/2/2025 9:00:00 AM\t12\n\
recieve\treceive\tEnglish\t1/1/2025 10:15:00 AM\t3\n";

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(FileKind::from_file_name("report.CSV").unwrap(), FileKind::Delimited);
        assert_eq!(FileKind::from_file_name("report.xlsx").unwrap(), FileKind::Spreadsheet);
        assert!(FileKind::from_file_name("report.pdf").is_err());
        assert!(FileKind::from_file_name("report").is_err());
    }

    #[test]
    fn test_tab_delimited_with_preamble() {
        let table = TableReader::default()
            .read_delimited(SITEIMPROVE_TSV.as_bytes())
            .unwrap();

        assert_eq!(table.delimiter, Some('\t'));
        assert_eq!(table.encoding, "UTF-8");
        // blank line dropped
        assert_eq!(table.len(), 5);
        assert_eq!(table.column_count(), 5);
        assert_eq!(table.first_cell(0), "Created: 1/3/2025 8:51:10 AM");
        assert_eq!(table.rows[2][0], "Word");
    }

    #[test]
    fn test_comma_delimited_with_quotes() {
        let content = "Word,Spelling suggestion,Pages\n\"colour, UK\",color,4\n";
        let table = TableReader::default().read_delimited(content.as_bytes()).unwrap();

        assert_eq!(table.delimiter, Some(','));
        assert_eq!(table.rows[1], vec!["colour, UK", "color", "4"]);
    }

    #[test]
    fn test_semicolon_delimited() {
        let content = "Word;Spelling suggestion;Pages\nteh;the;1\n";
        let table = TableReader::default().read_delimited(content.as_bytes()).unwrap();
        assert_eq!(table.delimiter, Some(';'));
    }

    #[test]
    fn test_single_column_fails_whole_file() {
        let content = "just\none\ncolumn\n";
        let err = TableReader::default()
            .read_delimited(content.as_bytes())
            .unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(TableReader::default().read_delimited(b"").is_err());
    }

    const MISSPELLINGS_XLSX: &[u8] = include_bytes!("fixtures/misspellings.xlsx");
    const EMPTY_XLSX: &[u8] = include_bytes!("fixtures/empty.xlsx");

    #[test]
    fn test_workbook_cells_become_text() {
        let table = TableReader::default()
            .read(MISSPELLINGS_XLSX, FileKind::Spreadsheet)
            .unwrap();

        assert_eq!(table.delimiter, None);
        // row 3 of the sheet is blank
        assert_eq!(table.len(), 5);
        assert_eq!(table.first_cell(0), "Created: 1/3/2025 8:51:10 AM");
        assert_eq!(table.rows[2][0], "Word");
        assert_eq!(
            table.rows[3],
            vec!["teh", "the", "English", "2025-01-02 09:00:00", "12"]
        );
        assert_eq!(table.rows[4][3], "2025-01-01 12:00:00");
        assert_eq!(table.rows[4][4], "3.5");
    }

    #[test]
    fn test_empty_workbook_fails() {
        let err = TableReader::default().read_spreadsheet(EMPTY_XLSX).unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String("  teh ".to_string())), "teh");
        assert_eq!(cell_to_string(&Data::Float(12.0)), "12");
        assert_eq!(cell_to_string(&Data::Float(-3.0)), "-3");
        assert_eq!(cell_to_string(&Data::Float(2.25)), "2.25");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Bool(true)), "true");
    }

    #[test]
    fn test_garbage_workbook_fails() {
        let err = TableReader::default()
            .read_spreadsheet(b"definitely not a zip archive")
            .unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }
}
