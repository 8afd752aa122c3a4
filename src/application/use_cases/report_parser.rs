// ============================================================
// REPORT PARSER USE CASE
// ============================================================
// Orchestrate table reading, header location and record extraction

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::error::{AppError, Result};
use crate::domain::report::{
    Misspelling, MisspellingHistoryEntry, PageWithMisspelling, ParsedReport, ParserConfig,
    RawTable, ReportMetadata, ReportRecord, ReportType, WordToReview,
};
use crate::infrastructure::report::values::{clean_value, parse_date, safe_int};
use crate::infrastructure::report::{FileKind, TableReader};

static CREATED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)created:\s*(.+)").unwrap());
static SITE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)site:\s*(.+)").unwrap());

// Canonical column names, lowercased
const COL_WORD: &str = "word";
const COL_SUGGESTION: &str = "spelling suggestion";
const COL_LANGUAGE: &str = "language";
const COL_FIRST_DETECTED: &str = "first detected";
const COL_PAGES: &str = "pages";
const COL_PROBABILITY: &str = "misspelling probability";
const COL_TITLE: &str = "title";
const COL_URL: &str = "url";
const COL_PAGE_REPORT: &str = "page report";
const COL_CMS: &str = "cms";
const COL_MISSPELLINGS: &str = "misspellings";
const COL_WORDS_TO_REVIEW: &str = "words to review";
const COL_PAGE_LEVEL: &str = "page level";
const COL_REPORT_DATE: &str = "report date";

/// Why a data row produced no record
#[derive(Debug, Clone, PartialEq)]
enum RowRejection {
    Blank,
    MissingField(&'static str),
    InvalidDate(String),
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::Blank => write!(f, "row is blank"),
            RowRejection::MissingField(name) => write!(f, "missing {}", name),
            RowRejection::InvalidDate(value) => write!(f, "unparseable date '{}'", value),
        }
    }
}

/// Header cell positions keyed by normalized column name
struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    fn from_header(header: &[String]) -> Self {
        let mut positions = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            let name = cell.trim().replace('"', "").to_lowercase();
            if !name.is_empty() {
                // First occurrence wins for duplicated headers
                positions.entry(name).or_insert(idx);
            }
        }
        Self { positions }
    }

    fn get<'a>(&self, row: &'a [String], column: &str) -> Option<&'a str> {
        self.positions
            .get(column)
            .and_then(|&idx| row.get(idx))
            .map(|s| s.as_str())
    }

    fn text(&self, row: &[String], column: &str) -> Option<String> {
        clean_value(self.get(row, column))
    }

    fn int(&self, row: &[String], column: &str) -> Option<i64> {
        safe_int(self.text(row, column).as_deref())
    }
}

/// Robust Siteimprove report parser
pub struct ReportParser {
    config: ParserConfig,
    reader: TableReader,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl ReportParser {
    pub fn new(config: ParserConfig) -> Self {
        let reader = TableReader::new(config.clone());
        Self { config, reader }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a report file from disk. `report_type` of None means auto-detect.
    pub fn parse_file(&self, path: &Path, report_type: Option<ReportType>) -> Result<ParsedReport> {
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::IoError(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        self.parse_bytes(&bytes, &file_name, report_type)
    }

    /// Parse an uploaded report held in memory
    pub fn parse_bytes(
        &self,
        bytes: &[u8],
        file_name: &str,
        report_type: Option<ReportType>,
    ) -> Result<ParsedReport> {
        let start = Instant::now();

        let table = self.read_table(bytes, file_name)?;

        let report_type = match report_type {
            Some(report_type) => report_type,
            None => self.detect(&table).ok_or_else(|| {
                AppError::ValidationError(
                    "Could not determine report type. Please select manually.".to_string(),
                )
            })?,
        };

        let parsed = self.parse_table(&table, report_type)?;

        tracing::info!(
            file = file_name,
            report_type = %parsed.report_type,
            records = parsed.records.len(),
            skipped = parsed.skipped_rows,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Parsed report"
        );

        Ok(parsed)
    }

    /// Read the raw table of an upload without interpreting it
    pub fn read_table(&self, bytes: &[u8], file_name: &str) -> Result<RawTable> {
        self.config.validate().map_err(|e| {
            AppError::ValidationError(format!("Invalid parser config: {}", e))
        })?;

        let kind = FileKind::from_file_name(file_name)?;
        self.reader.read(bytes, kind)
    }

    /// Detect the report type of an upload; Ok(None) means unknown
    pub fn detect_report_type(&self, bytes: &[u8], file_name: &str) -> Result<Option<ReportType>> {
        let table = self.read_table(bytes, file_name)?;
        Ok(self.detect(&table))
    }

    pub fn detect(&self, table: &RawTable) -> Option<ReportType> {
        ReportType::detect(&table.rows, self.config.header_scan_rows)
    }

    /// Interpret a raw table as a report of the given type
    pub fn parse_table(&self, table: &RawTable, report_type: ReportType) -> Result<ParsedReport> {
        let metadata = self.extract_metadata(table);
        let (header_row, header_found) = self.find_header_row(table, report_type);

        if header_row + 1 >= table.len() {
            return Err(AppError::ParseError(
                "No data rows found after header".to_string(),
            ));
        }

        let columns = ColumnIndex::from_header(&table.rows[header_row]);
        let data_rows = &table.rows[header_row + 1..];

        let mut records = Vec::with_capacity(data_rows.len());
        let mut skipped_rows = 0;

        for (offset, row) in data_rows.iter().enumerate() {
            match extract_record(report_type, &columns, row) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    skipped_rows += 1;
                    tracing::warn!(
                        row = header_row + 1 + offset,
                        reason = %reason,
                        "Skipping row"
                    );
                }
            }
        }

        Ok(ParsedReport {
            report_type,
            metadata,
            records,
            source_rows: data_rows.len(),
            skipped_rows,
            header_row,
            header_found,
            encoding: table.encoding.clone(),
            delimiter: table.delimiter,
        })
    }

    /// Read the Created:/Site: preamble lines
    pub fn extract_metadata(&self, table: &RawTable) -> ReportMetadata {
        let mut metadata = ReportMetadata::default();

        for idx in 0..table.len().min(self.config.metadata_scan_rows) {
            let cell = table.first_cell(idx);

            if metadata.created_raw.is_none() {
                if let Some(caps) = CREATED_LINE.captures(cell) {
                    let raw = caps[1].trim().to_string();
                    metadata.created_date = parse_date(Some(&raw));
                    metadata.created_raw = Some(raw);
                    continue;
                }
            }

            if metadata.site_name.is_none() {
                if let Some(caps) = SITE_LINE.captures(cell) {
                    metadata.site_name = Some(caps[1].trim().to_string());
                }
            }
        }

        metadata
    }

    /// Locate the header row by signature, falling back to a fixed offset
    pub fn find_header_row(&self, table: &RawTable, report_type: ReportType) -> (usize, bool) {
        let found = table
            .rows
            .iter()
            .take(self.config.header_scan_rows)
            .position(|row| report_type.matches_header(row));

        match found {
            Some(idx) => (idx, true),
            None => {
                let idx = self
                    .config
                    .fallback_header_row
                    .min(table.len().saturating_sub(1));
                tracing::warn!(
                    report_type = %report_type,
                    header_row = idx,
                    "No header signature found, using fallback row"
                );
                (idx, false)
            }
        }
    }
}

fn extract_record(
    report_type: ReportType,
    columns: &ColumnIndex,
    row: &[String],
) -> std::result::Result<ReportRecord, RowRejection> {
    if row.iter().all(|cell| cell.trim().is_empty()) {
        return Err(RowRejection::Blank);
    }

    match report_type {
        ReportType::Misspellings => {
            let word = columns
                .text(row, COL_WORD)
                .ok_or(RowRejection::MissingField("word"))?;
            Ok(ReportRecord::Misspelling(Misspelling {
                word,
                spelling_suggestion: columns.text(row, COL_SUGGESTION),
                language: columns.text(row, COL_LANGUAGE),
                first_detected: parse_date(columns.text(row, COL_FIRST_DETECTED).as_deref()),
                pages_count: columns.int(row, COL_PAGES),
            }))
        }
        ReportType::WordsToReview => {
            let word = columns
                .text(row, COL_WORD)
                .ok_or(RowRejection::MissingField("word"))?;
            Ok(ReportRecord::WordToReview(WordToReview {
                word,
                spelling_suggestion: columns.text(row, COL_SUGGESTION),
                language: columns.text(row, COL_LANGUAGE),
                first_detected: parse_date(columns.text(row, COL_FIRST_DETECTED).as_deref()),
                misspelling_probability: columns.text(row, COL_PROBABILITY),
                pages_count: columns.int(row, COL_PAGES),
            }))
        }
        ReportType::PagesWithMisspellings => {
            let title = columns.text(row, COL_TITLE);
            let url = columns.text(row, COL_URL);
            if title.is_none() && url.is_none() {
                return Err(RowRejection::MissingField("title or URL"));
            }
            Ok(ReportRecord::Page(PageWithMisspelling {
                title,
                url,
                page_report_link: columns.text(row, COL_PAGE_REPORT),
                cms_link: columns.text(row, COL_CMS),
                misspellings_count: columns.int(row, COL_MISSPELLINGS),
                words_to_review_count: columns.int(row, COL_WORDS_TO_REVIEW),
                page_level: columns.int(row, COL_PAGE_LEVEL),
            }))
        }
        ReportType::MisspellingHistory => {
            let raw = columns
                .text(row, COL_REPORT_DATE)
                .ok_or(RowRejection::MissingField("report date"))?;
            let report_date =
                parse_date(Some(&raw)).ok_or_else(|| RowRejection::InvalidDate(raw.clone()))?;
            Ok(ReportRecord::History(MisspellingHistoryEntry {
                report_date,
                misspellings_count: columns.int(row, COL_MISSPELLINGS),
                words_to_review_count: columns.int(row, COL_WORDS_TO_REVIEW),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};
    use std::io::Write;

    const MISSPELLINGS_TSV: &str = "Created: 1/3/2025 8:51:10 AM\n\
Site: example.com\n\
\n\
Word\tSpelling suggestion\tLanguage\tFirst detected\tPages\n\
teh\tthe\tEnglish\t1/2/2025 9:00:00 AM\t12\n\
recieve\treceive\tEnglish\t1/1/2025 10:15:00 AM\t1,204\n\
\tmissing\tEnglish\t1/1/2025\t2\n\
nan\tnone\tEnglish\t\t\n\
occured\toccurred\tEnglish\tnot a date\tabc\n";

    const WORDS_TO_REVIEW_CSV: &str = "\"Created: 2/10/2025 1:00:00 PM\"\n\
\"Site: docs.example.com\"\n\
\"Word\",\"Spelling suggestion\",\"Language\",\"First detected\",\"Misspelling probability\",\"Pages\"\n\
\"SaaS\",\"Sass\",\"English\",\"2/1/2025 8:00:00 AM\",\"Low\",\"40\"\n\
\"colour\",\"color\",\"English (US)\",\"2/2/2025 8:00:00 AM\",\"High\",\"3\"\n";

    const PAGES_CSV: &str = "Created: 2/10/2025 1:00:00 PM\n\
Site: example.com\n\
Title,URL,Page Report,CMS,Misspellings,Words to review,Page level\n\
Home,https://example.com/,https://report/1,https://cms/1,4,2,1\n\
,https://example.com/about,https://report/2,https://cms/2,1,0,2\n\
,,https://report/3,,1,1,3\n";

    const HISTORY_CSV: &str = "Report date;Misspellings;Words to review;Total words\n\
2025-01-01;10;4;50000\n\
2025-01-02;9;4;50100\n\
someday;8;4;50200\n";

    fn parser() -> ReportParser {
        ReportParser::default()
    }

    #[test]
    fn test_parse_misspellings_report() {
        let parsed = parser()
            .parse_bytes(MISSPELLINGS_TSV.as_bytes(), "misspellings.csv", None)
            .unwrap();

        assert_eq!(parsed.report_type, ReportType::Misspellings);
        assert!(parsed.header_found);
        assert_eq!(parsed.header_row, 2);
        assert_eq!(parsed.delimiter, Some('\t'));
        assert_eq!(parsed.source_rows, 5);
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.skipped_rows, 2);

        let ReportRecord::Misspelling(first) = &parsed.records[0] else {
            panic!("expected misspelling record");
        };
        assert_eq!(first.word, "teh");
        assert_eq!(first.spelling_suggestion.as_deref(), Some("the"));
        assert_eq!(first.pages_count, Some(12));
        assert_eq!(
            first.first_detected.map(|d| d.date()),
            NaiveDate::from_ymd_opt(2025, 1, 2)
        );

        let ReportRecord::Misspelling(second) = &parsed.records[1] else {
            panic!("expected misspelling record");
        };
        assert_eq!(second.pages_count, Some(1204));

        // bad date and count are coerced to None, the row survives
        let ReportRecord::Misspelling(third) = &parsed.records[2] else {
            panic!("expected misspelling record");
        };
        assert_eq!(third.word, "occured");
        assert_eq!(third.first_detected, None);
        assert_eq!(third.pages_count, None);
    }

    #[test]
    fn test_metadata_extraction() {
        let parsed = parser()
            .parse_bytes(MISSPELLINGS_TSV.as_bytes(), "misspellings.csv", None)
            .unwrap();

        assert_eq!(parsed.metadata.site_name.as_deref(), Some("example.com"));
        assert_eq!(
            parsed.metadata.created_raw.as_deref(),
            Some("1/3/2025 8:51:10 AM")
        );
        let created = parsed.metadata.created_date.unwrap();
        assert_eq!((created.year(), created.month(), created.day()), (2025, 1, 3));
    }

    #[test]
    fn test_words_to_review_quoted_csv() {
        let parsed = parser()
            .parse_bytes(WORDS_TO_REVIEW_CSV.as_bytes(), "review.csv", None)
            .unwrap();

        assert_eq!(parsed.report_type, ReportType::WordsToReview);
        assert_eq!(parsed.delimiter, Some(','));
        assert_eq!(parsed.metadata.site_name.as_deref(), Some("docs.example.com"));
        assert_eq!(parsed.records.len(), 2);

        let ReportRecord::WordToReview(word) = &parsed.records[1] else {
            panic!("expected word to review");
        };
        assert_eq!(word.word, "colour");
        assert_eq!(word.language.as_deref(), Some("English (US)"));
        assert_eq!(word.misspelling_probability.as_deref(), Some("High"));
        assert_eq!(word.pages_count, Some(3));
    }

    #[test]
    fn test_pages_report_requires_title_or_url() {
        let parsed = parser()
            .parse_bytes(PAGES_CSV.as_bytes(), "pages.csv", None)
            .unwrap();

        assert_eq!(parsed.report_type, ReportType::PagesWithMisspellings);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped_rows, 1);

        let ReportRecord::Page(about) = &parsed.records[1] else {
            panic!("expected page record");
        };
        assert_eq!(about.title, None);
        assert_eq!(about.url.as_deref(), Some("https://example.com/about"));
        assert_eq!(about.page_level, Some(2));
    }

    #[test]
    fn test_history_drops_rows_without_date() {
        let parsed = parser()
            .parse_bytes(HISTORY_CSV.as_bytes(), "history.csv", None)
            .unwrap();

        assert_eq!(parsed.report_type, ReportType::MisspellingHistory);
        assert_eq!(parsed.delimiter, Some(';'));
        assert_eq!(parsed.header_row, 0);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped_rows, 1);
        assert!(parsed.metadata.is_empty());

        let ReportRecord::History(entry) = &parsed.records[0] else {
            panic!("expected history entry");
        };
        assert_eq!(entry.misspellings_count, Some(10));
        assert_eq!(entry.words_to_review_count, Some(4));
    }

    #[test]
    fn test_explicit_type_overrides_detection() {
        // Parsed as Misspellings even though the header also fits WordsToReview
        let parsed = parser()
            .parse_bytes(
                WORDS_TO_REVIEW_CSV.as_bytes(),
                "review.csv",
                Some(ReportType::Misspellings),
            )
            .unwrap();
        assert_eq!(parsed.report_type, ReportType::Misspellings);
        assert!(parsed
            .records
            .iter()
            .all(|r| matches!(r, ReportRecord::Misspelling(_))));
    }

    #[test]
    fn test_fallback_header_row() {
        let content = "Created: 1/3/2025 8:51:10 AM\n\
Site: example.com\n\
Word,Suggestion,Pages\n\
teh,the,3\n";

        let parsed = parser()
            .parse_bytes(content.as_bytes(), "odd.csv", Some(ReportType::Misspellings))
            .unwrap();

        assert!(!parsed.header_found);
        assert_eq!(parsed.header_row, 2);
        let ReportRecord::Misspelling(record) = &parsed.records[0] else {
            panic!("expected misspelling record");
        };
        assert_eq!(record.word, "teh");
        assert_eq!(record.spelling_suggestion, None);
        assert_eq!(record.pages_count, Some(3));
    }

    #[test]
    fn test_no_data_after_header_fails() {
        let content = "Word,Spelling suggestion,Pages\n";
        let err = parser()
            .parse_bytes(content.as_bytes(), "empty.csv", None)
            .unwrap_err();
        assert!(matches!(err, AppError::ParseError(msg) if msg.contains("No data rows")));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let content = "Name,Age\nAlice,30\n";
        assert_eq!(
            parser()
                .detect_report_type(content.as_bytes(), "people.csv")
                .unwrap(),
            None
        );
        let err = parser()
            .parse_bytes(content.as_bytes(), "people.csv", None)
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_short_rows_and_reordered_columns() {
        let content = "Pages,Word,Language,Spelling suggestion\n5,teh\n";
        let parsed = parser()
            .parse_bytes(content.as_bytes(), "x.csv", None)
            .unwrap();

        let ReportRecord::Misspelling(record) = &parsed.records[0] else {
            panic!("expected misspelling record");
        };
        assert_eq!(record.word, "teh");
        assert_eq!(record.pages_count, Some(5));
        assert_eq!(record.language, None);
    }

    #[test]
    fn test_output_never_exceeds_input() {
        for (content, name) in [
            (MISSPELLINGS_TSV, "a.csv"),
            (WORDS_TO_REVIEW_CSV, "b.csv"),
            (PAGES_CSV, "c.csv"),
            (HISTORY_CSV, "d.csv"),
        ] {
            let parsed = parser().parse_bytes(content.as_bytes(), name, None).unwrap();
            assert_eq!(parsed.records.len() + parsed.skipped_rows, parsed.source_rows);
            assert!(parsed.records.len() <= content.lines().count());
        }
    }

    #[test]
    fn test_parse_utf16_file_from_disk() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in MISSPELLINGS_TSV.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(&bytes).unwrap();

        let parsed = parser().parse_file(file.path(), None).unwrap();
        assert_eq!(parsed.encoding, "UTF-16LE");
        assert_eq!(parsed.records.len(), 3);
    }

    #[test]
    fn test_parse_windows_1252_file() {
        let mut bytes = b"Word,Spelling suggestion,Language,Pages\n".to_vec();
        bytes.extend_from_slice(b"caf\xe9e,caf\xe9,French,2\n");

        let parsed = parser().parse_bytes(&bytes, "fr.csv", None).unwrap();
        assert_eq!(parsed.encoding, "windows-1252");
        let ReportRecord::Misspelling(record) = &parsed.records[0] else {
            panic!("expected misspelling record");
        };
        assert_eq!(record.word, "caf\u{e9}e");
    }

    #[test]
    fn test_parse_xlsx_report() {
        let bytes = include_bytes!("../../infrastructure/report/fixtures/misspellings.xlsx");
        let parsed = parser().parse_bytes(bytes, "r.xlsx", None).unwrap();

        assert_eq!(parsed.report_type, ReportType::Misspellings);
        assert_eq!(parsed.delimiter, None);
        assert_eq!(parsed.header_row, 2);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped_rows, 0);
        assert_eq!(parsed.metadata.site_name.as_deref(), Some("example.com"));

        let ReportRecord::Misspelling(first) = &parsed.records[0] else {
            panic!("expected misspelling record");
        };
        assert_eq!(first.pages_count, Some(12));
        assert_eq!(
            first.first_detected,
            NaiveDate::from_ymd_opt(2025, 1, 2).and_then(|d| d.and_hms_opt(9, 0, 0))
        );

        let ReportRecord::Misspelling(second) = &parsed.records[1] else {
            panic!("expected misspelling record");
        };
        assert_eq!(second.pages_count, Some(3));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parser()
            .parse_file(Path::new("/nonexistent/report.csv"), None)
            .unwrap_err();
        assert!(matches!(err, AppError::IoError(_)));
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        let err = parser()
            .parse_bytes(b"Word,Pages\nteh,1", "report.pdf", None)
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
