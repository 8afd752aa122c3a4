// ============================================================
// REPORT RECORDS
// ============================================================
// Typed rows extracted from each report shape

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{ReportMetadata, ReportType};

/// A confirmed misspelling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Misspelling {
    pub word: String,
    pub spelling_suggestion: Option<String>,
    pub language: Option<String>,
    pub first_detected: Option<NaiveDateTime>,
    pub pages_count: Option<i64>,
}

/// A word flagged for review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordToReview {
    pub word: String,
    pub spelling_suggestion: Option<String>,
    pub language: Option<String>,
    pub first_detected: Option<NaiveDateTime>,
    /// High, Medium or Low as written in the report
    pub misspelling_probability: Option<String>,
    pub pages_count: Option<i64>,
}

/// A page carrying misspellings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageWithMisspelling {
    pub title: Option<String>,
    pub url: Option<String>,
    pub page_report_link: Option<String>,
    pub cms_link: Option<String>,
    pub misspellings_count: Option<i64>,
    pub words_to_review_count: Option<i64>,
    pub page_level: Option<i64>,
}

/// One day of the misspelling history report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MisspellingHistoryEntry {
    pub report_date: NaiveDateTime,
    pub misspellings_count: Option<i64>,
    pub words_to_review_count: Option<i64>,
}

/// A single extracted record of any report type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportRecord {
    Misspelling(Misspelling),
    WordToReview(WordToReview),
    Page(PageWithMisspelling),
    History(MisspellingHistoryEntry),
}

impl ReportRecord {
    pub fn report_type(&self) -> ReportType {
        match self {
            ReportRecord::Misspelling(_) => ReportType::Misspellings,
            ReportRecord::WordToReview(_) => ReportType::WordsToReview,
            ReportRecord::Page(_) => ReportType::PagesWithMisspellings,
            ReportRecord::History(_) => ReportType::MisspellingHistory,
        }
    }
}

/// Result of parsing one uploaded report file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedReport {
    pub report_type: ReportType,

    pub metadata: ReportMetadata,

    /// Records that survived extraction
    pub records: Vec<ReportRecord>,

    /// Number of table rows below the header row
    pub source_rows: usize,

    /// Rows dropped during extraction (blank or without identifying field)
    pub skipped_rows: usize,

    /// 0-based index of the row used as header
    pub header_row: usize,

    /// Whether the header was found by signature rather than fallback offset
    pub header_found: bool,

    /// Encoding the file was decoded with ("xlsx" style label for spreadsheets)
    pub encoding: String,

    /// Delimiter used for delimited text, none for spreadsheets
    pub delimiter: Option<char>,
}

impl ParsedReport {
    pub fn row_count(&self) -> usize {
        self.records.len()
    }
}
