// ============================================================
// REPORT TYPE ENUM
// ============================================================
// The four Siteimprove misspellings report shapes

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of Siteimprove report contained in an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Confirmed misspellings with suggestion and affected page count
    Misspellings,

    /// Words flagged with a misspelling probability (High, Medium, Low)
    WordsToReview,

    /// One row per page with its misspelling counts and CMS links
    PagesWithMisspellings,

    /// Daily totals of misspellings and words to review
    MisspellingHistory,
}

impl ReportType {
    /// All report types in detection priority order (most specific first)
    pub const DETECTION_ORDER: [ReportType; 4] = [
        ReportType::WordsToReview,
        ReportType::PagesWithMisspellings,
        ReportType::MisspellingHistory,
        ReportType::Misspellings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Misspellings => "misspellings",
            ReportType::WordsToReview => "words_to_review",
            ReportType::PagesWithMisspellings => "pages_with_misspellings",
            ReportType::MisspellingHistory => "misspelling_history",
        }
    }

    /// Lowercase keywords that must all appear in a header row of this type
    pub fn header_signature(&self) -> &'static [&'static str] {
        match self {
            ReportType::Misspellings => &["word", "spelling suggestion"],
            ReportType::WordsToReview => &["word", "misspelling probability"],
            ReportType::PagesWithMisspellings => &["page report", "cms"],
            ReportType::MisspellingHistory => &["report date", "misspellings"],
        }
    }

    /// Check whether a row of header cells carries this type's signature
    pub fn matches_header<S: AsRef<str>>(&self, cells: &[S]) -> bool {
        let joined = cells
            .iter()
            .map(|c| c.as_ref().trim().replace('"', "").to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        self.header_signature()
            .iter()
            .all(|keyword| joined.contains(keyword))
    }

    /// Detect the report type from the first `scan_rows` rows of a table
    pub fn detect<S: AsRef<str>>(rows: &[Vec<S>], scan_rows: usize) -> Option<ReportType> {
        rows.iter().take(scan_rows).find_map(|row| {
            Self::DETECTION_ORDER
                .iter()
                .copied()
                .find(|report_type| report_type.matches_header(row))
        })
    }

    /// Whether records of this type carry a word (and a language)
    pub fn is_word_report(&self) -> bool {
        matches!(self, ReportType::Misspellings | ReportType::WordsToReview)
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "misspellings" => Ok(ReportType::Misspellings),
            "words_to_review" => Ok(ReportType::WordsToReview),
            "pages_with_misspellings" => Ok(ReportType::PagesWithMisspellings),
            "misspelling_history" => Ok(ReportType::MisspellingHistory),
            other => Err(format!("Unsupported report type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for report_type in ReportType::DETECTION_ORDER {
            assert_eq!(report_type.as_str().parse::<ReportType>().unwrap(), report_type);
        }
        assert!("auto".parse::<ReportType>().is_err());
    }

    #[test]
    fn test_detect_prefers_specific_signature() {
        let rows = vec![
            vec!["Created: 1/3/2025 8:51:10 AM"],
            vec!["Site: example.com"],
            vec![""],
            vec![
                "Word",
                "Spelling suggestion",
                "Language",
                "First detected",
                "Misspelling probability",
                "Pages",
            ],
        ];
        assert_eq!(ReportType::detect(&rows, 10), Some(ReportType::WordsToReview));
    }

    #[test]
    fn test_detect_pages_and_history() {
        let pages = vec![vec!["Title", "URL", "Page Report", "CMS", "Misspellings"]];
        assert_eq!(
            ReportType::detect(&pages, 10),
            Some(ReportType::PagesWithMisspellings)
        );

        let history = vec![vec!["Report date", "Misspellings", "Words to review", "Total words"]];
        assert_eq!(
            ReportType::detect(&history, 10),
            Some(ReportType::MisspellingHistory)
        );
    }

    #[test]
    fn test_detect_respects_scan_limit() {
        let mut rows: Vec<Vec<&str>> = (0..5).map(|_| vec!["filler", "row"]).collect();
        rows.push(vec!["Word", "Spelling suggestion", "Pages"]);

        assert_eq!(ReportType::detect(&rows, 5), None);
        assert_eq!(ReportType::detect(&rows, 6), Some(ReportType::Misspellings));
    }
}
