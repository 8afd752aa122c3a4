// ============================================================
// REPORT DOMAIN LAYER
// ============================================================
// Core types and value objects for Siteimprove report parsing

mod metadata;
mod parser_config;
mod raw_table;
mod records;
mod report_type;

pub use metadata::ReportMetadata;
pub use parser_config::ParserConfig;
pub use raw_table::RawTable;
pub use records::{
    Misspelling, MisspellingHistoryEntry, PageWithMisspelling, ParsedReport, ReportRecord,
    WordToReview,
};
pub use report_type::ReportType;
