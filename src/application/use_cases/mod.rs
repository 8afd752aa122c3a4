pub mod dashboard;
pub mod export;
pub mod report_ingestion;
pub mod report_parser;
