pub mod use_cases;

pub use use_cases::dashboard::DashboardUseCase;
pub use use_cases::report_ingestion::ReportIngestionUseCase;
pub use use_cases::report_parser::ReportParser;
