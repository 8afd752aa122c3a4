pub mod sqlite;

pub use sqlite::ReportRepository;
