pub mod dashboard;
pub mod error;
pub mod report;
pub mod website;
