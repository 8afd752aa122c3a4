use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::report::ReportType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Website {
    pub id: i64,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewWebsite {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 500))]
    pub url: Option<String>,
}

/// An uploaded report as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: i64,
    pub website_id: i64,
    pub report_type: ReportType,
    pub filename: String,
    pub upload_date: NaiveDateTime,
    pub processed_at: Option<NaiveDateTime>,
    /// Date from the report's Created: line
    pub created_date: Option<NaiveDateTime>,
}

/// Outcome of storing a parsed report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOutcome {
    pub report_id: i64,
    pub stored: usize,
}
