use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Preamble lines Siteimprove writes above the header row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Parsed value of the `Created:` line
    pub created_date: Option<NaiveDateTime>,

    /// Raw `Created:` text, kept when the date cannot be parsed
    pub created_raw: Option<String>,

    /// Value of the `Site:` line
    pub site_name: Option<String>,
}

impl ReportMetadata {
    pub fn is_empty(&self) -> bool {
        self.created_raw.is_none() && self.site_name.is_none()
    }
}
