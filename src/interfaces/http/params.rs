// ============================================================
// QUERY PARAMETERS
// ============================================================
// Repeated keys (`websites[]=1&websites[]=2`) need the raw pair list

use chrono::{Datelike, NaiveDate};
use url::form_urlencoded;

use crate::application::use_cases::dashboard::DashboardQuery;
use crate::domain::dashboard::Period;
use crate::domain::error::{AppError, Result};
use crate::domain::report::ReportType;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(query_string: &str) -> Self {
        let pairs = form_urlencoded::parse(query_string.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// Every non-blank value of `key` or `key[]`
    pub fn all(&self, key: &str) -> Vec<&str> {
        let bracketed = format!("{}[]", key);
        self.pairs
            .iter()
            .filter(|(k, _)| k == key || *k == bracketed)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.all(key).into_iter().next()
    }

    pub fn int(&self, key: &str) -> Result<Option<i64>> {
        self.first(key)
            .map(|v| {
                v.parse::<i64>().map_err(|_| {
                    AppError::ValidationError(format!("{} must be an integer, got '{}'", key, v))
                })
            })
            .transpose()
    }

    /// Calendar dates with a four-digit year; chrono alone also accepts signed years
    pub fn date(&self, key: &str) -> Result<Option<NaiveDate>> {
        self.first(key)
            .map(|v| {
                NaiveDate::parse_from_str(v, "%Y-%m-%d")
                    .ok()
                    .filter(|d| (MIN_YEAR..=MAX_YEAR).contains(&d.year()))
                    .ok_or_else(|| {
                        AppError::ValidationError(format!(
                            "{} must be YYYY-MM-DD, got '{}'",
                            key, v
                        ))
                    })
            })
            .transpose()
    }

    /// `None` when the key is absent so callers can apply their default
    pub fn website_ids(&self) -> Result<Option<Vec<i64>>> {
        let values = self.all("websites");
        if values.is_empty() {
            return Ok(None);
        }
        values
            .into_iter()
            .map(|v| {
                v.parse::<i64>().map_err(|_| {
                    AppError::ValidationError(format!("Invalid website id '{}'", v))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    pub fn report_types(&self) -> Result<Option<Vec<ReportType>>> {
        let values = self.all("report_types");
        if values.is_empty() {
            return Ok(None);
        }
        values
            .into_iter()
            .map(|v| v.parse::<ReportType>().map_err(AppError::ValidationError))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    pub fn period(&self) -> Result<Period> {
        match self.first("period") {
            Some(v) => v.parse::<Period>().map_err(AppError::ValidationError),
            None => Ok(Period::default()),
        }
    }

    pub fn dashboard_query(&self) -> Result<DashboardQuery> {
        Ok(DashboardQuery {
            website_ids: self.website_ids()?,
            report_types: self.report_types()?,
            start_date: self.date("start_date")?,
            end_date: self.date("end_date")?,
        })
    }
}
