// ============================================================
// DASHBOARD TYPES
// ============================================================
// Filters and chart-shaped results served to the dashboard

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::report::ReportType;

/// Aggregation period for trend charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    /// Bucket label for a timestamp; weeks are keyed by their Monday
    pub fn key(&self, at: NaiveDateTime) -> String {
        let date = at.date();
        match self {
            Period::Daily => date.format("%Y-%m-%d").to_string(),
            Period::Weekly => {
                let monday = date
                    .checked_sub_signed(Duration::days(
                        date.weekday().num_days_from_monday() as i64,
                    ))
                    .unwrap_or(NaiveDate::MIN);
                monday.format("%Y-%m-%d").to_string()
            }
            Period::Monthly => date.format("%Y-%m").to_string(),
            Period::Yearly => date.format("%Y").to_string(),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            "yearly" => Ok(Period::Yearly),
            other => Err(format!("Unsupported period: {}", other)),
        }
    }
}

/// Which stored data the dashboard looks at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardFilter {
    pub website_ids: Vec<i64>,
    pub report_types: Vec<ReportType>,
    pub start: NaiveDate,
    /// Inclusive: the whole end day is covered
    pub end: NaiveDate,
}

impl DashboardFilter {
    pub fn includes(&self, report_type: ReportType) -> bool {
        self.report_types.contains(&report_type)
    }

    pub fn start_at(&self) -> NaiveDateTime {
        self.start.and_time(chrono::NaiveTime::MIN)
    }

    /// First instant after the range, saturating at the last representable day
    pub fn end_before(&self) -> NaiveDateTime {
        self.end
            .succ_opt()
            .map(|next| next.and_time(chrono::NaiveTime::MIN))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

/// Chart colors: one for the whole dataset or one per bar/slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Colors {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    pub background_color: Colors,
}

/// Labels plus datasets, the shape chart widgets consume
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_misspellings: i64,
    pub total_words_to_review: i64,
    pub total_pages_affected: i64,
    pub total_reports: i64,
}

/// One line of the detail table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedRow {
    #[serde(rename = "type")]
    pub kind: String,
    pub word: String,
    pub suggestion: Option<String>,
    pub language: Option<String>,
    pub first_detected: Option<NaiveDateTime>,
    pub pages: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<String>,
    pub website: String,
    pub report_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedPage {
    pub data: Vec<DetailedRow>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub summary_stats: SummaryStats,
    pub trend_data: ChartData,
    pub top_words: ChartData,
    pub language_distribution: ChartData,
    pub detailed_data: DetailedPage,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_period_keys() {
        // 2025-01-08 is a Wednesday
        let wednesday = at(2025, 1, 8);
        assert_eq!(Period::Daily.key(wednesday), "2025-01-08");
        assert_eq!(Period::Weekly.key(wednesday), "2025-01-06");
        assert_eq!(Period::Monthly.key(wednesday), "2025-01");
        assert_eq!(Period::Yearly.key(wednesday), "2025");
    }

    #[test]
    fn test_weekly_key_crosses_year() {
        // Wednesday 2025-01-01 belongs to the week starting Monday 2024-12-30
        assert_eq!(Period::Weekly.key(at(2025, 1, 1)), "2024-12-30");
    }

    #[test]
    fn test_filter_end_is_inclusive() {
        let filter = DashboardFilter {
            website_ids: vec![1],
            report_types: vec![ReportType::Misspellings],
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        };
        assert!(at(2025, 1, 31) < filter.end_before());
        assert!(at(2025, 1, 1) >= filter.start_at());
        assert!(filter.includes(ReportType::Misspellings));
        assert!(!filter.includes(ReportType::WordsToReview));
    }

    #[test]
    fn test_calendar_edges_do_not_overflow() {
        let filter = DashboardFilter {
            website_ids: vec![1],
            report_types: vec![ReportType::Misspellings],
            start: NaiveDate::MAX,
            end: NaiveDate::MAX,
        };
        assert_eq!(filter.end_before(), NaiveDateTime::MAX);

        let first = NaiveDate::MIN.and_time(chrono::NaiveTime::MIN);
        assert_eq!(
            Period::Weekly.key(first),
            NaiveDate::MIN.format("%Y-%m-%d").to_string()
        );
    }

    #[test]
    fn test_dataset_serializes_for_charts() {
        let dataset = Dataset {
            label: Some("Misspellings".to_string()),
            data: vec![1, 2],
            border_color: Some("rgb(255, 99, 132)".to_string()),
            background_color: Colors::One("rgba(255, 99, 132, 0.2)".to_string()),
        };
        let json = serde_json::to_value(&dataset).unwrap();
        assert_eq!(json["borderColor"], "rgb(255, 99, 132)");
        assert_eq!(json["backgroundColor"], "rgba(255, 99, 132, 0.2)");
    }
}
