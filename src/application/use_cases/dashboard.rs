// ============================================================
// DASHBOARD USE CASE
// ============================================================
// Resolve filters and shape stored data into chart payloads

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::dashboard::{
    ChartData, Colors, DashboardData, DashboardFilter, Dataset, DetailedPage, Period,
    SummaryStats,
};
use crate::domain::error::{AppError, Result};
use crate::domain::report::ReportType;
use crate::infrastructure::db::ReportRepository;

pub const DEFAULT_RANGE_DAYS: i64 = 30;
pub const DEFAULT_TOP_WORDS: i64 = 10;
pub const MAX_PER_PAGE: i64 = 1000;

const MISSPELLINGS_BORDER: &str = "rgb(255, 99, 132)";
const MISSPELLINGS_FILL: &str = "rgba(255, 99, 132, 0.2)";
const REVIEW_BORDER: &str = "rgb(54, 162, 235)";
const REVIEW_FILL: &str = "rgba(54, 162, 235, 0.2)";

const BAR_COLORS: [&str; 10] = [
    "rgba(255, 99, 132, 0.8)",
    "rgba(54, 162, 235, 0.8)",
    "rgba(255, 205, 86, 0.8)",
    "rgba(75, 192, 192, 0.8)",
    "rgba(153, 102, 255, 0.8)",
    "rgba(255, 159, 64, 0.8)",
    "rgba(199, 199, 199, 0.8)",
    "rgba(83, 102, 255, 0.8)",
    "rgba(255, 99, 255, 0.8)",
    "rgba(99, 255, 132, 0.8)",
];

const PIE_COLORS: [&str; 6] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40",
];

/// Filter as requested by a client; missing parts get defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub website_ids: Option<Vec<i64>>,
    pub report_types: Option<Vec<ReportType>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub min_date: Option<NaiveDateTime>,
    pub max_date: Option<NaiveDateTime>,
}

pub struct DashboardUseCase {
    repository: Arc<ReportRepository>,
}

impl DashboardUseCase {
    pub fn new(repository: Arc<ReportRepository>) -> Self {
        Self { repository }
    }

    /// Fill in defaults: last 30 days, every website, every stored type for those websites
    pub async fn resolve_filter(&self, query: &DashboardQuery) -> Result<DashboardFilter> {
        self.resolve_filter_at(query, Local::now().date_naive()).await
    }

    async fn resolve_filter_at(
        &self,
        query: &DashboardQuery,
        today: NaiveDate,
    ) -> Result<DashboardFilter> {
        let end = query.end_date.unwrap_or(today);
        let start = match query.start_date {
            Some(start) => start,
            None => end
                .checked_sub_signed(Duration::days(DEFAULT_RANGE_DAYS))
                .ok_or_else(|| {
                    AppError::ValidationError(format!("end_date {} is out of range", end))
                })?,
        };
        if start > end {
            return Err(AppError::ValidationError(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }

        let website_ids = match &query.website_ids {
            Some(ids) if !ids.is_empty() => ids.clone(),
            _ => self
                .repository
                .list_websites()
                .await?
                .into_iter()
                .map(|w| w.id)
                .collect(),
        };

        let report_types = match &query.report_types {
            Some(types) if !types.is_empty() => types.clone(),
            _ => self.repository.report_types(Some(website_ids.as_slice())).await?,
        };

        Ok(DashboardFilter {
            website_ids,
            report_types,
            start,
            end,
        })
    }

    pub async fn report_types(&self, website_ids: Option<&[i64]>) -> Result<Vec<ReportType>> {
        self.repository.report_types(website_ids).await
    }

    pub async fn date_range(
        &self,
        website_ids: Option<&[i64]>,
        report_types: Option<&[ReportType]>,
    ) -> Result<DateRange> {
        let (min_date, max_date) = self.repository.date_range(website_ids, report_types).await?;
        Ok(DateRange { min_date, max_date })
    }

    pub async fn summary_stats(&self, filter: &DashboardFilter) -> Result<SummaryStats> {
        let mut stats = SummaryStats {
            total_reports: self.repository.count_reports(filter).await?,
            ..SummaryStats::default()
        };

        if filter.includes(ReportType::Misspellings) {
            stats.total_misspellings = self
                .repository
                .count_records(ReportType::Misspellings, filter)
                .await?;
        }
        if filter.includes(ReportType::WordsToReview) {
            stats.total_words_to_review = self
                .repository
                .count_records(ReportType::WordsToReview, filter)
                .await?;
        }
        if filter.includes(ReportType::PagesWithMisspellings) {
            stats.total_pages_affected = self
                .repository
                .count_records(ReportType::PagesWithMisspellings, filter)
                .await?;
        }

        Ok(stats)
    }

    /// History counts when history is selected, otherwise per-report word counts
    pub async fn trend_data(&self, filter: &DashboardFilter, period: Period) -> Result<ChartData> {
        let points: Vec<(NaiveDateTime, i64, i64)> =
            if filter.includes(ReportType::MisspellingHistory) {
                self.repository
                    .history_points(filter)
                    .await?
                    .into_iter()
                    .map(|(at, misspellings, review)| {
                        (at, misspellings.unwrap_or(0), review.unwrap_or(0))
                    })
                    .collect()
            } else {
                self.repository.report_word_counts(filter).await?
            };

        Ok(trend_chart(&points, period))
    }

    pub async fn top_misspelled_words(
        &self,
        filter: &DashboardFilter,
        limit: i64,
    ) -> Result<ChartData> {
        let words = self.repository.top_words(filter, limit).await?;
        let colors = BAR_COLORS.iter().map(|c| c.to_string()).collect();

        Ok(ChartData {
            labels: words.iter().map(|(word, _)| word.clone()).collect(),
            datasets: vec![Dataset {
                label: Some("Pages Affected".to_string()),
                data: words.iter().map(|(_, pages)| *pages).collect(),
                border_color: None,
                background_color: Colors::Many(colors),
            }],
        })
    }

    pub async fn language_distribution(&self, filter: &DashboardFilter) -> Result<ChartData> {
        let languages = self.repository.language_counts(filter).await?;
        let colors = PIE_COLORS.iter().map(|c| c.to_string()).collect();

        Ok(ChartData {
            labels: languages.iter().map(|(language, _)| language.clone()).collect(),
            datasets: vec![Dataset {
                label: None,
                data: languages.iter().map(|(_, count)| *count).collect(),
                border_color: None,
                background_color: Colors::Many(colors),
            }],
        })
    }

    /// One page of misspellings and words to review; page starts at 1
    pub async fn detailed_data(
        &self,
        filter: &DashboardFilter,
        search: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> Result<DetailedPage> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let offset = (page - 1).saturating_mul(per_page);

        let (data, total) = self
            .repository
            .detailed_rows(filter, search, per_page, offset)
            .await?;

        Ok(DetailedPage {
            data,
            total,
            page,
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        })
    }

    /// Everything the dashboard renders in one payload
    pub async fn dashboard_data(
        &self,
        filter: &DashboardFilter,
        period: Period,
        top_words: i64,
        per_page: i64,
    ) -> Result<DashboardData> {
        Ok(DashboardData {
            summary_stats: self.summary_stats(filter).await?,
            trend_data: self.trend_data(filter, period).await?,
            top_words: self.top_misspelled_words(filter, top_words).await?,
            language_distribution: self.language_distribution(filter).await?,
            detailed_data: self.detailed_data(filter, None, 1, per_page).await?,
        })
    }
}

/// Sum points into period buckets, labels in chronological order
fn trend_chart(points: &[(NaiveDateTime, i64, i64)], period: Period) -> ChartData {
    let mut buckets: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for (at, misspellings, review) in points {
        let bucket = buckets.entry(period.key(*at)).or_default();
        bucket.0 += misspellings;
        bucket.1 += review;
    }

    ChartData {
        labels: buckets.keys().cloned().collect(),
        datasets: vec![
            Dataset {
                label: Some("Misspellings".to_string()),
                data: buckets.values().map(|(m, _)| *m).collect(),
                border_color: Some(MISSPELLINGS_BORDER.to_string()),
                background_color: Colors::One(MISSPELLINGS_FILL.to_string()),
            },
            Dataset {
                label: Some("Words to Review".to_string()),
                data: buckets.values().map(|(_, r)| *r).collect(),
                border_color: Some(REVIEW_BORDER.to_string()),
                background_color: Colors::One(REVIEW_FILL.to_string()),
            },
        ],
    }
}
