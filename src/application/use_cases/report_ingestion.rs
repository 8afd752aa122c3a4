// ============================================================
// REPORT INGESTION USE CASE
// ============================================================
// Upload flow: validate, parse off the async executor, store

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::report_parser::ReportParser;
use crate::domain::error::{AppError, Result};
use crate::domain::report::ReportType;
use crate::domain::website::Website;
use crate::infrastructure::db::ReportRepository;
use crate::infrastructure::report::FileKind;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UploadRequest {
    #[validate(range(min = 1))]
    pub website_id: i64,

    /// None asks the parser to detect the type
    pub report_type: Option<ReportType>,

    #[validate(length(min = 1, max = 255))]
    pub filename: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestionResult {
    pub report_id: i64,
    pub report_type: ReportType,
    pub website: Website,
    pub records: usize,
    pub skipped: usize,
    pub header_found: bool,
    pub encoding: String,
    pub created_date: Option<NaiveDateTime>,
}

impl IngestionResult {
    pub fn message(&self) -> String {
        format!(
            "Successfully processed {} records from {} report",
            self.records, self.report_type
        )
    }
}

/// `auto`, blank or missing means detect
pub fn parse_report_type_param(value: Option<&str>) -> Result<Option<ReportType>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("auto") => Ok(None),
        Some(v) => v
            .parse::<ReportType>()
            .map(Some)
            .map_err(AppError::ValidationError),
    }
}

pub struct ReportIngestionUseCase {
    parser: Arc<ReportParser>,
    repository: Arc<ReportRepository>,
}

impl ReportIngestionUseCase {
    pub fn new(parser: Arc<ReportParser>, repository: Arc<ReportRepository>) -> Self {
        Self { parser, repository }
    }

    pub async fn ingest(&self, request: UploadRequest, bytes: Vec<u8>) -> Result<IngestionResult> {
        request.validate()?;
        FileKind::from_file_name(&request.filename)?;
        if bytes.is_empty() {
            return Err(AppError::ValidationError("No file uploaded".to_string()));
        }

        let website = self
            .repository
            .get_website(request.website_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Website {} not found", request.website_id))
            })?;

        let parser = Arc::clone(&self.parser);
        let filename = request.filename.clone();
        let report_type = request.report_type;
        let parsed = tokio::task::spawn_blocking(move || {
            parser.parse_bytes(&bytes, &filename, report_type)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Parser task failed: {}", e)))??;

        let outcome = self
            .repository
            .store_report(website.id, &request.filename, &parsed)
            .await?;

        tracing::info!(
            report_id = outcome.report_id,
            website = %website.name,
            file = %request.filename,
            report_type = %parsed.report_type,
            records = outcome.stored,
            skipped = parsed.skipped_rows,
            "Report ingested"
        );

        Ok(IngestionResult {
            report_id: outcome.report_id,
            report_type: parsed.report_type,
            website,
            records: outcome.stored,
            skipped: parsed.skipped_rows,
            header_found: parsed.header_found,
            encoding: parsed.encoding,
            created_date: parsed.metadata.created_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::DashboardFilter;
    use crate::domain::website::NewWebsite;
    use chrono::NaiveDate;

    const MISSPELLINGS_TSV: &str = "Created: 1/3/2025 8:51:10 AM\n\
Site: example.com\n\
Word\tSpelling suggestion\tLanguage\tFirst detected\tPages\n\
teh\tthe\tEnglish\t1/2/2025 9:00:00 AM\t12\n\
\tmissing word\tEnglish\t\t1\n\
recieve\treceive\tEnglish\t1/1/2025 10:15:00 AM\t3\n";

    async fn setup() -> (ReportIngestionUseCase, Arc<ReportRepository>, i64) {
        let repo = Arc::new(ReportRepository::in_memory().await.unwrap());
        let site = repo
            .create_website(&NewWebsite {
                name: "example.com".to_string(),
                url: None,
            })
            .await
            .unwrap();
        let ingestion =
            ReportIngestionUseCase::new(Arc::new(ReportParser::default()), Arc::clone(&repo));
        (ingestion, repo, site.id)
    }

    fn request(website_id: i64, filename: &str) -> UploadRequest {
        UploadRequest {
            website_id,
            report_type: None,
            filename: filename.to_string(),
        }
    }

    #[test]
    fn test_report_type_param() {
        assert_eq!(parse_report_type_param(None).unwrap(), None);
        assert_eq!(parse_report_type_param(Some("auto")).unwrap(), None);
        assert_eq!(parse_report_type_param(Some(" ")).unwrap(), None);
        assert_eq!(
            parse_report_type_param(Some("words_to_review")).unwrap(),
            Some(ReportType::WordsToReview)
        );
        assert!(parse_report_type_param(Some("spreadsheet")).is_err());
    }

    #[tokio::test]
    async fn test_ingest_detects_and_stores() {
        let (ingestion, repo, site) = setup().await;
        let result = ingestion
            .ingest(request(site, "misspellings.tsv"), MISSPELLINGS_TSV.as_bytes().to_vec())
            .await
            .unwrap();

        assert_eq!(result.report_type, ReportType::Misspellings);
        assert_eq!(result.records, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.website.name, "example.com");
        assert!(result.message().contains("2 records"));

        let filter = DashboardFilter {
            website_ids: vec![site],
            report_types: vec![ReportType::Misspellings],
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        };
        assert_eq!(
            repo.count_records(ReportType::Misspellings, &filter).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_unknown_website_is_not_found() {
        let (ingestion, _, site) = setup().await;
        let err = ingestion
            .ingest(request(site + 1, "m.tsv"), MISSPELLINGS_TSV.as_bytes().to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rejects_bad_extension_and_empty_body() {
        let (ingestion, _, site) = setup().await;
        let err = ingestion
            .ingest(request(site, "report.pdf"), b"data".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = ingestion
            .ingest(request(site, "report.csv"), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_undetectable_report_asks_for_type() {
        let (ingestion, repo, site) = setup().await;
        let err = ingestion
            .ingest(request(site, "other.csv"), b"Alpha,Beta\n1,2\n".to_vec())
            .await
            .unwrap_err();
        match err {
            AppError::ValidationError(msg) => assert!(msg.contains("select manually")),
            other => panic!("unexpected error: {}", other),
        }
        assert!(repo.list_reports(None).await.unwrap().is_empty());
    }
}
