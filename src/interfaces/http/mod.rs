// ============================================================
// HTTP API
// ============================================================
// Upload, dashboard and export endpoints served by actix-web

mod params;

use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{
    delete, dev::Server, get, http::StatusCode, post, web, App, HttpRequest, HttpResponse,
    HttpServer, ResponseError,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::application::use_cases::dashboard::{DashboardUseCase, DEFAULT_TOP_WORDS};
use crate::application::use_cases::export::{
    export_dashboard_csv, export_file_name, EXPORT_DETAIL_ROWS, EXPORT_TOP_WORDS,
};
use crate::application::use_cases::report_ingestion::{
    parse_report_type_param, ReportIngestionUseCase, UploadRequest,
};
use crate::application::ReportParser;
use crate::domain::error::AppError;
use crate::domain::website::NewWebsite;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::ReportRepository;
use params::QueryParams;

const INDEX_HTML: &str = include_str!("index.html");
const MAX_LOG_ENTRIES: usize = 100;
const DASHBOARD_DETAIL_ROWS: i64 = 10;
const DEFAULT_PER_PAGE: i64 = 50;

type HandlerResult = std::result::Result<HttpResponse, AppError>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub repository: Arc<ReportRepository>,
    pub dashboard: DashboardUseCase,
    pub ingestion: ReportIngestionUseCase,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl HttpState {
    pub fn new(
        repository: Arc<ReportRepository>,
        parser: Arc<ReportParser>,
        logs: Arc<Mutex<Vec<LogEntry>>>,
    ) -> Self {
        Self {
            dashboard: DashboardUseCase::new(Arc::clone(&repository)),
            ingestion: ReportIngestionUseCase::new(parser, Arc::clone(&repository)),
            repository,
            logs,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ParseError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) | AppError::DatabaseError(_) | AppError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[get("/")]
async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

#[post("/upload")]
async fn upload(data: web::Data<HttpState>, req: HttpRequest, body: web::Bytes) -> HandlerResult {
    let params = QueryParams::parse(req.query_string());

    let request = match upload_request(&params) {
        Ok(request) => request,
        Err(e) => {
            add_log(&data.logs, "ERROR", "Upload", &e.to_string());
            return Err(e);
        }
    };

    add_log(
        &data.logs,
        "INFO",
        "Upload",
        &format!(
            "Received {} ({} bytes) for website {}",
            request.filename,
            body.len(),
            request.website_id
        ),
    );

    match data.ingestion.ingest(request, body.to_vec()).await {
        Ok(result) => {
            let message = result.message();
            add_log(&data.logs, "INFO", "Upload", &message);
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "message": message,
                "report_id": result.report_id,
                "report_type": result.report_type,
                "website": result.website.name,
                "records": result.records,
                "skipped": result.skipped,
            })))
        }
        Err(e) => {
            add_log(&data.logs, "ERROR", "Upload", &e.to_string());
            Err(e)
        }
    }
}

fn upload_request(params: &QueryParams) -> Result<UploadRequest, AppError> {
    let website_id = params
        .int("website_id")?
        .ok_or_else(|| AppError::ValidationError("website_id is required".to_string()))?;
    let filename = params
        .first("filename")
        .ok_or_else(|| AppError::ValidationError("filename is required".to_string()))?;

    Ok(UploadRequest {
        website_id,
        report_type: parse_report_type_param(params.first("report_type"))?,
        filename: filename.to_string(),
    })
}

#[get("/dashboard-data")]
async fn dashboard_data(data: web::Data<HttpState>, req: HttpRequest) -> HandlerResult {
    let params = QueryParams::parse(req.query_string());
    let filter = data.dashboard.resolve_filter(&params.dashboard_query()?).await?;

    let dashboard = data
        .dashboard
        .dashboard_data(&filter, params.period()?, DEFAULT_TOP_WORDS, DASHBOARD_DETAIL_ROWS)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "filters": filter,
        "summary_stats": dashboard.summary_stats,
        "trend_data": dashboard.trend_data,
        "top_words": dashboard.top_words,
        "language_distribution": dashboard.language_distribution,
        "detailed_data": dashboard.detailed_data,
    })))
}

#[get("/detailed-data")]
async fn detailed_data(data: web::Data<HttpState>, req: HttpRequest) -> HandlerResult {
    let params = QueryParams::parse(req.query_string());
    let filter = data.dashboard.resolve_filter(&params.dashboard_query()?).await?;

    let page = data
        .dashboard
        .detailed_data(
            &filter,
            params.first("search"),
            params.int("page")?.unwrap_or(1),
            params.int("per_page")?.unwrap_or(DEFAULT_PER_PAGE),
        )
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[get("/export")]
async fn export(data: web::Data<HttpState>, req: HttpRequest) -> HandlerResult {
    let params = QueryParams::parse(req.query_string());
    let filter = data.dashboard.resolve_filter(&params.dashboard_query()?).await?;

    let dashboard = data
        .dashboard
        .dashboard_data(&filter, params.period()?, EXPORT_TOP_WORDS, EXPORT_DETAIL_ROWS)
        .await?;
    let websites = data.repository.list_websites().await?;

    let generated_at = Local::now().naive_local();
    let bytes = export_dashboard_csv(&dashboard, &filter, &websites, generated_at)?;
    let file_name = export_file_name(generated_at);

    add_log(
        &data.logs,
        "INFO",
        "Export",
        &format!("Exported {} ({} bytes)", file_name, bytes.len()),
    );

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", file_name),
        ))
        .body(bytes))
}

#[get("/websites")]
async fn list_websites(data: web::Data<HttpState>) -> HandlerResult {
    Ok(HttpResponse::Ok().json(data.repository.list_websites().await?))
}

#[post("/websites")]
async fn create_website(
    data: web::Data<HttpState>,
    body: web::Json<NewWebsite>,
) -> HandlerResult {
    let input = body.into_inner();
    input.validate()?;

    let website = data.repository.create_website(&input).await?;
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Created website {}", website.name),
    );
    Ok(HttpResponse::Created().json(website))
}

#[get("/report-types")]
async fn report_types(data: web::Data<HttpState>, req: HttpRequest) -> HandlerResult {
    let params = QueryParams::parse(req.query_string());
    let website_ids = params.website_ids()?;
    let types = data.dashboard.report_types(website_ids.as_deref()).await?;
    Ok(HttpResponse::Ok().json(types))
}

#[get("/date-range")]
async fn date_range(data: web::Data<HttpState>, req: HttpRequest) -> HandlerResult {
    let params = QueryParams::parse(req.query_string());
    let website_ids = params.website_ids()?;
    let types = params.report_types()?;
    let range = data
        .dashboard
        .date_range(website_ids.as_deref(), types.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(range))
}

#[get("/reports")]
async fn list_reports(data: web::Data<HttpState>, req: HttpRequest) -> HandlerResult {
    let params = QueryParams::parse(req.query_string());
    let reports = data.repository.list_reports(params.int("website_id")?).await?;
    Ok(HttpResponse::Ok().json(reports))
}

#[delete("/reports/{id}")]
async fn delete_report(data: web::Data<HttpState>, path: web::Path<i64>) -> HandlerResult {
    let id = path.into_inner();
    data.repository.delete_report(id).await?;
    add_log(&data.logs, "INFO", "HttpApi", &format!("Deleted report {}", id));
    Ok(HttpResponse::Ok().json(json!({ "success": true, "report_id": id })))
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> HttpResponse {
    let logs = data.logs.lock().unwrap_or_else(|p| p.into_inner());
    HttpResponse::Ok().json(&*logs)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(|p| p.into_inner());
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Routes without app data; callers attach state and the payload limit
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(
        web::scope("/api")
            .service(upload)
            .service(dashboard_data)
            .service(detailed_data)
            .service(export)
            .service(list_websites)
            .service(create_website)
            .service(report_types)
            .service(date_range)
            .service(list_reports)
            .service(delete_report)
            .service(get_logs),
    );
}

pub fn start_server(state: web::Data<HttpState>, config: &AppConfig) -> std::io::Result<Server> {
    let max_upload_bytes = config.max_upload_bytes;

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Local tool, any origin

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .configure(configure)
    })
    .bind(config.bind_address())?
    .run();

    Ok(server)
}
