use std::sync::{Arc, Mutex};

use actix_web::web;
use tracing::error;

use crate::application::ReportParser;
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::ReportRepository;
use crate::interfaces::http::{add_log, HttpState, LogEntry};

/// Open storage, seed default websites and assemble the shared HTTP state
pub async fn setup(config: &AppConfig) -> Result<web::Data<HttpState>> {
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let repository = ReportRepository::init(&config.database_url)
        .await
        .map_err(|err| {
            error!(error = %err, database_url = %config.database_url, "Failed to open database");
            err
        })?;

    let seeded = repository.seed_websites(&config.default_websites).await?;
    if seeded > 0 {
        add_log(
            &logs,
            "INFO",
            "System",
            &format!("Seeded {} default websites", seeded),
        );
    }

    let parser = ReportParser::new(config.parser.clone());

    let state = HttpState::new(Arc::new(repository), Arc::new(parser), Arc::clone(&logs));
    add_log(&logs, "INFO", "System", "Backend initialized");

    Ok(web::Data::new(state))
}
