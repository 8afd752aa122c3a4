use tracing_subscriber::EnvFilter;

use crate::infrastructure::bootstrap;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::{add_log, start_server};

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn to_io_error(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}

/// Load configuration, open storage and serve the dashboard until shutdown
pub async fn run() -> std::io::Result<()> {
    let config = AppConfig::load().map_err(to_io_error)?;
    init_tracing(&config.log_filter);
    if let Some(path) = &config.env_file {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let state = bootstrap::setup(&config).await.map_err(to_io_error)?;
    let server = start_server(state.clone(), &config)?;

    let (host, port) = config.bind_address();
    tracing::info!(%host, port, database = %config.database_url, "Dashboard listening");
    add_log(
        &state.logs,
        "INFO",
        "System",
        &format!("HTTP server started on {}:{}", host, port),
    );

    server.await
}
