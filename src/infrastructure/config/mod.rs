// ============================================================
// APPLICATION CONFIG
// ============================================================
// Defaults, then dashboard.toml, then DASHBOARD_* environment variables

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};
use crate::domain::report::ParserConfig;

pub const CONFIG_FILE: &str = "dashboard.toml";
pub const ENV_PREFIX: &str = "DASHBOARD_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub max_upload_bytes: usize,
    /// Websites created on start-up when missing
    pub default_websites: Vec<String>,
    pub log_filter: String,
    pub parser: ParserConfig,
    /// `.env` file read by `load`, if any
    #[serde(skip)]
    pub env_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database_url: "sqlite://siteimprove_data.db".to_string(),
            max_upload_bytes: 16 * 1024 * 1024,
            default_websites: vec![
                "Main Website".to_string(),
                "Blog".to_string(),
                "Support Portal".to_string(),
            ],
            log_filter: "info".to_string(),
            parser: ParserConfig::default(),
            env_file: None,
        }
    }
}

impl AppConfig {
    /// Load from the working directory, reading `.env` first if present.
    /// Runs before tracing is set up, so nothing is logged here.
    pub fn load() -> Result<Self> {
        let env_file = dotenvy::dotenv().ok();
        let mut config = Self::from_figment(Self::figment(CONFIG_FILE))?;
        config.env_file = env_file;
        Ok(config)
    }

    pub fn figment(config_file: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_file.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ValidationError(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::ValidationError(
                "server.host must not be empty".to_string(),
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(AppError::ValidationError(
                "database_url must not be empty".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(AppError::ValidationError(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        self.parser
            .validate()
            .map_err(|e| AppError::ValidationError(format!("parser: {}", e)))
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.parser.fallback_header_row, 2);
    }

    #[test]
    fn test_toml_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "dashboard.toml",
                r#"
                database_url = "sqlite://from_file.db"
                default_websites = ["docs.example.org"]

                [server]
                port = 8080

                [parser]
                delimiters = [",", ";"]
                "#,
            )?;
            jail.set_env("DASHBOARD_SERVER__PORT", "9090");
            jail.set_env("DASHBOARD_LOG_FILTER", "debug");

            let config = AppConfig::from_figment(AppConfig::figment("dashboard.toml"))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.database_url, "sqlite://from_file.db");
            assert_eq!(config.server.port, 9090);
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.log_filter, "debug");
            assert_eq!(config.default_websites, vec!["docs.example.org".to_string()]);
            assert_eq!(config.parser.delimiters, vec![',', ';']);
            // Untouched parser fields keep their defaults
            assert_eq!(config.parser.header_scan_rows, 10);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_parser_config_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "dashboard.toml",
                r#"
                [parser]
                encodings = ["not-an-encoding"]
                "#,
            )?;
            let err = AppConfig::from_figment(AppConfig::figment("dashboard.toml")).unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
            Ok(())
        });
    }

    #[test]
    fn test_load_reads_dotenv_file() {
        Jail::expect_with(|jail| {
            jail.create_file(".env", "DASHBOARD_DATABASE_URL=sqlite://from_dotenv.db\n")?;

            let config = AppConfig::load().map_err(|e| e.to_string());
            std::env::remove_var("DASHBOARD_DATABASE_URL");
            let config = config?;

            assert_eq!(config.database_url, "sqlite://from_dotenv.db");
            assert!(config
                .env_file
                .as_deref()
                .is_some_and(|p| p.ends_with(".env")));
            Ok(())
        });
    }

    #[test]
    fn test_zero_upload_limit_rejected() {
        let config = AppConfig {
            max_upload_bytes: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
