// Configuration management with layered configuration (file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub data_quality: DataQualityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub tracing_endpoint: Option<String>,
}

/// Tuning for the data-quality rule service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQualityConfig {
    /// Drop null-valued fields from form descriptor JSON
    #[serde(default = "default_omit_null_fields")]
    pub omit_null_fields: bool,
    /// How many page rows are enriched with their rule definition at once
    #[serde(default = "default_enrichment_concurrency")]
    pub enrichment_concurrency: usize,
    /// Largest accepted page size for paged rule listings
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_omit_null_fields() -> bool {
    true
}

fn default_enrichment_concurrency() -> usize {
    4
}

fn default_max_page_size() -> u32 {
    500
}

impl Default for DataQualityConfig {
    fn default() -> Self {
        Self {
            omit_null_fields: default_omit_null_fields(),
            enrichment_concurrency: default_enrichment_concurrency(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        if self.data_quality.enrichment_concurrency == 0 {
            return Err("Data quality enrichment_concurrency must be greater than 0".to_string());
        }
        if self.data_quality.max_page_size == 0 {
            return Err("Data quality max_page_size must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/data_quality".to_string(),
                max_connections: 10,
                min_connections: 2,
                connect_timeout_seconds: 30,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                tracing_endpoint: None,
            },
            data_quality: DataQualityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_empty_database_url() {
        let mut settings = Settings::default();
        settings.database.url = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_port() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_enrichment_concurrency() {
        let mut settings = Settings::default();
        settings.data_quality.enrichment_concurrency = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_path_fills_data_quality_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("default.toml"),
            r#"
[server]
host = "127.0.0.1"
port = 8181

[database]
url = "postgresql://localhost/dq_test"
max_connections = 5
min_connections = 1
connect_timeout_seconds = 5

[observability]
log_level = "debug"
"#,
        )
        .unwrap();

        let settings = Settings::load_from_path(temp_dir.path()).unwrap();
        assert_eq!(settings.server.port, 8181);
        assert_eq!(settings.observability.log_level, "debug");
        assert!(settings.data_quality.omit_null_fields);
        assert_eq!(settings.data_quality.enrichment_concurrency, 4);
        assert_eq!(settings.data_quality.max_page_size, 500);
    }
}
