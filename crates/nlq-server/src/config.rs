//! Configuration for the nlq server
//!
//! Loads configuration from:
//! 1. config.yaml - operational settings (port, warehouse, limits, logging)
//! 2. .env file - the OpenAI credential
//!
//! Environment variables always override config.yaml values. A missing
//! config.yaml is not an error: every section has defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Inbound transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Http,
    Mcp,
}

impl std::str::FromStr for Transport {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Transport::Http),
            "mcp" => Ok(Transport::Mcp),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub transport: Transport,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            transport: Transport::Http,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// DuckDB file populated by the loader; opened read-only
    pub path: PathBuf,
    pub max_rows: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/olist.duckdb"),
            max_rows: nlq_duck::DEFAULT_MAX_ROWS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 20,
            max_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_question_chars: usize,
    /// Upper bound for top-N limits
    pub max_limit: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_question_chars: 500,
            max_limit: nlq_sql::DEFAULT_MAX_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// External catalog YAML; the embedded catalog is used when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: PathBuf::from("./logs"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub warehouse: WarehouseConfig,
    pub llm: LlmConfig,
    pub engine: EngineConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => Self::from_yaml_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(e.into()),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply `NLQ_*` and logging overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("NLQ_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("NLQ_SERVER_PORT") {
            self.server.port = parse("NLQ_SERVER_PORT", port)?;
        }
        if let Some(transport) = lookup("NLQ_TRANSPORT") {
            self.server.transport = transport
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "NLQ_TRANSPORT",
                    value: transport,
                })?;
        }

        if let Some(path) = lookup("NLQ_WAREHOUSE_PATH") {
            self.warehouse.path = PathBuf::from(path);
        }
        if let Some(max_rows) = lookup("NLQ_MAX_ROWS") {
            self.warehouse.max_rows = parse("NLQ_MAX_ROWS", max_rows)?;
        }

        if let Some(model) = lookup("NLQ_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(secs) = lookup("NLQ_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse("NLQ_LLM_TIMEOUT_SECS", secs)?;
        }

        if let Some(path) = lookup("NLQ_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(path));
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(output) = lookup("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Some(dir) = lookup("LOG_DIR") {
            self.logging.directory = PathBuf::from(dir);
        }

        Ok(())
    }

    /// OpenAI credential from the environment (usually `.env`).
    /// Absent or blank means demo mode.
    pub fn openai_api_key() -> Option<String> {
        std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}
