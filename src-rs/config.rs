use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::parser::ExecutionMode;

const MIB: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}={value}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("failed to build http client: {0}")]
    HttpClient(String),

    #[error("failed to prepare output dir {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub api_token: Option<String>,
    pub max_concurrent_requests: usize,
    pub output_dir: PathBuf,
    pub max_file_size_mb: usize,
    pub task_expire_hours: u64,
    pub sweep_interval: Duration,
    pub download_timeout: Duration,
    pub parse_timeout: Duration,
    pub execution_mode: ExecutionMode,
    pub parser_command: String,
    pub models_dir: PathBuf,
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_token: None,
            max_concurrent_requests: 2,
            output_dir: PathBuf::from("/tmp/docgate_output"),
            max_file_size_mb: 100,
            task_expire_hours: 24,
            sweep_interval: Duration::from_secs(3600),
            download_timeout: Duration::from_secs(300),
            parse_timeout: Duration::from_secs(1800),
            execution_mode: ExecutionMode::Blocking,
            parser_command: "mineru".to_string(),
            models_dir: PathBuf::from("/workspace/models"),
            log_level: "info".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Reads every setting once. Unset variables keep their defaults; set but
    /// unparsable ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_concurrent_requests: usize = parsed(
            &lookup,
            "DOCGATE_MAX_CONCURRENT_REQUESTS",
            defaults.max_concurrent_requests,
        )?;
        if max_concurrent_requests == 0 {
            return Err(invalid("DOCGATE_MAX_CONCURRENT_REQUESTS", "0", "must be at least 1"));
        }
        let max_file_size_mb: usize =
            parsed(&lookup, "DOCGATE_MAX_FILE_SIZE_MB", defaults.max_file_size_mb)?;
        if max_file_size_mb == 0 {
            return Err(invalid("DOCGATE_MAX_FILE_SIZE_MB", "0", "must be at least 1"));
        }
        let sweep_secs: u64 = parsed(
            &lookup,
            "DOCGATE_SWEEP_INTERVAL_SECS",
            defaults.sweep_interval.as_secs(),
        )?;
        if sweep_secs == 0 {
            return Err(invalid("DOCGATE_SWEEP_INTERVAL_SECS", "0", "must be at least 1"));
        }

        let log_level = string_or(&lookup, "DOCGATE_LOG_LEVEL", &defaults.log_level).to_lowercase();
        if !matches!(log_level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            return Err(invalid(
                "DOCGATE_LOG_LEVEL",
                &log_level,
                "expected trace, debug, info, warn or error",
            ));
        }

        Ok(Self {
            host: string_or(&lookup, "DOCGATE_HOST", &defaults.host),
            port: parsed(&lookup, "PORT", defaults.port)?,
            api_token: optional(&lookup, "DOCGATE_API_TOKEN"),
            max_concurrent_requests,
            output_dir: optional(&lookup, "DOCGATE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            max_file_size_mb,
            task_expire_hours: parsed(
                &lookup,
                "DOCGATE_TASK_EXPIRE_HOURS",
                defaults.task_expire_hours,
            )?,
            sweep_interval: Duration::from_secs(sweep_secs),
            download_timeout: Duration::from_secs(parsed(
                &lookup,
                "DOCGATE_DOWNLOAD_TIMEOUT_SECS",
                defaults.download_timeout.as_secs(),
            )?),
            parse_timeout: Duration::from_secs(parsed(
                &lookup,
                "DOCGATE_PARSE_TIMEOUT_SECS",
                defaults.parse_timeout.as_secs(),
            )?),
            execution_mode: parsed(&lookup, "DOCGATE_EXECUTION_MODE", defaults.execution_mode)?,
            parser_command: string_or(&lookup, "DOCGATE_PARSER_COMMAND", &defaults.parser_command),
            models_dir: optional(&lookup, "DOCGATE_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),
            log_level,
        })
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb.saturating_mul(MIB)
    }

    /// Largest PNG, in pixels, that ingestion will decode.
    pub fn max_image_pixels(&self) -> u64 {
        crate::ingest::image::pixel_budget(self.max_file_size_bytes())
    }

    pub fn task_ttl(&self) -> Duration {
        Duration::from_secs(self.task_expire_hours.saturating_mul(3600))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn auth_enabled(&self) -> bool {
        self.api_token.is_some()
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn string_or<F>(lookup: &F, key: &str, fallback: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).unwrap_or_else(|| fallback.to_string())
}

fn parsed<F, T>(lookup: &F, key: &str, fallback: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| invalid(key, &raw, &err.to_string())),
        None => Ok(fallback),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
