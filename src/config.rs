use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Configuration was initialized twice in the same process.
    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

/// Runtime configuration for the mem-dm tool server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Raw base URL setting: a single URL, a comma-separated list, or `auto`.
    pub base_url: String,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Attempts per outbound memory-service request.
    pub max_retries: u32,
    /// Linear backoff unit in milliseconds (`backoff * attempt`).
    pub backoff_base_ms: u64,
    /// Timeout for `POST /memories/async`, in milliseconds.
    pub add_timeout_ms: u64,
    /// Timeout for `POST /search`, in milliseconds.
    pub search_timeout_ms: u64,
    /// Timeout for `GET /health` probes, in milliseconds.
    pub probe_timeout_ms: u64,
    /// Lifetime of a cached base URL resolution, in seconds.
    pub resolve_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = load_env("MEM_DM_BASE_URL")?;
        if base_url.trim().is_empty() {
            return Err(ConfigError::MissingVariable("MEM_DM_BASE_URL".into()));
        }

        Ok(Self {
            base_url,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
            max_retries: load_env_parsed::<u32>("MEM_DM_MAX_RETRIES", 3)?.max(1),
            backoff_base_ms: load_env_parsed("MEM_DM_BACKOFF_BASE_MS", 600)?,
            add_timeout_ms: load_env_parsed("MEM_DM_ADD_TIMEOUT_MS", 6_000)?,
            search_timeout_ms: load_env_parsed("MEM_DM_SEARCH_TIMEOUT_MS", 10_000)?,
            probe_timeout_ms: load_env_parsed("MEM_DM_PROBE_TIMEOUT_MS", 1_200)?,
            resolve_ttl_secs: load_env_parsed("MEM_DM_RESOLVE_TTL_SECS", 60)?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_parsed<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        base_url = %config.base_url,
        server_port = ?config.server_port,
        max_retries = config.max_retries,
        backoff_base_ms = config.backoff_base_ms,
        resolve_ttl_secs = config.resolve_ttl_secs,
        "Loaded configuration"
    );
    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(get_config())
}
