//! Configuration for talking to the Nebula profile API
//!
//! Values come from built-in defaults, an optional TOML file and `NEBULA_*`
//! environment variables, later sources winning.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat, Map};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ProfileError, ProfileResult};

const DEFAULT_API_URL: &str = "http://localhost:3001";
const DEFAULT_REQUEST_TIMEOUT_SECS: i64 = 10;
const DEFAULT_FETCH_MAX_ATTEMPTS: i64 = 3;
const DEFAULT_FETCH_RETRY_BACKOFF_MS: i64 = 250;

const ENV_PREFIX: &str = "NEBULA_";

/// Keys read from `NEBULA_*`; other variables under the prefix (the CLI's
/// `NEBULA_EMAIL` and `NEBULA_PASSWORD`) stay out of the configuration
const ENV_KEYS: [&str; 4] = [
    "api_url",
    "request_timeout_secs",
    "fetch_max_attempts",
    "fetch_retry_backoff_ms",
];

/// Profile API client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST collaborator (e.g., "http://localhost:3001")
    pub api_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Attempts for a profile fetch that fails at the network level
    pub fetch_max_attempts: u32,
    /// Pause between fetch attempts in milliseconds
    pub fetch_retry_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS as u64,
            fetch_max_attempts: DEFAULT_FETCH_MAX_ATTEMPTS as u32,
            fetch_retry_backoff_ms: DEFAULT_FETCH_RETRY_BACKOFF_MS as u64,
        }
    }
}

impl ApiConfig {
    /// Create a new ApiConfig from environment variables
    ///
    /// # Environment Variables
    /// - `NEBULA_API_URL`: base URL (default: "http://localhost:3001")
    /// - `NEBULA_REQUEST_TIMEOUT_SECS`: request timeout (default: 10)
    /// - `NEBULA_FETCH_MAX_ATTEMPTS`: fetch attempts on network failure (default: 3)
    /// - `NEBULA_FETCH_RETRY_BACKOFF_MS`: pause between attempts (default: 250)
    pub fn from_env() -> ProfileResult<Self> {
        Self::load(None)
    }

    /// Load the configuration, layering an optional TOML file under the
    /// environment
    pub fn load(path: Option<&Path>) -> ProfileResult<Self> {
        let mut builder = Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)?
            .set_default("fetch_max_attempts", DEFAULT_FETCH_MAX_ATTEMPTS)?
            .set_default("fetch_retry_backoff_ms", DEFAULT_FETCH_RETRY_BACKOFF_MS)?;

        if let Some(path) = path {
            debug!("Reading profile API configuration from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let config: ApiConfig = builder
            .add_source(
                Environment::with_prefix("NEBULA")
                    .source(Some(api_env()))
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> ProfileResult<()> {
        if self.api_url.trim().is_empty() {
            return Err(ProfileError::Configuration(
                "api_url must not be empty".to_string(),
            ));
        }

        if self.fetch_max_attempts == 0 {
            return Err(ProfileError::Configuration(
                "fetch_max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry backoff as a Duration
    pub fn fetch_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.fetch_retry_backoff_ms)
    }
}

/// `NEBULA_*` variables naming an [`ApiConfig`] field
fn api_env() -> Map<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .filter(|(key, _)| {
            key.get(..ENV_PREFIX.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ENV_PREFIX))
                && ENV_KEYS
                    .iter()
                    .any(|field| field.eq_ignore_ascii_case(&key[ENV_PREFIX.len()..]))
        })
        .collect()
}
