//! Run configuration
//!
//! `IngestConfig` is loaded from YAML. Every field has a default, so an empty
//! document (or no file at all) describes a complete run against the public
//! AppView. Command-line flags are applied on top by the CLI.

use crate::database::{validate_identifier, DEFAULT_TABLE};
use crate::decode::PageDecoder;
use crate::engine::PipelineConfig;
use crate::error::{Error, Result, ResultExt};
use crate::fetch::{PageRequest, RetryPolicy};
use crate::http::{HttpClientConfig, RateLimiter, RateLimiterConfig};
use crate::types::{BackoffType, SchemaVariant};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete run configuration loaded from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Upstream API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Per-page retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Local database settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Driver settings
    #[serde(default)]
    pub run: RunConfig,
}

impl IngestConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&contents)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values no run can work with
    pub fn validate(&self) -> Result<()> {
        if self.api.endpoint.trim().is_empty() {
            return Err(Error::invalid_value("api.endpoint", "must not be empty"));
        }
        Url::parse(&self.api.endpoint)?;
        if self.api.actor.trim().is_empty() {
            return Err(Error::invalid_value("api.actor", "must not be empty"));
        }
        if self.api.limit == 0 {
            return Err(Error::invalid_value("api.limit", "must be at least 1"));
        }
        if self.api.records_field.is_empty() {
            return Err(Error::invalid_value("api.records_field", "must not be empty"));
        }
        if self.api.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "api.requests_per_second",
                "must be at least 1 when set",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::invalid_value(
                "retry.max_attempts",
                "must be at least 1",
            ));
        }
        if self.run.max_pages == Some(0) {
            return Err(Error::invalid_value("run.max_pages", "must be at least 1 when set"));
        }
        validate_identifier(&self.store.table)
    }

    /// Request template for the configured endpoint and actor
    pub fn page_request(&self) -> Result<PageRequest> {
        let endpoint = Url::parse(&self.api.endpoint)?;
        Ok(PageRequest::new(endpoint)
            .param("actor", &self.api.actor)
            .param("limit", self.api.limit.to_string())
            .cursor_param(&self.api.cursor_field))
    }

    /// Response decoder for the configured field names
    pub fn decoder(&self) -> PageDecoder {
        PageDecoder::new(&self.api.records_field, &self.api.cursor_field)
    }

    /// HTTP client settings
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.api.timeout_secs))
            .user_agent(&self.api.user_agent)
            .build()
    }

    /// Rate limiter, if one is configured
    pub fn rate_limiter(&self) -> Result<Option<RateLimiter>> {
        self.api
            .requests_per_second
            .map(|rps| RateLimiter::new(RateLimiterConfig::per_second(rps)))
            .transpose()
    }

    /// Retry policy
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.unit_ms),
        )
        .with_backoff(self.retry.backoff);
        match self.retry.max_delay_ms {
            Some(max) => policy.with_max_delay(Duration::from_millis(max)),
            None => policy,
        }
    }

    /// Driver limits
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_pages: self.run.max_pages,
        }
    }
}

// ============================================================================
// API
// ============================================================================

/// Upstream API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Followers endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Account whose followers are ingested
    #[serde(default = "default_actor")]
    pub actor: String,

    /// Page size requested from the API
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Response field holding the record list
    #[serde(default = "default_records_field")]
    pub records_field: String,

    /// Response field holding the next cursor, also used as the query parameter
    #[serde(default = "default_cursor_field")]
    pub cursor_field: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional request rate cap
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            actor: default_actor(),
            limit: default_limit(),
            records_field: default_records_field(),
            cursor_field: default_cursor_field(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            requests_per_second: None,
        }
    }
}

fn default_endpoint() -> String {
    "https://public.api.bsky.app/xrpc/app.bsky.graph.getFollowers".to_string()
}

fn default_actor() -> String {
    "did:plc:z72i7hdynmk6r22z27h6tvur".to_string()
}

fn default_limit() -> u32 {
    30
}

fn default_records_field() -> String {
    "followers".to_string()
}

fn default_cursor_field() -> String {
    "cursor".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("follower-ingest/{}", env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// Retry
// ============================================================================

/// Per-page retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Attempts per page
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff shape
    #[serde(default)]
    pub backoff: BackoffType,

    /// Backoff unit in milliseconds
    #[serde(default = "default_unit_ms")]
    pub unit_ms: u64,

    /// Cap on a single wait in milliseconds
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: BackoffType::default(),
            unit_ms: default_unit_ms(),
            max_delay_ms: None,
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_unit_ms() -> u64 {
    1000
}

// ============================================================================
// Store
// ============================================================================

/// Local database settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// DuckDB database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Table name
    #[serde(default = "default_table")]
    pub table: String,

    /// Record shape
    #[serde(default)]
    pub schema: SchemaVariant,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            table: default_table(),
            schema: SchemaVariant::default(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("followers.db")
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

// ============================================================================
// Run
// ============================================================================

/// Driver settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Stop after this many committed pages
    #[serde(default)]
    pub max_pages: Option<u64>,

    /// Checkpoint file for automatic resume
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}
