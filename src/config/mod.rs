//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `FUNNEL_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_EMBEDDING_DIM, DEFAULT_EVAL_CONCURRENCY, DEFAULT_EVAL_TIMEOUT_SECS, DEFAULT_MAX_RESULTS,
};
use crate::pipeline::PipelineConfig;

/// Default API base used when `FUNNEL_API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "openai/text-embedding-3-small";
pub const DEFAULT_SCORING_MODEL: &str = "openai/gpt-4o-mini";

/// Base URL, credentials and request timeout for an OpenAI-compatible API.
#[derive(Clone)]
pub struct ApiEndpoint {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ApiEndpoint {
    /// Joins `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl std::fmt::Debug for ApiEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiEndpoint")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Runtime configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `FUNNEL_*` overrides on top of defaults.
#[derive(Clone)]
pub struct Config {
    /// Directory holding the persisted vector index. Default: `./.data/index`.
    pub index_dir: PathBuf,

    /// Root of the JSON record store. Default: `./.data/records`.
    pub records_dir: PathBuf,

    /// Embedding vector length. Default: `1536`.
    pub embedding_dim: usize,

    /// Nearest-neighbour hits requested per job. Default: `1000`.
    pub max_results: usize,

    /// Scoring calls allowed in flight at once. Default: `5`.
    pub eval_concurrency: usize,

    /// Per-call scoring timeout in seconds. Default: `30`.
    pub eval_timeout_secs: u64,

    /// OpenAI-compatible API base. Default: `https://openrouter.ai/api/v1`.
    pub api_base_url: String,

    /// API key. When unset, offline stub providers are used where possible.
    pub api_key: Option<String>,

    pub embedding_model: String,

    pub scoring_model: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("index_dir", &self.index_dir)
            .field("records_dir", &self.records_dir)
            .field("embedding_dim", &self.embedding_dim)
            .field("max_results", &self.max_results)
            .field("eval_concurrency", &self.eval_concurrency)
            .field("eval_timeout_secs", &self.eval_timeout_secs)
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("embedding_model", &self.embedding_model)
            .field("scoring_model", &self.scoring_model)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("./.data/index"),
            records_dir: PathBuf::from("./.data/records"),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            max_results: DEFAULT_MAX_RESULTS,
            eval_concurrency: DEFAULT_EVAL_CONCURRENCY,
            eval_timeout_secs: DEFAULT_EVAL_TIMEOUT_SECS,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            scoring_model: DEFAULT_SCORING_MODEL.to_string(),
        }
    }
}

impl Config {
    const ENV_INDEX_DIR: &'static str = "FUNNEL_INDEX_DIR";
    const ENV_RECORDS_DIR: &'static str = "FUNNEL_RECORDS_DIR";
    const ENV_EMBEDDING_DIM: &'static str = "FUNNEL_EMBEDDING_DIM";
    const ENV_MAX_RESULTS: &'static str = "FUNNEL_MAX_RESULTS";
    const ENV_EVAL_CONCURRENCY: &'static str = "FUNNEL_EVAL_CONCURRENCY";
    const ENV_EVAL_TIMEOUT_SECS: &'static str = "FUNNEL_EVAL_TIMEOUT_SECS";
    const ENV_API_BASE_URL: &'static str = "FUNNEL_API_BASE_URL";
    const ENV_API_KEY: &'static str = "FUNNEL_API_KEY";
    const ENV_EMBEDDING_MODEL: &'static str = "FUNNEL_EMBEDDING_MODEL";
    const ENV_SCORING_MODEL: &'static str = "FUNNEL_SCORING_MODEL";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            index_dir: Self::parse_path_from_env(Self::ENV_INDEX_DIR, defaults.index_dir),
            records_dir: Self::parse_path_from_env(Self::ENV_RECORDS_DIR, defaults.records_dir),
            embedding_dim: Self::parse_number_from_env(
                Self::ENV_EMBEDDING_DIM,
                defaults.embedding_dim,
            )?,
            max_results: Self::parse_number_from_env(Self::ENV_MAX_RESULTS, defaults.max_results)?,
            eval_concurrency: Self::parse_number_from_env(
                Self::ENV_EVAL_CONCURRENCY,
                defaults.eval_concurrency,
            )?,
            eval_timeout_secs: Self::parse_number_from_env(
                Self::ENV_EVAL_TIMEOUT_SECS,
                defaults.eval_timeout_secs,
            )?,
            api_base_url: Self::parse_string_from_env(
                Self::ENV_API_BASE_URL,
                defaults.api_base_url,
            ),
            api_key: Self::parse_optional_string_from_env(Self::ENV_API_KEY),
            embedding_model: Self::parse_string_from_env(
                Self::ENV_EMBEDDING_MODEL,
                defaults.embedding_model,
            ),
            scoring_model: Self::parse_string_from_env(
                Self::ENV_SCORING_MODEL,
                defaults.scoring_model,
            ),
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.index_dir, &self.records_dir] {
            if path.exists() && !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if self.embedding_dim == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_EMBEDDING_DIM,
            });
        }
        if self.max_results == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_MAX_RESULTS,
            });
        }
        if self.eval_concurrency == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_EVAL_CONCURRENCY,
            });
        }
        if self.eval_timeout_secs == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_EVAL_TIMEOUT_SECS,
            });
        }

        Ok(())
    }

    /// Tuning knobs for the matching pipeline.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_results: self.max_results,
            eval_concurrency: self.eval_concurrency,
            eval_timeout: Duration::from_secs(self.eval_timeout_secs),
        }
    }

    /// The remote API endpoint, or `None` when no key is configured.
    pub fn api_endpoint(&self) -> Option<ApiEndpoint> {
        self.api_key.as_ref().map(|key| ApiEndpoint {
            base_url: self.api_base_url.clone(),
            api_key: key.clone(),
            timeout: Duration::from_secs(self.eval_timeout_secs),
        })
    }

    /// Like [`api_endpoint`](Self::api_endpoint) but fails when no key is configured.
    pub fn require_api_endpoint(&self) -> Result<ApiEndpoint, ConfigError> {
        self.api_endpoint().ok_or(ConfigError::MissingEnvVar {
            name: Self::ENV_API_KEY,
        })
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(default)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        Self::parse_optional_string_from_env(var_name).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_number_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }
}
