//! Application configuration.
//!
//! Values are layered with `figment`, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory (or an explicit path)
//! 3. `LOGOTEXT_*` environment variables (`__` separates nested keys)
//! 4. CLI flags, applied with [`Config::merge_cli`] and [`Config::merge_extract_args`]
//!
//! The API key additionally falls back to `GROQ_API_KEY` when nothing else
//! set it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, ExtractArgs};
use crate::extract::ExtractorConfig;
use crate::recognition::http::{DEFAULT_API_URL, DEFAULT_MODEL};
use crate::recognition::HttpClientConfig;
use crate::scanner::{WalkerConfig, DEFAULT_MIN_FILE_SIZE};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "LOGOTEXT_";

/// Fallback environment variable for the API key.
pub const API_KEY_FALLBACK_ENV: &str = "GROQ_API_KEY";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `text_cache.json`.
    pub cache_dir: PathBuf,
    /// Chat-completions endpoint.
    pub api_url: String,
    /// Bearer token for the endpoint.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    /// Vision model identifier.
    pub model: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Answer length bound sent with each request.
    pub max_tokens: u32,
    /// Longest image edge sent to the service, in pixels.
    pub max_dimension: u32,
    /// Minimum spacing between recognition requests, in milliseconds.
    pub min_request_interval_ms: u64,
    /// Pause between consensus sub-requests, in milliseconds.
    pub consensus_pause_ms: u64,
    /// Pause after each batch item that hit the network, in milliseconds.
    pub item_delay_ms: u64,
    /// Batch workers.
    pub workers: usize,
    /// Files of this size or smaller are skipped, in bytes.
    pub min_file_size: u64,
    /// Descend into subfolders during batches.
    pub recursive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: 60,
            max_tokens: 256,
            max_dimension: 1024,
            min_request_interval_ms: 800,
            consensus_pause_ms: 500,
            item_delay_ms: 100,
            workers: 1,
            min_file_size: DEFAULT_MIN_FILE_SIZE,
            recursive: false,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "logotext", "logotext")
}

fn default_cache_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("cache"))
}

impl Config {
    /// Load from the platform config file and the environment.
    #[must_use]
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from_path(path),
            None => Self::load_layers(None),
        }
    }

    /// Load using an explicit config file path.
    ///
    /// A missing file is not an error. An invalid file or environment value
    /// is logged and the defaults are used.
    #[must_use]
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        Self::load_layers(Some(path.as_ref()))
    }

    fn load_layers(path: Option<&Path>) -> Self {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Config = match figment.extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid configuration, using defaults: {}", e);
                Config::default()
            }
        };

        if config.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_FALLBACK_ENV) {
                config.api_key = key;
            }
        }

        config
    }

    /// Platform-specific config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply global CLI flags.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(ref dir) = cli.cache_dir {
            self.cache_dir = dir.clone();
        }
    }

    /// Apply `extract` subcommand flags.
    pub fn merge_extract_args(&mut self, args: &ExtractArgs) {
        if let Some(workers) = args.workers {
            self.workers = workers;
        }
        if args.recursive {
            self.recursive = true;
        }
        if let Some(size) = args.min_size {
            self.min_file_size = size;
        }
    }

    /// Extractor settings derived from this configuration.
    #[must_use]
    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            max_dimension: self.max_dimension,
            min_request_interval: Duration::from_millis(self.min_request_interval_ms),
            consensus_pause: Duration::from_millis(self.consensus_pause_ms),
            item_delay: Duration::from_millis(self.item_delay_ms),
            workers: self.workers.max(1),
            walker: WalkerConfig {
                recursive: self.recursive,
                min_file_size: self.min_file_size,
                ..WalkerConfig::default()
            },
        }
    }

    /// HTTP client settings derived from this configuration.
    #[must_use]
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            max_tokens: self.max_tokens,
        }
    }
}
