//! Configuration loading from TOML files and the environment

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use steamstats_core::{HttpConfig, RetryPolicy};

pub const STEAM_API_KEY: &str = "STEAM_API_KEY";
pub const STEAM_USER_ID: &str = "STEAM_USER_ID";
pub const ITAD_API_KEY: &str = "ITAD_API_KEY";

/// Global configuration for steamstats
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub steam: SteamConfig,
    pub itad: ItadConfig,
    pub hltb: HltbConfig,
    pub opencritic: OpenCriticConfig,
    pub http: HttpSection,
    pub run: RunSection,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SteamConfig {
    #[serde(deserialize_with = "deserialize_env_var")]
    pub api_key: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub user_id: Option<String>,
    pub store_url: String,
    pub api_url: String,
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            user_id: None,
            store_url: steamstats_sources::steam::DEFAULT_STORE_URL.to_string(),
            api_url: steamstats_sources::steam::DEFAULT_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ItadConfig {
    #[serde(deserialize_with = "deserialize_env_var")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub region: String,
    pub country: String,
}

impl Default for ItadConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: steamstats_sources::itad::DEFAULT_BASE_URL.to_string(),
            region: "eu1".to_string(),
            country: "FR".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HltbConfig {
    pub base_url: String,
}

impl Default for HltbConfig {
    fn default() -> Self {
        Self {
            base_url: steamstats_sources::hltb::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenCriticConfig {
    pub base_url: String,
}

impl Default for OpenCriticConfig {
    fn default() -> Self {
        Self {
            base_url: steamstats_sources::opencritic::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub max_attempts: u32,
    pub base_delay_secs: u64,
    pub rate_limit_delay_secs: u64,
    pub rate_limit_step_secs: u64,
    /// Unset: wait out rate limits indefinitely
    pub max_rate_limit_retries: Option<u32>,
    pub connect_timeout_secs: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 2,
            rate_limit_delay_secs: 5,
            rate_limit_step_secs: 5,
            max_rate_limit_retries: None,
            connect_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RunSection {
    pub batch_size: usize,
    pub use_batch: bool,
    pub flush_every: usize,
    pub pace_ms: u64,
    pub min_name_similarity: f64,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            batch_size: 200,
            use_batch: true,
            flush_every: 10,
            pace_ms: 1000,
            min_name_similarity: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("Exports"),
            filename: "game_info.csv".to_string(),
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

/// Missing credential. Fatal before any request is made.
#[derive(Debug)]
pub enum ConfigError {
    Missing {
        what: &'static str,
        env_var: &'static str,
        key: &'static str,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing { what, env_var, key } => write!(
                f,
                "{what} not configured: set {env_var} or `{key}` in the config file"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Environment first, then the config file value
fn resolve(
    env: &impl Fn(&str) -> Option<String>,
    env_var: &str,
    file_value: Option<&String>,
) -> Option<String> {
    let non_blank = |v: String| Some(v.trim().to_string()).filter(|v| !v.is_empty());
    env(env_var)
        .and_then(non_blank)
        .or_else(|| file_value.cloned().and_then(non_blank))
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Resolved secrets and account
#[derive(Debug, Clone)]
pub struct Credentials {
    pub steam_api_key: String,
    pub user_id: Option<String>,
    pub itad_api_key: Option<String>,
}

impl Credentials {
    /// The Steam key is always required; the account id only when
    /// `need_user` is set. `user_override` (from the command line) wins.
    pub fn resolve(config: &Config, user_override: Option<&str>, need_user: bool) -> Result<Self, ConfigError> {
        Self::resolve_with(config, user_override, need_user, &process_env)
    }

    fn resolve_with(
        config: &Config,
        user_override: Option<&str>,
        need_user: bool,
        env: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let steam_api_key = resolve(env, STEAM_API_KEY, config.steam.api_key.as_ref()).ok_or(
            ConfigError::Missing {
                what: "Steam API key",
                env_var: STEAM_API_KEY,
                key: "steam.api_key",
            },
        )?;
        let user_id = match user_override.map(str::trim).filter(|u| !u.is_empty()) {
            Some(user) => Some(user.to_string()),
            None => resolve(env, STEAM_USER_ID, config.steam.user_id.as_ref()),
        };
        if need_user && user_id.is_none() {
            return Err(ConfigError::Missing {
                what: "Steam user id",
                env_var: STEAM_USER_ID,
                key: "steam.user_id",
            });
        }
        Ok(Self {
            steam_api_key,
            user_id,
            itad_api_key: resolve(env, ITAD_API_KEY, config.itad.api_key.as_ref()),
        })
    }

    /// Account id, for commands that resolved with `need_user`
    pub fn user(&self) -> Result<&str, ConfigError> {
        self.user_id.as_deref().ok_or(ConfigError::Missing {
            what: "Steam user id",
            env_var: STEAM_USER_ID,
            key: "steam.user_id",
        })
    }

    pub fn itad(&self) -> Result<&str, ConfigError> {
        self.itad_api_key.as_deref().ok_or(ConfigError::Missing {
            what: "IsThereAnyDeal API key",
            env_var: ITAD_API_KEY,
            key: "itad.api_key",
        })
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./steamstats.toml (current directory)
    /// 2. ~/.config/steamstats/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("steamstats.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "steamstats") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Retry policy from `[http]`, with an optional attempt-count override
    pub fn retry_policy(&self, max_attempts: Option<u32>) -> RetryPolicy {
        RetryPolicy {
            max_attempts: max_attempts.unwrap_or(self.http.max_attempts).max(1),
            base_delay: Duration::from_secs(self.http.base_delay_secs),
            rate_limit_delay: Duration::from_secs(self.http.rate_limit_delay_secs),
            rate_limit_step: Duration::from_secs(self.http.rate_limit_step_secs),
            max_rate_limit_retries: self.http.max_rate_limit_retries,
            ..RetryPolicy::default()
        }
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
            ..HttpConfig::default()
        }
    }
}
