//! 运行配置：YAML 文件加载、环境变量覆盖、API 密钥解析。
//!
//! Runtime configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, an optional
//! YAML file, then `ROMA_*` environment variables.
//!
//! ```yaml
//! model: gemini-2.5-flash
//! temperature: 0.1
//! retry:
//!   max_retries: 3
//!   base_delay_ms: 1000
//! memory_dir: /var/lib/roma/memory
//! ```

use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ErrorContext;
use crate::protocol::{DEFAULT_TEMPERATURE, SYSTEM_INSTRUCTION};
use crate::session::SessionConfig;
use crate::{Error, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const KEYRING_SERVICE: &str = "roma";
const KEYRING_USER: &str = "gemini";
const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay unit; the n-th retry waits `base_delay_ms * 2^n`.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RomaConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub timeout_secs: u64,
    pub retry: RetryConfig,
    /// Media type assumed for images whose extension is not recognised.
    pub image_media_type: String,
    /// Directory for file-backed user memory; in-process memory when unset.
    pub memory_dir: Option<PathBuf>,
}

impl Default for RomaConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: 30,
            retry: RetryConfig::default(),
            image_media_type: "image/jpeg".to_string(),
            memory_dir: None,
        }
    }
}

impl RomaConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Apply `ROMA_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Unparsable numbers are errors.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ROMA_MODEL") {
            self.model = v;
        }
        if let Some(v) = lookup("ROMA_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("ROMA_TEMPERATURE") {
            self.temperature = parse_var("ROMA_TEMPERATURE", &v)?;
        }
        if let Some(v) = lookup("ROMA_HTTP_TIMEOUT_SECS") {
            self.timeout_secs = parse_var("ROMA_HTTP_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("ROMA_MAX_RETRIES") {
            self.retry.max_retries = parse_var("ROMA_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("ROMA_RETRY_BASE_DELAY_MS") {
            self.retry.base_delay_ms = parse_var("ROMA_RETRY_BASE_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("ROMA_MEMORY_DIR") {
            self.memory_dir = Some(PathBuf::from(v));
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base_url {:?}", self.base_url),
                ErrorContext::new()
                    .with_source("config")
                    .with_details(e.to_string()),
            )
        })?;
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::configuration(format!(
                "temperature {} outside [0, 2]",
                self.temperature
            )));
        }
        if self.retry.base_delay_ms == 0 {
            return Err(Error::configuration("retry.base_delay_ms must be positive"));
        }
        if self.model.trim().is_empty() {
            return Err(Error::configuration("model must not be empty"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            temperature: self.temperature,
            model: self.model.clone(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        Error::configuration_with_context(
            format!("{} has an invalid value {:?}", key, value),
            ErrorContext::new().with_source("env"),
        )
    })
}

/// Find the backend API key: OS keyring first, then `GEMINI_API_KEY`, then
/// `API_KEY`.
pub fn resolve_api_key() -> Option<String> {
    if let Ok(entry) = Entry::new(KEYRING_SERVICE, KEYRING_USER) {
        if let Ok(key) = entry.get_password() {
            return Some(key);
        }
    }
    API_KEY_VARS
        .iter()
        .find_map(|var| env::var(var).ok())
        .filter(|key| !key.trim().is_empty())
}
