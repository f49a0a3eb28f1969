//! Application configuration loaded from environment variables.
//!
//! Loading happens in two explicit steps:
//!
//! 1. [`EnvFilePolicy::resolve`] decides whether a local env file should be
//!    applied. Inside a managed cloud development environment (GitHub
//!    Codespaces) the file is skipped and the platform-provided secrets win.
//! 2. [`Config::from_env`] deserializes the process environment with `envy`.
//!
//! Per-request build metadata is *not* part of [`Config`]; it is read through
//! an [`EnvSource`] every time so that it always reflects the live environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Read-only view of environment variables.
pub trait EnvSource: Send + Sync {
    /// Look up a variable. `None` means the variable is not set.
    fn get(&self, key: &str) -> Option<String>;

    /// Look up a variable, falling back to `default` when it is not set.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Whether we run inside a managed cloud development environment.
pub fn is_managed_dev_env(env: &dyn EnvSource) -> bool {
    ["CODESPACES", "CODESPACE_NAME"]
        .iter()
        .any(|key| env.get(key).is_some_and(|v| !v.is_empty()))
}

/// What to do with the local env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFilePolicy {
    /// Load variables from this file without overriding existing ones.
    Load(PathBuf),
    /// Leave the environment untouched.
    Skip,
}

impl EnvFilePolicy {
    /// Pick the policy for `path` given the current environment.
    pub fn resolve(env: &dyn EnvSource, path: impl Into<PathBuf>) -> Self {
        if is_managed_dev_env(env) {
            Self::Skip
        } else {
            Self::Load(path.into())
        }
    }

    /// Apply the policy to the process environment.
    ///
    /// Returns `true` if a file was actually loaded. A missing file is fine.
    pub fn apply(&self) -> Result<bool, ConfigError> {
        let path = match self {
            Self::Skip => return Ok(false),
            Self::Load(path) => path,
        };

        // dotenvy never overrides variables that are already set
        match dotenvy::from_path(path) {
            Ok(()) => Ok(true),
            Err(e) if e.not_found() => Ok(false),
            Err(source) => Err(ConfigError::EnvFile {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

/// Resolve a relative path against the working directory, falling back to
/// the directory that holds the executable.
///
/// Paths found in neither place are returned unchanged.
pub fn locate(path: &Path) -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    locate_in(path, exe_dir.as_deref())
}

fn locate_in(path: &Path, fallback_dir: Option<&Path>) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    fallback_dir
        .map(|dir| dir.join(path))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Port for the Prometheus exporter. Disabled when unset.
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Log filter directives (`RUST_LOG`).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,

    // === Error Reporting ===
    /// Sentry DSN. Error reporting is enabled only when this is set.
    #[serde(default)]
    pub sentry_dsn: Option<String>,

    /// Fraction of requests traced by Sentry.
    #[serde(default = "default_traces_sample_rate")]
    pub sentry_traces_sample_rate: f32,

    /// Sentry environment tag (e.g. `production`).
    #[serde(default)]
    pub sentry_environment: Option<String>,
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_traces_sample_rate() -> f32 {
    1.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
            metrics_port: None,
            rust_log: default_log_level(),
            log_json: false,
            sentry_dsn: None,
            sentry_traces_sample_rate: default_traces_sample_rate(),
            sentry_environment: None,
        }
    }
}

impl Config {
    /// Deserialize configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::from_env()?)
    }

    /// Deserialize configuration from explicit key/value pairs.
    pub fn from_iter<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    /// The DSN, if error reporting should be enabled.
    ///
    /// An empty `SENTRY_DSN` counts as unset.
    pub fn dsn(&self) -> Option<&str> {
        self.sentry_dsn.as_deref().filter(|dsn| !dsn.is_empty())
    }

    /// Check if error reporting is enabled.
    pub fn sentry_enabled(&self) -> bool {
        self.dsn().is_some()
    }
}
