//! Runtime settings.
//!
//! # Responsibility
//! - Load registry/logging settings from an optional JSON file.
//! - Apply `IMPLREG_*` environment overrides on top.
//!
//! # Invariants
//! - Missing file or missing keys fall back to defaults.
//! - Unknown keys and unknown values are rejected, never ignored.

use crate::logging::{default_log_level, normalize_level};
use crate::registry::{BufferPolicy, UnknownPolicyError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable overriding `buffer_policy`.
pub const ENV_BUFFER_POLICY: &str = "IMPLREG_BUFFER_POLICY";
/// Environment variable overriding `log_level`.
pub const ENV_LOG_LEVEL: &str = "IMPLREG_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySettings {
    /// Buffering used before consumers attach.
    pub buffer_policy: BufferPolicy,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            buffer_policy: BufferPolicy::default(),
            log_level: default_log_level().to_string(),
        }
    }
}

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug)]
pub enum SettingsError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidPolicy(UnknownPolicyError),
    InvalidLogLevel(String),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read settings `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid settings `{}`: {source}", path.display())
            }
            Self::InvalidPolicy(err) => write!(f, "{err}"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidPolicy(err) => Some(err),
            Self::InvalidLogLevel(_) => None,
        }
    }
}

impl From<UnknownPolicyError> for SettingsError {
    fn from(value: UnknownPolicyError) -> Self {
        Self::InvalidPolicy(value)
    }
}

/// Loads settings from `path` (when given) and the process environment.
pub fn load_settings(path: Option<&Path>) -> SettingsResult<RegistrySettings> {
    let settings = match path {
        Some(path) => read_settings_file(path)?,
        None => RegistrySettings::default(),
    };
    apply_overrides(settings, |key| std::env::var(key).ok())
}

fn read_settings_file(path: &Path) -> SettingsResult<RegistrySettings> {
    let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: RegistrySettings =
        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(settings)
}

/// Applies overrides from `lookup`, then validates the result.
pub fn apply_overrides(
    mut settings: RegistrySettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> SettingsResult<RegistrySettings> {
    if let Some(policy) = lookup(ENV_BUFFER_POLICY) {
        settings.buffer_policy = policy.parse()?;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        settings.log_level = level;
    }
    settings.log_level = normalize_level(&settings.log_level)
        .map_err(SettingsError::InvalidLogLevel)?
        .to_string();
    Ok(settings)
}
