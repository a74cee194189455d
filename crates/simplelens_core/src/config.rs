//! Lens configuration.
//!
//! # Responsibility
//! - Decode lens options from TOML with defaults for every field.
//! - Validate options before a lens session is built from them.
//!
//! # Invariants
//! - An empty document yields `LensConfig::default()`.
//! - `highlight_ms` is strictly positive.

use crate::highlight::DEFAULT_HIGHLIGHT_MS;
use crate::logging::default_log_level;
use crate::reconcile::{DuplicatePolicy, Reconciler};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Options of one lens session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LensConfig {
    /// Effect of an add whose key is already present.
    pub duplicate_policy: DuplicatePolicy,
    /// Fail with `NotFound` instead of skipping unmatched lookups.
    pub strict_lookups: bool,
    /// How long a redrawn cell stays highlighted.
    pub highlight_ms: u64,
    /// `trace|debug|info|warn|error`.
    pub log_level: String,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Upsert,
            strict_lookups: false,
            highlight_ms: DEFAULT_HIGHLIGHT_MS,
            log_level: default_log_level().to_string(),
        }
    }
}

impl LensConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.highlight_ms == 0 {
            return Err(ConfigError::Invalid(
                "highlight_ms must be greater than zero".to_string(),
            ));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level must not be blank".to_string()));
        }
        Ok(())
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.duplicate_policy, self.strict_lookups)
    }
}

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}
