//! Cache configuration types and builder
//!
//! [`CacheConfig`] names a cache and sets its size limit. It can be built in
//! code with [`CacheConfig::builder`] or read from the environment or a
//! TOML/JSON file with [`loader`].

pub mod loader;

use std::path::PathBuf;

use respool_common::byte_size_human;
use respool_common::error::{CommonError, ErrorSeverity};
use respool_common::units::{ByteSize, ByteSizeParseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default limit for caches built without an explicit one.
pub const DEFAULT_SIZE_LIMIT: ByteSize = ByteSize::from_mib(64);

/// Default cache name.
pub const DEFAULT_NAME: &str = "resources";

/// Configuration for a [`SizedResourceCache`](crate::SizedResourceCache)
///
/// # Example
/// ```
/// use respool_cache::CacheConfig;
/// use respool_common::ByteSize;
///
/// let config: CacheConfig = toml::from_str(
///     r#"
///         name = "textures"
///         size_limit = "256MiB"
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.size_limit, ByteSize::from_mib(256));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Name carried by the cache's log events.
    pub name: String,

    /// Size above which evictable entries are released.
    #[serde(with = "byte_size_human")]
    pub size_limit: ByteSize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { name: DEFAULT_NAME.to_string(), size_limit: DEFAULT_SIZE_LIMIT }
    }
}

impl CacheConfig {
    /// Create a new configuration builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Checks the fields a loaded configuration cannot enforce by type.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when the name is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid(CommonError::validation(
                "name",
                "cache name must not be empty",
            )));
        }
        Ok(())
    }
}

/// Builder for CacheConfig with fluent API
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the size limit
    pub fn size_limit(mut self, size_limit: ByteSize) -> Self {
        self.config.size_limit = size_limit;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// See [`CacheConfig::validate`].
    pub fn build(self) -> Result<CacheConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Errors raised while loading or validating a [`CacheConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config file exists at the given path or any probed location.
    #[error("No config file found (searched {searched} locations)")]
    NotFound { searched: usize },

    /// The config file exists but could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file contents are not valid TOML or JSON for [`CacheConfig`].
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: CommonError,
    },

    /// A required environment variable is unset.
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    /// An environment variable is set but is not a byte size.
    #[error("Invalid value for {key}: {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: ByteSizeParseError,
    },

    /// The configuration parsed but failed [`CacheConfig::validate`].
    #[error("Invalid configuration: {0}")]
    Invalid(CommonError),

    /// Any other shared failure.
    #[error(transparent)]
    Common(#[from] CommonError),
}

respool_common::impl_error_classification!(ConfigError, Common,
    Self::NotFound { .. } => {
        retryable: false,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::Read { .. } => {
        retryable: true,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::Parse { .. } => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::MissingEnv(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::InvalidValue { .. } => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::Invalid(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    }
);
