//! Configuration loader
//!
//! Loads [`CacheConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `RESPOOL_CACHE_NAME`: Cache name (optional, defaults to `resources`)
//! - `RESPOOL_CACHE_SIZE_LIMIT`: Size limit such as `64MiB` or `1048576`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./respool.toml`, `./respool.json`, `./config.toml`, `./config.json`
//! 2. The same names in `..`
//! 3. The same names in `../..`

use std::path::{Path, PathBuf};

use respool_common::error::CommonError;
use respool_common::units::ByteSize;

use super::{CacheConfig, ConfigError, DEFAULT_NAME};

/// Environment variable naming the cache.
pub const ENV_CACHE_NAME: &str = "RESPOOL_CACHE_NAME";

/// Environment variable holding the size limit.
pub const ENV_SIZE_LIMIT: &str = "RESPOOL_CACHE_SIZE_LIMIT";

const CONFIG_FILE_NAMES: [&str; 4] = ["respool.toml", "respool.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the size limit is
/// not set there, falls back to loading from a config file.
///
/// # Errors
/// Returns the file error when the environment is incomplete and no
/// usable config file is found. An environment value that is present but
/// malformed is reported as-is instead of falling back.
pub fn load() -> Result<CacheConfig, ConfigError> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!(name = %config.name, "Cache configuration loaded from environment");
            Ok(config)
        }
        Err(ConfigError::MissingEnv(key)) => {
            tracing::debug!(missing = %key, "Environment incomplete, trying config file");
            load_from_file(None)
        }
        Err(e) => Err(e),
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// - [`ConfigError::MissingEnv`] if `RESPOOL_CACHE_SIZE_LIMIT` is not set
/// - [`ConfigError::InvalidValue`] if it does not parse as a byte size
/// - [`ConfigError::Invalid`] if the resulting config fails validation
pub fn load_from_env() -> Result<CacheConfig, ConfigError> {
    let size_limit = env_var(ENV_SIZE_LIMIT)?
        .parse::<ByteSize>()
        .map_err(|source| ConfigError::InvalidValue { key: ENV_SIZE_LIMIT.to_string(), source })?;
    let name = std::env::var(ENV_CACHE_NAME).unwrap_or_else(|_| DEFAULT_NAME.to_string());

    CacheConfig::builder().name(name).size_limit(size_limit).build()
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations with
/// [`probe_config_paths`]. The format is detected from the extension.
///
/// # Errors
/// - [`ConfigError::NotFound`] if no file exists at the given or probed paths
/// - [`ConfigError::Read`] if the file cannot be read
/// - [`ConfigError::Parse`] if the contents are not valid for the format
/// - [`ConfigError::Invalid`] if the parsed config fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<CacheConfig, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound { searched: 1 });
            }
            p
        }
        None => probe_config_paths()
            .ok_or(ConfigError::NotFound { searched: candidate_paths().len() })?,
    };

    tracing::info!(path = %config_path.display(), "Loading cache configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|source| ConfigError::Read { path: config_path.clone(), source })?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`); files without
/// an extension are read as TOML.
fn parse_config(contents: &str, path: &Path) -> Result<CacheConfig, ConfigError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    let parsed: Result<CacheConfig, CommonError> = match extension {
        "toml" => toml::from_str(contents).map_err(CommonError::from),
        "json" => serde_json::from_str(contents).map_err(CommonError::from),
        other => Err(CommonError::serialization(
            other,
            "unsupported config format (expected .toml or .json)",
        )),
    };

    parsed.map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory and up to two parent levels for
/// `respool.toml`, `respool.json`, `config.toml` and `config.json`.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    candidate_paths().into_iter().find(|path| path.is_file())
}

fn candidate_paths() -> Vec<PathBuf> {
    let Ok(cwd) = std::env::current_dir() else {
        return Vec::new();
    };

    cwd.ancestors()
        .take(3)
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .collect()
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnv(key.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use parking_lot::{const_mutex, Mutex};
    use tempfile::{Builder, NamedTempFile};

    use super::*;

    static ENV_LOCK: Mutex<()> = const_mutex(());

    fn temp_config(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = Builder::new().prefix("respool").suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock();

        std::env::set_var(ENV_CACHE_NAME, "decoders");
        std::env::set_var(ENV_SIZE_LIMIT, "1.5MiB");

        let config = load_from_env().unwrap();
        assert_eq!(config.name, "decoders");
        assert_eq!(config.size_limit, ByteSize::from_kib(1536));

        std::env::remove_var(ENV_CACHE_NAME);
        std::env::remove_var(ENV_SIZE_LIMIT);
    }

    #[test]
    fn test_load_from_env_defaults_name() {
        let _guard = ENV_LOCK.lock();

        std::env::remove_var(ENV_CACHE_NAME);
        std::env::set_var(ENV_SIZE_LIMIT, "4096");

        let config = load_from_env().unwrap();
        assert_eq!(config.name, "resources");
        assert_eq!(config.size_limit, ByteSize::from_kib(4));

        std::env::remove_var(ENV_SIZE_LIMIT);
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock();

        let saved = std::env::var(ENV_SIZE_LIMIT).ok();
        std::env::remove_var(ENV_SIZE_LIMIT);

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref key) if key == ENV_SIZE_LIMIT));

        if let Some(val) = saved {
            std::env::set_var(ENV_SIZE_LIMIT, val);
        }
    }

    #[test]
    fn test_load_from_env_invalid_size() {
        let _guard = ENV_LOCK.lock();

        std::env::set_var(ENV_SIZE_LIMIT, "lots");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        std::env::remove_var(ENV_SIZE_LIMIT);
    }

    #[test]
    fn test_load_from_env_blank_name_is_invalid() {
        let _guard = ENV_LOCK.lock();

        std::env::set_var(ENV_CACHE_NAME, "");
        std::env::set_var(ENV_SIZE_LIMIT, "1KiB");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        std::env::remove_var(ENV_CACHE_NAME);
        std::env::remove_var(ENV_SIZE_LIMIT);
    }

    #[test]
    fn test_load_from_file_toml() {
        let file = temp_config(".toml", "name = \"meshes\"\nsize_limit = \"2GiB\"\n");

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.name, "meshes");
        assert_eq!(config.size_limit, ByteSize::from_gib(2));
    }

    #[test]
    fn test_load_from_file_json() {
        let file = temp_config(".json", r#"{"name": "fonts", "size_limit": 65536}"#);

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.name, "fonts");
        assert_eq!(config.size_limit, ByteSize::from_kib(64));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/respool.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { searched: 1 }));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let file = temp_config(".json", "{ invalid json }");

        let err = load_from_file(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Parse { source: CommonError::Serialization { .. }, .. }
        ));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let err = parse_config("name: x", Path::new("respool.yaml")).unwrap_err();
        assert!(err.to_string().contains("respool.yaml"));
    }

    #[test]
    fn test_candidate_paths_cover_two_parent_levels() {
        let candidates = candidate_paths();
        assert!(candidates.len() <= 12);
        assert!(candidates.iter().all(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| CONFIG_FILE_NAMES.contains(&name))
        }));
    }
}
