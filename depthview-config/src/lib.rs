use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

pub const ENV_CONFIG: &str = "DEPTHVIEW_CONFIG";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_BIND_ADDR: &str = "DEPTHVIEW_BIND_ADDR";
pub const ENV_LOG: &str = "DEPTHVIEW_LOG";
pub const ENV_MAX_CONNECTIONS: &str = "DEPTHVIEW_MAX_CONNECTIONS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_LOG: &str = "info";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {message}")]
    Io { path: String, message: String },
    #[error("parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Process-wide settings. Loaded once in `main` and passed down by reference.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub log_filter: String,
    pub max_connections: u32,
}

/// On-disk shape; every key optional so env can fill the gaps.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    database_url: Option<String>,
    bind_addr: Option<String>,
    log_filter: Option<String>,
    max_connections: Option<u32>,
}

impl Settings {
    /// Read `DEPTHVIEW_CONFIG` (if set) and then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let file = match env(ENV_CONFIG) {
            Some(path) => Some(read_file(path)?),
            None => None,
        };
        Self::resolve(file.unwrap_or_default(), env)
    }

    /// Like [`Settings::load`] but with an explicit YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = read_file(path)?;
        Self::resolve(file, |key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Parse YAML text and layer `env` lookups on top.
    pub fn from_yaml_with_env(
        text: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file: FileSettings = if text.trim().is_empty() {
            FileSettings::default()
        } else {
            serde_yaml::from_str(text)?
        };
        Self::resolve(file, env)
    }

    fn resolve(file: FileSettings, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = env(ENV_DATABASE_URL)
            .or(file.database_url)
            .ok_or(ConfigError::Missing(ENV_DATABASE_URL))?;

        let bind_raw = env(ENV_BIND_ADDR)
            .or(file.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            key: ENV_BIND_ADDR,
            message: format!("{bind_raw}: {e}"),
        })?;

        let log_filter = env(ENV_LOG)
            .or(file.log_filter)
            .unwrap_or_else(|| DEFAULT_LOG.into());

        let max_connections = match env(ENV_MAX_CONNECTIONS) {
            Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                key: ENV_MAX_CONNECTIONS,
                message: format!("{raw}: {e}"),
            })?,
            None => file.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_MAX_CONNECTIONS,
                message: "must be at least 1".into(),
            });
        }

        Ok(Self {
            database_url,
            bind_addr,
            log_filter,
            max_connections,
        })
    }
}

fn read_file(path: impl AsRef<Path>) -> Result<FileSettings, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    if text.trim().is_empty() {
        return Ok(FileSettings::default());
    }
    Ok(serde_yaml::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_url_is_set() {
        let s = Settings::from_yaml_with_env("", env_of(&[("DATABASE_URL", "sqlite://frames.db")]))
            .unwrap();
        assert_eq!(s.database_url, "sqlite://frames.db");
        assert_eq!(s.bind_addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(s.log_filter, "info");
        assert_eq!(s.max_connections, 5);
    }

    #[test]
    fn missing_url_is_an_error() {
        let err = Settings::from_yaml_with_env("", env_of(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn env_overrides_file() {
        let yaml = "database_url: sqlite://file.db\nbind_addr: 127.0.0.1:9000\nmax_connections: 2\n";
        let s = Settings::from_yaml_with_env(
            yaml,
            env_of(&[("DATABASE_URL", "sqlite://env.db"), ("DEPTHVIEW_LOG", "debug")]),
        )
        .unwrap();
        assert_eq!(s.database_url, "sqlite://env.db");
        assert_eq!(s.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(s.log_filter, "debug");
        assert_eq!(s.max_connections, 2);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let err = Settings::from_yaml_with_env("database_uri: oops\n", env_of(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bad_bind_addr_is_reported() {
        let err = Settings::from_yaml_with_env(
            "",
            env_of(&[("DATABASE_URL", "sqlite::memory:"), ("DEPTHVIEW_BIND_ADDR", "nope")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DEPTHVIEW_BIND_ADDR", .. }));
    }

    #[test]
    fn zero_connections_is_invalid() {
        let err = Settings::from_yaml_with_env(
            "",
            env_of(&[("DATABASE_URL", "sqlite::memory:"), ("DEPTHVIEW_MAX_CONNECTIONS", "0")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
