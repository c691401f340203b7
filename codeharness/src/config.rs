//! Configuration file handling for ~/.codeharness/config.ini.
//!
//! Loads user configuration with sensible defaults; a missing file means
//! defaults. This is the single place INI key names map to struct fields.

use crate::worker::DEFAULT_POLL_INTERVAL;
use ini::Ini;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:8712";
pub const DEFAULT_ENGINE_PROGRAM: &str = "sh";
pub const DEFAULT_LOG_FILE: &str = "codeharness.log";

/// Largest accepted executor poll interval. The loop is meant to react in
/// single-digit milliseconds; anything above this is a misconfiguration.
pub const MAX_POLL_INTERVAL_MS: u64 = 1000;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[server]` section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

/// `[engine]` section: the interpreter command snippets are piped to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub program: String,
    pub args: Vec<String>,
}

/// `[executor]` section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub poll_interval: Duration,
}

/// `[logging]` section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file: String,
}

/// The full parsed configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigFile {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub executor: ExecutorConfig,
    pub logging: LoggingConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                // The literal is a valid socket address; parse cannot fail.
                bind: DEFAULT_BIND.parse().unwrap_or_else(|_| {
                    SocketAddr::from(([127, 0, 0, 1], 8712))
                }),
            },
            engine: EngineConfig {
                program: DEFAULT_ENGINE_PROGRAM.to_string(),
                args: Vec::new(),
            },
            executor: ExecutorConfig {
                poll_interval: DEFAULT_POLL_INTERVAL,
            },
            logging: LoggingConfig {
                directory: config_directory().join("logs"),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}

impl ConfigFile {
    /// Load configuration from the default path (~/.codeharness/config.ini).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("bind") {
            config.server.bind = v.parse().map_err(|_| ConfigError::InvalidValue {
                section: "server".to_string(),
                key: "bind".to_string(),
                value: v.to_string(),
                reason: "expected a socket address like '127.0.0.1:8712'".to_string(),
            })?;
        }
    }

    if let Some(section) = ini.section(Some("engine")) {
        if let Some(v) = section.get("program") {
            let v = v.trim();
            if v.is_empty() {
                return Err(ConfigError::InvalidValue {
                    section: "engine".to_string(),
                    key: "program".to_string(),
                    value: v.to_string(),
                    reason: "must name an executable".to_string(),
                });
            }
            config.engine.program = v.to_string();
        }
        if let Some(v) = section.get("args") {
            config.engine.args = v.split_whitespace().map(str::to_string).collect();
        }
    }

    if let Some(section) = ini.section(Some("executor")) {
        if let Some(v) = section.get("poll_interval_ms") {
            let ms: u64 = v.parse().map_err(|_| ConfigError::InvalidValue {
                section: "executor".to_string(),
                key: "poll_interval_ms".to_string(),
                value: v.to_string(),
                reason: "expected a positive integer".to_string(),
            })?;
            if ms == 0 || ms > MAX_POLL_INTERVAL_MS {
                return Err(ConfigError::InvalidValue {
                    section: "executor".to_string(),
                    key: "poll_interval_ms".to_string(),
                    value: v.to_string(),
                    reason: format!("must be between 1 and {}", MAX_POLL_INTERVAL_MS),
                });
            }
            config.executor.poll_interval = Duration::from_millis(ms);
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = PathBuf::from(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

/// Get the path to the config directory (~/.codeharness).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".codeharness")
}

/// Get the path to the config file (~/.codeharness/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_str(content: &str) -> Result<ConfigFile, ConfigError> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        ConfigFile::load_from(file.path())
    }

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert_eq!(config.server.bind.port(), 8712);
        assert_eq!(config.engine.program, "sh");
        assert!(config.engine.args.is_empty());
        assert_eq!(config.executor.poll_interval, Duration::from_millis(1));
        assert_eq!(config.logging.file, DEFAULT_LOG_FILE);
    }

    #[test]
    fn test_missing_file_returns_defaults() {
        let config = ConfigFile::load_from(Path::new("/nonexistent/config.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_full_file_overlays_defaults() {
        let config = load_str(
            "[server]\nbind = 0.0.0.0:9000\n\n\
             [engine]\nprogram = Rscript\nargs = --vanilla -\n\n\
             [executor]\npoll_interval_ms = 5\n\n\
             [logging]\ndirectory = /var/log/codeharness\nfile = server.log\n",
        )
        .unwrap();

        assert_eq!(config.server.bind.port(), 9000);
        assert_eq!(config.engine.program, "Rscript");
        assert_eq!(config.engine.args, vec!["--vanilla", "-"]);
        assert_eq!(config.executor.poll_interval, Duration::from_millis(5));
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/codeharness"));
        assert_eq!(config.logging.file, "server.log");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = load_str("[engine]\nprogram = python3\n").unwrap();
        assert_eq!(config.engine.program, "python3");
        assert_eq!(config.server.bind.port(), 8712);
    }

    #[test]
    fn test_invalid_bind_address() {
        let err = load_str("[server]\nbind = not-an-address\n").unwrap_err();
        match err {
            ConfigError::InvalidValue { section, key, .. } => {
                assert_eq!(section, "server");
                assert_eq!(key, "bind");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = load_str("[executor]\npoll_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_oversized_poll_interval_rejected() {
        let err = load_str("[executor]\npoll_interval_ms = 60000\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_empty_engine_program_rejected() {
        let err = load_str("[engine]\nprogram =   \n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
