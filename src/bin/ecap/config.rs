//! CLI-facing configuration: persisted user defaults for `bits_per_channel`,
//! the PNG decode pixel ceiling, and the preferred scrypt `log_n`. Read by
//! the CLI binary only — the library facade never touches the filesystem
//! or environment.

use dirs::config_dir;
use ecap_core::{backends::png, kdf};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const CONFIG_ENV: &str = "ECAP_CONFIG";
const APP_DIR: &str = "ecap";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug)]
pub enum ConfigError {
    ConfigDirUnavailable,
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ConfigDirUnavailable => {
                write!(f, "unable to determine configuration directory")
            }
            ConfigError::Io(err) => write!(f, "filesystem error: {err}"),
            ConfigError::Parse(err) => write!(f, "failed to parse config: {err}"),
            ConfigError::Serialize(err) => write!(f, "failed to serialize config: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Serialize(err) => Some(err),
            ConfigError::ConfigDirUnavailable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub bits_per_channel: u8,
    pub png_pixel_ceiling: u64,
    pub preferred_log_n: u8,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            bits_per_channel: 1,
            png_pixel_ceiling: png::DEFAULT_MAX_PIXELS,
            preferred_log_n: kdf::PREFERRED_LOG_N,
        }
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let mut dir = config_dir().ok_or(ConfigError::ConfigDirUnavailable)?;
    dir.push(APP_DIR);
    fs::create_dir_all(&dir).map_err(ConfigError::Io)?;
    dir.push(CONFIG_FILE_NAME);
    Ok(dir)
}

/// Loads persisted defaults, falling back to [`Defaults::default`] when no
/// config file exists yet.
pub fn load_defaults() -> Result<Defaults, ConfigError> {
    let path = config_path()?;
    match fs::read_to_string(&path) {
        Ok(contents) => toml::from_str(&contents).map_err(ConfigError::Parse),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Defaults::default()),
        Err(err) => Err(ConfigError::Io(err)),
    }
}

pub fn save_defaults(defaults: &Defaults) -> Result<(), ConfigError> {
    let path = config_path()?;
    let parent = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    if !parent.exists() {
        fs::create_dir_all(&parent).map_err(ConfigError::Io)?;
    }

    let toml = toml::to_string_pretty(defaults).map_err(ConfigError::Serialize)?;
    let mut temp = NamedTempFile::new_in(&parent).map_err(ConfigError::Io)?;
    temp.write_all(toml.as_bytes()).map_err(ConfigError::Io)?;
    temp.flush().map_err(ConfigError::Io)?;
    temp.persist(&path).map_err(|err| ConfigError::Io(err.error))?;
    Ok(())
}
