//! Configuration resolution.
//!
//! Each setting is taken from, in order: the command line or its environment
//! variable (both handled by clap), the TOML config file, then a built-in
//! default.
use directories::ProjectDirs;
use gametracker_dto::rawg::RAWG_API_BASE_URL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("could not determine a data directory; pass --data-dir")]
    NoDataDir,

    #[error("invalid RAWG base url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// The `[rawg]` table of the config file.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawgSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Contents of the config file. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub rawg: RawgSection,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub rawg_api_key: Option<String>,
}

/// The resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub rawg_api_key: Option<String>,
    pub rawg_base_url: Url,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "gametracker")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

pub fn default_data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

impl Config {
    /// Reads the config file (an explicit one must exist, the default one
    /// may be absent) and merges it under `overrides`.
    pub fn resolve(overrides: Overrides) -> Result<Self, ConfigError> {
        let file = match overrides.config.clone() {
            Some(path) => FileConfig::load(&path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => FileConfig::load(&path)?,
                _ => FileConfig::default(),
            },
        };
        Self::merge(overrides, file, default_data_dir())
    }

    fn merge(
        overrides: Overrides,
        file: FileConfig,
        default_data_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let data_dir = overrides
            .data_dir
            .or(file.data_dir)
            .or(default_data_dir)
            .ok_or(ConfigError::NoDataDir)?;
        let rawg_api_key = overrides
            .rawg_api_key
            .or(file.rawg.api_key)
            .filter(|key| !key.trim().is_empty());
        let rawg_base_url = Url::parse(file.rawg.base_url.as_deref().unwrap_or(RAWG_API_BASE_URL))?;

        let config = Self {
            data_dir,
            rawg_api_key,
            rawg_base_url,
        };
        debug!(
            data_dir = %config.data_dir.display(),
            rawg = config.rawg_api_key.is_some(),
            "Configuration resolved"
        );
        Ok(config)
    }
}
