//! User settings read from a `settings.toml` file.
//!
//! The file lives in the platform configuration directory
//! (`~/.config/stackview/settings.toml` on Linux) unless a path is given on
//! the command line. Every key is optional:
//!
//! ```toml
//! sample_data_url = "http://localhost:5173/data"
//! window_width = 1280.0
//! window_height = 800.0
//! window_level_sensitivity = 4.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::viewport::DEFAULT_WINDOW_LEVEL_SENSITIVITY;
use crate::error::ConfigError;

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "stackview";

pub const DEFAULT_SAMPLE_DATA_URL: &str = "http://localhost:5173/data";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `manifest.json` and `sample_dicom/`.
    pub sample_data_url: String,
    pub window_width: f32,
    pub window_height: f32,
    pub window_level_sensitivity: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_data_url: DEFAULT_SAMPLE_DATA_URL.to_string(),
            window_width: 1280.0,
            window_height: 800.0,
            window_level_sensitivity: DEFAULT_WINDOW_LEVEL_SENSITIVITY,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

/// Settings from `explicit`, or from the default location when it exists.
/// Problems are logged and answered with defaults.
pub fn load(explicit: Option<&Path>) -> Config {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Config::default(),
        },
    };

    match load_from_path(&path) {
        Ok(config) => {
            log::info!("Loaded settings from {}", path.display());
            config
        }
        Err(err) => {
            log::warn!("{err}; using default settings");
            Config::default()
        }
    }
}

pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
