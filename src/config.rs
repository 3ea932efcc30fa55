use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub cover: CoverConfig,
    pub page: PageConfig,
    pub naming: NamingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoverConfig {
    pub title: String,
    pub flow_title: String,
    pub flow_subtitle: String,
    pub banner: Option<PathBuf>,
    pub title_max_size: u32,
    pub title_min_size: u32,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            title: "Анализ совместимости".to_string(),
            flow_title: "АСТРОЛОГИЧЕСКИЙ РАЗБОР СОВМЕСТИМОСТИ".to_string(),
            flow_subtitle: "Персональные данные скрыты".to_string(),
            banner: Some(PathBuf::from("image.png")),
            title_max_size: 28,
            title_min_size: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageConfig {
    /// Margin on all four sides, in points.
    pub margin: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self { margin: 28.0 }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NamingConfig {
    pub prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: "Совместимость".to_string(),
        }
    }
}

impl Config {
    /// The configuration shipped in `default_config.toml`.
    pub fn compiled_default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file, or return defaults if it is missing or invalid.
    pub fn load(path: &Path) -> Self {
        match Self::load_from_path(path) {
            Ok(Some(config)) => config,
            Ok(None) => Self::compiled_default(),
            Err(e) => {
                tracing::warn!(error = %e, "using default config");
                Self::compiled_default()
            }
        }
    }

    /// Load config from a TOML file; `Ok(None)` when the file does not exist.
    pub fn load_from_path(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(config))
    }
}
