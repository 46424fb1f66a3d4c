use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants;
use crate::error::{ConvertError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub tri: TriConfig,
    pub npl: NplConfig,
    pub geocoder: GeocoderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    /// Where conversion anomalies are written; nothing is written when unset.
    pub anomaly_log: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriConfig {
    pub default_year: i32,
    /// Add off-site transfers to the reported release total
    pub include_off_site: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NplConfig {
    pub feature_service_url: String,
    pub min_sites: usize,
    pub max_sites: usize,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub limit: u32,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(constants::DEFAULT_DATA_DIR),
            logs_dir: PathBuf::from(constants::DEFAULT_LOGS_DIR),
            anomaly_log: None,
        }
    }
}

impl Default for TriConfig {
    fn default() -> Self {
        Self {
            default_year: constants::DEFAULT_TRI_YEAR,
            include_off_site: true,
        }
    }
}

impl Default for NplConfig {
    fn default() -> Self {
        Self {
            feature_service_url: constants::NPL_FEATURE_SERVICE_URL.to_string(),
            min_sites: 300,
            max_sites: 600,
            timeout_seconds: 60,
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: constants::NOMINATIM_SEARCH_URL.to_string(),
            user_agent: concat!("pollution_near_me/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: 10,
            limit: 1,
        }
    }
}

impl Config {
    /// Loads `pollution.toml` (or the file named by `PNM_CONFIG`), falling back to defaults when the
    /// default file is absent. `PNM_DATA_DIR` overrides the data directory.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var(constants::CONFIG_ENV).ok();
        let config_path = explicit
            .clone()
            .unwrap_or_else(|| constants::DEFAULT_CONFIG_FILE.to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(Path::new(&config_path))?
        } else if explicit.is_some() {
            return Err(ConvertError::Config(format!(
                "Config file '{}' named by {} does not exist",
                config_path,
                constants::CONFIG_ENV
            )));
        } else {
            debug!("No config file at {}, using defaults", config_path);
            Self::default()
        };

        if let Ok(dir) = std::env::var(constants::DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.paths.data_dir = PathBuf::from(dir);
            }
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            ConvertError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Default output path for a dataset file under the data directory.
    pub fn data_path(&self, file_name: &str) -> PathBuf {
        self.paths.data_dir.join(file_name)
    }
}
