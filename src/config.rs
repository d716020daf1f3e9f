use crate::errors::{EtlError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Used when no `--config` is given and this file exists.
pub const DEFAULT_CONFIG_PATH: &str = "config/etl.toml";

const ENV_DB_PATH: &str = "LISTINGS_ETL_DB_PATH";
const ENV_RAW_DIR: &str = "LISTINGS_ETL_RAW_DIR";

/// One configured data source and the centroid used when its file has no coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub default_latitude: f64,
    pub default_longitude: f64,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, default_latitude: f64, default_longitude: f64) -> Self {
        Self {
            name: name.into(),
            default_latitude,
            default_longitude,
        }
    }
}

/// Process-wide settings. Built once in `main` and passed down by reference.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub write_processed: bool,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub sources: Vec<SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            write_processed: false,
            db_path: PathBuf::from("db/airbnb.db"),
            log_dir: PathBuf::from("logs"),
            sources: vec![
                SourceConfig::new("cape_town", -33.9249, 18.4241),
                SourceConfig::new("johannesburg", -26.2041, 28.0473),
            ],
        }
    }
}

impl Config {
    /// Reads `path` if given, else the default config file if present, else
    /// built-in defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };

        if let Ok(db_path) = std::env::var(ENV_DB_PATH) {
            config.db_path = PathBuf::from(db_path);
        }
        if let Ok(raw_dir) = std::env::var(ENV_RAW_DIR) {
            config.raw_dir = PathBuf::from(raw_dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(EtlError::Config("no sources configured".into()));
        }
        for (i, s) in self.sources.iter().enumerate() {
            if s.name.trim().is_empty() {
                return Err(EtlError::Config(format!("source #{i} has an empty name")));
            }
            if self.sources[..i].iter().any(|o| o.name == s.name) {
                return Err(EtlError::Config(format!("source '{}' listed twice", s.name)));
            }
            if !(-90.0..=90.0).contains(&s.default_latitude)
                || !(-180.0..=180.0).contains(&s.default_longitude)
            {
                return Err(EtlError::Config(format!(
                    "source '{}' has an out-of-range default coordinate",
                    s.name
                )));
            }
        }
        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name.clone()).collect()
    }

    /// Raw CSV for a source: `<raw_dir>/<source>_listings.csv`.
    pub fn raw_path(&self, source_id: &str) -> PathBuf {
        self.raw_dir.join(format!("{source_id}_listings.csv"))
    }

    pub fn processed_path(&self, source_id: &str) -> PathBuf {
        self.processed_dir.join(format!("{source_id}_listings.json"))
    }
}
