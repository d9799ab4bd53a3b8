use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CleanerError, Result};
use crate::pipeline::processing::validation::MatchStrategy;
use crate::pipeline::storage::parquet_out::OutputCompression;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub validation: ValidationConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root holding `raw/` extracts and the `clean/` artifacts.
    pub data_root: PathBuf,
    pub dictionaries_dir: PathBuf,
    pub registry_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            dictionaries_dir: PathBuf::from("dictionaries"),
            registry_file: PathBuf::from("dictionaries/sirene_sample.csv"),
        }
    }
}

impl PathsConfig {
    pub fn raw_root(&self) -> PathBuf {
        self.data_root.join("raw")
    }

    pub fn clean_root(&self) -> PathBuf {
        self.data_root.join("clean")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Only rows whose normalized country equals this code are checked against the registry.
    pub reference_country: String,
    pub chunk_size: usize,
    pub strategy: MatchStrategy,
    pub parallel: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            reference_country: "FR".to_string(),
            chunk_size: 50,
            strategy: MatchStrategy::Pruned,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub compression: OutputCompression,
}

impl Config {
    /// Load from `path`, or from `config.toml` when no path is given.
    ///
    /// An explicit path must exist; the default path falls back to built-in defaults.
    /// `JOBTECH_*` environment variables override the path settings afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Config::default()
                }
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CleanerError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("JOBTECH_DATA_ROOT") {
            self.paths.data_root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("JOBTECH_DICTIONARIES_DIR") {
            self.paths.dictionaries_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("JOBTECH_REGISTRY_FILE") {
            self.paths.registry_file = PathBuf::from(v);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.validation.chunk_size == 0 {
            return Err(CleanerError::Config(
                "validation.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.validation.reference_country.trim().is_empty() {
            return Err(CleanerError::Config(
                "validation.reference_country must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_config_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[validation]\nstrategy = \"exhaustive\"\nparallel = true").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.validation.strategy, MatchStrategy::Exhaustive);
        assert!(config.validation.parallel);
        assert_eq!(config.validation.chunk_size, 50);
        assert_eq!(config.validation.reference_country, "FR");
        assert_eq!(config.paths.data_root, PathBuf::from("data"));
        assert_eq!(config.output.compression, OutputCompression::Snappy);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let result = Config::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(CleanerError::Config(_))));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut config = Config::default();
        config.validation.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clean_root_is_under_data_root() {
        let paths = PathsConfig {
            data_root: PathBuf::from("/srv/jobtech"),
            ..PathsConfig::default()
        };
        assert_eq!(paths.raw_root(), PathBuf::from("/srv/jobtech/raw"));
        assert_eq!(paths.clean_root(), PathBuf::from("/srv/jobtech/clean"));
    }
}
