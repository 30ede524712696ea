//! Configuration for the SHAR toolkit.

use crate::model::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the project checkout that holds `datasets/`.
pub const REPO_DIR_ENV: &str = "PROJECT_REPO_DIR";

/// Location of the raw release relative to the project checkout.
pub const DATASET_SUBDIR: &str = "datasets/unimib_shar_activities/raw/data";

/// Main configuration for the toolkit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the raw MAT files; resolved from the environment when unset
    pub dataset_path: Option<PathBuf>,

    /// Directory receiving the three CSV tables
    pub output_dir: PathBuf,

    /// Layer layout used by `shar model`
    pub model: ClassifierConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shar-toolkit");

        Self {
            dataset_path: None,
            output_dir: data_dir.join("converted"),
            model: ClassifierConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shar-toolkit")
            .join("config.json")
    }

    /// Pick the raw dataset directory.
    ///
    /// An explicit path wins, then the configured one. Otherwise the
    /// directory is derived from `$PROJECT_REPO_DIR`, or from three levels
    /// above the working directory when that variable is unset.
    pub fn resolve_dataset_path(&self, explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = explicit.or(self.dataset_path.as_deref()) {
            return Ok(path.to_path_buf());
        }
        let env_dir = std::env::var_os(REPO_DIR_ENV).map(PathBuf::from);
        let cwd = std::env::current_dir().map_err(|e| ConfigError::IoError(e.to_string()))?;
        dataset_dir_from_repo(env_dir, &cwd)
    }
}

/// Derive the dataset directory from an optional repo dir, defaulting to
/// `cwd/../../..`.
pub fn dataset_dir_from_repo(repo_dir: Option<PathBuf>, cwd: &Path) -> Result<PathBuf, ConfigError> {
    let repo_dir = repo_dir.unwrap_or_else(|| cwd.join("..").join("..").join(".."));
    if !repo_dir.is_dir() {
        return Err(ConfigError::BadPath(format!(
            "project repo dir {} does not exist",
            repo_dir.display()
        )));
    }

    let dataset_dir = repo_dir.join(DATASET_SUBDIR);
    if !dataset_dir.is_dir() {
        return Err(ConfigError::BadPath(format!(
            "dataset dir {} does not exist",
            dataset_dir.display()
        )));
    }

    tracing::debug!(path = %dataset_dir.display(), "Resolved dataset dir");
    Ok(dataset_dir)
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    BadPath(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::BadPath(e) => write!(f, "Bad path: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.dataset_path.is_none());
        assert!(config.output_dir.ends_with("converted"));
        assert_eq!(config.model, ClassifierConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.dataset_path = Some(PathBuf::from("/data/shar"));
        config.model.linear_layer_sizes = vec![8, 1];
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"dataset_path": "/data/raw"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.dataset_path, Some(PathBuf::from("/data/raw")));
        assert_eq!(config.model, ClassifierConfig::default());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_explicit_path_wins() {
        let config = Config {
            dataset_path: Some(PathBuf::from("/configured")),
            ..Config::default()
        };
        let resolved = config
            .resolve_dataset_path(Some(Path::new("/explicit")))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("/explicit"));
        assert_eq!(
            config.resolve_dataset_path(None).unwrap(),
            PathBuf::from("/configured")
        );
    }

    #[test]
    fn test_dataset_dir_from_repo() {
        let repo = tempfile::tempdir().unwrap();
        assert!(matches!(
            dataset_dir_from_repo(Some(repo.path().to_path_buf()), repo.path()),
            Err(ConfigError::BadPath(msg)) if msg.contains("dataset dir")
        ));

        std::fs::create_dir_all(repo.path().join(DATASET_SUBDIR)).unwrap();
        let resolved =
            dataset_dir_from_repo(Some(repo.path().to_path_buf()), Path::new("/")).unwrap();
        assert_eq!(resolved, repo.path().join(DATASET_SUBDIR));
    }

    #[test]
    fn test_missing_repo_dir_is_bad_path() {
        let repo = tempfile::tempdir().unwrap();
        let missing = repo.path().join("nope");
        assert!(matches!(
            dataset_dir_from_repo(Some(missing), repo.path()),
            Err(ConfigError::BadPath(msg)) if msg.contains("repo dir")
        ));
    }

    #[test]
    fn test_default_repo_dir_is_three_levels_up() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join(DATASET_SUBDIR)).unwrap();
        let cwd = root.path().join("a").join("b").join("c");
        std::fs::create_dir_all(&cwd).unwrap();

        let resolved = dataset_dir_from_repo(None, &cwd).unwrap();
        assert!(resolved.is_dir());
        assert!(resolved.ends_with(DATASET_SUBDIR));
    }
}
