use orgmode_syntax::{ParserConfig, Tree};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {field} in {config_path}: must be at least 1")]
    InvalidValue {
        config_path: PathBuf,
        field: &'static str,
    },
}

/// On-disk settings, stored as TOML:
///
/// ```toml
/// [parser]
/// max_depth = 32
/// todo_keywords = ["TODO", "NEXT"]
/// done_keywords = ["DONE"]
/// ```
///
/// Missing keys fall back to [`ParserConfig::default`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parser: ParserConfig,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            log::debug!("no config at {}, using defaults", config_path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        config.validate(config_path)?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/orgmode-syntax");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Read and parse an Org file with these settings. `~` and environment
    /// variables in the path are expanded.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<Tree> {
        let path = path.as_ref();
        let path = Self::expand_path(path).unwrap_or_else(|| path.to_path_buf());
        let text = std::fs::read_to_string(&path)?;
        Ok(orgmode_syntax::parse_with_config(&text, &self.parser))
    }

    fn validate(&self, config_path: &Path) -> Result<(), ConfigError> {
        let checks = [
            ("parser.max_depth", self.parser.max_depth),
            ("parser.tab_width", self.parser.tab_width),
            ("parser.checkpoint_interval", self.parser.checkpoint_interval),
        ];
        match checks.iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(ConfigError::InvalidValue {
                config_path: config_path.to_path_buf(),
                field,
            }),
            None => Ok(()),
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgmode_syntax::SyntaxKind;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/orgmode-syntax/config.toml"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            parser: ParserConfig {
                max_depth: 12,
                todo_keywords: vec!["TODO".into(), "NEXT".into()],
                ..ParserConfig::default()
            },
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[parser]\nmax_depth = 5\n").unwrap();
        assert_eq!(config.parser.max_depth, 5);
        assert_eq!(config.parser.todo_keywords, vec!["TODO".to_string()]);

        let empty: Config = toml::from_str("").unwrap();
        assert_eq!(empty, Config::default());
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("ORG_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$ORG_TEST_VAR/notes.org");
        let expanded = Config::expand_path(&path);
        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/notes.org")));

        unsafe {
            env::remove_var("ORG_TEST_VAR");
        }
    }

    #[test]
    fn test_load_nonexistent_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&config_path).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested/config.toml");

        let config = Config {
            parser: ParserConfig {
                done_keywords: vec!["DONE".into(), "CANCELLED".into()],
                ..ParserConfig::default()
            },
        };
        config.save_to_path(&config_path).unwrap();

        let loaded = Config::load_from_path(&config_path).unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&config_path, "parser = [not valid").unwrap();

        let error = Config::load_from_path(&config_path).unwrap_err();
        assert!(matches!(error, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[parser]\nmax_depth = 0\n").unwrap();

        let error = Config::load_from_path(&config_path).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::InvalidValue {
                field: "parser.max_depth",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_file_uses_configured_keywords() {
        let temp_dir = TempDir::new().unwrap();
        let org_path = temp_dir.path().join("tasks.org");
        std::fs::write(&org_path, "* NEXT Call back\n").unwrap();

        let config = Config {
            parser: ParserConfig {
                todo_keywords: vec!["NEXT".into()],
                ..ParserConfig::default()
            },
        };
        let tree = config.parse_file(&org_path).unwrap();
        assert!(
            tree.root_node()
                .descendants_with_tokens()
                .any(|e| e.kind() == SyntaxKind::TODO_KEYWORD)
        );
    }
}
