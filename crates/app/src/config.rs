use anyhow::{Context, Result};
use directories::ProjectDirs;
use scoreday_core::domain::SportsDay;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default = "SportsDay::example")]
    pub sheet: SportsDay,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct UiConfig {
    /// Status indicator colour while a submission is unacknowledged
    pub pending_colour: String,
    /// Status indicator colour once the backend has acknowledged
    pub confirmed_colour: String,
    pub show_help: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct BackendConfig {
    /// Delay before the local backend acknowledges a submission
    pub ack_delay_ms: u64,
    /// Key completion signals by event id instead of completing every
    /// pending form on the page
    pub keyed_completions: bool,
    /// Score store file; defaults to the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            ui: UiConfig::default(),
            backend: BackendConfig::default(),
            sheet: SportsDay::example(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            pending_colour: "yellow".to_string(),
            confirmed_colour: "green".to_string(),
            show_help: true,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            ack_delay_ms: 250,
            keyed_completions: false,
            store_path: None,
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "scoreday").context("Failed to determine project directories")
}

pub fn get_default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("scoreday.toml"))
}

pub fn get_default_store_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("scores.json"))
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p,
            None => get_default_config_path()?,
        };

        if !path.exists() {
            let default_config = Config::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            default_config.save(&path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn from_cli_and_file(cli_args: &CliArgs) -> Result<Self> {
        let mut config = Self::load(cli_args.config.clone())?;

        // CLI args override config file
        if let Some(store) = &cli_args.store {
            config.backend.store_path = Some(store.clone());
        }
        if cli_args.keyed_completions {
            config.backend.keyed_completions = true;
        }

        Ok(config)
    }

    /// Store file to use, falling back to the platform data directory
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.backend.store_path {
            Some(path) => Ok(path.clone()),
            None => get_default_store_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli(config: Option<PathBuf>) -> CliArgs {
        CliArgs {
            config,
            store: None,
            query: None,
            keyed_completions: false,
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.ui.pending_colour, "yellow");
        assert!(!config.backend.keyed_completions);
        assert!(config.backend.store_path.is_none());
        assert!(!config.sheet.rows().is_empty());
    }

    #[test]
    fn test_config_serialization_roundtrip() -> Result<()> {
        let mut config = Config::default();
        config.backend.store_path = Some(PathBuf::from("/data/scores.json"));
        config.backend.ack_delay_ms = 0;

        let toml_str = toml::to_string(&config)?;
        let parsed: Config = toml::from_str(&toml_str)?;

        assert_eq!(config, parsed);
        Ok(())
    }

    #[test]
    fn test_config_load_nonexistent_creates_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("scoreday.toml");

        let config = Config::load(Some(config_path.clone()))?;

        assert_eq!(config, Config::default());
        assert!(config_path.exists());
        Ok(())
    }

    #[test]
    fn test_minimal_file_gets_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("scoreday.toml");
        fs::write(&config_path, "version = 1\n")?;

        let config = Config::load(Some(config_path))?;
        assert_eq!(config.ui, UiConfig::default());
        assert_eq!(config.backend, BackendConfig::default());
        assert_eq!(config.sheet, SportsDay::example());
        Ok(())
    }

    #[test]
    fn test_cli_override() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("scoreday.toml");
        Config::default().save(&config_path)?;

        let mut args = cli(Some(config_path));
        args.store = Some(PathBuf::from("/override/scores.json"));
        args.keyed_completions = true;

        let config = Config::from_cli_and_file(&args)?;
        assert_eq!(config.store_path()?, PathBuf::from("/override/scores.json"));
        assert!(config.backend.keyed_completions);
        Ok(())
    }

    #[test]
    fn test_default_paths() -> Result<()> {
        assert!(get_default_config_path()?.ends_with("scoreday.toml"));
        assert!(get_default_store_path()?.ends_with("scores.json"));
        Ok(())
    }
}
