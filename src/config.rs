use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use chrono::Utc;
use colored::*;
use crate::colors;

/// Keywords shown by `list` when none are given on the command line
const DEFAULT_LIST_KEYWORDS: &[&str] = &["OBJECT", "FILTER", "EXPTIME", "DATE-OBS", "RA", "DEC"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Defaults offered at the prompts
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub expression: String,
    pub extension: String,

    // Behaviour
    pub delete_mode: DeleteMode,
    pub list_keywords: Vec<String>,

    // State tracking
    pub last_run: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeleteMode {
    /// Remove files outright
    #[default]
    Permanent,
    /// Send files to the platform trash
    Trash,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            destination_dir: PathBuf::from("."),
            expression: String::new(),
            extension: crate::DEFAULT_EXTENSION.to_string(),
            delete_mode: DeleteMode::default(),
            list_keywords: DEFAULT_LIST_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            last_run: None,
        }
    }
}

impl Config {
    /// Get the default path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not find home directory")?;
        Ok(home.join(".fitssweep.json"))
    }

    /// Backup copy kept next to the config file
    pub fn backup_path(config_path: &Path) -> PathBuf {
        config_path.with_extension("json.backup")
    }

    /// Load config from disk, or fall back to defaults if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let data = fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        match serde_json::from_str(&data) {
            Ok(config) => Ok(config),
            Err(e) => {
                // Config is corrupted, try backup
                eprintln!("{} Config corrupted, trying backup...", "⚠️".yellow());
                if let Ok(backup) = Self::load_backup(config_path) {
                    eprintln!("{} Restored from backup", "✅".green());
                    return Ok(backup);
                }
                Err(e).context(format!("Failed to parse {}", config_path.display()))
            }
        }
    }

    fn load_backup(config_path: &Path) -> Result<Self> {
        let backup_path = Self::backup_path(config_path);
        if backup_path.exists() {
            let data = fs::read_to_string(&backup_path)
                .context("Failed to read backup file")?;
            serde_json::from_str(&data).context("Failed to parse backup file")
        } else {
            Err(anyhow::anyhow!("No backup file found"))
        }
    }

    /// Save config to disk with backup
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        let backup_path = Self::backup_path(config_path);

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .context("Failed to create config directory")?;
            }
        }

        // Keep the previous version around
        if config_path.exists() {
            fs::copy(config_path, &backup_path)
                .context("Failed to create backup")?;
        }

        // Write to temp file first, then rename over the real one
        let temp_path = config_path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&temp_path, &data)
            .context("Failed to write temp config")?;
        fs::rename(&temp_path, config_path)
            .context("Failed to finalize config")?;

        tracing::debug!(path = %config_path.display(), "config saved");
        Ok(())
    }

    /// Stamp the time of the current run
    pub fn record_run(&mut self) {
        self.last_run = Some(Utc::now().to_rfc3339());
    }

    /// Display current configuration
    pub fn display(&self, config_path: &Path) {
        println!("{}", "🔧 CURRENT CONFIGURATION".bold().color(colors::HEADER));
        println!("{} {}", "File:".dimmed(), config_path.display());
        println!();

        println!("{} Source directory: {}", "•".cyan(), self.source_dir.display().to_string().color(colors::PATH));
        println!("{} Destination directory: {}", "•".cyan(), self.destination_dir.display().to_string().color(colors::PATH));
        println!("{} Expression: {}", "•".cyan(),
            if self.expression.is_empty() { "(none)".dimmed().to_string() } else { self.expression.bold().to_string() });
        println!("{} Extension: .{}", "•".cyan(), self.extension);
        println!("{} Delete mode: {}", "•".cyan(), match self.delete_mode {
            DeleteMode::Permanent => "Permanent",
            DeleteMode::Trash => "Move to trash",
        });
        println!("{} List keywords: {}", "•".cyan(), self.list_keywords.join(", "));

        if let Some(last) = &self.last_run {
            println!("{} Last run: {}", "•".cyan(), last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_from(&tmp.path().join("none.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.extension, "fits");
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cfg.json");

        let mut config = Config::default();
        config.source_dir = PathBuf::from("/data/lights");
        config.expression = "ECC > 0.8".into();
        config.delete_mode = DeleteMode::Trash;
        config.record_run();
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn second_save_keeps_backup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cfg.json");

        let mut config = Config::default();
        config.expression = "first".into();
        config.save_to(&path).unwrap();
        config.expression = "second".into();
        config.save_to(&path).unwrap();

        let backup = fs::read_to_string(Config::backup_path(&path)).unwrap();
        assert!(backup.contains("first"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupted_file_falls_back_to_backup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cfg.json");

        let mut config = Config::default();
        config.expression = "GAIN == 100".into();
        config.save_to(&path).unwrap();
        config.save_to(&path).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.expression, "GAIN == 100");
    }

    #[test]
    fn corrupted_file_without_backup_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cfg.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn unknown_and_missing_keys_use_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cfg.json");
        fs::write(&path, r#"{ "expression": "ECC > 0.5", "extra": 1 }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.expression, "ECC > 0.5");
        assert_eq!(config.extension, "fits");
        assert_eq!(config.delete_mode, DeleteMode::Permanent);
    }
}
