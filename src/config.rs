use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for exif-edit.
///
/// Controls how exiftool is invoked and what happens to the edited files.
/// Missing fields take their default values, so a config file only needs to
/// name what it changes.
///
/// # Loading
///
/// ```rust,no_run
/// use exif_edit::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.tool.extra_options = vec!["-P".into()];
/// config.output.save_backup = true;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// How to run exiftool.
    pub tool: ToolConfig,
    /// Output behavior (dry run, backups).
    pub output: OutputConfig,
}

/// exiftool invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    /// Name or path of the exiftool binary.
    pub path: String,
    /// Options placed in front of every write command, one argument each.
    pub extra_options: Vec<String>,
    /// Repair a damaged ExifIFD directory and retry when exiftool reports one.
    pub repair_damaged_directories: bool,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// If `true`, keep exiftool's `_original` copy of every edited file.
    pub save_backup: bool,
    /// If `true`, print the write commands instead of running them.
    pub dry_run: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            path: "exiftool".to_string(),
            extra_options: Vec::new(),
            repair_damaged_directories: true,
        }
    }
}

impl Config {
    /// Resolve the config file path: same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}
