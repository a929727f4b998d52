use crate::models::{SettingsRecord, StatsRecord};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Configuration manager for loading and saving YAML records.
///
/// Manages two files in one directory:
/// - Settings (`settings.yaml`): the user's replacement configuration
/// - Stats (`stats.yaml`): accumulated replacement counters
///
/// Both load as defaults when missing; clearing removes the files, which is
/// also the only way the counters reset.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    stats_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager over the given directory, creating it if
    /// needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join("settings.yaml"),
            stats_path: config_dir.join("stats.yaml"),
            config_dir,
        })
    }

    /// Load the settings record, or defaults if the file doesn't exist.
    pub fn load_settings(&self) -> Result<SettingsRecord> {
        if !self.settings_path.exists() {
            tracing::debug!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
            return Ok(SettingsRecord::default());
        }

        let file_contents = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: SettingsRecord = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Save the settings record.
    pub fn save_settings(&self, settings: &SettingsRecord) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Load the stats record, or zeros if the file doesn't exist.
    pub fn load_stats(&self) -> Result<StatsRecord> {
        if !self.stats_path.exists() {
            return Ok(StatsRecord::default());
        }

        let file_contents = fs::read_to_string(&self.stats_path)
            .with_context(|| format!("Failed to read stats: {}", self.stats_path))?;

        let stats: StatsRecord = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse stats: {}", self.stats_path))?;

        Ok(stats)
    }

    /// Save the stats record.
    pub fn save_stats(&self, stats: &StatsRecord) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(stats).context("Failed to serialize stats to YAML")?;

        fs::write(&self.stats_path, yaml_string)
            .with_context(|| format!("Failed to write stats: {}", self.stats_path))?;

        Ok(())
    }

    /// Remove both files. Missing files are not an error.
    pub fn clear(&self) -> Result<()> {
        for path in [&self.settings_path, &self.stats_path] {
            if path.exists() {
                fs::remove_file(path)
                    .with_context(|| format!("Failed to remove {}", path))?;
                tracing::debug!("Removed {}", path);
            }
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
