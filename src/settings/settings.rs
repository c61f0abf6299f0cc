// Settings management and persistence
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PlayerError, Result};

/// Overrides the settings directory, mostly for tests and portable installs
pub const CONFIG_DIR_ENV: &str = "VAPORPLAY_CONFIG_DIR";

/// Playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub default_speed_index: usize, // 0-3, see SPEED_OPTIONS
    pub volume: f32,                // 0.0-1.0
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            default_speed_index: 2,
            volume: 1.0,
        }
    }
}

/// Interface settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceSettings {
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for InterfaceSettings {
    fn default() -> Self {
        Self {
            window_width: 420.0,
            window_height: 300.0,
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub version: i32, // Settings schema version for future migrations
    pub playback: PlaybackSettings,
    pub interface: InterfaceSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: 1,
            playback: PlaybackSettings::default(),
            interface: InterfaceSettings::default(),
        }
    }
}

/// Directory holding settings.json
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .map(|dir| dir.join("vaporplay"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl AppSettings {
    /// Get the settings file path
    pub fn get_settings_path(app_dir: &Path) -> PathBuf {
        app_dir.join("settings.json")
    }

    /// Load settings from file, or return defaults if file doesn't exist
    pub fn load(app_dir: &Path) -> Result<Self> {
        let path = Self::get_settings_path(app_dir);

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| PlayerError::Settings(format!("failed to read settings file: {}", e)))?;

        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| PlayerError::Settings(format!("failed to parse settings: {}", e)))?;

        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self, app_dir: &Path) -> Result<()> {
        fs::create_dir_all(app_dir).map_err(|e| {
            PlayerError::Settings(format!("failed to create settings directory: {}", e))
        })?;

        let path = Self::get_settings_path(app_dir);
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PlayerError::Settings(format!("failed to serialize settings: {}", e)))?;

        fs::write(&path, content)
            .map_err(|e| PlayerError::Settings(format!("failed to write settings file: {}", e)))?;

        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings::load(dir.path()).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.playback.default_speed_index, 2);
    }

    #[test]
    fn save_then_load_keeps_changes() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");

        let mut settings = AppSettings::default();
        settings.playback.default_speed_index = 0;
        settings.playback.volume = 0.5;
        settings.save(&nested).unwrap();

        assert_eq!(AppSettings::load(&nested).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            AppSettings::get_settings_path(dir.path()),
            r#"{ "playback": { "volume": 0.25 } }"#,
        )
        .unwrap();

        let settings = AppSettings::load(dir.path()).unwrap();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.playback.volume, 0.25);
        assert_eq!(settings.playback.default_speed_index, 2);
        assert_eq!(settings.interface, InterfaceSettings::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(AppSettings::get_settings_path(dir.path()), "{ not json").unwrap();

        let err = AppSettings::load(dir.path()).unwrap_err();
        assert!(matches!(err, PlayerError::Settings(_)));
    }
}
