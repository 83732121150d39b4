//! Timeline settings
//!
//! Stored as TOML in the platform config directory:
//! - Windows: %APPDATA%/trial_editor/config/timeline.toml
//! - Linux: ~/.config/trial_editor/timeline.toml
//! - macOS: ~/Library/Application Support/trial_editor/timeline.toml

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use trial_core::{FrameData, DEFAULT_MAX_PRESETS, DEFAULT_TEXT_COLOUR};

/// File name inside the config directory
pub const SETTINGS_FILE: &str = "timeline.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Defaults applied to new blank frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameDefaults {
    pub default_text_colour: String,
    pub default_text_speed: f32,
    pub default_wait_time: u32,
}

impl Default for FrameDefaults {
    fn default() -> Self {
        Self {
            default_text_colour: DEFAULT_TEXT_COLOUR.to_string(),
            default_text_speed: 1.0,
            default_wait_time: 0,
        }
    }
}

/// Behaviour of the screen editors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenSettings {
    /// Selecting a new place clears the characters of the previous frame
    pub erase_previous_on_place_change: bool,
    /// Give characters added in the full editor the first free position
    pub auto_assign_positions: bool,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            erase_previous_on_place_change: true,
            auto_assign_positions: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetSettings {
    pub max_presets: usize,
}

impl Default for PresetSettings {
    fn default() -> Self {
        Self {
            max_presets: DEFAULT_MAX_PRESETS,
        }
    }
}

/// Settings of the frame timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, Resource)]
#[serde(default)]
pub struct TimelineSettings {
    pub frames: FrameDefaults,
    pub screen: ScreenSettings,
    pub presets: PresetSettings,
}

impl TimelineSettings {
    /// Platform location of the settings file
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "trial_editor")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load from `path`, falling back to defaults when the file is missing or broken
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                bevy::log::warn!(
                    "Using default timeline settings, could not load {:?}: {}",
                    path,
                    e
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// A detached blank frame carrying the configured defaults
    pub fn blank_frame(&self) -> FrameData {
        FrameData {
            text_colour: self.frames.default_text_colour.clone(),
            text_speed: self.frames.default_text_speed,
            wait_time: self.frames.default_wait_time,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = TimelineSettings::from_toml(
            r#"
            [frames]
            default_text_colour = "lime"

            [screen]
            auto_assign_positions = false
            "#,
        )
        .unwrap();
        assert_eq!(settings.frames.default_text_colour, "lime");
        assert_eq!(settings.frames.default_text_speed, 1.0);
        assert!(settings.screen.erase_previous_on_place_change);
        assert!(!settings.screen.auto_assign_positions);
        assert_eq!(settings.presets.max_presets, DEFAULT_MAX_PRESETS);
    }

    #[test]
    fn test_invalid_toml() {
        let result = TimelineSettings::from_toml("frames = 3");
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let mut settings = TimelineSettings::default();
        settings.presets.max_presets = 4;
        settings.save(&path).unwrap();

        assert_eq!(TimelineSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = TimelineSettings::load_or_default(&dir.path().join("missing.toml"));
        assert_eq!(settings, TimelineSettings::default());
    }

    #[test]
    fn test_blank_frame_uses_defaults() {
        let mut settings = TimelineSettings::default();
        settings.frames.default_wait_time = 300;
        let frame = settings.blank_frame();
        assert_eq!(frame.id, None);
        assert_eq!(frame.wait_time, 300);
        assert_eq!(frame.text_colour, DEFAULT_TEXT_COLOUR);
    }
}
