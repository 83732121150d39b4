//! Preset frames: reusable frame templates inserted in place of a blank frame

use serde::{Deserialize, Serialize};

use crate::{FrameData, TrialError};

/// Default cap on stored presets
pub const DEFAULT_MAX_PRESETS: usize = 32;

/// Process-wide list of preset frames. Presets never carry an id; one is
/// assigned when a preset is inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
pub struct PresetLibrary {
    presets: Vec<FrameData>,
    max_presets: usize,
}

impl Default for PresetLibrary {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_PRESETS)
    }
}

impl PresetLibrary {
    pub fn with_capacity(max_presets: usize) -> Self {
        Self {
            presets: Vec::new(),
            max_presets,
        }
    }

    /// Store a copy of `frame` as a preset, returning its index.
    ///
    /// When the library is full the oldest preset is dropped.
    pub fn save(&mut self, frame: &FrameData) -> usize {
        if self.max_presets == 0 {
            return 0;
        }
        while self.presets.len() >= self.max_presets {
            self.presets.remove(0);
        }
        self.presets.push(frame.detached());
        self.presets.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&FrameData> {
        self.presets.get(index)
    }

    /// A copy of preset `index`, ready for insertion
    pub fn instantiate(&self, index: usize) -> Result<FrameData, TrialError> {
        self.presets
            .get(index)
            .cloned()
            .ok_or(TrialError::UnknownPreset(index))
    }

    pub fn remove(&mut self, index: usize) -> Result<FrameData, TrialError> {
        if index >= self.presets.len() {
            return Err(TrialError::UnknownPreset(index));
        }
        Ok(self.presets.remove(index))
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Labels for a preset selector
    pub fn labels(&self) -> Vec<String> {
        self.presets
            .iter()
            .enumerate()
            .map(|(i, preset)| {
                let excerpt: String = preset.text_content.chars().take(24).collect();
                if excerpt.is_empty() {
                    format!("Preset {}", i + 1)
                } else {
                    format!("Preset {}: {}", i + 1, excerpt)
                }
            })
            .collect()
    }

    pub fn set_max_presets(&mut self, max_presets: usize) {
        self.max_presets = max_presets;
        if self.presets.len() > max_presets {
            let excess = self.presets.len() - max_presets;
            self.presets.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_clears_id() {
        let mut library = PresetLibrary::default();
        let mut frame = FrameData::new(12);
        frame.text_content = "Take that!".to_string();

        let index = library.save(&frame);
        let preset = library.instantiate(index).unwrap();
        assert_eq!(preset.id, None);
        assert_eq!(preset.text_content, "Take that!");
        assert_eq!(library.labels(), vec!["Preset 1: Take that!".to_string()]);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut library = PresetLibrary::with_capacity(2);
        for text in ["a", "b", "c"] {
            let mut frame = FrameData::new(1);
            frame.text_content = text.to_string();
            library.save(&frame);
        }
        assert_eq!(library.len(), 2);
        assert_eq!(library.get(0).unwrap().text_content, "b");
    }

    #[test]
    fn test_unknown_preset() {
        let library = PresetLibrary::default();
        assert!(matches!(library.instantiate(3), Err(TrialError::UnknownPreset(3))));
    }
}
