//! trial_editor - Frame timeline editor for trial scripts
//!
//! This crate provides the row-level editing surface of a trial's frame list:
//! - Lazily populated frame rows with per-cell invalidation
//! - Mini-editors that take over a row cell while hovered or focused
//! - Modal screen composition and music editors with confirm/cancel
//! - Drag-and-drop reordering of frames
//! - Frame presets and scene/cross-examination block insertion
//!
//! The host UI is abstracted behind the traits in [`surface`]. Event bindings
//! carry [`UiMessage`] values which the host hands back to
//! [`FrameTimeline::handle`]. [`host`] is the egui implementation that
//! [`FrameEditorPlugin`] runs every frame.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bevy::prelude::*;
//! use trial_editor::FrameEditorPlugin;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(FrameEditorPlugin::default())
//!         .run();
//! }
//! ```

pub mod drag;
pub mod host;
pub mod messages;
pub mod modal;
pub mod overlay;
pub mod preview;
pub mod row;
pub mod settings;
pub mod surface;
pub mod timeline;

#[cfg(test)]
mod testing;

pub use trial_core;

pub use drag::{DragController, DropOutcome};
pub use host::{Locale, TimelineHost};
pub use messages::{Field, ModalAction, OverlayAction, RowAction, TextEffect, UiMessage};
pub use modal::{
    CharacterEditorMode, ModalSession, MusicEditorSession, ScreenCompositionEditor,
    ScreenEditorSession,
};
pub use overlay::{CloseResult, HostEdit, MiniEditor, OverlayManager};
pub use row::{FrameRowView, PopulationState, RowBehaviour, RowCell};
pub use settings::{SettingsError, TimelineSettings};
pub use surface::UiServices;
pub use timeline::{FrameTimeline, TimelineOutcome};

use bevy::prelude::*;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};
use std::path::PathBuf;
use thiserror::Error;
use trial_core::{FrameId, PresetLibrary, TrialData, TrialError};

/// Errors raised while editing the timeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Trial(#[from] TrialError),
    #[error("No modal editor is open")]
    NoActiveSession,
    #[error("No row for frame {0}")]
    RowNotFound(FrameId),
}

/// Everything a timeline operation may read or write
pub struct EditorContext<'a> {
    pub data: &'a mut TrialData,
    pub presets: &'a mut PresetLibrary,
    pub settings: &'a TimelineSettings,
    pub ui: UiServices<'a>,
}

/// Registers the trial data, preset library and timeline settings, and the
/// egui host drawing the timeline.
///
/// egui itself is only added to apps that open windows.
#[derive(Default)]
pub struct FrameEditorPlugin {
    /// Settings file; defaults to the per-user config directory
    pub settings_path: Option<PathBuf>,
    /// TOML table of locale key to display text; keys show as-is without it
    pub locale_path: Option<PathBuf>,
}

impl FrameEditorPlugin {
    pub fn with_settings(path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_locale(mut self, path: impl Into<PathBuf>) -> Self {
        self.locale_path = Some(path.into());
        self
    }
}

impl Plugin for FrameEditorPlugin {
    fn build(&self, app: &mut App) {
        let path = self
            .settings_path
            .clone()
            .or_else(TimelineSettings::default_path);
        let settings = match &path {
            Some(path) => TimelineSettings::load_or_default(path),
            None => TimelineSettings::default(),
        };

        info!("FrameEditorPlugin: settings from {:?}", path);

        let locale = self
            .locale_path
            .as_deref()
            .map(Locale::load_or_default)
            .unwrap_or_default();

        if app.is_plugin_added::<bevy::window::WindowPlugin>() && !app.is_plugin_added::<EguiPlugin>() {
            app.add_plugins(EguiPlugin::default());
        }

        app.insert_resource(PresetLibrary::with_capacity(settings.presets.max_presets))
            .insert_resource(settings)
            .init_resource::<TrialData>()
            .insert_non_send_resource(TimelineHost::new(locale))
            .add_systems(EguiPrimaryContextPass, host::draw_frame_timeline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_registers_resources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.toml");
        std::fs::write(&path, "[presets]\nmax_presets = 4\n").unwrap();

        let mut app = App::new();
        app.add_plugins(FrameEditorPlugin::with_settings(&path));

        let world = app.world();
        assert_eq!(world.resource::<TimelineSettings>().presets.max_presets, 4);
        assert!(world.resource::<PresetLibrary>().is_empty());
        assert!(world.resource::<TrialData>().frames.is_empty());
        let host = world.get_non_send_resource::<TimelineHost>().unwrap();
        assert!(host.timeline().rows().is_empty());
    }

    #[test]
    fn test_plugin_loads_locale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en.toml");
        std::fs::write(&path, "delete_frame = \"Delete\"\n").unwrap();

        let mut app = App::new();
        app.add_plugins(
            FrameEditorPlugin::with_settings(dir.path().join("absent.toml")).with_locale(&path),
        );
        // No window, no egui
        assert!(!app.is_plugin_added::<EguiPlugin>());
        let host = app.world().get_non_send_resource::<TimelineHost>().unwrap();
        assert_eq!(host.locale().text("delete_frame"), "Delete");
    }

    #[test]
    fn test_plugin_missing_settings_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new();
        app.add_plugins(FrameEditorPlugin::with_settings(dir.path().join("absent.toml")));

        assert_eq!(
            *app.world().resource::<TimelineSettings>(),
            TimelineSettings::default()
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(EditorError::RowNotFound(4).to_string(), "No row for frame 4");
        let err: EditorError = TrialError::UnknownFrame(9).into();
        assert_eq!(err.to_string(), TrialError::UnknownFrame(9).to_string());
    }
}
