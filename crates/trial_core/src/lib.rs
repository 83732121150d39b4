//! Core data structures for trial_editor
//!
//! This crate provides the types behind a trial script's frame timeline:
//! - `FrameData` - One narrative beat (dialogue, staged characters, sound, action)
//! - `CharacterInfo`, `PopupInfo`, `FadeInfo`, `MusicFadeInfo` - Frame parts
//! - `Reference` - Link to a stored resource, or a path awaiting resolution
//! - `TrialData` - Ordered frames plus profiles and resource collections
//! - `ResourceResolver` - Find-or-create of music, sounds, places and popups
//! - `PresetLibrary` - Reusable frame templates
//!
//! # Usage
//!
//! ```rust,ignore
//! use trial_core::{InsertPoint, ResourceKind, ResourceResolver, TrialData};
//!
//! let mut data = TrialData::new();
//! let frame_id = data.insert_frame(InsertPoint::End, None)?;
//!
//! let music_id = ResourceResolver::new(&mut data).resolve(ResourceKind::Music, "theme.mp3", "Theme");
//! assert_eq!(music_id, 1);
//! ```

mod frame;
mod preset;
mod profile;
mod reference;
mod resolver;
mod resource;
mod store;

pub use frame::{
    CharacterInfo, Contradiction, FadeInfo, FadePlacement, FadeType, FrameAction, FrameData,
    MusicFadeInfo, MusicTarget, PlaceTransition, PopupInfo, SpeakerRef, StartupMode, SyncMode,
    VisualEffect, Voice, DEFAULT_TEXT_COLOUR, POSITION_NONE,
};
pub use preset::{PresetLibrary, DEFAULT_MAX_PRESETS};
pub use profile::{Profile, Sprite};
pub use reference::Reference;
pub use resolver::{resolve_in, Resolution, ResourceResolver};
pub use resource::{
    default_positions, find_record, MusicRecord, PlaceBackground, PlacePosition, PlaceRecord,
    PopupRecord, ResourceKind, ResourceRecord, SoundRecord,
};
pub use store::{Block, BlockKind, InsertPoint, TrialData};

use thiserror::Error;

pub type FrameId = u32;
pub type ProfileId = u32;
pub type SpriteId = u32;
pub type ResourceId = u32;
pub type PositionId = u32;

/// Errors from trial-data lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrialError {
    #[error("Frame {0} not found")]
    UnknownFrame(FrameId),
    #[error("Frame index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Profile {0} not found")]
    UnknownProfile(ProfileId),
    #[error("Preset {0} not found")]
    UnknownPreset(usize),
}
