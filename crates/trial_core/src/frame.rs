//! Frame data: one narrative beat of a trial

use serde::{Deserialize, Serialize};

use crate::{FrameId, PositionId, ProfileId, Reference, SpriteId};

/// Sentinel for a character that has no explicit position (no place set)
pub const POSITION_NONE: Option<PositionId> = None;

/// Default dialogue colour
pub const DEFAULT_TEXT_COLOUR: &str = "white";

/// Who is speaking in a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRef {
    /// Narration, no speaker box
    #[default]
    None,
    /// Speaker shown as "???"
    Unknown,
    /// A cast member
    Profile(ProfileId),
}

/// Voice blips played while text scrolls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Voice {
    /// Voice chosen from the speaker's profile
    #[default]
    Auto,
    None,
    Male,
    Female,
    Typewriter,
}

impl Voice {
    pub fn display_name(&self) -> &'static str {
        match self {
            Voice::Auto => "Auto",
            Voice::None => "None",
            Voice::Male => "Male",
            Voice::Female => "Female",
            Voice::Typewriter => "Typewriter",
        }
    }

    pub fn all() -> &'static [Voice] {
        &[Voice::Auto, Voice::None, Voice::Male, Voice::Female, Voice::Typewriter]
    }
}

/// How the camera moves to a new place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaceTransition {
    #[default]
    None,
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl PlaceTransition {
    pub fn display_name(&self) -> &'static str {
        match self {
            PlaceTransition::None => "None",
            PlaceTransition::Linear => "Linear",
            PlaceTransition::EaseIn => "Ease in",
            PlaceTransition::EaseOut => "Ease out",
            PlaceTransition::EaseInOut => "Ease in-out",
        }
    }

    pub fn all() -> &'static [PlaceTransition] {
        &[
            PlaceTransition::None,
            PlaceTransition::Linear,
            PlaceTransition::EaseIn,
            PlaceTransition::EaseOut,
            PlaceTransition::EaseInOut,
        ]
    }
}

/// Whether the sprite's startup animation plays when the character appears
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StartupMode {
    /// Go straight to the talking/still animation
    #[default]
    Skip,
    /// Play the startup animation, then continue with the text
    PlayThenTalk,
    /// Play the startup animation before any text is shown
    PlayBeforeText,
}

impl StartupMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            StartupMode::Skip => "Skip",
            StartupMode::PlayThenTalk => "Play, then talk",
            StartupMode::PlayBeforeText => "Play before text",
        }
    }

    pub fn all() -> &'static [StartupMode] {
        &[StartupMode::Skip, StartupMode::PlayThenTalk, StartupMode::PlayBeforeText]
    }
}

/// Lip-sync behaviour of a character's sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Talk when the character is the speaker
    #[default]
    Auto,
    /// Always talk while text scrolls
    Sync,
    /// Never talk
    Still,
    /// Talk even after the text has finished
    Talk,
}

impl SyncMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            SyncMode::Auto => "Auto",
            SyncMode::Sync => "Sync with text",
            SyncMode::Still => "Still",
            SyncMode::Talk => "Talking",
        }
    }

    pub fn all() -> &'static [SyncMode] {
        &[SyncMode::Auto, SyncMode::Sync, SyncMode::Still, SyncMode::Talk]
    }
}

/// Effect applied when a character enters or leaves the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisualEffect {
    #[default]
    Auto,
    None,
    Fade,
    SlideLeft,
    SlideRight,
}

impl VisualEffect {
    pub fn display_name(&self) -> &'static str {
        match self {
            VisualEffect::Auto => "Auto",
            VisualEffect::None => "None",
            VisualEffect::Fade => "Fade",
            VisualEffect::SlideLeft => "Slide left",
            VisualEffect::SlideRight => "Slide right",
        }
    }

    pub fn all() -> &'static [VisualEffect] {
        &[
            VisualEffect::Auto,
            VisualEffect::None,
            VisualEffect::Fade,
            VisualEffect::SlideLeft,
            VisualEffect::SlideRight,
        ]
    }
}

/// Colour fade over the whole screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FadeType {
    #[default]
    FadeIn,
    FadeOut,
}

impl FadeType {
    pub fn display_name(&self) -> &'static str {
        match self {
            FadeType::FadeIn => "Fade in",
            FadeType::FadeOut => "Fade out",
        }
    }

    pub fn all() -> &'static [FadeType] {
        &[FadeType::FadeIn, FadeType::FadeOut]
    }
}

/// Which layers a fade covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FadePlacement {
    Background,
    Characters,
    #[default]
    Everything,
}

impl FadePlacement {
    pub fn display_name(&self) -> &'static str {
        match self {
            FadePlacement::Background => "Background",
            FadePlacement::Characters => "Characters",
            FadePlacement::Everything => "Everything",
        }
    }

    pub fn all() -> &'static [FadePlacement] {
        &[FadePlacement::Background, FadePlacement::Characters, FadePlacement::Everything]
    }
}

/// A character staged in a frame. Owned by its frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterInfo {
    pub profile_id: ProfileId,
    pub sprite_id: Option<SpriteId>,
    /// Unique among a frame's characters when a place is set
    pub position: Option<PositionId>,
    #[serde(default)]
    pub startup_mode: StartupMode,
    #[serde(default)]
    pub sync_mode: SyncMode,
    #[serde(default)]
    pub mirror_effect: bool,
    #[serde(default)]
    pub visual_effect_appears: VisualEffect,
    #[serde(default)]
    pub visual_effect_disappears: VisualEffect,
}

impl CharacterInfo {
    pub fn new(profile_id: ProfileId) -> Self {
        Self {
            profile_id,
            sprite_id: None,
            position: POSITION_NONE,
            startup_mode: StartupMode::Skip,
            sync_mode: SyncMode::Auto,
            mirror_effect: false,
            visual_effect_appears: VisualEffect::Auto,
            visual_effect_disappears: VisualEffect::Auto,
        }
    }

    pub fn with_sprite(mut self, sprite_id: SpriteId) -> Self {
        self.sprite_id = Some(sprite_id);
        self
    }

    pub fn at(mut self, position: PositionId) -> Self {
        self.position = Some(position);
        self
    }
}

/// A popup shown over the stage; list order is stacking order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PopupInfo {
    pub popup: Reference,
}

impl PopupInfo {
    pub fn new(popup: Reference) -> Self {
        Self { popup }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FadeInfo {
    pub fade_type: FadeType,
    pub fade_colour: String,
    /// Milliseconds
    pub fade_duration: u32,
    pub fade_placement: FadePlacement,
}

impl Default for FadeInfo {
    fn default() -> Self {
        Self {
            fade_type: FadeType::FadeIn,
            fade_colour: "black".to_string(),
            fade_duration: 500,
            fade_placement: FadePlacement::Everything,
        }
    }
}

/// Music change requested by a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MusicTarget {
    /// Keep whatever is playing
    #[default]
    Unchanged,
    Stop,
    Play(Reference),
}

impl MusicTarget {
    pub fn is_stop(&self) -> bool {
        matches!(self, MusicTarget::Stop)
    }
}

/// Crossfade settings; `to_volume` and `same_position` are ignored when stopping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicFadeInfo {
    /// Milliseconds
    pub duration: u32,
    /// Percent, 0-100
    pub to_volume: u8,
    pub same_position: bool,
}

impl Default for MusicFadeInfo {
    fn default() -> Self {
        Self {
            duration: 1000,
            to_volume: 100,
            same_position: false,
        }
    }
}

/// A simple action run when the frame ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FrameAction {
    pub name: String,
    /// Action parameters, shape depends on the action
    #[serde(default)]
    pub context: serde_json::Value,
}

impl FrameAction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: serde_json::Value::Null,
        }
    }
}

/// A contradiction option on a cross-examination statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Contradiction {
    /// Evidence or profile presented, as "evidence:<id>" / "profile:<id>"
    pub element: String,
    /// Frame to jump to when presented
    pub destination: Option<FrameId>,
}

/// One narrative beat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameData {
    /// Assigned at insertion; `None` for presets and detached snapshots
    pub id: Option<FrameId>,

    // Dialogue
    pub text_content: String,
    pub text_colour: String,
    pub text_speed: f32,
    pub speaker: SpeakerRef,
    /// Override name shown instead of the profile's name
    pub speaker_name: String,
    pub speaker_use_name: bool,
    pub speaker_voice: Voice,

    // Flow
    pub hidden: bool,
    /// Milliseconds; forced to 0 while merged
    pub wait_time: u32,
    pub merged_to_next: bool,

    // Screen
    pub place: Reference,
    pub place_position: Option<PositionId>,
    pub place_transition: PlaceTransition,
    pub characters_erase_previous: bool,
    pub characters: Vec<CharacterInfo>,
    pub popups: Vec<PopupInfo>,
    pub fade: Option<FadeInfo>,

    // Sound
    pub music: MusicTarget,
    pub music_fade: Option<MusicFadeInfo>,
    pub sound: Reference,

    // Action
    pub action: Option<FrameAction>,
    #[serde(default)]
    pub contradictions: Vec<Contradiction>,
}

impl Default for FrameData {
    fn default() -> Self {
        Self {
            id: None,
            text_content: String::new(),
            text_colour: DEFAULT_TEXT_COLOUR.to_string(),
            text_speed: 1.0,
            speaker: SpeakerRef::None,
            speaker_name: String::new(),
            speaker_use_name: false,
            speaker_voice: Voice::Auto,
            hidden: false,
            wait_time: 0,
            merged_to_next: false,
            place: Reference::Unset,
            place_position: None,
            place_transition: PlaceTransition::None,
            characters_erase_previous: false,
            characters: Vec::new(),
            popups: Vec::new(),
            fade: None,
            music: MusicTarget::Unchanged,
            music_fade: None,
            sound: Reference::Unset,
            action: None,
            contradictions: Vec::new(),
        }
    }
}

impl FrameData {
    /// Blank frame with the given id
    pub fn new(id: FrameId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    /// Copy with the id cleared (preset or drag snapshot)
    pub fn detached(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    /// Merge with the next frame. Merging forces the wait timer to zero;
    /// unmerging leaves it alone.
    pub fn set_merged_to_next(&mut self, merged: bool) {
        self.merged_to_next = merged;
        if merged {
            self.wait_time = 0;
        }
    }

    /// Set the wait timer; ignored while merged
    pub fn set_wait_time(&mut self, wait_time: u32) -> bool {
        if self.merged_to_next {
            return false;
        }
        self.wait_time = wait_time;
        true
    }

    pub fn has_place(&self) -> bool {
        self.place.is_set()
    }

    pub fn character(&self, profile_id: ProfileId) -> Option<&CharacterInfo> {
        self.characters.iter().find(|c| c.profile_id == profile_id)
    }

    pub fn character_mut(&mut self, profile_id: ProfileId) -> Option<&mut CharacterInfo> {
        self.characters.iter_mut().find(|c| c.profile_id == profile_id)
    }

    /// Whether any reference still waits for resolution
    pub fn has_pending_references(&self) -> bool {
        self.place.is_pending()
            || self.sound.is_pending()
            || matches!(&self.music, MusicTarget::Play(r) if r.is_pending())
            || self.popups.iter().any(|p| p.popup.is_pending())
    }
}
