//! Messages carried by event bindings
//!
//! A binding stores a message instead of a closure; when the host sees the
//! bound event it hands the message back to `FrameTimeline::handle`.

use trial_core::FrameId;

use crate::row::RowCell;

/// Editable field of a populated row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TextContent,
    TextSpeed,
    Speaker,
    SpeakerName,
    SpeakerVoice,
    Hidden,
    MergedToNext,
    WaitTime,
    ActionName,
    ContradictionElement(usize),
    ContradictionDestination(usize),
    /// Preset selector of the insert cell
    PresetChoice,
    /// Block selector of the insert cell
    BlockChoice,
}

/// Something the user did on a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    InsertBlank,
    Delete,
    BeginDrag,
    FieldChanged(Field),
    /// Switch the speaker box between the synced profile name and a custom name
    UseCustomName(bool),
    OpenOverlay(RowCell),
    AddContradiction,
    RemoveContradiction(usize),
}

/// Inline markup inserted by the text toolbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEffect {
    Pause,
    Flash,
    Shake,
}

impl TextEffect {
    pub fn all() -> &'static [TextEffect] {
        &[TextEffect::Pause, TextEffect::Flash, TextEffect::Shake]
    }

    /// Locale key of the toolbox button
    pub fn key(&self) -> &'static str {
        match self {
            TextEffect::Pause => "pause",
            TextEffect::Flash => "flash",
            TextEffect::Shake => "shake",
        }
    }

    pub fn markup(&self) -> &'static str {
        match self {
            TextEffect::Pause => "[#]",
            TextEffect::Flash => "[#fb]",
            TextEffect::Shake => "[#sb]",
        }
    }
}

/// Something the user did inside an open mini-editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayAction {
    InsertTextEffect(TextEffect),
    /// One of the preset colour buttons
    TextColour(String),
    /// The free colour picker changed
    PickedColour,
    /// The place selector changed; the position choices must follow
    PlaceChanged,
    OpenScreenEditor,
    OpenMusicEditor,
}

/// Something the user did inside the open modal editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalAction {
    Place,
    PlacePosition,
    Transition,
    ErasePrevious,
    /// Speaker select of the light frame editor
    TalkingCharacter,
    CharacterSprite(usize),
    CharacterPosition(usize),
    CharacterStartup(usize),
    CharacterSync(usize),
    CharacterMirror(usize),
    CharacterAppears(usize),
    CharacterDisappears(usize),
    RemoveCharacter(usize),
    /// Profile select of the add-character row
    NewCharacter,
    AddCharacter,
    Popup(usize),
    RemovePopup(usize),
    AddPopup,
    FadeType,
    FadeColour,
    FadeDuration,
    FadePlacement,
    AddFade,
    RemoveFade,
    Music,
    MusicFade,
    MusicFadeDuration,
    MusicFadeVolume,
    MusicFadeSamePosition,
    Sound,
}

/// Message bound to a (node, event) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMessage {
    Row { frame: FrameId, action: RowAction },
    Overlay(OverlayAction),
    Modal(ModalAction),
}

impl UiMessage {
    pub fn row(frame: FrameId, action: RowAction) -> Self {
        UiMessage::Row { frame, action }
    }
}
