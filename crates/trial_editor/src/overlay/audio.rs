//! Music track and sound mini-editors

use bevy::log::info;
use trial_core::{
    FrameData, FrameId, MusicTarget, Reference, ResourceKind, ResourceRecord, ResourceResolver,
    TrialData,
};

use super::{MiniEditor, OverlayBindings};
use crate::messages::{OverlayAction, UiMessage};
use crate::surface::{FormKind, FormOptions, FormValue, FormWidget, NodeId, UiEvent, UiServices};

/// Choice value standing for "stop the music"
pub const STOP_MUSIC: &str = "stop";

/// Which frame field the mini-editor edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSlot {
    Music,
    Sound,
}

impl AudioSlot {
    fn kind(&self) -> ResourceKind {
        match self {
            AudioSlot::Music => ResourceKind::Music,
            AudioSlot::Sound => ResourceKind::Sound,
        }
    }
}

pub(crate) fn record_choices<R: ResourceRecord>(records: &[R]) -> impl Iterator<Item = (String, String)> + '_ {
    records
        .iter()
        .skip(1)
        .map(|r| (r.id().to_string(), r.name().to_string()))
}

/// Choices of a music selector: unchanged, stop, then every stored track
pub(crate) fn music_choices(data: &TrialData) -> Vec<(String, String)> {
    let mut choices = vec![
        (String::new(), "Unchanged".to_string()),
        (STOP_MUSIC.to_string(), "Stop".to_string()),
    ];
    choices.extend(record_choices(&data.music));
    choices
}

pub(crate) fn sound_choices(data: &TrialData) -> Vec<(String, String)> {
    let mut choices = vec![(String::new(), "None".to_string())];
    choices.extend(record_choices(&data.sounds));
    choices
}

pub(crate) fn music_form_value(music: &MusicTarget) -> String {
    match music {
        MusicTarget::Unchanged => String::new(),
        MusicTarget::Stop => STOP_MUSIC.to_string(),
        MusicTarget::Play(reference) => reference.form_value(),
    }
}

/// Music target entered in a selector; a typed path stays pending
pub(crate) fn parse_music(value: &str, title: &str) -> MusicTarget {
    match value.trim() {
        "" => MusicTarget::Unchanged,
        STOP_MUSIC => MusicTarget::Stop,
        _ => MusicTarget::Play(Reference::from_form(value, title)),
    }
}

pub struct AudioOverlay {
    slot: AudioSlot,
    bindings: OverlayBindings,
    track: Option<Box<dyn FormWidget>>,
}

impl AudioOverlay {
    pub fn new(slot: AudioSlot) -> Self {
        Self {
            slot,
            bindings: OverlayBindings::default(),
            track: None,
        }
    }

    pub fn music() -> Self {
        Self::new(AudioSlot::Music)
    }

    pub fn sound() -> Self {
        Self::new(AudioSlot::Sound)
    }
}

impl MiniEditor for AudioOverlay {
    fn build(&mut self, host: NodeId, frame: &FrameData, data: &TrialData, ui: &mut UiServices) {
        self.bindings.attach(host);

        let (choices, current) = match self.slot {
            AudioSlot::Music => (music_choices(data), music_form_value(&frame.music)),
            AudioSlot::Sound => (sound_choices(data), frame.sound.form_value()),
        };

        self.track = Some(ui.form_element(
            host,
            FormKind::Resource(self.slot.kind()),
            FormValue::Text(current),
            FormOptions::new().with_choices(choices).free_form(),
        ));

        if self.slot == AudioSlot::Music {
            let editor = ui.localized(host, "button", "music_editor");
            ui.surface.set_class(editor, "wide", true);
            self.bindings.bind(
                ui,
                editor,
                UiEvent::Click,
                UiMessage::Overlay(OverlayAction::OpenMusicEditor),
            );
            ui.translate(editor);
        }
    }

    fn close_minieditor(&mut self, frame_id: FrameId, data: &mut TrialData, ui: &mut UiServices) -> bool {
        let entry = self.track.take().map(|w| (w.value().as_text(), w.title()));
        self.bindings.release(ui);

        let Some((value, title)) = entry else {
            return true;
        };
        // The row may have been deleted while the mini-editor was open
        if data.frame(frame_id).is_none() {
            return true;
        }

        let kind = self.slot.kind();
        let mut resolver = ResourceResolver::new(data);
        let music = match (self.slot, parse_music(&value, &title)) {
            (AudioSlot::Music, MusicTarget::Play(reference)) => {
                Some(MusicTarget::Play(resolver.resolve_reference(kind, &reference)))
            }
            (AudioSlot::Music, music) => Some(music),
            (AudioSlot::Sound, _) => None,
        };
        let sound = match self.slot {
            AudioSlot::Sound => {
                Some(resolver.resolve_reference(kind, &Reference::from_form(&value, &title)))
            }
            AudioSlot::Music => None,
        };
        for (kind, id) in resolver.into_created() {
            info!("Created {} {} for frame {}", kind.display_name(), id, frame_id);
        }

        let Some(frame) = data.frame_mut(frame_id) else {
            return true;
        };
        if let Some(music) = music {
            if music == MusicTarget::Unchanged {
                frame.music_fade = None;
            }
            frame.music = music;
        }
        if let Some(sound) = sound {
            frame.sound = sound;
        }
        true
    }
}
