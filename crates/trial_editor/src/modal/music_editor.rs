use trial_core::{FrameData, FrameId, MusicFadeInfo, MusicTarget, Reference, ResourceKind, TrialData};

use super::form::ModalForm;
use super::DraftFrame;
use crate::messages::ModalAction;
use crate::overlay::audio::{music_choices, music_form_value, parse_music, sound_choices};
use crate::preview::{music_summary, sound_summary};
use crate::surface::{FormKind, FormOptions, FormValue, NodeId, UiServices};
use crate::{EditorContext, EditorError};

/// Modal editor of a frame's music change, music fade and sound
pub struct MusicEditorSession {
    draft: DraftFrame,
    form: ModalForm,
}

impl MusicEditorSession {
    pub fn open(frame_id: FrameId, ctx: &mut EditorContext) -> Result<Self, EditorError> {
        let draft = DraftFrame::open(frame_id, "music_editor", &*ctx.data, &mut ctx.ui)?;
        let form = ModalForm::new(draft.content(), &mut ctx.ui);
        let mut session = Self { draft, form };
        session.render(&*ctx.data, &mut ctx.ui);
        Ok(session)
    }

    pub fn frame_id(&self) -> FrameId {
        self.draft.frame_id()
    }

    pub fn draft(&self) -> &FrameData {
        &self.draft.frame
    }

    /// Change the music. Any previous fade is dropped with the old track.
    pub fn set_music(&mut self, music: MusicTarget) {
        self.draft.frame.music = music;
        self.draft.frame.music_fade = None;
    }

    /// Set the fade of the music change. Ignored while the music is unchanged.
    pub fn set_music_fade(&mut self, fade: Option<MusicFadeInfo>) -> bool {
        if fade.is_some() && self.draft.frame.music == MusicTarget::Unchanged {
            return false;
        }
        self.draft.frame.music_fade = fade;
        true
    }

    pub fn set_sound(&mut self, sound: Reference) {
        self.draft.frame.sound = sound;
    }

    pub fn control(&self, action: ModalAction) -> Option<NodeId> {
        self.form.widget_node(action)
    }

    /// Redraw the labels of the copy's music and sound
    pub fn render_preview(&mut self, data: &TrialData, ui: &mut UiServices) {
        self.draft.clear_previews(ui);
        for text in [
            music_summary(&self.draft.frame, data),
            sound_summary(&self.draft.frame, data),
        ] {
            let line = self.draft.preview_node("p", ui);
            ui.text(line, &text);
        }
    }

    pub fn render(&mut self, data: &TrialData, ui: &mut UiServices) {
        self.build_controls(data, ui);
        self.render_preview(data, ui);
    }

    /// Apply the control change behind `action` to the copy, then re-render
    pub fn handle(&mut self, action: ModalAction, data: &TrialData, ui: &mut UiServices) -> Result<(), EditorError> {
        let value = self.form.value(action);
        match action {
            ModalAction::Music => {
                let music = parse_music(&value.as_text(), &self.form.title(action));
                self.set_music(music);
            }
            ModalAction::MusicFade => {
                self.set_music_fade(value.as_bool().then(MusicFadeInfo::default));
            }
            ModalAction::MusicFadeDuration => {
                let duration = value.as_int().and_then(|d| u32::try_from(d).ok());
                if let (Some(fade), Some(duration)) = (self.draft.frame.music_fade.as_mut(), duration) {
                    fade.duration = duration;
                }
            }
            ModalAction::MusicFadeVolume => {
                let volume = value.as_int().map(|v| v.clamp(0, 100) as u8);
                if let (Some(fade), Some(volume)) = (self.draft.frame.music_fade.as_mut(), volume) {
                    fade.to_volume = volume;
                }
            }
            ModalAction::MusicFadeSamePosition => {
                if let Some(fade) = self.draft.frame.music_fade.as_mut() {
                    fade.same_position = value.as_bool();
                }
            }
            ModalAction::Sound => {
                let sound = Reference::from_form(&value.as_text(), &self.form.title(action));
                self.set_sound(sound);
            }
            _ => return Ok(()),
        }
        self.render(data, ui);
        Ok(())
    }

    fn build_controls(&mut self, data: &TrialData, ui: &mut UiServices) {
        self.form.clear(ui);
        let form = &mut self.form;
        let frame = &self.draft.frame;
        let root = form.root();

        let music = form.section(root, "music_editor_music", ui);
        form.field(
            music,
            "music_editor_select_track",
            ModalAction::Music,
            FormKind::Resource(ResourceKind::Music),
            FormValue::Text(music_form_value(&frame.music)),
            FormOptions::new().with_choices(music_choices(data)).free_form(),
            ui,
        );
        if frame.music != MusicTarget::Unchanged {
            form.field(
                music,
                "music_fade",
                ModalAction::MusicFade,
                FormKind::Checkbox,
                FormValue::Bool(frame.music_fade.is_some()),
                FormOptions::new(),
                ui,
            );
        }

        if let Some(fade) = &frame.music_fade {
            let settings = form.section(root, "music_fade_settings", ui);
            form.field(
                settings,
                "music_fade_duration",
                ModalAction::MusicFadeDuration,
                FormKind::Integer,
                FormValue::Int(i64::from(fade.duration)),
                FormOptions::new(),
                ui,
            );
            // A stop only fades out
            if !frame.music.is_stop() {
                form.field(
                    settings,
                    "music_fade_volume",
                    ModalAction::MusicFadeVolume,
                    FormKind::Integer,
                    FormValue::Int(i64::from(fade.to_volume)),
                    FormOptions::new(),
                    ui,
                );
                form.field(
                    settings,
                    "music_crossfade_same_position",
                    ModalAction::MusicFadeSamePosition,
                    FormKind::Checkbox,
                    FormValue::Bool(fade.same_position),
                    FormOptions::new(),
                    ui,
                );
            }
        }

        let sound = form.section(root, "sound", ui);
        form.field(
            sound,
            "sound",
            ModalAction::Sound,
            FormKind::Resource(ResourceKind::Sound),
            FormValue::Text(frame.sound.form_value()),
            FormOptions::new().with_choices(sound_choices(data)).free_form(),
            ui,
        );

        ui.translate(root);
    }

    pub fn confirm(mut self, data: &mut TrialData, ui: &mut UiServices) -> Result<FrameId, EditorError> {
        self.form.clear(ui);
        self.draft.commit(data, ui)
    }

    pub fn cancel(mut self, ui: &mut UiServices) {
        self.form.clear(ui);
        self.draft.discard(ui);
    }
}
