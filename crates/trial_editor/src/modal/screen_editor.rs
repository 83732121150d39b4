use trial_core::{
    FadePlacement, FadeType, FrameData, FrameId, PlaceTransition, PositionId, Reference,
    ResourceKind, StartupMode, SyncMode, TrialData, VisualEffect,
};

use super::form::{choice_key, enum_choices, parse_choice, ModalForm};
use super::{DraftFrame, ScreenCompositionEditor};
use crate::messages::ModalAction;
use crate::overlay::audio::record_choices;
use crate::overlay::screen::{parse_transition, place_choices, position_choices, transition_key};
use crate::preview::ScreenSnapshot;
use crate::row::edit::{parse_speaker, speaker_key};
use crate::settings::ScreenSettings;
use crate::surface::{FormKind, FormOptions, FormValue, NodeId, UiServices};
use crate::{EditorContext, EditorError};

/// Modal editor of a frame's screen composition
pub struct ScreenEditorSession {
    draft: DraftFrame,
    settings: ScreenSettings,
    form: ModalForm,
}

impl ScreenEditorSession {
    pub fn open(frame_id: FrameId, ctx: &mut EditorContext) -> Result<Self, EditorError> {
        let draft = DraftFrame::open(frame_id, "screen_editor", &*ctx.data, &mut ctx.ui)?;
        let form = ModalForm::new(draft.content(), &mut ctx.ui);
        let mut session = Self {
            draft,
            settings: ctx.settings.screen.clone(),
            form,
        };
        session.render(&*ctx.data, &mut ctx.ui);
        Ok(session)
    }

    pub fn frame_id(&self) -> FrameId {
        self.draft.frame_id()
    }

    pub fn draft(&self) -> &FrameData {
        &self.draft.frame
    }

    /// Editing operations over the copy
    pub fn composition(&mut self) -> ScreenCompositionEditor<'_> {
        ScreenCompositionEditor::new(&mut self.draft.frame, &self.settings)
    }

    /// Element of the control sending `action`, if currently shown
    pub fn control(&self, action: ModalAction) -> Option<NodeId> {
        self.form.widget_node(action)
    }

    pub fn form_root(&self) -> NodeId {
        self.form.root()
    }

    /// Redraw the stage preview of the copy
    pub fn render_preview(&mut self, data: &TrialData, ui: &mut UiServices) {
        self.draft.clear_previews(ui);
        let stage = self.draft.preview_node("div", ui);
        ui.surface.set_class(stage, "stage_preview", true);
        ui.surface
            .render_stage(stage, &ScreenSnapshot::of(&self.draft.frame, data));
    }

    /// Rebuild the controls and the preview from the copy
    pub fn render(&mut self, data: &TrialData, ui: &mut UiServices) {
        self.build_controls(data, ui);
        self.render_preview(data, ui);
    }

    /// Apply the control change behind `action` to the copy, then re-render
    pub fn handle(&mut self, action: ModalAction, data: &TrialData, ui: &mut UiServices) -> Result<(), EditorError> {
        let value = self.form.value(action);
        let text = value.as_text();
        let mut editor = ScreenCompositionEditor::new(&mut self.draft.frame, &self.settings);

        match action {
            ModalAction::Place => {
                let place = Reference::from_form(&text, &self.form.title(action));
                editor.set_place(place, data);
            }
            ModalAction::PlacePosition => {
                let position = value.as_int().and_then(|p| PositionId::try_from(p).ok());
                editor.set_place_position(position, data);
            }
            ModalAction::Transition => editor.set_transition(parse_transition(&text)),
            ModalAction::ErasePrevious => editor.set_erase_previous(value.as_bool()),
            ModalAction::TalkingCharacter => editor.set_talking_character(parse_speaker(&text), data)?,
            ModalAction::CharacterSprite(index) => {
                let sprite = value.as_int().and_then(|s| u32::try_from(s).ok());
                if let (Some(profile), Some(sprite)) = (profile_at(editor.frame(), index), sprite) {
                    editor.set_sprite(profile, sprite, data);
                }
            }
            ModalAction::CharacterPosition(index) => {
                let position = value.as_int().and_then(|p| PositionId::try_from(p).ok());
                if let Some(profile) = profile_at(editor.frame(), index) {
                    editor.set_position(profile, position, data);
                }
            }
            ModalAction::CharacterStartup(index) => {
                if let (Some(profile), Some(mode)) =
                    (profile_at(editor.frame(), index), parse_choice(StartupMode::all(), &text))
                {
                    editor.set_startup_mode(profile, mode, data);
                }
            }
            ModalAction::CharacterSync(index) => {
                if let (Some(profile), Some(mode)) =
                    (profile_at(editor.frame(), index), parse_choice(SyncMode::all(), &text))
                {
                    editor.set_sync_mode(profile, mode);
                }
            }
            ModalAction::CharacterMirror(index) => {
                if let Some(profile) = profile_at(editor.frame(), index) {
                    editor.set_mirror(profile, value.as_bool());
                }
            }
            ModalAction::CharacterAppears(index) | ModalAction::CharacterDisappears(index) => {
                let effect = parse_choice(VisualEffect::all(), &text);
                let current = editor
                    .frame()
                    .characters
                    .get(index)
                    .map(|c| (c.profile_id, c.visual_effect_appears, c.visual_effect_disappears));
                if let (Some((profile, appears, disappears)), Some(effect)) = (current, effect) {
                    if matches!(action, ModalAction::CharacterAppears(_)) {
                        editor.set_visual_effects(profile, effect, disappears);
                    } else {
                        editor.set_visual_effects(profile, appears, effect);
                    }
                }
            }
            ModalAction::RemoveCharacter(index) => {
                if let Some(profile) = profile_at(editor.frame(), index) {
                    editor.remove_character(profile);
                }
            }
            // The profile waits in its select until the add button is pressed
            ModalAction::NewCharacter => return Ok(()),
            ModalAction::AddCharacter => {
                let profile = self
                    .form
                    .value(ModalAction::NewCharacter)
                    .as_int()
                    .and_then(|p| u32::try_from(p).ok());
                if let Some(profile) = profile {
                    editor.add_character(profile, data)?;
                }
            }
            ModalAction::Popup(index) => {
                editor.set_popup(index, Reference::from_form(&text, &self.form.title(action)));
            }
            ModalAction::RemovePopup(index) => {
                editor.remove_popup(index);
            }
            ModalAction::AddPopup => editor.add_popup(Reference::Unset),
            ModalAction::FadeType
            | ModalAction::FadeColour
            | ModalAction::FadeDuration
            | ModalAction::FadePlacement => {
                if let Some(mut fade) = editor.frame().fade.clone() {
                    match action {
                        ModalAction::FadeType => {
                            fade.fade_type = parse_choice(FadeType::all(), &text).unwrap_or_default();
                        }
                        ModalAction::FadeColour if !text.is_empty() => fade.fade_colour = text,
                        ModalAction::FadeDuration => {
                            if let Some(duration) = value.as_int().and_then(|d| u32::try_from(d).ok()) {
                                fade.fade_duration = duration;
                            }
                        }
                        ModalAction::FadePlacement => {
                            fade.fade_placement =
                                parse_choice(FadePlacement::all(), &text).unwrap_or_default();
                        }
                        _ => {}
                    }
                    editor.set_fade(Some(fade));
                }
            }
            ModalAction::AddFade => editor.set_fade(Some(Default::default())),
            ModalAction::RemoveFade => editor.set_fade(None),
            ModalAction::Music
            | ModalAction::MusicFade
            | ModalAction::MusicFadeDuration
            | ModalAction::MusicFadeVolume
            | ModalAction::MusicFadeSamePosition
            | ModalAction::Sound => return Ok(()),
        }

        self.render(data, ui);
        Ok(())
    }

    fn build_controls(&mut self, data: &TrialData, ui: &mut UiServices) {
        self.form.clear(ui);
        let form = &mut self.form;
        let frame = &self.draft.frame;
        let root = form.root();

        let left = ui.element(root, "div");
        ui.surface.set_class(left, "left-panel", true);
        form.field(
            left,
            "place",
            ModalAction::Place,
            FormKind::Resource(ResourceKind::Place),
            FormValue::Text(frame.place.form_value()),
            FormOptions::new().with_choices(place_choices(data)).free_form(),
            ui,
        );
        form.field(
            left,
            "screen_position",
            ModalAction::PlacePosition,
            FormKind::Select,
            frame
                .place_position
                .map(|p| FormValue::Text(p.to_string()))
                .unwrap_or_default(),
            FormOptions::new().with_choices(position_choices(data.place_positions(&frame.place))),
            ui,
        );
        form.field(
            left,
            "place_transition",
            ModalAction::Transition,
            FormKind::Select,
            FormValue::Text(transition_key(frame.place_transition)),
            FormOptions::new().with_choices(enum_choices(PlaceTransition::all(), |t| t.display_name())),
            ui,
        );
        form.field(
            left,
            "characters_erase_previous",
            ModalAction::ErasePrevious,
            FormKind::Checkbox,
            FormValue::Bool(frame.characters_erase_previous),
            FormOptions::new(),
            ui,
        );

        let right = ui.element(root, "div");
        ui.surface.set_class(right, "right-panel", true);
        if frame.has_place() {
            build_full_characters(form, right, frame, data, ui);
        } else {
            build_light_character(form, right, frame, data, ui);
        }
        build_popups(form, right, frame, data, ui);
        build_fade(form, right, frame, ui);

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

    #[cfg(test)]
    pub(crate) fn binding_count(&self) -> usize {
        self.form.binding_count()
    }
}

fn profile_at(frame: &FrameData, index: usize) -> Option<u32> {
    frame.characters.get(index).map(|c| c.profile_id)
}

fn profile_choices(data: &TrialData, exclude: &[u32]) -> Vec<(String, String)> {
    data.profiles
        .iter()
        .filter(|p| !exclude.contains(&p.id))
        .map(|p| (p.id.to_string(), p.display_name().to_string()))
        .collect()
}

/// No place: one talking character, chosen through the speaker
fn build_light_character(
    form: &mut ModalForm,
    parent: NodeId,
    frame: &FrameData,
    data: &TrialData,
    ui: &mut UiServices,
) {
    let section = form.section(parent, "frame_light", ui);
    let mut speakers = vec![
        ("none".to_string(), "Nobody".to_string()),
        ("unknown".to_string(), "???".to_string()),
    ];
    speakers.extend(profile_choices(data, &[]));
    form.field(
        section,
        "talking_character_select",
        ModalAction::TalkingCharacter,
        FormKind::Select,
        FormValue::Text(speaker_key(frame.speaker)),
        FormOptions::new().with_choices(speakers),
        ui,
    );
    if !frame.characters.is_empty() {
        build_character(form, section, 0, frame, data, false, ui);
    }
}

/// A place: any number of characters, each on its own position
fn build_full_characters(
    form: &mut ModalForm,
    parent: NodeId,
    frame: &FrameData,
    data: &TrialData,
    ui: &mut UiServices,
) {
    let section = form.section(parent, "frame_full", ui);
    let list = ui.element(section, "ul");
    ui.surface.set_class(list, "screen_editor_chars", true);
    for index in 0..frame.characters.len() {
        let row = ui.element(list, "li");
        ui.surface.set_class(row, "char_row", true);
        build_character(form, row, index, frame, data, true, ui);
    }

    let add_row = ui.element(section, "div");
    ui.surface.set_class(add_row, "char_row", true);
    let staged: Vec<u32> = frame.characters.iter().map(|c| c.profile_id).collect();
    form.field(
        add_row,
        "character",
        ModalAction::NewCharacter,
        FormKind::Select,
        FormValue::Empty,
        FormOptions::new().with_choices(profile_choices(data, &staged)),
        ui,
    );
    form.button(add_row, "add_character", ModalAction::AddCharacter, ui);
}

fn build_character(
    form: &mut ModalForm,
    parent: NodeId,
    index: usize,
    frame: &FrameData,
    data: &TrialData,
    full: bool,
    ui: &mut UiServices,
) {
    let character = &frame.characters[index];
    let profile = data.profile(character.profile_id);
    let sprites = profile
        .map(|p| {
            p.sprites
                .iter()
                .map(|s| (s.id.to_string(), s.name.clone()))
                .collect()
        })
        .unwrap_or_default();
    form.field(
        parent,
        "character_sprite",
        ModalAction::CharacterSprite(index),
        FormKind::Select,
        character
            .sprite_id
            .map(|s| FormValue::Text(s.to_string()))
            .unwrap_or_default(),
        FormOptions::new().with_choices(sprites),
        ui,
    );

    if full {
        let taken: Vec<String> = frame
            .characters
            .iter()
            .filter(|c| c.profile_id != character.profile_id)
            .filter_map(|c| c.position)
            .map(|p| p.to_string())
            .collect();
        form.field(
            parent,
            "character_position",
            ModalAction::CharacterPosition(index),
            FormKind::Select,
            character
                .position
                .map(|p| FormValue::Text(p.to_string()))
                .unwrap_or_default(),
            FormOptions::new()
                .with_choices(position_choices(data.place_positions(&frame.place)))
                .with_disabled(taken),
            ui,
        );
    }

    let has_startup = profile
        .zip(character.sprite_id)
        .and_then(|(p, s)| p.sprite(s))
        .is_some_and(|s| s.has_startup());
    if has_startup {
        form.field(
            parent,
            "character_startup_mode",
            ModalAction::CharacterStartup(index),
            FormKind::Select,
            FormValue::Text(choice_key(StartupMode::all(), &character.startup_mode)),
            FormOptions::new().with_choices(enum_choices(StartupMode::all(), |m| m.display_name())),
            ui,
        );
    }
    form.field(
        parent,
        "character_sync_mode",
        ModalAction::CharacterSync(index),
        FormKind::Select,
        FormValue::Text(choice_key(SyncMode::all(), &character.sync_mode)),
        FormOptions::new().with_choices(enum_choices(SyncMode::all(), |m| m.display_name())),
        ui,
    );
    form.field(
        parent,
        "character_mirror_effect",
        ModalAction::CharacterMirror(index),
        FormKind::Checkbox,
        FormValue::Bool(character.mirror_effect),
        FormOptions::new(),
        ui,
    );
    let effects = enum_choices(VisualEffect::all(), |e| e.display_name());
    form.field(
        parent,
        "character_visual_effect_appears",
        ModalAction::CharacterAppears(index),
        FormKind::Select,
        FormValue::Text(choice_key(VisualEffect::all(), &character.visual_effect_appears)),
        FormOptions::new().with_choices(effects.clone()),
        ui,
    );
    form.field(
        parent,
        "character_visual_effect_disappears",
        ModalAction::CharacterDisappears(index),
        FormKind::Select,
        FormValue::Text(choice_key(VisualEffect::all(), &character.visual_effect_disappears)),
        FormOptions::new().with_choices(effects),
        ui,
    );

    if full {
        let remove = form.button(parent, "remove", ModalAction::RemoveCharacter(index), ui);
        ui.surface.set_class(remove, "remove_button", true);
    }
}

fn build_popups(form: &mut ModalForm, parent: NodeId, frame: &FrameData, data: &TrialData, ui: &mut UiServices) {
    let section = form.section(parent, "frame_popups", ui);
    let mut choices = vec![(String::new(), String::new())];
    choices.extend(record_choices(&data.popups));
    for (index, popup) in frame.popups.iter().enumerate() {
        let row = ui.element(section, "div");
        ui.surface.set_class(row, "char_row", true);
        form.field(
            row,
            "popup",
            ModalAction::Popup(index),
            FormKind::Resource(ResourceKind::Popup),
            FormValue::Text(popup.popup.form_value()),
            FormOptions::new().with_choices(choices.clone()).free_form(),
            ui,
        );
        let remove = form.button(row, "remove", ModalAction::RemovePopup(index), ui);
        ui.surface.set_class(remove, "remove_button", true);
    }
    form.button(section, "add_frame_popups", ModalAction::AddPopup, ui);
}

fn build_fade(form: &mut ModalForm, parent: NodeId, frame: &FrameData, ui: &mut UiServices) {
    let section = form.section(parent, "frame_fades", ui);
    let Some(fade) = &frame.fade else {
        form.button(section, "add_frame_fades", ModalAction::AddFade, ui);
        return;
    };
    form.field(
        section,
        "fade_type",
        ModalAction::FadeType,
        FormKind::Select,
        FormValue::Text(choice_key(FadeType::all(), &fade.fade_type)),
        FormOptions::new().with_choices(enum_choices(FadeType::all(), |t| t.display_name())),
        ui,
    );
    form.field(
        section,
        "fade_colour",
        ModalAction::FadeColour,
        FormKind::Colour,
        FormValue::Text(fade.fade_colour.clone()),
        FormOptions::new(),
        ui,
    );
    form.field(
        section,
        "fade_duration",
        ModalAction::FadeDuration,
        FormKind::Integer,
        FormValue::Int(i64::from(fade.fade_duration)),
        FormOptions::new(),
        ui,
    );
    form.field(
        section,
        "fade_placement",
        ModalAction::FadePlacement,
        FormKind::Select,
        FormValue::Text(choice_key(FadePlacement::all(), &fade.fade_placement)),
        FormOptions::new().with_choices(enum_choices(FadePlacement::all(), |p| p.display_name())),
        ui,
    );
    let remove = form.button(section, "remove_frame_fade", ModalAction::RemoveFade, ui);
    ui.surface.set_class(remove, "remove_button", true);
}
