//! Write-back of row edits into the frame data

use bevy::log::debug;
use trial_core::{BlockKind, Contradiction, FrameAction, FrameId, SpeakerRef, Voice};

use super::cells::colour_class;
use super::{FrameRowView, RowCell};
use crate::messages::Field;
use crate::overlay::text::{colour_tag, COLOUR_TAG_END};
use crate::overlay::HostEdit;
use crate::surface::{insert_at_cursor, wrap_selection, FormValue};
use crate::{EditorContext, EditorError};

/// Effects of a row action the timeline has to follow up on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowOutcome {
    /// Frames were inserted or removed
    pub rows_changed: bool,
    /// Block structure changed; the section map must be rebuilt too
    pub sections_changed: bool,
    /// The preset list changed; every insert cell is stale
    pub presets_changed: bool,
    /// Frame inserted by the action, if any
    pub inserted: Vec<FrameId>,
}

pub(crate) fn speaker_key(speaker: SpeakerRef) -> String {
    match speaker {
        SpeakerRef::None => "none".to_string(),
        SpeakerRef::Unknown => "unknown".to_string(),
        SpeakerRef::Profile(id) => id.to_string(),
    }
}

pub(crate) fn parse_speaker(key: &str) -> SpeakerRef {
    match key {
        "unknown" => SpeakerRef::Unknown,
        other => other
            .parse()
            .map(SpeakerRef::Profile)
            .unwrap_or(SpeakerRef::None),
    }
}

pub(crate) fn voice_key(voice: Voice) -> &'static str {
    match voice {
        Voice::Auto => "auto",
        Voice::None => "none",
        Voice::Male => "male",
        Voice::Female => "female",
        Voice::Typewriter => "typewriter",
    }
}

pub(crate) fn parse_voice(key: &str) -> Voice {
    Voice::all()
        .iter()
        .copied()
        .find(|v| voice_key(*v) == key)
        .unwrap_or_default()
}

pub(crate) fn block_key(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Scene => "scene",
        BlockKind::CrossExamination => "cross_examination",
    }
}

pub(crate) fn parse_block_key(key: &str) -> Option<BlockKind> {
    BlockKind::all().iter().copied().find(|k| block_key(*k) == key)
}

impl FrameRowView {
    /// Copy the value of the widget bound to `field` into the frame
    pub fn apply_field(
        &mut self,
        field: Field,
        ctx: &mut EditorContext,
    ) -> Result<RowOutcome, EditorError> {
        match field {
            Field::PresetChoice => return self.apply_preset_choice(ctx),
            Field::BlockChoice => return self.apply_block_choice(ctx),
            Field::Speaker => return self.apply_speaker(ctx),
            _ => {}
        }

        let Some(value) = self.widget(field).map(|w| w.value()) else {
            return Ok(RowOutcome::default());
        };
        let frame = ctx
            .data
            .frame_mut(self.frame_id)
            .ok_or(EditorError::RowNotFound(self.frame_id))?;

        match field {
            Field::TextContent => frame.text_content = value.as_text(),
            Field::TextSpeed => {
                if let Some(speed) = value.as_float().filter(|s| *s > 0.0) {
                    frame.text_speed = speed as f32;
                }
            }
            Field::SpeakerName => frame.speaker_name = value.as_text(),
            Field::SpeakerVoice => frame.speaker_voice = parse_voice(&value.as_text()),
            Field::Hidden => frame.hidden = value.as_bool(),
            Field::MergedToNext => {
                let merged = value.as_bool();
                frame.set_merged_to_next(merged);
                let wait_time = frame.wait_time;
                if let Some(wait) = self.widget_mut(Field::WaitTime) {
                    if merged {
                        wait.set_value(FormValue::Int(i64::from(wait_time)));
                    }
                    wait.set_enabled(!merged);
                }
            }
            Field::WaitTime => {
                let requested = value.as_int().unwrap_or(0).max(0);
                let accepted = frame.set_wait_time(u32::try_from(requested).unwrap_or(u32::MAX));
                if !accepted {
                    let wait_time = frame.wait_time;
                    if let Some(wait) = self.widget_mut(Field::WaitTime) {
                        wait.set_value(FormValue::Int(i64::from(wait_time)));
                    }
                }
            }
            Field::ActionName => {
                let name = value.as_text();
                if name.is_empty() {
                    frame.action = None;
                } else if let Some(action) = frame.action.as_mut() {
                    action.name = name;
                } else {
                    frame.action = Some(FrameAction::new(name));
                }
            }
            Field::ContradictionElement(index) => {
                if let Some(contradiction) = frame.contradictions.get_mut(index) {
                    contradiction.element = value.as_text();
                }
            }
            Field::ContradictionDestination(index) => {
                if let Some(contradiction) = frame.contradictions.get_mut(index) {
                    contradiction.destination = value
                        .as_int()
                        .and_then(|d| FrameId::try_from(d).ok());
                }
            }
            Field::Speaker | Field::PresetChoice | Field::BlockChoice => {}
        }
        Ok(RowOutcome::default())
    }

    /// Speaker selector. A synced speaker takes the profile's name; without a
    /// place the screen follows the speaker, so the staged characters go.
    fn apply_speaker(&mut self, ctx: &mut EditorContext) -> Result<RowOutcome, EditorError> {
        let Some(speaker) = self
            .widget(Field::Speaker)
            .map(|w| parse_speaker(&w.value().as_text()))
        else {
            return Ok(RowOutcome::default());
        };
        let frame = ctx
            .data
            .frame_mut(self.frame_id)
            .ok_or(EditorError::RowNotFound(self.frame_id))?;
        frame.speaker = speaker;
        if frame.speaker_use_name {
            return Ok(RowOutcome::default());
        }
        let light_mode = !frame.has_place();
        if light_mode {
            frame.characters.clear();
        }

        let name = ctx
            .data
            .frame(self.frame_id)
            .map(|f| ctx.data.speaker_display_name(f))
            .unwrap_or_default();
        if let Some(frame) = ctx.data.frame_mut(self.frame_id) {
            frame.speaker_name = name;
        }
        if light_mode {
            self.invalidate(RowCell::Screen);
            self.populate(ctx)?;
        }
        Ok(RowOutcome::default())
    }

    /// Switch between a custom speaker name and the synced profile name, then
    /// rebuild the dialogue cell in the matching layout
    pub fn use_custom_name(&mut self, enabled: bool, ctx: &mut EditorContext) -> Result<RowOutcome, EditorError> {
        let frame = ctx
            .data
            .frame(self.frame_id)
            .ok_or(EditorError::RowNotFound(self.frame_id))?;
        if frame.speaker_use_name == enabled {
            return Ok(RowOutcome::default());
        }
        let name = if enabled {
            ctx.data.speaker_display_name(frame)
        } else {
            String::new()
        };
        if let Some(frame) = ctx.data.frame_mut(self.frame_id) {
            frame.speaker_name = name;
            frame.speaker_use_name = enabled;
        }
        self.invalidate(RowCell::Dialogue);
        self.populate(ctx)?;
        Ok(RowOutcome::default())
    }

    /// Apply an edit handed back by the text toolbox to the dialogue text.
    /// A colour wraps the selection, or recolours the whole text without one.
    pub fn apply_host_edit(&mut self, edit: &HostEdit, ctx: &mut EditorContext) -> Result<RowOutcome, EditorError> {
        let frame = ctx
            .data
            .frame_mut(self.frame_id)
            .ok_or(EditorError::RowNotFound(self.frame_id))?;
        let Some(text) = self.widget_mut(Field::TextContent) else {
            return Ok(RowOutcome::default());
        };
        match edit {
            HostEdit::InsertText(markup) => insert_at_cursor(&mut **text, markup),
            HostEdit::Colour(colour) => {
                if !wrap_selection(&mut **text, &colour_tag(colour), COLOUR_TAG_END) {
                    let node = text.node();
                    ctx.ui.surface.set_class(node, &colour_class(&frame.text_colour), false);
                    ctx.ui.surface.set_class(node, &colour_class(colour), true);
                    frame.text_colour = colour.clone();
                }
            }
        }
        frame.text_content = text.value().as_text();
        Ok(RowOutcome::default())
    }

    /// Preset selector: save the current frame, or insert a preset before the row
    fn apply_preset_choice(&mut self, ctx: &mut EditorContext) -> Result<RowOutcome, EditorError> {
        let Some(choice) = self.widget(Field::PresetChoice).map(|w| w.value().as_text()) else {
            return Ok(RowOutcome::default());
        };
        if let Some(widget) = self.widget_mut(Field::PresetChoice) {
            widget.set_value(FormValue::Empty);
        }

        let mut outcome = RowOutcome::default();
        if choice == "save" {
            let frame = ctx
                .data
                .frame(self.frame_id)
                .ok_or(EditorError::RowNotFound(self.frame_id))?;
            let index = ctx.presets.save(frame);
            debug!("Saved frame {} as preset {}", self.frame_id, index);
            outcome.presets_changed = true;
        } else if let (Ok(index), Some(at)) = (choice.parse::<usize>(), self.behaviour.insert) {
            let preset = ctx.presets.instantiate(index)?;
            let id = ctx.data.insert_frame(at, Some(preset))?;
            outcome.rows_changed = true;
            outcome.inserted.push(id);
        }
        Ok(outcome)
    }

    /// Block selector: insert a scene or cross-examination before the row
    fn apply_block_choice(&mut self, ctx: &mut EditorContext) -> Result<RowOutcome, EditorError> {
        let Some(choice) = self.widget(Field::BlockChoice).map(|w| w.value().as_text()) else {
            return Ok(RowOutcome::default());
        };
        if let Some(widget) = self.widget_mut(Field::BlockChoice) {
            widget.set_value(FormValue::Empty);
        }

        let (Some(kind), Some(at)) = (parse_block_key(&choice), self.behaviour.insert) else {
            return Ok(RowOutcome::default());
        };
        if !self.behaviour.block_insert_enabled {
            return Ok(RowOutcome::default());
        }
        let inserted = ctx.data.insert_block(kind, at)?;
        Ok(RowOutcome {
            rows_changed: true,
            sections_changed: true,
            presets_changed: false,
            inserted,
        })
    }

    /// Insert a blank frame at the row's insert point
    pub fn insert_blank(&mut self, ctx: &mut EditorContext) -> Result<RowOutcome, EditorError> {
        let Some(at) = self.behaviour.insert else {
            return Ok(RowOutcome::default());
        };
        let id = ctx.data.insert_frame(at, Some(ctx.settings.blank_frame()))?;
        Ok(RowOutcome {
            rows_changed: true,
            inserted: vec![id],
            ..Default::default()
        })
    }

    /// Remove the row's frame
    pub fn delete(&mut self, ctx: &mut EditorContext) -> Result<RowOutcome, EditorError> {
        if !self.behaviour.deletable {
            return Ok(RowOutcome::default());
        }
        ctx.data.remove_frame(self.frame_id)?;
        Ok(RowOutcome {
            rows_changed: true,
            ..Default::default()
        })
    }

    /// Append an empty contradiction and rebuild only the action cell
    pub fn add_contradiction(&mut self, ctx: &mut EditorContext) -> Result<RowOutcome, EditorError> {
        let frame = ctx
            .data
            .frame_mut(self.frame_id)
            .ok_or(EditorError::RowNotFound(self.frame_id))?;
        frame.contradictions.push(Contradiction::default());
        self.invalidate(RowCell::Action);
        self.populate(ctx)?;
        Ok(RowOutcome::default())
    }

    /// Remove a contradiction and rebuild only the action cell
    pub fn remove_contradiction(
        &mut self,
        index: usize,
        ctx: &mut EditorContext,
    ) -> Result<RowOutcome, EditorError> {
        let frame = ctx
            .data
            .frame_mut(self.frame_id)
            .ok_or(EditorError::RowNotFound(self.frame_id))?;
        if index < frame.contradictions.len() {
            frame.contradictions.remove(index);
            self.invalidate(RowCell::Action);
            self.populate(ctx)?;
        }
        Ok(RowOutcome::default())
    }
}
