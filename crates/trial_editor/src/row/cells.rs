//! Builders for the editors of each row cell

use trial_core::{BlockKind, FrameData, PresetLibrary, TrialData, Voice};

use super::edit::{block_key, speaker_key, voice_key};
use super::{ActionDescriptor, CellWiring, FrameRowView, RowCell};
use crate::messages::{Field, RowAction, UiMessage};
use crate::preview::{
    dialogue_summary, music_summary, screen_summary, sound_summary, ScreenSnapshot,
};
use crate::surface::{FormKind, FormOptions, FormValue, NodeId, UiEvent, UiServices};

/// Text shown by a cell while the row is a shell
pub(super) fn static_preview(cell: RowCell, frame: &FrameData, data: &TrialData) -> String {
    match cell {
        RowCell::Screen => screen_summary(frame, data),
        RowCell::Music => music_summary(frame, data),
        RowCell::Sound => sound_summary(frame, data),
        RowCell::Dialogue => dialogue_summary(frame, data),
        _ => String::new(),
    }
}

/// Class carried by the dialogue text in `colour`
pub(super) fn colour_class(colour: &str) -> String {
    format!("colour_{}", colour)
}

/// Speaker select choices. A custom name can only sync with a real profile.
fn speaker_choices(data: &TrialData, include_unknown: bool) -> Vec<(String, String)> {
    let mut speakers = vec![("none".to_string(), "Nobody".to_string())];
    if include_unknown {
        speakers.push(("unknown".to_string(), "???".to_string()));
    }
    speakers.extend(
        data.profiles
            .iter()
            .map(|p| (p.id.to_string(), p.display_name().to_string())),
    );
    speakers
}

impl FrameRowView {
    /// Build the editors of `cell` and record what was bound
    pub(super) fn wire_cell(
        &mut self,
        cell: RowCell,
        frame: &FrameData,
        data: &TrialData,
        presets: &PresetLibrary,
        ui: &mut UiServices,
    ) {
        let node = self.cells[&cell];
        let mut wiring = CellWiring::default();

        let localized = match cell {
            RowCell::Insert => self.wire_insert(node, presets, &mut wiring, ui),
            RowCell::DragHandle => self.wire_drag_handle(node, &mut wiring, ui),
            RowCell::Screen => self.wire_screen(node, frame, data, &mut wiring, ui),
            RowCell::Music => self.wire_music(node, frame, data, &mut wiring, ui),
            RowCell::Sound => self.wire_sound(node, frame, data, &mut wiring, ui),
            RowCell::Dialogue => self.wire_dialogue(node, frame, data, &mut wiring, ui),
            RowCell::Controls => self.wire_controls(node, frame, &mut wiring, ui),
            RowCell::Action => self.wire_action(node, frame, &mut wiring, ui),
        };

        if localized {
            ui.translate(node);
        }
        self.wiring.insert(cell, wiring);
    }

    fn message(&self, action: RowAction) -> UiMessage {
        UiMessage::row(self.frame_id, action)
    }

    fn wire_insert(
        &mut self,
        node: NodeId,
        presets: &PresetLibrary,
        wiring: &mut CellWiring,
        ui: &mut UiServices,
    ) -> bool {
        let link = ui.localized(node, "a", "insert_frame");
        wiring.bind(ui, link, UiEvent::Click, self.message(RowAction::InsertBlank));

        let mut choices = vec![
            (String::new(), String::new()),
            ("save".to_string(), "Save current frame as preset".to_string()),
        ];
        choices.extend(
            presets
                .labels()
                .into_iter()
                .enumerate()
                .map(|(i, label)| (i.to_string(), label)),
        );
        let preset = ui.form_element(
            node,
            FormKind::Select,
            FormValue::Empty,
            FormOptions::new().with_choices(choices),
        );
        wiring.bind(
            ui,
            preset.node(),
            UiEvent::Change,
            self.message(RowAction::FieldChanged(Field::PresetChoice)),
        );
        wiring.add_widget(Field::PresetChoice, preset);

        if self.behaviour.block_insert_enabled {
            let mut choices = vec![(String::new(), String::new())];
            choices.extend(
                BlockKind::all()
                    .iter()
                    .map(|kind| (block_key(*kind).to_string(), kind.display_name().to_string())),
            );
            let block = ui.form_element(
                node,
                FormKind::Select,
                FormValue::Empty,
                FormOptions::new().with_choices(choices),
            );
            wiring.bind(
                ui,
                block.node(),
                UiEvent::Change,
                self.message(RowAction::FieldChanged(Field::BlockChoice)),
            );
            wiring.add_widget(Field::BlockChoice, block);
        }
        true
    }

    fn wire_drag_handle(&mut self, node: NodeId, wiring: &mut CellWiring, ui: &mut UiServices) -> bool {
        let handle = ui.element(node, "span");
        ui.surface.set_class(handle, "drag_handle", true);
        wiring.bind(ui, handle, UiEvent::PointerDown, self.message(RowAction::BeginDrag));
        false
    }

    fn wire_screen(
        &mut self,
        node: NodeId,
        frame: &FrameData,
        data: &TrialData,
        wiring: &mut CellWiring,
        ui: &mut UiServices,
    ) -> bool {
        let stage = ui.element(node, "div");
        ui.surface.set_class(stage, "stage", true);
        ui.surface.render_stage(stage, &ScreenSnapshot::of(frame, data));
        wiring.bind(
            ui,
            node,
            UiEvent::PointerEnter,
            self.message(RowAction::OpenOverlay(RowCell::Screen)),
        );
        false
    }

    fn wire_music(
        &mut self,
        node: NodeId,
        frame: &FrameData,
        data: &TrialData,
        wiring: &mut CellWiring,
        ui: &mut UiServices,
    ) -> bool {
        ui.text(node, &music_summary(frame, data));
        wiring.bind(
            ui,
            node,
            UiEvent::PointerEnter,
            self.message(RowAction::OpenOverlay(RowCell::Music)),
        );
        false
    }

    fn wire_sound(
        &mut self,
        node: NodeId,
        frame: &FrameData,
        data: &TrialData,
        wiring: &mut CellWiring,
        ui: &mut UiServices,
    ) -> bool {
        ui.text(node, &sound_summary(frame, data));
        wiring.bind(
            ui,
            node,
            UiEvent::PointerEnter,
            self.message(RowAction::OpenOverlay(RowCell::Sound)),
        );
        false
    }

    fn wire_dialogue(
        &mut self,
        node: NodeId,
        frame: &FrameData,
        data: &TrialData,
        wiring: &mut CellWiring,
        ui: &mut UiServices,
    ) -> bool {
        let speaker_block = ui.element(node, "div");
        ui.surface.set_class(speaker_block, "speaker", true);
        if frame.speaker_use_name {
            ui.localized(speaker_block, "label", "sync_with");
            let speaker = ui.form_element(
                speaker_block,
                FormKind::Select,
                FormValue::Text(speaker_key(frame.speaker)),
                FormOptions::new().with_choices(speaker_choices(data, false)),
            );
            self.bind_change(wiring, ui, speaker.node(), Field::Speaker);
            wiring.add_widget(Field::Speaker, speaker);

            let unsync = ui.localized(speaker_block, "button", "unsync");
            wiring.bind(ui, unsync, UiEvent::Click, self.message(RowAction::UseCustomName(false)));

            let name = ui.form_element(
                speaker_block,
                FormKind::Text,
                FormValue::Text(data.speaker_display_name(frame)),
                FormOptions::new(),
            );
            self.bind_change(wiring, ui, name.node(), Field::SpeakerName);
            wiring.add_widget(Field::SpeakerName, name);
        } else {
            let sync = ui.localized(speaker_block, "button", "sync_set");
            wiring.bind(ui, sync, UiEvent::Click, self.message(RowAction::UseCustomName(true)));

            let speaker = ui.form_element(
                speaker_block,
                FormKind::Select,
                FormValue::Text(speaker_key(frame.speaker)),
                FormOptions::new().with_choices(speaker_choices(data, true)),
            );
            self.bind_change(wiring, ui, speaker.node(), Field::Speaker);
            wiring.add_widget(Field::Speaker, speaker);
        }

        let voices = Voice::all()
            .iter()
            .map(|v| (voice_key(*v).to_string(), v.display_name().to_string()))
            .collect();
        let voice = ui.form_element(
            node,
            FormKind::Select,
            FormValue::Text(voice_key(frame.speaker_voice).to_string()),
            FormOptions::new().with_choices(voices),
        );
        self.bind_change(wiring, ui, voice.node(), Field::SpeakerVoice);
        wiring.add_widget(Field::SpeakerVoice, voice);

        let speed = ui.form_element(
            node,
            FormKind::Decimal,
            FormValue::Float(f64::from(frame.text_speed)),
            FormOptions::new(),
        );
        self.bind_change(wiring, ui, speed.node(), Field::TextSpeed);
        wiring.add_widget(Field::TextSpeed, speed);

        let slot = ui.element(node, "div");
        ui.surface.set_class(slot, "toolbox", true);
        self.toolbox_slot = Some(slot);

        let text = ui.form_element(
            node,
            FormKind::TextArea,
            FormValue::Text(frame.text_content.clone()),
            FormOptions::new(),
        );
        ui.surface.set_class(text.node(), &colour_class(&frame.text_colour), true);
        self.bind_change(wiring, ui, text.node(), Field::TextContent);
        wiring.bind(
            ui,
            text.node(),
            UiEvent::Focus,
            self.message(RowAction::OpenOverlay(RowCell::Dialogue)),
        );
        wiring.add_widget(Field::TextContent, text);
        true
    }

    fn wire_controls(
        &mut self,
        node: NodeId,
        frame: &FrameData,
        wiring: &mut CellWiring,
        ui: &mut UiServices,
    ) -> bool {
        if self.behaviour.deletable {
            let delete = ui.localized(node, "a", "delete_frame");
            wiring.bind(ui, delete, UiEvent::Click, self.message(RowAction::Delete));
        }

        ui.localized(node, "label", "hidden_frame");
        let hidden = ui.form_element(
            node,
            FormKind::Checkbox,
            FormValue::Bool(frame.hidden),
            FormOptions::new(),
        );
        self.bind_change(wiring, ui, hidden.node(), Field::Hidden);
        wiring.add_widget(Field::Hidden, hidden);

        if self.behaviour.flow_controls_enabled {
            ui.localized(node, "label", "merge_with_next");
            let merged = ui.form_element(
                node,
                FormKind::Checkbox,
                FormValue::Bool(frame.merged_to_next),
                FormOptions::new(),
            );
            self.bind_change(wiring, ui, merged.node(), Field::MergedToNext);
            wiring.add_widget(Field::MergedToNext, merged);

            ui.localized(node, "label", "wait_time");
            let wait = ui.form_element(
                node,
                FormKind::Integer,
                FormValue::Int(i64::from(frame.wait_time)),
                FormOptions::new().enabled(!frame.merged_to_next),
            );
            self.bind_change(wiring, ui, wait.node(), Field::WaitTime);
            wiring.add_widget(Field::WaitTime, wait);
        }
        true
    }

    fn wire_action(
        &mut self,
        node: NodeId,
        frame: &FrameData,
        wiring: &mut CellWiring,
        ui: &mut UiServices,
    ) -> bool {
        match self.behaviour.action {
            ActionDescriptor::None => false,
            ActionDescriptor::Simple => {
                let name = frame
                    .action
                    .as_ref()
                    .map(|a| a.name.clone())
                    .unwrap_or_default();
                let widget = ui.form_element(
                    node,
                    FormKind::Text,
                    FormValue::Text(name),
                    FormOptions::new(),
                );
                self.bind_change(wiring, ui, widget.node(), Field::ActionName);
                wiring.add_widget(Field::ActionName, widget);

                if let Some(action) = frame.action.as_ref().filter(|a| !a.context.is_null()) {
                    ui.text(node, &action.context.to_string());
                }
                false
            }
            ActionDescriptor::Contradiction => {
                for (index, contradiction) in frame.contradictions.iter().enumerate() {
                    let line = ui.element(node, "div");

                    let element = ui.form_element(
                        line,
                        FormKind::Text,
                        FormValue::Text(contradiction.element.clone()),
                        FormOptions::new(),
                    );
                    self.bind_change(wiring, ui, element.node(), Field::ContradictionElement(index));
                    wiring.add_widget(Field::ContradictionElement(index), element);

                    let destination = ui.form_element(
                        line,
                        FormKind::Integer,
                        contradiction
                            .destination
                            .map(|d| FormValue::Int(i64::from(d)))
                            .unwrap_or_default(),
                        FormOptions::new(),
                    );
                    self.bind_change(
                        wiring,
                        ui,
                        destination.node(),
                        Field::ContradictionDestination(index),
                    );
                    wiring.add_widget(Field::ContradictionDestination(index), destination);

                    let remove = ui.localized(line, "a", "remove_contradiction");
                    wiring.bind(
                        ui,
                        remove,
                        UiEvent::Click,
                        self.message(RowAction::RemoveContradiction(index)),
                    );
                }

                let add = ui.localized(node, "a", "add_contradiction");
                wiring.bind(ui, add, UiEvent::Click, self.message(RowAction::AddContradiction));
                true
            }
        }
    }

    fn bind_change(&self, wiring: &mut CellWiring, ui: &mut UiServices, node: NodeId, field: Field) {
        wiring.bind(ui, node, UiEvent::Change, self.message(RowAction::FieldChanged(field)));
    }
}
