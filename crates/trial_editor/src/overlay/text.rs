//! Colour and effect toolbox shown while the dialogue text has focus
//!
//! The toolbox edits nothing itself. Its buttons hand [`HostEdit`]s back to
//! the timeline, which applies them to the row's text widget at the cursor.

use trial_core::{FrameData, FrameId, TrialData};

use super::{HostEdit, MiniEditor, OverlayBindings};
use crate::messages::{OverlayAction, TextEffect, UiMessage};
use crate::surface::{FormKind, FormOptions, FormValue, FormWidget, NodeId, UiEvent, UiServices};

/// Colour buttons of the toolbox: (locale key, colour value)
pub const TEXT_COLOURS: [(&str, &str); 4] = [
    ("white", "white"),
    ("red", "#F77337"),
    ("green", "#00F61C"),
    ("blue", "#6BC7F6"),
];

/// Initial value of the free colour picker
pub const PICKER_DEFAULT: &str = "#ffffff";

/// Opening tag wrapping a selection in `colour`
pub fn colour_tag(colour: &str) -> String {
    format!("[#/colour:{}]", colour)
}

/// Closing tag of a coloured selection
pub const COLOUR_TAG_END: &str = "[/#]";

#[derive(Default)]
pub struct TextToolbox {
    bindings: OverlayBindings,
    picker: Option<Box<dyn FormWidget>>,
}

impl TextToolbox {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MiniEditor for TextToolbox {
    fn build(&mut self, host: NodeId, _frame: &FrameData, _data: &TrialData, ui: &mut UiServices) {
        self.bindings.attach(host);

        let colours = ui.element(host, "div");
        ui.surface.set_class(colours, "controls", true);
        ui.localized(colours, "span", "colours");
        for (key, value) in TEXT_COLOURS {
            let button = ui.localized(colours, "button", key);
            self.bindings.bind(
                ui,
                button,
                UiEvent::Click,
                UiMessage::Overlay(OverlayAction::TextColour(value.to_string())),
            );
        }

        let picker_row = ui.element(host, "div");
        ui.surface.set_class(picker_row, "controls", true);
        ui.localized(picker_row, "span", "colour_picker");
        let picker = ui.form_element(
            picker_row,
            FormKind::Colour,
            FormValue::Text(PICKER_DEFAULT.to_string()),
            FormOptions::new(),
        );
        self.bindings.bind(
            ui,
            picker.node(),
            UiEvent::Change,
            UiMessage::Overlay(OverlayAction::PickedColour),
        );
        self.picker = Some(picker);

        let effects = ui.element(host, "div");
        ui.surface.set_class(effects, "controls", true);
        ui.localized(effects, "span", "effects");
        for effect in TextEffect::all() {
            let button = ui.localized(effects, "button", effect.key());
            self.bindings.bind(
                ui,
                button,
                UiEvent::Click,
                UiMessage::Overlay(OverlayAction::InsertTextEffect(*effect)),
            );
        }
        ui.translate(host);
    }

    fn handle(&mut self, action: &OverlayAction, _data: &TrialData, _ui: &mut UiServices) -> Option<HostEdit> {
        match action {
            OverlayAction::InsertTextEffect(effect) => Some(HostEdit::InsertText(effect.markup().to_string())),
            OverlayAction::TextColour(colour) => Some(HostEdit::Colour(colour.clone())),
            OverlayAction::PickedColour => self
                .picker
                .as_ref()
                .map(|w| w.value().as_text())
                .filter(|c| !c.is_empty())
                .map(HostEdit::Colour),
            _ => None,
        }
    }

    fn close_minieditor(&mut self, _frame_id: FrameId, _data: &mut TrialData, ui: &mut UiServices) -> bool {
        self.picker = None;
        self.bindings.release(ui);
        true
    }
}
