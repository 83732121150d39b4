//! Place, position and transition mini-editor of the screen cell

use bevy::log::info;
use trial_core::{
    FrameData, FrameId, PlacePosition, PlaceTransition, PositionId, Reference, ResourceKind,
    ResourceResolver, TrialData,
};

use super::{HostEdit, MiniEditor, OverlayBindings};
use crate::messages::{OverlayAction, UiMessage};
use crate::surface::{FormKind, FormOptions, FormValue, FormWidget, NodeId, UiEvent, UiServices};

pub(crate) fn transition_key(transition: PlaceTransition) -> String {
    PlaceTransition::all()
        .iter()
        .position(|t| *t == transition)
        .unwrap_or(0)
        .to_string()
}

pub(crate) fn parse_transition(key: &str) -> PlaceTransition {
    key.parse::<usize>()
        .ok()
        .and_then(|i| PlaceTransition::all().get(i).copied())
        .unwrap_or_default()
}

/// Choices of a place selector: an empty entry then every stored place
pub(crate) fn place_choices(data: &TrialData) -> Vec<(String, String)> {
    let mut places = vec![(String::new(), String::new())];
    places.extend(
        data.places
            .iter()
            .skip(1)
            .map(|p| (p.id.to_string(), p.name.clone())),
    );
    places
}

/// Choices of a position selector over `positions`
pub(crate) fn position_choices(positions: Vec<PlacePosition>) -> Vec<(String, String)> {
    let mut choices = vec![(String::new(), String::new())];
    choices.extend(positions.into_iter().map(|p| (p.id.to_string(), p.name)));
    choices
}

pub struct PlaceOverlay {
    /// Selecting a new place sets `characters_erase_previous`
    erase_on_change: bool,
    bindings: OverlayBindings,
    place: Option<Box<dyn FormWidget>>,
    /// Holds the position selector so it can be rebuilt in place
    position_slot: Option<NodeId>,
    position: Option<Box<dyn FormWidget>>,
    transition: Option<Box<dyn FormWidget>>,
}

impl PlaceOverlay {
    pub fn new(erase_on_change: bool) -> Self {
        Self {
            erase_on_change,
            bindings: OverlayBindings::default(),
            place: None,
            position_slot: None,
            position: None,
            transition: None,
        }
    }

    fn selected_place(&self) -> Option<Reference> {
        self.place
            .as_ref()
            .map(|w| Reference::from_form(&w.value().as_text(), &w.title()))
    }

    fn build_position(&mut self, place: &Reference, current: Option<PositionId>, data: &TrialData, ui: &mut UiServices) {
        let Some(slot) = self.position_slot else {
            return;
        };
        ui.surface.clear_children(slot);
        let positions = data.place_positions(place);
        let current = current
            .filter(|p| positions.iter().any(|pp| pp.id == *p))
            .map(|p| FormValue::Text(p.to_string()))
            .unwrap_or_default();
        self.position = Some(ui.form_element(
            slot,
            FormKind::Select,
            current,
            FormOptions::new().with_choices(position_choices(positions)),
        ));
    }
}

impl MiniEditor for PlaceOverlay {
    fn build(&mut self, host: NodeId, frame: &FrameData, data: &TrialData, ui: &mut UiServices) {
        self.bindings.attach(host);

        let place = ui.form_element(
            host,
            FormKind::Resource(ResourceKind::Place),
            FormValue::Text(frame.place.form_value()),
            FormOptions::new().with_choices(place_choices(data)).free_form(),
        );
        self.bindings.bind(
            ui,
            place.node(),
            UiEvent::Change,
            UiMessage::Overlay(OverlayAction::PlaceChanged),
        );
        self.place = Some(place);

        self.position_slot = Some(ui.element(host, "span"));
        self.build_position(&frame.place, frame.place_position, data, ui);

        let transitions = PlaceTransition::all()
            .iter()
            .map(|t| (transition_key(*t), t.display_name().to_string()))
            .collect();
        self.transition = Some(ui.form_element(
            host,
            FormKind::Select,
            FormValue::Text(transition_key(frame.place_transition)),
            FormOptions::new().with_choices(transitions),
        ));

        let editor = ui.localized(host, "button", "screen_editor");
        ui.surface.set_class(editor, "wide", true);
        self.bindings.bind(
            ui,
            editor,
            UiEvent::Click,
            UiMessage::Overlay(OverlayAction::OpenScreenEditor),
        );
        ui.translate(editor);
    }

    fn handle(&mut self, action: &OverlayAction, data: &TrialData, ui: &mut UiServices) -> Option<HostEdit> {
        if *action == OverlayAction::PlaceChanged {
            let place = self.selected_place().unwrap_or_default();
            let current = self
                .position
                .as_ref()
                .and_then(|w| w.value().as_int())
                .and_then(|p| PositionId::try_from(p).ok());
            self.build_position(&place, current, data, ui);
        }
        None
    }

    fn close_minieditor(&mut self, frame_id: FrameId, data: &mut TrialData, ui: &mut UiServices) -> bool {
        let place = self.selected_place();
        let position = self.position.take().and_then(|w| w.value().as_int());
        let transition = self
            .transition
            .take()
            .map(|w| parse_transition(&w.value().as_text()));
        self.place = None;
        self.position_slot = None;
        self.bindings.release(ui);

        let Some(place) = place else {
            return true;
        };
        // The row may have been deleted while the mini-editor was open
        if data.frame(frame_id).is_none() {
            return true;
        }
        let place = {
            let mut resolver = ResourceResolver::new(data);
            let resolved = resolver.resolve_reference(ResourceKind::Place, &place);
            for (_, id) in resolver.created() {
                info!("Created place {} for frame {}", id, frame_id);
            }
            resolved
        };
        let valid_positions = data.place_positions(&place);

        let Some(frame) = data.frame_mut(frame_id) else {
            return true;
        };
        if self.erase_on_change && place.is_set() && place != frame.place {
            frame.characters_erase_previous = true;
        }
        frame.place = place;
        frame.place_position = position
            .and_then(|p| PositionId::try_from(p).ok())
            .filter(|p| valid_positions.iter().any(|vp| vp.id == *p));
        if let Some(transition) = transition {
            frame.place_transition = transition;
        }
        true
    }
}
