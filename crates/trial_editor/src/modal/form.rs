//! Controls of a modal editor panel
//!
//! Every widget is keyed by the [`ModalAction`] its change event carries, so a
//! session can read the value back when the message arrives. The whole form is
//! rebuilt from the draft after each edit.

use std::collections::HashMap;

use crate::messages::{ModalAction, UiMessage};
use crate::surface::{FormKind, FormOptions, FormValue, FormWidget, NodeId, UiEvent, UiServices};

pub(crate) struct ModalForm {
    root: NodeId,
    bindings: Vec<(NodeId, UiEvent)>,
    widgets: HashMap<ModalAction, Box<dyn FormWidget>>,
}

impl ModalForm {
    /// A form rendered into a new element under `content`
    pub(crate) fn new(content: NodeId, ui: &mut UiServices) -> Self {
        let root = ui.element(content, "div");
        ui.surface.set_class(root, "content-panel", true);
        Self {
            root,
            bindings: Vec::new(),
            widgets: HashMap::new(),
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    /// Unbind and drop every control
    pub(crate) fn clear(&mut self, ui: &mut UiServices) {
        for (node, event) in self.bindings.drain(..) {
            ui.events.off(node, event);
        }
        self.widgets.clear();
        ui.surface.clear_children(self.root);
    }

    /// A titled block of controls
    pub(crate) fn section(&mut self, parent: NodeId, title_key: &str, ui: &mut UiServices) -> NodeId {
        ui.localized(parent, "h3", title_key);
        let section = ui.element(parent, "div");
        ui.surface.set_class(section, "char_row", true);
        section
    }

    /// A labelled widget whose change sends `action`
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn field(
        &mut self,
        parent: NodeId,
        label_key: &str,
        action: ModalAction,
        kind: FormKind,
        initial: FormValue,
        options: FormOptions,
        ui: &mut UiServices,
    ) -> NodeId {
        let label = ui.localized(parent, "label", label_key);
        let widget = ui.form_element(label, kind, initial, options);
        let node = widget.node();
        self.bind(node, UiEvent::Change, action, ui);
        self.widgets.insert(action, widget);
        node
    }

    /// A button whose click sends `action`
    pub(crate) fn button(&mut self, parent: NodeId, key: &str, action: ModalAction, ui: &mut UiServices) -> NodeId {
        let button = ui.localized(parent, "button", key);
        self.bind(button, UiEvent::Click, action, ui);
        button
    }

    fn bind(&mut self, node: NodeId, event: UiEvent, action: ModalAction, ui: &mut UiServices) {
        ui.events.on(node, event, UiMessage::Modal(action));
        self.bindings.push((node, event));
    }

    pub(crate) fn value(&self, action: ModalAction) -> FormValue {
        self.widgets
            .get(&action)
            .map(|w| w.value())
            .unwrap_or_default()
    }

    pub(crate) fn title(&self, action: ModalAction) -> String {
        self.widgets
            .get(&action)
            .map(|w| w.title())
            .unwrap_or_default()
    }

    pub(crate) fn widget_node(&self, action: ModalAction) -> Option<NodeId> {
        self.widgets.get(&action).map(|w| w.node())
    }

    pub(crate) fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}

/// Choice key of an enum value: its index in `all`
pub(crate) fn choice_key<T: PartialEq>(all: &[T], value: &T) -> String {
    all.iter()
        .position(|v| v == value)
        .unwrap_or(0)
        .to_string()
}

pub(crate) fn parse_choice<T: Copy>(all: &[T], key: &str) -> Option<T> {
    key.parse::<usize>().ok().and_then(|i| all.get(i).copied())
}

/// (key, label) choices over every value of an enum
pub(crate) fn enum_choices<T>(all: &[T], label: impl Fn(&T) -> &'static str) -> Vec<(String, String)> {
    all.iter()
        .enumerate()
        .map(|(i, v)| (i.to_string(), label(v).to_string()))
        .collect()
}
