//! Retained element tree, widgets, bindings, panel and locale of the egui host

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::rc::Rc;

use bevy::log::warn;

use crate::preview::ScreenSnapshot;
use crate::surface::{
    DocumentSurface, EditorPanel, EventRegistry, FormKind, FormOptions, FormValue, FormWidget,
    Localizer, NodeId, UiEvent, WidgetFactory,
};
use crate::UiMessage;

#[derive(Debug, Default)]
pub struct HostNode {
    pub tag: String,
    pub text: String,
    pub locale_key: Option<String>,
    pub classes: BTreeSet<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub stage: Option<ScreenSnapshot>,
}

impl HostNode {
    /// Text to draw: the translated or plain text, else the locale key
    pub fn label(&self) -> &str {
        if self.text.is_empty() {
            self.locale_key.as_deref().unwrap_or_default()
        } else {
            &self.text
        }
    }
}

/// The element tree built by the timeline, drawn by egui each frame
#[derive(Debug, Default)]
pub struct EguiDocument {
    nodes: HashMap<NodeId, HostNode>,
    next_id: NodeId,
    revision: u64,
}

impl EguiDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, node: NodeId) -> Option<&HostNode> {
        self.nodes.get(&node)
    }

    /// Bumped by every change to the tree
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn exists(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, node: HostNode) -> NodeId {
        self.revision += 1;
        self.next_id += 1;
        self.nodes.insert(self.next_id, node);
        self.next_id
    }

    fn destroy(&mut self, node: NodeId) {
        self.revision += 1;
        if let Some(n) = self.nodes.remove(&node) {
            for child in n.children {
                self.destroy(child);
            }
        }
    }
}

impl DocumentSurface for EguiDocument {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(HostNode {
            tag: tag.to_string(),
            ..Default::default()
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.insert(HostNode {
            tag: "#text".to_string(),
            text: text.to_string(),
            ..Default::default()
        })
    }

    fn create_localized(&mut self, tag: &str, key: &str) -> NodeId {
        self.insert(HostNode {
            tag: tag.to_string(),
            locale_key: Some(key.to_string()),
            ..Default::default()
        })
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.revision += 1;
        if let Some(old) = self.nodes.get(&child).and_then(|n| n.parent) {
            if let Some(p) = self.nodes.get_mut(&old) {
                p.children.retain(|c| *c != child);
            }
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(child);
        }
    }

    fn clear_children(&mut self, node: NodeId) {
        let children = match self.nodes.get_mut(&node) {
            Some(n) => std::mem::take(&mut n.children),
            None => return,
        };
        for child in children {
            self.destroy(child);
        }
    }

    fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.parent(node) {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != node);
            }
        }
        self.destroy(node);
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.nodes.get(&node).map_or(0, |n| n.children.len())
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn locale_key(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).and_then(|n| n.locale_key.clone())
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            if n.text != text {
                n.text = text.to_string();
                self.revision += 1;
            }
        }
    }

    fn set_class(&mut self, node: NodeId, class: &str, enabled: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            let changed = if enabled {
                n.classes.insert(class.to_string())
            } else {
                n.classes.remove(class)
            };
            if changed {
                self.revision += 1;
            }
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|n| n.classes.contains(class))
    }

    fn render_stage(&mut self, node: NodeId, snapshot: &ScreenSnapshot) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.stage = Some(snapshot.clone());
            self.revision += 1;
        }
    }
}

// ============================================================================
// Widgets
// ============================================================================

/// Value and options of a widget, shared with the egui pass that draws it
#[derive(Debug, Clone)]
pub struct WidgetState {
    pub kind: FormKind,
    pub value: FormValue,
    pub title: String,
    pub options: FormOptions,
    pub enabled: bool,
    pub selection: Option<(usize, usize)>,
    /// Cursor placed by the editor, pushed into egui on the next draw
    pub pending_selection: Option<(usize, usize)>,
}

struct EguiWidget {
    node: NodeId,
    state: Rc<RefCell<WidgetState>>,
}

impl FormWidget for EguiWidget {
    fn node(&self) -> NodeId {
        self.node
    }

    fn value(&self) -> FormValue {
        self.state.borrow().value.clone()
    }

    fn set_value(&mut self, value: FormValue) {
        self.state.borrow_mut().value = value;
    }

    fn title(&self) -> String {
        self.state.borrow().title.clone()
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.state.borrow_mut().enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    fn selection(&self) -> Option<(usize, usize)> {
        self.state.borrow().selection
    }

    fn set_selection(&mut self, start: usize, end: usize) {
        let mut state = self.state.borrow_mut();
        state.selection = Some((start, end));
        state.pending_selection = Some((start, end));
    }
}

#[derive(Default)]
pub struct EguiWidgets {
    states: HashMap<NodeId, Rc<RefCell<WidgetState>>>,
}

impl EguiWidgets {
    pub fn state(&self, node: NodeId) -> Option<Rc<RefCell<WidgetState>>> {
        self.states.get(&node).cloned()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Forget widgets whose element left the document
    pub fn prune(&mut self, document: &EguiDocument) {
        self.states.retain(|node, _| document.exists(*node));
    }
}

impl WidgetFactory for EguiWidgets {
    fn create_form_element(
        &mut self,
        surface: &mut dyn DocumentSurface,
        kind: FormKind,
        initial: FormValue,
        options: FormOptions,
    ) -> Box<dyn FormWidget> {
        let node = surface.create_element("input");
        let state = Rc::new(RefCell::new(WidgetState {
            kind,
            value: initial,
            title: String::new(),
            enabled: options.enabled,
            options,
            selection: None,
            pending_selection: None,
        }));
        self.states.insert(node, state.clone());
        Box::new(EguiWidget { node, state })
    }
}

// ============================================================================
// Bindings, panel, locale
// ============================================================================

#[derive(Debug, Default)]
pub struct EguiEvents {
    handlers: HashMap<(NodeId, UiEvent), UiMessage>,
}

impl EguiEvents {
    pub fn message(&self, node: NodeId, event: UiEvent) -> Option<UiMessage> {
        self.handlers.get(&(node, event)).cloned()
    }

    pub fn is_bound(&self, node: NodeId, event: UiEvent) -> bool {
        self.handlers.contains_key(&(node, event))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl EventRegistry for EguiEvents {
    fn on(&mut self, node: NodeId, event: UiEvent, message: UiMessage) {
        self.handlers.insert((node, event), message);
    }

    fn off(&mut self, node: NodeId, event: UiEvent) {
        self.handlers.remove(&(node, event));
    }
}

/// The modal editor window
#[derive(Debug, Default)]
pub struct EguiPanel {
    content: Option<NodeId>,
    title_key: String,
}

impl EguiPanel {
    pub fn content(&self) -> Option<NodeId> {
        self.content
    }

    pub fn title_key(&self) -> &str {
        &self.title_key
    }
}

impl EditorPanel for EguiPanel {
    fn open(&mut self, surface: &mut dyn DocumentSurface, title_key: &str) -> NodeId {
        let node = surface.create_element("div");
        surface.set_class(node, "editor_panel", true);
        self.content = Some(node);
        self.title_key = title_key.to_string();
        node
    }

    fn close(&mut self, surface: &mut dyn DocumentSurface) {
        if let Some(node) = self.content.take() {
            surface.remove(node);
        }
    }

    fn is_open(&self) -> bool {
        self.content.is_some()
    }
}

/// Locale key to display text. Keys without a translation show as themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locale {
    strings: HashMap<String, String>,
}

impl Locale {
    /// Parse a flat TOML table of `key = "text"` entries
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        Ok(Self {
            strings: toml::from_str(source)?,
        })
    }

    /// Load a locale file, falling back to bare keys on any failure
    pub fn load_or_default(path: &Path) -> Self {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(_) => return Self::default(),
        };
        match Self::from_toml_str(&source) {
            Ok(locale) => locale,
            Err(e) => {
                warn!("Failed to parse locale {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn text<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings.get(key).map(String::as_str).unwrap_or(key)
    }
}

impl Localizer for Locale {
    fn translate(&mut self, surface: &mut dyn DocumentSurface, node: NodeId) {
        if let Some(key) = surface.locale_key(node) {
            let text = self.text(&key).to_string();
            surface.set_text(node, &text);
        }
        for child in surface.children(node) {
            self.translate(surface, child);
        }
    }
}
