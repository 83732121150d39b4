//! In-memory UI collaborators for `#[cfg(test)]` modules in this crate.
//!
//! [`Fixture`] bundles trial data, presets, settings and a [`TestUi`] and hands
//! out an [`EditorContext`] on demand, so tests can alternate between driving
//! the timeline and inspecting the fakes:
//!
//! ```rust,ignore
//! let mut fx = Fixture::with_frames(3);
//! row.populate(&mut fx.ctx()).unwrap();
//! assert_eq!(fx.ui.events.binding_count(), row.binding_count());
//! ```
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use trial_core::{InsertPoint, PresetLibrary, TrialData};

use crate::preview::ScreenSnapshot;
use crate::settings::TimelineSettings;
use crate::surface::{
    DocumentSurface, EditorPanel, EventRegistry, FormKind, FormOptions, FormValue, FormWidget,
    Localizer, NodeId, UiEvent, UiServices, WidgetFactory,
};
use crate::{EditorContext, UiMessage};

// ============================================================================
// Surface
// ============================================================================

#[derive(Debug, Default)]
struct Node {
    tag: String,
    text: String,
    locale_key: Option<String>,
    classes: BTreeSet<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A document tree held in a map
#[derive(Debug, Default)]
pub struct MemorySurface {
    nodes: HashMap<NodeId, Node>,
    next_id: NodeId,
    stages: HashMap<NodeId, ScreenSnapshot>,
}

impl MemorySurface {
    fn insert(&mut self, node: Node) -> NodeId {
        self.next_id += 1;
        self.nodes.insert(self.next_id, node);
        self.next_id
    }

    fn destroy(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.remove(&node) {
            self.stages.remove(&node);
            for child in n.children {
                self.destroy(child);
            }
        }
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn exists(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.tag.as_str())
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Every node below `node`, depth first
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in self.children(node) {
            out.push(child);
            out.extend(self.descendants(child));
        }
        out
    }

    /// Concatenated text of `node` and its descendants
    pub fn text_content(&self, node: NodeId) -> String {
        let own = self.nodes.get(&node).map(|n| n.text.clone()).unwrap_or_default();
        self.children(node)
            .into_iter()
            .fold(own, |acc, child| acc + &self.text_content(child))
    }

    /// First descendant carrying the locale key `key`
    pub fn find_localized(&self, root: NodeId, key: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|n| self.nodes.get(n).and_then(|n| n.locale_key.as_deref()) == Some(key))
    }

    pub fn stage(&self, node: NodeId) -> Option<&ScreenSnapshot> {
        self.stages.get(&node)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl DocumentSurface for MemorySurface {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(Node {
            tag: tag.to_string(),
            ..Default::default()
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.insert(Node {
            tag: "#text".to_string(),
            text: text.to_string(),
            ..Default::default()
        })
    }

    fn create_localized(&mut self, tag: &str, key: &str) -> NodeId {
        self.insert(Node {
            tag: tag.to_string(),
            locale_key: Some(key.to_string()),
            ..Default::default()
        })
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
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
        MemorySurface::children(self, node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn locale_key(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).and_then(|n| n.locale_key.clone())
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.text = text.to_string();
        }
    }

    fn set_class(&mut self, node: NodeId, class: &str, enabled: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            if enabled {
                n.classes.insert(class.to_string());
            } else {
                n.classes.remove(class);
            }
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|n| n.classes.contains(class))
    }

    fn render_stage(&mut self, node: NodeId, snapshot: &ScreenSnapshot) {
        self.stages.insert(node, snapshot.clone());
    }
}

// ============================================================================
// Widgets
// ============================================================================

/// State shared between a widget and the factory that made it
#[derive(Debug, Clone)]
pub struct WidgetState {
    pub kind: FormKind,
    pub value: FormValue,
    pub title: String,
    pub options: FormOptions,
    pub enabled: bool,
    pub selection: Option<(usize, usize)>,
}

struct MemoryWidget {
    node: NodeId,
    state: Rc<RefCell<WidgetState>>,
}

impl FormWidget for MemoryWidget {
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
        self.state.borrow_mut().selection = Some((start, end));
    }
}

/// Widget factory that keeps a handle on every widget it created
#[derive(Default)]
pub struct MemoryWidgetFactory {
    widgets: HashMap<NodeId, Rc<RefCell<WidgetState>>>,
}

impl MemoryWidgetFactory {
    pub fn state(&self, node: NodeId) -> Option<WidgetState> {
        self.widgets.get(&node).map(|s| s.borrow().clone())
    }

    /// Simulate the user typing or picking `value`
    pub fn set_user_value(&self, node: NodeId, value: FormValue) {
        if let Some(state) = self.widgets.get(&node) {
            state.borrow_mut().value = value;
        }
    }

    /// Simulate a free-form entry with a typed label
    pub fn set_user_entry(&self, node: NodeId, value: &str, title: &str) {
        if let Some(state) = self.widgets.get(&node) {
            let mut state = state.borrow_mut();
            state.value = FormValue::Text(value.to_string());
            state.title = title.to_string();
        }
    }

    /// Simulate the user moving the cursor or selecting text
    pub fn set_user_selection(&self, node: NodeId, start: usize, end: usize) {
        if let Some(state) = self.widgets.get(&node) {
            state.borrow_mut().selection = Some((start, end));
        }
    }

    /// Every live widget of `kind` under `root`, in creation order
    pub fn all_of_kind(&self, surface: &MemorySurface, root: NodeId, kind: FormKind) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = surface
            .descendants(root)
            .into_iter()
            .filter(|n| self.widgets.get(n).is_some_and(|s| s.borrow().kind == kind))
            .collect();
        nodes.sort_unstable();
        nodes
    }

    /// Most recently created widget of `kind`
    pub fn last_of_kind(&self, kind: FormKind) -> Option<NodeId> {
        self.widgets
            .iter()
            .filter(|(_, s)| s.borrow().kind == kind)
            .map(|(node, _)| *node)
            .max()
    }

    pub fn created(&self) -> usize {
        self.widgets.len()
    }
}

impl WidgetFactory for MemoryWidgetFactory {
    fn create_form_element(
        &mut self,
        surface: &mut dyn DocumentSurface,
        kind: FormKind,
        initial: FormValue,
        options: FormOptions,
    ) -> Box<dyn FormWidget> {
        let tag = match kind {
            FormKind::TextArea => "textarea",
            FormKind::Select => "select",
            _ => "input",
        };
        let node = surface.create_element(tag);
        let state = Rc::new(RefCell::new(WidgetState {
            kind,
            value: initial,
            title: String::new(),
            enabled: options.enabled,
            options,
            selection: None,
        }));
        self.widgets.insert(node, state.clone());
        Box::new(MemoryWidget { node, state })
    }
}

// ============================================================================
// Events, localization, panel
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryEvents {
    handlers: HashMap<(NodeId, UiEvent), UiMessage>,
}

impl MemoryEvents {
    /// Message a user event on `node` would deliver
    pub fn message(&self, node: NodeId, event: UiEvent) -> Option<UiMessage> {
        self.handlers.get(&(node, event)).cloned()
    }

    pub fn binding_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_bound(&self, node: NodeId, event: UiEvent) -> bool {
        self.handlers.contains_key(&(node, event))
    }
}

impl EventRegistry for MemoryEvents {
    fn on(&mut self, node: NodeId, event: UiEvent, message: UiMessage) {
        self.handlers.insert((node, event), message);
    }

    fn off(&mut self, node: NodeId, event: UiEvent) {
        self.handlers.remove(&(node, event));
    }
}

#[derive(Debug, Default)]
pub struct CountingLocalizer {
    pub calls: usize,
}

impl Localizer for CountingLocalizer {
    fn translate(&mut self, _surface: &mut dyn DocumentSurface, _node: NodeId) {
        self.calls += 1;
    }
}

#[derive(Debug, Default)]
pub struct MemoryPanel {
    content: Option<NodeId>,
    pub title: Option<String>,
    pub opened: usize,
    pub closed: usize,
}

impl MemoryPanel {
    pub fn content(&self) -> Option<NodeId> {
        self.content
    }
}

impl EditorPanel for MemoryPanel {
    fn open(&mut self, surface: &mut dyn DocumentSurface, title_key: &str) -> NodeId {
        let node = surface.create_element("div");
        surface.set_class(node, "editor_panel", true);
        self.content = Some(node);
        self.title = Some(title_key.to_string());
        self.opened += 1;
        node
    }

    fn close(&mut self, surface: &mut dyn DocumentSurface) {
        if let Some(node) = self.content.take() {
            surface.remove(node);
            self.closed += 1;
        }
    }

    fn is_open(&self) -> bool {
        self.content.is_some()
    }
}

// ============================================================================
// Bundles
// ============================================================================

#[derive(Default)]
pub struct TestUi {
    pub surface: MemorySurface,
    pub widgets: MemoryWidgetFactory,
    pub events: MemoryEvents,
    pub localizer: CountingLocalizer,
    pub panel: MemoryPanel,
}

impl TestUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn services(&mut self) -> UiServices<'_> {
        UiServices {
            surface: &mut self.surface,
            widgets: &mut self.widgets,
            events: &mut self.events,
            localizer: &mut self.localizer,
            panel: &mut self.panel,
        }
    }
}

/// Trial data, presets, settings and UI fakes in one place
pub struct Fixture {
    pub data: TrialData,
    pub presets: PresetLibrary,
    pub settings: TimelineSettings,
    pub ui: TestUi,
}

impl Fixture {
    pub fn new() -> Self {
        let settings = TimelineSettings::default();
        Self {
            data: TrialData::new(),
            presets: PresetLibrary::with_capacity(settings.presets.max_presets),
            settings,
            ui: TestUi::new(),
        }
    }

    /// Fixture whose trial holds `count` blank frames with ids 1..=count
    pub fn with_frames(count: usize) -> Self {
        let mut fx = Self::new();
        for _ in 0..count {
            fx.data
                .insert_frame(InsertPoint::End, None)
                .expect("append to end");
        }
        fx
    }

    pub fn ctx(&mut self) -> EditorContext<'_> {
        EditorContext {
            data: &mut self.data,
            presets: &mut self.presets,
            settings: &self.settings,
            ui: self.ui.services(),
        }
    }
}
