//! Interfaces to the host UI: document surface, form widgets, event
//! registration, localization and the modal editor panel.
//!
//! The timeline never talks to a concrete toolkit. The embedding application
//! implements these traits; tests use the in-memory versions in `testing`.

use trial_core::ResourceKind;

use crate::preview::ScreenSnapshot;
use crate::UiMessage;

/// Handle of an element on the document surface
pub type NodeId = u64;

/// Input events a binding can listen for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiEvent {
    Click,
    Change,
    Focus,
    PointerEnter,
    PointerDown,
}

/// Primitive element creation and tree manipulation
pub trait DocumentSurface {
    fn create_element(&mut self, tag: &str) -> NodeId;
    fn create_text(&mut self, text: &str) -> NodeId;
    /// Element whose text comes from a locale key once translated
    fn create_localized(&mut self, tag: &str, key: &str) -> NodeId;
    fn append_child(&mut self, parent: NodeId, child: NodeId);
    /// Destroy every descendant of `node`
    fn clear_children(&mut self, node: NodeId);
    /// Detach and destroy `node` and its descendants
    fn remove(&mut self, node: NodeId);
    fn child_count(&self, node: NodeId) -> usize;
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    /// Key given to `create_localized`
    fn locale_key(&self, node: NodeId) -> Option<String>;
    fn set_text(&mut self, node: NodeId, text: &str);
    fn set_class(&mut self, node: NodeId, class: &str, enabled: bool);
    fn has_class(&self, node: NodeId, class: &str) -> bool;
    /// Hand a frame snapshot to the stage renderer drawing into `node`
    fn render_stage(&mut self, node: NodeId, snapshot: &ScreenSnapshot);
}

/// Value held by a form widget
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormValue {
    #[default]
    Empty,
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl FormValue {
    /// Textual form of the value, as a free-form entry would report it
    pub fn as_text(&self) -> String {
        match self {
            FormValue::Empty => String::new(),
            FormValue::Text(s) => s.clone(),
            FormValue::Bool(b) => b.to_string(),
            FormValue::Int(i) => i.to_string(),
            FormValue::Float(f) => f.to_string(),
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            FormValue::Bool(b) => *b,
            FormValue::Int(i) => *i != 0,
            FormValue::Text(s) => s == "true",
            _ => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FormValue::Int(i) => Some(*i),
            FormValue::Float(f) => Some(*f as i64),
            FormValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FormValue::Float(f) => Some(*f),
            FormValue::Int(i) => Some(*i as f64),
            FormValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Kind of form element to create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Text,
    TextArea,
    Checkbox,
    Integer,
    Decimal,
    Colour,
    Select,
    /// Picker over a resource collection that also accepts a typed path
    Resource(ResourceKind),
}

/// Construction options for a form element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormOptions {
    /// (value, label) pairs for selects
    pub choices: Vec<(String, String)>,
    /// Choice values shown but not selectable
    pub disabled_choices: Vec<String>,
    /// Whether the widget accepts values outside `choices`
    pub free_form: bool,
    pub enabled: bool,
}

impl FormOptions {
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn with_choices(mut self, choices: Vec<(String, String)>) -> Self {
        self.choices = choices;
        self
    }

    pub fn with_disabled(mut self, disabled: Vec<String>) -> Self {
        self.disabled_choices = disabled;
        self
    }

    pub fn free_form(mut self) -> Self {
        self.free_form = true;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A generic form element
pub trait FormWidget {
    /// Element to attach into the surface
    fn node(&self) -> NodeId;
    fn value(&self) -> FormValue;
    fn set_value(&mut self, value: FormValue);
    /// Human-readable label of a free-form entry
    fn title(&self) -> String;
    fn set_enabled(&mut self, enabled: bool);
    fn is_enabled(&self) -> bool;
    /// Selected character range of a text entry. Start equals end for a bare
    /// cursor; `None` when the widget has no cursor.
    fn selection(&self) -> Option<(usize, usize)> {
        None
    }
    fn set_selection(&mut self, _start: usize, _end: usize) {}
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

/// Insert `insert` at the cursor of a text widget, or at the end without one.
/// The cursor ends up after the inserted text.
pub fn insert_at_cursor(widget: &mut dyn FormWidget, insert: &str) {
    let text = widget.value().as_text();
    let len = text.chars().count();
    let (start, end) = widget
        .selection()
        .map(|(s, e)| (s.min(e).min(len), s.max(e).min(len)))
        .unwrap_or((len, len));
    let mut out = String::with_capacity(text.len() + insert.len());
    out.push_str(&text[..byte_offset(&text, start)]);
    out.push_str(insert);
    out.push_str(&text[byte_offset(&text, end)..]);
    widget.set_value(FormValue::Text(out));
    let cursor = start + insert.chars().count();
    widget.set_selection(cursor, cursor);
}

/// Wrap the selected text between `before` and `after`.
/// Returns `false` when nothing is selected.
pub fn wrap_selection(widget: &mut dyn FormWidget, before: &str, after: &str) -> bool {
    let text = widget.value().as_text();
    let len = text.chars().count();
    let Some((start, end)) = widget
        .selection()
        .map(|(s, e)| (s.min(e).min(len), s.max(e).min(len)))
        .filter(|(s, e)| e > s)
    else {
        return false;
    };
    let (a, b) = (byte_offset(&text, start), byte_offset(&text, end));
    let wrapped = format!("{}{}{}{}{}", &text[..a], before, &text[a..b], after, &text[b..]);
    widget.set_value(FormValue::Text(wrapped));
    let inner = start + before.chars().count();
    widget.set_selection(inner, inner + (end - start));
    true
}

/// Creates form elements on a surface
pub trait WidgetFactory {
    fn create_form_element(
        &mut self,
        surface: &mut dyn DocumentSurface,
        kind: FormKind,
        initial: FormValue,
        options: FormOptions,
    ) -> Box<dyn FormWidget>;
}

/// One handler per (node, event) pair; `on` replaces any existing one
pub trait EventRegistry {
    fn on(&mut self, node: NodeId, event: UiEvent, message: UiMessage);
    fn off(&mut self, node: NodeId, event: UiEvent);
}

/// Fills locale-tagged elements under `node`
pub trait Localizer {
    fn translate(&mut self, surface: &mut dyn DocumentSurface, node: NodeId);
}

/// Host of the modal screen and music editors
pub trait EditorPanel {
    /// Show the panel and return the element its content goes into
    fn open(&mut self, surface: &mut dyn DocumentSurface, title_key: &str) -> NodeId;
    fn close(&mut self, surface: &mut dyn DocumentSurface);
    fn is_open(&self) -> bool;
}

/// Bundle of UI collaborators handed to views
pub struct UiServices<'a> {
    pub surface: &'a mut dyn DocumentSurface,
    pub widgets: &'a mut dyn WidgetFactory,
    pub events: &'a mut dyn EventRegistry,
    pub localizer: &'a mut dyn Localizer,
    pub panel: &'a mut dyn EditorPanel,
}

impl UiServices<'_> {
    /// Create a form element and attach it under `parent`
    pub fn form_element(
        &mut self,
        parent: NodeId,
        kind: FormKind,
        initial: FormValue,
        options: FormOptions,
    ) -> Box<dyn FormWidget> {
        let widget = self
            .widgets
            .create_form_element(&mut *self.surface, kind, initial, options);
        self.surface.append_child(parent, widget.node());
        widget
    }

    /// Create a localized element under `parent`
    pub fn localized(&mut self, parent: NodeId, tag: &str, key: &str) -> NodeId {
        let node = self.surface.create_localized(tag, key);
        self.surface.append_child(parent, node);
        node
    }

    /// Create a plain text element under `parent`
    pub fn text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let node = self.surface.create_text(text);
        self.surface.append_child(parent, node);
        node
    }

    pub fn element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.surface.create_element(tag);
        self.surface.append_child(parent, node);
        node
    }

    pub fn translate(&mut self, node: NodeId) {
        self.localizer.translate(&mut *self.surface, node);
    }
}
