//! One egui pass over an [`EguiDocument`]
//!
//! Elements are drawn by tag: `button` and `a` are clickable, `h2`/`h3` are
//! headings, `tr` and labelled groups lay out horizontally, everything else
//! stacks vertically. Widgets are drawn from their shared [`WidgetState`] and
//! write user input straight back into it.

use std::collections::HashSet;

use bevy_egui::egui;
use bevy_egui::egui::text::{CCursor, CCursorRange};

use super::document::{EguiDocument, EguiEvents, EguiWidgets, HostNode, Locale, WidgetState};
use crate::preview::ScreenSnapshot;
use crate::surface::{DocumentSurface, FormKind, FormValue, NodeId, UiEvent};

/// What the user did during one pass
#[derive(Debug, Default)]
pub struct DrawOutput {
    /// Bound events in the order they fired
    pub events: Vec<(NodeId, UiEvent)>,
    /// Children of the timeline container within reach of the viewport
    pub visible: Vec<NodeId>,
    /// Innermost element under the pointer
    pub pointer_over: Option<NodeId>,
    pub pointer_released: bool,
    pub confirm: bool,
    pub cancel: bool,
}

pub struct DrawPass<'a> {
    document: &'a EguiDocument,
    widgets: &'a EguiWidgets,
    events: &'a EguiEvents,
    locale: &'a Locale,
    /// Elements under the pointer during the previous pass
    previous_hover: &'a HashSet<NodeId>,
    hover: HashSet<NodeId>,
    out: DrawOutput,
}

impl<'a> DrawPass<'a> {
    pub fn new(
        document: &'a EguiDocument,
        widgets: &'a EguiWidgets,
        events: &'a EguiEvents,
        locale: &'a Locale,
        previous_hover: &'a HashSet<NodeId>,
    ) -> Self {
        Self {
            document,
            widgets,
            events,
            locale,
            previous_hover,
            hover: HashSet::new(),
            out: DrawOutput::default(),
        }
    }

    /// Draw the rows under `container` in a scrolling central panel
    pub fn timeline(&mut self, ctx: &egui::Context, container: NodeId) {
        let rows = self.document.children(container);
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .id_salt("frame_timeline")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    // Rows a viewport away stay populated so they do not
                    // flip back to shells while scrolling
                    let reach = ui.clip_rect().expand(ui.clip_rect().height());
                    for row in rows {
                        let rect = self.node(ui, row);
                        if reach.intersects(rect) {
                            self.out.visible.push(row);
                        }
                        ui.separator();
                    }
                });
        });
        self.out.pointer_released = ctx.input(|i| i.pointer.any_released());
    }

    /// Draw the modal editor panel in a window with confirm and cancel
    pub fn panel(&mut self, ctx: &egui::Context, content: NodeId, title_key: &str) {
        let mut open = true;
        egui::Window::new(self.locale.text(title_key))
            .id(egui::Id::new("frame_editor_panel"))
            .collapsible(false)
            .open(&mut open)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("frame_editor_panel_scroll")
                    .show(ui, |ui| {
                        self.node(ui, content);
                    });
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button(self.locale.text("confirm")).clicked() {
                        self.out.confirm = true;
                    }
                    if ui.button(self.locale.text("cancel")).clicked() {
                        self.out.cancel = true;
                    }
                });
            });
        if !open {
            self.out.cancel = true;
        }
    }

    pub fn finish(self) -> (DrawOutput, HashSet<NodeId>) {
        (self.out, self.hover)
    }

    fn fire(&mut self, node: NodeId, event: UiEvent) {
        if self.events.is_bound(node, event) {
            self.out.events.push((node, event));
        }
    }

    fn node(&mut self, ui: &mut egui::Ui, node: NodeId) -> egui::Rect {
        let document = self.document;
        let Some(n) = document.node(node) else {
            return egui::Rect::NOTHING;
        };
        if let Some(state) = self.widgets.state(node) {
            let response = self.widget(ui, node, &mut state.borrow_mut());
            return self.track(ui, node, response);
        }

        let label = self.locale.text(n.label()).to_string();
        let response = match n.tag.as_str() {
            "#text" => ui.label(label),
            "button" => {
                let enabled = !n.classes.contains("disabled");
                let response = ui.add_enabled(enabled, egui::Button::new(label));
                if response.clicked() {
                    self.fire(node, UiEvent::Click);
                }
                response
            }
            "a" => {
                let response = ui.link(label);
                if response.clicked() {
                    self.fire(node, UiEvent::Click);
                }
                response
            }
            "h2" | "h3" => ui.heading(label),
            tag => {
                let horizontal = matches!(tag, "tr" | "label" | "span")
                    || n.classes.contains("controls")
                    || n.classes.contains("char_row");
                if horizontal {
                    ui.horizontal(|ui| self.contents(ui, n, &label)).response
                } else {
                    ui.vertical(|ui| self.contents(ui, n, &label)).response
                }
            }
        };
        self.track(ui, node, response)
    }

    fn contents(&mut self, ui: &mut egui::Ui, node: &HostNode, label: &str) {
        if !label.is_empty() {
            ui.label(label);
        }
        if let Some(stage) = &node.stage {
            draw_stage(ui, stage);
        }
        for child in &node.children {
            self.node(ui, *child);
        }
    }

    /// Hover and drag bookkeeping shared by every element
    fn track(&mut self, ui: &egui::Ui, node: NodeId, response: egui::Response) -> egui::Rect {
        if response.contains_pointer() {
            self.hover.insert(node);
            if self.out.pointer_over.is_none() {
                self.out.pointer_over = Some(node);
            }
            if !self.previous_hover.contains(&node) {
                self.fire(node, UiEvent::PointerEnter);
            }
        }
        if self.events.is_bound(node, UiEvent::PointerDown) {
            let drag = ui.interact(
                response.rect,
                egui::Id::new(("frame_drag", node)),
                egui::Sense::drag(),
            );
            if drag.drag_started() {
                self.fire(node, UiEvent::PointerDown);
            }
        }
        response.rect
    }

    fn widget(&mut self, ui: &mut egui::Ui, node: NodeId, state: &mut WidgetState) -> egui::Response {
        let id = egui::Id::new(("frame_widget", node));
        let response = ui
            .add_enabled_ui(state.enabled, |ui| match state.kind {
                FormKind::Text | FormKind::Colour => text_edit(ui, id, state, false),
                FormKind::TextArea => text_edit(ui, id, state, true),
                FormKind::Checkbox => {
                    let mut checked = state.value.as_bool();
                    let response = ui.checkbox(&mut checked, "");
                    if response.changed() {
                        state.value = FormValue::Bool(checked);
                    }
                    response
                }
                FormKind::Integer => {
                    let mut value = state.value.as_int().unwrap_or(0);
                    let response = ui.add(egui::DragValue::new(&mut value));
                    if response.changed() {
                        state.value = FormValue::Int(value);
                    }
                    response
                }
                FormKind::Decimal => {
                    let mut value = state.value.as_float().unwrap_or(0.0);
                    let response = ui.add(egui::DragValue::new(&mut value).speed(0.1));
                    if response.changed() {
                        state.value = FormValue::Float(value);
                    }
                    response
                }
                FormKind::Select | FormKind::Resource(_) => choice(ui, id, state),
            })
            .inner;
        if response.changed() {
            self.fire(node, UiEvent::Change);
        }
        if response.gained_focus() {
            self.fire(node, UiEvent::Focus);
        }
        response
    }
}

fn text_edit(ui: &mut egui::Ui, id: egui::Id, state: &mut WidgetState, multiline: bool) -> egui::Response {
    if let Some((start, end)) = state.pending_selection.take() {
        if let Some(mut edit) = egui::TextEdit::load_state(ui.ctx(), id) {
            let range = CCursorRange::two(CCursor::new(start), CCursor::new(end));
            edit.cursor.set_char_range(Some(range));
            edit.store(ui.ctx(), id);
        }
    }

    let mut text = state.value.as_text();
    let edit = if multiline {
        egui::TextEdit::multiline(&mut text)
    } else {
        egui::TextEdit::singleline(&mut text)
    };
    let output = edit.id(id).show(ui);
    if let Some(range) = output.cursor_range {
        let (a, b) = (range.primary.index, range.secondary.index);
        state.selection = Some((a.min(b), a.max(b)));
    }
    if output.response.changed() {
        state.value = FormValue::Text(text);
    }
    output.response
}

/// Select over the choices; free-form widgets also take a typed path and name
fn choice(ui: &mut egui::Ui, id: egui::Id, state: &mut WidgetState) -> egui::Response {
    let current = state.value.as_text();
    let known = state
        .options
        .choices
        .iter()
        .find(|(value, _)| *value == current)
        .map(|(_, label)| label.clone());
    let is_known = known.is_some();
    let selected = match known {
        Some(label) => label,
        None if !state.title.is_empty() => state.title.clone(),
        None => current.clone(),
    };

    let mut picked = None;
    let mut response = egui::ComboBox::from_id_salt(id)
        .selected_text(selected)
        .show_ui(ui, |ui| {
            for (value, label) in &state.options.choices {
                let enabled = !state.options.disabled_choices.contains(value);
                let item = ui
                    .add_enabled_ui(enabled, |ui| ui.selectable_label(*value == current, label.as_str()))
                    .inner;
                if item.clicked() {
                    picked = Some(value.clone());
                }
            }
        })
        .response;
    if let Some(value) = picked {
        state.value = FormValue::Text(value);
        state.title.clear();
        response.mark_changed();
    }

    if state.options.free_form {
        let mut typed = if is_known { String::new() } else { current };
        let path = ui.add(
            egui::TextEdit::singleline(&mut typed)
                .id(id.with("path"))
                .hint_text("path"),
        );
        let name = ui.add(
            egui::TextEdit::singleline(&mut state.title)
                .id(id.with("name"))
                .hint_text("name"),
        );
        if path.changed() {
            state.value = FormValue::Text(typed);
        }
        if path.changed() || name.changed() {
            response.mark_changed();
        }
    }
    response
}

fn draw_stage(ui: &mut egui::Ui, stage: &ScreenSnapshot) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        if let Some(background) = &stage.background {
            ui.label(background.as_str());
        }
        for character in &stage.characters {
            let position = character
                .position
                .map(|p| format!(" @{}", p))
                .unwrap_or_default();
            let mirror = if character.mirrored { " (mirrored)" } else { "" };
            ui.label(format!("{}{}{}", character.name, position, mirror));
        }
        for popup in &stage.popups {
            ui.label(popup.as_str());
        }
        if let Some(fade) = &stage.fade {
            ui.label(format!("{:?}", fade));
        }
    });
}
