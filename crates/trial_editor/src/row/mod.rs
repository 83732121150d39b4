//! Frame rows of the timeline
//!
//! A row starts as a shell: its cells exist and show static text previews, but
//! nothing is bound. `populate` builds the editors of every cell and binds their
//! events; `unpopulate` releases all of it and puts the static previews back.
//! Both are idempotent. Single cells can be invalidated and rebuilt without
//! touching the rest of the row.

mod behaviour;
mod cells;
pub(crate) mod edit;

pub use behaviour::{ActionDescriptor, RowBehaviour};
pub use edit::RowOutcome;

use bevy::log::debug;
use std::collections::{BTreeMap, BTreeSet};
use trial_core::{FrameData, FrameId, TrialData};

use crate::messages::{Field, UiMessage};
use crate::surface::{FormWidget, NodeId, UiEvent, UiServices};
use crate::{EditorContext, EditorError};

/// Class marking rows that accept dropped frames
pub const DROP_TARGET_CLASS: &str = "drop_target";
/// Class marking the row being dragged
pub const DRAGGED_CLASS: &str = "dragged";

/// Cells of a frame row, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowCell {
    Insert,
    DragHandle,
    Screen,
    Music,
    Sound,
    Dialogue,
    Controls,
    Action,
}

impl RowCell {
    pub fn all() -> &'static [RowCell] {
        &[
            RowCell::Insert,
            RowCell::DragHandle,
            RowCell::Screen,
            RowCell::Music,
            RowCell::Sound,
            RowCell::Dialogue,
            RowCell::Controls,
            RowCell::Action,
        ]
    }

    /// CSS class of the cell element
    pub fn class_name(&self) -> &'static str {
        match self {
            RowCell::Insert => "insert",
            RowCell::DragHandle => "handle",
            RowCell::Screen => "screen",
            RowCell::Music => "music",
            RowCell::Sound => "sound",
            RowCell::Dialogue => "dialogue",
            RowCell::Controls => "controls",
            RowCell::Action => "action",
        }
    }

    /// Cells that show a static preview while the row is a shell
    pub fn has_static_preview(&self) -> bool {
        matches!(
            self,
            RowCell::Screen | RowCell::Music | RowCell::Sound | RowCell::Dialogue
        )
    }
}

/// Population state of a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulationState {
    /// Static previews only, nothing bound
    Shell,
    /// Every applicable cell is wired
    Populated,
    /// Populated, but these cells must be rebuilt on the next `populate`
    PartiallyInvalidated(BTreeSet<RowCell>),
}

/// Bindings and widgets a wired cell owns
#[derive(Default)]
pub(crate) struct CellWiring {
    bindings: Vec<(NodeId, UiEvent)>,
    widgets: Vec<(Field, Box<dyn FormWidget>)>,
}

impl CellWiring {
    pub(crate) fn bind(
        &mut self,
        ui: &mut UiServices,
        node: NodeId,
        event: UiEvent,
        message: UiMessage,
    ) {
        ui.events.on(node, event, message);
        self.bindings.push((node, event));
    }

    pub(crate) fn add_widget(&mut self, field: Field, widget: Box<dyn FormWidget>) {
        self.widgets.push((field, widget));
    }

    fn release(&mut self, ui: &mut UiServices) {
        for (node, event) in self.bindings.drain(..) {
            ui.events.off(node, event);
        }
        self.widgets.clear();
    }
}

/// One row of the frame timeline
pub struct FrameRowView {
    frame_id: FrameId,
    behaviour: RowBehaviour,
    root: NodeId,
    cells: BTreeMap<RowCell, NodeId>,
    wiring: BTreeMap<RowCell, CellWiring>,
    state: PopulationState,
    /// Cell currently hosting a mini-editor
    overlay_cell: Option<RowCell>,
    /// Slot of the dialogue cell the text toolbox is built into
    toolbox_slot: Option<NodeId>,
}

impl FrameRowView {
    /// Build the shell of a row for `frame_id`
    pub fn new(
        frame_id: FrameId,
        behaviour: RowBehaviour,
        data: &TrialData,
        ui: &mut UiServices,
    ) -> Self {
        let root = ui.surface.create_element("tr");
        ui.surface.set_class(root, "frame_row", true);
        if behaviour.insert.is_some() {
            ui.surface.set_class(root, DROP_TARGET_CLASS, true);
        }

        let mut cells = BTreeMap::new();
        for cell in RowCell::all() {
            let node = ui.element(root, "td");
            ui.surface.set_class(node, cell.class_name(), true);
            cells.insert(*cell, node);
        }

        let mut row = Self {
            frame_id,
            behaviour,
            root,
            cells,
            wiring: BTreeMap::new(),
            state: PopulationState::Shell,
            overlay_cell: None,
            toolbox_slot: None,
        };
        if let Some(frame) = data.frame(frame_id) {
            row.render_static_previews(frame, data, ui);
        }
        row
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn behaviour(&self) -> &RowBehaviour {
        &self.behaviour
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn state(&self) -> &PopulationState {
        &self.state
    }

    pub fn is_populated(&self) -> bool {
        !matches!(self.state, PopulationState::Shell)
    }

    pub fn cell_node(&self, cell: RowCell) -> NodeId {
        self.cells[&cell]
    }

    /// Whether the given cell currently has live bindings
    pub fn is_wired(&self, cell: RowCell) -> bool {
        self.wiring
            .get(&cell)
            .is_some_and(|w| !w.bindings.is_empty() || !w.widgets.is_empty())
    }

    /// Number of live event bindings across the row
    pub fn binding_count(&self) -> usize {
        self.wiring.values().map(|w| w.bindings.len()).sum()
    }

    pub fn overlay_cell(&self) -> Option<RowCell> {
        self.overlay_cell
    }

    /// Cells this row's behaviour gives editors to
    pub fn applicable_cells(&self) -> Vec<RowCell> {
        RowCell::all()
            .iter()
            .copied()
            .filter(|cell| match cell {
                RowCell::Insert => self.behaviour.insert.is_some(),
                RowCell::DragHandle => self.behaviour.deletable,
                RowCell::Action => self.behaviour.action != ActionDescriptor::None,
                _ => true,
            })
            .collect()
    }

    pub(crate) fn widget(&self, field: Field) -> Option<&dyn FormWidget> {
        self.wiring
            .values()
            .flat_map(|w| w.widgets.iter())
            .find(|(f, _)| *f == field)
            .map(|(_, widget)| widget.as_ref())
    }

    pub(crate) fn widget_mut(&mut self, field: Field) -> Option<&mut Box<dyn FormWidget>> {
        self.wiring
            .values_mut()
            .flat_map(|w| w.widgets.iter_mut())
            .find(|(f, _)| *f == field)
            .map(|(_, widget)| widget)
    }

    /// Surface node of the widget bound to `field`
    pub fn widget_node(&self, field: Field) -> Option<NodeId> {
        self.widget(field).map(|w| w.node())
    }

    /// Mark a cell for rebuild on the next `populate`. No effect on a shell.
    pub fn invalidate(&mut self, cell: RowCell) {
        match &mut self.state {
            PopulationState::Shell => {}
            PopulationState::Populated => {
                self.state = PopulationState::PartiallyInvalidated(BTreeSet::from([cell]));
            }
            PopulationState::PartiallyInvalidated(cells) => {
                cells.insert(cell);
            }
        }
    }

    /// Mark every cell for rebuild
    pub fn invalidate_all(&mut self) {
        for cell in RowCell::all() {
            self.invalidate(*cell);
        }
    }

    /// Build and bind every cell that is not already wired
    pub fn populate(&mut self, ctx: &mut EditorContext) -> Result<(), EditorError> {
        let pending: Vec<RowCell> = match &self.state {
            PopulationState::Populated => return Ok(()),
            PopulationState::Shell => self.applicable_cells(),
            PopulationState::PartiallyInvalidated(cells) => cells
                .iter()
                .copied()
                .filter(|cell| self.applicable_cells().contains(cell))
                .collect(),
        };

        let frame = ctx
            .data
            .frame(self.frame_id)
            .cloned()
            .ok_or(EditorError::RowNotFound(self.frame_id))?;

        for cell in pending {
            // The mini-editor owns this cell until it closes
            if self.overlay_cell == Some(cell) {
                continue;
            }
            self.unwire_cell(cell, &mut ctx.ui);
            self.wire_cell(cell, &frame, &*ctx.data, &*ctx.presets, &mut ctx.ui);
        }

        debug!("Populated row {}", self.frame_id);
        self.state = PopulationState::Populated;
        Ok(())
    }

    /// Release every binding and fall back to static previews
    pub fn unpopulate(&mut self, data: &TrialData, ui: &mut UiServices) {
        if matches!(self.state, PopulationState::Shell) {
            return;
        }

        for cell in RowCell::all() {
            self.unwire_cell(*cell, ui);
        }
        self.overlay_cell = None;
        self.toolbox_slot = None;

        if let Some(frame) = data.frame(self.frame_id) {
            self.render_static_previews(frame, data, ui);
        }
        debug!("Unpopulated row {}", self.frame_id);
        self.state = PopulationState::Shell;
    }

    /// Invalidate everything and populate again from canonical data
    pub fn repopulate(&mut self, ctx: &mut EditorContext) -> Result<(), EditorError> {
        if !self.is_populated() {
            if let Some(frame) = ctx.data.frame(self.frame_id) {
                self.render_static_previews(frame, &*ctx.data, &mut ctx.ui);
            }
            return Ok(());
        }
        self.invalidate_all();
        self.populate(ctx)
    }

    fn unwire_cell(&mut self, cell: RowCell, ui: &mut UiServices) {
        if let Some(mut wiring) = self.wiring.remove(&cell) {
            wiring.release(ui);
        }
        if cell == RowCell::Dialogue {
            self.toolbox_slot = None;
        }
        ui.surface.clear_children(self.cells[&cell]);
    }

    fn render_static_previews(&mut self, frame: &FrameData, data: &TrialData, ui: &mut UiServices) {
        for cell in RowCell::all().iter().filter(|c| c.has_static_preview()) {
            self.render_static_preview(*cell, frame, data, ui);
        }
    }

    fn render_static_preview(&mut self, cell: RowCell, frame: &FrameData, data: &TrialData, ui: &mut UiServices) {
        let node = self.cells[&cell];
        ui.surface.clear_children(node);
        let text = cells::static_preview(cell, frame, data);
        if !text.is_empty() {
            ui.text(node, &text);
        }
    }

    // ------------------------------------------------------------------
    // Mini-editor hosting
    // ------------------------------------------------------------------

    /// Hand `cell` over to a mini-editor and return the node to build it into.
    ///
    /// The dialogue cell keeps its editors and hosts the toolbox in a slot;
    /// other cells are cleared and replaced by the mini-editor.
    pub fn host_overlay(&mut self, cell: RowCell, ui: &mut UiServices) -> NodeId {
        self.overlay_cell = Some(cell);
        match (cell, self.toolbox_slot) {
            (RowCell::Dialogue, Some(slot)) => {
                ui.surface.clear_children(slot);
                slot
            }
            _ => {
                self.unwire_cell(cell, ui);
                self.cells[&cell]
            }
        }
    }

    /// The mini-editor on `cell` closed. A populated row rebuilds the cell on
    /// the next populate; a shell gets the cell's static preview back.
    pub fn overlay_closed(&mut self, cell: RowCell, data: &TrialData, ui: &mut UiServices) {
        if self.overlay_cell == Some(cell) {
            self.overlay_cell = None;
        }
        if self.is_populated() {
            self.invalidate(cell);
        } else if let Some(frame) = data.frame(self.frame_id) {
            self.render_static_preview(cell, frame, data, ui);
        }
    }
}
