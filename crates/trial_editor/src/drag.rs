//! Drag-and-drop reordering of frame rows
//!
//! Pressing a row's drag handle enters drag mode; releasing over another row
//! that accepts drops moves the dragged frame to that row's insert point.
//! Hover mini-editors stay closed for the whole drag.

use bevy::log::debug;
use trial_core::{FrameId, InsertPoint, TrialData};

use crate::row::{FrameRowView, DRAGGED_CLASS, DROP_TARGET_CLASS};
use crate::surface::{DocumentSurface, NodeId, UiServices};
use crate::EditorError;

/// Result of releasing a drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// The frame now sits at `index` of the collection
    Moved { frame_id: FrameId, index: usize },
    /// Dropped onto its own row; nothing changed
    SelfDrop,
    /// Released outside any drop target
    NoTarget,
    NotDragging,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    frame_id: FrameId,
    source_root: NodeId,
}

#[derive(Debug, Default)]
pub struct DragController {
    active: Option<DragState>,
}

/// Closest ancestor of `node` (itself included) marked as a drop target
pub fn find_drop_target(surface: &dyn DocumentSurface, node: NodeId) -> Option<NodeId> {
    let mut current = Some(node);
    while let Some(n) = current {
        if surface.has_class(n, DROP_TARGET_CLASS) {
            return Some(n);
        }
        current = surface.parent(n);
    }
    None
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn dragged_frame(&self) -> Option<FrameId> {
        self.active.map(|s| s.frame_id)
    }

    /// Start dragging `row`. Rows that cannot be deleted cannot be moved.
    pub fn begin(&mut self, row: &FrameRowView, ui: &mut UiServices) -> bool {
        if !row.behaviour().deletable {
            return false;
        }
        if let Some(previous) = self.active.take() {
            ui.surface.set_class(previous.source_root, DRAGGED_CLASS, false);
        }
        ui.surface.set_class(row.root(), DRAGGED_CLASS, true);
        self.active = Some(DragState {
            frame_id: row.frame_id(),
            source_root: row.root(),
        });
        debug!("Dragging frame {}", row.frame_id());
        true
    }

    /// Leave drag mode without moving anything
    pub fn cancel(&mut self, ui: &mut UiServices) {
        if let Some(state) = self.active.take() {
            ui.surface.set_class(state.source_root, DRAGGED_CLASS, false);
        }
    }

    /// Finish the drag over the row of `target` with its insert point.
    ///
    /// The frame is removed then reinserted, keeping its id. Drag mode ends
    /// whatever the outcome.
    pub fn release(
        &mut self,
        target: Option<(FrameId, InsertPoint)>,
        data: &mut TrialData,
        ui: &mut UiServices,
    ) -> Result<DropOutcome, EditorError> {
        let Some(state) = self.active.take() else {
            return Ok(DropOutcome::NotDragging);
        };
        ui.surface.set_class(state.source_root, DRAGGED_CLASS, false);

        let Some((target_frame, at)) = target else {
            return Ok(DropOutcome::NoTarget);
        };
        if target_frame == state.frame_id || at == InsertPoint::Before(state.frame_id) {
            debug!("Frame {} dropped onto itself", state.frame_id);
            return Ok(DropOutcome::SelfDrop);
        }

        let source_index = data
            .frame_index(state.frame_id)
            .ok_or(EditorError::RowNotFound(state.frame_id))?;
        let frame = data.remove_frame(state.frame_id)?;
        match data.insert_frame(at, Some(frame.clone())) {
            Ok(frame_id) => {
                let index = data.frame_index(frame_id).unwrap_or_default();
                debug!("Moved frame {} to index {}", frame_id, index);
                Ok(DropOutcome::Moved { frame_id, index })
            }
            Err(e) => {
                data.frames.insert(source_index, frame);
                Err(e.into())
            }
        }
    }
}
