//! Mini-editors: transient forms that take over a row cell
//!
//! Hovering the screen, music or sound cell (or focusing the dialogue text)
//! opens a mini-editor in that cell. At most one is open at a time: opening a
//! new one first closes the current one, and the close routine of the
//! mini-editor itself decides what gets written back. A close that returns
//! `false` keeps the mini-editor open and aborts whatever asked for the close.

pub(crate) mod audio;
pub(crate) mod screen;
pub(crate) mod text;

pub use audio::{AudioOverlay, AudioSlot};
pub use screen::PlaceOverlay;
pub use text::{TextToolbox, TEXT_COLOURS};

use bevy::log::debug;
use trial_core::{FrameData, FrameId, TrialData};

use crate::messages::OverlayAction;
use crate::row::RowCell;
use crate::surface::{NodeId, UiEvent, UiServices};
use crate::UiMessage;

/// Edit a mini-editor asks of the row hosting it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEdit {
    /// Insert markup at the cursor of the dialogue text
    InsertText(String),
    /// Wrap the selected dialogue text in a colour tag, or colour the whole
    /// frame when nothing is selected
    Colour(String),
}

/// A mini-editor hosted by a row cell
pub trait MiniEditor {
    /// Build the form into `host`
    fn build(&mut self, host: NodeId, frame: &FrameData, data: &TrialData, ui: &mut UiServices);

    /// React to a message bound by the mini-editor itself
    fn handle(
        &mut self,
        _action: &OverlayAction,
        _data: &TrialData,
        _ui: &mut UiServices,
    ) -> Option<HostEdit> {
        None
    }

    /// Validate and write the edits back to frame `frame_id`, then release
    /// everything the mini-editor bound. Returning `false` keeps it open.
    fn close_minieditor(&mut self, frame_id: FrameId, data: &mut TrialData, ui: &mut UiServices) -> bool;
}

/// Result of asking the manager to close the open mini-editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseResult {
    NothingOpen,
    /// The cell that hosted it must be restored
    Closed { frame_id: FrameId, cell: RowCell },
    /// The mini-editor refused to close and stays open
    Refused,
}

struct ActiveOverlay {
    frame_id: FrameId,
    cell: RowCell,
    editor: Box<dyn MiniEditor>,
}

/// Owner of the single open mini-editor
#[derive(Default)]
pub struct OverlayManager {
    active: Option<ActiveOverlay>,
}

impl OverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Row and cell hosting the open mini-editor
    pub fn active_target(&self) -> Option<(FrameId, RowCell)> {
        self.active.as_ref().map(|a| (a.frame_id, a.cell))
    }

    /// Close the open mini-editor, if any
    pub fn close(&mut self, data: &mut TrialData, ui: &mut UiServices) -> CloseResult {
        let Some(mut active) = self.active.take() else {
            return CloseResult::NothingOpen;
        };
        if active.editor.close_minieditor(active.frame_id, data, ui) {
            debug!("Closed mini-editor on row {} ({:?})", active.frame_id, active.cell);
            CloseResult::Closed {
                frame_id: active.frame_id,
                cell: active.cell,
            }
        } else {
            self.active = Some(active);
            CloseResult::Refused
        }
    }

    /// Build `editor` into `host` and make it the open mini-editor.
    ///
    /// Returns `false` without building when another one is still open; callers
    /// must `close` first.
    pub fn open(
        &mut self,
        frame_id: FrameId,
        cell: RowCell,
        host: NodeId,
        mut editor: Box<dyn MiniEditor>,
        data: &TrialData,
        ui: &mut UiServices,
    ) -> bool {
        if self.active.is_some() {
            return false;
        }
        let Some(frame) = data.frame(frame_id) else {
            return false;
        };
        editor.build(host, frame, data, ui);
        debug!("Opened mini-editor on row {} ({:?})", frame_id, cell);
        self.active = Some(ActiveOverlay {
            frame_id,
            cell,
            editor,
        });
        true
    }

    /// Forward a mini-editor message to the open mini-editor. Returns the
    /// edit it wants applied to its row, if any.
    pub fn handle(
        &mut self,
        action: &OverlayAction,
        data: &TrialData,
        ui: &mut UiServices,
    ) -> Option<(FrameId, HostEdit)> {
        let active = self.active.as_mut()?;
        active
            .editor
            .handle(action, data, ui)
            .map(|edit| (active.frame_id, edit))
    }

    /// Drop the open mini-editor without writing anything back
    pub fn discard(&mut self) -> Option<(FrameId, RowCell)> {
        self.active.take().map(|a| (a.frame_id, a.cell))
    }
}

/// Host node and bindings of an open mini-editor
#[derive(Default)]
pub(crate) struct OverlayBindings {
    host: Option<NodeId>,
    bindings: Vec<(NodeId, UiEvent)>,
}

impl OverlayBindings {
    pub(crate) fn attach(&mut self, host: NodeId) {
        self.host = Some(host);
    }

    pub(crate) fn bind(&mut self, ui: &mut UiServices, node: NodeId, event: UiEvent, message: UiMessage) {
        ui.events.on(node, event, message);
        self.bindings.push((node, event));
    }

    /// Unbind everything and clear the host
    pub(crate) fn release(&mut self, ui: &mut UiServices) {
        for (node, event) in self.bindings.drain(..) {
            ui.events.off(node, event);
        }
        if let Some(host) = self.host.take() {
            ui.surface.clear_children(host);
        }
    }
}

#[cfg(test)]
mod tests;
