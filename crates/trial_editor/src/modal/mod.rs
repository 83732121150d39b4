//! Modal screen and music editors
//!
//! A modal session edits a disposable copy of one frame. Nothing reaches the
//! canonical collection until `confirm`, which resolves the copy's pending
//! resource references and then swaps it in at the frame's index in one step.
//! `cancel` drops the copy. Both clear the session's transient preview nodes
//! and close the editor panel; the timeline then refreshes the originating row.

mod composition;
mod form;
mod music_editor;
mod screen_editor;

pub use composition::{CharacterEditorMode, ScreenCompositionEditor};
pub use music_editor::MusicEditorSession;
pub use screen_editor::ScreenEditorSession;

use bevy::log::{debug, info};
use trial_core::{FrameData, FrameId, ResourceResolver, TrialData};

use crate::messages::ModalAction;
use crate::surface::{NodeId, UiServices};
use crate::EditorError;

/// The open modal editor
pub enum ModalSession {
    Screen(ScreenEditorSession),
    Music(MusicEditorSession),
}

impl ModalSession {
    /// Frame the session was opened on
    pub fn frame_id(&self) -> FrameId {
        match self {
            ModalSession::Screen(s) => s.frame_id(),
            ModalSession::Music(s) => s.frame_id(),
        }
    }

    pub fn draft(&self) -> &FrameData {
        match self {
            ModalSession::Screen(s) => s.draft(),
            ModalSession::Music(s) => s.draft(),
        }
    }

    pub fn render_preview(&mut self, data: &TrialData, ui: &mut UiServices) {
        match self {
            ModalSession::Screen(s) => s.render_preview(data, ui),
            ModalSession::Music(s) => s.render_preview(data, ui),
        }
    }

    /// Apply a control change to the draft and re-render the panel
    pub fn handle(&mut self, action: ModalAction, data: &TrialData, ui: &mut UiServices) -> Result<(), EditorError> {
        match self {
            ModalSession::Screen(s) => s.handle(action, data, ui),
            ModalSession::Music(s) => s.handle(action, data, ui),
        }
    }

    /// Element of the control sending `action`, if currently shown
    pub fn control(&self, action: ModalAction) -> Option<NodeId> {
        match self {
            ModalSession::Screen(s) => s.control(action),
            ModalSession::Music(s) => s.control(action),
        }
    }

    pub fn confirm(self, data: &mut TrialData, ui: &mut UiServices) -> Result<FrameId, EditorError> {
        match self {
            ModalSession::Screen(s) => s.confirm(data, ui),
            ModalSession::Music(s) => s.confirm(data, ui),
        }
    }

    pub fn cancel(self, ui: &mut UiServices) {
        match self {
            ModalSession::Screen(s) => s.cancel(ui),
            ModalSession::Music(s) => s.cancel(ui),
        }
    }
}

/// Copy of a frame under edit plus the panel it is shown in
pub(crate) struct DraftFrame {
    frame_id: FrameId,
    pub(crate) frame: FrameData,
    content: NodeId,
    previews: Vec<NodeId>,
}

impl DraftFrame {
    pub(crate) fn open(
        frame_id: FrameId,
        title_key: &str,
        data: &TrialData,
        ui: &mut UiServices,
    ) -> Result<Self, EditorError> {
        let frame = data
            .frame(frame_id)
            .cloned()
            .ok_or(EditorError::RowNotFound(frame_id))?;
        let content = ui.panel.open(&mut *ui.surface, title_key);
        debug!("Opened {} for frame {}", title_key, frame_id);
        Ok(Self {
            frame_id,
            frame,
            content,
            previews: Vec::new(),
        })
    }

    pub(crate) fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Panel element the editor renders into
    pub(crate) fn content(&self) -> NodeId {
        self.content
    }

    /// Create a transient preview element under the panel content
    pub(crate) fn preview_node(&mut self, tag: &str, ui: &mut UiServices) -> NodeId {
        let node = ui.element(self.content, tag);
        self.previews.push(node);
        node
    }

    pub(crate) fn clear_previews(&mut self, ui: &mut UiServices) {
        for node in self.previews.drain(..) {
            ui.surface.remove(node);
        }
    }

    /// Resolve the copy and swap it in for the canonical frame
    pub(crate) fn commit(mut self, data: &mut TrialData, ui: &mut UiServices) -> Result<FrameId, EditorError> {
        self.clear_previews(ui);
        ui.panel.close(&mut *ui.surface);

        let frame_id = self.frame_id;
        let index = data
            .frame_index(frame_id)
            .ok_or(EditorError::RowNotFound(frame_id))?;

        let mut frame = self.frame;
        frame.id = Some(frame_id);
        let mut resolver = ResourceResolver::new(data);
        resolver.resolve_frame(&mut frame);
        for (kind, id) in resolver.into_created() {
            info!("Created {} {} for frame {}", kind.display_name(), id, frame_id);
        }

        data.replace_frame_at(index, frame)?;
        info!("Committed modal edit of frame {}", frame_id);
        Ok(frame_id)
    }

    pub(crate) fn discard(mut self, ui: &mut UiServices) {
        self.clear_previews(ui);
        ui.panel.close(&mut *ui.surface);
        debug!("Discarded modal edit of frame {}", self.frame_id);
    }
}
