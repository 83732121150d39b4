//! The frame timeline: one row per frame plus the shared editing state
//!
//! `FrameTimeline` owns the row views, the mini-editor manager, the drag
//! controller and the open modal session. The host forwards every bound
//! [`UiMessage`] to [`FrameTimeline::handle`] and tells the timeline which
//! rows are on screen with [`FrameTimeline::set_visible_rows`].

use bevy::log::{debug, warn};
use std::collections::HashMap;
use trial_core::{FrameId, InsertPoint, TrialData};

use crate::drag::{find_drop_target, DragController, DropOutcome};
use crate::messages::{ModalAction, OverlayAction, RowAction, UiMessage};
use crate::modal::{ModalSession, MusicEditorSession, ScreenEditorSession};
use crate::overlay::{AudioOverlay, CloseResult, MiniEditor, OverlayManager, PlaceOverlay, TextToolbox};
use crate::row::{FrameRowView, RowBehaviour, RowCell, RowOutcome};
use crate::surface::NodeId;
use crate::{EditorContext, EditorError};

/// Computes the behaviour of the row showing a frame
pub type BehaviourFn = Box<dyn Fn(FrameId, &TrialData) -> RowBehaviour>;

/// What the host has to follow up on after a timeline operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineOutcome {
    /// Rows were added, removed or reordered
    pub rows_changed: bool,
    /// Block structure changed; section navigation must be rebuilt
    pub sections_changed: bool,
    pub inserted: Vec<FrameId>,
    pub dropped: Option<DropOutcome>,
}

impl From<RowOutcome> for TimelineOutcome {
    fn from(outcome: RowOutcome) -> Self {
        Self {
            rows_changed: outcome.rows_changed,
            sections_changed: outcome.sections_changed,
            inserted: outcome.inserted,
            dropped: None,
        }
    }
}

/// Row behaviour derived from the block structure.
///
/// Block boundary frames are fixed; frames inside a cross-examination are
/// statements; everything else is a standard row.
pub fn default_behaviour(frame_id: FrameId, data: &TrialData) -> RowBehaviour {
    if let Some(block) = data.block_bounded_by(frame_id) {
        return RowBehaviour {
            insert: Some(InsertPoint::Before(frame_id)),
            block_insert_enabled: block.start_frame == frame_id,
            ..RowBehaviour::fixed()
        };
    }

    let index = data.frame_index(frame_id);
    let in_cross_examination = data
        .blocks
        .iter()
        .filter(|b| b.kind == trial_core::BlockKind::CrossExamination)
        .any(|b| {
            match (index, data.frame_index(b.start_frame), data.frame_index(b.end_frame)) {
                (Some(i), Some(start), Some(end)) => start < i && i < end,
                _ => false,
            }
        });

    if in_cross_examination {
        RowBehaviour::statement(frame_id)
    } else {
        RowBehaviour::standard(frame_id)
    }
}

pub struct FrameTimeline {
    container: NodeId,
    rows: Vec<FrameRowView>,
    overlays: OverlayManager,
    drag: DragController,
    modal: Option<ModalSession>,
    behaviour_for: BehaviourFn,
}

impl FrameTimeline {
    /// A timeline rendering its rows into `container`. Call `sync_rows` to build them.
    pub fn new(container: NodeId) -> Self {
        Self {
            container,
            rows: Vec::new(),
            overlays: OverlayManager::new(),
            drag: DragController::new(),
            modal: None,
            behaviour_for: Box::new(default_behaviour),
        }
    }

    pub fn with_behaviour(
        mut self,
        behaviour_for: impl Fn(FrameId, &TrialData) -> RowBehaviour + 'static,
    ) -> Self {
        self.behaviour_for = Box::new(behaviour_for);
        self
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn rows(&self) -> &[FrameRowView] {
        &self.rows
    }

    pub fn row(&self, frame_id: FrameId) -> Option<&FrameRowView> {
        self.rows.iter().find(|r| r.frame_id() == frame_id)
    }

    fn row_mut(&mut self, frame_id: FrameId) -> Result<&mut FrameRowView, EditorError> {
        self.rows
            .iter_mut()
            .find(|r| r.frame_id() == frame_id)
            .ok_or(EditorError::RowNotFound(frame_id))
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn modal(&self) -> Option<&ModalSession> {
        self.modal.as_ref()
    }

    pub fn modal_mut(&mut self) -> Option<&mut ModalSession> {
        self.modal.as_mut()
    }

    // ------------------------------------------------------------------
    // Row map
    // ------------------------------------------------------------------

    /// Bring the rows in line with the frame collection.
    ///
    /// Rows of surviving frames keep their population state; rows of removed
    /// frames are released; new frames get shell rows. Row elements are
    /// re-appended to the container in frame order.
    pub fn sync_rows(&mut self, ctx: &mut EditorContext) -> Result<(), EditorError> {
        let ids = ctx.data.frame_ids();
        let behaviours: Vec<RowBehaviour> = ids
            .iter()
            .map(|id| (self.behaviour_for)(*id, &*ctx.data))
            .collect();

        // A mini-editor on a row about to go away must close first
        if let Some((frame_id, _)) = self.overlays.active_target() {
            let survives = ids
                .iter()
                .zip(&behaviours)
                .any(|(id, b)| *id == frame_id && self.row(frame_id).is_some_and(|r| r.behaviour() == b));
            if !survives {
                self.close_overlay(ctx)?;
                if self.overlays.is_open() {
                    warn!("Discarding mini-editor of removed row {}", frame_id);
                    self.overlays.discard();
                }
            }
        }

        let mut old: HashMap<FrameId, FrameRowView> =
            self.rows.drain(..).map(|r| (r.frame_id(), r)).collect();
        let mut rows = Vec::with_capacity(ids.len());
        for (id, behaviour) in ids.into_iter().zip(behaviours) {
            let row = match old.remove(&id) {
                Some(row) if *row.behaviour() == behaviour => row,
                stale => {
                    if let Some(stale) = stale {
                        Self::drop_row(stale, ctx);
                    }
                    FrameRowView::new(id, behaviour, &*ctx.data, &mut ctx.ui)
                }
            };
            ctx.ui.surface.append_child(self.container, row.root());
            rows.push(row);
        }
        for (_, row) in old {
            Self::drop_row(row, ctx);
        }
        self.rows = rows;
        debug!("Timeline holds {} rows", self.rows.len());
        Ok(())
    }

    fn drop_row(mut row: FrameRowView, ctx: &mut EditorContext) {
        row.unpopulate(&*ctx.data, &mut ctx.ui);
        ctx.ui.surface.remove(row.root());
    }

    pub fn populate_row(&mut self, frame_id: FrameId, ctx: &mut EditorContext) -> Result<(), EditorError> {
        self.row_mut(frame_id)?.populate(ctx)
    }

    /// Release a row's bindings. Returns `false` when a mini-editor on the
    /// row refused to close, in which case the row stays populated.
    pub fn unpopulate_row(&mut self, frame_id: FrameId, ctx: &mut EditorContext) -> Result<bool, EditorError> {
        if self.overlays.active_target().is_some_and(|(f, _)| f == frame_id)
            && !self.close_overlay(ctx)?
        {
            return Ok(false);
        }
        self.row_mut(frame_id)?.unpopulate(&*ctx.data, &mut ctx.ui);
        Ok(true)
    }

    /// Populate exactly the rows of `visible`, unpopulating every other row
    pub fn set_visible_rows(&mut self, visible: &[FrameId], ctx: &mut EditorContext) -> Result<(), EditorError> {
        let ids: Vec<FrameId> = self.rows.iter().map(|r| r.frame_id()).collect();
        for id in ids {
            if visible.contains(&id) {
                self.populate_row(id, ctx)?;
            } else {
                self.unpopulate_row(id, ctx)?;
            }
        }
        Ok(())
    }

    /// Append a blank frame at the end of the trial
    pub fn append_frame(&mut self, ctx: &mut EditorContext) -> Result<FrameId, EditorError> {
        let id = ctx
            .data
            .insert_frame(InsertPoint::End, Some(ctx.settings.blank_frame()))?;
        self.sync_rows(ctx)?;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Act on a message delivered by a bound event
    pub fn handle(&mut self, message: UiMessage, ctx: &mut EditorContext) -> Result<TimelineOutcome, EditorError> {
        let (frame_id, action) = match message {
            UiMessage::Overlay(action) => return self.handle_overlay(action, ctx),
            UiMessage::Modal(action) => return self.handle_modal(action, ctx),
            UiMessage::Row { frame, action } => (frame, action),
        };

        let outcome = match action {
            RowAction::InsertBlank => self.row_mut(frame_id)?.insert_blank(ctx)?,
            RowAction::Delete => {
                if self.overlays.active_target().is_some_and(|(f, _)| f == frame_id)
                    && !self.close_overlay(ctx)?
                {
                    return Ok(TimelineOutcome::default());
                }
                self.row_mut(frame_id)?.delete(ctx)?
            }
            RowAction::FieldChanged(field) => self.row_mut(frame_id)?.apply_field(field, ctx)?,
            RowAction::UseCustomName(enabled) => {
                // The speaker box is rebuilt, which the toolbox would block
                if self.overlays.active_target() == Some((frame_id, RowCell::Dialogue))
                    && !self.close_overlay(ctx)?
                {
                    return Ok(TimelineOutcome::default());
                }
                self.row_mut(frame_id)?.use_custom_name(enabled, ctx)?
            }
            RowAction::AddContradiction => self.row_mut(frame_id)?.add_contradiction(ctx)?,
            RowAction::RemoveContradiction(index) => {
                self.row_mut(frame_id)?.remove_contradiction(index, ctx)?
            }
            RowAction::BeginDrag => {
                if self.close_overlay(ctx)? {
                    let row = self
                        .rows
                        .iter()
                        .find(|r| r.frame_id() == frame_id)
                        .ok_or(EditorError::RowNotFound(frame_id))?;
                    self.drag.begin(row, &mut ctx.ui);
                }
                RowOutcome::default()
            }
            RowAction::OpenOverlay(cell) => {
                // Hover editors stay closed while dragging
                if !self.drag.is_dragging() {
                    self.open_overlay(frame_id, cell, ctx)?;
                }
                RowOutcome::default()
            }
        };
        self.follow_up(outcome, ctx)
    }

    /// Messages bound by the open mini-editor. Edits it hands back are
    /// applied to its row right away.
    fn handle_overlay(&mut self, action: OverlayAction, ctx: &mut EditorContext) -> Result<TimelineOutcome, EditorError> {
        let Some((frame_id, _)) = self.overlays.active_target() else {
            debug!("Dropping {:?}: no mini-editor open", action);
            return Ok(TimelineOutcome::default());
        };
        match action {
            OverlayAction::OpenScreenEditor => {
                self.open_screen_editor(frame_id, ctx)?;
            }
            OverlayAction::OpenMusicEditor => {
                self.open_music_editor(frame_id, ctx)?;
            }
            action => {
                if let Some((frame_id, edit)) = self.overlays.handle(&action, &*ctx.data, &mut ctx.ui) {
                    self.row_mut(frame_id)?.apply_host_edit(&edit, ctx)?;
                }
            }
        }
        Ok(TimelineOutcome::default())
    }

    /// Control changes inside the open modal editor
    fn handle_modal(&mut self, action: ModalAction, ctx: &mut EditorContext) -> Result<TimelineOutcome, EditorError> {
        let session = self.modal.as_mut().ok_or(EditorError::NoActiveSession)?;
        session.handle(action, &*ctx.data, &mut ctx.ui)?;
        Ok(TimelineOutcome::default())
    }

    fn follow_up(&mut self, outcome: RowOutcome, ctx: &mut EditorContext) -> Result<TimelineOutcome, EditorError> {
        if outcome.presets_changed {
            for row in self.rows.iter_mut().filter(|r| r.is_populated()) {
                row.invalidate(RowCell::Insert);
                row.populate(ctx)?;
            }
        }
        if outcome.rows_changed {
            self.sync_rows(ctx)?;
        }
        Ok(outcome.into())
    }

    // ------------------------------------------------------------------
    // Mini-editors
    // ------------------------------------------------------------------

    /// Open the mini-editor of `cell` on a row, closing any open one first.
    ///
    /// Returns `false` if nothing was opened: the cell has no mini-editor, the
    /// same one is already open, or the open one refused to close.
    pub fn open_overlay(
        &mut self,
        frame_id: FrameId,
        cell: RowCell,
        ctx: &mut EditorContext,
    ) -> Result<bool, EditorError> {
        if self.overlays.active_target() == Some((frame_id, cell)) {
            return Ok(false);
        }
        let editor: Box<dyn MiniEditor> = match cell {
            RowCell::Screen => Box::new(PlaceOverlay::new(
                ctx.settings.screen.erase_previous_on_place_change,
            )),
            RowCell::Music => Box::new(AudioOverlay::music()),
            RowCell::Sound => Box::new(AudioOverlay::sound()),
            RowCell::Dialogue => Box::new(TextToolbox::new()),
            _ => return Ok(false),
        };
        if !self.close_overlay(ctx)? {
            return Ok(false);
        }

        let row = self.row_mut(frame_id)?;
        let host = row.host_overlay(cell, &mut ctx.ui);
        Ok(self
            .overlays
            .open(frame_id, cell, host, editor, &*ctx.data, &mut ctx.ui))
    }

    /// Close the open mini-editor and rebuild the cell it occupied.
    ///
    /// Returns `false` if it refused to close.
    pub fn close_overlay(&mut self, ctx: &mut EditorContext) -> Result<bool, EditorError> {
        match self.overlays.close(ctx.data, &mut ctx.ui) {
            CloseResult::NothingOpen => Ok(true),
            CloseResult::Refused => Ok(false),
            CloseResult::Closed { frame_id, cell } => {
                if let Some(row) = self.rows.iter_mut().find(|r| r.frame_id() == frame_id) {
                    row.overlay_closed(cell, &*ctx.data, &mut ctx.ui);
                    if row.is_populated() && ctx.data.frame(frame_id).is_some() {
                        row.populate(ctx)?;
                    }
                }
                Ok(true)
            }
        }
    }

    // ------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------

    /// End a drag with the pointer released over `target` (any node inside a row)
    pub fn release_drag(
        &mut self,
        target: Option<NodeId>,
        ctx: &mut EditorContext,
    ) -> Result<TimelineOutcome, EditorError> {
        let drop_at = target
            .and_then(|node| find_drop_target(&*ctx.ui.surface, node))
            .and_then(|root| self.rows.iter().find(|r| r.root() == root))
            .and_then(|row| row.behaviour().insert.map(|at| (row.frame_id(), at)));

        let dropped = self.drag.release(drop_at, ctx.data, &mut ctx.ui)?;
        let moved = matches!(dropped, DropOutcome::Moved { .. });
        if moved {
            self.sync_rows(ctx)?;
        }
        Ok(TimelineOutcome {
            rows_changed: moved,
            dropped: Some(dropped),
            ..Default::default()
        })
    }

    pub fn cancel_drag(&mut self, ctx: &mut EditorContext) {
        self.drag.cancel(&mut ctx.ui);
    }

    // ------------------------------------------------------------------
    // Modal editors
    // ------------------------------------------------------------------

    fn prepare_modal(&mut self, ctx: &mut EditorContext) -> Result<bool, EditorError> {
        if !self.close_overlay(ctx)? {
            return Ok(false);
        }
        if let Some(previous) = self.modal.take() {
            let frame_id = previous.frame_id();
            previous.cancel(&mut ctx.ui);
            self.refresh_row(frame_id, ctx)?;
        }
        Ok(true)
    }

    pub fn open_screen_editor(&mut self, frame_id: FrameId, ctx: &mut EditorContext) -> Result<bool, EditorError> {
        if !self.prepare_modal(ctx)? {
            return Ok(false);
        }
        self.modal = Some(ModalSession::Screen(ScreenEditorSession::open(frame_id, ctx)?));
        Ok(true)
    }

    pub fn open_music_editor(&mut self, frame_id: FrameId, ctx: &mut EditorContext) -> Result<bool, EditorError> {
        if !self.prepare_modal(ctx)? {
            return Ok(false);
        }
        self.modal = Some(ModalSession::Music(MusicEditorSession::open(frame_id, ctx)?));
        Ok(true)
    }

    /// Commit the open modal editor and refresh its row
    pub fn confirm_modal(&mut self, ctx: &mut EditorContext) -> Result<FrameId, EditorError> {
        let session = self.modal.take().ok_or(EditorError::NoActiveSession)?;
        let frame_id = session.confirm(ctx.data, &mut ctx.ui)?;
        self.refresh_row(frame_id, ctx)?;
        Ok(frame_id)
    }

    /// Drop the open modal editor's changes and refresh its row
    pub fn cancel_modal(&mut self, ctx: &mut EditorContext) -> Result<FrameId, EditorError> {
        let session = self.modal.take().ok_or(EditorError::NoActiveSession)?;
        let frame_id = session.frame_id();
        session.cancel(&mut ctx.ui);
        self.refresh_row(frame_id, ctx)?;
        Ok(frame_id)
    }

    /// Re-sync the row of the open modal editor with canonical data
    pub fn refresh_modal_row(&mut self, ctx: &mut EditorContext) -> Result<(), EditorError> {
        let frame_id = self
            .modal
            .as_ref()
            .map(|m| m.frame_id())
            .ok_or(EditorError::NoActiveSession)?;
        self.refresh_row(frame_id, ctx)
    }

    fn refresh_row(&mut self, frame_id: FrameId, ctx: &mut EditorContext) -> Result<(), EditorError> {
        match self.rows.iter_mut().find(|r| r.frame_id() == frame_id) {
            Some(row) if ctx.data.frame(frame_id).is_some() => row.repopulate(ctx),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Field;
    use crate::surface::{DocumentSurface, EditorPanel, FormKind, FormValue, UiEvent};
    use crate::testing::Fixture;
    use trial_core::{BlockKind, MusicTarget, Reference, ResourceKind};

    fn timeline(fx: &mut Fixture) -> FrameTimeline {
        let container = fx.ui.surface.create_element("tbody");
        let mut timeline = FrameTimeline::new(container);
        timeline.sync_rows(&mut fx.ctx()).unwrap();
        timeline
    }

    #[test]
    fn test_rows_follow_frames() {
        let mut fx = Fixture::with_frames(3);
        let mut tl = timeline(&mut fx);
        let ids: Vec<_> = tl.rows().iter().map(|r| r.frame_id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(fx.ui.surface.children(tl.container()).len(), 3);

        let id = tl.append_frame(&mut fx.ctx()).unwrap();
        assert_eq!(id, 4);
        assert_eq!(tl.rows().len(), 4);
    }

    #[test]
    fn test_insert_blank_and_delete_refresh_rows() {
        let mut fx = Fixture::with_frames(2);
        let mut tl = timeline(&mut fx);
        tl.populate_row(2, &mut fx.ctx()).unwrap();

        let outcome = tl
            .handle(UiMessage::row(2, RowAction::InsertBlank), &mut fx.ctx())
            .unwrap();
        assert!(outcome.rows_changed);
        assert_eq!(outcome.inserted, vec![3]);
        assert_eq!(fx.data.frame_ids(), vec![1, 3, 2]);
        let order: Vec<_> = tl.rows().iter().map(|r| r.frame_id()).collect();
        assert_eq!(order, vec![1, 3, 2]);
        // Surviving rows keep their population state
        assert!(tl.row(2).unwrap().is_populated());
        assert!(!tl.row(3).unwrap().is_populated());

        let root = tl.row(2).unwrap().root();
        tl.handle(UiMessage::row(2, RowAction::Delete), &mut fx.ctx())
            .unwrap();
        assert_eq!(fx.data.frame_ids(), vec![1, 3]);
        assert!(tl.row(2).is_none());
        assert!(!fx.ui.surface.exists(root));
    }

    #[test]
    fn test_visible_rows_are_populated_lazily() {
        let mut fx = Fixture::with_frames(4);
        let mut tl = timeline(&mut fx);
        assert_eq!(fx.ui.events.binding_count(), 0);

        tl.set_visible_rows(&[2, 3], &mut fx.ctx()).unwrap();
        let populated: Vec<_> = tl
            .rows()
            .iter()
            .filter(|r| r.is_populated())
            .map(|r| r.frame_id())
            .collect();
        assert_eq!(populated, vec![2, 3]);
        let bound: usize = tl.rows().iter().map(|r| r.binding_count()).sum();
        assert_eq!(fx.ui.events.binding_count(), bound);

        tl.set_visible_rows(&[], &mut fx.ctx()).unwrap();
        assert_eq!(fx.ui.events.binding_count(), 0);
    }

    #[test]
    fn test_only_one_overlay_open() {
        let mut fx = Fixture::with_frames(2);
        let mut tl = timeline(&mut fx);
        tl.set_visible_rows(&[1, 2], &mut fx.ctx()).unwrap();

        assert!(tl.open_overlay(1, RowCell::Music, &mut fx.ctx()).unwrap());
        assert!(!tl.row(1).unwrap().is_wired(RowCell::Music));
        assert!(tl.open_overlay(2, RowCell::Sound, &mut fx.ctx()).unwrap());

        assert_eq!(tl.overlays().active_target(), Some((2, RowCell::Sound)));
        // The first cell got its editors back
        assert!(tl.row(1).unwrap().is_wired(RowCell::Music));
        assert_eq!(tl.row(1).unwrap().overlay_cell(), None);

        // Re-opening the same overlay is a no-op
        assert!(!tl.open_overlay(2, RowCell::Sound, &mut fx.ctx()).unwrap());
    }

    #[test]
    fn test_music_overlay_resolves_typed_path() {
        let mut fx = Fixture::with_frames(1);
        let mut tl = timeline(&mut fx);
        tl.set_visible_rows(&[1], &mut fx.ctx()).unwrap();
        tl.open_overlay(1, RowCell::Music, &mut fx.ctx()).unwrap();

        let input = fx
            .ui
            .widgets
            .last_of_kind(FormKind::Resource(ResourceKind::Music))
            .unwrap();
        fx.ui.widgets.set_user_entry(input, "theme.mp3", "Theme");
        assert!(tl.close_overlay(&mut fx.ctx()).unwrap());

        assert_eq!(fx.data.frame(1).unwrap().music, MusicTarget::Play(Reference::Id(1)));
        assert_eq!(fx.data.music.len(), 2);
        assert_eq!(fx.data.music[1].name, "Theme");
        assert!(tl.row(1).unwrap().is_wired(RowCell::Music));
        assert!(!fx.ui.surface.text_content(tl.row(1).unwrap().cell_node(RowCell::Music)).is_empty());
    }

    #[test]
    fn test_text_toolbox_edits_at_cursor() {
        let mut fx = Fixture::with_frames(1);
        fx.data.frame_mut(1).unwrap().text_content = "Objection!".to_string();
        let mut tl = timeline(&mut fx);
        tl.set_visible_rows(&[1], &mut fx.ctx()).unwrap();

        let text_node = tl.row(1).unwrap().widget_node(Field::TextContent).unwrap();
        let focus = fx.ui.events.message(text_node, UiEvent::Focus).unwrap();
        tl.handle(focus, &mut fx.ctx()).unwrap();
        assert_eq!(tl.overlays().active_target(), Some((1, RowCell::Dialogue)));
        // The dialogue editors stay live while the toolbox is open
        assert!(fx.ui.events.is_bound(text_node, UiEvent::Change));

        let cell = tl.row(1).unwrap().cell_node(RowCell::Dialogue);
        fx.ui.widgets.set_user_selection(text_node, 9, 9);
        let shake = fx.ui.surface.find_localized(cell, "shake").unwrap();
        let click = fx.ui.events.message(shake, UiEvent::Click).unwrap();
        tl.handle(click, &mut fx.ctx()).unwrap();
        assert_eq!(fx.data.frame(1).unwrap().text_content, "Objection[#sb]!");

        fx.ui.widgets.set_user_selection(text_node, 0, 9);
        let red = fx.ui.surface.find_localized(cell, "red").unwrap();
        let click = fx.ui.events.message(red, UiEvent::Click).unwrap();
        tl.handle(click, &mut fx.ctx()).unwrap();
        assert_eq!(
            fx.data.frame(1).unwrap().text_content,
            "[#/colour:#F77337]Objection[/#][#sb]!"
        );
        assert!(tl.overlays().is_open());

        tl.close_overlay(&mut fx.ctx()).unwrap();
        assert!(fx.ui.surface.find_localized(cell, "shake").is_none());
    }

    #[test]
    fn test_custom_name_toggle_closes_toolbox() {
        let mut fx = Fixture::with_frames(1);
        fx.data.profiles.push(trial_core::Profile::new(2, "Gumshoe"));
        fx.data.frame_mut(1).unwrap().speaker = trial_core::SpeakerRef::Profile(2);
        let mut tl = timeline(&mut fx);
        tl.set_visible_rows(&[1], &mut fx.ctx()).unwrap();
        tl.open_overlay(1, RowCell::Dialogue, &mut fx.ctx()).unwrap();

        let cell = tl.row(1).unwrap().cell_node(RowCell::Dialogue);
        let sync = fx.ui.surface.find_localized(cell, "sync_set").unwrap();
        let click = fx.ui.events.message(sync, UiEvent::Click).unwrap();
        tl.handle(click, &mut fx.ctx()).unwrap();

        assert!(!tl.overlays().is_open());
        let frame = fx.data.frame(1).unwrap();
        assert!(frame.speaker_use_name);
        assert_eq!(frame.speaker_name, "Gumshoe");
        assert!(tl.row(1).unwrap().widget_node(Field::SpeakerName).is_some());
    }

    #[test]
    fn test_overlay_close_on_shell_row_restores_preview() {
        let mut fx = Fixture::with_frames(1);
        let mut tl = timeline(&mut fx);
        assert!(!tl.row(1).unwrap().is_populated());
        tl.open_overlay(1, RowCell::Sound, &mut fx.ctx()).unwrap();

        let input = fx
            .ui
            .widgets
            .last_of_kind(FormKind::Resource(ResourceKind::Sound))
            .unwrap();
        fx.ui.widgets.set_user_entry(input, "gavel.ogg", "Gavel");
        assert!(tl.close_overlay(&mut fx.ctx()).unwrap());

        let row = tl.row(1).unwrap();
        assert!(!row.is_populated());
        assert!(fx.ui.surface.text_content(row.cell_node(RowCell::Sound)).contains("Gavel"));
    }

    #[test]
    fn test_drag_suppresses_hover_and_moves_frame() {
        let mut fx = Fixture::with_frames(3);
        let mut tl = timeline(&mut fx);
        tl.set_visible_rows(&[1, 2, 3], &mut fx.ctx()).unwrap();

        tl.handle(UiMessage::row(3, RowAction::BeginDrag), &mut fx.ctx())
            .unwrap();
        assert!(tl.drag().is_dragging());
        tl.handle(
            UiMessage::row(1, RowAction::OpenOverlay(RowCell::Screen)),
            &mut fx.ctx(),
        )
        .unwrap();
        assert!(!tl.overlays().is_open());

        let target = tl.row(1).unwrap().cell_node(RowCell::Dialogue);
        let outcome = tl.release_drag(Some(target), &mut fx.ctx()).unwrap();
        assert_eq!(outcome.dropped, Some(DropOutcome::Moved { frame_id: 3, index: 0 }));
        assert_eq!(fx.data.frame_ids(), vec![3, 1, 2]);
        let order: Vec<_> = tl.rows().iter().map(|r| r.frame_id()).collect();
        assert_eq!(order, vec![3, 1, 2]);
        assert!(!tl.drag().is_dragging());
    }

    #[test]
    fn test_self_drop_leaves_collection() {
        let mut fx = Fixture::with_frames(3);
        let mut tl = timeline(&mut fx);
        tl.handle(UiMessage::row(2, RowAction::BeginDrag), &mut fx.ctx())
            .unwrap();
        let target = tl.row(2).unwrap().root();
        let outcome = tl.release_drag(Some(target), &mut fx.ctx()).unwrap();
        assert_eq!(outcome.dropped, Some(DropOutcome::SelfDrop));
        assert_eq!(fx.data.frame_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_save_preset_refreshes_every_insert_cell() {
        let mut fx = Fixture::with_frames(2);
        fx.data.frame_mut(1).unwrap().text_content = "Hello".to_string();
        let mut tl = timeline(&mut fx);
        tl.set_visible_rows(&[1, 2], &mut fx.ctx()).unwrap();

        let select = tl.row(1).unwrap().widget_node(Field::PresetChoice).unwrap();
        fx.ui
            .widgets
            .set_user_value(select, FormValue::Text("save".to_string()));
        tl.handle(
            UiMessage::row(1, RowAction::FieldChanged(Field::PresetChoice)),
            &mut fx.ctx(),
        )
        .unwrap();
        assert_eq!(fx.presets.len(), 1);

        let other = tl.row(2).unwrap().widget_node(Field::PresetChoice).unwrap();
        let state = fx.ui.widgets.state(other).unwrap();
        assert!(state.options.choices.iter().any(|(v, _)| v == "0"));

        // Insert the preset before row 2
        fx.ui
            .widgets
            .set_user_value(other, FormValue::Text("0".to_string()));
        let outcome = tl
            .handle(
                UiMessage::row(2, RowAction::FieldChanged(Field::PresetChoice)),
                &mut fx.ctx(),
            )
            .unwrap();
        let new_id = outcome.inserted[0];
        assert_eq!(fx.data.frame_ids(), vec![1, new_id, 2]);
        assert_eq!(fx.data.frame(new_id).unwrap().text_content, "Hello");
    }

    #[test]
    fn test_block_insert_reports_section_change() {
        let mut fx = Fixture::with_frames(1);
        let mut tl = timeline(&mut fx);
        tl.set_visible_rows(&[1], &mut fx.ctx()).unwrap();

        let select = tl.row(1).unwrap().widget_node(Field::BlockChoice).unwrap();
        fx.ui.widgets.set_user_value(
            select,
            FormValue::Text("cross_examination".to_string()),
        );
        let outcome = tl
            .handle(
                UiMessage::row(1, RowAction::FieldChanged(Field::BlockChoice)),
                &mut fx.ctx(),
            )
            .unwrap();
        assert!(outcome.sections_changed);
        assert_eq!(outcome.inserted.len(), 3);
        assert_eq!(fx.data.blocks[0].kind, BlockKind::CrossExamination);

        let statement = outcome.inserted[1];
        let start = outcome.inserted[0];
        assert_eq!(
            tl.row(statement).unwrap().behaviour(),
            &RowBehaviour::statement(statement)
        );
        assert!(!tl.row(start).unwrap().behaviour().deletable);
    }

    fn click_overlay_button(tl: &mut FrameTimeline, fx: &mut Fixture, frame_id: FrameId, cell: RowCell, key: &str) {
        tl.handle(UiMessage::row(frame_id, RowAction::OpenOverlay(cell)), &mut fx.ctx())
            .unwrap();
        let host = tl.row(frame_id).unwrap().cell_node(cell);
        let button = fx.ui.surface.find_localized(host, key).unwrap();
        let click = fx.ui.events.message(button, UiEvent::Click).unwrap();
        tl.handle(click, &mut fx.ctx()).unwrap();
    }

    #[test]
    fn test_modal_confirm_swaps_frame_and_refreshes_row() {
        let mut fx = Fixture::with_frames(2);
        fx.data.profiles.push(trial_core::Profile::new(1, "Phoenix"));
        let mut tl = timeline(&mut fx);
        tl.set_visible_rows(&[1, 2], &mut fx.ctx()).unwrap();

        click_overlay_button(&mut tl, &mut fx, 2, RowCell::Screen, "screen_editor");
        assert!(!tl.overlays().is_open());
        assert!(fx.ui.panel.is_open());
        {
            let Some(ModalSession::Screen(session)) = tl.modal_mut() else {
                panic!("screen editor not open");
            };
            let mut editor = session.composition();
            editor.set_place(Reference::pending("court.png", "Courtroom"), &fx.data);
            editor.add_character(1, &fx.data).unwrap();
        }
        // Canonical data is untouched until confirm
        assert!(!fx.data.frame(2).unwrap().has_place());

        assert_eq!(tl.confirm_modal(&mut fx.ctx()).unwrap(), 2);
        let frame = fx.data.frame(2).unwrap();
        assert_eq!(frame.place, Reference::Id(1));
        assert_eq!(frame.characters.len(), 1);
        assert!(frame.characters_erase_previous);
        assert_eq!(fx.data.frame_ids(), vec![1, 2]);
        assert!(tl.modal().is_none());
        assert_eq!(fx.ui.panel.closed, 1);

        let stage = fx
            .ui
            .surface
            .descendants(tl.row(2).unwrap().cell_node(RowCell::Screen))
            .into_iter()
            .find_map(|n| fx.ui.surface.stage(n).cloned())
            .unwrap();
        assert_eq!(stage.background.as_deref(), Some("court.png"));
    }

    #[test]
    fn test_modal_messages_edit_the_copy() {
        let mut fx = Fixture::with_frames(1);
        let mut tl = timeline(&mut fx);
        tl.set_visible_rows(&[1], &mut fx.ctx()).unwrap();
        assert_eq!(
            tl.handle(UiMessage::Modal(ModalAction::AddFade), &mut fx.ctx()),
            Err(EditorError::NoActiveSession)
        );

        click_overlay_button(&mut tl, &mut fx, 1, RowCell::Music, "music_editor");
        let Some(ModalSession::Music(session)) = tl.modal() else {
            panic!("music editor not open");
        };
        let track = session.control(ModalAction::Music).unwrap();
        fx.ui.widgets.set_user_value(track, FormValue::Text("stop".to_string()));
        let change = fx.ui.events.message(track, UiEvent::Change).unwrap();
        assert_eq!(change, UiMessage::Modal(ModalAction::Music));
        tl.handle(change, &mut fx.ctx()).unwrap();

        let Some(ModalSession::Music(session)) = tl.modal() else {
            panic!("music editor not open");
        };
        assert_eq!(session.draft().music, MusicTarget::Stop);
        // The form was rebuilt around the new music
        assert!(session.control(ModalAction::MusicFade).is_some());
        assert_eq!(fx.data.frame(1).unwrap().music, MusicTarget::Unchanged);
    }

    #[test]
    fn test_modal_cancel_leaves_data() {
        let mut fx = Fixture::with_frames(1);
        let mut tl = timeline(&mut fx);
        assert!(tl.open_music_editor(1, &mut fx.ctx()).unwrap());
        if let Some(ModalSession::Music(session)) = tl.modal_mut() {
            session.set_music(MusicTarget::Stop);
        }
        let before = fx.data.frames.clone();
        let nodes_with_panel = fx.ui.surface.node_count();

        tl.cancel_modal(&mut fx.ctx()).unwrap();
        assert_eq!(fx.data.frames, before);
        assert!(fx.ui.surface.node_count() < nodes_with_panel);
        assert_eq!(tl.cancel_modal(&mut fx.ctx()), Err(EditorError::NoActiveSession));
    }
}
