//! egui host of the frame timeline
//!
//! [`TimelineHost`] implements every interface in [`crate::surface`] on top of
//! a retained element tree, draws that tree with egui once per frame and feeds
//! the events the user fired back into [`FrameTimeline::handle`] as the
//! [`UiMessage`](crate::UiMessage)s they were bound to.

mod document;
mod draw;


pub use document::{EguiDocument, EguiEvents, EguiPanel, EguiWidgets, HostNode, Locale, WidgetState};
pub use draw::{DrawOutput, DrawPass};

use std::collections::HashSet;

use bevy::log::{debug, warn};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use trial_core::{FrameId, PresetLibrary, TrialData};

use crate::settings::TimelineSettings;
use crate::surface::{DocumentSurface, NodeId, UiServices};
use crate::timeline::FrameTimeline;
use crate::EditorContext;

/// The timeline and everything it draws into.
///
/// Holds boxed editors and shared widget state, so it lives in the world as
/// a non-send resource.
pub struct TimelineHost {
    document: EguiDocument,
    widgets: EguiWidgets,
    events: EguiEvents,
    locale: Locale,
    panel: EguiPanel,
    timeline: FrameTimeline,
    hovered: HashSet<NodeId>,
    synced: bool,
}

impl TimelineHost {
    pub fn new(locale: Locale) -> Self {
        let mut document = EguiDocument::new();
        let container = document.create_element("tbody");
        Self {
            document,
            widgets: EguiWidgets::default(),
            events: EguiEvents::default(),
            locale,
            panel: EguiPanel::default(),
            timeline: FrameTimeline::new(container),
            hovered: HashSet::new(),
            synced: false,
        }
    }

    pub fn timeline(&self) -> &FrameTimeline {
        &self.timeline
    }

    pub fn document(&self) -> &EguiDocument {
        &self.document
    }

    pub fn events(&self) -> &EguiEvents {
        &self.events
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn panel(&self) -> &EguiPanel {
        &self.panel
    }

    /// Rebuild the rows from the frame collection before the next pass
    pub fn resync(&mut self) {
        self.synced = false;
    }

    /// Draw one egui pass and act on what the user did
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        data: &mut TrialData,
        presets: &mut PresetLibrary,
        settings: &TimelineSettings,
    ) {
        let revision = self.document.revision();
        if !self.synced {
            if let Err(e) = self.with_context(data, presets, settings, |tl, ctx| tl.sync_rows(ctx)) {
                warn!("Failed to sync timeline rows: {}", e);
            }
            self.synced = true;
        }

        let mut pass = DrawPass::new(
            &self.document,
            &self.widgets,
            &self.events,
            &self.locale,
            &self.hovered,
        );
        pass.timeline(ctx, self.timeline.container());
        if let Some(content) = self.panel.content() {
            pass.panel(ctx, content, self.panel.title_key());
        }
        let (output, hovered) = pass.finish();
        self.hovered = hovered;

        self.apply(output, data, presets, settings);
        self.widgets.prune(&self.document);

        // The tree changed under egui; draw it again
        if self.document.revision() != revision {
            ctx.request_repaint();
        }
    }

    /// Deliver the messages bound to what happened during a pass
    pub fn apply(
        &mut self,
        output: DrawOutput,
        data: &mut TrialData,
        presets: &mut PresetLibrary,
        settings: &TimelineSettings,
    ) {
        for (node, event) in output.events {
            // An earlier message may have rebuilt the element
            let Some(message) = self.events.message(node, event) else {
                continue;
            };
            debug!("{:?} on {} delivers {:?}", event, node, message);
            if let Err(e) = self.with_context(data, presets, settings, |tl, ctx| tl.handle(message, ctx)) {
                warn!("Timeline rejected {:?} on {}: {}", event, node, e);
            }
        }

        if output.pointer_released && self.timeline.drag().is_dragging() {
            let target = output.pointer_over;
            if let Err(e) = self.with_context(data, presets, settings, |tl, ctx| tl.release_drag(target, ctx)) {
                warn!("Failed to drop frame: {}", e);
            }
        }

        if self.timeline.modal().is_some() && (output.confirm || output.cancel) {
            let result = self.with_context(data, presets, settings, |tl, ctx| {
                if output.confirm {
                    tl.confirm_modal(ctx)
                } else {
                    tl.cancel_modal(ctx)
                }
            });
            if let Err(e) = result {
                warn!("Failed to close the frame editor: {}", e);
            }
        }

        let visible: Vec<FrameId> = self
            .timeline
            .rows()
            .iter()
            .filter(|row| output.visible.contains(&row.root()))
            .map(|row| row.frame_id())
            .collect();
        if let Err(e) = self.with_context(data, presets, settings, |tl, ctx| tl.set_visible_rows(&visible, ctx)) {
            warn!("Failed to populate visible rows: {}", e);
        }
    }

    fn with_context<R>(
        &mut self,
        data: &mut TrialData,
        presets: &mut PresetLibrary,
        settings: &TimelineSettings,
        f: impl FnOnce(&mut FrameTimeline, &mut EditorContext) -> R,
    ) -> R {
        let mut ctx = EditorContext {
            data,
            presets,
            settings,
            ui: UiServices {
                surface: &mut self.document,
                widgets: &mut self.widgets,
                events: &mut self.events,
                localizer: &mut self.locale,
                panel: &mut self.panel,
            },
        };
        f(&mut self.timeline, &mut ctx)
    }
}

/// Draws the timeline every frame.
///
/// Edits made here bypass change detection; a change seen on [`TrialData`]
/// came from elsewhere, so the rows are rebuilt from it.
pub fn draw_frame_timeline(
    mut contexts: EguiContexts,
    mut host: NonSendMut<TimelineHost>,
    mut data: ResMut<TrialData>,
    mut presets: ResMut<PresetLibrary>,
    settings: Res<TimelineSettings>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };
    if data.is_changed() {
        host.resync();
    }
    host.show(ctx, data.bypass_change_detection(), &mut presets, &settings);
}
