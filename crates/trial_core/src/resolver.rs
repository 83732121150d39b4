//! Find-or-create resolution of free-form resource values
//!
//! A user may pick an existing music/sound/place/popup record or type a path.
//! Paths are resolved at commit time: an existing internal record with the same
//! path is reused, otherwise a new record is appended. The same algorithm serves
//! every resource kind; only the collection and the path field differ.

use crate::{FrameData, MusicTarget, Reference, ResourceId, ResourceKind, ResourceRecord, TrialData};

/// Outcome of resolving one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub id: ResourceId,
    /// Whether a new record was appended
    pub created: bool,
}

/// Resolve `value` against `records`.
///
/// Numeric values pass through untouched, whether or not a record with that id
/// exists. Paths match the first internal record with the same source, skipping
/// the reserved record at index 0, and create one named `title` otherwise.
pub fn resolve_in<R: ResourceRecord>(records: &mut Vec<R>, value: &str, title: &str) -> Resolution {
    match Reference::from_form(value, title) {
        Reference::Id(id) => Resolution { id, created: false },
        // An empty value has no path to match; treat it like any other path so the
        // caller always gets an id back.
        Reference::Unset | Reference::Pending { .. } => find_or_create(records, value, title),
    }
}

fn find_or_create<R: ResourceRecord>(records: &mut Vec<R>, path: &str, title: &str) -> Resolution {
    if let Some(existing) = records
        .iter()
        .skip(1)
        .find(|r| !r.is_external() && r.source() == path)
    {
        return Resolution {
            id: existing.id(),
            created: false,
        };
    }

    let id = records.iter().map(|r| r.id()).max().unwrap_or(0) + 1;
    if records.is_empty() {
        records.push(R::placeholder());
    }
    records.push(R::create(id, title, path));
    Resolution { id, created: true }
}

/// Resolution over a trial's resource collections
pub struct ResourceResolver<'a> {
    data: &'a mut TrialData,
    created: Vec<(ResourceKind, ResourceId)>,
}

impl<'a> ResourceResolver<'a> {
    pub fn new(data: &'a mut TrialData) -> Self {
        Self {
            data,
            created: Vec::new(),
        }
    }

    /// Resolve a raw form value of `kind` to a record id
    pub fn resolve(&mut self, kind: ResourceKind, value: &str, title: &str) -> ResourceId {
        let resolution = match kind {
            ResourceKind::Music => resolve_in(&mut self.data.music, value, title),
            ResourceKind::Sound => resolve_in(&mut self.data.sounds, value, title),
            ResourceKind::Place => resolve_in(&mut self.data.places, value, title),
            ResourceKind::Popup => resolve_in(&mut self.data.popups, value, title),
        };
        if resolution.created {
            self.created.push((kind, resolution.id));
        }
        resolution.id
    }

    /// Resolve a reference; `Unset` and `Id` are returned unchanged
    pub fn resolve_reference(&mut self, kind: ResourceKind, reference: &Reference) -> Reference {
        match reference {
            Reference::Pending { path, title } => Reference::Id(self.resolve(kind, path, title)),
            other => other.clone(),
        }
    }

    /// Resolve every pending reference of a frame in place
    pub fn resolve_frame(&mut self, frame: &mut FrameData) {
        frame.place = self.resolve_reference(ResourceKind::Place, &frame.place);
        for popup in &mut frame.popups {
            popup.popup = self.resolve_reference(ResourceKind::Popup, &popup.popup);
        }
        if let MusicTarget::Play(reference) = &frame.music {
            frame.music = MusicTarget::Play(self.resolve_reference(ResourceKind::Music, reference));
        }
        frame.sound = self.resolve_reference(ResourceKind::Sound, &frame.sound);
    }

    /// Records appended so far, in creation order
    pub fn created(&self) -> &[(ResourceKind, ResourceId)] {
        &self.created
    }

    pub fn into_created(self) -> Vec<(ResourceKind, ResourceId)> {
        self.created
    }
}
