//! Stored resources a frame can reference: music, sounds, places, popups
//!
//! Every collection keeps a reserved record at index 0 standing for
//! "none/default"; lookups and the resolver never match it.

use serde::{Deserialize, Serialize};

use crate::{PositionId, ResourceId};

/// Kind of stored resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Music,
    Sound,
    Place,
    Popup,
}

impl ResourceKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Music => "Music",
            ResourceKind::Sound => "Sound",
            ResourceKind::Place => "Place",
            ResourceKind::Popup => "Popup",
        }
    }

    pub fn all() -> &'static [ResourceKind] {
        &[
            ResourceKind::Music,
            ResourceKind::Sound,
            ResourceKind::Place,
            ResourceKind::Popup,
        ]
    }
}

/// Common shape of every stored resource, as seen by the resolver
pub trait ResourceRecord {
    fn id(&self) -> ResourceId;
    fn name(&self) -> &str;
    /// The asset path (`path` for audio and popups, `image` for places)
    fn source(&self) -> &str;
    /// Whether the source is an external URL rather than a default asset path
    fn is_external(&self) -> bool;
    /// Create an internal record for a path
    fn create(id: ResourceId, name: &str, source: &str) -> Self;
    /// The reserved record stored at index 0
    fn placeholder() -> Self;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicRecord {
    pub id: ResourceId,
    pub name: String,
    pub path: String,
    pub external: bool,
    /// Percent, 0-100
    pub volume: u8,
    /// Loop start in milliseconds
    pub loop_start: u32,
}

impl ResourceRecord for MusicRecord {
    fn id(&self) -> ResourceId {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn source(&self) -> &str {
        &self.path
    }
    fn is_external(&self) -> bool {
        self.external
    }
    fn create(id: ResourceId, name: &str, source: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            path: source.to_string(),
            external: false,
            volume: 100,
            loop_start: 0,
        }
    }
    fn placeholder() -> Self {
        Self::create(0, "", "")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundRecord {
    pub id: ResourceId,
    pub name: String,
    pub path: String,
    pub external: bool,
    pub volume: u8,
}

impl ResourceRecord for SoundRecord {
    fn id(&self) -> ResourceId {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn source(&self) -> &str {
        &self.path
    }
    fn is_external(&self) -> bool {
        self.external
    }
    fn create(id: ResourceId, name: &str, source: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            path: source.to_string(),
            external: false,
            volume: 100,
        }
    }
    fn placeholder() -> Self {
        Self::create(0, "", "")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupRecord {
    pub id: ResourceId,
    pub name: String,
    pub path: String,
    pub external: bool,
}

impl ResourceRecord for PopupRecord {
    fn id(&self) -> ResourceId {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn source(&self) -> &str {
        &self.path
    }
    fn is_external(&self) -> bool {
        self.external
    }
    fn create(id: ResourceId, name: &str, source: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            path: source.to_string(),
            external: false,
        }
    }
    fn placeholder() -> Self {
        Self::create(0, "", "")
    }
}

/// A named spot on a place where a character can stand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacePosition {
    pub id: PositionId,
    pub name: String,
}

/// Stage positions given to places created from a bare background path
pub fn default_positions() -> Vec<PlacePosition> {
    vec![
        PlacePosition { id: 1, name: "Left".to_string() },
        PlacePosition { id: 2, name: "Centre".to_string() },
        PlacePosition { id: 3, name: "Right".to_string() },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceBackground {
    pub image: String,
    pub external: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub id: ResourceId,
    pub name: String,
    pub background: PlaceBackground,
    pub positions: Vec<PlacePosition>,
}

impl ResourceRecord for PlaceRecord {
    fn id(&self) -> ResourceId {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn source(&self) -> &str {
        &self.background.image
    }
    fn is_external(&self) -> bool {
        self.background.external
    }
    fn create(id: ResourceId, name: &str, source: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            background: PlaceBackground {
                image: source.to_string(),
                external: false,
            },
            positions: default_positions(),
        }
    }
    fn placeholder() -> Self {
        Self {
            id: 0,
            name: String::new(),
            background: PlaceBackground {
                image: String::new(),
                external: false,
            },
            positions: Vec::new(),
        }
    }
}

/// Look up a record by id, skipping the reserved index 0
pub fn find_record<R: ResourceRecord>(records: &[R], id: ResourceId) -> Option<&R> {
    records.iter().skip(1).find(|r| r.id() == id)
}
