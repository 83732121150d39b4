//! References from frames to stored resources (music, sounds, places, popups)

use serde::{Deserialize, Serialize};

use crate::ResourceId;

/// A frame's link to a stored resource.
///
/// Form widgets hand back either the id of an existing record or a free-form
/// path typed by the user. The path form stays `Pending` on the frame until the
/// edit is committed, at which point the resolver turns it into an `Id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Reference {
    /// Nothing selected
    #[default]
    Unset,
    /// An existing record (id 0 is the reserved "none/default" record)
    Id(ResourceId),
    /// A path not yet backed by a stored record
    Pending {
        path: String,
        /// Human-readable label entered alongside the path
        title: String,
    },
}

impl Reference {
    /// Build a reference from a raw form value and its title.
    ///
    /// An empty value is `Unset`, anything that parses as an unsigned integer
    /// (including `0`) is an `Id`, everything else is a pending path.
    pub fn from_form(value: &str, title: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Reference::Unset;
        }
        match trimmed.parse::<ResourceId>() {
            Ok(id) => Reference::Id(id),
            Err(_) => Reference::Pending {
                path: trimmed.to_string(),
                title: title.to_string(),
            },
        }
    }

    /// Shorthand for a pending path reference
    pub fn pending(path: impl Into<String>, title: impl Into<String>) -> Self {
        Reference::Pending {
            path: path.into(),
            title: title.into(),
        }
    }

    pub fn id(&self) -> Option<ResourceId> {
        match self {
            Reference::Id(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Reference::Unset)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Reference::Pending { .. })
    }

    /// Value to feed back into a form widget
    pub fn form_value(&self) -> String {
        match self {
            Reference::Unset => String::new(),
            Reference::Id(id) => id.to_string(),
            Reference::Pending { path, .. } => path.clone(),
        }
    }
}
