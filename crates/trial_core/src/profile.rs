//! Cast members and their sprites

use serde::{Deserialize, Serialize};

use crate::{ProfileId, SpriteId};

/// One sprite of a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Sprite {
    pub id: SpriteId,
    pub name: String,
    pub talking: String,
    pub still: String,
    /// Startup animation, if the sprite has one
    #[serde(default)]
    pub startup: Option<String>,
}

impl Sprite {
    pub fn new(id: SpriteId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_startup(mut self, path: impl Into<String>) -> Self {
        self.startup = Some(path.into());
        self
    }

    pub fn has_startup(&self) -> bool {
        self.startup.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// A cast member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Profile {
    pub id: ProfileId,
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub sprites: Vec<Sprite>,
}

impl Profile {
    pub fn new(id: ProfileId, long_name: impl Into<String>) -> Self {
        let long_name = long_name.into();
        Self {
            id,
            short_name: long_name.clone(),
            long_name,
            sprites: Vec::new(),
        }
    }

    pub fn with_sprite(mut self, sprite: Sprite) -> Self {
        self.sprites.push(sprite);
        self
    }

    pub fn sprite(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.id == id)
    }

    /// Sprite used when a character is added without one
    pub fn default_sprite(&self) -> Option<&Sprite> {
        self.sprites.first()
    }

    /// Display name, falling back to the short name
    pub fn display_name(&self) -> &str {
        if self.long_name.is_empty() {
            &self.short_name
        } else {
            &self.long_name
        }
    }
}
