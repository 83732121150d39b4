//! Screen composition: place, staged characters, popups and fade of a draft frame

use trial_core::{
    CharacterInfo, FadeInfo, FrameData, PlacePosition, PlaceTransition, PopupInfo, PositionId,
    ProfileId, Reference, SpeakerRef, SpriteId, StartupMode, SyncMode, TrialData, TrialError,
    VisualEffect,
};

use crate::preview::ScreenSnapshot;
use crate::settings::ScreenSettings;

/// How characters are edited, decided by whether the frame has a place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterEditorMode {
    /// No place: one speaking character, positioned automatically
    Light,
    /// A place: any number of characters, each on a distinct position
    Full,
}

/// Editing operations over a draft frame.
///
/// Borrows the draft owned by a [`ScreenEditorSession`](super::ScreenEditorSession);
/// nothing here touches the canonical frame collection.
pub struct ScreenCompositionEditor<'a> {
    frame: &'a mut FrameData,
    settings: &'a ScreenSettings,
}

impl<'a> ScreenCompositionEditor<'a> {
    pub fn new(frame: &'a mut FrameData, settings: &'a ScreenSettings) -> Self {
        Self { frame, settings }
    }

    pub fn frame(&self) -> &FrameData {
        self.frame
    }

    pub fn mode(&self) -> CharacterEditorMode {
        if self.frame.has_place() {
            CharacterEditorMode::Full
        } else {
            CharacterEditorMode::Light
        }
    }

    pub fn snapshot(&self, data: &TrialData) -> ScreenSnapshot {
        ScreenSnapshot::of(self.frame, data)
    }

    // ------------------------------------------------------------------
    // Place
    // ------------------------------------------------------------------

    /// Select a place and switch the character editor mode to match
    pub fn set_place(&mut self, place: Reference, data: &TrialData) -> CharacterEditorMode {
        if place.is_set() && place != self.frame.place && self.settings.erase_previous_on_place_change
        {
            self.frame.characters_erase_previous = true;
        }
        self.frame.place = place;

        let positions = data.place_positions(&self.frame.place);
        if self
            .frame
            .place_position
            .is_some_and(|p| !positions.iter().any(|pp| pp.id == p))
        {
            self.frame.place_position = None;
        }

        match self.mode() {
            CharacterEditorMode::Light => {
                self.frame.characters.truncate(1);
                for character in &mut self.frame.characters {
                    character.position = None;
                }
            }
            CharacterEditorMode::Full => {
                let mut taken: Vec<PositionId> = Vec::new();
                for character in &mut self.frame.characters {
                    let keep = character.position.filter(|p| {
                        positions.iter().any(|pp| pp.id == *p) && !taken.contains(p)
                    });
                    character.position = keep;
                    taken.extend(keep);
                }
                if self.settings.auto_assign_positions {
                    for character in self.frame.characters.iter_mut().filter(|c| c.position.is_none()) {
                        let free = positions.iter().map(|pp| pp.id).find(|p| !taken.contains(p));
                        character.position = free;
                        taken.extend(free);
                    }
                }
            }
        }
        self.mode()
    }

    pub fn set_place_position(&mut self, position: Option<PositionId>, data: &TrialData) -> bool {
        let valid = position.map_or(true, |p| {
            data.place_positions(&self.frame.place).iter().any(|pp| pp.id == p)
        });
        if valid {
            self.frame.place_position = position;
        }
        valid
    }

    pub fn set_transition(&mut self, transition: PlaceTransition) {
        self.frame.place_transition = transition;
    }

    pub fn set_erase_previous(&mut self, erase: bool) {
        self.frame.characters_erase_previous = erase;
    }

    // ------------------------------------------------------------------
    // Characters
    // ------------------------------------------------------------------

    fn taken_positions(&self, except: Option<ProfileId>) -> Vec<PositionId> {
        self.frame
            .characters
            .iter()
            .filter(|c| Some(c.profile_id) != except)
            .filter_map(|c| c.position)
            .collect()
    }

    /// Positions of the place a character may take: the place's positions
    /// minus those held by other characters of the frame
    pub fn available_positions(&self, profile_id: ProfileId, data: &TrialData) -> Vec<PlacePosition> {
        let taken = self.taken_positions(Some(profile_id));
        data.place_positions(&self.frame.place)
            .into_iter()
            .filter(|p| !taken.contains(&p.id))
            .collect()
    }

    /// Positions held by characters other than `profile_id`, for exclusion lists
    pub fn disabled_positions(&self, profile_id: ProfileId) -> Vec<PositionId> {
        self.taken_positions(Some(profile_id))
    }

    /// Stage a character for `profile_id`.
    ///
    /// Returns `Ok(false)` without changes when the profile is already staged.
    /// In light mode the new character replaces the current one.
    pub fn add_character(&mut self, profile_id: ProfileId, data: &TrialData) -> Result<bool, TrialError> {
        let profile = data.require_profile(profile_id)?;
        if self.frame.character(profile_id).is_some() {
            return Ok(false);
        }

        let mut character = CharacterInfo::new(profile_id);
        if let Some(sprite) = profile.default_sprite() {
            character.sprite_id = Some(sprite.id);
        }

        match self.mode() {
            CharacterEditorMode::Light => {
                self.frame.characters.clear();
            }
            CharacterEditorMode::Full => {
                let free = self.available_positions(profile_id, data);
                let screen_position = self
                    .frame
                    .place_position
                    .filter(|p| free.iter().any(|pp| pp.id == *p));
                character.position = screen_position.or_else(|| {
                    self.settings
                        .auto_assign_positions
                        .then(|| free.first().map(|p| p.id))
                        .flatten()
                });
            }
        }
        self.frame.characters.push(character);
        Ok(true)
    }

    /// Light mode: make `speaker` the talking character. A profile becomes the
    /// single staged character, keeping its settings if it was already staged;
    /// anyone else empties the stage. In full mode only the speaker changes.
    pub fn set_talking_character(&mut self, speaker: SpeakerRef, data: &TrialData) -> Result<(), TrialError> {
        let profile = match speaker {
            SpeakerRef::Profile(id) => Some(data.require_profile(id)?),
            _ => None,
        };
        self.frame.speaker = speaker;
        if !self.frame.speaker_use_name {
            self.frame.speaker_name = data.speaker_display_name(self.frame);
        }
        if self.mode() == CharacterEditorMode::Full {
            return Ok(());
        }

        let Some(profile) = profile else {
            self.frame.characters.clear();
            return Ok(());
        };
        let mut character = match self.frame.character(profile.id) {
            Some(staged) => staged.clone(),
            None => {
                let mut character = CharacterInfo::new(profile.id);
                character.sprite_id = profile.default_sprite().map(|s| s.id);
                character
            }
        };
        character.position = None;
        self.frame.characters = vec![character];
        Ok(())
    }

    /// Unstage the character of `profile_id`
    pub fn remove_character(&mut self, profile_id: ProfileId) -> bool {
        let before = self.frame.characters.len();
        self.frame.characters.retain(|c| c.profile_id != profile_id);
        self.frame.characters.len() != before
    }

    /// Move a character. Positions held by other characters are refused, and
    /// so is any explicit position in light mode.
    pub fn set_position(
        &mut self,
        profile_id: ProfileId,
        position: Option<PositionId>,
        data: &TrialData,
    ) -> bool {
        if let Some(p) = position {
            if self.mode() == CharacterEditorMode::Light
                || !self.available_positions(profile_id, data).iter().any(|pp| pp.id == p)
            {
                return false;
            }
        }
        match self.frame.character_mut(profile_id) {
            Some(character) => {
                character.position = position;
                true
            }
            None => false,
        }
    }

    /// Whether the character's sprite has a startup animation to play
    pub fn startup_mode_available(&self, profile_id: ProfileId, data: &TrialData) -> bool {
        self.frame
            .character(profile_id)
            .and_then(|c| Some((data.profile(profile_id)?, c.sprite_id?)))
            .and_then(|(profile, sprite_id)| profile.sprite(sprite_id))
            .is_some_and(|sprite| sprite.has_startup())
    }

    /// Change a character's sprite. A sprite without startup animation
    /// forces the startup mode back to `Skip`.
    pub fn set_sprite(&mut self, profile_id: ProfileId, sprite_id: SpriteId, data: &TrialData) -> bool {
        let Some(sprite) = data.profile(profile_id).and_then(|p| p.sprite(sprite_id)) else {
            return false;
        };
        let has_startup = sprite.has_startup();
        let Some(character) = self.frame.character_mut(profile_id) else {
            return false;
        };
        character.sprite_id = Some(sprite_id);
        if !has_startup {
            character.startup_mode = StartupMode::Skip;
        }
        true
    }

    pub fn set_startup_mode(&mut self, profile_id: ProfileId, mode: StartupMode, data: &TrialData) -> bool {
        if mode != StartupMode::Skip && !self.startup_mode_available(profile_id, data) {
            return false;
        }
        match self.frame.character_mut(profile_id) {
            Some(character) => {
                character.startup_mode = mode;
                true
            }
            None => false,
        }
    }

    pub fn set_sync_mode(&mut self, profile_id: ProfileId, mode: SyncMode) -> bool {
        self.frame
            .character_mut(profile_id)
            .map(|c| c.sync_mode = mode)
            .is_some()
    }

    pub fn set_mirror(&mut self, profile_id: ProfileId, mirrored: bool) -> bool {
        self.frame
            .character_mut(profile_id)
            .map(|c| c.mirror_effect = mirrored)
            .is_some()
    }

    pub fn set_visual_effects(
        &mut self,
        profile_id: ProfileId,
        appears: VisualEffect,
        disappears: VisualEffect,
    ) -> bool {
        self.frame
            .character_mut(profile_id)
            .map(|c| {
                c.visual_effect_appears = appears;
                c.visual_effect_disappears = disappears;
            })
            .is_some()
    }

    // ------------------------------------------------------------------
    // Popups and fade
    // ------------------------------------------------------------------

    pub fn add_popup(&mut self, popup: Reference) {
        self.frame.popups.push(PopupInfo::new(popup));
    }

    pub fn set_popup(&mut self, index: usize, popup: Reference) -> bool {
        match self.frame.popups.get_mut(index) {
            Some(info) => {
                info.popup = popup;
                true
            }
            None => false,
        }
    }

    pub fn remove_popup(&mut self, index: usize) -> bool {
        if index < self.frame.popups.len() {
            self.frame.popups.remove(index);
            true
        } else {
            false
        }
    }

    /// Move a popup in the stacking order
    pub fn move_popup(&mut self, from: usize, to: usize) -> bool {
        let len = self.frame.popups.len();
        if from >= len || to >= len {
            return false;
        }
        let popup = self.frame.popups.remove(from);
        self.frame.popups.insert(to, popup);
        true
    }

    pub fn set_fade(&mut self, fade: Option<FadeInfo>) {
        self.frame.fade = fade;
    }
}
