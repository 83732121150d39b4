//! The trial-data store: ordered frames plus every side table they point into

use serde::{Deserialize, Serialize};

use crate::resource::{default_positions, find_record};
use crate::{
    FrameAction, FrameData, FrameId, MusicRecord, MusicTarget, PlacePosition, PlaceRecord,
    PopupRecord, Profile, ProfileId, Reference, ResourceKind, ResourceRecord, SoundRecord,
    SpeakerRef, TrialError,
};

/// Where a row inserts new frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsertPoint {
    /// Directly before the given frame
    Before(FrameId),
    /// After the last frame
    End,
}

/// Structural section of a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Scene,
    CrossExamination,
}

impl BlockKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            BlockKind::Scene => "Scene",
            BlockKind::CrossExamination => "Cross-examination",
        }
    }

    pub fn all() -> &'static [BlockKind] {
        &[BlockKind::Scene, BlockKind::CrossExamination]
    }
}

/// A section delimited by a start and an end frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub start_frame: FrameId,
    pub end_frame: FrameId,
}

/// All trial data edited by the timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
pub struct TrialData {
    pub frames: Vec<FrameData>,
    pub profiles: Vec<Profile>,
    pub music: Vec<MusicRecord>,
    pub sounds: Vec<SoundRecord>,
    pub places: Vec<PlaceRecord>,
    pub popups: Vec<PopupRecord>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    next_frame_id: FrameId,
}

impl Default for TrialData {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            profiles: Vec::new(),
            music: vec![MusicRecord::placeholder()],
            sounds: vec![SoundRecord::placeholder()],
            places: vec![PlaceRecord::placeholder()],
            popups: vec![PopupRecord::placeholder()],
            blocks: Vec::new(),
            next_frame_id: 1,
        }
    }
}

impl TrialData {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------

    /// Frame by id
    pub fn frame(&self, id: FrameId) -> Option<&FrameData> {
        self.frames.iter().find(|f| f.id == Some(id))
    }

    /// Mutable frame by id
    pub fn frame_mut(&mut self, id: FrameId) -> Option<&mut FrameData> {
        self.frames.iter_mut().find(|f| f.id == Some(id))
    }

    /// Position of a frame in the ordered collection
    pub fn frame_index(&self, id: FrameId) -> Option<usize> {
        self.frames.iter().position(|f| f.id == Some(id))
    }

    pub fn frame_ids(&self) -> Vec<FrameId> {
        self.frames.iter().filter_map(|f| f.id).collect()
    }

    /// Reserve a fresh frame id
    pub fn next_frame_id(&mut self) -> FrameId {
        let max_used = self.frames.iter().filter_map(|f| f.id).max().unwrap_or(0);
        let id = self.next_frame_id.max(max_used + 1);
        self.next_frame_id = id + 1;
        id
    }

    /// A blank frame with a fresh id, not yet inserted
    pub fn create_frame(&mut self) -> FrameData {
        FrameData::new(self.next_frame_id())
    }

    /// Insert a frame (blank when `frame` is `None`) at an insertion point.
    ///
    /// A frame without an id, or with an id already in use, is given a fresh one.
    pub fn insert_frame(
        &mut self,
        at: InsertPoint,
        frame: Option<FrameData>,
    ) -> Result<FrameId, TrialError> {
        let index = self.insert_index(at)?;
        let mut frame = frame.unwrap_or_default();
        let id = match frame.id {
            Some(id) if self.frame(id).is_none() => {
                self.next_frame_id = self.next_frame_id.max(id + 1);
                id
            }
            _ => self.next_frame_id(),
        };
        frame.id = Some(id);
        self.frames.insert(index, frame);
        Ok(id)
    }

    fn insert_index(&self, at: InsertPoint) -> Result<usize, TrialError> {
        match at {
            InsertPoint::Before(id) => self.frame_index(id).ok_or(TrialError::UnknownFrame(id)),
            InsertPoint::End => Ok(self.frames.len()),
        }
    }

    /// Remove a frame from the ordered collection
    pub fn remove_frame(&mut self, id: FrameId) -> Result<FrameData, TrialError> {
        let index = self.frame_index(id).ok_or(TrialError::UnknownFrame(id))?;
        Ok(self.frames.remove(index))
    }

    /// Swap the frame at `index` for `frame`, returning the previous one
    pub fn replace_frame_at(
        &mut self,
        index: usize,
        frame: FrameData,
    ) -> Result<FrameData, TrialError> {
        let len = self.frames.len();
        let slot = self
            .frames
            .get_mut(index)
            .ok_or(TrialError::IndexOutOfRange { index, len })?;
        Ok(std::mem::replace(slot, frame))
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Insert a scene or cross-examination block at `at`.
    ///
    /// Returns the ids of the inserted frames in order.
    pub fn insert_block(
        &mut self,
        kind: BlockKind,
        at: InsertPoint,
    ) -> Result<Vec<FrameId>, TrialError> {
        let actions: &[&str] = match kind {
            BlockKind::Scene => &["SceneStart", "SceneEnd"],
            BlockKind::CrossExamination => &["CeStart", "", "CeEnd"],
        };
        // Validate before touching anything
        self.insert_index(at)?;

        let mut ids = Vec::with_capacity(actions.len());
        for action in actions {
            let mut frame = FrameData::default();
            if !action.is_empty() {
                frame.action = Some(FrameAction::new(*action));
            }
            ids.push(self.insert_frame(at, Some(frame))?);
        }

        if let (Some(&start_frame), Some(&end_frame)) = (ids.first(), ids.last()) {
            self.blocks.push(Block {
                kind,
                start_frame,
                end_frame,
            });
        }
        Ok(ids)
    }

    /// Block framed by `id`, if the frame starts or ends one
    pub fn block_bounded_by(&self, id: FrameId) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|b| b.start_frame == id || b.end_frame == id)
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    pub fn profile(&self, id: ProfileId) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn require_profile(&self, id: ProfileId) -> Result<&Profile, TrialError> {
        self.profile(id).ok_or(TrialError::UnknownProfile(id))
    }

    /// Name shown in the speaker box of a frame
    pub fn speaker_display_name(&self, frame: &FrameData) -> String {
        if frame.speaker_use_name {
            return frame.speaker_name.clone();
        }
        match frame.speaker {
            SpeakerRef::None => String::new(),
            SpeakerRef::Unknown => "???".to_string(),
            SpeakerRef::Profile(id) => self
                .profile(id)
                .map(|p| p.display_name().to_string())
                .unwrap_or_default(),
        }
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    pub fn place(&self, id: crate::ResourceId) -> Option<&PlaceRecord> {
        find_record(&self.places, id)
    }

    /// Positions available on a place; a pending place gets the defaults
    pub fn place_positions(&self, place: &Reference) -> Vec<PlacePosition> {
        match place {
            Reference::Unset => Vec::new(),
            Reference::Id(id) => self
                .place(*id)
                .map(|p| p.positions.clone())
                .unwrap_or_default(),
            Reference::Pending { .. } => default_positions(),
        }
    }

    /// Background image of a place reference, if one can be found
    pub fn place_background(&self, place: &Reference) -> Option<String> {
        match place {
            Reference::Unset => None,
            Reference::Id(id) => self
                .place(*id)
                .map(|p| p.background.image.clone())
                .filter(|image| !image.is_empty()),
            Reference::Pending { path, .. } => Some(path.clone()),
        }
    }

    /// Display name of a referenced resource
    pub fn resource_name(&self, kind: ResourceKind, reference: &Reference) -> Option<String> {
        match reference {
            Reference::Unset => None,
            Reference::Pending { title, path } => Some(if title.is_empty() {
                path.clone()
            } else {
                title.clone()
            }),
            Reference::Id(id) => {
                let name = match kind {
                    ResourceKind::Music => find_record(&self.music, *id).map(|r| r.name()),
                    ResourceKind::Sound => find_record(&self.sounds, *id).map(|r| r.name()),
                    ResourceKind::Place => find_record(&self.places, *id).map(|r| r.name()),
                    ResourceKind::Popup => find_record(&self.popups, *id).map(|r| r.name()),
                };
                name.map(str::to_string)
            }
        }
    }

    /// Short description of a music change, for previews
    pub fn music_label(&self, music: &MusicTarget) -> String {
        match music {
            MusicTarget::Unchanged => String::new(),
            MusicTarget::Stop => "Stop music".to_string(),
            MusicTarget::Play(reference) => self
                .resource_name(ResourceKind::Music, reference)
                .unwrap_or_default(),
        }
    }

    pub fn resource_count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Music => self.music.len(),
            ResourceKind::Sound => self.sounds.len(),
            ResourceKind::Place => self.places.len(),
            ResourceKind::Popup => self.popups.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_with_frames(count: usize) -> TrialData {
        let mut data = TrialData::new();
        for _ in 0..count {
            data.insert_frame(InsertPoint::End, None).unwrap();
        }
        data
    }

    #[test]
    fn test_insert_assigns_fresh_ids() {
        let data = data_with_frames(3);
        assert_eq!(data.frame_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_insert_before() {
        let mut data = data_with_frames(2);
        let id = data.insert_frame(InsertPoint::Before(2), None).unwrap();
        assert_eq!(data.frame_ids(), vec![1, id, 2]);
    }

    #[test]
    fn test_insert_before_unknown_frame() {
        let mut data = data_with_frames(1);
        let result = data.insert_frame(InsertPoint::Before(42), None);
        assert!(matches!(result, Err(TrialError::UnknownFrame(42))));
        assert_eq!(data.frames.len(), 1);
    }

    #[test]
    fn test_insert_keeps_free_id_and_replaces_taken_one() {
        let mut data = data_with_frames(2);
        let removed = data.remove_frame(1).unwrap();
        let id = data.insert_frame(InsertPoint::End, Some(removed)).unwrap();
        assert_eq!(id, 1);

        let duplicate = data.frame(2).unwrap().clone();
        let id = data.insert_frame(InsertPoint::End, Some(duplicate)).unwrap();
        assert_eq!(id, 3);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut data = data_with_frames(3);
        data.remove_frame(3).unwrap();
        let id = data.insert_frame(InsertPoint::End, None).unwrap();
        assert_eq!(id, 4);
    }

    #[test]
    fn test_replace_frame_at() {
        let mut data = data_with_frames(2);
        let mut replacement = data.frames[1].clone();
        replacement.text_content = "Hold it!".to_string();
        let previous = data.replace_frame_at(1, replacement).unwrap();
        assert_eq!(previous.text_content, "");
        assert_eq!(data.frame(2).unwrap().text_content, "Hold it!");
        assert!(matches!(
            data.replace_frame_at(5, FrameData::default()),
            Err(TrialError::IndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_insert_cross_examination_block() {
        let mut data = data_with_frames(1);
        let ids = data
            .insert_block(BlockKind::CrossExamination, InsertPoint::Before(1))
            .unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(data.frame_ids(), vec![ids[0], ids[1], ids[2], 1]);
        let block = data.block_bounded_by(ids[0]).unwrap();
        assert_eq!(block.kind, BlockKind::CrossExamination);
        assert_eq!(block.end_frame, ids[2]);
    }

    #[test]
    fn test_speaker_display_name() {
        let mut data = data_with_frames(1);
        data.profiles.push(Profile::new(4, "Phoenix Wright"));
        let frame = data.frames[0].clone();
        assert_eq!(data.speaker_display_name(&frame), "");

        let mut frame = frame;
        frame.speaker = SpeakerRef::Profile(4);
        assert_eq!(data.speaker_display_name(&frame), "Phoenix Wright");

        frame.speaker_use_name = true;
        frame.speaker_name = "Nick".to_string();
        assert_eq!(data.speaker_display_name(&frame), "Nick");
    }

    #[test]
    fn test_missing_place_has_no_background() {
        let data = TrialData::new();
        assert_eq!(data.place_background(&Reference::Id(9)), None);
        assert!(data.place_positions(&Reference::Id(9)).is_empty());
        assert_eq!(data.place_positions(&Reference::pending("bg.png", "")).len(), 3);
    }
}
