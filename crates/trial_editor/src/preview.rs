//! Frame previews: the snapshot handed to the stage renderer and the
//! lightweight text summaries shown by unpopulated rows.

use serde::Serialize;
use trial_core::{
    find_record, FadeInfo, FrameData, PositionId, Reference, ResourceKind, TrialData,
};

/// A character as the stage renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedCharacter {
    pub name: String,
    /// Still image of the sprite; `None` when the profile or sprite is missing
    pub image: Option<String>,
    pub position: Option<PositionId>,
    pub mirrored: bool,
}

/// Everything the stage renderer needs to draw a frame
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScreenSnapshot {
    /// `None` renders a transparent background
    pub background: Option<String>,
    pub characters: Vec<StagedCharacter>,
    pub popups: Vec<String>,
    pub fade: Option<FadeInfo>,
}

impl ScreenSnapshot {
    /// Snapshot of `frame`. Missing records degrade to empty visuals.
    pub fn of(frame: &FrameData, data: &TrialData) -> Self {
        let characters = frame
            .characters
            .iter()
            .map(|character| {
                let profile = data.profile(character.profile_id);
                let image = profile
                    .zip(character.sprite_id)
                    .and_then(|(p, sprite_id)| p.sprite(sprite_id))
                    .map(|s| s.still.clone())
                    .filter(|still| !still.is_empty());
                StagedCharacter {
                    name: profile.map(|p| p.display_name().to_string()).unwrap_or_default(),
                    image,
                    position: character.position,
                    mirrored: character.mirror_effect,
                }
            })
            .collect();

        let popups = frame
            .popups
            .iter()
            .filter_map(|popup| match &popup.popup {
                Reference::Unset => None,
                Reference::Id(id) => find_record(&data.popups, *id).map(|r| r.path.clone()),
                Reference::Pending { path, .. } => Some(path.clone()),
            })
            .collect();

        Self {
            background: data.place_background(&frame.place),
            characters,
            popups,
            fade: frame.fade.clone(),
        }
    }
}

/// Static summary of the screen cell
pub fn screen_summary(frame: &FrameData, data: &TrialData) -> String {
    let place = data
        .resource_name(ResourceKind::Place, &frame.place)
        .unwrap_or_default();
    match (place.is_empty(), frame.characters.len()) {
        (true, 0) => String::new(),
        (true, n) => format!("{} character(s)", n),
        (false, 0) => place,
        (false, n) => format!("{} · {} character(s)", place, n),
    }
}

/// Static summary of the music cell
pub fn music_summary(frame: &FrameData, data: &TrialData) -> String {
    data.music_label(&frame.music)
}

/// Static summary of the sound cell
pub fn sound_summary(frame: &FrameData, data: &TrialData) -> String {
    data.resource_name(ResourceKind::Sound, &frame.sound)
        .unwrap_or_default()
}

/// Static summary of the dialogue cell
pub fn dialogue_summary(frame: &FrameData, data: &TrialData) -> String {
    let speaker = data.speaker_display_name(frame);
    let text: String = frame.text_content.chars().take(80).collect();
    if speaker.is_empty() {
        text
    } else {
        format!("{}: {}", speaker, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trial_core::{CharacterInfo, PopupInfo, Profile, Sprite};

    #[test]
    fn test_snapshot_degrades_missing_records() {
        let data = TrialData::new();
        let mut frame = FrameData::new(1);
        frame.place = Reference::Id(5);
        frame.characters.push(CharacterInfo::new(9).with_sprite(1));
        frame.popups.push(PopupInfo::new(Reference::Id(3)));

        let snapshot = ScreenSnapshot::of(&frame, &data);
        assert_eq!(snapshot.background, None);
        assert_eq!(snapshot.characters.len(), 1);
        assert_eq!(snapshot.characters[0].image, None);
        assert!(snapshot.popups.is_empty());
    }

    #[test]
    fn test_snapshot_resolves_sprites_and_pending_paths() {
        let mut data = TrialData::new();
        let mut sprite = Sprite::new(1, "Normal");
        sprite.still = "phoenix/normal.png".to_string();
        data.profiles.push(Profile::new(2, "Phoenix").with_sprite(sprite));

        let mut frame = FrameData::new(1);
        frame.place = Reference::pending("court.png", "Court");
        frame.characters.push(CharacterInfo::new(2).with_sprite(1).at(2));
        frame.popups.push(PopupInfo::new(Reference::pending("objection.gif", "")));

        let snapshot = ScreenSnapshot::of(&frame, &data);
        assert_eq!(snapshot.background.as_deref(), Some("court.png"));
        assert_eq!(snapshot.characters[0].image.as_deref(), Some("phoenix/normal.png"));
        assert_eq!(snapshot.characters[0].position, Some(2));
        assert_eq!(snapshot.popups, vec!["objection.gif".to_string()]);
        assert_eq!(screen_summary(&frame, &data), "Court · 1 character(s)");
    }

    #[test]
    fn test_dialogue_summary() {
        let mut data = TrialData::new();
        data.profiles.push(Profile::new(1, "Maya"));
        let mut frame = FrameData::new(1);
        frame.text_content = "Nick!".to_string();
        assert_eq!(dialogue_summary(&frame, &data), "Nick!");
        frame.speaker = trial_core::SpeakerRef::Profile(1);
        assert_eq!(dialogue_summary(&frame, &data), "Maya: Nick!");
    }

    #[test]
    fn test_snapshot_serializes_for_stage_renderer() {
        let mut data = TrialData::new();
        data.profiles.push(Profile::new(2, "Phoenix").with_sprite(Sprite::new(1, "Normal")));
        let mut frame = FrameData::new(1);
        frame.place = Reference::pending("court.png", "Court");
        let mut character = CharacterInfo::new(2).with_sprite(1).at(3);
        character.mirror_effect = true;
        frame.characters.push(character);
        frame.fade = Some(FadeInfo::default());

        let json = serde_json::to_value(ScreenSnapshot::of(&frame, &data)).unwrap();
        assert_eq!(json["background"], "court.png");
        assert_eq!(json["characters"][0]["name"], "Phoenix");
        assert_eq!(json["characters"][0]["position"], 3);
        assert_eq!(json["characters"][0]["mirrored"], true);
        assert!(json["characters"][0]["image"].is_null());
        assert_eq!(json["popups"], serde_json::json!([]));
        assert_eq!(json["fade"]["fade_colour"], "black");
    }
}
