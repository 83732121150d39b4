use super::*;
use crate::messages::TextEffect;
use crate::surface::{DocumentSurface, FormKind, FormValue};
use crate::testing::TestUi;
use trial_core::{
    InsertPoint, MusicFadeInfo, MusicTarget, PlacePosition, PlaceRecord, Reference, ResourceKind,
    ResourceRecord,
};

/// Mini-editor that refuses to close until told otherwise
struct Stubborn {
    allow_close: bool,
}

impl MiniEditor for Stubborn {
    fn build(&mut self, host: NodeId, _frame: &FrameData, _data: &TrialData, ui: &mut UiServices) {
        ui.text(host, "stubborn");
    }

    fn close_minieditor(&mut self, _frame_id: FrameId, _data: &mut TrialData, _ui: &mut UiServices) -> bool {
        self.allow_close
    }
}

fn data_with_frame() -> TrialData {
    let mut data = TrialData::new();
    data.insert_frame(InsertPoint::End, None).unwrap();
    data
}

#[test]
fn test_refused_close_keeps_overlay() {
    let mut data = data_with_frame();
    let mut test_ui = TestUi::new();
    let mut ui = test_ui.services();
    let host = ui.surface.create_element("td");

    let mut manager = OverlayManager::new();
    assert!(manager.open(
        1,
        RowCell::Music,
        host,
        Box::new(Stubborn { allow_close: false }),
        &data,
        &mut ui
    ));
    assert_eq!(manager.close(&mut data, &mut ui), CloseResult::Refused);
    assert_eq!(manager.active_target(), Some((1, RowCell::Music)));

    // Opening while one is open is refused too
    let other = ui.surface.create_element("td");
    assert!(!manager.open(1, RowCell::Sound, other, Box::new(AudioOverlay::sound()), &data, &mut ui));
    assert_eq!(ui.surface.child_count(other), 0);

    assert_eq!(manager.discard(), Some((1, RowCell::Music)));
    assert_eq!(manager.close(&mut data, &mut ui), CloseResult::NothingOpen);
}

#[test]
fn test_close_reports_host_cell() {
    let mut data = data_with_frame();
    let mut test_ui = TestUi::new();
    let mut ui = test_ui.services();
    let host = ui.surface.create_element("td");

    let mut manager = OverlayManager::new();
    manager.open(
        1,
        RowCell::Screen,
        host,
        Box::new(Stubborn { allow_close: true }),
        &data,
        &mut ui,
    );
    assert_eq!(
        manager.close(&mut data, &mut ui),
        CloseResult::Closed {
            frame_id: 1,
            cell: RowCell::Screen
        }
    );
    assert!(!manager.is_open());
}

#[test]
fn test_open_unknown_frame_builds_nothing() {
    let data = TrialData::new();
    let mut test_ui = TestUi::new();
    let mut ui = test_ui.services();
    let host = ui.surface.create_element("td");

    let mut manager = OverlayManager::new();
    assert!(!manager.open(9, RowCell::Sound, host, Box::new(AudioOverlay::sound()), &data, &mut ui));
    assert!(!manager.is_open());
}

#[test]
fn test_place_overlay_sets_place_and_erases_previous() {
    let mut data = data_with_frame();
    data.places.push(PlaceRecord::create(1, "Lobby", "lobby.png"));
    let mut test_ui = TestUi::new();
    let host = test_ui.surface.create_element("td");

    let mut overlay = PlaceOverlay::new(true);
    {
        let mut ui = test_ui.services();
        overlay.build(host, data.frame(1).unwrap(), &data, &mut ui);
    }
    let place = test_ui
        .widgets
        .last_of_kind(FormKind::Resource(ResourceKind::Place))
        .unwrap();
    let choices = test_ui.widgets.state(place).unwrap().options.choices;
    assert!(choices.iter().any(|(v, l)| v == "1" && l == "Lobby"));
    test_ui.widgets.set_user_value(place, FormValue::Text("1".to_string()));

    assert!(overlay.close_minieditor(1, &mut data, &mut test_ui.services()));
    let frame = data.frame(1).unwrap();
    assert_eq!(frame.place, Reference::Id(1));
    assert!(frame.characters_erase_previous);
    assert_eq!(test_ui.surface.child_count(host), 0);
}

#[test]
fn test_place_overlay_creates_typed_place() {
    let mut data = data_with_frame();
    let mut test_ui = TestUi::new();
    let host = test_ui.surface.create_element("td");

    let mut overlay = PlaceOverlay::new(false);
    overlay.build(host, data.frame(1).unwrap(), &data, &mut test_ui.services());
    let place = test_ui
        .widgets
        .last_of_kind(FormKind::Resource(ResourceKind::Place))
        .unwrap();
    test_ui.widgets.set_user_entry(place, "street.png", "Street");

    assert!(overlay.close_minieditor(1, &mut data, &mut test_ui.services()));
    let frame = data.frame(1).unwrap();
    assert_eq!(frame.place, Reference::Id(1));
    assert!(!frame.characters_erase_previous);
    assert_eq!(data.places[1].background.image, "street.png");
    assert_eq!(data.places[1].name, "Street");
}

#[test]
fn test_audio_overlay_stop_and_clear() {
    let mut data = data_with_frame();
    let mut test_ui = TestUi::new();
    let host = test_ui.surface.create_element("td");

    let mut overlay = AudioOverlay::music();
    overlay.build(host, data.frame(1).unwrap(), &data, &mut test_ui.services());
    let input = test_ui
        .widgets
        .last_of_kind(FormKind::Resource(ResourceKind::Music))
        .unwrap();
    test_ui.widgets.set_user_value(input, FormValue::Text("stop".to_string()));
    overlay.close_minieditor(1, &mut data, &mut test_ui.services());
    assert_eq!(data.frame(1).unwrap().music, MusicTarget::Stop);

    let mut overlay = AudioOverlay::music();
    overlay.build(host, data.frame(1).unwrap(), &data, &mut test_ui.services());
    let input = test_ui
        .widgets
        .last_of_kind(FormKind::Resource(ResourceKind::Music))
        .unwrap();
    assert_eq!(
        test_ui.widgets.state(input).unwrap().value,
        FormValue::Text("stop".to_string())
    );
    test_ui.widgets.set_user_value(input, FormValue::Empty);
    overlay.close_minieditor(1, &mut data, &mut test_ui.services());
    assert_eq!(data.frame(1).unwrap().music, MusicTarget::Unchanged);
    assert_eq!(data.music.len(), 1);
}

#[test]
fn test_sound_overlay_numeric_value_passes_through() {
    let mut data = data_with_frame();
    let mut test_ui = TestUi::new();
    let host = test_ui.surface.create_element("td");

    let mut overlay = AudioOverlay::sound();
    overlay.build(host, data.frame(1).unwrap(), &data, &mut test_ui.services());
    let input = test_ui
        .widgets
        .last_of_kind(FormKind::Resource(ResourceKind::Sound))
        .unwrap();
    test_ui.widgets.set_user_value(input, FormValue::Text("12".to_string()));
    overlay.close_minieditor(1, &mut data, &mut test_ui.services());

    assert_eq!(data.frame(1).unwrap().sound, Reference::Id(12));
    assert_eq!(data.sounds.len(), 1);
}

#[test]
fn test_text_toolbox_hands_edits_to_row() {
    let mut data = data_with_frame();
    data.frame_mut(1).unwrap().text_content = "Hold it!".to_string();
    let mut test_ui = TestUi::new();
    let host = test_ui.surface.create_element("div");

    let mut toolbox = TextToolbox::new();
    toolbox.build(host, data.frame(1).unwrap(), &data, &mut test_ui.services());
    let picker = test_ui.widgets.last_of_kind(FormKind::Colour).unwrap();
    assert_eq!(
        test_ui.widgets.state(picker).unwrap().value,
        FormValue::Text("#ffffff".to_string())
    );
    let red = test_ui.surface.find_localized(host, "red").unwrap();
    assert_eq!(
        test_ui.events.message(red, UiEvent::Click),
        Some(UiMessage::Overlay(OverlayAction::TextColour("#F77337".to_string())))
    );

    let mut ui = test_ui.services();
    assert_eq!(
        toolbox.handle(&OverlayAction::InsertTextEffect(TextEffect::Flash), &data, &mut ui),
        Some(HostEdit::InsertText("[#fb]".to_string()))
    );
    assert_eq!(
        toolbox.handle(&OverlayAction::InsertTextEffect(TextEffect::Pause), &data, &mut ui),
        Some(HostEdit::InsertText("[#]".to_string()))
    );
    drop(ui);
    test_ui
        .widgets
        .set_user_value(picker, FormValue::Text("#123456".to_string()));
    assert_eq!(
        toolbox.handle(&OverlayAction::PickedColour, &data, &mut test_ui.services()),
        Some(HostEdit::Colour("#123456".to_string()))
    );

    // Closing writes nothing back
    assert!(toolbox.close_minieditor(1, &mut data, &mut test_ui.services()));
    assert_eq!(data.frame(1).unwrap().text_content, "Hold it!");
    assert_eq!(test_ui.events.binding_count(), 0);
}

#[test]
fn test_place_change_rebuilds_positions() {
    let mut data = data_with_frame();
    let mut lobby = PlaceRecord::create(1, "Lobby", "lobby.png");
    lobby.positions = vec![PlacePosition {
        id: 7,
        name: "Bench".to_string(),
    }];
    data.places.push(lobby);
    let mut test_ui = TestUi::new();
    let host = test_ui.surface.create_element("td");

    let mut overlay = PlaceOverlay::new(true);
    overlay.build(host, data.frame(1).unwrap(), &data, &mut test_ui.services());
    let place = test_ui
        .widgets
        .last_of_kind(FormKind::Resource(ResourceKind::Place))
        .unwrap();
    assert_eq!(
        test_ui.events.message(place, UiEvent::Change),
        Some(UiMessage::Overlay(OverlayAction::PlaceChanged))
    );
    let positions = |ui: &TestUi, node| ui.widgets.state(node).unwrap().options.choices.len();
    // No place: only the empty choice
    let first_position = test_ui
        .widgets
        .all_of_kind(&test_ui.surface, host, FormKind::Select)[0];
    assert_eq!(positions(&test_ui, first_position), 1);

    test_ui.widgets.set_user_value(place, FormValue::Text("1".to_string()));
    overlay.handle(&OverlayAction::PlaceChanged, &data, &mut test_ui.services());
    let selects = test_ui
        .widgets
        .all_of_kind(&test_ui.surface, host, FormKind::Select);
    assert_eq!(selects.len(), 2);
    assert!(!test_ui.surface.exists(first_position));
    let position = selects[1];
    let choices = test_ui.widgets.state(position).unwrap().options.choices;
    assert!(choices.iter().any(|(v, l)| v == "7" && l == "Bench"));

    test_ui.widgets.set_user_value(position, FormValue::Text("7".to_string()));
    overlay.close_minieditor(1, &mut data, &mut test_ui.services());
    assert_eq!(data.frame(1).unwrap().place_position, Some(7));
}

#[test]
fn test_editor_buttons_live_in_overlays() {
    let data = data_with_frame();
    let mut test_ui = TestUi::new();
    let host = test_ui.surface.create_element("td");

    let mut overlay = PlaceOverlay::new(true);
    overlay.build(host, data.frame(1).unwrap(), &data, &mut test_ui.services());
    let button = test_ui.surface.find_localized(host, "screen_editor").unwrap();
    assert_eq!(
        test_ui.events.message(button, UiEvent::Click),
        Some(UiMessage::Overlay(OverlayAction::OpenScreenEditor))
    );

    let music_host = test_ui.surface.create_element("td");
    let mut music = AudioOverlay::music();
    music.build(music_host, data.frame(1).unwrap(), &data, &mut test_ui.services());
    let button = test_ui
        .surface
        .find_localized(music_host, "music_editor")
        .unwrap();
    assert_eq!(
        test_ui.events.message(button, UiEvent::Click),
        Some(UiMessage::Overlay(OverlayAction::OpenMusicEditor))
    );

    let sound_host = test_ui.surface.create_element("td");
    let mut sound = AudioOverlay::sound();
    sound.build(sound_host, data.frame(1).unwrap(), &data, &mut test_ui.services());
    assert!(test_ui.surface.find_localized(sound_host, "music_editor").is_none());
}

#[test]
fn test_unchanged_music_clears_fade() {
    let mut data = data_with_frame();
    {
        let frame = data.frame_mut(1).unwrap();
        frame.music = MusicTarget::Stop;
        frame.music_fade = Some(MusicFadeInfo::default());
    }
    let mut test_ui = TestUi::new();
    let host = test_ui.surface.create_element("td");

    let mut overlay = AudioOverlay::music();
    overlay.build(host, data.frame(1).unwrap(), &data, &mut test_ui.services());
    let input = test_ui
        .widgets
        .last_of_kind(FormKind::Resource(ResourceKind::Music))
        .unwrap();
    test_ui.widgets.set_user_value(input, FormValue::Text(String::new()));
    overlay.close_minieditor(1, &mut data, &mut test_ui.services());

    let frame = data.frame(1).unwrap();
    assert_eq!(frame.music, MusicTarget::Unchanged);
    assert_eq!(frame.music_fade, None);
}

#[test]
fn test_close_on_removed_frame_creates_no_records() {
    let mut data = data_with_frame();
    data.insert_frame(InsertPoint::End, None).unwrap();
    let mut test_ui = TestUi::new();
    let host = test_ui.surface.create_element("td");

    let mut music = AudioOverlay::music();
    music.build(host, data.frame(2).unwrap(), &data, &mut test_ui.services());
    let input = test_ui
        .widgets
        .last_of_kind(FormKind::Resource(ResourceKind::Music))
        .unwrap();
    test_ui.widgets.set_user_entry(input, "orphan.mp3", "Orphan");

    let place_host = test_ui.surface.create_element("td");
    let mut place = PlaceOverlay::new(true);
    place.build(place_host, data.frame(2).unwrap(), &data, &mut test_ui.services());
    let input = test_ui
        .widgets
        .last_of_kind(FormKind::Resource(ResourceKind::Place))
        .unwrap();
    test_ui.widgets.set_user_entry(input, "orphan.png", "Orphan");

    data.remove_frame(2).unwrap();
    assert!(music.close_minieditor(2, &mut data, &mut test_ui.services()));
    assert!(place.close_minieditor(2, &mut data, &mut test_ui.services()));
    assert_eq!(data.music.len(), 1);
    assert_eq!(data.places.len(), 1);
}
