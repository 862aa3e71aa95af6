use super::*;
use std::sync::{Arc, Mutex};

fn recorded(presets: &mut Presets<i32>) -> Arc<Mutex<Vec<PresetEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    presets.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
    log
}

#[test]
fn first_added_preset_becomes_active() {
    let mut p = Presets::new();
    let events = recorded(&mut p);
    p.add(Preset::system("Default", 1));
    p.add(Preset::user("Mine", 2));

    assert_eq!(p.count(), 2);
    assert_eq!(p.active_name(), Some("Default"));
    assert_eq!(p.active_content(), Some(&1));
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            PresetEvent::ActivePresetChanged(Some("Default".to_string())),
            PresetEvent::Changed,
            PresetEvent::Changed,
        ]
    );
}

#[test]
fn unique_names_follow_the_copy_series() {
    let mut p = Presets::new();
    p.add(Preset::user("Default", 0));
    assert_eq!(p.unique_name("Other"), "Other");
    assert_eq!(p.unique_name("Default"), "Default copy");
    p.add(Preset::user("Default copy", 0));
    assert_eq!(p.unique_name("Default"), "Default copy 2");
    assert_eq!(p.unique_name("Default copy"), "Default copy 2");
    p.add(Preset::user("Default copy 2", 0));
    assert_eq!(p.unique_name("Default copy 2"), "Default copy 3");
}

#[test]
fn user_edit_of_system_preset_makes_an_active_copy() {
    let mut p = Presets::new();
    p.add(Preset::system("Default", 1));
    p.update_settings(None, 5, false);

    assert_eq!(p.count(), 2);
    assert_eq!(p.get("Default").unwrap().content, 1);
    let copy = p.get("Default copy").unwrap();
    assert_eq!(copy.content, 5);
    assert!(!copy.system);
    assert_eq!(copy.based_on.as_deref(), Some("Default"));
    assert_eq!(p.active_name(), Some("Default copy"));
}

#[test]
fn system_write_moves_user_preset_aside() {
    let mut p = Presets::new();
    p.add(Preset::user("Default", 7));
    p.add(Preset::system("Default", 1));

    let original = p.get("Default").unwrap();
    assert!(original.system);
    assert_eq!(original.content, 1);
    assert_eq!(p.get("Default copy").unwrap().content, 7);
    assert_eq!(p.active_name(), Some("Default copy"));
}

#[test]
fn rename_is_unique_and_follows_based_on() {
    let mut p = Presets::new();
    p.add(Preset::user("A", 1));
    p.add(Preset::user("B", 2));
    assert_eq!(p.duplicate(Some("A")).as_deref(), Some("A copy"));
    assert_eq!(p.active_name(), Some("A copy"));
    p.activate("A");

    p.rename("B");
    assert_eq!(p.active_name(), Some("B copy"));
    assert_eq!(p.get("A copy").unwrap().based_on.as_deref(), Some("B copy"));

    p.rename("B copy");
    assert_eq!(p.active_name(), Some("B copy"));
}

#[test]
fn remove_selects_the_neighbour() {
    let mut p = Presets::new();
    for (i, n) in ["a", "b", "c"].into_iter().enumerate() {
        p.add(Preset::user(n, i as i32));
    }
    p.activate("c");
    p.remove();
    assert_eq!(p.active_name(), Some("b"));
    p.activate("a");
    p.remove();
    assert_eq!(p.active_name(), Some("b"));
    p.remove();
    assert_eq!(p.active_name(), None);
    assert_eq!(p.count(), 0);
    p.remove();
}

#[test]
fn json_round_trip_skips_system_presets_unless_asked() {
    let mut p = Presets::new();
    p.add(Preset::system("Default", 1));
    p.add(Preset::user("Mine", 2));
    p.activate("Mine");

    let json = p.to_json_string(false).unwrap();
    let mut loaded = Presets::<i32>::new();
    loaded.add(Preset::system("Default", 1));
    loaded.load_json_str(&json, false).unwrap();
    assert_eq!(loaded.count(), 2);
    assert_eq!(loaded.active_name(), Some("Mine"));

    let saved = p.to_saved(true);
    assert_eq!(saved.presets.len(), 2);
    assert!(loaded.load_json_str("{not json", false).is_err());
}

#[test]
fn validator_runs_on_add_and_update() {
    let mut p = Presets::new().with_validator(|v: &mut i32| *v = (*v).clamp(0, 10));
    p.add(Preset::user("x", 50));
    assert_eq!(p.active_content(), Some(&10));
    p.update_settings(Some("x"), -3, false);
    assert_eq!(p.active_content(), Some(&0));
}

#[test]
fn debug_shows_the_active_preset() {
    // Mutex is Debug but not Clone.
    let p: Presets<Mutex<u8>> = Presets::default();
    assert!(format!("{p:?}").contains("active: None"));

    let mut p = Presets::new();
    p.add(Preset::user("Racing", 3));
    let shown = format!("{p:?}");
    assert!(shown.contains("Racing"), "{shown}");
}
