use super::*;
use crate::foundation::core::IdGen;
use crate::source::content::SourceKind;
use crate::studio::command::NewSource;

fn studio() -> Studio {
    Studio::with_ids(IdGen::with_epoch(5))
}

fn populated() -> Studio {
    let mut s = studio();
    let text = s
        .add_source(
            SourceKind::Text,
            NewSource {
                name: Some("Title".into()),
                ..NewSource::default()
            },
        )
        .unwrap();
    s.set_opacity(&text, 0.25).unwrap();
    s.add_source(SourceKind::Camera, NewSource::default())
        .unwrap();
    let second = s.create_scene(Some("Break"));
    s.switch_scene(&second, false, 0.0).unwrap();
    s.take_acquisition_requests();
    s
}

#[test]
fn memory_store_round_trip_restores_scenes() {
    let s = populated();
    let mut store = MemoryStore::new();
    save_profile(&s, &mut store, DEFAULT_PROFILE_KEY).unwrap();

    let mut restored = studio();
    let requests = load_profile_into(&mut restored, &store, DEFAULT_PROFILE_KEY).unwrap();
    assert_eq!(restored.scenes().len(), 2);
    assert_eq!(restored.current_scene().unwrap().name, "Break");
    let first = &restored.scenes().scenes()[0];
    assert_eq!(first.sources.len(), 2);
    assert_eq!(first.sources[0].name, "Title");
    assert_eq!(first.sources[0].opacity, 0.25);

    // the camera comes back content-less and asks to be acquired again
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].kind, SourceKind::Camera);
    assert_eq!(requests[0].ticket.source, first.sources[1].id);
}

#[test]
fn dir_store_writes_one_file_per_key() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DirStore::new(dir.path().join("profiles"));
    let s = populated();
    save_profile(&s, &mut store, "show-1").unwrap();
    assert!(dir.path().join("profiles/show-1.json").exists());

    let mut restored = studio();
    load_profile_into(&mut restored, &store, "show-1").unwrap();
    assert_eq!(restored.scenes().len(), 2);

    store.remove("show-1").unwrap();
    assert!(store.get("show-1").unwrap().is_none());
}

#[test]
fn dir_store_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DirStore::new(dir.path());
    for key in ["", "../escape", ".hidden", "a/b"] {
        assert!(
            matches!(store.put(key, "{}"), Err(OnAirError::Validation(_))),
            "{key:?}"
        );
    }
}

#[test]
fn missing_key_leaves_studio_untouched() {
    let mut s = populated();
    let store = MemoryStore::new();
    let requests = load_profile_into(&mut s, &store, DEFAULT_PROFILE_KEY).unwrap();
    assert!(requests.is_empty());
    assert_eq!(s.scenes().len(), 2);
}

#[test]
fn corrupt_profile_resets_to_defaults() {
    let mut s = populated();
    let mut store = MemoryStore::new();
    store.put(DEFAULT_PROFILE_KEY, "{ not json").unwrap();
    let err = load_profile_into(&mut s, &store, DEFAULT_PROFILE_KEY).unwrap_err();
    assert!(matches!(err, OnAirError::Serde(_)));
    assert_eq!(s.scenes().len(), 1);
    assert!(s.current_scene().unwrap().sources.is_empty());
}

#[test]
fn profile_without_scenes_is_rejected() {
    let mut s = populated();
    let mut store = MemoryStore::new();
    store
        .put(DEFAULT_PROFILE_KEY, r#"{"version":1,"scenes":[]}"#)
        .unwrap();
    assert!(load_profile_into(&mut s, &store, DEFAULT_PROFILE_KEY).is_err());
    assert_eq!(s.scenes().len(), 1);
}

#[test]
fn newer_versions_are_refused() {
    let err = Profile::from_json(r#"{"version":99,"scenes":[]}"#).unwrap_err();
    assert!(err.to_string().contains("unsupported profile version"));
}

#[test]
fn saved_document_uses_camel_case_fields() {
    let s = populated();
    let json: serde_json::Value = serde_json::from_str(&s.profile().to_json().unwrap()).unwrap();
    assert_eq!(json["version"], PROFILE_VERSION);
    assert!(json["currentSceneId"].is_string());
    assert!(json["settings"].is_object());
    assert!(json["scenes"].as_array().is_some_and(|a| a.len() == 2));
}

#[test]
fn ids_minted_after_a_load_do_not_collide_with_restored_ones() {
    let s = populated();
    let mut store = MemoryStore::new();
    save_profile(&s, &mut store, DEFAULT_PROFILE_KEY).unwrap();

    // same epoch as the saving session
    let mut restored = studio();
    load_profile_into(&mut restored, &store, DEFAULT_PROFILE_KEY).unwrap();
    let scene = restored.create_scene(Some("Fresh"));
    restored.switch_scene(&scene, false, 0.0).unwrap();
    let source = restored
        .add_source(SourceKind::Color, NewSource::default())
        .unwrap();

    let mut seen = std::collections::HashSet::new();
    for sc in restored.scenes().scenes() {
        assert!(seen.insert(sc.id.as_str().to_owned()), "{}", sc.id);
        for src in &sc.sources {
            assert!(seen.insert(src.id.as_str().to_owned()), "{}", src.id);
        }
    }
    assert!(seen.contains(source.as_str()));
    assert_eq!(restored.scenes().len(), 3);
}
