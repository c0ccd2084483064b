use scml_animation_core::{Document, DocumentError, LoopMode, TimelineKind};
use scml_test_fixtures::documents;

#[test]
fn every_manifest_document_parses_as_json() {
    let keys = documents::keys();
    assert!(keys.contains(&"stick_figure".to_string()));
    for name in keys {
        let value: serde_json::Value =
            documents::load(&name).unwrap_or_else(|e| panic!("{name}: {e:#}"));
        assert!(value.get("entity").is_some(), "{name} has no entities");
    }
}

#[test]
fn stick_figure_loads_with_every_loop_mode() {
    let json = documents::json("stick_figure").unwrap();
    let doc = Document::from_scon_json(&json).expect("stick_figure should load");
    assert_eq!(doc.version, "1.0");
    assert_eq!(doc.folders.len(), 2);

    let stick = doc.entity_by_name("stick").unwrap();
    assert_eq!(stick.character_maps.len(), 1);
    let modes: Vec<LoopMode> = stick.animations.values().map(|a| a.looping).collect();
    assert_eq!(
        modes,
        vec![
            LoopMode::Loop,
            LoopMode::NoLoop,
            LoopMode::Loop,
            LoopMode::PingPong
        ]
    );
    let intro = stick.animation_by_name("intro").unwrap();
    assert_eq!(intro.loop_to, 400);

    let wave = stick.animation_by_name("wave").unwrap();
    let kinds: Vec<TimelineKind> = wave.timelines.values().map(|t| t.kind).collect();
    assert_eq!(kinds.iter().filter(|k| k.is_bone()).count(), 2);
    assert_eq!(wave.mainline.len(), 2);
}

#[test]
fn image_tables_resolve_through_the_manifest() {
    let sizes = documents::image_sizes("stick_figure").unwrap();
    assert_eq!(sizes.len(), 3);
    assert!(documents::image_sizes("cyclic_bones").unwrap().is_empty());
    assert!(documents::json("no_such_fixture").is_err());
}

#[test]
fn loop_to_past_the_end_is_rejected() {
    let json = documents::json("stick_figure").unwrap();
    let bad = json.replace("\"loop_to\": 400", "\"loop_to\": 4000");
    assert!(matches!(
        Document::from_scon_json(&bad),
        Err(DocumentError::InvalidField {
            field: "loop_to",
            ..
        })
    ));
}
