use super::*;
use crate::foundation::core::{AssetId, Vec3};
use crate::scene::model::ImmersionStyle;

fn asset(name: &str) -> AssetId {
    AssetId::compose("cd", name)
}

#[test]
fn save_then_load_keeps_ids_and_rebuilds_index() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.json");

    let mut scene = SceneModel::new("proj");
    scene.environment.immersion = ImmersionStyle::Full;
    scene.environment.floor_asset = Some(asset("floor.png"));
    let a = SceneObject::image(asset("a.png"), Vec3::new(1.0, 0.0, -1.0));
    let b = SceneObject::audio(asset("rain.wav"), Vec3::Y);
    let c = SceneObject::image(asset("a.png"), Vec3::ZERO);
    let ids = [a.id, b.id, c.id];
    for o in [a, b, c] {
        scene.add(o).unwrap();
    }
    scene.spatial.camera_yaw = 1.5;

    scene.save(&path).unwrap();
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("scene.json")]);

    let loaded = SceneModel::load(&path, "proj").unwrap();
    let loaded_ids: Vec<ObjectId> = loaded.objects().iter().map(|o| o.id).collect();
    assert_eq!(loaded_ids, ids);
    assert_eq!(loaded.objects(), scene.objects());
    assert_eq!(loaded.environment, scene.environment);
    assert_eq!(loaded.usage().usage_count(&asset("a.png")), 2);
    assert_eq!(loaded.spatial.camera_yaw, 0.0);
    loaded.check_consistency().unwrap();
}

#[test]
fn missing_file_is_an_empty_scene() {
    let dir = tempfile::tempdir().unwrap();
    let scene = SceneModel::load(&dir.path().join("scene.json"), "proj").unwrap();
    assert!(scene.is_empty());
    assert_eq!(scene.project_id(), "proj");
}

#[test]
fn malformed_json_is_a_serde_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.json");
    std::fs::write(&path, b"{ not json").unwrap();
    let err = SceneModel::load(&path, "proj").unwrap_err();
    assert!(matches!(err, MoodspaceError::Serde(_)), "{err}");
}

#[test]
fn newer_version_is_rejected() {
    let json = r#"{ "version": 99, "project_id": "p", "objects": [] }"#;
    let err = SceneDocument::from_reader(json.as_bytes()).unwrap_err();
    assert!(matches!(err, MoodspaceError::Validation(_)), "{err}");
}

#[test]
fn objects_without_ids_get_fresh_ones_and_duplicates_are_reassigned() {
    let id = ObjectId::new_v4();
    let json = format!(
        r#"{{
            "project_id": "p",
            "objects": [
                {{ "asset_id": "ab@a.png", "position": [0.0, 0.0, 0.0],
                   "attrs": {{ "type": "image" }} }},
                {{ "id": "{id}", "asset_id": "ab@s.wav", "position": [1.0, 2.0, 3.0],
                   "attrs": {{ "type": "audio", "volume": 0.5 }} }},
                {{ "id": "{id}", "asset_id": "ab@s.wav", "position": [1.0, 2.0, 3.0],
                   "attrs": {{ "type": "audio" }} }}
            ]
        }}"#
    );
    let doc = SceneDocument::from_reader(json.as_bytes()).unwrap();
    assert_eq!(doc.version, SCENE_DOCUMENT_VERSION);

    let scene = doc.into_model();
    assert_eq!(scene.len(), 3);
    assert_eq!(scene.objects()[1].id, id);
    assert_ne!(scene.objects()[2].id, id);
    assert!(scene.objects()[0].is_editable);
    assert_eq!(scene.objects()[0].image_attrs().unwrap().scale, 1.0);
    let audio = scene.objects()[1].audio_attrs().unwrap();
    assert_eq!(audio.volume, 0.5);
    assert!(audio.autoplay);
    scene.check_consistency().unwrap();
}

#[test]
fn concurrent_saves_never_leave_a_torn_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.json");

    let docs: Vec<SceneDocument> = (0..4)
        .map(|n| {
            let mut scene = SceneModel::new("proj");
            for _ in 0..=(n * 50) {
                scene.add(SceneObject::image(asset("a.png"), Vec3::ZERO)).unwrap();
            }
            scene.to_document()
        })
        .collect();

    std::thread::scope(|s| {
        for doc in &docs {
            let path = &path;
            s.spawn(move || {
                for _ in 0..20 {
                    doc.save(path).unwrap();
                }
            });
        }
    });

    let loaded = SceneModel::load(&path, "proj").unwrap();
    assert!(docs.iter().any(|d| d.objects.len() == loaded.len()));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
