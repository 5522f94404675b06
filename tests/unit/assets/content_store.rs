use super::*;

#[test]
fn sanitize_strips_unsafe_characters() {
    assert_eq!(sanitize_filename("photo.png"), "photo.png");
    assert_eq!(sanitize_filename("../sneaky/pic.PNG"), "sneakypic.PNG");
    assert_eq!(sanitize_filename("a:b*c?d\"e<f>g|h.jpg"), "abcdefgh.jpg");
    assert_eq!(sanitize_filename("  .hidden.wav  "), "hidden.wav");
    assert_eq!(sanitize_filename("tab\there.wav"), "tabhere.wav");
}

#[test]
fn sanitize_collapses_to_untitled() {
    assert_eq!(sanitize_filename(""), "untitled");
    assert_eq!(sanitize_filename("///"), "untitled");
    assert_eq!(sanitize_filename("?.png"), "untitled.png");
    assert_eq!(sanitize_stem("  "), "untitled");
    assert_eq!(sanitize_stem("new/name"), "newname");
}

#[test]
fn hash_bytes_matches_known_digest() {
    assert_eq!(
        hash_bytes(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn unique_filename_appends_counter() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ContentStore::new(tmp.path());
    store.ensure_layout().unwrap();

    assert_eq!(store.unique_filename(AssetType::Image, "a", "png"), "a.png");
    store.write_new(AssetType::Image, "a.png", b"1").unwrap();
    assert_eq!(store.unique_filename(AssetType::Image, "a", "png"), "a-1.png");
    store.write_new(AssetType::Image, "a-1.png", b"2").unwrap();
    assert_eq!(store.unique_filename(AssetType::Image, "a", "png"), "a-2.png");
    // Other type directories do not collide.
    assert_eq!(store.unique_filename(AssetType::Sound, "a", "png"), "a.png");
}

#[test]
fn write_new_refuses_to_overwrite() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ContentStore::new(tmp.path());
    let path = store.write_new(AssetType::Sound, "x.wav", b"one").unwrap();
    assert!(store.write_new(AssetType::Sound, "x.wav", b"two").is_err());
    assert_eq!(store.read(&path).unwrap(), b"one");
}

#[test]
fn list_filters_by_extension_and_sorts() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ContentStore::new(tmp.path());
    store.write_new(AssetType::Image, "b.PNG", b"b").unwrap();
    store.write_new(AssetType::Image, "a.jpg", b"a").unwrap();
    store.write_new(AssetType::Image, "notes.txt", b"n").unwrap();

    let names: Vec<String> = store
        .list(AssetType::Image)
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.jpg".to_string(), "b.PNG".to_string()]);
    assert!(store.list(AssetType::Sound).unwrap().is_empty());
}

#[test]
fn hash_file_matches_hash_bytes() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ContentStore::new(tmp.path());
    let payload = vec![7u8; 100_000];
    let path = store.write_new(AssetType::Sound, "big.wav", &payload).unwrap();
    assert_eq!(store.hash_file(&path).unwrap(), hash_bytes(&payload));
}

#[test]
fn missing_file_maps_to_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ContentStore::new(tmp.path());
    let err = store.read(&tmp.path().join("nope.png")).unwrap_err();
    assert!(err.is_not_found());
    let err = store.hash_file(&tmp.path().join("nope.png")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn rename_refuses_existing_target() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ContentStore::new(tmp.path());
    let a = store.write_new(AssetType::Image, "a.png", b"a").unwrap();
    store.write_new(AssetType::Image, "b.png", b"b").unwrap();
    assert!(store.rename(&a, AssetType::Image, "b.png").is_err());
    assert!(a.exists());
    let c = store.rename(&a, AssetType::Image, "c.png").unwrap();
    assert!(!a.exists());
    assert_eq!(store.read(&c).unwrap(), b"a");
}
