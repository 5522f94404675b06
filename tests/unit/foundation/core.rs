use super::*;

#[test]
fn asset_id_splits_hash_and_filename() {
    let id = AssetId::compose("abc123", "photo@2x.png");
    assert_eq!(id.as_str(), "abc123@photo@2x.png");
    assert_eq!(id.hash_hex(), Some("abc123"));
    assert_eq!(id.filename(), Some("photo@2x.png"));
}

#[test]
fn asset_id_serializes_as_plain_string() {
    let id = AssetId::compose("00ff", "a.wav");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"00ff@a.wav\"");
    let back: AssetId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn object_id_parse_roundtrips_display() {
    let id = ObjectId::new_v4();
    assert_eq!(ObjectId::parse(&id.to_string()), Some(id));
    assert_eq!(ObjectId::parse("not-a-uuid"), None);
}
