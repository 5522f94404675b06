use super::*;

fn asset(name: &str) -> AssetId {
    AssetId::compose("00", name)
}

#[test]
fn register_and_unregister_drop_empty_sets() {
    let mut idx = UsageIndex::default();
    let o1 = ObjectId::new_v4();
    let o2 = ObjectId::new_v4();
    idx.register(o1, asset("a.png"));
    idx.register(o2, asset("a.png"));
    assert_eq!(idx.usage_count(&asset("a.png")), 2);

    assert_eq!(idx.unregister(o1), Some(asset("a.png")));
    assert!(idx.contains_asset(&asset("a.png")));
    idx.unregister(o2);
    assert!(!idx.contains_asset(&asset("a.png")));
    assert!(idx.is_empty());
    assert_eq!(idx.unregister(o2), None);
}

#[test]
fn register_replaces_previous_reference() {
    let mut idx = UsageIndex::default();
    let o = ObjectId::new_v4();
    idx.register(o, asset("a.png"));
    idx.register(o, asset("b.png"));
    assert!(!idx.contains_asset(&asset("a.png")));
    assert_eq!(idx.asset_of(o), Some(&asset("b.png")));
    assert_eq!(idx.len(), 1);
}

#[test]
fn remap_merges_into_existing_target() {
    let mut idx = UsageIndex::default();
    let o1 = ObjectId::new_v4();
    let o2 = ObjectId::new_v4();
    idx.register(o1, asset("old.png"));
    idx.register(o2, asset("new.png"));

    let moved = idx.remap(&asset("old.png"), &asset("new.png"));
    assert_eq!(moved.len(), 1);
    assert!(moved.contains(&o1));
    assert_eq!(idx.usage_count(&asset("new.png")), 2);
    assert!(!idx.contains_asset(&asset("old.png")));
    assert_eq!(idx.asset_of(o1), Some(&asset("new.png")));

    assert!(idx.remap(&asset("missing"), &asset("x")).is_empty());
    assert!(!idx.contains_asset(&asset("x")));
}

#[test]
fn take_asset_clears_both_directions() {
    let mut idx = UsageIndex::default();
    let ids: Vec<ObjectId> = (0..3).map(|_| ObjectId::new_v4()).collect();
    for id in &ids {
        idx.register(*id, asset("gone.wav"));
    }
    let keep = ObjectId::new_v4();
    idx.register(keep, asset("keep.wav"));

    let taken = idx.take_asset(&asset("gone.wav"));
    assert_eq!(taken.len(), 3);
    assert!(ids.iter().all(|id| idx.asset_of(*id).is_none()));
    assert_eq!(idx.all_objects(), BTreeSet::from([keep]));
}
