use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::foundation::core::{AssetId, ObjectId};

/// Bidirectional map between assets and the placements that reference them.
///
/// Derived state: never persisted, rebuilt on load. Empty per-asset sets are removed eagerly so
/// that `contains_asset` means "referenced by at least one placement".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsageIndex {
    by_asset: BTreeMap<AssetId, BTreeSet<ObjectId>>,
    by_object: HashMap<ObjectId, AssetId>,
}

impl UsageIndex {
    /// Record that `object` references `asset`, replacing any previous entry for `object`.
    pub(crate) fn register(&mut self, object: ObjectId, asset: AssetId) {
        self.unregister(object);
        self.by_asset.entry(asset.clone()).or_default().insert(object);
        self.by_object.insert(object, asset);
    }

    /// Forget `object`; returns the asset it referenced.
    pub(crate) fn unregister(&mut self, object: ObjectId) -> Option<AssetId> {
        let asset = self.by_object.remove(&object)?;
        if let Some(set) = self.by_asset.get_mut(&asset) {
            set.remove(&object);
            if set.is_empty() {
                self.by_asset.remove(&asset);
            }
        }
        Some(asset)
    }

    /// Move every reference from `old` to `new`; returns the moved object ids.
    pub(crate) fn remap(&mut self, old: &AssetId, new: &AssetId) -> BTreeSet<ObjectId> {
        let Some(moved) = self.by_asset.remove(old) else {
            return BTreeSet::new();
        };
        for object in &moved {
            self.by_object.insert(*object, new.clone());
        }
        self.by_asset
            .entry(new.clone())
            .or_default()
            .extend(moved.iter().copied());
        moved
    }

    /// Remove and return every object referencing `asset`.
    pub(crate) fn take_asset(&mut self, asset: &AssetId) -> BTreeSet<ObjectId> {
        let taken = self.by_asset.remove(asset).unwrap_or_default();
        for object in &taken {
            self.by_object.remove(object);
        }
        taken
    }

    /// Objects referencing `asset`.
    pub fn objects_for(&self, asset: &AssetId) -> impl Iterator<Item = ObjectId> + '_ {
        self.by_asset
            .get(asset)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Number of objects referencing `asset`.
    pub fn usage_count(&self, asset: &AssetId) -> usize {
        self.by_asset.get(asset).map_or(0, BTreeSet::len)
    }

    /// Return `true` when at least one object references `asset`.
    pub fn contains_asset(&self, asset: &AssetId) -> bool {
        self.by_asset.contains_key(asset)
    }

    /// Asset referenced by `object`.
    pub fn asset_of(&self, object: ObjectId) -> Option<&AssetId> {
        self.by_object.get(&object)
    }

    /// Referenced asset ids in sorted order.
    pub fn asset_ids(&self) -> impl Iterator<Item = &AssetId> {
        self.by_asset.keys()
    }

    /// Union of all per-asset object sets.
    pub fn all_objects(&self) -> BTreeSet<ObjectId> {
        self.by_asset.values().flatten().copied().collect()
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.by_object.len()
    }

    /// Return `true` when no object is indexed.
    pub fn is_empty(&self) -> bool {
        self.by_object.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.by_asset.clear();
        self.by_object.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/usage.rs"]
mod tests;
