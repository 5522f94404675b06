//! Scene graph mutations.
//!
//! Every operation here takes the scene by `&mut` (single writer) and updates the object
//! collection and the usage index together, so that after each call:
//!
//! - the set of object ids in the collection equals the union of all usage-index sets, and
//! - `index[o.asset_id]` contains `o.id` for every object `o`.

use std::collections::HashSet;

use crate::{
    foundation::core::{AssetId, ObjectId, Vec3},
    foundation::error::{MoodspaceError, MoodspaceResult},
    scene::model::{AudioAttrs, ImageAttrs, ObjectAttrs, SceneModel, SceneObject},
};

/// Mutable view of one placement handed to [`SceneModel::update`].
///
/// Exposes everything except the asset reference, which only changes through
/// [`SceneModel::remap_asset_id`].
pub struct ObjectEdit<'a> {
    object: &'a mut SceneObject,
}

impl ObjectEdit<'_> {
    /// Placement id.
    pub fn id(&self) -> ObjectId {
        self.object.id
    }

    /// Referenced asset (read-only).
    pub fn asset_id(&self) -> &AssetId {
        &self.object.asset_id
    }

    /// Current position.
    pub fn position(&self) -> Vec3 {
        self.object.position
    }

    /// Replace the position.
    pub fn set_position(&mut self, position: Vec3) {
        self.object.position = position;
    }

    /// Toggle gesture editing.
    pub fn set_editable(&mut self, editable: bool) {
        self.object.is_editable = editable;
    }

    /// Image attributes, `None` for sound placements.
    pub fn image(&mut self) -> Option<&mut ImageAttrs> {
        match &mut self.object.attrs {
            ObjectAttrs::Image(a) => Some(a),
            ObjectAttrs::Audio(_) => None,
        }
    }

    /// Sound attributes, `None` for image placements.
    pub fn audio(&mut self) -> Option<&mut AudioAttrs> {
        match &mut self.object.attrs {
            ObjectAttrs::Audio(a) => Some(a),
            ObjectAttrs::Image(_) => None,
        }
    }
}

impl SceneModel {
    /// Append a placement and register it in the usage index.
    pub fn add(&mut self, object: SceneObject) -> MoodspaceResult<()> {
        if self.index.asset_of(object.id).is_some() {
            return Err(MoodspaceError::validation(format!(
                "scene object '{}' already exists",
                object.id
            )));
        }
        self.index.register(object.id, object.asset_id.clone());
        self.objects.push(object);
        Ok(())
    }

    /// Apply an in-place edit to one placement.
    pub fn update<R>(
        &mut self,
        id: ObjectId,
        edit: impl FnOnce(&mut ObjectEdit<'_>) -> R,
    ) -> MoodspaceResult<R> {
        let object = self
            .objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| MoodspaceError::not_found(format!("scene object '{id}'")))?;
        let mut view = ObjectEdit { object };
        Ok(edit(&mut view))
    }

    /// Remove one placement.
    pub fn delete(&mut self, id: ObjectId) -> MoodspaceResult<SceneObject> {
        let pos = self
            .objects
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| MoodspaceError::not_found(format!("scene object '{id}'")))?;
        let removed = self.objects.remove(pos);
        self.index.unregister(removed.id);
        Ok(removed)
    }

    /// Remove several placements in one pass; unknown ids are ignored.
    ///
    /// Returns the ids actually removed, in collection order.
    pub fn delete_many(&mut self, ids: &[ObjectId]) -> Vec<ObjectId> {
        let wanted: HashSet<ObjectId> = ids.iter().copied().collect();
        let mut removed = Vec::new();
        self.objects.retain(|o| {
            if wanted.contains(&o.id) {
                removed.push(o.id);
                false
            } else {
                true
            }
        });
        for id in &removed {
            self.index.unregister(*id);
        }
        removed
    }

    /// Rewrite every reference to `old` as `new`, including the floor reference.
    ///
    /// Second half of an asset rename. Returns the number of placements rewritten.
    pub fn remap_asset_id(&mut self, old: &AssetId, new: &AssetId) -> usize {
        if old == new {
            return 0;
        }
        let moved = self.index.remap(old, new);
        for object in self.objects.iter_mut().filter(|o| moved.contains(&o.id)) {
            object.asset_id = new.clone();
        }
        if self.environment.floor_asset.as_ref() == Some(old) {
            self.environment.floor_asset = Some(new.clone());
        }
        moved.len()
    }

    /// Remove every placement that references `asset` and clear a matching floor reference.
    ///
    /// Returns the removed ids in collection order so callers can cascade (entity destruction,
    /// audio teardown).
    pub fn remove_all_referencing(&mut self, asset: &AssetId) -> Vec<ObjectId> {
        let taken = self.index.take_asset(asset);
        let mut removed = Vec::with_capacity(taken.len());
        self.objects.retain(|o| {
            if taken.contains(&o.id) {
                removed.push(o.id);
                false
            } else {
                true
            }
        });
        if self.environment.floor_asset.as_ref() == Some(asset) {
            self.environment.floor_asset = None;
        }
        removed
    }

    /// Placements referencing `asset`, in collection order.
    pub fn objects_using<'a>(
        &'a self,
        asset: &'a AssetId,
    ) -> impl Iterator<Item = &'a SceneObject> + 'a {
        self.objects.iter().filter(move |o| &o.asset_id == asset)
    }

    /// Return `true` when anything in the scene references `asset`.
    pub fn references(&self, asset: &AssetId) -> bool {
        self.index.contains_asset(asset) || self.environment.floor_asset.as_ref() == Some(asset)
    }

    /// Verify the collection/index invariant.
    pub fn check_consistency(&self) -> MoodspaceResult<()> {
        let collection: std::collections::BTreeSet<ObjectId> =
            self.objects.iter().map(|o| o.id).collect();
        if collection.len() != self.objects.len() {
            return Err(MoodspaceError::validation("duplicate scene object ids"));
        }
        if collection != self.index.all_objects() || self.index.len() != collection.len() {
            return Err(MoodspaceError::validation(
                "usage index does not match scene objects",
            ));
        }
        for object in &self.objects {
            if self.index.asset_of(object.id) != Some(&object.asset_id) {
                return Err(MoodspaceError::validation(format!(
                    "usage index entry for '{}' does not point at '{}'",
                    object.id, object.asset_id
                )));
            }
        }
        Ok(())
    }

    /// Drop all placements and the index.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.index.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/store.rs"]
mod tests;
