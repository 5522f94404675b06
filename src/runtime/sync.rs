use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::{
    assets::{model::Asset, repository::AssetRepository},
    foundation::core::{AssetId, ObjectId},
    foundation::error::{MoodspaceError, MoodspaceResult},
    scene::model::{SceneObject, SpatialEnvironment},
};

/// Resolves asset ids for the synchronizer.
pub trait AssetLookup {
    /// Return the asset with `id`, if it is still in the catalog.
    fn lookup(&self, id: &AssetId) -> Option<&Asset>;
}

impl AssetLookup for AssetRepository {
    fn lookup(&self, id: &AssetId) -> Option<&Asset> {
        self.find(id)
    }
}

impl AssetLookup for [Asset] {
    fn lookup(&self, id: &AssetId) -> Option<&Asset> {
        self.iter().find(|a| &a.id == id)
    }
}

/// Builds and tears down the visual representation of scene objects.
///
/// Implemented by the rendering collaborator; handles are opaque to this crate.
pub trait EntityFactory {
    /// Visual handle for one placement.
    type Handle;
    /// Visual handle for the floor.
    type Floor;

    /// Build a handle for `object`, which references `asset`.
    fn create(&mut self, object: &SceneObject, asset: &Asset) -> MoodspaceResult<Self::Handle>;

    /// Move an existing handle to the object's current position.
    fn update_transform(&mut self, handle: &mut Self::Handle, object: &SceneObject);

    /// Push type-specific attributes (crop, rotation, scale, volume) to an existing handle.
    fn update_attributes(&mut self, handle: &mut Self::Handle, object: &SceneObject, asset: &Asset);

    /// Release a handle.
    fn destroy(&mut self, handle: Self::Handle);

    /// Build the floor. `floor_asset` is `None` when no texture is configured or it is missing.
    fn create_floor(
        &mut self,
        environment: &SpatialEnvironment,
        floor_asset: Option<&Asset>,
    ) -> MoodspaceResult<Self::Floor>;

    /// Release the floor.
    fn destroy_floor(&mut self, floor: Self::Floor);
}

/// Counters returned by [`EntitySynchronizer::sync`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Handles built this pass.
    pub created: usize,
    /// Existing handles whose transform was refreshed.
    pub updated: usize,
    /// Handles released because their object left the scene.
    pub destroyed: usize,
    /// Objects left without a handle this pass (missing asset or failed creation).
    pub skipped: usize,
}

/// Keeps one runtime handle per scene object by set reconciliation.
///
/// Only presence and position are diffed. Attribute changes are pushed explicitly with
/// [`EntitySynchronizer::refresh`] or [`EntitySynchronizer::rebuild`].
pub struct EntitySynchronizer<F: EntityFactory> {
    factory: F,
    handles: HashMap<ObjectId, F::Handle>,
    floor: Option<F::Floor>,
}

impl<F: EntityFactory> EntitySynchronizer<F> {
    /// Create an empty synchronizer around `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            handles: HashMap::new(),
            floor: None,
        }
    }

    /// Borrow the factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Mutably borrow the factory.
    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// Reconcile handles against `objects`.
    ///
    /// Objects whose asset cannot be resolved are skipped and retried on the next pass.
    pub fn sync<L: AssetLookup + ?Sized>(
        &mut self,
        objects: &[SceneObject],
        lookup: &L,
    ) -> SyncStats {
        let mut stats = SyncStats::default();

        let current: HashSet<ObjectId> = objects.iter().map(|o| o.id).collect();
        let stale: Vec<ObjectId> = self
            .handles
            .keys()
            .filter(|id| !current.contains(id))
            .copied()
            .collect();
        for id in stale {
            if let Some(handle) = self.handles.remove(&id) {
                self.factory.destroy(handle);
                stats.destroyed += 1;
            }
        }

        for object in objects {
            if let Some(handle) = self.handles.get_mut(&object.id) {
                self.factory.update_transform(handle, object);
                stats.updated += 1;
                continue;
            }
            let Some(asset) = lookup.lookup(&object.asset_id) else {
                debug!(object = %object.id, asset = %object.asset_id, "asset missing, skipping");
                stats.skipped += 1;
                continue;
            };
            match self.factory.create(object, asset) {
                Ok(handle) => {
                    self.handles.insert(object.id, handle);
                    stats.created += 1;
                }
                Err(e) => {
                    warn!(object = %object.id, error = %e, "entity creation failed, skipping");
                    stats.skipped += 1;
                }
            }
        }

        debug!(
            created = stats.created,
            updated = stats.updated,
            destroyed = stats.destroyed,
            skipped = stats.skipped,
            "entities synchronized"
        );
        stats
    }

    /// Push attribute changes of `object` to its handle.
    ///
    /// Returns `false` when the object has no handle or its asset is gone.
    pub fn refresh<L: AssetLookup + ?Sized>(&mut self, object: &SceneObject, lookup: &L) -> bool {
        let Some(handle) = self.handles.get_mut(&object.id) else {
            return false;
        };
        let Some(asset) = lookup.lookup(&object.asset_id) else {
            return false;
        };
        self.factory.update_attributes(handle, object, asset);
        true
    }

    /// Destroy and recreate the handle of `object`.
    pub fn rebuild<L: AssetLookup + ?Sized>(
        &mut self,
        object: &SceneObject,
        lookup: &L,
    ) -> MoodspaceResult<()> {
        if let Some(handle) = self.handles.remove(&object.id) {
            self.factory.destroy(handle);
        }
        let asset = lookup.lookup(&object.asset_id).ok_or_else(|| {
            MoodspaceError::entity_creation(format!(
                "asset '{}' for object '{}' is missing",
                object.asset_id, object.id
            ))
        })?;
        let handle = self.factory.create(object, asset)?;
        self.handles.insert(object.id, handle);
        Ok(())
    }

    /// Return the cached floor, building it on first use.
    pub fn get_or_create_floor<L: AssetLookup + ?Sized>(
        &mut self,
        environment: &SpatialEnvironment,
        lookup: &L,
    ) -> MoodspaceResult<&mut F::Floor> {
        let floor = match self.floor.take() {
            Some(floor) => floor,
            None => {
                let asset = environment
                    .floor_asset
                    .as_ref()
                    .and_then(|id| lookup.lookup(id));
                self.factory.create_floor(environment, asset)?
            }
        };
        Ok(self.floor.insert(floor))
    }

    /// Drop the cached floor so the next [`EntitySynchronizer::get_or_create_floor`] rebuilds it.
    pub fn invalidate_floor(&mut self) {
        if let Some(floor) = self.floor.take() {
            self.factory.destroy_floor(floor);
        }
    }

    /// Release every handle and the floor.
    pub fn teardown(&mut self) {
        let count = self.handles.len();
        for (_, handle) in self.handles.drain() {
            self.factory.destroy(handle);
        }
        self.invalidate_floor();
        debug!(count, "entities torn down");
    }

    /// Handle for `id`, if one exists.
    pub fn handle(&self, id: ObjectId) -> Option<&F::Handle> {
        self.handles.get(&id)
    }

    /// Number of live handles (floor excluded).
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Return `true` when no object handle is live.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Return `true` when a floor is cached.
    pub fn has_floor(&self) -> bool {
        self.floor.is_some()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/sync.rs"]
mod tests;
