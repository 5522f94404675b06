use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tracing::{debug, error, info};

use crate::{
    assets::{
        model::{Asset, AssetType},
        repository::{AssetRepository, RepositoryOpts},
    },
    audio::{
        coordinator::{AudioCoordinator, PlaybackController},
        preview::PreviewPlayer,
    },
    foundation::core::{AssetId, ObjectId, Vec3},
    foundation::error::{MoodspaceError, MoodspaceResult},
    scene::{
        document::SceneDocument,
        model::{SceneModel, SceneObject},
        store::ObjectEdit,
    },
    session::autosave::AutosaveScheduler,
};

/// Options for [`ProjectSession::open`].
#[derive(Clone, Debug)]
pub struct SessionOpts {
    /// Catalog options.
    pub repository: RepositoryOpts,
    /// Quiet period before a debounced scene save is written.
    pub autosave_delay: Duration,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            repository: RepositoryOpts::default(),
            autosave_delay: Duration::from_millis(600),
        }
    }
}

/// One open project: catalog, scene, playback, and persistence behind a single owner.
///
/// Every mutation goes through `&mut self`, so callers never observe a half-applied change.
/// Discrete edits (import, rename, delete, placement) save the scene immediately; continuous
/// edits (moves, attribute tweaks) go through the debounced autosave.
///
/// Once a discrete edit has committed in memory it is reported as successful. If its immediate
/// write fails, the error is logged and the write is retried through the autosave.
pub struct ProjectSession {
    root: PathBuf,
    scene_path: PathBuf,
    opts: SessionOpts,
    repository: AssetRepository,
    scene: SceneModel,
    audio: AudioCoordinator,
    preview: PreviewPlayer,
    autosave: AutosaveScheduler<SceneDocument>,
}

impl ProjectSession {
    /// Open (or create) the project rooted at `root`.
    ///
    /// The project id is the root directory name.
    #[tracing::instrument(skip(opts), fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>, opts: SessionOpts) -> MoodspaceResult<Self> {
        let root = root.as_ref().to_path_buf();
        let mut repository = AssetRepository::new(&root, opts.repository.clone())?;
        repository.reload()?;

        let project_id = root
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("project")
            .to_string();
        let scene_path = repository.store().scene_path();
        let scene = SceneModel::load(&scene_path, &project_id)?;

        let target = scene_path.clone();
        let autosave = AutosaveScheduler::new(move |doc: SceneDocument| doc.save(&target))?;

        info!(
            project = project_id,
            assets = repository.assets().len(),
            objects = scene.len(),
            "project opened"
        );
        Ok(Self {
            root,
            scene_path,
            opts,
            repository,
            scene,
            audio: AudioCoordinator::new(),
            preview: PreviewPlayer::new(),
            autosave,
        })
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Live scene.
    pub fn scene(&self) -> &SceneModel {
        &self.scene
    }

    /// Asset catalog.
    pub fn assets(&self) -> &AssetRepository {
        &self.repository
    }

    /// Asset catalog, for subscribing observers or reloading.
    pub fn assets_mut(&mut self) -> &mut AssetRepository {
        &mut self.repository
    }

    /// Playback coordinator.
    pub fn audio(&self) -> &AudioCoordinator {
        &self.audio
    }

    /// Playback coordinator, for registering controllers and muting.
    pub fn audio_mut(&mut self) -> &mut AudioCoordinator {
        &mut self.audio
    }

    /// Apply finished waveform back-fill results. Returns the number applied.
    pub fn poll_backfill(&mut self) -> usize {
        self.repository.poll_backfill()
    }

    /// Foreground preview player.
    pub fn preview(&self) -> &PreviewPlayer {
        &self.preview
    }

    /// Import raw bytes as a new asset.
    #[tracing::instrument(skip(self, bytes))]
    pub fn import_asset(&mut self, bytes: &[u8], suggested_filename: &str) -> MoodspaceResult<Asset> {
        self.repository.add(bytes, suggested_filename)
    }

    /// Rename an asset and rewrite every scene reference to it, then save.
    ///
    /// A failed rename leaves catalog, scene, and file untouched.
    #[tracing::instrument(skip(self))]
    pub fn rename_asset(&mut self, id: &AssetId, new_base_name: &str) -> MoodspaceResult<Asset> {
        let renamed = self.repository.rename(id, new_base_name)?;
        if &renamed.id == id {
            return Ok(renamed);
        }
        let remapped = self.scene.remap_asset_id(id, &renamed.id);
        debug!(remapped, "scene references remapped");
        self.save_committed();
        Ok(renamed)
    }

    /// Copy an asset under a new name; defaults to `"<stem> copy"`.
    #[tracing::instrument(skip(self))]
    pub fn duplicate_asset(
        &mut self,
        id: &AssetId,
        new_base_name: Option<&str>,
    ) -> MoodspaceResult<Asset> {
        self.repository.duplicate(id, new_base_name)
    }

    /// Delete an asset together with every placement that uses it.
    ///
    /// Returns the removed placement ids.
    #[tracing::instrument(skip(self))]
    pub fn delete_asset(&mut self, id: &AssetId) -> MoodspaceResult<Vec<ObjectId>> {
        if self.preview.current() == Some(id) {
            self.preview.stop(&mut self.audio);
        }
        self.repository.delete(id)?;
        let removed = self.scene.remove_all_referencing(id);
        for object in &removed {
            self.audio.unregister(*object);
        }
        debug!(removed = removed.len(), "cascade delete");
        self.save_committed();
        Ok(removed)
    }

    /// Place an asset in the scene and save.
    #[tracing::instrument(skip(self))]
    pub fn place_asset(&mut self, asset_id: &AssetId, position: Vec3) -> MoodspaceResult<ObjectId> {
        let asset = self.repository.get(asset_id)?;
        let object = SceneObject::for_asset(asset, position);
        let id = object.id;
        self.scene.add(object)?;
        self.save_committed();
        Ok(id)
    }

    /// Move a placement; the save is debounced.
    pub fn move_object(&mut self, id: ObjectId, position: Vec3) -> MoodspaceResult<()> {
        self.scene.update(id, |e| e.set_position(position))?;
        self.schedule_save();
        Ok(())
    }

    /// Apply an attribute edit to a placement; the save is debounced.
    pub fn edit_object<R>(
        &mut self,
        id: ObjectId,
        edit: impl FnOnce(&mut ObjectEdit<'_>) -> R,
    ) -> MoodspaceResult<R> {
        let out = self.scene.update(id, edit)?;
        self.schedule_save();
        Ok(out)
    }

    /// Change the volume of a sound placement and its live controller; the save is debounced.
    pub fn set_volume(&mut self, id: ObjectId, volume: f32) -> MoodspaceResult<()> {
        let volume = volume.clamp(0.0, 1.0);
        let applied = self.scene.update(id, |e| {
            e.audio().map(|attrs| attrs.volume = volume).is_some()
        })?;
        if !applied {
            return Err(MoodspaceError::validation(format!(
                "scene object '{id}' is not a sound"
            )));
        }
        self.audio.set_volume(id, volume);
        self.schedule_save();
        Ok(())
    }

    /// Remove placements and stop their playback, then save.
    #[tracing::instrument(skip(self))]
    pub fn delete_objects(&mut self, ids: &[ObjectId]) -> MoodspaceResult<Vec<ObjectId>> {
        let removed = self.scene.delete_many(ids);
        for id in &removed {
            self.audio.unregister(*id);
        }
        self.save_committed();
        Ok(removed)
    }

    /// Set or clear the floor texture, then save. The asset must be an image.
    #[tracing::instrument(skip(self))]
    pub fn set_floor_asset(&mut self, asset_id: Option<&AssetId>) -> MoodspaceResult<()> {
        if let Some(id) = asset_id {
            let asset = self.repository.get(id)?;
            if asset.asset_type() != AssetType::Image {
                return Err(MoodspaceError::validation(format!(
                    "floor asset '{id}' is not an image"
                )));
            }
        }
        self.scene.environment.floor_asset = asset_id.cloned();
        self.save_committed();
        Ok(())
    }

    /// Audition a catalog sound, suspending placed sources.
    pub fn start_preview(
        &mut self,
        asset_id: &AssetId,
        controller: Arc<dyn PlaybackController>,
    ) -> MoodspaceResult<()> {
        let asset = self.repository.get(asset_id)?;
        if asset.asset_type() != AssetType::Sound {
            return Err(MoodspaceError::validation(format!(
                "preview asset '{asset_id}' is not a sound"
            )));
        }
        self.preview
            .start(asset_id.clone(), controller, &mut self.audio);
        Ok(())
    }

    /// End the current preview and resume placed sources.
    pub fn stop_preview(&mut self) {
        self.preview.stop(&mut self.audio);
    }

    /// Write the scene now, dropping any pending debounced save.
    ///
    /// A debounced write already in progress finishes first, so the newer snapshot always lands
    /// last.
    pub fn save_now(&mut self) -> MoodspaceResult<()> {
        self.autosave.cancel_and_wait();
        self.scene.save(&self.scene_path)
    }

    /// Wait for any pending debounced save to be written.
    pub fn flush(&self) {
        self.autosave.flush();
    }

    /// Return `true` while a debounced save is waiting.
    pub fn has_pending_save(&self) -> bool {
        self.autosave.has_pending()
    }

    fn save_committed(&mut self) {
        if let Err(e) = self.save_now() {
            error!(error = %e, "scene save failed, retrying in background");
            self.schedule_save();
        }
    }

    fn schedule_save(&self) {
        self.autosave
            .schedule_save(self.scene.to_document(), self.opts.autosave_delay);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/project.rs"]
mod tests;
