use std::{
    fs,
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::Context;
use tracing::warn;

use crate::{
    foundation::core::ObjectId,
    foundation::error::{MoodspaceError, MoodspaceResult},
    scene::model::{SceneModel, SceneObject, SpatialEnvironment},
};

/// Current on-disk scene document version.
pub const SCENE_DOCUMENT_VERSION: u32 = 1;

/// Persisted form of a [`SceneModel`].
///
/// Transient view state ([`crate::scene::model::UserSpatialState`]) and the usage index are not
/// part of the document; both are rebuilt on load.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneDocument {
    /// Format version, see [`SCENE_DOCUMENT_VERSION`].
    #[serde(default = "current_version")]
    pub version: u32,
    /// Owning project id.
    pub project_id: String,
    /// Environment settings.
    #[serde(default)]
    pub environment: SpatialEnvironment,
    /// Placements in scene order.
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

fn current_version() -> u32 {
    SCENE_DOCUMENT_VERSION
}

impl SceneDocument {
    /// Parse a document from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> MoodspaceResult<Self> {
        let doc: SceneDocument = serde_json::from_reader(r)
            .map_err(|e| MoodspaceError::serde(format!("parse scene JSON: {e}")))?;
        if doc.version > SCENE_DOCUMENT_VERSION {
            return Err(MoodspaceError::validation(format!(
                "scene document version {} is newer than supported version {SCENE_DOCUMENT_VERSION}",
                doc.version
            )));
        }
        Ok(doc)
    }

    /// Write the document as pretty JSON.
    ///
    /// The bytes go to a uniquely named temp file in the same directory, which is then renamed
    /// over `path`, so readers never observe a half-written scene. A failed write removes the temp
    /// file and leaves the previous document in place.
    pub fn save(&self, path: &Path) -> MoodspaceResult<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let write = || -> anyhow::Result<()> {
            fs::create_dir_all(dir)
                .with_context(|| format!("create scene dir '{}'", dir.display()))?;
            let tmp = tempfile::Builder::new()
                .prefix(".scene-")
                .suffix(".tmp")
                .tempfile_in(dir)
                .with_context(|| format!("create temp file in '{}'", dir.display()))?;
            let mut w = BufWriter::new(tmp);
            serde_json::to_writer_pretty(&mut w, self).context("encode scene JSON")?;
            let tmp = w
                .into_inner()
                .map_err(|e| e.into_error())
                .context("flush scene JSON")?;
            tmp.as_file().sync_all().context("sync scene JSON")?;
            tmp.persist(path)
                .map_err(|e| e.error)
                .with_context(|| format!("replace '{}'", path.display()))?;
            Ok(())
        };
        write().map_err(MoodspaceError::from_io)
    }

    /// Build a live scene from this document, replaying every placement through
    /// [`SceneModel::add`] so the usage index is rebuilt.
    ///
    /// Duplicate ids (hand-edited documents) are replaced with fresh ids.
    pub fn into_model(self) -> SceneModel {
        let mut scene = SceneModel::new(self.project_id);
        scene.environment = self.environment;
        for mut object in self.objects {
            if scene.usage().asset_of(object.id).is_some() {
                let fresh = ObjectId::new_v4();
                warn!(old = %object.id, new = %fresh, "duplicate scene object id, reassigning");
                object.id = fresh;
            }
            // Ids are unique at this point, so `add` cannot fail.
            if let Err(e) = scene.add(object) {
                warn!("dropping scene object: {e}");
            }
        }
        scene
    }
}

impl SceneModel {
    /// Snapshot the persisted part of the scene.
    pub fn to_document(&self) -> SceneDocument {
        SceneDocument {
            version: SCENE_DOCUMENT_VERSION,
            project_id: self.project_id().to_owned(),
            environment: self.environment.clone(),
            objects: self.objects.clone(),
        }
    }

    /// Load the scene stored at `path`.
    ///
    /// A missing file yields an empty scene for `project_id`. Object ids come back exactly as they
    /// were saved.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path, project_id: &str) -> MoodspaceResult<Self> {
        let file = match fs::File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SceneModel::new(project_id));
            }
            Err(e) => {
                return Err(MoodspaceError::io(format!(
                    "open scene '{}': {e}",
                    path.display()
                )));
            }
        };
        let doc = SceneDocument::from_reader(BufReader::new(file))?;
        if doc.project_id != project_id {
            warn!(
                stored = %doc.project_id,
                expected = project_id,
                "scene document belongs to a different project id"
            );
        }
        let scene = doc.into_model();
        scene.check_consistency()?;
        Ok(scene)
    }

    /// Persist the scene to `path`.
    pub fn save(&self, path: &Path) -> MoodspaceResult<()> {
        self.to_document().save(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/document.rs"]
mod tests;
