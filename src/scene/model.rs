use crate::{
    assets::model::{Asset, AssetType},
    foundation::core::{AssetId, ObjectId, Rect, Vec3},
    scene::usage::UsageIndex,
};

/// Image placement attributes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageAttrs {
    /// Uniform scale factor.
    pub scale: f32,
    /// Euler rotation in radians.
    pub rotation: Vec3,
    /// Visible region in normalized image coordinates (`0..1` on both axes).
    pub crop: Rect,
    /// Always face the viewer.
    pub billboard: bool,
}

impl Default for ImageAttrs {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: Vec3::ZERO,
            crop: Rect::new(0.0, 0.0, 1.0, 1.0),
            billboard: false,
        }
    }
}

/// Sound placement attributes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioAttrs {
    /// Linear gain in `[0, 1]`.
    pub volume: f32,
    /// Start playing as soon as the placement is registered for playback.
    pub autoplay: bool,
}

impl Default for AudioAttrs {
    fn default() -> Self {
        Self {
            volume: 1.0,
            autoplay: true,
        }
    }
}

/// Type-specific placement attributes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectAttrs {
    /// Placed image.
    Image(ImageAttrs),
    /// Placed sound source.
    Audio(AudioAttrs),
}

/// A placement of one asset inside a scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneObject {
    /// Stable id; documents written without one get a fresh id on load.
    #[serde(default = "ObjectId::new_v4")]
    pub id: ObjectId,
    /// Referenced asset. Not owning; may dangle briefly during a rename.
    pub asset_id: AssetId,
    /// World-space position in meters.
    pub position: Vec3,
    /// Whether manipulation gestures are allowed.
    #[serde(default = "default_true")]
    pub is_editable: bool,
    /// Type-specific attributes.
    pub attrs: ObjectAttrs,
}

fn default_true() -> bool {
    true
}

impl SceneObject {
    /// New image placement with default attributes.
    pub fn image(asset_id: AssetId, position: Vec3) -> Self {
        Self {
            id: ObjectId::new_v4(),
            asset_id,
            position,
            is_editable: true,
            attrs: ObjectAttrs::Image(ImageAttrs::default()),
        }
    }

    /// New sound placement with default attributes.
    pub fn audio(asset_id: AssetId, position: Vec3) -> Self {
        Self {
            id: ObjectId::new_v4(),
            asset_id,
            position,
            is_editable: true,
            attrs: ObjectAttrs::Audio(AudioAttrs::default()),
        }
    }

    /// New placement whose attribute variant matches the asset type.
    pub fn for_asset(asset: &Asset, position: Vec3) -> Self {
        match asset.asset_type() {
            AssetType::Image => Self::image(asset.id.clone(), position),
            AssetType::Sound => Self::audio(asset.id.clone(), position),
        }
    }

    /// Image attributes, if this is an image placement.
    pub fn image_attrs(&self) -> Option<&ImageAttrs> {
        match &self.attrs {
            ObjectAttrs::Image(a) => Some(a),
            ObjectAttrs::Audio(_) => None,
        }
    }

    /// Sound attributes, if this is a sound placement.
    pub fn audio_attrs(&self) -> Option<&AudioAttrs> {
        match &self.attrs {
            ObjectAttrs::Audio(a) => Some(a),
            ObjectAttrs::Image(_) => None,
        }
    }

    /// Return `true` for sound placements.
    pub fn is_audio(&self) -> bool {
        matches!(self.attrs, ObjectAttrs::Audio(_))
    }
}

/// How the scene is presented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImmersionStyle {
    /// Passthrough with placed content.
    #[default]
    Mixed,
    /// Partially replaced surroundings.
    Progressive,
    /// Fully replaced surroundings.
    Full,
}

/// Persisted spatial-environment settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpatialEnvironment {
    /// Presentation style.
    pub immersion: ImmersionStyle,
    /// Image asset textured onto the floor, if any.
    pub floor_asset: Option<AssetId>,
    /// Floor edge length in meters.
    pub floor_size: f32,
}

impl Default for SpatialEnvironment {
    fn default() -> Self {
        Self {
            immersion: ImmersionStyle::Mixed,
            floor_asset: None,
            floor_size: 6.0,
        }
    }
}

/// Where the user is looking from; never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Bounded volume window.
    #[default]
    Volume,
    /// Immersive space.
    Immersive,
}

/// Transient per-session camera/view state, reset on every load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserSpatialState {
    /// Current presentation.
    pub view_mode: ViewMode,
    /// Viewer position in scene space.
    pub camera_position: Vec3,
    /// Viewer heading in radians.
    pub camera_yaw: f32,
}

/// Aggregate root for one project's scene.
///
/// Objects and the usage index are private: every mutation goes through the operations in
/// `scene::store`, which update both sides together.
#[derive(Clone, Debug, Default)]
pub struct SceneModel {
    project_id: String,
    /// Persisted environment settings.
    pub environment: SpatialEnvironment,
    /// Transient view state.
    pub spatial: UserSpatialState,
    pub(crate) objects: Vec<SceneObject>,
    pub(crate) index: UsageIndex,
}

impl SceneModel {
    /// Empty scene for `project_id`.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Self::default()
        }
    }

    /// Owning project id.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Placements in insertion order.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Lookup one placement.
    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Number of placements.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Return `true` when the scene has no placements.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Read-only view of the usage index.
    pub fn usage(&self) -> &UsageIndex {
        &self.index
    }
}
