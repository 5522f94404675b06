//! Moodspace is the editing core of a spatial mood-board: images and sounds placed in 3D space.
//!
//! The crate is organized around one owner object per open project:
//!
//! - A content-addressed [`AssetRepository`] over per-type asset directories
//! - A [`SceneModel`] of placements kept in step with its usage index
//! - An [`EntitySynchronizer`] reconciling placements with runtime visual handles
//! - An [`AudioCoordinator`] whose interruption stack arbitrates preview playback and mute
//! - A debounced [`AutosaveScheduler`] and the [`ProjectSession`] tying it all together
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Asset storage and the per-project catalog.
pub mod assets;
/// Placed-sound playback coordination.
pub mod audio;
/// Runtime entity reconciliation.
pub mod runtime;
/// Scene graph, usage index, and persistence.
pub mod scene;
/// Project session and autosave.
pub mod session;

pub use crate::foundation::core::{AssetId, ObjectId, Rect, Vec3};
pub use crate::foundation::error::{MoodspaceError, MoodspaceResult};

pub use crate::assets::model::{Asset, AssetKind, AssetType, ImageMeta, SoundChannel, SoundMeta};
pub use crate::assets::repository::{AssetRepository, ObserverToken, RepositoryOpts};
pub use crate::audio::coordinator::{AudioCoordinator, InterruptionScope, PlaybackController};
pub use crate::audio::preview::PreviewPlayer;
pub use crate::runtime::sync::{AssetLookup, EntityFactory, EntitySynchronizer, SyncStats};
pub use crate::scene::document::SceneDocument;
pub use crate::scene::model::{AudioAttrs, ImageAttrs, SceneModel, SceneObject, SpatialEnvironment};
pub use crate::session::autosave::AutosaveScheduler;
pub use crate::session::project::{ProjectSession, SessionOpts};
