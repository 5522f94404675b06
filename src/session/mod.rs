//! Project session: the single owner of catalog, scene, playback, and persistence.

/// Debounced background saves.
pub mod autosave;
/// Session operations spanning catalog and scene.
pub mod project;
