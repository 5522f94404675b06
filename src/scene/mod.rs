//! Scene graph: placements, the asset usage index, and the persisted document.

/// Persisted scene document and load/save.
pub mod document;
/// Placement and environment types plus the scene aggregate.
pub mod model;
/// Mutating operations that keep placements and the usage index in step.
pub mod store;
/// Asset-to-placement reverse index.
pub mod usage;
