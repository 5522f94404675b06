//! Runtime visual entities derived from the scene graph.

/// Set reconciliation between scene objects and runtime handles.
pub mod sync;
