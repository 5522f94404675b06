//! Content-addressed asset storage and the per-project asset catalog.

/// File-system byte store: layout, listing, hashing, unique naming.
pub mod content_store;
/// Asset records and type-specific metadata.
pub mod model;
/// Image/sound metadata probes and waveform extraction.
pub mod probe;
/// Catalog with create/rename/duplicate/delete and change notification.
pub mod repository;
