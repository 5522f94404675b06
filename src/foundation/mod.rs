//! Shared ids, geometry re-exports, and the error taxonomy.

pub(crate) mod core;
pub(crate) mod error;
