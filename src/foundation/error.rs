/// Convenience result type used across moodspace.
pub type MoodspaceResult<T> = Result<T, MoodspaceError>;

/// Top-level error taxonomy used by repository, scene, and session APIs.
#[derive(thiserror::Error, Debug)]
pub enum MoodspaceError {
    /// An asset or scene object was looked up by id and is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Read, write, rename, or hash failure on durable storage.
    #[error("io error: {0}")]
    Io(String),

    /// Import payload could not be decoded into the target asset type.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// A runtime entity handle could not be built for a scene object.
    #[error("entity creation error: {0}")]
    EntityCreation(String),

    /// Invalid caller-provided data or options.
    #[error("validation error: {0}")]
    Validation(String),

    /// Mutation attempted on a built-in asset.
    #[error("read-only asset: {0}")]
    ReadOnly(String),

    /// Errors when serializing or deserializing scene documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MoodspaceError {
    /// Build a [`MoodspaceError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`MoodspaceError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`MoodspaceError::Conversion`] value.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Build a [`MoodspaceError::EntityCreation`] value.
    pub fn entity_creation(msg: impl Into<String>) -> Self {
        Self::EntityCreation(msg.into())
    }

    /// Build a [`MoodspaceError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MoodspaceError::ReadOnly`] value.
    pub fn read_only(msg: impl Into<String>) -> Self {
        Self::ReadOnly(msg.into())
    }

    /// Build a [`MoodspaceError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Map a contextualized IO failure into [`MoodspaceError::Io`], keeping the whole chain.
    pub(crate) fn from_io(err: anyhow::Error) -> Self {
        Self::Io(format!("{err:#}"))
    }

    /// Return `true` for [`MoodspaceError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
