use std::fmt;

pub use glam::Vec3;
pub use kurbo::Rect;

/// Stable identity of a placed scene object, independent of the asset it shows.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ObjectId(pub uuid::Uuid);

impl ObjectId {
    /// Generate a fresh random id.
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parse the hyphenated textual form.
    pub fn parse(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(Self)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Content-addressed asset identifier: `"<hex sha256>@<filename>"`.
///
/// Equal bytes stored under different names yield different ids, and the id changes whenever the
/// file is renamed.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Compose an id from a hex digest and a filename.
    pub fn compose(hash_hex: &str, filename: &str) -> Self {
        Self(format!("{hash_hex}@{filename}"))
    }

    /// Wrap an already composed id string without validation.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the textual id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex content hash portion, if the id is well formed.
    pub fn hash_hex(&self) -> Option<&str> {
        self.0.split_once('@').map(|(h, _)| h)
    }

    /// Filename portion, if the id is well formed.
    pub fn filename(&self) -> Option<&str> {
        self.0.split_once('@').map(|(_, name)| name)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seconds since the Unix epoch, UTC.
pub(crate) fn unix_now_sec() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
