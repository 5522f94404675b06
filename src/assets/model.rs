use std::path::PathBuf;

use crate::foundation::core::AssetId;

/// Number of normalized peaks stored per sound waveform.
pub const WAVEFORM_BINS: usize = 64;

/// File extensions accepted for image assets (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "heic", "gif", "webp", "bmp"];

/// File extensions accepted for sound assets (lowercase).
pub const SOUND_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "aac", "caf", "aiff", "flac"];

/// Closed set of asset types; selects the storage directory and the metadata variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Still image.
    Image,
    /// Sound clip.
    Sound,
}

impl AssetType {
    /// Directory name under the project root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Sound => "sounds",
        }
    }

    /// Allow-listed extensions for this type.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Image => IMAGE_EXTENSIONS,
            Self::Sound => SOUND_EXTENSIONS,
        }
    }

    /// Classify a filename by its extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if SOUND_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Sound)
        } else {
            None
        }
    }
}

/// Pixel dimensions of an image asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageMeta {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Mixing channel a sound is played on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundChannel {
    /// Short one-shot effect.
    #[default]
    Foley,
    /// Long looping bed.
    Ambient,
}

/// Where a sound came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundOrigin {
    /// Built-in library sound; read-only.
    Basic,
    /// Imported by the user into the project.
    #[default]
    User,
}

/// Sound-specific metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SoundMeta {
    /// Channel classification derived from duration.
    pub channel: SoundChannel,
    /// Duration in seconds when the container could be probed.
    pub duration_sec: Option<f64>,
    /// `WAVEFORM_BINS` peaks in `[0, 1]`; `None` until back-filled.
    pub waveform: Option<Vec<f32>>,
    /// Built-in or user-imported.
    pub origin: SoundOrigin,
}

/// Type-specific metadata carried by an [`Asset`].
#[derive(Clone, Debug, PartialEq)]
pub enum AssetKind {
    /// Image metadata.
    Image(ImageMeta),
    /// Sound metadata.
    Sound(SoundMeta),
}

impl AssetKind {
    /// Discriminant of this variant.
    pub fn asset_type(&self) -> AssetType {
        match self {
            Self::Image(_) => AssetType::Image,
            Self::Sound(_) => AssetType::Sound,
        }
    }
}

/// A stored binary resource in the project catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct Asset {
    /// Content-addressed id.
    pub id: AssetId,
    /// Type plus type-specific metadata.
    pub kind: AssetKind,
    /// On-disk filename including extension.
    pub filename: String,
    /// Size in bytes.
    pub filesize: u64,
    /// Absolute location of the backing file.
    pub location: PathBuf,
    /// Creation time, seconds since the Unix epoch.
    pub created_at: u64,
}

impl Asset {
    /// Type of this asset.
    pub fn asset_type(&self) -> AssetType {
        self.kind.asset_type()
    }

    /// Hex SHA-256 of the content.
    pub fn hash_hex(&self) -> &str {
        self.id.hash_hex().unwrap_or_default()
    }

    /// Filename without its extension.
    pub fn stem(&self) -> &str {
        split_name(&self.filename).0
    }

    /// Extension without the dot, empty when absent.
    pub fn extension(&self) -> &str {
        split_name(&self.filename).1
    }

    /// Return `true` for built-in library sounds.
    pub fn is_builtin(&self) -> bool {
        matches!(
            &self.kind,
            AssetKind::Sound(SoundMeta {
                origin: SoundOrigin::Basic,
                ..
            })
        )
    }

    /// Image metadata when this is an image.
    pub fn image(&self) -> Option<&ImageMeta> {
        match &self.kind {
            AssetKind::Image(m) => Some(m),
            AssetKind::Sound(_) => None,
        }
    }

    /// Sound metadata when this is a sound.
    pub fn sound(&self) -> Option<&SoundMeta> {
        match &self.kind {
            AssetKind::Sound(m) => Some(m),
            AssetKind::Image(_) => None,
        }
    }
}

/// Split `name.ext` into `("name", "ext")`; a leading dot is not treated as an extension.
pub fn split_name(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => (&filename[..idx], &filename[idx + 1..]),
        _ => (filename, ""),
    }
}
