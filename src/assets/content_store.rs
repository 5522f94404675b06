use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use sha2::{Digest, Sha256};

use crate::{
    assets::model::{AssetType, SOUND_EXTENSIONS},
    foundation::error::{MoodspaceError, MoodspaceResult},
};

/// Scene document filename inside a project root.
pub const SCENE_FILE: &str = "scene.json";

const UNTITLED: &str = "untitled";

/// File-system-backed byte store for one project.
///
/// Layout: `<root>/images`, `<root>/sounds`, `<root>/scene.json`, plus an optional read-only
/// library directory holding built-in sounds. The store knows nothing about catalogs or scenes.
#[derive(Clone, Debug)]
pub struct ContentStore {
    root: PathBuf,
    library_dir: Option<PathBuf>,
}

impl ContentStore {
    /// Store rooted at `root` without a library directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            library_dir: None,
        }
    }

    /// Store rooted at `root` that also exposes built-in sounds from `library_dir`.
    pub fn with_library(root: impl Into<PathBuf>, library_dir: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            library_dir,
        }
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Built-in library directory, if configured.
    pub fn library_dir(&self) -> Option<&Path> {
        self.library_dir.as_deref()
    }

    /// Directory holding assets of type `ty`.
    pub fn dir(&self, ty: AssetType) -> PathBuf {
        self.root.join(ty.dir_name())
    }

    /// Location of the persisted scene document.
    pub fn scene_path(&self) -> PathBuf {
        self.root.join(SCENE_FILE)
    }

    /// Create the per-type directories if missing.
    pub fn ensure_layout(&self) -> MoodspaceResult<()> {
        for ty in [AssetType::Image, AssetType::Sound] {
            let dir = self.dir(ty);
            fs::create_dir_all(&dir)
                .with_context(|| format!("create asset dir '{}'", dir.display()))
                .map_err(MoodspaceError::from_io)?;
        }
        Ok(())
    }

    /// List allow-listed files of type `ty`, sorted by filename. A missing directory is empty.
    pub fn list(&self, ty: AssetType) -> MoodspaceResult<Vec<PathBuf>> {
        list_dir(&self.dir(ty), ty.extensions())
    }

    /// List built-in sounds from the library directory.
    pub fn list_library(&self) -> MoodspaceResult<Vec<PathBuf>> {
        match &self.library_dir {
            Some(dir) => list_dir(dir, SOUND_EXTENSIONS),
            None => Ok(Vec::new()),
        }
    }

    /// Return `true` when `path` lives inside the library directory.
    pub fn is_library_path(&self, path: &Path) -> bool {
        self.library_dir
            .as_deref()
            .is_some_and(|dir| path.starts_with(dir))
    }

    /// Read a whole file.
    pub fn read(&self, path: &Path) -> MoodspaceResult<Vec<u8>> {
        fs::read(path).map_err(|e| io_error(e, "read", path))
    }

    /// Write `bytes` as a new file `filename` in the directory for `ty`.
    ///
    /// Fails when the target already exists; a partially written file is removed.
    pub fn write_new(&self, ty: AssetType, filename: &str, bytes: &[u8]) -> MoodspaceResult<PathBuf> {
        let dir = self.dir(ty);
        fs::create_dir_all(&dir)
            .with_context(|| format!("create asset dir '{}'", dir.display()))
            .map_err(MoodspaceError::from_io)?;
        let path = dir.join(filename);
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| io_error(e, "create", &path))?;
        if let Err(e) = file.write_all(bytes).and_then(|()| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(io_error(e, "write", &path));
        }
        Ok(path)
    }

    /// Copy `from` into the directory for `ty` under `filename`.
    pub fn copy_new(&self, from: &Path, ty: AssetType, filename: &str) -> MoodspaceResult<PathBuf> {
        let to = self.dir(ty).join(filename);
        if to.exists() {
            return Err(MoodspaceError::io(format!(
                "copy target '{}' already exists",
                to.display()
            )));
        }
        if let Err(e) = fs::copy(from, &to) {
            let _ = fs::remove_file(&to);
            return Err(io_error(e, "copy", from));
        }
        Ok(to)
    }

    /// Rename `from` to `filename` inside the directory for `ty`.
    pub fn rename(&self, from: &Path, ty: AssetType, filename: &str) -> MoodspaceResult<PathBuf> {
        let to = self.dir(ty).join(filename);
        if to.exists() {
            return Err(MoodspaceError::io(format!(
                "rename target '{}' already exists",
                to.display()
            )));
        }
        fs::rename(from, &to).map_err(|e| io_error(e, "rename", from))?;
        Ok(to)
    }

    /// Delete a file.
    pub fn remove(&self, path: &Path) -> MoodspaceResult<()> {
        fs::remove_file(path).map_err(|e| io_error(e, "remove", path))
    }

    /// Size in bytes and creation time (seconds since the Unix epoch, falling back to mtime).
    pub fn stat(&self, path: &Path) -> MoodspaceResult<(u64, u64)> {
        let meta = fs::metadata(path).map_err(|e| io_error(e, "stat", path))?;
        let created = meta
            .created()
            .or_else(|_| meta.modified())
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok((meta.len(), created))
    }

    /// Hex SHA-256 of a file, streamed.
    pub fn hash_file(&self, path: &Path) -> MoodspaceResult<String> {
        let mut file = fs::File::open(path).map_err(|e| io_error(e, "open", path))?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher).map_err(|e| io_error(e, "hash", path))?;
        Ok(to_hex(&hasher.finalize()))
    }

    /// First free `stem.ext`, `stem-1.ext`, `stem-2.ext`, ... in the directory for `ty`.
    pub fn unique_filename(&self, ty: AssetType, stem: &str, ext: &str) -> String {
        let dir = self.dir(ty);
        let mut n = 0usize;
        loop {
            let candidate = join_name(stem, ext, n);
            if !dir.join(&candidate).exists() {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Hex SHA-256 of an in-memory payload.
pub fn hash_bytes(bytes: &[u8]) -> String {
    to_hex(&Sha256::digest(bytes))
}

/// Strip path separators and characters unsafe on common file systems.
///
/// Leading dots and surrounding whitespace are removed; an empty stem becomes `untitled`.
pub fn sanitize_filename(name: &str) -> String {
    let kept = keep_safe_chars(name);
    let (stem, ext) = match kept.rfind('.') {
        Some(idx) => (&kept[..idx], &kept[idx + 1..]),
        None => (kept.as_str(), ""),
    };
    let stem = stem.trim().trim_start_matches('.').trim();
    let stem = if stem.is_empty() { UNTITLED } else { stem };
    join_name(stem, ext.trim(), 0)
}

/// Sanitize a caller-provided base name (no extension handling).
pub fn sanitize_stem(name: &str) -> String {
    let cleaned = strip_unsafe(name);
    if cleaned.is_empty() {
        UNTITLED.to_string()
    } else {
        cleaned
    }
}

fn strip_unsafe(name: &str) -> String {
    keep_safe_chars(name)
        .trim_start_matches('.')
        .trim()
        .to_string()
}

fn keep_safe_chars(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| {
            !c.is_control() && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        })
        .collect();
    kept.trim().to_string()
}

fn join_name(stem: &str, ext: &str, n: usize) -> String {
    match (n, ext.is_empty()) {
        (0, true) => stem.to_string(),
        (0, false) => format!("{stem}.{ext}"),
        (n, true) => format!("{stem}-{n}"),
        (n, false) => format!("{stem}-{n}.{ext}"),
    }
}

fn list_dir(dir: &Path, extensions: &[&str]) -> MoodspaceResult<Vec<PathBuf>> {
    let rd = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(e, "list", dir)),
    };

    let mut out = Vec::new();
    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if extensions.contains(&ext.as_str()) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

fn io_error(err: io::Error, op: &str, path: &Path) -> MoodspaceError {
    if err.kind() == io::ErrorKind::NotFound {
        MoodspaceError::not_found(format!("{op} '{}': {err}", path.display()))
    } else {
        MoodspaceError::io(format!("{op} '{}': {err}", path.display()))
    }
}

fn to_hex(digest: &[u8]) -> String {
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assets/content_store.rs"]
mod tests;
