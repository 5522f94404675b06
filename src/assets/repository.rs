use std::{
    path::{Path, PathBuf},
    sync::mpsc,
};

use rayon::prelude::*;

use crate::{
    assets::{
        content_store::{ContentStore, hash_bytes, sanitize_filename, sanitize_stem},
        model::{
            Asset, AssetKind, AssetType, ImageMeta, SoundMeta, SoundOrigin, WAVEFORM_BINS,
            split_name,
        },
        probe,
    },
    foundation::core::{AssetId, unix_now_sec},
    foundation::error::{MoodspaceError, MoodspaceResult},
};

/// Options controlling catalog scans and metadata back-fill.
#[derive(Clone, Debug)]
pub struct RepositoryOpts {
    /// Worker threads used for hashing and waveform back-fill. `None` uses rayon defaults.
    pub backfill_threads: Option<usize>,
    /// Read-only directory of built-in sounds.
    pub library_dir: Option<PathBuf>,
    /// Sounds at least this long are classified as ambient.
    pub ambient_threshold_sec: f64,
}

impl Default for RepositoryOpts {
    fn default() -> Self {
        Self {
            backfill_threads: None,
            library_dir: None,
            ambient_threshold_sec: 10.0,
        }
    }
}

/// Handle returned by [`AssetRepository::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverToken(u64);

type Observer = Box<dyn FnMut()>;

type WaveformResult = (AssetId, MoodspaceResult<Option<Vec<f32>>>);

struct Backfill {
    rx: mpsc::Receiver<WaveformResult>,
    outstanding: usize,
}

/// In-memory asset catalog backed by a [`ContentStore`].
///
/// The catalog vector is the single source of truth for assets of one project. Every mutating
/// operation commits its change, then synchronously invokes all subscribed observers; observers
/// receive no payload and re-read [`AssetRepository::assets`].
pub struct AssetRepository {
    store: ContentStore,
    opts: RepositoryOpts,
    assets: Vec<Asset>,
    observers: Vec<(ObserverToken, Observer)>,
    next_token: u64,
    pool: rayon::ThreadPool,
    backfill: Option<Backfill>,
}

impl AssetRepository {
    /// Construct an empty repository over `root`. Call [`AssetRepository::reload`] to scan.
    pub fn new(root: impl Into<PathBuf>, opts: RepositoryOpts) -> MoodspaceResult<Self> {
        let store = ContentStore::with_library(root, opts.library_dir.clone());
        store.ensure_layout()?;
        let pool = build_thread_pool(opts.backfill_threads)?;
        Ok(Self {
            store,
            opts,
            assets: Vec::new(),
            observers: Vec::new(),
            next_token: 0,
            pool,
            backfill: None,
        })
    }

    /// Underlying content store.
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Catalog, most recent first.
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Lookup an asset by id.
    pub fn find(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| &a.id == id)
    }

    /// Lookup an asset by id, failing with [`MoodspaceError::NotFound`].
    pub fn get(&self, id: &AssetId) -> MoodspaceResult<&Asset> {
        self.find(id)
            .ok_or_else(|| MoodspaceError::not_found(format!("asset '{id}'")))
    }

    /// All assets whose content hash equals `hash_hex`.
    pub fn find_by_hash<'s, 'h>(
        &'s self,
        hash_hex: &'h str,
    ) -> impl Iterator<Item = &'s Asset> + use<'s, 'h> {
        self.assets.iter().filter(move |a| a.hash_hex() == hash_hex)
    }

    /// Register a change callback.
    pub fn subscribe(&mut self, observer: impl FnMut() + 'static) -> ObserverToken {
        let token = ObserverToken(self.next_token);
        self.next_token += 1;
        self.observers.push((token, Box::new(observer)));
        token
    }

    /// Remove a change callback. Returns `false` for unknown tokens.
    pub fn unsubscribe(&mut self, token: ObserverToken) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(t, _)| *t != token);
        self.observers.len() != before
    }

    /// Rescan the content store and replace the catalog, then start the waveform back-fill.
    ///
    /// Files are hashed and probed on the worker pool. A file that cannot be hashed is skipped;
    /// a file whose metadata cannot be probed is kept with default metadata. Returns once the new
    /// catalog is published; waveforms arrive through [`AssetRepository::poll_backfill`].
    #[tracing::instrument(skip(self), fields(root = %self.store.root().display()))]
    pub fn reload(&mut self) -> MoodspaceResult<()> {
        let mut jobs = Vec::<(PathBuf, AssetType, SoundOrigin)>::new();
        for path in self.store.list(AssetType::Image)? {
            jobs.push((path, AssetType::Image, SoundOrigin::User));
        }
        for path in self.store.list(AssetType::Sound)? {
            jobs.push((path, AssetType::Sound, SoundOrigin::User));
        }
        for path in self.store.list_library()? {
            jobs.push((path, AssetType::Sound, SoundOrigin::Basic));
        }

        let store = &self.store;
        let threshold = self.opts.ambient_threshold_sec;
        let scanned = self.pool.install(|| {
            jobs.par_iter()
                .map(|(path, ty, origin)| scan_file(store, path, *ty, *origin, threshold))
                .collect::<Vec<_>>()
        });

        let mut catalog = Vec::with_capacity(scanned.len());
        for (item, (path, _, _)) in scanned.into_iter().zip(&jobs) {
            match item {
                Ok(asset) => catalog.push(asset),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping asset"),
            }
        }
        catalog.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.filename.cmp(&b.filename))
        });

        tracing::debug!(count = catalog.len(), "catalog reloaded");
        self.assets = catalog;
        self.notify();

        self.start_backfill();
        Ok(())
    }

    /// Queue waveform extraction for every sound that lacks one, with bounded parallelism.
    ///
    /// Returns the number of queued jobs. Results are applied by
    /// [`AssetRepository::poll_backfill`] or [`AssetRepository::wait_backfill`]; a new call replaces
    /// any back-fill still in progress.
    pub fn start_backfill(&mut self) -> usize {
        let jobs: Vec<(AssetId, PathBuf)> = self
            .assets
            .iter()
            .filter(|a| a.sound().is_some_and(|s| s.waveform.is_none()))
            .map(|a| (a.id.clone(), a.location.clone()))
            .collect();
        if jobs.is_empty() {
            self.backfill = None;
            return 0;
        }

        let (tx, rx) = mpsc::channel();
        let outstanding = jobs.len();
        for (id, path) in jobs {
            let tx = tx.clone();
            self.pool.spawn(move || {
                let result = probe::extract_waveform(&path, WAVEFORM_BINS);
                let _ = tx.send((id, result));
            });
        }
        self.backfill = Some(Backfill { rx, outstanding });
        tracing::debug!(jobs = outstanding, "waveform back-fill started");
        outstanding
    }

    /// Apply every back-fill result that is ready without blocking. Returns the number applied.
    pub fn poll_backfill(&mut self) -> usize {
        self.drain_backfill(false)
    }

    /// Block until the running back-fill has finished. Returns the number of results applied.
    pub fn wait_backfill(&mut self) -> usize {
        self.drain_backfill(true)
    }

    /// Return `true` while back-fill jobs are outstanding.
    pub fn is_backfilling(&self) -> bool {
        self.backfill.is_some()
    }

    // Each result is applied individually and followed by a notification, so a partially
    // completed back-fill is always a consistent catalog.
    fn drain_backfill(&mut self, block: bool) -> usize {
        let Some(mut job) = self.backfill.take() else {
            return 0;
        };
        let mut applied = 0usize;
        while job.outstanding > 0 {
            let received = if block {
                job.rx.recv().map_err(|_| mpsc::TryRecvError::Disconnected)
            } else {
                job.rx.try_recv()
            };
            let (id, result) = match received {
                Ok(r) => r,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    job.outstanding = 0;
                    break;
                }
            };
            job.outstanding -= 1;
            if self.apply_waveform(&id, result) {
                applied += 1;
            }
        }
        if job.outstanding > 0 {
            self.backfill = Some(job);
        } else {
            tracing::debug!("waveform back-fill finished");
        }
        applied
    }

    fn apply_waveform(&mut self, id: &AssetId, result: MoodspaceResult<Option<Vec<f32>>>) -> bool {
        let waveform = match result {
            Ok(Some(w)) => w,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(asset = %id, error = %e, "waveform extraction failed");
                return false;
            }
        };
        // Renamed or deleted since the job was queued.
        let Some(asset) = self.assets.iter_mut().find(|a| &a.id == id) else {
            return false;
        };
        let AssetKind::Sound(meta) = &mut asset.kind else {
            return false;
        };
        meta.waveform = Some(waveform);
        self.notify();
        true
    }

    /// Import `bytes` under a sanitized, unique version of `suggested_filename`.
    ///
    /// The asset type is chosen by extension; the payload must decode as that type.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn add(&mut self, bytes: &[u8], suggested_filename: &str) -> MoodspaceResult<Asset> {
        let filename = sanitize_filename(suggested_filename);
        let ty = AssetType::from_filename(&filename).ok_or_else(|| {
            MoodspaceError::conversion(format!("unsupported file type '{filename}'"))
        })?;
        let (stem, ext) = split_name(&filename);

        let kind = match ty {
            AssetType::Image => AssetKind::Image(probe::probe_image(bytes, ext)?),
            AssetType::Sound => {
                let duration_sec = probe::probe_sound(bytes, ext)?;
                AssetKind::Sound(SoundMeta {
                    channel: probe::classify_channel(duration_sec, self.opts.ambient_threshold_sec),
                    duration_sec,
                    waveform: None,
                    origin: SoundOrigin::User,
                })
            }
        };

        let unique = self.store.unique_filename(ty, stem, ext);
        let location = self.store.write_new(ty, &unique, bytes)?;
        let mut asset = Asset {
            id: AssetId::compose(&hash_bytes(bytes), &unique),
            kind,
            filename: unique,
            filesize: bytes.len() as u64,
            location,
            created_at: unix_now_sec(),
        };
        if let AssetKind::Sound(meta) = &mut asset.kind {
            match probe::extract_waveform(&asset.location, WAVEFORM_BINS) {
                Ok(w) => meta.waveform = w,
                Err(e) => tracing::warn!(error = %e, "waveform extraction failed"),
            }
        }

        tracing::debug!(id = %asset.id, "asset added");
        self.assets.insert(0, asset.clone());
        self.notify();
        Ok(asset)
    }

    /// Rename the backing file to `new_base_name` (extension kept) and recompute the id.
    ///
    /// A name equal to the current stem is a no-op that keeps the id. Callers must remap every
    /// referrer from the old id to the returned asset's id.
    #[tracing::instrument(skip(self))]
    pub fn rename(&mut self, id: &AssetId, new_base_name: &str) -> MoodspaceResult<Asset> {
        let idx = self.index_of(id)?;
        let current = &self.assets[idx];
        if current.is_builtin() {
            return Err(MoodspaceError::read_only(format!("cannot rename '{id}'")));
        }

        let stem = sanitize_stem(new_base_name);
        if stem == current.stem() {
            return Ok(current.clone());
        }

        let ty = current.asset_type();
        let filename = self.store.unique_filename(ty, &stem, current.extension());
        let location = self.store.rename(&current.location, ty, &filename)?;
        let hash = current.hash_hex().to_string();

        let asset = &mut self.assets[idx];
        asset.id = AssetId::compose(&hash, &filename);
        asset.filename = filename;
        asset.location = location;
        let renamed = asset.clone();

        tracing::debug!(from = %id, to = %renamed.id, "asset renamed");
        self.notify();
        Ok(renamed)
    }

    /// Copy an asset's file under a new unique name and insert it after the source.
    ///
    /// Defaults to `"<stem> copy"`. Duplicates of built-in sounds become user assets.
    #[tracing::instrument(skip(self))]
    pub fn duplicate(
        &mut self,
        id: &AssetId,
        new_base_name: Option<&str>,
    ) -> MoodspaceResult<Asset> {
        let idx = self.index_of(id)?;
        let source = &self.assets[idx];
        let ty = source.asset_type();
        let stem = match new_base_name {
            Some(name) => sanitize_stem(name),
            None => format!("{} copy", source.stem()),
        };
        let filename = self.store.unique_filename(ty, &stem, source.extension());
        let location = self.store.copy_new(&source.location, ty, &filename)?;
        let hash = match self.store.hash_file(&location) {
            Ok(h) => h,
            Err(e) => {
                let _ = self.store.remove(&location);
                return Err(e);
            }
        };

        let mut kind = source.kind.clone();
        if let AssetKind::Sound(meta) = &mut kind {
            meta.origin = SoundOrigin::User;
        }
        let copy = Asset {
            id: AssetId::compose(&hash, &filename),
            kind,
            filename,
            filesize: source.filesize,
            location,
            created_at: unix_now_sec(),
        };

        tracing::debug!(source = %id, id = %copy.id, "asset duplicated");
        self.assets.insert(idx + 1, copy.clone());
        self.notify();
        Ok(copy)
    }

    /// Remove the backing file and the catalog entry.
    ///
    /// Scene references are untouched; callers clean up referrers.
    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: &AssetId) -> MoodspaceResult<Asset> {
        let idx = self.index_of(id)?;
        let asset = &self.assets[idx];
        if asset.is_builtin() {
            return Err(MoodspaceError::read_only(format!("cannot delete '{id}'")));
        }
        match self.store.remove(&asset.location) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!(asset = %id, "backing file already missing");
            }
            Err(e) => return Err(e),
        }
        let removed = self.assets.remove(idx);
        self.notify();
        Ok(removed)
    }

    fn index_of(&self, id: &AssetId) -> MoodspaceResult<usize> {
        self.assets
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| MoodspaceError::not_found(format!("asset '{id}'")))
    }

    fn notify(&mut self) {
        for (_, observer) in &mut self.observers {
            observer();
        }
    }
}

fn scan_file(
    store: &ContentStore,
    path: &Path,
    ty: AssetType,
    origin: SoundOrigin,
    ambient_threshold_sec: f64,
) -> MoodspaceResult<Asset> {
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MoodspaceError::io(format!("non-utf8 filename '{}'", path.display())))?
        .to_string();
    let hash = store.hash_file(path)?;
    let (filesize, created_at) = store.stat(path)?;

    let kind = match ty {
        AssetType::Image => {
            let meta = store
                .read(path)
                .and_then(|bytes| probe::probe_image(&bytes, split_name(&filename).1))
                .unwrap_or_else(|e| {
                    tracing::warn!(path = %path.display(), error = %e, "image probe failed");
                    ImageMeta::default()
                });
            AssetKind::Image(meta)
        }
        AssetType::Sound => {
            let duration_sec = probe::probe_sound_file(path).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "sound probe failed");
                None
            });
            AssetKind::Sound(SoundMeta {
                channel: probe::classify_channel(duration_sec, ambient_threshold_sec),
                duration_sec,
                waveform: None,
                origin,
            })
        }
    };

    Ok(Asset {
        id: AssetId::compose(&hash, &filename),
        kind,
        filename,
        filesize,
        location: path.to_path_buf(),
        created_at,
    })
}

fn build_thread_pool(threads: Option<usize>) -> MoodspaceResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MoodspaceError::validation(
            "repository 'backfill_threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("moodspace-scan-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MoodspaceError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/repository.rs"]
mod tests;
