//! Rendered-raster cache owned by a [`Theme`](super::Theme).
//!
//! Entries are keyed by frame cache ids. Each insert can carry a disambiguator
//! naming the slot that produced it (a consumer plus prefix): a slot holds at
//! most one entry, so re-rendering a resized frame replaces its previous raster
//! instead of accumulating one per size. With a cache directory configured,
//! entries are written through as PNG files so later runs can skip rendering.

use crate::error::ThemeError;
use lru::LruCache;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_skia::Pixmap;

pub struct ThemeCache {
  entries: LruCache<String, Arc<Pixmap>>,
  slots: FxHashMap<String, String>,
  disk_dir: Option<PathBuf>,
}

impl ThemeCache {
  pub fn new(capacity: usize, disk_dir: Option<PathBuf>) -> Self {
    let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
    Self {
      entries: LruCache::new(cap),
      slots: FxHashMap::default(),
      disk_dir,
    }
  }

  /// Points the on-disk store at a new directory (e.g. after a theme switch).
  pub(crate) fn set_disk_dir(&mut self, dir: Option<PathBuf>) {
    self.disk_dir = dir;
  }

  pub fn disk_dir(&self) -> Option<&Path> {
    self.disk_dir.as_deref()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Looks up a raster, falling back to the on-disk store.
  pub fn find(&mut self, key: &str) -> Option<Arc<Pixmap>> {
    if let Some(hit) = self.entries.get(key) {
      log::trace!("theme cache hit: {key}");
      return Some(Arc::clone(hit));
    }
    let path = self.disk_path(key)?;
    let bytes = std::fs::read(&path).ok()?;
    match Pixmap::decode_png(&bytes) {
      Ok(pixmap) => {
        log::debug!("theme cache disk hit: {key}");
        let pixmap = Arc::new(pixmap);
        self.entries.put(key.to_string(), Arc::clone(&pixmap));
        Some(pixmap)
      }
      Err(err) => {
        log::warn!("discarding unreadable cached frame {}: {err}", path.display());
        let _ = std::fs::remove_file(&path);
        None
      }
    }
  }

  /// Inserts a raster. An empty `disambiguator` never evicts anything.
  pub fn insert(&mut self, key: &str, pixmap: Arc<Pixmap>, disambiguator: &str) {
    if !disambiguator.is_empty() {
      if let Some(previous) = self.slots.insert(disambiguator.to_string(), key.to_string()) {
        if previous != key {
          self.remove(&previous);
        }
      }
    }
    if let Err(err) = self.persist(key, &pixmap) {
      log::warn!("{err}");
    }
    self.entries.put(key.to_string(), pixmap);
  }

  pub fn remove(&mut self, key: &str) {
    self.entries.pop(key);
    if let Some(path) = self.disk_path(key) {
      let _ = std::fs::remove_file(path);
    }
  }

  /// Drops every in-memory entry. The on-disk store is left alone: it is
  /// partitioned per theme name and stays valid for that theme.
  pub fn invalidate(&mut self) {
    self.entries.clear();
    self.slots.clear();
  }

  fn persist(&self, key: &str, pixmap: &Pixmap) -> Result<(), ThemeError> {
    let Some(path) = self.disk_path(key) else {
      return Ok(());
    };
    let io_error = |reason: String| ThemeError::CacheIo {
      path: path.display().to_string(),
      reason,
    };
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| io_error(e.to_string()))?;
    }
    let bytes = pixmap.encode_png().map_err(|e| io_error(e.to_string()))?;
    std::fs::write(&path, bytes).map_err(|e| io_error(e.to_string()))
  }

  fn disk_path(&self, key: &str) -> Option<PathBuf> {
    let dir = self.disk_dir.as_ref()?;
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    Some(dir.join(format!("{:016x}.png", hasher.finish())))
  }
}
