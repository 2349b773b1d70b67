//! Shared frame records, partitioned by theme and keyed by cache id.
//!
//! Every [`FrameSvg`](super::FrameSvg) attached to the same registry can find
//! the records other consumers already derived and rendered. Records live in an
//! arena addressed by [`FrameId`]; the shared map only indexes records that have
//! a size, because the cache key includes it.

use super::data::FrameData;
use super::{ConsumerId, EnabledBorders, FrameId};
use crate::config::FrameConfig;
use crate::geometry::PixelSize;
use crate::theme::{Subscription, Theme, ThemeId};
use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Frame records and the shared index over them.
#[derive(Default)]
pub(crate) struct FrameStore {
  frames: FxHashMap<FrameId, FrameData>,
  shared: FxHashMap<ThemeId, FxHashMap<String, FrameId>>,
  next_id: u64,
}

impl FrameStore {
  pub fn insert(&mut self, data: FrameData) -> FrameId {
    self.next_id += 1;
    let id = FrameId(self.next_id);
    self.frames.insert(id, data);
    id
  }

  pub fn get(&self, id: FrameId) -> Option<&FrameData> {
    self.frames.get(&id)
  }

  pub fn get_mut(&mut self, id: FrameId) -> Option<&mut FrameData> {
    self.frames.get_mut(&id)
  }

  pub fn lookup(&self, theme: ThemeId, key: &str) -> Option<FrameId> {
    self.shared.get(&theme)?.get(key).copied()
  }

  /// Indexes `id` under `key` and stamps it with `theme`.
  pub fn share(&mut self, theme: ThemeId, key: String, id: FrameId) {
    let Some(frame) = self.frames.get_mut(&id) else {
      return;
    };
    if let Some(previous) = frame.theme.filter(|previous| *previous != theme) {
      if let Some(partition) = self.shared.get_mut(&previous) {
        partition.retain(|_, frame_id| *frame_id != id);
      }
    }
    frame.theme = Some(theme);
    log::debug!("sharing {id} as {key}");
    self.shared.entry(theme).or_default().insert(key, id);
  }

  /// Removes `key` from the frame's partition if it indexes `id`.
  pub fn unshare(&mut self, id: FrameId, key: &str) {
    let Some(theme) = self.frames.get(&id).and_then(|frame| frame.theme) else {
      return;
    };
    if let Some(partition) = self.shared.get_mut(&theme) {
      if partition.get(key) == Some(&id) {
        partition.remove(key);
      }
    }
  }

  pub fn acquire(&mut self, id: FrameId, consumer: ConsumerId) {
    if let Some(frame) = self.frames.get_mut(&id) {
      frame.acquire(consumer);
    }
  }

  /// Releases one reference; destroys the record once nobody holds it.
  ///
  /// Returns true when the record was destroyed.
  pub fn release(&mut self, id: FrameId, consumer: ConsumerId) -> bool {
    let unused = match self.frames.get_mut(&id) {
      Some(frame) => frame.release(consumer),
      None => return false,
    };
    if unused {
      self.destroy(id);
    }
    unused
  }

  /// Like [`release`](Self::release) but drops every reference `consumer` holds.
  pub fn remove_refs(&mut self, id: FrameId, consumer: ConsumerId) -> bool {
    let unused = match self.frames.get_mut(&id) {
      Some(frame) => frame.remove_refs(consumer),
      None => return false,
    };
    if unused {
      self.destroy(id);
    }
    unused
  }

  fn destroy(&mut self, id: FrameId) {
    let Some(frame) = self.frames.remove(&id) else {
      return;
    };
    if let Some(partition) = frame.theme.and_then(|theme| self.shared.get_mut(&theme)) {
      partition.retain(|_, frame_id| *frame_id != id);
    }
    log::debug!("destroyed {id}");
  }

  /// Forgets the old theme's partition; records drawn with it lose their rasters.
  pub fn theme_changed(&mut self, old: ThemeId, new: ThemeId) {
    let dropped = self.shared.remove(&old).map_or(0, |partition| partition.len());
    for frame in self.frames.values_mut() {
      if frame.theme == Some(old) {
        frame.clear_rasters();
      }
    }
    log::debug!("theme {old} -> {new}: dropped {dropped} shared frames");
  }

  fn stats(&self) -> RegistryStats {
    let shared_keys = self.shared.values().map(|partition| partition.len()).sum();
    let references = self.frames.values().map(|frame| frame.refcount()).sum();
    let saved_pixmaps = self
      .shared
      .values()
      .flat_map(|partition| partition.values())
      .filter_map(|id| self.frames.get(id))
      .map(|frame| frame.refcount().saturating_sub(1))
      .sum();
    RegistryStats {
      frames: self.frames.len(),
      shared_keys,
      references,
      saved_pixmaps,
    }
  }

  fn leak_report(&self) -> LeakReport {
    let mut report = LeakReport::default();
    for (theme, partition) in &self.shared {
      for (key, id) in partition {
        if !self.frames.get(id).is_some_and(FrameData::is_used) {
          report.dangling_keys.push((*theme, key.clone()));
        }
      }
    }
    report.unreferenced_frames = self
      .frames
      .iter()
      .filter(|(_, frame)| !frame.is_used())
      .map(|(id, _)| *id)
      .collect();
    report.dangling_keys.sort();
    report.unreferenced_frames.sort();
    report
  }
}

/// Snapshot of registry occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
  /// Live frame records.
  pub frames: usize,
  /// Keys across all theme partitions.
  pub shared_keys: usize,
  /// Sum over records of their distinct consumers.
  pub references: usize,
  /// Renders avoided by sharing: consumers beyond the first on each shared record.
  pub saved_pixmaps: usize,
}

/// Registry entries that violate the reference-count invariants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeakReport {
  /// Keys indexing a record that is gone or no longer referenced.
  pub dangling_keys: Vec<(ThemeId, String)>,
  /// Records alive with no consumer holding them.
  pub unreferenced_frames: Vec<FrameId>,
}

impl LeakReport {
  pub fn is_empty(&self) -> bool {
    self.dangling_keys.is_empty() && self.unreferenced_frames.is_empty()
  }
}

impl fmt::Display for LeakReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_empty() {
      return write!(f, "no leaked frames");
    }
    for (theme, key) in &self.dangling_keys {
      writeln!(f, "dangling key {key} in {theme}")?;
    }
    for id in &self.unreferenced_frames {
      writeln!(f, "unreferenced {id}")?;
    }
    Ok(())
  }
}

/// Public view of one frame record.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
  pub enabled_borders: EnabledBorders,
  pub frame_size: Option<PixelSize>,
  pub device_pixel_ratio: f32,
  pub theme: Option<ThemeId>,
  /// Distinct consumers holding the record.
  pub refcount: usize,
  pub has_raster: bool,
}

struct RegistryInner {
  store: Mutex<FrameStore>,
  theme: Arc<Theme>,
  config: FrameConfig,
  subscription: Mutex<Option<Subscription>>,
}

impl Drop for RegistryInner {
  fn drop(&mut self) {
    if let Some(subscription) = self.subscription.get_mut().take() {
      self.theme.unsubscribe(subscription);
    }
    if self.config.leak_check {
      let report = self.store.get_mut().leak_report();
      if !report.is_empty() {
        log::warn!("frame registry dropped with leaks:\n{report}");
      }
    }
  }
}

/// Process- or session-wide owner of shared frame records.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct FrameRegistry {
  inner: Arc<RegistryInner>,
}

impl fmt::Debug for FrameRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FrameRegistry")
      .field("theme", &self.inner.theme)
      .field("stats", &self.stats())
      .finish()
  }
}

impl FrameRegistry {
  /// Creates a registry for `theme`, subscribing to its change notifications.
  pub fn new(theme: Arc<Theme>, config: FrameConfig) -> Self {
    let inner = Arc::new(RegistryInner {
      store: Mutex::new(FrameStore::default()),
      theme: Arc::clone(&theme),
      config,
      subscription: Mutex::new(None),
    });
    let weak: Weak<RegistryInner> = Arc::downgrade(&inner);
    let subscription = theme.subscribe(Arc::new(move |old, new| {
      if let Some(inner) = weak.upgrade() {
        inner.store.lock().theme_changed(old, new);
      }
    }));
    *inner.subscription.lock() = Some(subscription);
    Self { inner }
  }

  /// Registry over `theme` configured from `FRAMESVG_*` variables.
  pub fn from_env(theme: Arc<Theme>) -> Self {
    Self::new(theme, FrameConfig::from_env())
  }

  pub fn theme(&self) -> &Arc<Theme> {
    &self.inner.theme
  }

  pub fn config(&self) -> &FrameConfig {
    &self.inner.config
  }

  pub(crate) fn lock(&self) -> MutexGuard<'_, FrameStore> {
    self.inner.store.lock()
  }

  /// Frame indexed under `key` for the current theme.
  pub fn shared_frame(&self, key: &str) -> Option<FrameId> {
    self.lock().lookup(self.inner.theme.id(), key)
  }

  pub fn frame_info(&self, id: FrameId) -> Option<FrameInfo> {
    let store = self.lock();
    let frame = store.get(id)?;
    Some(FrameInfo {
      enabled_borders: frame.shape.enabled_borders,
      frame_size: frame.shape.frame_size,
      device_pixel_ratio: frame.device_pixel_ratio,
      theme: frame.theme,
      refcount: frame.refcount(),
      has_raster: frame.cached_background.is_some(),
    })
  }

  pub fn stats(&self) -> RegistryStats {
    self.lock().stats()
  }

  /// Keys and records breaking the invariant that a record is indexed and
  /// alive exactly while some consumer holds it.
  pub fn leak_report(&self) -> LeakReport {
    self.lock().leak_report()
  }
}
