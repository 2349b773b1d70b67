use super::{ConsumerId, EnabledBorders};
use crate::geometry::{Margins, PixelSize};
use crate::theme::ThemeId;
use lru::LruCache;
use rustc_hash::FxHashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tiny_skia::{Mask, Pixmap};

const MAX_CACHED_MASKS: NonZeroUsize = match NonZeroUsize::new(10) {
  Some(n) => n,
  None => NonZeroUsize::MIN,
};

bitflags::bitflags! {
  /// Painting hints read from `hint-*` elements.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
  pub(crate) struct FrameHints: u8 {
    const TILE_CENTER = 1;
    const NO_BORDER_PADDING = 2;
    const STRETCH_BORDERS = 4;
    const COMPOSE_OVER_BORDER = 8;
  }
}

/// Inputs of the cache key that belong to the frame itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameShape {
  pub enabled_borders: EnabledBorders,
  /// Logical size, unset until first requested.
  pub frame_size: Option<PixelSize>,
}

impl Default for FrameShape {
  fn default() -> Self {
    Self {
      enabled_borders: EnabledBorders::ALL,
      frame_size: None,
    }
  }
}

/// Sizes derived from the image's border elements.
///
/// `extents` are the painted border widths, `margins` the content insets;
/// the `fixed_` variants ignore which borders are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct FrameMetrics {
  pub extents: Margins,
  pub fixed_extents: Margins,
  pub margins: Margins,
  pub fixed_margins: Margins,
  pub hints: FrameHints,
}

pub(crate) struct FrameData {
  pub shape: FrameShape,
  pub metrics: FrameMetrics,
  pub device_pixel_ratio: f32,
  /// Partition of the registry this record was last shared in.
  pub theme: Option<ThemeId>,
  pub cached_background: Option<Arc<Pixmap>>,
  pub cached_masks: LruCache<String, Arc<Mask>>,
  references: FxHashMap<ConsumerId, u32>,
}

impl FrameData {
  pub fn new(owner: ConsumerId, device_pixel_ratio: f32) -> Self {
    Self {
      shape: FrameShape::default(),
      metrics: FrameMetrics::default(),
      device_pixel_ratio,
      theme: None,
      cached_background: None,
      cached_masks: LruCache::new(MAX_CACHED_MASKS),
      references: FxHashMap::from_iter([(owner, 1)]),
    }
  }

  /// Private copy for `owner`: same geometry and hints, no rasters, unshared.
  pub fn clone_for(&self, owner: ConsumerId, device_pixel_ratio: f32) -> Self {
    Self {
      shape: self.shape,
      metrics: self.metrics,
      device_pixel_ratio,
      ..Self::new(owner, device_pixel_ratio)
    }
  }

  pub fn acquire(&mut self, consumer: ConsumerId) {
    *self.references.entry(consumer).or_insert(0) += 1;
  }

  /// Drops one reference held by `consumer`. Returns true once nobody holds the frame.
  pub fn release(&mut self, consumer: ConsumerId) -> bool {
    if let Some(count) = self.references.get_mut(&consumer) {
      *count = count.saturating_sub(1);
      if *count == 0 {
        self.references.remove(&consumer);
      }
    }
    self.references.is_empty()
  }

  /// Drops every reference held by `consumer`.
  pub fn remove_refs(&mut self, consumer: ConsumerId) -> bool {
    self.references.remove(&consumer);
    self.references.is_empty()
  }

  /// Number of distinct consumers holding the frame.
  pub fn refcount(&self) -> usize {
    self.references.len()
  }

  pub fn is_used(&self) -> bool {
    !self.references.is_empty()
  }

  #[cfg(test)]
  pub fn references_of(&self, consumer: ConsumerId) -> u32 {
    self.references.get(&consumer).copied().unwrap_or(0)
  }

  #[cfg(test)]
  pub fn total_references(&self) -> u32 {
    self.references.values().sum()
  }

  pub fn clear_rasters(&mut self) {
    self.cached_background = None;
    self.cached_masks.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn release_reports_when_unreferenced() {
    let a = ConsumerId::next();
    let b = ConsumerId::next();
    let mut frame = FrameData::new(a, 1.0);
    frame.acquire(b);
    frame.acquire(b);
    assert_eq!(frame.refcount(), 2);
    assert_eq!(frame.references_of(b), 2);

    assert!(!frame.release(b));
    assert_eq!(frame.refcount(), 2);
    assert!(!frame.release(b));
    assert_eq!(frame.refcount(), 1);
    assert!(frame.release(a));
    assert!(!frame.is_used());
  }

  #[test]
  fn release_of_stranger_is_harmless() {
    let owner = ConsumerId::next();
    let mut frame = FrameData::new(owner, 1.0);
    assert!(!frame.release(ConsumerId::next()));
    assert_eq!(frame.refcount(), 1);
  }

  #[test]
  fn remove_refs_drops_all_counts() {
    let a = ConsumerId::next();
    let b = ConsumerId::next();
    let mut frame = FrameData::new(a, 1.0);
    frame.acquire(a);
    frame.acquire(b);
    assert_eq!(frame.total_references(), 3);
    assert!(!frame.remove_refs(a));
    assert!(frame.remove_refs(b));
  }

  #[test]
  fn clone_keeps_geometry_but_not_rasters_or_owners() {
    let a = ConsumerId::next();
    let b = ConsumerId::next();
    let mut frame = FrameData::new(a, 1.0);
    frame.shape.frame_size = Some(PixelSize::new(40, 20));
    frame.shape.enabled_borders = EnabledBorders::TOP;
    frame.metrics.margins = Margins::new(4.0, 0.0, 0.0, 0.0);
    frame.metrics.hints = FrameHints::TILE_CENTER;
    frame.theme = Some(crate::theme::Theme::new("t", &Default::default()).id());
    frame.cached_background = Pixmap::new(40, 20).map(Arc::new);
    frame.acquire(b);

    let copy = frame.clone_for(b, 2.0);
    assert_eq!(copy.shape, frame.shape);
    assert_eq!(copy.metrics, frame.metrics);
    assert_eq!(copy.device_pixel_ratio, 2.0);
    assert!(copy.theme.is_none());
    assert!(copy.cached_background.is_none());
    assert_eq!(copy.refcount(), 1);
    assert_eq!(copy.references_of(b), 1);
    assert_eq!(copy.references_of(a), 0);
  }
}
