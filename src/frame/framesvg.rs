//! Per-widget frame handle.
//!
//! A [`FrameSvg`] keeps one frame record per element prefix it has used. The
//! record for the active prefix drives margins and painting. Records are
//! shared with other consumers through the [`FrameRegistry`] and are never
//! mutated in place while another consumer holds them: a change to size or
//! borders either switches to an existing record for the new configuration or
//! continues on a private copy.

use super::data::{FrameData, FrameHints, FrameMetrics, FrameShape};
use super::helpers;
use super::registry::{FrameRegistry, FrameStore};
use super::{ConsumerId, EnabledBorders, FrameEvent, FrameId, Location, MarginEdge};
use crate::error::Result;
use crate::geometry::{Margins, PixelSize, Point, Rect, Size};
use crate::paint;
use crate::svg::{SvgImage, VectorImageSource};
use crate::theme::ThemeId;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tiny_skia::{Mask, Pixmap, PixmapPaint, Transform};

type Observer = Box<dyn FnMut(FrameEvent) + Send>;

/// Outcome of moving a record to a new shape.
pub(super) enum Retarget {
  /// Another record already had the new shape; it is now used instead.
  Reused(FrameId),
  /// The record (or a private copy of it) now has the new shape and should be
  /// indexed under `key` once its sizes are re-derived.
  Updated { id: FrameId, key: String },
}

pub struct FrameSvg {
  pub(super) registry: FrameRegistry,
  pub(super) consumer: ConsumerId,
  pub(super) source: Box<dyn VectorImageSource>,
  /// Record per effective prefix.
  pub(super) frames: FxHashMap<String, FrameId>,
  /// Effective prefix: empty, or the requested one plus `-`.
  pub(super) prefix: String,
  pub(super) requested_prefix: String,
  location: Location,
  cache_all: bool,
  theme_id: ThemeId,
  observers: Vec<Observer>,
}

impl fmt::Debug for FrameSvg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FrameSvg")
      .field("consumer", &self.consumer)
      .field("image_path", &self.source.image_path())
      .field("prefix", &self.prefix)
      .field("frames", &self.frames)
      .finish_non_exhaustive()
  }
}

impl FrameSvg {
  /// Creates a consumer drawing SVG documents from the registry's theme.
  pub fn new(registry: &FrameRegistry) -> Self {
    let source = SvgImage::new(Arc::clone(registry.theme()));
    Self::with_source(registry, Box::new(source))
  }

  /// Creates a consumer over any vector image source.
  pub fn with_source(registry: &FrameRegistry, source: Box<dyn VectorImageSource>) -> Self {
    let consumer = ConsumerId::next();
    let mut svg = Self {
      registry: registry.clone(),
      consumer,
      source,
      frames: FxHashMap::default(),
      prefix: String::new(),
      requested_prefix: String::new(),
      location: Location::Floating,
      cache_all: registry.config().cache_all_rendered_frames,
      theme_id: registry.theme().id(),
      observers: Vec::new(),
    };
    let registry = registry.clone();
    let mut store = registry.lock();
    svg.ensure_active(&mut store);
    drop(store);
    svg
  }

  pub fn consumer_id(&self) -> ConsumerId {
    self.consumer
  }

  pub fn registry(&self) -> &FrameRegistry {
    &self.registry
  }

  pub fn source(&self) -> &dyn VectorImageSource {
    self.source.as_ref()
  }

  /// Registers an observer for repaint and geometry notifications.
  pub fn subscribe(&mut self, observer: impl FnMut(FrameEvent) + Send + 'static) {
    self.observers.push(Box::new(observer));
  }

  fn emit(&mut self, events: &[FrameEvent]) {
    for event in events {
      for observer in &mut self.observers {
        observer(*event);
      }
    }
  }

  pub(super) fn theme_now(&self) -> ThemeId {
    self.registry.theme().id()
  }

  /// Record backing the active prefix.
  pub fn frame_id(&self) -> Option<FrameId> {
    self.frames.get(&self.prefix).copied()
  }

  pub fn has_element(&self, element_id: &str) -> bool {
    self.source.has_element(element_id)
  }

  pub fn image_path(&self) -> &str {
    self.source.image_path()
  }

  /// Switches the frame image.
  ///
  /// A load failure still switches the path; the frame then renders nothing.
  pub fn set_image_path(&mut self, path: &str) -> Result<()> {
    self.sync_theme();
    if path == self.source.image_path() {
      return Ok(());
    }
    self.change_source(|source| source.set_image_path(path))
  }

  pub fn device_pixel_ratio(&self) -> f32 {
    self.source.device_pixel_ratio()
  }

  pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
    self.sync_theme();
    if !(ratio.is_finite() && ratio > 0.0) || ratio == self.source.device_pixel_ratio() {
      return;
    }
    self.change_source(|source| source.set_device_pixel_ratio(ratio));
  }

  pub fn scale_factor(&self) -> f32 {
    self.source.scale_factor()
  }

  pub fn set_scale_factor(&mut self, factor: f32) {
    self.sync_theme();
    if !(factor.is_finite() && factor > 0.0) || factor == self.source.scale_factor() {
      return;
    }
    self.change_source(|source| source.set_scale_factor(factor));
  }

  /// Applies a change to the image source that alters every cache key.
  fn change_source<R>(&mut self, apply: impl FnOnce(&mut dyn VectorImageSource) -> R) -> R {
    let registry = self.registry.clone();
    let result = {
      let mut store = registry.lock();
      self.clear_cache_locked(&mut store);

      let prefix = self.prefix.clone();
      let mut fid = self.ensure_active(&mut store);
      let sole = store.get(fid).is_some_and(|frame| frame.refcount() == 1);
      if sole {
        let old_key = self.cache_id_of(&mut store, fid, &prefix);
        store.unshare(fid, &old_key);
      } else {
        store.release(fid, self.consumer);
      }

      let result = apply(self.source.as_mut());
      let theme = self.theme_now();
      let mut update_needed = true;

      if !sole {
        let key = self.cache_id_of(&mut store, fid, &prefix);
        fid = match store.lookup(theme, &key) {
          Some(hit) => {
            store.acquire(hit, self.consumer);
            update_needed = false;
            hit
          }
          None => {
            let copy = self.private_copy(&store, fid);
            store.insert(copy)
          }
        };
        self.frames.insert(prefix.clone(), fid);
      }

      if update_needed {
        let key = self.cache_id_of(&mut store, fid, &prefix);
        match store.lookup(theme, &key) {
          Some(hit) if hit != fid => {
            store.acquire(hit, self.consumer);
            self.frames.insert(prefix.clone(), hit);
            store.release(fid, self.consumer);
          }
          _ => {
            store.share(theme, key, fid);
            self.update_sizes(&mut store, fid);
          }
        }
      }
      result
    };
    self.emit(&[FrameEvent::GeometryChanged, FrameEvent::RepaintNeeded]);
    result
  }

  pub fn enabled_borders(&self) -> EnabledBorders {
    self
      .with_active(|frame| frame.shape.enabled_borders)
      .unwrap_or(EnabledBorders::NONE)
  }

  pub fn set_enabled_borders(&mut self, borders: EnabledBorders) {
    self.sync_theme();
    let registry = self.registry.clone();
    {
      let mut store = registry.lock();
      let fid = self.ensure_active(&mut store);
      if store
        .get(fid)
        .is_some_and(|frame| frame.shape.enabled_borders == borders)
      {
        return;
      }
      if let Retarget::Updated { id, key } =
        self.retarget(&mut store, fid, |shape| shape.enabled_borders = borders)
      {
        self.update_sizes(&mut store, id);
        store.share(self.theme_now(), key, id);
      }
    }
    self.emit(&[FrameEvent::GeometryChanged, FrameEvent::RepaintNeeded]);
  }

  /// Resizes the frame, in logical pixels.
  ///
  /// Ignored without an image, for empty sizes, and for sizes whose device
  /// pixel extent reaches the configured maximum.
  pub fn resize_frame(&mut self, size: Size) {
    self.sync_theme();
    if self.source.image_path().is_empty() || size.is_empty() {
      return;
    }
    let size = size.to_pixel_size();
    if size.is_empty() {
      return;
    }
    let device = size.scale(self.source.device_pixel_ratio());
    let limit = self.registry.config().max_frame_size;
    if device.width >= limit || device.height >= limit {
      log::warn!(
        "not resizing {} to {device}: frames are limited to {limit} pixels",
        self.source.image_path()
      );
      return;
    }

    let registry = self.registry.clone();
    {
      let mut store = registry.lock();
      let fid = self.ensure_active(&mut store);
      if store
        .get(fid)
        .is_some_and(|frame| frame.shape.frame_size == Some(size))
      {
        return;
      }
      if let Retarget::Updated { id, key } =
        self.retarget(&mut store, fid, |shape| shape.frame_size = Some(size))
      {
        self.update_sizes(&mut store, id);
        store.share(self.theme_now(), key, id);
      }
    }
    self.emit(&[FrameEvent::GeometryChanged]);
  }

  /// Current frame size in logical pixels, the image's natural size until resized.
  ///
  /// Takes `&mut self` because a record created before its image loaded is
  /// sized here on first use. Returns `(-1, -1)` when there is no record.
  pub fn frame_size(&mut self) -> Size {
    let registry = self.registry.clone();
    let mut store = registry.lock();
    match self.frame_id() {
      Some(fid) => self.frame_size_of(&mut store, fid).to_size(),
      None => Size::new(-1.0, -1.0),
    }
  }

  /// Moves the active record of the current prefix to a new shape, sharing
  /// or copying as needed.
  pub(super) fn retarget(
    &mut self,
    store: &mut FrameStore,
    fid: FrameId,
    apply: impl Fn(&mut FrameShape),
  ) -> Retarget {
    let prefix = self.prefix.clone();
    let old_key = self.cache_id_of(store, fid, &prefix);
    let mut scratch = store.get(fid).map(|frame| frame.shape).unwrap_or_default();
    apply(&mut scratch);
    let new_key = self.key_for(scratch, &prefix);

    if let Some(hit) = store
      .lookup(self.theme_now(), &new_key)
      .filter(|hit| *hit != fid)
    {
      log::debug!("{new_key}: reusing {hit}");
      store.acquire(hit, self.consumer);
      self.frames.insert(prefix, hit);
      store.release(fid, self.consumer);
      return Retarget::Reused(hit);
    }

    let sole = store.get(fid).is_some_and(|frame| frame.refcount() == 1);
    let id = if sole {
      store.unshare(fid, &old_key);
      if let Some(frame) = store.get_mut(fid) {
        apply(&mut frame.shape);
      }
      fid
    } else {
      store.release(fid, self.consumer);
      let mut copy = self.private_copy(store, fid);
      apply(&mut copy.shape);
      let id = store.insert(copy);
      self.frames.insert(prefix, id);
      id
    };
    Retarget::Updated { id, key: new_key }
  }

  fn private_copy(&self, store: &FrameStore, fid: FrameId) -> FrameData {
    let ratio = self.source.device_pixel_ratio();
    store
      .get(fid)
      .map(|frame| frame.clone_for(self.consumer, ratio))
      .unwrap_or_else(|| FrameData::new(self.consumer, ratio))
  }

  /// Selects the element family, e.g. `north` for `north-topleft`, `north-center`, ...
  ///
  /// A prefix without a `<prefix>-center` element falls back to the default family.
  pub fn set_element_prefix(&mut self, prefix: &str) {
    self.sync_theme();
    if self.apply_element_prefix(prefix) {
      self.emit(&[FrameEvent::GeometryChanged]);
    }
  }

  pub fn set_element_prefix_location(&mut self, location: Location) {
    self.set_element_prefix(location.prefix());
    self.location = location;
  }

  fn apply_element_prefix(&mut self, requested: &str) -> bool {
    let old_prefix = std::mem::take(&mut self.prefix);
    if !requested.is_empty() && self.source.has_element(&format!("{requested}-center")) {
      self.prefix = format!("{requested}-");
    }
    self.requested_prefix = requested.to_string();

    let old_fid = self.frames.get(&old_prefix).copied();
    if old_prefix == self.prefix && old_fid.is_some() {
      return false;
    }

    let registry = self.registry.clone();
    let mut store = registry.lock();
    let theme = self.theme_now();
    let ratio = self.source.device_pixel_ratio();

    if !self.frames.contains_key(&self.prefix) {
      let new_prefix = self.prefix.clone();
      let new_fid = match old_fid.filter(|id| store.get(*id).is_some()) {
        Some(old) => {
          let sized = store
            .get(old)
            .and_then(|frame| frame.shape.frame_size)
            .is_some_and(|size| !size.is_empty());
          let key = if sized {
            Some(self.cache_id_of(&mut store, old, &new_prefix))
          } else {
            None
          };
          let hit = key
            .as_deref()
            .and_then(|key| store.lookup(theme, key))
            .filter(|hit| {
              store
                .get(*hit)
                .is_some_and(|frame| frame.device_pixel_ratio == ratio)
            });
          match hit {
            Some(hit) => {
              store.acquire(hit, self.consumer);
              hit
            }
            None => {
              let copy = self.private_copy(&store, old);
              let id = store.insert(copy);
              if let Some(key) = key {
                store.share(theme, key, id);
              }
              id
            }
          }
        }
        None => store.insert(FrameData::new(self.consumer, ratio)),
      };
      self.frames.insert(new_prefix, new_fid);
      self.update_sizes(&mut store, new_fid);
    }

    if !self.cache_all && old_prefix != self.prefix {
      self.frames.remove(&old_prefix);
      if let Some(old) = old_fid {
        store.release(old, self.consumer);
      }
    }

    self.location = Location::Floating;
    true
  }

  /// True when the image has a center element for `prefix`.
  pub fn has_element_prefix(&self, prefix: &str) -> bool {
    if prefix.is_empty() {
      self.source.has_element("center")
    } else {
      self.source.has_element(&format!("{prefix}-center"))
    }
  }

  pub fn has_element_prefix_location(&self, location: Location) -> bool {
    self.has_element_prefix(location.prefix())
  }

  /// Prefix as last requested.
  pub fn prefix(&self) -> &str {
    &self.requested_prefix
  }

  /// Prefix actually used for element lookups, including the trailing `-`.
  pub fn actual_prefix(&self) -> &str {
    &self.prefix
  }

  pub fn location(&self) -> Location {
    self.location
  }

  fn with_active<R>(&self, read: impl FnOnce(&FrameData) -> R) -> Option<R> {
    let fid = self.frame_id()?;
    let store = self.registry.lock();
    store.get(fid).map(read)
  }

  fn metrics(&self) -> FrameMetrics {
    self.with_active(|frame| frame.metrics).unwrap_or_default()
  }

  /// Content inset of one edge; zero for disabled borders and under `hint-no-border-padding`.
  pub fn margin_size(&self, edge: MarginEdge) -> f32 {
    edge_of(self.margins(), edge)
  }

  /// Like [`margin_size`](Self::margin_size), but as if every border were enabled.
  pub fn fixed_margin_size(&self, edge: MarginEdge) -> f32 {
    edge_of(self.fixed_margins(), edge)
  }

  pub fn margins(&self) -> Margins {
    let metrics = self.metrics();
    if metrics.hints.contains(FrameHints::NO_BORDER_PADDING) {
      return Margins::ZERO;
    }
    metrics.margins
  }

  pub fn fixed_margins(&self) -> Margins {
    let metrics = self.metrics();
    if metrics.hints.contains(FrameHints::NO_BORDER_PADDING) {
      return Margins::ZERO;
    }
    metrics.fixed_margins
  }

  /// Area inside the margins, in logical pixels.
  pub fn contents_rect(&self) -> Rect {
    let Some(size) = self.with_active(|frame| frame.shape.frame_size) else {
      return Rect::ZERO;
    };
    let size = size.unwrap_or(PixelSize::ZERO).to_size();
    let margins = self.margins();
    Rect::from_xywh(0.0, 0.0, size.width, size.height).adjusted(
      margins.left,
      margins.top,
      -margins.right,
      -margins.bottom,
    )
  }

  /// Whether records for previously used prefixes are kept after switching.
  pub fn cache_all_rendered_frames(&self) -> bool {
    self.cache_all
  }

  pub fn set_cache_all_rendered_frames(&mut self, cache: bool) {
    if self.cache_all && !cache {
      self.clear_cache();
    }
    self.cache_all = cache;
  }

  /// Releases the records of every prefix but the active one.
  pub fn clear_cache(&mut self) {
    let registry = self.registry.clone();
    let mut store = registry.lock();
    self.clear_cache_locked(&mut store);
  }

  pub(super) fn clear_cache_locked(&mut self, store: &mut FrameStore) {
    let consumer = self.consumer;
    let active = self.prefix.as_str();
    self.frames.retain(|prefix, fid| {
      if prefix == active {
        return true;
      }
      store.release(*fid, consumer);
      false
    });
  }

  /// The rendered frame at device resolution, generated on first use.
  pub fn frame_pixmap(&mut self) -> Option<Arc<Pixmap>> {
    self.sync_theme();
    let registry = self.registry.clone();
    let mut store = registry.lock();
    let fid = self.ensure_active(&mut store);
    if store.get(fid)?.cached_background.is_none() {
      self.generate_background(&mut store, fid);
    }
    store.get(fid)?.cached_background.clone()
  }

  /// Draws the `source` area of the frame raster into `target` of `canvas`.
  ///
  /// Without `source`, the same rectangle as `target` is read from the raster.
  pub fn paint_frame(&mut self, canvas: &mut Pixmap, target: Rect, source: Option<Rect>) {
    let Some(raster) = self.frame_pixmap() else {
      return;
    };
    let source = source.filter(|rect| !rect.is_empty()).unwrap_or(target);
    let (Some(to), Some(from)) = (to_skia(target), to_skia(source)) else {
      return;
    };
    paint::draw_mapped(canvas, to, &raster, from);
  }

  /// Draws the whole frame raster with its top-left corner at `pos`.
  pub fn paint_frame_at(&mut self, canvas: &mut Pixmap, pos: Point) {
    let Some(raster) = self.frame_pixmap() else {
      return;
    };
    let raster: &Pixmap = &raster;
    canvas.draw_pixmap(
      pos.x.round() as i32,
      pos.y.round() as i32,
      raster.as_ref(),
      &PixmapPaint::default(),
      Transform::identity(),
      None,
    );
  }

  /// Raster whose alpha outlines the frame, from `mask-` elements when the
  /// image has them and otherwise the frame itself.
  pub fn alpha_mask(&mut self) -> Option<Arc<Pixmap>> {
    self.sync_theme();
    let registry = self.registry.clone();
    let mut store = registry.lock();
    self.alpha_mask_locked(&mut store)
  }

  /// Coverage of the alpha mask: every pixel with any opacity is inside.
  pub fn mask(&mut self) -> Option<Arc<Mask>> {
    self.sync_theme();
    let registry = self.registry.clone();
    let mut store = registry.lock();
    let fid = self.ensure_active(&mut store);
    let key = self.cache_id_of(&mut store, fid, "");
    if let Some(mask) = store.get_mut(fid)?.cached_masks.get(&key) {
      return Some(Arc::clone(mask));
    }
    let alpha = self.alpha_mask_locked(&mut store)?;
    let mask = Arc::new(paint::coverage_mask(&alpha));
    store.get_mut(fid)?.cached_masks.put(key, Arc::clone(&mask));
    Some(mask)
  }

  /// Cache key of the active configuration.
  pub fn cache_key(&mut self) -> String {
    let registry = self.registry.clone();
    let mut store = registry.lock();
    let fid = self.ensure_active(&mut store);
    let prefix = self.prefix.clone();
    self.cache_id_of(&mut store, fid, &prefix)
  }

  /// Picks up a theme switch: reloads the image and re-derives every record
  /// this consumer uses. Returns true when the theme had changed.
  ///
  /// Mutating operations call this first; read-only queries report the state
  /// as of the last sync.
  pub fn sync_theme(&mut self) -> bool {
    let current = self.theme_now();
    if current == self.theme_id {
      return false;
    }
    log::debug!("{}: theme changed to {current}", self.source.image_path());
    self.theme_id = current;
    if let Err(err) = self.source.reload() {
      log::warn!("reloading {} failed: {err}", self.source.image_path());
    }

    let requested = self.requested_prefix.clone();
    self.apply_element_prefix(&requested);

    let registry = self.registry.clone();
    {
      let mut store = registry.lock();
      self.clear_cache_locked(&mut store);
      let fid = self.ensure_active(&mut store);
      self.update_sizes(&mut store, fid);
      self.share_active(&mut store, fid);
    }
    self.emit(&[FrameEvent::GeometryChanged, FrameEvent::RepaintNeeded]);
    true
  }

  fn share_active(&mut self, store: &mut FrameStore, fid: FrameId) {
    let sized = store
      .get(fid)
      .is_some_and(|frame| frame.shape.frame_size.is_some());
    if !sized {
      return;
    }
    let prefix = self.prefix.clone();
    let key = self.cache_id_of(store, fid, &prefix);
    let theme = self.theme_now();
    match store.lookup(theme, &key) {
      Some(hit) if hit != fid => {
        store.acquire(hit, self.consumer);
        self.frames.insert(prefix, hit);
        store.release(fid, self.consumer);
      }
      Some(_) => {}
      None => store.share(theme, key, fid),
    }
  }

  /// Record for the active prefix, created when missing.
  pub(super) fn ensure_active(&mut self, store: &mut FrameStore) -> FrameId {
    if let Some(fid) = self.frame_id().filter(|fid| store.get(*fid).is_some()) {
      return fid;
    }
    let fid = store.insert(FrameData::new(
      self.consumer,
      self.source.device_pixel_ratio(),
    ));
    self.frames.insert(self.prefix.clone(), fid);
    self.update_sizes(store, fid);
    fid
  }

  fn key_for(&self, shape: FrameShape, prefix: &str) -> String {
    helpers::cache_id(
      shape.enabled_borders,
      shape.frame_size.unwrap_or(PixelSize::ZERO),
      self.source.scale_factor(),
      self.source.device_pixel_ratio(),
      prefix,
      self.source.image_path(),
    )
  }

  pub(super) fn cache_id_of(&mut self, store: &mut FrameStore, fid: FrameId, prefix: &str) -> String {
    let size = self.frame_size_of(store, fid);
    let borders = store
      .get(fid)
      .map_or(EnabledBorders::ALL, |frame| frame.shape.enabled_borders);
    self.key_for(
      FrameShape {
        enabled_borders: borders,
        frame_size: Some(size),
      },
      prefix,
    )
  }

  /// Logical size of a record, taken from the image when never set.
  pub(super) fn frame_size_of(&mut self, store: &mut FrameStore, fid: FrameId) -> PixelSize {
    match store.get(fid) {
      None => return PixelSize::ZERO,
      Some(frame) => {
        if let Some(size) = frame.shape.frame_size {
          return size;
        }
      }
    }
    self.update_sizes(store, fid);
    let size = self.source.size().to_pixel_size();
    // Stays unset while no image is loaded.
    if size.is_empty() {
      return size;
    }
    if let Some(frame) = store.get_mut(fid) {
      frame.shape.frame_size = Some(size);
    }
    size
  }

  /// Re-derives margins and hints of a record from the image's elements at
  /// their natural size, dropping its rasters.
  pub(super) fn update_sizes(&mut self, store: &mut FrameStore, fid: FrameId) {
    let Some(frame) = store.get_mut(fid) else {
      return;
    };
    let source = self.source.as_mut();
    let saved = source.size();
    source.reset_size();
    let natural = source.size();

    frame.metrics = derive_metrics(source, &self.prefix, frame.shape.enabled_borders);
    frame.device_pixel_ratio = source.device_pixel_ratio();
    frame.clear_rasters();

    if saved != natural {
      source.resize(saved);
    }
  }
}

fn derive_metrics(
  source: &dyn VectorImageSource,
  prefix: &str,
  borders: EnabledBorders,
) -> FrameMetrics {
  let has = |name: &str| source.has_element(&format!("{prefix}{name}"));
  let element = |name: &str| source.element_size(&format!("{prefix}{name}"));
  let edge = |name: &str, vertical: bool| {
    let extent_of = |size: Size| if vertical { size.height } else { size.width };
    let extent = extent_of(element(name));
    let hint = format!("hint-{name}-margin");
    let margin = if has(&hint) {
      extent_of(element(&hint))
    } else {
      extent
    };
    (extent, margin)
  };

  let (top, top_margin) = edge("top", true);
  let (bottom, bottom_margin) = edge("bottom", true);
  let (left, left_margin) = edge("left", false);
  let (right, right_margin) = edge("right", false);
  let enabled = |border: EnabledBorders, value: f32| {
    if borders.contains(border) {
      value
    } else {
      0.0
    }
  };

  let mut hints = FrameHints::empty();
  if has("hint-compose-over-border") && source.has_element(&format!("mask-{prefix}center")) {
    hints |= FrameHints::COMPOSE_OVER_BORDER;
  }
  let either = |hint: &str| source.has_element(hint) || has(hint);
  hints.set(FrameHints::TILE_CENTER, either("hint-tile-center"));
  hints.set(FrameHints::NO_BORDER_PADDING, either("hint-no-border-padding"));
  hints.set(FrameHints::STRETCH_BORDERS, either("hint-stretch-borders"));

  FrameMetrics {
    extents: Margins::new(
      enabled(EnabledBorders::TOP, top),
      enabled(EnabledBorders::RIGHT, right),
      enabled(EnabledBorders::BOTTOM, bottom),
      enabled(EnabledBorders::LEFT, left),
    ),
    fixed_extents: Margins::new(top, right, bottom, left),
    margins: Margins::new(
      enabled(EnabledBorders::TOP, top_margin),
      enabled(EnabledBorders::RIGHT, right_margin),
      enabled(EnabledBorders::BOTTOM, bottom_margin),
      enabled(EnabledBorders::LEFT, left_margin),
    ),
    fixed_margins: Margins::new(top_margin, right_margin, bottom_margin, left_margin),
    hints,
  }
}

fn edge_of(margins: Margins, edge: MarginEdge) -> f32 {
  match edge {
    MarginEdge::Top => margins.top,
    MarginEdge::Bottom => margins.bottom,
    MarginEdge::Left => margins.left,
    MarginEdge::Right => margins.right,
  }
}

fn to_skia(rect: Rect) -> Option<tiny_skia::Rect> {
  tiny_skia::Rect::from_xywh(rect.x(), rect.y(), rect.width(), rect.height())
}

impl Drop for FrameSvg {
  fn drop(&mut self) {
    let registry = self.registry.clone();
    let mut store = registry.lock();
    for (_, fid) in self.frames.drain() {
      store.remove_refs(fid, self.consumer);
    }
  }
}
