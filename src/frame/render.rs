//! Frame raster generation.
//!
//! The background is composited in device pixels: the center first (tiled or
//! stretched, optionally over the whole frame and cut by the alpha mask), then
//! the four corners at their element size, then the four border strips. An
//! `overlay` element, when present, is clipped to the frame's alpha and drawn
//! last.

use super::data::{FrameHints, FrameMetrics, FrameShape};
use super::framesvg::{FrameSvg, Retarget};
use super::helpers::{border_to_element_id, section_rect};
use super::registry::FrameStore;
use super::{EnabledBorders, FrameId};
use crate::error::RenderError;
use crate::geometry::{PixelRect, PixelSize, Size};
use crate::paint;
use std::sync::Arc;
use tiny_skia::{BlendMode, Pixmap};

const CORNERS: [EnabledBorders; 4] = [
  EnabledBorders::TOP.union(EnabledBorders::LEFT),
  EnabledBorders::TOP.union(EnabledBorders::RIGHT),
  EnabledBorders::BOTTOM.union(EnabledBorders::LEFT),
  EnabledBorders::BOTTOM.union(EnabledBorders::RIGHT),
];

/// Where the overlay lands on the frame, in device pixels.
#[derive(Debug, Clone, Copy)]
struct OverlayPlacement {
  rect: PixelRect,
  tiled: bool,
}

fn round_px(value: f32) -> i32 {
  value.round() as i32
}

impl FrameSvg {
  /// Fills the record's raster from the theme cache or by rendering, then
  /// applies the overlay.
  pub(super) fn generate_background(&mut self, store: &mut FrameStore, fid: FrameId) {
    let Some(frame) = store.get(fid) else {
      return;
    };
    if frame.cached_background.is_some() || !self.has_element_prefix(&self.requested_prefix) {
      return;
    }

    let prefix = self.prefix.clone();
    let id = self.cache_id_of(store, fid, &prefix);
    let overlay_available =
      !prefix.starts_with("mask-") && self.source.has_element(&format!("{prefix}overlay"));
    let theme = Arc::clone(self.registry.theme());

    let mut frame_cached = false;
    let mut overlay = None;
    if self.registry.config().use_rendering_cache {
      if let Some(hit) = theme.find_in_cache(&id) {
        if let Some(frame) = store.get_mut(fid) {
          frame.cached_background = Some(hit);
          frame_cached = true;
        }
      }
      if overlay_available {
        overlay = theme.find_in_cache(&format!("overlay_{id}"));
      }
    }
    let overlay_cached = overlay.is_some();

    if !frame_cached {
      self.generate_frame_background(store, fid);
    }
    if store
      .get(fid)
      .map_or(true, |frame| frame.cached_background.is_none())
    {
      return;
    }

    let placement = if overlay_available {
      Some(self.overlay_placement(store, fid, &prefix))
    } else {
      None
    };
    if let (Some(placement), false) = (placement, overlay_cached) {
      overlay = self.render_overlay(store, &prefix, placement).map(Arc::new);
    }

    if !frame_cached {
      let background = store.get(fid).and_then(|frame| frame.cached_background.clone());
      if let Some(background) = background {
        let fresh_overlay = overlay.as_ref().filter(|_| !overlay_cached);
        self.cache_frame(store, fid, &prefix, &background, fresh_overlay);
      }
    }

    if let (Some(overlay), Some(placement)) = (overlay, placement) {
      let rect = placement.rect;
      if let Some(background) = store
        .get_mut(fid)
        .and_then(|frame| frame.cached_background.as_mut())
      {
        paint::copy_region(
          Arc::make_mut(background),
          (rect.x, rect.y),
          &overlay,
          rect,
          BlendMode::SourceOver,
        );
      }
    }
  }

  fn overlay_placement(&mut self, store: &mut FrameStore, fid: FrameId, prefix: &str) -> OverlayPlacement {
    let frame_size = self.frame_size_of(store, fid).to_size();
    let has = |name: &str| self.source.has_element(&format!("{prefix}{name}"));
    let mut size = self.source.element_size(&format!("{prefix}overlay"));
    let (mut x, mut y) = (0.0, 0.0);
    let tile_horizontal = has("hint-overlay-tile-horizontal");
    let tile_vertical = has("hint-overlay-tile-vertical");

    if has("hint-overlay-pos-right") {
      x = frame_size.width - size.width;
    } else if has("hint-overlay-pos-bottom") {
      y = frame_size.height - size.height;
    } else if has("hint-overlay-stretch") {
      size = frame_size;
    } else {
      if tile_horizontal {
        size.width = frame_size.width;
      }
      if tile_vertical {
        size.height = frame_size.height;
      }
    }

    let ratio = self.source.device_pixel_ratio();
    OverlayPlacement {
      rect: PixelRect::new(
        round_px(x * ratio),
        round_px(y * ratio),
        round_px(size.width * ratio),
        round_px(size.height * ratio),
      ),
      tiled: tile_horizontal || tile_vertical,
    }
  }

  /// The overlay element painted only where the frame's alpha mask is.
  fn render_overlay(
    &mut self,
    store: &mut FrameStore,
    prefix: &str,
    placement: OverlayPlacement,
  ) -> Option<Pixmap> {
    let element = format!("{prefix}overlay");
    let base = self.alpha_mask_locked(store)?;
    let mut overlay = Pixmap::clone(&base);
    let rect = placement.rect;

    if placement.tiled {
      let tile_size = self
        .source
        .element_size(&element)
        .scale(self.source.device_pixel_ratio())
        .to_pixel_size();
      let tile = self.render_element(&element, tile_size)?;
      let area = PixelRect::new(0, 0, rect.width, rect.height);
      paint::tile(&mut overlay, area, &tile, BlendMode::SourceIn);
    } else {
      let size = PixelSize::new(rect.width.max(0) as u32, rect.height.max(0) as u32);
      let painted = self.render_element(&element, size)?;
      paint::draw_stretched(&mut overlay, rect, &painted, BlendMode::SourceIn);
    }
    Some(overlay)
  }

  fn generate_frame_background(&mut self, store: &mut FrameStore, fid: FrameId) {
    let ratio = self.source.device_pixel_ratio();
    let size = self.frame_size_of(store, fid).scale(ratio);
    if size.is_empty() {
      return;
    }
    let limit = self.registry.config().max_frame_size;
    if size.width >= limit || size.height >= limit {
      let err = RenderError::FrameTooLarge {
        width: size.width,
        height: size.height,
        limit,
      };
      log::warn!("{}: not generating frame background: {err}", self.source.image_path());
      return;
    }
    let Some(frame) = store.get(fid) else {
      return;
    };
    let (metrics, borders) = (frame.metrics, frame.shape.enabled_borders);

    let mut background = match paint::new_pixmap(size, "frame background") {
      Ok(pixmap) => pixmap,
      Err(err) => {
        log::warn!("{}: {err}", self.source.image_path());
        return;
      }
    };

    let content = self.content_geometry(metrics, borders, size);
    self.paint_center(store, &mut background, metrics, content, size);
    for corner in CORNERS {
      self.paint_corner(&mut background, borders, corner, content, size);
    }

    let element = |name: &str| self.source.element_size(&format!("{}{name}", self.prefix));
    let left_height = element("left").height;
    let top_width = element("top").width;
    let ext = metrics.extents;
    let strips = [
      (EnabledBorders::LEFT, Size::new(ext.left, left_height)),
      (EnabledBorders::RIGHT, Size::new(ext.right, left_height)),
      (EnabledBorders::TOP, Size::new(top_width, ext.top)),
      (EnabledBorders::BOTTOM, Size::new(top_width, ext.bottom)),
    ];
    for (border, strip) in strips {
      let strip = strip.scale(ratio).to_pixel_size();
      self.paint_border(&mut background, metrics, borders, border, strip, content, size);
    }

    if let Some(frame) = store.get_mut(fid) {
      frame.cached_background = Some(Arc::new(background));
    }
  }

  /// The area left for the center once enabled border extents are taken out.
  fn content_geometry(&self, metrics: FrameMetrics, borders: EnabledBorders, size: PixelSize) -> PixelRect {
    let ratio = self.source.device_pixel_ratio();
    let ext = metrics.extents;
    let width = size.width as f32 - (ext.left + ext.right) * ratio;
    let height = size.height as f32 - (ext.top + ext.bottom) * ratio;
    let mut content = PixelRect::new(0, 0, round_px(width).max(0), round_px(height).max(0));

    let has = |name: &str| self.source.has_element(&format!("{}{name}", self.prefix));
    if borders.contains(EnabledBorders::LEFT) && has("left") {
      content = content.translate(round_px(ext.left * ratio), 0);
    }
    if borders.contains(EnabledBorders::TOP) && has("top") {
      content = content.translate(0, round_px(ext.top * ratio));
    }
    content
  }

  fn paint_center(
    &mut self,
    store: &mut FrameStore,
    background: &mut Pixmap,
    metrics: FrameMetrics,
    content: PixelRect,
    full: PixelSize,
  ) {
    let compose = metrics.hints.contains(FrameHints::COMPOSE_OVER_BORDER);
    if !content.is_empty() {
      let center = format!("{}center", self.prefix);
      let area = if compose {
        PixelRect::from_size(full)
      } else {
        section_rect(EnabledBorders::NONE, content, full)
      };
      if metrics.hints.contains(FrameHints::TILE_CENTER) {
        let tile_size = self
          .source
          .element_size(&center)
          .scale(self.source.device_pixel_ratio())
          .to_pixel_size();
        if let Some(tile) = self.render_element(&center, tile_size) {
          paint::tile(background, area, &tile, BlendMode::Source);
        }
      } else if let Some(rect) = area.to_skia() {
        self.source.paint(background, rect, &center);
      }
    }

    if compose {
      if let Some(mask) = self.alpha_mask_locked(store) {
        paint::draw_stretched(
          background,
          PixelRect::from_size(full),
          &mask,
          BlendMode::DestinationIn,
        );
      }
    }
  }

  fn paint_corner(
    &self,
    background: &mut Pixmap,
    borders: EnabledBorders,
    corner: EnabledBorders,
    content: PixelRect,
    full: PixelSize,
  ) {
    let element = format!("{}{}", self.prefix, border_to_element_id(corner));
    if !borders.intersects(corner) || !self.source.has_element(&element) {
      return;
    }
    if let Some(rect) = section_rect(corner, content, full).to_skia() {
      log::trace!("painting {element} at {rect:?}");
      self.source.paint(background, rect, &element);
    }
  }

  #[allow(clippy::too_many_arguments)]
  fn paint_border(
    &self,
    background: &mut Pixmap,
    metrics: FrameMetrics,
    borders: EnabledBorders,
    border: EnabledBorders,
    strip: PixelSize,
    content: PixelRect,
    full: PixelSize,
  ) {
    let element = format!("{}{}", self.prefix, border_to_element_id(border));
    if !borders.contains(border) || !self.source.has_element(&element) || strip.is_empty() {
      return;
    }
    let area = section_rect(border, content, full);
    if metrics.hints.contains(FrameHints::STRETCH_BORDERS) {
      if let Some(rect) = area.to_skia() {
        self.source.paint(background, rect, &element);
      }
    } else if let Some(tile) = self.render_element(&element, strip) {
      paint::tile(background, area, &tile, BlendMode::SourceOver);
    }
  }

  /// Renders one element alone into a raster of `size`.
  fn render_element(&self, element: &str, size: PixelSize) -> Option<Pixmap> {
    let mut pixmap = match paint::new_pixmap(size, element) {
      Ok(pixmap) => pixmap,
      Err(err) => {
        log::trace!("skipping {element}: {err}");
        return None;
      }
    };
    let rect = PixelRect::from_size(size).to_skia()?;
    self.source.paint(&mut pixmap, rect, element);
    Some(pixmap)
  }

  fn cache_frame(
    &mut self,
    store: &mut FrameStore,
    fid: FrameId,
    prefix: &str,
    background: &Arc<Pixmap>,
    overlay: Option<&Arc<Pixmap>>,
  ) {
    if !self.registry.config().use_rendering_cache {
      return;
    }
    let id = self.cache_id_of(store, fid, prefix);
    let slot = format!("{:x}{prefix}", self.consumer);
    let theme = self.registry.theme();
    theme.insert_into_cache(&id, Arc::clone(background), &slot);
    if let Some(overlay) = overlay {
      theme.insert_into_cache(
        &format!("overlay_{id}"),
        Arc::clone(overlay),
        &format!("{slot}overlay"),
      );
    }
  }

  pub(super) fn alpha_mask_locked(&mut self, store: &mut FrameStore) -> Option<Arc<Pixmap>> {
    let fid = self.ensure_active(store);
    // Size the parent under its own prefix before switching to the mask prefix.
    self.frame_size_of(store, fid);

    if !self
      .source
      .has_element(&format!("mask-{}center", self.prefix))
    {
      if store.get(fid)?.cached_background.is_none() {
        self.generate_background(store, fid);
      }
      return store.get(fid)?.cached_background.clone();
    }

    let mask_prefix = format!("mask-{}", self.prefix);
    let parent_prefix = std::mem::replace(&mut self.prefix, mask_prefix);
    let mask = self.mask_frame_background(store, fid);
    self.prefix = parent_prefix;
    mask
  }

  /// Renders the `mask-` family for `parent`, keeping a record that follows
  /// the parent's borders and size. Runs with the mask prefix active.
  fn mask_frame_background(&mut self, store: &mut FrameStore, parent: FrameId) -> Option<Arc<Pixmap>> {
    let mask_prefix = self.prefix.clone();
    let theme = self.theme_now();

    let existing = self
      .frames
      .get(&mask_prefix)
      .copied()
      .filter(|id| store.get(*id).is_some());
    let mut mask_fid = match existing {
      Some(id) => id,
      None => {
        let key = self.cache_id_of(store, parent, &mask_prefix);
        let id = match store.lookup(theme, &key) {
          Some(hit) => {
            store.acquire(hit, self.consumer);
            hit
          }
          None => {
            let copy = store
              .get(parent)?
              .clone_for(self.consumer, self.source.device_pixel_ratio());
            let id = store.insert(copy);
            store.share(theme, key, id);
            id
          }
        };
        self.frames.insert(mask_prefix, id);
        self.update_sizes(store, id);
        id
      }
    };

    let parent_shape: FrameShape = store.get(parent)?.shape;
    if store.get(mask_fid)?.shape != parent_shape {
      match self.retarget(store, mask_fid, |shape| *shape = parent_shape) {
        Retarget::Reused(id) => mask_fid = id,
        Retarget::Updated { id, key } => {
          self.update_sizes(store, id);
          store.share(theme, key, id);
          mask_fid = id;
        }
      }
    }

    if store.get(mask_fid)?.cached_background.is_none() {
      self.generate_background(store, mask_fid);
    }
    store.get(mask_fid)?.cached_background.clone()
  }
}
