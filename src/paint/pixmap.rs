use crate::error::RenderError;
use crate::geometry::{PixelRect, PixelSize};
use tiny_skia::{
  BlendMode, FilterQuality, IntSize, Mask, MaskType, Paint, Pattern, Pixmap, SpreadMode, Transform,
};

const BYTES_PER_PIXEL: u64 = 4;
/// Upper bound on a single pixmap allocation to avoid process aborts on OOM.
pub(crate) const MAX_PIXMAP_BYTES: u64 = 512 * 1024 * 1024;

fn guard_dimensions(width: u32, height: u32, context: &str) -> Result<usize, RenderError> {
  if width == 0 || height == 0 {
    return Err(RenderError::CanvasCreationFailed { width, height });
  }

  let bytes = (width as u64)
    .checked_mul(height as u64)
    .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
    .ok_or(RenderError::InvalidParameters {
      message: format!("{context}: pixmap byte size overflow ({width}x{height})"),
    })?;
  if bytes > MAX_PIXMAP_BYTES {
    return Err(RenderError::InvalidParameters {
      message: format!(
        "{context}: pixmap {width}x{height} would allocate {bytes} bytes (limit {MAX_PIXMAP_BYTES})"
      ),
    });
  }

  usize::try_from(bytes).map_err(|_| RenderError::InvalidParameters {
    message: format!("{context}: allocation size {bytes} does not fit in usize"),
  })
}

/// Allocates a transparent pixmap, failing instead of aborting on huge sizes.
pub(crate) fn new_pixmap(size: PixelSize, context: &str) -> Result<Pixmap, RenderError> {
  let PixelSize { width, height } = size;
  let bytes = guard_dimensions(width, height, context)?;
  let mut buffer = Vec::new();
  buffer
    .try_reserve_exact(bytes)
    .map_err(|err| RenderError::InvalidParameters {
      message: format!("{context}: pixmap allocation failed for {bytes} bytes: {err}"),
    })?;
  buffer.resize(bytes, 0);
  let int_size =
    IntSize::from_wh(width, height).ok_or(RenderError::CanvasCreationFailed { width, height })?;
  Pixmap::from_vec(buffer, int_size).ok_or(RenderError::CanvasCreationFailed { width, height })
}

fn fill_with_pattern(
  target: &mut Pixmap,
  rect: PixelRect,
  source: &Pixmap,
  spread: SpreadMode,
  quality: FilterQuality,
  pattern_transform: Transform,
  blend: BlendMode,
) {
  let Some(dest) = rect.to_skia() else {
    return;
  };
  let paint = Paint {
    shader: Pattern::new(source.as_ref(), spread, quality, 1.0, pattern_transform),
    blend_mode: blend,
    anti_alias: false,
    ..Paint::default()
  };
  target.fill_rect(dest, &paint, Transform::identity(), None);
}

/// Repeats `tile` across `rect`, anchored at the rectangle's top-left corner.
pub(crate) fn tile(target: &mut Pixmap, rect: PixelRect, tile: &Pixmap, blend: BlendMode) {
  fill_with_pattern(
    target,
    rect,
    tile,
    SpreadMode::Repeat,
    FilterQuality::Nearest,
    Transform::from_translate(rect.x as f32, rect.y as f32),
    blend,
  );
}

/// Stretches all of `source` over `rect`.
pub(crate) fn draw_stretched(target: &mut Pixmap, rect: PixelRect, source: &Pixmap, blend: BlendMode) {
  if rect.is_empty() {
    return;
  }
  let sx = rect.width as f32 / source.width() as f32;
  let sy = rect.height as f32 / source.height() as f32;
  let quality = if sx == 1.0 && sy == 1.0 {
    FilterQuality::Nearest
  } else {
    FilterQuality::Bilinear
  };
  fill_with_pattern(
    target,
    rect,
    source,
    SpreadMode::Pad,
    quality,
    Transform::from_row(sx, 0.0, 0.0, sy, rect.x as f32, rect.y as f32),
    blend,
  );
}

/// Copies the `from` region of `source` to `to` (same size) in `target`.
pub(crate) fn copy_region(
  target: &mut Pixmap,
  to: (i32, i32),
  source: &Pixmap,
  from: PixelRect,
  blend: BlendMode,
) {
  let dest = PixelRect::new(to.0, to.1, from.width, from.height);
  fill_with_pattern(
    target,
    dest,
    source,
    SpreadMode::Pad,
    FilterQuality::Nearest,
    Transform::from_translate((to.0 - from.x) as f32, (to.1 - from.y) as f32),
    blend,
  );
}

/// Draws the `from` area of `source` scaled into `to`.
pub(crate) fn draw_mapped(
  target: &mut Pixmap,
  to: tiny_skia::Rect,
  source: &Pixmap,
  from: tiny_skia::Rect,
) {
  let sx = to.width() / from.width();
  let sy = to.height() / from.height();
  let paint = Paint {
    shader: Pattern::new(
      source.as_ref(),
      SpreadMode::Pad,
      FilterQuality::Bilinear,
      1.0,
      Transform::from_row(sx, 0.0, 0.0, sy, to.x() - from.x() * sx, to.y() - from.y() * sy),
    ),
    ..Paint::default()
  };
  target.fill_rect(to, &paint, Transform::identity(), None);
}

/// Binary coverage mask: every pixel with any alpha is fully inside.
pub(crate) fn coverage_mask(pixmap: &Pixmap) -> Mask {
  let mut mask = Mask::from_pixmap(pixmap.as_ref(), MaskType::Alpha);
  for value in mask.data_mut() {
    if *value > 0 {
      *value = u8::MAX;
    }
  }
  mask
}

#[cfg(test)]
mod tests {
  use super::*;
  use tiny_skia::Color;

  fn solid(width: u32, height: u32, color: Color) -> Pixmap {
    let mut pixmap = Pixmap::new(width, height).expect("pixmap");
    pixmap.fill(color);
    pixmap
  }

  fn alpha(pixmap: &Pixmap, x: u32, y: u32) -> u8 {
    pixmap.pixel(x, y).map(|p| p.alpha()).unwrap_or(0)
  }

  #[test]
  fn rejects_zero_and_oversized_dimensions() {
    assert!(matches!(
      new_pixmap(PixelSize::new(0, 10), "zero"),
      Err(RenderError::CanvasCreationFailed { .. })
    ));
    assert!(matches!(
      new_pixmap(PixelSize::new(u32::MAX, u32::MAX), "overflow"),
      Err(RenderError::InvalidParameters { .. })
    ));
    let width = (MAX_PIXMAP_BYTES / BYTES_PER_PIXEL + 1) as u32;
    assert!(new_pixmap(PixelSize::new(width, 1), "too_big").is_err());
  }

  #[test]
  fn allocates_transparent_pixmaps() {
    let pixmap = new_pixmap(PixelSize::new(4, 3), "ok").expect("small pixmap");
    assert_eq!((pixmap.width(), pixmap.height()), (4, 3));
    assert_eq!(alpha(&pixmap, 3, 2), 0);
  }

  #[test]
  fn tiles_from_rect_origin() {
    let mut tile_px = Pixmap::new(2, 1).expect("tile");
    tile_px.fill_rect(
      tiny_skia::Rect::from_xywh(0.0, 0.0, 1.0, 1.0).expect("rect"),
      &Paint {
        shader: tiny_skia::Shader::SolidColor(Color::BLACK),
        ..Paint::default()
      },
      Transform::identity(),
      None,
    );
    let mut target = Pixmap::new(8, 2).expect("target");
    tile(&mut target, PixelRect::new(3, 0, 4, 2), &tile_px, BlendMode::SourceOver);
    assert_eq!(alpha(&target, 2, 0), 0);
    assert_eq!(alpha(&target, 3, 0), 255);
    assert_eq!(alpha(&target, 4, 0), 0);
    assert_eq!(alpha(&target, 5, 1), 255);
    assert_eq!(alpha(&target, 7, 0), 0);
  }

  #[test]
  fn stretches_and_masks() {
    let mut target = Pixmap::new(10, 10).expect("target");
    let red = solid(1, 1, Color::from_rgba8(255, 0, 0, 255));
    draw_stretched(&mut target, PixelRect::new(0, 0, 10, 10), &red, BlendMode::Source);
    assert_eq!(alpha(&target, 9, 9), 255);

    let mut mask = Pixmap::new(10, 10).expect("mask");
    let opaque = solid(5, 10, Color::BLACK);
    copy_region(&mut mask, (0, 0), &opaque, PixelRect::new(0, 0, 5, 10), BlendMode::Source);
    draw_stretched(&mut target, PixelRect::new(0, 0, 10, 10), &mask, BlendMode::DestinationIn);
    assert_eq!(alpha(&target, 2, 5), 255);
    assert_eq!(alpha(&target, 7, 5), 0);
  }

  #[test]
  fn copies_sub_regions() {
    let mut source = Pixmap::new(4, 4).expect("source");
    let green = solid(2, 2, Color::from_rgba8(0, 255, 0, 255));
    copy_region(&mut source, (2, 2), &green, PixelRect::new(0, 0, 2, 2), BlendMode::Source);

    let mut target = Pixmap::new(4, 4).expect("target");
    copy_region(&mut target, (0, 0), &source, PixelRect::new(2, 2, 2, 2), BlendMode::SourceOver);
    assert_eq!(target.pixel(1, 1).map(|p| p.green()), Some(255));
    assert_eq!(alpha(&target, 2, 2), 0);
  }

  #[test]
  fn coverage_is_binary() {
    let faint = solid(2, 2, Color::from_rgba8(0, 0, 0, 10));
    let mask = coverage_mask(&faint);
    assert!(mask.data().iter().all(|v| *v == 255));
    let empty = Pixmap::new(2, 2).expect("empty");
    assert!(coverage_mask(&empty).data().iter().all(|v| *v == 0));
  }
}
