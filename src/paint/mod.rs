//! Raster helpers for frame compositing
//!
//! Frames are composited from element rasters with a handful of operations:
//! tiling a strip along an edge, stretching a tile over a span, copying an
//! overlay sub-rectangle, and masking by another raster's alpha. Everything
//! here works on tiny-skia pixmaps in device pixels.

pub(crate) mod pixmap;

pub(crate) use pixmap::{
  copy_region, coverage_mask, draw_mapped, draw_stretched, new_pixmap, tile,
};
