//! Themed SVG documents as a source of named vector elements.
//!
//! Frames are assembled from elements looked up by id (`topleft`, `north-center`,
//! `hint-tile-center`, ...). [`VectorImageSource`] is the seam the frame engine
//! talks to; [`SvgImage`] implements it on top of usvg/resvg, with roxmltree
//! providing the id index so that invisible hint elements still count as present.

use crate::error::{Result, SvgError, ThemeError};
use crate::geometry::Size;
use crate::theme::Theme;
use resvg::usvg;
use roxmltree::Document;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tiny_skia::{Pixmap, Transform};

/// Named-element access to a vector image.
///
/// Sizes are logical pixels at the current [`size`](Self::size), with the
/// scale factor applied. Painting targets device-pixel rasters.
pub trait VectorImageSource: Send {
  fn image_path(&self) -> &str;

  /// Switches to another image. The path is recorded even when loading fails,
  /// in which case the source behaves as an empty document.
  fn set_image_path(&mut self, path: &str) -> Result<()>;

  /// Reloads the current image, e.g. after the theme changed underneath it.
  fn reload(&mut self) -> Result<()>;

  /// True when a document is loaded.
  fn is_valid(&self) -> bool;

  fn has_element(&self, element_id: &str) -> bool;

  /// Size of an element, `Size::ZERO` when it does not exist.
  fn element_size(&self, element_id: &str) -> Size;

  /// Paints `element_id` stretched into `rect` of `target`.
  fn paint(&self, target: &mut Pixmap, rect: tiny_skia::Rect, element_id: &str);

  fn size(&self) -> Size;

  fn resize(&mut self, size: Size);

  /// Restores the natural document size.
  fn reset_size(&mut self);

  fn device_pixel_ratio(&self) -> f32;

  fn set_device_pixel_ratio(&mut self, ratio: f32);

  fn scale_factor(&self) -> f32;

  fn set_scale_factor(&mut self, factor: f32);
}

/// Parses a plain SVG length (`12`, `12px`, `0.5in`, ...) into pixels.
pub(crate) fn parse_svg_length_px(value: &str) -> Option<f32> {
  let trimmed = value.trim();
  if trimmed.is_empty() || trimmed.ends_with('%') {
    return None;
  }

  let mut end = 0;
  for (idx, ch) in trimmed.char_indices() {
    if matches!(ch, '0'..='9' | '+' | '-' | '.' | 'e' | 'E') {
      end = idx + ch.len_utf8();
    } else {
      break;
    }
  }

  if end == 0 {
    return None;
  }

  let number = trimmed[..end].parse::<f32>().ok()?;
  if !number.is_finite() {
    return None;
  }

  let unit = trimmed[end..].trim_start();
  let px = if unit.is_empty() || unit.eq_ignore_ascii_case("px") {
    number
  } else if unit.eq_ignore_ascii_case("in") {
    number * 96.0
  } else if unit.eq_ignore_ascii_case("cm") {
    number * (96.0 / 2.54)
  } else if unit.eq_ignore_ascii_case("mm") {
    number * (96.0 / 25.4)
  } else if unit.eq_ignore_ascii_case("pt") {
    number * (96.0 / 72.0)
  } else {
    return None;
  };

  px.is_finite().then_some(px)
}

/// Document-space bounds of an element, `x, y, width, height`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ElementBounds {
  x: f32,
  y: f32,
  width: f32,
  height: f32,
}

/// Collects every element id, with `<rect>` geometry as a fallback for elements
/// usvg drops from the render tree (unfilled hint rectangles).
fn index_element_ids(text: &str) -> FxHashMap<String, Option<ElementBounds>> {
  let Ok(doc) = Document::parse(text) else {
    return FxHashMap::default();
  };
  doc
    .descendants()
    .filter_map(|node| {
      let id = node.attribute("id")?;
      let bounds = if node.tag_name().name() == "rect" {
        let attr = |name: &str| node.attribute(name).and_then(parse_svg_length_px);
        match (attr("width"), attr("height")) {
          (Some(width), Some(height)) => Some(ElementBounds {
            x: attr("x").unwrap_or(0.0),
            y: attr("y").unwrap_or(0.0),
            width,
            height,
          }),
          _ => None,
        }
      } else {
        None
      };
      Some((id.to_string(), bounds))
    })
    .collect()
}

fn decode_svg_text(path: &str, bytes: Vec<u8>) -> Result<String> {
  let bytes = if bytes.starts_with(&[0x1f, 0x8b]) {
    usvg::decompress_svgz(&bytes).map_err(|e| SvgError::Parse {
      path: path.to_string(),
      reason: e.to_string(),
    })?
  } else {
    bytes
  };
  String::from_utf8(bytes).map_err(|e| {
    SvgError::Parse {
      path: path.to_string(),
      reason: e.to_string(),
    }
    .into()
  })
}

struct SvgDocument {
  path: PathBuf,
  tree: usvg::Tree,
  ids: FxHashMap<String, Option<ElementBounds>>,
}

impl SvgDocument {
  fn parse(path: PathBuf, text: &str) -> Result<Self> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(text, &options).map_err(|e| SvgError::Parse {
      path: path.display().to_string(),
      reason: e.to_string(),
    })?;
    Ok(Self {
      path,
      tree,
      ids: index_element_ids(text),
    })
  }

  fn document_size(&self) -> Size {
    let size = self.tree.size();
    Size::new(size.width(), size.height())
  }

  fn element_bounds(&self, element_id: &str) -> Option<ElementBounds> {
    if let Some(bbox) = self
      .tree
      .node_by_id(element_id)
      .and_then(|node| node.abs_layer_bounding_box())
    {
      return Some(ElementBounds {
        x: bbox.x(),
        y: bbox.y(),
        width: bbox.width(),
        height: bbox.height(),
      });
    }
    self.ids.get(element_id).copied().flatten()
  }
}

/// A theme-resolved SVG document.
pub struct SvgImage {
  theme: Arc<Theme>,
  image_path: String,
  document: Option<SvgDocument>,
  size: Option<Size>,
  device_pixel_ratio: f32,
  scale_factor: f32,
}

impl SvgImage {
  pub fn new(theme: Arc<Theme>) -> Self {
    Self {
      theme,
      image_path: String::new(),
      document: None,
      size: None,
      device_pixel_ratio: 1.0,
      scale_factor: 1.0,
    }
  }

  /// Loads a document directly from markup, bypassing theme resolution.
  pub fn from_markup(theme: Arc<Theme>, image_path: &str, text: &str) -> Result<Self> {
    let mut image = Self::new(theme);
    image.image_path = image_path.to_string();
    image.document = Some(SvgDocument::parse(PathBuf::from(image_path), text)?);
    Ok(image)
  }

  /// File the current document was loaded from.
  pub fn file_path(&self) -> Option<&std::path::Path> {
    self.document.as_ref().map(|doc| doc.path.as_path())
  }

  fn natural_size(&self) -> Size {
    self
      .document
      .as_ref()
      .map(|doc| doc.document_size().scale(self.scale_factor))
      .unwrap_or(Size::ZERO)
  }

  fn load(&mut self) -> Result<()> {
    self.document = None;
    let path = self
      .theme
      .resolve_image_path(&self.image_path)
      .ok_or_else(|| ThemeError::UnknownImage {
        path: self.image_path.clone(),
      })?;
    let bytes = match std::fs::read(&path) {
      Ok(bytes) => bytes,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        return Err(
          SvgError::NotFound {
            path: path.display().to_string(),
          }
          .into(),
        )
      }
      Err(err) => return Err(err.into()),
    };
    let text = decode_svg_text(&self.image_path, bytes)?;
    self.document = Some(SvgDocument::parse(path, &text)?);
    Ok(())
  }
}

impl VectorImageSource for SvgImage {
  fn image_path(&self) -> &str {
    &self.image_path
  }

  fn set_image_path(&mut self, path: &str) -> Result<()> {
    self.image_path = path.to_string();
    self.size = None;
    if path.is_empty() {
      self.document = None;
      return Ok(());
    }
    self.load()
  }

  fn reload(&mut self) -> Result<()> {
    if self.image_path.is_empty() {
      return Ok(());
    }
    self.load()
  }

  fn is_valid(&self) -> bool {
    self.document.is_some()
  }

  fn has_element(&self, element_id: &str) -> bool {
    self
      .document
      .as_ref()
      .is_some_and(|doc| doc.ids.contains_key(element_id))
  }

  fn element_size(&self, element_id: &str) -> Size {
    let Some(doc) = self.document.as_ref() else {
      return Size::ZERO;
    };
    let Some(bounds) = doc.element_bounds(element_id) else {
      return Size::ZERO;
    };
    let document = doc.document_size();
    if document.is_empty() {
      return Size::ZERO;
    }
    let current = self.size();
    Size::new(
      bounds.width * current.width / document.width,
      bounds.height * current.height / document.height,
    )
  }

  fn paint(&self, target: &mut Pixmap, rect: tiny_skia::Rect, element_id: &str) {
    let Some(doc) = self.document.as_ref() else {
      return;
    };
    let Some(node) = doc.tree.node_by_id(element_id) else {
      log::trace!("{}: no renderable element '{element_id}'", self.image_path);
      return;
    };
    let Some(bbox) = node.abs_layer_bounding_box() else {
      return;
    };
    let transform = Transform::from_row(
      rect.width() / bbox.width(),
      0.0,
      0.0,
      rect.height() / bbox.height(),
      rect.x(),
      rect.y(),
    );
    resvg::render_node(node, transform, &mut target.as_mut());
  }

  fn size(&self) -> Size {
    self.size.unwrap_or_else(|| self.natural_size())
  }

  fn resize(&mut self, size: Size) {
    self.size = (!size.is_empty()).then_some(size);
  }

  fn reset_size(&mut self) {
    self.size = None;
  }

  fn device_pixel_ratio(&self) -> f32 {
    self.device_pixel_ratio
  }

  fn set_device_pixel_ratio(&mut self, ratio: f32) {
    if ratio.is_finite() && ratio > 0.0 {
      self.device_pixel_ratio = ratio;
    }
  }

  fn scale_factor(&self) -> f32 {
    self.scale_factor
  }

  fn set_scale_factor(&mut self, factor: f32) {
    if factor.is_finite() && factor > 0.0 {
      self.scale_factor = factor;
      self.size = None;
    }
  }
}
