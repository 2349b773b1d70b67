//! Nine-slice frames rendered from themed SVG elements.
//!
//! A frame image provides up to nine elements per prefix (`topleft`, `top`,
//! `topright`, `left`, `center`, `right`, `bottomleft`, `bottom`,
//! `bottomright`), plus optional `hint-*` elements that tune margins and
//! painting, and an optional `overlay`. [`FrameSvg`] is the per-widget handle;
//! the metadata and rendered raster for one configuration live in a frame
//! record owned by the [`FrameRegistry`], shared by every consumer asking for
//! the identical configuration.

mod data;
mod framesvg;
mod helpers;
mod registry;
mod render;

pub use framesvg::FrameSvg;
pub use helpers::{border_to_element_id, cache_id, section_rect};
pub use registry::{FrameInfo, FrameRegistry, LeakReport, RegistryStats};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

bitflags::bitflags! {
  /// Borders of a frame that are drawn and contribute margins.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
  pub struct EnabledBorders: u8 {
    const TOP = 1;
    const BOTTOM = 2;
    const LEFT = 4;
    const RIGHT = 8;
    const ALL = Self::TOP.bits() | Self::BOTTOM.bits() | Self::LEFT.bits() | Self::RIGHT.bits();
  }
}

impl EnabledBorders {
  pub const NONE: Self = Self::empty();
}

impl Default for EnabledBorders {
  fn default() -> Self {
    Self::ALL
  }
}

/// Where a frame sits on screen; edges select a themed prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Location {
  #[default]
  Floating,
  Desktop,
  FullScreen,
  TopEdge,
  BottomEdge,
  LeftEdge,
  RightEdge,
}

impl Location {
  /// Element prefix used for this location, empty for the default frame.
  pub fn prefix(self) -> &'static str {
    match self {
      Location::TopEdge => "north",
      Location::BottomEdge => "south",
      Location::LeftEdge => "west",
      Location::RightEdge => "east",
      Location::Floating | Location::Desktop | Location::FullScreen => "",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarginEdge {
  Top,
  Bottom,
  Left,
  Right,
}

/// Notifications delivered to [`FrameSvg::subscribe`] observers.
///
/// Events are dispatched only after margins and sizes have been recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
  /// The rendered frame is stale and should be painted again.
  RepaintNeeded,
  /// Size, borders or prefix changed; margins may differ.
  GeometryChanged,
}

static NEXT_CONSUMER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one [`FrameSvg`], used for reference counting and cache slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId(u64);

impl ConsumerId {
  pub(crate) fn next() -> Self {
    Self(NEXT_CONSUMER_ID.fetch_add(1, Ordering::Relaxed))
  }
}

impl fmt::LowerHex for ConsumerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::LowerHex::fmt(&self.0, f)
  }
}

/// Handle to a frame record held by a [`FrameRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl fmt::Display for FrameId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "frame#{}", self.0)
  }
}

#[cfg(test)]
pub(crate) mod test_support {
  //! In-memory image source with rectangular, solid-colored elements.

  use crate::error::{Result, SvgError};
  use crate::geometry::Size;
  use crate::svg::VectorImageSource;
  use parking_lot::Mutex;
  use rustc_hash::FxHashMap;
  use std::sync::Arc;
  use tiny_skia::{Color, Paint, Pixmap, Shader, Transform};

  #[derive(Debug, Clone)]
  pub(crate) struct MockDocument {
    pub size: Size,
    pub elements: FxHashMap<String, (Size, Option<Color>)>,
  }

  impl MockDocument {
    pub fn new(width: f32, height: f32) -> Self {
      Self {
        size: Size::new(width, height),
        elements: FxHashMap::default(),
      }
    }

    pub fn element(mut self, id: &str, width: f32, height: f32, color: Color) -> Self {
      self
        .elements
        .insert(id.to_string(), (Size::new(width, height), Some(color)));
      self
    }

    /// Adds an element that exists but paints nothing.
    pub fn hint(mut self, id: &str, width: f32, height: f32) -> Self {
      self
        .elements
        .insert(id.to_string(), (Size::new(width, height), None));
      self
    }

    /// A 30x30 frame with 10px borders on every side, per-region colors.
    pub fn nine_slice(prefix: &str) -> Self {
      let p = |name: &str| format!("{prefix}{name}");
      let red = Color::from_rgba8(255, 0, 0, 255);
      let green = Color::from_rgba8(0, 255, 0, 255);
      let blue = Color::from_rgba8(0, 0, 255, 255);
      Self::new(30.0, 30.0)
        .element(&p("topleft"), 10.0, 10.0, red)
        .element(&p("topright"), 10.0, 10.0, red)
        .element(&p("bottomleft"), 10.0, 10.0, red)
        .element(&p("bottomright"), 10.0, 10.0, red)
        .element(&p("top"), 10.0, 10.0, green)
        .element(&p("bottom"), 10.0, 10.0, green)
        .element(&p("left"), 10.0, 10.0, green)
        .element(&p("right"), 10.0, 10.0, green)
        .element(&p("center"), 10.0, 10.0, blue)
    }

    pub fn merge(mut self, other: MockDocument) -> Self {
      self.elements.extend(other.elements);
      self
    }
  }

  /// Documents by image path; tests swap entries to simulate a theme change.
  pub(crate) type MockLibrary = Arc<Mutex<FxHashMap<String, MockDocument>>>;

  pub(crate) fn library(entries: &[(&str, MockDocument)]) -> MockLibrary {
    Arc::new(Mutex::new(
      entries
        .iter()
        .map(|(path, doc)| (path.to_string(), doc.clone()))
        .collect(),
    ))
  }

  pub(crate) struct MockSource {
    library: MockLibrary,
    path: String,
    document: Option<MockDocument>,
    size: Option<Size>,
    device_pixel_ratio: f32,
    scale_factor: f32,
  }

  impl MockSource {
    pub fn new(library: MockLibrary) -> Self {
      Self {
        library,
        path: String::new(),
        document: None,
        size: None,
        device_pixel_ratio: 1.0,
        scale_factor: 1.0,
      }
    }

    fn natural_size(&self) -> Size {
      self
        .document
        .as_ref()
        .map(|doc| doc.size.scale(self.scale_factor))
        .unwrap_or(Size::ZERO)
    }

    fn load(&mut self) -> Result<()> {
      self.document = self.library.lock().get(&self.path).cloned();
      match self.document {
        Some(_) => Ok(()),
        None => Err(
          SvgError::NotFound {
            path: self.path.clone(),
          }
          .into(),
        ),
      }
    }
  }

  impl VectorImageSource for MockSource {
    fn image_path(&self) -> &str {
      &self.path
    }

    fn set_image_path(&mut self, path: &str) -> Result<()> {
      self.path = path.to_string();
      self.size = None;
      self.load()
    }

    fn reload(&mut self) -> Result<()> {
      self.load()
    }

    fn is_valid(&self) -> bool {
      self.document.is_some()
    }

    fn has_element(&self, element_id: &str) -> bool {
      self
        .document
        .as_ref()
        .is_some_and(|doc| doc.elements.contains_key(element_id))
    }

    fn element_size(&self, element_id: &str) -> Size {
      let Some(doc) = self.document.as_ref() else {
        return Size::ZERO;
      };
      let Some((size, _)) = doc.elements.get(element_id) else {
        return Size::ZERO;
      };
      let current = self.size();
      Size::new(
        size.width * current.width / doc.size.width,
        size.height * current.height / doc.size.height,
      )
    }

    fn paint(&self, target: &mut Pixmap, rect: tiny_skia::Rect, element_id: &str) {
      let color = self
        .document
        .as_ref()
        .and_then(|doc| doc.elements.get(element_id))
        .and_then(|(_, color)| *color);
      if let Some(color) = color {
        let paint = Paint {
          shader: Shader::SolidColor(color),
          anti_alias: false,
          ..Paint::default()
        };
        target.fill_rect(rect, &paint, Transform::identity(), None);
      }
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
      self.device_pixel_ratio = ratio;
    }

    fn scale_factor(&self) -> f32 {
      self.scale_factor
    }

    fn set_scale_factor(&mut self, factor: f32) {
      self.scale_factor = factor;
      self.size = None;
    }
  }
}
