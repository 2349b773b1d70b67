//! Geometry types for frame layout and compositing
//!
//! Two coordinate spaces are in play:
//!
//! - **Logical pixels** ([`Size`], [`Rect`], [`Margins`]): what callers lay widgets out in.
//! - **Device pixels** ([`PixelSize`], [`PixelRect`]): integer extents of rendered rasters,
//!   already multiplied by the device pixel ratio.
//!
//! The origin is the top-left corner, X grows to the right and Y grows downward.

use std::fmt;

/// A 2D point in logical pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
  /// X coordinate
  pub x: f32,
  /// Y coordinate
  pub y: f32,
}

impl Point {
  /// The origin
  pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

  /// Creates a new point at the given coordinates
  pub const fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }
}

impl fmt::Display for Point {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.x, self.y)
  }
}

/// A 2D size in logical pixels
///
/// # Examples
///
/// ```
/// use framesvg::Size;
///
/// let size = Size::new(100.0, 50.0);
/// assert_eq!(size.width, 100.0);
/// assert!(!size.is_empty());
/// assert!(Size::new(0.0, 10.0).is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
  /// Width (horizontal extent)
  pub width: f32,
  /// Height (vertical extent)
  pub height: f32,
}

impl Size {
  /// A size with zero width and height
  pub const ZERO: Self = Self {
    width: 0.0,
    height: 0.0,
  };

  /// Creates a new size with the given dimensions
  pub const fn new(width: f32, height: f32) -> Self {
    Self { width, height }
  }

  /// Returns true if either dimension is zero or negative
  pub fn is_empty(self) -> bool {
    !(self.width > 0.0 && self.height > 0.0)
  }

  /// Scales this size by a factor
  pub fn scale(self, factor: f32) -> Self {
    Self {
      width: self.width * factor,
      height: self.height * factor,
    }
  }

  /// Rounds to the nearest integer size, clamping negatives to zero.
  pub fn to_pixel_size(self) -> PixelSize {
    PixelSize::new(round_px(self.width), round_px(self.height))
  }
}

impl fmt::Display for Size {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}×{}", self.width, self.height)
  }
}

fn round_px(value: f32) -> u32 {
  if value.is_finite() && value > 0.0 {
    value.round().min(u32::MAX as f32) as u32
  } else {
    0
  }
}

/// An axis-aligned rectangle in logical pixel space
///
/// # Examples
///
/// ```
/// use framesvg::Rect;
///
/// let rect = Rect::from_xywh(0.0, 0.0, 100.0, 40.0).adjusted(4.0, 2.0, -4.0, -2.0);
/// assert_eq!(rect, Rect::from_xywh(4.0, 2.0, 92.0, 36.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
  /// The top-left corner of the rectangle
  pub origin: Point,
  /// The size of the rectangle
  pub size: Size,
}

impl Rect {
  /// A zero-sized rectangle at the origin
  pub const ZERO: Self = Self {
    origin: Point::ZERO,
    size: Size::ZERO,
  };

  /// Creates a new rectangle from an origin point and size
  pub const fn new(origin: Point, size: Size) -> Self {
    Self { origin, size }
  }

  /// Creates a rectangle from x, y, width, height components
  pub const fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      origin: Point::new(x, y),
      size: Size::new(width, height),
    }
  }

  pub fn x(self) -> f32 {
    self.origin.x
  }

  pub fn y(self) -> f32 {
    self.origin.y
  }

  pub fn width(self) -> f32 {
    self.size.width
  }

  pub fn height(self) -> f32 {
    self.size.height
  }

  /// Moves each edge by the given deltas, like growing the top-left corner by
  /// `(dx1, dy1)` and the bottom-right corner by `(dx2, dy2)`.
  pub fn adjusted(self, dx1: f32, dy1: f32, dx2: f32, dy2: f32) -> Rect {
    Rect::from_xywh(
      self.x() + dx1,
      self.y() + dy1,
      self.width() - dx1 + dx2,
      self.height() - dy1 + dy2,
    )
  }

  pub fn is_empty(self) -> bool {
    self.size.is_empty()
  }
}

impl fmt::Display for Rect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} @ {}", self.size, self.origin)
  }
}

/// Per-edge margins in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
  pub left: f32,
}

impl Margins {
  /// Zero margins on every edge
  pub const ZERO: Self = Self {
    top: 0.0,
    right: 0.0,
    bottom: 0.0,
    left: 0.0,
  };

  /// Creates margins in CSS order: top, right, bottom, left
  pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
    Self {
      top,
      right,
      bottom,
      left,
    }
  }

  /// Sum of left and right margins
  pub fn horizontal(self) -> f32 {
    self.left + self.right
  }

  /// Sum of top and bottom margins
  pub fn vertical(self) -> f32 {
    self.top + self.bottom
  }
}

impl fmt::Display for Margins {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "[t:{}, r:{}, b:{}, l:{}]",
      self.top, self.right, self.bottom, self.left
    )
  }
}

/// An integer size in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelSize {
  pub width: u32,
  pub height: u32,
}

impl PixelSize {
  pub const ZERO: Self = Self {
    width: 0,
    height: 0,
  };

  pub const fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }

  pub fn is_empty(self) -> bool {
    self.width == 0 || self.height == 0
  }

  /// Multiplies by a (device pixel) ratio, rounding to the nearest pixel.
  pub fn scale(self, factor: f32) -> Self {
    self.to_size().scale(factor).to_pixel_size()
  }

  pub fn to_size(self) -> Size {
    Size::new(self.width as f32, self.height as f32)
  }
}

impl fmt::Display for PixelSize {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}x{}", self.width, self.height)
  }
}

/// An integer rectangle in device pixels; `right()`/`bottom()` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
  pub x: i32,
  pub y: i32,
  pub width: i32,
  pub height: i32,
}

impl PixelRect {
  pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// A rectangle at the origin covering `size`.
  pub fn from_size(size: PixelSize) -> Self {
    Self::new(0, 0, clamp_i32(size.width), clamp_i32(size.height))
  }

  pub fn right(self) -> i32 {
    self.x + self.width
  }

  pub fn bottom(self) -> i32 {
    self.y + self.height
  }

  pub fn is_empty(self) -> bool {
    self.width <= 0 || self.height <= 0
  }

  pub fn translate(self, dx: i32, dy: i32) -> Self {
    Self::new(self.x + dx, self.y + dy, self.width, self.height)
  }

  /// Converts to a tiny-skia rectangle, or `None` when empty.
  pub fn to_skia(self) -> Option<tiny_skia::Rect> {
    if self.is_empty() {
      return None;
    }
    tiny_skia::Rect::from_xywh(
      self.x as f32,
      self.y as f32,
      self.width as f32,
      self.height as f32,
    )
  }
}

pub(crate) fn clamp_i32(value: u32) -> i32 {
  i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_size_is_empty() {
    assert!(Size::ZERO.is_empty());
    assert!(Size::new(0.0, 10.0).is_empty());
    assert!(Size::new(10.0, -1.0).is_empty());
    assert!(!Size::new(10.0, 10.0).is_empty());
  }

  #[test]
  fn test_size_rounds_to_pixels() {
    assert_eq!(Size::new(10.4, 10.6).to_pixel_size(), PixelSize::new(10, 11));
    assert_eq!(Size::new(-3.0, f32::NAN).to_pixel_size(), PixelSize::ZERO);
  }

  #[test]
  fn test_pixel_size_scale() {
    assert_eq!(PixelSize::new(10, 7).scale(1.5), PixelSize::new(15, 11));
    assert_eq!(PixelSize::new(10, 7).scale(1.0), PixelSize::new(10, 7));
  }

  #[test]
  fn test_rect_adjusted() {
    let rect = Rect::from_xywh(0.0, 0.0, 50.0, 20.0).adjusted(5.0, 3.0, -5.0, -3.0);
    assert_eq!(rect, Rect::from_xywh(5.0, 3.0, 40.0, 14.0));
  }

  #[test]
  fn test_pixel_rect_edges() {
    let rect = PixelRect::new(4, 6, 10, 20);
    assert_eq!(rect.right(), 14);
    assert_eq!(rect.bottom(), 26);
    assert!(!rect.is_empty());
    assert!(PixelRect::new(0, 0, 0, 5).is_empty());
    assert!(PixelRect::new(0, 0, 0, 5).to_skia().is_none());
  }

  #[test]
  fn test_margins_sums() {
    let margins = Margins::new(1.0, 2.0, 3.0, 4.0);
    assert_eq!(margins.horizontal(), 6.0);
    assert_eq!(margins.vertical(), 4.0);
  }
}
