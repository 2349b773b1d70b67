use super::EnabledBorders;
use crate::geometry::{PixelRect, PixelSize};

/// Element name for a border or corner, without prefix.
pub fn border_to_element_id(borders: EnabledBorders) -> &'static str {
  const TOP_LEFT: u8 = EnabledBorders::TOP.bits() | EnabledBorders::LEFT.bits();
  const TOP_RIGHT: u8 = EnabledBorders::TOP.bits() | EnabledBorders::RIGHT.bits();
  const BOTTOM_LEFT: u8 = EnabledBorders::BOTTOM.bits() | EnabledBorders::LEFT.bits();
  const BOTTOM_RIGHT: u8 = EnabledBorders::BOTTOM.bits() | EnabledBorders::RIGHT.bits();

  match borders.bits() {
    0 => "center",
    1 => "top",
    2 => "bottom",
    4 => "left",
    8 => "right",
    TOP_LEFT => "topleft",
    TOP_RIGHT => "topright",
    BOTTOM_LEFT => "bottomleft",
    BOTTOM_RIGHT => "bottomright",
    _ => {
      log::warn!("unrecognized border combination {borders:?}");
      ""
    }
  }
}

/// Area of a frame section given the content rectangle and the full frame size.
///
/// `NONE` is the content rectangle itself; single borders are the strips
/// beside it and two-bit combinations are the corners.
pub fn section_rect(borders: EnabledBorders, content: PixelRect, full: PixelSize) -> PixelRect {
  let full = PixelRect::from_size(full);
  let c = content;
  let (top, bottom, left, right) = (
    EnabledBorders::TOP,
    EnabledBorders::BOTTOM,
    EnabledBorders::LEFT,
    EnabledBorders::RIGHT,
  );

  if borders == EnabledBorders::NONE {
    c
  } else if borders == top {
    PixelRect::new(c.x, 0, c.width, c.y)
  } else if borders == bottom {
    PixelRect::new(c.x, c.bottom(), c.width, full.height - c.bottom())
  } else if borders == left {
    PixelRect::new(0, c.y, c.x, c.height)
  } else if borders == right {
    PixelRect::new(c.right(), c.y, full.width - c.right(), c.height)
  } else if borders == top | left {
    PixelRect::new(0, 0, c.x, c.y)
  } else if borders == top | right {
    PixelRect::new(c.right(), 0, full.width - c.right(), c.y)
  } else if borders == bottom | left {
    PixelRect::new(0, c.bottom(), c.x, full.height - c.bottom())
  } else if borders == bottom | right {
    PixelRect::new(c.right(), c.bottom(), full.width - c.right(), full.height - c.bottom())
  } else {
    log::warn!("no section for border combination {borders:?}");
    c
  }
}

/// Deterministic cache key for one frame configuration.
///
/// Two consumers producing the same key render identical pixels and share
/// one frame record.
///
/// ```
/// use framesvg::{cache_id, EnabledBorders, PixelSize};
///
/// let key = cache_id(EnabledBorders::ALL, PixelSize::new(100, 40), 1.0, 2.0, "north-", "widgets/panel");
/// assert_eq!(key, "15_100_40_1_2_north-_widgets/panel");
/// ```
pub fn cache_id(
  borders: EnabledBorders,
  size: PixelSize,
  scale_factor: f32,
  device_pixel_ratio: f32,
  prefix: &str,
  image_path: &str,
) -> String {
  format!(
    "{}_{}_{}_{}_{}_{}_{}",
    borders.bits(),
    size.width,
    size.height,
    scale_factor,
    device_pixel_ratio,
    prefix,
    image_path
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  const CONTENT: PixelRect = PixelRect::new(10, 5, 80, 30);
  const FULL: PixelSize = PixelSize::new(100, 40);

  #[test]
  fn element_ids_for_every_section() {
    assert_eq!(border_to_element_id(EnabledBorders::NONE), "center");
    assert_eq!(border_to_element_id(EnabledBorders::BOTTOM), "bottom");
    assert_eq!(
      border_to_element_id(EnabledBorders::TOP | EnabledBorders::RIGHT),
      "topright"
    );
    assert_eq!(
      border_to_element_id(EnabledBorders::BOTTOM | EnabledBorders::LEFT),
      "bottomleft"
    );
    assert_eq!(border_to_element_id(EnabledBorders::ALL), "");
  }

  #[test]
  fn edge_sections_surround_content() {
    assert_eq!(section_rect(EnabledBorders::NONE, CONTENT, FULL), CONTENT);
    assert_eq!(
      section_rect(EnabledBorders::TOP, CONTENT, FULL),
      PixelRect::new(10, 0, 80, 5)
    );
    assert_eq!(
      section_rect(EnabledBorders::BOTTOM, CONTENT, FULL),
      PixelRect::new(10, 35, 80, 5)
    );
    assert_eq!(
      section_rect(EnabledBorders::LEFT, CONTENT, FULL),
      PixelRect::new(0, 5, 10, 30)
    );
    assert_eq!(
      section_rect(EnabledBorders::RIGHT, CONTENT, FULL),
      PixelRect::new(90, 5, 10, 30)
    );
  }

  #[test]
  fn corner_sections_fill_the_remainder() {
    let tl = EnabledBorders::TOP | EnabledBorders::LEFT;
    let br = EnabledBorders::BOTTOM | EnabledBorders::RIGHT;
    assert_eq!(section_rect(tl, CONTENT, FULL), PixelRect::new(0, 0, 10, 5));
    assert_eq!(section_rect(br, CONTENT, FULL), PixelRect::new(90, 35, 10, 5));
  }

  #[test]
  fn cache_id_changes_with_every_input() {
    let base = cache_id(EnabledBorders::ALL, FULL, 1.0, 1.0, "", "widgets/frame");
    assert_eq!(base, "15_100_40_1_1__widgets/frame");
    assert_eq!(
      base,
      cache_id(EnabledBorders::ALL, FULL, 1.0, 1.0, "", "widgets/frame")
    );
    let variants = [
      cache_id(EnabledBorders::TOP, FULL, 1.0, 1.0, "", "widgets/frame"),
      cache_id(EnabledBorders::ALL, PixelSize::new(101, 40), 1.0, 1.0, "", "widgets/frame"),
      cache_id(EnabledBorders::ALL, PixelSize::new(100, 41), 1.0, 1.0, "", "widgets/frame"),
      cache_id(EnabledBorders::ALL, FULL, 1.5, 1.0, "", "widgets/frame"),
      cache_id(EnabledBorders::ALL, FULL, 1.0, 2.0, "", "widgets/frame"),
      cache_id(EnabledBorders::ALL, FULL, 1.0, 1.0, "north-", "widgets/frame"),
      cache_id(EnabledBorders::ALL, FULL, 1.0, 1.0, "", "widgets/panel"),
    ];
    for variant in variants {
      assert_ne!(variant, base);
    }
  }
}
