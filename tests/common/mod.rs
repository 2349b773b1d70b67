#![allow(dead_code)]

use framesvg::{FrameConfig, FrameRegistry, Theme};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tiny_skia::Pixmap;

pub const RED: (u8, u8, u8) = (255, 0, 0);
pub const GREEN: (u8, u8, u8) = (0, 255, 0);
pub const BLUE: (u8, u8, u8) = (0, 0, 255);

/// Rect elements for one nine-slice family with `border`-wide edges.
///
/// Corners are red, edges green and the center blue; every element is
/// `border` square and the families overlap, which is fine since elements are
/// rendered one id at a time.
pub fn nine_slice(prefix: &str, border: f32) -> String {
  let b = border;
  let rect = |id: &str, x: f32, y: f32, fill: &str| {
    format!(
      "<rect id='{prefix}{id}' x='{x}' y='{y}' width='{b}' height='{b}' fill='{fill}'/>\n"
    )
  };
  [
    rect("topleft", 0.0, 0.0, "#ff0000"),
    rect("top", b, 0.0, "#00ff00"),
    rect("topright", 2.0 * b, 0.0, "#ff0000"),
    rect("left", 0.0, b, "#00ff00"),
    rect("center", b, b, "#0000ff"),
    rect("right", 2.0 * b, b, "#00ff00"),
    rect("bottomleft", 0.0, 2.0 * b, "#ff0000"),
    rect("bottom", b, 2.0 * b, "#00ff00"),
    rect("bottomright", 2.0 * b, 2.0 * b, "#ff0000"),
  ]
  .concat()
}

/// An invisible element, present for lookups and sizing only.
pub fn hint(id: &str, width: f32, height: f32) -> String {
  format!("<rect id='{id}' x='0' y='0' width='{width}' height='{height}' fill='none'/>\n")
}

pub fn document(width: f32, height: f32, body: &str) -> String {
  format!(
    "<svg xmlns='http://www.w3.org/2000/svg' width='{width}' height='{height}'>\n{body}</svg>\n"
  )
}

/// A theme search directory laid out as `<root>/<theme>/<image path>.svg`.
pub struct ThemeDir {
  pub root: TempDir,
}

impl ThemeDir {
  pub fn new() -> Self {
    Self {
      root: tempfile::tempdir().expect("tempdir"),
    }
  }

  pub fn path(&self) -> &Path {
    self.root.path()
  }

  pub fn write(&self, theme: &str, image_path: &str, svg: &str) {
    let file = self.root.path().join(theme).join(format!("{image_path}.svg"));
    std::fs::create_dir_all(file.parent().expect("parent")).expect("mkdir");
    std::fs::write(file, svg).expect("write svg");
  }

  pub fn theme(&self, name: &str, config: &FrameConfig) -> Arc<Theme> {
    let theme = Theme::new(name, config);
    theme.add_search_dir(self.path());
    theme
  }

  pub fn registry(&self, name: &str, config: FrameConfig) -> FrameRegistry {
    FrameRegistry::new(self.theme(name, &config), config)
  }
}

pub fn uncached() -> FrameConfig {
  FrameConfig::default().with_rendering_cache(false)
}

/// Opaque pixel color, `None` for (partly) transparent pixels.
pub fn rgb(pixmap: &Pixmap, x: u32, y: u32) -> Option<(u8, u8, u8)> {
  let p = pixmap.pixel(x, y)?;
  (p.alpha() == 255).then(|| (p.red(), p.green(), p.blue()))
}

pub fn alpha(pixmap: &Pixmap, x: u32, y: u32) -> u8 {
  pixmap.pixel(x, y).map_or(0, |p| p.alpha())
}
