mod common;

use common::{document, nine_slice, rgb, ThemeDir, BLUE, RED};
use framesvg::{FrameConfig, FrameRegistry, FrameSvg, Size};
use std::sync::Arc;
use tiny_skia::{Color, Pixmap};

const FRAME: &str = "widgets/frame";

fn frame_theme() -> ThemeDir {
  let dir = ThemeDir::new();
  dir.write("air", FRAME, &document(30.0, 30.0, &nine_slice("", 10.0)));
  dir
}

fn rendered(registry: &FrameRegistry, size: Size) -> (FrameSvg, Arc<Pixmap>) {
  let mut svg = FrameSvg::new(registry);
  svg.set_image_path(FRAME).expect("load frame");
  svg.resize_frame(size);
  let pixmap = svg.frame_pixmap().expect("background");
  (svg, pixmap)
}

#[test]
fn rendered_frames_are_written_to_the_theme_cache() {
  let dir = frame_theme();
  let registry = dir.registry("air", FrameConfig::default());
  let (mut svg, pixmap) = rendered(&registry, Size::new(50.0, 50.0));

  let cached = registry
    .theme()
    .find_in_cache(&svg.cache_key())
    .expect("cached raster");
  assert!(Arc::ptr_eq(&cached, &pixmap));
}

#[test]
fn registries_on_one_theme_reuse_cached_rasters() {
  let dir = frame_theme();
  let config = FrameConfig::default();
  let theme = dir.theme("air", &config);
  let first = FrameRegistry::new(Arc::clone(&theme), config.clone());
  let second = FrameRegistry::new(theme, config);

  let (_a, pixmap) = rendered(&first, Size::new(50.0, 40.0));
  let (_b, reused) = rendered(&second, Size::new(50.0, 40.0));
  assert!(Arc::ptr_eq(&pixmap, &reused));
  assert_eq!(first.stats().frames, 1);
  assert_eq!(second.stats().frames, 1);
}

#[test]
fn resizing_replaces_the_consumers_cached_raster() {
  let dir = frame_theme();
  let registry = dir.registry("air", FrameConfig::default());
  let (mut svg, _) = rendered(&registry, Size::new(40.0, 40.0));
  let old_key = svg.cache_key();

  svg.resize_frame(Size::new(60.0, 60.0));
  assert!(svg.frame_pixmap().is_some());
  let theme = registry.theme();
  assert_eq!(theme.cache_len(), 1);
  assert!(theme.find_in_cache(&old_key).is_none());
  assert!(theme.find_in_cache(&svg.cache_key()).is_some());
}

#[test]
fn disabled_rendering_cache_stores_nothing() {
  let dir = frame_theme();
  let registry = dir.registry("air", common::uncached());
  let _ = rendered(&registry, Size::new(40.0, 40.0));
  assert_eq!(registry.theme().cache_len(), 0);
}

#[test]
fn theme_switch_invalidates_cached_rasters() {
  let dir = frame_theme();
  dir.write("oxygen", FRAME, &document(30.0, 30.0, &nine_slice("", 10.0)));
  let registry = dir.registry("air", FrameConfig::default());
  let (mut svg, _) = rendered(&registry, Size::new(40.0, 40.0));
  assert_eq!(registry.theme().cache_len(), 1);

  registry.theme().set_theme_name("oxygen");
  assert_eq!(registry.theme().cache_len(), 0);
  assert!(svg.frame_pixmap().is_some());
  assert_eq!(registry.theme().cache_len(), 1);
}

#[test]
fn disk_cache_survives_a_new_session() {
  let dir = frame_theme();
  let cache = tempfile::tempdir().expect("cache dir");
  let config = FrameConfig::default().with_cache_dir(cache.path());

  {
    let registry = dir.registry("air", config.clone());
    let (_svg, pixmap) = rendered(&registry, Size::new(40.0, 40.0));
    assert_eq!(rgb(&pixmap, 2, 2), Some(RED));
    assert_eq!(rgb(&pixmap, 20, 20), Some(BLUE));
  }

  let pngs = std::fs::read_dir(cache.path().join("air"))
    .expect("theme cache dir")
    .filter_map(|entry| entry.ok().map(|entry| entry.path()))
    .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
    .collect::<Vec<_>>();
  assert_eq!(pngs.len(), 1);

  // A marker raster proves the next session reads the disk instead of rendering.
  let mut marker = Pixmap::new(40, 40).expect("marker");
  marker.fill(Color::from_rgba8(255, 255, 0, 255));
  std::fs::write(&pngs[0], marker.encode_png().expect("encode")).expect("overwrite");

  let registry = dir.registry("air", config);
  let (_svg, pixmap) = rendered(&registry, Size::new(40.0, 40.0));
  assert_eq!(rgb(&pixmap, 20, 20), Some((255, 255, 0)));
}
