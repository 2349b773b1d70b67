//! Runtime configuration sourced from `FRAMESVG_*` environment variables.
//!
//! Values are captured once (via [`FrameConfig::from_env`]) when a
//! [`FrameRegistry`](crate::FrameRegistry) is created and then reused by every consumer
//! attached to it. Embedders and tests can build a config from an explicit map instead.

use std::collections::HashMap;
use std::path::PathBuf;

/// Frames whose device-pixel width or height reaches this bound are never rendered.
pub const MAX_FRAME_SIZE: u32 = 100_000;

/// Default number of rasters kept in a theme's in-memory cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

pub const ENV_RENDER_CACHE: &str = "FRAMESVG_RENDER_CACHE";
pub const ENV_CACHE_ALL: &str = "FRAMESVG_CACHE_ALL";
pub const ENV_MAX_FRAME_SIZE: &str = "FRAMESVG_MAX_FRAME_SIZE";
pub const ENV_CACHE_CAPACITY: &str = "FRAMESVG_CACHE_CAPACITY";
pub const ENV_CACHE_DIR: &str = "FRAMESVG_CACHE_DIR";
pub const ENV_LEAK_CHECK: &str = "FRAMESVG_LEAK_CHECK";

/// Typed frame-engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameConfig {
  /// Write rendered frames and overlays through to the theme cache.
  pub use_rendering_cache: bool,
  /// Initial value of [`FrameSvg::cache_all_rendered_frames`](crate::FrameSvg::cache_all_rendered_frames).
  pub cache_all_rendered_frames: bool,
  /// Pixel bound on generated frame rasters.
  pub max_frame_size: u32,
  /// In-memory theme cache capacity (entries).
  pub cache_capacity: usize,
  /// Optional directory persisting the theme cache across runs.
  pub cache_dir: Option<PathBuf>,
  /// Log a leak report when a registry is dropped with frames still alive.
  pub leak_check: bool,
}

impl Default for FrameConfig {
  fn default() -> Self {
    Self {
      use_rendering_cache: true,
      cache_all_rendered_frames: false,
      max_frame_size: MAX_FRAME_SIZE,
      cache_capacity: DEFAULT_CACHE_CAPACITY,
      cache_dir: None,
      leak_check: false,
    }
  }
}

impl FrameConfig {
  /// Parse all `FRAMESVG_*` environment variables.
  pub fn from_env() -> Self {
    let raw = std::env::vars()
      .filter(|(k, _)| k.starts_with("FRAMESVG_"))
      .collect::<HashMap<_, _>>();
    Self::from_map(&raw)
  }

  /// Construct a config from a provided map of key/value pairs.
  ///
  /// Unset or unparseable values fall back to the defaults.
  pub fn from_map(raw: &HashMap<String, String>) -> Self {
    let defaults = Self::default();
    Self {
      use_rendering_cache: truthy(raw.get(ENV_RENDER_CACHE), defaults.use_rendering_cache),
      cache_all_rendered_frames: truthy(raw.get(ENV_CACHE_ALL), defaults.cache_all_rendered_frames),
      max_frame_size: raw
        .get(ENV_MAX_FRAME_SIZE)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(defaults.max_frame_size),
      cache_capacity: raw
        .get(ENV_CACHE_CAPACITY)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(defaults.cache_capacity),
      cache_dir: raw
        .get(ENV_CACHE_DIR)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from),
      leak_check: truthy(raw.get(ENV_LEAK_CHECK), defaults.leak_check),
    }
  }

  pub fn with_rendering_cache(mut self, enabled: bool) -> Self {
    self.use_rendering_cache = enabled;
    self
  }

  pub fn with_cache_all_rendered_frames(mut self, enabled: bool) -> Self {
    self.cache_all_rendered_frames = enabled;
    self
  }

  pub fn with_max_frame_size(mut self, max: u32) -> Self {
    self.max_frame_size = max;
    self
  }

  pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
    self.cache_capacity = capacity.max(1);
    self
  }

  pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cache_dir = Some(dir.into());
    self
  }
}

fn matches_ignore_case(value: &str, candidates: &[&str]) -> bool {
  let lower = value.trim().to_ascii_lowercase();
  candidates.iter().any(|c| lower == *c)
}

fn truthy(raw: Option<&String>, default: bool) -> bool {
  raw
    .map(|v| !matches_ignore_case(v, &["0", "false", "off"]))
    .unwrap_or(default)
}
