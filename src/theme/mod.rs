//! Visual themes: identity, image lookup, raster cache and change notification.
//!
//! A [`Theme`] resolves logical image paths such as `widgets/background` to SVG
//! files inside its search directories and owns the [`ThemeCache`] of rendered
//! frames. Its [`ThemeId`] changes whenever the theme is switched, which is what
//! partitions every frame cache keyed on it.

mod cache;

pub use cache::ThemeCache;

use crate::config::FrameConfig;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tiny_skia::Pixmap;

/// Theme directory searched when the active theme lacks an image.
pub const FALLBACK_THEME: &str = "default";

const IMAGE_EXTENSIONS: [&str; 2] = ["svgz", "svg"];

static NEXT_THEME_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one loaded visual theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThemeId(u64);

impl ThemeId {
  fn next() -> Self {
    Self(NEXT_THEME_ID.fetch_add(1, Ordering::Relaxed))
  }
}

impl fmt::Display for ThemeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "theme#{}", self.0)
  }
}

/// Called with `(old, new)` identities after a theme switch.
pub type ThemeListener = Arc<dyn Fn(ThemeId, ThemeId) + Send + Sync>;

/// Handle returned by [`Theme::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

struct ThemeState {
  id: ThemeId,
  name: String,
  search_dirs: Vec<PathBuf>,
}

pub struct Theme {
  state: RwLock<ThemeState>,
  cache: Mutex<ThemeCache>,
  cache_root: Option<PathBuf>,
  listeners: Mutex<Vec<(Subscription, ThemeListener)>>,
  next_subscription: AtomicU64,
}

impl fmt::Debug for Theme {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.read();
    f.debug_struct("Theme")
      .field("id", &state.id)
      .field("name", &state.name)
      .field("search_dirs", &state.search_dirs)
      .finish()
  }
}

impl Theme {
  /// Creates a theme named `name`, with cache sizing taken from `config`.
  pub fn new(name: impl Into<String>, config: &FrameConfig) -> Arc<Self> {
    let name = name.into();
    let cache_root = config.cache_dir.clone();
    let disk_dir = cache_root.as_ref().map(|root| root.join(&name));
    Arc::new(Self {
      state: RwLock::new(ThemeState {
        id: ThemeId::next(),
        name,
        search_dirs: Vec::new(),
      }),
      cache: Mutex::new(ThemeCache::new(config.cache_capacity, disk_dir)),
      cache_root,
      listeners: Mutex::new(Vec::new()),
      next_subscription: AtomicU64::new(1),
    })
  }

  pub fn id(&self) -> ThemeId {
    self.state.read().id
  }

  pub fn name(&self) -> String {
    self.state.read().name.clone()
  }

  /// Appends a directory containing `<theme name>/<image path>.svg[z]` trees.
  pub fn add_search_dir(&self, dir: impl Into<PathBuf>) {
    self.state.write().search_dirs.push(dir.into());
  }

  pub fn search_dirs(&self) -> Vec<PathBuf> {
    self.state.read().search_dirs.clone()
  }

  /// Switches to another theme, invalidating cached rasters and notifying listeners.
  ///
  /// Listeners run after the new identity is installed and without any theme lock held.
  pub fn set_theme_name(&self, name: impl Into<String>) {
    let name = name.into();
    let (old, new) = {
      let mut state = self.state.write();
      if state.name == name {
        return;
      }
      let old = state.id;
      state.id = ThemeId::next();
      state.name = name.clone();
      (old, state.id)
    };
    log::debug!("theme switched to '{name}' ({old} -> {new})");

    {
      let mut cache = self.cache.lock();
      cache.invalidate();
      cache.set_disk_dir(self.cache_root.as_ref().map(|root| root.join(&name)));
    }

    let listeners = self
      .listeners
      .lock()
      .iter()
      .map(|(_, listener)| Arc::clone(listener))
      .collect::<Vec<_>>();
    for listener in listeners {
      listener(old, new);
    }
  }

  pub fn subscribe(&self, listener: ThemeListener) -> Subscription {
    let subscription = Subscription(self.next_subscription.fetch_add(1, Ordering::Relaxed));
    self.listeners.lock().push((subscription, listener));
    subscription
  }

  pub fn unsubscribe(&self, subscription: Subscription) {
    self.listeners.lock().retain(|(s, _)| *s != subscription);
  }

  /// Resolves a logical image path to a file.
  ///
  /// Tries the active theme, then [`FALLBACK_THEME`], in every search directory,
  /// preferring `.svgz` over `.svg`. Paths that already name an existing file are
  /// returned as-is.
  pub fn resolve_image_path(&self, image_path: &str) -> Option<PathBuf> {
    if image_path.is_empty() {
      return None;
    }
    let literal = Path::new(image_path);
    if literal.is_absolute() && literal.is_file() {
      return Some(literal.to_path_buf());
    }

    let state = self.state.read();
    let mut themes = vec![state.name.as_str()];
    if state.name != FALLBACK_THEME {
      themes.push(FALLBACK_THEME);
    }
    for theme in themes {
      for dir in &state.search_dirs {
        let base = dir.join(theme).join(image_path);
        for ext in IMAGE_EXTENSIONS {
          let candidate = base.with_extension(ext);
          if candidate.is_file() {
            return Some(candidate);
          }
        }
        if base.is_file() {
          return Some(base);
        }
      }
    }

    if literal.is_file() {
      return Some(literal.to_path_buf());
    }
    None
  }

  pub fn find_in_cache(&self, key: &str) -> Option<Arc<Pixmap>> {
    self.cache.lock().find(key)
  }

  pub fn insert_into_cache(&self, key: &str, pixmap: Arc<Pixmap>, disambiguator: &str) {
    self.cache.lock().insert(key, pixmap, disambiguator);
  }

  pub fn invalidate_cache(&self) {
    self.cache.lock().invalidate();
  }

  pub fn cache_len(&self) -> usize {
    self.cache.lock().len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::AtomicUsize;

  #[test]
  fn switching_changes_identity_and_notifies() {
    let theme = Theme::new("air", &FrameConfig::default());
    let before = theme.id();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let sub = theme.subscribe(Arc::new(move |old, new| {
      assert_ne!(old, new);
      seen.fetch_add(1, Ordering::SeqCst);
    }));

    theme.set_theme_name("air");
    assert_eq!(theme.id(), before);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    theme.set_theme_name("oxygen");
    assert_ne!(theme.id(), before);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    theme.unsubscribe(sub);
    theme.set_theme_name("breeze");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn switching_invalidates_cache() {
    let theme = Theme::new("air", &FrameConfig::default());
    let pixmap = Arc::new(Pixmap::new(2, 2).expect("pixmap"));
    theme.insert_into_cache("key", pixmap, "slot");
    assert_eq!(theme.cache_len(), 1);
    theme.set_theme_name("oxygen");
    assert_eq!(theme.cache_len(), 0);
  }

  #[test]
  fn resolves_images_with_fallback_theme() {
    let dir = tempfile::tempdir().expect("tempdir");
    let widgets = dir.path().join("default").join("widgets");
    std::fs::create_dir_all(&widgets).expect("mkdir");
    std::fs::write(widgets.join("background.svg"), "<svg/>").expect("write");

    let theme = Theme::new("air", &FrameConfig::default());
    theme.add_search_dir(dir.path());
    let resolved = theme.resolve_image_path("widgets/background").expect("resolved");
    assert!(resolved.ends_with("default/widgets/background.svg"));
    assert!(theme.resolve_image_path("widgets/missing").is_none());
    assert!(theme.resolve_image_path("").is_none());
  }

  #[test]
  fn prefers_active_theme_and_svgz() {
    let dir = tempfile::tempdir().expect("tempdir");
    for theme in ["air", "default"] {
      let widgets = dir.path().join(theme).join("widgets");
      std::fs::create_dir_all(&widgets).expect("mkdir");
      std::fs::write(widgets.join("panel.svg"), "<svg/>").expect("write");
    }
    std::fs::write(dir.path().join("air/widgets/panel.svgz"), b"\x1f\x8b").expect("write");

    let theme = Theme::new("air", &FrameConfig::default());
    theme.add_search_dir(dir.path());
    let resolved = theme.resolve_image_path("widgets/panel").expect("resolved");
    assert!(resolved.ends_with("air/widgets/panel.svgz"));
  }
}
