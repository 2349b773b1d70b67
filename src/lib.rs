//! Themed nine-slice frames rendered from SVG, shared between consumers.
//!
//! A theme image names up to nine elements per prefix (corners, borders and a
//! center). [`FrameSvg`] slices them into a raster of any size, with margins
//! derived from the element sizes and optional `hint-*` elements. Consumers
//! attached to the same [`FrameRegistry`] that ask for an identical
//! configuration share one frame record and one rendered raster.
//!
//! ```no_run
//! use framesvg::{FrameConfig, FrameRegistry, FrameSvg, MarginEdge, Size, Theme};
//!
//! let config = FrameConfig::from_env();
//! let theme = Theme::new("breeze", &config);
//! theme.add_search_dir("/usr/share/plasma/desktoptheme/breeze");
//! let registry = FrameRegistry::new(theme, config);
//!
//! let mut panel = FrameSvg::new(&registry);
//! panel.set_image_path("widgets/panel-background")?;
//! panel.set_element_prefix("north");
//! panel.resize_frame(Size::new(800.0, 36.0));
//! let _inset = panel.margin_size(MarginEdge::Bottom);
//! let _raster = panel.frame_pixmap();
//! # Ok::<(), framesvg::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub(crate) mod paint;
pub mod svg;
pub mod theme;

pub use config::FrameConfig;
pub use error::{Error, Result};
pub use frame::{
  border_to_element_id, cache_id, section_rect, ConsumerId, EnabledBorders, FrameEvent, FrameId,
  FrameInfo, FrameRegistry, FrameSvg, LeakReport, Location, MarginEdge, RegistryStats,
};
pub use geometry::{Margins, PixelRect, PixelSize, Point, Rect, Size};
pub use svg::{SvgImage, VectorImageSource};
pub use theme::{Theme, ThemeCache, ThemeId};
