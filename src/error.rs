//! Error types for framesvg
//!
//! Frame operations themselves rarely fail: degenerate sizes are ignored and
//! missing theme elements simply contribute nothing. Errors surface where the
//! crate touches the outside world:
//! - SVG errors (locating and parsing theme documents)
//! - Render errors (raster allocation, oversized frames)
//! - Theme errors (image resolution, on-disk cache persistence)
//!
//! All errors use the `thiserror` crate.

use thiserror::Error;

/// Result type alias for framesvg operations
///
/// # Examples
///
/// ```
/// use framesvg::Result;
///
/// fn load_theme() -> Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for framesvg
///
/// # Examples
///
/// ```
/// use framesvg::Error;
/// use framesvg::error::SvgError;
///
/// fn load() -> Result<(), Error> {
///     Err(Error::Svg(SvgError::NotFound {
///         path: "widgets/background".to_string(),
///     }))
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
  /// SVG document could not be located or parsed
  #[error("SVG error: {0}")]
  Svg(#[from] SvgError),

  /// Raster allocation or compositing error
  #[error("Render error: {0}")]
  Render(#[from] RenderError),

  /// Theme lookup or theme cache error
  #[error("Theme error: {0}")]
  Theme(#[from] ThemeError),

  /// I/O error
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

/// Errors that occur while loading a themed SVG document
///
/// # Examples
///
/// ```
/// use framesvg::error::SvgError;
///
/// let error = SvgError::Parse {
///     path: "/usr/share/themes/air/widgets/panel-background.svgz".to_string(),
///     reason: "unexpected end of stream".to_string(),
/// };
/// assert!(error.to_string().contains("panel-background"));
/// ```
#[derive(Error, Debug, Clone)]
pub enum SvgError {
  /// No file exists for the requested image path
  #[error("SVG not found: {path}")]
  NotFound { path: String },

  /// The document exists but could not be parsed
  #[error("Failed to parse SVG '{path}': {reason}")]
  Parse { path: String, reason: String },
}

/// Errors that occur during rasterization
#[derive(Error, Debug, Clone)]
pub enum RenderError {
  /// Canvas creation failed
  #[error("Failed to create canvas: {width}x{height}")]
  CanvasCreationFailed { width: u32, height: u32 },

  /// Requested frame exceeds the configured pixel bound
  #[error("Frame {width}x{height} exceeds the maximum frame size of {limit}")]
  FrameTooLarge { width: u32, height: u32, limit: u32 },

  /// Invalid paint parameters
  #[error("Invalid paint parameters: {message}")]
  InvalidParameters { message: String },
}

/// Errors raised by the theme and its pixmap cache
#[derive(Error, Debug, Clone)]
pub enum ThemeError {
  /// The image path does not resolve inside any theme directory
  #[error("Theme has no image '{path}'")]
  UnknownImage { path: String },

  /// The on-disk cache could not be read or written
  #[error("Theme cache I/O failed for '{path}': {reason}")]
  CacheIo { path: String, reason: String },
}
