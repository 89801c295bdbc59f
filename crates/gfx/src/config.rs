//! Engine configuration.

use common::error::{GfxError, GfxResult};
use compositor::CompositorSettings;
use serde::{Deserialize, Serialize};

/// Engine configuration.
///
/// Every field has a default, so partial JSON documents load cleanly:
///
/// ```
/// let config = gfx::GfxConfig::from_json(r#"{"compositor": {"max_canvas_pixels": 1048576}}"#).unwrap();
/// assert_eq!(config.compositor.max_canvas_pixels, 1 << 20);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GfxConfig {
    /// Compositor settings. `max_canvas_pixels` also bounds flow output and solids.
    pub compositor: CompositorSettings,
}

impl GfxConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Never paint in parallel. Output is identical either way; this only
    /// keeps work on the calling thread.
    pub fn single_threaded() -> Self {
        Self::new().with_parallel_threshold(u64::MAX)
    }

    /// A configuration for small thumbnails and previews.
    pub fn thumbnail() -> Self {
        Self::single_threaded().with_max_canvas_pixels(1024 * 1024)
    }

    /// Parse a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> GfxResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| GfxError::configuration(format!("invalid engine configuration: {e}")))
    }

    pub fn to_json(&self) -> GfxResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GfxError::configuration(format!("cannot serialize configuration: {e}")))
    }

    /// Set the painted area from which rows are blended in parallel.
    pub fn with_parallel_threshold(mut self, pixels: u64) -> Self {
        self.compositor.parallel_threshold = pixels;
        self
    }

    /// Set the largest raster, in pixels, the engine will allocate.
    pub fn with_max_canvas_pixels(mut self, pixels: u64) -> Self {
        self.compositor.max_canvas_pixels = pixels;
        self
    }

    #[inline]
    pub fn max_canvas_pixels(&self) -> u64 {
        self.compositor.max_canvas_pixels
    }
}
