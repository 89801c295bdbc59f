//! Deterministic layer compositing and flow layout.
//!
//! This crate is the public surface of the workspace:
//! - [`composite`] turns reference-anchored layers into one raster
//! - [`flow_layout`] lays rasters end to end into a content-sized raster
//! - [`create_solid`] produces single-color rasters
//! - [`resize`] and [`decode`] bring external images to the sizes layers need
//!
//! Output is bit-reproducible: layout arithmetic is exact and every pixel
//! division rounds half to even, so identical inputs give identical bytes
//! (and identical [`Raster::stable_hash`] values) on every machine.
//!
//! ```
//! use gfx::{absolute, relative_pair, Color, LayerEntry, LayerId, Raster, Size};
//!
//! let bg = Raster::solid(Size::new(100, 100), Color::RED).unwrap();
//! let logo = Raster::solid(Size::new(10, 10), Color::BLUE).unwrap();
//! let out = gfx::composite(
//!     [
//!         (LayerId::from("bg"), LayerEntry::new(bg, absolute(0, 0))),
//!         (LayerId::from("logo"), LayerEntry::new(logo, relative_pair("bg", "c,c", 0, 0).unwrap())),
//!     ],
//!     [LayerId::from("bg"), LayerId::from("logo")],
//! )
//! .unwrap();
//! assert_eq!(out.pixel(45, 45), Some(Color::BLUE));
//! assert_eq!(out.pixel(44, 45), Some(Color::RED));
//! ```

pub mod config;
pub mod engine;

pub use config::GfxConfig;
pub use engine::GfxEngine;

pub use common::{Color, Fraction, GfxError, GfxResult, Opacity, PixelRect, Point, Size};
pub use compositor::{
    absolute, relative, relative_pair, Alignment, AnchorSpec, AxisAlign, CompositionRequest,
    CompositorSettings, LayerEntry, LayerId, LayerParams, ResolvedLayer,
};
pub use layout::{FlowDirection, FlowLayout, FlowSpec};
pub use render::{BlendMode, Raster};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Composite layers with the default configuration.
pub fn composite<L, R>(layers: L, required_ids: R) -> GfxResult<Raster>
where
    L: IntoIterator<Item = (LayerId, LayerEntry)>,
    R: IntoIterator<Item = LayerId>,
{
    GfxEngine::with_defaults().composite(layers, required_ids)
}

/// Flow-lay the items with the default configuration.
pub fn flow_layout<T: std::borrow::Borrow<Raster>>(
    items: &[T],
    direction: FlowDirection,
    cross_align: AxisAlign,
    gap: i64,
) -> GfxResult<Raster> {
    GfxEngine::with_defaults().flow_layout(items, FlowSpec::new(direction, cross_align, gap))
}

/// A single-color raster. Both dimensions must be positive.
pub fn create_solid(size: Size, color: Color) -> GfxResult<Raster> {
    GfxEngine::with_defaults().create_solid(size, color)
}

/// Resample a raster with the default configuration.
pub fn resize(raster: &Raster, size: Size) -> GfxResult<Raster> {
    GfxEngine::with_defaults().resize(raster, size)
}

/// Decode PNG, JPEG or WebP bytes with the default configuration.
pub fn decode(bytes: &[u8]) -> GfxResult<Raster> {
    GfxEngine::with_defaults().decode(bytes)
}
