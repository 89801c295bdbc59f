//! Pixel-level rendering for the compositor.
//!
//! This crate handles:
//! - Immutable RGBA rasters and the mutable canvas they are painted onto
//! - Blend-mode formulas and source-over alpha compositing
//! - Canonical PNG encoding and content hashing
//! - Format-sniffing decoding and exact box-filter resizing

pub mod blend;
pub mod canvas;
pub mod raster;

pub use blend::BlendMode;
pub use canvas::Canvas;
pub use raster::Raster;
