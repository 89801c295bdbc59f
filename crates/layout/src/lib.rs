//! Content-sized layout of raster items.
//!
//! A flow places items one after another along a row or column and produces
//! a raster exactly as large as its content. Flow output is commonly fed back
//! into a composition as a layer.

pub mod flow;

pub use flow::{FlowDirection, FlowLayout, FlowLayoutEngine, FlowSpec};
