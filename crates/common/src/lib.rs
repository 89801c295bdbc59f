//! Common types shared across the compositing workspace.

pub mod color;
pub mod error;
pub mod fixed;
pub mod geometry;

pub use color::Color;
pub use error::{GfxError, GfxResult};
pub use fixed::{Fraction, Opacity};
pub use geometry::{PixelRect, Point, Size};
