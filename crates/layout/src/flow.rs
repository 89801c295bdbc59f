//! Sequential flow layout.
//!
//! Items are laid end to end along the main axis, separated by a fixed gap,
//! and aligned on the cross axis within the tallest (or widest) item. The
//! output is sized to the content: no container size is involved.

use common::error::{GfxError, GfxResult};
use common::fixed::Opacity;
use common::geometry::{Point, Size};
use compositor::alignment::AxisAlign;
use render::{BlendMode, Canvas, Raster};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Main axis of a flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    /// Left to right.
    #[default]
    Row,
    /// Top to bottom.
    Column,
}

impl FlowDirection {
    /// `(main, cross)` extents of a size along this direction.
    #[inline]
    fn split(self, size: Size) -> (u32, u32) {
        match self {
            FlowDirection::Row => (size.width, size.height),
            FlowDirection::Column => (size.height, size.width),
        }
    }

    #[inline]
    fn point(self, main: i32, cross: i32) -> Point {
        match self {
            FlowDirection::Row => Point::new(main, cross),
            FlowDirection::Column => Point::new(cross, main),
        }
    }

    #[inline]
    fn size(self, main: u32, cross: u32) -> Size {
        match self {
            FlowDirection::Row => Size::new(main, cross),
            FlowDirection::Column => Size::new(cross, main),
        }
    }
}

impl FromStr for FlowDirection {
    type Err = GfxError;

    fn from_str(s: &str) -> GfxResult<Self> {
        match s {
            "row" => Ok(FlowDirection::Row),
            "column" => Ok(FlowDirection::Column),
            other => Err(GfxError::validation(format!(
                "unknown flow direction '{other}', expected 'row' or 'column'"
            ))),
        }
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlowDirection::Row => "row",
            FlowDirection::Column => "column",
        })
    }
}

/// Flow parameters, as embedded in host node parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSpec {
    pub direction: FlowDirection,
    pub cross_align: AxisAlign,
    /// Space between consecutive items. Must not be negative.
    pub gap: i64,
}

impl FlowSpec {
    pub fn new(direction: FlowDirection, cross_align: AxisAlign, gap: i64) -> Self {
        Self {
            direction,
            cross_align,
            gap,
        }
    }

    pub fn row(gap: i64) -> Self {
        Self::new(FlowDirection::Row, AxisAlign::Start, gap)
    }

    pub fn column(gap: i64) -> Self {
        Self::new(FlowDirection::Column, AxisAlign::Start, gap)
    }

    pub fn with_cross_align(mut self, cross_align: AxisAlign) -> Self {
        self.cross_align = cross_align;
        self
    }
}

/// Result of arranging items: the content size and each item's origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowLayout {
    pub size: Size,
    /// Top-left corner of each item, in input order.
    pub placements: Vec<Point>,
}

/// Arranges items along a single axis.
#[derive(Clone, Debug)]
pub struct FlowLayoutEngine {
    spec: FlowSpec,
    max_pixels: u64,
}

impl FlowLayoutEngine {
    pub fn new(spec: FlowSpec) -> Self {
        Self {
            spec,
            max_pixels: u64::MAX,
        }
    }

    /// Reject outputs larger than `pixels`.
    pub fn with_max_pixels(mut self, pixels: u64) -> Self {
        self.max_pixels = pixels;
        self
    }

    pub fn spec(&self) -> &FlowSpec {
        &self.spec
    }

    /// Compute the output size and item origins without painting.
    pub fn arrange(&self, items: &[Size]) -> GfxResult<FlowLayout> {
        let FlowSpec {
            direction,
            cross_align,
            gap,
        } = self.spec;

        if gap < 0 {
            return Err(GfxError::validation(format!("gap must not be negative, got {gap}")));
        }
        if items.is_empty() {
            return Err(GfxError::empty_input("flow layout needs at least one item"));
        }

        let mut main_extent = 0u64;
        let mut cross_extent = 0u32;
        for (index, item) in items.iter().enumerate() {
            let (main, cross) = direction.split(*item);
            if index > 0 {
                main_extent = main_extent.saturating_add(gap.unsigned_abs());
            }
            main_extent = main_extent.saturating_add(u64::from(main));
            cross_extent = cross_extent.max(cross);
        }

        let main_extent = u32::try_from(main_extent)
            .ok()
            .filter(|extent| i32::try_from(*extent).is_ok())
            .ok_or_else(|| {
                GfxError::validation(format!("flow main extent {main_extent} is too large"))
            })?;
        if i32::try_from(cross_extent).is_err() {
            return Err(GfxError::validation(format!(
                "flow cross extent {cross_extent} is too large"
            )));
        }
        let size = direction.size(main_extent, cross_extent);
        if size.is_empty() {
            return Err(GfxError::validation(format!(
                "flow output would be {}x{}; every item is empty along an axis",
                size.width, size.height
            )));
        }
        if size.area() > self.max_pixels {
            return Err(GfxError::validation(format!(
                "flow output {}x{} exceeds the limit of {} pixels",
                size.width, size.height, self.max_pixels
            )));
        }

        let fraction = cross_align.fraction();
        let mut cursor = 0i64;
        let placements = items
            .iter()
            .map(|item| {
                let (main, cross) = direction.split(*item);
                let offset = fraction.scale_round(i64::from(cross_extent - cross));
                // Both fit: cursor never exceeds main_extent, offset never exceeds cross_extent.
                let origin = direction.point(cursor as i32, offset as i32);
                cursor = cursor.saturating_add(i64::from(main)).saturating_add(gap);
                origin
            })
            .collect();

        tracing::debug!(
            %direction,
            width = size.width,
            height = size.height,
            items = items.len(),
            "arranged flow"
        );
        Ok(FlowLayout { size, placements })
    }

    /// Arrange and paint the items into a new raster.
    pub fn render<R: Borrow<Raster>>(&self, items: &[R]) -> GfxResult<Raster> {
        let sizes: Vec<Size> = items.iter().map(|item| item.borrow().size()).collect();
        let layout = self.arrange(&sizes)?;

        let mut canvas = Canvas::new(layout.size);
        for (item, origin) in items.iter().zip(&layout.placements) {
            canvas.paint(item.borrow(), *origin, Opacity::OPAQUE, BlendMode::Normal);
        }
        Ok(canvas.into_raster())
    }
}
