//! Mutable work buffer that layers are painted onto.

use crate::blend::{composite_pixel, BlendFn, BlendMode};
use crate::raster::Raster;
use common::color::Color;
use common::fixed::Opacity;
use common::geometry::{PixelRect, Point, Size};
use rayon::prelude::*;

/// A transparent RGBA canvas owned by a single composition call.
pub struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
    /// Painted area (pixels) from which rows are blended in parallel.
    parallel_threshold: u64,
}

impl Canvas {
    /// A fully transparent canvas.
    pub fn new(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
            data: vec![0; size.area() as usize * 4],
            parallel_threshold: u64::MAX,
        }
    }

    /// Paint rows in parallel once a layer covers at least `pixels` canvas pixels.
    pub fn with_parallel_threshold(mut self, pixels: u64) -> Self {
        self.parallel_threshold = pixels;
        self
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.data[offset..offset + 4];
        Some(Color::rgba(px[0], px[1], px[2], px[3]))
    }

    /// Paint `source` with its top-left corner at `origin`.
    ///
    /// Pixels that fall outside the canvas are dropped. Returns the painted
    /// region, or `None` when nothing was visible.
    pub fn paint(
        &mut self,
        source: &Raster,
        origin: Point,
        opacity: Opacity,
        mode: BlendMode,
    ) -> Option<PixelRect> {
        if opacity.is_transparent() {
            return None;
        }
        let target = PixelRect::from_origin_size(origin, source.size());
        let clip = self.bounds().intersection(&target)?;

        let stride = self.width as usize * 4;
        let blend = mode.formula();
        // Offsets of the clipped region inside the source raster.
        let src_x = (i64::from(clip.x) - i64::from(origin.x)) as usize;
        let src_y = (i64::from(clip.y) - i64::from(origin.y)) as u32;
        let dst_x = clip.x as usize;
        let first_row = clip.y as usize;
        let span = clip.width as usize * 4;

        let paint_row = |(y, row): (usize, &mut [u8])| {
            let src_row = source.row(src_y + (y - first_row) as u32);
            let src = &src_row[src_x * 4..src_x * 4 + span];
            let dst = &mut row[dst_x * 4..dst_x * 4 + span];
            blend_span(dst, src, opacity, blend);
        };

        let rows = clip.height as usize;
        if clip.area() >= self.parallel_threshold {
            tracing::trace!(?clip, "painting rows in parallel");
            self.data
                .par_chunks_mut(stride)
                .enumerate()
                .skip(first_row)
                .take(rows)
                .for_each(paint_row);
        } else {
            self.data
                .chunks_mut(stride)
                .enumerate()
                .skip(first_row)
                .take(rows)
                .for_each(paint_row);
        }

        Some(clip)
    }

    /// Freeze the canvas into an immutable raster.
    pub fn into_raster(self) -> Raster {
        Raster::from_parts(self.width, self.height, self.data)
    }
}

fn blend_span(dst: &mut [u8], src: &[u8], opacity: Opacity, blend: BlendFn) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        composite_pixel(d, s, opacity, blend);
    }
}
