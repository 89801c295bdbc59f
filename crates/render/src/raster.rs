//! Immutable RGBA rasters.

use common::color::Color;
use common::error::{GfxError, GfxResult};
use common::fixed::div_round_half_even_u128;
use common::geometry::Size;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};
use sha2::{Digest, Sha256};
use std::fmt;

/// An immutable pixel buffer: straight-alpha RGBA8, row-major, 4 bytes per pixel.
///
/// Rasters are produced once and never mutated. Painting happens on a
/// [`Canvas`](crate::canvas::Canvas), which is frozen into a raster at the end.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Wrap raw RGBA bytes. The buffer length must be exactly `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> GfxResult<Self> {
        let expected = u64::from(width) * u64::from(height) * 4;
        if data.len() as u64 != expected {
            return Err(GfxError::validation(format!(
                "raster {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A raster filled with a single color. Both dimensions must be positive.
    pub fn solid(size: Size, color: Color) -> GfxResult<Self> {
        if size.is_empty() {
            return Err(GfxError::validation(format!(
                "solid size must be positive, got {}x{}",
                size.width, size.height
            )));
        }
        let data = color
            .to_array()
            .iter()
            .copied()
            .cycle()
            .take(size.area() as usize * 4)
            .collect();
        Ok(Self {
            width: size.width,
            height: size.height,
            data,
        })
    }

    pub(crate) fn from_parts(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Get pixel at position, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.data[offset..offset + 4];
        Some(Color::rgba(px[0], px[1], px[2], px[3]))
    }

    /// One row of pixels as raw bytes.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 4;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Get as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Encode as canonical PNG: RGBA8, fixed compression and filter, no
    /// ancillary chunks. Identical pixels always yield identical bytes.
    pub fn to_png(&self) -> GfxResult<Vec<u8>> {
        if self.size().is_empty() {
            return Err(GfxError::codec("cannot encode an empty raster"));
        }
        let mut bytes = Vec::new();
        PngEncoder::new_with_quality(&mut bytes, CompressionType::Fast, FilterType::NoFilter)
            .write_image(&self.data, self.width, self.height, ExtendedColorType::Rgba8)
            .map_err(|e| GfxError::codec(e.to_string()))?;
        Ok(bytes)
    }

    /// Decode PNG bytes, normalizing to RGBA8.
    pub fn from_png(bytes: &[u8]) -> GfxResult<Self> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|e| GfxError::codec(e.to_string()))?;
        Ok(Self::from_image(img))
    }

    /// Decode PNG, JPEG or WebP bytes, detecting the format from the
    /// content, and normalize to RGBA8.
    pub fn decode(bytes: &[u8]) -> GfxResult<Self> {
        let format = image::guess_format(bytes).map_err(|e| GfxError::codec(e.to_string()))?;
        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP) {
            return Err(GfxError::codec(format!("unsupported image format {format:?}")));
        }
        let img = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| GfxError::codec(e.to_string()))?;
        let raster = Self::from_image(img);
        tracing::trace!(?format, width = raster.width, height = raster.height, "decoded image");
        Ok(raster)
    }

    fn from_image(img: DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_parts(width, height, rgba.into_raw())
    }

    /// Resample to `size` with an exact box filter.
    ///
    /// Every target pixel averages the source area it covers, weighted by
    /// overlap and by source alpha, so transparent pixels never bleed their
    /// color into neighbours. Enlarging repeats source pixels. All sums are
    /// integers and each channel rounds half to even.
    pub fn resize(&self, size: Size) -> GfxResult<Raster> {
        if size.is_empty() {
            return Err(GfxError::validation(format!(
                "resize target must be positive, got {}x{}",
                size.width, size.height
            )));
        }
        if self.size().is_empty() {
            return Err(GfxError::validation("cannot resize an empty raster"));
        }
        if size == self.size() {
            return Ok(self.clone());
        }

        let columns = axis_weights(self.width, size.width);
        let rows = axis_weights(self.height, size.height);
        // Weights along one target pixel sum to the source extent on that axis.
        let total = u128::from(self.width) * u128::from(self.height);

        let mut data = Vec::with_capacity(size.area() as usize * 4);
        for row in &rows {
            for column in &columns {
                let mut alpha = 0u128;
                let mut channels = [0u128; 3];
                for &(sy, wy) in row {
                    let line = self.row(sy);
                    for &(sx, wx) in column {
                        let px = &line[sx as usize * 4..sx as usize * 4 + 4];
                        let weight = u128::from(wy) * u128::from(wx) * u128::from(px[3]);
                        alpha += weight;
                        for (sum, &value) in channels.iter_mut().zip(px) {
                            *sum += weight * u128::from(value);
                        }
                    }
                }
                if alpha == 0 {
                    data.extend_from_slice(&[0; 4]);
                    continue;
                }
                for sum in channels {
                    data.push(div_round_half_even_u128(sum, alpha) as u8);
                }
                data.push(div_round_half_even_u128(alpha, total) as u8);
            }
        }

        tracing::trace!(
            from_width = self.width,
            from_height = self.height,
            to_width = size.width,
            to_height = size.height,
            "resized raster"
        );
        Ok(Self::from_parts(size.width, size.height, data))
    }

    /// Lowercase hex SHA-256 of the canonical PNG encoding.
    pub fn stable_hash(&self) -> GfxResult<String> {
        let digest = Sha256::digest(self.to_png()?);
        Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
    }
}

/// Overlap of each target pixel with the source pixels along one axis.
///
/// Measured in units where a source pixel spans `target` and a target pixel
/// spans `source`, so all boundaries are whole numbers.
fn axis_weights(source: u32, target: u32) -> Vec<Vec<(u32, u64)>> {
    let (source, target) = (u64::from(source), u64::from(target));
    (0..target)
        .map(|t| {
            let start = t * source;
            let end = start + source;
            (start / target..end.div_ceil(target))
                .map(|s| {
                    let overlap = end.min((s + 1) * target) - start.max(s * target);
                    (s as u32, overlap)
                })
                .collect()
        })
        .collect()
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid() {
        let raster = Raster::solid(Size::new(10, 20), Color::rgba(255, 128, 64, 255)).unwrap();
        assert_eq!(raster.size(), Size::new(10, 20));
        assert_eq!(raster.as_bytes().len(), 10 * 20 * 4);
        assert_eq!(raster.pixel(0, 0), Some(Color::rgba(255, 128, 64, 255)));
        assert_eq!(raster.pixel(9, 19), Some(Color::rgba(255, 128, 64, 255)));
        assert_eq!(raster.pixel(10, 0), None);
    }

    #[test]
    fn test_solid_rejects_empty_size() {
        assert!(matches!(
            Raster::solid(Size::new(0, 5), Color::RED),
            Err(GfxError::Validation(_))
        ));
    }

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(Raster::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            Raster::from_rgba(2, 2, vec![0; 15]),
            Err(GfxError::Validation(_))
        ));
        let empty = Raster::from_rgba(0, 0, Vec::new()).unwrap();
        assert!(empty.size().is_empty());
    }

    #[test]
    fn test_png_round_trip_preserves_pixels() {
        let mut data = Vec::new();
        for i in 0..12u8 {
            data.extend_from_slice(&[i * 20, 255 - i, i, if i % 2 == 0 { 255 } else { 7 }]);
        }
        let raster = Raster::from_rgba(4, 3, data).unwrap();
        let decoded = Raster::from_png(&raster.to_png().unwrap()).unwrap();
        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_decode_sniffs_format() {
        let raster = Raster::solid(Size::new(3, 2), Color::rgba(12, 34, 56, 78)).unwrap();
        let png = raster.to_png().unwrap();
        assert_eq!(Raster::decode(&png).unwrap(), raster);

        let opaque = Raster::solid(Size::new(4, 4), Color::rgb(10, 200, 30)).unwrap();
        let mut webp = Vec::new();
        image::codecs::webp::WebPEncoder::new_lossless(&mut webp)
            .write_image(opaque.as_bytes(), 4, 4, ExtendedColorType::Rgba8)
            .unwrap();
        assert_eq!(Raster::decode(&webp).unwrap(), opaque);

        let rgb: Vec<u8> = [200u8, 100, 50].repeat(64);
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 100)
            .write_image(&rgb, 8, 8, ExtendedColorType::Rgb8)
            .unwrap();
        let decoded = Raster::decode(&jpeg).unwrap();
        assert_eq!(decoded.size(), Size::new(8, 8));
        let px = decoded.pixel(3, 3).unwrap();
        assert_eq!(px.a, 255);
        for (got, want) in [(px.r, 200u8), (px.g, 100), (px.b, 50)] {
            assert!(got.abs_diff(want) <= 4, "{got} too far from {want}");
        }

        assert!(matches!(Raster::decode(b"garbage"), Err(GfxError::Codec(_))));
        assert!(matches!(Raster::decode(&png[..png.len() / 2]), Err(GfxError::Codec(_))));
    }

    #[test]
    fn test_resize_averages_covered_area() {
        let data = [
            [255, 0, 0, 255],
            [0, 0, 255, 255],
            [0, 255, 0, 0],
            [255, 255, 255, 255],
        ]
        .concat();
        let raster = Raster::from_rgba(2, 2, data).unwrap();
        let small = raster.resize(Size::new(1, 1)).unwrap();
        // The transparent pixel contributes to alpha only: 765 / 4 = 191.25.
        assert_eq!(small.pixel(0, 0), Some(Color::rgba(170, 85, 170, 191)));

        // 3 -> 2 splits the middle pixel between both targets.
        let data = [[0, 0, 0, 255], [90, 0, 0, 255], [240, 0, 0, 255]].concat();
        let strip = Raster::from_rgba(3, 1, data).unwrap();
        let narrow = strip.resize(Size::new(2, 1)).unwrap();
        assert_eq!(narrow.pixel(0, 0), Some(Color::rgb(30, 0, 0)));
        assert_eq!(narrow.pixel(1, 0), Some(Color::rgb(190, 0, 0)));
    }

    #[test]
    fn test_resize_enlarge_repeats_pixels() {
        let data = [Color::RED.to_array(), Color::BLUE.to_array()].concat();
        let raster = Raster::from_rgba(2, 1, data).unwrap();
        let wide = raster.resize(Size::new(4, 2)).unwrap();
        assert_eq!(wide.size(), Size::new(4, 2));
        for y in 0..2 {
            assert_eq!(wide.pixel(0, y), Some(Color::RED));
            assert_eq!(wide.pixel(1, y), Some(Color::RED));
            assert_eq!(wide.pixel(2, y), Some(Color::BLUE));
            assert_eq!(wide.pixel(3, y), Some(Color::BLUE));
        }
        assert_eq!(raster.resize(raster.size()).unwrap(), raster);

        let clear = Raster::solid(Size::new(3, 3), Color::TRANSPARENT).unwrap();
        assert_eq!(
            clear.resize(Size::new(2, 2)).unwrap().pixel(1, 1),
            Some(Color::TRANSPARENT)
        );
    }

    #[test]
    fn test_resize_rejects_empty_sizes() {
        let raster = Raster::solid(Size::new(4, 4), Color::RED).unwrap();
        assert!(matches!(
            raster.resize(Size::new(0, 5)),
            Err(GfxError::Validation(_))
        ));
        let empty = Raster::from_rgba(0, 2, Vec::new()).unwrap();
        assert!(matches!(
            empty.resize(Size::new(2, 2)),
            Err(GfxError::Validation(_))
        ));
    }

    #[test]
    fn test_stable_hash() {
        let a = Raster::solid(Size::new(8, 8), Color::RED).unwrap();
        let b = Raster::solid(Size::new(8, 8), Color::RED).unwrap();
        let c = Raster::solid(Size::new(8, 8), Color::BLUE).unwrap();

        let hash = a.stable_hash().unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_eq!(hash, b.stable_hash().unwrap());
        assert_ne!(hash, c.stable_hash().unwrap());
    }

    #[test]
    fn test_codec_errors() {
        assert!(matches!(
            Raster::from_png(b"not a png"),
            Err(GfxError::Codec(_))
        ));
        let empty = Raster::from_rgba(0, 3, Vec::new()).unwrap();
        assert!(matches!(empty.to_png(), Err(GfxError::Codec(_))));
    }
}
