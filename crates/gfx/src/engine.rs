//! The engine: one configured entry point for compositing and flow layout.

use crate::config::GfxConfig;
use common::color::Color;
use common::error::{GfxError, GfxResult};
use common::geometry::Size;
use compositor::{CompositionRequest, Compositor, LayerEntry, LayerId, ResolvedLayer};
use layout::{FlowLayout, FlowLayoutEngine, FlowSpec};
use render::Raster;
use std::borrow::Borrow;

/// Stateless engine. Every call allocates its own buffers and returns a new
/// raster, so one engine can be shared freely across threads.
#[derive(Clone, Debug, Default)]
pub struct GfxEngine {
    config: GfxConfig,
    compositor: Compositor,
}

impl GfxEngine {
    pub fn new(config: GfxConfig) -> Self {
        let compositor = Compositor::with_settings(config.compositor.clone());
        Self { config, compositor }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(GfxConfig::default())
    }

    pub fn config(&self) -> &GfxConfig {
        &self.config
    }

    /// Composite named layers into one raster the size of the root layer.
    ///
    /// `required_ids` must name exactly the layers supplied.
    pub fn composite<L, R>(&self, layers: L, required_ids: R) -> GfxResult<Raster>
    where
        L: IntoIterator<Item = (LayerId, LayerEntry)>,
        R: IntoIterator<Item = LayerId>,
    {
        let request = CompositionRequest::new(layers, required_ids)?;
        self.composite_request(&request)
    }

    pub fn composite_request(&self, request: &CompositionRequest) -> GfxResult<Raster> {
        let raster = self.compositor.composite(request).inspect_err(|err| {
            if err.is_structural() {
                tracing::warn!(layers = request.len(), error = %err, "layer graph rejected");
            } else {
                tracing::debug!(layers = request.len(), error = %err, "composite failed");
            }
        })?;
        tracing::debug!(
            layers = request.len(),
            width = raster.width(),
            height = raster.height(),
            "composite finished"
        );
        Ok(raster)
    }

    /// Resolve paint order and placement without painting.
    pub fn plan(&self, request: &CompositionRequest) -> GfxResult<Vec<ResolvedLayer>> {
        self.compositor.plan(request)
    }

    /// Lay the items out along a row or column and paint them into a
    /// content-sized raster.
    pub fn flow_layout<T: Borrow<Raster>>(&self, items: &[T], spec: FlowSpec) -> GfxResult<Raster> {
        self.flow_engine(spec).render(items)
    }

    /// Compute flow placements for bare sizes, for caller-side painting.
    pub fn arrange(&self, items: &[Size], spec: FlowSpec) -> GfxResult<FlowLayout> {
        self.flow_engine(spec).arrange(items)
    }

    /// A raster filled with one color.
    pub fn create_solid(&self, size: Size, color: Color) -> GfxResult<Raster> {
        self.check_limit("solid", size)?;
        Raster::solid(size, color)
    }

    /// Resample a raster to `size`. The target must be positive and within
    /// the pixel limit.
    pub fn resize(&self, raster: &Raster, size: Size) -> GfxResult<Raster> {
        self.check_limit("resize target", size)?;
        raster.resize(size)
    }

    /// Decode PNG, JPEG or WebP bytes into an RGBA raster within the pixel limit.
    pub fn decode(&self, bytes: &[u8]) -> GfxResult<Raster> {
        let raster = Raster::decode(bytes)?;
        self.check_limit("decoded image", raster.size())?;
        Ok(raster)
    }

    fn check_limit(&self, what: &str, size: Size) -> GfxResult<()> {
        let limit = self.config.max_canvas_pixels();
        if size.area() > limit {
            return Err(GfxError::validation(format!(
                "{what} {}x{} exceeds the limit of {limit} pixels",
                size.width, size.height
            )));
        }
        Ok(())
    }

    fn flow_engine(&self, spec: FlowSpec) -> FlowLayoutEngine {
        FlowLayoutEngine::new(spec).with_max_pixels(self.config.max_canvas_pixels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::fixed::Opacity;
    use common::geometry::Point;
    use compositor::{absolute, relative, relative_pair, AxisAlign};
    use render::BlendMode;

    fn solid(width: u32, height: u32, color: Color) -> Raster {
        Raster::solid(Size::new(width, height), color).unwrap()
    }

    fn ids(names: &[&str]) -> Vec<LayerId> {
        names.iter().map(|name| LayerId::from(*name)).collect()
    }

    #[test]
    fn test_engine_creation() {
        let engine = GfxEngine::with_defaults();
        assert_eq!(engine.config(), &GfxConfig::default());
    }

    #[test]
    fn test_composite_layers() {
        let engine = GfxEngine::with_defaults();
        let raster = engine
            .composite(
                [
                    (LayerId::from("bg"), LayerEntry::new(solid(20, 20, Color::WHITE), absolute(0, 0))),
                    (
                        LayerId::from("mark"),
                        LayerEntry::new(solid(4, 4, Color::BLACK), relative("bg", "e", "e", 0, 0).unwrap()),
                    ),
                ],
                ids(&["bg", "mark"]),
            )
            .unwrap();

        assert_eq!(raster.pixel(15, 15), Some(Color::WHITE));
        assert_eq!(raster.pixel(16, 16), Some(Color::BLACK));
        assert_eq!(raster.pixel(19, 19), Some(Color::BLACK));
    }

    #[test]
    fn test_flow_output_composes_as_layer() {
        let engine = GfxEngine::with_defaults();
        let strip = engine
            .flow_layout(
                &[solid(3, 3, Color::RED), solid(3, 3, Color::GREEN)],
                FlowSpec::row(2),
            )
            .unwrap();
        assert_eq!(strip.size(), Size::new(8, 3));

        let raster = engine
            .composite(
                [
                    (LayerId::from("bg"), LayerEntry::new(solid(10, 5, Color::BLUE), absolute(0, 0))),
                    (
                        LayerId::from("strip"),
                        LayerEntry::new(strip, relative_pair("bg", "c,c", 0, 0).unwrap()),
                    ),
                ],
                ids(&["bg", "strip"]),
            )
            .unwrap();

        // Strip origin is (5 - 4, round(2.5) - round(1.5)) = (1, 0).
        assert_eq!(raster.pixel(0, 0), Some(Color::BLUE));
        assert_eq!(raster.pixel(1, 0), Some(Color::RED));
        assert_eq!(raster.pixel(4, 1), Some(Color::BLUE));
        assert_eq!(raster.pixel(6, 2), Some(Color::GREEN));
        assert_eq!(raster.pixel(9, 3), Some(Color::BLUE));
    }

    #[test]
    fn test_repeated_runs_are_byte_identical() {
        let build = || {
            let engine = GfxEngine::with_defaults();
            engine.composite(
                [
                    (
                        LayerId::from("base"),
                        LayerEntry::new(solid(64, 48, Color::rgb(30, 60, 90)), absolute(0, 0)),
                    ),
                    (
                        LayerId::from("glow"),
                        LayerEntry::new(solid(40, 30, Color::rgba(250, 200, 10, 180)), relative("base", "c", "c", 3, -2).unwrap())
                            .with_blend_mode(BlendMode::Screen)
                            .with_opacity("0.35".parse::<Opacity>().unwrap()),
                    ),
                    (
                        LayerId::from("shade"),
                        LayerEntry::new(solid(16, 16, Color::rgba(0, 0, 0, 128)), relative("glow", "se", "es", 0, 0).unwrap())
                            .with_blend_mode(BlendMode::Overlay),
                    ),
                ],
                ids(&["base", "glow", "shade"]),
            )
        };

        let first = build().unwrap();
        let second = build().unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(first.stable_hash().unwrap(), second.stable_hash().unwrap());
    }

    #[test]
    fn test_parallel_and_serial_agree() {
        let layers = || {
            [
                (LayerId::from("bg"), LayerEntry::new(solid(300, 300, Color::RED), absolute(0, 0))),
                (
                    LayerId::from("fg"),
                    LayerEntry::new(solid(250, 250, Color::rgba(0, 128, 255, 200)), relative("bg", "c", "c", 40, 40).unwrap())
                        .with_blend_mode(BlendMode::Multiply)
                        .with_opacity(Opacity::new(0.75).unwrap()),
                ),
            ]
        };

        let serial = GfxEngine::new(GfxConfig::single_threaded())
            .composite(layers(), ids(&["bg", "fg"]))
            .unwrap();
        let parallel = GfxEngine::new(GfxConfig::new().with_parallel_threshold(1))
            .composite(layers(), ids(&["bg", "fg"]))
            .unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_arrange() {
        let engine = GfxEngine::with_defaults();
        let layout = engine
            .arrange(
                &[Size::new(4, 2), Size::new(2, 6)],
                FlowSpec::column(1).with_cross_align(AxisAlign::End),
            )
            .unwrap();
        assert_eq!(layout.size, Size::new(4, 9));
        assert_eq!(layout.placements, vec![Point::new(0, 0), Point::new(2, 3)]);
    }

    #[test]
    fn test_limits_apply_everywhere() {
        let engine = GfxEngine::new(GfxConfig::new().with_max_canvas_pixels(50));

        assert!(matches!(
            engine.create_solid(Size::new(10, 10), Color::RED),
            Err(GfxError::Validation(_))
        ));
        assert!(matches!(
            engine.flow_layout(&[solid(6, 6, Color::RED), solid(6, 6, Color::RED)], FlowSpec::row(0)),
            Err(GfxError::Validation(_))
        ));
        assert!(matches!(
            engine.composite(
                [(LayerId::from("bg"), LayerEntry::new(solid(10, 10, Color::RED), absolute(0, 0)))],
                ids(&["bg"]),
            ),
            Err(GfxError::Validation(_))
        ));
        assert!(engine.create_solid(Size::new(5, 10), Color::RED).is_ok());

        let big = solid(10, 10, Color::RED);
        assert!(matches!(
            engine.resize(&big, Size::new(8, 8)),
            Err(GfxError::Validation(_))
        ));
        assert!(matches!(
            engine.decode(&big.to_png().unwrap()),
            Err(GfxError::Validation(_))
        ));
        assert_eq!(engine.resize(&big, Size::new(5, 5)).unwrap(), solid(5, 5, Color::RED));
    }

    #[test]
    fn test_structural_errors_are_distinguished() {
        let engine = GfxEngine::with_defaults();
        let cyclic = engine
            .composite(
                [
                    (LayerId::from("bg"), LayerEntry::new(solid(8, 8, Color::WHITE), absolute(0, 0))),
                    (
                        LayerId::from("a"),
                        LayerEntry::new(solid(2, 2, Color::RED), relative("b", "c", "c", 0, 0).unwrap()),
                    ),
                    (
                        LayerId::from("b"),
                        LayerEntry::new(solid(2, 2, Color::BLUE), relative("a", "c", "c", 0, 0).unwrap()),
                    ),
                ],
                ids(&["bg", "a", "b"]),
            )
            .unwrap_err();
        assert!(cyclic.is_structural());

        let limited = GfxEngine::new(GfxConfig::new().with_max_canvas_pixels(10));
        let too_big = limited
            .composite(
                [(LayerId::from("bg"), LayerEntry::new(solid(8, 8, Color::WHITE), absolute(0, 0)))],
                ids(&["bg"]),
            )
            .unwrap_err();
        assert!(!too_big.is_structural());
    }
}
