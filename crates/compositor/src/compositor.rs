//! Main compositor implementation.

use crate::graph::LayerGraphResolver;
use crate::layer::{CompositionRequest, ResolvedLayer};
use crate::placement::PlacementEngine;
use common::error::{GfxError, GfxResult};
use render::{Canvas, Raster};
use serde::{Deserialize, Serialize};

/// Compositor settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorSettings {
    /// Painted area, in pixels, from which a layer's rows are blended in parallel.
    pub parallel_threshold: u64,
    /// Largest canvas, in pixels, the compositor will allocate.
    pub max_canvas_pixels: u64,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            parallel_threshold: 1 << 16,
            max_canvas_pixels: 1 << 28,
        }
    }
}

/// Compositor statistics for the last composition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompositorStats {
    /// Number of layers in the request.
    pub layers: u32,
    /// Layers that touched at least one canvas pixel.
    pub layers_painted: u32,
    /// Sum of the clipped areas painted.
    pub pixels_painted: u64,
}

/// The compositor validates a request, places its layers and paints them
/// bottom to top onto a canvas the size of the root layer.
#[derive(Clone, Debug, Default)]
pub struct Compositor {
    settings: CompositorSettings,
}

impl Compositor {
    /// Create a compositor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: CompositorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CompositorSettings {
        &self.settings
    }

    /// Validate the request and resolve every layer's placement, without painting.
    pub fn plan(&self, request: &CompositionRequest) -> GfxResult<Vec<ResolvedLayer>> {
        let ordered = LayerGraphResolver::resolve(request)?;
        let placed = PlacementEngine::place(&ordered)?;

        if let Some(root) = placed.first() {
            let area = root.size.area();
            if area > self.settings.max_canvas_pixels {
                return Err(GfxError::validation(format!(
                    "canvas {}x{} exceeds the limit of {} pixels",
                    root.size.width, root.size.height, self.settings.max_canvas_pixels
                )));
            }
        }

        Ok(placed)
    }

    /// Composite the request into a single raster.
    pub fn composite(&self, request: &CompositionRequest) -> GfxResult<Raster> {
        self.composite_with_stats(request).map(|(raster, _)| raster)
    }

    /// Composite the request, also reporting what was painted.
    pub fn composite_with_stats(
        &self,
        request: &CompositionRequest,
    ) -> GfxResult<(Raster, CompositorStats)> {
        let placed = self.plan(request)?;
        let root = placed
            .first()
            .ok_or_else(|| GfxError::empty_input("composition has no layers"))?;

        let mut canvas =
            Canvas::new(root.size).with_parallel_threshold(self.settings.parallel_threshold);
        let mut stats = CompositorStats {
            layers: placed.len() as u32,
            ..Default::default()
        };

        tracing::debug!(
            width = root.size.width,
            height = root.size.height,
            layers = placed.len(),
            "compositing"
        );

        for layer in &placed {
            let entry = request.get(layer.id.as_str()).ok_or_else(|| {
                GfxError::configuration(format!("layer '{}' has no entry", layer.id))
            })?;
            if entry.opacity.is_transparent() {
                tracing::trace!(layer = %layer.id, "skipping fully transparent layer");
                continue;
            }

            if let Some(painted) =
                canvas.paint(&entry.image, layer.origin, entry.opacity, entry.blend_mode)
            {
                stats.layers_painted += 1;
                stats.pixels_painted += painted.area();
            } else {
                tracing::trace!(layer = %layer.id, "layer lies entirely off canvas");
            }
        }

        tracing::debug!(
            painted = stats.layers_painted,
            pixels = stats.pixels_painted,
            "composition finished"
        );
        Ok((canvas.into_raster(), stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{absolute, relative, relative_pair};
    use crate::layer::{LayerEntry, LayerId};
    use common::color::Color;
    use common::fixed::Opacity;
    use common::geometry::{Point, Size};
    use render::BlendMode;

    fn solid(width: u32, height: u32, color: Color) -> Raster {
        Raster::solid(Size::new(width, height), color).unwrap()
    }

    fn request(layers: Vec<(&str, LayerEntry)>) -> CompositionRequest {
        let required: Vec<LayerId> = layers.iter().map(|(id, _)| LayerId::from(*id)).collect();
        CompositionRequest::new(
            layers.into_iter().map(|(id, entry)| (LayerId::from(id), entry)),
            required,
        )
        .unwrap()
    }

    fn red_with_blue_center() -> CompositionRequest {
        request(vec![
            ("bg", LayerEntry::new(solid(100, 100, Color::RED), absolute(0, 0))),
            (
                "logo",
                LayerEntry::new(
                    solid(10, 10, Color::BLUE),
                    relative_pair("bg", "c,c", 0, 0).unwrap(),
                ),
            ),
        ])
    }

    #[test]
    fn test_plan() {
        let placed = Compositor::new().plan(&red_with_blue_center()).unwrap();
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[1].id, LayerId::from("logo"));
        assert_eq!(placed[1].origin, Point::new(45, 45));
    }

    #[test]
    fn test_two_layer_composite() {
        let (raster, stats) = Compositor::new()
            .composite_with_stats(&red_with_blue_center())
            .unwrap();

        assert_eq!(raster.size(), Size::new(100, 100));
        for y in 0..100 {
            for x in 0..100 {
                let inside = (45..55).contains(&x) && (45..55).contains(&y);
                let expected = if inside { Color::BLUE } else { Color::RED };
                assert_eq!(raster.pixel(x, y), Some(expected), "pixel ({x}, {y})");
            }
        }
        assert_eq!(stats.layers_painted, 2);
        assert_eq!(stats.pixels_painted, 10_000 + 100);
    }

    #[test]
    fn test_half_opacity_is_reproducible() {
        let build = || {
            request(vec![
                ("bg", LayerEntry::new(solid(4, 4, Color::RED), absolute(0, 0))),
                (
                    "fg",
                    LayerEntry::new(solid(4, 4, Color::rgb(0, 0, 200)), relative("bg", "s", "s", 0, 0).unwrap())
                        .with_opacity(Opacity::new(0.5).unwrap()),
                ),
            ])
        };

        let first = Compositor::new().composite(&build()).unwrap();
        let second = Compositor::new().composite(&build()).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
        // Effective alpha 128/255: red keeps 255 * 127/255, blue gets 200 * 128/255.
        assert_eq!(first.pixel(0, 0), Some(Color::rgba(127, 0, 100, 255)));
    }

    #[test]
    fn test_blend_mode_is_applied() {
        let request = request(vec![
            ("bg", LayerEntry::new(solid(2, 2, Color::rgb(200, 100, 0)), absolute(0, 0))),
            (
                "fg",
                LayerEntry::new(solid(2, 2, Color::rgb(100, 100, 100)), relative("bg", "s", "s", 0, 0).unwrap())
                    .with_blend_mode(BlendMode::Multiply),
            ),
        ]);
        let raster = Compositor::new().composite(&request).unwrap();
        // 200*100/255 = 78.43 -> 78; 100*100/255 = 39.2 -> 39.
        assert_eq!(raster.pixel(1, 1), Some(Color::rgb(78, 39, 0)));
    }

    #[test]
    fn test_clipping_and_transparent_layers() {
        let request = request(vec![
            ("bg", LayerEntry::new(solid(10, 10, Color::WHITE), absolute(0, 0))),
            (
                "ghost",
                LayerEntry::new(solid(10, 10, Color::BLACK), relative("bg", "s", "s", 0, 0).unwrap())
                    .with_opacity(Opacity::TRANSPARENT),
            ),
            (
                "edge",
                LayerEntry::new(solid(4, 4, Color::BLUE), relative("ghost", "s", "e", -2, -2).unwrap()),
            ),
        ]);
        let (raster, stats) = Compositor::new().composite_with_stats(&request).unwrap();

        assert_eq!(raster.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(raster.pixel(8, 8), Some(Color::BLUE));
        assert_eq!(raster.pixel(9, 9), Some(Color::BLUE));
        assert_eq!(raster.pixel(7, 7), Some(Color::WHITE));
        assert_eq!(stats.layers_painted, 2);
        assert_eq!(stats.pixels_painted, 100 + 4);
    }

    #[test]
    fn test_parallel_threshold_does_not_change_output() {
        let serial = Compositor::with_settings(CompositorSettings {
            parallel_threshold: u64::MAX,
            ..Default::default()
        });
        let parallel = Compositor::with_settings(CompositorSettings {
            parallel_threshold: 1,
            ..Default::default()
        });
        let request = red_with_blue_center();
        assert_eq!(
            serial.composite(&request).unwrap().as_bytes(),
            parallel.composite(&request).unwrap().as_bytes()
        );
    }

    #[test]
    fn test_canvas_limit() {
        let compositor = Compositor::with_settings(CompositorSettings {
            max_canvas_pixels: 99,
            ..Default::default()
        });
        assert!(matches!(
            compositor.composite(&red_with_blue_center()),
            Err(GfxError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_root_is_rejected() {
        let request = request(vec![(
            "bg",
            LayerEntry::new(
                Raster::from_rgba(0, 5, Vec::new()).unwrap(),
                absolute(0, 0),
            ),
        )]);
        assert!(matches!(
            Compositor::new().composite(&request),
            Err(GfxError::Validation(_))
        ));
    }

    #[test]
    fn test_settings_serde_defaults() {
        let settings: CompositorSettings =
            serde_json::from_str(r#"{"parallel_threshold": 42}"#).unwrap();
        assert_eq!(settings.parallel_threshold, 42);
        assert_eq!(settings.max_canvas_pixels, CompositorSettings::default().max_canvas_pixels);
    }
}
