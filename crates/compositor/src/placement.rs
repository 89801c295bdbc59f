//! Absolute pixel placement of ordered layers.

use crate::anchor::AnchorSpec;
use crate::graph::OrderedLayer;
use crate::layer::{LayerId, ResolvedLayer};
use common::error::{GfxError, GfxResult};
use common::fixed::Fraction;
use common::geometry::{Point, Size};
use std::collections::HashMap;

/// Converts the paint order plus anchors into absolute integer origins.
pub struct PlacementEngine;

impl PlacementEngine {
    /// Place every layer. `ordered` must be root first with each layer
    /// after its parent, as produced by the graph resolver.
    pub fn place(ordered: &[OrderedLayer<'_>]) -> GfxResult<Vec<ResolvedLayer>> {
        let Some((root, rest)) = ordered.split_first() else {
            return Err(GfxError::empty_input("no layers to place"));
        };

        let root_layer = Self::place_root(root)?;
        let mut placed: HashMap<&LayerId, (Point, Size)> = HashMap::with_capacity(ordered.len());
        placed.insert(root.id, (root_layer.origin, root_layer.size));

        let mut resolved = Vec::with_capacity(ordered.len());
        resolved.push(root_layer);

        for layer in rest {
            let AnchorSpec::Relative {
                parent,
                self_align,
                parent_align,
                dx,
                dy,
            } = &layer.entry.anchor
            else {
                return Err(GfxError::configuration(format!(
                    "layer '{}' is not the root but has an absolute anchor",
                    layer.id
                )));
            };

            let &(parent_origin, parent_size) = placed.get(parent).ok_or_else(|| {
                GfxError::MissingParent {
                    child: layer.id.to_string(),
                    parent: parent.to_string(),
                }
            })?;

            let size = layer.entry.size();
            let (parent_fx, parent_fy) = parent_align.fractions();
            let (self_fx, self_fy) = self_align.fractions();

            let x = Self::axis_origin(parent_origin.x, parent_fx, parent_size.width, self_fx, size.width, *dx);
            let y = Self::axis_origin(parent_origin.y, parent_fy, parent_size.height, self_fy, size.height, *dy);
            let origin = match (i32::try_from(x), i32::try_from(y)) {
                (Ok(x), Ok(y)) => Point::new(x, y),
                _ => {
                    return Err(GfxError::validation(format!(
                        "layer '{}' resolves to ({x}, {y}), outside the coordinate range",
                        layer.id
                    )))
                }
            };

            tracing::trace!(layer = %layer.id, x = origin.x, y = origin.y, z = layer.z, "placed layer");
            placed.insert(layer.id, (origin, size));
            resolved.push(ResolvedLayer {
                id: layer.id.clone(),
                origin,
                size,
                z: layer.z,
            });
        }

        Ok(resolved)
    }

    fn place_root(root: &OrderedLayer<'_>) -> GfxResult<ResolvedLayer> {
        match root.entry.anchor {
            AnchorSpec::Absolute { x: 0, y: 0 } => {}
            AnchorSpec::Absolute { x, y } => {
                return Err(GfxError::configuration(format!(
                    "root layer '{}' is anchored at ({x}, {y}); the root must sit at (0, 0)",
                    root.id
                )));
            }
            AnchorSpec::Relative { .. } => {
                return Err(GfxError::configuration(format!(
                    "root layer '{}' must have an absolute anchor",
                    root.id
                )));
            }
        }

        let size = root.entry.size();
        if size.is_empty() {
            return Err(GfxError::validation(format!(
                "root layer '{}' has non-positive size {}x{}",
                root.id, size.width, size.height
            )));
        }

        Ok(ResolvedLayer {
            id: root.id.clone(),
            origin: Point::ZERO,
            size,
            z: root.z,
        })
    }

    /// `parent + round(parent_f * parent_extent) - round(self_f * self_extent) + offset`,
    /// computed wide so it never overflows.
    fn axis_origin(
        parent: i32,
        parent_f: Fraction,
        parent_extent: u32,
        self_f: Fraction,
        self_extent: u32,
        offset: i32,
    ) -> i64 {
        i64::from(parent) + parent_f.scale_round(i64::from(parent_extent))
            - self_f.scale_round(i64::from(self_extent))
            + i64::from(offset)
    }
}
