//! Composition layers and requests.

use crate::anchor::AnchorSpec;
use common::error::{GfxError, GfxResult};
use common::fixed::Opacity;
use common::geometry::{PixelRect, Point, Size};
use indexmap::map::Entry;
use indexmap::IndexMap;
use render::{BlendMode, Raster};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Unique identifier for a layer within one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for LayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declarative layer parameters, as embedded in host node parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerParams {
    pub anchor: AnchorSpec,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub opacity: Opacity,
}

/// A compositing layer: already-rendered content plus how to place and blend it.
#[derive(Clone, Debug)]
pub struct LayerEntry {
    /// Layer content.
    pub image: Arc<Raster>,
    /// Placement.
    pub anchor: AnchorSpec,
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// Opacity applied to the content's alpha.
    pub opacity: Opacity,
}

impl LayerEntry {
    pub fn new(image: impl Into<Arc<Raster>>, anchor: AnchorSpec) -> Self {
        Self {
            image: image.into(),
            anchor,
            blend_mode: BlendMode::Normal,
            opacity: Opacity::OPAQUE,
        }
    }

    pub fn from_params(image: impl Into<Arc<Raster>>, params: LayerParams) -> Self {
        Self {
            image: image.into(),
            anchor: params.anchor,
            blend_mode: params.blend_mode,
            opacity: params.opacity,
        }
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_opacity(mut self, opacity: Opacity) -> Self {
        self.opacity = opacity;
        self
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.image.size()
    }
}

/// Layers keyed by id, plus the ids the caller expects to be present.
#[derive(Clone, Debug, Default)]
pub struct CompositionRequest {
    layers: IndexMap<LayerId, LayerEntry>,
    required: BTreeSet<LayerId>,
}

impl CompositionRequest {
    /// Build a request. An id supplied twice is a configuration error.
    pub fn new<L, R>(layers: L, required: R) -> GfxResult<Self>
    where
        L: IntoIterator<Item = (LayerId, LayerEntry)>,
        R: IntoIterator<Item = LayerId>,
    {
        let mut map = IndexMap::new();
        for (id, entry) in layers {
            match map.entry(id) {
                Entry::Occupied(occupied) => {
                    return Err(GfxError::configuration(format!(
                        "layer id '{}' appears more than once",
                        occupied.key()
                    )));
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(entry);
                }
            }
        }

        Ok(Self {
            layers: map,
            required: required.into_iter().collect(),
        })
    }

    /// Iterate over layers in insertion order.
    pub fn layers(&self) -> impl Iterator<Item = (&LayerId, &LayerEntry)> {
        self.layers.iter()
    }

    pub fn get(&self, id: &str) -> Option<&LayerEntry> {
        self.layers.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    pub fn required(&self) -> &BTreeSet<LayerId> {
        &self.required
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Final placement of one layer. Produced once by placement, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedLayer {
    pub id: LayerId,
    pub origin: Point,
    pub size: Size,
    /// Paint order, 0 for the root.
    pub z: u32,
}

impl ResolvedLayer {
    #[inline]
    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_origin_size(self.origin, self.size)
    }
}
