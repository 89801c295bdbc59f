//! Anchor specifications for layer positioning.

use crate::alignment::{parse_pair, Alignment};
use crate::layer::LayerId;
use common::error::GfxResult;
use serde::{Deserialize, Serialize};

/// How a layer is positioned: at absolute canvas coordinates, or relative to
/// another layer's resolved placement.
///
/// Serializes as `{"type": "absolute", "x": .., "y": ..}` or
/// `{"type": "relative", "parent": .., "self_align": .., "parent_align": .., "dx": .., "dy": ..}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnchorSpec {
    Absolute {
        x: i32,
        y: i32,
    },
    Relative {
        parent: LayerId,
        self_align: Alignment,
        parent_align: Alignment,
        #[serde(default)]
        dx: i32,
        #[serde(default)]
        dy: i32,
    },
}

impl AnchorSpec {
    #[inline]
    pub fn is_absolute(&self) -> bool {
        matches!(self, AnchorSpec::Absolute { .. })
    }

    /// The referenced parent, for relative anchors.
    pub fn parent(&self) -> Option<&LayerId> {
        match self {
            AnchorSpec::Absolute { .. } => None,
            AnchorSpec::Relative { parent, .. } => Some(parent),
        }
    }
}

/// Anchor a layer at absolute canvas coordinates.
pub fn absolute(x: i32, y: i32) -> AnchorSpec {
    AnchorSpec::Absolute { x, y }
}

/// Anchor a layer so that its `self_align` point lands on the parent's
/// `parent_align` point, shifted by `(dx, dy)`.
pub fn relative(
    parent: impl Into<LayerId>,
    self_align: &str,
    parent_align: &str,
    dx: i32,
    dy: i32,
) -> GfxResult<AnchorSpec> {
    Ok(AnchorSpec::Relative {
        parent: parent.into(),
        self_align: Alignment::parse(self_align)?,
        parent_align: Alignment::parse(parent_align)?,
        dx,
        dy,
    })
}

/// Like [`relative`], taking a combined `"self,parent"` alignment string.
pub fn relative_pair(
    parent: impl Into<LayerId>,
    align: &str,
    dx: i32,
    dy: i32,
) -> GfxResult<AnchorSpec> {
    let (self_align, parent_align) = parse_pair(align)?;
    Ok(AnchorSpec::Relative {
        parent: parent.into(),
        self_align,
        parent_align,
        dx,
        dy,
    })
}
