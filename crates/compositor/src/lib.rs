//! Layer compositing.
//!
//! Layers are positioned by reference to one another rather than by global
//! coordinates. The compositor turns that description into a strict paint
//! order and exact pixel origins, then blends the layers bottom to top:
//! - [`graph`] validates the parent references and linearizes them
//! - [`alignment`] maps alignment tokens to exact anchor fractions
//! - [`placement`] resolves absolute integer origins
//! - [`compositor`] paints the placed layers onto a canvas

pub mod alignment;
pub mod anchor;
pub mod compositor;
pub mod graph;
pub mod layer;
pub mod placement;

pub use self::compositor::{Compositor, CompositorSettings, CompositorStats};
pub use alignment::{Alignment, AxisAlign};
pub use anchor::{absolute, relative, relative_pair, AnchorSpec};
pub use graph::{LayerGraphResolver, OrderedLayer};
pub use layer::{CompositionRequest, LayerEntry, LayerId, LayerParams, ResolvedLayer};
pub use placement::PlacementEngine;
