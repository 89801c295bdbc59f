//! Layer reference graph validation and paint ordering.
//!
//! Layers reference their parents rather than carrying a z-index. The graph
//! must be a single chain hanging off the one absolutely anchored root, which
//! makes the bottom-to-top order unambiguous: root first, then each layer
//! after the layer it references.

use crate::layer::{CompositionRequest, LayerEntry, LayerId};
use common::error::{GfxError, GfxResult};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// A layer with its assigned position in the paint order.
#[derive(Clone, Copy, Debug)]
pub struct OrderedLayer<'a> {
    pub id: &'a LayerId,
    pub entry: &'a LayerEntry,
    pub z: u32,
}

/// Validates the parent-reference topology and linearizes it.
pub struct LayerGraphResolver;

impl LayerGraphResolver {
    /// Return the layers in paint order, root first.
    pub fn resolve(request: &CompositionRequest) -> GfxResult<Vec<OrderedLayer<'_>>> {
        Self::check_required(request)?;
        let root = Self::find_root(request)?;
        let children = Self::collect_children(request)?;

        let mut order = Vec::with_capacity(request.len());
        let mut current = root;
        loop {
            let entry = request
                .get(current.as_str())
                .ok_or_else(|| GfxError::configuration(format!("layer '{current}' vanished")))?;
            order.push(OrderedLayer {
                id: current,
                entry,
                z: order.len() as u32,
            });
            match children.get(current) {
                Some(next) => current = next[0],
                None => break,
            }
        }

        if order.len() < request.len() {
            let reached: HashSet<&LayerId> = order.iter().map(|layer| layer.id).collect();
            return Err(Self::cycle_error(request, &reached));
        }

        tracing::debug!(
            order = ?order.iter().map(|layer| layer.id.as_str()).collect::<Vec<_>>(),
            "resolved paint order"
        );
        Ok(order)
    }

    fn check_required(request: &CompositionRequest) -> GfxResult<()> {
        let required = request.required();
        let missing: Vec<String> = required
            .iter()
            .filter(|id| !request.contains(id.as_str()))
            .map(ToString::to_string)
            .collect();
        let mut unexpected: Vec<String> = request
            .layers()
            .filter(|(id, _)| !required.contains(*id))
            .map(|(id, _)| id.to_string())
            .collect();
        unexpected.sort();

        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(GfxError::MissingLayer {
                missing,
                unexpected,
            })
        }
    }

    fn find_root(request: &CompositionRequest) -> GfxResult<&LayerId> {
        let mut roots: Vec<&LayerId> = request
            .layers()
            .filter(|(_, entry)| entry.anchor.is_absolute())
            .map(|(id, _)| id)
            .collect();
        roots.sort();

        match roots.as_slice() {
            [root] => Ok(*root),
            [] => Err(GfxError::configuration(
                "no layer has an absolute anchor; exactly one root is required",
            )),
            many => Err(GfxError::configuration(format!(
                "multiple layers have absolute anchors: {}",
                many.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
            ))),
        }
    }

    /// Map each referenced parent to the layers that reference it.
    fn collect_children(
        request: &CompositionRequest,
    ) -> GfxResult<BTreeMap<&LayerId, SmallVec<[&LayerId; 1]>>> {
        let mut children: BTreeMap<&LayerId, SmallVec<[&LayerId; 1]>> = BTreeMap::new();
        let mut missing_parent = None;

        for (id, entry) in request.layers() {
            let Some(parent) = entry.anchor.parent() else {
                continue;
            };
            if !request.contains(parent.as_str()) {
                missing_parent.get_or_insert((id, parent));
                continue;
            }
            children.entry(parent).or_default().push(id);
        }

        if let Some((child, parent)) = missing_parent {
            return Err(GfxError::MissingParent {
                child: child.to_string(),
                parent: parent.to_string(),
            });
        }

        if let Some((parent, conflicting)) = children.iter().find(|(_, kids)| kids.len() > 1) {
            let mut names: Vec<String> = conflicting.iter().map(ToString::to_string).collect();
            names.sort();
            return Err(GfxError::AmbiguousZOrder {
                parent: parent.to_string(),
                children: names,
            });
        }

        Ok(children)
    }

    /// Every layer the walk from the root never reached sits on a cycle:
    /// each has exactly one parent and no parent has two children, so
    /// following parents from any of them can only loop.
    fn cycle_error(request: &CompositionRequest, reached: &HashSet<&LayerId>) -> GfxError {
        let start = request
            .layers()
            .map(|(id, _)| id)
            .filter(|id| !reached.contains(id))
            .min();

        let mut cycle = BTreeSet::new();
        let mut current = start;
        while let Some(id) = current {
            if !cycle.insert(id.to_string()) {
                break;
            }
            current = request
                .get(id.as_str())
                .and_then(|entry| entry.anchor.parent());
        }

        GfxError::CyclicReference(cycle.into_iter().collect())
    }
}
