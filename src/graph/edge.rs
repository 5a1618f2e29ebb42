//! Edge types.
//!
//! Edges always carry raw node ids in the data model. Layout code that needs
//! direct node access derives a `ResolvedEdge` once per setup instead of
//! re-resolving ids on every tick.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::node::NodeId;

/// One inheritance edge, parent (older) → child (younger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Parent node id.
    pub source: NodeId,
    /// Child node id.
    pub target: NodeId,
    /// Left genomic coordinate of the inherited interval.
    #[serde(default)]
    pub left: f64,
    /// Right genomic coordinate of the inherited interval.
    #[serde(default)]
    pub right: f64,
}

impl GraphEdge {
    /// Create an edge with an empty genomic interval.
    pub fn new(source: u32, target: u32) -> Self {
        Self {
            source: NodeId(source),
            target: NodeId(target),
            left: 0.0,
            right: 0.0,
        }
    }
}

/// An edge whose endpoints are slots in a node vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEdge {
    /// Slot of the source node.
    pub source: usize,
    /// Slot of the target node.
    pub target: usize,
}

/// Resolve raw-id edges against a slot lookup.
///
/// Edges with an unknown endpoint are dropped.
pub fn resolve_edges(edges: &[GraphEdge], slots: &HashMap<NodeId, usize>) -> Vec<ResolvedEdge> {
    edges
        .iter()
        .filter_map(|edge| {
            let source = *slots.get(&edge.source)?;
            let target = *slots.get(&edge.target)?;
            Some(ResolvedEdge { source, target })
        })
        .collect()
}
