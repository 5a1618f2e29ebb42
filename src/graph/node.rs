//! Node types.
//!
//! A `GraphNode` is one ARG node as delivered by the upstream converter:
//! - A stable unique identifier
//! - A time (generation/age, non-negative; samples are youngest)
//! - Sample flag and individual reference
//! - Optional spatial location for the 3D scene
//! - Combination bookkeeping when several nodes were folded into one

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable node identifier.
///
/// Matches the upstream tree-sequence node id. It wraps a u32 for efficient
/// storage and WebAssembly interop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Spatial location of a node's individual.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// X coordinate (longitude for geographic data).
    pub x: f64,
    /// Y coordinate (latitude for geographic data).
    pub y: f64,
    /// Optional elevation; only present when non-zero upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

fn no_individual() -> i32 {
    -1
}

/// One ARG node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique id within a snapshot.
    pub id: NodeId,
    /// Node time. Larger is older.
    pub time: f64,
    /// Whether this is an observed sample.
    #[serde(default)]
    pub is_sample: bool,
    /// Individual index, -1 if none.
    #[serde(default = "no_individual")]
    pub individual: i32,
    /// Location of the node's individual, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Externally supplied sample ordering hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_position: Option<u32>,
    /// Log-scaled time, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_time: Option<f64>,
    /// Set on the surviving node of a combination group.
    #[serde(default)]
    pub is_combined: bool,
    /// Original ids folded into this node (survivor first).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub combined_nodes: Vec<NodeId>,
}

impl GraphNode {
    /// Create a plain node with no location or ordering hint.
    pub fn new(id: u32, time: f64, is_sample: bool) -> Self {
        Self {
            id: NodeId(id),
            time,
            is_sample,
            individual: -1,
            location: None,
            order_position: None,
            log_time: None,
            is_combined: false,
            combined_nodes: Vec::new(),
        }
    }

    /// Builder-style location setter.
    pub fn with_location(mut self, x: f64, y: f64) -> Self {
        self.location = Some(Location { x, y, z: None });
        self
    }

    /// Builder-style ordering hint setter.
    pub fn with_order_position(mut self, position: u32) -> Self {
        self.order_position = Some(position);
        self
    }

    /// The node's (x, y) location when both coordinates are finite.
    pub fn spatial_xy(&self) -> Option<(f64, f64)> {
        self.location
            .filter(|loc| loc.x.is_finite() && loc.y.is_finite())
            .map(|loc| (loc.x, loc.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.0, 42);
        assert_eq!(format!("{}", id), "Node(42)");
    }

    #[test]
    fn test_node_id_conversion() {
        let id: NodeId = 123.into();
        let raw: u32 = id.into();
        assert_eq!(raw, 123);
    }

    #[test]
    fn test_node_deserialize_defaults() {
        let node: GraphNode =
            serde_json::from_str(r#"{"id": 7, "time": 1.5, "is_sample": false}"#).unwrap();
        assert_eq!(node.id, NodeId(7));
        assert_eq!(node.individual, -1);
        assert!(node.location.is_none());
        assert!(!node.is_combined);
        assert!(node.combined_nodes.is_empty());
    }

    #[test]
    fn test_node_deserialize_location() {
        let node: GraphNode = serde_json::from_str(
            r#"{"id": 1, "time": 0, "is_sample": true, "individual": 0,
                "location": {"x": 12.5, "y": -3.0}, "order_position": 4}"#,
        )
        .unwrap();
        assert_eq!(node.spatial_xy(), Some((12.5, -3.0)));
        assert_eq!(node.order_position, Some(4));
    }

    #[test]
    fn test_spatial_xy_rejects_non_finite() {
        let node = GraphNode::new(0, 0.0, true).with_location(f64::NAN, 1.0);
        assert_eq!(node.spatial_xy(), None);
    }
}
