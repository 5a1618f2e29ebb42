//! Graph snapshot as delivered by the upstream data service.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::edge::GraphEdge;
use super::node::{GraphNode, NodeId};
use crate::error::LayoutError;
use crate::geo::{CrsDetection, GeographicMode};

/// Snapshot-level metadata. Every field is optional; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphMetadata {
    pub num_nodes: Option<u32>,
    pub num_edges: Option<u32>,
    pub num_samples: Option<u32>,
    pub sequence_length: Option<f64>,
    pub genomic_start: Option<f64>,
    pub genomic_end: Option<f64>,
    pub num_local_trees: Option<u32>,
    pub sample_order: Option<String>,
    pub coordinate_system_detection: Option<CrsDetection>,
    pub suggested_geographic_mode: Option<GeographicMode>,
}

/// Nodes, edges and metadata for one view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub metadata: GraphMetadata,
}

impl GraphData {
    /// Create a snapshot with empty metadata.
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self {
            nodes,
            edges,
            metadata: GraphMetadata::default(),
        }
    }

    /// Check the snapshot invariants: unique ids and edges between known nodes.
    ///
    /// Returns every violation found. An empty vector means the snapshot is
    /// well formed. Callers log these; nothing downstream depends on them.
    pub fn validate(&self) -> Vec<LayoutError> {
        let mut problems = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::with_capacity(self.nodes.len());

        for node in &self.nodes {
            if !seen.insert(node.id) {
                problems.push(LayoutError::DuplicateNode(node.id));
            }
        }

        for edge in &self.edges {
            if !seen.contains(&edge.source) || !seen.contains(&edge.target) {
                problems.push(LayoutError::DanglingEdge {
                    parent: edge.source,
                    child: edge.target,
                });
            }
        }

        problems
    }
}
