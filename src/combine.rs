//! Node combination: fold non-sample nodes that look identical.
//!
//! Two non-sample nodes are identical when they share a time and the same set
//! of directly connected node ids (direction ignored). Each group collapses
//! into its first node in input order, which keeps the surviving id stable
//! across re-renders. Samples are never merged.

use std::collections::{BTreeSet, HashMap};

use crate::graph::{ArgIndex, GraphData, GraphEdge, GraphNode, NodeId};

/// Output of [`combine`]: fresh node and edge vectors plus the id mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Surviving id for every original id.
    pub id_map: HashMap<NodeId, NodeId>,
}

impl CombinedGraph {
    /// The id an original node is drawn as, if it survived at all.
    pub fn surviving_id(&self, original: NodeId) -> Option<NodeId> {
        self.id_map.get(&original).copied()
    }

    /// Number of original nodes folded away.
    pub fn folded_count(&self) -> usize {
        self.id_map.len().saturating_sub(self.nodes.len())
    }

    /// Package as a snapshot carrying the given metadata.
    pub fn into_graph_data(self, metadata: crate::graph::GraphMetadata) -> GraphData {
        GraphData {
            nodes: self.nodes,
            edges: self.edges,
            metadata,
        }
    }
}

/// Combine identical non-sample nodes. The input is never modified.
///
/// Single left-to-right pass. Members of a group share every neighbour, so
/// folding them cannot make two other neighbour sets equal: running this on
/// its own output changes nothing.
pub fn combine(nodes: &[GraphNode], edges: &[GraphEdge]) -> CombinedGraph {
    let index = ArgIndex::new(nodes, edges);
    let neighbor_sets: Vec<BTreeSet<NodeId>> = (0..nodes.len())
        .map(|slot| {
            index
                .neighbor_slots(slot)
                .into_iter()
                .map(|s| index.id_at(s))
                .collect()
        })
        .collect();

    let mut processed = vec![false; nodes.len()];
    let mut out_nodes = Vec::with_capacity(nodes.len());
    let mut id_map: HashMap<NodeId, NodeId> = HashMap::with_capacity(nodes.len());

    for i in 0..nodes.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;
        let node = &nodes[i];

        if node.is_sample {
            out_nodes.push(node.clone());
            id_map.insert(node.id, node.id);
            continue;
        }

        let mut group = vec![i];
        for j in (i + 1)..nodes.len() {
            if processed[j] || nodes[j].is_sample {
                continue;
            }
            if nodes[j].time == node.time && neighbor_sets[j] == neighbor_sets[i] {
                processed[j] = true;
                group.push(j);
            }
        }

        if group.len() == 1 {
            out_nodes.push(node.clone());
        } else {
            let mut survivor = node.clone();
            survivor.is_combined = true;
            survivor.combined_nodes = group.iter().map(|&g| nodes[g].id).collect();
            out_nodes.push(survivor);
        }

        for &g in &group {
            id_map.insert(nodes[g].id, node.id);
        }
    }

    let out_edges = remap_edges(edges, &id_map);
    if out_nodes.len() < nodes.len() {
        log::debug!(
            "combined {} nodes into {}, {} edges into {}",
            nodes.len(),
            out_nodes.len(),
            edges.len(),
            out_edges.len()
        );
    }

    CombinedGraph {
        nodes: out_nodes,
        edges: out_edges,
        id_map,
    }
}

/// Re-point edges at surviving ids.
///
/// Edges with an unmapped endpoint are dropped. A remapped pair is emitted
/// once per original pair: parallel edges over separate genomic intervals
/// survive, while copies that only exist because two endpoints were folded
/// together are dropped.
fn remap_edges(edges: &[GraphEdge], id_map: &HashMap<NodeId, NodeId>) -> Vec<GraphEdge> {
    let mut origin: HashMap<(NodeId, NodeId), (NodeId, NodeId)> = HashMap::with_capacity(edges.len());
    edges
        .iter()
        .filter_map(|edge| {
            let source = *id_map.get(&edge.source)?;
            let target = *id_map.get(&edge.target)?;
            let first = *origin
                .entry((source, target))
                .or_insert((edge.source, edge.target));
            if first != (edge.source, edge.target) {
                return None;
            }
            Some(GraphEdge {
                source,
                target,
                ..edge.clone()
            })
        })
        .collect()
}
