//! ArgIndex - traversal view over one node/edge snapshot.
//!
//! The index stores the ARG topology in petgraph's StableGraph, with one graph
//! node per input slot (input order preserved) and the edge's position in the
//! input edge array as its weight. Edges point parent (older) → child
//! (younger), so "descendant" means forward along edges and "ancestor" means
//! backward.
//!
//! Every query is pure and returns an empty set / `None` for unknown ids.

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{Bfs, EdgeRef, IntoEdgeReferences, Reversed};
use petgraph::{Directed, Direction};
use std::collections::{BTreeSet, HashMap};

use super::edge::GraphEdge;
use super::node::{GraphNode, NodeId};
use crate::error::LayoutError;

/// Dense 0-based rank of each time among the unique times, ascending.
///
/// Returns the per-item rank and the sorted unique times. Ties share a rank.
pub fn dense_time_ranks(times: &[f64]) -> (Vec<u32>, Vec<f64>) {
    let mut unique: Vec<f64> = times.to_vec();
    unique.sort_by(|a, b| a.total_cmp(b));
    unique.dedup_by(|a, b| a.total_cmp(b).is_eq());

    let ranks = times
        .iter()
        .map(|t| {
            unique
                .binary_search_by(|u| u.total_cmp(t))
                .map(|i| i as u32)
                .unwrap_or(0)
        })
        .collect();

    (ranks, unique)
}

/// Traversal index over a node/edge snapshot.
pub struct ArgIndex {
    /// Graph nodes carry their input slot, edges their input edge position.
    graph: StableGraph<usize, usize, Directed>,

    /// Map from node id to slot (first occurrence wins).
    slots: HashMap<NodeId, usize>,

    /// Node id per slot.
    ids: Vec<NodeId>,

    /// Time rank per slot.
    time_index: Vec<u32>,

    /// Sample flag per slot.
    samples: Vec<bool>,

    /// Incident edge count per slot.
    degree: Vec<u32>,

    /// Number of distinct times.
    layer_count: usize,
}

impl ArgIndex {
    /// Build the index. Edges referencing unknown ids are skipped.
    pub fn new(nodes: &[GraphNode], edges: &[GraphEdge]) -> Self {
        let mut graph = StableGraph::with_capacity(nodes.len(), edges.len());
        let mut slots = HashMap::with_capacity(nodes.len());

        for (slot, node) in nodes.iter().enumerate() {
            graph.add_node(slot);
            slots.entry(node.id).or_insert(slot);
        }

        let mut degree = vec![0u32; nodes.len()];
        for (position, edge) in edges.iter().enumerate() {
            let (Some(&s), Some(&t)) = (slots.get(&edge.source), slots.get(&edge.target)) else {
                continue;
            };
            graph.add_edge(NodeIndex::new(s), NodeIndex::new(t), position);
            degree[s] += 1;
            if s != t {
                degree[t] += 1;
            }
        }

        let times: Vec<f64> = nodes.iter().map(|n| n.time).collect();
        let (time_index, unique) = dense_time_ranks(&times);

        Self {
            graph,
            slots,
            ids: nodes.iter().map(|n| n.id).collect(),
            time_index,
            samples: nodes.iter().map(|n| n.is_sample).collect(),
            degree,
            layer_count: unique.len(),
        }
    }

    // =========================================================================
    // Slot access
    // =========================================================================

    /// Number of node slots.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the snapshot has no nodes.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of distinct time layers.
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Slot of a node id.
    pub fn slot(&self, id: NodeId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    /// Id to slot lookup, first occurrence of a duplicated id wins.
    pub fn slots(&self) -> &HashMap<NodeId, usize> {
        &self.slots
    }

    /// Node id at a slot.
    pub fn id_at(&self, slot: usize) -> NodeId {
        self.ids[slot]
    }

    /// Time rank at a slot.
    pub fn time_index_at(&self, slot: usize) -> u32 {
        self.time_index[slot]
    }

    /// Sample flag at a slot.
    pub fn is_sample_at(&self, slot: usize) -> bool {
        self.samples[slot]
    }

    /// Time rank of a node.
    pub fn time_index(&self, id: NodeId) -> Option<u32> {
        self.slot(id).map(|s| self.time_index[s])
    }

    /// Number of incident edges (a self-loop counts once).
    pub fn degree(&self, id: NodeId) -> u32 {
        self.slot(id).map(|s| self.degree[s]).unwrap_or(0)
    }

    /// Incident edge count at a slot.
    pub fn degree_at(&self, slot: usize) -> u32 {
        self.degree[slot]
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// A root has at least one outgoing edge and no incoming edge.
    pub fn is_root(&self, id: NodeId) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        let index = NodeIndex::new(slot);
        self.graph
            .edges_directed(index, Direction::Outgoing)
            .next()
            .is_some()
            && self
                .graph
                .edges_directed(index, Direction::Incoming)
                .next()
                .is_none()
    }

    /// Every node reachable forward along edges, excluding the origin.
    pub fn descendants(&self, id: NodeId) -> BTreeSet<NodeId> {
        let Some(slot) = self.slot(id) else {
            return BTreeSet::new();
        };
        let start = NodeIndex::new(slot);
        let mut bfs = Bfs::new(&self.graph, start);
        let mut out = BTreeSet::new();
        while let Some(nx) = bfs.next(&self.graph) {
            if nx != start {
                out.insert(self.ids[nx.index()]);
            }
        }
        out.remove(&id);
        out
    }

    /// Every node reachable backward along edges, excluding the origin.
    pub fn ancestors(&self, id: NodeId) -> BTreeSet<NodeId> {
        let Some(slot) = self.slot(id) else {
            return BTreeSet::new();
        };
        let start = NodeIndex::new(slot);
        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, start);
        let mut out = BTreeSet::new();
        while let Some(nx) = bfs.next(reversed) {
            if nx != start {
                out.insert(self.ids[nx.index()]);
            }
        }
        out.remove(&id);
        out
    }

    /// Sample nodes reachable through strictly younger children.
    pub fn descendant_samples(&self, id: NodeId) -> BTreeSet<NodeId> {
        self.slot(id)
            .map(|slot| {
                self.descendant_sample_slots(slot)
                    .into_iter()
                    .map(|s| self.ids[s])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Slots of the sample nodes reachable through strictly younger children.
    ///
    /// Edges that do not go strictly down in time are not followed, which
    /// keeps anomalous data from pulling unrelated samples into the range.
    pub fn descendant_sample_slots(&self, slot: usize) -> Vec<usize> {
        let mut visited = vec![false; self.ids.len()];
        visited[slot] = true;
        let mut stack = vec![slot];
        let mut found = Vec::new();

        while let Some(current) = stack.pop() {
            let current_rank = self.time_index[current];
            for edge in self
                .graph
                .edges_directed(NodeIndex::new(current), Direction::Outgoing)
            {
                let child = edge.target().index();
                if self.time_index[child] >= current_rank || visited[child] {
                    continue;
                }
                visited[child] = true;
                if self.samples[child] {
                    found.push(child);
                }
                stack.push(child);
            }
        }

        found.sort_unstable();
        found
    }

    /// First parent in edge order: an edge source strictly older than the node.
    ///
    /// Recombination nodes have two parents; only the first is reported.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let slot = self.slot(id)?;
        self.parent_slot(slot).map(|p| self.ids[p])
    }

    /// Slot form of [`ArgIndex::parent`].
    pub fn parent_slot(&self, slot: usize) -> Option<usize> {
        let rank = self.time_index[slot];
        self.graph
            .edges_directed(NodeIndex::new(slot), Direction::Incoming)
            .filter(|edge| self.time_index[edge.source().index()] > rank)
            .min_by_key(|edge| *edge.weight())
            .map(|edge| edge.source().index())
    }

    /// Other children of the node's parent that are younger than the parent.
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        self.slot(id)
            .map(|slot| {
                self.sibling_slots(slot)
                    .into_iter()
                    .map(|s| self.ids[s])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Slot form of [`ArgIndex::siblings`], in edge order.
    pub fn sibling_slots(&self, slot: usize) -> Vec<usize> {
        let Some(parent) = self.parent_slot(slot) else {
            return Vec::new();
        };
        let parent_rank = self.time_index[parent];

        let mut children: Vec<(usize, usize)> = self
            .graph
            .edges_directed(NodeIndex::new(parent), Direction::Outgoing)
            .map(|edge| (*edge.weight(), edge.target().index()))
            .filter(|&(_, child)| child != slot && self.time_index[child] < parent_rank)
            .collect();
        children.sort_unstable();

        let mut out: Vec<usize> = Vec::with_capacity(children.len());
        for (_, child) in children {
            if !out.contains(&child) {
                out.push(child);
            }
        }
        out
    }

    /// Ids of directly connected nodes, ignoring direction and self-loops.
    pub fn connected_ids(&self, id: NodeId) -> BTreeSet<NodeId> {
        self.slot(id)
            .map(|slot| {
                self.neighbor_slots(slot)
                    .into_iter()
                    .map(|s| self.ids[s])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Slots of directly connected nodes, ignoring direction and self-loops.
    pub fn neighbor_slots(&self, slot: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph
            .neighbors_undirected(NodeIndex::new(slot))
            .map(|n| n.index())
            .filter(|&n| n != slot)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Edges whose source is not strictly older than their target.
    pub fn time_direction_violations(&self) -> Vec<LayoutError> {
        let mut edges: Vec<_> = self.graph.edge_references().collect();
        edges.sort_by_key(|edge| *edge.weight());
        edges
            .into_iter()
            .filter(|edge| {
                self.time_index[edge.source().index()] <= self.time_index[edge.target().index()]
            })
            .map(|edge| LayoutError::TimeDirection {
                parent: self.ids[edge.source().index()],
                child: self.ids[edge.target().index()],
            })
            .collect()
    }
}
