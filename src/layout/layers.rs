//! Initial placement for the 2D layout.
//!
//! Runs once per load, before any physics:
//!
//! 1. **Time rows:** every node gets the dense rank of its time as
//!    `time_index` (and `layer`), and a row y of
//!    `available_height - time_index * time_spacing`.
//! 2. **Samples:** ordered, spread evenly across the padded width and pinned
//!    in x. Samples never move in x afterwards, so each node's
//!    descendant-sample x-range is computed here once and cached.
//! 3. **Layer optimisation:** oldest layer first, non-samples are grouped by
//!    parent (orphans first), groups are ordered by parent x, and nodes are
//!    spread inside their group's share of the width, then clamped to their
//!    descendant-sample range.

use serde::Serialize;
use std::cmp::Ordering;

use crate::config::{ForceLayoutConfig, SampleOrdering};
use crate::graph::{resolve_edges, ArgIndex, GraphEdge, GraphNode, NodeId, ResolvedEdge};

/// A node's working state in the 2D simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimNode {
    pub id: NodeId,
    pub time: f64,
    pub is_sample: bool,
    pub is_combined: bool,
    /// Dense rank of `time` among the unique times.
    pub time_index: u32,
    /// Row of the node; same as `time_index` in 2D.
    pub layer: u32,
    /// Incident edge count.
    pub degree: u32,
    pub x: f64,
    pub y: f64,
    #[serde(skip)]
    pub vx: f64,
    #[serde(skip)]
    pub vy: f64,
    /// Pinned x, overrides the simulation.
    pub fx: Option<f64>,
    /// Pinned y, overrides the simulation.
    pub fy: Option<f64>,
}

/// Vertical placement of time rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rows {
    /// Y of row 0 (the youngest time).
    pub available_height: f64,
    /// Distance between consecutive rows.
    pub spacing: f64,
}

impl Rows {
    /// Y of a time row.
    #[inline]
    pub fn y(&self, time_index: u32) -> f64 {
        self.available_height - time_index as f64 * self.spacing
    }
}

/// Structural facts derived once per load. Indices are slots into the node
/// vector.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Edges with both ends resolved, in input order.
    pub edges: Vec<ResolvedEdge>,
    /// First parent per slot.
    pub parent: Vec<Option<usize>>,
    /// Other children of the first parent, per slot.
    pub siblings: Vec<Vec<usize>>,
    /// Undirected neighbours per slot.
    pub neighbors: Vec<Vec<usize>>,
    /// Sample slots reachable through strictly younger children.
    pub descendant_samples: Vec<Vec<usize>>,
    /// Min/max x of the descendant samples.
    pub ranges: Vec<Option<(f64, f64)>>,
}

impl Topology {
    /// Clamp `x` into a slot's descendant-sample range, if it has one.
    #[inline]
    pub fn clamp_to_range(&self, slot: usize, x: f64) -> f64 {
        match self.ranges[slot] {
            Some((lo, hi)) => x.clamp(lo, hi),
            None => x,
        }
    }
}

/// Output of [`initialize`].
#[derive(Debug, Clone)]
pub struct Layering {
    pub nodes: Vec<SimNode>,
    pub topology: Topology,
    pub rows: Rows,
    pub layer_count: usize,
}

/// Place a node/edge snapshot for simulation.
pub fn initialize(nodes: &[GraphNode], edges: &[GraphEdge], config: &ForceLayoutConfig) -> Layering {
    let index = ArgIndex::new(nodes, edges);
    let rows = Rows {
        available_height: config.available_height(),
        spacing: config.resolved_time_spacing(index.layer_count()),
    };

    let mut sim: Vec<SimNode> = nodes
        .iter()
        .enumerate()
        .map(|(slot, node)| {
            let time_index = index.time_index_at(slot);
            SimNode {
                id: node.id,
                time: node.time,
                is_sample: node.is_sample,
                is_combined: node.is_combined,
                time_index,
                layer: time_index,
                degree: index.degree_at(slot),
                x: config.width / 2.0,
                y: rows.y(time_index),
                vx: 0.0,
                vy: 0.0,
                fx: None,
                fy: None,
            }
        })
        .collect();

    place_samples(&mut sim, nodes, config);

    let descendant_samples: Vec<Vec<usize>> = (0..sim.len())
        .map(|slot| index.descendant_sample_slots(slot))
        .collect();
    let ranges = descendant_samples
        .iter()
        .map(|samples| sample_range(&sim, samples))
        .collect();

    let topology = Topology {
        edges: resolve_edges(edges, index.slots()),
        parent: (0..sim.len()).map(|slot| index.parent_slot(slot)).collect(),
        siblings: (0..sim.len()).map(|slot| index.sibling_slots(slot)).collect(),
        neighbors: (0..sim.len()).map(|slot| index.neighbor_slots(slot)).collect(),
        descendant_samples,
        ranges,
    };

    for (slot, node) in sim.iter_mut().enumerate() {
        if let Some((lo, hi)) = topology.ranges[slot].filter(|_| !node.is_sample) {
            node.x = (lo + hi) / 2.0;
        }
    }
    optimize_layers(&mut sim, &topology, config);

    log::debug!(
        "placed {} nodes on {} rows (spacing {:.1})",
        sim.len(),
        index.layer_count(),
        rows.spacing
    );

    Layering {
        nodes: sim,
        topology,
        rows,
        layer_count: index.layer_count(),
    }
}

/// Sample slots in placement order.
///
/// `OrderPosition` uses the hints only when every sample carries one, since
/// mixing hinted and unhinted comparisons is not a consistent order.
pub fn sample_order(nodes: &[GraphNode], sim: &[SimNode], ordering: SampleOrdering) -> Vec<usize> {
    let mut samples: Vec<usize> = (0..nodes.len()).filter(|&s| nodes[s].is_sample).collect();
    let by_degree = |a: &usize, b: &usize| sim[*b].degree.cmp(&sim[*a].degree);

    match ordering {
        SampleOrdering::OrderPosition => {
            if samples.iter().all(|&s| nodes[s].order_position.is_some()) {
                samples.sort_by_key(|&s| nodes[s].order_position);
            } else {
                samples.sort_by(by_degree);
            }
        }
        SampleOrdering::Degree => samples.sort_by(by_degree),
        SampleOrdering::Numeric => samples.sort_by_key(|&s| nodes[s].id),
    }
    samples
}

fn place_samples(sim: &mut [SimNode], nodes: &[GraphNode], config: &ForceLayoutConfig) {
    let order = sample_order(nodes, sim, config.sample_ordering);
    let left = config.padding;
    let usable = config.width - 2.0 * config.padding;

    for (i, &slot) in order.iter().enumerate() {
        let x = if order.len() == 1 {
            config.width / 2.0
        } else {
            left + usable * i as f64 / (order.len() - 1) as f64
        };
        sim[slot].x = x;
        sim[slot].fx = Some(x);
    }
}

fn sample_range(sim: &[SimNode], samples: &[usize]) -> Option<(f64, f64)> {
    samples.iter().fold(None, |acc, &s| {
        let x = sim[s].x;
        Some(match acc {
            None => (x, x),
            Some((lo, hi)) => (f64::min(lo, x), f64::max(hi, x)),
        })
    })
}

fn optimize_layers(sim: &mut [SimNode], topology: &Topology, config: &ForceLayoutConfig) {
    let Some(top) = sim.iter().map(|n| n.time_index).max() else {
        return;
    };
    let usable = (config.width - 2.0 * config.padding).max(0.0);

    // Oldest first, so parents are settled before their children.
    for layer in (0..=top).rev() {
        let mut groups: Vec<(Option<usize>, Vec<usize>)> = Vec::new();
        for slot in (0..sim.len()).filter(|&s| sim[s].time_index == layer && !sim[s].is_sample) {
            let parent = topology.parent[slot];
            match groups.iter_mut().find(|(key, _)| *key == parent) {
                Some((_, members)) => members.push(slot),
                None => groups.push((parent, vec![slot])),
            }
        }
        if groups.is_empty() {
            continue;
        }

        groups.sort_by(|(a, _), (b, _)| match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(pa), Some(pb)) => sim[*pa].x.total_cmp(&sim[*pb].x),
        });

        let group_width = usable / groups.len() as f64;
        let used = group_width * config.available_width_ratio;
        for (g, (_, members)) in groups.iter_mut().enumerate() {
            members.sort_by(|&a, &b| {
                topology.descendant_samples[b]
                    .len()
                    .cmp(&topology.descendant_samples[a].len())
            });
            let start = config.padding + g as f64 * group_width + (group_width - used) / 2.0;
            let step = used / members.len() as f64;
            for (i, &slot) in members.iter().enumerate() {
                let x = start + (i as f64 + 0.5) * step;
                sim[slot].x = topology.clamp_to_range(slot, x);
            }
        }
    }
}
