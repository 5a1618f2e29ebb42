//! The 2D simulation context.
//!
//! The caller owns a [`Simulation`] and drives it one [`Simulation::tick`] per
//! animation frame. Every load bumps the [`Generation`]; ticks and frames
//! carry the [`TickToken`] handed out by that load, and a token from an older
//! load is rejected without touching any state. This replaces closures that
//! capture node arrays and may outlive the dataset they were built for.
//!
//! Lifecycle: `Idle → Initializing → Simulating → Settled`, and `TornDown`
//! from any phase.

use serde::Serialize;
use std::collections::HashMap;

use crate::config::ForceLayoutConfig;
use crate::graph::{ArgIndex, GraphEdge, GraphNode, NodeId};
use crate::spatial::SpatialIndex;

use super::forces::{self, Jiggle, LinkForce};
use super::layers::{self, Rows, SimNode, Topology};

/// Where a simulation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SimulationPhase {
    Idle,
    Initializing,
    Simulating,
    Settled,
    TornDown,
}

impl SimulationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Simulating => "simulating",
            Self::Settled => "settled",
            Self::TornDown => "tornDown",
        }
    }
}

/// Load counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u32);

/// Proof that a caller holds the current dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken {
    generation: Generation,
}

impl TickToken {
    /// Rebuild a token from its raw generation (the JS side holds a number).
    pub fn from_raw(raw: u32) -> Self {
        Self {
            generation: Generation(raw),
        }
    }

    pub fn raw(self) -> u32 {
        self.generation.0
    }

    pub fn generation(self) -> Generation {
        self.generation
    }
}

/// Result of one [`Simulation::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Positions moved; keep ticking.
    Advanced,
    /// Alpha is below the stop threshold; nothing moved.
    Settled,
    /// The token belongs to an older load; nothing moved.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameNode {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameLabel {
    pub id: NodeId,
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Screen geometry for one rendered frame. Node y is always the time row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameGeometry {
    pub nodes: Vec<FrameNode>,
    pub edges: Vec<FrameEdge>,
    pub labels: Vec<FrameLabel>,
}

/// Constrained force simulation over one ARG snapshot.
pub struct Simulation {
    pub(super) config: ForceLayoutConfig,
    generation: Generation,
    pub(super) phase: SimulationPhase,
    /// Input nodes, kept for event payloads.
    pub(super) source: Vec<GraphNode>,
    /// Input edges that resolved, aligned with `topology.edges`.
    source_edges: Vec<GraphEdge>,
    pub(super) nodes: Vec<SimNode>,
    pub(super) topology: Topology,
    pub(super) rows: Rows,
    links: LinkForce,
    slots: HashMap<NodeId, usize>,
    pub(super) alpha: f64,
    tick_count: u64,
    jiggle: Jiggle,
    /// Node positions as last rendered, for hit testing.
    pub(super) hit_index: SpatialIndex,
}

impl Simulation {
    pub fn new(config: ForceLayoutConfig) -> Self {
        Self {
            config,
            generation: Generation::default(),
            phase: SimulationPhase::Idle,
            source: Vec::new(),
            source_edges: Vec::new(),
            nodes: Vec::new(),
            topology: Topology::default(),
            rows: Rows {
                available_height: 0.0,
                spacing: 0.0,
            },
            links: LinkForce::default(),
            slots: HashMap::new(),
            alpha: 0.0,
            tick_count: 0,
            jiggle: Jiggle::new(0),
            hit_index: SpatialIndex::new(),
        }
    }

    /// Replace the dataset and restart from fresh initial placement.
    ///
    /// Invalidates every token handed out before.
    pub fn load(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]) -> TickToken {
        self.generation = Generation(self.generation.0.wrapping_add(1));
        self.phase = SimulationPhase::Initializing;

        for violation in ArgIndex::new(nodes, edges).time_direction_violations() {
            log::warn!("{violation}");
        }

        let layering = layers::initialize(nodes, edges, &self.config);
        self.links = LinkForce::new(&layering.nodes, &layering.topology, &self.config);
        self.slots = HashMap::with_capacity(layering.nodes.len());
        for (slot, node) in layering.nodes.iter().enumerate() {
            self.slots.entry(node.id).or_insert(slot);
        }
        self.source = nodes.to_vec();
        self.source_edges = edges
            .iter()
            .filter(|e| self.slots.contains_key(&e.source) && self.slots.contains_key(&e.target))
            .cloned()
            .collect();
        self.nodes = layering.nodes;
        self.topology = layering.topology;
        self.rows = layering.rows;
        self.alpha = self.config.initial_alpha;
        self.tick_count = 0;
        self.jiggle = Jiggle::new(self.generation.0 as u64);
        self.rebuild_hit_index();

        self.phase = if self.nodes.is_empty() {
            SimulationPhase::Settled
        } else {
            SimulationPhase::Simulating
        };
        log::info!(
            "simulation generation {} loaded: {} nodes, {} edges",
            self.generation.0,
            self.nodes.len(),
            self.topology.edges.len()
        );

        TickToken {
            generation: self.generation,
        }
    }

    /// Discard the working set. Every outstanding token becomes stale.
    pub fn teardown(&mut self) {
        self.generation = Generation(self.generation.0.wrapping_add(1));
        self.phase = SimulationPhase::TornDown;
        self.source.clear();
        self.source_edges.clear();
        self.nodes.clear();
        self.topology = Topology::default();
        self.links = LinkForce::default();
        self.slots.clear();
        self.hit_index.clear();
        log::debug!("simulation torn down");
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn config(&self) -> &ForceLayoutConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn rows(&self) -> Rows {
        self.rows
    }

    /// Slot of a node id in the working set.
    pub fn slot(&self, id: NodeId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&SimNode> {
        self.slot(id).map(|slot| &self.nodes[slot])
    }

    /// Input node at a slot.
    pub fn source_node(&self, slot: usize) -> Option<&GraphNode> {
        self.source.get(slot)
    }

    /// Input edge behind `topology().edges[index]`.
    pub fn source_edge(&self, index: usize) -> Option<&GraphEdge> {
        self.source_edges.get(index)
    }

    /// Whether `token` belongs to the live dataset.
    pub fn is_current(&self, token: TickToken) -> bool {
        token.generation == self.generation
            && !matches!(self.phase, SimulationPhase::Idle | SimulationPhase::TornDown)
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Advance one tick if `token` is current and the simulation is live.
    pub fn tick(&mut self, token: TickToken) -> TickOutcome {
        if !self.is_current(token) {
            return TickOutcome::Stale;
        }
        if self.phase != SimulationPhase::Simulating {
            return TickOutcome::Settled;
        }

        self.step();

        if self.alpha < self.config.alpha_min {
            self.phase = SimulationPhase::Settled;
            log::debug!("settled after {} ticks", self.tick_count);
            TickOutcome::Settled
        } else {
            TickOutcome::Advanced
        }
    }

    fn step(&mut self) {
        let cfg = &self.config;
        self.alpha += (cfg.alpha_target - self.alpha) * cfg.alpha_decay;
        let alpha = self.alpha;

        let x_targets = self.x_targets();
        let y_targets: Vec<f64> = self.nodes.iter().map(|n| self.rows.y(n.time_index)).collect();

        self.links.apply(&mut self.nodes, alpha, &mut self.jiggle);
        forces::apply_many_body(&mut self.nodes, cfg.charge_strength, alpha, &mut self.jiggle);
        forces::apply_x(&mut self.nodes, &x_targets, cfg.x_strength, alpha);
        forces::apply_y(&mut self.nodes, &y_targets, cfg.y_strength, alpha);
        forces::apply_collide(&mut self.nodes, cfg.collision_radius, &mut self.jiggle);

        let keep = 1.0 - cfg.velocity_decay;
        for node in &mut self.nodes {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= keep;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= keep;
                    node.y += node.vy;
                }
            }
        }

        self.tick_count += 1;
        let every = |n: u32| n != 0 && self.tick_count % n as u64 == 0;
        let (clamp_now, cross_now) = (
            every(self.config.clamp_every_ticks),
            every(self.config.crossing_every_ticks),
        );
        if clamp_now {
            self.clamp_to_ranges();
        }
        if cross_now && self.alpha >= self.config.crossing_alpha_floor {
            self.reduce_crossings();
        }
        self.rebuild_hit_index();
    }

    /// X target per slot: midway between the sibling average and the
    /// descendant-range centre, or whichever of the two exists.
    fn x_targets(&self) -> Vec<Option<f64>> {
        (0..self.nodes.len())
            .map(|slot| {
                if self.nodes[slot].is_sample {
                    return None;
                }
                let siblings = self.sibling_average(slot);
                let centre = self.topology.ranges[slot].map(|(lo, hi)| (lo + hi) / 2.0);
                match (siblings, centre) {
                    (Some(s), Some(c)) => Some((s + c) / 2.0),
                    (s, c) => s.or(c),
                }
            })
            .collect()
    }

    /// Mean x of a slot's siblings.
    pub(super) fn sibling_average(&self, slot: usize) -> Option<f64> {
        let siblings = &self.topology.siblings[slot];
        if siblings.is_empty() {
            return None;
        }
        let sum: f64 = siblings.iter().map(|&s| self.nodes[s].x).sum();
        Some(sum / siblings.len() as f64)
    }

    /// Clamp every non-sample into its descendant-sample range.
    pub(super) fn clamp_to_ranges(&mut self) {
        for (slot, node) in self.nodes.iter_mut().enumerate() {
            if !node.is_sample {
                node.x = self.topology.clamp_to_range(slot, node.x);
            }
        }
    }

    /// Nudge the first few free non-samples toward their neighbours' mean x.
    fn reduce_crossings(&mut self) {
        let weight = self.alpha * self.config.crossing_weight;
        let candidates: Vec<usize> = (0..self.nodes.len())
            .filter(|&s| !self.nodes[s].is_sample && self.nodes[s].fx.is_none())
            .take(self.config.crossing_node_limit)
            .collect();

        for slot in candidates {
            let neighbors = &self.topology.neighbors[slot];
            if neighbors.is_empty() {
                continue;
            }
            let mean = neighbors.iter().map(|&n| self.nodes[n].x).sum::<f64>() / neighbors.len() as f64;
            let x = self.nodes[slot].x;
            self.nodes[slot].x = self.topology.clamp_to_range(slot, x + (mean - x) * weight);
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Geometry for the current positions, `None` for a stale token.
    ///
    /// While the layout is still hot, non-samples are clamped before drawing
    /// so a frame never shows a node outside its descendant range.
    pub fn frame(&mut self, token: TickToken) -> Option<FrameGeometry> {
        if !self.is_current(token) {
            return None;
        }
        if self.alpha > self.config.render_clamp_alpha {
            self.clamp_to_ranges();
        }
        self.rebuild_hit_index();

        let label_offset = self.config.node_radius + 4.0;
        let position = |node: &SimNode| (node.x, self.rows.y(node.time_index));

        let nodes = self
            .nodes
            .iter()
            .map(|n| {
                let (x, y) = position(n);
                FrameNode { id: n.id, x, y }
            })
            .collect();
        let edges = self
            .topology
            .edges
            .iter()
            .map(|e| {
                let (s, t) = (&self.nodes[e.source], &self.nodes[e.target]);
                let ((x1, y1), (x2, y2)) = (position(s), position(t));
                FrameEdge {
                    source: s.id,
                    target: t.id,
                    x1,
                    y1,
                    x2,
                    y2,
                }
            })
            .collect();
        let labels = self
            .nodes
            .iter()
            .map(|n| {
                let (x, y) = position(n);
                FrameLabel {
                    id: n.id,
                    text: n.id.raw().to_string(),
                    x,
                    y: y - label_offset,
                }
            })
            .collect();

        Some(FrameGeometry {
            nodes,
            edges,
            labels,
        })
    }

    /// Re-index rendered positions; called after anything moves a node.
    pub(super) fn rebuild_hit_index(&mut self) {
        let rows = self.rows;
        self.hit_index.rebuild(
            self.nodes
                .iter()
                .enumerate()
                .map(|(slot, n)| (slot, n.x, rows.y(n.time_index))),
        );
    }

    /// Rendered positions of every node.
    pub fn rendered_points(&self) -> Vec<(f64, f64)> {
        self.nodes
            .iter()
            .map(|n| (n.x, self.rows.y(n.time_index)))
            .collect()
    }

    /// Node under a layout-space point, within the node radius.
    pub fn node_at(&self, x: f64, y: f64) -> Option<usize> {
        if self.hit_index.is_empty() {
            return None;
        }
        self.hit_index.nearest_within(x, y, self.config.node_radius)
    }

    /// Edge under a layout-space point, within `tolerance` of its segment.
    pub fn edge_at(&self, x: f64, y: f64, tolerance: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, e) in self.topology.edges.iter().enumerate() {
            let (s, t) = (&self.nodes[e.source], &self.nodes[e.target]);
            let d = segment_distance(
                (x, y),
                (s.x, self.rows.y(s.time_index)),
                (t.x, self.rows.y(t.time_index)),
            );
            if d <= tolerance && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i)
    }
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}
