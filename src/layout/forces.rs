//! Force terms for the 2D simulation.
//!
//! Each force follows the d3-force formulation so layouts match what a d3
//! host would produce: forces only add to velocities, integration happens in
//! the simulation. Coincident nodes get a tiny deterministic jiggle instead of
//! a random one, which keeps runs reproducible.

use crate::config::ForceLayoutConfig;
use crate::graph::ResolvedEdge;
use crate::spatial::SpatialIndex;

use super::layers::{SimNode, Topology};

/// Deterministic replacement for d3's random jiggle.
#[derive(Debug, Clone)]
pub struct Jiggle {
    state: u64,
}

impl Jiggle {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// A value in `[-0.5e-6, 0.5e-6)`.
    pub fn next(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let unit = (self.state >> 11) as f64 / (1u64 << 53) as f64;
        (unit - 0.5) * 1e-6
    }
}

/// One spring with its precomputed strength and bias.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub strength: f64,
    /// Share of the correction taken by the target.
    pub bias: f64,
}

/// Strength of the spring on an edge.
///
/// Children of the same parent pull hardest, then edges touching a sample.
pub fn link_strength(
    edge: ResolvedEdge,
    nodes: &[SimNode],
    topology: &Topology,
    config: &ForceLayoutConfig,
) -> f64 {
    let (ps, pt) = (topology.parent[edge.source], topology.parent[edge.target]);
    if ps.is_some() && ps == pt {
        config.sibling_link_strength
    } else if nodes[edge.source].is_sample || nodes[edge.target].is_sample {
        config.sample_link_strength
    } else {
        config.default_link_strength
    }
}

/// Spring force along the edges.
#[derive(Debug, Clone, Default)]
pub struct LinkForce {
    links: Vec<Link>,
    distance: f64,
}

impl LinkForce {
    pub fn new(nodes: &[SimNode], topology: &Topology, config: &ForceLayoutConfig) -> Self {
        let edges: Vec<ResolvedEdge> = topology
            .edges
            .iter()
            .copied()
            .filter(|e| e.source != e.target)
            .collect();

        let mut count = vec![0u32; nodes.len()];
        for e in &edges {
            count[e.source] += 1;
            count[e.target] += 1;
        }

        let links = edges
            .iter()
            .map(|&e| Link {
                source: e.source,
                target: e.target,
                strength: link_strength(e, nodes, topology, config),
                bias: count[e.source] as f64 / (count[e.source] + count[e.target]) as f64,
            })
            .collect();

        Self {
            links,
            distance: config.link_distance,
        }
    }

    pub fn apply(&self, nodes: &mut [SimNode], alpha: f64, jiggle: &mut Jiggle) {
        for link in &self.links {
            let (s, t) = (&nodes[link.source], &nodes[link.target]);
            let mut x = t.x + t.vx - s.x - s.vx;
            let mut y = t.y + t.vy - s.y - s.vy;
            if x == 0.0 {
                x = jiggle.next();
            }
            if y == 0.0 {
                y = jiggle.next();
            }
            let len = (x * x + y * y).sqrt();
            let l = (len - self.distance) / len * alpha * link.strength;
            x *= l;
            y *= l;

            let t = &mut nodes[link.target];
            t.vx -= x * link.bias;
            t.vy -= y * link.bias;
            let s = &mut nodes[link.source];
            s.vx += x * (1.0 - link.bias);
            s.vy += y * (1.0 - link.bias);
        }
    }
}

/// Pairwise charge, exact rather than Barnes-Hut.
pub fn apply_many_body(nodes: &mut [SimNode], strength: f64, alpha: f64, jiggle: &mut Jiggle) {
    const DISTANCE_MIN_2: f64 = 1.0;

    for i in 0..nodes.len() {
        let (xi, yi) = (nodes[i].x, nodes[i].y);
        let (mut dvx, mut dvy) = (0.0, 0.0);
        for (j, other) in nodes.iter().enumerate() {
            if i == j {
                continue;
            }
            let mut x = other.x - xi;
            let mut y = other.y - yi;
            let mut l = x * x + y * y;
            if x == 0.0 {
                x = jiggle.next();
                l += x * x;
            }
            if y == 0.0 {
                y = jiggle.next();
                l += y * y;
            }
            if l < DISTANCE_MIN_2 {
                l = (DISTANCE_MIN_2 * l).sqrt();
            }
            let w = strength * alpha / l;
            dvx += x * w;
            dvy += y * w;
        }
        nodes[i].vx += dvx;
        nodes[i].vy += dvy;
    }
}

/// Pull toward a per-node x target; `None` leaves the node alone.
pub fn apply_x(nodes: &mut [SimNode], targets: &[Option<f64>], strength: f64, alpha: f64) {
    for (node, target) in nodes.iter_mut().zip(targets) {
        if let Some(tx) = target {
            node.vx += (tx - node.x) * strength * alpha;
        }
    }
}

/// Pull toward a per-node y target.
pub fn apply_y(nodes: &mut [SimNode], targets: &[f64], strength: f64, alpha: f64) {
    for (node, ty) in nodes.iter_mut().zip(targets) {
        node.vy += (ty - node.y) * strength * alpha;
    }
}

/// Separate overlapping nodes of equal `radius`.
///
/// Candidates come from an R-tree over predicted positions. The query radius
/// is twice the contact distance, which covers the velocity changes made
/// while the pass is running.
pub fn apply_collide(nodes: &mut [SimNode], radius: f64, jiggle: &mut Jiggle) {
    if nodes.len() < 2 || radius <= 0.0 {
        return;
    }
    let contact = 2.0 * radius;
    let index = SpatialIndex::from_points(
        nodes
            .iter()
            .enumerate()
            .map(|(slot, n)| (slot, n.x + n.vx, n.y + n.vy)),
    );

    for i in 0..nodes.len() {
        let xi = nodes[i].x + nodes[i].vx;
        let yi = nodes[i].y + nodes[i].vy;
        let mut candidates = index.in_radius(xi, yi, 2.0 * contact);
        candidates.sort_unstable();

        for j in candidates.into_iter().filter(|&j| j > i) {
            let mut x = xi - nodes[j].x - nodes[j].vx;
            let mut y = yi - nodes[j].y - nodes[j].vy;
            let mut l = x * x + y * y;
            if l >= contact * contact {
                continue;
            }
            if x == 0.0 {
                x = jiggle.next();
                l += x * x;
            }
            if y == 0.0 {
                y = jiggle.next();
                l += y * y;
            }
            let len = l.sqrt();
            let push = (contact - len) / len;
            x *= push;
            y *= push;

            // Equal radii split the correction evenly.
            nodes[i].vx += x * 0.5;
            nodes[i].vy += y * 0.5;
            nodes[j].vx -= x * 0.5;
            nodes[j].vy -= y * 0.5;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn node(id: u32, x: f64, y: f64, is_sample: bool) -> SimNode {
        SimNode {
            id: NodeId(id),
            time: 0.0,
            is_sample,
            is_combined: false,
            time_index: 0,
            layer: 0,
            degree: 0,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
        }
    }

    fn topology(n: usize, edges: &[(usize, usize)], parent: Vec<Option<usize>>) -> Topology {
        Topology {
            edges: edges
                .iter()
                .map(|&(source, target)| ResolvedEdge { source, target })
                .collect(),
            parent,
            siblings: vec![Vec::new(); n],
            neighbors: vec![Vec::new(); n],
            descendant_samples: vec![Vec::new(); n],
            ranges: vec![None; n],
        }
    }

    #[test]
    fn test_jiggle_is_deterministic_and_tiny() {
        let mut a = Jiggle::new(7);
        let mut b = Jiggle::new(7);
        for _ in 0..100 {
            let v = a.next();
            assert_eq!(v, b.next());
            assert!(v.abs() <= 0.5e-6);
        }
    }

    #[test]
    fn test_link_strength_tiers() {
        let cfg = ForceLayoutConfig::default();
        let nodes = vec![
            node(0, 0.0, 0.0, true),
            node(1, 0.0, 0.0, false),
            node(2, 0.0, 0.0, false),
            node(3, 0.0, 0.0, false),
        ];
        let topo = topology(4, &[], vec![None, Some(3), Some(3), None]);
        let e = |source, target| ResolvedEdge { source, target };

        assert_eq!(link_strength(e(1, 2), &nodes, &topo, &cfg), 0.9);
        assert_eq!(link_strength(e(3, 0), &nodes, &topo, &cfg), 0.8);
        assert_eq!(link_strength(e(3, 1), &nodes, &topo, &cfg), 0.3);
    }

    #[test]
    fn test_link_pulls_stretched_pair_together() {
        let cfg = ForceLayoutConfig::default();
        let mut nodes = vec![node(0, 0.0, 0.0, false), node(1, 200.0, 0.0, false)];
        let topo = topology(2, &[(0, 1)], vec![None, None]);
        let force = LinkForce::new(&nodes, &topo, &cfg);
        assert_eq!(force.links[0].bias, 0.5);

        force.apply(&mut nodes, 1.0, &mut Jiggle::new(1));
        assert!(nodes[0].vx > 0.0);
        assert!(nodes[1].vx < 0.0);
        assert!((nodes[0].vx + nodes[1].vx).abs() < 1e-9);
    }

    #[test]
    fn test_many_body_repels() {
        let mut nodes = vec![node(0, 0.0, 0.0, false), node(1, 10.0, 0.0, false)];
        apply_many_body(&mut nodes, -20.0, 1.0, &mut Jiggle::new(1));
        assert!(nodes[0].vx < 0.0);
        assert!(nodes[1].vx > 0.0);
        // x * strength * alpha / l^2 = 10 * -20 / 100
        assert!((nodes[1].vx - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_positional_forces() {
        let mut nodes = vec![node(0, 0.0, 0.0, false), node(1, 10.0, 10.0, false)];
        apply_x(&mut nodes, &[Some(100.0), None], 0.15, 0.5);
        apply_y(&mut nodes, &[20.0, 10.0], 1.0, 0.5);
        assert!((nodes[0].vx - 7.5).abs() < 1e-9);
        assert_eq!(nodes[1].vx, 0.0);
        assert!((nodes[0].vy - 10.0).abs() < 1e-9);
        assert_eq!(nodes[1].vy, 0.0);
    }

    #[test]
    fn test_collide_separates_overlap() {
        let mut nodes = vec![node(0, 0.0, 0.0, false), node(1, 10.0, 0.0, false)];
        apply_collide(&mut nodes, 15.0, &mut Jiggle::new(1));
        // Contact distance 30, gap 10: each side moves half of the 20 overlap.
        assert!((nodes[0].vx + 10.0).abs() < 1e-9);
        assert!((nodes[1].vx - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_collide_ignores_distant_nodes() {
        let mut nodes = vec![node(0, 0.0, 0.0, false), node(1, 100.0, 0.0, false)];
        apply_collide(&mut nodes, 15.0, &mut Jiggle::new(1));
        assert_eq!(nodes[0].vx, 0.0);
        assert_eq!(nodes[1].vx, 0.0);
    }
}
