//! Drag handling for the 2D simulation.
//!
//! A dragged node never leaves its time row: `fy` stays locked to the row y.
//! Its x is kept inside the descendant-sample range (or the padded viewport
//! when it has none) and close to its siblings. Samples keep their pinned x.

use crate::graph::NodeId;

use super::simulation::Simulation;

impl Simulation {
    /// Pin a node where it is. Returns `false` for an unknown id.
    pub fn drag_start(&mut self, id: NodeId) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        let row_y = self.rows.y(self.nodes[slot].time_index);
        let node = &mut self.nodes[slot];
        node.fx = Some(node.x);
        node.fy = Some(row_y);
        true
    }

    /// Move a dragged node toward `x`.
    pub fn drag_move(&mut self, id: NodeId, x: f64) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        let row_y = self.rows.y(self.nodes[slot].time_index);
        if self.nodes[slot].is_sample {
            let node = &mut self.nodes[slot];
            node.y = row_y;
            node.fy = Some(row_y);
            return true;
        }

        let x = self.constrain_drag_x(slot, x);
        let node = &mut self.nodes[slot];
        node.x = x;
        node.fx = Some(x);
        node.y = row_y;
        node.fy = Some(row_y);
        self.rebuild_hit_index();
        true
    }

    /// Release a dragged node: x is free again, y stays on its row.
    pub fn drag_end(&mut self, id: NodeId) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        let row_y = self.rows.y(self.nodes[slot].time_index);
        if !self.nodes[slot].is_sample {
            let x = self.constrain_drag_x(slot, self.nodes[slot].x);
            let node = &mut self.nodes[slot];
            node.x = x;
            node.fx = None;
        }
        let node = &mut self.nodes[slot];
        node.y = row_y;
        node.fy = Some(row_y);
        self.rebuild_hit_index();
        true
    }

    /// Apply the drag constraints to a candidate x.
    pub(super) fn constrain_drag_x(&self, slot: usize, x: f64) -> f64 {
        let cfg = &self.config;
        let (lo, hi) = self.topology.ranges[slot]
            .unwrap_or((cfg.padding, (cfg.width - cfg.padding).max(cfg.padding)));
        let mut x = x.clamp(lo, hi);

        if let Some(avg) = self.sibling_average(slot) {
            x = x.clamp(avg - cfg.max_sibling_distance, avg + cfg.max_sibling_distance);
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ForceLayoutConfig;
    use crate::graph::{GraphEdge, GraphNode, NodeId};
    use crate::layout::{Simulation, TickOutcome};

    /// Root 6 over 4 {0, 1} and 5 {2, 3}; samples ordered by id.
    fn loaded() -> Simulation {
        let nodes = vec![
            GraphNode::new(0, 0.0, true),
            GraphNode::new(1, 0.0, true),
            GraphNode::new(2, 0.0, true),
            GraphNode::new(3, 0.0, true),
            GraphNode::new(4, 1.0, false),
            GraphNode::new(5, 1.0, false),
            GraphNode::new(6, 2.0, false),
            GraphNode::new(7, 1.0, false),
        ];
        let edges = vec![
            GraphEdge::new(4, 0),
            GraphEdge::new(4, 1),
            GraphEdge::new(5, 2),
            GraphEdge::new(5, 3),
            GraphEdge::new(6, 4),
            GraphEdge::new(6, 5),
        ];
        let mut sim = Simulation::new(ForceLayoutConfig {
            sample_ordering: crate::config::SampleOrdering::Numeric,
            ..Default::default()
        });
        sim.load(&nodes, &edges);
        sim
    }

    #[test]
    fn test_drag_locks_row() {
        let mut sim = loaded();
        let row_y = sim.rows().y(1);

        assert!(sim.drag_start(NodeId(4)));
        let node = sim.node(NodeId(4)).unwrap();
        assert_eq!(node.fx, Some(node.x));
        assert_eq!(node.fy, Some(row_y));

        assert!(sim.drag_end(NodeId(4)));
        let node = sim.node(NodeId(4)).unwrap();
        assert_eq!(node.fx, None);
        assert_eq!(node.fy, Some(row_y));
    }

    #[test]
    fn test_drag_clamped_to_descendant_range() {
        let mut sim = loaded();
        // Root 6 has no siblings; its range spans every sample.
        sim.drag_move(NodeId(6), -500.0);
        assert_eq!(sim.node(NodeId(6)).unwrap().x, 50.0);
        sim.drag_move(NodeId(6), 5000.0);
        assert_eq!(sim.node(NodeId(6)).unwrap().x, 750.0);
    }

    #[test]
    fn test_sibling_distance_applies_after_range() {
        let mut sim = loaded();
        let sibling_x = sim.node(NodeId(5)).unwrap().x;
        sim.drag_start(NodeId(4));
        sim.drag_move(NodeId(4), -500.0);
        assert_eq!(sim.node(NodeId(4)).unwrap().x, sibling_x - 50.0);
    }

    #[test]
    fn test_drag_without_range_uses_viewport() {
        let mut sim = loaded();
        // Node 7 has no edges: no range, no siblings.
        sim.drag_move(NodeId(7), 5000.0);
        assert_eq!(sim.node(NodeId(7)).unwrap().x, 750.0);
        sim.drag_move(NodeId(7), -5000.0);
        assert_eq!(sim.node(NodeId(7)).unwrap().x, 50.0);
    }

    #[test]
    fn test_samples_keep_x_while_dragged() {
        let mut sim = loaded();
        let before = sim.node(NodeId(2)).unwrap().x;
        sim.drag_start(NodeId(2));
        sim.drag_move(NodeId(2), before + 200.0);
        sim.drag_end(NodeId(2));
        let node = sim.node(NodeId(2)).unwrap();
        assert_eq!(node.x, before);
        assert_eq!(node.fx, Some(before));
    }

    #[test]
    fn test_dragged_node_held_through_ticks() {
        let mut sim = loaded();
        let token = crate::layout::TickToken::from_raw(sim.generation().0);
        sim.drag_start(NodeId(6));
        sim.drag_move(NodeId(6), 300.0);
        for _ in 0..5 {
            assert_eq!(sim.tick(token), TickOutcome::Advanced);
        }
        assert_eq!(sim.node(NodeId(6)).unwrap().x, 300.0);
    }

    #[test]
    fn test_unknown_node_is_noop() {
        let mut sim = loaded();
        assert!(!sim.drag_start(NodeId(99)));
        assert!(!sim.drag_move(NodeId(99), 10.0));
        assert!(!sim.drag_end(NodeId(99)));
    }
}
