//! Rendered node positions in an rstar R*-tree.
//!
//! Entries carry the node's slot rather than its id: the collision force
//! writes velocities by slot, and hit testing hands the slot back to the
//! simulation, which owns the id lookup.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// One rendered node position.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SlotPoint {
    slot: usize,
    x: f64,
    y: f64,
}

impl SlotPoint {
    fn new(slot: usize, x: f64, y: f64) -> Self {
        Self { slot, x, y }
    }

    fn position(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl RTreeObject for SlotPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position())
    }
}

impl PointDistance for SlotPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.position().distance_2(point)
    }
}

/// Layout-space lookup of node slots.
///
/// Positions change every tick, so the tree is bulk-loaded from scratch
/// rather than updated in place. Non-finite positions are left out.
#[derive(Default)]
pub struct SpatialIndex {
    tree: RTree<SlotPoint>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk-load from `(slot, x, y)` triples.
    pub fn from_points(points: impl IntoIterator<Item = (usize, f64, f64)>) -> Self {
        let points: Vec<SlotPoint> = points
            .into_iter()
            .filter(|&(_, x, y)| x.is_finite() && y.is_finite())
            .map(|(slot, x, y)| SlotPoint::new(slot, x, y))
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    pub fn rebuild(&mut self, points: impl IntoIterator<Item = (usize, f64, f64)>) {
        *self = Self::from_points(points);
    }

    /// Closest slot to `(x, y)`, if it lies within `max_distance`.
    pub fn nearest_within(&self, x: f64, y: f64, max_distance: f64) -> Option<usize> {
        let query = [x, y];
        self.tree
            .nearest_neighbor(&query)
            .filter(|point| point.distance_2(&query) <= max_distance * max_distance)
            .map(|point| point.slot)
    }

    /// Every slot within `radius` of `(x, y)`, in no particular order.
    pub fn in_radius(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        self.tree
            .locate_within_distance([x, y], radius * radius)
            .map(|point| point.slot)
            .collect()
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_within() {
        let index = SpatialIndex::from_points([(0, 0.0, 0.0), (1, 10.0, 10.0), (2, 5.0, 5.0)]);

        assert_eq!(index.nearest_within(0.5, 0.0, 1.0), Some(0));
        assert_eq!(index.nearest_within(6.0, 6.0, 2.0), Some(2));
        assert_eq!(index.nearest_within(2.5, 0.0, 2.0), None);
        // Slot 2 is ~7.07 from (10, 0), slot 1 is 10 away.
        assert_eq!(index.nearest_within(10.0, 0.0, 8.0), Some(2));
    }

    #[test]
    fn test_in_radius() {
        let index = SpatialIndex::from_points([(0, 0.0, 0.0), (1, 3.0, 0.0), (2, 10.0, 0.0)]);

        let mut near = index.in_radius(0.0, 0.0, 5.0);
        near.sort_unstable();
        assert_eq!(near, vec![0, 1]);
        assert!(index.in_radius(20.0, 0.0, 5.0).is_empty());
    }

    #[test]
    fn test_non_finite_points_skipped() {
        let index = SpatialIndex::from_points([(0, f64::NAN, 0.0), (1, 1.0, 1.0)]);
        assert_eq!(index.in_radius(0.0, 0.0, 10.0), vec![1]);
    }

    #[test]
    fn test_rebuild_and_clear() {
        let mut index = SpatialIndex::from_points([(0, 0.0, 0.0)]);
        index.rebuild([(1, 1.0, 1.0), (2, 2.0, 2.0), (3, 3.0, 3.0)]);
        assert_eq!(index.in_radius(2.0, 2.0, 2.0).len(), 3);
        assert_eq!(index.nearest_within(0.0, 0.0, 2.0), Some(1));

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.nearest_within(0.0, 0.0, 100.0), None);
    }
}
