//! Spatial lookup over rendered node positions: collision candidates for
//! the force pass and pointer hit testing.

mod rtree;

pub use rtree::SpatialIndex;
