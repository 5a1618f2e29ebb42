//! Geographic shape utilities.
//!
//! Shapes arrive parsed from the geography service. This module computes
//! their bounds, turns them into normalized line segments for the 3D scene,
//! generates the synthetic unit grid and guesses the coordinate system of
//! node locations.

mod crs;
mod segments;
mod shape;

pub use crs::{detect_coordinate_system, suggested_geographic_mode, CrsDetection, GeographicMode, LikelyCrs};
pub use segments::{normalized_segments, shape_segments, NormalizationFrame, Segment};
pub use shape::{
    eastern_hemisphere_outline, generate_grid, normalize_to_unit_space, shape_bounds, Bounds2,
    Coordinates, GeographicShape,
};
