//! Shape to line-segment conversion and normalization.
//!
//! Rendering draws every geography as line segments, so polygons become their
//! ring edges and lines their consecutive point pairs. Unsupported geometry
//! types are skipped with a warning.

use serde::Serialize;

use super::shape::{Bounds2, Coordinates, GeographicShape};

/// One 2D line segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: [f64; 2],
    pub end: [f64; 2],
}

/// Normalization frame: `(p - center) / scale * spacing`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizationFrame {
    pub center: [f64; 2],
    pub scale: f64,
    pub spacing: f64,
}

impl NormalizationFrame {
    /// Frame centred on `bounds`, scaled by its larger extent.
    ///
    /// Zero-sized bounds fall back to a scale of 1.
    pub fn from_bounds(bounds: Bounds2, spacing: f64) -> Self {
        let (cx, cy) = bounds.center();
        let extent = bounds.width().max(bounds.height());
        let scale = if extent > 0.0 && extent.is_finite() {
            extent
        } else {
            1.0
        };
        Self {
            center: [cx, cy],
            scale,
            spacing,
        }
    }

    /// Map a data-space point into scene units.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> [f64; 2] {
        [
            (x - self.center[0]) / self.scale * self.spacing,
            (y - self.center[1]) / self.scale * self.spacing,
        ]
    }
}

/// Convert a shape into data-space line segments.
pub fn shape_segments(shape: &GeographicShape) -> Vec<Segment> {
    let mut out = Vec::new();
    push_shape(shape, &mut out);
    out
}

/// Convert a shape into scene-space segments through `frame`.
pub fn normalized_segments(shape: &GeographicShape, frame: &NormalizationFrame) -> Vec<Segment> {
    shape_segments(shape)
        .into_iter()
        .map(|s| Segment {
            start: frame.apply(s.start[0], s.start[1]),
            end: frame.apply(s.end[0], s.end[1]),
        })
        .collect()
}

fn push_shape(shape: &GeographicShape, out: &mut Vec<Segment>) {
    let coords = shape.coordinates.as_ref();
    match (shape.shape_type.as_str(), coords) {
        ("GeometryCollection" | "FeatureCollection", _) => {
            for child in shape.geometries.iter().flatten() {
                push_shape(child, out);
            }
        }
        ("Point" | "MultiPoint", _) => {}
        ("LineString", Some(Coordinates::Positions(line))) => push_path(line, false, out),
        ("MultiLineString", Some(Coordinates::Rings(lines))) => {
            for line in lines {
                push_path(line, false, out);
            }
        }
        ("Polygon", Some(Coordinates::Rings(rings))) => {
            for ring in rings {
                push_path(ring, true, out);
            }
        }
        ("MultiPolygon", Some(Coordinates::Polygons(polygons))) => {
            for ring in polygons.iter().flatten() {
                push_path(ring, true, out);
            }
        }
        ("LineString" | "MultiLineString" | "Polygon" | "MultiPolygon", _) => {
            log::warn!(
                "{} geometry has missing or mis-nested coordinates, skipped",
                shape.shape_type
            );
        }
        (other, _) => {
            log::warn!("unsupported geometry type {other:?}, skipped");
        }
    }
}

fn push_path(points: &[Vec<f64>], closed: bool, out: &mut Vec<Segment>) {
    let xy: Vec<[f64; 2]> = points
        .iter()
        .filter_map(|p| match p.as_slice() {
            [x, y, ..] => Some([*x, *y]),
            _ => None,
        })
        .collect();

    for pair in xy.windows(2) {
        out.push(Segment {
            start: pair[0],
            end: pair[1],
        });
    }

    if closed && xy.len() > 2 {
        let (first, last) = (xy[0], xy[xy.len() - 1]);
        if first != last {
            out.push(Segment {
                start: last,
                end: first,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{eastern_hemisphere_outline, generate_grid};

    fn square(closed: bool) -> GeographicShape {
        let mut ring = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 1.0]];
        if closed {
            ring.push(vec![0.0, 0.0]);
        }
        GeographicShape::geometry("Polygon", Coordinates::Rings(vec![ring]))
    }

    #[test]
    fn test_polygon_ring_segments() {
        assert_eq!(shape_segments(&square(true)).len(), 4);
        // An open ring is closed implicitly.
        let open = shape_segments(&square(false));
        assert_eq!(open.len(), 4);
        assert_eq!(open[3].end, [0.0, 0.0]);
    }

    #[test]
    fn test_multipolygon_and_lines() {
        let multi = GeographicShape::geometry(
            "MultiPolygon",
            Coordinates::Polygons(vec![
                vec![vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0]]],
                vec![vec![vec![5.0, 5.0], vec![6.0, 5.0], vec![5.0, 6.0], vec![5.0, 5.0]]],
            ]),
        );
        assert_eq!(shape_segments(&multi).len(), 6);

        let line = GeographicShape::geometry(
            "LineString",
            Coordinates::Positions(vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 0.0]]),
        );
        assert_eq!(shape_segments(&line).len(), 2);
    }

    #[test]
    fn test_grid_segments() {
        assert_eq!(shape_segments(&generate_grid(10)).len(), 22);
    }

    #[test]
    fn test_feature_collection_recurses() {
        let shape: GeographicShape = serde_json::from_str(
            r#"{"type": "FeatureCollection", "geometries": [
                {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
                {"type": "Point", "coordinates": [3, 3]}
            ]}"#,
        )
        .unwrap();
        let segments = shape_segments(&shape);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].end, [1.0, 1.0]);
    }

    #[test]
    fn test_unsupported_geometry_contributes_nothing() {
        let shape: GeographicShape = serde_json::from_str(
            r#"{"type": "CircularString", "coordinates": [[0, 0], [1, 1], [2, 0]]}"#,
        )
        .unwrap();
        assert!(shape_segments(&shape).is_empty());

        let mis_nested =
            GeographicShape::geometry("Polygon", Coordinates::Positions(vec![vec![0.0, 0.0]]));
        assert!(shape_segments(&mis_nested).is_empty());
    }

    #[test]
    fn test_normalization_frame() {
        let frame = NormalizationFrame::from_bounds(Bounds2::from_array([0.0, 0.0, 4.0, 2.0]), 100.0);
        assert_eq!(frame.center, [2.0, 1.0]);
        assert_eq!(frame.scale, 4.0);
        assert_eq!(frame.apply(4.0, 1.0), [50.0, 0.0]);

        let degenerate = NormalizationFrame::from_bounds(Bounds2::from_array([3.0, 3.0, 3.0, 3.0]), 10.0);
        assert_eq!(degenerate.scale, 1.0);
        assert_eq!(degenerate.apply(4.0, 3.0), [10.0, 0.0]);
    }

    #[test]
    fn test_normalized_outline_fits_spacing() {
        let shape = eastern_hemisphere_outline();
        let frame = NormalizationFrame::from_bounds(Bounds2::from_array([-15.0, -60.0, 180.0, 75.0]), 100.0);
        for seg in normalized_segments(&shape, &frame) {
            for p in [seg.start, seg.end] {
                assert!(p[0].abs() <= 50.0 + 1e-9);
                assert!(p[1].abs() <= 50.0 + 1e-9);
            }
        }
    }
}
