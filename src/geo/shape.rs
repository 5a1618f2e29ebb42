//! GeoJSON-like shapes, bounds and built-in presets.

use serde::{Deserialize, Serialize};

/// Coordinate nesting of a GeoJSON-like geometry.
///
/// The geometry `type` decides how a nesting depth is read: a MultiPoint and
/// a LineString are both `Positions`, a Polygon and a MultiLineString are
/// both `Rings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    /// `[x, y, ...]`
    Position(Vec<f64>),
    /// `[[x, y], ...]`
    Positions(Vec<Vec<f64>>),
    /// `[[[x, y], ...], ...]`
    Rings(Vec<Vec<Vec<f64>>>),
    /// `[[[[x, y], ...], ...], ...]`
    Polygons(Vec<Vec<Vec<Vec<f64>>>>),
}

impl Coordinates {
    /// Visit every `(x, y)` pair regardless of nesting.
    pub fn for_each_xy(&self, mut f: impl FnMut(f64, f64)) {
        let mut visit = |p: &Vec<f64>| {
            if let [x, y, ..] = p.as_slice() {
                f(*x, *y);
            }
        };
        match self {
            Self::Position(p) => visit(p),
            Self::Positions(ps) => ps.iter().for_each(&mut visit),
            Self::Rings(rs) => rs.iter().flatten().for_each(&mut visit),
            Self::Polygons(polys) => polys.iter().flatten().flatten().for_each(&mut visit),
        }
    }
}

/// A shape supplied by the geography service (preset or parsed upload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicShape {
    /// Geometry type (`Polygon`, `MultiPolygon`, `LineString`, ...).
    #[serde(rename = "type")]
    pub shape_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `[min_x, min_y, max_x, max_y]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[f64; 4]>,
    /// Child geometries of a `GeometryCollection` or `FeatureCollection`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometries: Option<Vec<GeographicShape>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
}

impl GeographicShape {
    /// A geometry with coordinates and nothing else.
    pub fn geometry(shape_type: &str, coordinates: Coordinates) -> Self {
        Self {
            shape_type: shape_type.to_string(),
            coordinates: Some(coordinates),
            name: None,
            bounds: None,
            geometries: None,
            crs: None,
        }
    }
}

/// Axis-aligned 2D bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds2 {
    /// From `[min_x, min_y, max_x, max_y]`.
    pub fn from_array(b: [f64; 4]) -> Self {
        Self {
            min_x: b[0],
            min_y: b[1],
            max_x: b[2],
            max_y: b[3],
        }
    }

    /// To `[min_x, min_y, max_x, max_y]`.
    pub fn to_array(self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    /// Bounds of a point set, `None` when empty.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut acc: Option<Self> = None;
        for (x, y) in points {
            acc = Some(match acc {
                None => Self {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(b) => Self {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            });
        }
        acc
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Bounds of a shape: its declared `bounds`, else computed from coordinates.
pub fn shape_bounds(shape: &GeographicShape) -> Option<Bounds2> {
    if let Some(b) = shape.bounds {
        return Some(Bounds2::from_array(b));
    }
    let mut points = Vec::new();
    collect_points(shape, &mut points);
    Bounds2::from_points(points)
}

fn collect_points(shape: &GeographicShape, out: &mut Vec<(f64, f64)>) {
    if let Some(coords) = &shape.coordinates {
        coords.for_each_xy(|x, y| out.push((x, y)));
    }
    for child in shape.geometries.iter().flatten() {
        collect_points(child, out);
    }
}

/// A `size` x `size` line grid over the unit square.
pub fn generate_grid(size: u32) -> GeographicShape {
    let size = size.max(1);
    let mut lines = Vec::with_capacity(2 * (size as usize + 1));

    for i in 0..=size {
        let x = i as f64 / size as f64;
        lines.push(GeographicShape::geometry(
            "LineString",
            Coordinates::Positions(vec![vec![x, 0.0], vec![x, 1.0]]),
        ));
    }
    for i in 0..=size {
        let y = i as f64 / size as f64;
        lines.push(GeographicShape::geometry(
            "LineString",
            Coordinates::Positions(vec![vec![0.0, y], vec![1.0, y]]),
        ));
    }

    GeographicShape {
        shape_type: "GeometryCollection".to_string(),
        coordinates: None,
        name: Some(format!("{size}x{size} Unit Grid")),
        bounds: Some([0.0, 0.0, 1.0, 1.0]),
        geometries: Some(lines),
        crs: Some("unit_grid".to_string()),
    }
}

/// Simplified outline of the extended Eastern Hemisphere (no Antarctica).
pub fn eastern_hemisphere_outline() -> GeographicShape {
    const RING: [[f64; 2]; 22] = [
        [-15.0, -60.0],
        [-10.0, -60.0],
        [0.0, -60.0],
        [30.0, -60.0],
        [45.0, -35.0],
        [60.0, -25.0],
        [80.0, -10.0],
        [100.0, 10.0],
        [120.0, 25.0],
        [140.0, 35.0],
        [160.0, 50.0],
        [180.0, 60.0],
        [180.0, 75.0],
        [150.0, 75.0],
        [120.0, 70.0],
        [90.0, 65.0],
        [60.0, 55.0],
        [30.0, 60.0],
        [0.0, 70.0],
        [-10.0, 65.0],
        [-15.0, 60.0],
        [-15.0, -60.0],
    ];

    GeographicShape {
        shape_type: "Polygon".to_string(),
        coordinates: Some(Coordinates::Rings(vec![
            RING.iter().map(|p| p.to_vec()).collect(),
        ])),
        name: Some("Eastern Hemisphere (Simplified, No Antarctica)".to_string()),
        bounds: Some([-15.0, -60.0, 180.0, 75.0]),
        geometries: None,
        crs: Some("EPSG:4326".to_string()),
    }
}

/// Map points into `[0, 1]` over `bounds`; degenerate bounds return the input.
pub fn normalize_to_unit_space(points: &[(f64, f64)], bounds: Bounds2) -> Vec<(f64, f64)> {
    let (w, h) = (bounds.width(), bounds.height());
    if w == 0.0 || h == 0.0 {
        log::warn!("zero width or height in bounds, coordinates left unnormalized");
        return points.to_vec();
    }
    points
        .iter()
        .map(|&(x, y)| ((x - bounds.min_x) / w, (y - bounds.min_y) / h))
        .collect()
}
