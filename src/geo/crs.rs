//! Coordinate system detection from the spatial extent of node locations.
//!
//! The heuristics classify a point cloud by its numeric range only: unit
//! square, small planar units, longitude/latitude, Web Mercator and other
//! projected systems. The result also carries the geographic display mode
//! that suits it best.

use serde::{Deserialize, Serialize};

use super::shape::Bounds2;

/// How the 3D scene frames spatial data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeographicMode {
    /// Normalize to the data's own bounds over a unit grid.
    #[default]
    UnitGrid,
    /// Frame with the Eastern Hemisphere outline.
    EasternHemisphere,
    /// Frame with a user-supplied shape.
    Custom,
}

impl GeographicMode {
    /// Whether a supplied shape's bounds replace the data bounds as the frame.
    pub fn uses_shape_frame(self) -> bool {
        matches!(self, Self::EasternHemisphere | Self::Custom)
    }
}

/// Most likely coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LikelyCrs {
    #[serde(rename = "unit_grid")]
    UnitGrid,
    #[serde(rename = "planar")]
    Planar,
    #[serde(rename = "EPSG:4326")]
    Wgs84,
    #[serde(rename = "EPSG:3857")]
    WebMercator,
    #[serde(rename = "projected")]
    Projected,
    #[serde(rename = "unknown")]
    Unknown,
}

/// Detection result, as attached to graph metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrsDetection {
    pub likely_crs: LikelyCrs,
    pub confidence: f64,
    pub reasoning: String,
    pub bounds: Option<[f64; 4]>,
    pub coordinate_count: usize,
    #[serde(default)]
    pub suggested_geographic_mode: GeographicMode,
}

/// Extended Eastern Hemisphere extent used for mode suggestion.
fn in_eastern_extent(b: &Bounds2) -> bool {
    (-15.0..=180.0).contains(&b.min_x) && (-60.0..=75.0).contains(&b.min_y)
}

fn aspect_note(x_range: f64, y_range: f64, rectangular: &str, square: &str) -> String {
    if x_range / y_range > 2.0 || y_range / x_range > 2.0 {
        rectangular.to_string()
    } else {
        square.to_string()
    }
}

/// Classify a set of coordinates.
pub fn detect_coordinate_system(points: &[(f64, f64)]) -> CrsDetection {
    let Some(b) = Bounds2::from_points(points.iter().copied()) else {
        return CrsDetection {
            likely_crs: LikelyCrs::Unknown,
            confidence: 0.0,
            reasoning: "No coordinates provided".to_string(),
            bounds: None,
            coordinate_count: 0,
            suggested_geographic_mode: GeographicMode::UnitGrid,
        };
    };

    let (x_range, y_range) = (b.width(), b.height());
    let max_abs = [b.min_x, b.max_x, b.min_y, b.max_y]
        .iter()
        .fold(0.0_f64, |m, v| m.max(v.abs()));
    let within = |lo: f64, hi: f64, v: f64| (lo..=hi).contains(&v);
    let mut reasons: Vec<String> = Vec::new();

    let (crs, confidence) = if within(0.0, 1.0, b.min_x)
        && within(0.0, 1.0, b.max_x)
        && within(0.0, 1.0, b.min_y)
        && within(0.0, 1.0, b.max_y)
    {
        reasons.push("Coordinates are within [0,1] range".to_string());
        if x_range < 0.1 && y_range < 0.1 {
            reasons.push("Very small range suggests normalized/simulated data".to_string());
        }
        (LikelyCrs::UnitGrid, 0.95)
    } else if max_abs < 50.0 && x_range > 0.1 && y_range > 0.1 {
        reasons.push("Small coordinate values suggest arbitrary planar units".to_string());
        reasons.push(aspect_note(
            x_range,
            y_range,
            "Non-square aspect ratio suggests rectangular coordinate space",
            "Square-like aspect ratio suggests square coordinate space",
        ));
        (LikelyCrs::Planar, 0.8)
    } else if within(-180.0, 180.0, b.min_x)
        && within(-180.0, 180.0, b.max_x)
        && within(-90.0, 90.0, b.min_y)
        && within(-90.0, 90.0, b.max_y)
    {
        reasons.push("Coordinates are within valid longitude/latitude ranges".to_string());
        if x_range > 10.0 || y_range > 10.0 {
            reasons.push("Large coordinate range suggests continental/global scale".to_string());
        }
        (LikelyCrs::Wgs84, 0.7)
    } else if max_abs > 1_000_000.0 {
        reasons.push("Large coordinate values suggest projected coordinate system".to_string());
        if b.max_x.abs() < 20_037_508.0 && b.max_y.abs() < 20_037_508.0 {
            reasons.push("Values within Web Mercator bounds".to_string());
        }
        (LikelyCrs::WebMercator, 0.8)
    } else if max_abs > 100.0 {
        reasons.push("Moderate coordinate values suggest projected coordinate system".to_string());
        (LikelyCrs::Projected, 0.6)
    } else if x_range > 1.0 && y_range > 1.0 {
        reasons.push("Medium-range coordinates suggest planar coordinate system".to_string());
        reasons.push(aspect_note(
            x_range,
            y_range,
            "Rectangular aspect ratio",
            "Square-like aspect ratio",
        ));
        (LikelyCrs::Planar, 0.7)
    } else {
        reasons.push("Coordinate pattern does not match common systems".to_string());
        (LikelyCrs::Unknown, 0.3)
    };

    CrsDetection {
        likely_crs: crs,
        confidence,
        reasoning: reasons.join("; "),
        bounds: Some(b.to_array()),
        coordinate_count: points.len(),
        suggested_geographic_mode: suggested_geographic_mode(crs, &b),
    }
}

/// Best display mode for a detected system.
pub fn suggested_geographic_mode(crs: LikelyCrs, bounds: &Bounds2) -> GeographicMode {
    match crs {
        LikelyCrs::Wgs84 if in_eastern_extent(bounds) => GeographicMode::EasternHemisphere,
        _ => GeographicMode::UnitGrid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let d = detect_coordinate_system(&[]);
        assert_eq!(d.likely_crs, LikelyCrs::Unknown);
        assert_eq!(d.confidence, 0.0);
        assert_eq!(d.bounds, None);
    }

    #[test]
    fn test_unit_grid() {
        let d = detect_coordinate_system(&[(0.1, 0.2), (0.9, 0.8)]);
        assert_eq!(d.likely_crs, LikelyCrs::UnitGrid);
        assert_eq!(d.suggested_geographic_mode, GeographicMode::UnitGrid);
        assert_eq!(d.coordinate_count, 2);
    }

    #[test]
    fn test_small_planar() {
        let d = detect_coordinate_system(&[(-10.0, 2.0), (20.0, 8.0)]);
        assert_eq!(d.likely_crs, LikelyCrs::Planar);
        assert!(d.reasoning.contains("rectangular"));
    }

    #[test]
    fn test_wgs84_eastern() {
        let d = detect_coordinate_system(&[(10.0, 45.0), (120.0, -5.0)]);
        assert_eq!(d.likely_crs, LikelyCrs::Wgs84);
        assert_eq!(d.suggested_geographic_mode, GeographicMode::EasternHemisphere);
    }

    #[test]
    fn test_wgs84_western_suggests_grid() {
        let d = detect_coordinate_system(&[(-120.0, 35.0), (-70.0, 45.0)]);
        assert_eq!(d.likely_crs, LikelyCrs::Wgs84);
        assert_eq!(d.suggested_geographic_mode, GeographicMode::UnitGrid);
    }

    #[test]
    fn test_web_mercator_and_projected() {
        let d = detect_coordinate_system(&[(1_500_000.0, 6_000_000.0), (1_600_000.0, 6_100_000.0)]);
        assert_eq!(d.likely_crs, LikelyCrs::WebMercator);

        let d = detect_coordinate_system(&[(500.0, 200.0), (900.0, 400.0)]);
        assert_eq!(d.likely_crs, LikelyCrs::Projected);
    }

    #[test]
    fn test_serialized_names() {
        let d = detect_coordinate_system(&[(10.0, 45.0), (120.0, -5.0)]);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["likely_crs"], "EPSG:4326");
        assert_eq!(json["suggested_geographic_mode"], "eastern_hemisphere");
    }
}
