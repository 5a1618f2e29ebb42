//! Geography overlays for the 3D scene.
//!
//! The ground layer draws the active geography under the nodes. Optional
//! grid slabs repeat it at every unique time, and a reference plane marks
//! the centre of the temporal filter. All layers share one set of
//! normalized segments, which is cached because shapes can hold thousands
//! of rings and rarely change between projections.

use serde::{Serialize, Serializer};
use std::rc::Rc;

use crate::config::SceneConfig;
use crate::geo::{
    eastern_hemisphere_outline, generate_grid, normalized_segments, shape_bounds, GeographicMode,
    GeographicShape, NormalizationFrame, Segment,
};

use super::projection::{Scene3D, SceneStatus};

/// Cached segment sets kept at most.
const SEGMENT_CACHE_CAPACITY: usize = 8;

/// Shape the scene frames against, if any.
///
/// `unit_grid` never uses a shape. `eastern_hemisphere` falls back to the
/// built-in outline when no shape was supplied.
pub fn resolved_shape(config: &SceneConfig) -> Option<GeographicShape> {
    match config.geographic_mode {
        GeographicMode::UnitGrid => None,
        GeographicMode::EasternHemisphere => Some(
            config
                .shape
                .clone()
                .unwrap_or_else(eastern_hemisphere_outline),
        ),
        GeographicMode::Custom => config.shape.clone(),
    }
}

/// Normalized segments keyed by shape and frame.
#[derive(Debug, Default)]
pub struct SegmentCache {
    entries: Vec<(GeographicShape, NormalizationFrame, Rc<Vec<Segment>>)>,
    misses: u64,
}

impl SegmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of segment sets computed so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Segments of `shape` through `frame`, computed on first use.
    pub fn segments(&mut self, shape: &GeographicShape, frame: &NormalizationFrame) -> Rc<Vec<Segment>> {
        if let Some((_, _, segments)) = self
            .entries
            .iter()
            .find(|(s, f, _)| f == frame && s == shape)
        {
            return Rc::clone(segments);
        }

        let segments = Rc::new(normalized_segments(shape, frame));
        self.misses += 1;
        if self.entries.len() >= SEGMENT_CACHE_CAPACITY {
            self.entries.remove(0);
        }
        self.entries
            .push((shape.clone(), *frame, Rc::clone(&segments)));
        segments
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// What an overlay layer marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlayKind {
    Ground,
    TimeSlab,
    ReferencePlane,
}

fn serialize_segments<S: Serializer>(segments: &Rc<Vec<Segment>>, s: S) -> Result<S::Ok, S::Error> {
    segments.as_slice().serialize(s)
}

/// One flat layer of line segments at a fixed z.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayLayer {
    pub kind: OverlayKind,
    pub z: f64,
    /// Time the layer stands for; `None` for the ground.
    pub time: Option<f64>,
    pub opacity: f64,
    #[serde(serialize_with = "serialize_segments")]
    pub segments: Rc<Vec<Segment>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneOverlays {
    pub layers: Vec<OverlayLayer>,
}

impl SceneOverlays {
    pub fn layer(&self, kind: OverlayKind) -> impl Iterator<Item = &OverlayLayer> {
        self.layers.iter().filter(move |l| l.kind == kind)
    }
}

/// Build the overlay layers for a projected scene.
pub fn build_overlays(scene: &Scene3D, config: &SceneConfig, cache: &mut SegmentCache) -> SceneOverlays {
    let (Some(frame), Some(axis)) = (scene.frame.as_ref(), scene.axis.as_ref()) else {
        return SceneOverlays::default();
    };
    if scene.status == SceneStatus::NoSpatialData {
        return SceneOverlays::default();
    }

    let segments = match resolved_shape(config) {
        Some(shape) => cache.segments(&shape, frame),
        None => {
            // The grid spans the data extent: its own frame maps [0, 1] to
            // the same spatial spacing as the nodes.
            let grid = generate_grid(config.grid_size);
            let grid_frame = shape_bounds(&grid)
                .map(|b| NormalizationFrame::from_bounds(b, config.spatial_spacing))
                .unwrap_or(*frame);
            cache.segments(&grid, &grid_frame)
        }
    };

    let mut layers = vec![OverlayLayer {
        kind: OverlayKind::Ground,
        z: 0.0,
        time: None,
        opacity: config.geographic_opacity,
        segments: Rc::clone(&segments),
    }];

    if config.show_temporal_planes {
        layers.extend(axis.unique_times().iter().map(|&t| OverlayLayer {
            kind: OverlayKind::TimeSlab,
            z: axis.z_for_time(t),
            time: Some(t),
            opacity: config.temporal_grid_opacity,
            segments: Rc::clone(&segments),
        }));
    }

    if let (true, Some(filter)) = (config.show_reference_plane, config.temporal_filter.as_ref()) {
        let t = filter.center();
        layers.push(OverlayLayer {
            kind: OverlayKind::ReferencePlane,
            z: axis.z_for_time(t),
            time: Some(t),
            opacity: config.temporal_grid_opacity,
            segments,
        });
    }

    SceneOverlays { layers }
}
