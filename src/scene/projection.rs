//! Projection of an ARG snapshot into a 3D spatiotemporal scene.
//!
//! x and y come from each node's location, normalized into a frame of
//! `spatial_spacing` scene units; z comes from the node's time. Nodes without
//! a finite location are left out, and so are edges touching them.

use serde::Serialize;
use std::collections::HashMap;

use crate::config::{SceneConfig, TemporalFilterMode};
use crate::geo::{shape_bounds, Bounds2, NormalizationFrame};
use crate::graph::{ArgIndex, GraphData, GraphEdge, GraphNode, NodeId};

use super::overlay::{build_overlays, resolved_shape, SceneOverlays, SegmentCache};
use super::style::{self, NodeTier, Rgba};
use super::time_axis::TimeAxis;

/// Whether the scene has anything to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SceneStatus {
    Ready,
    /// No node has a location; the host shows an explicit empty state.
    NoSpatialData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node3D {
    pub id: NodeId,
    pub position: [f64; 3],
    pub time: f64,
    pub tier: NodeTier,
    pub color: Rgba,
    pub radius: f64,
    pub opacity: f64,
    pub is_sample: bool,
    pub is_combined: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge3D {
    pub source: NodeId,
    pub target: NodeId,
    pub source_position: [f64; 3],
    pub target_position: [f64; 3],
    pub color: Rgba,
    pub width: f64,
    pub opacity: f64,
}

/// Axis-aligned scene bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SceneBounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl SceneBounds {
    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    fn around(points: impl IntoIterator<Item = [f64; 3]>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self { min: p, max: p },
                Some(b) => Self {
                    min: [b.min[0].min(p[0]), b.min[1].min(p[1]), b.min[2].min(p[2])],
                    max: [b.max[0].max(p[0]), b.max[1].max(p[1]), b.max[2].max(p[2])],
                },
            })
        })
    }
}

/// Projected scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene3D {
    pub status: SceneStatus,
    pub nodes: Vec<Node3D>,
    pub edges: Vec<Edge3D>,
    pub bounds: Option<SceneBounds>,
    /// Frame used to normalize locations.
    #[serde(skip)]
    pub frame: Option<NormalizationFrame>,
    /// Time axis over the spatial nodes.
    #[serde(skip)]
    pub axis: Option<TimeAxis>,
}

impl Scene3D {
    fn empty() -> Self {
        Self {
            status: SceneStatus::NoSpatialData,
            nodes: Vec::new(),
            edges: Vec::new(),
            bounds: None,
            frame: None,
            axis: None,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node3D> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Project nodes and edges into scene space.
pub fn project(nodes: &[GraphNode], edges: &[GraphEdge], config: &SceneConfig) -> Scene3D {
    let spatial: Vec<(&GraphNode, (f64, f64))> = nodes
        .iter()
        .filter_map(|n| n.spatial_xy().map(|xy| (n, xy)))
        .collect();
    let Some(data_bounds) = Bounds2::from_points(spatial.iter().map(|(_, xy)| *xy)) else {
        log::info!("no nodes with spatial data, scene left empty");
        return Scene3D::empty();
    };

    let frame_bounds = if config.geographic_mode.uses_shape_frame() {
        resolved_shape(config)
            .and_then(|shape| shape_bounds(&shape))
            .unwrap_or(data_bounds)
    } else {
        data_bounds
    };
    let frame = NormalizationFrame::from_bounds(frame_bounds, config.spatial_spacing);
    let axis = TimeAxis::new(
        spatial.iter().map(|(n, _)| n.time),
        config.temporal_spacing_mode,
        config.temporal_spacing,
        config.base_elevation,
    );

    let index = ArgIndex::new(nodes, edges);
    let filter = config.temporal_filter.as_ref();
    let hide = filter.is_some_and(|f| f.mode == TemporalFilterMode::Hide);

    let mut out_nodes = Vec::with_capacity(spatial.len());
    let mut placed: HashMap<NodeId, (usize, bool)> = HashMap::with_capacity(spatial.len());
    for (node, (x, y)) in spatial {
        let inside = style::in_filter(filter, node.time);
        if (hide && !inside) || placed.contains_key(&node.id) {
            continue;
        }
        let tier = NodeTier::classify(node.is_sample, node.is_combined, index.is_root(node.id));
        let opacity = style::node_opacity(filter, node.time);
        let [sx, sy] = frame.apply(x, y);

        placed.insert(node.id, (out_nodes.len(), inside));
        out_nodes.push(Node3D {
            id: node.id,
            position: [sx, sy, axis.z_for_node(node.id, node.time)],
            time: node.time,
            tier,
            color: style::with_opacity(tier.color(), opacity),
            radius: tier.radius(config),
            opacity,
            is_sample: node.is_sample,
            is_combined: node.is_combined,
        });
    }

    let out_edges: Vec<Edge3D> = edges
        .iter()
        .filter_map(|edge| {
            let &(s, s_in) = placed.get(&edge.source)?;
            let &(t, t_in) = placed.get(&edge.target)?;
            let opacity = style::edge_opacity(filter, s_in, t_in);
            Some(Edge3D {
                source: edge.source,
                target: edge.target,
                source_position: out_nodes[s].position,
                target_position: out_nodes[t].position,
                color: style::with_opacity(style::EDGE_COLOR, opacity),
                width: config.edge_thickness,
                opacity,
            })
        })
        .collect();

    let bounds = SceneBounds::around(out_nodes.iter().map(|n| n.position));
    log::debug!(
        "projected {} nodes and {} edges ({:?} spacing)",
        out_nodes.len(),
        out_edges.len(),
        config.temporal_spacing_mode
    );

    Scene3D {
        status: SceneStatus::Ready,
        nodes: out_nodes,
        edges: out_edges,
        bounds,
        frame: Some(frame),
        axis: Some(axis),
    }
}

/// Memoized projection over one data snapshot.
///
/// The scene is recomputed only when the data or the config changes; camera
/// movement goes through the view state and never reaches the projector.
#[derive(Default)]
pub struct SceneProjector {
    data: GraphData,
    revision: u64,
    cache: Option<(u64, SceneConfig, Scene3D)>,
    segments: SegmentCache,
    recomputations: u64,
}

impl SceneProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot. The next projection recomputes.
    pub fn set_data(&mut self, data: GraphData) {
        self.data = data;
        self.revision += 1;
    }

    pub fn data(&self) -> &GraphData {
        &self.data
    }

    /// Number of times the scene was actually computed.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Last projected scene, if any.
    pub fn scene(&self) -> Option<&Scene3D> {
        self.cache.as_ref().map(|(_, _, scene)| scene)
    }

    /// Scene for `config`, reusing the cached one when nothing changed.
    pub fn project(&mut self, config: &SceneConfig) -> &Scene3D {
        let fresh = matches!(
            &self.cache,
            Some((revision, cached, _)) if *revision == self.revision && cached == config
        );
        if !fresh {
            self.cache = None;
        }
        let revision = self.revision;
        let data = &self.data;
        let recomputations = &mut self.recomputations;
        let (_, _, scene) = self.cache.get_or_insert_with(|| {
            *recomputations += 1;
            (revision, config.clone(), project(&data.nodes, &data.edges, config))
        });
        scene
    }

    /// Overlay layers for the scene under `config`.
    pub fn overlays(&mut self, config: &SceneConfig) -> SceneOverlays {
        self.project(config);
        match &self.cache {
            Some((_, _, scene)) => build_overlays(scene, config, &mut self.segments),
            None => SceneOverlays::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TemporalFilter, TemporalSpacingMode};
    use crate::geo::{GeographicMode, GeographicShape};

    fn located() -> (Vec<GraphNode>, Vec<GraphEdge>) {
        let nodes = vec![
            GraphNode::new(0, 0.0, true).with_location(0.0, 0.0),
            GraphNode::new(1, 0.0, true).with_location(4.0, 2.0),
            GraphNode::new(2, 1.0, false).with_location(2.0, 1.0),
            GraphNode::new(3, 2.0, false).with_location(1.0, 1.0),
            GraphNode::new(4, 2.0, false),
        ];
        let edges = vec![
            GraphEdge::new(2, 0),
            GraphEdge::new(2, 1),
            GraphEdge::new(3, 2),
            GraphEdge::new(4, 2),
        ];
        (nodes, edges)
    }

    #[test]
    fn test_positions_and_tiers() {
        let (nodes, edges) = located();
        let scene = project(&nodes, &edges, &SceneConfig::default());
        assert_eq!(scene.status, SceneStatus::Ready);
        assert_eq!(scene.nodes.len(), 4);
        // Edge from unlocated node 4 is dropped.
        assert_eq!(scene.edges.len(), 3);

        // Bounds [0,0]-[4,2]: centre (2,1), scale 4, spacing 100.
        let n1 = scene.node(NodeId(1)).unwrap();
        assert_eq!(&n1.position[..2], &[50.0, 25.0]);
        assert_eq!(&scene.node(NodeId(2)).unwrap().position[..2], &[0.0, 0.0]);

        assert_eq!(scene.node(NodeId(0)).unwrap().tier, NodeTier::Sample);
        assert_eq!(scene.node(NodeId(3)).unwrap().tier, NodeTier::Root);
        assert_eq!(scene.node(NodeId(2)).unwrap().tier, NodeTier::Other);

        // Equal law over times {0, 1, 2}.
        let z = scene.node(NodeId(3)).unwrap().position[2];
        assert!((z - 20.1).abs() <= 0.01 + 1e-12);
    }

    #[test]
    fn test_no_spatial_data() {
        let nodes = vec![GraphNode::new(0, 0.0, true)];
        let scene = project(&nodes, &[], &SceneConfig::default());
        assert_eq!(scene.status, SceneStatus::NoSpatialData);
        assert!(scene.nodes.is_empty() && scene.edges.is_empty());
        assert!(scene.bounds.is_none());
    }

    #[test]
    fn test_degenerate_bounds_fall_back_to_unit_scale() {
        let nodes = vec![GraphNode::new(0, 0.0, true).with_location(3.0, 3.0)];
        let scene = project(&nodes, &[], &SceneConfig::default());
        assert_eq!(&scene.nodes[0].position[..2], &[0.0, 0.0]);
        assert_eq!(scene.frame.unwrap().scale, 1.0);
    }

    #[test]
    fn test_shape_bounds_frame() {
        let (nodes, edges) = located();
        let mut shape = GeographicShape::geometry(
            "Polygon",
            crate::geo::Coordinates::Rings(vec![vec![vec![0.0, 0.0], vec![10.0, 0.0], vec![0.0, 10.0]]]),
        );
        shape.bounds = Some([0.0, 0.0, 10.0, 10.0]);
        let cfg = SceneConfig {
            geographic_mode: GeographicMode::Custom,
            shape: Some(shape),
            ..Default::default()
        };
        let scene = project(&nodes, &edges, &cfg);
        // Centre (5,5), scale 10.
        assert_eq!(&scene.node(NodeId(0)).unwrap().position[..2], &[-50.0, -50.0]);

        // Unit grid mode ignores the shape.
        let grid = SceneConfig {
            geographic_mode: GeographicMode::UnitGrid,
            ..cfg
        };
        let scene = project(&nodes, &edges, &grid);
        assert_eq!(&scene.node(NodeId(0)).unwrap().position[..2], &[-50.0, -25.0]);
    }

    #[test]
    fn test_temporal_filter_modes() {
        let (nodes, edges) = located();
        let planes = SceneConfig {
            temporal_filter: Some(TemporalFilter {
                min_time: 0.0,
                max_time: 1.0,
                mode: TemporalFilterMode::Planes,
            }),
            ..Default::default()
        };
        let scene = project(&nodes, &edges, &planes);
        assert_eq!(scene.nodes.len(), 4);
        assert_eq!(scene.node(NodeId(3)).unwrap().opacity, 0.5);
        let edge_32 = scene.edges.iter().find(|e| e.source == NodeId(3)).unwrap();
        assert_eq!(edge_32.opacity, 0.5);

        let hide = SceneConfig {
            temporal_filter: planes.temporal_filter.map(|f| TemporalFilter {
                mode: TemporalFilterMode::Hide,
                ..f
            }),
            ..Default::default()
        };
        let scene = project(&nodes, &edges, &hide);
        assert_eq!(scene.nodes.len(), 3);
        assert!(scene.edges.iter().all(|e| e.source != NodeId(3)));
    }

    #[test]
    fn test_projector_memoizes() {
        let (nodes, edges) = located();
        let mut projector = SceneProjector::new();
        projector.set_data(GraphData::new(nodes, edges));

        let cfg = SceneConfig::default();
        projector.project(&cfg);
        projector.project(&cfg);
        assert_eq!(projector.recomputations(), 1);

        let log_cfg = SceneConfig {
            temporal_spacing_mode: TemporalSpacingMode::Log,
            ..Default::default()
        };
        projector.project(&log_cfg);
        assert_eq!(projector.recomputations(), 2);

        let overlays = projector.overlays(&log_cfg);
        assert_eq!(overlays.layers.len(), 1);
        assert_eq!(projector.recomputations(), 2);

        let data = projector.data().clone();
        projector.set_data(data);
        projector.project(&log_cfg);
        assert_eq!(projector.recomputations(), 3);
    }
}
