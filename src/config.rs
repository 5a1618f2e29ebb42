//! Layout and scene configuration.
//!
//! Every field is optional on the JS side: objects are decoded with
//! `serde-wasm-bindgen` and missing keys fall back to the `Default` impls.

use serde::{Deserialize, Serialize};

use crate::geo::{GeographicMode, GeographicShape};

/// How sample nodes are ordered along the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SampleOrdering {
    /// Use `order_position` where both compared samples carry one, else degree.
    #[default]
    OrderPosition,
    /// Degree descending, ignoring any ordering hint.
    Degree,
    /// Ascending node id.
    Numeric,
}

/// Configuration for the 2D force-directed layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceLayoutConfig {
    /// Viewport width.
    pub width: f64,
    /// Viewport height.
    pub height: f64,
    /// Horizontal padding on each side.
    pub padding: f64,
    /// Fraction of the height kept free below the sample row.
    pub bottom_margin_ratio: f64,
    /// Vertical distance between time rows. Derived from the height when unset.
    pub time_spacing: Option<f64>,
    /// Share of each group's width actually used by its nodes.
    pub available_width_ratio: f64,
    /// How samples are ordered.
    pub sample_ordering: SampleOrdering,

    pub initial_alpha: f64,
    pub alpha_decay: f64,
    pub alpha_min: f64,
    pub alpha_target: f64,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f64,

    pub link_distance: f64,
    /// Link strength between two children of the same parent.
    pub sibling_link_strength: f64,
    /// Link strength when either end is a sample.
    pub sample_link_strength: f64,
    pub default_link_strength: f64,
    /// Many-body strength; negative repels.
    pub charge_strength: f64,
    pub x_strength: f64,
    pub y_strength: f64,
    pub collision_radius: f64,

    /// Maximum drag distance from the sibling average x.
    pub max_sibling_distance: f64,
    /// Descendant-range clamp runs every this many ticks.
    pub clamp_every_ticks: u32,
    /// Crossing reduction runs every this many ticks.
    pub crossing_every_ticks: u32,
    /// Crossing reduction touches at most this many nodes.
    pub crossing_node_limit: usize,
    /// Crossing reduction stops below this alpha.
    pub crossing_alpha_floor: f64,
    /// Crossing reduction step, multiplied by alpha.
    pub crossing_weight: f64,
    /// Frames re-clamp while alpha is above this.
    pub render_clamp_alpha: f64,
    /// Node radius used for hit testing.
    pub node_radius: f64,
}

impl Default for ForceLayoutConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            padding: 50.0,
            bottom_margin_ratio: 0.15,
            time_spacing: None,
            available_width_ratio: 0.8,
            sample_ordering: SampleOrdering::OrderPosition,
            initial_alpha: 0.8,
            alpha_decay: 0.05,
            alpha_min: 0.001,
            alpha_target: 0.0,
            velocity_decay: 0.7,
            link_distance: 50.0,
            sibling_link_strength: 0.9,
            sample_link_strength: 0.8,
            default_link_strength: 0.3,
            charge_strength: -20.0,
            x_strength: 0.15,
            y_strength: 1.0,
            collision_radius: 15.0,
            max_sibling_distance: 50.0,
            clamp_every_ticks: 3,
            crossing_every_ticks: 5,
            crossing_node_limit: 10,
            crossing_alpha_floor: 0.1,
            crossing_weight: 0.3,
            render_clamp_alpha: 0.1,
            node_radius: 8.0,
        }
    }
}

impl ForceLayoutConfig {
    /// Height above the bottom margin; the sample row sits here.
    pub fn available_height(&self) -> f64 {
        self.height * (1.0 - self.bottom_margin_ratio)
    }

    /// Row spacing for `layer_count` time layers.
    pub fn resolved_time_spacing(&self, layer_count: usize) -> f64 {
        if let Some(spacing) = self.time_spacing {
            return spacing;
        }
        let rows = layer_count.saturating_sub(1).max(1) as f64;
        ((self.available_height() - self.padding) / rows).max(1.0)
    }
}

/// Spacing law for the scene's time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemporalSpacingMode {
    /// One `temporalSpacing` step per unique time.
    #[default]
    Equal,
    /// Proportional to time, stretched over the same total height.
    Linear,
    /// Proportional to log time, stretched over the same total height.
    Log,
}

/// What a temporal filter does to out-of-range elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemporalFilterMode {
    /// Remove them.
    Hide,
    /// Keep them, dimmed.
    #[default]
    Planes,
}

/// Active time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalFilter {
    pub min_time: f64,
    pub max_time: f64,
    #[serde(default)]
    pub mode: TemporalFilterMode,
}

impl TemporalFilter {
    pub fn contains(&self, time: f64) -> bool {
        time >= self.min_time && time <= self.max_time
    }

    pub fn center(&self) -> f64 {
        (self.min_time + self.max_time) / 2.0
    }
}

/// Node size per tier, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSizes {
    pub sample: f64,
    pub root: f64,
    pub combined: f64,
    pub other: f64,
}

impl Default for NodeSizes {
    fn default() -> Self {
        Self {
            sample: 8.0,
            root: 10.0,
            combined: 7.0,
            other: 6.0,
        }
    }
}

/// Configuration for the 3D spatiotemporal scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneConfig {
    pub node_sizes: NodeSizes,
    pub edge_thickness: f64,
    pub temporal_spacing_mode: TemporalSpacingMode,
    /// Z distance per unique-time step.
    pub temporal_spacing: f64,
    /// Scene extent of the normalized spatial frame.
    pub spatial_spacing: f64,
    pub min_node_radius: f64,
    pub max_node_radius: f64,
    /// Constant z offset for every node.
    pub base_elevation: f64,
    pub temporal_filter: Option<TemporalFilter>,
    pub geographic_mode: GeographicMode,
    pub shape: Option<GeographicShape>,
    pub geographic_opacity: f64,
    pub temporal_grid_opacity: f64,
    /// Draw a grid slab at every unique time.
    pub show_temporal_planes: bool,
    /// Draw the plane at the centre of the temporal filter.
    pub show_reference_plane: bool,
    /// Cells per side of the synthetic unit grid.
    pub grid_size: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            node_sizes: NodeSizes::default(),
            edge_thickness: 1.0,
            temporal_spacing_mode: TemporalSpacingMode::Equal,
            temporal_spacing: 10.0,
            spatial_spacing: 100.0,
            min_node_radius: 1.0,
            max_node_radius: 20.0,
            base_elevation: 0.1,
            temporal_filter: None,
            geographic_mode: GeographicMode::UnitGrid,
            shape: None,
            geographic_opacity: 0.6,
            temporal_grid_opacity: 0.3,
            show_temporal_planes: false,
            show_reference_plane: true,
            grid_size: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_config_partial_json() {
        let cfg: ForceLayoutConfig =
            serde_json::from_str(r#"{"width": 1200, "sampleOrdering": "degree"}"#).unwrap();
        assert_eq!(cfg.width, 1200.0);
        assert_eq!(cfg.height, 600.0);
        assert_eq!(cfg.sample_ordering, SampleOrdering::Degree);
        assert_eq!(cfg.alpha_decay, 0.05);
    }

    #[test]
    fn test_time_spacing() {
        let cfg = ForceLayoutConfig::default();
        assert!((cfg.available_height() - 510.0).abs() < 1e-9);
        assert!((cfg.resolved_time_spacing(3) - 230.0).abs() < 1e-9);
        assert!((cfg.resolved_time_spacing(1) - 460.0).abs() < 1e-9);

        let fixed = ForceLayoutConfig {
            time_spacing: Some(40.0),
            ..Default::default()
        };
        assert_eq!(fixed.resolved_time_spacing(10), 40.0);
    }

    #[test]
    fn test_scene_config_partial_json() {
        let cfg: SceneConfig = serde_json::from_str(
            r#"{"temporalSpacingMode": "log", "temporalFilter": {"minTime": 1, "maxTime": 5},
                "geographicMode": "eastern_hemisphere"}"#,
        )
        .unwrap();
        assert_eq!(cfg.temporal_spacing_mode, TemporalSpacingMode::Log);
        assert_eq!(cfg.geographic_mode, GeographicMode::EasternHemisphere);
        let filter = cfg.temporal_filter.unwrap();
        assert_eq!(filter.mode, TemporalFilterMode::Planes);
        assert!(filter.contains(5.0));
        assert_eq!(filter.center(), 3.0);
        assert_eq!(cfg.spatial_spacing, 100.0);
    }
}
