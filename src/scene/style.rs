//! Node tiers, palette and temporal-filter opacity for the 3D scene.

use serde::Serialize;

use crate::config::{NodeSizes, SceneConfig, TemporalFilter, TemporalFilterMode};

/// RGBA color, 0-255 per channel.
pub type Rgba = [u8; 4];

pub const SAMPLE_COLOR: Rgba = [20, 184, 166, 255];
pub const COMBINED_COLOR: Rgba = [245, 158, 11, 255];
pub const ROOT_COLOR: Rgba = [239, 68, 68, 255];
pub const NODE_COLOR: Rgba = [99, 102, 241, 255];
pub const EDGE_COLOR: Rgba = [148, 163, 184, 255];

/// Opacity factor for a node outside the temporal filter.
pub const DIM_NODE: f64 = 0.5;
/// Opacity factor for an edge with one end outside the filter.
pub const DIM_EDGE_ONE_END: f64 = 0.5;
/// Opacity factor for an edge with both ends outside the filter.
pub const DIM_EDGE_BOTH_ENDS: f64 = 0.2;

/// Visual tier of a node. Earlier tiers win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeTier {
    Sample,
    Combined,
    Root,
    Other,
}

impl NodeTier {
    pub fn classify(is_sample: bool, is_combined: bool, is_root: bool) -> Self {
        if is_sample {
            Self::Sample
        } else if is_combined {
            Self::Combined
        } else if is_root {
            Self::Root
        } else {
            Self::Other
        }
    }

    pub fn color(self) -> Rgba {
        match self {
            Self::Sample => SAMPLE_COLOR,
            Self::Combined => COMBINED_COLOR,
            Self::Root => ROOT_COLOR,
            Self::Other => NODE_COLOR,
        }
    }

    pub fn size(self, sizes: &NodeSizes) -> f64 {
        match self {
            Self::Sample => sizes.sample,
            Self::Combined => sizes.combined,
            Self::Root => sizes.root,
            Self::Other => sizes.other,
        }
    }

    /// Pixel radius, clamped to the configured radius bounds.
    pub fn radius(self, config: &SceneConfig) -> f64 {
        let lo = config.min_node_radius;
        let hi = config.max_node_radius.max(lo);
        self.size(&config.node_sizes).clamp(lo, hi)
    }
}

/// Whether a time passes the filter. No filter passes everything.
pub fn in_filter(filter: Option<&TemporalFilter>, time: f64) -> bool {
    filter.is_none_or(|f| f.contains(time))
}

/// Node opacity under the filter; only `planes` mode dims.
pub fn node_opacity(filter: Option<&TemporalFilter>, time: f64) -> f64 {
    match filter {
        Some(f) if f.mode == TemporalFilterMode::Planes && !f.contains(time) => DIM_NODE,
        _ => 1.0,
    }
}

/// Edge opacity given which ends pass the filter.
pub fn edge_opacity(filter: Option<&TemporalFilter>, source_in: bool, target_in: bool) -> f64 {
    match filter {
        Some(f) if f.mode == TemporalFilterMode::Planes => match (source_in, target_in) {
            (true, true) => 1.0,
            (false, false) => DIM_EDGE_BOTH_ENDS,
            _ => DIM_EDGE_ONE_END,
        },
        _ => 1.0,
    }
}

/// Scale a color's alpha channel.
pub fn with_opacity(color: Rgba, opacity: f64) -> Rgba {
    let [r, g, b, a] = color;
    let alpha = (a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
    [r, g, b, alpha]
}
