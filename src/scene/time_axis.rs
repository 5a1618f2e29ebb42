//! Time to z mapping for the 3D scene.
//!
//! Every law spreads the sorted unique times `t0 < ... < tn` over the same
//! total height `(n) * spacing`:
//!
//! - `equal`: one spacing step per unique time.
//! - `linear`: proportional to `time - t0`.
//! - `log`: proportional to `ln(time) - ln(t0)`, with times floored at
//!   [`LOG_EPSILON`] so a time of zero stays finite.
//!
//! Node z adds a constant base elevation and a small per-id jitter that
//! separates coincident nodes.

use crate::config::TemporalSpacingMode;
use crate::graph::NodeId;

/// Floor applied to times before taking a logarithm.
pub const LOG_EPSILON: f64 = 1e-4;

/// Deterministic per-node z offset in `[-0.01, 0.01)`.
pub fn jitter(id: NodeId) -> f64 {
    (id.raw() as f64 * 0.001) % 0.02 - 0.01
}

/// Time axis over one set of unique times.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    mode: TemporalSpacingMode,
    unique: Vec<f64>,
    spacing: f64,
    base_elevation: f64,
}

impl TimeAxis {
    pub fn new(
        times: impl IntoIterator<Item = f64>,
        mode: TemporalSpacingMode,
        spacing: f64,
        base_elevation: f64,
    ) -> Self {
        let mut unique: Vec<f64> = times.into_iter().filter(|t| t.is_finite()).collect();
        unique.sort_by(|a, b| a.total_cmp(b));
        unique.dedup();
        Self {
            mode,
            unique,
            spacing,
            base_elevation,
        }
    }

    /// Sorted unique times.
    pub fn unique_times(&self) -> &[f64] {
        &self.unique
    }

    /// Z span of the axis, before elevation.
    pub fn height(&self) -> f64 {
        self.unique.len().saturating_sub(1) as f64 * self.spacing
    }

    /// Z of a time under the active law, before elevation and jitter.
    ///
    /// Times between two unique times interpolate (equal law); times outside
    /// the axis clamp to its ends.
    pub fn z_raw(&self, time: f64) -> f64 {
        let (Some(&t0), Some(&tn)) = (self.unique.first(), self.unique.last()) else {
            return 0.0;
        };
        if self.unique.len() == 1 || !time.is_finite() {
            return 0.0;
        }
        let time = time.clamp(t0, tn);

        match self.mode {
            TemporalSpacingMode::Equal => self.fractional_index(time) * self.spacing,
            TemporalSpacingMode::Linear => (time - t0) / (tn - t0) * self.height(),
            TemporalSpacingMode::Log => {
                let ln0 = t0.max(LOG_EPSILON).ln();
                let span = tn.max(LOG_EPSILON).ln() - ln0;
                if span <= 0.0 {
                    return 0.0;
                }
                (time.max(LOG_EPSILON).ln() - ln0) / span * self.height()
            }
        }
    }

    /// Z of a plane at `time`: law plus base elevation.
    pub fn z_for_time(&self, time: f64) -> f64 {
        self.z_raw(time) + self.base_elevation
    }

    /// Z of a node: law, base elevation and jitter.
    pub fn z_for_node(&self, id: NodeId, time: f64) -> f64 {
        self.z_for_time(time) + jitter(id)
    }

    fn fractional_index(&self, time: f64) -> f64 {
        match self.unique.binary_search_by(|u| u.total_cmp(&time)) {
            Ok(i) => i as f64,
            Err(i) => {
                // 0 < i < len after clamping.
                let (lo, hi) = (self.unique[i - 1], self.unique[i]);
                (i - 1) as f64 + (time - lo) / (hi - lo)
            }
        }
    }
}
