//! Orbit camera state for the 3D scene.
//!
//! The view state is plain data owned next to the projector. Changing it
//! never touches the projected scene; every change is reported as a
//! [`ViewStatePatch`] holding only the fields that actually moved.

use serde::{Deserialize, Serialize};

use super::projection::SceneBounds;

/// Allowed zoom levels (log2 scale).
pub const ZOOM_EXTENT: (f64, f64) = (-5.0, 10.0);

/// Zoom used when focusing a node.
pub const FOCUS_ZOOM: f64 = 2.0;

const DEFAULT_ROTATION_X: f64 = 30.0;
const DEFAULT_ROTATION_ORBIT: f64 = 30.0;

/// Orbit camera around `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitViewState {
    pub target: [f64; 3],
    pub zoom: f64,
    /// Elevation in degrees, `[0, 90]`.
    pub rotation_x: f64,
    /// Azimuth in degrees, `[0, 360)`.
    pub rotation_orbit: f64,
    pub orbit_axis: String,
}

impl Default for OrbitViewState {
    fn default() -> Self {
        Self {
            target: [0.0, 0.0, 0.0],
            zoom: 1.0,
            rotation_x: DEFAULT_ROTATION_X,
            rotation_orbit: DEFAULT_ROTATION_ORBIT,
            orbit_axis: "Y".to_string(),
        }
    }
}

/// Partial view state, as sent by the host or reported back to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewStatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_orbit: Option<f64>,
}

impl ViewStatePatch {
    pub fn is_empty(&self) -> bool {
        self.target.is_none()
            && self.zoom.is_none()
            && self.rotation_x.is_none()
            && self.rotation_orbit.is_none()
    }
}

/// Named camera presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPreset {
    /// Straight down on the ground plane.
    Top,
    /// Level with the ground, time axis vertical.
    Side,
    Angled,
    /// Back to the default rotation and zoom.
    Reset,
}

impl ViewPreset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "top" => Some(Self::Top),
            "side" => Some(Self::Side),
            "angled" => Some(Self::Angled),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }

    fn patch(self) -> ViewStatePatch {
        let (rotation_x, rotation_orbit, zoom) = match self {
            Self::Top => (90.0, 0.0, None),
            Self::Side => (0.0, 0.0, None),
            Self::Angled => (45.0, 45.0, None),
            Self::Reset => (DEFAULT_ROTATION_X, DEFAULT_ROTATION_ORBIT, Some(1.0)),
        };
        ViewStatePatch {
            target: None,
            zoom,
            rotation_x: Some(rotation_x),
            rotation_orbit: Some(rotation_orbit),
        }
    }
}

fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

impl OrbitViewState {
    /// Merge a patch, clamping and wrapping as needed.
    ///
    /// Returns the fields that changed, with their final values. Non-finite
    /// values in the patch are ignored.
    pub fn apply(&mut self, patch: &ViewStatePatch) -> ViewStatePatch {
        let mut changed = ViewStatePatch::default();

        if let Some(target) = patch.target.filter(|t| t.iter().all(|v| v.is_finite())) {
            if target != self.target {
                self.target = target;
                changed.target = Some(target);
            }
        }
        if let Some(zoom) = patch.zoom.filter(|z| z.is_finite()) {
            let zoom = zoom.clamp(ZOOM_EXTENT.0, ZOOM_EXTENT.1);
            if zoom != self.zoom {
                self.zoom = zoom;
                changed.zoom = Some(zoom);
            }
        }
        if let Some(rx) = patch.rotation_x.filter(|r| r.is_finite()) {
            let rx = rx.clamp(0.0, 90.0);
            if rx != self.rotation_x {
                self.rotation_x = rx;
                changed.rotation_x = Some(rx);
            }
        }
        if let Some(ro) = patch.rotation_orbit.filter(|r| r.is_finite()) {
            let ro = wrap_degrees(ro);
            if ro != self.rotation_orbit {
                self.rotation_orbit = ro;
                changed.rotation_orbit = Some(ro);
            }
        }

        changed
    }

    /// Move the target to the centre of `bounds`, keeping rotation and zoom.
    pub fn center_on(&mut self, bounds: &SceneBounds) -> ViewStatePatch {
        self.apply(&ViewStatePatch {
            target: Some(bounds.center()),
            ..Default::default()
        })
    }

    pub fn preset(&mut self, preset: ViewPreset) -> ViewStatePatch {
        self.apply(&preset.patch())
    }

    pub fn zoom_by(&mut self, delta: f64) -> ViewStatePatch {
        self.apply(&ViewStatePatch {
            zoom: Some(self.zoom + delta),
            ..Default::default()
        })
    }

    /// Look at `position` from [`FOCUS_ZOOM`].
    pub fn focus_on(&mut self, position: [f64; 3]) -> ViewStatePatch {
        self.apply(&ViewStatePatch {
            target: Some(position),
            zoom: Some(FOCUS_ZOOM),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_and_wrap() {
        let mut view = OrbitViewState::default();
        let changed = view.apply(&ViewStatePatch {
            rotation_x: Some(120.0),
            rotation_orbit: Some(-30.0),
            zoom: Some(50.0),
            ..Default::default()
        });
        assert_eq!(view.rotation_x, 90.0);
        assert_eq!(view.rotation_orbit, 330.0);
        assert_eq!(view.zoom, ZOOM_EXTENT.1);
        assert_eq!(changed.rotation_orbit, Some(330.0));

        view.apply(&ViewStatePatch {
            rotation_orbit: Some(725.0),
            rotation_x: Some(-4.0),
            ..Default::default()
        });
        assert_eq!(view.rotation_orbit, 5.0);
        assert_eq!(view.rotation_x, 0.0);
    }

    #[test]
    fn test_apply_reports_only_changes() {
        let mut view = OrbitViewState::default();
        let changed = view.apply(&ViewStatePatch {
            zoom: Some(1.0),
            rotation_x: Some(f64::NAN),
            ..Default::default()
        });
        assert!(changed.is_empty());
        assert_eq!(view, OrbitViewState::default());
    }

    #[test]
    fn test_center_keeps_rotation_and_zoom() {
        let mut view = OrbitViewState {
            zoom: 3.0,
            rotation_x: 60.0,
            ..Default::default()
        };
        let bounds = SceneBounds {
            min: [-10.0, 0.0, 0.0],
            max: [30.0, 20.0, 10.0],
        };
        let changed = view.center_on(&bounds);
        assert_eq!(view.target, [10.0, 10.0, 5.0]);
        assert_eq!(view.zoom, 3.0);
        assert_eq!(view.rotation_x, 60.0);
        assert_eq!(
            changed,
            ViewStatePatch {
                target: Some([10.0, 10.0, 5.0]),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_presets() {
        assert_eq!(ViewPreset::from_name("top"), Some(ViewPreset::Top));
        assert_eq!(ViewPreset::from_name("sideways"), None);

        let mut view = OrbitViewState::default();
        view.preset(ViewPreset::Top);
        assert_eq!((view.rotation_x, view.rotation_orbit), (90.0, 0.0));
        view.zoom_by(2.5);
        assert_eq!(view.zoom, 3.5);
        view.preset(ViewPreset::Reset);
        assert_eq!(view, OrbitViewState::default());
    }

    #[test]
    fn test_focus_on() {
        let mut view = OrbitViewState::default();
        view.focus_on([1.0, 2.0, 3.0]);
        assert_eq!(view.target, [1.0, 2.0, 3.0]);
        assert_eq!(view.zoom, FOCUS_ZOOM);
    }

    #[test]
    fn test_patch_json() {
        let patch: ViewStatePatch = serde_json::from_str(r#"{"rotationOrbit": 90}"#).unwrap();
        assert_eq!(patch.rotation_orbit, Some(90.0));
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"rotationOrbit":90.0}"#);
    }
}
