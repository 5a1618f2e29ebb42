//! Zoom and pan for the 2D view.
//!
//! A [`ZoomTransform`] maps layout space to screen space as
//! `screen = layout * k + (x, y)`. Animated changes are [`ZoomTransition`]s
//! that the host samples once per frame with the elapsed time.

use serde::{Deserialize, Serialize};

/// Allowed zoom scale.
pub const SCALE_EXTENT: (f64, f64) = (0.1, 4.0);

/// Scale used when focusing a single node.
pub const FOCUS_SCALE: f64 = 1.5;

/// Duration of focus and fit animations, in milliseconds.
pub const FOCUS_DURATION_MS: f64 = 750.0;

/// Scale bounds when fitting the whole graph.
pub const FIT_SCALE_MIN: f64 = 0.2;
pub const FIT_SCALE_MAX: f64 = 1.5;

/// Share of the viewport the fitted graph may fill.
const FIT_FILL: f64 = 0.9;

/// Affine zoom transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    /// Same transform with the scale clamped to [`SCALE_EXTENT`].
    pub fn clamped(self) -> Self {
        let k = if self.k.is_finite() { self.k } else { 1.0 };
        Self {
            k: k.clamp(SCALE_EXTENT.0, SCALE_EXTENT.1),
            ..self
        }
    }

    /// Layout point to screen point.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.k + self.x, y * self.k + self.y)
    }

    /// Screen point to layout point.
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.x) / self.k, (y - self.y) / self.k)
    }

    /// Transform that centres `point` in the viewport at [`FOCUS_SCALE`].
    pub fn focus_on(point: (f64, f64), width: f64, height: f64) -> Self {
        Self {
            x: width / 2.0 - point.0 * FOCUS_SCALE,
            y: height / 2.0 - point.1 * FOCUS_SCALE,
            k: FOCUS_SCALE,
        }
    }

    /// Transform that fits every point in the viewport, `None` for no points.
    pub fn fit_all(points: &[(f64, f64)], width: f64, height: f64) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let w = if max_x > min_x { max_x - min_x } else { 1.0 };
        let h = if max_y > min_y { max_y - min_y } else { 1.0 };
        let k = (FIT_FILL * (width / w).min(height / h)).clamp(FIT_SCALE_MIN, FIT_SCALE_MAX);
        let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);

        Some(Self {
            x: width / 2.0 - cx * k,
            y: height / 2.0 - cy * k,
            k,
        })
    }
}

/// Cubic in-out easing over `[0, 1]`.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// Animated move between two transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransition {
    pub from: ZoomTransform,
    pub to: ZoomTransform,
    pub duration_ms: f64,
}

impl ZoomTransition {
    pub fn new(from: ZoomTransform, to: ZoomTransform, duration_ms: f64) -> Self {
        Self {
            from,
            to,
            duration_ms,
        }
    }

    /// Transform `elapsed_ms` into the transition.
    pub fn at(&self, elapsed_ms: f64) -> ZoomTransform {
        if self.is_finished(elapsed_ms) {
            return self.to;
        }
        let e = ease_cubic_in_out(elapsed_ms / self.duration_ms);
        let lerp = |a: f64, b: f64| a + (b - a) * e;
        ZoomTransform {
            x: lerp(self.from.x, self.to.x),
            y: lerp(self.from.y, self.to.y),
            k: lerp(self.from.k, self.to.k),
        }
    }

    pub fn is_finished(&self, elapsed_ms: f64) -> bool {
        self.duration_ms <= 0.0 || elapsed_ms >= self.duration_ms
    }
}

/// Current transform plus at most one running transition.
#[derive(Debug, Clone, Default)]
pub struct ZoomController {
    transform: ZoomTransform,
    transition: Option<ZoomTransition>,
}

impl ZoomController {
    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Jump to `transform` (user zoom or pan), cancelling any animation.
    pub fn set(&mut self, transform: ZoomTransform) {
        self.transform = transform.clamped();
        self.transition = None;
    }

    /// Start animating from the current transform to `target`.
    pub fn animate_to(&mut self, target: ZoomTransform, duration_ms: f64) {
        self.transition = Some(ZoomTransition::new(self.transform, target.clamped(), duration_ms));
    }

    /// Sample the running animation. Finishing it makes the target current.
    pub fn advance(&mut self, elapsed_ms: f64) -> ZoomTransform {
        if let Some(transition) = self.transition {
            self.transform = transition.at(elapsed_ms);
            if transition.is_finished(elapsed_ms) {
                self.transition = None;
            }
        }
        self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_invert() {
        let t = ZoomTransform {
            x: 10.0,
            y: -5.0,
            k: 2.0,
        };
        assert_eq!(t.apply(3.0, 4.0), (16.0, 3.0));
        assert_eq!(t.invert(16.0, 3.0), (3.0, 4.0));
    }

    #[test]
    fn test_scale_extent() {
        let t = ZoomTransform { k: 10.0, ..ZoomTransform::IDENTITY };
        assert_eq!(t.clamped().k, 4.0);
        let t = ZoomTransform { k: 0.01, ..ZoomTransform::IDENTITY };
        assert_eq!(t.clamped().k, 0.1);
    }

    #[test]
    fn test_focus_centres_node() {
        let t = ZoomTransform::focus_on((100.0, 200.0), 800.0, 600.0);
        assert_eq!(t.k, FOCUS_SCALE);
        assert_eq!(t.apply(100.0, 200.0), (400.0, 300.0));
    }

    #[test]
    fn test_fit_all_within_bounds() {
        assert_eq!(ZoomTransform::fit_all(&[], 800.0, 600.0), None);

        // Huge extent hits the lower clamp.
        let wide = ZoomTransform::fit_all(&[(0.0, 0.0), (100_000.0, 10.0)], 800.0, 600.0).unwrap();
        assert_eq!(wide.k, FIT_SCALE_MIN);

        // A single point hits the upper clamp and is centred.
        let one = ZoomTransform::fit_all(&[(50.0, 50.0)], 800.0, 600.0).unwrap();
        assert_eq!(one.k, FIT_SCALE_MAX);
        assert_eq!(one.apply(50.0, 50.0), (400.0, 300.0));

        let mid = ZoomTransform::fit_all(&[(0.0, 0.0), (1000.0, 500.0)], 800.0, 600.0).unwrap();
        assert!((mid.k - 0.72).abs() < 1e-9);
        let (cx, cy) = mid.apply(500.0, 250.0);
        assert!((cx - 400.0).abs() < 1e-9 && (cy - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(0.5), 0.5);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!(ease_cubic_in_out(0.25) < 0.25);
    }

    #[test]
    fn test_transition_samples() {
        let to = ZoomTransform { x: 100.0, y: 50.0, k: 2.0 };
        let tr = ZoomTransition::new(ZoomTransform::IDENTITY, to, 750.0);
        assert_eq!(tr.at(0.0), ZoomTransform::IDENTITY);
        assert_eq!(tr.at(375.0).k, 1.5);
        assert_eq!(tr.at(750.0), to);
        assert_eq!(tr.at(2000.0), to);
    }

    #[test]
    fn test_controller() {
        let mut zoom = ZoomController::default();
        let target = ZoomTransform { x: 10.0, y: 10.0, k: 1.5 };
        zoom.animate_to(target, FOCUS_DURATION_MS);
        assert!(zoom.is_animating());
        assert_ne!(zoom.advance(100.0), target);
        assert_eq!(zoom.advance(800.0), target);
        assert!(!zoom.is_animating());

        zoom.animate_to(ZoomTransform::IDENTITY, FOCUS_DURATION_MS);
        zoom.set(ZoomTransform { x: 1.0, y: 2.0, k: 9.0 });
        assert!(!zoom.is_animating());
        assert_eq!(zoom.transform().k, 4.0);
    }
}
