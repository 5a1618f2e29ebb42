//! 3D spatiotemporal scene.
//!
//! Nodes with a location are placed on the ground plane by their location and
//! lifted along z by their time. The projection is memoized per data snapshot
//! and config; the orbit camera lives beside it and never invalidates it.

mod overlay;
mod projection;
mod style;
mod time_axis;
mod view_state;

pub use overlay::{build_overlays, resolved_shape, OverlayKind, OverlayLayer, SceneOverlays, SegmentCache};
pub use projection::{project, Edge3D, Node3D, Scene3D, SceneBounds, SceneProjector, SceneStatus};
pub use style::{NodeTier, Rgba};
pub use time_axis::{jitter, TimeAxis, LOG_EPSILON};
pub use view_state::{OrbitViewState, ViewPreset, ViewStatePatch, FOCUS_ZOOM, ZOOM_EXTENT};
