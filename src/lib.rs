//! ARGscape layout - WASM Module
//!
//! Layout core for Ancestral Recombination Graph views. It is compiled to
//! WebAssembly and exposes a JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: ARG data model and petgraph-backed traversal (`ArgIndex`)
//! - `combine`: folding of identical non-sample nodes
//! - `layout`: constrained 2D force simulation, drag and zoom
//! - `scene`: 3D spatiotemporal projection, overlays and orbit camera
//! - `geo`: geographic shapes, grids and coordinate system detection
//! - `spatial`: R-tree index for collision and hit testing
//! - `events`: pointer hit testing, tooltip and outward callbacks

use js_sys::{Float64Array, Function};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod combine;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod graph;
pub mod layout;
pub mod scene;
pub mod spatial;

use config::{ForceLayoutConfig, SceneConfig};
use error::LayoutError;
use events::{EventSink, InteractionEvent, PointerButton, Tooltip};
use geo::GeographicShape;
use graph::{GraphData, NodeId};
use layout::zoom::FOCUS_DURATION_MS;
use layout::{Simulation, TickOutcome, TickToken, ZoomController, ZoomTransform};
use scene::{OrbitViewState, SceneProjector, ViewPreset, ViewStatePatch};

/// Initialize the WASM module: console logging and the panic hook.
#[wasm_bindgen(start)]
pub fn init() {
    install_logger();
    console_error_panic_hook::set_once();
    log::info!("argscape layout module initialized");
}

#[cfg(target_arch = "wasm32")]
fn install_logger() {
    if console_log::init_with_level(log::Level::Debug).is_err() {
        web_sys::console::warn_1(&JsValue::from_str("argscape: logger already installed"));
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn install_logger() {}

/// Decode a JS value, treating `undefined` and `null` as the default.
fn decode_or_default<T: DeserializeOwned + Default>(
    what: &'static str,
    value: JsValue,
) -> error::Result<T> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    decode(what, value)
}

fn decode<T: DeserializeOwned>(what: &'static str, value: JsValue) -> error::Result<T> {
    serde_wasm_bindgen::from_value(value).map_err(|err| LayoutError::decode(what, err))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn log_validation(data: &GraphData) {
    for problem in data.validate() {
        log::warn!("{problem}");
    }
}

// =============================================================================
// Callbacks
// =============================================================================

/// Host callbacks. Missing callbacks drop their events.
#[derive(Default)]
struct JsCallbacks {
    node_click: Option<Function>,
    node_right_click: Option<Function>,
    edge_click: Option<Function>,
    view_state_change: Option<Function>,
}

impl EventSink for JsCallbacks {
    fn emit(&mut self, event: InteractionEvent) {
        let callback = match &event {
            InteractionEvent::NodeClick(_) => self.node_click.as_ref(),
            InteractionEvent::NodeRightClick(_) => self.node_right_click.as_ref(),
            InteractionEvent::EdgeClick(_) => self.edge_click.as_ref(),
            InteractionEvent::ViewStateChange(_) => self.view_state_change.as_ref(),
        };
        let Some(callback) = callback else {
            return;
        };

        let payload = match &event {
            InteractionEvent::NodeClick(detail) | InteractionEvent::NodeRightClick(detail) => {
                serde_wasm_bindgen::to_value(detail)
            }
            InteractionEvent::EdgeClick(edge) => serde_wasm_bindgen::to_value(edge),
            InteractionEvent::ViewStateChange(patch) => serde_wasm_bindgen::to_value(patch),
        };
        match payload {
            Ok(payload) => {
                if let Err(err) = callback.call1(&JsValue::NULL, &payload) {
                    log::warn!("event callback threw: {err:?}");
                }
            }
            Err(err) => log::warn!("failed to encode event payload: {err}"),
        }
    }
}

// =============================================================================
// 2D layout session
// =============================================================================

/// One 2D layout view: simulation, zoom, tooltip and callbacks.
///
/// `load` returns a token; the host passes it back on every tick and frame
/// so callbacks scheduled for an older dataset become no-ops.
#[wasm_bindgen]
pub struct ArgLayoutSession {
    sim: Simulation,
    zoom: ZoomController,
    tooltip: Tooltip,
    callbacks: JsCallbacks,
}

#[wasm_bindgen]
impl ArgLayoutSession {
    /// Create a session. `config` is a partial `ForceLayoutConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ArgLayoutSession, JsValue> {
        let config: ForceLayoutConfig = decode_or_default("layout config", config)?;
        Ok(Self::with_config(config))
    }

    /// Load a graph snapshot and restart the simulation.
    ///
    /// Returns the tick token for this dataset.
    pub fn load(&mut self, data: JsValue) -> Result<u32, JsValue> {
        let data: GraphData = decode("graph data", data)?;
        Ok(self.load_graph(data).raw())
    }

    /// Advance one tick. Returns false once settled or when `token` is stale.
    pub fn tick(&mut self, token: u32) -> bool {
        self.sim.tick(TickToken::from_raw(token)) == TickOutcome::Advanced
    }

    /// Frame geometry, or `undefined` for a stale token.
    pub fn frame(&mut self, token: u32) -> Result<JsValue, JsValue> {
        match self.sim.frame(TickToken::from_raw(token)) {
            Some(geometry) => to_js(&geometry),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Rendered positions as `[x0, y0, x1, y1, ...]` in node order.
    pub fn positions(&self) -> Float64Array {
        let flat: Vec<f64> = self
            .sim
            .rendered_points()
            .into_iter()
            .flat_map(|(x, y)| [x, y])
            .collect();
        Float64Array::from(flat.as_slice())
    }

    pub fn alpha(&self) -> f64 {
        self.sim.alpha()
    }

    pub fn phase(&self) -> String {
        self.sim.phase().as_str().to_string()
    }

    // =========================================================================
    // Drag
    // =========================================================================

    #[wasm_bindgen(js_name = dragStart)]
    pub fn drag_start(&mut self, node_id: u32) -> bool {
        self.sim.drag_start(NodeId(node_id))
    }

    /// Drag toward a screen point.
    #[wasm_bindgen(js_name = dragMove)]
    pub fn drag_move(&mut self, node_id: u32, screen_x: f64, screen_y: f64) -> bool {
        let (x, _) = self.zoom.transform().invert(screen_x, screen_y);
        self.sim.drag_move(NodeId(node_id), x)
    }

    #[wasm_bindgen(js_name = dragEnd)]
    pub fn drag_end(&mut self, node_id: u32) -> bool {
        self.sim.drag_end(NodeId(node_id))
    }

    // =========================================================================
    // Zoom
    // =========================================================================

    /// Apply a user zoom or pan. The scale is clamped.
    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&mut self, x: f64, y: f64, k: f64) {
        self.zoom.set(ZoomTransform { x, y, k });
    }

    #[wasm_bindgen(js_name = zoomTransform)]
    pub fn zoom_transform(&self) -> Result<JsValue, JsValue> {
        to_js(&self.zoom.transform())
    }

    /// Animate toward a node. Returns false for an unknown node.
    #[wasm_bindgen(js_name = focusNode)]
    pub fn focus_node(&mut self, node_id: u32) -> bool {
        let Some(node) = self.sim.node(NodeId(node_id)) else {
            return false;
        };
        let point = (node.x, self.sim.rows().y(node.time_index));
        let cfg = self.sim.config();
        let target = ZoomTransform::focus_on(point, cfg.width, cfg.height);
        self.zoom.animate_to(target, FOCUS_DURATION_MS);
        true
    }

    /// Animate to fit every node. Returns false when there is nothing to fit.
    #[wasm_bindgen(js_name = fitAll)]
    pub fn fit_all(&mut self) -> bool {
        let cfg = self.sim.config();
        let Some(target) = ZoomTransform::fit_all(&self.sim.rendered_points(), cfg.width, cfg.height)
        else {
            return false;
        };
        self.zoom.animate_to(target, FOCUS_DURATION_MS);
        true
    }

    /// Sample the running zoom animation `elapsed_ms` after it started.
    #[wasm_bindgen(js_name = zoomFrame)]
    pub fn zoom_frame(&mut self, elapsed_ms: f64) -> Result<JsValue, JsValue> {
        to_js(&self.zoom.advance(elapsed_ms))
    }

    #[wasm_bindgen(js_name = isZooming)]
    pub fn is_zooming(&self) -> bool {
        self.zoom.is_animating()
    }

    // =========================================================================
    // Pointer
    // =========================================================================

    /// Hit test a click and fire the matching callback.
    ///
    /// `button` is the DOM `MouseEvent.button`. Returns whether anything was hit.
    #[wasm_bindgen(js_name = pointerClick)]
    pub fn pointer_click(&mut self, screen_x: f64, screen_y: f64, button: i16) -> bool {
        PointerButton::from_dom(button)
            .and_then(|button| self.click_at(screen_x, screen_y, button))
            .is_some()
    }

    /// Update the tooltip for a pointer position and return it.
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, screen_x: f64, screen_y: f64) -> Result<JsValue, JsValue> {
        let transform = self.zoom.transform();
        self.tooltip.hover(&self.sim, &transform, (screen_x, screen_y));
        to_js(&self.tooltip)
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self) {
        self.tooltip.hide();
    }

    #[wasm_bindgen(js_name = setCallbacks)]
    pub fn set_callbacks(
        &mut self,
        on_node_click: Option<Function>,
        on_node_right_click: Option<Function>,
        on_edge_click: Option<Function>,
    ) {
        self.callbacks.node_click = on_node_click;
        self.callbacks.node_right_click = on_node_right_click;
        self.callbacks.edge_click = on_edge_click;
    }

    /// Stop the simulation and drop the dataset, tooltip and callbacks.
    pub fn teardown(&mut self) {
        self.sim.teardown();
        self.tooltip = Tooltip::default();
        self.callbacks = JsCallbacks::default();
    }
}

impl ArgLayoutSession {
    pub fn with_config(config: ForceLayoutConfig) -> Self {
        Self {
            sim: Simulation::new(config),
            zoom: ZoomController::default(),
            tooltip: Tooltip::default(),
            callbacks: JsCallbacks::default(),
        }
    }

    pub fn load_graph(&mut self, data: GraphData) -> TickToken {
        log_validation(&data);
        self.tooltip = Tooltip::default();
        self.sim.load(&data.nodes, &data.edges)
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    /// Hit test a click, emit the event and return it.
    pub fn click_at(&mut self, screen_x: f64, screen_y: f64, button: PointerButton) -> Option<InteractionEvent> {
        let event = events::click_event(&self.sim, &self.zoom.transform(), (screen_x, screen_y), button)?;
        self.callbacks.emit(event.clone());
        Some(event)
    }
}

// =============================================================================
// 3D scene
// =============================================================================

/// 3D scene view: memoized projection plus the orbit camera.
#[wasm_bindgen]
pub struct ArgSceneProjector {
    projector: SceneProjector,
    view: OrbitViewState,
    callbacks: JsCallbacks,
}

#[wasm_bindgen]
impl ArgSceneProjector {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ArgSceneProjector {
        Self {
            projector: SceneProjector::new(),
            view: OrbitViewState::default(),
            callbacks: JsCallbacks::default(),
        }
    }

    #[wasm_bindgen(js_name = setData)]
    pub fn set_data(&mut self, data: JsValue) -> Result<(), JsValue> {
        let data: GraphData = decode("graph data", data)?;
        log_validation(&data);
        self.projector.set_data(data);
        Ok(())
    }

    /// Projected scene for a partial `SceneConfig`.
    pub fn project(&mut self, config: JsValue) -> Result<JsValue, JsValue> {
        let config: SceneConfig = decode_or_default("scene config", config)?;
        to_js(self.projector.project(&config))
    }

    /// Overlay layers for a partial `SceneConfig`.
    pub fn overlays(&mut self, config: JsValue) -> Result<JsValue, JsValue> {
        let config: SceneConfig = decode_or_default("scene config", config)?;
        to_js(&self.projector.overlays(&config))
    }

    #[wasm_bindgen(js_name = viewState)]
    pub fn view_state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.view)
    }

    /// Merge a partial view state. Returns the fields that changed.
    #[wasm_bindgen(js_name = applyViewState)]
    pub fn apply_view_state(&mut self, patch: JsValue) -> Result<JsValue, JsValue> {
        let patch: ViewStatePatch = decode("view state", patch)?;
        let changed = self.update_view(|view| view.apply(&patch));
        to_js(&changed)
    }

    /// Recenter on the last projected scene. Returns false before any projection.
    #[wasm_bindgen(js_name = centerView)]
    pub fn center_view(&mut self) -> bool {
        let Some(bounds) = self.projector.scene().and_then(|s| s.bounds) else {
            return false;
        };
        self.update_view(|view| view.center_on(&bounds));
        true
    }

    /// Apply `top`, `side`, `angled` or `reset`. Unknown names are ignored.
    #[wasm_bindgen(js_name = presetView)]
    pub fn preset_view(&mut self, name: &str) -> bool {
        let Some(preset) = ViewPreset::from_name(name) else {
            log::warn!("unknown view preset {name:?}");
            return false;
        };
        self.update_view(|view| view.preset(preset));
        true
    }

    #[wasm_bindgen(js_name = zoomBy)]
    pub fn zoom_by(&mut self, delta: f64) {
        self.update_view(|view| view.zoom_by(delta));
    }

    /// Look at a projected node. Returns false when it is not in the scene.
    #[wasm_bindgen(js_name = focusNode)]
    pub fn focus_node(&mut self, node_id: u32) -> bool {
        let Some(position) = self
            .projector
            .scene()
            .and_then(|s| s.node(NodeId(node_id)))
            .map(|n| n.position)
        else {
            return false;
        };
        self.update_view(|view| view.focus_on(position));
        true
    }

    #[wasm_bindgen(js_name = setViewStateCallback)]
    pub fn set_view_state_callback(&mut self, on_view_state_change: Option<Function>) {
        self.callbacks.view_state_change = on_view_state_change;
    }
}

impl Default for ArgSceneProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl ArgSceneProjector {
    pub fn projector_mut(&mut self) -> &mut SceneProjector {
        &mut self.projector
    }

    pub fn view(&self) -> &OrbitViewState {
        &self.view
    }

    /// Run a view change and report it when anything moved.
    fn update_view(&mut self, change: impl FnOnce(&mut OrbitViewState) -> ViewStatePatch) -> ViewStatePatch {
        let changed = change(&mut self.view);
        if !changed.is_empty() {
            self.callbacks
                .emit(InteractionEvent::ViewStateChange(changed.clone()));
        }
        changed
    }
}

// =============================================================================
// Free functions
// =============================================================================

/// Fold identical non-sample nodes. Metadata passes through unchanged.
#[wasm_bindgen(js_name = combineNodes)]
pub fn combine_nodes(data: JsValue) -> Result<JsValue, JsValue> {
    let data: GraphData = decode("graph data", data)?;
    let combined = combine::combine(&data.nodes, &data.edges);
    log::debug!(
        "combined {} nodes into {}",
        data.nodes.len(),
        combined.nodes.len()
    );
    to_js(&combined.into_graph_data(data.metadata))
}

#[wasm_bindgen(js_name = shapeSegments)]
pub fn shape_segments(shape: JsValue) -> Result<JsValue, JsValue> {
    let shape: GeographicShape = decode("shape", shape)?;
    to_js(&geo::shape_segments(&shape))
}

/// `[minX, minY, maxX, maxY]`, or `undefined` for a shape without points.
#[wasm_bindgen(js_name = shapeBounds)]
pub fn shape_bounds(shape: JsValue) -> Result<JsValue, JsValue> {
    let shape: GeographicShape = decode("shape", shape)?;
    to_js(&geo::shape_bounds(&shape).map(|b| b.to_array()))
}

#[wasm_bindgen(js_name = generateGrid)]
pub fn generate_grid(size: u32) -> Result<JsValue, JsValue> {
    to_js(&geo::generate_grid(size))
}

/// Classify `[[x, y], ...]` node locations.
#[wasm_bindgen(js_name = detectCoordinateSystem)]
pub fn detect_coordinate_system(points: JsValue) -> Result<JsValue, JsValue> {
    let points: Vec<[f64; 2]> = decode("coordinates", points)?;
    let points: Vec<(f64, f64)> = points.into_iter().map(|[x, y]| (x, y)).collect();
    to_js(&geo::detect_coordinate_system(&points))
}
