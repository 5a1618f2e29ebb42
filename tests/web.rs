//! Facade tests that need a JS host. Run with `wasm-pack test --node`.

#![cfg(target_arch = "wasm32")]

use argscape_layout_wasm::graph::{GraphData, GraphEdge, GraphNode};
use argscape_layout_wasm::{combine_nodes, detect_coordinate_system, generate_grid, ArgLayoutSession, ArgSceneProjector};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

fn cherry() -> JsValue {
    let data = GraphData::new(
        vec![
            GraphNode::new(0, 0.0, true).with_location(0.0, 0.0),
            GraphNode::new(1, 0.0, true).with_location(2.0, 1.0),
            GraphNode::new(2, 1.0, false).with_location(1.0, 0.5),
        ],
        vec![GraphEdge::new(2, 0), GraphEdge::new(2, 1)],
    );
    serde_wasm_bindgen::to_value(&data).unwrap()
}

#[wasm_bindgen_test]
fn test_session_round_trip() {
    let mut session = ArgLayoutSession::new(JsValue::UNDEFINED).unwrap();
    let token = session.load(cherry()).unwrap();
    assert!(session.tick(token));
    assert!(!session.frame(token).unwrap().is_undefined());
    assert!(session.frame(token + 1).unwrap().is_undefined());
    assert_eq!(session.positions().length(), 6);
    assert_eq!(session.phase(), "simulating");

    session.teardown();
    assert_eq!(session.phase(), "tornDown");
}

#[wasm_bindgen_test]
fn test_bad_input_is_an_error() {
    let mut session = ArgLayoutSession::new(JsValue::NULL).unwrap();
    assert!(session.load(JsValue::from_str("not a graph")).is_err());
}

#[wasm_bindgen_test]
fn test_free_functions() {
    let combined: GraphData = serde_wasm_bindgen::from_value(combine_nodes(cherry()).unwrap()).unwrap();
    assert_eq!(combined.nodes.len(), 3);

    assert!(generate_grid(4).unwrap().is_object());

    let points = serde_wasm_bindgen::to_value(&vec![[0.1, 0.2], [0.9, 0.8]]).unwrap();
    assert!(detect_coordinate_system(points).unwrap().is_object());
}

#[wasm_bindgen_test]
fn test_scene_projector() {
    let mut projector = ArgSceneProjector::new();
    projector.set_data(cherry()).unwrap();
    let scene = projector.project(JsValue::UNDEFINED).unwrap();
    assert!(scene.is_object());
    assert!(projector.center_view());
    assert!(projector.preset_view("side"));
}
