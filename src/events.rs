//! Pointer events and the outward callback contract.
//!
//! The host forwards raw pointer positions in screen space. They are mapped
//! through the zoom transform into layout space, hit tested against the
//! rendered positions, and turned into [`InteractionEvent`]s for whatever
//! [`EventSink`] the host installed. Hovering drives a [`Tooltip`] that is
//! owned by one layout session and lives exactly as long as its dataset.

use serde::Serialize;

use crate::graph::{GraphEdge, GraphNode};
use crate::layout::{Simulation, ZoomTransform};
use crate::scene::ViewStatePatch;

/// Edge hit tolerance in screen pixels.
pub const EDGE_HIT_TOLERANCE: f64 = 4.0;

/// Tooltip offset from the pointer, in screen pixels.
pub const TOOLTIP_OFFSET: (f64, f64) = (10.0, -10.0);

/// A node as reported to the host: the input node plus where it is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDetail {
    #[serde(flatten)]
    pub node: GraphNode,
    pub time_index: u32,
    pub x: f64,
    pub y: f64,
}

impl NodeDetail {
    fn at(sim: &Simulation, slot: usize) -> Option<Self> {
        let node = sim.source_node(slot)?.clone();
        let placed = sim.nodes().get(slot)?;
        Some(Self {
            node,
            time_index: placed.time_index,
            x: placed.x,
            y: sim.rows().y(placed.time_index),
        })
    }
}

/// Events fired toward the host view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum InteractionEvent {
    NodeClick(NodeDetail),
    NodeRightClick(NodeDetail),
    EdgeClick(GraphEdge),
    ViewStateChange(ViewStatePatch),
}

/// Receiver of interaction events.
pub trait EventSink {
    fn emit(&mut self, event: InteractionEvent);
}

impl EventSink for Vec<InteractionEvent> {
    fn emit(&mut self, event: InteractionEvent) {
        self.push(event);
    }
}

/// Which pointer button was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

impl PointerButton {
    /// From a DOM `MouseEvent.button` value; middle and extra buttons are ignored.
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(Self::Primary),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// Event for a click at a screen point, if it hit anything.
///
/// Nodes win over edges. Right clicks only report nodes.
pub fn click_event(
    sim: &Simulation,
    transform: &ZoomTransform,
    screen: (f64, f64),
    button: PointerButton,
) -> Option<InteractionEvent> {
    let (x, y) = transform.invert(screen.0, screen.1);

    if let Some(detail) = sim.node_at(x, y).and_then(|slot| NodeDetail::at(sim, slot)) {
        return Some(match button {
            PointerButton::Primary => InteractionEvent::NodeClick(detail),
            PointerButton::Secondary => InteractionEvent::NodeRightClick(detail),
        });
    }

    if button == PointerButton::Primary {
        let tolerance = EDGE_HIT_TOLERANCE / transform.k;
        return sim
            .edge_at(x, y, tolerance)
            .and_then(|i| sim.source_edge(i))
            .cloned()
            .map(InteractionEvent::EdgeClick);
    }
    None
}

/// Hover tooltip owned by one layout session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tooltip {
    pub visible: bool,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

impl Tooltip {
    pub fn hide(&mut self) {
        self.visible = false;
        self.text.clear();
    }

    /// Update from a pointer position. Returns whether anything changed.
    pub fn hover(&mut self, sim: &Simulation, transform: &ZoomTransform, screen: (f64, f64)) -> bool {
        let before = self.clone();
        let (x, y) = transform.invert(screen.0, screen.1);

        match sim.node_at(x, y).and_then(|slot| sim.source_node(slot)) {
            Some(node) => {
                self.visible = true;
                self.x = screen.0 + TOOLTIP_OFFSET.0;
                self.y = screen.1 + TOOLTIP_OFFSET.1;
                self.text = tooltip_text(node);
            }
            None => self.hide(),
        }
        *self != before
    }
}

fn tooltip_text(node: &GraphNode) -> String {
    let kind = if node.is_sample {
        "sample"
    } else if node.is_combined {
        "combined"
    } else {
        "node"
    };
    let mut text = format!("{} {} (time {})", kind, node.id.raw(), node.time);
    if node.combined_nodes.len() > 1 {
        let ids: Vec<String> = node.combined_nodes.iter().map(|id| id.raw().to_string()).collect();
        text.push_str(&format!(", merges {}", ids.join(", ")));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForceLayoutConfig, SampleOrdering};
    use crate::graph::NodeId;

    fn loaded() -> (Simulation, crate::layout::TickToken) {
        let nodes = vec![
            GraphNode::new(0, 0.0, true),
            GraphNode::new(1, 0.0, true),
            GraphNode::new(2, 1.0, false),
        ];
        let edges = vec![GraphEdge::new(2, 0), GraphEdge::new(2, 1)];
        let mut sim = Simulation::new(ForceLayoutConfig {
            sample_ordering: SampleOrdering::Numeric,
            ..Default::default()
        });
        let token = sim.load(&nodes, &edges);
        sim.frame(token);
        (sim, token)
    }

    fn screen_of(sim: &Simulation, id: u32, t: &ZoomTransform) -> (f64, f64) {
        let node = sim.node(NodeId(id)).unwrap();
        t.apply(node.x, sim.rows().y(node.time_index))
    }

    #[test]
    fn test_node_click_through_zoom() {
        let (sim, _) = loaded();
        let t = ZoomTransform { x: 40.0, y: -20.0, k: 2.0 };
        let screen = screen_of(&sim, 0, &t);

        match click_event(&sim, &t, screen, PointerButton::Primary) {
            Some(InteractionEvent::NodeClick(detail)) => {
                assert_eq!(detail.node.id, NodeId(0));
                assert_eq!(detail.time_index, 0);
            }
            other => panic!("expected node click, got {other:?}"),
        }
        assert!(matches!(
            click_event(&sim, &t, screen, PointerButton::Secondary),
            Some(InteractionEvent::NodeRightClick(_))
        ));
    }

    #[test]
    fn test_edge_click() {
        let (sim, _) = loaded();
        let t = ZoomTransform::IDENTITY;
        let (ax, ay) = screen_of(&sim, 2, &t);
        let (bx, by) = screen_of(&sim, 1, &t);
        let mid = ((ax + bx) / 2.0, (ay + by) / 2.0);

        assert_eq!(
            click_event(&sim, &t, mid, PointerButton::Primary),
            Some(InteractionEvent::EdgeClick(GraphEdge::new(2, 1)))
        );
        assert_eq!(click_event(&sim, &t, mid, PointerButton::Secondary), None);
        assert_eq!(click_event(&sim, &t, (-500.0, -500.0), PointerButton::Primary), None);
    }

    #[test]
    fn test_tooltip_follows_hover() {
        let (sim, _) = loaded();
        let t = ZoomTransform::IDENTITY;
        let mut tooltip = Tooltip::default();

        let screen = screen_of(&sim, 2, &t);
        assert!(tooltip.hover(&sim, &t, screen));
        assert!(tooltip.visible);
        assert_eq!(tooltip.text, "node 2 (time 1)");
        assert_eq!(tooltip.x, screen.0 + 10.0);
        assert!(!tooltip.hover(&sim, &t, screen));

        assert!(tooltip.hover(&sim, &t, (-500.0, -500.0)));
        assert!(!tooltip.visible);
    }

    #[test]
    fn test_combined_tooltip_text() {
        let mut node = GraphNode::new(4, 2.5, false);
        node.is_combined = true;
        node.combined_nodes = vec![NodeId(4), NodeId(9)];
        assert_eq!(tooltip_text(&node), "combined 4 (time 2.5), merges 4, 9");
    }

    #[test]
    fn test_vec_sink_and_payload_shape() {
        let mut sink: Vec<InteractionEvent> = Vec::new();
        sink.emit(InteractionEvent::EdgeClick(GraphEdge::new(3, 1)));
        assert_eq!(sink.len(), 1);

        let json = serde_json::to_value(&sink[0]).unwrap();
        assert_eq!(json["type"], "edgeClick");
        assert_eq!(json["payload"]["source"], 3);
    }

    #[test]
    fn test_pointer_button_from_dom() {
        assert_eq!(PointerButton::from_dom(0), Some(PointerButton::Primary));
        assert_eq!(PointerButton::from_dom(2), Some(PointerButton::Secondary));
        assert_eq!(PointerButton::from_dom(1), None);
    }
}
