//! 2D force-directed layout for ARGs.
//!
//! Nodes sit on horizontal time rows. Samples are spread along the bottom row
//! and pinned; every other node is free in x but kept inside the x-range of
//! the samples it descends to. The simulation is d3-force shaped (link,
//! charge, positional and collision forces) with periodic range clamping and
//! crossing reduction layered on top.

pub mod forces;
pub mod interaction;
pub mod layers;
pub mod simulation;
pub mod zoom;

pub use layers::{initialize, sample_order, Layering, Rows, SimNode, Topology};
pub use simulation::{
    FrameEdge, FrameGeometry, FrameLabel, FrameNode, Generation, Simulation, SimulationPhase,
    TickOutcome, TickToken,
};
pub use zoom::{ZoomController, ZoomTransform, ZoomTransition};
