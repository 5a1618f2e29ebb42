//! Graph data model and traversal.
//!
//! Nodes and edges are plain serde types carrying raw ids. `ArgIndex` builds
//! a petgraph StableGraph over one snapshot for ancestor/descendant queries,
//! root detection, parent/sibling lookup and time layers.

mod data;
mod edge;
mod index;
mod node;

pub use data::{GraphData, GraphMetadata};
pub use edge::{resolve_edges, GraphEdge, ResolvedEdge};
pub use index::{dense_time_ranks, ArgIndex};
pub use node::{GraphNode, Location, NodeId};
