//! Error types for input decoding and explicit data validation.
//!
//! Layout, combination and projection never fail: they degrade to an empty
//! or partial result. `LayoutError` only surfaces at the WASM boundary
//! (decoding JS values) and from the validation helpers that report data
//! anomalies to the log.

use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::graph::NodeId;

/// Errors reported by input decoding and graph validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// A JS value could not be decoded into the expected Rust type.
    #[error("failed to decode {what}: {message}")]
    Decode {
        /// What was being decoded (e.g. "graph data").
        what: &'static str,
        /// Decoder message.
        message: String,
    },

    /// Two nodes in one snapshot share an id.
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),

    /// An edge references a node id absent from the snapshot.
    #[error("edge {parent} -> {child} references a missing node")]
    DanglingEdge {
        /// Edge source (parent) id.
        parent: NodeId,
        /// Edge target (child) id.
        child: NodeId,
    },

    /// An edge whose source is not strictly older than its target.
    #[error("edge {parent} -> {child} does not point from older to younger")]
    TimeDirection {
        /// Edge source (parent) id.
        parent: NodeId,
        /// Edge target (child) id.
        child: NodeId,
    },
}

impl LayoutError {
    /// Wrap a `serde-wasm-bindgen` failure.
    pub fn decode(what: &'static str, err: serde_wasm_bindgen::Error) -> Self {
        Self::Decode {
            what,
            message: err.to_string(),
        }
    }
}

impl From<LayoutError> for JsValue {
    fn from(err: LayoutError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Convenience alias used at the decoding boundary.
pub type Result<T> = std::result::Result<T, LayoutError>;
