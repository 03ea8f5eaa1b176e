// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the flow scene.

use crate::node::{Handle, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A connection side as written in a document
///
/// Names the router does not understand are kept verbatim so that saving a
/// layout writes them back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandleSpec {
    /// A recognized side
    Side(Handle),
    /// Anything else
    Raw(Value),
}

impl HandleSpec {
    /// The side this names, if any; unknown names let the router infer one
    pub fn side(&self) -> Option<Handle> {
        match self {
            Self::Side(handle) => Some(*handle),
            Self::Raw(Value::String(name)) => Handle::from_name(name),
            Self::Raw(_) => None,
        }
    }
}

impl From<Handle> for HandleSpec {
    fn from(handle: Handle) -> Self {
        Self::Side(handle)
    }
}

/// A directed edge between two nodes
///
/// Edges do not own their endpoints. An edge whose `from` or `to` names a
/// node that is not in the scene is kept but never drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Source node id
    pub from: NodeId,
    /// Target node id
    pub to: NodeId,
    /// Text drawn at the edge midpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Explicit exit side on the source node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_start: Option<HandleSpec>,
    /// Explicit entry side on the target node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_end: Option<HandleSpec>,
    /// Fields this crate does not interpret, written back on save
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Edge {
    /// Create an unlabeled edge with inferred handles
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: NodeId::new(from),
            to: NodeId::new(to),
            label: None,
            handle_start: None,
            handle_end: None,
            extra: Map::new(),
        }
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Pin both connection sides
    pub fn with_handles(mut self, start: Handle, end: Handle) -> Self {
        self.handle_start = Some(start.into());
        self.handle_end = Some(end.into());
        self
    }

    /// Explicit exit side, when it names a known side
    pub fn start_side(&self) -> Option<Handle> {
        self.handle_start.as_ref().and_then(HandleSpec::side)
    }

    /// Explicit entry side, when it names a known side
    pub fn end_side(&self) -> Option<Handle> {
        self.handle_end.as_ref().and_then(HandleSpec::side)
    }

    /// Check if this edge touches a specific node
    pub fn involves_node(&self, node_id: &NodeId) -> bool {
        &self.from == node_id || &self.to == node_id
    }

    /// Check if this edge starts and ends on the same node
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}
