// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene model: the node/edge graph of one project's flow view.

use crate::edge::Edge;
use crate::node::{Node, NodeId, NodeState};
use egui::{Pos2, Rect, Vec2};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scene document as supplied by the project data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Nodes in rendering order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in rendering order
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl SceneDocument {
    /// Parse a document leniently
    ///
    /// Anything that is not an object yields `None`; the view then shows an
    /// empty scene instead of failing. Inside an object, each node and edge
    /// is parsed on its own and only malformed entries are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let Some(object) = value.as_object() else {
            tracing::warn!("Ignoring flow document that is not an object");
            return None;
        };
        Some(Self {
            nodes: parse_entries(object.get("nodes"), "node"),
            edges: parse_entries(object.get("edges"), "edge"),
        })
    }
}

fn parse_entries<T: DeserializeOwned>(list: Option<&Value>, what: &str) -> Vec<T> {
    let items = match list {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            tracing::warn!("Ignoring {what} list that is not an array");
            return Vec::new();
        }
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match T::deserialize(item) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Skipping malformed {what} #{i}: {err}");
                None
            }
        })
        .collect()
}

/// The live flow graph
///
/// Nodes are indexed by id and keep document order, which is also the
/// rendering order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: IndexMap<NodeId, NodeState>,
    edges: Vec<Edge>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from a document
    ///
    /// Later nodes reusing an id are dropped so that each id maps to exactly
    /// one node.
    pub fn from_document(document: SceneDocument) -> Self {
        let mut scene = Self::new();
        for node in document.nodes {
            if scene.nodes.contains_key(&node.id) {
                tracing::warn!("Duplicate node id {} ignored", node.id);
                continue;
            }
            scene.add_node(node);
        }
        scene.edges = document.edges;
        scene
    }

    /// Snapshot the scene back into a document
    pub fn to_document(&self) -> SceneDocument {
        SceneDocument {
            nodes: self.nodes.values().map(|n| n.node.clone()).collect(),
            edges: self.edges.clone(),
        }
    }

    /// Add a node; replaces any node with the same id in place
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id.clone();
        self.nodes.insert(id.clone(), NodeState::new(node));
        id
    }

    /// Add an edge
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Get a node by id
    pub fn node(&self, id: &NodeId) -> Option<&NodeState> {
        self.nodes.get(id)
    }

    /// Get a mutable node by id
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut NodeState> {
        self.nodes.get_mut(id)
    }

    /// Check whether a node exists
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes in rendering order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeState> {
        self.nodes.values()
    }

    /// All nodes, mutably, in rendering order
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut NodeState> {
        self.nodes.values_mut()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All edges in rendering order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the scene has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Move a node; returns `false` when the id is unknown
    pub fn set_position(&mut self, id: &NodeId, position: Pos2) -> bool {
        match self.nodes.get_mut(id) {
            Some(state) => {
                state.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Cache the rendered size of a node
    pub fn set_size(&mut self, id: &NodeId, size: Vec2) {
        if let Some(state) = self.nodes.get_mut(id) {
            state.size = Some(size);
        }
    }

    /// Replace a node's label; returns `false` when the id is unknown
    pub fn set_label(&mut self, id: &NodeId, label: impl Into<String>) -> bool {
        match self.nodes.get_mut(id) {
            Some(state) => {
                state.node.label = label.into();
                true
            }
            None => false,
        }
    }

    /// Topmost node whose bounds contain a world point
    pub fn node_at(&self, world: Pos2, fallback: Vec2) -> Option<&NodeId> {
        self.nodes
            .values()
            .rev()
            .find(|n| n.rect(fallback).contains(world))
            .map(NodeState::id)
    }

    /// Bounding box of all nodes, `None` for an empty scene
    pub fn bounds(&self, fallback: Vec2) -> Option<Rect> {
        self.nodes
            .values()
            .map(|n| n.rect(fallback))
            .reduce(|acc, r| acc.union(r))
    }
}
