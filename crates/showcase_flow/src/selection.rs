// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node selection state.

use crate::node::NodeId;
use std::collections::HashSet;

/// Selection mode for pointer gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    /// Replace current selection
    #[default]
    Set,
    /// Add to current selection (Shift+Click)
    Add,
}

impl SelectMode {
    /// Mode implied by the additive modifier key
    pub fn from_modifier(additive: bool) -> Self {
        if additive {
            Self::Add
        } else {
            Self::Set
        }
    }
}

/// Set of selected nodes, without ordering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    nodes: HashSet<NodeId>,
}

impl Selection {
    /// Create a new empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a node is selected
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Add a node (idempotent)
    pub fn add(&mut self, id: NodeId) {
        self.nodes.insert(id);
    }

    /// Select a node according to `mode`
    pub fn select(&mut self, id: NodeId, mode: SelectMode) {
        if mode == SelectMode::Set {
            self.nodes.clear();
        }
        self.nodes.insert(id);
    }

    /// Clear the selection
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Check if the selection is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of selected nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// The selected node when exactly one is selected
    pub fn single(&self) -> Option<&NodeId> {
        if self.nodes.len() == 1 {
            self.nodes.iter().next()
        } else {
            None
        }
    }

    /// Iterate over selected ids
    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }
}
