// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the flow scene.

use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Style tag used when a node carries no explicit type
pub const DEFAULT_NODE_TYPE: &str = "process";

/// Unique identifier for a node, stable across sessions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create an id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Connection side on a node boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    /// Top edge midpoint
    Top,
    /// Bottom edge midpoint
    Bottom,
    /// Left edge midpoint
    Left,
    /// Right edge midpoint
    Right,
}

impl Handle {
    /// All handles in render order
    pub const ALL: [Handle; 4] = [Handle::Top, Handle::Left, Handle::Right, Handle::Bottom];

    /// Parse a side name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// The handle on the opposite side
    pub fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Unit vector pointing away from the node
    pub fn normal(self) -> Vec2 {
        match self {
            Self::Top => Vec2::new(0.0, -1.0),
            Self::Bottom => Vec2::new(0.0, 1.0),
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
        }
    }

    /// Midpoint of this side of `rect`
    pub fn anchor(self, rect: Rect) -> Pos2 {
        match self {
            Self::Top => rect.center_top(),
            Self::Bottom => rect.center_bottom(),
            Self::Left => rect.left_center(),
            Self::Right => rect.right_center(),
        }
    }
}

/// A node as it appears in a scene document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique id
    pub id: NodeId,
    /// Display text
    #[serde(default)]
    pub label: String,
    /// World-space left edge; `None` until laid out
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_coordinate")]
    pub x: Option<f32>,
    /// World-space top edge; `None` until laid out
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_coordinate")]
    pub y: Option<f32>,
    /// Semantic category, affects styling only
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Tooltip text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Reference into the project's snippet data, never interpreted here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_data_index: Option<Value>,
    /// Fields this crate does not interpret, written back on save
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Create an unpositioned node
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(id),
            label: label.into(),
            x: None,
            y: None,
            kind: None,
            info: None,
            linked_data_index: None,
            extra: Map::new(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Set the style tag
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the tooltip text
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    /// Style tag, defaulting to `process`
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(DEFAULT_NODE_TYPE)
    }

    /// Position, if both coordinates are known
    pub fn position(&self) -> Option<Pos2> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Pos2::new(x, y)),
            _ => None,
        }
    }
}

/// Numbers and numeric strings are coordinates; anything else means unpositioned
fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_f64().map(|v| v as f32),
        Some(Value::String(s)) => s.trim().parse::<f32>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

/// Runtime state of a node inside a scene
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    /// Document data
    pub node: Node,
    /// World-space top-left corner
    pub position: Pos2,
    /// Rendered size, cached after the first measurement
    pub size: Option<Vec2>,
}

impl NodeState {
    /// Wrap a document node; missing coordinates start at the origin
    pub fn new(node: Node) -> Self {
        let position = Pos2::new(node.x.unwrap_or(0.0), node.y.unwrap_or(0.0));
        Self {
            node,
            position,
            size: None,
        }
    }

    /// Node id
    pub fn id(&self) -> &NodeId {
        &self.node.id
    }

    /// Whether the document supplied a full position
    pub fn is_positioned(&self) -> bool {
        self.node.position().is_some()
    }

    /// Move the node, keeping the document coordinates in sync
    pub fn set_position(&mut self, position: Pos2) {
        self.position = position;
        self.node.x = Some(position.x);
        self.node.y = Some(position.y);
    }

    /// Size, or `fallback` when the node was never measured
    pub fn size_or(&self, fallback: Vec2) -> Vec2 {
        self.size.unwrap_or(fallback)
    }

    /// World-space bounds using `fallback` for unmeasured nodes
    pub fn rect(&self, fallback: Vec2) -> Rect {
        Rect::from_min_size(self.position, self.size_or(fallback))
    }
}
