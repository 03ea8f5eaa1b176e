// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge routing between rectangular nodes.
//!
//! For every drawable edge the router picks an exit side on the source and
//! an entry side on the target, then lofts a cubic Bezier out of each side
//! along its outward normal so curves leave and enter node borders
//! perpendicularly.
//!
//! Handle inference table (source position relative to target):
//!
//! | x \ y | Above        | Level        | Below          |
//! |-------|--------------|--------------|----------------|
//! | Left  | right → top  | right → left | right → bottom |
//! | Level | bottom → top | right → left | top → bottom   |
//! | Right | left → top   | left → right | left → bottom  |

use crate::config::EdgeSettings;
use crate::edge::Edge;
use crate::node::Handle;
use crate::scene::Scene;
use egui::{Pos2, Rect, Vec2};
use std::fmt::Write as _;

/// Dominant direction of an edge, used to size the control arms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Target lies to the right of the source's right edge
    Horizontal,
    /// Target overlaps or lies left of the source's right edge
    Vertical,
    /// Target starts exactly at the source's right edge
    Ambiguous,
}

impl Orientation {
    /// Classify by projecting the source-right-edge → target vector onto +x
    pub fn between(source: Rect, target: Rect) -> Self {
        let dir = Vec2::new(target.min.x - source.max.x, target.min.y - source.min.y);
        let dot = Vec2::X.dot(dir);
        if dot > 0.0 {
            Self::Horizontal
        } else if dot < 0.0 {
            Self::Vertical
        } else {
            Self::Ambiguous
        }
    }
}

/// Horizontal position of the source relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeX {
    /// Source center is left of the target center
    Left,
    /// Centers are aligned
    Level,
    /// Source center is right of the target center
    Right,
}

/// Vertical position of the source relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeY {
    /// Source is above the target by more than the threshold
    Above,
    /// Within the threshold
    Level,
    /// Source is below the target by more than the threshold
    Below,
}

/// Classify where `source` sits relative to `target`
///
/// The vertical test compares top edges with a slack of the source height
/// plus `threshold`; the horizontal test compares centers exactly.
pub fn relative_position(source: Rect, target: Rect, threshold: f32) -> (RelativeX, RelativeY) {
    let slack = source.height() + threshold;
    let rel_y = if source.min.y < target.min.y - slack {
        RelativeY::Above
    } else if source.min.y > target.min.y + slack {
        RelativeY::Below
    } else {
        RelativeY::Level
    };

    let (sx, tx) = (source.center().x, target.center().x);
    let rel_x = if sx < tx {
        RelativeX::Left
    } else if sx > tx {
        RelativeX::Right
    } else {
        RelativeX::Level
    };

    (rel_x, rel_y)
}

/// Look up the (start, end) handle pair for a relative position class
pub fn infer_handles(rel_x: RelativeX, rel_y: RelativeY) -> (Handle, Handle) {
    use Handle::{Bottom, Left, Right, Top};
    match (rel_x, rel_y) {
        (RelativeX::Left, RelativeY::Above) => (Right, Top),
        (RelativeX::Left, RelativeY::Level) | (RelativeX::Level, RelativeY::Level) => (Right, Left),
        (RelativeX::Left, RelativeY::Below) => (Right, Bottom),
        (RelativeX::Level, RelativeY::Above) => (Bottom, Top),
        (RelativeX::Level, RelativeY::Below) => (Top, Bottom),
        (RelativeX::Right, RelativeY::Above) => (Left, Top),
        (RelativeX::Right, RelativeY::Level) => (Left, Right),
        (RelativeX::Right, RelativeY::Below) => (Left, Bottom),
    }
}

/// Geometry of one routed edge in world space
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRoute {
    /// Index of the edge in the scene's edge list
    pub edge_index: usize,
    /// Exit side on the source
    pub start_handle: Handle,
    /// Entry side on the target
    pub end_handle: Handle,
    /// Curve start (source handle midpoint)
    pub start: Pos2,
    /// First control point
    pub ctrl1: Pos2,
    /// Second control point
    pub ctrl2: Pos2,
    /// Curve end (target handle midpoint)
    pub end: Pos2,
    /// Orientation used to size the control arms
    pub orientation: Orientation,
    /// Label text and its anchor
    pub label: Option<(String, Pos2)>,
}

impl EdgeRoute {
    /// Sample points along the curve
    pub fn points(&self, segments: usize) -> Vec<Pos2> {
        bezier_points(self.start, self.ctrl1, self.ctrl2, self.end, segments)
    }

    /// Unit direction of travel at the end of the curve
    pub fn end_direction(&self) -> Vec2 {
        let tangent = self.end - self.ctrl2;
        if tangent.length_sq() > f32::EPSILON {
            tangent.normalized()
        } else {
            -self.end_handle.normal()
        }
    }

    /// SVG path data (`M ... C ...`)
    pub fn svg_path(&self) -> String {
        let mut d = String::new();
        let _ = write!(
            d,
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x,
            self.start.y,
            self.ctrl1.x,
            self.ctrl1.y,
            self.ctrl2.x,
            self.ctrl2.y,
            self.end.x,
            self.end.y
        );
        d
    }

    /// Apply a transform to every point
    pub fn map_points(&self, f: impl Fn(Pos2) -> Pos2) -> Self {
        Self {
            start: f(self.start),
            ctrl1: f(self.ctrl1),
            ctrl2: f(self.ctrl2),
            end: f(self.end),
            label: self.label.as_ref().map(|(text, pos)| (text.clone(), f(*pos))),
            ..self.clone()
        }
    }
}

/// Computes edge routes from node geometry
#[derive(Debug, Clone, Copy)]
pub struct EdgeRouter {
    settings: EdgeSettings,
    fallback_size: Vec2,
}

impl EdgeRouter {
    /// Create a router; `fallback_size` is used for unmeasured nodes
    pub fn new(settings: EdgeSettings, fallback_size: Vec2) -> Self {
        Self {
            settings,
            fallback_size,
        }
    }

    /// Control arm length for a pair of endpoints
    pub fn control_distance(&self, start: Pos2, end: Pos2, orientation: Orientation) -> f32 {
        let dx = (end.x - start.x).abs();
        let dy = (end.y - start.y).abs();
        let arm = match orientation {
            Orientation::Horizontal => dx / 2.0,
            Orientation::Vertical => dy / 2.0,
            Orientation::Ambiguous => (dx * dx + dy * dy).sqrt() / 4.0,
        };
        arm.max(self.settings.min_loft)
    }

    /// Pick handles for a pair of node rectangles
    ///
    /// Explicit handles win; a missing side is taken from the inference table.
    pub fn handles_between(
        &self,
        source: Rect,
        target: Rect,
        start: Option<Handle>,
        end: Option<Handle>,
    ) -> (Handle, Handle) {
        if let (Some(start), Some(end)) = (start, end) {
            return (start, end);
        }
        let (rel_x, rel_y) = relative_position(source, target, self.settings.level_threshold);
        let (inferred_start, inferred_end) = infer_handles(rel_x, rel_y);
        (start.unwrap_or(inferred_start), end.unwrap_or(inferred_end))
    }

    /// Route between two node rectangles
    pub fn route_between(
        &self,
        edge_index: usize,
        source: Rect,
        target: Rect,
        start: Option<Handle>,
        end: Option<Handle>,
    ) -> EdgeRoute {
        let orientation = Orientation::between(source, target);
        let (start_handle, end_handle) = self.handles_between(source, target, start, end);

        let start = start_handle.anchor(source);
        let end = end_handle.anchor(target);
        let arm = self.control_distance(start, end, orientation);

        EdgeRoute {
            edge_index,
            start_handle,
            end_handle,
            start,
            ctrl1: start + start_handle.normal() * arm,
            ctrl2: end + end_handle.normal() * arm,
            end,
            orientation,
            label: None,
        }
    }

    /// Route one edge; `None` when either endpoint is missing
    pub fn route(&self, scene: &Scene, edge_index: usize, edge: &Edge) -> Option<EdgeRoute> {
        let source = scene.node(&edge.from)?.rect(self.fallback_size);
        let target = scene.node(&edge.to)?.rect(self.fallback_size);

        let mut route =
            self.route_between(edge_index, source, target, edge.start_side(), edge.end_side());
        route.label = edge.label.as_ref().map(|text| {
            let mid = route.start + (route.end - route.start) / 2.0;
            (text.clone(), mid - Vec2::new(0.0, self.settings.label_offset))
        });
        Some(route)
    }

    /// Route every drawable edge in scene order
    ///
    /// Edges with a dangling endpoint are skipped without affecting others.
    pub fn route_all(&self, scene: &Scene) -> Vec<EdgeRoute> {
        scene
            .edges()
            .iter()
            .enumerate()
            .filter_map(|(index, edge)| {
                let route = self.route(scene, index, edge);
                if route.is_none() {
                    tracing::debug!("Skipping edge {} -> {}: endpoint not in scene", edge.from, edge.to);
                }
                route
            })
            .collect()
    }
}

/// Generate points along a cubic bezier curve
pub fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    let segments = segments.max(1);
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * p0.x + 3.0 * mt2 * t * p1.x + 3.0 * mt * t2 * p2.x + t3 * p3.x;
        let y = mt3 * p0.y + 3.0 * mt2 * t * p1.y + 3.0 * mt * t2 * p2.y + t3 * p3.y;

        points.push(Pos2::new(x, y));
    }
    points
}
