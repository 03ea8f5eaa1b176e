// SPDX-License-Identifier: MIT OR Apache-2.0
//! Seed layout for nodes that arrive without coordinates.
//!
//! This is a best-effort scatter, not a solver: each unpositioned node gets a
//! random spot inside the padded view, and a horizontal cursor keeps
//! consecutive nodes from piling up on the same column.

use crate::config::LayoutSettings;
use crate::node::NodeId;
use crate::scene::Scene;
use egui::{Pos2, Vec2};
use rand::Rng;

/// Placement bounds derived from the view size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedBounds {
    /// Smallest x a placed node may get; advances as nodes are processed
    pub min_x: f32,
    /// Largest x
    pub max_x: f32,
    /// Smallest y
    pub min_y: f32,
    /// Largest y
    pub max_y: f32,
}

impl SeedBounds {
    /// Bounds for a view of `view_size`, in world units around the origin
    ///
    /// Nodes are seeded in the left half so the flow reads left to right.
    pub fn for_view(view_size: Vec2, padding: f32) -> Self {
        Self {
            min_x: -(view_size.x / 2.0) + padding,
            max_x: 0.0,
            min_y: -(view_size.y / 2.0) + padding,
            max_y: view_size.y / 2.0 - padding,
        }
    }
}

/// Integer-aligned random value in `[min, max]`; `min` once the range is exhausted
fn pick<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    if min > max {
        return min;
    }
    let unit: f32 = rng.random_range(0.0..1.0);
    (unit * (max - min + 1.0)).floor() + min
}

/// Assign positions to every node that has none
///
/// Returns the ids that were placed. Positioned nodes keep their
/// coordinates but still advance the horizontal cursor.
pub fn seed_layout<R: Rng>(
    scene: &mut Scene,
    view_size: Vec2,
    settings: &LayoutSettings,
    rng: &mut R,
) -> Vec<NodeId> {
    let mut bounds = SeedBounds::for_view(view_size, settings.padding);
    let mut placed = Vec::new();

    for state in scene.nodes_mut() {
        let x = match state.node.x {
            Some(x) => x,
            None => pick(rng, bounds.min_x, bounds.max_x),
        };
        let y = match state.node.y {
            Some(y) => y,
            None => pick(rng, bounds.min_y, bounds.max_y),
        };
        if !state.is_positioned() {
            placed.push(state.id().clone());
        }
        state.set_position(Pos2::new(x, y));
        bounds.min_x = x + settings.advance;
    }

    if !placed.is_empty() {
        tracing::debug!("Seeded positions for {} nodes", placed.len());
    }
    placed
}
