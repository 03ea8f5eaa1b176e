// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer gestures: pan, node dragging and marquee selection.
//!
//! The canvas is always in exactly one [`InteractionMode`]. A gesture starts
//! on pointer-down, is driven by pointer-move and ends on pointer-up, which
//! returns the canvas to [`InteractionMode::Idle`] and drops all transient
//! gesture state.

use crate::canvas::FlowCanvas;
use crate::node::NodeId;
use crate::rename::RenameTrigger;
use crate::selection::SelectMode;
use egui::{Pos2, Rect, Vec2};
use std::collections::HashMap;

/// What the pointer went down on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    /// Empty canvas background
    Background,
    /// A node body
    Node(NodeId),
}

/// Rubber-band selection rectangle in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marquee {
    /// Where the gesture started
    pub start: Pos2,
    /// Latest pointer position
    pub current: Pos2,
}

impl Marquee {
    /// Normalized rectangle spanned by the gesture
    pub fn rect(&self) -> Rect {
        Rect::from_two_pos(self.start, self.current)
    }
}

/// Canvas interaction mode
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionMode {
    /// No gesture in progress
    #[default]
    Idle,
    /// Dragging the view
    Panning {
        /// Pointer position relative to the viewport offset at pan start
        anchor: Vec2,
    },
    /// Dragging the selected nodes
    DraggingNodes {
        /// Pointer world position minus node position, per node
        offsets: HashMap<NodeId, Vec2>,
    },
    /// Drawing a selection rectangle
    MarqueeSelecting(Marquee),
}

impl InteractionMode {
    /// Whether no gesture is active
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// What changed as a result of an input event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasUpdate {
    /// Viewport offset or scale changed
    pub view_changed: bool,
    /// Selection set changed
    pub selection_changed: bool,
    /// Nodes whose position changed
    pub moved_nodes: Vec<NodeId>,
    /// Edge routes were recomputed
    pub edges_rerouted: bool,
    /// Marquee rectangle changed or disappeared
    pub marquee_changed: bool,
}

impl CanvasUpdate {
    /// Whether anything needs repainting
    pub fn needs_repaint(&self) -> bool {
        self.view_changed
            || self.selection_changed
            || !self.moved_nodes.is_empty()
            || self.edges_rerouted
            || self.marquee_changed
    }

    /// Fold another update into this one
    pub fn merge(&mut self, other: CanvasUpdate) {
        self.view_changed |= other.view_changed;
        self.selection_changed |= other.selection_changed;
        self.edges_rerouted |= other.edges_rerouted;
        self.marquee_changed |= other.marquee_changed;
        for id in other.moved_nodes {
            if !self.moved_nodes.contains(&id) {
                self.moved_nodes.push(id);
            }
        }
    }
}

/// Round to the nearest multiple of `step`, halves rounding up
pub fn snap(value: f32, step: f32) -> f32 {
    (value / step + 0.5).floor() * step
}

/// Strict AABB overlap; rectangles that only touch do not overlap
pub fn overlaps(node: Rect, area: Rect) -> bool {
    node.min.x < area.max.x
        && node.max.x > area.min.x
        && node.min.y < area.max.y
        && node.max.y > area.min.y
}

impl FlowCanvas {
    /// Pointer pressed at `pointer` (screen space)
    ///
    /// `additive` is the selection modifier (Shift). Presses while another
    /// gesture is active are ignored. An open rename is committed first, as
    /// the edit field loses focus.
    pub fn pointer_down(&mut self, target: PointerTarget, pointer: Pos2, additive: bool) -> CanvasUpdate {
        let mut update = CanvasUpdate::default();
        if !self.active || !self.mode.is_idle() {
            return update;
        }
        if self.rename.is_some() {
            self.commit_rename(RenameTrigger::FocusLost);
        }

        match target {
            PointerTarget::Background if additive => {
                self.mode = InteractionMode::MarqueeSelecting(Marquee {
                    start: pointer,
                    current: pointer,
                });
                update.marquee_changed = true;
                tracing::debug!("Marquee selection started");
            }
            PointerTarget::Background => {
                update.selection_changed = !self.selection.is_empty();
                self.selection.clear();
                self.mode = InteractionMode::Panning {
                    anchor: pointer.to_vec2() - self.viewport.offset,
                };
                tracing::debug!("Panning started");
            }
            PointerTarget::Node(id) => {
                if !self.scene.contains(&id) {
                    return update;
                }
                if !self.selection.contains(&id) {
                    self.selection.select(id, SelectMode::from_modifier(additive));
                    update.selection_changed = true;
                }

                let world = self.viewport.screen_to_world(pointer);
                let offsets = self
                    .selection
                    .iter()
                    .filter_map(|sel| self.scene.node(sel).map(|n| (sel.clone(), world - n.position)))
                    .collect();
                self.mode = InteractionMode::DraggingNodes { offsets };
                tracing::debug!("Dragging {} nodes", self.selection.len());
            }
        }
        update
    }

    /// Pointer moved to `pointer` (screen space)
    pub fn pointer_move(&mut self, pointer: Pos2) -> CanvasUpdate {
        let mut update = CanvasUpdate::default();
        match &mut self.mode {
            InteractionMode::Idle => {}
            InteractionMode::Panning { anchor } => {
                self.viewport.pan_to(pointer, *anchor);
                update.view_changed = true;
            }
            InteractionMode::MarqueeSelecting(marquee) => {
                marquee.current = pointer;
                update.marquee_changed = true;
            }
            InteractionMode::DraggingNodes { offsets } => {
                let world = self.viewport.screen_to_world(pointer);
                let step = self.settings.layout.snap;
                for (id, offset) in offsets.iter() {
                    let target = world - *offset;
                    let snapped = Pos2::new(snap(target.x, step), snap(target.y, step));
                    let moved = self.scene.node(id).is_some_and(|n| n.position != snapped);
                    if moved && self.scene.set_position(id, snapped) {
                        update.moved_nodes.push(id.clone());
                    }
                }
            }
        }
        if !update.moved_nodes.is_empty() {
            self.reroute_nodes(&update.moved_nodes);
            update.edges_rerouted = true;
        }
        update
    }

    /// Pointer released; ends whatever gesture is active
    pub fn pointer_up(&mut self) -> CanvasUpdate {
        let mut update = CanvasUpdate::default();
        match std::mem::take(&mut self.mode) {
            InteractionMode::Idle => {}
            InteractionMode::Panning { .. } => {
                tracing::debug!("Panning ended");
            }
            InteractionMode::DraggingNodes { offsets } => {
                tracing::debug!("Dragged {} nodes", offsets.len());
            }
            InteractionMode::MarqueeSelecting(marquee) => {
                let area = self.viewport.screen_rect_to_world(marquee.rect());
                let fallback = self.fallback_node_size();
                let before = self.selection.len();
                let hits: Vec<NodeId> = self
                    .scene
                    .nodes()
                    .filter(|n| overlaps(n.rect(fallback), area))
                    .map(|n| n.id().clone())
                    .collect();
                for id in hits {
                    self.selection.add(id);
                }
                update.marquee_changed = true;
                update.selection_changed = self.selection.len() != before;
                tracing::debug!("Marquee selected {} nodes", self.selection.len() - before);
            }
        }
        update
    }

    /// Mouse wheel over the canvas
    ///
    /// `delta` is positive to zoom in; the point under `pointer` stays fixed.
    pub fn wheel(&mut self, delta: f32, pointer: Pos2) -> CanvasUpdate {
        if !self.active || delta == 0.0 {
            return CanvasUpdate::default();
        }
        let before = self.viewport;
        self.viewport.zoom_at(delta, pointer);
        CanvasUpdate {
            view_changed: self.viewport != before,
            ..CanvasUpdate::default()
        }
    }

    /// The view was resized; re-centers without changing the zoom
    pub fn resize(&mut self, view_size: Vec2) -> CanvasUpdate {
        self.view_size = view_size;
        self.viewport.recenter(view_size);
        CanvasUpdate {
            view_changed: true,
            ..CanvasUpdate::default()
        }
    }

    /// Hit-test a screen point against the nodes
    pub fn target_at(&self, pointer: Pos2) -> PointerTarget {
        let world = self.viewport.screen_to_world(pointer);
        match self.scene.node_at(world, self.fallback_node_size()) {
            Some(id) => PointerTarget::Node(id.clone()),
            None => PointerTarget::Background,
        }
    }
}
