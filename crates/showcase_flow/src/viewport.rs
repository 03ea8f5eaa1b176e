// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pan/zoom transform between screen and world space.
//!
//! `screen = world * scale + offset`. The offset is in screen pixels, so a
//! freshly centered viewport has its world origin in the middle of the view.

use crate::config::ZoomSettings;
use egui::{Pos2, Rect, Vec2};

/// Viewport transform state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// World-to-screen translation
    pub offset: Vec2,
    /// Zoom factor
    pub scale: f32,
    zoom: ZoomSettings,
}

impl Viewport {
    /// Create an identity viewport
    pub fn new(zoom: ZoomSettings) -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            zoom,
        }
    }

    /// Reset to scale 1 with the world origin at the view center
    pub fn reset(&mut self, view_size: Vec2) {
        self.scale = 1.0;
        self.recenter(view_size);
    }

    /// Re-center after a resize; the scale is kept
    pub fn recenter(&mut self, view_size: Vec2) {
        self.offset = view_size / 2.0;
    }

    /// Convert screen position to world position
    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        Pos2::new(
            (screen.x - self.offset.x) / self.scale,
            (screen.y - self.offset.y) / self.scale,
        )
    }

    /// Convert world position to screen position
    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        Pos2::new(
            world.x * self.scale + self.offset.x,
            world.y * self.scale + self.offset.y,
        )
    }

    /// Convert a screen rectangle to world space
    pub fn screen_rect_to_world(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.screen_to_world(rect.min), self.screen_to_world(rect.max))
    }

    /// Convert a world rectangle to screen space
    pub fn world_rect_to_screen(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.world_to_screen(rect.min), self.world_to_screen(rect.max))
    }

    /// Zoom around a screen point
    ///
    /// `delta` is positive when zooming in. The world point under `pointer`
    /// stays under `pointer`.
    pub fn zoom_at(&mut self, delta: f32, pointer: Pos2) {
        let new_scale =
            (self.scale + delta * self.zoom.sensitivity).clamp(self.zoom.min_scale, self.zoom.max_scale);
        let world = self.screen_to_world(pointer);
        self.offset = pointer.to_vec2() - world.to_vec2() * new_scale;
        self.scale = new_scale;
    }

    /// Pan so that the screen point `pointer` sits `anchor` pixels past the origin
    ///
    /// `anchor` is `pointer - offset` captured when the pan started.
    pub fn pan_to(&mut self, pointer: Pos2, anchor: Vec2) {
        self.offset = pointer.to_vec2() - anchor;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ZoomSettings::default())
    }
}
