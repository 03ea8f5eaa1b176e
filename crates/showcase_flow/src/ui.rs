// SPDX-License-Identifier: MIT OR Apache-2.0
//! egui front end for the flow canvas.
//!
//! Features:
//! - Background grid that follows pan and zoom
//! - Edge rendering (bezier curves with arrowheads and labels)
//! - Node rendering with handles and an info tooltip
//! - Pan, zoom, drag, marquee selection
//! - Inline rename with a selection toolbar
//! - Status bar

use crate::canvas::FlowCanvas;
use crate::interaction::CanvasUpdate;
use crate::node::Handle;
use crate::rename::RenameTrigger;
use crate::render::{
    kind_color, NodeShape, SceneFrame, ARROW_SIZE, EDGE_THICKNESS, HANDLE_RADIUS,
    NODE_HEADER_HEIGHT, NODE_ROUNDING,
};
use egui::{Color32, Pos2, Rect, Stroke, Vec2};

/// Curve flattening resolution
const EDGE_SEGMENTS: usize = 24;
/// Node label font size in world units
const LABEL_FONT_SIZE: f32 = 12.0;
/// Horizontal room around a node label in world units
const LABEL_PADDING: f32 = 48.0;

/// Per-widget state of the flow view
pub struct FlowView {
    /// Draw the background grid
    pub show_grid: bool,
    /// Draw the status bar
    pub show_status_bar: bool,
    /// The rename field has been focused at least once
    rename_focused: bool,
}

impl FlowView {
    /// Create a view with grid and status bar enabled
    pub fn new() -> Self {
        Self {
            show_grid: true,
            show_status_bar: true,
            rename_focused: false,
        }
    }

    /// Render the canvas and feed it this frame's input
    pub fn ui(&mut self, ui: &mut egui::Ui, canvas: &mut FlowCanvas) -> CanvasUpdate {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let origin = rect.min.to_vec2();
        let mut update = CanvasUpdate::default();

        if !canvas.is_active() {
            return update;
        }
        if canvas.view_size() != rect.size() {
            update.merge(canvas.resize(rect.size()));
        }

        self.measure_nodes(ui, canvas);
        update.merge(self.handle_input(ui, &response, origin, canvas));

        let frame = canvas.frame();
        painter.rect_filled(rect, 0.0, frame.style.background);
        if self.show_grid {
            self.draw_grid(&painter, rect, canvas);
        }
        self.draw_edges(&painter, &frame, origin);
        self.draw_nodes(&painter, &frame, origin);
        self.show_info_tooltip(&response, &frame, origin);

        if let Some(marquee) = frame.chrome.marquee {
            draw_marquee(&painter, marquee.translate(origin));
        }
        if frame.chrome.toolbar {
            self.draw_toolbar(ui, rect, canvas);
        }
        self.rename_field(ui, &frame, origin, canvas);

        if self.show_status_bar {
            draw_status_bar(&painter, rect, canvas);
        }

        if update.needs_repaint() {
            ui.ctx().request_repaint();
        }
        update
    }

    /// Record label-driven node sizes; edges re-route only when a size changes
    fn measure_nodes(&self, ui: &egui::Ui, canvas: &mut FlowCanvas) {
        let fallback = canvas.fallback_node_size();
        let sizes: Vec<_> = canvas
            .scene()
            .nodes()
            .map(|state| {
                let text_width = ui.fonts(|f| {
                    f.layout_no_wrap(
                        state.node.label.clone(),
                        egui::FontId::proportional(LABEL_FONT_SIZE),
                        Color32::WHITE,
                    )
                    .size()
                    .x
                });
                let width = fallback.x.max(text_width + LABEL_PADDING);
                (state.id().clone(), Vec2::new(width, fallback.y))
            })
            .collect();
        for (id, size) in sizes {
            canvas.set_node_size(&id, size);
        }
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        origin: Vec2,
        canvas: &mut FlowCanvas,
    ) -> CanvasUpdate {
        let mut update = CanvasUpdate::default();
        let shift_held = ui.input(|i| i.modifiers.shift);

        // Zoom with scroll wheel
        if let Some(hover) = response.hover_pos() {
            let scroll_delta = ui.input(|i| i.raw_scroll_delta.y);
            if scroll_delta != 0.0 {
                update.merge(canvas.wheel(scroll_delta, hover - origin));
            }
        }

        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(press) = ui.input(|i| i.pointer.press_origin()) {
                let local = press - origin;
                let target = canvas.target_at(local);
                update.merge(canvas.pointer_down(target, local, shift_held));
            }
        } else if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = pos - origin;
                let target = canvas.target_at(local);
                update.merge(canvas.pointer_down(target, local, shift_held));
                update.merge(canvas.pointer_up());
            }
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                update.merge(canvas.pointer_move(pos - origin));
            }
        }
        if response.drag_stopped() {
            update.merge(canvas.pointer_up());
        }

        // F2 opens the inline editor, like the toolbar button
        if ui.input(|i| i.key_pressed(egui::Key::F2)) && canvas.rename_session().is_none() {
            self.begin_rename(canvas);
        }
        update
    }

    fn draw_grid(&self, painter: &egui::Painter, rect: Rect, canvas: &FlowCanvas) {
        let viewport = canvas.viewport();
        let spacing = canvas.settings().layout.grid_spacing * viewport.scale;
        if spacing < 4.0 {
            return;
        }
        let color = Color32::from_rgba_unmultiplied(148, 163, 184, 60);
        let stroke = Stroke::new(1.0, color);

        let mut x = rect.left() + viewport.offset.x.rem_euclid(spacing);
        while x < rect.right() {
            painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
            x += spacing;
        }
        let mut y = rect.top() + viewport.offset.y.rem_euclid(spacing);
        while y < rect.bottom() {
            painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
            y += spacing;
        }
    }

    fn draw_edges(&self, painter: &egui::Painter, frame: &SceneFrame, origin: Vec2) {
        let t = frame.transform;
        let stroke = Stroke::new(EDGE_THICKNESS * t.scale.max(0.5), frame.style.edge);
        for route in &frame.edges {
            let points: Vec<Pos2> = route
                .points(EDGE_SEGMENTS)
                .into_iter()
                .map(|p| t.apply(p) + origin)
                .collect();
            painter.add(egui::Shape::line(points, stroke));

            let tip = t.apply(route.end) + origin;
            let dir = route.end_direction();
            let back = tip - dir * ARROW_SIZE.x * t.scale;
            let side = dir.rot90() * (ARROW_SIZE.y / 2.0) * t.scale;
            painter.add(egui::Shape::convex_polygon(
                vec![tip, back + side, back - side],
                frame.style.edge,
                Stroke::NONE,
            ));

            if let Some((text, pos)) = &route.label {
                painter.text(
                    t.apply(*pos) + origin,
                    egui::Align2::CENTER_BOTTOM,
                    text,
                    egui::FontId::proportional(11.0 * t.scale),
                    frame.style.edge_label,
                );
            }
        }
    }

    fn draw_nodes(&self, painter: &egui::Painter, frame: &SceneFrame, origin: Vec2) {
        let t = frame.transform;
        let clip = painter.clip_rect();
        for node in &frame.nodes {
            let screen_rect = t.apply_rect(node.rect).translate(origin);
            if !screen_rect.intersects(clip) {
                continue;
            }
            let rounding = NODE_ROUNDING * t.scale;

            let fill = if node.selected {
                frame.style.node_fill_selected
            } else {
                frame.style.node_fill
            };
            painter.rect_filled(screen_rect, rounding, fill);

            let header = t.apply_rect(node.header_rect()).translate(origin);
            painter.rect_filled(
                header,
                egui::Rounding {
                    nw: rounding,
                    ne: rounding,
                    sw: 0.0,
                    se: 0.0,
                },
                kind_color(&node.kind),
            );
            if !node.renaming {
                painter.text(
                    header.center(),
                    egui::Align2::CENTER_CENTER,
                    &node.label,
                    egui::FontId::proportional(LABEL_FONT_SIZE * t.scale),
                    frame.style.node_label,
                );
            }

            if node.info.is_some() {
                let center = t.apply(node.info_anchor()) + origin;
                painter.circle_stroke(center, 6.0 * t.scale, Stroke::new(1.0, frame.style.node_label));
                painter.text(
                    center,
                    egui::Align2::CENTER_CENTER,
                    "i",
                    egui::FontId::proportional(9.0 * t.scale),
                    frame.style.node_label,
                );
            }

            let (border, width) = if node.selected {
                (frame.style.selection_outline, 2.0)
            } else {
                (frame.style.node_border, 1.0)
            };
            painter.rect_stroke(screen_rect, rounding, Stroke::new(width, border));

            for handle in Handle::ALL {
                let pos = t.apply(handle.anchor(node.rect)) + origin;
                painter.circle_filled(pos, HANDLE_RADIUS * t.scale, frame.style.edge);
            }
        }
    }

    fn show_info_tooltip(&self, response: &egui::Response, frame: &SceneFrame, origin: Vec2) {
        let Some(hover) = response.hover_pos() else {
            return;
        };
        let t = frame.transform;
        let hovered = frame.nodes.iter().rev().find_map(|node| {
            let info = node.info.as_deref()?;
            let center = t.apply(node.info_anchor()) + origin;
            (center.distance(hover) <= 8.0 * t.scale).then_some(info)
        });
        if let Some(info) = hovered {
            response.clone().on_hover_text_at_pointer(info);
        }
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui, rect: Rect, canvas: &mut FlowCanvas) {
        let button_rect = Rect::from_min_size(
            Pos2::new(rect.right() - 90.0, rect.top() + 10.0),
            Vec2::new(80.0, 24.0),
        );
        if ui.put(button_rect, egui::Button::new("Rename")).clicked() {
            self.begin_rename(canvas);
        }
    }

    fn begin_rename(&mut self, canvas: &mut FlowCanvas) {
        match canvas.begin_rename() {
            Ok(_) => self.rename_focused = false,
            Err(err) => tracing::debug!("Rename not started: {err}"),
        }
    }

    fn rename_field(
        &mut self,
        ui: &mut egui::Ui,
        frame: &SceneFrame,
        origin: Vec2,
        canvas: &mut FlowCanvas,
    ) {
        let Some(shape) = frame.nodes.iter().find(|n| n.renaming) else {
            return;
        };
        let field_rect = label_rect(shape, frame, origin);
        let Some(buffer) = canvas.rename_buffer_mut() else {
            return;
        };

        let edit = ui.put(
            field_rect,
            egui::TextEdit::singleline(buffer)
                .font(egui::FontId::proportional(LABEL_FONT_SIZE * frame.transform.scale))
                .horizontal_align(egui::Align::Center),
        );
        if !self.rename_focused {
            edit.request_focus();
            self.rename_focused = true;
            return;
        }

        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            canvas.cancel_rename();
        } else if edit.lost_focus() {
            let trigger = if ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                RenameTrigger::Enter
            } else {
                RenameTrigger::FocusLost
            };
            canvas.commit_rename(trigger);
        }
    }
}

impl Default for FlowView {
    fn default() -> Self {
        Self::new()
    }
}

fn label_rect(shape: &NodeShape, frame: &SceneFrame, origin: Vec2) -> Rect {
    let header = frame.transform.apply_rect(shape.header_rect()).translate(origin);
    let height = NODE_HEADER_HEIGHT * frame.transform.scale;
    Rect::from_center_size(header.center(), Vec2::new(header.width() - height, height))
}

fn draw_marquee(painter: &egui::Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgba_unmultiplied(100, 150, 255, 30));
    painter.rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::from_rgb(100, 150, 255)));
}

fn draw_status_bar(painter: &egui::Painter, rect: Rect, canvas: &FlowCanvas) {
    let status_rect = Rect::from_min_size(
        Pos2::new(rect.left() + 5.0, rect.bottom() - 20.0),
        Vec2::new(rect.width() - 10.0, 18.0),
    );

    painter.text(
        status_rect.left_center(),
        egui::Align2::LEFT_CENTER,
        format!(
            "Nodes: {} | Edges: {} | Zoom: {:.0}% | Selected: {}",
            canvas.scene().node_count(),
            canvas.routes().len(),
            canvas.viewport().scale * 100.0,
            canvas.selection().len(),
        ),
        egui::FontId::proportional(11.0),
        Color32::from_gray(120),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeId};
    use crate::scene::SceneDocument;

    #[test]
    fn test_label_rect_follows_transform() {
        let mut canvas = FlowCanvas::default();
        canvas.activate(
            Some(SceneDocument {
                nodes: vec![Node::new("a", "A").with_position(0.0, 0.0)],
                edges: vec![],
            }),
            Vec2::new(1000.0, 800.0),
        );
        let frame = canvas.frame();
        let shape = frame.node(&NodeId::new("a")).unwrap();
        let rect = label_rect(shape, &frame, Vec2::new(10.0, 20.0));
        // Header spans (500,400)..(720,424) locally
        assert_eq!(rect.center(), Pos2::new(620.0, 432.0));
        assert_eq!(rect.height(), NODE_HEADER_HEIGHT);
    }

    #[test]
    fn test_view_defaults() {
        let view = FlowView::default();
        assert!(view.show_grid);
        assert!(view.show_status_bar);
    }
}
