// SPDX-License-Identifier: MIT OR Apache-2.0
//! Backend-independent display list for a flow scene.
//!
//! A [`SceneFrame`] is a snapshot of everything that gets drawn: node boxes,
//! routed edges, UI chrome, style and the world → pixel transform. The egui
//! view paints it directly; exports go through [`SceneFrame::to_svg`].

use crate::node::{Handle, NodeId, NodeState};
use crate::routing::EdgeRoute;
use crate::scene::Scene;
use crate::selection::Selection;
use crate::viewport::Viewport;
use egui::{Color32, Pos2, Rect, Vec2};
use std::fmt::Write as _;

/// Height of the node header band in world units
pub const NODE_HEADER_HEIGHT: f32 = 24.0;
/// Radius of a connection handle dot
pub const HANDLE_RADIUS: f32 = 4.0;
/// Node corner rounding
pub const NODE_ROUNDING: f32 = 6.0;
/// Edge stroke width in world units
pub const EDGE_THICKNESS: f32 = 2.0;
/// Arrowhead length and width
pub const ARROW_SIZE: Vec2 = Vec2::new(10.0, 7.0);

/// Uniform scale followed by a translation: `p * scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTransform {
    /// Scale factor
    pub scale: f32,
    /// Translation applied after scaling
    pub offset: Vec2,
}

impl SceneTransform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: Vec2::ZERO,
    };

    /// Pure translation
    pub fn translate(offset: Vec2) -> Self {
        Self { scale: 1.0, offset }
    }

    /// Pure scale
    pub fn scale(scale: f32) -> Self {
        Self {
            scale,
            offset: Vec2::ZERO,
        }
    }

    /// `self ∘ inner`: apply `inner` first, then `self`
    pub fn then_after(self, inner: Self) -> Self {
        Self {
            scale: self.scale * inner.scale,
            offset: inner.offset * self.scale + self.offset,
        }
    }

    /// The viewport's world → screen mapping
    pub fn from_viewport(viewport: &Viewport) -> Self {
        Self {
            scale: viewport.scale,
            offset: viewport.offset,
        }
    }

    /// Map a point
    pub fn apply(&self, p: Pos2) -> Pos2 {
        Pos2::new(p.x * self.scale + self.offset.x, p.y * self.scale + self.offset.y)
    }

    /// Map a rectangle
    pub fn apply_rect(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.apply(rect.min), self.apply(rect.max))
    }
}

/// Fill color of a node header by style tag
pub fn kind_color(kind: &str) -> Color32 {
    match kind {
        "source" | "input" => Color32::from_rgb(56, 142, 110),
        "output" | "sink" => Color32::from_rgb(180, 96, 60),
        "decision" => Color32::from_rgb(168, 132, 40),
        "model" => Color32::from_rgb(120, 86, 170),
        "storage" | "data" => Color32::from_rgb(60, 120, 170),
        _ => Color32::from_rgb(70, 100, 130),
    }
}

/// Background grid pattern in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStyle {
    /// Distance between lines
    pub spacing: f32,
    /// A point every grid line passes through
    pub origin: Pos2,
}

/// Colors and decorations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStyle {
    /// Canvas background
    pub background: Color32,
    /// Optional background grid
    pub grid: Option<GridStyle>,
    /// Node body fill
    pub node_fill: Color32,
    /// Node body fill when selected
    pub node_fill_selected: Color32,
    /// Node border
    pub node_border: Color32,
    /// Selection outline
    pub selection_outline: Color32,
    /// Edge stroke
    pub edge: Color32,
    /// Edge label text
    pub edge_label: Color32,
    /// Node label text
    pub node_label: Color32,
}

impl FrameStyle {
    /// Style of the interactive view
    pub fn interactive() -> Self {
        Self {
            background: Color32::from_rgb(248, 250, 252),
            grid: None,
            node_fill: Color32::from_rgb(255, 255, 255),
            node_fill_selected: Color32::from_rgb(232, 240, 254),
            node_border: Color32::from_rgb(203, 213, 225),
            selection_outline: Color32::from_rgb(100, 150, 255),
            edge: Color32::from_rgb(100, 116, 139),
            edge_label: Color32::from_rgb(100, 116, 139),
            node_label: Color32::WHITE,
        }
    }

    /// Style of exported images: white background, black edge labels
    pub fn export() -> Self {
        Self {
            background: Color32::WHITE,
            edge_label: Color32::BLACK,
            ..Self::interactive()
        }
    }
}

/// UI-only overlays that exports hide
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chrome {
    /// Live marquee rectangle in screen space
    pub marquee: Option<Rect>,
    /// Whether the rename toolbar is shown
    pub toolbar: bool,
}

impl Chrome {
    /// Hide every overlay
    pub fn hide(&mut self) {
        self.marquee = None;
        self.toolbar = false;
    }
}

/// A node as drawn
#[derive(Debug, Clone, PartialEq)]
pub struct NodeShape {
    /// Node id
    pub id: NodeId,
    /// World-space bounds
    pub rect: Rect,
    /// Label text
    pub label: String,
    /// Style tag
    pub kind: String,
    /// Tooltip text behind the info affordance
    pub info: Option<String>,
    /// Selection state
    pub selected: bool,
    /// Whether the label is currently replaced by an edit field
    pub renaming: bool,
}

impl NodeShape {
    fn from_state(state: &NodeState, fallback: Vec2, selected: bool) -> Self {
        Self {
            id: state.id().clone(),
            rect: state.rect(fallback),
            label: state.node.label.clone(),
            kind: state.node.kind().to_string(),
            info: state.node.info.clone(),
            selected,
            renaming: false,
        }
    }

    /// Header band in world space
    pub fn header_rect(&self) -> Rect {
        Rect::from_min_size(
            self.rect.min,
            Vec2::new(self.rect.width(), NODE_HEADER_HEIGHT.min(self.rect.height())),
        )
    }

    /// Info affordance circle center in world space
    pub fn info_anchor(&self) -> Pos2 {
        let header = self.header_rect();
        Pos2::new(header.right() - NODE_HEADER_HEIGHT / 2.0, header.center().y)
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame {
    /// Nodes in paint order
    pub nodes: Vec<NodeShape>,
    /// Routed edges in paint order
    pub edges: Vec<EdgeRoute>,
    /// Overlays
    pub chrome: Chrome,
    /// Colors
    pub style: FrameStyle,
    /// World → pixel transform
    pub transform: SceneTransform,
}

impl SceneFrame {
    /// Snapshot a scene as seen through `viewport`
    pub fn build(
        scene: &Scene,
        routes: &[EdgeRoute],
        selection: &Selection,
        viewport: &Viewport,
        fallback: Vec2,
    ) -> Self {
        let nodes = scene
            .nodes()
            .map(|n| NodeShape::from_state(n, fallback, selection.contains(n.id())))
            .collect();
        Self {
            nodes,
            edges: routes.to_vec(),
            chrome: Chrome {
                marquee: None,
                toolbar: !selection.is_empty(),
            },
            style: FrameStyle::interactive(),
            transform: SceneTransform::from_viewport(viewport),
        }
    }

    /// Find a node shape by id
    pub fn node(&self, id: &NodeId) -> Option<&NodeShape> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Render the frame as a standalone SVG document
    ///
    /// This is the exported picture: the software rasterizer draws exactly
    /// this document, text included.
    pub fn to_svg(&self, width: u32, height: u32) -> String {
        let mut svg = String::new();
        let t = self.transform;
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"#
        );
        let _ = writeln!(
            svg,
            r#"<defs><marker id="arrowhead" markerWidth="{}" markerHeight="{}" refX="{}" refY="{}" orient="auto" markerUnits="userSpaceOnUse"><polygon points="0 0, {} {}, 0 {}" fill="{}"/></marker></defs>"#,
            ARROW_SIZE.x,
            ARROW_SIZE.y,
            ARROW_SIZE.x,
            ARROW_SIZE.y / 2.0,
            ARROW_SIZE.x,
            ARROW_SIZE.y / 2.0,
            ARROW_SIZE.y,
            hex(self.style.edge)
        );
        let _ = writeln!(
            svg,
            r#"<rect width="100%" height="100%" fill="{}"/>"#,
            hex(self.style.background)
        );
        if let Some(grid) = self.style.grid {
            self.write_grid(&mut svg, grid, width as f32, height as f32);
        }
        let _ = writeln!(
            svg,
            r#"<g transform="translate({} {}) scale({})">"#,
            t.offset.x, t.offset.y, t.scale
        );

        for edge in &self.edges {
            let _ = writeln!(
                svg,
                r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}" marker-end="url(#arrowhead)"/>"#,
                edge.svg_path(),
                hex(self.style.edge),
                EDGE_THICKNESS
            );
            if let Some((text, pos)) = &edge.label {
                let _ = writeln!(
                    svg,
                    r#"<text x="{}" y="{}" text-anchor="middle" font-size="11" fill="{}">{}</text>"#,
                    pos.x,
                    pos.y,
                    hex(self.style.edge_label),
                    escape(text)
                );
            }
        }

        for node in &self.nodes {
            self.write_node(&mut svg, node);
        }

        svg.push_str("</g>\n</svg>\n");
        svg
    }

    fn write_grid(&self, svg: &mut String, grid: GridStyle, width: f32, height: f32) {
        if grid.spacing <= 0.0 {
            return;
        }
        let mut d = String::new();
        let mut x = grid.origin.x.rem_euclid(grid.spacing);
        while x <= width {
            let _ = write!(d, "M{x} 0V{height}");
            x += grid.spacing;
        }
        let mut y = grid.origin.y.rem_euclid(grid.spacing);
        while y <= height {
            let _ = write!(d, "M0 {y}H{width}");
            y += grid.spacing;
        }
        let _ = writeln!(
            svg,
            r#"<path d="{d}" fill="none" stroke="{}" stroke-opacity="0.5" stroke-width="1"/>"#,
            hex(self.style.node_border)
        );
    }

    fn write_node(&self, svg: &mut String, node: &NodeShape) {
        let r = node.rect;
        let fill = if node.selected {
            self.style.node_fill_selected
        } else {
            self.style.node_fill
        };
        let (border, border_width) = if node.selected {
            (self.style.selection_outline, 2.0)
        } else {
            (self.style.node_border, 1.0)
        };
        let _ = writeln!(
            svg,
            r#"<g data-id="{}" data-type="{}"><rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}"/>"#,
            escape(node.id.as_str()),
            escape(&node.kind),
            r.min.x,
            r.min.y,
            r.width(),
            r.height(),
            NODE_ROUNDING,
            hex(fill)
        );

        // Header band, rounded on top only
        let h = node.header_rect();
        let rounding = NODE_ROUNDING.min(h.width() / 2.0).min(h.height());
        let _ = writeln!(
            svg,
            r#"<path d="M{l} {b}V{tr}Q{l} {t} {lr} {t}H{rr}Q{rt} {t} {rt} {tr}V{b}Z" fill="{}"/>"#,
            hex(kind_color(&node.kind)),
            l = h.min.x,
            t = h.min.y,
            rt = h.max.x,
            b = h.max.y,
            tr = h.min.y + rounding,
            lr = h.min.x + rounding,
            rr = h.max.x - rounding,
        );
        if !node.renaming {
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="central" font-size="12" fill="{}">{}</text>"#,
                h.center().x,
                h.center().y,
                hex(self.style.node_label),
                escape(&node.label)
            );
        }
        if node.info.is_some() {
            let c = node.info_anchor();
            let _ = writeln!(
                svg,
                r#"<g class="info"><circle cx="{}" cy="{}" r="6" fill="none" stroke="{label}"/><text x="{}" y="{}" text-anchor="middle" dominant-baseline="central" font-size="9" fill="{label}">i</text></g>"#,
                c.x,
                c.y,
                c.x,
                c.y,
                label = hex(self.style.node_label)
            );
        }

        let _ = writeln!(
            svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
            r.min.x,
            r.min.y,
            r.width(),
            r.height(),
            NODE_ROUNDING,
            hex(border),
            border_width
        );
        for handle in Handle::ALL {
            let p = handle.anchor(r);
            let _ = writeln!(
                svg,
                r#"<circle cx="{}" cy="{}" r="{}" fill="{}"/>"#,
                p.x,
                p.y,
                HANDLE_RADIUS,
                hex(self.style.edge)
            );
        }
        svg.push_str("</g>\n");
    }
}

fn hex(color: Color32) -> String {
    let [r, g, b, _] = color.to_srgba_unmultiplied();
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
