// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rasterization of scene frames.
//!
//! Capturing an image is an asynchronous collaborator behind the
//! [`Rasterizer`] trait. The capture receives a snapshot [`SceneFrame`] and a
//! before-capture hook that may restyle the snapshot without touching the
//! live scene.
//!
//! [`SoftwareRasterizer`] is the built-in backend. It writes the frame as SVG
//! and renders that document with `resvg` onto a `tiny-skia` pixmap, so the
//! image carries node labels, edge labels and info markers.

use crate::render::SceneFrame;
use futures::future::BoxFuture;
use image::{ImageFormat, RgbaImage};
use resvg::usvg::{self, fontdb};
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;
use tiny_skia::{Pixmap, Transform};

/// Errors from rasterization
#[derive(Debug, Error)]
pub enum RasterError {
    /// Target size is zero or too large
    #[error("Invalid target size: {width}x{height}")]
    InvalidSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
    /// The generated SVG could not be parsed
    #[error("Failed to parse generated SVG: {0}")]
    Svg(#[from] usvg::Error),
    /// PNG encoding failed
    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    /// Backend-specific failure
    #[error("Rasterizer failed: {0}")]
    Backend(String),
}

/// Request for one capture
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Snapshot to draw; the hook runs on it before drawing
    pub frame: SceneFrame,
}

/// Callback that adjusts the snapshot right before it is drawn
pub type BeforeCapture<'a> = Box<dyn FnOnce(&mut SceneFrame) + Send + 'a>;

/// Produces a bitmap from a scene frame
pub trait Rasterizer: Send + Sync {
    /// Draw `request.frame` after running `before_capture` on it
    fn rasterize<'a>(
        &'a self,
        request: CaptureRequest,
        before_capture: BeforeCapture<'a>,
    ) -> BoxFuture<'a, Result<RgbaImage, RasterError>>;
}

/// CPU rasterizer: SVG through `resvg` onto a `tiny-skia` pixmap
#[derive(Debug, Clone)]
pub struct SoftwareRasterizer {
    fonts: Arc<fontdb::Database>,
}

impl SoftwareRasterizer {
    /// Rasterizer using the system fonts
    pub fn new() -> Self {
        let mut fonts = fontdb::Database::new();
        fonts.load_system_fonts();
        Self::with_fonts(fonts)
    }

    /// Rasterizer using a prepared font database
    ///
    /// When no face matches the generic `sans-serif` family, the first
    /// loaded family stands in for it.
    pub fn with_fonts(mut fonts: fontdb::Database) -> Self {
        let query = fontdb::Query {
            families: &[fontdb::Family::SansSerif],
            ..fontdb::Query::default()
        };
        if fonts.query(&query).is_none() {
            let fallback = fonts
                .faces()
                .find_map(|face| face.families.first().map(|(name, _)| name.clone()));
            if let Some(name) = fallback {
                tracing::debug!("Using {name} as sans-serif fallback");
                fonts.set_sans_serif_family(name);
            }
        }
        tracing::debug!("Rasterizer loaded {} font faces", fonts.len());
        Self {
            fonts: Arc::new(fonts),
        }
    }

    /// Number of font faces available for labels
    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    /// Draw a frame synchronously
    pub fn draw(&self, width: u32, height: u32, frame: &SceneFrame) -> Result<RgbaImage, RasterError> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RasterError::InvalidSize { width, height })?;

        let mut options = usvg::Options::default();
        options.fontdb = self.fonts.clone();
        let svg = frame.to_svg(width, height);
        let tree = usvg::Tree::from_str(&svg, &options)?;

        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());
        Ok(to_rgba_image(&pixmap))
    }
}

impl Default for SoftwareRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for SoftwareRasterizer {
    fn rasterize<'a>(
        &'a self,
        request: CaptureRequest,
        before_capture: BeforeCapture<'a>,
    ) -> BoxFuture<'a, Result<RgbaImage, RasterError>> {
        Box::pin(async move {
            let CaptureRequest {
                width,
                height,
                mut frame,
            } = request;
            before_capture(&mut frame);
            self.draw(width, height, &frame)
        })
    }
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RasterError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

fn to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut bytes = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        bytes.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), bytes)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EdgeSettings;
    use crate::edge::Edge;
    use crate::node::{Node, NodeId};
    use crate::render::{FrameStyle, SceneTransform};
    use crate::routing::EdgeRouter;
    use crate::scene::Scene;
    use crate::selection::Selection;
    use crate::viewport::Viewport;
    use egui::{Color32, Vec2};

    const FALLBACK: Vec2 = Vec2::new(40.0, 30.0);

    fn frame() -> SceneFrame {
        let mut scene = Scene::new();
        scene.add_node(Node::new("a", "A").with_position(10.0, 10.0));
        SceneFrame::build(&scene, &[], &Selection::new(), &Viewport::default(), FALLBACK)
    }

    fn labeled_frame(node_label: &str, edge_label: &str) -> SceneFrame {
        let mut scene = Scene::new();
        scene.add_node(Node::new("a", node_label).with_position(0.0, 0.0));
        scene.add_node(Node::new("b", "B").with_position(300.0, 0.0));
        scene.add_edge(Edge::new("a", "b").with_label(edge_label));
        let size = Vec2::new(220.0, 100.0);
        let routes = EdgeRouter::new(EdgeSettings::default(), size).route_all(&scene);
        let mut frame =
            SceneFrame::build(&scene, &routes, &Selection::new(), &Viewport::default(), size);
        frame.style = FrameStyle::export();
        // Large enough that glyph stems cover whole pixels
        frame.transform = SceneTransform::translate(Vec2::new(20.0, 40.0))
            .then_after(SceneTransform::scale(3.0));
        frame
    }

    #[test]
    fn test_draw_background_and_node() {
        let mut frame = frame();
        frame.style = FrameStyle::export();
        let image = SoftwareRasterizer::default().draw(64, 64, &frame).unwrap();
        assert_eq!(image.dimensions(), (64, 64));
        assert_eq!(image.get_pixel(1, 1).0, [255, 255, 255, 255]);
        // Inside the node header
        assert_ne!(image.get_pixel(30, 14).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_labels_reach_the_pixels() {
        let rasterizer = SoftwareRasterizer::default();
        if rasterizer.font_count() == 0 {
            // Text cannot be shaped without any installed font
            return;
        }
        let draw = |node: &str, edge: &str| {
            rasterizer
                .draw(1600, 400, &labeled_frame(node, edge))
                .unwrap()
        };
        let base = draw("Load", "rows");
        assert_ne!(base, draw("A completely different label WWWWWW", "rows"));
        assert_ne!(base, draw("Load", ""));
    }

    #[test]
    fn test_edge_label_color_follows_style() {
        let rasterizer = SoftwareRasterizer::default();
        if rasterizer.font_count() == 0 {
            return;
        }
        let mut red = labeled_frame("Load", "WWWW");
        red.style.edge_label = Color32::from_rgb(255, 0, 0);
        let image = rasterizer.draw(1600, 400, &red).unwrap();
        assert!(image.pixels().any(|p| p.0 == [255, 0, 0, 255]));

        let black = rasterizer.draw(1600, 400, &labeled_frame("Load", "WWWW")).unwrap();
        assert!(!black.pixels().any(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_zero_size_is_error() {
        let result = SoftwareRasterizer::default().draw(0, 10, &frame());
        assert!(matches!(result, Err(RasterError::InvalidSize { width: 0, height: 10 })));
    }

    #[test]
    fn test_hook_runs_before_draw() {
        let request = CaptureRequest {
            width: 32,
            height: 32,
            frame: frame(),
        };
        let rasterizer = SoftwareRasterizer::default();
        let image = futures::executor::block_on(rasterizer.rasterize(
            request,
            Box::new(|frame: &mut SceneFrame| {
                frame.nodes.retain(|n| n.id != NodeId::new("a"));
                frame.style.background = Color32::BLACK;
                frame.transform = SceneTransform::IDENTITY;
            }),
        ))
        .unwrap();
        assert!(image.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_encode_png_signature() {
        let image = RgbaImage::new(4, 4);
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
