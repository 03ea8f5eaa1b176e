// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layout persistence and fixed-resolution image export.

use crate::canvas::FlowCanvas;
use crate::config::ExportSettings;
use crate::interaction::InteractionMode;
use crate::notify::ToastLevel;
use crate::raster::{encode_png, CaptureRequest, RasterError, Rasterizer};
use crate::render::{FrameStyle, GridStyle, SceneFrame, SceneTransform};
use crate::routing::EdgeRouter;
use crate::scene::{Scene, SceneDocument};
use egui::{Pos2, Rect, Vec2};
use image::RgbaImage;
use serde_json::Value;
use thiserror::Error;

/// Errors from saving or exporting
#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing to draw
    #[error("No nodes to export")]
    EmptyScene,
    /// The view was activated without a flow document
    #[error("No flow loaded for this project")]
    NoDocument,
    /// The content document has no `collection` array
    #[error("Invalid content document: 'collection' array missing")]
    MissingCollection,
    /// The `collection` array has no entries to fall back to
    #[error("Collection is empty")]
    EmptyCollection,
    /// The target collection entry is not a JSON object
    #[error("Collection entry {0} is not an object")]
    InvalidProjectEntry(usize),
    /// Rasterization failed
    #[error("Rasterization failed: {0}")]
    Raster(#[from] RasterError),
    /// JSON conversion failed
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// The persistence sink failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Identifies the project whose flow is being saved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRef {
    /// Index into `collection`, when known
    pub index: Option<usize>,
    /// Project title, matched against each entry's `project` field
    pub title: Option<String>,
}

/// Where a flow was written in the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Collection index that received the flow
    pub index: usize,
    /// The project could not be located and entry 0 was used instead
    pub fallback: bool,
}

/// Receives saved layouts and exported images
pub trait ExportSink {
    /// Persist the updated content document
    fn save_layout(&mut self, content: &Value) -> Result<(), ExportError>;

    /// Persist PNG bytes under `file_name`
    fn save_image(&mut self, file_name: &str, png: &[u8]) -> Result<(), ExportError>;
}

/// Serialize the scene as pretty JSON, nodes and edges in scene order
pub fn layout_json(scene: &Scene) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&scene.to_document())?)
}

/// Write `flow` into the matching entry of `content["collection"]`
///
/// The entry is found by `project.index`, then by title. When neither
/// matches, entry 0 receives the flow and the outcome is marked as a
/// fallback.
pub fn merge_into_collection(
    content: &mut Value,
    project: &ProjectRef,
    flow: &SceneDocument,
) -> Result<MergeOutcome, ExportError> {
    let collection = content
        .get_mut("collection")
        .and_then(Value::as_array_mut)
        .ok_or(ExportError::MissingCollection)?;

    let by_index = project.index.filter(|&i| i < collection.len());
    let by_title = || {
        let title = project.title.as_deref()?;
        collection
            .iter()
            .position(|entry| entry.get("project").and_then(Value::as_str) == Some(title))
    };
    let (index, fallback) = match by_index.or_else(by_title) {
        Some(index) => (index, false),
        None if collection.is_empty() => return Err(ExportError::EmptyCollection),
        None => (0, true),
    };

    let entry = collection[index]
        .as_object_mut()
        .ok_or(ExportError::InvalidProjectEntry(index))?;
    entry.insert("flow".to_string(), serde_json::to_value(flow)?);
    Ok(MergeOutcome { index, fallback })
}

/// Geometry of an image export
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportPlan {
    /// World-space bounds of all nodes
    pub bounds: Rect,
    /// Scale applied to world units
    pub fit_scale: f32,
    /// Top-left of the scaled content in the image
    pub offset: Vec2,
    /// World → image transform
    pub transform: SceneTransform,
    /// Image width
    pub width: u32,
    /// Image height
    pub height: u32,
}

/// Fit the scene into the export frame, centered; `None` for an empty scene
pub fn plan_image_export(scene: &Scene, settings: &ExportSettings) -> Option<ExportPlan> {
    let bounds = scene.bounds(Vec2::from(settings.fallback_node_size))?;
    let (w, h) = (settings.width as f32, settings.height as f32);
    let content = bounds.size();

    let fit_scale = ((w - 2.0 * settings.padding) / content.x)
        .min((h - 2.0 * settings.padding) / content.y)
        .min(settings.max_scale);
    let offset = Vec2::new((w - content.x * fit_scale) / 2.0, (h - content.y * fit_scale) / 2.0);
    let transform = SceneTransform::translate(offset)
        .then_after(SceneTransform::scale(fit_scale))
        .then_after(SceneTransform::translate(-bounds.min.to_vec2()));

    Some(ExportPlan {
        bounds,
        fit_scale,
        offset,
        transform,
        width: settings.width,
        height: settings.height,
    })
}

/// Download name for an export made on `date` (`YYYY-MM-DD`)
pub fn export_file_name(date: &str) -> String {
    format!("flow-export-{date}.png")
}

/// A finished image export
#[derive(Debug, Clone)]
pub struct ExportedImage {
    /// Rendered pixels
    pub image: RgbaImage,
    /// Geometry used
    pub plan: ExportPlan,
}

impl ExportedImage {
    /// Encode as PNG and hand it to `sink`
    pub fn save(&self, sink: &mut dyn ExportSink, date: &str) -> Result<String, ExportError> {
        let file_name = export_file_name(date);
        let png = encode_png(&self.image)?;
        sink.save_image(&file_name, &png)?;
        Ok(file_name)
    }
}

impl FlowCanvas {
    /// Merge the current layout into `content` and hand it to `sink`
    ///
    /// Refused when no flow document was loaded, so an empty canvas never
    /// overwrites a stored flow.
    pub fn save_layout(
        &self,
        mut content: Value,
        project: &ProjectRef,
        sink: &mut dyn ExportSink,
    ) -> Result<MergeOutcome, ExportError> {
        if !self.has_document {
            self.toast(ToastLevel::Error, "No flow data to save");
            return Err(ExportError::NoDocument);
        }

        let result = merge_into_collection(&mut content, project, &self.scene.to_document())
            .and_then(|outcome| sink.save_layout(&content).map(|()| outcome));

        match &result {
            Ok(outcome) => {
                if outcome.fallback {
                    let title = project.title.as_deref().unwrap_or_default();
                    self.toast(
                        ToastLevel::Warning,
                        &format!("Project \"{title}\" not found. Saving to collection[0]."),
                    );
                }
                tracing::info!("Saved flow layout to collection[{}]", outcome.index);
                self.toast(ToastLevel::Success, "File prepared. Please overwrite content.json");
            }
            Err(err) => {
                tracing::error!("Error saving layout: {err}");
                self.toast(ToastLevel::Error, "Error preparing save file");
            }
        }
        result
    }

    /// Render the whole scene into a fixed-size image
    ///
    /// The display list is snapshotted before awaiting the rasterizer; the
    /// scene itself is never modified, so a failed export can be retried.
    pub async fn export_image<R: Rasterizer + ?Sized>(
        &self,
        rasterizer: &R,
    ) -> Result<ExportedImage, ExportError> {
        let settings = &self.settings.export;
        let Some(plan) = plan_image_export(&self.scene, settings) else {
            self.toast(ToastLevel::Error, "No nodes to export");
            return Err(ExportError::EmptyScene);
        };
        self.toast(ToastLevel::Info, "Generating 4K export...");

        let fallback = Vec2::from(settings.fallback_node_size);
        let routes = EdgeRouter::new(self.settings.edges, fallback).route_all(&self.scene);
        let mut frame =
            SceneFrame::build(&self.scene, &routes, &self.selection, &self.viewport, fallback);
        if let InteractionMode::MarqueeSelecting(marquee) = &self.mode {
            frame.chrome.marquee = Some(marquee.rect());
        }

        let grid = GridStyle {
            spacing: self.settings.layout.grid_spacing,
            origin: Pos2::new(plan.width as f32 / 2.0, plan.height as f32 / 2.0),
        };
        let transform = plan.transform;
        let request = CaptureRequest {
            width: plan.width,
            height: plan.height,
            frame,
        };
        let captured = rasterizer
            .rasterize(
                request,
                Box::new(move |frame: &mut SceneFrame| {
                    frame.transform = transform;
                    frame.chrome.hide();
                    frame.style = FrameStyle {
                        grid: Some(grid),
                        ..FrameStyle::export()
                    };
                }),
            )
            .await;

        match captured {
            Ok(image) => {
                tracing::info!(
                    "Exported {}x{} image at scale {:.3}",
                    plan.width,
                    plan.height,
                    plan.fit_scale
                );
                self.toast(ToastLevel::Success, "Export generated");
                Ok(ExportedImage { image, plan })
            }
            Err(err) => {
                tracing::error!("Export failed: {err}");
                self.toast(ToastLevel::Error, "Export failed");
                Err(err.into())
            }
        }
    }

    /// The frame an image export draws, as an SVG document with labels
    pub fn export_svg(&self) -> Option<String> {
        let settings = &self.settings.export;
        let plan = plan_image_export(&self.scene, settings)?;
        let fallback = Vec2::from(settings.fallback_node_size);
        let routes = EdgeRouter::new(self.settings.edges, fallback).route_all(&self.scene);
        let mut frame =
            SceneFrame::build(&self.scene, &routes, &self.selection, &self.viewport, fallback);
        frame.transform = plan.transform;
        frame.chrome.hide();
        frame.style = FrameStyle::export();
        Some(frame.to_svg(plan.width, plan.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::notify::ToastLog;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Default)]
    struct MemorySink {
        layout: Option<Value>,
        images: Vec<(String, usize)>,
    }

    impl ExportSink for MemorySink {
        fn save_layout(&mut self, content: &Value) -> Result<(), ExportError> {
            self.layout = Some(content.clone());
            Ok(())
        }

        fn save_image(&mut self, file_name: &str, png: &[u8]) -> Result<(), ExportError> {
            self.images.push((file_name.to_string(), png.len()));
            Ok(())
        }
    }

    fn flow() -> SceneDocument {
        SceneDocument {
            nodes: vec![Node::new("a", "A").with_position(1.0, 2.0)],
            edges: vec![],
        }
    }

    #[test]
    fn test_layout_json_field_names() {
        let mut scene = Scene::new();
        scene.add_node(
            Node::new("a", "Load")
                .with_position(10.0, 20.0)
                .with_kind("source"),
        );
        let text = layout_json(&scene).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["nodes"][0]["id"], "a");
        assert_eq!(value["nodes"][0]["x"], 10.0);
        assert_eq!(value["nodes"][0]["type"], "source");
        assert!(value["edges"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_merge_by_index_then_title() {
        let mut content = json!({"collection": [{"project": "One"}, {"project": "Two"}]});
        let by_index = ProjectRef {
            index: Some(1),
            title: Some("One".into()),
        };
        let outcome = merge_into_collection(&mut content, &by_index, &flow()).unwrap();
        assert_eq!(outcome, MergeOutcome { index: 1, fallback: false });
        assert_eq!(content["collection"][1]["flow"]["nodes"][0]["id"], "a");
        assert_eq!(content["collection"][1]["project"], "Two");

        let by_title = ProjectRef {
            index: Some(9),
            title: Some("One".into()),
        };
        let outcome = merge_into_collection(&mut content, &by_title, &flow()).unwrap();
        assert_eq!(outcome.index, 0);
        assert!(!outcome.fallback);
    }

    #[test]
    fn test_merge_falls_back_to_first_entry() {
        let mut content = json!({"collection": [{"project": "One"}, {"project": "Two"}]});
        let project = ProjectRef {
            index: None,
            title: Some("Missing".into()),
        };
        let outcome = merge_into_collection(&mut content, &project, &flow()).unwrap();
        assert_eq!(outcome, MergeOutcome { index: 0, fallback: true });
        assert!(content["collection"][0]["flow"].is_object());
    }

    #[test]
    fn test_merge_errors() {
        let project = ProjectRef::default();
        let mut no_collection = json!({"projects": []});
        assert!(matches!(
            merge_into_collection(&mut no_collection, &project, &flow()),
            Err(ExportError::MissingCollection)
        ));
        let mut empty = json!({"collection": []});
        assert!(matches!(
            merge_into_collection(&mut empty, &project, &flow()),
            Err(ExportError::EmptyCollection)
        ));
        let mut bad_entry = json!({"collection": [3]});
        assert!(matches!(
            merge_into_collection(&mut bad_entry, &project, &flow()),
            Err(ExportError::InvalidProjectEntry(0))
        ));
    }

    #[test]
    fn test_save_layout_toasts() {
        let log = Arc::new(ToastLog::new());
        let mut canvas = FlowCanvas::default().with_notifier(log.clone());
        canvas.activate(Some(flow()), Vec2::new(800.0, 600.0));
        let mut sink = MemorySink::default();

        let content = json!({"collection": [{"project": "One"}]});
        let project = ProjectRef {
            index: None,
            title: Some("Other".into()),
        };
        canvas.save_layout(content, &project, &mut sink).unwrap();
        let toasts = log.drain();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].level, ToastLevel::Warning);
        assert_eq!(toasts[1].message, "File prepared. Please overwrite content.json");
        assert!(sink.layout.is_some());

        let result = canvas.save_layout(json!({}), &project, &mut sink);
        assert!(matches!(result, Err(ExportError::MissingCollection)));
        assert_eq!(log.drain()[0].message, "Error preparing save file");
    }

    #[test]
    fn test_save_layout_refused_without_document() {
        let log = Arc::new(ToastLog::new());
        let mut canvas = FlowCanvas::default().with_notifier(log.clone());
        canvas.activate(None, Vec2::new(800.0, 600.0));
        let mut sink = MemorySink::default();

        let content = json!({"collection": [{"project": "One", "flow": {"nodes": [{"id": "a"}]}}]});
        let result = canvas.save_layout(content, &ProjectRef::default(), &mut sink);
        assert!(matches!(result, Err(ExportError::NoDocument)));
        assert!(sink.layout.is_none());
        let toasts = log.drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, ToastLevel::Error);
    }

    #[test]
    fn test_plan_caps_scale_and_centers() {
        let mut scene = Scene::new();
        scene.add_node(Node::new("a", "A").with_position(10.0, 20.0));
        let plan = plan_image_export(&scene, &ExportSettings::default()).unwrap();
        assert_eq!(plan.fit_scale, 4.0);
        assert_eq!(plan.offset, Vec2::new(1480.0, 880.0));
        assert_eq!(plan.transform.apply(Pos2::new(120.0, 70.0)), Pos2::new(1920.0, 1080.0));
    }

    #[test]
    fn test_plan_fits_wide_content() {
        let mut scene = Scene::new();
        scene.add_node(Node::new("a", "A").with_position(0.0, 0.0));
        scene.add_node(Node::new("b", "B").with_position(3620.0, 0.0));
        let plan = plan_image_export(&scene, &ExportSettings::default()).unwrap();
        // Content is 3840 wide, 100 tall
        assert_eq!(plan.fit_scale, 3640.0 / 3840.0);
        assert!((plan.offset.x - 100.0).abs() < 1e-3);
        assert!(plan_image_export(&Scene::new(), &ExportSettings::default()).is_none());
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("2024-05-01"), "flow-export-2024-05-01.png");
    }
}
