// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end canvas scenarios driven through the public API.

use egui::{Color32, Pos2, Vec2};
use futures::executor::block_on;
use futures::future::BoxFuture;
use image::RgbaImage;
use showcase_flow::raster::{BeforeCapture, CaptureRequest};
use showcase_flow::edge::HandleSpec;
use showcase_flow::{
    Edge, ExportError, ExportSink, FlowCanvas, Handle, InteractionMode, Node, NodeId,
    PointerTarget, ProjectRef, RasterError, Rasterizer, SceneDocument, SceneFrame, ToastLevel,
    ToastLog,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const VIEW: Vec2 = Vec2::new(1000.0, 800.0);

/// Rasterizer that records the hooked frame instead of drawing
#[derive(Default)]
struct RecordingRasterizer {
    fail: bool,
    calls: AtomicUsize,
    captured: Mutex<Option<(u32, u32, SceneFrame)>>,
}

impl Rasterizer for RecordingRasterizer {
    fn rasterize<'a>(
        &'a self,
        request: CaptureRequest,
        before_capture: BeforeCapture<'a>,
    ) -> BoxFuture<'a, Result<RgbaImage, RasterError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut frame = request.frame;
            before_capture(&mut frame);
            *self.captured.lock() = Some((request.width, request.height, frame));
            if self.fail {
                Err(RasterError::Backend("capture failed".into()))
            } else {
                Ok(RgbaImage::new(1, 1))
            }
        })
    }
}

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

fn canvas_with(document: SceneDocument) -> (FlowCanvas, Arc<ToastLog>) {
    let log = Arc::new(ToastLog::new());
    let mut canvas = FlowCanvas::default().with_notifier(log.clone());
    canvas.activate(Some(document), VIEW);
    (canvas, log)
}

fn position(canvas: &FlowCanvas, node: &str) -> Pos2 {
    canvas.scene().node(&id(node)).unwrap().position
}

#[test]
fn test_drag_three_selected_nodes_snaps_together() {
    let (mut canvas, _log) = canvas_with(SceneDocument {
        nodes: vec![
            Node::new("a", "A").with_position(0.0, 0.0),
            Node::new("b", "B").with_position(300.0, 0.0),
            Node::new("c", "C").with_position(0.0, 200.0),
        ],
        edges: vec![Edge::new("a", "b"), Edge::new("a", "c")],
    });

    // The viewport is centered: world origin sits at (500, 400)
    canvas.pointer_down(PointerTarget::Node(id("a")), Pos2::new(510.0, 410.0), false);
    canvas.pointer_up();
    canvas.pointer_down(PointerTarget::Node(id("b")), Pos2::new(810.0, 410.0), true);
    canvas.pointer_up();
    canvas.pointer_down(PointerTarget::Node(id("c")), Pos2::new(510.0, 610.0), true);
    canvas.pointer_up();
    assert_eq!(canvas.selection().len(), 3);

    canvas.pointer_down(PointerTarget::Node(id("a")), Pos2::new(520.0, 420.0), false);
    assert!(matches!(canvas.mode(), InteractionMode::DraggingNodes { .. }));
    let update = canvas.pointer_move(Pos2::new(543.0, 427.0));
    assert_eq!(update.moved_nodes.len(), 3);
    canvas.pointer_up();

    assert_eq!(position(&canvas, "a"), Pos2::new(20.0, 10.0));
    assert_eq!(position(&canvas, "b"), Pos2::new(320.0, 10.0));
    assert_eq!(position(&canvas, "c"), Pos2::new(20.0, 210.0));
    assert!(canvas.mode().is_idle());

    // Routes follow the moved nodes
    let route = &canvas.routes()[0];
    assert_eq!(route.start, Pos2::new(240.0, 35.0));
    assert_eq!(route.end, Pos2::new(320.0, 35.0));
}

#[test]
fn test_routing_follows_relative_placement() {
    let (mut canvas, _log) = canvas_with(SceneDocument {
        nodes: vec![
            Node::new("a", "A").with_position(0.0, 0.0),
            Node::new("b", "B").with_position(400.0, 0.0),
        ],
        edges: vec![Edge::new("a", "b")],
    });
    let route = &canvas.routes()[0];
    assert_eq!((route.start_handle, route.end_handle), (Handle::Right, Handle::Left));

    // Drag b below a: world delta (-400, 400)
    canvas.pointer_down(PointerTarget::Node(id("b")), Pos2::new(910.0, 410.0), false);
    canvas.pointer_move(Pos2::new(510.0, 810.0));
    canvas.pointer_up();
    assert_eq!(position(&canvas, "b"), Pos2::new(0.0, 400.0));

    let route = &canvas.routes()[0];
    assert_eq!((route.start_handle, route.end_handle), (Handle::Bottom, Handle::Top));
    assert_eq!(route.start, Pos2::new(110.0, 50.0));
    assert_eq!(route.end, Pos2::new(110.0, 400.0));
}

#[test]
fn test_dangling_edge_does_not_affect_siblings() {
    let (canvas, _log) = canvas_with(SceneDocument {
        nodes: vec![
            Node::new("a", "A").with_position(0.0, 0.0),
            Node::new("b", "B").with_position(400.0, 0.0),
        ],
        edges: vec![
            Edge::new("a", "ghost"),
            Edge::new("a", "b").with_label("next"),
        ],
    });
    assert_eq!(canvas.scene().edge_count(), 2);
    assert_eq!(canvas.routes().len(), 1);
    let route = &canvas.routes()[0];
    assert_eq!(route.edge_index, 1);
    assert_eq!(route.label.as_ref().map(|(text, _)| text.as_str()), Some("next"));
}

#[test]
fn test_zoom_keeps_point_under_cursor() {
    let (mut canvas, _log) = canvas_with(SceneDocument::default());
    let pointer = Pos2::new(730.0, 215.0);
    let before = canvas.viewport().screen_to_world(pointer);
    canvas.wheel(350.0, pointer);
    canvas.wheel(-120.0, pointer);
    let after = canvas.viewport().screen_to_world(pointer);
    assert!((before - after).length() < 1e-3);
    assert!((canvas.viewport().scale - 1.23).abs() < 1e-4);
}

#[test]
fn test_image_export_fits_and_restyles_snapshot() {
    let (mut canvas, log) = canvas_with(SceneDocument {
        nodes: vec![Node::new("a", "A").with_position(10.0, 20.0)],
        edges: vec![],
    });
    // Open a marquee so there is chrome to hide
    canvas.pointer_down(PointerTarget::Background, Pos2::new(10.0, 10.0), true);
    canvas.pointer_move(Pos2::new(50.0, 50.0));

    let rasterizer = RecordingRasterizer::default();
    let exported = block_on(canvas.export_image(&rasterizer)).unwrap();
    assert_eq!(exported.plan.fit_scale, 4.0);
    assert_eq!(exported.plan.offset, Vec2::new(1480.0, 880.0));

    let (width, height, frame) = rasterizer.captured.lock().take().unwrap();
    assert_eq!((width, height), (3840, 2160));
    assert!(frame.chrome.marquee.is_none());
    assert!(!frame.chrome.toolbar);
    assert_eq!(frame.style.background, Color32::WHITE);
    assert_eq!(frame.style.edge_label, Color32::BLACK);
    // Node is 220x100 at export; its center lands on the image center
    let node = frame.node(&id("a")).unwrap();
    assert_eq!(frame.transform.apply(node.rect.center()), Pos2::new(1920.0, 1080.0));

    // The live view keeps its chrome
    assert!(canvas.frame().chrome.marquee.is_some());
    let messages: Vec<_> = log.drain().into_iter().map(|t| t.message).collect();
    assert_eq!(messages, vec!["Generating 4K export...", "Export generated"]);
}

#[test]
fn test_failed_export_leaves_scene_untouched() {
    let (canvas, log) = canvas_with(SceneDocument {
        nodes: vec![
            Node::new("a", "A").with_position(0.0, 0.0),
            Node::new("b", "B").with_position(400.0, 0.0),
        ],
        edges: vec![Edge::new("a", "b")],
    });
    let before = canvas.scene().to_document();
    let viewport = *canvas.viewport();

    let rasterizer = RecordingRasterizer {
        fail: true,
        ..RecordingRasterizer::default()
    };
    let result = block_on(canvas.export_image(&rasterizer));
    assert!(matches!(result, Err(ExportError::Raster(RasterError::Backend(_)))));
    assert_eq!(canvas.scene().to_document(), before);
    assert_eq!(*canvas.viewport(), viewport);
    assert!(log.contains_level(ToastLevel::Error));

    // Retrying is allowed
    let result = block_on(canvas.export_image(&rasterizer));
    assert!(result.is_err());
    assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_empty_scene_export_is_refused() {
    let (canvas, log) = canvas_with(SceneDocument::default());
    let rasterizer = RecordingRasterizer::default();
    let result = block_on(canvas.export_image(&rasterizer));
    assert!(matches!(result, Err(ExportError::EmptyScene)));
    assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    let toasts = log.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].message, "No nodes to export");
}

#[test]
fn test_lenient_document_loading() {
    let value = json!({
        "nodes": [
            {"id": "a", "label": "Load", "type": "source", "info": "Reads the CSV"},
            {"id": "b", "label": "Train", "x": 40, "y": 60, "linkedDataIndex": 2}
        ],
        "edges": [
            {"from": "a", "to": "b", "handleStart": "diagonal", "handleEnd": "top"}
        ]
    });
    let document = SceneDocument::from_value(&value).unwrap();
    assert_eq!(document.edges[0].start_side(), None);
    assert_eq!(document.edges[0].end_side(), Some(Handle::Top));

    let (canvas, _log) = canvas_with(document);
    assert!(canvas.scene().nodes().all(|n| n.is_positioned()));
    assert_eq!(position(&canvas, "b"), Pos2::new(40.0, 60.0));
    assert_eq!(canvas.routes()[0].end_handle, Handle::Top);

    let saved = canvas.scene().to_document();
    assert_eq!(saved.nodes[1].linked_data_index, Some(Value::from(2)));
    assert_eq!(saved.nodes[0].kind(), "source");
    assert_eq!(saved.edges[0].handle_start, document_handle("diagonal"));
}

fn document_handle(name: &str) -> Option<HandleSpec> {
    Some(HandleSpec::Raw(Value::from(name)))
}

#[derive(Default)]
struct MemorySink {
    layout: Option<Value>,
}

impl ExportSink for MemorySink {
    fn save_layout(&mut self, content: &Value) -> Result<(), ExportError> {
        self.layout = Some(content.clone());
        Ok(())
    }

    fn save_image(&mut self, _file_name: &str, _png: &[u8]) -> Result<(), ExportError> {
        Ok(())
    }
}

#[test]
fn test_saving_keeps_opaque_node_data() {
    let content = json!({
        "collection": [{
            "project": "Churn",
            "flow": {
                "nodes": [
                    {"id": "a", "label": "Load", "x": 0, "y": 0, "linkedDataIndex": "snippet-3"},
                    {"id": "b", "label": "Train", "x": 400, "y": 0, "owner": "ml"}
                ],
                "edges": [{"from": "a", "to": "b", "handleStart": "middle"}]
            }
        }]
    });
    let document = SceneDocument::from_value(&content["collection"][0]["flow"]).unwrap();
    let (canvas, _log) = canvas_with(document);

    let mut sink = MemorySink::default();
    let project = ProjectRef {
        index: Some(0),
        title: None,
    };
    canvas.save_layout(content, &project, &mut sink).unwrap();
    let saved = &sink.layout.unwrap()["collection"][0]["flow"];
    assert_eq!(saved["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(saved["nodes"][0]["linkedDataIndex"], "snippet-3");
    assert_eq!(saved["nodes"][1]["owner"], "ml");
    assert_eq!(saved["edges"][0]["handleStart"], "middle");
}

#[test]
fn test_unloaded_flow_is_never_saved() {
    let log = Arc::new(ToastLog::new());
    let mut canvas = FlowCanvas::default().with_notifier(log.clone());
    canvas.activate(None, VIEW);

    let mut sink = MemorySink::default();
    let content = json!({"collection": [{"project": "Churn", "flow": {"nodes": [{"id": "a"}]}}]});
    let result = canvas.save_layout(content, &ProjectRef::default(), &mut sink);
    assert!(matches!(result, Err(ExportError::NoDocument)));
    assert!(sink.layout.is_none());
    assert!(log.contains_level(ToastLevel::Error));
}
