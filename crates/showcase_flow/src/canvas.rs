// SPDX-License-Identifier: MIT OR Apache-2.0
//! The flow canvas controller.
//!
//! [`FlowCanvas`] owns one view instance's scene, viewport, selection,
//! gesture state and rename session. Hosts call [`FlowCanvas::activate`]
//! when the flow view becomes visible and [`FlowCanvas::deactivate`] when it
//! is hidden; pointer, wheel, resize and keyboard events are forwarded to
//! the methods in [`crate::interaction`] and [`crate::rename`].

use crate::config::FlowSettings;
use crate::interaction::InteractionMode;
use crate::layout::seed_layout;
use crate::node::NodeId;
use crate::notify::{Notifier, ToastLevel};
use crate::rename::RenameSession;
use crate::render::SceneFrame;
use crate::routing::{EdgeRoute, EdgeRouter};
use crate::scene::{Scene, SceneDocument};
use crate::selection::Selection;
use crate::viewport::Viewport;
use egui::Vec2;
use rand::Rng;
use std::sync::Arc;

/// Scene controller for one flow view
pub struct FlowCanvas {
    pub(crate) settings: FlowSettings,
    pub(crate) scene: Scene,
    pub(crate) viewport: Viewport,
    pub(crate) selection: Selection,
    pub(crate) mode: InteractionMode,
    pub(crate) rename: Option<RenameSession>,
    pub(crate) routes: Vec<EdgeRoute>,
    pub(crate) view_size: Vec2,
    pub(crate) active: bool,
    pub(crate) has_document: bool,
    notifier: Option<Arc<dyn Notifier>>,
}

impl FlowCanvas {
    /// Create an inactive canvas
    pub fn new(settings: FlowSettings) -> Self {
        Self {
            viewport: Viewport::new(settings.zoom),
            settings,
            scene: Scene::new(),
            selection: Selection::new(),
            mode: InteractionMode::Idle,
            rename: None,
            routes: Vec::new(),
            view_size: Vec2::ZERO,
            active: false,
            has_document: false,
            notifier: None,
        }
    }

    /// Attach a toast sink
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Load a scene and reset the view
    ///
    /// A missing document shows an empty canvas that cannot be saved.
    /// Unpositioned nodes are seeded with `rng`.
    pub fn activate_with_rng<R: Rng>(
        &mut self,
        document: Option<SceneDocument>,
        view_size: Vec2,
        rng: &mut R,
    ) {
        self.has_document = document.is_some();
        let document = document.unwrap_or_else(|| {
            tracing::warn!("No flow document for this project, showing an empty canvas");
            SceneDocument::default()
        });

        self.scene = Scene::from_document(document);
        self.selection.clear();
        self.mode = InteractionMode::Idle;
        self.rename = None;
        self.view_size = view_size;
        self.viewport.reset(view_size);
        seed_layout(&mut self.scene, view_size, &self.settings.layout, rng);
        self.reroute();
        self.active = true;

        tracing::info!(
            "Flow view activated: {} nodes, {} edges ({} drawable)",
            self.scene.node_count(),
            self.scene.edge_count(),
            self.routes.len()
        );
    }

    /// Load a scene using the thread-local random generator for seeding
    pub fn activate(&mut self, document: Option<SceneDocument>, view_size: Vec2) {
        self.activate_with_rng(document, view_size, &mut rand::rng());
    }

    /// Stop reacting to input; scene data is kept for a later export
    pub fn deactivate(&mut self) {
        self.mode = InteractionMode::Idle;
        self.rename = None;
        self.active = false;
        tracing::debug!("Flow view deactivated");
    }

    /// Whether the view is active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a flow document was loaded on activation
    pub fn has_document(&self) -> bool {
        self.has_document
    }

    /// Settings in use
    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    /// The scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The viewport
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Current gesture mode
    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    /// Current routed edges
    pub fn routes(&self) -> &[EdgeRoute] {
        &self.routes
    }

    /// Size of the view in screen pixels
    pub fn view_size(&self) -> Vec2 {
        self.view_size
    }

    /// Size assumed for unmeasured nodes during interaction and routing
    pub fn fallback_node_size(&self) -> Vec2 {
        Vec2::from(self.settings.layout.fallback_node_size)
    }

    /// Router configured from the settings
    pub fn router(&self) -> EdgeRouter {
        EdgeRouter::new(self.settings.edges, self.fallback_node_size())
    }

    /// Recompute every edge route
    pub fn reroute(&mut self) {
        self.routes = self.router().route_all(&self.scene);
    }

    /// Recompute the routes of edges touching any of `moved`
    ///
    /// Endpoints only move, never disappear, so the set of drawable edges
    /// stays the same.
    pub fn reroute_nodes(&mut self, moved: &[NodeId]) {
        let router = self.router();
        let edges = self.scene.edges();
        for route in &mut self.routes {
            let edge = &edges[route.edge_index];
            if !moved.iter().any(|id| edge.involves_node(id)) {
                continue;
            }
            if let Some(updated) = router.route(&self.scene, route.edge_index, edge) {
                *route = updated;
            }
        }
    }

    /// Record the rendered size of a node
    ///
    /// Sizes are cached; edges are re-routed only when a size changes.
    pub fn set_node_size(&mut self, id: &NodeId, size: Vec2) {
        let changed = self
            .scene
            .node(id)
            .is_some_and(|n| n.size != Some(size));
        if changed {
            self.scene.set_size(id, size);
            self.reroute();
        }
    }

    /// Snapshot of what to draw
    pub fn frame(&self) -> SceneFrame {
        let mut frame = SceneFrame::build(
            &self.scene,
            &self.routes,
            &self.selection,
            &self.viewport,
            self.fallback_node_size(),
        );
        if let InteractionMode::MarqueeSelecting(marquee) = &self.mode {
            frame.chrome.marquee = Some(marquee.rect());
        }
        if let Some(session) = &self.rename {
            if let Some(shape) = frame.nodes.iter_mut().find(|n| n.id == session.node_id) {
                shape.renaming = true;
            }
        }
        frame
    }

    /// Send a toast, if a notifier is attached, and log it
    pub(crate) fn toast(&self, level: ToastLevel, message: &str) {
        match level {
            ToastLevel::Error => tracing::error!("{message}"),
            ToastLevel::Warning => tracing::warn!("{message}"),
            ToastLevel::Info | ToastLevel::Success => tracing::info!("{message}"),
        }
        if let Some(notifier) = &self.notifier {
            notifier.notify(level, message);
        }
    }
}

impl Default for FlowCanvas {
    fn default() -> Self {
        Self::new(FlowSettings::default())
    }
}
