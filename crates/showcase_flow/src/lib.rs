// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interactive flow-diagram canvas for showcase projects.
//!
//! This crate provides the scene graph behind a project's flow view:
//! - Pan/zoom viewport with exact screen ↔ world mapping
//! - Node layout seeding for unpositioned nodes
//! - Dynamic edge routing between rectangular nodes
//! - Drag, marquee selection and inline rename
//! - Layout persistence and fixed-resolution image export
//!
//! ## Architecture
//!
//! [`FlowCanvas`] owns one view's scene, viewport, selection and gesture
//! state. Every frame it produces a [`SceneFrame`] display list that the egui
//! view ([`FlowView`]), the software rasterizer and the SVG writer draw.

pub mod config;
pub mod node;
pub mod edge;
pub mod scene;
pub mod viewport;
pub mod selection;
pub mod layout;
pub mod routing;
pub mod notify;
pub mod render;
pub mod canvas;
pub mod interaction;
pub mod rename;
pub mod raster;
pub mod export;
pub mod ui;

pub use canvas::FlowCanvas;
pub use config::{FlowSettings, SettingsError};
pub use edge::Edge;
pub use export::{ExportError, ExportSink, ExportedImage, MergeOutcome, ProjectRef};
pub use interaction::{CanvasUpdate, InteractionMode, PointerTarget};
pub use node::{Handle, Node, NodeId};
pub use notify::{Notifier, Toast, ToastLevel, ToastLog};
pub use raster::{RasterError, Rasterizer, SoftwareRasterizer};
pub use rename::{RenameError, RenameTrigger};
pub use render::SceneFrame;
pub use scene::{Scene, SceneDocument};
pub use ui::FlowView;
pub use viewport::Viewport;

use thiserror::Error;

/// Any error raised by the flow canvas
#[derive(Debug, Error)]
pub enum FlowError {
    /// Settings could not be loaded or saved
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// Rename could not start
    #[error(transparent)]
    Rename(#[from] RenameError),
    /// Save or export failed
    #[error(transparent)]
    Export(#[from] ExportError),
    /// Rasterization failed
    #[error(transparent)]
    Raster(#[from] RasterError),
    /// A project document could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A project document is not valid JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
