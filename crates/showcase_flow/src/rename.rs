// SPDX-License-Identifier: MIT OR Apache-2.0
//! Inline node renaming.

use crate::canvas::FlowCanvas;
use crate::node::NodeId;
use crate::notify::ToastLevel;
use thiserror::Error;

/// Errors starting a rename
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenameError {
    /// Renaming needs exactly one selected node
    #[error("Select exactly one node to rename ({0} selected)")]
    NotSingleSelection(usize),
    /// A pointer gesture is in progress
    #[error("Cannot rename while a gesture is active")]
    GestureActive,
    /// The selected node is no longer in the scene
    #[error("Node not found: {0}")]
    NodeMissing(NodeId),
}

/// How a rename edit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameTrigger {
    /// Enter pressed in the edit field
    Enter,
    /// The edit field lost focus
    FocusLost,
}

/// An open rename edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameSession {
    /// Node being renamed
    pub node_id: NodeId,
    /// Current edit text
    pub buffer: String,
    /// Label before the edit
    pub original: String,
}

impl FlowCanvas {
    /// Open an inline editor on the single selected node
    ///
    /// The buffer starts with the current label. An already open session
    /// is returned unchanged.
    pub fn begin_rename(&mut self) -> Result<&RenameSession, RenameError> {
        if !self.mode.is_idle() {
            return Err(RenameError::GestureActive);
        }
        let Some(id) = self.selection.single().cloned() else {
            self.toast(ToastLevel::Error, "Select exactly one node to rename");
            return Err(RenameError::NotSingleSelection(self.selection.len()));
        };
        let label = match self.scene.node(&id) {
            Some(state) => state.node.label.clone(),
            None => return Err(RenameError::NodeMissing(id)),
        };

        let session = self.rename.get_or_insert_with(|| {
            tracing::debug!("Renaming node {id}");
            RenameSession {
                node_id: id,
                buffer: label.clone(),
                original: label,
            }
        });
        Ok(session)
    }

    /// The open rename session, if any
    pub fn rename_session(&self) -> Option<&RenameSession> {
        self.rename.as_ref()
    }

    /// Mutable edit buffer of the open session
    pub fn rename_buffer_mut(&mut self) -> Option<&mut String> {
        self.rename.as_mut().map(|s| &mut s.buffer)
    }

    /// Close the editor and apply the edit
    ///
    /// The trimmed buffer replaces the label when it is non-empty; an empty
    /// buffer keeps the old label. Enter always confirms with a toast.
    /// Returns `true` when the label changed.
    pub fn commit_rename(&mut self, trigger: RenameTrigger) -> bool {
        let Some(session) = self.rename.take() else {
            return false;
        };
        let label = session.buffer.trim();
        let changed = if label.is_empty() {
            tracing::debug!("Empty rename of {} discarded", session.node_id);
            false
        } else {
            label != session.original && self.scene.set_label(&session.node_id, label)
        };

        if trigger == RenameTrigger::Enter {
            self.toast(ToastLevel::Success, "Node renamed successfully!");
        }
        changed
    }

    /// Close the editor without applying the edit
    pub fn cancel_rename(&mut self) {
        if let Some(session) = self.rename.take() {
            tracing::debug!("Rename of {} cancelled", session.node_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::PointerTarget;
    use crate::node::Node;
    use crate::notify::ToastLog;
    use crate::scene::SceneDocument;
    use egui::{Pos2, Vec2};
    use std::sync::Arc;

    fn canvas() -> (FlowCanvas, Arc<ToastLog>) {
        let log = Arc::new(ToastLog::new());
        let mut canvas = FlowCanvas::default().with_notifier(log.clone());
        canvas.activate(
            Some(SceneDocument {
                nodes: vec![
                    Node::new("a", "Load").with_position(0.0, 0.0),
                    Node::new("b", "Train").with_position(300.0, 0.0),
                ],
                edges: vec![],
            }),
            Vec2::new(1000.0, 800.0),
        );
        (canvas, log)
    }

    fn label(canvas: &FlowCanvas, id: &str) -> String {
        canvas.scene().node(&NodeId::new(id)).unwrap().node.label.clone()
    }

    #[test]
    fn test_rename_needs_single_selection() {
        let (mut canvas, log) = canvas();
        assert_eq!(canvas.begin_rename(), Err(RenameError::NotSingleSelection(0)));
        canvas.selection.add(NodeId::new("a"));
        canvas.selection.add(NodeId::new("b"));
        assert_eq!(canvas.begin_rename(), Err(RenameError::NotSingleSelection(2)));
        let toasts = log.drain();
        assert_eq!(toasts.len(), 2);
        assert!(toasts.iter().all(|t| t.level == ToastLevel::Error));
        assert!(canvas.rename_session().is_none());
    }

    #[test]
    fn test_rename_commit_on_enter() {
        let (mut canvas, log) = canvas();
        canvas.selection.add(NodeId::new("a"));
        assert_eq!(canvas.begin_rename().unwrap().buffer, "Load");
        *canvas.rename_buffer_mut().unwrap() = "  Ingest  ".to_string();
        assert!(canvas.frame().node(&NodeId::new("a")).unwrap().renaming);

        assert!(canvas.commit_rename(RenameTrigger::Enter));
        assert_eq!(label(&canvas, "a"), "Ingest");
        assert!(canvas.rename_session().is_none());
        assert!(log.contains_level(ToastLevel::Success));
    }

    #[test]
    fn test_empty_rename_keeps_label() {
        let (mut canvas, log) = canvas();
        canvas.selection.add(NodeId::new("a"));
        canvas.begin_rename().unwrap();
        *canvas.rename_buffer_mut().unwrap() = "   ".to_string();
        assert!(!canvas.commit_rename(RenameTrigger::Enter));
        assert_eq!(label(&canvas, "a"), "Load");
        assert!(log.contains_level(ToastLevel::Success));
    }

    #[test]
    fn test_cancel_rename() {
        let (mut canvas, _log) = canvas();
        canvas.selection.add(NodeId::new("a"));
        canvas.begin_rename().unwrap();
        *canvas.rename_buffer_mut().unwrap() = "Other".to_string();
        canvas.cancel_rename();
        assert_eq!(label(&canvas, "a"), "Load");
    }

    #[test]
    fn test_pointer_down_commits_open_rename() {
        let (mut canvas, log) = canvas();
        canvas.selection.add(NodeId::new("a"));
        canvas.begin_rename().unwrap();
        *canvas.rename_buffer_mut().unwrap() = "Ingest".to_string();

        canvas.pointer_down(PointerTarget::Background, Pos2::new(900.0, 700.0), false);
        assert_eq!(label(&canvas, "a"), "Ingest");
        assert!(canvas.rename_session().is_none());
        assert!(!log.contains_level(ToastLevel::Success));
    }

    #[test]
    fn test_rename_refused_during_gesture() {
        let (mut canvas, _log) = canvas();
        canvas.pointer_down(PointerTarget::Node(NodeId::new("a")), Pos2::new(510.0, 410.0), false);
        assert_eq!(canvas.begin_rename(), Err(RenameError::GestureActive));
    }
}
