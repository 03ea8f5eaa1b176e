// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project data source: flows stored in a `content.json` collection.

use serde_json::Value;
use showcase_flow::{FlowError, ProjectRef, SceneDocument};
use std::path::Path;

/// A collection document and the project selected from it
#[derive(Debug)]
pub struct LoadedProject {
    /// Whole collection document, kept for saving
    pub content: Value,
    /// The selected project, with its title filled in when known
    pub project: ProjectRef,
    /// The project's flow; `None` when missing or malformed
    pub flow: Option<SceneDocument>,
}

/// Read `path` and pick the project by index, then title, then the first entry
pub async fn load_project(path: &Path, project: ProjectRef) -> Result<LoadedProject, FlowError> {
    let text = tokio::fs::read_to_string(path).await?;
    let content: Value = serde_json::from_str(&text)?;

    let entry = find_entry(&content, &project);
    let title = project
        .title
        .clone()
        .or_else(|| entry?.get("project")?.as_str().map(str::to_string));
    let flow = entry
        .and_then(|e| e.get("flow"))
        .and_then(SceneDocument::from_value);
    tracing::debug!(
        "Loaded {} (project {:?}, flow present: {})",
        path.display(),
        title,
        flow.is_some()
    );

    Ok(LoadedProject {
        project: ProjectRef {
            index: project.index,
            title,
        },
        flow,
        content,
    })
}

fn find_entry<'a>(content: &'a Value, project: &ProjectRef) -> Option<&'a Value> {
    let collection = content.get("collection")?.as_array()?;
    project
        .index
        .and_then(|i| collection.get(i))
        .or_else(|| {
            let title = project.title.as_deref()?;
            collection
                .iter()
                .find(|e| e.get("project").and_then(Value::as_str) == Some(title))
        })
        .or_else(|| collection.first())
}
