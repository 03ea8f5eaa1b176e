// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistence sink writing layouts and images to disk.

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use showcase_flow::{ExportError, ExportSink};
use std::path::PathBuf;

/// Writes the layout document to one file and images into a directory
#[derive(Debug, Clone)]
pub struct FileSink {
    /// Destination of the updated collection document
    pub layout_path: PathBuf,
    /// Directory receiving exported images
    pub image_dir: PathBuf,
}

impl ExportSink for FileSink {
    fn save_layout(&mut self, content: &Value) -> Result<(), ExportError> {
        let text = serde_json::to_string_pretty(content)?;
        std::fs::write(&self.layout_path, text)?;
        tracing::info!("Wrote {}", self.layout_path.display());
        Ok(())
    }

    fn save_image(&mut self, file_name: &str, png: &[u8]) -> Result<(), ExportError> {
        std::fs::create_dir_all(&self.image_dir)?;
        let path = self.image_dir.join(file_name);
        std::fs::write(&path, png)?;
        tracing::info!("Wrote {} ({} bytes)", path.display(), png.len());
        Ok(())
    }
}

/// Today's UTC date
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Date stamp used in export file names
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
