//! Page materialization
//!
//! **[APX-PAGE-010]** Binds the session's artifact filenames into the
//! entry-page template and writes `index.html`. This is the
//! publication barrier: a session is published if and only if its
//! entry page exists, so the write uses the temp-then-rename
//! discipline and failure is fatal.

use crate::error::PublishError;
use crate::models::{part_path, ArtifactRole};
use std::path::Path;
use tracing::info;

const PLACEHOLDERS: &[&str] = &["{{PHOTO}}", "{{VIDEO}}", "{{TARGETS}}"];

/// Artifact filenames bound into the template
#[derive(Debug, Clone, Copy)]
pub struct PageBindings<'a> {
    pub photo_file: &'a str,
    pub video_file: &'a str,
    pub targets_file: &'a str,
}

/// Renders the session entry page from a fixed template
#[derive(Debug)]
pub struct PageMaterializer {
    template: String,
}

impl PageMaterializer {
    /// Create a materializer, rejecting templates that lack any of the
    /// required placeholders (a configuration error, not a per-request
    /// one).
    pub fn new(template: String) -> arpx_common::Result<Self> {
        for placeholder in PLACEHOLDERS {
            if !template.contains(placeholder) {
                return Err(arpx_common::Error::Config(format!(
                    "entry-page template is missing the {} placeholder",
                    placeholder
                )));
            }
        }
        Ok(Self { template })
    }

    /// Write the entry page into `dir`, returning its filename
    pub fn materialize(
        &self,
        dir: &Path,
        bindings: &PageBindings<'_>,
    ) -> Result<String, PublishError> {
        let output_name = ArtifactRole::EntryPage.filename("");
        let part = part_path(dir, &output_name);

        let page = self
            .template
            .replace("{{PHOTO}}", bindings.photo_file)
            .replace("{{VIDEO}}", bindings.video_file)
            .replace("{{TARGETS}}", bindings.targets_file);

        std::fs::write(&part, page)
            .map_err(|e| PublishError::Materialize(format!("write failed: {}", e)))?;
        std::fs::rename(&part, dir.join(&output_name))
            .map_err(|e| PublishError::Materialize(format!("rename failed: {}", e)))?;

        info!(artifact = %output_name, "Entry page materialized");
        Ok(output_name)
    }
}
