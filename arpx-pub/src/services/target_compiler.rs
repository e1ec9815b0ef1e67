//! Target-compile stage
//!
//! **[APX-TGT-010]** Derives the image-tracking descriptor the client
//! AR runtime locks onto. The compiler is an opaque CLI collaborator:
//! invoked with (input image path, output descriptor path), exit 0
//! plus a descriptor file means success. The descriptor format is out
//! of scope here; only its filename is part of the wire contract.
//!
//! Failure is fatal: a session without a tracking descriptor cannot be
//! published. This stage has no ordering dependency on the transcode
//! stage and runs concurrently with it.

use crate::error::PublishError;
use crate::models::{part_path, ArtifactRole, PublishSession};
use crate::services::tool_runner::{ToolError, ToolRunner};
use std::sync::Arc;
use tracing::{debug, info};

/// Opaque image-target compiler adapter
pub struct TargetCompiler {
    runner: Arc<ToolRunner>,
    bin: String,
}

impl TargetCompiler {
    pub fn new(runner: Arc<ToolRunner>, bin: String) -> Self {
        Self { runner, bin }
    }

    /// Compile the reference image (a filename inside the session
    /// directory) into the tracking-descriptor artifact.
    ///
    /// Returns the artifact filename.
    pub async fn compile(
        &self,
        session: &PublishSession,
        photo_file: &str,
    ) -> Result<String, PublishError> {
        let output_name = ArtifactRole::TrackingDescriptor.filename("");
        let part = part_path(&session.directory, &output_name);
        let part_name = part
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        debug!(session_id = %session.session_id, source = photo_file, "Compiling image target");

        let args = [photo_file, part_name.as_str()];
        let result = self.runner.run(&self.bin, args, &session.directory).await;

        match result {
            Ok(output) if output.success() => {
                if !part.exists() {
                    return Err(PublishError::TargetCompile(format!(
                        "{} exited 0 but produced no descriptor file",
                        self.bin
                    )));
                }
                std::fs::rename(&part, session.directory.join(&output_name))
                    .map_err(|e| PublishError::TargetCompile(format!("rename failed: {}", e)))?;

                info!(session_id = %session.session_id, artifact = %output_name, "Target compile complete");
                Ok(output_name)
            }
            Ok(output) => {
                let _ = std::fs::remove_file(&part);
                Err(PublishError::TargetCompile(format!(
                    "{} exited with {:?}: {}",
                    self.bin,
                    output.exit_code,
                    output.diagnostic()
                )))
            }
            Err(ToolError::Timeout { tool, limit_secs }) => {
                let _ = std::fs::remove_file(&part);
                Err(PublishError::Timeout {
                    stage: "target-compile",
                    tool,
                    limit_secs,
                })
            }
            Err(e) => {
                let _ = std::fs::remove_file(&part);
                Err(PublishError::TargetCompile(e.to_string()))
            }
        }
    }
}
