//! Transcode stage
//!
//! **[APX-TRC-010]** Normalizes the uploaded video into a bounded
//! envelope suitable for embedding and mobile playback: scale down to
//! the configured maximum width preserving aspect ratio, cap the video
//! bitrate, mp4 container with the moov atom up front. The dominant
//! constraint is total size, not visual fidelity.
//!
//! The tool writes to a hidden `.part` name which is renamed into
//! place only on exit 0, so no partial output is ever observable.
//! Failure is fatal to the Pipeline Run.

use crate::error::PublishError;
use crate::models::{part_path, ArtifactRole, PublishSession};
use crate::services::tool_runner::{ToolError, ToolRunner};
use std::sync::Arc;
use tracing::{debug, info};

/// ffmpeg-compatible transcoder adapter
pub struct Transcoder {
    runner: Arc<ToolRunner>,
    bin: String,
    max_width: u32,
    max_bitrate_kbps: u32,
}

impl Transcoder {
    pub fn new(runner: Arc<ToolRunner>, bin: String, max_width: u32, max_bitrate_kbps: u32) -> Self {
        Self {
            runner,
            bin,
            max_width,
            max_bitrate_kbps,
        }
    }

    /// Transcode `source_video` (a filename inside the session
    /// directory) into the session's transcoded-video artifact.
    ///
    /// Returns the artifact filename.
    pub async fn transcode(
        &self,
        session: &PublishSession,
        source_video: &str,
    ) -> Result<String, PublishError> {
        let output_name = ArtifactRole::TranscodedVideo.filename("");
        let part = part_path(&session.directory, &output_name);
        let part_name = part
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // Commas inside the scale expression are filter-level syntax
        // and must be escaped since no shell is involved.
        let scale = format!("scale=min(iw\\,{}):-2", self.max_width);
        let bitrate = format!("{}k", self.max_bitrate_kbps);
        let bufsize = format!("{}k", self.max_bitrate_kbps * 2);

        let args = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-i",
            source_video,
            "-vf",
            &scale,
            "-c:v",
            "libx264",
            "-preset",
            "veryfast",
            "-b:v",
            &bitrate,
            "-maxrate",
            &bitrate,
            "-bufsize",
            &bufsize,
            "-c:a",
            "aac",
            "-b:a",
            "128k",
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
            &part_name,
        ];

        debug!(session_id = %session.session_id, source = source_video, "Transcoding video");

        let result = self.runner.run(&self.bin, args, &session.directory).await;

        match result {
            Ok(output) if output.success() => {
                if !part.exists() {
                    return Err(PublishError::Transcode(format!(
                        "{} exited 0 but produced no output file",
                        self.bin
                    )));
                }
                std::fs::rename(&part, session.directory.join(&output_name))
                    .map_err(|e| PublishError::Transcode(format!("rename failed: {}", e)))?;

                info!(session_id = %session.session_id, artifact = %output_name, "Transcode complete");
                Ok(output_name)
            }
            Ok(output) => {
                let _ = std::fs::remove_file(&part);
                Err(PublishError::Transcode(format!(
                    "{} exited with {:?}: {}",
                    self.bin,
                    output.exit_code,
                    output.diagnostic()
                )))
            }
            Err(ToolError::Timeout { tool, limit_secs }) => {
                let _ = std::fs::remove_file(&part);
                Err(PublishError::Timeout {
                    stage: "transcode",
                    tool,
                    limit_secs,
                })
            }
            Err(e) => {
                let _ = std::fs::remove_file(&part);
                Err(PublishError::Transcode(e.to_string()))
            }
        }
    }
}
