//! Publish-URL computation and QR encoding
//!
//! **[APX-QR-010]** The entry-page URL is a pure function of
//! (base URL, session id): `{base}/{sessionId}/index.html`, no
//! trailing variance, no query parameters, stable for the life of the
//! session. The QR artifact encodes exactly that URL, so encoding the
//! same inputs twice yields byte-identical QR content.
//!
//! Failure is fatal: the composited hand-out and the page's share
//! affordance both depend on the QR image.

use crate::error::PublishError;
use crate::models::{part_path, ArtifactRole, PublishSession};
use crate::services::tool_runner::{ToolError, ToolRunner};
use arpx_common::SessionId;
use std::sync::Arc;
use tracing::{debug, info};

/// Compute the externally reachable entry-page URL for a session
///
/// Insensitive to a trailing slash on the base URL.
pub fn entry_url(base: &str, session_id: &SessionId) -> String {
    format!("{}/{}/index.html", base.trim_end_matches('/'), session_id)
}

/// qrencode-compatible QR encoder adapter
pub struct QrEncoder {
    runner: Arc<ToolRunner>,
    bin: String,
    pixel_size: u32,
}

impl QrEncoder {
    pub fn new(runner: Arc<ToolRunner>, bin: String, pixel_size: u32) -> Self {
        Self {
            runner,
            bin,
            pixel_size,
        }
    }

    /// Encode `url` into the session's QR image artifact.
    ///
    /// Returns the artifact filename.
    pub async fn encode(
        &self,
        session: &PublishSession,
        url: &str,
    ) -> Result<String, PublishError> {
        let output_name = ArtifactRole::QrImage.filename("");
        let part = part_path(&session.directory, &output_name);
        let part_name = part
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        debug!(session_id = %session.session_id, url = url, "Encoding QR image");

        let pixel_size = self.pixel_size.to_string();
        let args = ["-o", &part_name, "-s", &pixel_size, "-m", "2", url];
        let result = self.runner.run(&self.bin, args, &session.directory).await;

        match result {
            Ok(output) if output.success() => {
                if !part.exists() {
                    return Err(PublishError::QrEncode(format!(
                        "{} exited 0 but produced no image file",
                        self.bin
                    )));
                }
                std::fs::rename(&part, session.directory.join(&output_name))
                    .map_err(|e| PublishError::QrEncode(format!("rename failed: {}", e)))?;

                info!(session_id = %session.session_id, artifact = %output_name, "QR encode complete");
                Ok(output_name)
            }
            Ok(output) => {
                let _ = std::fs::remove_file(&part);
                Err(PublishError::QrEncode(format!(
                    "{} exited with {:?}: {}",
                    self.bin,
                    output.exit_code,
                    output.diagnostic()
                )))
            }
            Err(ToolError::Timeout { tool, limit_secs }) => {
                let _ = std::fs::remove_file(&part);
                Err(PublishError::Timeout {
                    stage: "qr-encode",
                    tool,
                    limit_secs,
                })
            }
            Err(e) => {
                let _ = std::fs::remove_file(&part);
                Err(PublishError::QrEncode(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_id() -> SessionId {
        serde_json::from_str("\"1756120533123-9f3a01cc\"").unwrap()
    }

    #[test]
    fn test_entry_url_shape() {
        let url = entry_url("http://ar.example.com/p", &fixed_id());
        assert_eq!(
            url,
            "http://ar.example.com/p/1756120533123-9f3a01cc/index.html"
        );
    }

    #[test]
    fn test_entry_url_ignores_trailing_slash() {
        let with_slash = entry_url("http://ar.example.com/p/", &fixed_id());
        let without = entry_url("http://ar.example.com/p", &fixed_id());
        assert_eq!(with_slash, without);
    }

    #[test]
    fn test_entry_url_is_deterministic() {
        let id = fixed_id();
        assert_eq!(
            entry_url("https://x.test", &id),
            entry_url("https://x.test", &id)
        );
    }
}
