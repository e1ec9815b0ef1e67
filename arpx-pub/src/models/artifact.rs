//! Artifact roles and deterministic filenames
//!
//! **[APX-ART-010]** Each artifact within a session directory is
//! produced by exactly one stage and named deterministically from its
//! role plus the upload's original extension. The filename set is the
//! wire contract the static file server and the client AR runtime
//! depend on.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image extensions accepted for the reference photo
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Video extensions accepted for the overlay video
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v"];

/// Logical role of a file within a session directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactRole {
    /// Original uploaded photo
    ReferenceImage,
    /// Original uploaded video
    SourceVideo,
    /// Transcoded, size-bounded video
    TranscodedVideo,
    /// Compiled image-tracking descriptor
    TrackingDescriptor,
    /// QR image encoding the entry-page URL
    QrImage,
    /// Printable hand-out: photo with the QR overlaid
    CompositedImage,
    /// Session entry page (publication signal)
    EntryPage,
}

impl ArtifactRole {
    /// Deterministic filename for this role
    ///
    /// `source_ext` is the normalized extension of the originating
    /// upload; roles with fixed filenames ignore it.
    pub fn filename(&self, source_ext: &str) -> String {
        match self {
            ArtifactRole::ReferenceImage => format!("photo.{}", source_ext),
            ArtifactRole::SourceVideo => format!("video.{}", source_ext),
            ArtifactRole::TranscodedVideo => "video_compressed.mp4".to_string(),
            ArtifactRole::TrackingDescriptor => "targets.mind".to_string(),
            ArtifactRole::QrImage => "qrcode.png".to_string(),
            ArtifactRole::CompositedImage => format!("photo_with_qr.{}", source_ext),
            ArtifactRole::EntryPage => "index.html".to_string(),
        }
    }
}

/// Extract the normalized (lowercase, dot-free) extension from an
/// original filename, e.g. `IMG 001.JPEG` → `jpeg`
pub fn normalized_ext(original_name: &str) -> Option<String> {
    Path::new(original_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
}
