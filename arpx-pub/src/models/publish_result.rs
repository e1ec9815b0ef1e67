//! Published-run result types

use arpx_common::SessionId;
use serde::{Deserialize, Serialize};

/// Result of a successful Pipeline Run
///
/// `warnings` is non-empty when a degraded (non-fatal) stage failed;
/// today that is only the composite stage, in which case
/// `handout_file` is `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedExperience {
    /// Session this run published
    pub session_id: SessionId,

    /// Externally reachable entry-page URL
    pub entry_url: String,

    /// Filename of the printable hand-out within the session
    /// directory, if compositing succeeded
    pub handout_file: Option<String>,

    /// Degraded-stage warnings (operator-facing text)
    pub warnings: Vec<String>,
}
