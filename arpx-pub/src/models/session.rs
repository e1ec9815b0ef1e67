//! Publish session state machine
//!
//! **[APX-WF-010]** A session progresses through:
//! ALLOCATED → PROCESSING → PUBLISHED | FAILED
//!
//! The session is the unit of work for one submission. It owns an
//! exclusive directory under the public root; artifacts are added to it
//! by the pipeline stages and the session is never mutated after
//! materialization completes. The Pipeline Run itself is not persisted
//! past the request: its terminal state is fully captured by which
//! artifacts exist on disk.

use arpx_common::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// **[APX-WF-010]** Publish workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PublishState {
    /// Session directory minted, inputs not yet ingested
    Allocated,
    /// Pipeline stages running
    Processing,
    /// Entry page materialized; session is reachable
    Published,
    /// A fatal stage error aborted the run
    Failed,
}

/// Per-stage outcome within one Pipeline Run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageOutcome {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

/// Outcomes of every pipeline stage, in execution order
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StageOutcomes {
    pub transcode: StageOutcome,
    pub target_compile: StageOutcome,
    pub qr_encode: StageOutcome,
    pub composite: StageOutcome,
    pub materialize: StageOutcome,
}

/// One submission's isolated unit of work and storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSession {
    /// Unique session identifier (doubles as directory name)
    pub session_id: SessionId,

    /// Exclusively owned storage root for this session's artifacts
    pub directory: PathBuf,

    /// Session creation time
    pub created_at: DateTime<Utc>,

    /// Current workflow state
    pub state: PublishState,

    /// Per-stage outcomes for this run
    pub stages: StageOutcomes,
}

impl PublishSession {
    /// Create a session for a freshly created directory
    pub fn new(session_id: SessionId, directory: PathBuf) -> Self {
        Self {
            session_id,
            directory,
            created_at: Utc::now(),
            state: PublishState::Allocated,
            stages: StageOutcomes::default(),
        }
    }

    /// Transition to a new state
    pub fn transition_to(&mut self, new_state: PublishState) {
        self.state = new_state;
    }

    /// Check if the session reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, PublishState::Published | PublishState::Failed)
    }
}

/// Temp-write-then-rename discipline: the hidden staging name for an
/// artifact, renamed into place only once the write is complete so a
/// concurrent reader (the static file server) never observes a partial
/// file.
pub fn part_path(dir: &Path, filename: &str) -> PathBuf {
    dir.join(format!(".{}.part", filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let mut session =
            PublishSession::new(SessionId::mint(), PathBuf::from("/tmp/arpx-test/s1"));
        assert_eq!(session.state, PublishState::Allocated);
        assert!(!session.is_terminal());

        session.transition_to(PublishState::Processing);
        assert!(!session.is_terminal());

        session.transition_to(PublishState::Published);
        assert!(session.is_terminal());
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut session =
            PublishSession::new(SessionId::mint(), PathBuf::from("/tmp/arpx-test/s2"));
        session.transition_to(PublishState::Failed);
        assert!(session.is_terminal());
    }

    #[test]
    fn test_stage_outcomes_start_pending() {
        let session = PublishSession::new(SessionId::mint(), PathBuf::from("/tmp/arpx-test/s3"));
        assert_eq!(session.stages.transcode, StageOutcome::Pending);
        assert_eq!(session.stages.materialize, StageOutcome::Pending);
    }

    #[test]
    fn test_part_path_is_hidden_sibling() {
        let part = part_path(Path::new("/data/p/123"), "video_compressed.mp4");
        assert_eq!(
            part,
            PathBuf::from("/data/p/123/.video_compressed.mp4.part")
        );
    }
}
