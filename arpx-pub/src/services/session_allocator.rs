//! Session allocation
//!
//! **[APX-SESS-020]** Mints a session id and creates its exclusively
//! owned directory. Two concurrent submissions must never share a
//! directory: `create_dir` (not `create_dir_all`) on the leaf detects
//! a pre-existing directory, and allocation retries with a freshly
//! minted id. The random id suffix makes such collisions rare; the
//! filesystem check makes them harmless.

use crate::error::PublishError;
use crate::models::PublishSession;
use arpx_common::SessionId;
use std::path::PathBuf;
use tracing::{debug, warn};

const MAX_ATTEMPTS: usize = 8;

/// Allocates isolated session directories under the public root
pub struct SessionAllocator {
    public_root: PathBuf,
}

impl SessionAllocator {
    pub fn new(public_root: PathBuf) -> Self {
        Self { public_root }
    }

    /// Allocate a new session with a guaranteed-fresh directory
    pub fn allocate(&self) -> Result<PublishSession, PublishError> {
        std::fs::create_dir_all(&self.public_root)
            .map_err(|e| PublishError::Allocation(format!("public root unavailable: {}", e)))?;

        for _ in 0..MAX_ATTEMPTS {
            let session_id = SessionId::mint();
            let directory = self.public_root.join(session_id.as_str());

            match std::fs::create_dir(&directory) {
                Ok(()) => {
                    debug!(session_id = %session_id, directory = %directory.display(), "Session allocated");
                    return Ok(PublishSession::new(session_id, directory));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    warn!(session_id = %session_id, "Session id collision, re-minting");
                }
                Err(e) => {
                    return Err(PublishError::Allocation(format!(
                        "failed to create session directory {}: {}",
                        directory.display(),
                        e
                    )));
                }
            }
        }

        Err(PublishError::Allocation(format!(
            "could not mint a unique session directory after {} attempts",
            MAX_ATTEMPTS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_allocations_are_isolated() {
        let root = tempfile::tempdir().unwrap();
        let allocator = SessionAllocator::new(root.path().to_path_buf());

        let mut directories = HashSet::new();
        for _ in 0..20 {
            let session = allocator.allocate().unwrap();
            assert!(session.directory.is_dir());
            assert!(directories.insert(session.directory.clone()));
        }
    }

    #[test]
    fn test_creates_public_root_when_missing() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("does").join("not").join("exist");
        let allocator = SessionAllocator::new(nested.clone());

        let session = allocator.allocate().unwrap();
        assert!(nested.is_dir());
        assert!(session.directory.starts_with(&nested));
    }

    #[test]
    fn test_unwritable_root_is_a_storage_error() {
        // Path under a file cannot be created
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"file, not dir").unwrap();

        let allocator = SessionAllocator::new(blocker.join("sessions"));
        let err = allocator.allocate().unwrap_err();
        assert_eq!(err.stage(), "allocation");
    }
}
