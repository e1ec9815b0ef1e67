//! Pipeline orchestrator
//!
//! **[APX-ORCH-010]** Sequences the publishing stages for one
//! submission:
//!
//! ```text
//! Allocate → ingest → { Transcode ∥ Target-Compile } → URL → QR
//!          → Composite (best effort) → Materialize
//! ```
//!
//! Transcode and target-compile share no data and run concurrently;
//! everything after the join is strictly sequential due to data
//! dependencies. The first fatal stage error aborts the run and
//! removes the session directory entirely, so a session is never
//! half-published. No stage is retried automatically; the whole run is
//! idempotent from the original inputs if the caller resubmits.

use crate::config::PublishConfig;
use crate::error::PublishError;
use crate::models::{
    normalized_ext, ArtifactRole, PublishSession, PublishState, PublishedExperience, StageOutcome,
    IMAGE_EXTENSIONS, VIDEO_EXTENSIONS,
};
use crate::services::compositor;
use crate::services::page_materializer::{PageBindings, PageMaterializer};
use crate::services::qr_encoder::{entry_url, QrEncoder};
use crate::services::session_allocator::SessionAllocator;
use crate::services::target_compiler::TargetCompiler;
use crate::services::tool_runner::ToolRunner;
use crate::services::transcoder::Transcoder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// One accepted upload, already materialized on the local filesystem
///
/// `photo_name` / `video_name` are the original filenames, used only
/// for extension inference.
#[derive(Debug, Clone)]
pub struct Submission {
    pub photo_path: PathBuf,
    pub photo_name: String,
    pub video_path: PathBuf,
    pub video_name: String,
    pub base_url_override: Option<String>,
}

/// Orchestrates one Pipeline Run per submission
///
/// Stateless between runs; every run owns an exclusive session
/// directory, which is what makes unbounded concurrent publishing
/// safe.
pub struct PublishOrchestrator {
    base_url: String,
    allocator: SessionAllocator,
    transcoder: Transcoder,
    target_compiler: TargetCompiler,
    qr_encoder: QrEncoder,
    materializer: PageMaterializer,
}

impl PublishOrchestrator {
    pub fn new(config: &PublishConfig) -> arpx_common::Result<Self> {
        let runner = Arc::new(ToolRunner::new(
            config.max_concurrent_tools,
            config.tool_timeout,
        ));

        Ok(Self {
            base_url: config.public_base_url.clone(),
            allocator: SessionAllocator::new(config.public_root.clone()),
            transcoder: Transcoder::new(
                Arc::clone(&runner),
                config.transcoder_bin.clone(),
                config.max_video_width,
                config.max_video_bitrate_kbps,
            ),
            target_compiler: TargetCompiler::new(
                Arc::clone(&runner),
                config.target_compiler_bin.clone(),
            ),
            qr_encoder: QrEncoder::new(runner, config.qr_encoder_bin.clone(), config.qr_pixel_size),
            materializer: PageMaterializer::new(config.template.clone())?,
        })
    }

    /// Execute the full Pipeline Run for one submission
    pub async fn publish(
        &self,
        submission: Submission,
    ) -> Result<PublishedExperience, PublishError> {
        let (photo_ext, video_ext) = validate(&submission)?;

        let mut session = self.allocator.allocate()?;
        info!(
            session_id = %session.session_id,
            photo = %submission.photo_name,
            video = %submission.video_name,
            "Starting publish run"
        );

        session.transition_to(PublishState::Processing);

        // Ingest the uploads under their deterministic artifact names
        let photo_file = ArtifactRole::ReferenceImage.filename(&photo_ext);
        let video_file = ArtifactRole::SourceVideo.filename(&video_ext);
        if let Err(e) = self
            .ingest(&session, &submission, &photo_file, &video_file)
            .await
        {
            return self.abort(session, e).await;
        }

        // Fan out the two independent fatal stages and join on both
        let (video_result, target_result) = tokio::join!(
            self.transcoder.transcode(&session, &video_file),
            self.target_compiler.compile(&session, &photo_file),
        );

        session.stages.transcode = outcome(&video_result);
        session.stages.target_compile = outcome(&target_result);

        let transcoded_file = match video_result {
            Ok(name) => name,
            Err(e) => return self.abort(session, e).await,
        };
        let targets_file = match target_result {
            Ok(name) => name,
            Err(e) => return self.abort(session, e).await,
        };

        // Entry URL is a pure function of (base, session id)
        let base = submission
            .base_url_override
            .as_deref()
            .unwrap_or(&self.base_url);
        let url = entry_url(base, &session.session_id);

        let qr_result = self.qr_encoder.encode(&session, &url).await;
        session.stages.qr_encode = outcome(&qr_result);
        let qr_file = match qr_result {
            Ok(name) => name,
            Err(e) => return self.abort(session, e).await,
        };

        // Composite is best-effort: a failure downgrades the result
        // but never aborts publication
        let mut warnings = Vec::new();
        let handout_file = match self.composite(&session, &photo_file, &qr_file).await {
            Ok(name) => {
                session.stages.composite = StageOutcome::Succeeded;
                Some(name)
            }
            Err(e) => {
                session.stages.composite = StageOutcome::Failed;
                warn!(
                    session_id = %session.session_id,
                    error = %e,
                    "Composite stage failed (degraded, publication continues)"
                );
                warnings.push(format!("hand-out not generated: {}", e));
                None
            }
        };

        // Materialization is the publication barrier
        let bindings = PageBindings {
            photo_file: &photo_file,
            video_file: &transcoded_file,
            targets_file: &targets_file,
        };
        let materialize_result = self.materializer.materialize(&session.directory, &bindings);
        session.stages.materialize = outcome(&materialize_result);
        if let Err(e) = materialize_result {
            return self.abort(session, e).await;
        }

        session.transition_to(PublishState::Published);
        info!(
            session_id = %session.session_id,
            entry_url = %url,
            handout = handout_file.is_some(),
            "Publish run complete"
        );

        Ok(PublishedExperience {
            session_id: session.session_id,
            entry_url: url,
            handout_file,
            warnings,
        })
    }

    /// Copy the accepted uploads into the session directory
    async fn ingest(
        &self,
        session: &PublishSession,
        submission: &Submission,
        photo_file: &str,
        video_file: &str,
    ) -> Result<(), PublishError> {
        tokio::fs::copy(&submission.photo_path, session.directory.join(photo_file))
            .await
            .map_err(|e| PublishError::Allocation(format!("failed to ingest photo: {}", e)))?;
        tokio::fs::copy(&submission.video_path, session.directory.join(video_file))
            .await
            .map_err(|e| PublishError::Allocation(format!("failed to ingest video: {}", e)))?;
        Ok(())
    }

    /// Run the CPU-bound composite off the async runtime
    async fn composite(
        &self,
        session: &PublishSession,
        photo_file: &str,
        qr_file: &str,
    ) -> Result<String, PublishError> {
        let dir = session.directory.clone();
        let photo = photo_file.to_string();
        let qr = qr_file.to_string();
        tokio::task::spawn_blocking(move || compositor::composite(&dir, &photo, &qr))
            .await
            .map_err(|e| PublishError::Composite(format!("composite task failed: {}", e)))?
    }

    /// Abort the run on a fatal stage error
    ///
    /// The session directory is removed entirely: a failed run leaves
    /// no trace under the public root, and in particular no entry page
    /// referencing artifacts that do not exist.
    async fn abort(
        &self,
        mut session: PublishSession,
        cause: PublishError,
    ) -> Result<PublishedExperience, PublishError> {
        session.transition_to(PublishState::Failed);
        error!(
            session_id = %session.session_id,
            stage = cause.stage(),
            error = %cause,
            "Publish run aborted"
        );

        if let Err(e) = tokio::fs::remove_dir_all(&session.directory).await {
            warn!(
                session_id = %session.session_id,
                error = %e,
                "Failed to remove aborted session directory"
            );
        }

        Err(cause)
    }
}

fn outcome<T>(result: &Result<T, PublishError>) -> StageOutcome {
    if result.is_ok() {
        StageOutcome::Succeeded
    } else {
        StageOutcome::Failed
    }
}

/// Validate the upload pair before allocating any storage
fn validate(submission: &Submission) -> Result<(String, String), PublishError> {
    let photo_ext = normalized_ext(&submission.photo_name).ok_or_else(|| {
        PublishError::InvalidInput(format!(
            "photo {} has no file extension",
            submission.photo_name
        ))
    })?;
    if !IMAGE_EXTENSIONS.contains(&photo_ext.as_str()) {
        return Err(PublishError::InvalidInput(format!(
            "unsupported photo type .{} (expected one of {:?})",
            photo_ext, IMAGE_EXTENSIONS
        )));
    }

    let video_ext = normalized_ext(&submission.video_name).ok_or_else(|| {
        PublishError::InvalidInput(format!(
            "video {} has no file extension",
            submission.video_name
        ))
    })?;
    if !VIDEO_EXTENSIONS.contains(&video_ext.as_str()) {
        return Err(PublishError::InvalidInput(format!(
            "unsupported video type .{} (expected one of {:?})",
            video_ext, VIDEO_EXTENSIONS
        )));
    }

    Ok((photo_ext, video_ext))
}
