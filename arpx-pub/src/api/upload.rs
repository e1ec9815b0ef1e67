//! Upload endpoint
//!
//! **[APX-API-010]** `POST /upload` accepts multipart fields `photo`
//! and `video` (plus an optional `base_url` override), stages them on
//! local disk, and runs one Pipeline Run. The response is a structured
//! result distinguishing `published` (entry URL and optional hand-out
//! link) from `failed` (failing stage name and operator diagnostic).

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::services::Submission;
use crate::AppState;

/// Structured upload result
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadResponse {
    Published {
        session_id: String,
        entry_url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        handout_url: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    Failed {
        stage: String,
        detail: String,
    },
}

/// One multipart file field, buffered to disk
struct StagedFile {
    original_name: String,
    path: std::path::PathBuf,
}

/// POST /upload
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Response> {
    // Staging directory lives for the duration of the request; the
    // pipeline copies what it needs into the session directory.
    let staging = tempfile::tempdir().map_err(ApiError::Io)?;

    let mut photo: Option<StagedFile> = None;
    let mut video: Option<StagedFile> = None;
    let mut base_url_override: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photo" | "video" => {
                let slot = if name == "photo" { &mut photo } else { &mut video };
                let original_name = field
                    .file_name()
                    .map(|n| n.to_string())
                    .ok_or_else(|| ApiError::BadRequest(format!("{} field has no filename", name)))?;
                let path = staging.path().join(&name);

                // Stream to disk chunk by chunk; source videos can be
                // hundreds of megabytes and must not be buffered whole.
                let mut file = tokio::fs::File::create(&path).await?;
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read {}: {}", name, e)))?
                {
                    file.write_all(&chunk).await?;
                }
                file.flush().await?;

                *slot = Some(StagedFile {
                    original_name,
                    path,
                });
            }
            "base_url" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read base_url: {}", e)))?;
                let value = value.trim().to_string();
                if !value.is_empty() {
                    base_url_override = Some(value);
                }
            }
            other => {
                return Err(ApiError::BadRequest(format!(
                    "unexpected multipart field: {}",
                    other
                )));
            }
        }
    }

    let photo = photo.ok_or_else(|| ApiError::BadRequest("missing photo field".to_string()))?;
    let video = video.ok_or_else(|| ApiError::BadRequest("missing video field".to_string()))?;

    info!(photo = %photo.original_name, video = %video.original_name, "Upload accepted");

    let submission = Submission {
        photo_path: photo.path,
        photo_name: photo.original_name,
        video_path: video.path,
        video_name: video.original_name,
        base_url_override,
    };

    match state.orchestrator.publish(submission).await {
        Ok(published) => {
            // The hand-out sits next to index.html in the session
            // directory, so its URL shares the entry URL's prefix.
            let handout_url = published.handout_file.as_ref().map(|file| {
                format!(
                    "{}{}",
                    published.entry_url.trim_end_matches("index.html"),
                    file
                )
            });
            Ok(Json(UploadResponse::Published {
                session_id: published.session_id.to_string(),
                entry_url: published.entry_url,
                handout_url,
                warnings: published.warnings,
            })
            .into_response())
        }
        Err(e) => {
            *state.last_error.write().await = Some(e.to_string());
            let status = match &e {
                crate::error::PublishError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            Ok((
                status,
                Json(UploadResponse::Failed {
                    stage: e.stage().to_string(),
                    detail: e.to_string(),
                }),
            )
                .into_response())
        }
    }
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload))
}
