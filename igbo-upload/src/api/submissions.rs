//! Submission API handler
//!
//! POST /api/submissions (multipart/form-data)
//!
//! | field     | required | notes                                   |
//! |-----------|----------|-----------------------------------------|
//! | `audio`   | yes      | file part; its content type is the MIME |
//! | `text`    | no*      | blank text is reported, not rejected    |
//! | `gender`  | no       | `female`, `male` or empty               |
//! | `age`     | no       | free text                               |
//! | `dialect` | no       | free text                               |
//!
//! Everything that happens after the form is parsed is reported in the
//! returned [`SubmissionReport`] with status 200.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{AudioUpload, Gender, Submission, SubmissionReport};
use crate::AppState;

/// Room for the text fields and multipart framing on top of the audio limit
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

const FALLBACK_MIME: &str = "application/octet-stream";

/// POST /api/submissions
pub async fn create_submission(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<SubmissionReport>> {
    let submission = read_submission(multipart, state.max_upload_bytes).await?;

    info!(
        file_name = ?submission.audio.file_name,
        mime = %submission.audio.declared_mime,
        bytes = submission.audio.bytes.len(),
        "Received submission"
    );

    let report = state.workflow.run(submission).await;

    if let Some(reason) = report.failure_reason() {
        warn!(submission_id = %report.submission_id, reason, "Submission not published");
        *state.last_error.write().await = Some(reason.to_string());
    }

    Ok(Json(report))
}

async fn read_submission(mut multipart: Multipart, max_upload_bytes: usize) -> ApiResult<Submission> {
    let mut text = String::new();
    let mut gender = Gender::Unspecified;
    let mut age = None;
    let mut dialect = None;
    let mut audio = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => text = field.text().await?,
            "gender" => {
                gender = field
                    .text()
                    .await?
                    .parse()
                    .map_err(ApiError::BadRequest)?;
            }
            "age" => age = Some(field.text().await?),
            "dialect" => dialect = Some(field.text().await?),
            "audio" => {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .map(str::to_string);
                let declared_mime = field
                    .content_type()
                    .unwrap_or(FALLBACK_MIME)
                    .to_string();
                let bytes = field.bytes().await?;

                if bytes.len() > max_upload_bytes {
                    return Err(ApiError::PayloadTooLarge(format!(
                        "audio is {} bytes, limit is {}",
                        bytes.len(),
                        max_upload_bytes
                    )));
                }
                // Browsers send an empty, unnamed part when no file was chosen
                if bytes.is_empty() && file_name.is_none() {
                    continue;
                }

                audio = Some(AudioUpload {
                    bytes: bytes.to_vec(),
                    declared_mime,
                    file_name,
                });
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown form field");
            }
        }
    }

    let audio = audio.ok_or_else(|| ApiError::BadRequest("missing audio file".to_string()))?;

    Ok(Submission {
        text,
        audio,
        gender,
        age,
        dialect,
    })
}

/// Build submission routes; the body limit applies to this route only
pub fn submission_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/submissions", post(create_submission))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES),
        ))
}
