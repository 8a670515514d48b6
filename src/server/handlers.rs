use super::AppState;
use crate::config::Language;
use crate::draft::{DraftError, DraftUpload};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

pub const AUDIO_FIELD: &str = "audio";
pub const MODEL_FIELD: &str = "model";
pub const EXISTING_TEXT_FIELD: &str = "existingText";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }),
    )
}

#[tracing::instrument(skip_all)]
pub async fn transcribe_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let language = state.drafts.language();

    let mut multipart = match multipart {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("Rejected non-multipart request: {}", e);
            return error_response(&DraftError::MalformedRequest(e.body_text()), language);
        }
    };

    let max_bytes = state.drafts.settings().max_upload_bytes;
    let upload = match read_upload(&mut multipart, max_bytes).await {
        Ok(upload) => upload,
        Err(e) => {
            tracing::warn!("Upload rejected: {}", e);
            return error_response(&e, language);
        }
    };

    match state.drafts.draft(upload).await {
        Ok(draft) => (StatusCode::OK, Json(draft)).into_response(),
        Err(e) => error_response(&e, language),
    }
}

fn error_response(error: &DraftError, language: Language) -> Response {
    (error.status(), Json(error.to_response(language))).into_response()
}

/// Collects the form fields. The audio part is read chunk by chunk and
/// abandoned as soon as it passes `max_bytes`.
async fn read_upload(multipart: &mut Multipart, max_bytes: usize) -> Result<DraftUpload, DraftError> {
    let mut upload = DraftUpload::default();

    while let Some(mut field) = multipart.next_field().await.map_err(|e| multipart_error(e, max_bytes))? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            AUDIO_FIELD => {
                upload.mime_type = field.content_type().map(str::to_string);
                let mut data = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, max_bytes))? {
                    if data.len() + chunk.len() > max_bytes {
                        return Err(DraftError::UploadTooLarge { max: max_bytes });
                    }
                    data.extend_from_slice(&chunk);
                }
                tracing::debug!(
                    "Audio field: {} bytes, {:?}, file={:?}",
                    data.len(),
                    upload.mime_type,
                    field.file_name()
                );
                upload.audio = Some(data);
            }
            MODEL_FIELD => {
                upload.model = Some(field.text().await.map_err(|e| multipart_error(e, max_bytes))?);
            }
            EXISTING_TEXT_FIELD => {
                upload.existing_text =
                    Some(field.text().await.map_err(|e| multipart_error(e, max_bytes))?);
            }
            other => tracing::debug!("Ignoring form field '{}'", other),
        }
    }

    Ok(upload)
}

fn multipart_error(error: MultipartError, max_bytes: usize) -> DraftError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DraftError::UploadTooLarge { max: max_bytes }
    } else {
        DraftError::MalformedRequest(error.body_text())
    }
}
