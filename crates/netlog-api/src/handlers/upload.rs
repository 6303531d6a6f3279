use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use netlog_core::excerpt_from_bytes;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{ApiError, UploadResponse};
use crate::state::{AppState, StoredUpload, MAX_UPLOADS};

const ALLOWED_EXTENSIONS: [&str; 2] = ["txt", "log"];

pub async fn upload_log(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<ApiError>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !has_allowed_extension(&file_name) {
            return Err(ApiError::bad_request(format!(
                "Unsupported file type '{}', expected .txt or .log",
                file_name
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        let excerpt = excerpt_from_bytes(&bytes).map_err(|e| {
            warn!(file = %file_name, error = %e, "Upload could not be decoded");
            ApiError::unprocessable(e.to_string())
        })?;

        let upload_id = Uuid::new_v4();
        info!(
            upload = %upload_id,
            file = %file_name,
            bytes = bytes.len(),
            matched_lines = excerpt.matched_lines(),
            truncated = excerpt.truncated(),
            "Log uploaded"
        );

        {
            let mut uploads = state
                .uploads
                .write()
                .map_err(|_| ApiError::internal("Upload store unavailable"))?;
            if uploads.len() >= MAX_UPLOADS {
                let oldest = uploads
                    .iter()
                    .min_by_key(|(_, u)| u.sequence)
                    .map(|(id, _)| *id);
                if let Some(id) = oldest {
                    uploads.remove(&id);
                }
            }
            uploads.insert(
                upload_id,
                StoredUpload {
                    file_name: file_name.clone(),
                    excerpt: excerpt.clone(),
                    sequence: state.next_sequence(),
                },
            );
        }

        return Ok(Json(UploadResponse {
            upload_id,
            file_name,
            matched_lines: excerpt.matched_lines(),
            truncated: excerpt.truncated(),
            excerpt: excerpt.into_string(),
        }));
    }

    Err(ApiError::bad_request("Missing 'file' field"))
}

fn has_allowed_extension(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
