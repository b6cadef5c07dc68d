//! API request handlers.

use std::path::Path;

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use tokio::io::AsyncWriteExt;

use crate::conversion::PageConverter;
use crate::converter::ensure_available;
use crate::core::config::ServiceConfig;
use crate::core::upload::validate_upload_name;
use crate::core::{StoredUpload, validate_path};
use crate::error::{Ai2SvgError, Result};

use super::{
    error::ApiError,
    types::{ApiState, ConvertResponse, HealthResponse},
};

/// Multipart field carrying the uploaded document.
pub const UPLOAD_FIELD: &str = "file";

/// Convert endpoint handler.
///
/// POST /convert
///
/// Accepts multipart form data with a single `file` field holding an Adobe
/// Illustrator document. Returns one SVG document per page.
///
/// The upload is streamed to `<temp_dir>/uploads/<uuid>.ai` and deleted once the
/// request finishes, whatever the outcome. Uploads over the configured limit are
/// rejected with 400 while streaming.
pub async fn convert_handler(
    State(state): State<ApiState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<ConvertResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Request is not a multipart upload: {}", e);
        Ai2SvgError::NoFileUploaded
    })?;

    let upload = receive_upload(&mut multipart, &state.config).await?;
    tracing::info!(
        "Received upload of {} bytes, stored as {}",
        upload.size(),
        upload.path().display()
    );

    let outcome = convert_upload(&state, upload.path()).await;
    upload.discard().await;

    let svgs = outcome?;
    tracing::info!("Returning {} SVG page(s)", svgs.len());
    Ok(Json(ConvertResponse::new(svgs)))
}

/// Health check endpoint handler.
///
/// GET /health
///
/// Always answers 200; converter availability is reported in the payload.
pub async fn health_handler(State(state): State<ApiState>) -> Json<HealthResponse> {
    let status = state.converter.status().await;
    let message = if status.available {
        "ai2svg is running".to_string()
    } else {
        format!("ai2svg is running, but {} is unavailable", state.converter.name())
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        message,
        converter: status.into(),
    })
}

async fn convert_upload(state: &ApiState, stored: &Path) -> std::result::Result<Vec<String>, ApiError> {
    let input = validate_path(stored, &state.config.temp_dir).await?;

    ensure_available(state.converter.as_ref()).await.map_err(|e| match e {
        Ai2SvgError::ConverterUnavailable(message) => ApiError::converter_unavailable(
            state.converter.name(),
            message,
            state.converter.install_guidance(),
        ),
        other => other.into(),
    })?;

    let pages = PageConverter::from_config(state.converter.clone(), &state.config);
    let deadline = state.config.request_timeout();
    let result = tokio::time::timeout(deadline, pages.convert(&input))
        .await
        .map_err(|_| Ai2SvgError::Timeout {
            operation: "Conversion".to_string(),
            seconds: deadline.as_secs(),
        })??;

    Ok(result.pages)
}

/// Stream the first `file` field to disk.
async fn receive_upload(multipart: &mut Multipart, config: &ServiceConfig) -> Result<StoredUpload> {
    while let Some(mut field) = multipart.next_field().await.map_err(|e| multipart_error(e, config))? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        validate_upload_name(field.file_name())?;

        let (mut upload, mut file) = StoredUpload::create(config.uploads_dir()).await?;
        let written = write_field(&mut field, &mut upload, &mut file, config).await;
        drop(file);

        return match written {
            Ok(()) => Ok(upload),
            Err(e) => {
                upload.discard().await;
                Err(e)
            }
        };
    }

    Err(Ai2SvgError::NoFileUploaded)
}

async fn write_field(
    field: &mut Field<'_>,
    upload: &mut StoredUpload,
    file: &mut tokio::fs::File,
    config: &ServiceConfig,
) -> Result<()> {
    let max_bytes = config.max_upload_bytes();
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, config))? {
        upload.append(file, &chunk, max_bytes).await?;
    }
    file.flush().await?;
    Ok(())
}

fn multipart_error(err: MultipartError, config: &ServiceConfig) -> Ai2SvgError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Ai2SvgError::FileTooLarge {
            limit_mb: config.max_upload_mb,
        }
    } else {
        tracing::debug!("Malformed multipart body: {}", err.body_text());
        Ai2SvgError::NoFileUploaded
    }
}
