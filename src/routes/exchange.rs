// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSV export and import routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::csv::export_csv;
use crate::services::import::{import_problems, ImportResults};
use crate::time_utils::format_date;
use crate::AppState;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Multipart field holding the upload.
const FILE_FIELD: &str = "file";

/// Export/import routes (require a session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes(import_max_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/problems/export", get(export_problems))
        .route(
            "/api/problems/import",
            post(import_csv).layer(DefaultBodyLimit::max(import_max_bytes)),
        )
}

/// Download every problem the user owns, most recently solved first.
async fn export_problems(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let problems = state.db.problems_for_user(&user.user_id).await?;
    let body = export_csv(&problems);

    tracing::info!(user_id = %user.user_id, count = problems.len(), "Exported problems");

    let disposition = format!(
        "attachment; filename=\"leetlog-problems-{}.csv\"",
        format_date(chrono::Utc::now())
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ImportResponse {
    pub message: String,
    pub results: ImportResults,
}

/// Import a CSV upload (multipart field `file`).
async fn import_csv(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportResponse>> {
    let limit = state.config.import_max_bytes;
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    if !file_name.to_ascii_lowercase().ends_with(".csv") {
        return Err(AppError::BadRequest("File must be a CSV".to_string()));
    }

    let text = std::str::from_utf8(&bytes)
        .map_err(|_| AppError::BadRequest("File must be UTF-8 text".to_string()))?;

    tracing::info!(
        user_id = %user.user_id,
        file_name = %file_name,
        bytes = bytes.len(),
        "Importing CSV"
    );

    let results = import_problems(&state.db, &user.user_id, text).await?;

    Ok(Json(ImportResponse {
        message: "Import completed".to_string(),
        results,
    }))
}

fn multipart_error(err: MultipartError, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit }
    } else {
        AppError::BadRequest(err.body_text())
    }
}
