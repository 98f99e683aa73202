// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Problem record routes. Every query is scoped to the session's user.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Problem, ProblemFilter, ProblemInput, ProblemSummary};
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Problem routes (require a session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/problems", get(list_problems).post(create_problem))
        .route(
            "/api/problems/{id}",
            get(get_problem).put(update_problem).delete(delete_problem),
        )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

async fn list_problems(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    filter: std::result::Result<Query<ProblemFilter>, QueryRejection>,
) -> Result<Json<Vec<ProblemSummary>>> {
    let Query(filter) = filter?;
    let problems = state.db.list_problems(&user.user_id, &filter).await?;
    Ok(Json(problems))
}

async fn create_problem(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<ProblemInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Problem>)> {
    let Json(input) = payload?;
    let fields = input.into_fields()?;

    let problem = state.db.create_problem(&user.user_id, &fields).await?;
    tracing::info!(user_id = %user.user_id, problem_id = problem.id, "Problem created");

    Ok((StatusCode::CREATED, Json(problem)))
}

async fn get_problem(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Problem>> {
    let Path(id) = id?;
    let problem = state
        .db
        .get_problem(&user.user_id, id)
        .await?
        .ok_or(AppError::NotFound("Problem"))?;
    Ok(Json(problem))
}

async fn update_problem(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<ProblemInput>, JsonRejection>,
) -> Result<Json<Problem>> {
    let Path(id) = id?;
    let Json(input) = payload?;
    let fields = input.into_fields()?;

    let problem = state
        .db
        .update_problem(&user.user_id, id, &fields)
        .await?
        .ok_or(AppError::NotFound("Problem"))?;
    tracing::info!(user_id = %user.user_id, problem_id = id, "Problem updated");

    Ok(Json(problem))
}

async fn delete_problem(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>> {
    let Path(id) = id?;
    if !state.db.delete_problem(&user.user_id, id).await? {
        return Err(AppError::NotFound("Problem"));
    }
    tracing::info!(user_id = %user.user_id, problem_id = id, "Problem deleted");

    Ok(Json(MessageResponse {
        message: "Problem deleted successfully".to_string(),
    }))
}
