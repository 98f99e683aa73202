// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Statistics route.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::ProblemStats;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/stats", get(get_stats))
}

/// Aggregate statistics over the user's own problems.
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProblemStats>> {
    let problems = state.db.problems_for_user(&user.user_id).await?;
    let stats = ProblemStats::from_problems(&problems, chrono::Utc::now());

    tracing::debug!(
        user_id = %user.user_id,
        total = stats.total_problems,
        "Computed stats"
    );

    Ok(Json(stats))
}
