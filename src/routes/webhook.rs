// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook route for identity-provider user events.

use crate::error::{AppError, Result};
use crate::models::UserProfile;
use crate::services::webhook_signature::{self, SignatureHeaders};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhooks/identity", post(handle_event))
}

/// Event envelope. Only user events are acted upon.
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct UserEventData {
    id: String,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    email_address: String,
}

impl From<UserEventData> for UserProfile {
    fn from(data: UserEventData) -> Self {
        let email = data
            .email_addresses
            .into_iter()
            .next()
            .map(|e| e.email_address)
            .unwrap_or_default();
        UserProfile {
            id: data.id,
            email,
            first_name: data.first_name,
            last_name: data.last_name,
        }
    }
}

fn user_data(data: serde_json::Value) -> Result<UserEventData> {
    serde_json::from_value(data)
        .map_err(|e| AppError::BadRequest(format!("Invalid user event: {e}")))
}

/// Handle a signed user event (POST).
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    // Nothing in the body is trusted until the signature checks out.
    let signature = SignatureHeaders::from_headers(&headers)
        .map_err(|e| AppError::WebhookVerification(e.to_string()))?;
    webhook_signature::verify(
        &state.config.webhook_signing_secret,
        &signature,
        &body,
        chrono::Utc::now().timestamp(),
    )
    .map_err(|e| AppError::WebhookVerification(e.to_string()))?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {e}")))?;

    tracing::info!(
        event_type = %event.event_type,
        message_id = %signature.id,
        "Received identity webhook"
    );

    match event.event_type.as_str() {
        "user.created" | "user.updated" => {
            let profile = UserProfile::from(user_data(event.data)?);
            state.db.upsert_user(&profile).await?;
            tracing::info!(user_id = %profile.id, "User synced");
        }
        "user.deleted" => {
            let data = user_data(event.data)?;
            let existed = state.db.delete_user(&data.id).await?;
            tracing::info!(user_id = %data.id, existed, "User deleted");
        }
        other => {
            tracing::debug!(event_type = other, "Ignoring webhook event");
        }
    }

    Ok(StatusCode::OK)
}
