use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    AppState,
    error::{ApiError, Result},
    types::*,
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/confirm", get(confirm_handler))
        .route("/newsletter", post(newsletter_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn confirm_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<ConfirmQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    // A query string that does not parse, e.g. a repeated `code`, names no code.
    let Ok(Query(query)) = query else {
        return Err(ApiError::CodeRequired);
    };

    let confirmed = state
        .confirmation
        .confirm(query.code.as_deref())
        .await
        .map_err(ApiError::from_confirmation)?;

    Ok(Json(ConfirmResponse {
        message: "Email verified".to_string(),
        email: confirmed.email,
    }))
}

async fn newsletter_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewsletterRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    // An unreadable body carries no email either.
    let email = payload
        .ok()
        .and_then(|Json(request)| request.email)
        .unwrap_or_default();

    state.newsletter.subscribe(&email).await.map_err(|e| {
        if !e.is_validation_error() {
            tracing::error!(error = %e, "Failed to send verification email");
        }
        ApiError::from_signup(e)
    })?;

    Ok(Json(MessageResponse {
        message: "Verification email sent".to_string(),
    }))
}

async fn health_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.confirmation.health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Health check failed");
        ApiError::Unavailable
    })?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
