//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for account signup, sign-in, and sign-out.
//!
//! None of these handlers change the session directly: the identity provider publishes
//! the change and the session manager reacts to it.

use crate::web::{rest::SessionResponse, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use scripture_core::{session::auth_error_notice, AuthError, Credentials, Session, SignInOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl From<LoginRequest> for Credentials {
    fn from(req: LoginRequest) -> Self {
        Credentials {
            email: req.email,
            password: req.password,
        }
    }
}

/// A short, transient message for the user.
#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct NoticeResponse {
    pub message: String,
}

impl NoticeResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn auth_status(error: &AuthError) -> StatusCode {
    match error {
        AuthError::PopupClosedByUser => StatusCode::BAD_REQUEST,
        AuthError::NetworkRequestFailed => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::Other(_) => StatusCode::UNAUTHORIZED,
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new account and sign it in
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = SessionResponse),
        (status = 400, description = "Missing email or password", body = NoticeResponse),
        (status = 401, description = "Account could not be created", body = NoticeResponse),
        (status = 503, description = "Account store unreachable", body = NoticeResponse)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), (StatusCode, Json<NoticeResponse>)> {
    let credentials = Credentials {
        email: req.email,
        password: req.password,
    };
    match state.accounts.register(&credentials, req.display_name).await {
        Ok(identity) => {
            info!(uid = %identity.uid, "Account created");
            let session = Session::Authenticated(identity);
            Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))))
        }
        Err(e) => {
            error!("Failed to create account: {e}");
            Err((auth_status(&e), Json(NoticeResponse::new(auth_error_notice(&e)))))
        }
    }
}

/// POST /auth/signin/{provider} - Sign in with the named provider
#[utoipa::path(
    post,
    path = "/auth/signin/{provider}",
    params(("provider" = String, Path, description = "Identity provider name, e.g. `email`.")),
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = NoticeResponse),
        (status = 400, description = "Sign-in cancelled", body = NoticeResponse),
        (status = 401, description = "Sign-in failed", body = NoticeResponse),
        (status = 501, description = "Provider not available yet", body = NoticeResponse),
        (status = 503, description = "Network error", body = NoticeResponse)
    )
)]
pub async fn signin_handler(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<NoticeResponse>) {
    let outcome = state.sessions.sign_in(&provider, &req.into()).await;
    let status = match &outcome {
        SignInOutcome::SignedIn { .. } => StatusCode::OK,
        SignInOutcome::ComingSoon(_) => StatusCode::NOT_IMPLEMENTED,
        SignInOutcome::Failed { error, .. } => auth_status(error),
    };
    (status, Json(NoticeResponse::new(outcome.notice())))
}

/// POST /auth/signout - Save progress, then sign out
#[utoipa::path(
    post,
    path = "/auth/signout",
    responses(
        (status = 200, description = "Signed out", body = NoticeResponse),
        (status = 500, description = "Sign-out failed", body = NoticeResponse)
    )
)]
pub async fn signout_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<NoticeResponse>) {
    match state.sessions.sign_out().await {
        Ok(notice) => (StatusCode::OK, Json(NoticeResponse::new(notice))),
        Err(notice) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(NoticeResponse::new(notice)),
        ),
    }
}
