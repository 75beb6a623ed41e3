//! Sign-up, sign-in and sessions.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use refill_core::Timestamp;

use crate::error::Result;
use crate::middleware::{BearerToken, RequireUser};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::services::auth::Registration;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: Timestamp,
    pub user: CurrentUser,
}

fn auth(state: &AppState) -> AuthService<'_> {
    AuthService::new(state.store(), state.config().session_ttl())
}

/// Create an account and its customer profile.
#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<Registration>,
) -> Result<(StatusCode, Json<CurrentUser>)> {
    let user = auth(&state).register(&form).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let sign_in = auth(&state).login(&body.email, &body.password).await?;
    Ok(Json(LoginResponse {
        token: sign_in.token,
        expires_at: sign_in.expires_at,
        user: sign_in.user,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode> {
    auth(&state).logout(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in user.
pub async fn session(RequireUser(user): RequireUser) -> Json<CurrentUser> {
    Json(user)
}
