//! Handlers for the `/auth` resource (login, logout, me).

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use radiotaxi_core::access::AuthenticatedUser;
use radiotaxi_core::error::CoreError;
use radiotaxi_core::ports::UserDirectory;
use radiotaxi_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::cookie::{clear_session_cookie, session_cookie, TokenSource};
use crate::auth::password::{verify_dummy, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::SessionUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Successful login. The token is also set as the `session` cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: Timestamp,
    pub user: AuthenticatedUser,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: AuthenticatedUser,
    pub session_expires_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Verify username + password and open a 30-day session.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let Some(account) = state
        .guard
        .users()
        .find_user_by_username(input.username.trim())
        .await?
    else {
        verify_dummy(&input.password);
        return Err(invalid_credentials());
    };

    let password_valid = verify_password(&input.password, &account.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        tracing::warn!(username = %account.username, "Failed login attempt");
        return Err(invalid_credentials());
    }

    if !account.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let (token, session) = state.guard.create_session(&account).await?;
    let cookie = session_cookie(
        &token.plaintext,
        session.expires_at - session.created_at,
        state.config.secure_cookies(),
    );

    tracing::info!(user_id = account.id, role = %account.role, "User logged in");

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: token.plaintext,
            expires_at: session.expires_at,
            user: account.into(),
        }),
    ))
}

/// POST /api/v1/auth/logout
///
/// Delete the current session and clear the cookie. Returns 204 No Content.
pub async fn logout(
    State(state): State<AppState>,
    auth: SessionUser,
) -> AppResult<impl IntoResponse> {
    state.guard.invalidate_session(&auth.token).await?;
    tracing::info!(user_id = auth.user.user_id, "User logged out");

    Ok((
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_session_cookie(state.config.secure_cookies()))],
    ))
}

/// GET /api/v1/auth/me
///
/// The resolved user. Cookie clients get the cookie re-issued so its
/// lifetime follows any server-side renewal.
pub async fn me(
    State(state): State<AppState>,
    auth: SessionUser,
) -> AppResult<impl IntoResponse> {
    let refreshed = (auth.source == TokenSource::Cookie).then(|| {
        [(
            SET_COOKIE,
            session_cookie(
                &auth.token,
                state.guard.remaining_lifetime(&auth.session),
                state.config.secure_cookies(),
            ),
        )]
    });

    Ok((
        refreshed,
        Json(DataResponse {
            data: MeResponse {
                user: auth.user,
                session_expires_at: auth.session.expires_at,
            },
        }),
    ))
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid username or password".into(),
    ))
}
