//! Session-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use radiotaxi_core::access::{AuthenticatedUser, Session};
use radiotaxi_core::error::CoreError;

use crate::auth::cookie::{session_token, TokenSource};
use crate::error::AppError;
use crate::state::AppState;

/// The acting user behind a valid session.
///
/// Reads the `session` cookie (or a Bearer token), resolves it through the
/// access guard, and rejects with `INVALID_SESSION` when absent, unknown or
/// expired. Resolution renews sessions close to expiry.
///
/// ```ignore
/// async fn my_handler(SessionUser { user, .. }: SessionUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub session: Session,
    pub user: AuthenticatedUser,
    /// Plaintext token as presented by the client.
    pub token: String,
    pub source: TokenSource,
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (token, source) = session_token(&parts.headers).ok_or_else(|| {
            AppError::Core(CoreError::InvalidSession("Missing session token".into()))
        })?;

        let (session, user) = state.guard.resolve_session(&token).await?;

        Ok(SessionUser {
            session,
            user,
            token,
            source,
        })
    }
}
