//! Access guard: turns a presented session token into an acting user.

use chrono::Duration;

use crate::access::{
    generate_session_token, hash_session_token, AuthenticatedUser, IssuedToken, Session,
    SessionPolicy, UserAccount,
};
use crate::error::CoreError;
use crate::ports::{Clock, SessionStore, UserDirectory};

pub struct AccessGuard<S, C> {
    store: S,
    clock: C,
    policy: SessionPolicy,
}

impl<S, C> AccessGuard<S, C>
where
    S: SessionStore + UserDirectory,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self::with_policy(store, clock, SessionPolicy::default())
    }

    pub fn with_policy(store: S, clock: C, policy: SessionPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn users(&self) -> &S {
        &self.store
    }

    /// Time left on `session` by the guard's clock.
    pub fn remaining_lifetime(&self, session: &Session) -> Duration {
        session.expires_at - self.clock.now()
    }

    /// Resolve a token to its session and user.
    ///
    /// Expired sessions are deleted on sight. A session with no more than the
    /// renewal window left is extended to a full lifetime before returning.
    pub async fn resolve_session(
        &self,
        token: &str,
    ) -> Result<(Session, AuthenticatedUser), CoreError> {
        if token.is_empty() {
            return Err(CoreError::InvalidSession("Missing session token".into()));
        }

        let id = hash_session_token(token);
        let mut session = self
            .store
            .find_session(&id)
            .await?
            .ok_or_else(|| CoreError::InvalidSession("Unknown session".into()))?;

        let now = self.clock.now();
        if self.policy.is_expired(&session, now) {
            self.store.delete_session(&id).await?;
            tracing::debug!(user_id = session.user_id, "Expired session purged");
            return Err(CoreError::InvalidSession("Session expired".into()));
        }

        let account = match self.store.find_user_by_id(session.user_id).await? {
            Some(account) if account.is_active => account,
            _ => {
                self.store.delete_session(&id).await?;
                return Err(CoreError::InvalidSession(
                    "Session user is missing or inactive".into(),
                ));
            }
        };

        if self.policy.needs_renewal(&session, now) {
            let expires_at = self.policy.expiry_from(now);
            self.store.extend_session(&id, expires_at).await?;
            session.expires_at = expires_at;
            tracing::debug!(user_id = session.user_id, %expires_at, "Session renewed");
        }

        Ok((session, account.into()))
    }

    /// Open a session for a user whose credentials were already verified.
    pub async fn create_session(
        &self,
        account: &UserAccount,
    ) -> Result<(IssuedToken, Session), CoreError> {
        if !account.is_active {
            return Err(CoreError::Unauthorized(format!(
                "User {} is inactive",
                account.username
            )));
        }

        let now = self.clock.now();
        let token = generate_session_token();
        let session = Session {
            id: token.hash.clone(),
            user_id: account.id,
            created_at: now,
            expires_at: self.policy.expiry_from(now),
        };
        self.store.insert_session(&session).await?;

        tracing::info!(user_id = account.id, "Session created");
        Ok((token, session))
    }

    /// Delete the session behind a token. Unknown tokens are not an error.
    pub async fn invalidate_session(&self, token: &str) -> Result<(), CoreError> {
        let deleted = self
            .store
            .delete_session(&hash_session_token(token))
            .await?;
        if deleted {
            tracing::info!("Session invalidated");
        }
        Ok(())
    }

    /// Delete every expired session. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64, CoreError> {
        let purged = self
            .store
            .delete_expired_sessions(self.clock.now())
            .await?;
        if purged > 0 {
            tracing::info!(purged, "Expired sessions purged");
        }
        Ok(purged)
    }
}
