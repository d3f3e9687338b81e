//! Access policy: authenticated users, capability requirements, session
//! tokens and session lifetime rules.

use std::collections::BTreeSet;

use chrono::Duration;
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::roles::{Permission, Role};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A user row joined with its role and the role's permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub permissions: BTreeSet<Permission>,
    pub is_active: bool,
}

/// The acting user of a resolved session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub user_id: DbId,
    pub username: String,
    pub role: Role,
    pub permissions: BTreeSet<Permission>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrador
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Whether the user may read every booking rather than only their own.
    pub fn sees_all_bookings(&self) -> bool {
        self.is_admin() || self.has_permission(Permission::VerReservas)
    }
}

impl From<UserAccount> for AuthenticatedUser {
    fn from(account: UserAccount) -> Self {
        Self {
            user_id: account.id,
            username: account.username,
            role: account.role,
            permissions: account.permissions,
        }
    }
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// Capabilities a command demands. The user must hold ALL listed
/// permissions and ALL listed roles.
#[derive(Debug, Clone, Copy)]
pub struct Requirement {
    pub permissions: &'static [Permission],
    pub roles: &'static [Role],
}

impl Requirement {
    pub const CREATE_BOOKING: Self = Self {
        permissions: &[Permission::CrearReserva],
        roles: &[Role::Cliente],
    };
    pub const VALIDATE_BOOKING: Self = Self {
        permissions: &[Permission::ValidarReserva],
        roles: &[Role::Administrador],
    };
    pub const MANAGE_TRIP: Self = Self {
        permissions: &[Permission::GestionarViajes],
        roles: &[Role::Conductor],
    };
    /// Pickup is gated only by the assigned-driver check.
    pub const MARK_PICKUP: Self = Self {
        permissions: &[],
        roles: &[Role::Conductor],
    };
    pub const CANCEL_BOOKING: Self = Self {
        permissions: &[Permission::CancelarReserva],
        roles: &[],
    };
}

/// Check a user against a requirement. ADMINISTRADOR always passes.
pub fn authorize(user: &AuthenticatedUser, requirement: &Requirement) -> Result<(), CoreError> {
    if user.is_admin() {
        return Ok(());
    }

    if let Some(missing) = requirement
        .permissions
        .iter()
        .find(|p| !user.permissions.contains(*p))
    {
        return Err(CoreError::Forbidden(format!(
            "Missing required permission '{missing}'"
        )));
    }

    if let Some(role) = requirement.roles.iter().find(|r| **r != user.role) {
        return Err(CoreError::Forbidden(format!("Requires role {role}")));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Length of the plaintext session token (alphanumeric characters).
pub const SESSION_TOKEN_LENGTH: usize = 48;

/// A persisted session. `id` is the SHA-256 hex digest of the token handed
/// to the client; the plaintext is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub user_id: DbId,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// Session lifetime and renewal rules.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub lifetime: Duration,
    /// A session looked up with this much validity left (or less) is
    /// extended to a full lifetime.
    pub renewal_window: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            lifetime: Duration::days(30),
            renewal_window: Duration::days(15),
        }
    }
}

impl SessionPolicy {
    pub fn expiry_from(&self, now: Timestamp) -> Timestamp {
        now + self.lifetime
    }

    pub fn is_expired(&self, session: &Session, now: Timestamp) -> bool {
        session.expires_at <= now
    }

    pub fn needs_renewal(&self, session: &Session, now: Timestamp) -> bool {
        session.expires_at - now <= self.renewal_window
    }
}

/// A freshly issued session token.
pub struct IssuedToken {
    /// Returned to the client exactly once.
    pub plaintext: String,
    /// Stored as the session id.
    pub hash: String,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("plaintext", &"[redacted]")
            .field("hash", &self.hash)
            .finish()
    }
}

/// Generate a random session token and its storage hash.
pub fn generate_session_token() -> IssuedToken {
    let plaintext: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(SESSION_TOKEN_LENGTH)
        .map(char::from)
        .collect();
    let hash = hash_session_token(&plaintext);
    IssuedToken { plaintext, hash }
}

/// SHA-256 hex digest of a session token.
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
