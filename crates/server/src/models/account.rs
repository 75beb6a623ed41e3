//! Credentials and sessions.

use serde::{Deserialize, Serialize};

use refill_core::{Email, Role, Timestamp, UserId};

/// Login credentials (`accounts/{email}`).
///
/// Keyed by the normalised email so that creating an account is also the
/// uniqueness check.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: UserId,
    pub email: Email,
    /// Argon2id PHC string.
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: Timestamp,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// A sign-in session (`sessions/{sha256(token)}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub email: Email,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// The authenticated caller, resolved per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub email: Email,
    pub role: Role,
}

impl CurrentUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
