//! Authentication service.
//!
//! Password accounts, bearer-token sessions and role changes. Accounts live in
//! `accounts/{email}`; the matching customer profile is created alongside.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::instrument;

use refill_core::{DeliveryAddress, Email, Role, Timestamp, UserId};

use crate::db::{AccountRepository, RepositoryError, SessionRepository, UserRepository};
use crate::models::{Account, CurrentUser, PersonalDetails, Session, UserProfile};
use crate::store::DocumentStore;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Random bytes in a session token.
const TOKEN_BYTES: usize = 32;

/// Sign-up form.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone_number: String,
    pub house_number: String,
    pub barangay: String,
}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct SignIn {
    /// Bearer token. Only its digest is stored.
    pub token: String,
    pub user: CurrentUser,
    pub expires_at: Timestamp,
}

/// Authentication service.
pub struct AuthService<'a> {
    accounts: AccountRepository<'a>,
    sessions: SessionRepository<'a>,
    users: UserRepository<'a>,
    session_ttl: Duration,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, session_ttl: Duration) -> Self {
        Self {
            accounts: AccountRepository::new(store),
            sessions: SessionRepository::new(store),
            users: UserRepository::new(store),
            session_ttl,
        }
    }

    /// Register a customer account and its initial profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword`,
    /// `AuthError::MissingField` or `AuthError::InvalidAddress` for bad input.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &Registration) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(&form.email)?;
        validate_password(&form.password)?;
        let name = required(&form.name, "name")?;
        let phone_number = required(&form.phone_number, "phone number")?;
        let address = DeliveryAddress::compose(&form.house_number, &form.barangay)?;

        let password_hash = hash_password(&form.password)?;
        let now = Timestamp::now();
        let user_id = UserId::generate();

        let account = Account {
            user_id: user_id.clone(),
            email: email.clone(),
            password_hash,
            role: Role::Customer,
            created_at: now,
        };
        self.accounts.create(&account).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        let profile = UserProfile::new(
            PersonalDetails {
                name,
                phone_number,
                email: email.clone(),
                address,
            },
            now,
        );
        if let Err(e) = self.users.create(&user_id, &profile).await {
            // Free the email again so the customer can retry.
            if let Err(cleanup) = self.accounts.delete(&email).await {
                tracing::error!(error = %cleanup, email = %email, "Failed to remove orphaned account");
            }
            return Err(e.into());
        }

        tracing::info!(user_id = %user_id, "Customer registered");
        Ok(CurrentUser {
            user_id,
            email,
            role: Role::Customer,
        })
    }

    /// Check a password and open a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong
    /// and `AuthError::SessionExpiry` if the session lifetime overflows.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SignIn, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let account = self
            .accounts
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &account.password_hash)?;

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.session_ttl)
            .ok_or(AuthError::SessionExpiry)?;

        let token = generate_token();
        let session = Session {
            user_id: account.user_id.clone(),
            email: account.email.clone(),
            created_at: now.into(),
            expires_at: expires_at.into(),
        };
        self.sessions.create(&token_digest(&token), &session).await?;

        Ok(SignIn {
            token,
            expires_at: session.expires_at,
            user: CurrentUser {
                user_id: account.user_id,
                email: account.email,
                role: account.role,
            },
        })
    }

    /// End a session. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the delete fails.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete(&token_digest(token)).await?;
        Ok(())
    }

    /// Resolve a bearer token to the signed-in user.
    ///
    /// The role is read from the account on every call so promotions apply to
    /// existing sessions. Expired sessions are deleted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidSession` if the token is unknown or expired.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let digest = token_digest(token);
        let session = self
            .sessions
            .get(&digest)
            .await?
            .ok_or(AuthError::InvalidSession)?;

        if session.is_expired(Timestamp::now()) {
            self.sessions.delete(&digest).await?;
            return Err(AuthError::InvalidSession);
        }

        let account = self
            .accounts
            .get_by_email(&session.email)
            .await?
            .ok_or(AuthError::InvalidSession)?;

        Ok(CurrentUser {
            user_id: account.user_id,
            email: account.email,
            role: account.role,
        })
    }

    /// Grant the admin role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if nobody registered this email.
    #[instrument(skip(self))]
    pub async fn promote(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        self.accounts
            .set_role(&email, Role::Admin)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::AccountNotFound,
                other => AuthError::Repository(other),
            })?;
        tracing::info!(email = %email, "Account promoted to admin");
        Ok(())
    }
}

fn required(value: &str, field: &'static str) -> Result<String, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(value.to_owned())
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// A random URL-safe bearer token.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Storage key for a token.
fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
