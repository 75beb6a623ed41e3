//! Admin user management.
//!
//! Admins register through the API like any customer and are promoted here.
//!
//! # Usage
//!
//! ```bash
//! refill-cli admin promote -e owner@refill.ph
//! ```

use refill_server::config::RefillConfig;
use refill_server::services::{AuthError, AuthService};
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("No account registered with email: {0}")]
    AccountNotFound(String),

    #[error("Could not promote account: {0}")]
    Auth(#[from] AuthError),
}

/// Give the account registered under `email` the admin role.
///
/// # Errors
///
/// Returns `AdminError::AccountNotFound` if nobody registered with that email.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    let store = connect().await?;
    let auth = AuthService::new(&store, RefillConfig::default().session_ttl());

    match auth.promote(email).await {
        Ok(()) => {
            tracing::info!("Account {} is now an admin", email);
            Ok(())
        }
        Err(AuthError::AccountNotFound) => Err(AdminError::AccountNotFound(email.to_owned())),
        Err(e) => Err(e.into()),
    }
}
