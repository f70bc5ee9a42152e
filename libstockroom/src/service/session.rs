//! Session (authentication) actions
//!
//! These actions trigger backend auth changes but never set the current user
//! themselves; the session subscription owned by the facade is the sole
//! writer of `SetUser`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::AuthBackend;
use crate::error::{AuthError, Result};
use crate::store::{Store, Transition};

#[derive(Clone)]
pub struct SessionService {
    store: Store,
    auth: Arc<dyn AuthBackend>,
}

impl SessionService {
    pub fn new(store: Store, auth: Arc<dyn AuthBackend>) -> Self {
        Self { store, auth }
    }

    /// Sign in with email and password.
    ///
    /// On failure the mapped message is stored in the error slot and the
    /// error is returned, so callers can skip forward navigation.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        self.run(
            self.auth.sign_in(email, password),
            "sign-in",
            sign_in_message,
        )
        .await
    }

    /// Register a new account.
    pub async fn register(&self, email: &str, password: &str) -> Result<()> {
        self.run(
            self.auth.create_account(email, password),
            "registration",
            register_message,
        )
        .await
    }

    /// End the current session. The session subscription observes the change
    /// and clears the user plus the in-memory lists.
    pub async fn sign_out(&self) -> Result<()> {
        self.run(self.auth.sign_out(), "sign-out", sign_out_message)
            .await
    }

    /// Ask the backend to send a password-reset email.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        self.run(
            self.auth.send_password_reset(email),
            "password reset",
            password_reset_message,
        )
        .await
    }

    async fn run<F>(
        &self,
        call: F,
        operation: &str,
        message: fn(&AuthError) -> String,
    ) -> Result<()>
    where
        F: std::future::Future<Output = std::result::Result<(), AuthError>>,
    {
        self.store.dispatch(Transition::SetLoading(true));
        self.store.dispatch(Transition::ClearError);

        let result = call.await;
        self.store.dispatch(Transition::SetLoading(false));

        match result {
            Ok(()) => {
                debug!(operation, "auth call succeeded");
                Ok(())
            }
            Err(err) => {
                warn!(operation, error = %err, "auth call failed");
                self.store
                    .dispatch(Transition::SetError(Some(message(&err))));
                Err(err.into())
            }
        }
    }
}

fn sign_in_message(error: &AuthError) -> String {
    match error {
        AuthError::UserNotFound => "No account exists with this email".to_string(),
        AuthError::InvalidCredentials => "Incorrect password".to_string(),
        AuthError::InvalidEmail => "The email address is not valid".to_string(),
        AuthError::RateLimited => "Too many failed attempts. Try again later".to_string(),
        other => other.to_string(),
    }
}

fn register_message(error: &AuthError) -> String {
    match error {
        AuthError::EmailInUse => "This email is already registered".to_string(),
        AuthError::InvalidEmail => "The email address is not valid".to_string(),
        AuthError::WeakPassword => "The password is too weak".to_string(),
        other => other.to_string(),
    }
}

fn sign_out_message(_error: &AuthError) -> String {
    "Failed to sign out".to_string()
}

fn password_reset_message(error: &AuthError) -> String {
    match error {
        AuthError::UserNotFound => "No account exists with this email".to_string(),
        AuthError::InvalidEmail => "The email address is not valid".to_string(),
        AuthError::RateLimited => "Too many requests. Try again later".to_string(),
        other => other.to_string(),
    }
}
