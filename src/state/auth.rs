//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Holds the signed-in session and keeps it in step with the
//! [`SessionStore`] the API client reads its bearer token from. Every method
//! that changes the session writes it through to the store before returning.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::net::api::CarpoolApi;
use crate::net::error::ApiError;
use crate::net::session::{SessionStore, StoredSession};
use crate::net::types::{LoginRequest, LoginResponse, ProfileUpdate, RegisterOutcome, RegisterRequest, User};
use crate::util::validation::{validate_profile, validate_sign_in, validate_sign_up};

use super::StateError;

/// Authentication state tracking the current session and loading status.
#[derive(Clone, Debug, Default)]
pub struct AuthState {
    pub session: Option<StoredSession>,
    pub loading: bool,
}

/// Result of a successful registration.
#[derive(Clone, Debug, PartialEq)]
pub enum Registration {
    /// The backend issued tokens; the user is now signed in.
    SignedIn(User),
    /// The account exists but the user still has to sign in (e.g. after
    /// verifying their email).
    Created(User),
}

impl AuthState {
    /// Load the persisted session. Unreadable data is discarded and cleared.
    #[must_use]
    pub fn restore(store: &dyn SessionStore) -> Self {
        match store.load() {
            Ok(session) => Self { session, loading: false },
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable session");
                if let Err(e) = store.clear() {
                    tracing::error!(error = %e, "failed to clear unreadable session");
                }
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Sign in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Validation`] for malformed credentials,
    /// [`StateError::Api`] with the server message when sign-in is refused,
    /// or [`StateError::Session`] when the session cannot be persisted.
    pub async fn login(
        &mut self,
        api: &dyn CarpoolApi,
        store: &dyn SessionStore,
        credentials: &LoginRequest,
    ) -> Result<User, StateError> {
        validate_sign_in(&credentials.email, &credentials.password)?;

        self.loading = true;
        let result = api.login(credentials).await.into_result();
        self.loading = false;

        let login = result.map_err(|e| StateError::api(&e, "Login failed"))?;
        let user = self.sign_in(store, login)?;
        tracing::info!(user_id = user.id, "signed in");
        Ok(user)
    }

    /// Create an account. Signs the user in when the backend returns tokens.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Validation`] for an incomplete form,
    /// [`StateError::Api`] with the server message when registration fails,
    /// or [`StateError::Session`] when the session cannot be persisted.
    pub async fn register(
        &mut self,
        api: &dyn CarpoolApi,
        store: &dyn SessionStore,
        request: &RegisterRequest,
    ) -> Result<Registration, StateError> {
        validate_sign_up(request)?;

        self.loading = true;
        let result = api.register(request).await.into_result();
        self.loading = false;

        match result.map_err(|e| StateError::api(&e, "Registration failed"))? {
            RegisterOutcome::SignedIn(login) => {
                let user = self.sign_in(store, login)?;
                tracing::info!(user_id = user.id, "registered and signed in");
                Ok(Registration::SignedIn(user))
            }
            RegisterOutcome::Created(user) => {
                tracing::info!(user_id = user.id, "registered");
                Ok(Registration::Created(user))
            }
        }
    }

    /// Sign out. The backend is told when a user is present, but local state
    /// and the store are cleared whatever it answers.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Session`] when the stored session cannot be removed.
    pub async fn logout(&mut self, api: &dyn CarpoolApi, store: &dyn SessionStore) -> Result<(), StateError> {
        if let Some(session) = &self.session {
            let user_id = session.user.id;
            if let Err(e) = api.logout().await.into_ack() {
                tracing::warn!(user_id, error = %e, "logout call failed; clearing session anyway");
            }
            tracing::info!(user_id, "signed out");
        }
        self.session = None;
        store.clear()?;
        Ok(())
    }

    /// Exchange the refresh token for a new bearer token. Any failure signs
    /// the user out.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NoRefreshToken`] when the session has none, or
    /// [`StateError::Api`] when the backend refuses the refresh.
    pub async fn refresh_token(&mut self, api: &dyn CarpoolApi, store: &dyn SessionStore) -> Result<(), StateError> {
        let result = self.try_refresh(api, store).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "token refresh failed; signing out");
            self.logout(api, store).await?;
        }
        result
    }

    async fn try_refresh(&mut self, api: &dyn CarpoolApi, store: &dyn SessionStore) -> Result<(), StateError> {
        let Some(mut session) = self.session.clone() else {
            return Err(StateError::NoRefreshToken);
        };
        let Some(refresh) = session.refresh_token.clone() else {
            return Err(StateError::NoRefreshToken);
        };

        let login = api
            .refresh_token(&refresh)
            .await
            .into_result()
            .map_err(|e| StateError::api(&e, "Token refresh failed"))?;

        session.token = login.token;
        if login.refresh_token.is_some() {
            session.refresh_token = login.refresh_token;
        }
        store.save(&session)?;
        self.session = Some(session);
        Ok(())
    }

    /// Confirm an email address. Marks the current user verified, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Api`] when the token is rejected, or
    /// [`StateError::Session`] when the updated session cannot be persisted.
    pub async fn verify_email(
        &mut self,
        api: &dyn CarpoolApi,
        store: &dyn SessionStore,
        token: &str,
    ) -> Result<String, StateError> {
        let message = api
            .verify_email(token)
            .await
            .into_ack()
            .map_err(|e| StateError::api(&e, "Email verification failed"))?;

        if let Some(session) = &mut self.session {
            session.user.email_verified = true;
            store.save(session)?;
        }
        Ok(message)
    }

    /// Ask the backend to email a password-reset link.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Api`] when the request is refused.
    pub async fn forgot_password(&self, api: &dyn CarpoolApi, email: &str) -> Result<String, StateError> {
        api.forgot_password(email)
            .await
            .into_ack()
            .map_err(|e| StateError::api(&e, "Password reset request failed"))
    }

    /// Set a new password using the emailed reset token.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Api`] when the token or password is refused.
    pub async fn reset_password(
        &self,
        api: &dyn CarpoolApi,
        token: &str,
        new_password: &str,
    ) -> Result<String, StateError> {
        api.reset_password(token, new_password)
            .await
            .into_ack()
            .map_err(|e| StateError::api(&e, "Password reset failed"))
    }

    /// Merge a profile patch into the local user and persist it, without
    /// calling the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotSignedIn`] without a session, or
    /// [`StateError::Session`] when the session cannot be persisted.
    pub fn update_user(&mut self, store: &dyn SessionStore, update: &ProfileUpdate) -> Result<(), StateError> {
        let session = self.session.as_mut().ok_or(StateError::NotSignedIn)?;
        update.apply_to(&mut session.user);
        store.save(session)?;
        Ok(())
    }

    /// Save a profile edit on the backend, then locally. The server's copy of
    /// the user wins when it returns one.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Validation`] for invalid fields,
    /// [`StateError::NotSignedIn`] without a session, [`StateError::Api`]
    /// when the backend refuses the edit, or [`StateError::Session`] when the
    /// session cannot be persisted.
    pub async fn save_profile(
        &mut self,
        api: &dyn CarpoolApi,
        store: &dyn SessionStore,
        update: &ProfileUpdate,
    ) -> Result<User, StateError> {
        validate_profile(update)?;
        if self.session.is_none() {
            return Err(StateError::NotSignedIn);
        }

        let response = api.update_user_profile(update).await;
        if !response.success {
            return Err(StateError::api(&ApiError::Rejected(response.message), "Failed to update profile"));
        }

        let session = self.session.as_mut().ok_or(StateError::NotSignedIn)?;
        match response.data {
            Some(user) => session.user = user,
            None => update.apply_to(&mut session.user),
        }
        store.save(session)?;
        Ok(session.user.clone())
    }

    fn sign_in(&mut self, store: &dyn SessionStore, login: LoginResponse) -> Result<User, StateError> {
        let session = StoredSession { user: login.user, token: login.token, refresh_token: login.refresh_token };
        store.save(&session)?;
        let user = session.user.clone();
        self.session = Some(session);
        Ok(user)
    }
}
