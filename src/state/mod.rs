//! Client-side state stores driven by the API client.
//!
//! SYSTEM CONTEXT
//! ==============
//! Stores are plain structs mutated through `&mut self` by async operations
//! that take the API and session store as arguments. Each mutation issues at
//! most one mutating call and applies the change locally on success; nothing
//! is re-fetched to confirm it.

pub mod actions;
pub mod auth;
pub mod dashboard;
pub mod stats;

#[cfg(test)]
pub(crate) mod mock_api;

use crate::net::error::ApiError;
use crate::net::session::SessionError;
use crate::net::types::{BookingStatus, RideStatus};
use crate::util::validation::FieldErrors;

/// Errors surfaced by state-store operations. `Display` is the banner text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("booking {id} cannot move from {from} to {to}")]
    InvalidBookingTransition { id: i64, from: BookingStatus, to: BookingStatus },

    #[error("ride {id} cannot move from {from} to {to}")]
    InvalidRideTransition { id: i64, from: RideStatus, to: RideStatus },

    #[error("ride {0} has already departed")]
    RideDeparted(i64),

    #[error("booking {0} not found")]
    BookingNotFound(i64),

    #[error("ride {0} not found")]
    RideNotFound(i64),

    #[error("not signed in")]
    NotSignedIn,

    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("{0}")]
    Validation(FieldErrors),

    /// Server or transport message, already resolved against a fallback.
    #[error("{0}")]
    Api(String),

    #[error("session storage failed: {0}")]
    Session(String),
}

impl StateError {
    /// Map an API failure to its banner text, using `fallback` when the
    /// backend gave no usable message.
    pub(crate) fn api(err: &ApiError, fallback: &str) -> Self {
        Self::Api(err.user_message(fallback))
    }
}

impl From<SessionError> for StateError {
    fn from(err: SessionError) -> Self {
        Self::Session(err.to_string())
    }
}

impl From<FieldErrors> for StateError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}
