//! Networking modules for the carpool REST backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` issues the HTTP calls, `envelope` folds every backend reply into one
//! `{success, data, message}` shape, `session` persists the bearer token
//! between runs, and `types` defines the wire schema.

pub mod api;
pub mod envelope;
pub mod error;
pub mod session;
pub mod types;
