//! # carpool
//!
//! Typed client for the carpool ride-sharing REST backend.
//!
//! This crate contains the HTTP API client, wire types, session persistence
//! and the client-side state stores (auth and dashboard) that the
//! command-line front end in `cli/` drives.

pub mod config;
pub mod net;
pub mod state;
pub mod util;
