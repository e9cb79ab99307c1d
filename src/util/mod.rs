//! Pure helpers shared by the state stores and the CLI.

pub mod contact;
pub mod validation;
