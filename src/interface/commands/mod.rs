//! # Command Handlers
//!
//! One handler per CLI subcommand (`call`, `models`, `tokens`).
//! Invoked from `main` after configuration and logging are set up.

pub mod call;
pub mod models;
pub mod tokens;
