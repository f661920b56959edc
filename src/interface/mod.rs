//! # Interface Layer
//!
//! Command-line surface of the application.

pub mod commands;
