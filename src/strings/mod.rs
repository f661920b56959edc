//! # Strings Module
//!
//! Centralizes user-facing strings so output stays consistent across commands.

pub mod messages;
