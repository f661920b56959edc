//! # Infrastructure Layer
//!
//! Handles interactions with external systems: provider HTTP APIs, the cache
//! file and the call log. Implements the traits defined in the Domain layer.

pub mod cache;
pub mod llm;
pub mod logging;
