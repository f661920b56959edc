//! # Domain Layer
//!
//! Core definitions, types, and traits shared by every other layer.
//! Independent of specific providers, serving as the contract for the Infrastructure layer.

pub mod config;
pub mod traits;
pub mod types;
