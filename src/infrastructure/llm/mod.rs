//! # LLM
//!
//! Provider adapters behind the `ModelAdapter` contract, plus the offline
//! token estimator used by providers that have no counting endpoint.

pub mod providers;
pub mod tokens;

pub use providers::{build_adapter, list_models};
