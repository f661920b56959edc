//! # Application Layer
//!
//! Core orchestration: the fallback dispatcher and the call context it runs in.

pub mod dispatcher;
