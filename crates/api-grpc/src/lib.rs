//! # API gRPC
//!
//! gRPC server implementation for the triage service.
//!
//! Handles:
//! - gRPC service setup and API key authentication
//! - Service implementations using `triage-core` for scoring, submissions and history
//! - gRPC-specific concerns (interceptors, server streaming, tonic integration)
//!
//! Uses `api-shared` for common types and utilities.

#![warn(rust_2018_idioms)]

pub use service::{auth_interceptor, pb, TriageGrpc};

pub mod service;
