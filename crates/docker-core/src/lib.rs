//! # docker-core
//!
//! Core types and utilities for talking to the Docker Engine API.
//!
//! This crate provides the shared error type, client configuration and the HTTP
//! transport used by the API-specific client crates.
//!
//! ## Modules
//!
//! - [`error`] - Error type and HTTP status code mapping
//! - [`config`] - Validated endpoint configuration
//! - [`client`] - HTTP client tuning (timeouts, pooling)
//! - [`context`] - Per-request cancellation and deadlines
//! - [`query`] - Query string builder
//! - [`transport`] - The request executor shared by API clients

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod query;
pub mod transport;

// Re-export commonly used types
pub use context::RequestContext;
pub use error::{Error, Result};
pub use transport::{DoOptions, HttpTransport, HttpTransportBuilder, Response, Transport};
