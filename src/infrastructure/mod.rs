//! Infrastructure layer modules
//!
//! This module contains shared infrastructure components:
//! - `auth`: Google credentials and the process-wide Firebase app context
//! - `config`: Application configuration and settings
//! - `error`: HTTP-facing error type
//! - `http`: Shared outbound HTTP client
//! - `metrics`: Prometheus metrics helpers

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
