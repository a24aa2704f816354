//! HTTP front end of the allow-list service
//!
//! This module provides:
//! - Axum-based web server with routing
//! - Validation of allow-list submissions
//! - Plain-text responses for every outcome and rejection
//! - Graceful shutdown handling
//!
//! The server exposes the following endpoints:
//! - POST /ali/add - Allow-list an IP on an Alibaba Cloud SWAS instance
//! - GET / - Static greeting (any other unknown path answers the same)
//! - GET /metrics - Prometheus metrics (when enabled)

pub mod handlers;
pub mod responses;
pub mod server;
pub mod validator;

pub use server::start_server;
