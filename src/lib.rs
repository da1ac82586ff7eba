//! httpx-exec: outbound HTTP execution layer
//!
//! A library for issuing outbound HTTP requests with pluggable transports,
//! retry policies, access control and sanitized request/response traces.

pub mod config;
pub mod outbound;
pub mod time;
