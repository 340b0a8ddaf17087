//! IO modules - external interfaces
//!
//! - `http` - tracking HTTP API (hyper)
//! - `prometheus` - Prometheus text rendering of metrics

pub mod http;
pub mod prometheus;

// Re-export commonly used types
pub use http::{serve, start_http_server, AppState};
