//! Infrastructure - configuration, metrics and stores
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, defaults)
//! - `metrics` - Lock-free metrics collection
//! - `checkpoint_store` / `unit_store` - Store abstractions and in-memory backends

pub mod checkpoint_store;
pub mod config;
pub mod metrics;
pub mod store_error;
pub mod unit_store;

// Re-export commonly used types
pub use checkpoint_store::{CheckpointStore, InMemoryCheckpointStore};
pub use config::Config;
pub use metrics::Metrics;
pub use store_error::{StoreError, StoreResult};
pub use unit_store::{InMemoryUnitStore, UnitStore};
