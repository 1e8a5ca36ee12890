//! # Observability
//!
//! Observability modules for metrics collection.
//!
//! - `metrics`: Prometheus metrics collection

pub mod metrics;

pub use metrics::*;
