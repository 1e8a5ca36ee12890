//! # Controller
//!
//! Core reconciliation logic for Cluster API `Cluster` resources.
//!
//! - `cluster_info`: normalizes the three upstream cluster representations
//!   into one canonical descriptor
//! - `identity`: resolves and parses the cluster's AWS role ARN
//! - `values`: builds the Crossplane configuration values document
//! - `provider_config`: builds the Crossplane AWS `ProviderConfig`
//! - `finalizer`: lifecycle guard on the owning resources
//! - `reconcile`: the reconciliation driver and controller wiring

pub mod cluster_info;
pub mod error;
pub mod finalizer;
pub mod identity;
pub mod provider_config;
pub mod reconcile;
pub mod values;

pub use error::ControllerError;
pub use reconcile::{error_policy, reconcile, ConfigMapReconciler, OperatorConfig};
