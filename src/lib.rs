//! Crossplane Config Operator Library
//!
//! This library provides the core functionality for the Crossplane Config
//! Operator: it watches Cluster API `Cluster` resources and keeps two derived
//! artifacts in sync with each cluster's lifecycle:
//!
//! - a ConfigMap (`<cluster>-crossplane-config`) holding a YAML `values`
//!   document consumed by Crossplane compositions
//! - a Crossplane AWS `ProviderConfig` (`aws.upbound.io/v1beta1`) carrying the
//!   WebIdentity credential chain for the cluster's AWS account
//!
//! Tests for the pure logic live in the module files; the reconciliation flow
//! is covered by the integration suite under `tests/`, which drives the
//! reconciler against an in-memory object store.

pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod server;
pub mod store;
