//! # Cluster API resource views
//!
//! Partial typed views of the upstream Cluster API CRDs this operator
//! consumes. The operator never owns these kinds - it only reads them (and
//! patches finalizers on the owning resources) - so each view declares just
//! the fields the resolver needs and ignores the rest of the schema.
//!
//! - `capi`: the generic `Cluster` record (`cluster.x-k8s.io`)
//! - `capa`: the self-managed `AWSCluster` and the `AWSClusterRoleIdentity`
//!   (`infrastructure.cluster.x-k8s.io`)
//! - `eks`: the managed control plane `AWSManagedControlPlane`
//!   (`controlplane.cluster.x-k8s.io`)

pub mod capa;
pub mod capi;
pub mod eks;

pub use capa::{AWSCluster, AWSClusterRoleIdentity};
pub use capi::Cluster;
pub use eks::AWSManagedControlPlane;
