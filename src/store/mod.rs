//! # Object store
//!
//! Boundary between the reconciliation logic and the Kubernetes API.
//!
//! Everything the controller persists or reads goes through the
//! [`ObjectStore`] trait: typed operations for the kinds compiled into the
//! binary, and dynamic operations (keyed by [`GroupVersionKind`]) for the
//! Crossplane `ProviderConfig`, whose CRD may not be installed at all.
//!
//! Two implementations exist:
//! - [`kube::KubeStore`] backed by a real `kube::Client`
//! - [`memory::InMemoryStore`] used by the test suite
//!
//! Updates are submitted as JSON merge patches computed as the diff between
//! two explicit snapshots (see [`patch`]), so a patch never overwrites fields
//! the controller did not change.

pub mod kube;
pub mod memory;
pub mod patch;

use ::kube::core::{DynamicObject, GroupVersionKind};
use ::kube::Resource;
use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use self::kube::KubeStore;
pub use self::memory::InMemoryStore;

/// Error taxonomy of the store boundary.
///
/// `NotFound` and `AlreadyExists` are part of normal converge/teardown flow
/// and are handled (or swallowed) by the reconciler. `NoCapability` marks a
/// kind whose CRD is not registered with the API server - only ever expected
/// for the `ProviderConfig` kind. Everything else is `Transient` and is left
/// to the controller layer's requeue policy.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found")]
    NotFound,
    #[error("object already exists")]
    AlreadyExists,
    #[error("no resource registered for kind {0}")]
    NoCapability(String),
    #[error(transparent)]
    Transient(#[from] anyhow::Error),
}

/// Bounds shared by every typed kind the store can handle.
pub trait StoreObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + std::fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> StoreObject for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Get/create/patch/delete semantics against the backing store.
///
/// `patch_merge` takes the mutated object *and* the baseline snapshot it was
/// derived from; implementations must apply only the diff between the two,
/// never a full-object write, so concurrent changes to unrelated fields
/// survive.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<K, StoreError>;

    async fn create<K: StoreObject>(&self, object: &K) -> Result<(), StoreError>;

    async fn patch_merge<K: StoreObject>(&self, object: &K, baseline: &K)
        -> Result<(), StoreError>;

    async fn delete<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    async fn get_dynamic(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> Result<DynamicObject, StoreError>;

    async fn create_dynamic(
        &self,
        gvk: &GroupVersionKind,
        object: &DynamicObject,
    ) -> Result<(), StoreError>;

    async fn patch_merge_dynamic(
        &self,
        gvk: &GroupVersionKind,
        object: &DynamicObject,
        baseline: &DynamicObject,
    ) -> Result<(), StoreError>;

    async fn delete_dynamic(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), StoreError>;
}
