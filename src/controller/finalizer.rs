//! Finalizer lifecycle guard.
//!
//! Earlier releases registered the finalizer on the `AWSCluster`
//! infrastructure object; the reconciler now guards the generic `Cluster`
//! record and removes the legacy registration during teardown. Both helpers
//! are idempotent and patch only when the set actually changes.

use kube::ResourceExt;

use crate::constants::FINALIZER;
use crate::store::{ObjectStore, StoreError, StoreObject};

/// Adds the finalizer to the object if it is not present yet.
pub async fn ensure_present<S: ObjectStore, K: StoreObject>(
    store: &S,
    object: &K,
) -> Result<(), StoreError> {
    if object.finalizers().iter().any(|f| f == FINALIZER) {
        return Ok(());
    }
    let mut updated = object.clone();
    updated.finalizers_mut().push(FINALIZER.to_string());
    store.patch_merge(&updated, object).await
}

/// Removes the finalizer from the object if it is present.
pub async fn ensure_absent<S: ObjectStore, K: StoreObject>(
    store: &S,
    object: &K,
) -> Result<(), StoreError> {
    if !object.finalizers().iter().any(|f| f == FINALIZER) {
        return Ok(());
    }
    let mut updated = object.clone();
    updated.finalizers_mut().retain(|f| f != FINALIZER);
    store.patch_merge(&updated, object).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::capi::ClusterSpec;
    use crate::crd::Cluster;
    use crate::store::InMemoryStore;

    fn cluster(finalizers: Vec<String>) -> Cluster {
        let mut cluster = Cluster::new("demo", ClusterSpec::default());
        cluster.metadata.namespace = Some("org-acme".to_string());
        if !finalizers.is_empty() {
            cluster.metadata.finalizers = Some(finalizers);
        }
        cluster
    }

    #[tokio::test]
    async fn test_ensure_present_adds_once() {
        let store = InMemoryStore::new();
        let object = cluster(vec![]);
        store.put(&object);

        ensure_present(&store, &object).await.expect("patch works");

        let stored: Cluster = store.get("org-acme", "demo").await.expect("exists");
        assert_eq!(stored.finalizers(), [FINALIZER]);

        // A second call against the updated object patches nothing.
        ensure_present(&store, &stored).await.expect("no-op works");
        assert_eq!(store.actions().len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_absent_preserves_other_finalizers() {
        let store = InMemoryStore::new();
        let object = cluster(vec!["other.io/guard".to_string(), FINALIZER.to_string()]);
        store.put(&object);

        ensure_absent(&store, &object).await.expect("patch works");

        let stored: Cluster = store.get("org-acme", "demo").await.expect("exists");
        assert_eq!(stored.finalizers(), ["other.io/guard"]);
    }

    #[tokio::test]
    async fn test_ensure_absent_without_finalizer_is_noop() {
        let store = InMemoryStore::new();
        let object = cluster(vec![]);
        store.put(&object);

        ensure_absent(&store, &object).await.expect("no-op works");
        assert!(store.actions().is_empty());
    }
}
