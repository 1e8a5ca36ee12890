//! Kubernetes-backed object store.

use anyhow::anyhow;
use async_trait::async_trait;
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::core::{DynamicObject, GroupVersionKind};
use kube::{discovery, Api, Client, ResourceExt};

use super::patch::merge_patch;
use super::{ObjectStore, StoreError, StoreObject};

/// Maps a `kube::Error` onto the store taxonomy. Conflicts on patch stay
/// transient: the next pass recomputes the desired state from scratch.
fn classify(err: kube::Error) -> StoreError {
    match err {
        kube::Error::Api(response) if response.code == 404 => StoreError::NotFound,
        kube::Error::Api(response) if response.reason == "AlreadyExists" => {
            StoreError::AlreadyExists
        }
        other => StoreError::Transient(anyhow::Error::new(other)),
    }
}

/// `ObjectStore` implementation backed by a real cluster connection.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K: StoreObject>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Resolves the dynamic kind through API discovery. A kind the server
    /// does not know about surfaces as `NoCapability`, which the reconciler
    /// treats as "integration not installed".
    async fn dynamic_api(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
    ) -> Result<Api<DynamicObject>, StoreError> {
        let (resource, _capabilities) = discovery::pinned_kind(&self.client, gvk)
            .await
            .map_err(|err| match err {
                kube::Error::Discovery(_) => StoreError::NoCapability(gvk.kind.clone()),
                kube::Error::Api(response) if response.code == 404 => {
                    StoreError::NoCapability(gvk.kind.clone())
                }
                other => classify(other),
            })?;
        Ok(Api::namespaced_with(
            self.client.clone(),
            namespace,
            &resource,
        ))
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<K, StoreError> {
        self.api::<K>(namespace).get(name).await.map_err(classify)
    }

    async fn create<K: StoreObject>(&self, object: &K) -> Result<(), StoreError> {
        let namespace = object
            .namespace()
            .ok_or_else(|| StoreError::Transient(anyhow!("object has no namespace")))?;
        self.api::<K>(&namespace)
            .create(&PostParams::default(), object)
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn patch_merge<K: StoreObject>(
        &self,
        object: &K,
        baseline: &K,
    ) -> Result<(), StoreError> {
        let name = object.name_any();
        let namespace = object.namespace().unwrap_or_default();
        let base = serde_json::to_value(baseline).map_err(anyhow::Error::new)?;
        let target = serde_json::to_value(object).map_err(anyhow::Error::new)?;
        let patch = merge_patch(&base, &target);
        self.api::<K>(&namespace)
            .patch(&name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn delete<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.api::<K>(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn get_dynamic(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> Result<DynamicObject, StoreError> {
        self.dynamic_api(gvk, namespace)
            .await?
            .get(name)
            .await
            .map_err(classify)
    }

    async fn create_dynamic(
        &self,
        gvk: &GroupVersionKind,
        object: &DynamicObject,
    ) -> Result<(), StoreError> {
        let namespace = object
            .namespace()
            .ok_or_else(|| StoreError::Transient(anyhow!("object has no namespace")))?;
        self.dynamic_api(gvk, &namespace)
            .await?
            .create(&PostParams::default(), object)
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn patch_merge_dynamic(
        &self,
        gvk: &GroupVersionKind,
        object: &DynamicObject,
        baseline: &DynamicObject,
    ) -> Result<(), StoreError> {
        let name = object.name_any();
        let namespace = object.namespace().unwrap_or_default();
        let base = serde_json::to_value(baseline).map_err(anyhow::Error::new)?;
        let target = serde_json::to_value(object).map_err(anyhow::Error::new)?;
        let patch = merge_patch(&base, &target);
        self.dynamic_api(gvk, &namespace)
            .await?
            .patch(&name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn delete_dynamic(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), StoreError> {
        self.dynamic_api(gvk, namespace)
            .await?
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(classify)
    }
}
