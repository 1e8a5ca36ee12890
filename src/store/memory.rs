//! In-memory object store used by the test suite.
//!
//! Objects are kept as serialized JSON documents keyed by kind, namespace and
//! name. Merge patches are applied to the *stored* document, not to the
//! snapshot the caller patched against, so tests can verify that patches do
//! not clobber concurrently-modified fields. Dynamic kinds must be registered
//! up front; unregistered kinds report `NoCapability`, mirroring a cluster
//! without the ProviderConfig CRD installed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use kube::core::{DynamicObject, GroupVersionKind};
use kube::{Resource, ResourceExt};
use serde_json::Value;

use super::patch::{apply_patch, merge_patch};
use super::{ObjectStore, StoreError, StoreObject};

type ObjectKey = (String, String, String);

fn type_key<K: StoreObject>() -> String {
    format!("{}/{}", K::api_version(&()), K::kind(&()))
}

fn gvk_key(gvk: &GroupVersionKind) -> String {
    if gvk.group.is_empty() {
        format!("{}/{}", gvk.version, gvk.kind)
    } else {
        format!("{}/{}/{}", gvk.group, gvk.version, gvk.kind)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: Mutex<BTreeMap<ObjectKey, Value>>,
    dynamic_kinds: Mutex<BTreeSet<String>>,
    actions: Mutex<Vec<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a dynamic kind known to the store. Dynamic operations against
    /// unregistered kinds fail with `NoCapability`.
    pub fn register_kind(&self, gvk: &GroupVersionKind) {
        self.dynamic_kinds
            .lock()
            .expect("lock poisoned")
            .insert(gvk_key(gvk));
    }

    /// Seeds (or overwrites) an object without recording an action. Tests use
    /// this for fixtures and to simulate modifications made by other actors.
    pub fn put<K: StoreObject>(&self, object: &K) {
        let key = (
            type_key::<K>(),
            object.namespace().unwrap_or_default(),
            object.name_any(),
        );
        let value = serde_json::to_value(object).expect("object serializes");
        self.objects.lock().expect("lock poisoned").insert(key, value);
    }

    /// Every create/patch/delete performed through the trait, in order.
    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().expect("lock poisoned").clone()
    }

    fn record(&self, action: String) {
        self.actions.lock().expect("lock poisoned").push(action);
    }

    fn lookup(&self, key: &ObjectKey) -> Option<Value> {
        self.objects.lock().expect("lock poisoned").get(key).cloned()
    }

    fn check_registered(&self, gvk: &GroupVersionKind) -> Result<(), StoreError> {
        if self
            .dynamic_kinds
            .lock()
            .expect("lock poisoned")
            .contains(&gvk_key(gvk))
        {
            Ok(())
        } else {
            Err(StoreError::NoCapability(gvk.kind.clone()))
        }
    }

    fn insert_new(&self, key: ObjectKey, value: Value) -> Result<(), StoreError> {
        let mut objects = self.objects.lock().expect("lock poisoned");
        if objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists);
        }
        objects.insert(key, value);
        Ok(())
    }

    fn patch_stored(&self, key: &ObjectKey, patch: &Value) -> Result<(), StoreError> {
        let mut objects = self.objects.lock().expect("lock poisoned");
        let stored = objects.get(key).ok_or(StoreError::NotFound)?;
        let patched = apply_patch(stored, patch);
        objects.insert(key.clone(), patched);
        Ok(())
    }

    fn remove(&self, key: &ObjectKey) -> Result<(), StoreError> {
        self.objects
            .lock()
            .expect("lock poisoned")
            .remove(key)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<K, StoreError> {
        let key = (type_key::<K>(), namespace.to_string(), name.to_string());
        let value = self.lookup(&key).ok_or(StoreError::NotFound)?;
        serde_json::from_value(value).map_err(|err| StoreError::Transient(anyhow!(err)))
    }

    async fn create<K: StoreObject>(&self, object: &K) -> Result<(), StoreError> {
        let key = (
            type_key::<K>(),
            object.namespace().unwrap_or_default(),
            object.name_any(),
        );
        let value = serde_json::to_value(object).map_err(anyhow::Error::new)?;
        self.insert_new(key, value)?;
        self.record(format!(
            "create {} {}/{}",
            K::kind(&()),
            object.namespace().unwrap_or_default(),
            object.name_any()
        ));
        Ok(())
    }

    async fn patch_merge<K: StoreObject>(
        &self,
        object: &K,
        baseline: &K,
    ) -> Result<(), StoreError> {
        let key = (
            type_key::<K>(),
            object.namespace().unwrap_or_default(),
            object.name_any(),
        );
        let base = serde_json::to_value(baseline).map_err(anyhow::Error::new)?;
        let target = serde_json::to_value(object).map_err(anyhow::Error::new)?;
        self.patch_stored(&key, &merge_patch(&base, &target))?;
        self.record(format!(
            "patch {} {}/{}",
            K::kind(&()),
            object.namespace().unwrap_or_default(),
            object.name_any()
        ));
        Ok(())
    }

    async fn delete<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let key = (type_key::<K>(), namespace.to_string(), name.to_string());
        self.remove(&key)?;
        self.record(format!("delete {} {namespace}/{name}", K::kind(&())));
        Ok(())
    }

    async fn get_dynamic(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> Result<DynamicObject, StoreError> {
        self.check_registered(gvk)?;
        let key = (gvk_key(gvk), namespace.to_string(), name.to_string());
        let value = self.lookup(&key).ok_or(StoreError::NotFound)?;
        serde_json::from_value(value).map_err(|err| StoreError::Transient(anyhow!(err)))
    }

    async fn create_dynamic(
        &self,
        gvk: &GroupVersionKind,
        object: &DynamicObject,
    ) -> Result<(), StoreError> {
        self.check_registered(gvk)?;
        let key = (
            gvk_key(gvk),
            object.namespace().unwrap_or_default(),
            object.name_any(),
        );
        let value = serde_json::to_value(object).map_err(anyhow::Error::new)?;
        self.insert_new(key, value)?;
        self.record(format!(
            "create {} {}/{}",
            gvk.kind,
            object.namespace().unwrap_or_default(),
            object.name_any()
        ));
        Ok(())
    }

    async fn patch_merge_dynamic(
        &self,
        gvk: &GroupVersionKind,
        object: &DynamicObject,
        baseline: &DynamicObject,
    ) -> Result<(), StoreError> {
        self.check_registered(gvk)?;
        let key = (
            gvk_key(gvk),
            object.namespace().unwrap_or_default(),
            object.name_any(),
        );
        let base = serde_json::to_value(baseline).map_err(anyhow::Error::new)?;
        let target = serde_json::to_value(object).map_err(anyhow::Error::new)?;
        self.patch_stored(&key, &merge_patch(&base, &target))?;
        self.record(format!(
            "patch {} {}/{}",
            gvk.kind,
            object.namespace().unwrap_or_default(),
            object.name_any()
        ));
        Ok(())
    }

    async fn delete_dynamic(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), StoreError> {
        self.check_registered(gvk)?;
        let key = (gvk_key(gvk), namespace.to_string(), name.to_string());
        self.remove(&key)?;
        self.record(format!("delete {} {namespace}/{name}", gvk.kind));
        Ok(())
    }
}
