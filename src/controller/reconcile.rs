//! Reconciliation driver.
//!
//! A pass converges both derived artifacts for a cluster, or tears them down
//! when the cluster is being deleted. Every pass recomputes the desired state
//! from scratch; nothing is cached between passes, so a crash mid-pass is
//! repaired by the next one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use k8s_openapi::api::core::v1::ConfigMap;
use kube::runtime::controller::Action;
use kube::ResourceExt;
use tracing::{debug, error, info};

use crate::constants::{DEFAULT_ERROR_REQUEUE_SECS, DEFAULT_RESYNC_SECS};
use crate::crd::{AWSCluster, Cluster};
use crate::observability::metrics;
use crate::store::{KubeStore, ObjectStore, StoreError};

use super::cluster_info::{self, ClusterInfo};
use super::error::ControllerError;
use super::finalizer;
use super::identity::{self, RoleArn};
use super::provider_config;
use super::values::{self, config_map_name};

/// Operator-level settings shared by every pass.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Base domain of the management cluster installation.
    pub base_domain: String,
    /// Role Crossplane authenticates with via web identity.
    pub web_identity_role_name: String,
    /// Role Crossplane assumes in the workload account.
    pub assumed_role_name: String,
}

/// Reconciles a single cluster into its derived ConfigMap and ProviderConfig.
#[derive(Debug)]
pub struct ConfigMapReconciler<S> {
    store: S,
    config: OperatorConfig,
}

impl<S: ObjectStore> ConfigMapReconciler<S> {
    pub fn new(store: S, config: OperatorConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one reconciliation pass for the named cluster.
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<(), ControllerError> {
        let cluster: Cluster = match self.store.get(namespace, name).await {
            Ok(cluster) => cluster,
            Err(StoreError::NotFound) => {
                debug!(namespace, name, "cluster is gone, nothing to do");
                return Ok(());
            }
            Err(err) => return Err(ControllerError::store("get cluster")(err)),
        };

        if cluster.metadata.deletion_timestamp.is_some() {
            self.reconcile_delete(&cluster).await
        } else {
            self.reconcile_normal(&cluster).await
        }
    }

    async fn reconcile_normal(&self, cluster: &Cluster) -> Result<(), ControllerError> {
        // The guard goes on before any artifact exists, so teardown always
        // gets a chance to run.
        finalizer::ensure_present(&self.store, cluster)
            .await
            .map_err(ControllerError::store("add finalizer"))?;

        let info = cluster_info::resolve(&self.store, &self.config.base_domain, cluster).await?;
        let role =
            identity::resolve_role_arn(&self.store, &info.namespace, &info.identity_ref_name)
                .await?;

        self.reconcile_config_map(&info, &role).await?;
        self.reconcile_provider_config(&info, &role).await?;

        info!(
            namespace = info.namespace,
            cluster = info.name,
            "reconciled cluster config"
        );
        Ok(())
    }

    async fn reconcile_config_map(
        &self,
        info: &ClusterInfo,
        role: &RoleArn,
    ) -> Result<(), ControllerError> {
        let desired_values = values::build_values(info, &role.account_id, &self.config.base_domain);
        let desired = values::desired_config_map(&info.namespace, &info.name, &desired_values)?;

        match self
            .store
            .get(&info.namespace, &config_map_name(&info.name))
            .await
        {
            Ok(existing) => {
                let mut updated: ConfigMap = existing;
                let baseline = updated.clone();
                updated.data = desired.data;
                if updated == baseline {
                    return Ok(());
                }
                self.store
                    .patch_merge(&updated, &baseline)
                    .await
                    .map_err(ControllerError::store("update config map"))
            }
            Err(StoreError::NotFound) => match self.store.create(&desired).await {
                // A concurrent create loses the race; the next pass converges.
                Ok(()) | Err(StoreError::AlreadyExists) => Ok(()),
                Err(err) => Err(ControllerError::store("create config map")(err)),
            },
            Err(err) => Err(ControllerError::store("get config map")(err)),
        }
    }

    async fn reconcile_provider_config(
        &self,
        info: &ClusterInfo,
        role: &RoleArn,
    ) -> Result<(), ControllerError> {
        let gvk = provider_config::gvk();
        let spec = provider_config::build_spec(
            &role.account_id,
            &info.region,
            &self.config.web_identity_role_name,
            &self.config.assumed_role_name,
        );

        match self
            .store
            .get_dynamic(&gvk, &info.namespace, &info.name)
            .await
        {
            Ok(existing) => {
                let baseline = existing.clone();
                let mut updated = existing;
                updated.data["spec"] = spec;
                if updated.data == baseline.data {
                    return Ok(());
                }
                self.store
                    .patch_merge_dynamic(&gvk, &updated, &baseline)
                    .await
                    .map_err(ControllerError::store("update provider config"))
            }
            Err(StoreError::NotFound) => {
                let desired = provider_config::desired_object(&info.namespace, &info.name, spec);
                match self.store.create_dynamic(&gvk, &desired).await {
                    Ok(()) | Err(StoreError::AlreadyExists) => Ok(()),
                    Err(err) => Err(ControllerError::store("create provider config")(err)),
                }
            }
            Err(StoreError::NoCapability(kind)) => {
                info!(
                    cluster = info.name,
                    kind, "kind not installed, skipping provider config"
                );
                metrics::increment_provider_config_skips();
                Ok(())
            }
            Err(err) => Err(ControllerError::store("get provider config")(err)),
        }
    }

    async fn reconcile_delete(&self, cluster: &Cluster) -> Result<(), ControllerError> {
        let name = cluster.name_any();
        let namespace = cluster.namespace().unwrap_or_default();

        match self
            .store
            .delete::<ConfigMap>(&namespace, &config_map_name(&name))
            .await
        {
            Ok(()) | Err(StoreError::NotFound) => {}
            Err(err) => return Err(ControllerError::store("delete config map")(err)),
        }

        match self
            .store
            .delete_dynamic(&provider_config::gvk(), &namespace, &name)
            .await
        {
            Ok(()) | Err(StoreError::NotFound) | Err(StoreError::NoCapability(_)) => {}
            Err(err) => return Err(ControllerError::store("delete provider config")(err)),
        }

        // Releases the legacy registration left behind by releases that
        // guarded the infrastructure object instead of the cluster record.
        match self.store.get::<AWSCluster>(&namespace, &name).await {
            Ok(aws_cluster) => {
                finalizer::ensure_absent(&self.store, &aws_cluster)
                    .await
                    .map_err(ControllerError::store("remove legacy finalizer"))?;
            }
            Err(StoreError::NotFound) => {}
            Err(err) => return Err(ControllerError::store("get aws cluster")(err)),
        }

        finalizer::ensure_absent(&self.store, cluster)
            .await
            .map_err(ControllerError::store("remove finalizer"))?;

        info!(namespace, cluster = name, "cleaned up cluster config");
        Ok(())
    }
}

/// Controller entry point invoked by the watch machinery.
pub async fn reconcile(
    cluster: Arc<Cluster>,
    ctx: Arc<ConfigMapReconciler<KubeStore>>,
) -> Result<Action, ControllerError> {
    let namespace = cluster.namespace().unwrap_or_default();
    let name = cluster.name_any();

    metrics::increment_reconciliations();
    let start = Instant::now();
    let result = ctx.reconcile(&namespace, &name).await;
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    result.map(|()| Action::requeue(Duration::from_secs(DEFAULT_RESYNC_SECS)))
}

/// Requeue policy for failed passes.
pub fn error_policy(
    cluster: Arc<Cluster>,
    error: &ControllerError,
    _ctx: Arc<ConfigMapReconciler<KubeStore>>,
) -> Action {
    error!(
        cluster = cluster.name_any(),
        class = error.class(),
        error = %error,
        "reconciliation failed"
    );
    metrics::increment_reconciliation_errors(error.class());
    Action::requeue(Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECS))
}
