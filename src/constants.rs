//! # Constants
//!
//! Shared constants used throughout the controller.

/// Finalizer added to the owning `Cluster` resource (and, historically, to the
/// `AWSCluster` resource) to block deletion until the derived Crossplane
/// artifacts have been cleaned up.
pub const FINALIZER: &str =
    "crossplane-config-operator.finalizers.giantswarm.io/config-map-controller";

/// Value of the `app.kubernetes.io/managed-by` label stamped on the ConfigMap.
pub const MANAGED_BY: &str = "aws-crossplane-cluster-config-operator";

/// Name suffix of the per-cluster configuration ConfigMap.
pub const CONFIG_MAP_SUFFIX: &str = "-crossplane-config";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default requeue interval for reconciliation errors (seconds)
pub const DEFAULT_ERROR_REQUEUE_SECS: u64 = 60;

/// Default resync interval after a successful reconciliation (seconds)
pub const DEFAULT_RESYNC_SECS: u64 = 300;
