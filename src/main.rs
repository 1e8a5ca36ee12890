//! # AWS Crossplane Cluster Config Operator
//!
//! A Kubernetes controller that derives Crossplane configuration from Cluster
//! API clusters running on AWS.
//!
//! ## Overview
//!
//! For every Cluster API `Cluster` on the management cluster, the controller:
//!
//! 1. **Resolves the cluster shape** - Reads the `AWSCluster` or, for EKS, the
//!    `AWSManagedControlPlane` the cluster record points at
//! 2. **Resolves credentials** - Parses the role ARN of the referenced
//!    `AWSClusterRoleIdentity` into account id and partition
//! 3. **Publishes values** - Writes a `<cluster>-crossplane-config` ConfigMap
//!    holding a YAML values document for Crossplane compositions
//! 4. **Publishes a ProviderConfig** - Writes a Crossplane AWS
//!    `ProviderConfig` with the web identity and assume-role chain for the
//!    workload account
//!
//! ## Features
//!
//! - **EKS and self-managed clusters**: Both CAPA flavors are supported
//! - **China partition aware**: `cn-*` regions produce `arn:aws-cn:` roles
//! - **Degrades gracefully**: Skips the ProviderConfig when its CRD is absent
//! - **Prometheus metrics**: Exposes metrics for monitoring and observability
//! - **Health probes**: HTTP endpoints for liveness and readiness checks

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use kube::{api::Api, Client};
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use tracing::{error, info};

use crossplane_config_operator::constants::DEFAULT_METRICS_PORT;
use crossplane_config_operator::controller::{
    error_policy, reconcile, ConfigMapReconciler, OperatorConfig,
};
use crossplane_config_operator::crd::Cluster;
use crossplane_config_operator::observability::metrics;
use crossplane_config_operator::server::{start_server, ServerState};
use crossplane_config_operator::store::KubeStore;

/// Command-line arguments. Every flag can also be set through its
/// environment variable, which is how the Helm chart passes them in.
#[derive(Debug, Parser)]
#[command(name = "crossplane-config-operator", about, version)]
struct Args {
    /// Base domain of the management cluster installation.
    #[arg(long, env = "MANAGEMENT_CLUSTER_BASE_DOMAIN")]
    management_cluster_base_domain: String,

    /// Name of the role Crossplane authenticates with via web identity.
    #[arg(long, env = "WEB_IDENTITY_ROLE_NAME", default_value = "crossplane-assume-role")]
    web_identity_role_name: String,

    /// Name of the role Crossplane assumes in the workload account.
    #[arg(long, env = "ASSUMED_ROLE_NAME", default_value = "giantswarm-capa-controller")]
    assumed_role_name: String,

    /// Port the metrics and probe server listens on.
    #[arg(long, env = "METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    metrics_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must happen before any connection attempt; rustls 0.23 has no default
    // provider when pulled in with default features off.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crossplane_config_operator=info".into()),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("BUILD_GIT_HASH"),
        built = env!("BUILD_DATETIME"),
        "Starting AWS Crossplane Cluster Config Operator"
    );

    metrics::register_metrics()?;

    let server_state = Arc::new(ServerState {
        is_ready: Arc::new(std::sync::atomic::AtomicBool::new(false)),
    });

    let server_state_clone = server_state.clone();
    let server_port = args.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    // Watch Cluster resources across all namespaces.
    let clusters: Api<Cluster> = Api::all(client.clone());

    let config = OperatorConfig {
        base_domain: args.management_cluster_base_domain,
        web_identity_role_name: args.web_identity_role_name,
        assumed_role_name: args.assumed_role_name,
    };
    let reconciler = Arc::new(ConfigMapReconciler::new(KubeStore::new(client), config));

    server_state
        .is_ready
        .store(true, std::sync::atomic::Ordering::Relaxed);

    Controller::new(clusters, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, reconciler)
        .for_each(|_| std::future::ready(()))
        .await;

    info!("Controller stopped");

    Ok(())
}
