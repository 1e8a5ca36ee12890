//! Cluster API EKS control plane resources.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::capa::{AWSIdentityReference, NetworkSpec};

/// `controlPlaneRef.kind` value marking a cluster as EKS-managed.
pub const AWS_MANAGED_CONTROL_PLANE_KIND: &str = "AWSManagedControlPlane";

/// Partial view of the `AWSManagedControlPlane` resource (EKS form).
///
/// The control-plane endpoint host encodes the EKS cluster id, which the
/// resolver extracts to synthesize the cluster's OIDC issuer domain.
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "controlplane.cluster.x-k8s.io",
    version = "v1beta2",
    kind = "AWSManagedControlPlane",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct AWSManagedControlPlaneSpec {
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_ref: Option<AWSIdentityReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_endpoint: Option<ApiEndpoint>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: i32,
}
