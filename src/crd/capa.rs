//! Cluster API Provider AWS (CAPA) resources.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Security group role CAPA assigns to the control plane nodes. Only this role
/// is consumed when deriving the configuration values.
pub const SECURITY_GROUP_CONTROL_PLANE: &str = "controlplane";

/// Partial view of the CAPA `AWSCluster` resource (self-managed control
/// plane). Also the legacy carrier of the operator's finalizer, kept around
/// for the migration path to the generic `Cluster` resource.
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta2",
    kind = "AWSCluster",
    namespaced,
    status = "AWSClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct AWSClusterSpec {
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_ref: Option<AWSIdentityReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSpec>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AWSClusterStatus {
    #[serde(
        default,
        rename = "networkStatus",
        skip_serializing_if = "Option::is_none"
    )]
    pub network_status: Option<NetworkStatus>,
}

/// Reference to the identity object holding the AWS role the cluster runs
/// under.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AWSIdentityReference {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc: Option<VPCSpec>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VPCSpec {
    /// Filled in by CAPA once the VPC exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    /// Security groups keyed by role, e.g. `controlplane`.
    #[serde(default)]
    pub security_groups: BTreeMap<String, SecurityGroup>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroup {
    #[serde(default)]
    pub id: String,
}

/// Partial view of the CAPA `AWSClusterRoleIdentity` resource. Its `roleARN`
/// is the source of the AWS account id and partition for all derived
/// artifacts.
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta2",
    kind = "AWSClusterRoleIdentity",
    namespaced
)]
pub struct AWSClusterRoleIdentitySpec {
    #[serde(default, rename = "roleARN")]
    pub role_arn: String,
}
