//! Crossplane configuration values document.
//!
//! The values are rendered to YAML and published in a ConfigMap named
//! `<cluster>-crossplane-config`, under the single `values` key. Consumers
//! feed the document to Crossplane compositions, so the key names here are a
//! published contract.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use kube::core::ObjectMeta;
use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_MAP_SUFFIX, MANAGED_BY};

use super::cluster_info::ClusterInfo;
use super::error::ControllerError;

/// Top-level values document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossplaneConfigValues {
    #[serde(rename = "accountID")]
    pub account_id: String,
    pub aws_cluster: AwsClusterValues,
    pub aws_partition: String,
    pub base_domain: String,
    pub cluster_name: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oidc_domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsClusterValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<SecurityGroupsValues>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupsValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane: Option<SecurityGroupValues>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupValues {
    pub id: String,
}

/// Name of the derived ConfigMap for a cluster.
pub fn config_map_name(cluster_name: &str) -> String {
    format!("{cluster_name}{CONFIG_MAP_SUFFIX}")
}

/// Assembles the values document from the resolved descriptor.
pub fn build_values(
    info: &ClusterInfo,
    account_id: &str,
    base_domain: &str,
) -> CrossplaneConfigValues {
    let security_groups = info
        .control_plane_security_group_id
        .as_ref()
        .map(|id| SecurityGroupsValues {
            control_plane: Some(SecurityGroupValues { id: id.clone() }),
        });

    CrossplaneConfigValues {
        account_id: account_id.to_string(),
        aws_cluster: AwsClusterValues {
            vpc_id: info.vpc_id.clone(),
            security_groups,
        },
        aws_partition: info.aws_partition.clone(),
        base_domain: format!("{}.{base_domain}", info.name),
        cluster_name: info.name.clone(),
        region: info.region.clone(),
        oidc_domain: info.oidc_domain.clone(),
    }
}

/// Serializes the values document to the YAML published in the ConfigMap.
pub fn render_values(values: &CrossplaneConfigValues) -> Result<String, ControllerError> {
    Ok(serde_yaml::to_string(values)?)
}

/// Builds the desired ConfigMap for a cluster.
pub fn desired_config_map(
    namespace: &str,
    cluster_name: &str,
    values: &CrossplaneConfigValues,
) -> Result<ConfigMap, ControllerError> {
    let rendered = render_values(values)?;
    Ok(ConfigMap {
        metadata: ObjectMeta {
            name: Some(config_map_name(cluster_name)),
            namespace: Some(namespace.to_string()),
            labels: Some(BTreeMap::from([(
                "app.kubernetes.io/managed-by".to_string(),
                MANAGED_BY.to_string(),
            )])),
            ..Default::default()
        },
        data: Some(BTreeMap::from([("values".to_string(), rendered)])),
        ..Default::default()
    })
}
