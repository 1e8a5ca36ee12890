//! Cluster descriptor resolution.
//!
//! Three upstream representations describe a cluster: the generic Cluster API
//! record, the self-managed `AWSCluster` and the EKS
//! `AWSManagedControlPlane`. This module normalizes whichever one applies
//! into a single [`ClusterInfo`] descriptor; everything downstream consumes
//! only the canonical shape. New representations plug in here and nowhere
//! else.

use kube::ResourceExt;

use crate::crd::capa::{AWSIdentityReference, SECURITY_GROUP_CONTROL_PLANE};
use crate::crd::eks::AWS_MANAGED_CONTROL_PLANE_KIND;
use crate::crd::{AWSCluster, AWSManagedControlPlane, Cluster};
use crate::store::ObjectStore;

use super::error::ControllerError;

/// Canonical cluster descriptor, recomputed from scratch on every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterInfo {
    pub name: String,
    pub namespace: String,
    pub region: String,
    pub aws_partition: String,
    /// Filled once the underlying infrastructure reports it.
    pub vpc_id: Option<String>,
    /// Filled once the underlying infrastructure reports it.
    pub control_plane_security_group_id: Option<String>,
    pub identity_ref_name: String,
    pub oidc_domain: Option<String>,
}

/// Maps an AWS region to its ARN partition.
pub fn resolve_partition(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else {
        "aws"
    }
}

/// Whether the generic cluster record delegates its control plane to EKS.
pub fn is_eks(cluster: &Cluster) -> bool {
    cluster
        .spec
        .control_plane_ref
        .as_ref()
        .is_some_and(|reference| reference.kind == AWS_MANAGED_CONTROL_PLANE_KIND)
}

fn eks_dns_suffix(region: &str) -> &'static str {
    if region == "cn-north-1" || region == "cn-northwest-1" {
        "amazonaws.com.cn"
    } else {
        "amazonaws.com"
    }
}

/// Extracts the EKS cluster id from the control plane endpoint.
///
/// The endpoint host looks like
/// `ED3AA07D016EA49EEBC31AB274E7F3DD.sk1.eu-west-2.eks.amazonaws.com`; the id
/// is the first dot-separated label. An endpoint without a hostname is a
/// terminal error.
fn eks_cluster_id(endpoint: &str) -> Result<String, ControllerError> {
    let host = endpoint
        .split_once("://")
        .map_or(endpoint, |(_, rest)| rest);
    let host = host.split(['/', ':']).next().unwrap_or_default();
    let id = host.split('.').next().unwrap_or_default();
    if id.is_empty() {
        return Err(ControllerError::InvalidControlPlaneEndpoint {
            endpoint: endpoint.to_string(),
        });
    }
    Ok(id.to_string())
}

fn non_empty_region(region: &str) -> Result<String, ControllerError> {
    if region.is_empty() {
        return Err(ControllerError::MissingRegion);
    }
    Ok(region.to_string())
}

fn identity_ref_name(
    reference: Option<&AWSIdentityReference>,
) -> Result<String, ControllerError> {
    reference
        .map(|reference| reference.name.clone())
        .filter(|name| !name.is_empty())
        .ok_or(ControllerError::MissingIdentityRef)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Resolves the canonical descriptor for a cluster by fetching the
/// infrastructure representation the generic record points at.
pub async fn resolve<S: ObjectStore>(
    store: &S,
    base_domain: &str,
    cluster: &Cluster,
) -> Result<ClusterInfo, ControllerError> {
    let name = cluster.name_any();
    let namespace = cluster.namespace().unwrap_or_default();

    if is_eks(cluster) {
        let control_plane: AWSManagedControlPlane = store
            .get(&namespace, &name)
            .await
            .map_err(ControllerError::store("get managed control plane"))?;

        let region = non_empty_region(&control_plane.spec.region)?;
        let endpoint = control_plane
            .spec
            .control_plane_endpoint
            .as_ref()
            .map_or("", |endpoint| endpoint.host.as_str());
        let cluster_id = eks_cluster_id(endpoint)?;
        let oidc_domain = format!(
            "oidc.eks.{region}.{}/id/{cluster_id}",
            eks_dns_suffix(&region)
        );

        Ok(ClusterInfo {
            aws_partition: resolve_partition(&region).to_string(),
            vpc_id: non_empty(
                control_plane
                    .spec
                    .network
                    .as_ref()
                    .and_then(|network| network.vpc.as_ref())
                    .and_then(|vpc| vpc.id.clone()),
            ),
            control_plane_security_group_id: None,
            identity_ref_name: identity_ref_name(control_plane.spec.identity_ref.as_ref())?,
            oidc_domain: Some(oidc_domain),
            name,
            namespace,
            region,
        })
    } else {
        let aws_cluster: AWSCluster = store
            .get(&namespace, &name)
            .await
            .map_err(ControllerError::store("get aws cluster"))?;

        let region = non_empty_region(&aws_cluster.spec.region)?;

        Ok(ClusterInfo {
            aws_partition: resolve_partition(&region).to_string(),
            vpc_id: non_empty(
                aws_cluster
                    .spec
                    .network
                    .as_ref()
                    .and_then(|network| network.vpc.as_ref())
                    .and_then(|vpc| vpc.id.clone()),
            ),
            control_plane_security_group_id: non_empty(
                aws_cluster
                    .status
                    .as_ref()
                    .and_then(|status| status.network_status.as_ref())
                    .and_then(|network| {
                        network.security_groups.get(SECURITY_GROUP_CONTROL_PLANE)
                    })
                    .map(|group| group.id.clone()),
            ),
            identity_ref_name: identity_ref_name(aws_cluster.spec.identity_ref.as_ref())?,
            oidc_domain: Some(format!("irsa.{name}.{base_domain}")),
            name,
            namespace,
            region,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::capa::{AWSClusterSpec, AWSClusterStatus};
    use crate::crd::capi::{ClusterSpec, ControlPlaneReference};
    use crate::store::InMemoryStore;

    #[test]
    fn test_resolve_partition_china_regions() {
        assert_eq!(resolve_partition("cn-north-1"), "aws-cn");
        assert_eq!(resolve_partition("cn-northwest-1"), "aws-cn");
    }

    #[test]
    fn test_resolve_partition_standard_regions() {
        assert_eq!(resolve_partition("eu-west-1"), "aws");
        assert_eq!(resolve_partition("us-east-1"), "aws");
        assert_eq!(resolve_partition("ap-southeast-2"), "aws");
    }

    #[test]
    fn test_eks_cluster_id_from_url() {
        let id = eks_cluster_id("https://ED3AA07D016EA49EEBC31AB274E7F3DD.sk1.eu-west-2.eks.amazonaws.com")
            .expect("valid endpoint");
        assert_eq!(id, "ED3AA07D016EA49EEBC31AB274E7F3DD");
    }

    #[test]
    fn test_eks_cluster_id_from_bare_host() {
        let id = eks_cluster_id("ABCDEF.gr7.cn-north-1.eks.amazonaws.com.cn")
            .expect("valid endpoint");
        assert_eq!(id, "ABCDEF");
    }

    #[test]
    fn test_eks_cluster_id_empty_endpoint_is_error() {
        let err = eks_cluster_id("").expect_err("empty endpoint");
        assert!(matches!(
            err,
            ControllerError::InvalidControlPlaneEndpoint { .. }
        ));
    }

    #[test]
    fn test_eks_dns_suffix() {
        assert_eq!(eks_dns_suffix("cn-north-1"), "amazonaws.com.cn");
        assert_eq!(eks_dns_suffix("cn-northwest-1"), "amazonaws.com.cn");
        assert_eq!(eks_dns_suffix("eu-west-2"), "amazonaws.com");
    }

    #[test]
    fn test_is_eks() {
        let mut cluster = Cluster::new("c1", ClusterSpec::default());
        assert!(!is_eks(&cluster));

        cluster.spec.control_plane_ref = Some(ControlPlaneReference {
            kind: "KubeadmControlPlane".to_string(),
            ..Default::default()
        });
        assert!(!is_eks(&cluster));

        cluster.spec.control_plane_ref = Some(ControlPlaneReference {
            kind: AWS_MANAGED_CONTROL_PLANE_KIND.to_string(),
            ..Default::default()
        });
        assert!(is_eks(&cluster));
    }

    #[tokio::test]
    async fn test_resolve_rejects_empty_region() {
        let store = InMemoryStore::new();

        let mut cluster = Cluster::new("c1", ClusterSpec::default());
        cluster.metadata.namespace = Some("org-acme".to_string());
        store.put(&cluster);

        // CAPA declares region optional in the schema, so a half-created
        // AWSCluster can carry an empty one.
        let mut aws_cluster = AWSCluster::new(
            "c1",
            AWSClusterSpec {
                region: String::new(),
                identity_ref: Some(AWSIdentityReference {
                    kind: "AWSClusterRoleIdentity".to_string(),
                    name: "c1-identity".to_string(),
                }),
                network: None,
            },
        );
        aws_cluster.metadata.namespace = Some("org-acme".to_string());
        aws_cluster.status = Some(AWSClusterStatus::default());
        store.put(&aws_cluster);

        let err = resolve(&store, "example.io", &cluster)
            .await
            .expect_err("empty region must not resolve");
        assert!(matches!(err, ControllerError::MissingRegion));
        assert!(err.is_terminal());
    }
}
