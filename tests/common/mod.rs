//! Common fixtures for reconciler integration tests.
//!
//! Builds partial cluster objects the way CAPI and CAPA lay them out on a
//! management cluster, plus a ready-to-use reconciler backed by the in-memory
//! store.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::Resource;

use crossplane_config_operator::controller::{ConfigMapReconciler, OperatorConfig};
use crossplane_config_operator::crd::capa::{
    AWSClusterRoleIdentitySpec, AWSClusterSpec, AWSClusterStatus, AWSIdentityReference,
    NetworkSpec, NetworkStatus, SecurityGroup, VPCSpec, SECURITY_GROUP_CONTROL_PLANE,
};
use crossplane_config_operator::crd::capi::{ClusterSpec, ControlPlaneReference};
use crossplane_config_operator::crd::eks::{
    ApiEndpoint, AWSManagedControlPlaneSpec, AWS_MANAGED_CONTROL_PLANE_KIND,
};
use crossplane_config_operator::crd::{
    AWSCluster, AWSClusterRoleIdentity, AWSManagedControlPlane, Cluster,
};
use crossplane_config_operator::store::InMemoryStore;

pub const NAMESPACE: &str = "org-acme";
pub const BASE_DOMAIN: &str = "installation.example.com";

pub fn operator_config() -> OperatorConfig {
    OperatorConfig {
        base_domain: BASE_DOMAIN.to_string(),
        web_identity_role_name: "crossplane-assume-role".to_string(),
        assumed_role_name: "giantswarm-capa-controller".to_string(),
    }
}

pub fn reconciler() -> ConfigMapReconciler<InMemoryStore> {
    ConfigMapReconciler::new(InMemoryStore::new(), operator_config())
}

/// Generic cluster record backed by a self-managed `AWSCluster`.
pub fn cluster(name: &str) -> Cluster {
    let mut cluster = Cluster::new(name, ClusterSpec::default());
    cluster.meta_mut().namespace = Some(NAMESPACE.to_string());
    cluster
}

/// Generic cluster record backed by an EKS control plane.
pub fn eks_cluster(name: &str) -> Cluster {
    let mut cluster = cluster(name);
    cluster.spec.control_plane_ref = Some(ControlPlaneReference {
        kind: AWS_MANAGED_CONTROL_PLANE_KIND.to_string(),
        name: Some(name.to_string()),
        ..Default::default()
    });
    cluster
}

/// Marks an object as being deleted. The watch machinery only hands the
/// reconciler deleted objects while a finalizer still blocks them.
pub fn mark_deleted(cluster: &mut Cluster) {
    cluster.meta_mut().deletion_timestamp = Some(Time(k8s_openapi::chrono::Utc::now()));
}

pub fn aws_cluster(name: &str, region: &str) -> AWSCluster {
    let mut aws_cluster = AWSCluster::new(
        name,
        AWSClusterSpec {
            region: region.to_string(),
            identity_ref: Some(AWSIdentityReference {
                kind: "AWSClusterRoleIdentity".to_string(),
                name: format!("{name}-identity"),
            }),
            network: Some(NetworkSpec {
                vpc: Some(VPCSpec {
                    id: Some("vpc-0123456789abcdef0".to_string()),
                }),
            }),
        },
    );
    aws_cluster.meta_mut().namespace = Some(NAMESPACE.to_string());
    aws_cluster.status = Some(AWSClusterStatus {
        network_status: Some(NetworkStatus {
            security_groups: BTreeMap::from([(
                SECURITY_GROUP_CONTROL_PLANE.to_string(),
                SecurityGroup {
                    id: "sg-0fedcba9876543210".to_string(),
                },
            )]),
        }),
    });
    aws_cluster
}

pub fn managed_control_plane(name: &str, region: &str, endpoint_host: &str) -> AWSManagedControlPlane {
    let mut control_plane = AWSManagedControlPlane::new(
        name,
        AWSManagedControlPlaneSpec {
            region: region.to_string(),
            identity_ref: Some(AWSIdentityReference {
                kind: "AWSClusterRoleIdentity".to_string(),
                name: format!("{name}-identity"),
            }),
            network: None,
            control_plane_endpoint: Some(ApiEndpoint {
                host: endpoint_host.to_string(),
                port: 443,
            }),
        },
    );
    control_plane.meta_mut().namespace = Some(NAMESPACE.to_string());
    control_plane
}

pub fn role_identity(name: &str, role_arn: &str) -> AWSClusterRoleIdentity {
    let mut identity = AWSClusterRoleIdentity::new(
        &format!("{name}-identity"),
        AWSClusterRoleIdentitySpec {
            role_arn: role_arn.to_string(),
        },
    );
    identity.meta_mut().namespace = Some(NAMESPACE.to_string());
    identity
}
