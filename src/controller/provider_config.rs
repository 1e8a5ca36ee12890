//! Crossplane AWS `ProviderConfig` construction.
//!
//! The ProviderConfig CRD is owned by the Crossplane AWS provider and may not
//! be installed on the management cluster, so it is handled as a dynamic
//! object instead of a typed resource. The object carries two role ARNs: the
//! web identity role Crossplane authenticates with and the role it assumes in
//! the workload account afterwards.

use kube::api::{ApiResource, DynamicObject};
use kube::core::GroupVersionKind;
use serde_json::{json, Value};

use super::cluster_info::resolve_partition;

pub const PROVIDER_CONFIG_GROUP: &str = "aws.upbound.io";
pub const PROVIDER_CONFIG_VERSION: &str = "v1beta1";
pub const PROVIDER_CONFIG_KIND: &str = "ProviderConfig";

pub fn gvk() -> GroupVersionKind {
    GroupVersionKind::gvk(
        PROVIDER_CONFIG_GROUP,
        PROVIDER_CONFIG_VERSION,
        PROVIDER_CONFIG_KIND,
    )
}

fn role_arn(partition: &str, account_id: &str, role_name: &str) -> String {
    format!("arn:{partition}:iam::{account_id}:role/{role_name}")
}

/// Builds the ProviderConfig spec for a workload account. The ARN partition
/// is derived from the region, so China clusters get `arn:aws-cn:` roles.
pub fn build_spec(
    account_id: &str,
    region: &str,
    web_identity_role_name: &str,
    assumed_role_name: &str,
) -> Value {
    let partition = resolve_partition(region);
    json!({
        "credentials": {
            "source": "WebIdentity",
            "webIdentity": {
                "roleARN": role_arn(partition, account_id, web_identity_role_name),
            },
        },
        "assumeRoleChain": [
            {
                "roleARN": role_arn(partition, account_id, assumed_role_name),
            },
        ],
    })
}

/// Builds the desired ProviderConfig object for a cluster. The object is
/// named after the cluster itself.
pub fn desired_object(namespace: &str, cluster_name: &str, spec: Value) -> DynamicObject {
    let resource = ApiResource::from_gvk(&gvk());
    let mut object = DynamicObject::new(cluster_name, &resource).within(namespace);
    object.data = json!({ "spec": spec });
    object
}
