//! Credential resolution.
//!
//! The cluster's `AWSClusterRoleIdentity` owns an ARN-shaped role string; the
//! account id and partition extracted from it feed both derived artifacts.
//! Parsing fails closed: a malformed role string aborts the pass instead of
//! being defaulted, since the upstream data is inconsistent and a blind retry
//! cannot fix it.

use crate::crd::AWSClusterRoleIdentity;
use crate::store::ObjectStore;

use super::error::ControllerError;

/// Role reference parsed from an ARN string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleArn {
    pub partition: String,
    pub account_id: String,
}

/// Parses `arn:<partition>:<service>:<region>:<account-id>:<resource>`.
pub fn parse_role_arn(arn: &str) -> Result<RoleArn, ControllerError> {
    let malformed = || ControllerError::MalformedRoleArn {
        arn: arn.to_string(),
    };

    let mut sections = arn.splitn(6, ':');
    let (
        Some("arn"),
        Some(partition),
        Some(_service),
        Some(_region),
        Some(account_id),
        Some(resource),
    ) = (
        sections.next(),
        sections.next(),
        sections.next(),
        sections.next(),
        sections.next(),
        sections.next(),
    )
    else {
        return Err(malformed());
    };

    if partition.is_empty() || account_id.is_empty() || resource.is_empty() {
        return Err(malformed());
    }

    Ok(RoleArn {
        partition: partition.to_string(),
        account_id: account_id.to_string(),
    })
}

/// Fetches the identity object a descriptor references and parses its role
/// ARN. A missing identity object is an error: it is a required secondary
/// lookup, unlike the generic cluster record.
pub async fn resolve_role_arn<S: ObjectStore>(
    store: &S,
    namespace: &str,
    identity_ref_name: &str,
) -> Result<RoleArn, ControllerError> {
    let identity: AWSClusterRoleIdentity = store
        .get(namespace, identity_ref_name)
        .await
        .map_err(ControllerError::store("get cluster role identity"))?;
    parse_role_arn(&identity.spec.role_arn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_arn() {
        let role = parse_role_arn("arn:aws:iam::111122223333:role/x").expect("valid arn");
        assert_eq!(role.partition, "aws");
        assert_eq!(role.account_id, "111122223333");
    }

    #[test]
    fn test_parse_role_arn_china_partition() {
        let role =
            parse_role_arn("arn:aws-cn:iam::444455556666:role/y").expect("valid arn");
        assert_eq!(role.partition, "aws-cn");
        assert_eq!(role.account_id, "444455556666");
    }

    #[test]
    fn test_parse_role_arn_rejects_garbage() {
        let err = parse_role_arn("invalid-arn").expect_err("not an arn");
        assert!(matches!(err, ControllerError::MalformedRoleArn { .. }));
        assert!(err.is_terminal());
    }

    #[test]
    fn test_parse_role_arn_rejects_wrong_prefix() {
        let result = parse_role_arn("nra:aws:iam::111122223333:role/x");
        assert!(matches!(
            result,
            Err(ControllerError::MalformedRoleArn { .. })
        ));
    }

    #[test]
    fn test_parse_role_arn_rejects_empty_account() {
        let result = parse_role_arn("arn:aws:iam:::role/x");
        assert!(matches!(
            result,
            Err(ControllerError::MalformedRoleArn { .. })
        ));
    }

    #[test]
    fn test_parse_role_arn_rejects_missing_sections() {
        let result = parse_role_arn("arn:aws:iam");
        assert!(matches!(
            result,
            Err(ControllerError::MalformedRoleArn { .. })
        ));
    }
}
