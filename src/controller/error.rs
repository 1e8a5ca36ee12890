//! Controller error type.

use thiserror::Error;

use crate::store::StoreError;

/// Error of a single reconciliation pass.
///
/// Store failures are wrapped with the step they occurred in. The remaining
/// variants are terminal for the pass: they describe inconsistent upstream
/// data that a retry cannot fix without intervention.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("failed to {step}: {source}")]
    Store {
        step: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("malformed role ARN {arn:?}")]
    MalformedRoleArn { arn: String },
    #[error("cluster has no identity reference")]
    MissingIdentityRef,
    #[error("cluster has no region")]
    MissingRegion,
    #[error("cannot extract cluster id from control plane endpoint {endpoint:?}")]
    InvalidControlPlaneEndpoint { endpoint: String },
    #[error("failed to serialize config values: {0}")]
    SerializeValues(#[from] serde_yaml::Error),
}

impl ControllerError {
    /// Wraps a store error with the name of the reconciliation step.
    pub fn store(step: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { step, source }
    }

    /// Error class used as a metrics label. Terminal errors need an upstream
    /// change to resolve; transient ones are expected to clear on requeue.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Store { .. } => "transient",
            _ => "terminal",
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.class() == "terminal"
    }
}
