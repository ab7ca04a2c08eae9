use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::ArtifactKey;

/// Input of a verification job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub address: String,
    pub artifact_key: ArtifactKey,
    pub constructor_args: Vec<Value>,
    /// Pre-encoded constructor arguments from the deployment, used verbatim
    /// when present instead of re-encoding from the ABI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor_args_encoded: Option<String>,
}

/// Terminal and resumable states of one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// The registrar confirmed the source matches the deployed bytecode.
    Verified,
    /// Permanent rejection (source mismatch, bad payload). Not worth retrying.
    Failed,
    /// Transient remote condition outlived the retry budget; a later manual
    /// retry may succeed.
    Retryable,
    /// Submission was accepted but polling ran out of budget. The guid lets a
    /// caller resume polling later, including after a restart.
    Pending,
}

impl VerificationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, VerificationStatus::Verified | VerificationStatus::Failed)
    }
}

/// Outcome of one pass through the verification state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub status: VerificationStatus,
    pub guid: Option<String>,
    pub message: String,
}

impl VerificationOutcome {
    pub fn verified(message: impl Into<String>) -> Self {
        VerificationOutcome {
            status: VerificationStatus::Verified,
            guid: None,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        VerificationOutcome {
            status: VerificationStatus::Failed,
            guid: None,
            message: message.into(),
        }
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        VerificationOutcome {
            status: VerificationStatus::Retryable,
            guid: None,
            message: message.into(),
        }
    }

    pub fn pending(guid: impl Into<String>, message: impl Into<String>) -> Self {
        VerificationOutcome {
            status: VerificationStatus::Pending,
            guid: Some(guid.into()),
            message: message.into(),
        }
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }
}
