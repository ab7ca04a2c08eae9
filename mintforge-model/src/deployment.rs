use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::ArtifactKey;
use crate::token::TokenKind;

/// Input of a deployment job: which build to deploy and with what arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployRequest {
    pub kind: TokenKind,
    pub artifact_key: ArtifactKey,
    /// Constructor arguments in declaration order, as loosely-typed JSON
    /// values; the toolchain and the ABI encoder interpret them.
    pub constructor_args: Vec<Value>,
    pub network: String,
    /// When true, a successful deployment enqueues a follow-up verification
    /// job against the remote registrar.
    #[serde(default)]
    pub verify: bool,
}

/// Result of one successful toolchain invocation.
///
/// `address` is always present: an invocation that produced no address is a
/// failed invocation, never a partially-populated result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub address: String,
    pub tx_hash: Option<String>,
    pub deployer_address: String,
    pub network: String,
    pub constructor_args: Vec<Value>,
    /// ABI-encoded constructor arguments as bare hex (no 0x prefix), possibly
    /// empty. Opaque here; forwarded unchanged to verification.
    pub constructor_args_encoded: String,
    pub deployed_at: DateTime<Utc>,
}
