//! Prebuilt contract artifacts: key resolution and on-disk lookup.
//!
//! The artifact directory is populated at build time and read-only while
//! serving. Every key maps to a pair of files: `<key>.json` with the ABI and
//! deployable bytecode, and `<key>.verify.json` with the compiler input the
//! registrar needs to reproduce the build.

pub mod resolver;

pub use resolver::{allowed_modules, normalize_modules, resolve_artifact_key};

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use mintforge_model::ArtifactKey;

use crate::errors::{DeployError, Result};

/// ABI plus deployable bytecode of one prebuilt contract.
#[derive(Debug, Clone, Deserialize)]
pub struct CompiledArtifact {
    pub abi: Value,
    /// Creation bytecode as 0x-prefixed hex.
    pub bytecode: String,
}

/// Build-time compiler input needed to verify a deployed contract.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationArtifact {
    pub compiler_version: String,
    pub standard_json_input: Value,
    pub source_name: String,
    pub contract_name: String,
}

impl VerificationArtifact {
    /// `contracts/MyToken.sol:MyToken` form the registrar expects.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

/// Read-only view over the build-time artifact directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn build_path(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn verify_path(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(format!("{key}.verify.json"))
    }

    /// Request-time existence check, run before a job is ever enqueued.
    pub async fn require(&self, key: &ArtifactKey) -> Result<()> {
        let exists = tokio::fs::try_exists(self.build_path(key))
            .await
            .unwrap_or(false);
        if exists {
            Ok(())
        } else {
            Err(DeployError::UnknownArtifact(key.to_string()))
        }
    }

    /// Loads the ABI + bytecode pair for a key.
    pub async fn load(&self, key: &ArtifactKey) -> Result<CompiledArtifact> {
        let path = self.build_path(key);
        let raw = tokio::fs::read(&path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                DeployError::ArtifactNotFound(key.to_string())
            } else {
                DeployError::Io(err)
            }
        })?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Loads the verification payload for a key.
    ///
    /// Absence here is a build bug, not a transient condition, so the error
    /// is the non-retryable `ArtifactNotFound`.
    pub async fn load_verification(&self, key: &ArtifactKey) -> Result<VerificationArtifact> {
        let path = self.verify_path(key);
        let raw = tokio::fs::read(&path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                DeployError::ArtifactNotFound(format!("{key} (verification payload)"))
            } else {
                DeployError::Io(err)
            }
        })?;
        Ok(serde_json::from_slice(&raw)?)
    }
}
