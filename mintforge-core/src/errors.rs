use thiserror::Error;

use mintforge_model::JobId;

/// Error taxonomy of the deployment lifecycle engine.
///
/// The split between variants mirrors who can act on the failure: callers
/// (`InvalidInput`, `InvalidModuleCombination`), operators fixing build
/// outputs (`UnknownArtifact`, `ArtifactNotFound`), the toolchain
/// (`DeploymentExecutionFailed`, `DeploymentOutputMissing`), and the remote
/// registrar (`Registrar`). Verification dispositions short of a transport
/// failure are data, not errors: they travel as `VerificationOutcome`.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("modules not supported for {kind}: {modules}")]
    InvalidModuleCombination { kind: String, modules: String },

    #[error("no prebuilt artifact for key: {0}")]
    UnknownArtifact(String),

    #[error("artifact missing on disk: {0}")]
    ArtifactNotFound(String),

    #[error("deployment toolchain failed: {0}")]
    DeploymentExecutionFailed(String),

    #[error("toolchain exited cleanly but wrote no result file: {0}")]
    DeploymentOutputMissing(String),

    #[error("timed out waiting for job {0}")]
    DeploymentTimedOut(JobId),

    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("job {id} failed: {message}")]
    JobFailed { id: JobId, message: String },

    #[error("registrar request failed: {0}")]
    Registrar(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DeployError>;
