//! Core data model definitions shared across Mintforge crates.
#![allow(missing_docs)]

pub mod artifact;
pub mod deployment;
pub mod error;
pub mod ids;
pub mod job;
pub mod token;
pub mod verification;

// Intentionally curated re-exports for downstream consumers.
pub use artifact::ArtifactKey;
pub use deployment::{DeployRequest, DeploymentResult};
pub use error::{ModelError, Result as ModelResult};
pub use ids::JobId;
pub use job::{JobOutcome, JobRecord, JobSpec, JobStatus};
pub use token::TokenKind;
pub use verification::{VerificationOutcome, VerificationStatus, VerifyRequest};
