//! # Mintforge Core
//!
//! Deployment lifecycle engine for token contracts.
//!
//! Four tightly coupled pieces:
//!
//! - [`scheduler`]: FIFO job scheduler with a bounded concurrency drain
//!   loop (default 1: a single deployer account cannot safely send
//!   concurrent transactions).
//! - [`artifacts`]: deterministic artifact-key resolution plus the
//!   read-only store of precompiled build outputs; bytecode is never
//!   produced in the serving path.
//! - [`executor`]: supervised external toolchain invocation with
//!   sentinel-file result consumption and strict failure semantics.
//! - [`verify`]: submission and polling state machine against a remote,
//!   eventually-consistent verification registrar.

pub mod artifacts;
pub mod errors;
pub mod executor;
pub mod scheduler;
pub mod verify;

pub use artifacts::{
    ArtifactStore, CompiledArtifact, VerificationArtifact, allowed_modules, normalize_modules,
    resolve_artifact_key,
};
pub use errors::{DeployError, Result};
pub use executor::{ExecutorConfig, ToolchainExecutor, ToolchainInvocation};
pub use scheduler::{JobRunner, JobScheduler, SchedulerConfig};
pub use verify::{
    EtherscanRegistrar, Registrar, RegistrarResponse, VerificationOrchestrator, VerifierConfig,
    VerifySubmission,
};
