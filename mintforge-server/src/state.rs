//! Composition root: constructs the core engine from configuration.

use std::sync::Arc;

use mintforge_core::artifacts::ArtifactStore;
use mintforge_core::executor::{ExecutorConfig, ToolchainExecutor};
use mintforge_core::scheduler::{JobScheduler, SchedulerConfig};
use mintforge_core::verify::{EtherscanRegistrar, VerificationOrchestrator, VerifierConfig};

use crate::config::Config;
use crate::runner::ForgeRunner;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: JobScheduler,
    pub store: ArtifactStore,
    pub default_network: String,
    pub verification_enabled: bool,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("verification_enabled", &self.verification_enabled)
            .finish_non_exhaustive()
    }
}

/// Wires store, executor, verifier, runner and scheduler together.
pub fn build_state(config: &Config) -> AppState {
    let store = ArtifactStore::new(&config.artifacts_dir);

    let executor = ToolchainExecutor::new(
        ExecutorConfig {
            program: config.toolchain.program.clone(),
            args: config.toolchain.args.clone(),
            timeout: config.toolchain.timeout,
            ..ExecutorConfig::default()
        },
        store.clone(),
    );

    let verifier = config.registrar.as_ref().map(|registrar| {
        Arc::new(VerificationOrchestrator::new(
            Arc::new(EtherscanRegistrar::new(
                registrar.api_url.clone(),
                registrar.api_key.clone(),
            )),
            store.clone(),
            VerifierConfig::default(),
        ))
    });
    let verification_enabled = verifier.is_some();

    let runner = Arc::new(ForgeRunner::new(executor, verifier));
    let scheduler = JobScheduler::new(SchedulerConfig::default(), runner.clone());
    runner.attach_scheduler(scheduler.clone());

    AppState {
        scheduler,
        store,
        default_network: config.default_network.clone(),
        verification_enabled,
    }
}
