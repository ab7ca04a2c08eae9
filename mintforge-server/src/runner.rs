//! Dispatch of scheduled job specs onto the core engine.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::{error, info, warn};

use mintforge_core::errors::{DeployError, Result};
use mintforge_core::executor::{ToolchainExecutor, ToolchainInvocation};
use mintforge_core::scheduler::{JobRunner, JobScheduler};
use mintforge_core::verify::VerificationOrchestrator;
use mintforge_model::{JobOutcome, JobRecord, JobSpec, VerifyRequest};

/// Runs deploy and verify jobs; the only place job kinds are matched.
pub struct ForgeRunner {
    executor: ToolchainExecutor,
    verifier: Option<Arc<VerificationOrchestrator>>,
    /// Back-reference for follow-up submissions; set once right after the
    /// scheduler is constructed with this runner.
    scheduler: OnceLock<JobScheduler>,
}

impl ForgeRunner {
    pub fn new(
        executor: ToolchainExecutor,
        verifier: Option<Arc<VerificationOrchestrator>>,
    ) -> Self {
        ForgeRunner {
            executor,
            verifier,
            scheduler: OnceLock::new(),
        }
    }

    pub fn attach_scheduler(&self, scheduler: JobScheduler) {
        if self.scheduler.set(scheduler).is_err() {
            warn!("scheduler already attached to runner");
        }
    }

    /// Enqueues the follow-up verification for a fresh deployment.
    ///
    /// Fire-and-forget: verification runs as its own job so a slow registrar
    /// never occupies the deployment concurrency slot, and a submission
    /// failure here must not taint the already-successful deployment.
    async fn enqueue_verification(&self, job: &JobRecord, request: VerifyRequest) {
        let Some(scheduler) = self.scheduler.get() else {
            error!(job_id = %job.id, "no scheduler attached, skipping follow-up verification");
            return;
        };
        match scheduler.submit(JobSpec::Verify(request)).await {
            Ok(follow_up) => {
                info!(
                    job_id = %job.id,
                    verify_job_id = %follow_up.id,
                    "queued follow-up verification"
                );
            }
            Err(err) => {
                error!(job_id = %job.id, error = %err, "failed to queue follow-up verification");
            }
        }
    }
}

#[async_trait]
impl JobRunner for ForgeRunner {
    async fn run(&self, job: &JobRecord) -> Result<JobOutcome> {
        match &job.spec {
            JobSpec::Deploy(request) => {
                let result = self
                    .executor
                    .execute(&ToolchainInvocation {
                        job_id: job.id,
                        request: request.clone(),
                    })
                    .await?;

                if request.verify && self.verifier.is_some() {
                    self.enqueue_verification(
                        job,
                        VerifyRequest {
                            address: result.address.clone(),
                            artifact_key: request.artifact_key.clone(),
                            constructor_args: result.constructor_args.clone(),
                            constructor_args_encoded: Some(
                                result.constructor_args_encoded.clone(),
                            ),
                        },
                    )
                    .await;
                }

                Ok(JobOutcome::Deployed(result))
            }
            JobSpec::Verify(request) => {
                let verifier = self.verifier.as_ref().ok_or_else(|| {
                    DeployError::Internal("verification registrar not configured".to_string())
                })?;
                let outcome = verifier.verify(request).await?;
                Ok(JobOutcome::Verified(outcome))
            }
        }
    }
}
