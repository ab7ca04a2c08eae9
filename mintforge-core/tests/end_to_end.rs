//! Full-path scenario: request descriptor → artifact key → scheduled job →
//! supervised toolchain run → succeeded job carrying the deployment result.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use mintforge_core::artifacts::{ArtifactStore, resolve_artifact_key};
use mintforge_core::errors::{DeployError, Result};
use mintforge_core::executor::{ExecutorConfig, ToolchainExecutor, ToolchainInvocation};
use mintforge_core::scheduler::{JobRunner, JobScheduler, SchedulerConfig};
use mintforge_model::{
    DeployRequest, JobOutcome, JobRecord, JobSpec, JobStatus, TokenKind,
};

struct DeployRunner {
    executor: ToolchainExecutor,
}

#[async_trait]
impl JobRunner for DeployRunner {
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
                Ok(JobOutcome::Deployed(result))
            }
            JobSpec::Verify(_) => Err(DeployError::Internal(
                "verification not wired in this test".to_string(),
            )),
        }
    }
}

#[tokio::test]
async fn erc1155_with_modules_deploys_through_the_whole_pipeline() {
    let modules = vec!["mintable".to_string(), "pausable".to_string()];
    let key = resolve_artifact_key(TokenKind::Erc1155, &modules).unwrap();
    assert_eq!(key.as_str(), "ERC1155__mintable_pausable");

    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("ERC1155__mintable_pausable.json"),
        serde_json::to_vec(&json!({ "abi": [], "bytecode": "0x6002" })).unwrap(),
    )
    .unwrap();

    let script = r#"printf '%s' '{
        "address": "0xabc0000000000000000000000000000000000000",
        "tx_hash": "0xdef",
        "deployer_address": "0x1230000000000000000000000000000000000000",
        "network": "sepolia",
        "deployed_at": "2026-06-01T00:00:00Z"
    }' > "$MINTFORGE_OUTPUT_FILE""#;
    let executor = ToolchainExecutor::new(
        ExecutorConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            timeout: Duration::from_secs(10),
            max_captured_output: 4096,
        },
        ArtifactStore::new(dir.path()),
    );

    let scheduler = JobScheduler::new(
        SchedulerConfig::default(),
        Arc::new(DeployRunner { executor }),
    );

    let store = ArtifactStore::new(dir.path());
    store.require(&key).await.unwrap();

    let queued = scheduler
        .submit(JobSpec::Deploy(DeployRequest {
            kind: TokenKind::Erc1155,
            artifact_key: key,
            constructor_args: vec![json!("https://tokens.example/{id}.json")],
            network: "sepolia".to_string(),
            verify: false,
        }))
        .await
        .unwrap();
    assert_eq!(queued.status, JobStatus::Queued);

    let done = scheduler
        .wait(queued.id, Duration::from_secs(10), None)
        .await
        .unwrap();
    assert_eq!(done.status, JobStatus::Succeeded);
    assert!(done.error.is_none());

    let Some(JobOutcome::Deployed(result)) = done.result else {
        panic!("expected a deployment outcome");
    };
    assert_eq!(result.address, "0xabc0000000000000000000000000000000000000");
    assert_eq!(result.tx_hash.as_deref(), Some("0xdef"));
    assert_eq!(
        result.deployer_address,
        "0x1230000000000000000000000000000000000000"
    );
    assert_eq!(result.network, "sepolia");
    assert_eq!(
        result.constructor_args,
        vec![json!("https://tokens.example/{id}.json")]
    );
}
