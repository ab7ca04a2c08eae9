//! Verification state machine against a mocked registrar.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::*;
use serde_json::json;
use tempfile::TempDir;

use mintforge_core::artifacts::ArtifactStore;
use mintforge_core::errors::Result;
use mintforge_core::verify::{
    Registrar, RegistrarResponse, VerificationOrchestrator, VerifierConfig, VerifySubmission,
};
use mintforge_model::{ArtifactKey, VerificationStatus, VerifyRequest};

mock! {
    pub Reg {}

    #[async_trait]
    impl Registrar for Reg {
        async fn submit_source(&self, submission: &VerifySubmission) -> Result<RegistrarResponse>;
        async fn check_status(&self, guid: &str) -> Result<RegistrarResponse>;
    }
}

fn reply(status: &str, result: &str) -> RegistrarResponse {
    RegistrarResponse {
        status: status.to_string(),
        result: result.to_string(),
    }
}

fn artifacts_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("ERC20__base.json"),
        serde_json::to_vec(&json!({
            "abi": [
                {
                    "type": "constructor",
                    "inputs": [
                        { "name": "name", "type": "string", "internalType": "string" }
                    ],
                    "stateMutability": "nonpayable"
                }
            ],
            "bytecode": "0x6001",
        }))
        .unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("ERC20__base.verify.json"),
        serde_json::to_vec(&json!({
            "compiler_version": "v0.8.24+commit.e11b9ed9",
            "standard_json_input": { "language": "Solidity", "sources": {} },
            "source_name": "contracts/ForgeToken.sol",
            "contract_name": "ForgeToken",
        }))
        .unwrap(),
    )
    .unwrap();
    dir
}

fn fast_config() -> VerifierConfig {
    VerifierConfig {
        max_submit_attempts: 5,
        submit_backoff: Duration::from_millis(1),
        poll_interval: Duration::from_millis(5),
        poll_budget: Duration::from_millis(200),
    }
}

fn request() -> VerifyRequest {
    VerifyRequest {
        address: "0xabc".to_string(),
        artifact_key: ArtifactKey::new("ERC20__base"),
        constructor_args: vec![json!("Forge")],
        constructor_args_encoded: Some("0x1234".to_string()),
    }
}

fn orchestrator(registrar: MockReg, dir: &TempDir) -> VerificationOrchestrator {
    VerificationOrchestrator::new(
        Arc::new(registrar),
        ArtifactStore::new(dir.path()),
        fast_config(),
    )
}

#[tokio::test]
async fn accepted_submission_polls_to_verified() {
    let dir = artifacts_dir();
    let mut registrar = MockReg::new();
    registrar
        .expect_submit_source()
        .times(1)
        .returning(|_| Ok(reply("1", "guid-42")));
    registrar
        .expect_check_status()
        .with(eq("guid-42"))
        .times(1)
        .returning(|_| Ok(reply("1", "Pass - Verified")));

    let outcome = orchestrator(registrar, &dir)
        .verify(&request())
        .await
        .unwrap();
    assert_eq!(outcome.status, VerificationStatus::Verified);
    assert_eq!(outcome.guid.as_deref(), Some("guid-42"));
}

#[tokio::test]
async fn submission_forwards_artifact_payload_and_encoded_args() {
    let dir = artifacts_dir();
    let mut registrar = MockReg::new();
    registrar
        .expect_submit_source()
        .withf(|submission: &VerifySubmission| {
            submission.address == "0xabc"
                && submission.compiler_version == "v0.8.24+commit.e11b9ed9"
                && submission.contract_fqn == "contracts/ForgeToken.sol:ForgeToken"
                && submission.constructor_args_encoded == "1234"
        })
        .times(1)
        .returning(|_| Ok(reply("0", "Contract source code already verified")));

    let outcome = orchestrator(registrar, &dir)
        .verify(&request())
        .await
        .unwrap();
    assert_eq!(outcome.status, VerificationStatus::Verified);
}

#[tokio::test]
async fn missing_encoded_args_are_derived_from_the_abi() {
    let dir = artifacts_dir();
    let mut registrar = MockReg::new();
    registrar
        .expect_submit_source()
        .withf(|submission: &VerifySubmission| {
            // "Forge" encoded against `constructor(string)`: offset word,
            // length word, padded content.
            submission.constructor_args_encoded.len() == 192
                && !submission.constructor_args_encoded.starts_with("0x")
        })
        .times(1)
        .returning(|_| Ok(reply("0", "Contract source code already verified")));

    let mut req = request();
    req.constructor_args_encoded = None;
    let outcome = orchestrator(registrar, &dir).verify(&req).await.unwrap();
    assert_eq!(outcome.status, VerificationStatus::Verified);
}

#[tokio::test]
async fn non_retryable_rejection_fails_without_retry() {
    let dir = artifacts_dir();
    let mut registrar = MockReg::new();
    registrar
        .expect_submit_source()
        .times(1)
        .returning(|_| Ok(reply("0", "Invalid API Key")));

    let outcome = orchestrator(registrar, &dir)
        .verify(&request())
        .await
        .unwrap();
    assert_eq!(outcome.status, VerificationStatus::Failed);
    assert!(outcome.message.contains("Invalid API Key"));
}

#[tokio::test]
async fn retryable_rejections_exhaust_to_retryable_status() {
    let dir = artifacts_dir();
    let mut registrar = MockReg::new();
    registrar
        .expect_submit_source()
        .times(5)
        .returning(|_| Ok(reply("0", "Max rate limit reached")));

    let outcome = orchestrator(registrar, &dir)
        .verify(&request())
        .await
        .unwrap();
    assert_eq!(outcome.status, VerificationStatus::Retryable);
    assert!(outcome.message.contains("Max rate limit reached"));
}

#[tokio::test]
async fn poll_budget_exhaustion_yields_resumable_pending() {
    let dir = artifacts_dir();
    let mut registrar = MockReg::new();
    registrar
        .expect_submit_source()
        .times(1)
        .returning(|_| Ok(reply("1", "guid-7")));
    registrar
        .expect_check_status()
        .returning(|_| Ok(reply("0", "Pending in queue")));

    let outcome = orchestrator(registrar, &dir)
        .verify(&request())
        .await
        .unwrap();
    assert_eq!(outcome.status, VerificationStatus::Pending);
    assert_eq!(outcome.guid.as_deref(), Some("guid-7"));
    assert!(!outcome.status.is_terminal());
}

#[tokio::test]
async fn transport_blip_during_polling_does_not_abort() {
    let dir = artifacts_dir();
    let mut registrar = MockReg::new();
    let mut seq = mockall::Sequence::new();
    registrar
        .expect_submit_source()
        .times(1)
        .returning(|_| Ok(reply("1", "guid-xyz")));
    registrar
        .expect_check_status()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Err(mintforge_core::errors::DeployError::Internal(
                "connection reset by peer".to_string(),
            ))
        });
    registrar
        .expect_check_status()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(reply("1", "Pass - Verified")));

    let outcome = orchestrator(registrar, &dir)
        .verify(&request())
        .await
        .unwrap();
    assert_eq!(outcome.status, VerificationStatus::Verified);
    assert_eq!(outcome.guid.as_deref(), Some("guid-xyz"));
}

#[tokio::test]
async fn persistent_poll_transport_failure_yields_resumable_pending() {
    let dir = artifacts_dir();
    let mut registrar = MockReg::new();
    registrar
        .expect_submit_source()
        .times(1)
        .returning(|_| Ok(reply("1", "guid-down")));
    registrar.expect_check_status().returning(|_| {
        Err(mintforge_core::errors::DeployError::Internal(
            "connection refused".to_string(),
        ))
    });

    let outcome = orchestrator(registrar, &dir)
        .verify(&request())
        .await
        .unwrap();
    assert_eq!(outcome.status, VerificationStatus::Pending);
    assert_eq!(outcome.guid.as_deref(), Some("guid-down"));
}

#[tokio::test]
async fn poll_rejection_is_terminal_failure() {
    let dir = artifacts_dir();
    let mut registrar = MockReg::new();
    registrar
        .expect_submit_source()
        .times(1)
        .returning(|_| Ok(reply("1", "guid-9")));
    registrar
        .expect_check_status()
        .times(1)
        .returning(|_| Ok(reply("0", "Fail - Unable to verify")));

    let outcome = orchestrator(registrar, &dir)
        .verify(&request())
        .await
        .unwrap();
    assert_eq!(outcome.status, VerificationStatus::Failed);
    assert!(outcome.message.contains("Unable to verify"));
}

#[tokio::test]
async fn missing_verification_artifact_is_a_hard_error() {
    let dir = artifacts_dir();
    let registrar = MockReg::new();

    let mut req = request();
    req.artifact_key = ArtifactKey::new("ERC721__base");
    let err = orchestrator(registrar, &dir).verify(&req).await.unwrap_err();
    assert!(matches!(
        err,
        mintforge_core::errors::DeployError::ArtifactNotFound(_)
    ));
}

#[tokio::test]
async fn resume_continues_polling_an_existing_guid() {
    let dir = artifacts_dir();
    let mut registrar = MockReg::new();
    registrar
        .expect_check_status()
        .with(eq("guid-55"))
        .times(1)
        .returning(|_| Ok(reply("1", "Pass - Verified")));

    let outcome = orchestrator(registrar, &dir)
        .resume("guid-55")
        .await
        .unwrap();
    assert_eq!(outcome.status, VerificationStatus::Verified);
}
