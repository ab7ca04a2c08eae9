//! Source verification against a remote registrar.
//!
//! The registrar is asynchronous, rate-limited and eventually consistent:
//! submissions are retried with linear backoff while the rejection looks
//! transient, and accepted submissions are polled under a bounded wall-clock
//! budget. Running out of polling budget is not a failure; the caller keeps
//! the guid and may resume later.

pub mod classify;
mod encode;

pub use encode::encode_constructor_args;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use mintforge_model::{VerificationOutcome, VerifyRequest};

use crate::artifacts::ArtifactStore;
use crate::errors::Result;

/// Payload of one source-verification submission.
#[derive(Debug, Clone)]
pub struct VerifySubmission {
    pub address: String,
    pub standard_json_input: Value,
    pub compiler_version: String,
    pub contract_fqn: String,
    /// Bare hex, possibly empty.
    pub constructor_args_encoded: String,
}

/// Normalized registrar reply. `status == "1"` means accepted; `result`
/// carries either the tracking guid or a free-text diagnostic.
#[derive(Debug, Clone)]
pub struct RegistrarResponse {
    pub status: String,
    pub result: String,
}

impl RegistrarResponse {
    pub fn accepted(&self) -> bool {
        self.status == "1"
    }
}

/// Remote verification service seam. Mocked in tests; implemented for
/// Etherscan-compatible APIs in production.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn submit_source(&self, submission: &VerifySubmission) -> Result<RegistrarResponse>;
    async fn check_status(&self, guid: &str) -> Result<RegistrarResponse>;
}

/// Etherscan-compatible registrar client.
#[derive(Debug, Clone)]
pub struct EtherscanRegistrar {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct RawRegistrarReply {
    status: String,
    /// Free text or guid; some registrars return non-string shapes here.
    result: Value,
}

impl EtherscanRegistrar {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        EtherscanRegistrar {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    fn normalize(reply: RawRegistrarReply) -> RegistrarResponse {
        let result = match reply.result {
            Value::String(s) => s,
            other => other.to_string(),
        };
        RegistrarResponse {
            status: reply.status,
            result,
        }
    }
}

#[async_trait]
impl Registrar for EtherscanRegistrar {
    async fn submit_source(&self, submission: &VerifySubmission) -> Result<RegistrarResponse> {
        let source_code = serde_json::to_string(&submission.standard_json_input)?;
        let form = [
            ("apikey", self.api_key.as_str()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", submission.address.as_str()),
            ("codeformat", "solidity-standard-json-input"),
            ("sourceCode", source_code.as_str()),
            ("contractname", submission.contract_fqn.as_str()),
            ("compilerversion", submission.compiler_version.as_str()),
            // Etherscan's long-standing parameter-name typo is part of the API.
            (
                "constructorArguements",
                submission.constructor_args_encoded.as_str(),
            ),
        ];

        let reply: RawRegistrarReply = self
            .client
            .post(&self.api_url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(Self::normalize(reply))
    }

    async fn check_status(&self, guid: &str) -> Result<RegistrarResponse> {
        let reply: RawRegistrarReply = self
            .client
            .get(&self.api_url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(Self::normalize(reply))
    }
}

/// Retry and polling budgets.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Submission attempts while the rejection stays retryable.
    pub max_submit_attempts: u32,
    /// Linear backoff unit: attempt n sleeps `submit_backoff * n`.
    pub submit_backoff: Duration,
    pub poll_interval: Duration,
    /// Total wall-clock polling budget before yielding `Pending`.
    pub poll_budget: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        VerifierConfig {
            max_submit_attempts: 5,
            submit_backoff: Duration::from_secs(10),
            poll_interval: Duration::from_secs(10),
            poll_budget: Duration::from_secs(600),
        }
    }
}

enum SubmitDisposition {
    AlreadyVerified(String),
    Accepted(String),
    Rejected(String),
    RetriesExhausted(String),
}

/// Drives one verification through submission and polling.
pub struct VerificationOrchestrator {
    registrar: Arc<dyn Registrar>,
    store: ArtifactStore,
    config: VerifierConfig,
}

impl std::fmt::Debug for VerificationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl VerificationOrchestrator {
    pub fn new(registrar: Arc<dyn Registrar>, store: ArtifactStore, config: VerifierConfig) -> Self {
        VerificationOrchestrator {
            registrar,
            store,
            config,
        }
    }

    /// Runs the full state machine for one verification request.
    ///
    /// Missing build artifacts surface as hard errors (a build bug, not a
    /// transient condition); every remote disposition becomes a
    /// `VerificationOutcome`.
    pub async fn verify(&self, request: &VerifyRequest) -> Result<VerificationOutcome> {
        let verification = self.store.load_verification(&request.artifact_key).await?;

        let encoded = match request.constructor_args_encoded.as_deref() {
            Some(hex) if !hex.is_empty() => hex.trim_start_matches("0x").to_ascii_lowercase(),
            _ => {
                let compiled = self.store.load(&request.artifact_key).await?;
                encode_constructor_args(&compiled.abi, &request.constructor_args)?
            }
        };

        let submission = VerifySubmission {
            address: request.address.clone(),
            standard_json_input: verification.standard_json_input.clone(),
            compiler_version: verification.compiler_version.clone(),
            contract_fqn: verification.fully_qualified_name(),
            constructor_args_encoded: encoded,
        };

        match self.submit_with_retries(&submission).await? {
            SubmitDisposition::AlreadyVerified(message) => {
                info!(address = %request.address, "contract already verified");
                Ok(VerificationOutcome::verified(message))
            }
            SubmitDisposition::Rejected(message) => {
                warn!(address = %request.address, %message, "verification rejected");
                Ok(VerificationOutcome::failed(message))
            }
            SubmitDisposition::RetriesExhausted(message) => {
                warn!(address = %request.address, %message, "submission retries exhausted");
                Ok(VerificationOutcome::retryable(message))
            }
            SubmitDisposition::Accepted(guid) => self.poll_until_terminal(&guid).await,
        }
    }

    /// Resumes polling for a previously accepted submission.
    pub async fn resume(&self, guid: &str) -> Result<VerificationOutcome> {
        self.poll_until_terminal(guid).await
    }

    async fn submit_with_retries(
        &self,
        submission: &VerifySubmission,
    ) -> Result<SubmitDisposition> {
        let mut last_message = String::new();

        for attempt in 1..=self.config.max_submit_attempts {
            match self.registrar.submit_source(submission).await {
                Ok(reply) if reply.accepted() => {
                    debug!(guid = %reply.result, "verification submission accepted");
                    return Ok(SubmitDisposition::Accepted(reply.result));
                }
                Ok(reply) => {
                    if classify::is_already_verified(&reply.result) {
                        return Ok(SubmitDisposition::AlreadyVerified(reply.result));
                    }
                    if !classify::is_retryable_message(&reply.result) {
                        return Ok(SubmitDisposition::Rejected(reply.result));
                    }
                    debug!(
                        attempt,
                        message = %reply.result,
                        "transient submission rejection"
                    );
                    last_message = reply.result;
                }
                // A transport error counts as a spent attempt.
                Err(err) => {
                    debug!(attempt, error = %err, "submission transport error");
                    last_message = err.to_string();
                }
            }

            if attempt < self.config.max_submit_attempts {
                tokio::time::sleep(self.config.submit_backoff * attempt).await;
            }
        }

        Ok(SubmitDisposition::RetriesExhausted(last_message))
    }

    async fn poll_until_terminal(&self, guid: &str) -> Result<VerificationOutcome> {
        let deadline = tokio::time::Instant::now() + self.config.poll_budget;

        loop {
            let now = tokio::time::Instant::now();
            if now >= deadline {
                info!(%guid, "polling budget exhausted, verification still pending");
                return Ok(VerificationOutcome::pending(
                    guid,
                    "verification still pending at the registrar",
                ));
            }
            tokio::time::sleep(self.config.poll_interval.min(deadline - now)).await;

            // A transport failure here must not lose the guid: the
            // submission is already accepted, so keep polling until the
            // budget runs out and let the Pending outcome carry the guid.
            let reply = match self.registrar.check_status(guid).await {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(%guid, error = %err, "status poll failed, retrying");
                    continue;
                }
            };
            match classify::interpret_poll_message(&reply.result) {
                classify::PollDisposition::Verified => {
                    info!(%guid, "source verified");
                    return Ok(VerificationOutcome::verified(reply.result).with_guid(guid));
                }
                classify::PollDisposition::Pending => {
                    debug!(%guid, message = %reply.result, "verification pending");
                }
                classify::PollDisposition::Failed => {
                    warn!(%guid, message = %reply.result, "verification failed");
                    return Ok(VerificationOutcome::failed(reply.result).with_guid(guid));
                }
            }
        }
    }
}
