//! Supervised invocation of the external deployment toolchain.
//!
//! The toolchain runs as a child process in a per-job working directory and
//! reports its result through a sentinel JSON file. A zero exit code alone is
//! never taken as success: no sentinel means the invocation failed.

use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use mintforge_model::{DeployRequest, DeploymentResult, JobId};

use crate::artifacts::ArtifactStore;
use crate::errors::{DeployError, Result};

/// Name of the sentinel file inside each job's working directory.
const SENTINEL_FILE: &str = "deploy-result.json";

/// Toolchain supervision settings.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Toolchain program to spawn.
    pub program: String,
    /// Fixed leading arguments for every invocation.
    pub args: Vec<String>,
    /// Wall-clock budget for one invocation; the child is killed on expiry.
    pub timeout: Duration,
    /// Upper bound on captured stdout/stderr kept for diagnostics.
    pub max_captured_output: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            program: "mintforge-deploy".to_string(),
            args: Vec::new(),
            timeout: Duration::from_secs(300),
            max_captured_output: 64 * 1024,
        }
    }
}

/// One deployment to execute, tied to the job that owns it.
#[derive(Debug, Clone)]
pub struct ToolchainInvocation {
    pub job_id: JobId,
    pub request: DeployRequest,
}

/// Shape of the sentinel file the toolchain writes on success.
#[derive(Debug, Deserialize)]
struct SentinelPayload {
    address: Option<String>,
    tx_hash: Option<String>,
    deployer_address: String,
    network: String,
    deployed_at: Option<DateTime<Utc>>,
    /// Full deployment transaction calldata, when the toolchain reports it.
    deploy_transaction_data: Option<String>,
}

/// Spawns and supervises deployment toolchain processes.
#[derive(Debug, Clone)]
pub struct ToolchainExecutor {
    config: ExecutorConfig,
    store: ArtifactStore,
}

impl ToolchainExecutor {
    pub fn new(config: ExecutorConfig, store: ArtifactStore) -> Self {
        ToolchainExecutor { config, store }
    }

    /// Runs one deployment end to end.
    ///
    /// Exactly one on-chain transaction is sent per successful invocation.
    /// All failure paths return before a partial result can escape, and the
    /// working directory is removed on every path via tempdir scope.
    pub async fn execute(&self, invocation: &ToolchainInvocation) -> Result<DeploymentResult> {
        let request = &invocation.request;

        // Fails with ArtifactNotFound before any process is spawned.
        let artifact = self.store.load(&request.artifact_key).await?;

        let workdir = tempfile::Builder::new()
            .prefix(&format!("mintforge-{}-", invocation.job_id))
            .tempdir()?;
        let sentinel = workdir.path().join(SENTINEL_FILE);

        // Invariant: the sentinel path must not exist before spawn, even
        // though a fresh tempdir cannot hold one.
        if tokio::fs::try_exists(&sentinel).await.unwrap_or(false) {
            return Err(DeployError::DeploymentExecutionFailed(format!(
                "output path already occupied before spawn: {}",
                sentinel.display()
            )));
        }

        let args_json = serde_json::to_string(&request.constructor_args)?;

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .current_dir(workdir.path())
            .env("MINTFORGE_TOKEN_KIND", request.kind.as_str())
            .env("MINTFORGE_ARTIFACT_KEY", request.artifact_key.as_str())
            .env("MINTFORGE_ARTIFACTS_DIR", self.store.root())
            .env("MINTFORGE_CONSTRUCTOR_ARGS", &args_json)
            .env("MINTFORGE_NETWORK", &request.network)
            .env("MINTFORGE_OUTPUT_FILE", &sentinel)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(
            job_id = %invocation.job_id,
            program = %self.config.program,
            artifact = %request.artifact_key,
            network = %request.network,
            "spawning deployment toolchain"
        );

        let mut child = cmd.spawn().map_err(|err| {
            DeployError::DeploymentExecutionFailed(format!(
                "failed to spawn {}: {err}",
                self.config.program
            ))
        })?;
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let capture_limit = self.config.max_captured_output as u64;

        let waited = tokio::time::timeout(self.config.timeout, async {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                read_capped(stdout_pipe, capture_limit),
                read_capped(stderr_pipe, capture_limit),
            );
            (status, stdout, stderr)
        })
        .await;

        let (status, stdout, stderr) = match waited {
            Ok((status, stdout, stderr)) => (status?, stdout, stderr),
            Err(_) => {
                warn!(job_id = %invocation.job_id, "toolchain timed out, killing");
                let _ = child.kill().await;
                return Err(DeployError::DeploymentExecutionFailed(format!(
                    "toolchain exceeded {}s timeout",
                    self.config.timeout.as_secs()
                )));
            }
        };

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            return Err(DeployError::DeploymentExecutionFailed(format!(
                "toolchain exited with status {code}: {}",
                self.captured_output(&stdout, &stderr)
            )));
        }

        let raw = match tokio::fs::read(&sentinel).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(DeployError::DeploymentOutputMissing(format!(
                    "toolchain exited 0 but wrote no {SENTINEL_FILE}"
                )));
            }
            Err(err) => return Err(DeployError::Io(err)),
        };

        // Consumed sentinels are removed so a stale file can never be read by
        // a later invocation.
        if let Err(err) = tokio::fs::remove_file(&sentinel).await {
            debug!(job_id = %invocation.job_id, error = %err, "sentinel cleanup failed");
        }

        let payload: SentinelPayload = serde_json::from_slice(&raw)?;

        let Some(address) = payload.address else {
            return Err(DeployError::DeploymentExecutionFailed(
                "toolchain reported no contract address".to_string(),
            ));
        };

        let constructor_args_encoded = strip_encoded_args(
            payload.deploy_transaction_data.as_deref(),
            &artifact.bytecode,
        );

        info!(
            job_id = %invocation.job_id,
            address = %address,
            network = %payload.network,
            "deployment confirmed"
        );

        Ok(DeploymentResult {
            address,
            tx_hash: payload.tx_hash,
            deployer_address: payload.deployer_address,
            network: payload.network,
            constructor_args: request.constructor_args.clone(),
            constructor_args_encoded,
            deployed_at: payload.deployed_at.unwrap_or_else(Utc::now),
        })
    }

    fn captured_output(&self, stdout: &[u8], stderr: &[u8]) -> String {
        let combined = format!(
            "stdout: {}\nstderr: {}",
            String::from_utf8_lossy(stdout).trim(),
            String::from_utf8_lossy(stderr).trim()
        );
        truncate_output(combined, self.config.max_captured_output)
    }
}

/// Reads at most `limit` bytes from a child pipe into memory, then drains
/// and discards the remainder. The drain keeps the child from blocking on a
/// full pipe once the capture bound is reached.
async fn read_capped<R>(pipe: Option<R>, limit: u64) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return Vec::new();
    };
    let mut captured = Vec::new();
    if (&mut pipe).take(limit).read_to_end(&mut captured).await.is_err() {
        return captured;
    }
    let _ = tokio::io::copy(&mut pipe, &mut tokio::io::sink()).await;
    captured
}

/// ABI-encoded constructor arguments, recovered by stripping the known
/// creation bytecode prefix from the deployment transaction calldata.
///
/// The value is opaque hex; it is forwarded to verification unchanged. An
/// absent calldata or a prefix mismatch yields the empty string.
fn strip_encoded_args(deploy_data: Option<&str>, bytecode: &str) -> String {
    let Some(data) = deploy_data else {
        return String::new();
    };
    let data = data.trim_start_matches("0x");
    let bytecode = bytecode.trim_start_matches("0x");
    if bytecode.is_empty() || data.len() < bytecode.len() {
        return String::new();
    }
    let (prefix, rest) = data.as_bytes().split_at(bytecode.len());
    if !prefix.eq_ignore_ascii_case(bytecode.as_bytes()) {
        return String::new();
    }
    String::from_utf8_lossy(rest).to_ascii_lowercase()
}

fn truncate_output(mut text: String, max_len: usize) -> String {
    if text.len() > max_len {
        let mut cut = max_len;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str(" ...[truncated]");
    }
    text
}
