//! Request validation and JSON glue over the scheduler.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use mintforge_core::DeployError;
use mintforge_core::artifacts::resolve_artifact_key;
use mintforge_model::{ArtifactKey, DeployRequest, JobId, JobRecord, JobSpec, TokenKind, VerifyRequest};

use crate::AppState;
use crate::errors::{AppError, AppResult};

/// Hard ceiling on a single wait call; longer waits should re-poll.
const MAX_WAIT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
pub struct CreateDeploymentBody {
    pub kind: String,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub constructor_args: Vec<Value>,
    pub network: Option<String>,
    #[serde(default)]
    pub verify: bool,
}

pub async fn create_deployment(
    State(state): State<AppState>,
    Json(body): Json<CreateDeploymentBody>,
) -> AppResult<(StatusCode, Json<JobRecord>)> {
    let kind: TokenKind = body
        .kind
        .parse()
        .map_err(|err: mintforge_model::ModelError| AppError::bad_request(err.to_string()))?;

    // Compatibility check runs before any filesystem access.
    let artifact_key = resolve_artifact_key(kind, &body.modules)?;
    state.store.require(&artifact_key).await?;

    if body.verify && !state.verification_enabled {
        return Err(AppError::bad_request(
            "verification requested but no registrar is configured",
        ));
    }

    let network = body
        .network
        .unwrap_or_else(|| state.default_network.clone());

    info!(kind = %kind, artifact = %artifact_key, %network, "deployment requested");

    let record = state
        .scheduler
        .submit(JobSpec::Deploy(DeployRequest {
            kind,
            artifact_key,
            constructor_args: body.constructor_args,
            network,
            verify: body.verify,
        }))
        .await?;

    Ok((StatusCode::ACCEPTED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct CreateVerificationBody {
    pub address: String,
    pub artifact_key: String,
    #[serde(default)]
    pub constructor_args: Vec<Value>,
    pub constructor_args_encoded: Option<String>,
}

pub async fn create_verification(
    State(state): State<AppState>,
    Json(body): Json<CreateVerificationBody>,
) -> AppResult<(StatusCode, Json<JobRecord>)> {
    if !state.verification_enabled {
        return Err(AppError::bad_request("no registrar is configured"));
    }
    if body.address.trim().is_empty() {
        return Err(AppError::bad_request("address must not be empty"));
    }

    let artifact_key = ArtifactKey::new(body.artifact_key);
    state.store.require(&artifact_key).await?;

    let record = state
        .scheduler
        .submit(JobSpec::Verify(VerifyRequest {
            address: body.address,
            artifact_key,
            constructor_args: body.constructor_args,
            constructor_args_encoded: body.constructor_args_encoded,
        }))
        .await?;

    Ok((StatusCode::ACCEPTED, Json(record)))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<JobRecord>> {
    let id = JobId::from(id);
    match state.scheduler.get(id).await {
        Some(record) => Ok(Json(record)),
        None => Err(AppError::not_found(format!("job not found: {id}"))),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<JobRecord>> {
    Json(state.scheduler.list(params.limit.unwrap_or(50)).await)
}

#[derive(Debug, Deserialize)]
pub struct WaitParams {
    pub timeout_ms: Option<u64>,
    pub poll_ms: Option<u64>,
}

/// Blocks (bounded) until the job is terminal.
///
/// A failed job is still a representable result: the failed record is
/// returned rather than masked behind a 5xx.
pub async fn wait_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<WaitParams>,
) -> AppResult<Json<JobRecord>> {
    let id = JobId::from(id);
    let timeout = Duration::from_millis(params.timeout_ms.unwrap_or(30_000)).min(MAX_WAIT);
    let poll_interval = params.poll_ms.map(Duration::from_millis);

    match state.scheduler.wait(id, timeout, poll_interval).await {
        Ok(record) => Ok(Json(record)),
        Err(DeployError::JobFailed { .. }) => {
            let record = state
                .scheduler
                .get(id)
                .await
                .ok_or_else(|| AppError::internal("failed job record vanished"))?;
            Ok(Json(record))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
