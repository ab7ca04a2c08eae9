use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deployment::{DeployRequest, DeploymentResult};
use crate::ids::JobId;
use crate::verification::{VerificationOutcome, VerifyRequest};

/// Lifecycle state of a scheduled job.
///
/// Transitions are monotonic: `Queued -> Running -> {Succeeded | Failed}`.
/// The scheduler's drain loop is the only writer, so no other transition can
/// be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// Unit of work a job carries.
///
/// A closed tagged variant rather than a stored callable: dispatch is a
/// `match` in the runner, and job records stay serializable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobSpec {
    Deploy(DeployRequest),
    Verify(VerifyRequest),
}

impl JobSpec {
    pub fn kind_name(&self) -> &'static str {
        match self {
            JobSpec::Deploy(_) => "deploy",
            JobSpec::Verify(_) => "verify",
        }
    }
}

/// Result payload of a succeeded job, tagged by job kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobOutcome {
    Deployed(DeploymentResult),
    Verified(VerificationOutcome),
}

/// Flat audit record of one job, as stored and as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub spec: JobSpec,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Populated only when `status == Succeeded`.
    pub result: Option<JobOutcome>,
    /// Populated only when `status == Failed`. Always a rendered message,
    /// never a raw error object; job records cross a serialization boundary.
    pub error: Option<String>,
}

impl JobRecord {
    pub fn new(spec: JobSpec) -> Self {
        JobRecord {
            id: JobId::new(),
            spec,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
        }
    }
}
