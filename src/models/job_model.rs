use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::paper_model::PaperSearchItem;
use super::segment_model::SegmentSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Video producido por un job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobVideo {
    pub kind: String,
    pub topic: String,
    pub url: String,
    pub download_url: String,
    pub duration_seconds: u64,
}

/// Job completo, como se guarda en la tabla `jobs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub arxiv_id: String,
    pub quality: String,
    pub render: bool,
    pub status: JobStatus,
    pub stage: Option<String>, // "fetching", "extracting", ...
    pub stage_detail: Option<String>,
    pub progress: u8,
    pub owner: Option<String>,
    pub paper: Option<PaperSearchItem>,
    pub segments: Vec<SegmentSummary>,
    pub videos: Vec<JobVideo>,
    pub error: Option<String>,
    pub webhook_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Request de POST /api/generate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub arxiv_id: String,
    #[serde(default = "default_quality")]
    pub quality: String,
    #[serde(default = "default_render")]
    pub render: bool,
    pub webhook_url: Option<String>,
}

fn default_quality() -> String {
    "low".to_string()
}

fn default_render() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
    pub status_url: String,
}

/// Vista pública de un job (GET /api/jobs/{id})
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub arxiv_id: String,
    pub status: JobStatus,
    pub stage: Option<String>,
    pub stage_detail: Option<String>,
    pub progress: u8,
    pub paper: Option<PaperSearchItem>,
    pub segments: Vec<SegmentSummary>,
    pub videos: Vec<JobVideo>,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl From<JobRecord> for JobStatusResponse {
    fn from(job: JobRecord) -> Self {
        JobStatusResponse {
            job_id: job.id,
            arxiv_id: job.arxiv_id,
            status: job.status,
            stage: job.stage,
            stage_detail: job.stage_detail,
            progress: job.progress,
            paper: job.paper,
            segments: job.segments,
            videos: job.videos,
            error: job.error,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
            completed_at: job.completed_at.map(|d| d.to_rfc3339()),
        }
    }
}

/// Para listar jobs con paginación
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListJobsResponse {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<JobStatusResponse>,
}
