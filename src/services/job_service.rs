use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use crate::models::job_model::{
    GenerateRequest, JobRecord, JobStatus, JobStatusResponse, JobVideo, ListJobsResponse,
};
use crate::models::paper_model::{PaperData, PaperSearchItem};
use crate::models::pipeline_model::PipelineStage;
use crate::models::segment_model::{Segment, SegmentSummary};
use crate::services::paper_service::parse_ts;
use crate::services::pipeline_service::ProgressSink;

const JOB_COLUMNS: &str = "id, arxiv_id, quality, render, status, stage, stage_detail, progress, \
     owner, paper, segments, videos, error, webhook_url, created_at, updated_at, completed_at";

/// Id corto de job (12 caracteres hex)
pub fn new_job_id() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

fn job_from_row(row: &SqliteRow) -> Result<JobRecord> {
    let status: String = row.try_get("status")?;
    let paper: Option<String> = row.try_get("paper")?;
    let segments: String = row.try_get("segments")?;
    let videos: String = row.try_get("videos")?;
    let completed_at: Option<String> = row.try_get("completed_at")?;
    let progress: i64 = row.try_get("progress")?;

    Ok(JobRecord {
        id: row.try_get("id")?,
        arxiv_id: row.try_get("arxiv_id")?,
        quality: row.try_get("quality")?,
        render: row.try_get::<i64, _>("render")? != 0,
        status: JobStatus::parse(&status).unwrap_or(JobStatus::Queued),
        stage: row.try_get("stage")?,
        stage_detail: row.try_get("stage_detail")?,
        progress: progress.clamp(0, 100) as u8,
        owner: row.try_get("owner")?,
        paper: paper.and_then(|p| serde_json::from_str(&p).ok()),
        segments: serde_json::from_str(&segments).unwrap_or_default(),
        videos: serde_json::from_str(&videos).unwrap_or_default(),
        error: row.try_get("error")?,
        webhook_url: row.try_get("webhook_url")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at")?)?,
        completed_at: completed_at.as_deref().map(parse_ts).transpose()?,
    })
}

#[derive(Clone, Debug)]
pub struct JobService {
    db_pool: Pool<Sqlite>,
}

impl JobService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        JobService { db_pool }
    }

    /// Crea el job en DB con estado "queued"
    pub async fn create_job(&self, req: &GenerateRequest, owner: Option<&str>) -> Result<JobRecord> {
        let job_id = new_job_id();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, arxiv_id, quality, render, status, stage, progress, owner,
                webhook_url, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, 'queued', 'queued', 0, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&job_id)
        .bind(req.arxiv_id.trim())
        .bind(&req.quality)
        .bind(req.render as i64)
        .bind(owner)
        .bind(&req.webhook_url)
        .bind(&now)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar job")?;

        log::info!("(create_job) Job {} creado para {}", job_id, req.arxiv_id);
        self.get_job(&job_id)
            .await?
            .context("El job recién creado no aparece en la DB")
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let row = sqlx::query(&format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS))
            .bind(job_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Fallo al buscar job")?;
        row.as_ref().map(job_from_row).transpose()
    }

    /// Actualiza etapa y progreso (pasa el job a "processing")
    pub async fn update_progress(
        &self,
        job_id: &str,
        stage: &str,
        detail: &str,
        progress: u8,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'processing',
                stage = ?2,
                stage_detail = ?3,
                progress = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(job_id)
        .bind(stage)
        .bind(detail)
        .bind(progress.min(100) as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db_pool)
        .await
        .context("Fallo al actualizar progreso del job")?;
        Ok(())
    }

    pub async fn set_paper(&self, job_id: &str, paper: &PaperSearchItem) -> Result<()> {
        sqlx::query("UPDATE jobs SET paper = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(job_id)
            .bind(serde_json::to_string(paper)?)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.db_pool)
            .await
            .context("Fallo al guardar paper del job")?;
        Ok(())
    }

    pub async fn set_segments(&self, job_id: &str, segments: &[SegmentSummary]) -> Result<()> {
        sqlx::query("UPDATE jobs SET segments = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(job_id)
            .bind(serde_json::to_string(segments)?)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.db_pool)
            .await
            .context("Fallo al guardar segmentos del job")?;
        Ok(())
    }

    pub async fn complete_job(&self, job_id: &str, videos: &[JobVideo]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed',
                stage = 'completed',
                stage_detail = NULL,
                progress = 100,
                videos = ?2,
                error = NULL,
                updated_at = ?3,
                completed_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(job_id)
        .bind(serde_json::to_string(videos)?)
        .bind(&now)
        .execute(&self.db_pool)
        .await
        .context("Fallo al completar job")?;
        Ok(())
    }

    pub async fn fail_job(&self, job_id: &str, error: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed',
                stage = 'failed',
                progress = 0,
                error = ?2,
                updated_at = ?3,
                completed_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(job_id)
        .bind(error)
        .bind(&now)
        .execute(&self.db_pool)
        .await
        .context("Fallo al marcar job como fallido")?;
        Ok(())
    }

    /// Jobs que quedaron en "queued" o "processing" (p. ej. tras un reinicio)
    pub async fn unfinished_jobs(&self) -> Result<Vec<JobRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM jobs WHERE status IN ('queued', 'processing') ORDER BY created_at",
            JOB_COLUMNS
        ))
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al buscar jobs pendientes")?;
        rows.iter().map(job_from_row).collect()
    }

    /// Lista jobs con paginación; con `owner` sólo los de esa key
    pub async fn list_jobs(
        &self,
        owner: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<ListJobsResponse> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let offset = (page - 1) * page_size;

        // total
        let total_row = sqlx::query("SELECT COUNT(*) AS cnt FROM jobs WHERE ?1 IS NULL OR owner = ?1")
            .bind(owner)
            .fetch_one(&self.db_pool)
            .await?;
        let total: i64 = total_row.try_get("cnt")?;

        // items
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM jobs
            WHERE ?1 IS NULL OR owner = ?1
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
            JOB_COLUMNS
        ))
        .bind(owner)
        .bind(page_size as i64)
        .bind(offset as i64)
        .fetch_all(&self.db_pool)
        .await?;

        let items = rows
            .iter()
            .map(|r| job_from_row(r).map(JobStatusResponse::from))
            .collect::<Result<Vec<_>>>()?;

        Ok(ListJobsResponse {
            total: total as u64,
            page,
            page_size,
            items,
        })
    }
}

/// Reporta el avance del pipeline en la fila del job
#[derive(Clone, Debug)]
pub struct JobProgress {
    jobs: JobService,
    job_id: String,
}

impl JobProgress {
    pub fn new(jobs: JobService, job_id: impl Into<String>) -> Self {
        JobProgress {
            jobs,
            job_id: job_id.into(),
        }
    }
}

#[async_trait]
impl ProgressSink for JobProgress {
    async fn stage(&self, stage: PipelineStage, detail: &str, progress: u8) {
        if let Err(e) = self
            .jobs
            .update_progress(&self.job_id, stage.as_str(), detail, progress)
            .await
        {
            log::warn!("(JobProgress) No se pudo actualizar {}: {:#}", self.job_id, e);
        }
    }

    async fn paper_fetched(&self, paper: &PaperData) {
        if let Err(e) = self.jobs.set_paper(&self.job_id, &PaperSearchItem::from(paper)).await {
            log::warn!("(JobProgress) No se pudo guardar el paper de {}: {:#}", self.job_id, e);
        }
    }

    async fn segmented(&self, segments: &[Segment]) {
        let summaries: Vec<SegmentSummary> = segments.iter().map(SegmentSummary::from).collect();
        if let Err(e) = self.jobs.set_segments(&self.job_id, &summaries).await {
            log::warn!("(JobProgress) No se pudieron guardar segmentos de {}: {:#}", self.job_id, e);
        }
    }
}
