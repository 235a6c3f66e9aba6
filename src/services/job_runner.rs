//! services/job_runner.rs
//! Ejecuta jobs de generación en segundo plano y avisa por webhook al terminar.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde_json::json;

use crate::models::animation_model::{AnimationKind, RenderQuality};
use crate::models::job_model::{GenerateRequest, JobRecord, JobStatusResponse, JobVideo};
use crate::models::pipeline_model::{PipelineOptions, PipelineResult};
use crate::services::job_service::{JobProgress, JobService};
use crate::services::pipeline_service::PipelineService;
use crate::services::video_service::VideoService;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);
pub const INTERRUPTED_ERROR: &str = "Job interrupted by server restart";

/// Videos renderizados del resultado, con sus URLs públicas
pub fn collect_job_videos(result: &PipelineResult, videos: &VideoService) -> Vec<JobVideo> {
    result
        .animations
        .iter()
        .filter(|a| a.is_rendered())
        .filter_map(|a| {
            let path = a.file_path.as_ref()?;
            let (url, download_url) = videos.url_for(path)?;
            Some(JobVideo {
                kind: a.kind.as_str().to_string(),
                topic: match a.kind {
                    AnimationKind::Full => "Full Introduction".to_string(),
                    AnimationKind::Segment => a.topic.clone(),
                },
                url,
                download_url,
                duration_seconds: a.duration_seconds,
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct JobRunner {
    jobs: JobService,
    pipeline: PipelineService,
    videos: VideoService,
    http: reqwest::Client,
}

impl JobRunner {
    pub fn new(jobs: JobService, pipeline: PipelineService, videos: VideoService) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .context("No se pudo crear el cliente HTTP de webhooks")?;
        Ok(JobRunner {
            jobs,
            pipeline,
            videos,
            http,
        })
    }

    pub fn jobs(&self) -> &JobService {
        &self.jobs
    }

    /// Crea el job y lo lanza en una tarea aparte.
    pub async fn submit(&self, req: &GenerateRequest, owner: Option<&str>) -> Result<JobRecord> {
        if req.arxiv_id.trim().is_empty() {
            return Err(anyhow!("arxiv_id es obligatorio"));
        }
        if RenderQuality::parse(&req.quality).is_none() {
            return Err(anyhow!("quality inválida: {} (low, medium, high)", req.quality));
        }
        let job = self.jobs.create_job(req, owner).await?;
        let runner = self.clone();
        let queued = job.clone();
        tokio::spawn(async move {
            runner.run(queued).await;
        });
        Ok(job)
    }

    /// Procesa el job hasta completed/failed.
    pub async fn run(&self, job: JobRecord) {
        log::info!("(run) Iniciando job {} ({})", job.id, job.arxiv_id);
        let options = PipelineOptions {
            render: job.render,
            save_to_db: true,
            quality: RenderQuality::parse(&job.quality).unwrap_or(RenderQuality::Low),
            segment_animations: true,
        };
        let progress = JobProgress::new(self.jobs.clone(), job.id.clone());

        let result = self
            .pipeline
            .process_paper(&job.arxiv_id, options, &progress)
            .await;

        if result.success {
            let videos = collect_job_videos(&result, &self.videos);
            if let Err(e) = self.jobs.complete_job(&job.id, &videos).await {
                log::error!("(run) No se pudo completar el job {}: {:#}", job.id, e);
                return;
            }
            log::info!("(run) Job {} completo ({} videos)", job.id, videos.len());
            if let Some(url) = job.webhook_url.as_deref() {
                let data = match self.jobs.get_job(&job.id).await {
                    Ok(Some(record)) => json!(JobStatusResponse::from(record)),
                    _ => json!({ "videos": videos }),
                };
                let payload = json!({
                    "event": "job.completed",
                    "job_id": job.id,
                    "data": data,
                });
                self.notify_webhook(url, &payload).await;
            }
        } else {
            let error = result
                .error
                .unwrap_or_else(|| "Unknown error".to_string());
            self.fail(&job, &error).await;
        }
    }

    /// Marca el job como fallido y avisa con `job.failed`.
    async fn fail(&self, job: &JobRecord, error: &str) {
        if let Err(e) = self.jobs.fail_job(&job.id, error).await {
            log::error!("(fail) No se pudo marcar el job {} como fallido: {:#}", job.id, e);
        }
        log::warn!("(fail) Job {} falló: {}", job.id, error);
        if let Some(url) = job.webhook_url.as_deref() {
            let payload = json!({
                "event": "job.failed",
                "job_id": job.id,
                "error": error,
            });
            self.notify_webhook(url, &payload).await;
        }
    }

    /// Al arrancar: los jobs que otro proceso dejó a medias pasan a "failed".
    pub async fn recover_interrupted(&self) -> Result<usize> {
        let pending = self.jobs.unfinished_jobs().await?;
        for job in &pending {
            self.fail(job, INTERRUPTED_ERROR).await;
        }
        if !pending.is_empty() {
            log::warn!(
                "(recover_interrupted) {} jobs interrumpidos marcados como fallidos",
                pending.len()
            );
        }
        Ok(pending.len())
    }

    /// POST al webhook; los errores sólo se loguean.
    pub async fn notify_webhook(&self, url: &str, payload: &serde_json::Value) {
        match self.http.post(url).json(payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                log::info!("(notify_webhook) Webhook entregado a {}", url);
            }
            Ok(resp) => {
                log::warn!("(notify_webhook) {} respondió {}", url, resp.status());
            }
            Err(e) => {
                log::warn!("(notify_webhook) No se pudo notificar a {}: {}", url, e);
            }
        }
    }
}
