//! sdk/client.rs
//! `XeBotClient`: búsqueda, jobs de animación, código Manim y descarga de videos.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::models::animation_model::{GenerateCodeRequest, GenerateCodeResponse};
use crate::models::job_model::{
    GenerateRequest, GenerateResponse, JobStatus, JobStatusResponse, JobVideo,
};
use crate::models::paper_model::{PaperSearchItem, SearchResponse};
use crate::models::video_model::{VideoInfo, VideoListResponse};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(900);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Opciones de `generate_animation`
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub quality: String,
    pub render: bool,
    /// si es false se devuelve apenas se crea el job
    pub wait: bool,
    pub timeout: Duration,
    pub webhook_url: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            quality: "low".to_string(),
            render: true,
            wait: true,
            timeout: DEFAULT_WAIT_TIMEOUT,
            webhook_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimationResult {
    pub job_id: String,
    pub status: JobStatus,
    pub paper_title: Option<String>,
    pub videos: Vec<JobVideo>,
    pub segments_count: usize,
}

#[derive(Clone)]
pub struct XeBotClient {
    base_url: String,
    http: reqwest::Client,
    poll_interval: Duration,
}

impl XeBotClient {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .context("API key inválida para el header Authorization")?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("No se pudo crear el cliente HTTP")?;

        Ok(XeBotClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Cambia el intervalo de polling de `generate_animation`.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    async fn parse<T: DeserializeOwned>(resp: reqwest::Response, what: &str) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("{} falló (HTTP {}): {}", what, status, body));
        }
        resp.json::<T>()
            .await
            .with_context(|| format!("Respuesta inválida de {}", what))
    }

    /// GET /api/search (máximo 20 resultados)
    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<PaperSearchItem>> {
        let resp = self
            .http
            .get(self.url("/api/search"))
            .query(&[
                ("query", query.to_string()),
                ("max_results", max_results.min(20).to_string()),
            ])
            .send()
            .await
            .context("Error de red en search")?;
        let body: SearchResponse = Self::parse(resp, "search").await?;
        Ok(body.papers)
    }

    /// Crea el job y, si `wait`, hace polling hasta completed/failed o timeout.
    pub async fn generate_animation(
        &self,
        arxiv_id: &str,
        options: GenerateOptions,
    ) -> Result<AnimationResult> {
        let request = GenerateRequest {
            arxiv_id: arxiv_id.to_string(),
            quality: options.quality.clone(),
            render: options.render,
            webhook_url: options.webhook_url.clone(),
        };
        let resp = self
            .http
            .post(self.url("/api/generate"))
            .json(&request)
            .send()
            .await
            .context("Error de red en generate")?;
        let created: GenerateResponse = Self::parse(resp, "generate").await?;
        log::info!("(generate_animation) Job {} creado", created.job_id);

        if !options.wait {
            return Ok(AnimationResult {
                job_id: created.job_id,
                status: created.status,
                paper_title: None,
                videos: vec![],
                segments_count: 0,
            });
        }

        let started = Instant::now();
        while started.elapsed() < options.timeout {
            let status = self.get_job_status(&created.job_id).await?;
            match status.status {
                JobStatus::Completed => {
                    return Ok(AnimationResult {
                        job_id: status.job_id,
                        status: status.status,
                        paper_title: status.paper.map(|p| p.title),
                        segments_count: status.segments.len(),
                        videos: status.videos,
                    })
                }
                JobStatus::Failed => {
                    return Err(anyhow!(
                        "Animation failed: {}",
                        status.error.unwrap_or_else(|| "unknown error".to_string())
                    ))
                }
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }

        Err(anyhow!(
            "Animation timed out after {} seconds",
            options.timeout.as_secs()
        ))
    }

    pub async fn get_job_status(&self, job_id: &str) -> Result<JobStatusResponse> {
        let resp = self
            .http
            .get(self.url(&format!("/api/jobs/{}", job_id)))
            .send()
            .await
            .context("Error de red en get_job_status")?;
        Self::parse(resp, "get_job_status").await
    }

    /// POST /api/generate-code (sin render)
    pub async fn generate_code(
        &self,
        topic: &str,
        concepts: &[String],
        style: &str,
    ) -> Result<GenerateCodeResponse> {
        let request = GenerateCodeRequest {
            topic: topic.to_string(),
            concepts: concepts.to_vec(),
            style: style.to_string(),
        };
        let resp = self
            .http
            .post(self.url("/api/generate-code"))
            .json(&request)
            .send()
            .await
            .context("Error de red en generate_code")?;
        Self::parse(resp, "generate_code").await
    }

    pub async fn list_videos(&self) -> Result<Vec<VideoInfo>> {
        let resp = self
            .http
            .get(self.url("/api/videos"))
            .send()
            .await
            .context("Error de red en list_videos")?;
        let body: VideoListResponse<VideoInfo> = Self::parse(resp, "list_videos").await?;
        Ok(body.videos)
    }

    /// Descarga un video (URL absoluta o ruta relativa al servidor). Devuelve los bytes escritos.
    pub async fn download_video(&self, video_url: &str, save_path: &Path) -> Result<u64> {
        let resp = self
            .http
            .get(self.url(video_url))
            .send()
            .await
            .context("Error de red en download_video")?;
        if !resp.status().is_success() {
            return Err(anyhow!(
                "download_video falló (HTTP {}) para {}",
                resp.status(),
                video_url
            ));
        }

        if let Some(parent) = save_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::File::create(save_path)
            .await
            .with_context(|| format!("No se pudo crear {:?}", save_path))?;

        let mut written = 0u64;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Error leyendo el video")?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        log::info!("(download_video) {} bytes en {:?}", written, save_path);
        Ok(written)
    }
}
