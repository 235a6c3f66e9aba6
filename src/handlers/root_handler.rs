//! handlers/root_handler.rs
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::services::database;
use crate::services::paper_service::PaperService;
use crate::services::pipeline_service::PipelineService;
use crate::services::video_service::VideoService;

/// GET /
pub async fn root_endpoint() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "name": "Xe-Bot API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Research Paper Animation Generator",
        "endpoints": {
            "POST /process": "Process an arXiv paper",
            "GET /search/arxiv": "Search arXiv papers",
            "GET /search/domain": "Search papers by domain",
            "GET /papers": "List all processed papers",
            "GET /papers/{arxiv_id}": "Get paper details",
            "GET /videos": "List all generated videos",
            "GET /videos/enriched": "List videos with paper information",
            "GET /videos/{video_id}": "Get video URL",
            "GET /download/{path}": "Download video file",
            "GET /health": "Health check",
            "POST /api/keys/create": "Create an API key",
            "GET /api/search": "Search arXiv papers (public API)",
            "POST /api/generate": "Generate animation (async job)",
            "GET /api/jobs/{id}": "Job status",
            "GET /api/jobs": "List your jobs (API key required)",
            "POST /api/generate-code": "Manim code only (API key required)",
            "GET /api/videos": "List all videos"
        }
    }))
}

/// GET /health
pub async fn health_endpoint(
    papers: web::Data<PaperService>,
    pipeline: web::Data<PipelineService>,
    videos: web::Data<VideoService>,
) -> HttpResponse {
    let db_status = match database::ping(papers.pool()).await {
        Ok(()) => "healthy".to_string(),
        Err(e) => {
            let msg = format!("{:#}", e);
            format!("unhealthy: {}", crate::utils::truncate_chars(&msg, 50))
        }
    };
    let installed = |ok: bool| if ok { "installed" } else { "not found" };

    HttpResponse::Ok().json(json!({
        "status": if db_status == "healthy" { "healthy" } else { "degraded" },
        "timestamp": Utc::now().to_rfc3339(),
        "videos_available": videos.list_videos().len(),
        "checks": {
            "database": db_status,
            "ffmpeg": installed(which::which("ffmpeg").is_ok()),
            "manim": installed(pipeline.renderer().can_render()),
        }
    }))
}
