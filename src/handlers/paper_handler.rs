//! handlers/paper_handler.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::models::animation_model::RenderQuality;
use crate::models::paper_model::{PaperListResponse, PaperSearchItem};
use crate::models::pipeline_model::{PipelineOptions, ProcessRequest};
use crate::models::segment_model::SegmentSummary;
use crate::services::job_runner::collect_job_videos;
use crate::services::paper_service::PaperService;
use crate::services::pipeline_service::{LogProgress, PipelineService};
use crate::services::video_service::VideoService;

/// POST /process (pipeline síncrono)
pub async fn process_paper_endpoint(
    pipeline: web::Data<PipelineService>,
    videos: web::Data<VideoService>,
    body: web::Json<ProcessRequest>,
) -> HttpResponse {
    let req = body.into_inner();
    if req.arxiv_id.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "arxiv_id is required"
        }));
    }
    let quality = match req.quality.as_deref() {
        None => RenderQuality::Medium,
        Some(q) => match RenderQuality::parse(q) {
            Some(q) => q,
            None => {
                return HttpResponse::BadRequest().json(json!({
                    "error": "Invalid quality",
                    "details": format!("'{}' (expected low, medium or high)", q)
                }))
            }
        },
    };
    let options = PipelineOptions {
        render: req.render,
        save_to_db: req.save_to_db,
        quality,
        segment_animations: true,
    };

    let result = pipeline
        .process_paper(&req.arxiv_id, options, &LogProgress)
        .await;
    let video_urls = collect_job_videos(&result, &videos);
    let status = if result.success { "completed" } else { "failed" };

    let body = json!({
        "status": status,
        "paper": result.paper.as_ref().map(PaperSearchItem::from),
        "segments": result.segments.iter().map(SegmentSummary::from).collect::<Vec<_>>(),
        "animations": result.animations.iter().map(|a| json!({
            "kind": a.kind,
            "segment_index": a.segment_index,
            "topic": a.topic,
            "status": a.status,
            "scene_name": a.scene_name,
            "duration_seconds": a.duration_seconds,
            "error": a.error,
        })).collect::<Vec<_>>(),
        "videos": video_urls,
        "timings": result.timings,
        "error": result.error,
        "message": format!("Processed paper with {} videos generated", video_urls.len()),
    });

    if result.success {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::InternalServerError().json(body)
    }
}

/// GET /papers
pub async fn list_papers_endpoint(papers: web::Data<PaperService>) -> HttpResponse {
    match papers.list_papers().await {
        Ok(list) => HttpResponse::Ok().json(PaperListResponse {
            count: list.len(),
            papers: list,
        }),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}

/// GET /papers/{arxiv_id}
pub async fn get_paper_endpoint(
    papers: web::Data<PaperService>,
    path: web::Path<String>,
) -> HttpResponse {
    let arxiv_id = path.into_inner();

    match papers.get_paper_detail(&arxiv_id).await {
        Ok(Some(detail)) => HttpResponse::Ok().json(detail),
        Ok(None) => HttpResponse::NotFound().json(json!({
            "error": "Paper not found",
            "details": arxiv_id
        })),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}
