//! handlers/video_handler.rs
use std::collections::HashSet;
use std::path::PathBuf;

use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::handlers::auth::optional_user;
use crate::models::video_model::{EnrichedVideo, VideoInfo, VideoListResponse};
use crate::services::api_key_service::ApiKeyService;
use crate::services::paper_service::PaperService;
use crate::services::video_service::VideoService;

fn video_list(videos: &VideoService) -> VideoListResponse<VideoInfo> {
    let list = videos.list_videos();
    VideoListResponse {
        count: list.len(),
        videos: list,
        base_url: videos.base_url().to_string(),
    }
}

/// Tipo de animación deducido del nombre del archivo
fn kind_from_path(path: &str) -> Option<String> {
    if path.contains("full_introduction") {
        Some("full".to_string())
    } else if path.contains("segment_") {
        Some("segment".to_string())
    } else {
        None
    }
}

/// GET /videos
pub async fn list_videos_endpoint(videos: web::Data<VideoService>) -> HttpResponse {
    HttpResponse::Ok().json(video_list(&videos))
}

/// GET /videos/enriched
/// Primero las animaciones de la DB con archivo en disco, después los videos sueltos.
pub async fn list_enriched_videos_endpoint(
    videos: web::Data<VideoService>,
    papers: web::Data<PaperService>,
) -> HttpResponse {
    let fs_videos = videos.list_videos();

    let listings = match papers.list_animations_with_paper().await {
        Ok(listings) => listings,
        Err(e) => {
            log::warn!("(list_enriched_videos) DB no disponible: {:#}", e);
            return HttpResponse::Ok().json(json!({
                "videos": fs_videos,
                "count": fs_videos.len(),
                "base_url": videos.base_url(),
                "warning": format!("Database unavailable: {:#}", e),
            }));
        }
    };

    let mut enriched = Vec::new();
    let mut used_paths = HashSet::new();

    for listing in listings {
        let Some(file_path) = listing.animation.file_path.as_deref() else {
            continue;
        };
        let path = PathBuf::from(file_path);
        if !path.is_file() {
            continue;
        }
        let Some((url, download_url)) = videos.url_for(&path) else {
            continue;
        };
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let relative = videos
            .relative_path(&path)
            .unwrap_or_else(|| filename.clone());
        used_paths.insert(relative.clone());

        enriched.push(EnrichedVideo {
            video: VideoInfo {
                id: format!("db_{}", listing.animation.id),
                filename,
                path: relative,
                url,
                download_url,
                size_bytes: listing.animation.file_size_bytes.unwrap_or(0).max(0) as u64,
                created_at: Some(listing.animation.created_at.to_rfc3339()),
                source: "database".to_string(),
            },
            arxiv_id: listing.arxiv_id,
            paper_title: Some(listing.paper_title),
            topic: listing.topic,
            kind: Some(listing.animation.kind),
            duration_seconds: listing.animation.duration_seconds,
        });
    }

    for video in fs_videos {
        if used_paths.contains(&video.path) {
            continue;
        }
        let kind = kind_from_path(&video.path);
        enriched.push(EnrichedVideo {
            video,
            arxiv_id: None,
            paper_title: None,
            topic: None,
            kind,
            duration_seconds: None,
        });
    }

    HttpResponse::Ok().json(VideoListResponse {
        count: enriched.len(),
        videos: enriched,
        base_url: videos.base_url().to_string(),
    })
}

/// GET /videos/{video_id}
pub async fn get_video_endpoint(
    videos: web::Data<VideoService>,
    path: web::Path<String>,
) -> HttpResponse {
    let video_id = path.into_inner();
    match videos.find_video(&video_id) {
        Some(video) => HttpResponse::Ok().json(video),
        None => HttpResponse::NotFound().json(json!({
            "error": "Video not found",
            "details": video_id
        })),
    }
}

/// GET /download/{path}
pub async fn download_video_endpoint(
    req: HttpRequest,
    videos: web::Data<VideoService>,
    path: web::Path<String>,
) -> HttpResponse {
    let requested = path.into_inner();
    let Some(file_path) = videos.resolve_download(&requested) else {
        return HttpResponse::NotFound().json(json!({
            "error": "Video not found",
            "details": requested
        }));
    };

    match NamedFile::open_async(&file_path).await {
        Ok(file) => {
            let filename = file_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("video.mp4")
                .to_string();
            file.set_content_disposition(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(filename)],
            })
            .into_response(&req)
        }
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Could not open video",
            "details": format!("{:?}", e)
        })),
    }
}

/// GET /api/videos (auth opcional)
pub async fn api_list_videos_endpoint(
    req: HttpRequest,
    keys: web::Data<ApiKeyService>,
    videos: web::Data<VideoService>,
) -> HttpResponse {
    if let Some(user) = optional_user(&req, &keys).await {
        log::info!("(api_list_videos) Listado pedido por {}", user.name);
    }
    HttpResponse::Ok().json(video_list(&videos))
}
