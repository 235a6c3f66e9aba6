//! app.rs
use std::sync::Arc;

use actix_files::Files;
use actix_web::{error, web, HttpResponse};
use anyhow::Result;
use serde_json::json;
use sqlx::{Pool, Sqlite};

use crate::config::ServerConfig;
use crate::handlers::{
    code_handler, job_handler, key_handler, paper_handler, root_handler, search_handler,
    video_handler,
};
use crate::services::animation_service::AnimationService;
use crate::services::api_key_service::ApiKeyService;
use crate::services::arxiv_service::PaperSource;
use crate::services::job_runner::JobRunner;
use crate::services::job_service::JobService;
use crate::services::llm_service::LlmService;
use crate::services::paper_service::PaperService;
use crate::services::pipeline_service::PipelineService;
use crate::services::video_service::VideoService;

/// Servicios compartidos por todos los workers
#[derive(Clone)]
pub struct AppServices {
    pub paper_source: Arc<dyn PaperSource>,
    pub papers: PaperService,
    pub jobs: JobService,
    pub keys: ApiKeyService,
    pub videos: VideoService,
    pub pipeline: PipelineService,
    pub runner: JobRunner,
}

impl AppServices {
    pub fn new(
        db_pool: Pool<Sqlite>,
        paper_source: Arc<dyn PaperSource>,
        llm: LlmService,
        renderer: AnimationService,
        server: &ServerConfig,
    ) -> Result<Self> {
        let anim_config = renderer.config().clone();
        let videos = VideoService::new(
            anim_config.animations_videos_dir(),
            anim_config.media_videos_dir.clone(),
            server.public_base_url.clone(),
        );
        let papers = PaperService::new(db_pool.clone());
        let jobs = JobService::new(db_pool.clone());
        let keys = ApiKeyService::new(db_pool, server.master_api_key.clone());
        let pipeline = PipelineService::new(
            paper_source.clone(),
            llm,
            renderer,
            Some(papers.clone()),
            Some(videos.clone()),
        );
        let runner = JobRunner::new(jobs.clone(), pipeline.clone(), videos.clone())?;

        Ok(AppServices {
            paper_source,
            papers,
            jobs,
            keys,
            videos,
            pipeline,
            runner,
        })
    }

    /// Registra cada servicio como `web::Data`
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.paper_source.clone()))
            .app_data(web::Data::new(self.papers.clone()))
            .app_data(web::Data::new(self.jobs.clone()))
            .app_data(web::Data::new(self.keys.clone()))
            .app_data(web::Data::new(self.videos.clone()))
            .app_data(web::Data::new(self.pipeline.clone()))
            .app_data(web::Data::new(self.runner.clone()));
    }

    /// Archivos estáticos de video
    pub fn static_files(&self, cfg: &mut web::ServiceConfig) {
        cfg.service(Files::new("/animations/videos", self.videos.animations_dir()))
            .service(Files::new("/media/videos", self.videos.media_dir()));
    }
}

/// JSON inválido → 400 con el mismo formato de error que el resto de la API
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let details = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({
                "error": "Invalid request body",
                "details": details
            })),
        )
        .into()
    })
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "Not found" }))
}

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/", web::get().to(root_handler::root_endpoint))
        .route("/health", web::get().to(root_handler::health_endpoint))
        .service(
            web::scope("/search")
                .route("/arxiv", web::get().to(search_handler::search_arxiv_endpoint))
                .route("/domain", web::get().to(search_handler::search_domain_endpoint)),
        )
        .route("/process", web::post().to(paper_handler::process_paper_endpoint))
        .service(
            web::scope("/papers")
                .route("", web::get().to(paper_handler::list_papers_endpoint))
                .route(
                    "/{arxiv_id:.*}",
                    web::get().to(paper_handler::get_paper_endpoint),
                ),
        )
        .service(
            web::scope("/videos")
                .route("", web::get().to(video_handler::list_videos_endpoint))
                .route(
                    "/enriched",
                    web::get().to(video_handler::list_enriched_videos_endpoint),
                )
                .route(
                    "/{video_id}",
                    web::get().to(video_handler::get_video_endpoint),
                ),
        )
        .route(
            "/download/{path:.*}",
            web::get().to(video_handler::download_video_endpoint),
        )
        .service(
            web::scope("/api")
                .route("/keys/create", web::post().to(key_handler::create_key_endpoint))
                .route("/search", web::get().to(search_handler::api_search_endpoint))
                .route("/generate", web::post().to(job_handler::generate_endpoint))
                .route(
                    "/generate-code",
                    web::post().to(code_handler::generate_code_endpoint),
                )
                .route("/videos", web::get().to(video_handler::api_list_videos_endpoint))
                .service(
                    web::scope("/jobs")
                        .route("", web::get().to(job_handler::list_jobs_endpoint))
                        .route("/{id}", web::get().to(job_handler::get_job_endpoint)),
                ),
        )
        .default_service(web::route().to(not_found));
}
