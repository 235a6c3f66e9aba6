//! handlers/job_handler.rs
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::handlers::auth::{optional_user, require_user};
use crate::models::job_model::{GenerateRequest, GenerateResponse, JobStatusResponse};
use crate::services::api_key_service::ApiKeyService;
use crate::services::job_runner::JobRunner;
use crate::services::job_service::JobService;

#[derive(Deserialize)]
pub struct PaginationQuery {
    page: Option<u64>,
    page_size: Option<u64>,
}

/// POST /api/generate
pub async fn generate_endpoint(
    req: HttpRequest,
    keys: web::Data<ApiKeyService>,
    runner: web::Data<JobRunner>,
    body: web::Json<GenerateRequest>,
) -> HttpResponse {
    let user = optional_user(&req, &keys).await;
    let request = body.into_inner();

    match runner.submit(&request, user.as_ref().map(|u| u.key.as_str())).await {
        Ok(job) => HttpResponse::Accepted().json(GenerateResponse {
            status_url: format!("/api/jobs/{}", job.id),
            message: format!(
                "Animation job queued. Check status at /api/jobs/{}",
                job.id
            ),
            job_id: job.id,
            status: job.status,
        }),
        Err(e) => HttpResponse::BadRequest().json(json!({
            "error": "Could not create job",
            "details": format!("{:#}", e)
        })),
    }
}

/// GET /api/jobs/{id}
pub async fn get_job_endpoint(
    jobs: web::Data<JobService>,
    path: web::Path<String>,
) -> HttpResponse {
    let job_id = path.into_inner();

    match jobs.get_job(&job_id).await {
        Ok(Some(job)) => HttpResponse::Ok().json(JobStatusResponse::from(job)),
        Ok(None) => HttpResponse::NotFound().json(json!({
            "error": "Job not found",
            "details": job_id
        })),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}

/// GET /api/jobs (sólo los jobs de la key)
pub async fn list_jobs_endpoint(
    req: HttpRequest,
    keys: web::Data<ApiKeyService>,
    jobs: web::Data<JobService>,
    query: web::Query<PaginationQuery>,
) -> HttpResponse {
    let user = match require_user(&req, &keys).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(10);

    match jobs.list_jobs(Some(&user.key), page, page_size).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}
