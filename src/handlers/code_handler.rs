//! handlers/code_handler.rs
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::handlers::auth::require_user;
use crate::models::animation_model::GenerateCodeRequest;
use crate::services::api_key_service::ApiKeyService;
use crate::services::pipeline_service::PipelineService;

/// POST /api/generate-code (requiere API key)
pub async fn generate_code_endpoint(
    req: HttpRequest,
    keys: web::Data<ApiKeyService>,
    pipeline: web::Data<PipelineService>,
    body: web::Json<GenerateCodeRequest>,
) -> HttpResponse {
    if let Err(resp) = require_user(&req, &keys).await {
        return resp;
    }
    let request = body.into_inner();

    match pipeline
        .generate_code_for_topic(&request.topic, &request.concepts, &request.style)
        .await
    {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(e) => HttpResponse::BadRequest().json(json!({
            "error": "Could not generate code",
            "details": format!("{:#}", e)
        })),
    }
}
