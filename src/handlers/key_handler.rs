//! handlers/key_handler.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::models::api_key_model::ApiKeyCreate;
use crate::services::api_key_service::ApiKeyService;

/// POST /api/keys/create
pub async fn create_key_endpoint(
    keys: web::Data<ApiKeyService>,
    body: web::Json<ApiKeyCreate>,
) -> HttpResponse {
    let request = body.into_inner();
    if request.name.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "name is required"
        }));
    }

    match keys.create_key(&request).await {
        Ok(created) => HttpResponse::Ok().json(created),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}
