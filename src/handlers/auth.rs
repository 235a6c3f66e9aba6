//! handlers/auth.rs
//! API key en `Authorization: Bearer ...` (o `X-API-Key`).

use actix_web::{HttpRequest, HttpResponse};
use serde_json::json;

use crate::models::api_key_model::ApiUser;
use crate::services::api_key_service::ApiKeyService;

pub fn api_key_from_request(req: &HttpRequest) -> Option<String> {
    let headers = req.headers();
    if let Some(value) = headers.get("Authorization").and_then(|v| v.to_str().ok()) {
        let value = value.trim();
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .unwrap_or(value)
            .trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }
    headers
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Usuario si la key es válida; sin key o con key desconocida sigue como anónimo.
pub async fn optional_user(req: &HttpRequest, keys: &ApiKeyService) -> Option<ApiUser> {
    let key = api_key_from_request(req)?;
    match keys.verify(&key).await {
        Ok(user) => user,
        Err(e) => {
            log::warn!("(optional_user) Error verificando API key: {:#}", e);
            None
        }
    }
}

/// 401 si falta la key o no es válida.
pub async fn require_user(req: &HttpRequest, keys: &ApiKeyService) -> Result<ApiUser, HttpResponse> {
    match optional_user(req, keys).await {
        Some(user) => Ok(user),
        None => Err(HttpResponse::Unauthorized().json(json!({
            "error": "Invalid or missing API key",
            "details": "Get one at /api/keys/create"
        }))),
    }
}
