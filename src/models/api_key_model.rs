use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request de POST /api/keys/create
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyCreate {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyCreated {
    pub api_key: String,
    pub name: String,
    pub tier: String,
    pub message: String,
}

/// Usuario autenticado por API key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiUser {
    pub key: String,
    pub name: String,
    pub email: Option<String>,
    pub tier: String,
    pub created_at: DateTime<Utc>,
}
