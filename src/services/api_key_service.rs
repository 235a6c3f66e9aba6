//! services/api_key_service.rs
//! Alta y verificación de API keys (`xb_...`), más la key maestra del entorno.

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use rand::RngCore;
use sqlx::{Pool, Row, Sqlite};

use crate::models::api_key_model::{ApiKeyCreate, ApiKeyCreated, ApiUser};
use crate::services::paper_service::parse_ts;

pub const KEY_PREFIX: &str = "xb_";
pub const FREE_TIER: &str = "free";
pub const PRO_TIER: &str = "pro";

/// `xb_` + 24 bytes aleatorios en base64 url-safe (32 caracteres)
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", KEY_PREFIX, URL_SAFE_NO_PAD.encode(bytes))
}

#[derive(Clone, Debug)]
pub struct ApiKeyService {
    db_pool: Pool<Sqlite>,
    master_key: Option<String>,
}

impl ApiKeyService {
    pub fn new(db_pool: Pool<Sqlite>, master_key: Option<String>) -> Self {
        ApiKeyService {
            db_pool,
            master_key: master_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub async fn create_key(&self, req: &ApiKeyCreate) -> Result<ApiKeyCreated> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(anyhow!("El nombre es obligatorio"));
        }

        let key = generate_api_key();
        sqlx::query(
            r#"
            INSERT INTO api_keys (key, name, email, tier, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&key)
        .bind(name)
        .bind(req.email.as_deref().map(str::trim).filter(|e| !e.is_empty()))
        .bind(FREE_TIER)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db_pool)
        .await
        .context("Fallo al guardar API key")?;

        log::info!("(create_key) API key creada para '{}'", name);
        Ok(ApiKeyCreated {
            api_key: key,
            name: name.to_string(),
            tier: FREE_TIER.to_string(),
            message: "Store this key securely; it will not be shown again".to_string(),
        })
    }

    /// Usuario de la key, o None si no existe.
    pub async fn verify(&self, key: &str) -> Result<Option<ApiUser>> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(None);
        }

        if self.master_key.as_deref() == Some(key) {
            return Ok(Some(ApiUser {
                key: key.to_string(),
                name: "master".to_string(),
                email: None,
                tier: PRO_TIER.to_string(),
                created_at: Utc::now(),
            }));
        }

        let row = sqlx::query("SELECT key, name, email, tier, created_at FROM api_keys WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.db_pool)
            .await
            .context("Fallo al verificar API key")?;

        match row {
            Some(row) => Ok(Some(ApiUser {
                key: row.try_get("key")?,
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                tier: row.try_get("tier")?,
                created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
            })),
            None => Ok(None),
        }
    }
}
