//! config/app_config.rs
//! Configuración completa de la app, leída del entorno (.env cargado en main).

use std::path::PathBuf;
use std::time::Duration;

use super::animation_config::AnimationConfig;
use super::{env_or, env_parse};

const PLACEHOLDER_API_KEY: &str = "your_openrouter_api_key_here";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_model: String,
    pub request_timeout: Duration,
    pub max_attempts: u32,
    /// Espera mínima/máxima entre reintentos (backoff exponencial)
    pub retry_min_delay: Duration,
    pub retry_max_delay: Duration,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        LlmConfig {
            api_key: env_or("OPENROUTER_API_KEY", ""),
            base_url: env_or("OPENROUTER_BASE_URL", "https://openrouter.ai/api/v1"),
            default_model: env_or("DEFAULT_MODEL", "openai/gpt-4o-mini"),
            ..Self::default()
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty() && self.api_key != PLACEHOLDER_API_KEY
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            api_key: String::new(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            default_model: "openai/gpt-4o-mini".to_string(),
            request_timeout: Duration::from_secs(120),
            max_attempts: 3,
            retry_min_delay: Duration::from_secs(2),
            retry_max_delay: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArxivConfig {
    pub api_url: String,
    pub cache_dir: PathBuf,
    pub request_timeout: Duration,
    /// Páginas del PDF que se pasan a texto (la introducción está al inicio)
    pub max_pages: u32,
}

impl ArxivConfig {
    pub fn from_env() -> Self {
        ArxivConfig {
            api_url: env_or("ARXIV_API_URL", "http://export.arxiv.org/api/query"),
            cache_dir: PathBuf::from(env_or("CACHE_DIR", "./cache")),
            ..Self::default()
        }
    }

    pub fn papers_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("papers")
    }
}

impl Default for ArxivConfig {
    fn default() -> Self {
        ArxivConfig {
            api_url: "http://export.arxiv.org/api/query".to_string(),
            cache_dir: PathBuf::from("./cache"),
            request_timeout: Duration::from_secs(60),
            max_pages: 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// URL pública usada para armar los links de video
    pub public_base_url: String,
    /// Key maestra (tier "pro")
    pub master_api_key: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = env_parse("PORT", 8000u16);
        ServerConfig {
            host: env_or("HOST", "0.0.0.0"),
            port,
            public_base_url: detect_base_url(|k| std::env::var(k).ok(), port),
            master_api_key: std::env::var("XE_BOT_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
        }
    }
}

/// Detecta la URL base pública según la plataforma (HF Spaces, Render, Railway).
pub fn detect_base_url<F>(lookup: F, port: u16) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = non_empty("VIDEO_BASE_URL") {
        return url.trim_end_matches('/').to_string();
    }
    if let Some(space_id) = non_empty("SPACE_ID") {
        return format!("https://{}.hf.space", space_id.replace('/', "-"));
    }
    if let Some(url) = non_empty("RENDER_EXTERNAL_URL") {
        return url.trim_end_matches('/').to_string();
    }
    if let Some(domain) = non_empty("RAILWAY_PUBLIC_DOMAIN") {
        return format!("https://{}", domain);
    }
    format!("http://localhost:{}", port)
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub arxiv: ArxivConfig,
    pub database: DatabaseConfig,
    pub animation: AnimationConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        AppConfig {
            llm: LlmConfig::from_env(),
            arxiv: ArxivConfig::from_env(),
            database: DatabaseConfig {
                database_url: env_or("DATABASE_URL", "sqlite:./data/animations.db"),
            },
            animation: AnimationConfig::from_env(),
            server: ServerConfig::from_env(),
        }
    }

    /// Advertencias de configuración (credenciales faltantes, etc.)
    pub fn warnings(&self) -> Vec<String> {
        let mut issues = vec![];
        if !self.llm.has_api_key() {
            issues.push("OPENROUTER_API_KEY not set".to_string());
        }
        if self.database.database_url.trim().is_empty() {
            issues.push("DATABASE_URL not set".to_string());
        }
        if self.server.master_api_key.is_none() {
            issues.push("XE_BOT_API_KEY not set (optional master key)".to_string());
        }
        issues
    }

    /// Crea los directorios de trabajo.
    pub fn setup_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.arxiv.papers_cache_dir())?;
        std::fs::create_dir_all(self.animation.animations_videos_dir())?;
        std::fs::create_dir_all(&self.animation.media_videos_dir)?;
        if let Some(path) = self.database.database_url.strip_prefix("sqlite:") {
            let path = path.trim_start_matches("//");
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() && !path.starts_with(":memory:") {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
        Ok(())
    }
}
