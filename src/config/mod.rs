//! config/mod.rs
//! Configuración de la app (LLM, arXiv, base de datos, render, servidor).

pub mod animation_config;
pub mod app_config;

use std::str::FromStr;

pub use animation_config::AnimationConfig;
pub use app_config::{AppConfig, ArxivConfig, DatabaseConfig, LlmConfig, ServerConfig};

pub(crate) fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
