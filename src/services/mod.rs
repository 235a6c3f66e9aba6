//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod animation_service;
pub mod api_key_service;
pub mod arxiv_service;
pub mod code_sanitizer;
pub mod database;
pub mod job_runner;
pub mod job_service;
pub mod llm_service;
pub mod paper_service;
pub mod pdf_text_service;
pub mod pipeline_service;
pub mod prompts;
pub mod segment_service;
pub mod templates;
pub mod video_service;
