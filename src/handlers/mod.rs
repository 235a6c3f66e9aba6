//! handlers/mod.rs
//! Módulo que agrupa los distintos handlers (papers, videos, jobs, API pública).

pub mod auth;
pub mod code_handler;
pub mod job_handler;
pub mod key_handler;
pub mod paper_handler;
pub mod root_handler;
pub mod search_handler;
pub mod video_handler;
