//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod animation_model;
pub mod api_key_model;
pub mod job_model;
pub mod paper_model;
pub mod pipeline_model;
pub mod segment_model;
pub mod video_model;
