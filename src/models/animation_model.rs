//! models/animation_model.rs
//! Modelos de animación: calidad de render, estados y resultados.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Calidad de render de manim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl RenderQuality {
    /// Acepta "low", "low_quality", "l" (idem medium/high).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" | "low_quality" | "l" | "ql" => Some(RenderQuality::Low),
            "medium" | "medium_quality" | "m" | "qm" => Some(RenderQuality::Medium),
            "high" | "high_quality" | "h" | "qh" => Some(RenderQuality::High),
            _ => None,
        }
    }

    /// Flag de línea de comandos de manim
    pub fn flag(&self) -> &'static str {
        match self {
            RenderQuality::Low => "-ql",
            RenderQuality::Medium => "-qm",
            RenderQuality::High => "-qh",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RenderQuality::Low => "low",
            RenderQuality::Medium => "medium",
            RenderQuality::High => "high",
        }
    }
}

/// Animación de un segmento o la animación completa del paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    Segment,
    Full,
}

impl AnimationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationKind::Segment => "segment",
            AnimationKind::Full => "full",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationStatus {
    Pending,
    CodeGenerated,
    Rendered,
    RenderFailed,
    GenerationFailed,
}

impl AnimationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationStatus::Pending => "pending",
            AnimationStatus::CodeGenerated => "code_generated",
            AnimationStatus::Rendered => "rendered",
            AnimationStatus::RenderFailed => "render_failed",
            AnimationStatus::GenerationFailed => "generation_failed",
        }
    }
}

/// Resultado de un render (exitoso, con fallback o fallido)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderResult {
    pub success: bool,
    pub file_path: Option<PathBuf>,
    pub manim_code: String,
    pub scene_name: String,
    pub duration_seconds: u64,
    pub error_message: Option<String>,
    /// true si el video viene de la escena de respaldo
    pub used_fallback: bool,
}

impl RenderResult {
    pub fn failed(manim_code: String, scene_name: String, error: impl Into<String>) -> Self {
        RenderResult {
            success: false,
            file_path: None,
            manim_code,
            scene_name,
            duration_seconds: 0,
            error_message: Some(error.into()),
            used_fallback: false,
        }
    }
}

/// Lo que el pipeline reporta por cada animación
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnimationOutcome {
    pub kind: AnimationKind,
    pub segment_index: Option<usize>,
    pub topic: String,
    pub status: AnimationStatus,
    pub manim_code: Option<String>,
    pub scene_name: Option<String>,
    pub file_path: Option<PathBuf>,
    pub duration_seconds: u64,
    pub file_size_bytes: u64,
    pub error: Option<String>,
}

impl AnimationOutcome {
    pub fn pending(kind: AnimationKind, segment_index: Option<usize>, topic: String) -> Self {
        AnimationOutcome {
            kind,
            segment_index,
            topic,
            status: AnimationStatus::Pending,
            manim_code: None,
            scene_name: None,
            file_path: None,
            duration_seconds: 0,
            file_size_bytes: 0,
            error: None,
        }
    }

    pub fn is_rendered(&self) -> bool {
        self.status == AnimationStatus::Rendered && self.file_path.is_some()
    }
}

/// Fila de `animations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationRecord {
    pub id: i64,
    pub paper_id: i64,
    pub segment_id: Option<i64>,
    pub kind: String,
    pub scene_name: Option<String>,
    pub file_path: Option<String>,
    pub video_url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub file_size_bytes: Option<i64>,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request de POST /api/generate-code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCodeRequest {
    pub topic: String,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default = "default_style")]
    pub style: String,
}

fn default_style() -> String {
    "educational".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCodeResponse {
    pub code: String,
    pub scene_name: String,
    pub topic: String,
}
