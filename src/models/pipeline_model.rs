//! models/pipeline_model.rs
//! Opciones y resultados del pipeline paper → animaciones.

use serde::{Deserialize, Serialize};

use super::animation_model::{AnimationOutcome, RenderQuality};
use super::paper_model::PaperData;
use super::segment_model::Segment;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PipelineOptions {
    pub render: bool,
    pub save_to_db: bool,
    /// calidad de la animación completa (los segmentos van en low)
    pub quality: RenderQuality,
    /// si es false, sólo se genera la animación completa
    pub segment_animations: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            render: true,
            save_to_db: true,
            quality: RenderQuality::Medium,
            segment_animations: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Fetching,
    Extracting,
    Segmenting,
    Animating,
    Completed,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Fetching => "fetching",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Segmenting => "segmenting",
            PipelineStage::Animating => "animating",
            PipelineStage::Completed => "completed",
            PipelineStage::Failed => "failed",
        }
    }
}

/// Duración de cada etapa (se guarda también en agent_logs)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageTiming {
    pub stage: String,
    pub duration_ms: u64,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    pub paper: Option<PaperData>,
    pub paper_id: Option<i64>,
    pub introduction: Option<String>,
    pub segments: Vec<Segment>,
    pub animations: Vec<AnimationOutcome>,
    pub timings: Vec<StageTiming>,
    pub error: Option<String>,
}

impl PipelineResult {
    pub fn empty() -> Self {
        PipelineResult {
            success: false,
            paper: None,
            paper_id: None,
            introduction: None,
            segments: vec![],
            animations: vec![],
            timings: vec![],
            error: None,
        }
    }

    pub fn rendered_count(&self) -> usize {
        self.animations.iter().filter(|a| a.is_rendered()).count()
    }
}

/// Request de POST /process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub arxiv_id: String,
    #[serde(default = "default_true")]
    pub render: bool,
    #[serde(default = "default_true")]
    pub save_to_db: bool,
    pub quality: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Resultado de `generate_animation_only` (texto libre)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextAnimationResult {
    pub title: String,
    pub segments: Vec<Segment>,
    pub animation: AnimationOutcome,
}
