//! tests/support.rs
//! Helpers compartidos: DB en memoria, LLM guionado y fuente de papers fija.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use sqlx::{Pool, Sqlite};

use crate::config::AnimationConfig;
use crate::models::paper_model::{PaperData, SortOrder};
use crate::models::pipeline_model::PipelineStage;
use crate::services::animation_service::AnimationService;
use crate::services::arxiv_service::PaperSource;
use crate::services::database;
use crate::services::llm_service::{ChatBackend, ChatRequest, LlmResponse, LlmService};
use crate::services::pipeline_service::ProgressSink;

pub async fn test_pool() -> Pool<Sqlite> {
    let pool = database::connect_in_memory()
        .await
        .expect("Failed to open in-memory DB");
    database::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Backend que devuelve las respuestas en orden; `Err` simula un fallo de la API.
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(ScriptedBackend {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(vec![]),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn default_model(&self) -> &str {
        "test-model"
    }

    async fn chat_completion(&self, request: ChatRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(LlmResponse {
                content,
                model: "test-model".to_string(),
                usage: json!({}),
            }),
            Some(Err(msg)) => Err(anyhow!(msg)),
            None => Err(anyhow!("no scripted response left")),
        }
    }
}

pub fn scripted_llm(responses: Vec<Result<String, String>>) -> (LlmService, Arc<ScriptedBackend>) {
    let backend = ScriptedBackend::new(responses);
    (LlmService::new(backend.clone()), backend)
}

/// Fuente de papers sin red
pub struct StaticPaperSource {
    pub paper: Option<PaperData>,
    pub results: Vec<PaperData>,
}

impl StaticPaperSource {
    pub fn with_paper(paper: PaperData) -> Arc<Self> {
        Arc::new(StaticPaperSource {
            results: vec![paper.clone()],
            paper: Some(paper),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(StaticPaperSource {
            paper: None,
            results: vec![],
        })
    }
}

#[async_trait]
impl PaperSource for StaticPaperSource {
    async fn fetch_paper(&self, arxiv_id: &str) -> Result<PaperData> {
        self.paper
            .clone()
            .ok_or_else(|| anyhow!("Paper not found: {}", arxiv_id))
    }

    async fn fetch_and_extract(&self, arxiv_id: &str) -> Result<PaperData> {
        self.fetch_paper(arxiv_id).await
    }

    async fn search(&self, _query: &str, max_results: u32, _sort: SortOrder) -> Result<Vec<PaperData>> {
        Ok(self.results.iter().take(max_results as usize).cloned().collect())
    }

    async fn search_by_domain(
        &self,
        _domain: &str,
        max_results: u32,
        _category: Option<&str>,
    ) -> Result<Vec<PaperData>> {
        Ok(self.results.iter().take(max_results as usize).cloned().collect())
    }
}

pub fn sample_paper() -> PaperData {
    PaperData {
        arxiv_id: "1706.03762".to_string(),
        title: "Attention Is All You Need".to_string(),
        authors: vec![
            "Ashish Vaswani".to_string(),
            "Noam Shazeer".to_string(),
            "Niki Parmar".to_string(),
            "Jakob Uszkoreit".to_string(),
        ],
        abstract_text: "The dominant sequence transduction models are based on complex recurrent networks."
            .to_string(),
        pdf_url: "https://arxiv.org/pdf/1706.03762".to_string(),
        source: "arxiv".to_string(),
        published: Some("2017-06-12T17:57:34Z".to_string()),
        full_text: Some(
            "1 Introduction\nRecurrent neural networks have been firmly established as the leading approach \
             in sequence modeling and transduction problems such as language modeling and machine translation."
                .to_string(),
        ),
    }
}

pub const SAMPLE_INTRODUCTION: &str = "Recurrent neural networks have been firmly established as the \
leading approach in sequence modeling and machine translation. Recurrent models compute along the \
positions of the input and output sequences, which precludes parallelization within training examples. \
In this work we propose the Transformer, a model architecture relying entirely on attention to draw \
global dependencies between input and output.";

/// Respuesta de segmentación con 3 segmentos (ninguno de física cuántica)
pub fn segments_json() -> String {
    json!({
        "segments": [
            {
                "content": "Recurrent networks are the leading approach in sequence modeling.",
                "topic": "Sequence Models",
                "topic_category": "background",
                "key_concepts": ["recurrent networks", "sequence modeling"]
            },
            {
                "content": "Sequential computation prevents parallel training on long inputs.",
                "topic": "Sequential Bottleneck",
                "topic_category": "problem_statement",
                "key_concepts": ["parallelization", "training cost"]
            },
            {
                "content": "The Transformer relies only on attention to connect input and output.",
                "topic": "The Transformer",
                "topic_category": "approach",
                "key_concepts": ["attention", "global dependencies"]
            }
        ]
    })
    .to_string()
}

pub fn scene_code(class_name: &str) -> String {
    format!(
        "```python\nfrom manim import *\n\nclass {}(Scene):\n    def construct(self):\n        title = Text(\"Hello\")\n        self.play(Write(title))\n        self.wait(1)\n```",
        class_name
    )
}

/// Renderer con directorios dentro de `root` (sin manim no renderiza, pero genera código)
pub fn test_renderer(root: &Path) -> AnimationService {
    let config = AnimationConfig {
        output_dir: root.join("animations"),
        media_videos_dir: root.join("media"),
        ..AnimationConfig::default()
    };
    AnimationService::new(config).expect("Failed to create AnimationService")
}

/// Guarda cada reporte de progreso
#[derive(Default)]
pub struct RecordingProgress {
    pub events: Mutex<Vec<(PipelineStage, u8)>>,
    pub papers: Mutex<Vec<String>>,
    pub segment_counts: Mutex<Vec<usize>>,
}

impl RecordingProgress {
    pub fn progress_values(&self) -> Vec<u8> {
        self.events.lock().unwrap().iter().map(|(_, p)| *p).collect()
    }

    pub fn last(&self) -> Option<(PipelineStage, u8)> {
        self.events.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl ProgressSink for RecordingProgress {
    async fn stage(&self, stage: PipelineStage, _detail: &str, progress: u8) {
        self.events.lock().unwrap().push((stage, progress));
    }

    async fn paper_fetched(&self, paper: &PaperData) {
        self.papers.lock().unwrap().push(paper.arxiv_id.clone());
    }

    async fn segmented(&self, segments: &[crate::models::segment_model::Segment]) {
        self.segment_counts.lock().unwrap().push(segments.len());
    }
}
