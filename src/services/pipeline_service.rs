//! services/pipeline_service.rs
//! Pipeline completo: paper → introducción → segmentos → animaciones.
//! Cada etapa se mide y, si hay DB, queda en `agent_logs`.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::models::animation_model::{
    AnimationKind, AnimationOutcome, AnimationStatus, GenerateCodeResponse, RenderQuality,
};
use crate::models::paper_model::{PaperData, ProcessingStatus};
use crate::models::pipeline_model::{
    PipelineOptions, PipelineResult, PipelineStage, StageTiming, TextAnimationResult,
};
use crate::models::segment_model::Segment;
use crate::services::animation_service::AnimationService;
use crate::services::arxiv_service::{normalize_arxiv_id, PaperSource};
use crate::services::code_sanitizer::{ensure_valid_manim_code, extract_scene_name};
use crate::services::llm_service::LlmService;
use crate::services::paper_service::{PaperService, StageLog};
use crate::services::templates;
use crate::services::video_service::VideoService;
use crate::utils::{truncate_chars, truncate_with_suffix, word_count};

const SEGMENT_STYLE: &str = "explanatory";
const FULL_ANIMATION_TOPIC: &str = "Full Introduction";

/// Recibe el avance del pipeline (job en DB, consola, nada)
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn stage(&self, stage: PipelineStage, detail: &str, progress: u8);

    async fn paper_fetched(&self, _paper: &PaperData) {}

    async fn segmented(&self, _segments: &[Segment]) {}
}

pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn stage(&self, _stage: PipelineStage, _detail: &str, _progress: u8) {}
}

/// Sólo loguea el avance
pub struct LogProgress;

#[async_trait]
impl ProgressSink for LogProgress {
    async fn stage(&self, stage: PipelineStage, detail: &str, progress: u8) {
        log::info!("(pipeline) [{:>3}%] {}: {}", progress, stage.as_str(), detail);
    }
}

/// Progreso de la animación `index` de `total` dentro del rango 60..95
pub fn animation_progress(index: usize, total: usize) -> u8 {
    let total = total.max(1);
    (60 + (index * 35) / total).min(95) as u8
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[derive(Clone)]
pub struct PipelineService {
    papers: Arc<dyn PaperSource>,
    llm: LlmService,
    renderer: AnimationService,
    store: Option<PaperService>,
    videos: Option<VideoService>,
}

impl PipelineService {
    pub fn new(
        papers: Arc<dyn PaperSource>,
        llm: LlmService,
        renderer: AnimationService,
        store: Option<PaperService>,
        videos: Option<VideoService>,
    ) -> Self {
        PipelineService {
            papers,
            llm,
            renderer,
            store,
            videos,
        }
    }

    pub fn renderer(&self) -> &AnimationService {
        &self.renderer
    }

    fn store_for(&self, options: PipelineOptions) -> Option<&PaperService> {
        if options.save_to_db {
            self.store.as_ref()
        } else {
            None
        }
    }

    /// Corre las cuatro etapas. Nunca devuelve Err: el fallo queda en `PipelineResult`.
    pub async fn process_paper(
        &self,
        arxiv_id: &str,
        options: PipelineOptions,
        progress: &dyn ProgressSink,
    ) -> PipelineResult {
        let arxiv_id = normalize_arxiv_id(arxiv_id);
        let mut result = PipelineResult::empty();
        log::info!("(process_paper) Procesando {} (render={})", arxiv_id, options.render);

        match self.run_stages(&arxiv_id, options, progress, &mut result).await {
            Ok(()) => {
                result.success = true;
                progress
                    .stage(
                        PipelineStage::Completed,
                        "All animations generated successfully!",
                        100,
                    )
                    .await;
                log::info!(
                    "(process_paper) {} completo: {} segmentos, {}/{} animaciones renderizadas",
                    arxiv_id,
                    result.segments.len(),
                    result.rendered_count(),
                    result.animations.len()
                );
            }
            Err(e) => {
                let msg = format!("{:#}", e);
                log::error!("(process_paper) {} falló: {}", arxiv_id, msg);
                if let (Some(store), Some(paper_id)) = (self.store_for(options), result.paper_id) {
                    if let Err(db_err) = store.update_status(paper_id, ProcessingStatus::Failed).await {
                        log::warn!("(process_paper) No se pudo marcar el paper como fallido: {:#}", db_err);
                    }
                }
                progress.stage(PipelineStage::Failed, &msg, 0).await;
                result.success = false;
                result.error = Some(msg);
            }
        }
        result
    }

    async fn run_stages(
        &self,
        arxiv_id: &str,
        options: PipelineOptions,
        progress: &dyn ProgressSink,
        result: &mut PipelineResult,
    ) -> Result<()> {
        let store = self.store_for(options);

        // 1) Fetch
        progress
            .stage(
                PipelineStage::Fetching,
                &format!("Downloading paper {} from arXiv...", arxiv_id),
                5,
            )
            .await;
        let started = Instant::now();
        let fetched = self.papers.fetch_and_extract(arxiv_id).await;
        let paper = match fetched {
            Ok(paper) => paper,
            Err(e) => {
                self.record_stage(
                    PipelineStage::Fetching,
                    StageLog {
                        paper_id: None,
                        agent_name: "fetcher",
                        action: "fetch_paper",
                        input: json!({ "arxiv_id": arxiv_id }),
                        output: json!({}),
                        success: false,
                        error: Some(format!("{:#}", e)),
                        execution_time_ms: elapsed_ms(started),
                    },
                    result,
                    store,
                )
                .await;
                return Err(e.context("Fetch failed"));
            }
        };
        progress.paper_fetched(&paper).await;
        progress
            .stage(
                PipelineStage::Fetching,
                &format!("Downloaded: {}...", truncate_chars(&paper.title, 50)),
                15,
            )
            .await;

        if let Some(store) = store {
            match store.upsert_paper(&paper, ProcessingStatus::Extracting).await {
                Ok(id) => result.paper_id = Some(id),
                Err(e) => log::warn!("(process_paper) No se pudo guardar el paper: {:#}", e),
            }
        }
        let text_length = paper.full_text.as_deref().map(str::len).unwrap_or(0);
        self.record_stage(
            PipelineStage::Fetching,
            StageLog {
                paper_id: result.paper_id,
                agent_name: "fetcher",
                action: "fetch_paper",
                input: json!({ "arxiv_id": arxiv_id }),
                output: json!({ "title": paper.title, "text_length": text_length }),
                success: true,
                error: None,
                execution_time_ms: elapsed_ms(started),
            },
            result,
            store,
        )
        .await;
        let paper_text = paper
            .full_text
            .clone()
            .unwrap_or_else(|| paper.abstract_text.clone());
        let title = paper.title.clone();
        result.paper = Some(paper);

        // 2) Introducción
        progress
            .stage(
                PipelineStage::Extracting,
                "Analyzing paper and extracting introduction...",
                25,
            )
            .await;
        let started = Instant::now();
        let extracted = self
            .llm
            .extract_introduction(&paper_text)
            .await
            .and_then(|intro| {
                if intro.trim().is_empty() {
                    Err(anyhow!("El LLM devolvió una introducción vacía"))
                } else {
                    Ok(intro)
                }
            });
        let introduction = match extracted {
            Ok(intro) => intro,
            Err(e) => {
                self.record_stage(
                    PipelineStage::Extracting,
                    StageLog {
                        paper_id: result.paper_id,
                        agent_name: "extractor",
                        action: "extract_introduction",
                        input: json!({ "text_length": paper_text.len() }),
                        output: json!({}),
                        success: false,
                        error: Some(format!("{:#}", e)),
                        execution_time_ms: elapsed_ms(started),
                    },
                    result,
                    store,
                )
                .await;
                return Err(e.context("Extract failed"));
            }
        };
        let words = word_count(&introduction);
        self.record_stage(
            PipelineStage::Extracting,
            StageLog {
                paper_id: result.paper_id,
                agent_name: "extractor",
                action: "extract_introduction",
                input: json!({ "text_length": paper_text.len() }),
                output: json!({ "word_count": words }),
                success: true,
                error: None,
                execution_time_ms: elapsed_ms(started),
            },
            result,
            store,
        )
        .await;
        progress
            .stage(
                PipelineStage::Extracting,
                &format!("Extracted {} words from introduction", words),
                35,
            )
            .await;
        if let (Some(store), Some(paper_id)) = (store, result.paper_id) {
            if let Err(e) = store.save_introduction(paper_id, &introduction).await {
                log::warn!("(process_paper) No se pudo guardar la introducción: {:#}", e);
            }
            self.set_status(store, paper_id, ProcessingStatus::Segmenting).await;
        }
        result.introduction = Some(introduction.clone());

        // 3) Segmentos
        progress
            .stage(
                PipelineStage::Segmenting,
                "Breaking introduction into logical segments...",
                45,
            )
            .await;
        let started = Instant::now();
        let segments = match self.llm.segment_introduction(&introduction).await {
            Ok(segments) => segments,
            Err(e) => {
                self.record_stage(
                    PipelineStage::Segmenting,
                    StageLog {
                        paper_id: result.paper_id,
                        agent_name: "segmenter",
                        action: "segment_introduction",
                        input: json!({ "word_count": words }),
                        output: json!({}),
                        success: false,
                        error: Some(format!("{:#}", e)),
                        execution_time_ms: elapsed_ms(started),
                    },
                    result,
                    store,
                )
                .await;
                return Err(e.context("Segment failed"));
            }
        };
        self.record_stage(
            PipelineStage::Segmenting,
            StageLog {
                paper_id: result.paper_id,
                agent_name: "segmenter",
                action: "segment_introduction",
                input: json!({ "word_count": words }),
                output: json!({ "segment_count": segments.len() }),
                success: true,
                error: None,
                execution_time_ms: elapsed_ms(started),
            },
            result,
            store,
        )
        .await;
        progress.segmented(&segments).await;
        progress
            .stage(
                PipelineStage::Segmenting,
                &format!("Created {} segments", segments.len()),
                55,
            )
            .await;

        let mut segment_ids: Vec<Option<i64>> = vec![None; segments.len()];
        if let (Some(store), Some(paper_id)) = (store, result.paper_id) {
            match store.replace_segments(paper_id, &segments).await {
                Ok(ids) => segment_ids = ids.into_iter().map(Some).collect(),
                Err(e) => log::warn!("(process_paper) No se pudieron guardar los segmentos: {:#}", e),
            }
            self.set_status(store, paper_id, ProcessingStatus::Animating).await;
        }
        result.segments = segments;

        // 4) Animaciones
        progress
            .stage(
                PipelineStage::Animating,
                &format!("Generating animations for {} segments...", result.segments.len()),
                60,
            )
            .await;
        let started = Instant::now();
        let total = result.segments.len() + 1;

        if options.segment_animations {
            for (i, segment) in result.segments.iter().enumerate() {
                progress
                    .stage(
                        PipelineStage::Animating,
                        &format!(
                            "Rendering segment {}/{}: {}...",
                            i + 1,
                            result.segments.len(),
                            truncate_chars(&segment.topic_or(i), 30)
                        ),
                        animation_progress(i, total),
                    )
                    .await;
                let outcome = self.animate_segment(i, segment, options.render).await;
                result.animations.push(outcome);
            }
        }

        progress
            .stage(
                PipelineStage::Animating,
                "Generating full combined animation...",
                95,
            )
            .await;
        let full = self
            .animate_full(&title, &result.segments, options.render, options.quality)
            .await;
        result.animations.push(full);

        let ok_count = result
            .animations
            .iter()
            .filter(|a| {
                matches!(
                    a.status,
                    AnimationStatus::Rendered | AnimationStatus::CodeGenerated
                )
            })
            .count();
        self.record_stage(
            PipelineStage::Animating,
            StageLog {
                paper_id: result.paper_id,
                agent_name: "animator",
                action: "generate_animations",
                input: json!({ "segments": result.segments.len(), "render": options.render }),
                output: json!({
                    "total_count": result.animations.len(),
                    "successful_count": ok_count,
                }),
                success: true,
                error: None,
                execution_time_ms: elapsed_ms(started),
            },
            result,
            store,
        )
        .await;

        if let (Some(store), Some(paper_id)) = (store, result.paper_id) {
            for outcome in &result.animations {
                let segment_id = outcome
                    .segment_index
                    .and_then(|i| segment_ids.get(i).copied().flatten());
                let urls = outcome
                    .file_path
                    .as_ref()
                    .and_then(|p| self.videos.as_ref().and_then(|v| v.url_for(p)));
                if let Err(e) = store.save_animation(paper_id, segment_id, outcome, urls).await {
                    log::warn!("(process_paper) No se pudo guardar la animación: {:#}", e);
                }
            }
            self.set_status(store, paper_id, ProcessingStatus::Completed).await;
        }

        Ok(())
    }

    async fn set_status(&self, store: &PaperService, paper_id: i64, status: ProcessingStatus) {
        if let Err(e) = store.update_status(paper_id, status).await {
            log::warn!("(set_status) No se pudo actualizar el paper {}: {:#}", paper_id, e);
        }
    }

    async fn record_stage(
        &self,
        stage: PipelineStage,
        log: StageLog<'_>,
        result: &mut PipelineResult,
        store: Option<&PaperService>,
    ) {
        log::info!(
            "(record_stage) {} {} en {} ms",
            stage.as_str(),
            if log.success { "ok" } else { "falló" },
            log.execution_time_ms
        );
        result.timings.push(StageTiming {
            stage: stage.as_str().to_string(),
            duration_ms: log.execution_time_ms,
            success: log.success,
        });
        if let Some(store) = store {
            if let Err(e) = store.log_stage(log).await {
                log::warn!("(record_stage) {:#}", e);
            }
        }
    }

    /// Código del LLM y render en calidad baja; si el LLM falla queda "generation_failed".
    async fn animate_segment(&self, index: usize, segment: &Segment, render: bool) -> AnimationOutcome {
        let mut outcome =
            AnimationOutcome::pending(AnimationKind::Segment, Some(index), segment.topic_or(index));

        let code = match self.llm.generate_animation_code(segment, SEGMENT_STYLE).await {
            Ok(code) => code,
            Err(e) => {
                log::warn!(
                    "(animate_segment) Segmento {}: falló la generación de código: {:#}",
                    index + 1,
                    e
                );
                outcome.status = AnimationStatus::GenerationFailed;
                outcome.error = Some(format!("{:#}", e));
                return outcome;
            }
        };
        outcome.status = AnimationStatus::CodeGenerated;

        if render {
            self.render_into(
                &mut outcome,
                &code,
                &format!("segment_{}", index + 1),
                RenderQuality::Low,
            )
            .await;
        } else {
            let code = ensure_valid_manim_code(&code);
            outcome.scene_name = Some(extract_scene_name(&code));
            outcome.manim_code = Some(code);
        }
        outcome
    }

    async fn animate_full(
        &self,
        title: &str,
        segments: &[Segment],
        render: bool,
        quality: RenderQuality,
    ) -> AnimationOutcome {
        let mut outcome =
            AnimationOutcome::pending(AnimationKind::Full, None, FULL_ANIMATION_TOPIC.to_string());

        let code = match self.llm.generate_full_animation_code(title, segments).await {
            Ok(code) => code,
            Err(e) => {
                log::error!("(animate_full) Falló la generación de código: {:#}", e);
                outcome.status = AnimationStatus::GenerationFailed;
                outcome.error = Some(format!("{:#}", e));
                return outcome;
            }
        };
        outcome.status = AnimationStatus::CodeGenerated;

        if render {
            self.render_into(&mut outcome, &code, "full_introduction", quality)
                .await;
        } else {
            let code = ensure_valid_manim_code(&code);
            outcome.scene_name = Some(extract_scene_name(&code));
            outcome.manim_code = Some(code);
        }
        outcome
    }

    async fn render_into(
        &self,
        outcome: &mut AnimationOutcome,
        code: &str,
        output_name: &str,
        quality: RenderQuality,
    ) {
        let rendered = self
            .renderer
            .render_animation(code, output_name, Some(quality))
            .await;

        outcome.manim_code = Some(rendered.manim_code);
        outcome.scene_name = Some(rendered.scene_name);
        outcome.duration_seconds = rendered.duration_seconds;
        if rendered.success {
            outcome.status = AnimationStatus::Rendered;
            outcome.file_size_bytes = rendered
                .file_path
                .as_ref()
                .and_then(|p| std::fs::metadata(p).ok())
                .map(|m| m.len())
                .unwrap_or(0);
            outcome.file_path = rendered.file_path;
        } else {
            outcome.status = AnimationStatus::RenderFailed;
        }

        if let Some(err) = rendered.error_message {
            outcome.error = Some(match outcome.error.take() {
                Some(prev) => format!("{}; {}", prev, err),
                None => err,
            });
        }
    }

    /// Texto libre → segmentos → sólo la animación completa.
    pub async fn generate_animation_only(
        &self,
        text: &str,
        title: &str,
        render: bool,
    ) -> Result<TextAnimationResult> {
        if text.trim().is_empty() {
            return Err(anyhow!("El texto está vacío"));
        }
        let title = if title.trim().is_empty() {
            "Research Animation"
        } else {
            title.trim()
        };
        log::info!(
            "(generate_animation_only) '{}' ({} palabras)",
            title,
            word_count(text)
        );

        let segments = self
            .llm
            .segment_introduction(text)
            .await
            .context("Segment failed")?;
        let animation = self
            .animate_full(
                title,
                &segments,
                render,
                self.renderer.config().default_quality,
            )
            .await;

        Ok(TextAnimationResult {
            title: title.to_string(),
            segments,
            animation,
        })
    }

    /// Código Manim para un tópico suelto; si el LLM falla se usa el template de conceptos.
    pub async fn generate_code_for_topic(
        &self,
        topic: &str,
        concepts: &[String],
        style: &str,
    ) -> Result<GenerateCodeResponse> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(anyhow!("topic es obligatorio"));
        }

        let code = match self.llm.generate_topic_code(topic, concepts, style).await {
            Ok(code) => code,
            Err(e) => {
                log::warn!(
                    "(generate_code_for_topic) LLM falló ({:#}), usando template de conceptos",
                    e
                );
                let concepts = if concepts.is_empty() {
                    vec![topic.to_string()]
                } else {
                    concepts.to_vec()
                };
                templates::concept_animation(&concepts, &truncate_with_suffix(topic, 40, "..."))
            }
        };

        let code = ensure_valid_manim_code(&code);
        Ok(GenerateCodeResponse {
            scene_name: extract_scene_name(&code),
            code,
            topic: topic.to_string(),
        })
    }
}
