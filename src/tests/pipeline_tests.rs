//! tests/pipeline_tests.rs
//! Pipeline completo con LLM guionado y sin render.

#[cfg(test)]
mod tests {
    use actix_rt::test;
    use tempfile::TempDir;

    use crate::models::animation_model::{AnimationKind, AnimationStatus};
    use crate::models::paper_model::ProcessingStatus;
    use crate::models::pipeline_model::{PipelineOptions, PipelineStage};
    use crate::services::paper_service::PaperService;
    use crate::services::pipeline_service::{animation_progress, NoProgress, PipelineService};
    use crate::tests::support::{
        sample_paper, scene_code, scripted_llm, segments_json, test_pool, test_renderer,
        RecordingProgress, StaticPaperSource, SAMPLE_INTRODUCTION,
    };

    fn code_only() -> PipelineOptions {
        PipelineOptions {
            render: false,
            save_to_db: true,
            ..PipelineOptions::default()
        }
    }

    fn happy_script() -> Vec<Result<String, String>> {
        vec![
            Ok(SAMPLE_INTRODUCTION.to_string()),
            Ok(segments_json()),
            Ok(scene_code("SequenceModels")),
            Ok(scene_code("SequentialBottleneck")),
            Ok(scene_code("TransformerIdea")),
            Ok(scene_code("FullIntroduction")),
        ]
    }

    #[test]
    async fn test_process_paper_generates_code_for_every_segment() {
        let dir = TempDir::new().unwrap();
        let (llm, backend) = scripted_llm(happy_script());
        let pipeline = PipelineService::new(
            StaticPaperSource::with_paper(sample_paper()),
            llm,
            test_renderer(dir.path()),
            None,
            None,
        );

        let result = pipeline
            .process_paper("arXiv:1706.03762", code_only(), &NoProgress)
            .await;

        assert!(result.success, "error: {:?}", result.error);
        assert_eq!(result.paper.as_ref().unwrap().title, "Attention Is All You Need");
        assert_eq!(result.segments.len(), 3);
        assert_eq!(result.animations.len(), 4);
        assert_eq!(backend.requests().len(), 6);

        for anim in &result.animations {
            assert_eq!(anim.status, AnimationStatus::CodeGenerated);
            let code = anim.manim_code.as_ref().expect("code missing");
            assert!(code.contains("from manim import *"));
            assert!(code.contains("Animation by Xe-Bot"));
            assert!(anim.file_path.is_none());
        }

        let full = result.animations.last().unwrap();
        assert_eq!(full.kind, AnimationKind::Full);
        assert_eq!(full.topic, "Full Introduction");
        assert_eq!(full.scene_name.as_deref(), Some("FullIntroduction"));
        assert_eq!(result.animations[0].segment_index, Some(0));

        let stages: Vec<&str> = result.timings.iter().map(|t| t.stage.as_str()).collect();
        assert_eq!(stages, vec!["fetching", "extracting", "segmenting", "animating"]);
    }

    #[test]
    async fn test_progress_is_reported_in_order() {
        let dir = TempDir::new().unwrap();
        let (llm, _) = scripted_llm(happy_script());
        let pipeline = PipelineService::new(
            StaticPaperSource::with_paper(sample_paper()),
            llm,
            test_renderer(dir.path()),
            None,
            None,
        );
        let progress = RecordingProgress::default();

        let result = pipeline.process_paper("1706.03762", code_only(), &progress).await;
        assert!(result.success);

        let values = progress.progress_values();
        assert_eq!(&values[..7], &[5, 15, 25, 35, 45, 55, 60]);
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "{:?}", values);
        assert!(values.contains(&animation_progress(1, 4)));
        assert!(values.contains(&95));
        assert_eq!(progress.last(), Some((PipelineStage::Completed, 100)));
        assert_eq!(*progress.papers.lock().unwrap(), vec!["1706.03762".to_string()]);
        assert_eq!(*progress.segment_counts.lock().unwrap(), vec![3]);
    }

    #[test]
    async fn test_segment_llm_failure_is_recorded_as_generation_failed() {
        let dir = TempDir::new().unwrap();
        let (llm, _) = scripted_llm(vec![
            Ok(SAMPLE_INTRODUCTION.to_string()),
            Ok(segments_json()),
            Err("LLM API error 500: boom".to_string()),
            Ok(scene_code("SequentialBottleneck")),
            Ok(scene_code("TransformerIdea")),
            Ok(scene_code("FullIntroduction")),
        ]);
        let pipeline = PipelineService::new(
            StaticPaperSource::with_paper(sample_paper()),
            llm,
            test_renderer(dir.path()),
            None,
            None,
        );

        let result = pipeline.process_paper("1706.03762", code_only(), &NoProgress).await;

        assert!(result.success);
        let first = &result.animations[0];
        assert_eq!(first.status, AnimationStatus::GenerationFailed);
        assert!(first.error.as_deref().unwrap().contains("LLM API error 500: boom"));
        assert!(first.manim_code.is_none());
        assert!(first.scene_name.is_none());

        let second = &result.animations[1];
        assert_eq!(second.status, AnimationStatus::CodeGenerated);
        assert!(second.error.is_none());

        let generated = result
            .animations
            .iter()
            .filter(|a| a.status == AnimationStatus::CodeGenerated)
            .count();
        assert_eq!(generated, result.animations.len() - 1);
    }

    #[test]
    async fn test_full_animation_failure_is_recorded_not_fatal() {
        let dir = TempDir::new().unwrap();
        let mut script = happy_script();
        script.pop();
        script.push(Err("LLM API error 429: rate limited".to_string()));
        let (llm, _) = scripted_llm(script);
        let pipeline = PipelineService::new(
            StaticPaperSource::with_paper(sample_paper()),
            llm,
            test_renderer(dir.path()),
            None,
            None,
        );

        let result = pipeline.process_paper("1706.03762", code_only(), &NoProgress).await;

        assert!(result.success);
        let full = result.animations.last().unwrap();
        assert_eq!(full.kind, AnimationKind::Full);
        assert_eq!(full.status, AnimationStatus::GenerationFailed);
        assert!(full.manim_code.is_none());
        assert!(full.error.as_deref().unwrap().contains("rate limited"));
    }

    #[test]
    async fn test_fetch_failure_stops_the_pipeline() {
        let dir = TempDir::new().unwrap();
        let (llm, backend) = scripted_llm(vec![]);
        let pipeline = PipelineService::new(
            StaticPaperSource::failing(),
            llm,
            test_renderer(dir.path()),
            None,
            None,
        );
        let progress = RecordingProgress::default();

        let result = pipeline.process_paper("0000.00000", code_only(), &progress).await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().starts_with("Fetch failed"));
        assert!(result.animations.is_empty());
        assert!(backend.requests().is_empty());
        assert_eq!(progress.last(), Some((PipelineStage::Failed, 0)));
        assert_eq!(result.timings.len(), 1);
        assert!(!result.timings[0].success);
    }

    #[test]
    async fn test_empty_introduction_fails_extraction() {
        let dir = TempDir::new().unwrap();
        let (llm, _) = scripted_llm(vec![Ok("   ".to_string())]);
        let pipeline = PipelineService::new(
            StaticPaperSource::with_paper(sample_paper()),
            llm,
            test_renderer(dir.path()),
            None,
            None,
        );

        let result = pipeline.process_paper("1706.03762", code_only(), &NoProgress).await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().starts_with("Extract failed"));
        assert!(result.introduction.is_none());
    }

    #[test]
    async fn test_results_are_persisted_when_store_is_present() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool().await;
        let store = PaperService::new(pool);
        let (llm, _) = scripted_llm(happy_script());
        let pipeline = PipelineService::new(
            StaticPaperSource::with_paper(sample_paper()),
            llm,
            test_renderer(dir.path()),
            Some(store.clone()),
            None,
        );

        let result = pipeline.process_paper("1706.03762", code_only(), &NoProgress).await;
        assert!(result.success);
        let paper_id = result.paper_id.expect("paper_id missing");

        let detail = store
            .get_paper_detail("1706.03762")
            .await
            .unwrap()
            .expect("paper not stored");
        assert_eq!(detail.paper.status, ProcessingStatus::Completed);
        assert_eq!(detail.introduction.as_deref(), Some(SAMPLE_INTRODUCTION));
        assert_eq!(detail.segments.len(), 3);
        assert_eq!(detail.segments[1].topic.as_deref(), Some("Sequential Bottleneck"));
        assert_eq!(detail.animations.len(), 4);
        assert_eq!(detail.animations[3].kind, "full");
        assert!(detail.animations[3].segment_id.is_none());
        assert_eq!(detail.animations[0].segment_id, Some(detail.segments[0].id));
        assert_eq!(store.count_stage_logs(paper_id).await.unwrap(), 4);
    }

    #[test]
    async fn test_save_to_db_false_skips_persistence() {
        let dir = TempDir::new().unwrap();
        let store = PaperService::new(test_pool().await);
        let (llm, _) = scripted_llm(happy_script());
        let pipeline = PipelineService::new(
            StaticPaperSource::with_paper(sample_paper()),
            llm,
            test_renderer(dir.path()),
            Some(store.clone()),
            None,
        );
        let options = PipelineOptions {
            save_to_db: false,
            ..code_only()
        };

        let result = pipeline.process_paper("1706.03762", options, &NoProgress).await;

        assert!(result.success);
        assert!(result.paper_id.is_none());
        assert!(store.list_papers().await.unwrap().is_empty());
    }

    #[test]
    async fn test_generate_animation_only_uses_default_title() {
        let dir = TempDir::new().unwrap();
        let (llm, backend) = scripted_llm(vec![Ok(segments_json()), Ok(scene_code("TextScene"))]);
        let pipeline = PipelineService::new(
            StaticPaperSource::failing(),
            llm,
            test_renderer(dir.path()),
            None,
            None,
        );

        let result = pipeline
            .generate_animation_only(SAMPLE_INTRODUCTION, "  ", false)
            .await
            .unwrap();

        assert_eq!(result.title, "Research Animation");
        assert_eq!(result.segments.len(), 3);
        assert_eq!(result.animation.kind, AnimationKind::Full);
        assert_eq!(result.animation.scene_name.as_deref(), Some("TextScene"));
        assert_eq!(backend.requests().len(), 2);

        assert!(pipeline.generate_animation_only("", "x", false).await.is_err());
    }

    #[test]
    async fn test_generate_code_for_topic() {
        let dir = TempDir::new().unwrap();
        let (llm, _) = scripted_llm(vec![
            Ok(scene_code("AttentionScene")),
            Err("LLM API error 503".to_string()),
        ]);
        let pipeline = PipelineService::new(
            StaticPaperSource::failing(),
            llm,
            test_renderer(dir.path()),
            None,
            None,
        );
        let concepts = vec!["query".to_string(), "key".to_string()];

        let generated = pipeline
            .generate_code_for_topic("Self-Attention", &concepts, "explanatory")
            .await
            .unwrap();
        assert_eq!(generated.scene_name, "AttentionScene");
        assert_eq!(generated.topic, "Self-Attention");
        assert!(generated.code.contains("Animation by Xe-Bot"));

        // el LLM falla: template de conceptos
        let fallback = pipeline
            .generate_code_for_topic("Self-Attention", &concepts, "explanatory")
            .await
            .unwrap();
        assert_eq!(fallback.scene_name, "ConceptAnimation");
        assert!(fallback.code.contains("\"query\""));

        assert!(pipeline
            .generate_code_for_topic("   ", &concepts, "explanatory")
            .await
            .is_err());
    }

    #[test]
    async fn test_animation_progress_range() {
        assert_eq!(animation_progress(0, 4), 60);
        assert_eq!(animation_progress(2, 4), 77);
        assert!(animation_progress(10, 4) <= 95);
        assert_eq!(animation_progress(0, 0), 60);
    }
}
