//! tests/cli_tests.rs

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use crate::cli::{
        offline_scripts, paper_listing, parse_selection, summarize_result, text_animation_report,
        Cli, Command,
    };
    use crate::models::animation_model::{
        AnimationKind, AnimationOutcome, AnimationStatus, RenderQuality,
    };
    use crate::models::pipeline_model::PipelineResult;
    use crate::services::code_sanitizer::extract_scene_name;
    use crate::services::segment_service::fallback_segments;
    use crate::tests::support::sample_paper;

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("", 3).unwrap(), Some(0));
        assert_eq!(parse_selection(" 2 \n", 3).unwrap(), Some(1));
        assert_eq!(parse_selection("0", 3).unwrap(), None);

        let err = parse_selection("4", 3).unwrap_err();
        assert_eq!(err.to_string(), "Invalid selection. Please choose 1-3");
        assert!(parse_selection("abc", 3).is_err());
    }

    #[test]
    fn test_paper_listing() {
        let mut old = sample_paper();
        old.arxiv_id = "quant-ph/0606228".to_string();
        old.published = None;
        old.title = "T".repeat(90);

        let lines = paper_listing(&[sample_paper(), old]);
        assert_eq!(
            lines[0],
            " 1. [1706.03762] Attention Is All You Need (2017-06-12)"
        );
        assert_eq!(
            lines[1],
            format!(" 2. [quant-ph/0606228] {}... (-)", "T".repeat(80))
        );
    }

    #[test]
    fn test_summarize_success() {
        let mut rendered =
            AnimationOutcome::pending(AnimationKind::Segment, Some(0), "Background".to_string());
        rendered.status = AnimationStatus::Rendered;
        rendered.file_path = Some(PathBuf::from("/videos/Segment1Animation.mp4"));

        let mut code_only =
            AnimationOutcome::pending(AnimationKind::Full, None, "Full Introduction".to_string());
        code_only.status = AnimationStatus::CodeGenerated;

        let result = PipelineResult {
            success: true,
            paper: Some(sample_paper()),
            segments: fallback_segments("", vec![]),
            animations: vec![rendered, code_only],
            ..PipelineResult::empty()
        };

        let lines = summarize_result(&result);
        assert_eq!(lines[0], "✓ Processing Complete!");
        assert_eq!(lines[1], "Title: Attention Is All You Need");
        assert_eq!(lines[2], "Authors: Ashish Vaswani, Noam Shazeer, Niki Parmar...");
        assert_eq!(lines[4], "  • Problem Statement [problem_statement]");
        assert!(lines.contains(&"Generated 2 animations:".to_string()));
        assert!(lines.contains(&"  ✓ Background: /videos/Segment1Animation.mp4".to_string()));
        assert!(lines.contains(&"  ◯ (code only) Full Introduction: Not rendered".to_string()));
    }

    #[test]
    fn test_summarize_failure() {
        let result = PipelineResult {
            error: Some("Fetch failed: Paper not found: 1234".to_string()),
            ..PipelineResult::empty()
        };
        assert_eq!(
            summarize_result(&result),
            vec![
                "✗ Processing Failed".to_string(),
                "  Error: Fetch failed: Paper not found: 1234".to_string()
            ]
        );
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from(["xe-bot", "process", "1706.03762", "--no-render", "--quality", "high"])
            .unwrap();
        assert!(cli.common.no_render);
        assert!(!cli.common.no_db);
        assert_eq!(cli.common.quality, Some(RenderQuality::High));
        assert!(matches!(cli.command, Command::Process { ref arxiv_id } if arxiv_id == "1706.03762"));

        let cli = Cli::try_parse_from(["xe-bot", "domain", "graph neural networks", "--category", "cs.LG", "--auto"])
            .unwrap();
        match cli.command {
            Command::Domain {
                query,
                category,
                max_results,
                auto,
                list,
            } => {
                assert_eq!(query, "graph neural networks");
                assert_eq!(category.as_deref(), Some("cs.LG"));
                assert_eq!(max_results, 10);
                assert!(auto);
                assert!(!list);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["xe-bot", "text", "Some content", "--offline"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Text { ref title, offline: true, .. } if title == "Research Animation"
        ));

        let cli = Cli::try_parse_from(["xe-bot", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Command::Serve { host: None, port: Some(9000) }));

        assert!(Cli::try_parse_from(["xe-bot", "demo", "--quality", "ultra"]).is_err());
        assert!(Cli::try_parse_from(["xe-bot"]).is_err());
    }

    #[test]
    fn test_offline_scripts_cover_text_and_segments() {
        let content = "Qubits become entangled when they interact. ".repeat(60);
        let scripts = offline_scripts(&content, "Entanglement Notes");

        let names: Vec<&str> = scripts.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["text_animation", "segment_1", "segment_2", "segment_3", "segment_4"]
        );
        assert!(scripts[0].1.contains("Entanglement Notes"));
        for (_, code) in &scripts[1..] {
            assert_eq!(extract_scene_name(code), "QuantumEntanglementAnimation");
            assert!(code.contains("Animation by Xe-Bot"));
        }
    }

    #[test]
    fn test_text_animation_report_checks_status() {
        let mut anim = AnimationOutcome::pending(
            AnimationKind::Full,
            None,
            "Full Introduction".to_string(),
        );

        anim.status = AnimationStatus::GenerationFailed;
        anim.error = Some("LLM API error 500: boom".to_string());
        let err = text_animation_report(&anim).unwrap_err();
        assert_eq!(
            err.to_string(),
            "✗ Failed (generation_failed): LLM API error 500: boom"
        );

        anim.status = AnimationStatus::RenderFailed;
        anim.error = Some("manim exited with code 1".to_string());
        assert!(text_animation_report(&anim)
            .unwrap_err()
            .to_string()
            .contains("render_failed"));

        anim.status = AnimationStatus::CodeGenerated;
        anim.error = None;
        anim.manim_code = Some("class FullIntroductionAnimation(Scene): pass".to_string());
        let lines = text_animation_report(&anim).unwrap();
        assert_eq!(lines[0], "✓ Animation code generated!");
        assert_eq!(lines[1], "class FullIntroductionAnimation(Scene): pass");

        anim.status = AnimationStatus::Rendered;
        anim.file_path = Some(PathBuf::from("/tmp/full.mp4"));
        let lines = text_animation_report(&anim).unwrap();
        assert_eq!(lines, vec!["✓ Animation generated!", "  Output: /tmp/full.mp4"]);
    }
}
