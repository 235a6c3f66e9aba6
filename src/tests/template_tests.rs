//! tests/template_tests.rs

#[cfg(test)]
mod tests {
    use crate::models::segment_model::{Segment, TopicCategory};
    use crate::services::code_sanitizer::{brackets_balanced, extract_scene_name};
    use crate::services::templates::{
        chunk_text, concept_animation, error_scene, fallback_scene, for_segment, generic_scene,
        is_quantum_topic, quantum_animation, segment_animation, text_animation, QuantumKind,
    };

    fn quantum_segment(content: &str) -> Segment {
        Segment {
            content: content.to_string(),
            topic: "Quantum Effects".to_string(),
            topic_category: TopicCategory::Background,
            ..Segment::default()
        }
    }

    #[test]
    fn test_fallback_scene_names_and_title() {
        let (code, name) = fallback_scene("quantum_entanglement_scene");
        assert_eq!(name, "QuantumEntanglementScene");
        assert!(code.contains("class QuantumEntanglementScene(Scene):"));
        assert!(code.contains("Text(\"quantum entanglement scene\""));
        assert!(brackets_balanced(&code));

        let (code, name) = fallback_scene("");
        assert_eq!(name, "GeneratedScene");
        assert!(code.contains("Text(\"Research Animation\""));

        let (code, _) = fallback_scene("a_very_long_topic_name_that_keeps_going_and_going");
        assert!(code.contains("Text(\"a very long topic name that keep...\""));
    }

    #[test]
    fn test_static_scenes_are_valid() {
        for code in [error_scene(), generic_scene()] {
            assert_eq!(extract_scene_name(&code), "GeneratedScene");
            assert!(brackets_balanced(&code));
            assert!(code.contains("Animation by Xe-Bot"));
        }
        assert!(error_scene().contains("Animation Generation Error"));
    }

    #[test]
    fn test_chunk_text_wraps_on_width() {
        let chunks = chunk_text("aaaa bbbb cccc dddd", 10);
        assert_eq!(chunks, vec!["aaaa bbbb", "cccc dddd"]);
        assert!(chunk_text("   ", 10).is_empty());
    }

    #[test]
    fn test_text_animation_escapes_input() {
        let code = text_animation("He said \"hi\"\nand left", "My \"Title\"");
        assert_eq!(extract_scene_name(&code), "ResearchAnimation");
        assert!(code.contains("Text(\"My \\\"Title\\\"\", font_size=42"));
        assert!(code.contains("He said \\\"hi\\\" and left"));
        assert!(brackets_balanced(&code));
    }

    #[test]
    fn test_concept_animation_limits_concepts() {
        let concepts: Vec<String> = (0..10).map(|i| format!("concept {}", i)).collect();
        let code = concept_animation(&concepts, "attention");

        assert_eq!(extract_scene_name(&code), "ConceptAnimation");
        assert!(code.contains("\"concept 7\""));
        assert!(!code.contains("\"concept 8\""));
    }

    #[test]
    fn test_segment_animation_uses_category_color() {
        let segment = Segment {
            content: "Recurrent models cannot be parallelized.".to_string(),
            topic: "Sequential Bottleneck".to_string(),
            topic_category: TopicCategory::ProblemStatement,
            key_concepts: vec!["recurrence".to_string()],
            ..Segment::default()
        };
        let code = segment_animation(&segment, 2);

        assert_eq!(extract_scene_name(&code), "Segment2Animation");
        assert!(code.contains("Text(\"Segment 2: Sequential Bottleneck\", font_size=36, color=RED)"));
        assert!(code.contains("\"[problem_statement]\""));
        assert!(code.contains("[\"recurrence\"]"));
        assert!(brackets_balanced(&code));
    }

    #[test]
    fn test_segment_animation_without_topic() {
        let segment = Segment {
            content: "text".to_string(),
            ..Segment::default()
        };
        let code = segment_animation(&segment, 3);
        assert!(code.contains("\"Segment 3: Segment 3\""));
        assert!(code.contains("color=WHITE"));
    }

    #[test]
    fn test_quantum_detection() {
        assert!(is_quantum_topic(&quantum_segment("A qubit evolves.")));
        assert!(!is_quantum_topic(&Segment {
            content: "Convolutional networks classify images.".to_string(),
            topic: "Vision".to_string(),
            ..Segment::default()
        }));

        let cases = [
            ("Two photons become entangled.", QuantumKind::Entanglement),
            ("A particle in superposition.", QuantumKind::Superposition),
            ("Electrons tunnel through a barrier.", QuantumKind::Tunneling),
            ("The double slit shows fringes.", QuantumKind::Interference),
            ("Decoherence destroys the state.", QuantumKind::Decoherence),
            ("A measurement is performed.", QuantumKind::Measurement),
            ("We teleport a qubit.", QuantumKind::Teleportation),
            ("The wave function evolves.", QuantumKind::WaveFunction),
            ("A qubit evolves.", QuantumKind::Entanglement),
            ("Bell's inequality is violated.", QuantumKind::Bell),
            ("The CHSH bound holds classically.", QuantumKind::Bell),
            ("The EPR argument questions completeness.", QuantumKind::Epr),
            ("Einstein, Podolsky and Rosen objected.", QuantumKind::Epr),
            ("These states represent entangled pairs.", QuantumKind::Entanglement),
        ];
        for (content, expected) in cases {
            assert_eq!(QuantumKind::detect(&quantum_segment(content)), expected, "{}", content);
        }
    }

    #[test]
    fn test_quantum_animation_scene() {
        let segment = quantum_segment("Electrons tunnel through a barrier.");
        let code = quantum_animation(&segment, None);

        assert_eq!(extract_scene_name(&code), "QuantumTunnelingAnimation");
        assert!(code.contains("Text(\"Quantum Effects\", font_size=32"));

        let forced = quantum_animation(&segment, Some(QuantumKind::Superposition));
        assert_eq!(extract_scene_name(&forced), "SuperpositionAnimation");
    }

    #[test]
    fn test_short_keywords_match_whole_words() {
        let vision = |content: &str| Segment {
            content: content.to_string(),
            topic: "Vision".to_string(),
            ..Segment::default()
        };
        assert!(!is_quantum_topic(&vision("Features represent edges in a bellows camera.")));
        assert!(is_quantum_topic(&vision("We run a Bell test on photons.")));
        assert!(is_quantum_topic(&vision("The EPR pair is shared.")));
    }

    #[test]
    fn test_bell_and_epr_scenes() {
        let bell = quantum_animation(&quantum_segment("Bell's inequality."), None);
        assert_eq!(extract_scene_name(&bell), "BellInequalityAnimation");
        assert!(bell.contains("Detector A"));

        let epr = quantum_animation(&quantum_segment("Effects"), Some(QuantumKind::Epr));
        assert_eq!(extract_scene_name(&epr), "EPRParadoxAnimation");
        assert!(epr.contains("Spooky action at a distance"));
        assert_eq!(QuantumKind::Epr.as_str(), "epr");
    }

    #[test]
    fn test_for_segment_picks_template() {
        let quantum = for_segment(&quantum_segment("Electrons tunnel through a barrier."), 2);
        assert_eq!(extract_scene_name(&quantum), "QuantumTunnelingAnimation");

        let plain = for_segment(
            &Segment {
                content: "Recurrent models process tokens one at a time.".to_string(),
                topic: "Background".to_string(),
                topic_category: TopicCategory::Background,
                ..Segment::default()
            },
            2,
        );
        assert_eq!(extract_scene_name(&plain), "Segment2Animation");
    }
}
