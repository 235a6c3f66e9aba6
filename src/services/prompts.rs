//! services/prompts.rs
//! Prompts del LLM (extracción, segmentación y generación de código Manim).

use crate::models::segment_model::{AnimationDescription, Segment, TopicCategory};
use crate::services::llm_service::ChatMessage;
use crate::utils::truncate_chars;

/// Caracteres del paper que se mandan para extraer la introducción
pub const MAX_PAPER_CHARS: usize = 15_000;
/// Segmentos que entran en la animación completa
pub const MAX_FULL_SEGMENTS: usize = 5;

const EXTRACTION_SYSTEM: &str = "You are an expert at analyzing academic research papers.
Your task is to extract ONLY the Introduction section from the paper.

Rules:
1. Extract the complete Introduction section, including all paragraphs
2. Do not include the Abstract
3. Do not include any section that comes after the Introduction (Methods, Related Work, etc.)
4. If the introduction has subsections, include them
5. Return ONLY the introduction text, nothing else
6. If there is no clear Introduction section, extract the first substantive section that introduces the topic";

const SEGMENTATION_SYSTEM: &str = r#"You are an expert at UNDERSTANDING and VISUALIZING research concepts.
Extract the CORE IDEAS of the paper introduction that can be ANIMATED, the way a
3Blue1Brown animator would explain them through visual metaphors.

Create 3-5 segments. For each segment provide:
1. concept_summary: the core idea in 1-2 sentences
2. visual_metaphor: a concrete visual representation (e.g. "particles flowing through a funnel")
3. topic: short title (2-4 words)
4. topic_category: one of [background, problem_statement, motivation, related_work, approach, contributions, outline]
5. key_concepts: 2-3 key technical terms
6. animation_description: an object with
   - scene: what objects appear
   - action: what motion happens (merge, split, flow, transform, pulse)
   - insight: the moment that shows the "aha" understanding
7. content: original text excerpt (brief, for reference only)

Example segment:
{
  "concept_summary": "The model learns to focus on the relevant parts of the input, like a spotlight on a stage",
  "visual_metaphor": "A spotlight sweeping across words, brightening important ones",
  "topic": "Attention Mechanism",
  "topic_category": "approach",
  "key_concepts": ["attention weights", "self-attention"],
  "animation_description": {
    "scene": "A row of word boxes with a glowing orb above them",
    "action": "The orb sends beams to each word; brightness follows the attention weight",
    "insight": "The beams converge into one output dominated by the brightest words"
  },
  "content": "The attention mechanism allows the model to..."
}

Return a JSON object with a "segments" array containing 3-5 segments."#;

const CODE_RULES: &str = "=== HARD RULES ===
- Output ONLY Python code for Manim Community Edition, no explanations
- Start with `from manim import *` and `import numpy as np`
- Exactly one class deriving from Scene with a `construct(self)` method
- Use Text() only; NEVER MathTex or Tex (no LaTeX is installed)
- Plain ASCII inside strings; keep every Text() under 50 characters
- Before every new section clear the screen: self.play(*[FadeOut(m) for m in self.mobjects])
- Every run_time and wait must be positive
- Keep objects inside the frame (x in [-6, 6], y in [-3.5, 3.5])
- End the scene with a short closing animation";

fn category_hint(category: TopicCategory) -> &'static str {
    match category {
        TopicCategory::Background => {
            "CONTEXT: a constellation of floating particles for the field, nodes appearing and connecting, gentle pulsing"
        }
        TopicCategory::ProblemStatement => {
            "PROBLEM: show a working system, then break it; morph a good shape into a broken one; colors fading from GREEN to RED"
        }
        TopicCategory::Motivation => {
            "CAUSE-EFFECT: domino chains, ripples spreading outward, a seed growing into a full structure"
        }
        TopicCategory::RelatedWork => {
            "COMPARISON: morph approach A into approach B, a timeline with moving dots, overlapping circles"
        }
        TopicCategory::Approach => {
            "PIPELINE: glowing particles streaming through connected nodes, objects changing form at each stage"
        }
        TopicCategory::Contributions => {
            "ACHIEVEMENTS: stars appearing, building blocks stacking into a structure, a spotlight on each contribution"
        }
        TopicCategory::Outline => {
            "ROADMAP: a dot traveling along a path through milestones that light up"
        }
        TopicCategory::General => {
            "CONCEPT: a central idea with orbiting related concepts, pieces assembling into a whole"
        }
    }
}

/// Pistas especiales cuando el segmento es de física cuántica.
fn quantum_hint(text: &str) -> Option<&'static str> {
    let has = |kws: &[&str]| kws.iter().any(|kw| text.contains(kw));
    if has(&["entangle", "bell", "epr", "non-local", "correlated spin"]) {
        Some("QUANTUM ENTANGLEMENT: two particles joined by a dashed link, correlated spin arrows flipping together, a measurement flash")
    } else if has(&["superposition", "both states", "probability amplitude"]) {
        Some("QUANTUM SUPERPOSITION: a fuzzy probability cloud holding several semi-transparent states that collapses to one point")
    } else if has(&["measurement", "collapse", "observer"]) {
        Some("QUANTUM MEASUREMENT: blurry cloud, a detector rectangle, a flash and a single definite state afterwards")
    } else if has(&["tunnel", "barrier", "forbidden"]) {
        Some("QUANTUM TUNNELING: a wave packet hitting a tall barrier, fading inside it and a smaller wave emerging beyond")
    } else if has(&["wave function", "schrodinger", "psi"]) {
        Some("WAVE FUNCTION: a curve whose squared magnitude is shaded, spreading over time")
    } else if has(&["interference", "double slit", "double-slit", "fringe"]) {
        Some("QUANTUM INTERFERENCE: a double slit with arcs spreading from each gap and bright/dark bands on a screen")
    } else if has(&["qubit", "bloch", "quantum gate", "quantum comput"]) {
        Some("QUBITS: a state arrow on a sphere rotated by gates, boxes and lines forming a circuit")
    } else if has(&["decoherence", "environment", "classical limit"]) {
        Some("DECOHERENCE: environment dots approaching a clean wave that becomes noisy, PURPLE fading to GRAY")
    } else {
        None
    }
}

fn describe_animation(desc: &AnimationDescription) -> String {
    match desc {
        AnimationDescription::Structured {
            scene,
            action,
            insight,
        } => format!("SCENE: {}\nACTION: {}\nINSIGHT: {}", scene, action, insight),
        AnimationDescription::Text(text) => format!("ANIMATION: {}", text),
    }
}

pub fn extraction_messages(paper_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(EXTRACTION_SYSTEM),
        ChatMessage::user(format!(
            "Extract the Introduction section from this research paper:\n\n{}",
            truncate_chars(paper_text, MAX_PAPER_CHARS)
        )),
    ]
}

pub fn segmentation_messages(introduction: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SEGMENTATION_SYSTEM),
        ChatMessage::user(format!(
            "Deeply understand this research introduction and extract the CORE IDEAS that can be visualized:\n\n{}",
            introduction
        )),
    ]
}

pub fn segment_code_messages(segment: &Segment, style: &str) -> Vec<ChatMessage> {
    let search_text = format!("{} {}", segment.content, segment.topic).to_lowercase();
    let hint = quantum_hint(&search_text).unwrap_or_else(|| category_hint(segment.topic_category));

    let system = format!(
        "You are a 3Blue1Brown-style animator creating visual explanations with Manim.\n\
         Concepts become animated metaphors: particles, flows, morphing shapes, orbits.\n\n\
         === VISUALIZATION FOR THIS SEGMENT ===\n{}\n\n{}\n\nAnimation style: {}",
        hint, CODE_RULES, style
    );

    let mut user = format!(
        "Create a Manim animation for this research segment.\n\nTOPIC: {}\nCATEGORY: {}\n",
        segment.topic_or(0),
        segment.topic_category.as_str()
    );
    if let Some(summary) = &segment.concept_summary {
        user.push_str(&format!("CORE IDEA: {}\n", summary));
    }
    if let Some(metaphor) = &segment.visual_metaphor {
        user.push_str(&format!("VISUAL METAPHOR: {}\n", metaphor));
    }
    if let Some(desc) = &segment.animation_description {
        user.push_str(&describe_animation(desc));
        user.push('\n');
    }
    user.push_str(&format!(
        "KEY CONCEPTS: {}\n\nCONTENT:\n{}",
        segment.key_concepts.join(", "),
        truncate_chars(&segment.content, 2000)
    ));

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Resumen por segmento que va en el prompt de la animación completa.
pub fn full_animation_summary(segments: &[Segment]) -> String {
    segments
        .iter()
        .take(MAX_FULL_SEGMENTS)
        .enumerate()
        .map(|(i, s)| {
            let mut desc = format!("SEGMENT {}: {}\n", i + 1, s.topic_or(i));
            if let Some(summary) = &s.concept_summary {
                desc.push_str(&format!("CORE IDEA: {}\n", summary));
            }
            if let Some(metaphor) = &s.visual_metaphor {
                desc.push_str(&format!("VISUAL METAPHOR: {}\n", metaphor));
            }
            if let Some(anim @ AnimationDescription::Structured { .. }) = &s.animation_description {
                desc.push_str(&describe_animation(anim));
                desc.push('\n');
            }
            desc.push_str(&format!("Category: {}\n", s.topic_category.as_str()));
            desc.push_str(&format!("Suggested Visual: {}\n", category_hint(s.topic_category)));
            desc.push_str(&format!("Key Terms: {}", s.key_concepts.join(", ")));
            desc
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn full_code_messages(title: &str, segments: &[Segment]) -> Vec<ChatMessage> {
    let system = format!(
        "You are a 3Blue1Brown-style animator creating one continuous Manim animation\n\
         that walks through every segment of a paper introduction in order.\n\
         Show, don't tell: build complexity gradually and let motion carry meaning.\n\
         Start each segment with a short title Text, then its visual metaphor.\n\n{}",
        CODE_RULES
    );
    let user = format!(
        "Create a complete Manim animation for the paper \"{}\".\n\n{}\n\n\
         Name the class FullIntroductionAnimation.",
        title,
        full_animation_summary(segments)
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Prompt para POST /api/generate-code (tema libre)
pub fn topic_code_messages(topic: &str, concepts: &[String], style: &str) -> Vec<ChatMessage> {
    let system = format!(
        "You are a 3Blue1Brown-style animator creating visual explanations with Manim.\n\n{}\n\nAnimation style: {}",
        CODE_RULES, style
    );
    let user = format!(
        "Create a Manim animation that explains: {}\nKey concepts: {}",
        topic,
        if concepts.is_empty() {
            "(none given)".to_string()
        } else {
            concepts.join(", ")
        }
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}
