//! services/segment_service.rs
//! Parseo de la respuesta de segmentación y segmentos por defecto.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::models::segment_model::{Segment, TopicCategory};

pub const MIN_SEGMENTS: usize = 3;
pub const MAX_SEGMENTS: usize = 5;
/// Cantidad de segmentos que produce el respaldo
pub const FALLBACK_SEGMENTS: usize = 4;
const MIN_CHUNK_WORDS: usize = 50;

#[derive(Debug, Deserialize)]
struct SegmentsEnvelope {
    #[serde(default)]
    segments: Vec<serde_json::Value>,
}

/// Convierte cada elemento por separado; los que no son objetos se descartan.
fn collect_segments(items: Vec<serde_json::Value>) -> Vec<Segment> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            if !item.is_object() {
                log::warn!("(parse_segments_response) Segmento {} no es un objeto, se descarta", i + 1);
                return None;
            }
            match serde_json::from_value::<Segment>(item) {
                Ok(segment) => Some(segment),
                Err(e) => {
                    log::warn!("(parse_segments_response) Segmento {} inválido: {}", i + 1, e);
                    None
                }
            }
        })
        .collect()
}

/// Quita ```json ... ``` si el modelo envolvió la respuesta.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parsea `{"segments": [...]}` (también acepta un array suelto).
pub fn parse_segments_response(raw: &str) -> Result<Vec<Segment>> {
    let body = strip_code_fences(raw);
    if body.starts_with('[') {
        let items = serde_json::from_str::<Vec<serde_json::Value>>(body)
            .context("Respuesta de segmentación no es un array válido")?;
        return Ok(collect_segments(items));
    }
    let envelope: SegmentsEnvelope =
        serde_json::from_str(body).context("Respuesta de segmentación no es JSON válido")?;
    Ok(collect_segments(envelope.segments))
}

/// Menos de 3 → completa con segmentos por defecto; más de 5 → se queda con los primeros 5.
pub fn validate_segment_count(segments: Vec<Segment>, introduction: &str) -> Vec<Segment> {
    if segments.len() < MIN_SEGMENTS {
        log::warn!(
            "(validate_segment_count) Sólo {} segmentos, se completan con los de respaldo",
            segments.len()
        );
        return fallback_segments(introduction, segments);
    }
    if segments.len() > MAX_SEGMENTS {
        log::warn!(
            "(validate_segment_count) {} segmentos supera el máximo de {}, se recorta",
            segments.len(),
            MAX_SEGMENTS
        );
        return segments.into_iter().take(MAX_SEGMENTS).collect();
    }
    segments
}

fn default_segments() -> Vec<Segment> {
    let make = |content: &str,
                topic: &str,
                category: TopicCategory,
                concepts: [&str; 2],
                kind: &str,
                style: &str| Segment {
        content: content.to_string(),
        topic: topic.to_string(),
        topic_category: category,
        key_concepts: concepts.iter().map(|c| c.to_string()).collect(),
        animation_hints: json!({ "type": kind, "style": style }),
        ..Segment::default()
    };

    vec![
        make(
            "Background and context of the research area.",
            "Background",
            TopicCategory::Background,
            ["research area", "context"],
            "overview",
            "expanding circles",
        ),
        make(
            "The problem this research addresses.",
            "Problem Statement",
            TopicCategory::ProblemStatement,
            ["challenge", "limitation"],
            "problem",
            "highlight issues",
        ),
        make(
            "Why this problem is important to solve.",
            "Motivation",
            TopicCategory::Motivation,
            ["importance", "impact"],
            "motivation",
            "cause-effect",
        ),
        make(
            "The approach taken to address the problem.",
            "Approach",
            TopicCategory::Approach,
            ["method", "solution"],
            "solution",
            "flowchart",
        ),
    ]
}

/// Segmentos de respaldo. Con `existing` se completan hasta 4 con categorías que falten;
/// sin ellos, la introducción se reparte en 4 bloques de al menos 50 palabras.
pub fn fallback_segments(introduction: &str, existing: Vec<Segment>) -> Vec<Segment> {
    let defaults = default_segments();

    if !existing.is_empty() {
        let mut result = existing;
        for seg in defaults {
            if result.len() >= FALLBACK_SEGMENTS {
                break;
            }
            if !result.iter().any(|s| s.topic_category == seg.topic_category) {
                result.push(seg);
            }
        }
        return result;
    }

    let words: Vec<&str> = introduction.split_whitespace().collect();
    let chunk_size = (words.len() / FALLBACK_SEGMENTS).max(MIN_CHUNK_WORDS);

    let result: Vec<Segment> = defaults
        .iter()
        .enumerate()
        .filter_map(|(i, seg)| {
            let start = i * chunk_size;
            if start >= words.len() {
                return None;
            }
            let end = ((i + 1) * chunk_size).min(words.len());
            Some(Segment {
                content: words[start..end].join(" "),
                ..seg.clone()
            })
        })
        .collect();

    if result.len() >= FALLBACK_SEGMENTS {
        result
    } else {
        defaults
    }
}
