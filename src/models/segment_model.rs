//! models/segment_model.rs
//! Segmentos de la introducción (lo que devuelve el LLM y lo que se guarda).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Categoría temática de un segmento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TopicCategory {
    Background,
    ProblemStatement,
    Motivation,
    RelatedWork,
    Approach,
    Contributions,
    Outline,
    #[default]
    #[serde(other)]
    General,
}

impl TopicCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicCategory::Background => "background",
            TopicCategory::ProblemStatement => "problem_statement",
            TopicCategory::Motivation => "motivation",
            TopicCategory::RelatedWork => "related_work",
            TopicCategory::Approach => "approach",
            TopicCategory::Contributions => "contributions",
            TopicCategory::Outline => "outline",
            TopicCategory::General => "general",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "background" => TopicCategory::Background,
            "problem_statement" => TopicCategory::ProblemStatement,
            "motivation" => TopicCategory::Motivation,
            "related_work" => TopicCategory::RelatedWork,
            "approach" => TopicCategory::Approach,
            "contributions" => TopicCategory::Contributions,
            "outline" => TopicCategory::Outline,
            _ => TopicCategory::General,
        }
    }

    /// Color Manim asociado a la categoría
    pub fn manim_color(&self) -> &'static str {
        match self {
            TopicCategory::Background => "BLUE",
            TopicCategory::ProblemStatement => "RED",
            TopicCategory::Motivation => "GREEN",
            TopicCategory::Approach => "YELLOW",
            TopicCategory::Contributions => "PURPLE",
            TopicCategory::Outline => "ORANGE",
            TopicCategory::RelatedWork | TopicCategory::General => "WHITE",
        }
    }
}

/// Descripción de la animación: estructurada o texto libre (el LLM hace ambas)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimationDescription {
    Structured {
        #[serde(default)]
        scene: String,
        #[serde(default)]
        action: String,
        #[serde(default)]
        insight: String,
    },
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Segment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub topic: String,
    #[serde(default, deserialize_with = "lenient_category")]
    pub topic_category: TopicCategory,
    #[serde(default, deserialize_with = "lenient_list")]
    pub key_concepts: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub concept_summary: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub visual_metaphor: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_description",
        skip_serializing_if = "Option::is_none"
    )]
    pub animation_description: Option<AnimationDescription>,
    #[serde(default)]
    pub animation_hints: Value,
}

// El LLM no siempre respeta los tipos: un campo raro no debe tirar el segmento entero.

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(scalar_text(&value).unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(scalar_text(&value).filter(|s| !s.is_empty()))
}

fn lenient_category<'de, D: Deserializer<'de>>(d: D) -> Result<TopicCategory, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(value
        .as_str()
        .map(TopicCategory::parse)
        .unwrap_or_default())
}

/// Lista de strings; también acepta "a, b; c" o un escalar suelto.
fn lenient_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(d)?;
    let items: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        Value::String(s) => s.split([',', ';']).map(|p| p.trim().to_string()).collect(),
        other => scalar_text(&other).into_iter().collect(),
    };
    Ok(items.into_iter().filter(|s| !s.is_empty()).collect())
}

fn lenient_description<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<AnimationDescription>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Object(map) => {
            let field = |key: &str| map.get(key).and_then(scalar_text).unwrap_or_default();
            Some(AnimationDescription::Structured {
                scene: field("scene"),
                action: field("action"),
                insight: field("insight"),
            })
        }
        other => scalar_text(&other)
            .filter(|s| !s.is_empty())
            .map(AnimationDescription::Text),
    })
}

impl Segment {
    /// Tópico o "Segment N" si el LLM no lo dio.
    pub fn topic_or(&self, index: usize) -> String {
        if self.topic.trim().is_empty() {
            format!("Segment {}", index + 1)
        } else {
            self.topic.clone()
        }
    }
}

/// Resumen del segmento para respuestas de API/CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub topic: String,
    pub category: TopicCategory,
    pub concepts: Vec<String>,
}

impl From<&Segment> for SegmentSummary {
    fn from(s: &Segment) -> Self {
        SegmentSummary {
            topic: s.topic.clone(),
            category: s.topic_category,
            concepts: s.key_concepts.clone(),
        }
    }
}

/// Fila de `intro_segments`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub id: i64,
    pub paper_id: i64,
    pub order: i64,
    pub content: String,
    pub topic: Option<String>,
    pub category: Option<String>,
    pub key_concepts: Vec<String>,
    pub created_at: DateTime<Utc>,
}
