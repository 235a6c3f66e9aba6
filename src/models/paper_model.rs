//! models/paper_model.rs
//! Estructuras de datos para papers (arXiv, búsqueda y registros en DB).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::animation_model::AnimationRecord;
use super::segment_model::SegmentRecord;
use crate::utils::truncate_with_suffix;

/// Paper tal como viene de arXiv (más el texto extraído del PDF)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaperData {
    pub arxiv_id: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub pdf_url: String,
    pub source: String,
    pub published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
}

impl PaperData {
    /// "A, B, C..." con los primeros `n` autores.
    pub fn authors_preview(&self, n: usize) -> String {
        let shown: Vec<&str> = self.authors.iter().take(n).map(String::as_str).collect();
        let mut out = shown.join(", ");
        if self.authors.len() > n {
            out.push_str("...");
        }
        out
    }

    /// Fecha YYYY-MM-DD de publicación, si viene.
    pub fn published_date(&self) -> Option<String> {
        self.published
            .as_ref()
            .map(|p| p.chars().take(10).collect::<String>())
    }
}

/// Orden de resultados en búsquedas de arXiv
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Relevance,
    Submitted,
    Updated,
}

impl SortOrder {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::Submitted => "submittedDate",
            SortOrder::Updated => "lastUpdatedDate",
        }
    }
}

/// Item de búsqueda que devuelve la API pública
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperSearchItem {
    pub arxiv_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub published: Option<String>,
    pub pdf_url: String,
}

impl From<&PaperData> for PaperSearchItem {
    fn from(p: &PaperData) -> Self {
        PaperSearchItem {
            arxiv_id: p.arxiv_id.clone(),
            title: p.title.clone(),
            authors: p.authors.iter().take(5).cloned().collect(),
            summary: truncate_with_suffix(&p.abstract_text, 500, "..."),
            published: p.published_date(),
            pdf_url: p.pdf_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub papers: Vec<PaperSearchItem>,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainQuery {
    pub domain: String,
    pub max_results: Option<u32>,
    pub category: Option<String>,
}

/// Estado de procesamiento de un paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Fetching,
    Extracting,
    Segmenting,
    Animating,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Fetching => "fetching",
            ProcessingStatus::Extracting => "extracting",
            ProcessingStatus::Segmenting => "segmenting",
            ProcessingStatus::Animating => "animating",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ProcessingStatus::Pending),
            "fetching" => Some(ProcessingStatus::Fetching),
            "extracting" => Some(ProcessingStatus::Extracting),
            "segmenting" => Some(ProcessingStatus::Segmenting),
            "animating" => Some(ProcessingStatus::Animating),
            "completed" => Some(ProcessingStatus::Completed),
            "failed" => Some(ProcessingStatus::Failed),
            _ => None,
        }
    }
}

/// Fila de `research_papers`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: i64,
    pub arxiv_id: Option<String>,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub pdf_url: Option<String>,
    pub source: String,
    pub status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaperListResponse {
    pub papers: Vec<PaperRecord>,
    pub count: usize,
}

/// Paper con segmentos y animaciones (GET /papers/{arxiv_id})
#[derive(Debug, Clone, Serialize)]
pub struct PaperDetail {
    #[serde(flatten)]
    pub paper: PaperRecord,
    pub introduction: Option<String>,
    pub segments: Vec<SegmentRecord>,
    pub animations: Vec<AnimationRecord>,
}
