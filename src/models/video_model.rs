use serde::{Deserialize, Serialize};

/// Video encontrado en disco, con sus URLs públicas
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoInfo {
    pub id: String,
    pub filename: String,
    /// ruta relativa al directorio de videos
    pub path: String,
    pub url: String,
    pub download_url: String,
    pub size_bytes: u64,
    pub created_at: Option<String>,
    /// "animations" o "media"
    pub source: String,
}

/// Video con datos del paper y segmento (si está en la DB)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedVideo {
    #[serde(flatten)]
    pub video: VideoInfo,
    pub arxiv_id: Option<String>,
    pub paper_title: Option<String>,
    pub topic: Option<String>,
    pub kind: Option<String>,
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoListResponse<T> {
    pub videos: Vec<T>,
    pub count: usize,
    pub base_url: String,
}
