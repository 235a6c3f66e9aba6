//! services/paper_service.rs
//! Persistencia de papers, introducciones, segmentos, animaciones y logs de etapas.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::models::animation_model::{AnimationOutcome, AnimationRecord};
use crate::models::paper_model::{PaperData, PaperDetail, PaperRecord, ProcessingStatus};
use crate::models::segment_model::{Segment, SegmentRecord};
use crate::utils::word_count;

/// Animación con los datos del paper y del segmento al que pertenece
#[derive(Debug, Clone)]
pub struct AnimationListing {
    pub animation: AnimationRecord,
    pub arxiv_id: Option<String>,
    pub paper_title: String,
    pub topic: Option<String>,
}

/// Entrada de `agent_logs`
#[derive(Debug, Clone)]
pub struct StageLog<'a> {
    pub paper_id: Option<i64>,
    pub agent_name: &'a str,
    pub action: &'a str,
    pub input: Value,
    pub output: Value,
    pub success: bool,
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

#[derive(Clone, Debug)]
pub struct PaperService {
    db_pool: Pool<Sqlite>,
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .with_context(|| format!("Fecha inválida en DB: {}", raw))
}

fn json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn paper_from_row(row: &SqliteRow) -> Result<PaperRecord> {
    let status: String = row.try_get("status")?;
    let authors: String = row.try_get("authors")?;
    Ok(PaperRecord {
        id: row.try_get("id")?,
        arxiv_id: row.try_get("arxiv_id")?,
        title: row.try_get("title")?,
        authors: json_list(&authors),
        abstract_text: row.try_get("abstract")?,
        pdf_url: row.try_get("pdf_url")?,
        source: row.try_get("source")?,
        status: ProcessingStatus::parse(&status).unwrap_or(ProcessingStatus::Pending),
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at")?)?,
    })
}

fn segment_from_row(row: &SqliteRow) -> Result<SegmentRecord> {
    let concepts: String = row.try_get("key_concepts")?;
    Ok(SegmentRecord {
        id: row.try_get("id")?,
        paper_id: row.try_get("paper_id")?,
        order: row.try_get("segment_order")?,
        content: row.try_get("content")?,
        topic: row.try_get("topic")?,
        category: row.try_get("topic_category")?,
        key_concepts: json_list(&concepts),
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
    })
}

fn animation_from_row(row: &SqliteRow) -> Result<AnimationRecord> {
    Ok(AnimationRecord {
        id: row.try_get("id")?,
        paper_id: row.try_get("paper_id")?,
        segment_id: row.try_get("segment_id")?,
        kind: row.try_get("animation_type")?,
        scene_name: row.try_get("scene_name")?,
        file_path: row.try_get("file_path")?,
        video_url: row.try_get("video_url")?,
        duration_seconds: row.try_get("duration_seconds")?,
        file_size_bytes: row.try_get("file_size_bytes")?,
        status: row.try_get("status")?,
        error_message: row.try_get("error_message")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
    })
}

const ANIMATION_COLUMNS: &str = "a.id, a.paper_id, a.segment_id, a.animation_type, a.scene_name, \
     a.file_path, a.video_url, a.duration_seconds, a.file_size_bytes, a.status, \
     a.error_message, a.created_at";

impl PaperService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        PaperService { db_pool }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.db_pool
    }

    /// Inserta o actualiza (por arxiv_id) y devuelve el id.
    /// Papers sin arxiv_id (texto libre) siempre se insertan.
    pub async fn upsert_paper(&self, paper: &PaperData, status: ProcessingStatus) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let arxiv_id = Some(paper.arxiv_id.trim()).filter(|id| !id.is_empty());
        let authors = serde_json::to_string(&paper.authors)?;

        let row = sqlx::query(
            r#"
            INSERT INTO research_papers (
                arxiv_id, title, authors, abstract, pdf_url, source, status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ON CONFLICT(arxiv_id) DO UPDATE SET
                title = excluded.title,
                authors = excluded.authors,
                abstract = excluded.abstract,
                pdf_url = excluded.pdf_url,
                status = excluded.status,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(arxiv_id)
        .bind(&paper.title)
        .bind(authors)
        .bind(&paper.abstract_text)
        .bind(Some(paper.pdf_url.as_str()).filter(|u| !u.is_empty()))
        .bind(&paper.source)
        .bind(status.as_str())
        .bind(&now)
        .fetch_one(&self.db_pool)
        .await
        .context("Fallo al guardar paper")?;

        Ok(row.try_get("id")?)
    }

    pub async fn update_status(&self, paper_id: i64, status: ProcessingStatus) -> Result<()> {
        sqlx::query("UPDATE research_papers SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(paper_id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al actualizar estado del paper")?;
        Ok(())
    }

    /// Guarda la introducción (reemplaza la anterior).
    pub async fn save_introduction(&self, paper_id: i64, content: &str) -> Result<i64> {
        let mut tx = self.db_pool.begin().await?;
        sqlx::query("DELETE FROM paper_introductions WHERE paper_id = ?1")
            .bind(paper_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query(
            r#"
            INSERT INTO paper_introductions (paper_id, content, word_count, extraction_method, extracted_at)
            VALUES (?1, ?2, ?3, 'llm', ?4)
            "#,
        )
        .bind(paper_id)
        .bind(content)
        .bind(word_count(content) as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Fallo al guardar introducción")?;
        tx.commit().await?;
        Ok(result.last_insert_rowid())
    }

    /// Reemplaza los segmentos del paper (y sus animaciones) y devuelve los ids en orden.
    pub async fn replace_segments(&self, paper_id: i64, segments: &[Segment]) -> Result<Vec<i64>> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.db_pool.begin().await?;

        sqlx::query("DELETE FROM animations WHERE paper_id = ?1")
            .bind(paper_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM intro_segments WHERE paper_id = ?1")
            .bind(paper_id)
            .execute(&mut *tx)
            .await?;

        let mut ids = Vec::with_capacity(segments.len());
        for (i, seg) in segments.iter().enumerate() {
            let result = sqlx::query(
                r#"
                INSERT INTO intro_segments (
                    paper_id, segment_order, content, topic, topic_category,
                    key_concepts, animation_hints, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(paper_id)
            .bind(i as i64)
            .bind(&seg.content)
            .bind(seg.topic_or(i))
            .bind(seg.topic_category.as_str())
            .bind(serde_json::to_string(&seg.key_concepts)?)
            .bind(seg.animation_hints.to_string())
            .bind(&now)
            .execute(&mut *tx)
            .await
            .context("Fallo al guardar segmento")?;
            ids.push(result.last_insert_rowid());
        }

        tx.commit().await?;
        Ok(ids)
    }

    pub async fn save_animation(
        &self,
        paper_id: i64,
        segment_id: Option<i64>,
        outcome: &AnimationOutcome,
        urls: Option<(String, String)>,
    ) -> Result<i64> {
        let (video_url, download_url) = match urls {
            Some((v, d)) => (Some(v), Some(d)),
            None => (None, None),
        };
        let result = sqlx::query(
            r#"
            INSERT INTO animations (
                paper_id, segment_id, animation_type, scene_name, file_path, video_url,
                download_url, manim_code, duration_seconds, file_size_bytes, status,
                error_message, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(paper_id)
        .bind(segment_id)
        .bind(outcome.kind.as_str())
        .bind(&outcome.scene_name)
        .bind(
            outcome
                .file_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
        )
        .bind(video_url)
        .bind(download_url)
        .bind(&outcome.manim_code)
        .bind(outcome.duration_seconds as i64)
        .bind(outcome.file_size_bytes as i64)
        .bind(outcome.status.as_str())
        .bind(&outcome.error)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db_pool)
        .await
        .context("Fallo al guardar animación")?;
        Ok(result.last_insert_rowid())
    }

    pub async fn log_stage(&self, log: StageLog<'_>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO agent_logs (
                paper_id, agent_name, action, input_data, output_data, status,
                error_message, execution_time_ms, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(log.paper_id)
        .bind(log.agent_name)
        .bind(log.action)
        .bind(log.input.to_string())
        .bind(log.output.to_string())
        .bind(if log.success { "success" } else { "failed" })
        .bind(log.error)
        .bind(log.execution_time_ms as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db_pool)
        .await
        .context("Fallo al guardar agent_log")?;
        Ok(())
    }

    pub async fn count_stage_logs(&self, paper_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM agent_logs WHERE paper_id = ?1")
            .bind(paper_id)
            .fetch_one(&self.db_pool)
            .await?;
        Ok(row.try_get("cnt")?)
    }

    /// Papers procesados, más recientes primero
    pub async fn list_papers(&self) -> Result<Vec<PaperRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, arxiv_id, title, authors, abstract, pdf_url, source, status,
                   created_at, updated_at
            FROM research_papers
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al listar papers")?;

        rows.iter().map(paper_from_row).collect()
    }

    /// Paper con introducción, segmentos y animaciones.
    pub async fn get_paper_detail(&self, arxiv_id: &str) -> Result<Option<PaperDetail>> {
        let row = sqlx::query(
            r#"
            SELECT id, arxiv_id, title, authors, abstract, pdf_url, source, status,
                   created_at, updated_at
            FROM research_papers
            WHERE arxiv_id = ?1
            "#,
        )
        .bind(arxiv_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al buscar paper")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let paper = paper_from_row(&row)?;

        let introduction: Option<String> = sqlx::query(
            "SELECT content FROM paper_introductions WHERE paper_id = ?1 ORDER BY id DESC LIMIT 1",
        )
        .bind(paper.id)
        .fetch_optional(&self.db_pool)
        .await?
        .map(|r| r.try_get("content"))
        .transpose()?;

        let segments = sqlx::query(
            r#"
            SELECT id, paper_id, segment_order, content, topic, topic_category, key_concepts, created_at
            FROM intro_segments
            WHERE paper_id = ?1
            ORDER BY segment_order
            "#,
        )
        .bind(paper.id)
        .fetch_all(&self.db_pool)
        .await?
        .iter()
        .map(segment_from_row)
        .collect::<Result<Vec<_>>>()?;

        let animations = sqlx::query(&format!(
            "SELECT {} FROM animations a WHERE a.paper_id = ?1 ORDER BY a.id",
            ANIMATION_COLUMNS
        ))
        .bind(paper.id)
        .fetch_all(&self.db_pool)
        .await?
        .iter()
        .map(animation_from_row)
        .collect::<Result<Vec<_>>>()?;

        Ok(Some(PaperDetail {
            paper,
            introduction,
            segments,
            animations,
        }))
    }

    /// Animaciones con archivo, con paper y tópico (para /videos/enriched).
    pub async fn list_animations_with_paper(&self) -> Result<Vec<AnimationListing>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}, p.arxiv_id AS paper_arxiv_id, p.title AS paper_title, s.topic AS segment_topic
            FROM animations a
            JOIN research_papers p ON p.id = a.paper_id
            LEFT JOIN intro_segments s ON s.id = a.segment_id
            WHERE a.file_path IS NOT NULL
            ORDER BY a.id DESC
            "#,
            ANIMATION_COLUMNS
        ))
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al listar animaciones")?;

        rows.iter()
            .map(|row| {
                Ok(AnimationListing {
                    animation: animation_from_row(row)?,
                    arxiv_id: row.try_get("paper_arxiv_id")?,
                    paper_title: row.try_get("paper_title")?,
                    topic: row.try_get("segment_topic")?,
                })
            })
            .collect()
    }

    pub async fn paper_id_for(&self, arxiv_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT id FROM research_papers WHERE arxiv_id = ?1")
            .bind(arxiv_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| anyhow!("Paper no encontrado: {}", arxiv_id))?;
        Ok(row.try_get("id")?)
    }
}
