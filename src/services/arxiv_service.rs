//! services/arxiv_service.rs
//! Búsqueda y descarga de papers desde la API Atom de arXiv.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::config::ArxivConfig;
use crate::models::paper_model::{PaperData, SortOrder};
use crate::services::pdf_text_service::PdfTextService;
use crate::utils::collapse_whitespace;

/// Categorías que se prueban para ids viejos sin prefijo (ej. "0606228")
pub const OLD_STYLE_CATEGORIES: &[&str] =
    &["quant-ph", "hep-th", "cond-mat", "cs", "math", "physics"];

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    published: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: String,
}

/// Fuente de papers (arXiv en producción, fija en tests)
#[async_trait]
pub trait PaperSource: Send + Sync {
    async fn fetch_paper(&self, arxiv_id: &str) -> Result<PaperData>;

    /// Metadatos + PDF + texto de las primeras páginas
    async fn fetch_and_extract(&self, arxiv_id: &str) -> Result<PaperData>;

    async fn search(&self, query: &str, max_results: u32, sort: SortOrder)
        -> Result<Vec<PaperData>>;

    async fn search_by_domain(
        &self,
        domain: &str,
        max_results: u32,
        category: Option<&str>,
    ) -> Result<Vec<PaperData>>;
}

/// Acepta "arxiv:XXXX", "arXiv:XXXX" y URLs /abs/ o /pdf/.
pub fn normalize_arxiv_id(raw: &str) -> String {
    let mut id = raw.trim();
    for marker in ["/abs/", "/pdf/"] {
        if let Some(pos) = id.find(marker) {
            id = &id[pos + marker.len()..];
        }
    }
    let id = id.trim_end_matches(".pdf");
    let lower = id.to_lowercase();
    let id = if lower.starts_with("arxiv:") {
        &id["arxiv:".len()..]
    } else {
        id
    };
    id.trim().trim_end_matches('/').to_string()
}

/// Ids del formato viejo sin categoría: 7 dígitos.
pub fn is_old_style_id(id: &str) -> bool {
    id.len() == 7 && id.chars().all(|c| c.is_ascii_digit())
}

fn version_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"v\d+$").expect("regex inválido"))
}

/// "http://arxiv.org/abs/1706.03762v7" → "1706.03762"
pub fn id_from_entry(entry_id: &str) -> String {
    let tail = match entry_id.find("/abs/") {
        Some(pos) => &entry_id[pos + "/abs/".len()..],
        None => entry_id.rsplit('/').next().unwrap_or(entry_id),
    };
    version_suffix().replace(tail.trim(), "").into_owned()
}

pub fn build_domain_query(domain: &str, category: Option<&str>) -> String {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(cat) => format!("cat:{} AND all:{}", cat, domain.trim()),
        None => format!("all:{}", domain.trim()),
    }
}

/// Parsea el feed Atom. Una entrada de error de la API se devuelve como Err.
pub fn parse_feed(xml: &str) -> Result<Vec<PaperData>> {
    let feed: AtomFeed =
        serde_xml_rs::from_str(xml).map_err(|e| anyhow!("Feed de arXiv inválido: {}", e))?;

    let mut papers = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        if entry.id.contains("/api/errors") {
            return Err(anyhow!(
                "arXiv API error: {}",
                collapse_whitespace(&entry.summary)
            ));
        }
        let arxiv_id = id_from_entry(&entry.id);
        papers.push(PaperData {
            pdf_url: format!("https://arxiv.org/pdf/{}", arxiv_id),
            arxiv_id,
            title: collapse_whitespace(&entry.title),
            authors: entry
                .authors
                .into_iter()
                .map(|a| collapse_whitespace(&a.name))
                .collect(),
            abstract_text: collapse_whitespace(&entry.summary),
            source: "arxiv".to_string(),
            published: entry.published,
            full_text: None,
        });
    }
    Ok(papers)
}

#[derive(Clone)]
pub struct ArxivService {
    client: reqwest::Client,
    config: ArxivConfig,
    pdf_text: PdfTextService,
}

impl ArxivService {
    pub fn new(config: ArxivConfig, pdf_text: PdfTextService) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent("xe-bot/0.1 (research animation generator)")
            .build()
            .context("No se pudo crear el cliente HTTP de arXiv")?;
        Ok(ArxivService {
            client,
            config,
            pdf_text,
        })
    }

    async fn query_feed(&self, params: &[(&str, String)]) -> Result<Vec<PaperData>> {
        let response = self
            .client
            .get(&self.config.api_url)
            .query(params)
            .send()
            .await
            .context("Fallo la consulta a arXiv")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("arXiv respondió {}", status));
        }
        let body = response
            .text()
            .await
            .context("No se pudo leer la respuesta de arXiv")?;
        parse_feed(&body)
    }

    async fn lookup(&self, id: &str) -> Result<Option<PaperData>> {
        let papers = self
            .query_feed(&[("id_list", id.to_string()), ("max_results", "1".to_string())])
            .await?;
        Ok(papers.into_iter().next())
    }

    fn cache_path(&self, paper: &PaperData) -> PathBuf {
        let name = if paper.arxiv_id.is_empty() {
            "paper".to_string()
        } else {
            paper.arxiv_id.replace('/', "_")
        };
        self.config.papers_cache_dir().join(format!("{}.pdf", name))
    }

    /// Descarga el PDF (o usa el cacheado) y devuelve su ruta.
    pub async fn download_pdf(&self, paper: &PaperData) -> Result<PathBuf> {
        let cache_path = self.cache_path(paper);
        if std::fs::metadata(&cache_path)
            .map(|m| m.len() > 0)
            .unwrap_or(false)
        {
            log::info!("(download_pdf) Usando PDF cacheado: {:?}", cache_path);
            return Ok(cache_path);
        }

        log::info!("(download_pdf) Descargando PDF desde {}", paper.pdf_url);
        let response = self
            .client
            .get(&paper.pdf_url)
            .send()
            .await
            .with_context(|| format!("Fallo la descarga de {}", paper.pdf_url))?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Descarga de PDF respondió {} ({})",
                response.status(),
                paper.pdf_url
            ));
        }
        let bytes = response.bytes().await.context("Error leyendo el PDF")?;

        // se escribe a un temporal y se renombra, así el cache nunca queda a medias
        let dir = self.config.papers_cache_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("No se pudo crear el cache {:?}", dir))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .context("No se pudo crear archivo temporal para el PDF")?;
        tmp.write_all(&bytes).context("Error escribiendo el PDF")?;
        tmp.persist(&cache_path)
            .with_context(|| format!("No se pudo guardar el PDF en {:?}", cache_path))?;

        log::info!(
            "(download_pdf) PDF descargado y cacheado ({} bytes)",
            bytes.len()
        );
        Ok(cache_path)
    }

    /// El paper más relevante para el dominio, con texto completo.
    pub async fn top_paper_for_domain(
        &self,
        domain: &str,
        category: Option<&str>,
    ) -> Result<PaperData> {
        let top = self
            .search_by_domain(domain, 1, category)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No papers found for domain: {}", domain))?;
        self.fetch_and_extract(&top.arxiv_id).await
    }
}

#[async_trait]
impl PaperSource for ArxivService {
    async fn fetch_paper(&self, arxiv_id: &str) -> Result<PaperData> {
        let requested = normalize_arxiv_id(arxiv_id);
        if requested.is_empty() {
            return Err(anyhow!("arXiv id vacío"));
        }

        if is_old_style_id(&requested) {
            for category in OLD_STYLE_CATEGORIES {
                let candidate = format!("{}/{}", category, requested);
                log::info!("(fetch_paper) Probando id {}", candidate);
                if let Ok(Some(mut paper)) = self.lookup(&candidate).await {
                    paper.arxiv_id = candidate;
                    return Ok(paper);
                }
            }
        }

        log::info!("(fetch_paper) Buscando paper {} en arXiv", requested);
        let mut paper = self
            .lookup(&requested)
            .await?
            .ok_or_else(|| anyhow!("Paper not found: {}", requested))?;
        paper.arxiv_id = requested;
        log::info!("(fetch_paper) Encontrado: {}", paper.title);
        Ok(paper)
    }

    async fn fetch_and_extract(&self, arxiv_id: &str) -> Result<PaperData> {
        let mut paper = self.fetch_paper(arxiv_id).await?;
        let pdf_path = self.download_pdf(&paper).await?;
        let text = self
            .pdf_text
            .extract_text(&pdf_path, self.config.max_pages)
            .await?;
        if text.trim().is_empty() {
            return Err(anyhow!("El PDF de {} no tiene texto extraíble", paper.arxiv_id));
        }
        paper.full_text = Some(text);
        Ok(paper)
    }

    async fn search(
        &self,
        query: &str,
        max_results: u32,
        sort: SortOrder,
    ) -> Result<Vec<PaperData>> {
        log::info!("(search) Buscando en arXiv: {}", query);
        let papers = self
            .query_feed(&[
                ("search_query", format!("all:{}", query.trim())),
                ("start", "0".to_string()),
                ("max_results", max_results.max(1).to_string()),
                ("sortBy", sort.as_api_str().to_string()),
                ("sortOrder", "descending".to_string()),
            ])
            .await?;
        log::info!("(search) {} papers encontrados", papers.len());
        Ok(papers)
    }

    async fn search_by_domain(
        &self,
        domain: &str,
        max_results: u32,
        category: Option<&str>,
    ) -> Result<Vec<PaperData>> {
        let query = build_domain_query(domain, category);
        log::info!("(search_by_domain) Query: {}", query);
        let papers = self
            .query_feed(&[
                ("search_query", query),
                ("start", "0".to_string()),
                ("max_results", max_results.max(1).to_string()),
                ("sortBy", SortOrder::Relevance.as_api_str().to_string()),
                ("sortOrder", "descending".to_string()),
            ])
            .await?;
        log::info!(
            "(search_by_domain) {} papers para '{}'",
            papers.len(),
            domain
        );
        Ok(papers)
    }
}
