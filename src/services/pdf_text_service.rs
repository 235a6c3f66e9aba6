//! services/pdf_text_service.rs
//! Texto de las primeras páginas de un PDF vía `pdftotext` (poppler).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::{process::Command, time::timeout};

const PDFTOTEXT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct PdfTextService {
    pdftotext_path: Option<Arc<PathBuf>>,
}

impl PdfTextService {
    pub fn new() -> Self {
        let pdftotext_path = match which::which("pdftotext") {
            Ok(path) => Some(Arc::new(path)),
            Err(_) => {
                log::warn!("(PdfTextService::new) No se encontró pdftotext; no se podrá extraer texto de PDFs");
                None
            }
        };
        PdfTextService { pdftotext_path }
    }

    pub fn is_available(&self) -> bool {
        self.pdftotext_path.is_some()
    }

    /// Texto de las páginas 1..=max_pages, páginas separadas por línea en blanco.
    pub async fn extract_text(&self, pdf_path: &Path, max_pages: u32) -> Result<String> {
        let bin = self
            .pdftotext_path
            .as_ref()
            .ok_or_else(|| anyhow!("pdftotext no está instalado"))?;

        let mut cmd = Command::new(bin.as_path());
        cmd.arg("-f")
            .arg("1")
            .arg("-l")
            .arg(max_pages.max(1).to_string())
            .arg("-enc")
            .arg("UTF-8")
            .arg(pdf_path)
            .arg("-")
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let output = timeout(PDFTOTEXT_TIMEOUT, cmd.output())
            .await
            .context("Timeout ejecutando pdftotext")?
            .context("No se pudo lanzar pdftotext")?;

        if !output.status.success() {
            let stderr_msg = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("pdftotext falló: {}", stderr_msg.trim()));
        }

        let text = normalize_pages(&String::from_utf8_lossy(&output.stdout));
        log::info!(
            "(extract_text) {} caracteres extraídos de {:?}",
            text.len(),
            pdf_path
        );
        Ok(text)
    }
}

impl Default for PdfTextService {
    fn default() -> Self {
        Self::new()
    }
}

/// pdftotext separa páginas con form feed; se descartan las vacías.
pub fn normalize_pages(raw: &str) -> String {
    raw.split('\u{c}')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
