//! services/video_service.rs
//! Listado de videos en disco y armado de sus URLs públicas.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::models::video_model::VideoInfo;

const PARTIAL_DIR: &str = "partial_movie_files";

#[derive(Clone, Debug)]
pub struct VideoService {
    /// `<output_dir>/videos` (lo que produce manim)
    animations_dir: PathBuf,
    media_dir: PathBuf,
    base_url: String,
}

impl VideoService {
    pub fn new(animations_dir: PathBuf, media_dir: PathBuf, base_url: impl Into<String>) -> Self {
        VideoService {
            animations_dir,
            media_dir,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn animations_dir(&self) -> &Path {
        &self.animations_dir
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// URL de visualización y de descarga de un archivo.
    /// None si el archivo está fuera de los directorios servidos.
    pub fn url_for(&self, file: &Path) -> Option<(String, String)> {
        if let Some(rel) = relative_to(file, &self.animations_dir) {
            let rel = encode_path(&rel);
            return Some((
                format!("{}/animations/videos/{}", self.base_url, rel),
                format!("{}/download/animations/{}", self.base_url, rel),
            ));
        }
        if let Some(rel) = relative_to(file, &self.media_dir) {
            let rel = encode_path(&rel);
            return Some((
                format!("{}/media/videos/{}", self.base_url, rel),
                format!("{}/download/{}", self.base_url, rel),
            ));
        }
        None
    }

    /// Ruta relativa al directorio (de animaciones o de media) que contiene el archivo.
    pub fn relative_path(&self, file: &Path) -> Option<String> {
        relative_to(file, &self.animations_dir).or_else(|| relative_to(file, &self.media_dir))
    }

    fn describe(&self, file: &Path, source: &str, root: &Path) -> Option<VideoInfo> {
        let (url, download_url) = self.url_for(file)?;
        let meta = fs::metadata(file).ok()?;
        let rel = relative_to(file, root)?;
        let created_at = meta
            .modified()
            .ok()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339());

        Some(VideoInfo {
            id: file
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string(),
            filename: file
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string(),
            path: rel,
            url,
            download_url,
            size_bytes: meta.len(),
            created_at,
            source: source.to_string(),
        })
    }

    /// Todos los mp4 de ambos directorios (sin parciales), más nuevos primero.
    pub fn list_videos(&self) -> Vec<VideoInfo> {
        let mut videos = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for (root, source) in [(&self.animations_dir, "animations"), (&self.media_dir, "media")] {
            let mut files = Vec::new();
            collect_videos(root, &mut files);
            for file in files {
                let key = fs::canonicalize(&file).unwrap_or_else(|_| file.clone());
                if !seen.insert(key) {
                    continue;
                }
                if let Some(info) = self.describe(&file, source, root) {
                    videos.push(info);
                }
            }
        }

        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        videos
    }

    /// Primer video cuyo id o ruta relativa contiene `video_id`.
    pub fn find_video(&self, video_id: &str) -> Option<VideoInfo> {
        if video_id.trim().is_empty() {
            return None;
        }
        self.list_videos()
            .into_iter()
            .find(|v| v.id.contains(video_id) || v.path.contains(video_id))
    }

    /// Ruta en disco para GET /download/{path}.
    /// `animations/...` apunta al directorio de animaciones; lo demás al de media
    /// (y, si no existe ahí, se prueba en animaciones).
    pub fn resolve_download(&self, requested: &str) -> Option<PathBuf> {
        let requested = requested.trim_start_matches('/');
        if requested.is_empty() || !is_safe_relative(requested) {
            log::warn!("(resolve_download) Ruta rechazada: {}", requested);
            return None;
        }

        let mut candidates = Vec::new();
        if let Some(rest) = requested.strip_prefix("animations/") {
            candidates.push(self.animations_dir.join(rest));
        }
        candidates.push(self.media_dir.join(requested));
        candidates.push(self.animations_dir.join(requested));

        candidates.into_iter().find(|p| p.is_file())
    }
}

/// Sin `..`, sin rutas absolutas.
pub fn is_safe_relative(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Ruta relativa con `/`; si no coincide tal cual se prueba con las rutas canónicas.
fn relative_to(file: &Path, root: &Path) -> Option<String> {
    if let Ok(rel) = file.strip_prefix(root) {
        return Some(path_to_slash(rel));
    }
    let file = fs::canonicalize(file).ok()?;
    let root = fs::canonicalize(root).ok()?;
    file.strip_prefix(&root).ok().map(path_to_slash)
}

fn path_to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_path(rel: &str) -> String {
    rel.split('/')
        .map(|part| urlencoding::encode(part).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// mp4 bajo `dir`, recursivo, ignorando `partial_movie_files`.
pub fn collect_videos(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().and_then(|n| n.to_str()) == Some(PARTIAL_DIR) {
                continue;
            }
            collect_videos(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some("mp4") {
            out.push(path);
        }
    }
}
