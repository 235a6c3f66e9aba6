//! config/animation_config.rs
//! Configuración global del render de animaciones (calidad, fps, directorios, límites).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::animation_model::RenderQuality;

/// Configuración de render, con valores por defecto
/// (se sobreescriben desde el .env)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// media_dir de manim; los mp4 quedan en `<output_dir>/videos/...`
    pub output_dir: PathBuf,
    /// videos servidos bajo /media/videos
    pub media_videos_dir: PathBuf,
    pub default_quality: RenderQuality,
    pub fps: u32,
    pub render_timeout: Duration,
    pub fallback_timeout: Duration,
    pub max_concurrent_renders: usize,
}

impl AnimationConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        AnimationConfig {
            output_dir: std::env::var("ANIMATION_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            media_videos_dir: std::env::var("MEDIA_VIDEOS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_videos_dir),
            default_quality: std::env::var("ANIMATION_QUALITY")
                .ok()
                .and_then(|q| RenderQuality::parse(&q))
                .unwrap_or(defaults.default_quality),
            fps: super::env_parse("ANIMATION_FPS", defaults.fps),
            render_timeout: Duration::from_secs(super::env_parse("RENDER_TIMEOUT", 180)),
            fallback_timeout: defaults.fallback_timeout,
            max_concurrent_renders: super::env_parse(
                "MAX_CONCURRENT_RENDERS",
                defaults.max_concurrent_renders,
            ),
        }
    }

    /// Carpeta donde manim deja los videos finales.
    pub fn animations_videos_dir(&self) -> PathBuf {
        self.output_dir.join("videos")
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        AnimationConfig {
            output_dir: PathBuf::from("./output/animations"),
            media_videos_dir: PathBuf::from("./output/media/videos"),
            default_quality: RenderQuality::Low,
            fps: 15,
            render_timeout: Duration::from_secs(180),
            fallback_timeout: Duration::from_secs(90),
            max_concurrent_renders: 2,
        }
    }
}
