use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use anyhow::{anyhow, Context, Result};
use tokio::{
    process::Command,
    sync::{Semaphore, SemaphorePermit},
    time::timeout,
};
use uuid::Uuid;

use crate::config::AnimationConfig;
use crate::models::animation_model::{RenderQuality, RenderResult};
use crate::services::code_sanitizer::{ensure_valid_manim_code, extract_scene_name};
use crate::services::templates;
use crate::utils::truncate_chars;

/// Prefijo de carpeta temporal
const TEMP_DIR_PREFIX: &str = "animation_service_";
/// Un mp4 más chico que esto se considera vacío/corrupto
const MIN_VIDEO_BYTES: u64 = 1000;
/// Ventana para aceptar un video "recién creado"
const FRESH_OUTPUT_WINDOW: Duration = Duration::from_secs(30);
const FALLBACK_FPS: u32 = 30;

#[derive(Clone)]
pub struct AnimationService {
    semaphore: Arc<Semaphore>,
    temp_dir: Arc<PathBuf>,
    manim_path: Option<Arc<PathBuf>>,
    ffprobe_path: Option<Arc<PathBuf>>,
    config: AnimationConfig,
}

impl AnimationService {
    pub fn new(config: AnimationConfig) -> Result<Self> {
        // Subdirectorio temporal para los scripts de manim
        let temp_dir =
            std::env::temp_dir().join(format!("{}{}", TEMP_DIR_PREFIX, Uuid::new_v4()));
        fs::create_dir_all(&temp_dir)
            .with_context(|| format!("No se pudo crear {:?}", temp_dir))?;
        fs::create_dir_all(&config.output_dir)
            .with_context(|| format!("No se pudo crear {:?}", config.output_dir))?;

        // manim es opcional: sin él sólo se genera código
        let manim_path = match which::which("manim") {
            Ok(p) => Some(Arc::new(p)),
            Err(_) => {
                log::warn!("(AnimationService::new) No se encontró manim en el sistema; los renders van a fallar");
                None
            }
        };
        let ffprobe_path = which::which("ffprobe").ok().map(Arc::new);

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_renders.max(1))),
            temp_dir: Arc::new(temp_dir),
            manim_path,
            ffprobe_path,
            config,
        })
    }

    /// Usa este ejecutable de manim en lugar del que se encontró en el PATH.
    pub fn with_manim_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manim_path = Some(Arc::new(path.into()));
        self
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn can_render(&self) -> bool {
        self.manim_path.is_some()
    }

    /// Renderiza el código. Si manim falla se intenta la escena de respaldo;
    /// el resultado nunca es Err, los fallos van en `RenderResult`.
    pub async fn render_animation(
        &self,
        code: &str,
        output_name: &str,
        quality: Option<RenderQuality>,
    ) -> RenderResult {
        let start = Instant::now();
        let quality = quality.unwrap_or(self.config.default_quality);

        let manim_code = ensure_valid_manim_code(code);
        let scene_name = extract_scene_name(&manim_code);

        let Some(manim) = self.manim_path.clone() else {
            return RenderResult::failed(manim_code, scene_name, "manim is not installed");
        };

        let _guard = match self.acquire_permit().await {
            Ok(g) => g,
            Err(e) => return RenderResult::failed(manim_code, scene_name, format!("{:#}", e)),
        };

        log::info!(
            "(render_animation) Renderizando {} ({}) calidad {}",
            scene_name,
            output_name,
            quality.as_str()
        );

        let result = self
            .render_inner(&manim, &manim_code, &scene_name, output_name, quality)
            .await;

        let elapsed = start.elapsed().as_secs_f32();
        match result {
            Ok(r) => {
                log::info!(
                    "(render_animation) {} terminado en {:.2}s (success={})",
                    scene_name,
                    elapsed,
                    r.success
                );
                r
            }
            Err(e) => {
                log::error!("(render_animation) Error renderizando {}: {:#}", scene_name, e);
                RenderResult::failed(manim_code, scene_name, format!("{:#}", e))
            }
        }
    }

    async fn acquire_permit(&self) -> Result<SemaphorePermit> {
        timeout(Duration::from_secs(5), self.semaphore.acquire())
            .await
            .context("Timeout esperando permiso en AnimationService")?
            .map_err(|_| anyhow!("No se pudo adquirir el semaphore"))
    }

    fn create_temp_script(&self, stem: &str, code: &str) -> Result<TempScript> {
        let dir = self.temp_dir.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&dir)?;
        let script_path = dir.join(format!("{}.py", stem));
        fs::write(&script_path, code)
            .with_context(|| format!("Error escribiendo script temporal en {:?}", script_path))?;
        Ok(TempScript { dir, script_path })
    }

    async fn render_inner(
        &self,
        manim: &Path,
        manim_code: &str,
        scene_name: &str,
        output_name: &str,
        quality: RenderQuality,
    ) -> Result<RenderResult> {
        // stem único: manim deja los videos en <media_dir>/videos/<stem>/...
        let stem = format!("{}_{}", output_name, &Uuid::new_v4().simple().to_string()[..8]);
        let script = self.create_temp_script(&stem, manim_code)?;
        let _cleanup = TempCleanup::new(script.dir.clone());

        let media_dir = absolute(&self.config.output_dir)?;
        let started_at = SystemTime::now();

        let run = self
            .run_manim(
                manim,
                &script,
                scene_name,
                quality.flag(),
                self.config.fps,
                &media_dir,
                self.config.render_timeout,
            )
            .await;

        let output = match run {
            Ok(output) => output,
            Err(e) => {
                return Ok(RenderResult::failed(
                    manim_code.to_string(),
                    scene_name.to_string(),
                    format!("{:#}", e),
                ))
            }
        };

        let script_videos = media_dir.join("videos").join(&stem);

        if output.status.success() {
            let found = find_output_file(&script_videos, scene_name, output_name, None);
            return Ok(match found {
                Some(path) => self.success(manim_code, scene_name, path, false, None).await,
                None => RenderResult::failed(
                    manim_code.to_string(),
                    scene_name.to_string(),
                    "Output file not found after rendering",
                ),
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let error_msg = if !stderr.trim().is_empty() {
            stderr
        } else if !stdout.trim().is_empty() {
            stdout
        } else {
            "Unknown error".to_string()
        };

        // a veces manim sale con error pero el video quedó bien
        if let Some(path) = find_output_file(&script_videos, scene_name, output_name, Some(started_at)) {
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if size > MIN_VIDEO_BYTES && is_fresh(&path) {
                log::warn!("(render_animation) manim reportó error pero el video existe: {:?}", path);
                return Ok(self.success(manim_code, scene_name, path, false, None).await);
            }
        }

        log::error!(
            "(render_animation) manim falló (code {:?}): {}",
            output.status.code(),
            truncate_chars(&error_msg, 500)
        );

        match self.render_fallback(manim, scene_name, &media_dir).await {
            Ok(Some(path)) => {
                log::warn!("(render_animation) Usando animación de respaldo: {:?}", path);
                let note = format!(
                    "Original failed, using fallback: {}",
                    truncate_chars(error_msg.trim(), 100)
                );
                Ok(self.success(manim_code, scene_name, path, true, Some(note)).await)
            }
            Ok(None) => Ok(RenderResult::failed(
                manim_code.to_string(),
                scene_name.to_string(),
                error_msg,
            )),
            Err(e) => {
                log::error!("(render_fallback) {:#}", e);
                Ok(RenderResult::failed(
                    manim_code.to_string(),
                    scene_name.to_string(),
                    error_msg,
                ))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_manim(
        &self,
        manim: &Path,
        script: &TempScript,
        scene_name: &str,
        quality_flag: &str,
        fps: u32,
        media_dir: &Path,
        limit: Duration,
    ) -> Result<std::process::Output> {
        let mut cmd = Command::new(manim);
        cmd.arg(quality_flag)
            .arg("--fps")
            .arg(fps.to_string())
            .arg("-o")
            .arg(format!("{}.mp4", scene_name))
            .arg("--media_dir")
            .arg(media_dir)
            .arg(&script.script_path)
            .arg(scene_name)
            .current_dir(&script.dir)
            .kill_on_drop(true)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        timeout(limit, cmd.output())
            .await
            .map_err(|_| anyhow!("Animation rendering timed out (>{}s)", limit.as_secs()))?
            .context("No se pudo lanzar manim")
    }

    /// Escena simple y confiable; devuelve el mp4 si salió bien.
    async fn render_fallback(
        &self,
        manim: &Path,
        scene_name: &str,
        media_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let (code, safe_name) = templates::fallback_scene(scene_name);
        let stem = format!("fallback_{}", &Uuid::new_v4().simple().to_string()[..8]);
        let script = self.create_temp_script(&stem, &code)?;
        let _cleanup = TempCleanup::new(script.dir.clone());

        let output = self
            .run_manim(
                manim,
                &script,
                &safe_name,
                RenderQuality::Low.flag(),
                FALLBACK_FPS,
                media_dir,
                self.config.fallback_timeout,
            )
            .await?;

        if !output.status.success() {
            let stderr_msg = String::from_utf8_lossy(&output.stderr);
            log::error!(
                "(render_fallback) Falló también el respaldo: {}",
                truncate_chars(&stderr_msg, 200)
            );
            return Ok(None);
        }

        Ok(find_output_file(
            &media_dir.join("videos").join(&stem),
            &safe_name,
            &stem,
            None,
        ))
    }

    async fn success(
        &self,
        manim_code: &str,
        scene_name: &str,
        path: PathBuf,
        used_fallback: bool,
        note: Option<String>,
    ) -> RenderResult {
        let duration_seconds = self.video_duration(&path).await;
        RenderResult {
            success: true,
            file_path: Some(path),
            manim_code: manim_code.to_string(),
            scene_name: scene_name.to_string(),
            duration_seconds,
            error_message: note,
            used_fallback,
        }
    }

    /// Duración en segundos vía ffprobe (0 si no se puede).
    pub async fn video_duration(&self, path: &Path) -> u64 {
        let Some(ffprobe) = &self.ffprobe_path else {
            return 0;
        };
        let output = Command::new(ffprobe.as_path())
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output();

        match timeout(Duration::from_secs(15), output).await {
            Ok(Ok(out)) if out.status.success() => {
                parse_duration(&String::from_utf8_lossy(&out.stdout))
            }
            _ => 0,
        }
    }
}

pub fn parse_duration(raw: &str) -> u64 {
    raw.trim()
        .parse::<f64>()
        .map(|secs| secs.max(0.0) as u64)
        .unwrap_or(0)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()
        .context("No se pudo obtener el current_dir")?
        .join(path))
}

fn is_fresh(path: &Path) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .map(|age| age < FRESH_OUTPUT_WINDOW)
        .unwrap_or(false)
}

fn collect_mp4(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().and_then(|n| n.to_str()) == Some("partial_movie_files") {
                continue;
            }
            collect_mp4(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some("mp4") {
            out.push(path);
        }
    }
}

/// Busca el mp4 final bajo `dir`: primero por nombre exacto (escena o salida),
/// después uno que contenga el nombre de la escena y sea reciente.
pub fn find_output_file(
    dir: &Path,
    scene_name: &str,
    output_name: &str,
    modified_after: Option<SystemTime>,
) -> Option<PathBuf> {
    let mut files = Vec::new();
    collect_mp4(dir, &mut files);
    files.sort();

    let stem_of = |p: &PathBuf| {
        p.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    };
    let recent_enough = |p: &PathBuf| match modified_after {
        Some(t) => fs::metadata(p)
            .and_then(|m| m.modified())
            .map(|m| m >= t)
            .unwrap_or(false),
        None => true,
    };

    if let Some(exact) = files.iter().find(|p| {
        let stem = stem_of(p);
        (stem == scene_name || stem == output_name) && recent_enough(p)
    }) {
        return Some(exact.clone());
    }

    files
        .into_iter()
        .find(|p| stem_of(p).contains(scene_name) && is_fresh(p) && recent_enough(p))
}

// --------------------------------------------------------------------------------
// Estructuras auxiliares
// --------------------------------------------------------------------------------
struct TempScript {
    dir: PathBuf,
    script_path: PathBuf,
}

struct TempCleanup {
    dir: PathBuf,
}

impl TempCleanup {
    fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

/// Borra la carpeta del script al salir de scope
impl Drop for TempCleanup {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}
