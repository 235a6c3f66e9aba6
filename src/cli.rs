//! cli.rs
//! Línea de comandos: servidor HTTP, pipeline de un paper, búsqueda por dominio y texto libre.

use std::io::{BufRead, Write};
use std::sync::Arc;

use actix_web::{middleware::Logger, App, HttpServer};
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use sqlx::{Pool, Sqlite};

use crate::app::{self, AppServices};
use crate::config::AppConfig;
use crate::models::animation_model::{AnimationOutcome, AnimationStatus, RenderQuality};
use crate::models::paper_model::PaperData;
use crate::models::pipeline_model::{PipelineOptions, PipelineResult};
use crate::services::animation_service::AnimationService;
use crate::services::arxiv_service::{ArxivService, PaperSource};
use crate::services::code_sanitizer::ensure_valid_manim_code;
use crate::services::database;
use crate::services::llm_service::LlmService;
use crate::services::paper_service::PaperService;
use crate::services::pdf_text_service::PdfTextService;
use crate::services::pipeline_service::{LogProgress, PipelineService};
use crate::services::segment_service::fallback_segments;
use crate::services::templates;
use crate::services::video_service::VideoService;
use crate::utils::truncate_with_suffix;

const DEMO_ARXIV_ID: &str = "1706.03762";

#[derive(Parser, Debug)]
#[command(
    name = "xe-bot",
    version,
    about = "Xe-Bot: Research Paper Animation Generator"
)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Sólo genera código (sin video)
    #[arg(long, global = true)]
    pub no_render: bool,

    /// No guarda nada en la base de datos
    #[arg(long, global = true)]
    pub no_db: bool,

    /// low, medium o high
    #[arg(long, global = true, value_parser = parse_quality)]
    pub quality: Option<RenderQuality>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Levanta la API HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Procesa un paper de arXiv por id
    Process { arxiv_id: String },
    /// Busca papers por dominio y procesa el elegido
    Domain {
        query: String,
        /// Categoría de arXiv (cs.LG, cs.CV, ...)
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 10)]
        max_results: u32,
        /// Elige el primer resultado sin preguntar
        #[arg(long)]
        auto: bool,
        /// Sólo lista los papers
        #[arg(long)]
        list: bool,
    },
    /// Anima un texto libre
    Text {
        content: String,
        #[arg(long, default_value = "Research Animation")]
        title: String,
        /// Usa el template de texto en vez del LLM
        #[arg(long)]
        offline: bool,
    },
    /// Crea las tablas
    InitDb,
    /// Demo con "Attention Is All You Need" (sólo código)
    Demo,
}

fn parse_quality(raw: &str) -> std::result::Result<RenderQuality, String> {
    RenderQuality::parse(raw).ok_or_else(|| format!("calidad inválida '{}' (low, medium, high)", raw))
}

/// Interpreta la selección del usuario (1-based; 0 cancela; vacío = 1).
pub fn parse_selection(input: &str, count: usize) -> Result<Option<usize>> {
    let input = input.trim();
    let n: usize = if input.is_empty() {
        1
    } else {
        input
            .parse()
            .map_err(|_| anyhow!("Invalid selection '{}'", input))?
    };
    if n == 0 {
        return Ok(None);
    }
    if n > count {
        return Err(anyhow!("Invalid selection. Please choose 1-{}", count));
    }
    Ok(Some(n - 1))
}

/// Líneas de la lista de papers que se muestra antes de elegir
pub fn paper_listing(papers: &[PaperData]) -> Vec<String> {
    papers
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{:>2}. [{}] {} ({})",
                i + 1,
                p.arxiv_id,
                truncate_with_suffix(&p.title, 80, "..."),
                p.published_date().unwrap_or_else(|| "-".to_string())
            )
        })
        .collect()
}

/// Resumen legible de una corrida del pipeline
pub fn summarize_result(result: &PipelineResult) -> Vec<String> {
    let mut lines = vec![];
    if !result.success {
        lines.push("✗ Processing Failed".to_string());
        if let Some(err) = &result.error {
            lines.push(format!("  Error: {}", err));
        }
        return lines;
    }

    lines.push("✓ Processing Complete!".to_string());
    if let Some(paper) = &result.paper {
        lines.push(format!("Title: {}", paper.title));
        lines.push(format!("Authors: {}", paper.authors_preview(3)));
    }
    for segment in &result.segments {
        lines.push(format!("  • {} [{}]", segment.topic, segment.topic_category.as_str()));
    }
    lines.push(format!("Generated {} animations:", result.animations.len()));
    for anim in &result.animations {
        let (mark, path) = match &anim.file_path {
            Some(p) if anim.is_rendered() => ("✓", p.display().to_string()),
            _ => ("◯ (code only)", "Not rendered".to_string()),
        };
        lines.push(format!("  {} {}: {}", mark, anim.topic, path));
    }
    lines
}

/// Servicios que arma el CLI a partir de la configuración
struct Runtime {
    config: AppConfig,
    papers: Arc<dyn PaperSource>,
    renderer: AnimationService,
    db_pool: Option<Pool<Sqlite>>,
}

impl Runtime {
    async fn build(config: AppConfig, common: &CommonArgs, with_db: bool) -> Result<Self> {
        config
            .setup_directories()
            .context("No se pudieron crear los directorios de trabajo")?;

        let mut anim_config = config.animation.clone();
        if let Some(q) = common.quality {
            anim_config.default_quality = q;
        }
        let renderer = AnimationService::new(anim_config)?;
        let papers: Arc<dyn PaperSource> =
            Arc::new(ArxivService::new(config.arxiv.clone(), PdfTextService::new())?);

        let db_pool = if with_db {
            Some(open_database(&config).await?)
        } else {
            None
        };

        Ok(Runtime {
            config,
            papers,
            renderer,
            db_pool,
        })
    }

    fn videos(&self) -> VideoService {
        VideoService::new(
            self.config.animation.animations_videos_dir(),
            self.config.animation.media_videos_dir.clone(),
            self.config.server.public_base_url.clone(),
        )
    }

    fn pipeline(&self) -> Result<PipelineService> {
        let llm = LlmService::from_config(self.config.llm.clone())?;
        Ok(PipelineService::new(
            self.papers.clone(),
            llm,
            self.renderer.clone(),
            self.db_pool.clone().map(PaperService::new),
            Some(self.videos()),
        ))
    }
}

async fn open_database(config: &AppConfig) -> Result<Pool<Sqlite>> {
    log::info!(
        "(open_database) Conectando a SQLite en {}",
        config.database.database_url
    );
    let pool = database::connect(&config.database.database_url).await?;
    database::run_migrations(&pool).await?;
    Ok(pool)
}

fn require_llm(config: &AppConfig) -> Result<()> {
    if config.llm.has_api_key() {
        Ok(())
    } else {
        Err(anyhow!(
            "Please configure your API keys first! (OPENROUTER_API_KEY)"
        ))
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env();
    let warnings = config.warnings();
    if !warnings.is_empty() {
        println!("Configuration warnings:");
        for w in &warnings {
            println!("  ⚠ {}", w);
        }
    }

    let common = cli.common;
    let options = PipelineOptions {
        render: !common.no_render,
        save_to_db: !common.no_db,
        quality: common.quality.unwrap_or_default(),
        segment_animations: true,
    };

    match cli.command {
        Command::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config, &common).await
        }
        Command::InitDb => {
            config.setup_directories()?;
            open_database(&config).await?;
            println!("✓ Database initialized successfully!");
            Ok(())
        }
        Command::Process { arxiv_id } => {
            require_llm(&config)?;
            let runtime = Runtime::build(config, &common, options.save_to_db).await?;
            process(&runtime, &arxiv_id, options).await
        }
        Command::Demo => {
            require_llm(&config)?;
            println!("Running demo with 'Attention Is All You Need' paper");
            let options = PipelineOptions {
                render: false,
                ..options
            };
            let runtime = Runtime::build(config, &common, options.save_to_db).await?;
            process(&runtime, DEMO_ARXIV_ID, options).await
        }
        Command::Domain {
            query,
            category,
            max_results,
            auto,
            list,
        } => {
            if !list {
                require_llm(&config)?;
            }
            let runtime =
                Runtime::build(config, &common, options.save_to_db && !list).await?;
            domain(&runtime, &query, category.as_deref(), max_results, auto, list, options).await
        }
        Command::Text {
            content,
            title,
            offline,
        } => {
            if !offline {
                require_llm(&config)?;
            }
            let runtime = Runtime::build(config, &common, false).await?;
            text(&runtime, &content, &title, offline, options.render).await
        }
    }
}

async fn process(runtime: &Runtime, arxiv_id: &str, options: PipelineOptions) -> Result<()> {
    println!("Processing arXiv paper: {}", arxiv_id);
    let pipeline = runtime.pipeline()?;
    let result = pipeline.process_paper(arxiv_id, options, &LogProgress).await;
    print_lines(&summarize_result(&result));
    if result.success {
        Ok(())
    } else {
        Err(anyhow!(
            "{}",
            result.error.unwrap_or_else(|| "Processing failed".to_string())
        ))
    }
}

async fn domain(
    runtime: &Runtime,
    query: &str,
    category: Option<&str>,
    max_results: u32,
    auto: bool,
    list: bool,
    options: PipelineOptions,
) -> Result<()> {
    println!("Searching for papers in domain: {}", query);
    let papers = runtime
        .papers
        .search_by_domain(query, max_results, category)
        .await?;
    if papers.is_empty() {
        println!("No papers found for domain: {}", query);
        return Ok(());
    }
    print_lines(&paper_listing(&papers));

    if list {
        println!("To process any of these papers, run: xe-bot process <arxiv_id>");
        return Ok(());
    }

    let index = if auto {
        0
    } else {
        print!("Select paper (1-{}, 0 to cancel) [1]: ", papers.len());
        std::io::stdout().flush().ok();
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("No se pudo leer la selección")?;
        match parse_selection(&line, papers.len())? {
            Some(i) => i,
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        }
    };

    let selected = &papers[index];
    println!("Selected: {}", selected.title);
    println!("arXiv ID: {}", selected.arxiv_id);
    println!("Authors: {}", selected.authors_preview(3));
    process(runtime, &selected.arxiv_id, options).await
}

/// Escenas sin LLM: el texto completo y una plantilla por segmento.
pub fn offline_scripts(content: &str, title: &str) -> Vec<(String, String)> {
    let mut scripts = vec![(
        "text_animation".to_string(),
        ensure_valid_manim_code(&templates::text_animation(content, title)),
    )];
    for (i, segment) in fallback_segments(content, vec![]).iter().enumerate() {
        scripts.push((
            format!("segment_{}", i + 1),
            ensure_valid_manim_code(&templates::for_segment(segment, i + 1)),
        ));
    }
    scripts
}

/// Líneas a mostrar para la animación de `text`; error si no se generó o no se pudo renderizar.
pub fn text_animation_report(animation: &AnimationOutcome) -> Result<Vec<String>> {
    let error = || {
        anyhow!(
            "✗ Failed ({}): {}",
            animation.status.as_str(),
            animation.error.as_deref().unwrap_or("unknown error")
        )
    };
    match animation.status {
        AnimationStatus::Rendered => match &animation.file_path {
            Some(path) => Ok(vec![
                "✓ Animation generated!".to_string(),
                format!("  Output: {}", path.display()),
            ]),
            None => Err(error()),
        },
        AnimationStatus::CodeGenerated => {
            let mut lines = vec!["✓ Animation code generated!".to_string()];
            lines.extend(animation.manim_code.iter().cloned());
            Ok(lines)
        }
        AnimationStatus::Pending
        | AnimationStatus::GenerationFailed
        | AnimationStatus::RenderFailed => Err(error()),
    }
}

async fn text(
    runtime: &Runtime,
    content: &str,
    title: &str,
    offline: bool,
    render: bool,
) -> Result<()> {
    println!("Generating animation from custom text");

    if offline {
        let scripts = offline_scripts(content, title);
        if !render {
            for (_, code) in &scripts {
                println!("{}", code);
            }
            return Ok(());
        }

        let mut failures = 0;
        for (name, code) in &scripts {
            let rendered = runtime.renderer.render_animation(code, name, None).await;
            match rendered.file_path {
                Some(path) if rendered.success => println!("  ✓ {}: {}", name, path.display()),
                _ => {
                    failures += 1;
                    println!(
                        "  ✗ {}: {}",
                        name,
                        rendered
                            .error_message
                            .unwrap_or_else(|| "render failed".to_string())
                    );
                }
            }
        }
        return if failures == scripts.len() {
            Err(anyhow!("✗ Failed: no animation could be rendered"))
        } else {
            Ok(())
        };
    }

    let pipeline = runtime.pipeline()?;
    let result = pipeline.generate_animation_only(content, title, render).await?;
    print_lines(&text_animation_report(&result.animation)?);
    Ok(())
}

async fn serve(config: AppConfig, common: &CommonArgs) -> Result<()> {
    let runtime = Runtime::build(config, common, true).await?;
    let db_pool = runtime
        .db_pool
        .clone()
        .ok_or_else(|| anyhow!("La base de datos es obligatoria para el servidor"))?;
    let llm = LlmService::from_config(runtime.config.llm.clone())?;
    let services = AppServices::new(
        db_pool,
        runtime.papers.clone(),
        llm,
        runtime.renderer.clone(),
        &runtime.config.server,
    )?;
    services
        .runner
        .recover_interrupted()
        .await
        .context("No se pudieron recuperar los jobs pendientes")?;

    let host = runtime.config.server.host.clone();
    let port = runtime.config.server.port;
    log::info!(
        "(serve) Levantando servidor en {}:{} (base url {})",
        host,
        port,
        runtime.config.server.public_base_url
    );

    HttpServer::new(move || {
        let services = services.clone();
        App::new().wrap(Logger::default()).configure(|cfg| {
            services.register(cfg);
            services.static_files(cfg);
            app::init_app(cfg);
        })
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("No se pudo abrir {}:{}", host, port))?
    .run()
    .await
    .context("El servidor terminó con error")
}
