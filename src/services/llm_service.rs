//! services/llm_service.rs
//! Cliente de chat completions (OpenRouter) y operaciones de alto nivel sobre el LLM.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::LlmConfig;
use crate::models::segment_model::Segment;
use crate::services::code_sanitizer::clean_code_response;
use crate::services::prompts;
use crate::services::segment_service::{
    fallback_segments, parse_segments_response, validate_segment_count,
};
use crate::utils::truncate_chars;

const REFERER: &str = "https://xe-bot.local";
const APP_TITLE: &str = "Xe-Bot Research Animation Generator";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub json_mode: bool,
    /// None → modelo por defecto del backend
    pub model: Option<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        ChatRequest {
            messages,
            temperature: 0.7,
            max_tokens: 4096,
            json_mode: false,
            model: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub usage: serde_json::Value,
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn default_model(&self) -> &str;

    async fn chat_completion(&self, request: ChatRequest) -> Result<LlmResponse>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    model: Option<String>,
    #[serde(default)]
    usage: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Espera antes del siguiente intento: 2^(intento-1) s acotado a [min, max].
pub fn backoff_delay(attempt: u32, min: Duration, max: Duration) -> Duration {
    let exp = 2f64.powi(attempt.saturating_sub(1).min(30) as i32);
    Duration::from_secs_f64(exp).max(min).min(max)
}

#[derive(Clone)]
pub struct OpenRouterBackend {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenRouterBackend {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("No se pudo crear el cliente HTTP del LLM")?;
        Ok(OpenRouterBackend { client, config })
    }

    fn payload(&self, request: &ChatRequest) -> serde_json::Value {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());
        let mut payload = json!({
            "model": model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if request.json_mode {
            payload["response_format"] = json!({ "type": "json_object" });
        }
        payload
    }

    async fn send_once(&self, payload: &serde_json::Value) -> Result<LlmResponse> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .json(payload)
            .send()
            .await
            .context("Fallo la petición al LLM")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!(
                "(chat_completion) OpenRouter respondió {}: {}",
                status,
                truncate_chars(&body, 500)
            );
            return Err(anyhow!(
                "LLM API error {}: {}",
                status.as_u16(),
                truncate_chars(&body, 300)
            ));
        }

        let data: CompletionResponse = response
            .json()
            .await
            .context("Respuesta del LLM no es JSON válido")?;

        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("Respuesta del LLM sin contenido"))?;

        let model = data
            .model
            .or_else(|| payload["model"].as_str().map(str::to_string))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model,
            usage: data.usage,
        })
    }
}

#[async_trait]
impl ChatBackend for OpenRouterBackend {
    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn chat_completion(&self, request: ChatRequest) -> Result<LlmResponse> {
        let payload = self.payload(&request);
        let attempts = self.config.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.send_once(&payload).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt < attempts {
                        let delay = backoff_delay(
                            attempt,
                            self.config.retry_min_delay,
                            self.config.retry_max_delay,
                        );
                        log::warn!(
                            "(chat_completion) Intento {}/{} falló: {}. Reintentando en {:?}",
                            attempt,
                            attempts,
                            e,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        let err = last_error.unwrap_or_else(|| anyhow!("LLM sin intentos configurados"));
        Err(err.context(format!("LLM falló tras {} intentos", attempts)))
    }
}

/// Operaciones de alto nivel sobre cualquier backend de chat.
#[derive(Clone)]
pub struct LlmService {
    backend: Arc<dyn ChatBackend>,
}

impl LlmService {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        LlmService { backend }
    }

    pub fn from_config(config: LlmConfig) -> Result<Self> {
        Ok(LlmService::new(Arc::new(OpenRouterBackend::new(config)?)))
    }

    pub fn model(&self) -> &str {
        self.backend.default_model()
    }

    /// Introducción del paper (se mandan los primeros 15.000 caracteres).
    pub async fn extract_introduction(&self, paper_text: &str) -> Result<String> {
        let request = ChatRequest::new(prompts::extraction_messages(paper_text)).temperature(0.3);
        let response = self.backend.chat_completion(request).await?;
        Ok(response.content.trim().to_string())
    }

    /// Segmenta la introducción en 3-5 ideas animables.
    pub async fn segment_introduction(&self, introduction: &str) -> Result<Vec<Segment>> {
        let request = ChatRequest::new(prompts::segmentation_messages(introduction))
            .temperature(0.3)
            .json_mode();
        let response = self.backend.chat_completion(request).await?;

        match parse_segments_response(&response.content) {
            Ok(segments) => Ok(validate_segment_count(segments, introduction)),
            Err(e) => {
                log::warn!(
                    "(segment_introduction) No se pudo parsear la respuesta ({:#}), usando respaldo",
                    e
                );
                Ok(fallback_segments(introduction, vec![]))
            }
        }
    }

    pub async fn generate_animation_code(&self, segment: &Segment, style: &str) -> Result<String> {
        let request = ChatRequest::new(prompts::segment_code_messages(segment, style))
            .temperature(0.5)
            .max_tokens(4096);
        let response = self.backend.chat_completion(request).await?;
        Ok(clean_code_response(&response.content))
    }

    /// Una sola animación que recorre los primeros 5 segmentos.
    pub async fn generate_full_animation_code(
        &self,
        title: &str,
        segments: &[Segment],
    ) -> Result<String> {
        let request = ChatRequest::new(prompts::full_code_messages(title, segments))
            .temperature(0.5)
            .max_tokens(8000);
        let response = self.backend.chat_completion(request).await?;
        Ok(clean_code_response(&response.content))
    }

    pub async fn generate_topic_code(
        &self,
        topic: &str,
        concepts: &[String],
        style: &str,
    ) -> Result<String> {
        let request = ChatRequest::new(prompts::topic_code_messages(topic, concepts, style))
            .temperature(0.5)
            .max_tokens(4096);
        let response = self.backend.chat_completion(request).await?;
        Ok(clean_code_response(&response.content))
    }
}
