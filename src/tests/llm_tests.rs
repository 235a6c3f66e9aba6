//! tests/llm_tests.rs
//! Cliente OpenRouter contra wiremock y operaciones de alto nivel con LLM guionado.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_rt::test;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::LlmConfig;
    use crate::models::segment_model::{Segment, TopicCategory};
    use crate::services::llm_service::{
        backoff_delay, ChatBackend, ChatMessage, ChatRequest, OpenRouterBackend,
    };
    use crate::tests::support::{scripted_llm, segments_json, SAMPLE_INTRODUCTION};

    fn config(server: &MockServer) -> LlmConfig {
        LlmConfig {
            api_key: "sk-test".to_string(),
            base_url: format!("{}/", server.uri()),
            default_model: "openai/gpt-4o-mini".to_string(),
            request_timeout: Duration::from_secs(5),
            max_attempts: 3,
            retry_min_delay: Duration::ZERO,
            retry_max_delay: Duration::ZERO,
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "gen-1",
            "model": "openai/gpt-4o-mini",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
        })
    }

    #[test]
    async fn test_backoff_delay_bounds() {
        let min = Duration::from_secs(2);
        let max = Duration::from_secs(10);
        assert_eq!(backoff_delay(1, min, max), Duration::from_secs(2));
        assert_eq!(backoff_delay(3, min, max), Duration::from_secs(4));
        assert_eq!(backoff_delay(5, min, max), Duration::from_secs(10));
        assert_eq!(
            backoff_delay(1, Duration::ZERO, max),
            Duration::from_secs(1)
        );
    }

    #[test]
    async fn test_chat_completion_sends_headers_and_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("x-title", "Xe-Bot Research Animation Generator"))
            .and(body_partial_json(json!({
                "model": "openai/gpt-4o-mini",
                "max_tokens": 4096,
                "response_format": { "type": "json_object" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"segments\": []}")))
            .expect(1)
            .mount(&server)
            .await;

        let backend = OpenRouterBackend::new(config(&server)).unwrap();
        assert_eq!(backend.default_model(), "openai/gpt-4o-mini");

        let response = backend
            .chat_completion(ChatRequest::new(vec![ChatMessage::user("hola")]).json_mode())
            .await
            .unwrap();
        assert_eq!(response.content, "{\"segments\": []}");
        assert_eq!(response.model, "openai/gpt-4o-mini");
        assert_eq!(response.usage["prompt_tokens"], 10);
    }

    #[test]
    async fn test_chat_completion_retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream busy"))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("listo")))
            .expect(1)
            .mount(&server)
            .await;

        let backend = OpenRouterBackend::new(config(&server)).unwrap();
        let response = backend
            .chat_completion(ChatRequest::new(vec![ChatMessage::user("hola")]))
            .await
            .unwrap();
        assert_eq!(response.content, "listo");
    }

    #[test]
    async fn test_chat_completion_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .expect(3)
            .mount(&server)
            .await;

        let backend = OpenRouterBackend::new(config(&server)).unwrap();
        let err = backend
            .chat_completion(ChatRequest::new(vec![ChatMessage::user("hola")]))
            .await
            .unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("LLM falló tras 3 intentos"));
        assert!(message.contains("LLM API error 502: bad gateway"));
    }

    #[test]
    async fn test_chat_completion_without_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let mut cfg = config(&server);
        cfg.max_attempts = 1;
        let backend = OpenRouterBackend::new(cfg).unwrap();
        let err = backend
            .chat_completion(ChatRequest::new(vec![ChatMessage::user("hola")]))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("sin contenido"));
    }

    #[test]
    async fn test_extract_introduction_truncates_paper_text() {
        let (llm, backend) = scripted_llm(vec![Ok(format!("  {}  \n", SAMPLE_INTRODUCTION))]);
        let paper_text = "z".repeat(20_000);

        let intro = llm.extract_introduction(&paper_text).await.unwrap();
        assert_eq!(intro, SAMPLE_INTRODUCTION.trim());

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.3);
        assert_eq!(requests[0].messages[0].role, "system");
        assert_eq!(requests[0].messages[1].content.matches('z').count(), 15_000);
    }

    #[test]
    async fn test_segment_introduction_uses_json_mode() {
        let (llm, backend) = scripted_llm(vec![Ok(segments_json())]);
        let segments = llm.segment_introduction(SAMPLE_INTRODUCTION).await.unwrap();

        assert_eq!(segments.len(), 3);
        assert!(backend.requests()[0].json_mode);
    }

    #[test]
    async fn test_segment_introduction_falls_back_on_bad_json() {
        let (llm, _) = scripted_llm(vec![Ok("not json at all".to_string())]);
        let segments = llm.segment_introduction("").await.unwrap();

        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].topic_category, TopicCategory::Background);
    }

    #[test]
    async fn test_segment_introduction_propagates_api_failure() {
        let (llm, _) = scripted_llm(vec![Err("LLM API error 401: unauthorized".to_string())]);
        let err = llm.segment_introduction(SAMPLE_INTRODUCTION).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[test]
    async fn test_generate_code_cleans_response() {
        let (llm, backend) = scripted_llm(vec![
            Ok("```python\nclass A(Scene):\n    def construct(self):\n        self.play(Fadein(t))\n```".to_string()),
            Ok("class B(Scene):\n    pass".to_string()),
        ]);
        let segment = Segment {
            content: "Attention replaces recurrence.".to_string(),
            topic: "Attention".to_string(),
            topic_category: TopicCategory::Approach,
            ..Segment::default()
        };

        let code = llm.generate_animation_code(&segment, "3blue1brown").await.unwrap();
        assert!(code.starts_with("class A(Scene):"));
        assert!(code.contains("FadeIn(t)"));

        let full = llm
            .generate_full_animation_code("Attention Is All You Need", &[segment])
            .await
            .unwrap();
        assert_eq!(full, "class B(Scene):\n    pass");

        let requests = backend.requests();
        assert!(requests[0].messages[0].content.contains("Animation style: 3blue1brown"));
        assert!(requests[1].messages[1].content.contains("FullIntroductionAnimation"));
        assert_eq!(requests[1].max_tokens, 8000);
    }
}
