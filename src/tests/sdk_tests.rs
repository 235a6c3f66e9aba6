//! tests/sdk_tests.rs
//! Cliente Rust de la API contra un servidor simulado.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_rt::test;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::models::job_model::JobStatus;
    use crate::sdk::{GenerateOptions, XeBotClient};

    fn client(server: &MockServer) -> XeBotClient {
        XeBotClient::new("xb_test", &format!("{}/", server.uri()))
            .unwrap()
            .with_poll_interval(Duration::from_millis(10))
    }

    fn job_body(status: &str, error: Option<&str>) -> Value {
        json!({
            "job_id": "abc123def456",
            "arxiv_id": "1706.03762",
            "status": status,
            "stage": status,
            "stage_detail": null,
            "progress": if status == "completed" { 100 } else { 40 },
            "paper": {
                "arxiv_id": "1706.03762",
                "title": "Attention Is All You Need",
                "authors": ["Ashish Vaswani"],
                "summary": "Transformers.",
                "published": "2017-06-12",
                "pdf_url": "https://arxiv.org/pdf/1706.03762"
            },
            "segments": [
                { "topic": "Background", "category": "background", "concepts": ["rnn"] },
                { "topic": "Approach", "category": "approach", "concepts": [] }
            ],
            "videos": if status == "completed" {
                json!([{
                    "kind": "full",
                    "topic": "Full Introduction",
                    "url": "http://localhost:8000/animations/videos/full.mp4",
                    "download_url": "http://localhost:8000/download/animations/full.mp4",
                    "duration_seconds": 42
                }])
            } else {
                json!([])
            },
            "error": error,
            "created_at": "2025-01-01T00:00:00+00:00",
            "updated_at": "2025-01-01T00:00:10+00:00",
            "completed_at": null
        })
    }

    async fn mount_created(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(header("authorization", "Bearer xb_test"))
            .and(body_partial_json(json!({ "arxiv_id": "1706.03762", "quality": "low" })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "job_id": "abc123def456",
                "status": "queued",
                "message": "Animation job queued",
                "status_url": "/api/jobs/abc123def456"
            })))
            .mount(server)
            .await;
    }

    #[test]
    async fn test_search_caps_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search"))
            .and(query_param("query", "attention"))
            .and(query_param("max_results", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "papers": [{
                    "arxiv_id": "1706.03762",
                    "title": "Attention Is All You Need",
                    "authors": [],
                    "summary": "",
                    "published": null,
                    "pdf_url": "https://arxiv.org/pdf/1706.03762"
                }],
                "count": 1
            })))
            .mount(&server)
            .await;

        let sdk = client(&server);
        assert_eq!(sdk.base_url(), server.uri());
        let papers = sdk.search("attention", 50).await.unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].arxiv_id, "1706.03762");
    }

    #[test]
    async fn test_generate_without_waiting() {
        let server = MockServer::start().await;
        mount_created(&server).await;

        let result = client(&server)
            .generate_animation(
                "1706.03762",
                GenerateOptions {
                    wait: false,
                    ..GenerateOptions::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(result.job_id, "abc123def456");
        assert_eq!(result.status, JobStatus::Queued);
        assert!(result.videos.is_empty());
    }

    #[test]
    async fn test_generate_polls_until_completed() {
        let server = MockServer::start().await;
        mount_created(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/abc123def456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_body("processing", None)))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/abc123def456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_body("completed", None)))
            .mount(&server)
            .await;

        let result = client(&server)
            .generate_animation("1706.03762", GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(result.status, JobStatus::Completed);
        assert_eq!(result.paper_title.as_deref(), Some("Attention Is All You Need"));
        assert_eq!(result.segments_count, 2);
        assert_eq!(result.videos.len(), 1);
        assert_eq!(result.videos[0].duration_seconds, 42);
    }

    #[test]
    async fn test_generate_reports_failure_and_timeout() {
        let server = MockServer::start().await;
        mount_created(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/abc123def456"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(job_body("failed", Some("Fetch failed: boom"))),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .generate_animation("1706.03762", GenerateOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Animation failed: Fetch failed: boom");

        let slow = MockServer::start().await;
        mount_created(&slow).await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/abc123def456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_body("processing", None)))
            .mount(&slow)
            .await;

        let err = client(&slow)
            .generate_animation(
                "1706.03762",
                GenerateOptions {
                    timeout: Duration::from_millis(50),
                    ..GenerateOptions::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Animation timed out after"));
    }

    #[test]
    async fn test_generate_code_and_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate-code"))
            .and(body_partial_json(json!({ "topic": "Self-Attention", "style": "educational" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "class AttentionScene(Scene): pass",
                "scene_name": "AttentionScene",
                "topic": "Self-Attention"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/videos"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "Invalid or missing API key"
            })))
            .mount(&server)
            .await;

        let sdk = client(&server);
        let code = sdk
            .generate_code("Self-Attention", &["query".to_string()], "educational")
            .await
            .unwrap();
        assert_eq!(code.scene_name, "AttentionScene");

        let err = sdk.list_videos().await.unwrap_err();
        assert!(err.to_string().contains("HTTP 401"));
    }

    #[test]
    async fn test_list_and_download_videos() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "videos": [{
                    "id": "full",
                    "filename": "full.mp4",
                    "path": "a/full.mp4",
                    "url": format!("{}/animations/videos/a/full.mp4", server.uri()),
                    "download_url": format!("{}/download/animations/a/full.mp4", server.uri()),
                    "size_bytes": 5,
                    "created_at": null,
                    "source": "animations"
                }],
                "count": 1,
                "base_url": server.uri()
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/download/animations/a/full.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"video".to_vec()))
            .mount(&server)
            .await;

        let sdk = client(&server);
        let videos = sdk.list_videos().await.unwrap();
        assert_eq!(videos.len(), 1);

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out/full.mp4");
        let written = sdk
            .download_video(&videos[0].download_url, &target)
            .await
            .unwrap();
        assert_eq!(written, 5);
        assert_eq!(std::fs::read(&target).unwrap(), b"video");

        let relative = dir.path().join("relative.mp4");
        assert_eq!(
            sdk.download_video("/download/animations/a/full.mp4", &relative)
                .await
                .unwrap(),
            5
        );

        assert!(sdk
            .download_video("/download/missing.mp4", &dir.path().join("x.mp4"))
            .await
            .is_err());
    }
}
