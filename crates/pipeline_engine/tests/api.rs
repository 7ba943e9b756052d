use std::time::Duration;

use pipeline_core::{
    ConfirmRequest, JobStatus, Segment, SegmentId, SegmentMetadata, SegmentationOptions,
    SegmentationRequest, TaskStatus, DEFAULT_CONFIDENCE,
};
use pipeline_engine::{ClientSettings, FailureKind, PipelineApi, ReqwestPipelineApi};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> ReqwestPipelineApi {
    ReqwestPipelineApi::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .expect("client")
}

#[tokio::test]
async fn fetch_status_decodes_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "job-1",
            "status": "processing_ocr",
            "progress": 45,
            "message": "recognising page 3",
            "created_time": "2026-10-19T10:00:00",
            "updated_time": "2026-10-19T10:00:05"
        })))
        .mount(&server)
        .await;

    let status = api_for(&server).fetch_status("job-1").await.expect("status");

    let mut expected = JobStatus::new("job-1", TaskStatus::ProcessingOcr).with_progress(45.0);
    expected.message = Some("recognising page 3".to_string());
    assert_eq!(status, expected);
}

#[tokio::test]
async fn fetch_status_reports_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("task not found"))
        .mount(&server)
        .await;

    let err = api_for(&server).fetch_status("missing").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert_eq!(err.message, "404 Not Found: task not found");
}

#[tokio::test]
async fn fetch_status_rejects_malformed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/job-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = api_for(&server).fetch_status("job-2").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn fetch_status_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"status": "pending"})),
        )
        .mount(&server)
        .await;

    let api = ReqwestPipelineApi::new(ClientSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ClientSettings::default()
    })
    .expect("client");

    let err = api.fetch_status("slow").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn segment_posts_options_and_normalizes_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process/rag"))
        .and(query_param("llm_model", "qwen2.5:7b"))
        .and(body_json(json!({
            "content": "hello world",
            "chunk_size": 500,
            "overlap": 50,
            "llm_backend": "deepseek",
            "llm_model": "qwen2.5:7b",
            "llm_timeout": 300
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"content": "hello"},
            {"text": "world", "confidence": 0.4}
        ])))
        .mount(&server)
        .await;

    let request = SegmentationRequest {
        content: "hello world".to_string(),
        options: SegmentationOptions::default(),
    };
    let segments = api_for(&server).segment(&request).await.expect("segments");

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].content, "hello");
    assert_eq!(segments[0].metadata.confidence, Some(DEFAULT_CONFIDENCE));
    assert_eq!(segments[1].content, "world");
    assert_eq!(segments[1].metadata.confidence, Some(0.4));
    assert!(segments.iter().all(|s| s.id.is_none()));
}

#[tokio::test]
async fn segment_failure_carries_backend_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process/rag"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "segmenter crashed"})),
        )
        .mount(&server)
        .await;

    let request = SegmentationRequest {
        content: "text".to_string(),
        options: SegmentationOptions::default(),
    };
    let err = api_for(&server).segment(&request).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(err.message, "500 Internal Server Error: segmenter crashed");
}

#[tokio::test]
async fn confirm_sends_segments_and_returns_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/confirm/results"))
        .and(body_json(json!({
            "ocr_result": {"file_id": "file-1", "content": "source"},
            "rag_segments": [
                {"id": "1", "content": "edited", "chunk_index": 0, "metadata": {"confidence": 0.9}}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result_path": "rag_results/file-1.json"
        })))
        .mount(&server)
        .await;

    let request = ConfirmRequest {
        file_id: Some("file-1".to_string()),
        source_text: "source".to_string(),
        segments: vec![Segment {
            id: SegmentId::from("1"),
            file_id: Some("file-1".to_string()),
            content: "edited".to_string(),
            chunk_index: 0,
            metadata: SegmentMetadata {
                confidence: Some(0.9),
                ..SegmentMetadata::default()
            },
        }],
    };
    let path = api_for(&server).confirm(&request).await.expect("confirm");
    assert_eq!(path, "rag_results/file-1.json");
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ReqwestPipelineApi::new(ClientSettings {
        base_url: "not a url".to_string(),
        ..ClientSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
