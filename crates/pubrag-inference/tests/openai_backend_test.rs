//! Integration tests for the OpenAI-compatible backend against a mock server.

use std::sync::Arc;

use pubrag_core::{EmbeddingBackend, Error, GenerationBackend, InferenceBackend};
use pubrag_inference::openai::{OpenAIBackend, OpenAIConfig};
use pubrag_inference::{EmbeddingClient, QueryTranslator, Summarizer};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, dimension: usize) -> OpenAIConfig {
    OpenAIConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        embed_model: "test-embed".to_string(),
        gen_model: "test-gen".to_string(),
        embed_dimension: dimension,
        timeout_seconds: 10,
    }
}

fn chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

#[tokio::test]
async fn test_embeddings_request_and_ordering() {
    let mock_server = MockServer::start().await;

    // Out-of-order indices must be put back in input order
    let embedding_response = serde_json::json!({
        "data": [
            {"embedding": [0.0, 1.0, 0.0], "index": 1},
            {"embedding": [1.0, 0.0, 0.0], "index": 0}
        ],
        "model": "test-embed"
    });

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({"model": "test-embed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&embedding_response))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = OpenAIBackend::new(config_for(&mock_server, 3)).expect("backend");
    let texts = vec!["first".to_string(), "second".to_string()];
    let vectors = backend.embed_texts(&texts).await.expect("embeddings");

    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0].as_slice(), &[1.0, 0.0, 0.0]);
    assert_eq!(vectors[1].as_slice(), &[0.0, 1.0, 0.0]);
}

#[tokio::test]
async fn test_embedding_client_rejects_wrong_dimension() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"embedding": [0.1, 0.2], "index": 0}]
        })))
        .mount(&mock_server)
        .await;

    let backend = OpenAIBackend::new(config_for(&mock_server, 3)).expect("backend");
    let client = EmbeddingClient::new(Arc::new(backend));

    let err = client.embed("aspirin").await.unwrap_err();
    assert!(matches!(err, Error::Embedding(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_chat_completion_sends_system_and_temperature() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-gen",
            "temperature": 0.0,
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("hi")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = OpenAIBackend::new(config_for(&mock_server, 3)).expect("backend");
    let text = backend
        .generate_with_system("be brief", "hello")
        .await
        .expect("completion");
    assert_eq!(text, "hi");
}

#[tokio::test]
async fn test_translator_over_http() {
    let mock_server = MockServer::start().await;

    let content = "```json\n{\"mesh_terms\": [\"Diabetes Mellitus\"], \
\"pubmed_query\": \"\\\"Diabetes Mellitus\\\"[MeSH Terms] AND 2023[dp]\"}\n```";

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({"temperature": 0.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(content)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = OpenAIBackend::new(config_for(&mock_server, 3)).expect("backend");
    let translator = QueryTranslator::new(Arc::new(backend));

    let query = translator
        .translate("diabetes treatment 2023")
        .await
        .expect("translation");
    assert_eq!(query.mesh_terms, vec!["Diabetes Mellitus"]);
    assert!(query.pubmed_query.contains("2023"));
}

#[tokio::test]
async fn test_summarizer_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({"temperature": 0.0})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_response("Both trials favour GLP-1.")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = OpenAIBackend::new(config_for(&mock_server, 3)).expect("backend");
    let summarizer = Summarizer::new(Arc::new(backend));

    let summary = summarizer
        .summarize("### Article source: Pubmed\n**Title:** A trial")
        .await
        .expect("summary");
    assert_eq!(summary, "Both trials favour GLP-1.");
}

#[tokio::test]
async fn test_rate_limit_maps_to_inference_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"message": "slow down", "type": "rate_limit_exceeded"}
        })))
        .mount(&mock_server)
        .await;

    let backend = OpenAIBackend::new(config_for(&mock_server, 3)).expect("backend");
    let err = backend.generate("hello").await.unwrap_err();

    assert!(matches!(err, Error::Inference(_)), "got {:?}", err);
    assert!(err.to_string().contains("slow down"));
}

#[tokio::test]
async fn test_unauthorized_maps_to_config_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
        .mount(&mock_server)
        .await;

    let backend = OpenAIBackend::new(config_for(&mock_server, 3)).expect("backend");
    let err = backend.embed_texts(&["x".to_string()]).await.unwrap_err();

    assert!(matches!(err, Error::Config(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_server_error_maps_to_backend_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let backend = OpenAIBackend::new(config_for(&mock_server, 3)).expect("backend");
    let err = backend.embed_texts(&["x".to_string()]).await.unwrap_err();

    assert!(matches!(err, Error::BackendUnavailable(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_connection_refused_is_backend_unavailable() {
    let config = OpenAIConfig {
        // Port 1 is reserved and never listening in test environments
        base_url: "http://127.0.0.1:1".to_string(),
        timeout_seconds: 5,
        ..Default::default()
    };
    let backend = OpenAIBackend::new(config).expect("backend");

    let err = backend.generate("hello").await.unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_health_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&mock_server)
        .await;

    let backend = OpenAIBackend::new(config_for(&mock_server, 3)).expect("backend");
    assert!(backend.health_check().await.expect("health check"));
}
