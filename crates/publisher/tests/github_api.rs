//! Integration tests for the GitHub contents publisher against a mock API.

use assert_matches::assert_matches;
use base64::Engine;
use tokensync_publisher::{GithubConfig, GithubPublisher, PublishError, PublishOutcome, Publisher};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTENTS_PATH: &str = "/repos/octo/tokens/contents/token_ind.json";

fn config_for(server: &MockServer) -> GithubConfig {
    GithubConfig {
        api_url: server.uri(),
        owner: Some("octo".to_string()),
        repo: Some("tokens".to_string()),
        token: Some("ghp_test".to_string()),
        branch: None,
    }
}

fn encoded(content: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(content)
}

#[tokio::test]
async fn creates_file_when_absent() {
    let server = MockServer::start().await;
    let content = br#"[{"token":"T1"}]"#;

    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .and(header("authorization", "Bearer ghp_test"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(serde_json::json!({
            "message": "Added JWT tokens",
            "content": encoded(content),
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = GithubPublisher::new(config_for(&server)).unwrap();
    let outcome = publisher.publish("token_ind.json", content).await.unwrap();

    assert_eq!(outcome, PublishOutcome::Created);
    server.verify().await;
}

#[tokio::test]
async fn updates_file_with_current_sha() {
    let server = MockServer::start().await;
    let content = b"[]";

    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"sha": "abc123"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(serde_json::json!({
            "message": "Updated JWT tokens",
            "sha": "abc123",
            "content": encoded(content),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = GithubPublisher::new(config_for(&server)).unwrap();
    let outcome = publisher.publish("token_ind.json", content).await.unwrap();

    assert_eq!(outcome, PublishOutcome::Updated);
    server.verify().await;
}

#[tokio::test]
async fn branch_is_sent_on_lookup_and_write() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .and(wiremock::matchers::query_param("ref", "data"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(serde_json::json!({"branch": "data"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.branch = Some("data".to_string());
    let publisher = GithubPublisher::new(config).unwrap();
    publisher.publish("token_ind.json", b"[]").await.unwrap();

    server.verify().await;
}

#[tokio::test]
async fn owner_defaults_to_authenticated_user() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer ghp_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"login": "octo"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.owner = None;
    let publisher = GithubPublisher::new(config).unwrap();
    let outcome = publisher.publish("token_ind.json", b"[]").await.unwrap();

    assert_eq!(outcome, PublishOutcome::Created);
    server.verify().await;
}

#[tokio::test]
async fn owner_lookup_with_rejected_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.owner = None;
    let publisher = GithubPublisher::new(config).unwrap();
    let err = publisher
        .publish("token_ind.json", b"[]")
        .await
        .unwrap_err();

    assert_matches!(err, PublishError::Unauthorized(401));
}

#[tokio::test]
async fn rejected_credentials_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let publisher = GithubPublisher::new(config_for(&server)).unwrap();
    let err = publisher
        .publish("token_ind.json", b"[]")
        .await
        .unwrap_err();

    assert_matches!(err, PublishError::Unauthorized(401));
}

#[tokio::test]
async fn failed_write_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(422).set_body_string("sha mismatch"))
        .mount(&server)
        .await;

    let publisher = GithubPublisher::new(config_for(&server)).unwrap();
    let err = publisher
        .publish("token_ind.json", b"[]")
        .await
        .unwrap_err();

    assert_matches!(err, PublishError::HttpStatus { status: 422, ref body } if body == "sha mismatch");
}

#[tokio::test]
async fn missing_configuration_fails_without_network() {
    let server = MockServer::start().await;
    let mut config = config_for(&server);
    config.token = None;

    let publisher = GithubPublisher::new(config).unwrap();
    let err = publisher
        .publish("token_ind.json", b"[]")
        .await
        .unwrap_err();

    assert_matches!(err, PublishError::NotConfigured(ref missing) if missing == "GITHUB_TOKEN");
    assert!(server.received_requests().await.unwrap().is_empty());
}
