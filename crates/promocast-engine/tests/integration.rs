use promocast_core::{ApiKey, GenerationError, VideoRequest};
use promocast_engine::null_backend::NULL_VIDEO_BYTES;
use promocast_engine::{
    BackendRegistry, CancelSignal, GeminiBackend, GenerationBackend, NullBackend, OperationPoller,
    PollPolicy,
};
use std::time::Duration;

fn key() -> ApiKey {
    ApiKey::new("integration-key").unwrap()
}

fn request() -> VideoRequest {
    VideoRequest {
        image: vec![0xFF, 0xD8, 0xFF],
        mime_type: "image/jpeg".to_string(),
        prompt: "animate this image".to_string(),
    }
}

fn fast_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(1),
        ..PollPolicy::default()
    }
}

#[tokio::test]
async fn test_null_backend_video_round_trip() {
    let backend = NullBackend::new();
    let poller = OperationPoller::new(&backend, fast_policy());

    let bytes = tokio::time::timeout(
        Duration::from_secs(2),
        poller.run(&key(), &request(), &CancelSignal::never()),
    )
    .await
    .expect("poller timed out")
    .unwrap();

    assert_eq!(bytes, NULL_VIDEO_BYTES);
    assert_eq!(backend.submit_count(), 1);
    assert_eq!(backend.poll_count(), 1);
}

#[tokio::test]
async fn test_registry_backend_drives_poller() {
    let registry = BackendRegistry::new();
    let backend = registry
        .build("null", toml::Value::Table(Default::default()))
        .await
        .unwrap();
    let poller = OperationPoller::new(backend.as_ref(), fast_policy());
    let bytes = poller
        .run(&key(), &request(), &CancelSignal::never())
        .await
        .unwrap();
    assert!(!bytes.is_empty());
}

#[tokio::test]
async fn test_zero_attempt_budget_times_out_immediately() {
    let backend = NullBackend::new();
    let policy = PollPolicy {
        max_attempts: Some(0),
        ..fast_policy()
    };
    let poller = OperationPoller::new(&backend, policy);
    match poller.run(&key(), &request(), &CancelSignal::never()).await {
        Err(GenerationError::GenerationTimeout(_)) => {}
        other => panic!("expected GenerationTimeout, got {other:?}"),
    }
    assert_eq!(backend.poll_count(), 0);
}

#[tokio::test]
async fn test_failed_download_does_not_leak_key() {
    let mut backend = GeminiBackend::new();
    let mut table = toml::map::Map::new();
    table.insert("request_timeout_secs".to_string(), toml::Value::Integer(5));
    backend.initialize(toml::Value::Table(table)).await.unwrap();

    let secret = ApiKey::new("SUPERSECRETKEY123").unwrap();
    let poller = OperationPoller::new(&backend, fast_policy());
    // Nothing listens on the discard port
    match poller.download(&secret, "http://127.0.0.1:9/v1?alt=media").await {
        Err(err @ GenerationError::Transport(_)) => {
            let text = err.to_string();
            assert!(!text.contains("SUPERSECRETKEY123"), "key leaked: {text}");
            assert!(!format!("{err:?}").contains("SUPERSECRETKEY123"));
        }
        other => panic!("expected Transport, got {other:?}"),
    }
}
