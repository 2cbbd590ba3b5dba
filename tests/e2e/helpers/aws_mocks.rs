use aws_sdk_polly::Client as PollyClient;
use lingo_cache::infrastructure::backends::PollySpeechBackend;
use std::sync::Arc;

/// Polly client pointed at an endpoint nobody listens on.
pub fn create_mock_polly_client() -> PollyClient {
    let config = aws_sdk_polly::Config::builder()
        .behavior_version(aws_sdk_polly::config::BehaviorVersion::latest())
        .region(aws_sdk_polly::config::Region::new("us-east-1"))
        .credentials_provider(aws_sdk_polly::config::Credentials::new(
            "test", "test", None, None, "tests",
        ))
        .endpoint_url("http://localhost:9999") // Non-existent endpoint for testing
        .build();

    PollyClient::from_conf(config)
}

pub fn create_mock_polly_backend() -> Arc<PollySpeechBackend> {
    Arc::new(PollySpeechBackend::new(Arc::new(create_mock_polly_client())))
}

pub fn mock_audio_bytes() -> Vec<u8> {
    // Minimal valid MP3 file (silence)
    vec![
        0xFF, 0xFB, 0x90, 0x00, // MP3 frame header
        0x00, 0x00, 0x00, 0x00, // Some padding
    ]
}
