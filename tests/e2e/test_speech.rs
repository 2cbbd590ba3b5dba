use crate::e2e::helpers;

use helpers::assertions::{assert_cached, assert_degraded, assert_live, speech_content};
use helpers::aws_mocks::{create_mock_polly_backend, mock_audio_bytes};
use helpers::fixtures;
use helpers::spy_backend::{Reply, SpyBackend, SpyFactory};
use helpers::{TestContext, AUDIO_PREFIX};
use lingo_cache::domain::generation::dto::SpeechRequest;
use lingo_cache::domain::generation::{CacheKey, OrchestratorApi};
use lingo_cache::domain::speech::AudioFormat;
use lingo_cache::infrastructure::backends::{Engine, Invocation};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_context::test_context;

fn polly_spy() -> Arc<SpyBackend> {
    SpyBackend::new("polly", Reply::Audio(mock_audio_bytes(), AudioFormat::Mp3))
}

fn speech_factory(engine: Engine, spy: &Arc<SpyBackend>) -> Arc<SpyFactory> {
    Arc::new(SpyFactory::new().with(engine, spy.clone()))
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_the_same_audio_address_on_repeat(ctx: &TestContext) {
    let spy = polly_spy();
    let orchestrator = ctx.orchestrator(speech_factory(Engine::Polly, &spy), &[Engine::Polly]);
    let request = fixtures::speech("Hello", "V1", "normal");

    let first = orchestrator.generate(request.clone()).await;
    let second = orchestrator.generate(request.clone()).await;

    assert_live(&first);
    assert_cached(&second);
    assert_eq!(spy.calls(), 1);

    let first_speech = speech_content(&first);
    let second_speech = speech_content(&second);
    assert_eq!(first_speech.audio_url, second_speech.audio_url);
    assert_eq!(
        first_speech.audio_url,
        format!("{}/{}.mp3", AUDIO_PREFIX, CacheKey::for_request(&request))
    );
    assert_eq!(first_speech.voice, "V1");
    assert_eq!(first_speech.method, "polly");
    assert_eq!(first_speech.file_size, mock_audio_bytes().len() as u64);
    assert_eq!(second.artifact.audio, Some(mock_audio_bytes()));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_address_different_speeds_separately(ctx: &TestContext) {
    let spy = polly_spy();
    let orchestrator = ctx.orchestrator(speech_factory(Engine::Polly, &spy), &[Engine::Polly]);

    let normal = orchestrator
        .generate(fixtures::speech("Hello", "V1", "normal"))
        .await;
    let slow = orchestrator
        .generate(fixtures::speech("Hello", "V1", "slow"))
        .await;

    assert_live(&slow);
    assert_ne!(speech_content(&normal).audio_url, speech_content(&slow).audio_url);
    assert_eq!(spy.calls(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_use_the_first_engine_that_initializes(ctx: &TestContext) {
    let polly = polly_spy();
    // Piper is preferred but has no backend, so its slot fails to initialize.
    let factory = Arc::new(SpyFactory::new().with(Engine::Polly, polly.clone()));
    let orchestrator = ctx.orchestrator(factory.clone(), &[Engine::Piper, Engine::Polly]);

    let result = orchestrator
        .generate(fixtures::speech("Hello", "V1", "normal"))
        .await;
    orchestrator
        .generate(fixtures::speech("Hello again", "V1", "normal"))
        .await;

    assert_eq!(speech_content(&result).method, "polly");
    assert_eq!(polly.calls(), 2);
    assert_eq!(factory.creations(Engine::Piper), 1);
    assert_eq!(factory.creations(Engine::Polly), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_the_engine_audio_format_in_the_address(ctx: &TestContext) {
    let piper = SpyBackend::new("piper", Reply::Audio(vec![1, 2, 3], AudioFormat::Wav));
    let orchestrator = ctx.orchestrator(speech_factory(Engine::Piper, &piper), &[Engine::Piper]);

    let result = orchestrator
        .generate(fixtures::speech("Olá mundo", "pt", "fast"))
        .await;

    let speech = speech_content(&result);
    assert!(speech.audio_url.ends_with(".wav"));
    assert_eq!(speech.format, AudioFormat::Wav);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_clean_text_before_synthesis(ctx: &TestContext) {
    let spy = polly_spy();
    let orchestrator = ctx.orchestrator(speech_factory(Engine::Polly, &spy), &[Engine::Polly]);

    let result = orchestrator
        .generate(fixtures::speech(
            "<p>Hello   https://example.com world 🎉</p>",
            "V1",
            "normal",
        ))
        .await;

    match spy.last_invocation() {
        Some(Invocation::Speech(input)) => assert_eq!(input.text, "Hello world"),
        other => panic!("expected a speech invocation, got {:?}", other),
    }
    assert_eq!(speech_content(&result).text, "Hello world");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_serve_a_silent_clip_without_engines(ctx: &TestContext) {
    let orchestrator = ctx.orchestrator(Arc::new(SpyFactory::new()), &[Engine::Polly]);

    let result = orchestrator
        .generate(fixtures::speech("Hello", "V1", "normal"))
        .await;

    assert_degraded(&result);
    let speech = speech_content(&result);
    assert_eq!(speech.method, "fallback");
    assert!(speech.audio_url.starts_with("data:audio/wav;base64,"));
    assert_eq!(orchestrator.cache_stats().await.unwrap().count, 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_degrade_when_polly_is_unreachable(ctx: &TestContext) {
    let factory = Arc::new(SpyFactory::new().with(Engine::Polly, create_mock_polly_backend()));
    let orchestrator = ctx.orchestrator(factory, &[Engine::Polly]);

    let result = orchestrator
        .generate(fixtures::speech("Hello there", "Joanna", "normal"))
        .await;

    assert_degraded(&result);
    assert_eq!(speech_content(&result).method, "fallback");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_blank_speech_text_with_a_fallback(ctx: &TestContext) {
    let spy = polly_spy();
    let orchestrator = ctx.orchestrator(speech_factory(Engine::Polly, &spy), &[Engine::Polly]);

    let response = orchestrator
        .generate_speech(SpeechRequest {
            text: Some("   ".to_string()),
            word: None,
            language: "en-US".to_string(),
            voice: None,
            speed: "normal".to_string(),
        })
        .await;

    assert!(!response.from_cache);
    assert_eq!(spy.calls(), 0);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["method"], "fallback");
    assert_eq!(json["voice"], "default");
}
