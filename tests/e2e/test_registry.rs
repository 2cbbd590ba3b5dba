use crate::e2e::helpers;

use futures::future::join_all;
use helpers::fixtures;
use helpers::spy_backend::{Reply, SpyBackend, SpyFactory};
use helpers::TestContext;
use lingo_cache::domain::generation::OrchestratorApi;
use lingo_cache::domain::speech::AudioFormat;
use lingo_cache::infrastructure::backends::Engine;
use lingo_cache::infrastructure::registry::BackendDescriptor;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_context::test_context;

fn descriptor<'a>(status: &'a [BackendDescriptor], engine: &str) -> &'a BackendDescriptor {
    status
        .iter()
        .find(|d| d.engine == engine)
        .unwrap_or_else(|| panic!("no descriptor for {}", engine))
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_initialize_backends_before_first_use(ctx: &TestContext) {
    let factory = Arc::new(
        SpyFactory::new()
            .with(Engine::OpenAiChat, SpyBackend::text(&fixtures::quiz_reply()))
            .with(
                Engine::Polly,
                SpyBackend::new("polly", Reply::Audio(vec![7; 16], AudioFormat::Mp3)),
            ),
    );
    let orchestrator = ctx.orchestrator(factory.clone(), &[Engine::Polly]);

    let status = orchestrator.backend_status();
    assert_eq!(status.len(), 2);
    assert!(status.iter().all(|d| !d.initialized && !d.available));
    assert_eq!(factory.creations(Engine::OpenAiChat), 0);

    orchestrator.generate(fixtures::quiz("table", "mesa")).await;

    let status = orchestrator.backend_status();
    let text = descriptor(&status, "openai-chat");
    assert!(text.initialized && text.available);
    assert!(!descriptor(&status, "polly").initialized);
    assert_eq!(factory.creations(Engine::Polly), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_build_each_backend_once_under_concurrent_first_use(ctx: &TestContext) {
    let spy = SpyBackend::text(&fixtures::quiz_reply());
    let factory = Arc::new(SpyFactory::new().with(Engine::OpenAiChat, spy.clone()));
    let orchestrator = Arc::new(ctx.orchestrator(factory.clone(), &[]));

    let words = ["table", "chair", "door", "window", "lamp", "sofa"];
    let results = join_all(words.iter().map(|word| {
        let orchestrator = orchestrator.clone();
        async move { orchestrator.generate(fixtures::quiz(word, "x")).await }
    }))
    .await;

    assert!(results.iter().all(|r| !r.degraded));
    assert_eq!(factory.creations(Engine::OpenAiChat), 1);
    assert_eq!(spy.calls(), words.len());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_failed_engines_as_unavailable(ctx: &TestContext) {
    let factory = Arc::new(SpyFactory::new());
    let orchestrator = ctx.orchestrator(factory.clone(), &[Engine::Piper, Engine::SpeakServer]);

    orchestrator
        .generate(fixtures::speech("Hello", "V1", "normal"))
        .await;
    orchestrator
        .generate(fixtures::speech("Hello again", "V1", "normal"))
        .await;

    let status = orchestrator.backend_status();
    for engine in ["piper", "speak_server"] {
        let slot = descriptor(&status, engine);
        assert!(slot.initialized, "{} should have been attempted", engine);
        assert!(!slot.available);
    }
    assert_eq!(factory.creations(Engine::Piper), 1);
    assert_eq!(factory.creations(Engine::SpeakServer), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_serialize_status_for_the_command_surface(ctx: &TestContext) {
    let orchestrator = ctx.orchestrator(Arc::new(SpyFactory::new()), &[Engine::Polly]);

    let json = serde_json::to_value(orchestrator.backend_status()).unwrap();

    assert_eq!(json[0]["engine"], "openai-chat");
    assert_eq!(json[1]["engine"], "polly");
    assert_eq!(json[1]["capabilities"], serde_json::json!(["speech"]));
}
