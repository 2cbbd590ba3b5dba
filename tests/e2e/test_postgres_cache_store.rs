use crate::e2e::helpers;

use helpers::assertions::{assert_cached, assert_live, speech_content};
use helpers::aws_mocks::mock_audio_bytes;
use helpers::fixtures;
use helpers::spy_backend::{Reply, SpyBackend, SpyFactory};
use helpers::{build_orchestrator, PostgresContext};
use lingo_cache::domain::generation::{CacheKey, Content, OrchestratorApi};
use lingo_cache::domain::speech::AudioFormat;
use lingo_cache::infrastructure::backends::Engine;
use lingo_cache::infrastructure::repositories::CacheStore;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_context::test_context;

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_store_and_load_audio_artifacts(ctx: &PostgresContext) {
    let request = fixtures::speech("Hello", "Joanna", "normal");
    let key = CacheKey::for_request(&request);
    let artifact = fixtures::speech_artifact(&request, mock_audio_bytes());

    ctx.store.put(&key, &artifact).await.unwrap();
    let entry = ctx.store.lookup(&key).await.unwrap().expect("entry should exist");

    assert_eq!(entry.key, key);
    assert_eq!(entry.artifact, artifact);
    assert_eq!(entry.size_bytes, artifact.size_bytes());
    assert_eq!(entry.hit_count, 0);
    assert!(entry.valid);
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_return_none_for_unknown_keys(ctx: &PostgresContext) {
    let key = CacheKey::for_request(&fixtures::intro("nothing", "nada"));
    assert!(ctx.store.lookup(&key).await.unwrap().is_none());
    assert!(!ctx.store.invalidate(&key).await.unwrap());
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_overwrite_on_repeated_put(ctx: &PostgresContext) {
    let key = CacheKey::for_request(&fixtures::intro("table", "mesa"));

    ctx.store.put(&key, &fixtures::intro_artifact("first")).await.unwrap();
    ctx.store.record_hit(&key).await.unwrap();
    ctx.store.put(&key, &fixtures::intro_artifact("second")).await.unwrap();

    let entry = ctx.store.lookup(&key).await.unwrap().unwrap();
    assert_eq!(entry.artifact, fixtures::intro_artifact("second"));
    assert_eq!(entry.hit_count, 0);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM generation_cache")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_count_hits(ctx: &PostgresContext) {
    let key = CacheKey::for_request(&fixtures::intro("table", "mesa"));
    ctx.store.put(&key, &fixtures::intro_artifact("Olá")).await.unwrap();

    for _ in 0..3 {
        ctx.store.record_hit(&key).await.unwrap();
    }

    assert_eq!(ctx.store.lookup(&key).await.unwrap().unwrap().hit_count, 3);
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_hide_invalidated_entries_until_rewritten(ctx: &PostgresContext) {
    let key = CacheKey::for_request(&fixtures::intro("table", "mesa"));
    ctx.store.put(&key, &fixtures::intro_artifact("Olá")).await.unwrap();

    assert!(ctx.store.invalidate(&key).await.unwrap());
    assert!(!ctx.store.invalidate(&key).await.unwrap());
    assert!(ctx.store.lookup(&key).await.unwrap().is_none());
    assert_eq!(ctx.store.stats().await.unwrap().count, 0);

    ctx.store.put(&key, &fixtures::intro_artifact("Olá de novo")).await.unwrap();
    assert!(ctx.store.lookup(&key).await.unwrap().is_some());
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_report_stats_and_clear_everything(ctx: &PostgresContext) {
    let first = CacheKey::for_request(&fixtures::intro("table", "mesa"));
    let second = CacheKey::for_request(&fixtures::intro("chair", "cadeira"));
    let stale = CacheKey::for_request(&fixtures::intro("door", "porta"));
    for key in [&first, &second, &stale] {
        ctx.store.put(key, &fixtures::intro_artifact("Olá")).await.unwrap();
    }
    ctx.store.invalidate(&stale).await.unwrap();

    let stats = ctx.store.stats().await.unwrap();
    assert_eq!(stats.count, 2);
    assert_eq!(stats.total_bytes, 2 * fixtures::intro_artifact("Olá").size_bytes());

    let report = ctx.store.clear().await.unwrap();
    assert_eq!(report.entries_deleted, 3);
    assert_eq!(report.bytes_freed, 3 * fixtures::intro_artifact("Olá").size_bytes());
    assert_eq!(ctx.store.stats().await.unwrap().count, 0);
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_serve_speech_from_postgres_across_orchestrators(ctx: &PostgresContext) {
    let request = fixtures::speech("Good morning", "Joanna", "slow");
    let first_spy = SpyBackend::new("polly", Reply::Audio(mock_audio_bytes(), AudioFormat::Mp3));
    let first = build_orchestrator(
        ctx.store.clone(),
        Arc::new(SpyFactory::new().with(Engine::Polly, first_spy.clone())),
        &[Engine::Polly],
    )
    .generate(request.clone())
    .await;
    assert_live(&first);

    // A restarted process shares nothing with the first one except the database.
    let second_spy = SpyBackend::new("polly", Reply::Audio(vec![0; 4], AudioFormat::Mp3));
    let second = build_orchestrator(
        ctx.store.clone(),
        Arc::new(SpyFactory::new().with(Engine::Polly, second_spy.clone())),
        &[Engine::Polly],
    )
    .generate(request.clone())
    .await;

    assert_cached(&second);
    assert_eq!(second_spy.calls(), 0);
    assert_eq!(
        speech_content(&second).audio_url,
        speech_content(&first).audio_url
    );
    assert_eq!(second.artifact.audio, Some(mock_audio_bytes()));
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_cache_sanitized_quizzes_in_postgres(ctx: &PostgresContext) {
    let spy = SpyBackend::text(&fixtures::quiz_reply());
    let orchestrator = build_orchestrator(
        ctx.store.clone(),
        Arc::new(SpyFactory::new().with(Engine::OpenAiChat, spy.clone())),
        &[],
    );

    orchestrator.generate(fixtures::quiz("table", "mesa")).await;
    let cached = orchestrator.generate(fixtures::quiz("table", "mesa")).await;

    assert_cached(&cached);
    match &cached.artifact.content {
        Content::Quiz(quiz) => assert_eq!(quiz.max_score, 30),
        other => panic!("expected quiz, got {:?}", other),
    }

    let capability: String =
        sqlx::query_scalar("SELECT capability FROM generation_cache WHERE key = $1")
            .bind(CacheKey::for_request(&fixtures::quiz("table", "mesa")).as_str())
            .fetch_one(&ctx.pool)
            .await
            .unwrap();
    assert_eq!(capability, "quiz");
}
