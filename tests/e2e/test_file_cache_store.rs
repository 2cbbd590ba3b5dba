use crate::e2e::helpers;

use futures::future::join_all;
use helpers::assertions::{assert_cached, assert_live};
use helpers::aws_mocks::mock_audio_bytes;
use helpers::fixtures;
use helpers::spy_backend::{Reply, SpyBackend, SpyFactory};
use helpers::{build_orchestrator, FileContext};
use lingo_cache::domain::generation::{CacheKey, OrchestratorApi};
use lingo_cache::domain::speech::AudioFormat;
use lingo_cache::infrastructure::backends::Engine;
use lingo_cache::infrastructure::repositories::{CacheError, CacheStore, FileCacheStore};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_context::test_context;

#[test_context(FileContext)]
#[tokio::test]
async fn it_should_write_audio_next_to_the_record(ctx: &FileContext) {
    let request = fixtures::speech("Hello", "Joanna", "normal");
    let key = CacheKey::for_request(&request);
    let artifact = fixtures::speech_artifact(&request, mock_audio_bytes());

    ctx.store.put(&key, &artifact).await.unwrap();

    let audio_path = ctx.dir.join(format!("{}.mp3", key));
    assert_eq!(tokio::fs::read(&audio_path).await.unwrap(), mock_audio_bytes());
    assert!(ctx.dir.join(format!("{}.json", key)).exists());

    let entry = ctx.store.lookup(&key).await.unwrap().unwrap();
    assert_eq!(entry.artifact, artifact);
    assert_eq!(entry.size_bytes, artifact.size_bytes());
}

#[test_context(FileContext)]
#[tokio::test]
async fn it_should_leave_no_temp_files_behind(ctx: &FileContext) {
    let key = CacheKey::for_request(&fixtures::intro("table", "mesa"));

    ctx.store.put(&key, &fixtures::intro_artifact("one")).await.unwrap();
    ctx.store.put(&key, &fixtures::intro_artifact("two")).await.unwrap();
    ctx.store.record_hit(&key).await.unwrap();

    let mut names = Vec::new();
    let mut dir = tokio::fs::read_dir(&ctx.dir).await.unwrap();
    while let Some(item) = dir.next_entry().await.unwrap() {
        names.push(item.file_name().to_string_lossy().to_string());
    }
    assert_eq!(names, vec![format!("{}.json", key)]);

    let entry = ctx.store.lookup(&key).await.unwrap().unwrap();
    assert_eq!(entry.artifact, fixtures::intro_artifact("two"));
    assert_eq!(entry.hit_count, 1);
}

#[test_context(FileContext)]
#[tokio::test]
async fn it_should_read_missing_keys_as_absent(ctx: &FileContext) {
    let key = CacheKey::for_request(&fixtures::intro("nothing", "nada"));

    assert!(ctx.store.lookup(&key).await.unwrap().is_none());
    assert!(!ctx.store.invalidate(&key).await.unwrap());
    ctx.store.record_hit(&key).await.unwrap();
}

#[test_context(FileContext)]
#[tokio::test]
async fn it_should_surface_corrupt_records_as_errors(ctx: &FileContext) {
    let key = CacheKey::for_request(&fixtures::intro("table", "mesa"));
    tokio::fs::write(ctx.dir.join(format!("{}.json", key)), b"{ not json")
        .await
        .unwrap();

    let result = ctx.store.lookup(&key).await;

    assert!(matches!(result, Err(CacheError::Serialization(_))));
    // Stats skip what they cannot read.
    assert_eq!(ctx.store.stats().await.unwrap().count, 0);
}

#[test_context(FileContext)]
#[tokio::test]
async fn it_should_invalidate_and_clear(ctx: &FileContext) {
    let speech_request = fixtures::speech("Hello", "Joanna", "normal");
    let speech_key = CacheKey::for_request(&speech_request);
    let intro_key = CacheKey::for_request(&fixtures::intro("table", "mesa"));

    ctx.store
        .put(&speech_key, &fixtures::speech_artifact(&speech_request, mock_audio_bytes()))
        .await
        .unwrap();
    ctx.store.put(&intro_key, &fixtures::intro_artifact("Olá")).await.unwrap();

    assert!(ctx.store.invalidate(&intro_key).await.unwrap());
    assert!(ctx.store.lookup(&intro_key).await.unwrap().is_none());
    assert_eq!(ctx.store.stats().await.unwrap().count, 1);

    let report = ctx.store.clear().await.unwrap();
    assert_eq!(report.entries_deleted, 2);
    assert!(report.bytes_freed >= mock_audio_bytes().len() as u64);
    assert!(!ctx.dir.join(format!("{}.mp3", speech_key)).exists());
    assert_eq!(ctx.store.stats().await.unwrap().count, 0);
}

#[test_context(FileContext)]
#[tokio::test]
async fn it_should_survive_a_restart(ctx: &FileContext) {
    let request = fixtures::speech("Good night", "Joanna", "fast");
    let spy = SpyBackend::new("polly", Reply::Audio(mock_audio_bytes(), AudioFormat::Mp3));
    let first = build_orchestrator(
        ctx.store.clone(),
        Arc::new(SpyFactory::new().with(Engine::Polly, spy.clone())),
        &[Engine::Polly],
    )
    .generate(request.clone())
    .await;
    assert_live(&first);

    // A second store over the same directory stands in for a new process.
    let reopened = FileCacheStore::new(&ctx.dir).await.unwrap();
    let second = build_orchestrator(
        Arc::new(reopened),
        Arc::new(SpyFactory::new().with(Engine::Polly, spy.clone())),
        &[Engine::Polly],
    )
    .generate(request)
    .await;

    assert_cached(&second);
    assert_eq!(spy.calls(), 1);
    assert_eq!(second.artifact, first.artifact);
}

#[test_context(FileContext)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn it_should_count_every_concurrent_hit(ctx: &FileContext) {
    let key = CacheKey::for_request(&fixtures::intro("table", "mesa"));
    ctx.store.put(&key, &fixtures::intro_artifact("Olá")).await.unwrap();

    let hits = (0..64).map(|_| {
        let store = ctx.store.clone();
        let key = key.clone();
        tokio::spawn(async move { store.record_hit(&key).await })
    });
    for result in join_all(hits).await {
        result.unwrap().unwrap();
    }

    assert_eq!(ctx.store.lookup(&key).await.unwrap().unwrap().hit_count, 64);
}

#[test_context(FileContext)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn it_should_keep_invalidated_entries_hidden_while_hits_race(ctx: &FileContext) {
    let key = CacheKey::for_request(&fixtures::intro("table", "mesa"));

    for round in 0..25 {
        ctx.store.put(&key, &fixtures::intro_artifact("Olá")).await.unwrap();

        let hitters = (0..4).map(|_| {
            let store = ctx.store.clone();
            let key = key.clone();
            tokio::spawn(async move { store.record_hit(&key).await })
        });
        let invalidation = {
            let store = ctx.store.clone();
            let key = key.clone();
            tokio::spawn(async move { store.invalidate(&key).await })
        };
        for result in join_all(hitters).await {
            result.unwrap().unwrap();
        }

        assert!(invalidation.await.unwrap().unwrap(), "round {}", round);
        assert!(ctx.store.lookup(&key).await.unwrap().is_none(), "round {}", round);
    }
}

#[test_context(FileContext)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn it_should_clear_while_entries_are_being_written(ctx: &FileContext) {
    for round in 0..10 {
        let writers = (0..8).map(|i| {
            let store = ctx.store.clone();
            tokio::spawn(async move {
                let key = CacheKey::for_request(&fixtures::intro(&format!("word{}", i), "x"));
                store.put(&key, &fixtures::intro_artifact("Olá")).await
            })
        });
        let clearing = {
            let store = ctx.store.clone();
            tokio::spawn(async move { store.clear().await })
        };

        // A write may lose its temp file to the clear; only the clear must succeed.
        join_all(writers).await;
        assert!(clearing.await.unwrap().is_ok(), "round {}", round);
    }
}
