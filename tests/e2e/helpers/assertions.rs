use lingo_cache::domain::generation::content::{PhrasesContent, SpeechContent};
use lingo_cache::domain::generation::{Content, GenerationResult};

pub fn assert_live(result: &GenerationResult) {
    assert!(!result.degraded, "expected live content, got fallback");
    assert!(!result.from_cache, "expected a fresh generation");
}

pub fn assert_cached(result: &GenerationResult) {
    assert!(result.from_cache, "expected a cache hit");
    assert!(!result.degraded);
}

pub fn assert_degraded(result: &GenerationResult) {
    assert!(result.degraded, "expected fallback content");
    assert!(!result.from_cache, "fallback content is never served from cache");
}

pub fn speech_content(result: &GenerationResult) -> &SpeechContent {
    match &result.artifact.content {
        Content::Speech(speech) => speech,
        other => panic!("expected speech content, got {:?}", other),
    }
}

pub fn phrases_content(result: &GenerationResult) -> &PhrasesContent {
    match &result.artifact.content {
        Content::ContextualPhrases(phrases) => phrases,
        other => panic!("expected phrases, got {:?}", other),
    }
}
