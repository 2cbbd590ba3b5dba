use super::AUDIO_PREFIX;
use lingo_cache::domain::generation::content::{IntroContent, SpeechContent};
use lingo_cache::domain::generation::{Artifact, CacheKey, Capability, Content, GenerationRequest};
use lingo_cache::domain::speech::{audio_address, AudioFormat};
use serde_json::json;

pub fn intro(word: &str, translation: &str) -> GenerationRequest {
    GenerationRequest::builder(Capability::Intro)
        .param("word", word)
        .param("translation", translation)
        .param("room", "sala")
        .param("environment", "casa")
        .build()
}

pub fn phrases(word: &str, translation: &str, num_phrases: i64) -> GenerationRequest {
    GenerationRequest::builder(Capability::ContextualPhrases)
        .param("word", word)
        .param("translation", translation)
        .param("difficulty", 1)
        .param("num_phrases", num_phrases)
        .build()
}

pub fn quiz(word: &str, translation: &str) -> GenerationRequest {
    GenerationRequest::builder(Capability::Quiz)
        .param("word", word)
        .param("translation", translation)
        .param("difficulty", 1)
        .param("num_questions", 3)
        .build()
}

pub fn speech(text: &str, voice: &str, speed: &str) -> GenerationRequest {
    GenerationRequest::builder(Capability::Speech)
        .param("text", text)
        .param("language", "en-US")
        .param("voice", voice)
        .param("speed", speed)
        .build()
}

pub fn game(game_type: &str, word: &str, translation: &str) -> GenerationRequest {
    GenerationRequest::builder(Capability::Game)
        .param("game_type", game_type)
        .param("word", word)
        .param("translation", translation)
        .param("difficulty", "easy")
        .build()
}

/// A well-formed phrase list as the text engine would return it.
pub fn phrases_reply(count: usize) -> String {
    let phrases: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "situation": format!("situation {}", i),
                "situation_pt": format!("situação {}", i),
                "phrase_pt": format!("Frase {}", i),
                "phrase_en": format!("Phrase {}", i),
                "difficulty": 1
            })
        })
        .collect();
    format!("```json\n{}\n```", serde_json::Value::Array(phrases))
}

pub fn quiz_reply() -> String {
    json!({
        "title": "Quiz: table",
        "description": "Teste seus conhecimentos",
        "difficulty": 1,
        "questions": [
            {
                "question_type": "multiple_choice",
                "question_text_pt": "Como se diz 'mesa' em inglês?",
                "options": ["table", "chair", "door", "window"],
                "correct_answer": "table",
                "explanation": "Table significa mesa.",
                "points": 10
            },
            {
                "question_type": "fill_blank",
                "question_text_pt": "Complete: I eat at the ___",
                "correct_answer": "table",
                "points": 20
            }
        ]
    })
    .to_string()
}

pub fn intro_artifact(text: &str) -> Artifact {
    Artifact::document(Content::Intro(IntroContent {
        intro_text: text.to_string(),
    }))
}

pub fn speech_artifact(request: &GenerationRequest, audio: Vec<u8>) -> Artifact {
    let key = CacheKey::for_request(request);
    Artifact::audio(
        SpeechContent {
            audio_url: audio_address(AUDIO_PREFIX, &key, AudioFormat::Mp3),
            text: request.text_or_empty("text"),
            language: "en-US".to_string(),
            voice: request.text("voice").unwrap_or_else(|| "default".to_string()),
            method: "polly".to_string(),
            format: AudioFormat::Mp3,
            file_size: audio.len() as u64,
        },
        audio,
    )
}
