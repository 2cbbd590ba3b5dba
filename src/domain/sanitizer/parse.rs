use crate::domain::generation::content::{
    ChatContent, Content, FunFactsContent, GameContent, IntroContent, PhraseItem, PhrasesContent,
    QuizContent, WordBreakdownContent,
};
use crate::domain::generation::{Capability, GenerationError, GenerationRequest};
use serde_json::Value;

/// Decode stripped backend text into the capability's shape.
///
/// Structural checks only: required fields present, lists non-empty where the
/// artifact would be useless otherwise. Anything else is `MalformedOutput`.
pub fn parse(
    capability: Capability,
    stripped: &str,
    request: &GenerationRequest,
) -> Result<Content, GenerationError> {
    match capability {
        Capability::Intro => parse_intro(stripped),
        Capability::FunFacts => parse_fun_facts(stripped, request),
        Capability::ContextualPhrases => parse_phrases(stripped, request),
        Capability::WordBreakdown => parse_word_breakdown(stripped, request),
        Capability::Quiz => parse_quiz(stripped),
        Capability::Chat => parse_chat(stripped),
        Capability::Game => parse_game(stripped, request),
        Capability::Speech => Err(GenerationError::MalformedOutput(
            "speech output is audio, not text".to_string(),
        )),
    }
}

fn malformed(reason: &str) -> GenerationError {
    GenerationError::MalformedOutput(reason.to_string())
}

fn parse_intro(text: &str) -> Result<Content, GenerationError> {
    let intro_text = text.trim();
    if intro_text.is_empty() {
        return Err(malformed("empty intro"));
    }
    Ok(Content::Intro(IntroContent {
        intro_text: intro_text.to_string(),
    }))
}

fn parse_fun_facts(text: &str, request: &GenerationRequest) -> Result<Content, GenerationError> {
    let num_facts = request.bounded("num_facts", 3, 1, 5) as usize;
    let fun_facts: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .take(num_facts)
        .map(str::to_string)
        .collect();

    if fun_facts.is_empty() {
        return Err(malformed("no facts in output"));
    }
    Ok(Content::FunFacts(FunFactsContent { fun_facts }))
}

fn parse_phrases(text: &str, request: &GenerationRequest) -> Result<Content, GenerationError> {
    let num_phrases = request.bounded("num_phrases", 3, 1, 10) as usize;
    let mut phrases: Vec<PhraseItem> = serde_json::from_str(text)?;
    if phrases.is_empty() {
        return Err(malformed("empty phrase list"));
    }
    phrases.truncate(num_phrases);
    Ok(Content::ContextualPhrases(PhrasesContent { phrases }))
}

fn parse_word_breakdown(
    text: &str,
    request: &GenerationRequest,
) -> Result<Content, GenerationError> {
    let mut breakdown: WordBreakdownContent = serde_json::from_str(text)?;
    if breakdown.syllables.is_empty() {
        return Err(malformed("no syllables in breakdown"));
    }
    if !request.flag("include_ipa").unwrap_or(true) {
        for syllable in &mut breakdown.syllables {
            syllable.ipa = None;
        }
    }
    Ok(Content::WordBreakdown(breakdown))
}

fn parse_quiz(text: &str) -> Result<Content, GenerationError> {
    let quiz: QuizContent = serde_json::from_str(text)?;
    if quiz.questions.is_empty() {
        return Err(malformed("quiz has no questions"));
    }
    Ok(Content::Quiz(quiz.with_computed_score()))
}

fn parse_chat(text: &str) -> Result<Content, GenerationError> {
    let chat: ChatContent = serde_json::from_str(text)?;
    if chat.bot_response.trim().is_empty() {
        return Err(malformed("empty chat response"));
    }
    Ok(Content::Chat(chat))
}

fn parse_game(text: &str, request: &GenerationRequest) -> Result<Content, GenerationError> {
    let mut value: Value = serde_json::from_str(text)?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| malformed("game payload is not an object"))?;

    object.insert(
        "game_type".to_string(),
        Value::String(request.text_or_empty("game_type").to_lowercase()),
    );
    object.insert(
        "difficulty".to_string(),
        Value::String(
            request
                .text("difficulty")
                .unwrap_or_else(|| "easy".to_string()),
        ),
    );

    Ok(Content::Game(GameContent::decode(value)?))
}
