use super::capability::Capability;
use super::content::Content;
use super::request::GenerationRequest;
use serde::{Deserialize, Serialize};
use serde_json::json;

fn default_difficulty() -> i64 {
    1
}

fn default_num_phrases() -> i64 {
    3
}

fn default_num_facts() -> i64 {
    3
}

fn default_num_questions() -> i64 {
    3
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_speed() -> String {
    "normal".to_string()
}

fn default_game_difficulty() -> String {
    "easy".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntroRequest {
    #[serde(alias = "object_word")]
    pub word: String,
    #[serde(alias = "object_translation")]
    pub translation: String,
    pub room: String,
    pub environment: String,
    #[serde(default)]
    pub user_age: Option<i64>,
}

impl From<IntroRequest> for GenerationRequest {
    fn from(dto: IntroRequest) -> Self {
        GenerationRequest::builder(Capability::Intro)
            .param("word", dto.word)
            .param("translation", dto.translation)
            .param("room", dto.room)
            .param("environment", dto.environment)
            .param_opt("user_age", dto.user_age)
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhrasesRequest {
    pub word: String,
    pub translation: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: i64,
    #[serde(default = "default_num_phrases")]
    pub num_phrases: i64,
    #[serde(default)]
    pub situations: Option<Vec<String>>,
}

impl From<PhrasesRequest> for GenerationRequest {
    fn from(dto: PhrasesRequest) -> Self {
        GenerationRequest::builder(Capability::ContextualPhrases)
            .param("word", dto.word)
            .param("translation", dto.translation)
            .param("difficulty", dto.difficulty.clamp(1, 3))
            .param("num_phrases", dto.num_phrases.clamp(1, 10))
            .param_opt("situations", dto.situations)
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordBreakdownRequest {
    pub word: String,
    #[serde(default = "default_true")]
    pub include_ipa: bool,
}

impl From<WordBreakdownRequest> for GenerationRequest {
    fn from(dto: WordBreakdownRequest) -> Self {
        GenerationRequest::builder(Capability::WordBreakdown)
            .param("word", dto.word)
            .param("include_ipa", dto.include_ipa)
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunFactsRequest {
    pub word: String,
    pub translation: String,
    #[serde(default = "default_num_facts")]
    pub num_facts: i64,
}

impl From<FunFactsRequest> for GenerationRequest {
    fn from(dto: FunFactsRequest) -> Self {
        GenerationRequest::builder(Capability::FunFacts)
            .param("word", dto.word)
            .param("translation", dto.translation)
            .param("num_facts", dto.num_facts.clamp(1, 5))
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    #[serde(alias = "object_word")]
    pub word: String,
    #[serde(alias = "object_translation")]
    pub translation: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: i64,
    #[serde(default = "default_num_questions")]
    pub num_questions: i64,
}

impl From<QuizRequest> for GenerationRequest {
    fn from(dto: QuizRequest) -> Self {
        GenerationRequest::builder(Capability::Quiz)
            .param("word", dto.word)
            .param("translation", dto.translation)
            .param("difficulty", dto.difficulty.clamp(1, 3))
            .param("num_questions", dto.num_questions.clamp(2, 10))
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(alias = "object_word")]
    pub word: String,
    #[serde(alias = "object_translation")]
    pub translation: String,
    pub user_message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
    #[serde(default)]
    pub user_age: Option<i64>,
}

impl From<ChatRequest> for GenerationRequest {
    fn from(dto: ChatRequest) -> Self {
        let history: Vec<_> = dto
            .conversation_history
            .into_iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();

        GenerationRequest::builder(Capability::Chat)
            .param("word", dto.word)
            .param("translation", dto.translation)
            .param("user_message", dto.user_message)
            .param("conversation_history", history)
            .param_opt("user_age", dto.user_age)
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRequest {
    pub game_type: String,
    pub word: String,
    pub translation: String,
    #[serde(default = "default_game_difficulty")]
    pub difficulty: String,
}

impl From<GameRequest> for GenerationRequest {
    fn from(dto: GameRequest) -> Self {
        GenerationRequest::builder(Capability::Game)
            .param("game_type", dto.game_type)
            .param("word", dto.word)
            .param("translation", dto.translation)
            .param("difficulty", dto.difficulty)
            .build()
    }
}

/// `word` is accepted as an alias for `text` and wins when both are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default = "default_speed")]
    pub speed: String,
}

impl From<SpeechRequest> for GenerationRequest {
    fn from(dto: SpeechRequest) -> Self {
        let text = dto
            .word
            .filter(|w| !w.trim().is_empty())
            .or(dto.text)
            .unwrap_or_default();

        GenerationRequest::builder(Capability::Speech)
            .param("text", text)
            .param("language", dto.language)
            .param_opt("voice", dto.voice.filter(|v| !v.trim().is_empty()))
            .param("speed", dto.speed)
            .build()
    }
}

/// What callers see: the artifact fields plus cache provenance and timing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResponse {
    #[serde(flatten)]
    pub content: Content,
    pub from_cache: bool,
    pub generation_time_ms: u64,
}
