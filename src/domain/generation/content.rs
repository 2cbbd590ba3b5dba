use super::capability::Capability;
use crate::domain::speech::AudioFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntroContent {
    pub intro_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseItem {
    pub situation: String,
    pub situation_pt: String,
    pub phrase_pt: String,
    pub phrase_en: String,
    pub difficulty: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhrasesContent {
    pub phrases: Vec<PhraseItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Syllable {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation_pt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordBreakdownContent {
    pub word: String,
    pub ipa: String,
    pub syllables: Vec<Syllable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunFactsContent {
    pub fun_facts: Vec<String>,
}

fn default_points() -> u32 {
    10
}

fn default_difficulty() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question_type: String,
    pub question_text_pt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default = "default_points")]
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizContent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub max_score: u64,
}

impl QuizContent {
    pub fn with_computed_score(mut self) -> Self {
        self.max_score = self.questions.iter().map(|q| u64::from(q.points)).sum();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamplePhrase {
    pub phrase_pt: String,
    pub phrase_en: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContent {
    pub bot_response: String,
    #[serde(default)]
    pub examples: Vec<ExamplePhrase>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default = "default_true")]
    pub audio_available: bool,
}

/// Game variants the text engine knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    GuessWord,
    Anagram,
    QuickQuiz,
    MissingLetters,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::GuessWord => "guess_word",
            GameType::Anagram => "anagram",
            GameType::QuickQuiz => "quick_quiz",
            GameType::MissingLetters => "missing_letters",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "guess_word" => Some(GameType::GuessWord),
            "anagram" => Some(GameType::Anagram),
            "quick_quiz" => Some(GameType::QuickQuiz),
            "missing_letters" => Some(GameType::MissingLetters),
            _ => None,
        }
    }
}

fn default_attempts() -> u32 {
    6
}

fn default_time_per_question() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessWordBoard {
    pub word_to_guess: String,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
    #[serde(default = "default_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnagramBoard {
    pub word: String,
    pub translation: String,
    pub scrambled: String,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickQuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub translation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickQuizBoard {
    pub questions: Vec<QuickQuizQuestion>,
    #[serde(default = "default_time_per_question")]
    pub time_per_question: u32,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingLettersBoard {
    pub word: String,
    pub translation: String,
    pub pattern: String,
    #[serde(default)]
    pub hint: String,
    pub missing_letters: Vec<String>,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GameBoard {
    GuessWord(GuessWordBoard),
    Anagram(AnagramBoard),
    QuickQuiz(QuickQuizBoard),
    MissingLetters(MissingLettersBoard),
    Unsupported { error: String },
}

impl GameBoard {
    /// Decode the board for a known game type; anything else is the unsupported shape.
    pub fn decode(game_type: &str, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match GameType::parse(game_type) {
            Some(GameType::GuessWord) => GameBoard::GuessWord(serde_json::from_value(value)?),
            Some(GameType::Anagram) => GameBoard::Anagram(serde_json::from_value(value)?),
            Some(GameType::QuickQuiz) => GameBoard::QuickQuiz(serde_json::from_value(value)?),
            Some(GameType::MissingLetters) => {
                GameBoard::MissingLetters(serde_json::from_value(value)?)
            }
            None => GameBoard::Unsupported {
                error: value
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("Game type not supported")
                    .to_string(),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameContent {
    pub game_type: String,
    pub difficulty: String,
    #[serde(flatten)]
    pub board: GameBoard,
}

impl GameContent {
    pub fn decode(value: Value) -> Result<Self, serde_json::Error> {
        let game_type = value
            .get("game_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let difficulty = value
            .get("difficulty")
            .and_then(Value::as_str)
            .unwrap_or("easy")
            .to_string();
        let board = GameBoard::decode(&game_type, value)?;
        Ok(Self {
            game_type,
            difficulty,
            board,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechContent {
    pub audio_url: String,
    pub text: String,
    pub language: String,
    pub voice: String,
    /// Engine that produced the audio, `fallback` for the silent clip.
    pub method: String,
    pub format: AudioFormat,
    pub file_size: u64,
}

/// Structured payload of an artifact. Serializes as the bare capability fields so it can
/// be flattened into a response; decoding needs the capability to pick the shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    Intro(IntroContent),
    ContextualPhrases(PhrasesContent),
    WordBreakdown(WordBreakdownContent),
    FunFacts(FunFactsContent),
    Quiz(QuizContent),
    Chat(ChatContent),
    Game(GameContent),
    Speech(SpeechContent),
}

impl Content {
    pub fn capability(&self) -> Capability {
        match self {
            Content::Intro(_) => Capability::Intro,
            Content::ContextualPhrases(_) => Capability::ContextualPhrases,
            Content::WordBreakdown(_) => Capability::WordBreakdown,
            Content::FunFacts(_) => Capability::FunFacts,
            Content::Quiz(_) => Capability::Quiz,
            Content::Chat(_) => Capability::Chat,
            Content::Game(_) => Capability::Game,
            Content::Speech(_) => Capability::Speech,
        }
    }

    pub fn decode(capability: Capability, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match capability {
            Capability::Intro => Content::Intro(serde_json::from_value(value)?),
            Capability::ContextualPhrases => {
                Content::ContextualPhrases(serde_json::from_value(value)?)
            }
            Capability::WordBreakdown => Content::WordBreakdown(serde_json::from_value(value)?),
            Capability::FunFacts => Content::FunFacts(serde_json::from_value(value)?),
            Capability::Quiz => Content::Quiz(serde_json::from_value(value)?),
            Capability::Chat => Content::Chat(serde_json::from_value(value)?),
            Capability::Game => Content::Game(GameContent::decode(value)?),
            Capability::Speech => Content::Speech(serde_json::from_value(value)?),
        })
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// What gets cached: the structured content plus, for speech, the audio bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub content: Content,
    pub audio: Option<Vec<u8>>,
}

impl Artifact {
    pub fn document(content: Content) -> Self {
        Self {
            content,
            audio: None,
        }
    }

    pub fn audio(content: SpeechContent, bytes: Vec<u8>) -> Self {
        Self {
            content: Content::Speech(content),
            audio: Some(bytes),
        }
    }

    pub fn capability(&self) -> Capability {
        self.content.capability()
    }

    pub fn size_bytes(&self) -> u64 {
        let content = serde_json::to_vec(&self.content)
            .map(|v| v.len())
            .unwrap_or(0);
        (content + self.audio.as_ref().map(Vec::len).unwrap_or(0)) as u64
    }
}
