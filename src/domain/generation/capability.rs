use serde::{Deserialize, Serialize};

/// One kind of generated content the orchestrator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Intro,
    ContextualPhrases,
    WordBreakdown,
    FunFacts,
    Quiz,
    Chat,
    Speech,
    Game,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::Intro,
        Capability::ContextualPhrases,
        Capability::WordBreakdown,
        Capability::FunFacts,
        Capability::Quiz,
        Capability::Chat,
        Capability::Speech,
        Capability::Game,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Intro => "intro",
            Capability::ContextualPhrases => "contextual_phrases",
            Capability::WordBreakdown => "word_breakdown",
            Capability::FunFacts => "fun_facts",
            Capability::Quiz => "quiz",
            Capability::Chat => "chat",
            Capability::Speech => "speech",
            Capability::Game => "game",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }

    /// Capabilities served by the text-generation engine; everything else is audio.
    pub fn is_text(&self) -> bool {
        !matches!(self, Capability::Speech)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
