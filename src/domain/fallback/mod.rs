pub mod speech;

use crate::domain::generation::content::{
    AnagramBoard, Artifact, ChatContent, Content, ExamplePhrase, FunFactsContent, GameBoard,
    GameContent, GameType, GuessWordBoard, IntroContent, MissingLettersBoard, PhraseItem,
    PhrasesContent, QuickQuizBoard, QuickQuizQuestion, QuizContent, QuizQuestion, SpeechContent,
    Syllable, WordBreakdownContent,
};
use crate::domain::generation::{Capability, GenerationRequest};
use crate::domain::sanitizer::AgreementTable;
use crate::domain::speech::AudioFormat;

/// Canned, backend-free content for every capability.
///
/// Every function here is total: whatever parameters arrive, a structurally valid
/// artifact comes out.
#[derive(Debug, Clone, Default)]
pub struct FallbackLibrary {
    agreement: AgreementTable,
}

impl FallbackLibrary {
    pub fn new(agreement: AgreementTable) -> Self {
        Self { agreement }
    }

    pub fn fallback(&self, request: &GenerationRequest) -> Artifact {
        match request.capability() {
            Capability::Intro => Artifact::document(self.intro(request)),
            Capability::ContextualPhrases => Artifact::document(phrases(request)),
            Capability::WordBreakdown => Artifact::document(word_breakdown(request)),
            Capability::FunFacts => Artifact::document(fun_facts(request)),
            Capability::Quiz => Artifact::document(quiz(request)),
            Capability::Chat => Artifact::document(chat(request)),
            Capability::Game => Artifact::document(game(request)),
            Capability::Speech => speech_clip(request),
        }
    }

    fn intro(&self, request: &GenerationRequest) -> Content {
        let translation = request.text_or_empty("translation");
        let room = request.text_or_empty("room");
        let (forms, _) = self.agreement.forms_for(&translation);

        Content::Intro(IntroContent {
            intro_text: format!(
                "Olá! 📚 {} {} {}! Usamos no nosso dia a dia aqui na {}. Quer aprender como falar isso em inglês? 🇺🇸",
                forms.demonstrative,
                forms.article,
                translation.to_uppercase(),
                room
            ),
        })
    }
}

fn phrases(request: &GenerationRequest) -> Content {
    let word = request.text_or_empty("word");
    let translation = request.text_or_empty("translation");
    let difficulty = request.bounded("difficulty", 1, 1, 3) as u8;
    let num_phrases = request.bounded("num_phrases", 3, 1, 10) as usize;

    let table = [
        PhraseItem {
            situation: "asking_permission".to_string(),
            situation_pt: "Pedindo Permissão".to_string(),
            phrase_pt: format!("Posso usar o {}?", translation),
            phrase_en: format!("Can I use the {}?", word),
            difficulty,
        },
        PhraseItem {
            situation: "describing_action".to_string(),
            situation_pt: "Descrevendo Ação".to_string(),
            phrase_pt: format!("Eu estou usando o {}", translation),
            phrase_en: format!("I am using the {}", word),
            difficulty,
        },
        PhraseItem {
            situation: "talking_routine".to_string(),
            situation_pt: "Falando sobre Rotina".to_string(),
            phrase_pt: format!("Eu uso o {} todo dia", translation),
            phrase_en: format!("I use the {} every day", word),
            difficulty,
        },
    ];

    Content::ContextualPhrases(PhrasesContent {
        phrases: table.iter().cycle().take(num_phrases).cloned().collect(),
    })
}

fn word_breakdown(request: &GenerationRequest) -> Content {
    let word = request.text_or_empty("word");
    let include_ipa = request.flag("include_ipa").unwrap_or(true);
    let ipa = format!("/{}/", word);

    Content::WordBreakdown(WordBreakdownContent {
        word: word.clone(),
        ipa: ipa.clone(),
        syllables: vec![Syllable {
            text: word.clone(),
            ipa: include_ipa.then_some(ipa),
            explanation_pt: Some(format!("Pronuncie como está escrito: {}", word)),
        }],
    })
}

fn fun_facts(request: &GenerationRequest) -> Content {
    let word = request.text_or_empty("word");
    let translation = request.text_or_empty("translation");
    let num_facts = request.bounded("num_facts", 3, 1, 5) as usize;

    let facts = [
        format!("📚 '{}' é uma palavra comum em inglês.", word),
        format!("🌍 Pessoas em todo mundo usam '{}'.", translation),
        format!("🎓 Aprender '{}' ajuda no seu inglês!", word),
    ];

    Content::FunFacts(FunFactsContent {
        fun_facts: facts.into_iter().take(num_facts).collect(),
    })
}

fn quiz(request: &GenerationRequest) -> Content {
    let word = request.text_or_empty("word");
    let translation = request.text_or_empty("translation");
    let difficulty = request.bounded("difficulty", 1, 1, 3) as u8;

    let quiz = QuizContent {
        title: format!("Quiz sobre {}", translation),
        description: Some(format!("Teste seus conhecimentos sobre '{}'!", word)),
        difficulty,
        questions: vec![QuizQuestion {
            question_type: "multiple_choice".to_string(),
            question_text_pt: format!("Como se diz '{}' em inglês?", translation),
            options: Some(vec![
                word.clone(),
                "outro1".to_string(),
                "outro2".to_string(),
                "outro3".to_string(),
            ]),
            correct_answer: word.clone(),
            explanation: Some(format!("A resposta correta é '{}'!", word)),
            points: 10,
        }],
        max_score: 0,
    };

    Content::Quiz(quiz.with_computed_score())
}

fn chat(request: &GenerationRequest) -> Content {
    let word = request.text_or_empty("word");
    let translation = request.text_or_empty("translation");
    let message = request.text_or_empty("user_message").to_lowercase();
    let suggestions =
        |items: [&str; 3]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };

    let asks_for_examples = ["frase", "exemplo", "usar"]
        .iter()
        .any(|k| message.contains(k));
    let asks_for_pronunciation = ["pronuncia", "como fala", "pronúncia"]
        .iter()
        .any(|k| message.contains(k));

    let content = if asks_for_examples {
        ChatContent {
            bot_response: format!(
                "Ótima pergunta! Aqui estão alguns exemplos de como usar '{}' em frases:",
                translation
            ),
            examples: vec![
                ExamplePhrase {
                    phrase_pt: format!("Eu uso o {}", translation),
                    phrase_en: format!("I use the {}", word),
                },
                ExamplePhrase {
                    phrase_pt: format!("O {} é útil", translation),
                    phrase_en: format!("The {} is useful", word),
                },
            ],
            suggestions: suggestions([
                "Como pronunciar essa palavra?",
                "Me conte uma curiosidade!",
                "Tem outras palavras parecidas?",
            ]),
            audio_available: true,
        }
    } else if asks_for_pronunciation {
        ChatContent {
            bot_response: format!(
                "'{}' se pronuncia de forma bem parecida com está escrito! Clique no botão de áudio para ouvir a pronúncia correta. 🔊",
                word
            ),
            examples: Vec::new(),
            suggestions: suggestions([
                "Como usar em uma frase?",
                "Qual a diferença entre palavras similares?",
                "Me conte uma curiosidade!",
            ]),
            audio_available: true,
        }
    } else {
        ChatContent {
            bot_response: format!(
                "Interessante! '{}' ({}) é uma palavra muito útil em inglês. O que mais você gostaria de saber sobre ela?",
                word, translation
            ),
            examples: Vec::new(),
            suggestions: suggestions([
                "Como usar em uma frase?",
                "Como se pronuncia?",
                "Me conte uma curiosidade!",
            ]),
            audio_available: true,
        }
    };

    Content::Chat(content)
}

/// (english, portuguese) vocabulary related to a few known objects.
fn related_word(word: &str) -> (&'static str, &'static str) {
    match word.trim().to_lowercase().as_str() {
        "sofa" => ("cushion", "almofada"),
        "table" => ("chair", "cadeira"),
        "tv" => ("remote", "controle"),
        _ => ("part", "parte"),
    }
}

fn game(request: &GenerationRequest) -> Content {
    let word = request.text_or_empty("word");
    let translation = request.text_or_empty("translation");
    let raw_type = request.text_or_empty("game_type");
    let difficulty = request
        .text("difficulty")
        .unwrap_or_else(|| "easy".to_string());
    let (related_en, related_pt) = related_word(&word);
    let category = format!("Relacionado a {}", translation);

    let Some(game_type) = GameType::parse(&raw_type) else {
        return Content::Game(GameContent {
            game_type: raw_type,
            difficulty,
            board: GameBoard::Unsupported {
                error: "Game type not supported".to_string(),
            },
        });
    };

    let board = match game_type {
        GameType::GuessWord => GameBoard::GuessWord(GuessWordBoard {
            word_to_guess: related_en.to_string(),
            translation: related_pt.to_string(),
            hint: None,
            hints: vec![
                format!("É algo relacionado ao {}", translation),
                format!("Você encontra perto ou em um {}", translation),
                format!("Em português chamamos de {}", related_pt),
            ],
            max_attempts: 3,
            category,
        }),
        GameType::Anagram => GameBoard::Anagram(AnagramBoard {
            word: related_en.to_string(),
            translation: related_pt.to_string(),
            scrambled: related_en.chars().rev().collect(),
            hint: format!("Relacionado ao {}", translation),
            category,
        }),
        GameType::QuickQuiz => GameBoard::QuickQuiz(QuickQuizBoard {
            questions: vec![QuickQuizQuestion {
                question: format!("Como se diz {} em inglês?", translation),
                options: vec![
                    word.clone(),
                    "other1".to_string(),
                    "other2".to_string(),
                    "other3".to_string(),
                ],
                correct_answer: word.clone(),
                translation: translation.clone(),
            }],
            time_per_question: 10,
            category: format!("Vocabulário de {}", translation),
        }),
        GameType::MissingLetters => {
            let chars: Vec<char> = related_en.chars().collect();
            let inner = &chars[1..chars.len() - 1];
            GameBoard::MissingLetters(MissingLettersBoard {
                word: related_en.to_string(),
                translation: related_pt.to_string(),
                pattern: format!(
                    "{}{}{}",
                    chars[0],
                    "_".repeat(inner.len()),
                    chars[chars.len() - 1]
                ),
                hint: format!("Relacionado ao {}", translation),
                missing_letters: inner.iter().map(|c| c.to_string()).collect(),
                category,
            })
        }
    };

    Content::Game(GameContent {
        game_type: game_type.as_str().to_string(),
        difficulty,
        board,
    })
}

fn speech_clip(request: &GenerationRequest) -> Artifact {
    let audio = speech::silent_wav();
    let content = SpeechContent {
        audio_url: speech::data_url(AudioFormat::Wav.mime_type(), &audio),
        text: request.text_or_empty("text"),
        language: request
            .text("language")
            .unwrap_or_else(|| "en-US".to_string()),
        voice: request
            .text("voice")
            .unwrap_or_else(|| "default".to_string()),
        method: "fallback".to_string(),
        format: AudioFormat::Wav,
        file_size: audio.len() as u64,
    };
    Artifact::audio(content, audio)
}
