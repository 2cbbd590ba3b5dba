use super::capability::Capability;
use super::content::GameType;
use super::error::GenerationError;
use super::request::GenerationRequest;
use serde_json::Value;

/// How many past turns of a chat conversation are replayed to the model.
const CHAT_HISTORY_TURNS: usize = 5;

/// Chat-style prompt for the text engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

impl Prompt {
    /// Build the prompt for a text capability.
    ///
    /// Speech has no prompt and unknown game types cannot be prompted; both are
    /// reported as `UnsupportedRequest`.
    pub fn for_request(request: &GenerationRequest) -> Result<Self, GenerationError> {
        match request.capability() {
            Capability::Intro => Ok(intro(request)),
            Capability::ContextualPhrases => Ok(contextual_phrases(request)),
            Capability::WordBreakdown => Ok(word_breakdown(request)),
            Capability::FunFacts => Ok(fun_facts(request)),
            Capability::Quiz => Ok(quiz(request)),
            Capability::Chat => Ok(chat(request)),
            Capability::Game => game(request),
            Capability::Speech => Err(GenerationError::UnsupportedRequest(
                "speech requests are synthesized, not prompted".to_string(),
            )),
        }
    }
}

fn age_tone(age: Option<i64>) -> &'static str {
    match age {
        Some(age) if age < 10 => "muito simples e divertido, como para crianças pequenas",
        Some(age) if age < 14 => "amigável e educativo, como para pré-adolescentes",
        Some(_) => "claro e direto, como para adolescentes",
        None => "amigável e simples",
    }
}

fn intro(request: &GenerationRequest) -> Prompt {
    let word = request.text_or_empty("word");
    let translation = request.text_or_empty("translation");
    let room = request.text_or_empty("room");
    let environment = request.text_or_empty("environment");
    let age = request.integer("user_age");
    let tone = age_tone(age);
    let age_line = age
        .map(|a| format!("IDADE DO ALUNO: {} anos\n", a))
        .unwrap_or_default();

    Prompt {
        system: "Você é um professor de inglês criativo e motivador. Responda APENAS com a introdução, sem textos adicionais.".to_string(),
        user: format!(
            "Você é um professor de inglês {tone} para estudantes brasileiros.\n\n\
             OBJETO: {translation} ({word} em inglês)\n\
             LOCALIZAÇÃO: {room} na {environment}\n\
             {age_line}\n\
             Crie uma introdução conversacional curta em português: cumprimente com 1 emoji, \
             apresente o objeto, explique para que serve em 1-2 frases e termine perguntando \
             se o aluno quer aprender em inglês 🇺🇸.\n\n\
             FORMATO:\n\
             Olá! [emoji] [Esse/Essa] é [ARTIGO] [OBJETO EM MAIÚSCULO], [descrição breve]...\n\n\
             REGRAS:\n\
             - Use o artigo correto: \"Esse é o sofá\", \"Essa é a mesa\"\n\
             - Máximo 4 linhas, português brasileiro natural\n\
             - Sem explicações extras"
        ),
        temperature: 0.7,
    }
}

fn complexity_guide(difficulty: i64) -> &'static str {
    match difficulty {
        1 => "Frases simples e curtas (5-7 palavras). Use: 'I', 'you', present simple",
        2 => "Frases médias (8-12 palavras). Use: present continuous, 'can', 'have to'",
        _ => "Frases completas (13-18 palavras). Use: present perfect, conditionals, relative clauses",
    }
}

const DEFAULT_SITUATIONS: [&str; 3] = [
    "pedindo permissão (asking permission)",
    "descrevendo ação (describing action)",
    "falando sobre rotina (talking about routine)",
];

fn contextual_phrases(request: &GenerationRequest) -> Prompt {
    let word = request.text_or_empty("word");
    let translation = request.text_or_empty("translation");
    let difficulty = request.bounded("difficulty", 1, 1, 3);
    let num_phrases = request.bounded("num_phrases", 3, 1, 10) as usize;

    let mut situations: Vec<String> = request
        .list("situations")
        .iter()
        .filter_map(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if situations.is_empty() {
        situations = DEFAULT_SITUATIONS.iter().map(|s| s.to_string()).collect();
    }
    let situations = situations
        .iter()
        .take(num_phrases)
        .map(|s| format!("- {}", s))
        .collect::<Vec<_>>()
        .join("\n");

    Prompt {
        system: "Você é um especialista em ensino de inglês. Responda APENAS com o JSON válido, sem explicações.".to_string(),
        user: format!(
            "Crie {num_phrases} exemplos de frases usando a palavra \"{word}\" em inglês.\n\n\
             PALAVRA: {word}\n\
             TRADUÇÃO: {translation}\n\
             NÍVEL: {difficulty}/3\n\
             COMPLEXIDADE: {guide}\n\n\
             SITUAÇÕES DESEJADAS:\n{situations}\n\n\
             FORMATO JSON (responda APENAS com o JSON):\n\
             [{{\"situation\": \"asking_permission\", \"situation_pt\": \"Pedindo Permissão\", \
             \"phrase_pt\": \"...\", \"phrase_en\": \"...\", \"difficulty\": {difficulty}}}]",
            guide = complexity_guide(difficulty),
        ),
        temperature: 0.5,
    }
}

fn word_breakdown(request: &GenerationRequest) -> Prompt {
    let word = request.text_or_empty("word");

    Prompt {
        system: "Você é um linguista especializado em fonética. Responda APENAS com JSON válido."
            .to_string(),
        user: format!(
            "Analise a palavra em inglês \"{word}\": transcrição IPA completa, divisão silábica, \
             IPA de cada sílaba e uma explicação simples de cada sílaba para brasileiros.\n\n\
             FORMATO JSON (responda APENAS com o JSON):\n\
             {{\"word\": \"{word}\", \"ipa\": \"/.../\", \"syllables\": \
             [{{\"text\": \"...\", \"ipa\": \"/.../\", \"explanation_pt\": \"...\"}}]}}"
        ),
        temperature: 0.3,
    }
}

fn fun_facts(request: &GenerationRequest) -> Prompt {
    let word = request.text_or_empty("word");
    let translation = request.text_or_empty("translation");
    let num_facts = request.bounded("num_facts", 3, 1, 5);

    Prompt {
        system: "Você é um educador criativo. Forneça curiosidades verdadeiras e verificáveis."
            .to_string(),
        user: format!(
            "Crie {num_facts} curiosidades interessantes sobre \"{word}\" ({translation} em português): \
             etimologia, história, uso cultural, expressões idiomáticas ou fatos surpreendentes.\n\n\
             FORMATO: {num_facts} curiosidades, uma por linha, começando com um emoji.\n\
             Linguagem simples, em português brasileiro, no máximo 2 linhas cada."
        ),
        temperature: 0.7,
    }
}

fn quiz(request: &GenerationRequest) -> Prompt {
    let word = request.text_or_empty("word");
    let translation = request.text_or_empty("translation");
    let difficulty = request.bounded("difficulty", 1, 1, 3);
    let num_questions = request.bounded("num_questions", 3, 2, 10);

    Prompt {
        system: "Você é um criador de conteúdo educativo. Responda APENAS com JSON válido."
            .to_string(),
        user: format!(
            "Crie um quiz de {num_questions} perguntas sobre \"{word}\" ({translation}).\n\
             NÍVEL: {difficulty}/3. Tipos: múltipla escolha (4 opções) e completar frase.\n\n\
             FORMATO JSON:\n\
             {{\"title\": \"Quiz sobre {translation}\", \"description\": \"...\", \"difficulty\": {difficulty}, \
             \"questions\": [{{\"question_type\": \"multiple_choice\", \"question_text_pt\": \"...\", \
             \"options\": [\"...\"], \"correct_answer\": \"...\", \"explanation\": \"...\", \"points\": 10}}]}}"
        ),
        temperature: 0.6,
    }
}

fn chat(request: &GenerationRequest) -> Prompt {
    let word = request.text_or_empty("word");
    let translation = request.text_or_empty("translation");
    let user_message = request.text_or_empty("user_message");
    let age = request.integer("user_age");
    let tone = match age {
        Some(age) if age < 10 => "muito simples, divertido e encorajador",
        Some(age) if age < 14 => "amigável, claro e motivador",
        Some(_) => "direto, informativo e respeitoso",
        None => "amigável e educativo",
    };
    let age_label = age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "não especificada".to_string());

    let history = request.list("conversation_history");
    let history_text = if history.is_empty() {
        String::new()
    } else {
        let turns = history
            .iter()
            .skip(history.len().saturating_sub(CHAT_HISTORY_TURNS))
            .map(|turn| {
                let role = match turn.get("role").and_then(Value::as_str) {
                    Some("user") => "Aluno",
                    _ => "Professor",
                };
                let content = turn.get("content").and_then(Value::as_str).unwrap_or("");
                format!("{}: {}", role, content)
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("\nHISTÓRICO DA CONVERSA:\n{}\n", turns)
    };

    Prompt {
        system: "Você é um professor de inglês interativo e motivador. Responda APENAS com JSON válido, sem explicações adicionais.".to_string(),
        user: format!(
            "Você é um professor de inglês {tone}, especializado em ensinar para brasileiros.\n\n\
             CONTEXTO:\n\
             - Objeto em discussão: {translation} ({word} em inglês)\n\
             - Idade do aluno: {age_label}\n\
             {history_text}\n\
             PERGUNTA DO ALUNO:\n\"{user_message}\"\n\n\
             Responda de forma clara e educativa. Se o aluno perguntar como dizer algo em inglês, \
             forneça 2-3 exemplos completos.\n\n\
             FORMATO DA RESPOSTA (JSON):\n\
             {{\"bot_response\": \"...\", \"examples\": [{{\"phrase_pt\": \"...\", \"phrase_en\": \"...\"}}], \
             \"suggestions\": [\"...\", \"...\", \"...\"]}}"
        ),
        temperature: 0.7,
    }
}

fn game(request: &GenerationRequest) -> Result<Prompt, GenerationError> {
    let word = request.text_or_empty("word");
    let translation = request.text_or_empty("translation");
    let raw_type = request.text_or_empty("game_type");
    let game_type = GameType::parse(&raw_type).ok_or_else(|| {
        GenerationError::UnsupportedRequest(format!("unknown game type '{}'", raw_type))
    })?;

    let body = match game_type {
        GameType::GuessWord => format!(
            "Crie um jogo estilo TERMO/WORDLE com uma palavra de EXATAMENTE 5 LETRAS relacionada \
             a \"{translation}\" ({word}), não a própria palavra.\n\n\
             FORMATO JSON:\n\
             {{\"word_to_guess\": \"chair\", \"translation\": \"cadeira\", \"hint\": \"...\", \
             \"max_attempts\": 6, \"category\": \"Relacionado a {translation}\"}}"
        ),
        GameType::Anagram => format!(
            "Crie um jogo de anagrama com uma palavra de 5-8 letras relacionada a \"{translation}\" ({word}).\n\n\
             FORMATO JSON:\n\
             {{\"word\": \"cushion\", \"translation\": \"almofada\", \"scrambled\": \"iucohsn\", \
             \"hint\": \"...\", \"category\": \"Relacionado a {translation}\"}}"
        ),
        GameType::QuickQuiz => format!(
            "Crie 5 perguntas rápidas sobre vocabulário relacionado a \"{translation}\" ({word}), \
             perguntas em português e respostas em inglês, 4 opções cada.\n\n\
             FORMATO JSON:\n\
             {{\"questions\": [{{\"question\": \"...\", \"options\": [\"...\"], \"correct_answer\": \"...\", \
             \"translation\": \"...\"}}], \"time_per_question\": 10, \
             \"category\": \"Vocabulário relacionado a {translation}\"}}"
        ),
        GameType::MissingLetters => format!(
            "Crie um jogo de completar letras com uma palavra de 5-9 letras relacionada a \
             \"{translation}\" ({word}); remova 3-4 letras usando _.\n\n\
             FORMATO JSON:\n\
             {{\"word\": \"cushion\", \"translation\": \"almofada\", \"pattern\": \"c_sh__n\", \
             \"hint\": \"...\", \"missing_letters\": [\"u\", \"i\", \"o\"], \
             \"category\": \"Relacionado a {translation}\"}}"
        ),
    };

    Ok(Prompt {
        system: "Você é um criador de jogos educativos. Responda APENAS com JSON válido. Use vocabulário RELACIONADO ao objeto, não apenas o objeto em si!".to_string(),
        user: format!("{}\n\nResponda APENAS com o JSON, sem markdown.", body),
        temperature: 0.8,
    })
}
