use crate::error::{AppError, AppResult};
use regex::{NoExpand, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound on correction passes; text that keeps changing is left untouched.
const MAX_PASSES: usize = 4;

/// Article and demonstrative used with one grammatical gender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementForms {
    pub article: String,
    pub demonstrative: String,
}

/// Agreement rules keyed on the gender of the target word, which is inferred from its ending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementTable {
    pub feminine_suffixes: Vec<String>,
    pub feminine: AgreementForms,
    pub masculine: AgreementForms,
    /// Indefinite articles that are replaced by the definite one before the word.
    pub indefinite_articles: Vec<String>,
}

impl Default for AgreementTable {
    /// Brazilian Portuguese demonstrative/article agreement.
    fn default() -> Self {
        Self {
            feminine_suffixes: vec!["a".to_string()],
            feminine: AgreementForms {
                article: "a".to_string(),
                demonstrative: "Essa é".to_string(),
            },
            masculine: AgreementForms {
                article: "o".to_string(),
                demonstrative: "Esse é".to_string(),
            },
            indefinite_articles: vec!["um".to_string(), "uma".to_string()],
        }
    }
}

impl AgreementTable {
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("invalid grammar rules in {}: {}", path.display(), e))
        })
    }

    pub fn is_feminine(&self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        self.feminine_suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && word.ends_with(&suffix.to_lowercase()))
    }

    /// Forms that agree with `word`, and the opposite gender's forms.
    pub fn forms_for(&self, word: &str) -> (&AgreementForms, &AgreementForms) {
        if self.is_feminine(word) {
            (&self.feminine, &self.masculine)
        } else {
            (&self.masculine, &self.feminine)
        }
    }
}

/// Rewrites mis-agreed demonstratives and articles in front of the upper-cased target word.
#[derive(Debug, Clone, Default)]
pub struct GrammarCorrector {
    table: AgreementTable,
}

impl GrammarCorrector {
    pub fn new(table: AgreementTable) -> Self {
        Self { table }
    }

    pub fn correct(&self, text: &str, word: &str) -> String {
        let word = word.trim();
        if word.is_empty() || text.is_empty() {
            return text.to_string();
        }

        let rules = match self.rules(word) {
            Ok(rules) => rules,
            Err(e) => {
                tracing::warn!(word = word, error = %e, "Could not build grammar rules");
                return text.to_string();
            }
        };

        let mut corrected = text.to_string();
        let mut settled = false;
        for _ in 0..MAX_PASSES {
            let next = rules.iter().fold(corrected.clone(), |acc, (pattern, replacement)| {
                pattern
                    .replace_all(&acc, NoExpand(replacement.as_str()))
                    .into_owned()
            });
            if next == corrected {
                settled = true;
                break;
            }
            corrected = next;
        }

        if !settled {
            tracing::warn!(word = word, "Grammar correction did not settle, keeping original text");
            return text.to_string();
        }

        if corrected != text {
            let (forms, _) = self.table.forms_for(word);
            tracing::info!(word = word, article = %forms.article, "Grammar corrected");
            tracing::debug!(before = %preview(text), after = %preview(&corrected), "Grammar correction");
        }

        corrected
    }

    /// Ordered (pattern, replacement) pairs for one word.
    fn rules(&self, word: &str) -> Result<Vec<(regex::Regex, String)>, regex::Error> {
        let (right, wrong) = self.table.forms_for(word);
        let upper = word.to_uppercase();
        let target = regex::escape(&upper);
        let replacement = format!("{} {} {}", right.demonstrative, right.article, upper);

        let wrong_dem = phrase_pattern(&wrong.demonstrative);
        let any_dem = format!(
            "(?:{}|{})",
            phrase_pattern(&self.table.feminine.demonstrative),
            phrase_pattern(&self.table.masculine.demonstrative)
        );
        let right_art = regex::escape(&right.article);
        let indefinite = self
            .table
            .indefinite_articles
            .iter()
            .map(|a| regex::escape(a))
            .collect::<Vec<_>>()
            .join("|");

        let mut patterns = vec![format!(r"{}\s+{}\s+{}", wrong_dem, right_art, target)];
        if !indefinite.is_empty() {
            patterns.push(format!(r"{}\s+(?:{})\s+{}", wrong_dem, indefinite, target));
            patterns.push(format!(r"{}\s+(?:{})\s+{}", any_dem, indefinite, target));
        }
        patterns.push(format!(r"{}\s+{}", wrong_dem, target));
        patterns.push(format!(r"{}\s+{}", any_dem, target));

        patterns
            .into_iter()
            .map(|p| {
                RegexBuilder::new(&p)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (re, replacement.clone()))
            })
            .collect()
    }
}

/// Words of a multi-word form, matched with flexible whitespace.
fn phrase_pattern(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}
