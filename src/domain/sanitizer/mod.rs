pub mod envelope;
pub mod grammar;
pub mod parse;

pub use envelope::strip_envelope;
pub use grammar::{AgreementForms, AgreementTable, GrammarCorrector};

use crate::domain::generation::content::{Content, IntroContent};
use crate::domain::generation::{Capability, GenerationError, GenerationRequest};

/// Turns raw backend text into a validated artifact. Pure: no I/O, no shared state.
#[derive(Debug, Clone, Default)]
pub struct ResponseSanitizer {
    grammar: GrammarCorrector,
}

impl ResponseSanitizer {
    pub fn new(grammar: GrammarCorrector) -> Self {
        Self { grammar }
    }

    pub fn strip_envelope(&self, raw: &str) -> String {
        strip_envelope(raw)
    }

    pub fn parse(
        &self,
        stripped: &str,
        request: &GenerationRequest,
    ) -> Result<Content, GenerationError> {
        parse::parse(request.capability(), stripped, request)
    }

    /// Post-parse corrections; only intros are touched.
    pub fn correct(&self, content: Content, request: &GenerationRequest) -> Content {
        match content {
            Content::Intro(intro) if request.capability() == Capability::Intro => {
                let translation = request.text_or_empty("translation");
                Content::Intro(IntroContent {
                    intro_text: self.grammar.correct(&intro.intro_text, &translation),
                })
            }
            other => other,
        }
    }

    /// Strip, parse and correct in one step.
    pub fn sanitize(
        &self,
        raw: &str,
        request: &GenerationRequest,
    ) -> Result<Content, GenerationError> {
        let stripped = self.strip_envelope(raw);
        let parsed = self.parse(&stripped, request)?;
        Ok(self.correct(parsed, request))
    }
}
