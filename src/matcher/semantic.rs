use std::fmt;

use serde::Deserialize;

use crate::answer_key::AnswerKey;
use crate::error::LlmError;
use crate::form::form_model::{Confidence, FieldKind, MatchResult};
use crate::matcher::llm::LlmBackend;

/// Loosely-typed reply of a semantic matcher. Every field may be missing;
/// nothing here enters the typed model until `validate` accepts it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SemanticSuggestion {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, alias = "field_type")]
    pub field_kind: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// External collaborator that pairs one form question with an answer from
/// the answer-key text.
pub trait SemanticMatcher {
    fn suggest(&self, question: &str, answer_key_text: &str) -> Result<SemanticSuggestion, LlmError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    Timeout,
    Transport(String),
    Malformed(String),
    MissingField(&'static str),
    UnknownFieldKind(String),
    UnknownConfidence(String),
    AnswerNotInKey(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Timeout => write!(f, "semantic matcher timed out"),
            FallbackReason::Transport(msg) => write!(f, "semantic matcher unavailable: {}", msg),
            FallbackReason::Malformed(msg) => write!(f, "malformed reply: {}", msg),
            FallbackReason::MissingField(field) => write!(f, "reply is missing '{}'", field),
            FallbackReason::UnknownFieldKind(kind) => write!(f, "unknown field kind '{}'", kind),
            FallbackReason::UnknownConfidence(c) => write!(f, "unknown confidence '{}'", c),
            FallbackReason::AnswerNotInKey(a) => write!(f, "answer '{}' is not in the answer key", a),
        }
    }
}

impl From<LlmError> for FallbackReason {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Timeout { .. } => FallbackReason::Timeout,
            LlmError::Malformed(msg) => FallbackReason::Malformed(msg),
            other => FallbackReason::Transport(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SemanticOutcome {
    Matched(MatchResult),
    Fallback(FallbackReason),
}

/// Check a suggestion against the answer key and turn it into a
/// `MatchResult`.
pub fn validate(question: &str, suggestion: SemanticSuggestion, key: &AnswerKey) -> SemanticOutcome {
    let Some(answer) = suggestion.answer.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()) else {
        return SemanticOutcome::Fallback(FallbackReason::MissingField("answer"));
    };
    let Some(raw_kind) = suggestion.field_kind else {
        return SemanticOutcome::Fallback(FallbackReason::MissingField("field_kind"));
    };
    let Some(raw_confidence) = suggestion.confidence else {
        return SemanticOutcome::Fallback(FallbackReason::MissingField("confidence"));
    };

    let Some(field_kind) = FieldKind::parse(&raw_kind) else {
        return SemanticOutcome::Fallback(FallbackReason::UnknownFieldKind(raw_kind));
    };
    let Some(confidence) = Confidence::parse(&raw_confidence) else {
        return SemanticOutcome::Fallback(FallbackReason::UnknownConfidence(raw_confidence));
    };

    if !key.contains_answer(&answer) {
        return SemanticOutcome::Fallback(FallbackReason::AnswerNotInKey(answer));
    }

    SemanticOutcome::Matched(MatchResult {
        question: question.to_string(),
        answer,
        field_kind,
        confidence,
    })
}

// ============================================================================
// LLM-backed matcher
// ============================================================================

pub struct LlmMatcher {
    pub backend: Box<dyn LlmBackend>,
}

impl LlmMatcher {
    pub fn new(backend: Box<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    pub fn build_prompt(question: &str, answer_key_text: &str) -> String {
        format!(
r#"You match Google Form questions to answers from an answer key. Pick the answer-key entry that asks the same thing as the form question and copy its answer EXACTLY.

ANSWER KEY:
{}

FORM QUESTION:
"{}"

FIELD KIND RULES:
- "text": open questions ("What is...": names, emails, dates, free text)
- "radio": closed questions ("Is he/she...", "Does...": Yes/No style)
- "dropdown": selection questions ("Which...", "Select...")

Respond with ONLY a JSON object:
{{"answer":"<exact answer from the answer key>","field_kind":"text|radio|dropdown","confidence":"high|medium|low","reasoning":"<one sentence>"}}"#,
            answer_key_text.trim(),
            question
        )
    }
}

impl SemanticMatcher for LlmMatcher {
    fn suggest(&self, question: &str, answer_key_text: &str) -> Result<SemanticSuggestion, LlmError> {
        let prompt = Self::build_prompt(question, answer_key_text);
        let reply = self.backend.generate(&prompt)?;
        tracing::debug!("LLM raw reply ({}): {}", self.backend.describe(), reply);
        parse_suggestion(&reply)
    }
}

/// Parse a reply that may be wrapped in markdown fences or followed by
/// trailing prose.
pub fn parse_suggestion(reply: &str) -> Result<SemanticSuggestion, LlmError> {
    let object = extract_json_object(reply)
        .ok_or_else(|| LlmError::Malformed(format!("no JSON object in reply: '{}'", reply)))?;
    serde_json::from_str(object)
        .map_err(|e| LlmError::Malformed(format!("{} - raw: '{}'", e, object)))
}

/// First balanced `{...}` in `text`, string literals respected.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
