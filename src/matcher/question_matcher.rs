use serde::{Deserialize, Serialize};

use crate::answer_key::AnswerKey;
use crate::form::form_model::MatchResult;
use crate::matcher::deterministic::{DEFAULT_MAX_QUESTION_TOKENS, match_by_keywords};
use crate::matcher::semantic::{SemanticMatcher, SemanticOutcome, validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    Semantic,
    Deterministic,
}

impl MatchStrategy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "semantic" | "llm" => Some(MatchStrategy::Semantic),
            "deterministic" | "keyword" | "keywords" => Some(MatchStrategy::Deterministic),
            _ => None,
        }
    }
}

/// A form question nothing in the answer key could be paired with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unmatched {
    pub question: String,
}

/// Pairs form questions with answer-key entries.
///
/// The semantic strategy delegates to a `SemanticMatcher`; whatever goes
/// wrong there (transport, timeout, bad reply, answer not in the key) drops
/// to keyword overlap, which always reports LOW confidence.
pub struct QuestionMatcher {
    strategy: MatchStrategy,
    semantic: Option<Box<dyn SemanticMatcher>>,
    max_question_tokens: usize,
}

impl QuestionMatcher {
    pub fn deterministic() -> Self {
        Self {
            strategy: MatchStrategy::Deterministic,
            semantic: None,
            max_question_tokens: DEFAULT_MAX_QUESTION_TOKENS,
        }
    }

    pub fn semantic(matcher: Box<dyn SemanticMatcher>) -> Self {
        Self {
            strategy: MatchStrategy::Semantic,
            semantic: Some(matcher),
            max_question_tokens: DEFAULT_MAX_QUESTION_TOKENS,
        }
    }

    pub fn with_max_question_tokens(mut self, n: usize) -> Self {
        self.max_question_tokens = n.max(1);
        self
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn match_question(&self, question: &str, key: &AnswerKey) -> Result<MatchResult, Unmatched> {
        if let (MatchStrategy::Semantic, Some(semantic)) = (self.strategy, &self.semantic) {
            let outcome = match semantic.suggest(question, key.text()) {
                Ok(suggestion) => validate(question, suggestion, key),
                Err(e) => SemanticOutcome::Fallback(e.into()),
            };

            match outcome {
                SemanticOutcome::Matched(result) => {
                    tracing::info!(
                        "Matched '{}' -> '{}' ({:?}, {:?})",
                        question,
                        result.answer,
                        result.field_kind,
                        result.confidence
                    );
                    return Ok(result);
                }
                SemanticOutcome::Fallback(reason) => {
                    tracing::warn!("Semantic match for '{}' fell back to keywords: {}", question, reason);
                }
            }
        }

        match match_by_keywords(question, key, self.max_question_tokens) {
            Some(result) => {
                tracing::info!(
                    "Keyword match '{}' -> '{}' ({:?}, low confidence)",
                    question,
                    result.answer,
                    result.field_kind
                );
                Ok(result)
            }
            None => {
                tracing::warn!("No answer-key entry shares a keyword with '{}'", question);
                Err(Unmatched {
                    question: question.to_string(),
                })
            }
        }
    }

    /// Match every question, keeping page order. Unmatched questions are
    /// returned alongside, never dropped.
    pub fn match_all(&self, questions: &[String], key: &AnswerKey) -> (Vec<MatchResult>, Vec<Unmatched>) {
        let mut matched = Vec::new();
        let mut unmatched = Vec::new();
        for (i, question) in questions.iter().enumerate() {
            tracing::debug!("[{}/{}] Matching: {}", i + 1, questions.len(), question);
            match self.match_question(question, key) {
                Ok(m) => matched.push(m),
                Err(u) => unmatched.push(u),
            }
        }
        (matched, unmatched)
    }
}
