use std::cell::Cell;
use std::rc::Rc;

use form_autofill::error::LlmError;
use form_autofill::matcher::semantic::{SemanticMatcher, SemanticSuggestion};

/// Semantic matcher with canned replies keyed by question.
pub struct FakeSemantic {
    replies: Vec<(String, SemanticSuggestion)>,
    timing_out: bool,
    pub calls: Rc<Cell<usize>>,
}

impl FakeSemantic {
    pub fn answering(replies: &[(&str, &str, &str)]) -> Self {
        Self {
            replies: replies
                .iter()
                .map(|(q, a, kind)| (q.to_string(), suggestion(a, kind, "high")))
                .collect(),
            timing_out: false,
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn timing_out() -> Self {
        Self {
            replies: Vec::new(),
            timing_out: true,
            calls: Rc::new(Cell::new(0)),
        }
    }
}

pub fn suggestion(answer: &str, field_kind: &str, confidence: &str) -> SemanticSuggestion {
    SemanticSuggestion {
        answer: Some(answer.to_string()),
        field_kind: Some(field_kind.to_string()),
        confidence: Some(confidence.to_string()),
        reasoning: None,
    }
}

impl SemanticMatcher for FakeSemantic {
    fn suggest(&self, question: &str, _answer_key_text: &str) -> Result<SemanticSuggestion, LlmError> {
        self.calls.set(self.calls.get() + 1);
        if self.timing_out {
            return Err(LlmError::Timeout {
                endpoint: "http://fake/api/generate".into(),
            });
        }
        Ok(self
            .replies
            .iter()
            .find(|(q, _)| q == question)
            .map(|(_, s)| s.clone())
            .unwrap_or_default())
    }
}
