use serde::Serialize;

use crate::form::form_model::{Confidence, FieldKind, FillAction, MatchResult};
use crate::matcher::question_matcher::Unmatched;
use crate::resolver::resolver::UnresolvedQuestion;
use crate::verify::field_check::FieldIssue;

// ============================================================================
// Run report: what one form-filling run did
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every question was matched and filled
    Complete,
    /// Some questions were left unmatched or unresolved, or a filled
    /// field did not hold its answer
    Partial,
    /// Filled fields failed the pre-submit check, so nothing was submitted
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    /// A success marker was seen after submitting
    Confirmed,
    /// No marker seen; the submission may still have gone through
    Inconclusive,
    /// Nothing was submitted (dry run or blocked)
    Skipped,
}

/// A question that received an answer on the page.
#[derive(Debug, Clone, Serialize)]
pub struct FilledQuestion {
    pub question: String,
    pub answer: String,
    pub field_kind: FieldKind,
    pub confidence: Confidence,
    pub action: FillAction,
}

impl FilledQuestion {
    pub fn new(m: &MatchResult, action: FillAction) -> Self {
        Self {
            question: m.question.clone(),
            answer: m.answer.clone(),
            field_kind: m.field_kind,
            confidence: m.confidence,
            action,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub form_url: String,
    pub run_id: String,
    pub questions_found: usize,
    pub filled: Vec<FilledQuestion>,
    pub unmatched: Vec<Unmatched>,
    pub unresolved: Vec<UnresolvedQuestion>,
    /// Filled fields that did not hold their answer before submitting
    pub field_issues: Vec<FieldIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<FillAction>,
    pub verification: Verification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_marker: Option<String>,
    /// Page address once the submit click settled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
}

impl RunReport {
    pub fn new(form_url: &str, run_id: &str) -> Self {
        Self {
            form_url: form_url.to_string(),
            run_id: run_id.to_string(),
            questions_found: 0,
            filled: Vec::new(),
            unmatched: Vec::new(),
            unresolved: Vec::new(),
            field_issues: Vec::new(),
            submit: None,
            verification: Verification::Skipped,
            success_marker: None,
            final_url: None,
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn outcome(&self) -> RunOutcome {
        if !self.field_issues.is_empty() && self.submit.is_none() {
            RunOutcome::Blocked
        } else if self.unmatched.is_empty() && self.unresolved.is_empty() && self.field_issues.is_empty() {
            RunOutcome::Complete
        } else {
            RunOutcome::Partial
        }
    }

    pub fn is_complete(&self) -> bool {
        self.outcome() == RunOutcome::Complete
    }
}
