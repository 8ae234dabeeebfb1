use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::form::form_model::{FillAction, MatchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Started,
    Matched,
    Unmatched,
    Acted,
    Unresolved,
    Checked,
    Submitted,
    Verified,
    Finished,
}

/// One line of the run log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunEvent {
    pub timestamp_ms: u128,
    pub run_id: String,
    pub stage: RunStage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Run identifier: answer-key fingerprint prefix plus start time.
pub fn run_id(answer_key_fingerprint: &str, started_ms: u128) -> String {
    let prefix: String = answer_key_fingerprint.chars().take(12).collect();
    format!("{}-{}", prefix, started_ms)
}

impl RunEvent {
    pub fn now(run_id: &str, stage: RunStage) -> Self {
        Self {
            timestamp_ms: now_ms(),
            run_id: run_id.to_string(),
            stage,
            question: None,
            detail: None,
        }
    }

    pub fn with_question(mut self, question: &str) -> Self {
        self.question = Some(question.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn with_match(self, m: &MatchResult) -> Self {
        let detail = format!("{} ({:?}, {:?})", m.answer, m.field_kind, m.confidence);
        self.with_question(&m.question).with_detail(detail)
    }

    pub fn with_action(self, action: &FillAction) -> Self {
        self.with_detail(action)
    }
}
