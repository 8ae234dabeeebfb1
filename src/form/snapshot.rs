use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FillError;
use crate::form::classifier::{RawElement, classify};
use crate::form::form_model::{ElementKind, FormElement};

/// Point-in-time read of a form page: question headings and interactive
/// elements, both in page order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormSnapshot {
    pub questions: Vec<String>,
    pub elements: Vec<FormElement>,
}

impl FormSnapshot {
    pub fn new(questions: Vec<String>, elements: Vec<FormElement>) -> Self {
        Self { questions, elements }
    }

    pub fn of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &FormElement> {
        self.elements.iter().filter(move |e| e.kind == kind)
    }
}

/// Snapshot payload produced by the browser driver (and by `plan --snapshot`
/// files).
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotPayload {
    pub elements: Vec<RawElement>,
    #[serde(default)]
    pub questions: Option<Vec<String>>,
    /// Markdown rendering of the page, used when `questions` is absent
    #[serde(default)]
    pub text: Option<String>,
}

impl SnapshotPayload {
    pub fn into_snapshot(self) -> FormSnapshot {
        let elements = classify(&self.elements);
        let questions = match self.questions {
            Some(qs) => dedupe(qs.iter().map(|q| clean_question(q)).filter(|q| !q.is_empty())),
            None => extract_questions(self.text.as_deref().unwrap_or("")),
        };
        FormSnapshot { questions, elements }
    }
}

pub fn snapshot_from_value(value: Value) -> Result<FormSnapshot, FillError> {
    let payload: SnapshotPayload =
        serde_json::from_value(value).map_err(|e| FillError::JsonParse {
            context: "snapshot payload".into(),
            source: e,
        })?;
    Ok(payload.into_snapshot())
}

/// Load a saved snapshot payload from a JSON file.
pub fn load_snapshot_file(path: &str) -> Result<FormSnapshot, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let payload: SnapshotPayload =
        serde_json::from_str(&content).map_err(|e| FillError::JsonParse {
            context: format!("snapshot file {}", path),
            source: e,
        })?;
    Ok(payload.into_snapshot())
}

static HEADING_QUESTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*#{1,6}\s+(.+?\?)").expect("valid heading regex"));
static REQUIRED_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*required question\s*").expect("valid required regex"));
static POINTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\d+\s*points?\b").expect("valid points regex"));
static INPUT_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Input:.*?\*\*").expect("valid input hint regex"));

/// Extract question strings from a markdown rendering of the form.
///
/// Headings ending in `?` win. When the page has none, any line of
/// reasonable length containing `?` is taken instead.
pub fn extract_questions(page_text: &str) -> Vec<String> {
    let from_headings: Vec<String> = HEADING_QUESTION
        .captures_iter(page_text)
        .map(|c| clean_question(&c[1]))
        .filter(|q| q.len() > 10 && q.contains('?'))
        .collect();

    if !from_headings.is_empty() {
        return dedupe(from_headings.into_iter());
    }

    tracing::debug!("No question headings found, scanning plain lines");

    let from_lines = page_text
        .lines()
        .map(str::trim)
        .filter(|l| l.contains('?') && l.len() > 15 && l.len() < 100)
        .map(|l| clean_question(&INPUT_HINT.replace_all(l, "")))
        .filter(|q| !q.is_empty() && q.contains('?'));

    dedupe(from_lines)
}

/// Strip Google Forms decorations from a question heading.
pub fn clean_question(raw: &str) -> String {
    let q = REQUIRED_MARK.replace_all(raw, " ");
    let q = POINTS.replace_all(&q, " ");
    q.trim()
        .trim_end_matches('*')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn dedupe(questions: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for q in questions {
        if !out.contains(&q) {
            out.push(q);
        }
    }
    out
}
