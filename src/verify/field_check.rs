use std::fmt;

use serde::Serialize;

use crate::form::form_model::{ElementKind, FormElement, Verb};
use crate::report::report_model::FilledQuestion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum FieldProblem {
    /// The filled element is no longer on the page
    Missing { index: u32 },
    /// Input holds something other than the typed answer
    WrongValue {
        index: u32,
        expected: String,
        found: Option<String>,
    },
    /// Clicked radio option is not selected
    NotSelected { index: u32 },
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProblem::Missing { index } => write!(f, "field [{}] is gone", index),
            FieldProblem::WrongValue {
                index,
                expected,
                found: Some(found),
            } => write!(f, "field [{}] holds '{}', expected '{}'", index, found, expected),
            FieldProblem::WrongValue {
                index,
                expected,
                found: None,
            } => write!(f, "field [{}] is empty, expected '{}'", index, expected),
            FieldProblem::NotSelected { index } => write!(f, "option [{}] is not selected", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub question: String,
    #[serde(flatten)]
    pub problem: FieldProblem,
}

/// Re-read every filled field on a snapshot taken once filling is done.
///
/// Typed fields must hold their answer (case and spacing ignored); clicked
/// radio options must be selected. Nothing is renumbered between the last
/// action and this snapshot, so the action indices still apply.
pub fn check_filled(filled: &[FilledQuestion], elements: &[FormElement]) -> Vec<FieldIssue> {
    filled
        .iter()
        .filter_map(|f| {
            let index = f.action.target_index;
            let problem = match elements.iter().find(|e| e.index == index) {
                None => Some(FieldProblem::Missing { index }),
                Some(el) => problem_with(el, f.action.verb, f.action.value.as_deref()),
            };
            problem.map(|problem| FieldIssue {
                question: f.question.clone(),
                problem,
            })
        })
        .collect()
}

fn problem_with(el: &FormElement, verb: Verb, typed: Option<&str>) -> Option<FieldProblem> {
    match verb {
        Verb::Type => {
            let expected = typed.unwrap_or("");
            let holds = el.value.as_deref().is_some_and(|v| same_text(v, expected));
            (!holds).then(|| FieldProblem::WrongValue {
                index: el.index,
                expected: expected.to_string(),
                found: el.value.clone().filter(|v| !v.trim().is_empty()),
            })
        }
        Verb::Click if el.kind == ElementKind::RadioOption && !el.checked => {
            Some(FieldProblem::NotSelected { index: el.index })
        }
        Verb::Click => None,
    }
}

fn same_text(a: &str, b: &str) -> bool {
    let squash = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    squash(a) == squash(b)
}
