use std::collections::HashSet;

use crate::answer_key::{AnswerEntry, AnswerKey};
use crate::form::form_model::{Confidence, FieldKind, MatchResult};

pub const DEFAULT_MAX_QUESTION_TOKENS: usize = 12;

const STOP_WORDS: [&str; 14] = [
    "a", "an", "the", "of", "to", "is", "are", "what", "your", "you", "for", "and", "or", "it",
];

const CLOSED_QUESTION_LEADS: [&str; 13] = [
    "is", "are", "does", "do", "did", "was", "were", "has", "have", "can", "will", "should",
    "would",
];

const SELECTION_WORDS: [&str; 4] = ["which", "select", "choose", "pick"];

/// Lowercased content words of `text`, punctuation stripped. `/` is kept so
/// "he/she" stays one token.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric() || *c == '/')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Keyword-overlap match of a form question against the answer key.
///
/// The first `max_tokens` content words of the question are compared with
/// each entry's question; the entry sharing the most wins, earliest entry on
/// ties. `None` when nothing overlaps.
pub fn match_by_keywords(question: &str, key: &AnswerKey, max_tokens: usize) -> Option<MatchResult> {
    let entry = best_entry(question, key.entries(), max_tokens)?;

    Some(MatchResult {
        question: question.to_string(),
        answer: entry.answer.clone(),
        field_kind: infer_field_kind(question, &entry.answer),
        confidence: Confidence::Low,
    })
}

pub fn best_entry<'a>(question: &str, entries: &'a [AnswerEntry], max_tokens: usize) -> Option<&'a AnswerEntry> {
    let wanted: HashSet<String> = tokenize(question).into_iter().take(max_tokens).collect();
    if wanted.is_empty() {
        return None;
    }

    let mut best: Option<(&AnswerEntry, usize)> = None;
    for entry in entries {
        let theirs: HashSet<String> = tokenize(&entry.question).into_iter().collect();
        let shared = wanted.intersection(&theirs).count();
        if shared == 0 {
            continue;
        }
        // strict > keeps the earliest entry on ties
        if best.map_or(true, |(_, n)| shared > n) {
            best = Some((entry, shared));
        }
    }

    best.map(|(entry, _)| entry)
}

/// Guess how a question is answered from its wording.
///
/// Closed questions ("Is...", "Does...") are radio groups, selection wording
/// ("Which...", "Select...") is a dropdown, a Yes/No answer is a radio group,
/// anything else is free text. The resolver checks this against the page.
pub fn infer_field_kind(question: &str, answer: &str) -> FieldKind {
    let words: Vec<String> = question
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    if let Some(first) = words.first() {
        if CLOSED_QUESTION_LEADS.contains(&first.as_str()) {
            return FieldKind::Radio;
        }
    }

    if words.iter().any(|w| SELECTION_WORDS.contains(&w.as_str())) {
        return FieldKind::Dropdown;
    }

    if is_yes_no(answer) {
        return FieldKind::Radio;
    }

    FieldKind::Text
}

fn is_yes_no(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "no")
}
