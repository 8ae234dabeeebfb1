use serde::Serialize;

use crate::error::FillError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerEntry {
    pub question: String,
    pub answer: String,
}

/// Question → answer mapping parsed from the answer-key document.
///
/// Entries keep document order so every downstream pass iterates
/// deterministically; lookups are by exact trimmed question text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey {
    entries: Vec<AnswerEntry>,
    text: String,
}

const BULLETS: [char; 3] = ['*', '-', '\u{2022}'];

impl AnswerKey {
    /// Parse an answer-key document.
    ///
    /// Prompt lines start with a bullet (`*`, `- `, `•`); the next non-empty
    /// line is the answer. Anything else outside a prompt is skipped. A
    /// question (prompt ending in `?`) left without an answer is an error.
    pub fn load(document: &str) -> Result<Self, FillError> {
        let mut entries: Vec<AnswerEntry> = Vec::new();
        let mut pending: Option<(usize, String)> = None;

        for (i, raw) in document.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(prompt) = prompt_text(line) {
                if let Some((at, question)) = pending.take() {
                    if question.ends_with('?') {
                        return Err(FillError::Parse { line: at, question });
                    }
                    tracing::debug!("Skipping prompt without answer at line {}: {}", at, question);
                }
                pending = Some((line_no, prompt));
                continue;
            }

            match pending.take() {
                Some((_, question)) => insert(&mut entries, question, line.to_string()),
                None => tracing::trace!("Skipping line {}: {}", line_no, line),
            }
        }

        if let Some((at, question)) = pending {
            if question.ends_with('?') {
                return Err(FillError::Parse { line: at, question });
            }
        }

        Ok(Self {
            entries,
            text: document.to_string(),
        })
    }

    /// Read and parse an answer-key file. A file without a single entry is
    /// rejected, since nothing could be filled from it.
    pub fn load_file(path: &str) -> Result<Self, FillError> {
        let content = std::fs::read_to_string(path).map_err(|e| FillError::AnswerKeyRead {
            path: path.to_string(),
            source: e,
        })?;
        let key = Self::load(&content)?;
        if key.is_empty() {
            return Err(FillError::EmptyAnswerKey { path: path.to_string() });
        }
        Ok(key)
    }

    pub fn entries(&self) -> &[AnswerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, question: &str) -> Option<&str> {
        let question = question.trim();
        self.entries
            .iter()
            .find(|e| e.question == question)
            .map(|e| e.answer.as_str())
    }

    /// Whether `answer` is, after trimming, one of the key's answers.
    pub fn contains_answer(&self, answer: &str) -> bool {
        let answer = answer.trim();
        self.entries.iter().any(|e| e.answer == answer)
    }

    /// Raw document text, as handed to the semantic matcher.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// SHA-1 of the raw document, hex encoded.
    pub fn fingerprint(&self) -> String {
        use sha1::{Digest, Sha1};

        let mut hasher = Sha1::new();
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn prompt_text(line: &str) -> Option<String> {
    let first = line.chars().next()?;
    if !BULLETS.contains(&first) {
        return None;
    }
    // "-5" or "-" alone is data, not a bullet
    if first == '-' && !line.starts_with("- ") {
        return None;
    }

    let text = line
        .trim_start_matches(|c: char| BULLETS.contains(&c) || c.is_whitespace())
        .trim_end_matches('*')
        .trim();

    (!text.is_empty()).then(|| text.to_string())
}

fn insert(entries: &mut Vec<AnswerEntry>, question: String, answer: String) {
    match entries.iter_mut().find(|e| e.question == question) {
        Some(existing) => existing.answer = answer,
        None => entries.push(AnswerEntry { question, answer }),
    }
}
