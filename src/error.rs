use std::fmt;

use crate::form::form_model::Verb;

#[derive(Debug)]
pub enum FillError {
    /// Answer key could not be read from disk
    AnswerKeyRead { path: String, source: std::io::Error },

    /// Answer key contains a question with no answer line after it
    Parse { line: usize, question: String },

    /// Answer key parsed but holds no question/answer pairs
    EmptyAnswerKey { path: String },

    /// Node.js browser driver failed to spawn
    SubprocessSpawn { script: String, source: std::io::Error },

    /// Reading from or writing to the browser driver failed
    SessionIO(String),

    /// Browser driver answered a command with ok=false or an unexpected shape
    SessionProtocol { command: String, error: String },

    /// JSON parsing failed (driver output, snapshot file)
    JsonParse { context: String, source: serde_json::Error },

    /// JSON serialization failed (command to the driver)
    JsonSerialize { context: String, source: serde_json::Error },

    /// A type/click action did not take effect
    ActionFailure {
        question: String,
        index: u32,
        verb: Verb,
        reason: String,
    },

    /// Snapshot of the form page contained no questions
    NoQuestions,

    /// No button labelled with a submit marker on the page
    SubmitNotFound,
}

impl fmt::Display for FillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillError::AnswerKeyRead { path, source } => {
                write!(f, "Failed to read answer key '{}': {}", path, source)
            }
            FillError::Parse { line, question } => {
                write!(f, "Answer key line {}: question '{}' has no answer", line, question)
            }
            FillError::EmptyAnswerKey { path } => {
                write!(f, "Answer key '{}' contains no question/answer pairs", path)
            }
            FillError::SubprocessSpawn { script, source } => {
                write!(f, "Failed to spawn {} (is Node.js installed?): {}", script, source)
            }
            FillError::SessionIO(msg) => write!(f, "Browser session I/O error: {}", msg),
            FillError::SessionProtocol { command, error } => {
                write!(f, "Browser command '{}' failed: {}", command, error)
            }
            FillError::JsonParse { context, source } => {
                write!(f, "JSON parse error ({}): {}", context, source)
            }
            FillError::JsonSerialize { context, source } => {
                write!(f, "JSON serialize error ({}): {}", context, source)
            }
            FillError::ActionFailure { question, index, verb, reason } => {
                write!(
                    f,
                    "{:?} on element [{}] for '{}' failed: {}",
                    verb, index, question, reason
                )
            }
            FillError::NoQuestions => write!(f, "No questions found on the form page"),
            FillError::SubmitNotFound => write!(f, "No submit button found on the form page"),
        }
    }
}

impl std::error::Error for FillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FillError::AnswerKeyRead { source, .. } => Some(source),
            FillError::SubprocessSpawn { source, .. } => Some(source),
            FillError::JsonParse { source, .. } => Some(source),
            FillError::JsonSerialize { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure of a single semantic-matching call. Never fatal: the question
/// matcher falls back to keyword overlap.
#[derive(Debug)]
pub enum LlmError {
    Timeout { endpoint: String },

    Transport { endpoint: String, source: reqwest::Error },

    Status { endpoint: String, status: u16, body: String },

    /// Reply arrived but did not have the expected shape
    Malformed(String),

    /// Provider needs an API key and the named variable is unset
    MissingApiKey { var: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::Timeout { endpoint } => write!(f, "LLM request to {} timed out", endpoint),
            LlmError::Transport { endpoint, source } => {
                write!(f, "LLM request to {} failed: {}", endpoint, source)
            }
            LlmError::Status { endpoint, status, body } => {
                write!(f, "LLM endpoint {} returned {}: {}", endpoint, status, body)
            }
            LlmError::Malformed(msg) => write!(f, "Malformed LLM reply: {}", msg),
            LlmError::MissingApiKey { var } => write!(f, "API key not set (export {})", var),
        }
    }
}

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LlmError::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl LlmError {
    pub fn from_reqwest(endpoint: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            LlmError::Transport {
                endpoint: endpoint.to_string(),
                source: e,
            }
        }
    }
}
