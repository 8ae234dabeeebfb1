use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::browser::session::DEFAULT_SERVER_SCRIPT;
use crate::error::LlmError;
use crate::matcher::deterministic::DEFAULT_MAX_QUESTION_TOKENS;
use crate::matcher::llm::{DEFAULT_TIMEOUT_SECS, GeminiBackend, LlmBackend, OllamaBackend};
use crate::matcher::question_matcher::{MatchStrategy, QuestionMatcher};
use crate::matcher::semantic::LlmMatcher;
use crate::memory::run_log::DEFAULT_LOG_PATH;
use crate::run::form_run::{DEFAULT_SETTLE_MS, DEFAULT_SUBMIT_WAIT_MS, RunOptions};

pub const DEFAULT_CONFIG_PATH: &str = "form-autofill.yaml";
pub const DEFAULT_ANSWERS_PATH: &str = "INFO.md";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-autofill",
    version,
    about = "Fill Google Forms from a question/answer file"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to config file (default: form-autofill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fill and submit a form
    Fill {
        /// Form URL (falls back to form.url in the config file)
        #[arg(long)]
        url: Option<String>,

        /// Answer key file
        #[arg(long)]
        answers: Option<String>,

        /// Matching strategy: semantic or deterministic
        #[arg(long)]
        strategy: Option<String>,

        /// Resolve and print the plan without typing or clicking anything
        #[arg(long)]
        dry_run: bool,

        /// Append this run to the run log
        #[arg(long)]
        use_memory: bool,

        /// Output format: console, json
        #[arg(long, default_value = "console")]
        format: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Match and resolve offline against a saved snapshot
    Plan {
        /// Answer key file
        #[arg(long)]
        answers: Option<String>,

        /// Snapshot payload JSON, as produced by the browser driver
        #[arg(long)]
        snapshot: String,

        /// Matching strategy: semantic or deterministic
        #[arg(long)]
        strategy: Option<String>,
    },

    /// Parse an answer key and list its entries
    Check {
        /// Answer key file
        #[arg(long)]
        answers: Option<String>,
    },

    /// Manage the run log
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum MemoryAction {
    /// Remove logged runs
    Clear {
        /// Keep the most recent run
        #[arg(long)]
        keep_latest: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-autofill.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    pub url: Option<String>,

    #[serde(default = "default_answers")]
    pub answers: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            url: None,
            answers: default_answers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,

    #[serde(default = "default_max_question_tokens")]
    pub max_question_tokens: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            max_question_tokens: DEFAULT_MAX_QUESTION_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Ollama,
    Gemini,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    pub endpoint: Option<String>,

    pub model: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Environment variable holding the Gemini API key
    pub api_key_env: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Ollama,
            endpoint: None,
            model: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_key_env: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_submit_wait_ms")]
    pub submit_wait_ms: u64,

    #[serde(default = "default_true")]
    pub clear_fields: bool,

    /// Refuse to submit when a filled field does not hold its answer
    #[serde(default = "default_true")]
    pub validate_before_submit: bool,

    #[serde(default)]
    pub use_memory: bool,

    #[serde(default = "default_log_path")]
    pub log_path: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            settle_ms: DEFAULT_SETTLE_MS,
            submit_wait_ms: DEFAULT_SUBMIT_WAIT_MS,
            clear_fields: true,
            validate_before_submit: true,
            use_memory: false,
            log_path: default_log_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_server_script")]
    pub server_script: String,

    #[serde(default)]
    pub visible: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            server_script: default_server_script(),
            visible: false,
        }
    }
}

// Serde default helpers
fn default_answers() -> String { DEFAULT_ANSWERS_PATH.to_string() }
fn default_strategy() -> String { "semantic".to_string() }
fn default_max_question_tokens() -> usize { DEFAULT_MAX_QUESTION_TOKENS }
fn default_timeout_secs() -> u64 { DEFAULT_TIMEOUT_SECS }
fn default_settle_ms() -> u64 { DEFAULT_SETTLE_MS }
fn default_submit_wait_ms() -> u64 { DEFAULT_SUBMIT_WAIT_MS }
fn default_true() -> bool { true }
fn default_log_path() -> String { DEFAULT_LOG_PATH.to_string() }
fn default_server_script() -> String { DEFAULT_SERVER_SCRIPT.to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config '{}': {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Strategy from the CLI flag, else the config file. Unknown names are an error.
pub fn resolve_strategy(cli: Option<&str>, config: &AppConfig) -> Result<MatchStrategy, String> {
    let raw = cli.unwrap_or(&config.matcher.strategy);
    MatchStrategy::parse(raw).ok_or_else(|| format!("Unknown matching strategy '{}'", raw))
}

pub fn build_run_options(config: &AppConfig, dry_run: bool) -> RunOptions {
    RunOptions {
        settle_ms: config.run.settle_ms,
        submit_wait_ms: config.run.submit_wait_ms,
        clear_fields: config.run.clear_fields,
        dry_run,
        validate_before_submit: config.run.validate_before_submit,
    }
}

/// Log filter directive: `-q`/`-v` win, else `RUST_LOG`, else warnings only.
pub fn log_directive(verbose: u8, quiet: bool, rust_log: Option<&str>) -> String {
    match (quiet, verbose, rust_log) {
        (true, _, _) => "error".to_string(),
        (false, 0, Some(env)) if !env.trim().is_empty() => env.trim().to_string(),
        (false, 0, _) => "warn".to_string(),
        (false, 1, _) => "info".to_string(),
        (false, _, _) => "debug".to_string(),
    }
}

/// Build the LLM backend named in the config.
///
/// Gemini reads its key from `llm.api_key_env` (default `GEMINI_API_KEY`);
/// a missing key is an error rather than a silent downgrade.
pub fn build_backend(config: &LlmConfig) -> Result<Box<dyn LlmBackend>, LlmError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.provider {
        LlmProvider::Ollama => {
            let defaults = OllamaBackend::default();
            let endpoint = config.endpoint.as_deref().unwrap_or(&defaults.endpoint);
            let model = config.model.as_deref().unwrap_or(&defaults.model);
            Ok(Box::new(OllamaBackend::new(endpoint, model, timeout)))
        }
        LlmProvider::Gemini => {
            let var = config.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
            let api_key = std::env::var(var)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| LlmError::MissingApiKey { var: var.to_string() })?;
            let model = config.model.as_deref().unwrap_or(GeminiBackend::DEFAULT_MODEL);
            Ok(Box::new(GeminiBackend::new(
                config.endpoint.as_deref(),
                model,
                &api_key,
                timeout,
            )))
        }
    }
}

/// Build the question matcher for a strategy.
pub fn build_question_matcher(
    strategy: MatchStrategy,
    config: &AppConfig,
) -> Result<QuestionMatcher, LlmError> {
    let matcher = match strategy {
        MatchStrategy::Deterministic => QuestionMatcher::deterministic(),
        MatchStrategy::Semantic => {
            let backend = build_backend(&config.llm)?;
            tracing::info!("Semantic matching via {}", backend.describe());
            QuestionMatcher::semantic(Box::new(LlmMatcher::new(backend)))
        }
    };
    Ok(matcher.with_max_question_tokens(config.matcher.max_question_tokens))
}
