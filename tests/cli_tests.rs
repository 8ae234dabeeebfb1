use clap::Parser;
use form_autofill::cli::config::{
    AppConfig, Cli, Commands, LlmConfig, LlmProvider, MemoryAction, build_backend, build_question_matcher,
    build_run_options, load_config, log_directive, resolve_strategy,
};
use form_autofill::error::LlmError;
use form_autofill::matcher::question_matcher::MatchStrategy;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_fill_minimal() {
    let cli = Cli::parse_from(["form-autofill", "fill", "--url", "https://forms.gle/abc"]);
    match cli.command {
        Commands::Fill {
            url,
            answers,
            strategy,
            dry_run,
            use_memory,
            format,
            output,
        } => {
            assert_eq!(url.as_deref(), Some("https://forms.gle/abc"));
            assert!(answers.is_none());
            assert!(strategy.is_none());
            assert!(!dry_run);
            assert!(!use_memory);
            assert_eq!(format, "console");
            assert!(output.is_none());
        }
        _ => panic!("Expected Fill command"),
    }
    assert_eq!(cli.verbose, 0);
    assert!(!cli.quiet);
}

#[test]
fn cli_parse_fill_all_args() {
    let cli = Cli::parse_from([
        "form-autofill",
        "-vv",
        "fill",
        "--url",
        "https://forms.gle/xyz",
        "--answers",
        "answers/INFO.md",
        "--strategy",
        "deterministic",
        "--dry-run",
        "--use-memory",
        "--format",
        "json",
        "-o",
        "report.json",
        "--config",
        "custom.yaml",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
    match cli.command {
        Commands::Fill {
            answers,
            strategy,
            dry_run,
            use_memory,
            format,
            output,
            ..
        } => {
            assert_eq!(answers.as_deref(), Some("answers/INFO.md"));
            assert_eq!(strategy.as_deref(), Some("deterministic"));
            assert!(dry_run);
            assert!(use_memory);
            assert_eq!(format, "json");
            assert_eq!(output.as_deref(), Some("report.json"));
        }
        _ => panic!("Expected Fill command"),
    }
}

#[test]
fn cli_parse_plan() {
    let cli = Cli::parse_from([
        "form-autofill",
        "plan",
        "--answers",
        "INFO.md",
        "--snapshot",
        "snap.json",
        "-q",
    ]);
    assert!(cli.quiet);
    match cli.command {
        Commands::Plan {
            answers,
            snapshot,
            strategy,
        } => {
            assert_eq!(answers.as_deref(), Some("INFO.md"));
            assert_eq!(snapshot, "snap.json");
            assert!(strategy.is_none());
        }
        _ => panic!("Expected Plan command"),
    }
}

#[test]
fn cli_plan_requires_snapshot() {
    assert!(Cli::try_parse_from(["form-autofill", "plan", "--answers", "INFO.md"]).is_err());
}

#[test]
fn cli_parse_check_and_memory() {
    let cli = Cli::parse_from(["form-autofill", "check"]);
    assert!(matches!(cli.command, Commands::Check { answers: None }));

    let cli = Cli::parse_from(["form-autofill", "memory", "clear", "--keep-latest"]);
    assert!(matches!(
        cli.command,
        Commands::Memory {
            action: MemoryAction::Clear { keep_latest: true }
        }
    ));
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["form-autofill", "explore"]).is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_load_missing_file() {
    let config = load_config(Some("nonexistent_file_that_does_not_exist.yaml"));
    assert_eq!(config.form.answers, "INFO.md");
    assert_eq!(config.matcher.strategy, "semantic");
}

#[test]
fn config_default_values() {
    let config = AppConfig::default();
    assert!(config.form.url.is_none());
    assert_eq!(config.form.answers, "INFO.md");
    assert_eq!(config.matcher.max_question_tokens, 12);
    assert_eq!(config.llm.provider, LlmProvider::Ollama);
    assert_eq!(config.llm.timeout_secs, 60);
    assert_eq!(config.run.settle_ms, 500);
    assert_eq!(config.run.submit_wait_ms, 3000);
    assert!(config.run.clear_fields);
    assert!(config.run.validate_before_submit);
    assert!(!config.run.use_memory);
    assert_eq!(config.run.log_path, "memory/run_log.jsonl");
    assert!(!config.browser.visible);
}

#[test]
fn config_yaml_roundtrip() {
    let config = AppConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed.form.answers, config.form.answers);
    assert_eq!(parsed.run.settle_ms, config.run.settle_ms);
    assert_eq!(parsed.llm.provider, config.llm.provider);
}

#[test]
fn config_partial_yaml() {
    let yaml = r#"
form:
  url: https://forms.gle/abc
llm:
  provider: gemini
  api_key_env: MY_KEY
run:
  settle_ms: 250
  validate_before_submit: false
"#;
    let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.form.url.as_deref(), Some("https://forms.gle/abc"));
    assert_eq!(config.form.answers, "INFO.md");
    assert_eq!(config.llm.provider, LlmProvider::Gemini);
    assert_eq!(config.llm.api_key_env.as_deref(), Some("MY_KEY"));
    assert_eq!(config.llm.timeout_secs, 60);
    assert_eq!(config.run.settle_ms, 250);
    assert_eq!(config.run.submit_wait_ms, 3000);
    assert!(!config.run.validate_before_submit);
}

#[test]
fn config_malformed_file_gives_defaults() {
    let dir = std::env::temp_dir().join("form_autofill_cli_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("broken.yaml");
    std::fs::write(&path, "run: [this is not: a map").unwrap();

    let config = load_config(Some(path.to_str().unwrap()));
    assert_eq!(config.run.settle_ms, 500);

    std::fs::remove_file(&path).ok();
}

// ============================================================================
// Config Builders
// ============================================================================

#[test]
fn cli_strategy_beats_config() {
    let mut config = AppConfig::default();
    config.matcher.strategy = "deterministic".into();

    assert_eq!(resolve_strategy(None, &config), Ok(MatchStrategy::Deterministic));
    assert_eq!(resolve_strategy(Some("semantic"), &config), Ok(MatchStrategy::Semantic));
    assert!(resolve_strategy(Some("psychic"), &config).is_err());
}

#[test]
fn run_options_follow_config() {
    let mut config = AppConfig::default();
    config.run.clear_fields = false;
    config.run.submit_wait_ms = 10;

    let options = build_run_options(&config, true);
    assert!(options.dry_run);
    assert!(!options.clear_fields);
    assert_eq!(options.submit_wait_ms, 10);
    assert_eq!(options.settle_ms, 500);
    assert!(options.validate_before_submit);
}

#[test]
fn log_flags_beat_rust_log() {
    assert_eq!(log_directive(0, false, None), "warn");
    assert_eq!(log_directive(0, false, Some("form_autofill=trace")), "form_autofill=trace");
    assert_eq!(log_directive(0, false, Some("  ")), "warn");
    assert_eq!(log_directive(1, false, Some("trace")), "info");
    assert_eq!(log_directive(3, false, None), "debug");
    assert_eq!(log_directive(2, true, Some("trace")), "error");
}

#[test]
fn deterministic_matcher_needs_no_backend() {
    let config = AppConfig::default();
    let matcher = build_question_matcher(MatchStrategy::Deterministic, &config).unwrap();
    assert_eq!(matcher.strategy(), MatchStrategy::Deterministic);
}

#[test]
fn ollama_backend_uses_config_overrides() {
    let config = LlmConfig {
        endpoint: Some("http://gpu-box:11434/api/generate".into()),
        model: Some("llama3".into()),
        ..LlmConfig::default()
    };
    let backend = build_backend(&config).unwrap();
    assert!(backend.describe().contains("llama3"));
}

#[test]
fn gemini_without_key_is_an_error() {
    let config = LlmConfig {
        provider: LlmProvider::Gemini,
        api_key_env: Some("FORM_AUTOFILL_TEST_UNSET_KEY".into()),
        ..LlmConfig::default()
    };
    match build_backend(&config) {
        Err(LlmError::MissingApiKey { var }) => assert_eq!(var, "FORM_AUTOFILL_TEST_UNSET_KEY"),
        Err(e) => panic!("Expected MissingApiKey, got {}", e),
        Ok(_) => panic!("Expected MissingApiKey, got a backend"),
    }
}
