use crate::answer_key::AnswerKey;
use crate::browser::session::BrowserSession;
use crate::cli::config::{AppConfig, build_question_matcher, build_run_options, resolve_strategy};
use crate::form::snapshot::load_snapshot_file;
use crate::memory::run_log::{RunLog, clear_run_log};
use crate::report::console::{format_console_report, format_plan};
use crate::report::report_model::RunOutcome;
use crate::resolver::resolver::resolve;
use crate::run::form_run::FormRun;

// ============================================================================
// fill subcommand
// ============================================================================

/// Fill a live form and return the run outcome.
pub fn cmd_fill(
    config: &AppConfig,
    url: Option<&str>,
    answers: Option<&str>,
    strategy: Option<&str>,
    dry_run: bool,
    use_memory: bool,
    format: &str,
    output: Option<&str>,
) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    let url = url
        .or(config.form.url.as_deref())
        .ok_or("No form URL given (pass --url or set form.url in the config file)")?;
    let answers_path = answers.unwrap_or(&config.form.answers);

    let key = AnswerKey::load_file(answers_path)?;
    tracing::info!("Loaded {} answers from {}", key.len(), answers_path);

    let strategy = resolve_strategy(strategy, config)?;
    let matcher = build_question_matcher(strategy, config)?;

    let log = if use_memory || config.run.use_memory {
        RunLog::open(&config.run.log_path)
    } else {
        RunLog::disabled()
    };

    let run = FormRun::new(&key, &matcher, &log, build_run_options(config, dry_run));
    let mut session = BrowserSession::launch(&config.browser.server_script, config.browser.visible)?;
    let report = run.execute(&mut session, url)?;
    session.quit()?;

    let output_content = match format {
        "json" => serde_json::to_string_pretty(&report)? + "\n",
        _ => format_console_report(&report),
    };

    match output {
        Some(path) => std::fs::write(path, &output_content)?,
        None => print!("{}", output_content),
    }

    Ok(report.outcome())
}

// ============================================================================
// plan subcommand
// ============================================================================

/// Resolve against a saved snapshot without a browser.
pub fn cmd_plan(
    config: &AppConfig,
    answers: Option<&str>,
    snapshot_path: &str,
    strategy: Option<&str>,
) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    let key = AnswerKey::load_file(answers.unwrap_or(&config.form.answers))?;
    let snapshot = load_snapshot_file(snapshot_path)?;

    let strategy = resolve_strategy(strategy, config)?;
    let matcher = build_question_matcher(strategy, config)?;

    let (matches, unmatched) = matcher.match_all(&snapshot.questions, &key);
    let resolution = resolve(&matches, &snapshot);

    println!("{} questions, {} matched", snapshot.questions.len(), matches.len());
    print!("{}", format_plan(&resolution));
    for u in &unmatched {
        println!("    \u{2717} {}: no answer in key", u.question);
    }

    if unmatched.is_empty() && resolution.unresolved.is_empty() {
        Ok(RunOutcome::Complete)
    } else {
        Ok(RunOutcome::Partial)
    }
}

// ============================================================================
// check subcommand
// ============================================================================

pub fn cmd_check(config: &AppConfig, answers: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let path = answers.unwrap_or(&config.form.answers);
    let key = AnswerKey::load_file(path)?;

    println!("{}: {} entries (sha1 {})", path, key.len(), key.fingerprint());
    for (i, entry) in key.entries().iter().enumerate() {
        println!("{:>3}. {}\n     -> {}", i + 1, entry.question, entry.answer);
    }

    Ok(())
}

// ============================================================================
// memory subcommand
// ============================================================================

pub fn cmd_memory_clear(config: &AppConfig, keep_latest: bool) -> Result<(), Box<dyn std::error::Error>> {
    let removed = clear_run_log(&config.run.log_path, keep_latest)?;
    if keep_latest {
        println!("Removed {} events, kept the latest run", removed);
    } else {
        println!("Removed {} events", removed);
    }
    Ok(())
}
