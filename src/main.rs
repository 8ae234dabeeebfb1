use clap::Parser;
use form_autofill::cli::commands::{cmd_check, cmd_fill, cmd_memory_clear, cmd_plan};
use form_autofill::cli::config::{Cli, Commands, MemoryAction, load_config, log_directive};
use form_autofill::report::report_model::RunOutcome;
use tracing_subscriber::EnvFilter;

const EXIT_PARTIAL: i32 = 2;
const EXIT_BLOCKED: i32 = 3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = load_config(cli.config.as_deref());

    let outcome = match cli.command {
        Commands::Fill {
            url,
            answers,
            strategy,
            dry_run,
            use_memory,
            format,
            output,
        } => cmd_fill(
            &config,
            url.as_deref(),
            answers.as_deref(),
            strategy.as_deref(),
            dry_run,
            use_memory,
            &format,
            output.as_deref(),
        )?,
        Commands::Plan {
            answers,
            snapshot,
            strategy,
        } => cmd_plan(&config, answers.as_deref(), &snapshot, strategy.as_deref())?,
        Commands::Check { answers } => {
            cmd_check(&config, answers.as_deref())?;
            RunOutcome::Complete
        }
        Commands::Memory {
            action: MemoryAction::Clear { keep_latest },
        } => {
            cmd_memory_clear(&config, keep_latest)?;
            RunOutcome::Complete
        }
    };

    match outcome {
        RunOutcome::Complete => Ok(()),
        RunOutcome::Partial => std::process::exit(EXIT_PARTIAL),
        RunOutcome::Blocked => std::process::exit(EXIT_BLOCKED),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::builder().parse_lossy(log_directive(verbose, quiet, rust_log.as_deref()));

    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}
