//! Voice Memo Export - copy Voice Memos recordings out of the app.
//!
//! Reads the app's `CloudRecordings.db`, names each recording after its
//! title (or date), copies the audio into a plain folder and stamps each
//! file with the time it was recorded.
//!
//!   voice-memo-export                   # Ask about each memo
//!   voice-memo-export --all             # Export everything
//!   voice-memo-export --date-in-name    # Prefix names with the date
//!   voice-memo-export list              # Show memos without exporting

mod application;
mod cli;
mod domain;
mod infrastructure;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    format_recordings_json, format_recordings_table, format_status_line, format_summary,
    list_recordings, ExportService, OutputFormat, PromptDecisions, SelectionController,
};
use cli::{parse_format, Cli, Commands};
use domain::AppConfig;
use infrastructure::{
    candidate_databases, check_database_access, ensure_config_exists, load_config,
    open_directory,
};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: &Cli) -> domain::Result<()> {
    let file_config = load_config()?;

    match &cli.command {
        None => cmd_export(cli, &file_config),
        Some(Commands::List { format }) => cmd_list(cli, &file_config, parse_format(format)?),
        Some(Commands::Paths) => cmd_paths(cli, &file_config),
        Some(Commands::InitConfig) => cmd_init_config(),
    }
}

/// Export recordings command.
fn cmd_export(cli: &Cli, file_config: &AppConfig) -> domain::Result<()> {
    let config = cli.export_config(file_config)?;
    let db_path = cli.database_path(file_config)?;
    check_database_access(&db_path)?;

    let mut selection = if config.include_all {
        SelectionController::batch()
    } else {
        println!();
        println!("Press ENTER to export, n to skip, q to stop.");
        println!();
        SelectionController::interactive(Box::new(PromptDecisions::new(
            std::io::stdin().lock(),
            std::io::stdout(),
            config.timezone,
        )))
    };

    let service = ExportService::new(config);
    let report = service.run(&db_path, &mut selection, |outcome| {
        println!("{}", format_status_line(&outcome.label, &outcome.status));
    })?;

    let export_dir = &service.config().export_directory;
    println!();
    println!("{}", format_summary(&report.stats, export_dir));
    if report.aborted {
        println!("{}", "Stopped early; remaining memos were skipped.".yellow());
    }

    if service.config().open_file_browser {
        open_directory(export_dir);
    }

    Ok(())
}

/// List recordings command.
fn cmd_list(cli: &Cli, file_config: &AppConfig, format: OutputFormat) -> domain::Result<()> {
    let db_path = cli.database_path(file_config)?;
    check_database_access(&db_path)?;

    let zone = cli.zone(file_config);
    let rows = list_recordings(&db_path, zone)?;

    let output = match format {
        OutputFormat::Table => format_recordings_table(&rows, zone),
        OutputFormat::Json => format_recordings_json(&rows).map_err(domain::AppError::json)?,
    };

    println!("{output}");
    Ok(())
}

/// Show database paths command.
fn cmd_paths(cli: &Cli, file_config: &AppConfig) -> domain::Result<()> {
    println!("{}", "📂 Voice Memos Database Paths".bold());
    println!();

    for (i, path) in candidate_databases()?.iter().enumerate() {
        let state = if path.is_file() {
            "found".green()
        } else {
            "missing".dimmed()
        };
        println!("  {}. [{}] {}", i + 1, state, path.display());
    }

    println!();
    println!("Using: {}", cli.database_path(file_config)?.display());
    println!("Config: {}", AppConfig::config_file_path().display());

    Ok(())
}

/// Create default config command.
fn cmd_init_config() -> domain::Result<()> {
    let path = AppConfig::config_file_path();
    if ensure_config_exists(&path)? {
        println!("{} Created {}", "✓".green().bold(), path.display());
    } else {
        println!("Config already exists: {}", path.display());
    }
    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
