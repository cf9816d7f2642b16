//! Media Sorter - chronological photo and video organization
//!
//! Moves media files into numbered IMG/ and RND/ folders ordered by capture
//! time taken from EXIF data, container metadata or file system timestamps.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use media_sorter::{Cli, Config, FileResult, ProcessingStatus, Processor};
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, filter::LevelFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Colored summary output for the terminal

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(format!("{}\n", "─".repeat(60))));
    }

    pub fn print_title(title: &str) {
        let _ = stdout().execute(Print(format!("{}\n", title.bold())));
    }

    pub fn print_warning(msg: &str) {
        let _ = stdout().execute(Print(style("⚠ ").with(CliTheme::WARNING).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_hint(msg: &str) {
        let _ = stdout().execute(Print(style("→ ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Print a statistic line
    pub fn print_stat(key: &str, value: usize, color: Color) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(key).with(CliTheme::HINT)));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(style(value.to_string()).with(color).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print one processed file
    pub fn print_result(status_icon: &str, status_color: Color, source: &str, dest_or_msg: &str) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(status_icon).with(status_color).bold()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(source).italic()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(dest_or_msg).with(CliTheme::HINT)));
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = merge_config(&cli)?;

    if let Some(ref save_path) = cli.save_config {
        config.save_to_file(save_path)?;
        println!("Configuration saved to: {}", save_path.display());
        return Ok(());
    }

    let log_path = cli.log_file.clone().unwrap_or_else(default_log_path);
    let _guard = setup_logging(config.verbose, cli.json_log, &log_path)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Media Sorter starting");
    if let Some(ref config_path) = cli.config {
        info!(config_file = %config_path.display(), "Configuration loaded from file");
    }

    check_config(&config)?;
    if config.verbose {
        info!(?config, "Configuration loaded");
    }
    info!(log_file = %log_path.display(), "Log file location");

    println!("Starting Media Sorter");
    if config.dry_run {
        println!("Dry run mode: no files will be moved or backed up.");
    }
    if let Some(backup_dir) = config.active_backup_dir() {
        println!("Backups will be stored in: {}", backup_dir.display());
    }

    let mut processor = Processor::new(config)?;

    match processor.run() {
        Ok(results) => {
            print_summary(&processor, &results, processor.config().verbose);
            info!(log_file = %log_path.display(), "Processing complete. Log saved to");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Processing failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_summary(processor: &Processor, results: &[FileResult], verbose: bool) {
    use cli_output::*;

    let stats = processor.stats();

    print_separator();
    print_title("Done organizing files.");
    print_separator();
    print_stat("Total processed", stats.total, CliTheme::SUCCESS);
    print_stat("EXIF count", stats.exif, CliTheme::SUCCESS);
    print_stat("Fallback count", stats.fallback, CliTheme::ACCENT);
    print_stat("Skipped", stats.skipped(), CliTheme::WARNING);
    if stats.failed > 0 {
        print_stat("Failed moves", stats.failed, CliTheme::ERROR);
    }
    if stats.unreadable > 0 {
        print_stat("Unreadable", stats.unreadable, CliTheme::ERROR);
    }
    if stats.removed_dirs > 0 {
        print_stat("Removed empty folders", stats.removed_dirs, CliTheme::HINT);
    }

    if verbose {
        print_separator();
        for result in results {
            let source = result.source.display().to_string();
            let dest = result
                .destination
                .as_ref()
                .map(|p| format!("→ {}", p.display()))
                .unwrap_or_default();
            match result.status {
                ProcessingStatus::Moved => print_result("✓", CliTheme::SUCCESS, &source, &dest),
                ProcessingStatus::DryRun => print_result("~", CliTheme::ACCENT, &source, &dest),
                ProcessingStatus::Failed | ProcessingStatus::Unreadable => print_result(
                    "✗",
                    CliTheme::ERROR,
                    &source,
                    result.error.as_deref().unwrap_or("unknown error"),
                ),
                ProcessingStatus::Unsupported => {
                    print_result("⊘", CliTheme::WARNING, &source, "unsupported extension")
                }
            }
        }
    }

    print_separator();
    if let Some(backup_dir) = processor.config().active_backup_dir() {
        print_hint(&format!("Backups stored in: {}", backup_dir.display()));
        if stats.backup_failures > 0 {
            print_warning(&format!(
                "{} backups could not be made. See log for details.",
                stats.backup_failures
            ));
        }
    }
    if stats.unsupported > 0 {
        print_warning(&format!(
            "{} files were skipped (unsupported extension).",
            stats.unsupported
        ));
    }
    if stats.dry_run {
        print_warning("Dry run: nothing was moved or backed up.");
    }
}

/// `logs/log_file-<timestamp>.txt` in the working directory
fn default_log_path() -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    PathBuf::from("logs").join(format!("log_file-{}.txt", timestamp))
}

/// Merge the config file (if any) with CLI arguments
fn merge_config(cli: &Cli) -> Result<Config> {
    match cli.config {
        Some(ref config_path) => {
            let file_config = Config::load_from_file(config_path)?;
            Ok(cli.merge_with_config(file_config))
        }
        None => Ok(cli.to_config()),
    }
}

/// Reject configurations a run cannot start with
fn check_config(config: &Config) -> Result<()> {
    if config.input_dir.as_os_str().is_empty() {
        anyhow::bail!("No input directory given (positional argument or `input_dir` in config)");
    }
    config.validate()?;
    Ok(())
}

/// Setup logging: everything to the log file, warnings (or INFO with -v) to stderr
fn setup_logging(verbose: bool, json_log: bool, log_path: &Path) -> Result<WorkerGuard> {
    let console_level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::DEBUG.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let file_layer = if json_log {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(non_blocking)
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(false)
            .with_writer(non_blocking)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_level),
        )
        .init();

    Ok(guard)
}
