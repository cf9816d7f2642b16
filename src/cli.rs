//! CLI argument parsing with clap

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Media Sorter - sort photos and videos by capture date
///
/// Files dated by EXIF metadata are numbered into IMG/, everything else
/// (container metadata or file modification time) into RND/.
#[derive(Parser, Debug)]
#[command(name = "media-sorter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input directory to scan
    pub input_dir: Option<PathBuf>,

    /// Output directory to place sorted files
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file (TOML format)
    ///
    /// Settings from the file are used as defaults; CLI arguments override them.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Directory to store backups
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Do not create backups
    #[arg(long)]
    pub no_backup: bool,

    /// Remove empty input directories after the move
    #[arg(long)]
    pub clean_empty: bool,

    /// Simulate without moving or backing up files
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Zone for timestamps without offset: "local", "utc" or e.g. "+09:00"
    #[arg(long)]
    pub timezone: Option<String>,

    /// ffprobe executable used for container metadata
    #[arg(long, env = "MEDIA_SORTER_FFPROBE")]
    pub ffprobe: Option<PathBuf>,

    /// Write the merged configuration to this TOML file and exit
    #[arg(long, value_name = "PATH")]
    pub save_config: Option<PathBuf>,

    /// Path to log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose console output (INFO level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref input) = self.input_dir {
            config.input_dir = input.clone();
        }
        if let Some(ref output) = self.output_dir {
            config.output_dir = output.clone();
        }
        if let Some(ref backup_dir) = self.backup_dir {
            config.backup_dir = Some(backup_dir.clone());
        }
        if self.no_backup {
            config.backup = false;
        }
        if self.clean_empty {
            config.clean_empty = true;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if let Some(ref timezone) = self.timezone {
            config.timezone = timezone.clone();
        }
        if let Some(ref ffprobe) = self.ffprobe {
            config.ffprobe = ffprobe.clone();
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
