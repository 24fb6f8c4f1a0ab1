//! Command-line interface definition for githubify.
//!
//! This module defines the CLI commands and their arguments, applies flag
//! overrides on top of the configuration file and prints command output.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use githubify::application::{self, Application};
use githubify::archive;
use githubify::hosting::Visibility;
use githubify::pipeline::{self, BatchReport, SplitReport, SplitRequest};
use githubify::size::{ByteSize, format_mib};
use githubify::tools::Toolchain;
use std::path::{Path, PathBuf};

/// Command-line interface definition for githubify.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Subcommand to execute.
    #[command(subcommand)]
    pub commands: Option<Commands>,
}

/// Supported githubify commands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Compress a directory into verified split 7-Zip volumes ready for a git host.
    Split {
        /// Directory or file to archive.
        source: PathBuf,
        /// Directory that receives the volumes; created if missing.
        destination: PathBuf,
        /// Volume size, e.g. 40m, 1g, 512k.
        #[arg(short, long, value_name = "SIZE")]
        split: Option<String>,
        /// Compression level, 0 (store) to 9 (ultra).
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=9))]
        level: Option<u8>,
        /// Print what would be done without writing anything.
        #[arg(short = 'n', long)]
        dry_run: bool,
        /// Continue without asking when disk space looks insufficient.
        #[arg(short, long)]
        yes: bool,
        /// Create the hosted repositories and push the volumes afterwards.
        #[arg(long)]
        push: bool,
        /// Do not initialize git repositories in the destination.
        #[arg(long, conflicts_with = "push")]
        no_git: bool,
        #[command(flatten)]
        hosting: HostingArgs,
    },
    /// Push the destination and its batch repositories in size-bounded chunks.
    Push {
        /// Destination directory produced by `split`.
        destination: PathBuf,
        /// Show pending files per repository without pushing.
        #[arg(short = 'n', long)]
        dry_run: bool,
        #[command(flatten)]
        hosting: HostingArgs,
    },
    /// Report the external tools githubify needs and where they were found.
    Check,
    /// Display the absolute path of the configuration file and manage config backup/reset/rollback.
    Config {
        /// Backup the configuration file.
        #[arg(short = 'c', long, required = false, conflicts_with_all = ["reset", "rollback"])]
        copy: bool,
        /// Reset the configuration file and back up the file before resetting.
        #[arg(short = 'r', long, required = false, conflicts_with_all = ["copy", "rollback"])]
        reset: bool,
        /// Rollback the last backed up configuration file.
        #[arg(short = 'R', long, required = false, conflicts_with_all = ["copy", "reset"])]
        rollback: bool,
    },
}

/// Hosting and push overrides shared by `split` and `push`.
#[derive(Args, Debug, Default)]
pub(crate) struct HostingArgs {
    /// Maximum content per repository before a new batch repository is started.
    #[arg(long, value_name = "SIZE")]
    batch_limit: Option<String>,
    /// Maximum size committed and pushed at once.
    #[arg(long, value_name = "SIZE")]
    push_chunk: Option<String>,
    /// Create public repositories instead of private ones.
    #[arg(long)]
    public: bool,
    /// User or organization that owns the created repositories.
    #[arg(long)]
    owner: Option<String>,
    /// Base name of the hosted repositories (default: destination directory name).
    #[arg(long)]
    name: Option<String>,
}

impl HostingArgs {
    fn apply(&self, settings: &mut Application) -> githubify::Result<()> {
        if let Some(limit) = &self.batch_limit {
            settings.hosting.repo_limit = limit.parse()?;
        }
        if let Some(chunk) = &self.push_chunk {
            settings.push.chunk_size = chunk.parse()?;
        }
        if self.public {
            settings.hosting.visibility = Visibility::Public;
        }
        if let Some(owner) = &self.owner {
            settings.hosting.owner = Some(owner.clone());
        }
        Ok(())
    }
}

/// Loads the configuration file, creating it with defaults on first use.
fn load_settings() -> anyhow::Result<Application> {
    if let Err(e) = application::init_config() {
        log::debug!("Could not initialize the configuration file: {e}");
    }
    Ok(Application::load_config()?)
}

/// Runs `split`.
///
/// # Errors
/// Returns the first failing step of the split workflow.
#[allow(clippy::too_many_arguments)]
pub(crate) fn split(
    source: PathBuf,
    destination: PathBuf,
    split: Option<String>,
    level: Option<u8>,
    dry_run: bool,
    yes: bool,
    push: bool,
    no_git: bool,
    hosting: HostingArgs,
) -> anyhow::Result<()> {
    let mut settings = load_settings()?;
    if let Some(split) = split {
        settings.archive.split_size = split.parse::<ByteSize>()?;
    }
    if let Some(level) = level {
        settings.archive.level = level;
    }
    if no_git {
        settings.git.init = false;
    }
    hosting.apply(&mut settings)?;

    let tools = Toolchain::discover(&settings);
    let request = SplitRequest {
        source,
        destination,
        dry_run,
        assume_yes: yes,
        push,
        repo_name: hosting.name,
    };
    let report = pipeline::run_split(&request, &settings, &tools)
        .with_context(|| format!("failed to split {}", request.source.display()))?;
    if report.dry_run {
        print_plan(&report);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_plan(report: &SplitReport) {
    println!("[DRY RUN] Command: {}", report.command);
    println!("[DRY RUN] Would create:");
    for i in 1..=report.part_count.clamp(1, 2) {
        println!("  - {}", archive::volume_name(&report.archive_name, i as u32));
    }
    if report.part_count > 2 {
        println!("  - ...");
    }
    println!(
        "[DRY RUN] Source: {}, at most {} part(s) of {}",
        format_mib(report.source_bytes),
        report.part_count,
        report.split.size
    );
    print_batches(&report.batches);
}

fn print_batches(batches: &[BatchReport]) {
    for batch in batches {
        println!(
            "  batch {}: {} ({} part(s), {})",
            batch.index,
            batch.dir.display(),
            batch.parts.len(),
            format_mib(batch.bytes())
        );
    }
}

fn print_summary(report: &SplitReport) {
    println!(
        "{}: {} part(s) of at most {} in {}",
        report.archive_name,
        report.part_count,
        report.split.size,
        report.destination.display()
    );
    print_batches(&report.batches);
    for batch in &report.batches {
        if let Some(push) = &batch.push {
            println!(
                "  batch {} pushed: {} chunk(s), {} file(s), {}",
                batch.index,
                push.chunks,
                push.files,
                format_mib(push.bytes)
            );
        }
    }
}

/// Runs `push`.
pub(crate) fn push(destination: &Path, dry_run: bool, hosting: HostingArgs) -> anyhow::Result<()> {
    let mut settings = load_settings()?;
    hosting.apply(&mut settings)?;
    let tools = Toolchain::discover(&settings);
    let reports = pipeline::run_push(
        destination,
        hosting.name.as_deref(),
        dry_run,
        &settings,
        &tools,
    )
    .with_context(|| format!("failed to push {}", destination.display()))?;
    for report in &reports {
        match &report.push {
            Some(push) => println!(
                "{}: {} chunk(s), {} file(s), {}",
                report.dir.display(),
                push.chunks,
                push.files,
                format_mib(push.bytes)
            ),
            None => {
                println!(
                    "{}: {} pending file(s), {}, {} unpushed commit(s)",
                    report.dir.display(),
                    report.parts.len(),
                    format_mib(report.bytes()),
                    report.unpushed
                );
                for part in &report.parts {
                    println!("  - {}", part.path.display());
                }
            }
        }
    }
    Ok(())
}

/// Prints where each external tool was found. Fails when 7-Zip or git is missing.
pub(crate) fn check() -> anyhow::Result<()> {
    let settings = load_settings()?;
    let tools = Toolchain::discover(&settings);
    for (name, path) in tools.entries() {
        match path {
            Some(path) => println!("{name:<6} {}", path.display()),
            None => println!("{name:<6} not found"),
        }
    }
    tools.require(githubify::tools::Needs {
        seven_zip: true,
        git: true,
        gh: false,
    })?;
    Ok(())
}

/// Prints the absolute path to the configuration file.
pub(crate) fn config() -> anyhow::Result<()> {
    println!("config file: {}", application::config_file()?.display());
    Ok(())
}

/// Back up the configuration file to a backup location.
pub(crate) fn backup_config_file() -> anyhow::Result<()> {
    let backup = application::backup_config_file().context("failed to backup configuration file")?;
    println!("Backup successfully! {}", backup.display());
    Ok(())
}

/// Reset the configuration file and back up the file before resetting.
pub(crate) fn reset_config_file() -> anyhow::Result<()> {
    application::reset_config_file().context("failed to reset configuration file")?;
    println!("Configuration file reset successfully!");
    Ok(())
}

/// Rollback the last backed up configuration file.
pub(crate) fn rollback_config_file() -> anyhow::Result<()> {
    application::rollback_config_file().context("failed to rollback configuration file")?;
    println!("Configuration file rolled back successfully.");
    Ok(())
}
