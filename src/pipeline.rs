//! The split and push workflows, composed from the other modules.

use crate::application::Application;
use crate::archive::{self, Part, SevenZip};
use crate::batch::{self, Batch};
use crate::error::{Error, Result};
use crate::git::Git;
use crate::hosting::{GitHubCli, qualified_name};
use crate::manifest::Manifest;
use crate::preflight::{self, SpaceCheck};
use crate::push::{self, PushOptions, PushReport};
use crate::size::{SplitSize, estimate_parts, format_mib, safe_split_size};
use crate::tools::{Needs, Toolchain};
use std::fs;
use std::path::{Path, PathBuf};

/// Inputs of [`run_split`]. Archive, hosting and git settings come from
/// the [`Application`] passed alongside.
#[derive(Debug, Clone, Default)]
pub struct SplitRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Simulate: validate and print the plan without writing anything.
    pub dry_run: bool,
    /// Continue on low disk space without asking.
    pub assume_yes: bool,
    /// Publish the batch repositories after splitting.
    pub push: bool,
    /// Hosted repository base name; the destination directory name when unset.
    pub repo_name: Option<String>,
}

/// One repository of the result.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub index: usize,
    pub dir: PathBuf,
    pub parts: Vec<Part>,
    /// Local commits not yet on the remote branch (push dry runs only).
    pub unpushed: u64,
    pub push: Option<PushReport>,
}

impl BatchReport {
    pub fn bytes(&self) -> u64 {
        self.parts.iter().map(|p| p.size).sum()
    }
}

#[derive(Debug, Clone)]
pub struct SplitReport {
    pub archive_name: String,
    pub destination: PathBuf,
    pub split: SplitSize,
    pub source_bytes: u64,
    /// The archiver invocation, as it would be typed in a shell.
    pub command: String,
    pub dry_run: bool,
    /// Estimated volume count for dry runs, the actual count otherwise.
    pub part_count: u64,
    /// For dry runs, planned from the uncompressed size (an upper bound).
    pub batches: Vec<BatchReport>,
}

fn absolute(path: &Path) -> Result<PathBuf> {
    let path = std::path::absolute(path)?;
    Ok(path.canonicalize().unwrap_or(path))
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string())
}

fn git_for(tools: &Toolchain, settings: &Application, repo: &Path) -> Option<Git> {
    tools
        .git
        .as_ref()
        .map(|program| Git::new(program, repo).with_identity(settings.git.identity()))
}

/// Volumes a split of `total` bytes would produce, each `split` bytes except the last.
fn estimated_parts(dest: &Path, archive_name: &str, total: u64, split: SplitSize) -> Vec<Part> {
    let count = estimate_parts(total, split.size);
    let mut remaining = total;
    (1..=count)
        .map(|i| {
            let size = remaining.min(split.size.bytes());
            remaining -= size;
            Part::new(
                dest.join(archive::volume_name(archive_name, i as u32)),
                size,
            )
        })
        .collect()
}

fn batch_reports(dest: &Path, batches: Vec<Batch>) -> Vec<BatchReport> {
    batches
        .into_iter()
        .map(|b| BatchReport {
            index: b.index,
            dir: batch::batch_dir(dest, b.index),
            parts: b.parts,
            unpushed: 0,
            push: None,
        })
        .collect()
}

/// Compresses `request.source` into a verified split archive in
/// `request.destination`, distributes the volumes over batch repositories
/// and optionally pushes them.
///
/// # Errors
/// Fails on the first check that does not pass. Volumes written by a failed
/// or interrupted compression, or by one that fails verification, are removed.
pub fn run_split(
    request: &SplitRequest,
    settings: &Application,
    tools: &Toolchain,
) -> Result<SplitReport> {
    let source = absolute(&request.source)?;
    let dest = absolute(&request.destination)?;
    let dry_run = request.dry_run;
    let archive_name = archive::archive_name(&source);
    let output = dest.join(&archive_name);
    let use_git = settings.git.init || request.push;

    log::info!("--- 1. Pre-flight Checks: {} ---", dir_name(&source));
    let split = safe_split_size(settings.archive.split_size, settings.hosting.file_limit)?;
    preflight::check_permissions(&source, &dest)?;
    if dry_run {
        if tools.seven_zip.is_none() {
            log::warn!("7-Zip was not found; it is required for a real run");
        }
    } else {
        tools.require(Needs {
            seven_zip: true,
            git: use_git,
            gh: request.push,
        })?;
    }
    if request.push && !dry_run {
        GitHubCli::new(tools.gh()?).ensure_authenticated()?;
    }

    let git = if use_git {
        git_for(tools, settings, &dest)
    } else {
        None
    };
    if dry_run {
        log::info!("[DRY RUN] Would create directory: {}", dest.display());
    } else {
        fs::create_dir_all(&dest)?;
        if let Some(git) = &git {
            git.ensure_init();
        }
    }

    let first = dest.join(archive::volume_name(&archive_name, 1));
    if first.exists() {
        return Err(Error::ArchiveExists(first));
    }

    let program = tools.seven_zip.clone().unwrap_or_else(|| PathBuf::from("7z"));
    let seven_zip = SevenZip::new(program)
        .with_level(settings.archive.level)
        .with_method(settings.archive.method.clone())
        .with_solid(settings.archive.solid);

    log::info!("Calculating source size...");
    let space = SpaceCheck::measure(&source, &dest);
    log::info!("Source size: {}", format_mib(space.source_bytes));
    preflight::confirm_low_space(&space, dry_run, request.assume_yes)?;

    log::info!("--- 2. Compressing & Splitting (Max: {}) ---", split.size);
    let command = seven_zip.render_command(&output, &source, split.size);

    if dry_run {
        let parts = estimated_parts(&dest, &archive_name, space.source_bytes, split);
        let plan = batch::plan_batches(
            &parts,
            settings.hosting.repo_limit,
            batch::existing_load(&dest, &[]),
        )?;
        return Ok(SplitReport {
            archive_name,
            destination: dest.clone(),
            split,
            source_bytes: space.source_bytes,
            command,
            dry_run,
            part_count: parts.len() as u64,
            batches: batch_reports(&dest, plan),
        });
    }

    if let Err(e) = seven_zip.compress(&output, &source, split.size) {
        archive::cleanup_partial_files(&dest, &archive_name);
        return Err(e);
    }

    log::info!("--- 3. Verifying Integrity ---");
    let first = archive::first_volume(&dest, &archive_name)?;
    if let Err(e) = seven_zip.test(&first) {
        log::error!("Archive verification failed! Data may be corrupt.");
        archive::cleanup_partial_files(&dest, &archive_name);
        return Err(e);
    }
    log::info!("Archive verified successfully.");

    let parts = archive::list_parts(&dest, &archive_name)?;
    let plan = batch::plan_batches(
        &parts,
        settings.hosting.repo_limit,
        batch::existing_load(&dest, &parts),
    )?;
    let placed = batch::materialize(&dest, &plan, git.as_ref())?;
    write_manifests(&dest, &source, &archive_name, split, &placed)?;
    if placed.len() > 1 {
        log::info!(
            "Content exceeds the {} repository limit; split over {} repositories",
            settings.hosting.repo_limit,
            placed.len()
        );
    }

    let mut batches = batch_reports(&dest, placed);
    if request.push {
        let base = request.repo_name.clone().unwrap_or_else(|| dir_name(&dest));
        for report in &mut batches {
            report.push = Some(publish(&report.dir, report.index, &base, settings, tools)?);
        }
    }

    log::info!("[DONE] Archive saved to: {}", dest.display());
    Ok(SplitReport {
        archive_name,
        destination: dest,
        split,
        source_bytes: space.source_bytes,
        command,
        dry_run,
        part_count: parts.len() as u64,
        batches,
    })
}

fn write_manifests(
    dest: &Path,
    source: &Path,
    archive_name: &str,
    split: SplitSize,
    batches: &[Batch],
) -> Result<()> {
    let total_parts: usize = batches.iter().map(|b| b.parts.len()).sum();
    let total_bytes: u64 = batches.iter().map(Batch::bytes).sum();
    let batch_count = batches.iter().map(|b| b.index).max().unwrap_or(1);
    for b in batches {
        let manifest = Manifest {
            archive: archive_name.to_string(),
            source: dir_name(source),
            split_size: split.size.to_string(),
            total_parts,
            total_bytes,
            batch: b.index,
            batch_count,
            parts: b.parts.iter().map(Part::file_name).collect(),
        };
        let path = manifest.write(&batch::batch_dir(dest, b.index))?;
        log::debug!("Wrote {} ({})", path.display(), manifest.summary());
    }
    Ok(())
}

/// Ensures the repository in `dir` has a hosted remote, then pushes its
/// pending files in chunks.
fn publish(
    dir: &Path,
    index: usize,
    base_name: &str,
    settings: &Application,
    tools: &Toolchain,
) -> Result<PushReport> {
    let git = Git::new(tools.git()?, dir).with_identity(settings.git.identity());
    if !git.is_repo() {
        git.init()?;
    }
    let options = PushOptions::from(&settings.push);
    if !git.has_remote(&options.remote)? {
        let name = qualified_name(
            settings.hosting.owner.as_deref(),
            &batch::repo_name(base_name, index),
        );
        GitHubCli::new(tools.gh()?).create_repo(
            &name,
            settings.hosting.visibility,
            dir,
            &options.remote,
        )?;
    }
    log::info!("--- Pushing batch {index}: {} ---", dir.display());
    push::push_repository(&git, &options)
}

/// Files a push of `dir` would commit: untracked files of the repository
/// `git` when given, otherwise every top-level file of `dir`.
fn pending_in(dir: &Path, git: Option<&Git>) -> Result<Vec<Part>> {
    if let Some(git) = git {
        return push::pending_files(git);
    }
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(Part::new(entry.file_name(), entry.metadata()?.len()));
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Pushes the destination and every batch repository next to it.
///
/// Repositories without the configured remote get one created on the
/// hosting service first. Dry runs only report what is pending.
pub fn run_push(
    destination: &Path,
    repo_name: Option<&str>,
    dry_run: bool,
    settings: &Application,
    tools: &Toolchain,
) -> Result<Vec<BatchReport>> {
    let dest = absolute(destination)?;
    if !dest.is_dir() {
        return Err(Error::SourceUnreadable(dest));
    }
    if !dry_run {
        tools.require(Needs {
            seven_zip: false,
            git: true,
            gh: true,
        })?;
        GitHubCli::new(tools.gh()?).ensure_authenticated()?;
    }
    let base = repo_name.map(str::to_string).unwrap_or_else(|| dir_name(&dest));
    let mut reports = vec![];
    for (index, dir) in batch::discover_batch_dirs(&dest)? {
        let report = if dry_run {
            let git = git_for(tools, settings, &dir).filter(Git::is_repo);
            let pending = pending_in(&dir, git.as_ref())?;
            let unpushed = match &git {
                Some(git) => git.unpushed_count(&settings.push.remote, &settings.push.branch)?,
                None => 0,
            };
            log::info!(
                "[DRY RUN] Would push {} file(s) and {unpushed} earlier commit(s) from {} to {}",
                pending.len(),
                dir.display(),
                qualified_name(
                    settings.hosting.owner.as_deref(),
                    &batch::repo_name(&base, index)
                )
            );
            BatchReport {
                index,
                dir,
                parts: pending,
                unpushed,
                push: None,
            }
        } else {
            let push = publish(&dir, index, &base, settings, tools)?;
            BatchReport {
                index,
                dir,
                parts: vec![],
                unpushed: 0,
                push: Some(push),
            }
        };
        reports.push(report);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size::ByteSize;

    fn split(bytes: u64) -> SplitSize {
        SplitSize {
            size: ByteSize::new(bytes),
            clamped: false,
        }
    }

    #[test]
    fn test_estimated_parts() {
        let parts = estimated_parts(Path::new("/out"), "d.7z", 250, split(100));
        let sizes: Vec<u64> = parts.iter().map(|p| p.size).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(parts[2].path, PathBuf::from("/out/d.7z.003"));
        assert!(estimated_parts(Path::new("/out"), "d.7z", 0, split(100)).is_empty());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("source_data");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("test.txt"), "This is a test file for githubify.".repeat(100))
            .unwrap();
        let dest = root.path().join("output_data");

        let request = SplitRequest {
            source: source.clone(),
            destination: dest.clone(),
            dry_run: true,
            ..SplitRequest::default()
        };
        let report = run_split(&request, &Application::new(), &Toolchain::default()).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.archive_name, "source_data.7z");
        assert_eq!(report.part_count, 1);
        assert!(report.command.contains("-v40m"));
        assert_eq!(report.batches.len(), 1);
        assert!(!dest.exists());
    }

    #[test]
    fn test_dry_run_refuses_existing_archive() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("data");
        fs::create_dir(&source).unwrap();
        let dest = root.path().join("out");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("data.7z.001"), b"old").unwrap();

        let request = SplitRequest {
            source,
            destination: dest,
            dry_run: true,
            ..SplitRequest::default()
        };
        let err = run_split(&request, &Application::new(), &Toolchain::default()).unwrap_err();
        assert!(matches!(err, Error::ArchiveExists(_)));
    }

    #[test]
    fn test_real_run_requires_7z() {
        let root = tempfile::tempdir().unwrap();
        let request = SplitRequest {
            source: root.path().to_path_buf(),
            destination: root.path().join("out"),
            ..SplitRequest::default()
        };
        let err = run_split(&request, &Application::new(), &Toolchain::default()).unwrap_err();
        assert!(matches!(err, Error::ToolMissing { tool: "7-Zip", .. }));
    }

    #[test]
    fn test_dry_run_push_lists_pending_files() {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("case");
        let batch2 = root.path().join("case-batch-2");
        fs::create_dir(&dest).unwrap();
        fs::create_dir(&batch2).unwrap();
        fs::write(dest.join("case.7z.001"), b"aaaa").unwrap();
        fs::write(batch2.join("case.7z.002"), b"bb").unwrap();

        let reports = run_push(&dest, None, true, &Application::new(), &Toolchain::default())
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].bytes(), 4);
        assert_eq!(reports[1].index, 2);
        assert_eq!(reports[1].parts[0].file_name(), "case.7z.002");
    }
}
