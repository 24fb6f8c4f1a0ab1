//! Pre-flight checks run before anything is written: permissions, sizes
//! and free space.

use crate::constants::MANIFEST_NAME;
use crate::error::{Error, Result};
use crate::size::format_mib;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Returns the path itself if it exists, otherwise its closest existing parent.
pub fn nearest_existing_ancestor(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|p| !p.as_os_str().is_empty() && p.exists())
        .map(Path::to_path_buf)
}

fn is_readable(path: &Path) -> bool {
    if path.is_dir() {
        fs::read_dir(path).is_ok()
    } else {
        fs::File::open(path).is_ok()
    }
}

fn is_writable_dir(dir: &Path) -> bool {
    tempfile::Builder::new()
        .prefix(".githubify-write-check")
        .tempfile_in(dir)
        .is_ok()
}

/// Validates read access to `source` and write access to `dest`, or to the
/// nearest ancestor of `dest` that already exists.
///
/// # Errors
/// [`Error::SourceUnreadable`] or [`Error::DestinationNotWritable`].
pub fn check_permissions(source: &Path, dest: &Path) -> Result<()> {
    if !source.exists() || !is_readable(source) {
        return Err(Error::SourceUnreadable(source.to_path_buf()));
    }
    let checked = nearest_existing_ancestor(dest).unwrap_or_else(|| dest.to_path_buf());
    if !checked.is_dir() || !is_writable_dir(&checked) {
        return Err(Error::DestinationNotWritable(checked));
    }
    Ok(())
}

/// Recursively calculates the total size of regular files under `path` in bytes.
///
/// Entries that cannot be read are logged and skipped. A missing path is 0.
pub fn dir_size(path: &Path) -> u64 {
    sized_files(path, |_| false)
}

/// Bytes already committed to a repository directory, ignoring `.git` and
/// the manifest.
pub fn payload_size(repo: &Path) -> u64 {
    sized_files(repo, |entry| {
        entry.depth() == 1 && (entry.file_name() == ".git" || entry.file_name() == MANIFEST_NAME)
    })
}

fn sized_files(path: &Path, skip: impl Fn(&walkdir::DirEntry) -> bool) -> u64 {
    if !path.exists() {
        return 0;
    }
    let mut total = 0;
    let walker = WalkDir::new(path).into_iter().filter_entry(|e| !skip(e));
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => match entry.metadata() {
                Ok(meta) => total += meta.len(),
                Err(e) => log::warn!("Permission denied accessing: {} ({e})", entry.path().display()),
            },
            Ok(_) => {}
            Err(e) => {
                let at = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                log::warn!("Permission denied accessing: {at} ({e})");
            }
        }
    }
    total
}

/// Source size against the free space at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceCheck {
    pub source_bytes: u64,
    /// `None` when free space could not be determined.
    pub available_bytes: Option<u64>,
}

impl SpaceCheck {
    /// Measures `source` and queries free space on the volume holding `dest`.
    pub fn measure(source: &Path, dest: &Path) -> Self {
        let source_bytes = dir_size(source);
        let available_bytes = nearest_existing_ancestor(dest).and_then(|dir| {
            fs2::available_space(&dir)
                .map_err(|e| log::warn!("Could not query free space on {}: {e}", dir.display()))
                .ok()
        });
        Self {
            source_bytes,
            available_bytes,
        }
    }

    /// Free space below the uncompressed source size.
    pub fn is_low(&self) -> bool {
        self.available_bytes
            .is_some_and(|available| available < self.source_bytes)
    }
}

/// Decides whether to continue when [`SpaceCheck::is_low`].
///
/// Dry runs and `assume_yes` continue; an interactive terminal is asked;
/// non-interactive sessions continue with a warning.
///
/// # Errors
/// [`Error::LowSpaceDeclined`] when the user answers no.
pub fn confirm_low_space(check: &SpaceCheck, dry_run: bool, assume_yes: bool) -> Result<()> {
    if !check.is_low() {
        return Ok(());
    }
    log::warn!(
        "Low disk space! Free: {}, Source: {}",
        format_mib(check.available_bytes.unwrap_or(0)),
        format_mib(check.source_bytes)
    );
    if dry_run || assume_yes {
        return Ok(());
    }
    if std::io::stdin().is_terminal() {
        let answer = dialoguer::Confirm::new()
            .with_prompt("Compression might fail or fill the disk. Continue?")
            .default(false)
            .interact();
        if !answer_or_decline(answer) {
            return Err(Error::LowSpaceDeclined);
        }
    } else {
        log::warn!("Non-interactive mode: Proceeding despite low disk space warning.");
    }
    Ok(())
}

/// A prompt that could not be answered counts as a refusal.
fn answer_or_decline(answer: dialoguer::Result<bool>) -> bool {
    answer.unwrap_or_else(|e| {
        log::warn!("Could not read the answer: {e}");
        false
    })
}
