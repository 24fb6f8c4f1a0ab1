//! Committing and pushing archive volumes a few at a time.
//!
//! One large push of several hundred megabytes tends to hit transport
//! timeouts, so pending files are grouped into chunks of bounded size and
//! each chunk gets its own commit and push. A push that keeps failing
//! aborts the run; chunks pushed before it stay on the remote and a later
//! run continues with the files that are still untracked.

use crate::application::PushSettings;
use crate::archive::Part;
use crate::batch::plan_push_chunks;
use crate::constants::MANIFEST_NAME;
use crate::error::{Error, Result};
use crate::git::Git;
use crate::size::ByteSize;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PushOptions {
    pub remote: String,
    pub branch: String,
    pub chunk_size: ByteSize,
    /// Extra attempts after the first failed push.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl From<&PushSettings> for PushOptions {
    fn from(settings: &PushSettings) -> Self {
        Self {
            remote: settings.remote.clone(),
            branch: settings.branch.clone(),
            chunk_size: settings.chunk_size,
            retries: settings.retries,
            retry_delay: settings.retry_delay(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Number of commit-and-push rounds.
    pub chunks: usize,
    pub files: usize,
    pub bytes: u64,
}

/// Untracked files of the repository, manifest first, then volumes in order.
pub fn pending_files(git: &Git) -> Result<Vec<Part>> {
    let mut pending = vec![];
    for name in git.untracked_files()? {
        let size = std::fs::metadata(git.repo().join(&name))?.len();
        pending.push(Part::new(name, size));
    }
    // zero-padded volume numbers grow in width past 999
    pending.sort_by_key(|p| {
        let name = p.path.to_string_lossy().into_owned();
        (name != MANIFEST_NAME, name.len(), name)
    });
    Ok(pending)
}

fn commit_message(names: &[String], chunk: usize, total: usize) -> String {
    let files = match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, .., last] => format!("{first}..{last}"),
    };
    format!("Add {files} (chunk {chunk}/{total})")
}

/// Wait before retry number `attempt`: `base * attempt`, saturating.
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}

/// The first push plus `retries` more, saturating.
fn total_attempts(retries: u32) -> u32 {
    retries.saturating_add(1)
}

/// Pushes HEAD, retrying with a linearly growing delay.
///
/// # Errors
/// [`Error::PushFailed`] once every attempt has failed.
pub fn push_with_retry(git: &Git, options: &PushOptions) -> Result<()> {
    let attempts = total_attempts(options.retries);
    for attempt in 1..=attempts {
        match git.push(&options.remote, &options.branch) {
            Ok(()) => return Ok(()),
            Err(e) => {
                log::warn!("Push attempt {attempt}/{attempts} failed: {e}");
                if attempt < attempts {
                    let delay = retry_delay(options.retry_delay, attempt);
                    log::info!("Retrying in {}s", delay.as_secs());
                    thread::sleep(delay);
                }
            }
        }
    }
    Err(Error::PushFailed {
        remote: options.remote.clone(),
        attempts,
    })
}

/// Commits every pending file in size-bounded chunks, pushing after each.
pub fn push_repository(git: &Git, options: &PushOptions) -> Result<PushReport> {
    let pending = pending_files(git)?;
    if pending.is_empty() {
        let unpushed = git.unpushed_count(&options.remote, &options.branch)?;
        if unpushed > 0 {
            log::info!(
                "Nothing new to commit in {}; pushing {unpushed} earlier commit(s)",
                git.repo().display()
            );
            push_with_retry(git, options)?;
        } else {
            log::info!("Nothing to push in {}", git.repo().display());
        }
        return Ok(PushReport::default());
    }

    let chunks = plan_push_chunks(&pending, options.chunk_size);
    let total = chunks.len();
    let mut report = PushReport::default();
    for (i, chunk) in chunks.iter().enumerate() {
        let names: Vec<String> = chunk
            .iter()
            .map(|p| p.path.to_string_lossy().into_owned())
            .collect();
        let bytes: u64 = chunk.iter().map(|p| p.size).sum();
        git.add(&names)?;
        git.commit(&commit_message(&names, i + 1, total))?;
        push_with_retry(git, options)?;
        log::info!(
            "Pushed chunk {}/{total}: {} file(s), {}",
            i + 1,
            names.len(),
            crate::size::format_mib(bytes)
        );
        report.chunks += 1;
        report.files += names.len();
        report.bytes += bytes;
    }
    Ok(report)
}
