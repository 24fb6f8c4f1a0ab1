//! Distribution of archive volumes over batch repositories and push chunks.
//!
//! A hosted repository has a soft size limit. Volumes are assigned in
//! order to the destination repository until it would exceed that limit,
//! then to `<dest>-batch-2`, `<dest>-batch-3`, ... which are created as
//! siblings of the destination.

use crate::archive::Part;
use crate::error::{Error, Result};
use crate::git::Git;
use crate::preflight::payload_size;
use crate::size::ByteSize;
use std::fs;
use std::path::{Path, PathBuf};

/// Volumes assigned to one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 1 is the destination itself.
    pub index: usize,
    pub parts: Vec<Part>,
}

impl Batch {
    pub fn bytes(&self) -> u64 {
        self.parts.iter().map(|p| p.size).sum()
    }
}

fn ensure_fits(part: &Part, limit: ByteSize) -> Result<()> {
    if part.size > limit.bytes() {
        return Err(Error::PartExceedsLimit {
            part: part.file_name(),
            size: part.size,
            limit: limit.bytes(),
        });
    }
    Ok(())
}

/// Assigns `parts` in order to repositories holding at most `repo_limit`
/// bytes each. Repository `n` already holds `baseline(n)` bytes.
///
/// Batches that end up empty are left out, so the first returned batch can
/// have an index above 1 when the destination is already full.
///
/// # Errors
/// [`Error::PartExceedsLimit`] when a single part is larger than `repo_limit`.
pub fn plan_batches(
    parts: &[Part],
    repo_limit: ByteSize,
    baseline: impl Fn(usize) -> u64,
) -> Result<Vec<Batch>> {
    let mut batches = vec![];
    let mut current = Batch {
        index: 1,
        parts: vec![],
    };
    let mut used = baseline(1);
    for part in parts {
        ensure_fits(part, repo_limit)?;
        while used.saturating_add(part.size) > repo_limit.bytes() {
            let next = current.index + 1;
            let full = std::mem::replace(
                &mut current,
                Batch {
                    index: next,
                    parts: vec![],
                },
            );
            if !full.parts.is_empty() {
                batches.push(full);
            }
            used = baseline(next);
        }
        used += part.size;
        current.parts.push(part.clone());
    }
    if !current.parts.is_empty() {
        batches.push(current);
    }
    Ok(batches)
}

/// Bytes already stored in each batch repository of `dest`, excluding the
/// volumes in `pending` that are about to be distributed.
pub fn existing_load(dest: &Path, pending: &[Part]) -> impl Fn(usize) -> u64 {
    let dest = dest.to_path_buf();
    let pending: Vec<(PathBuf, u64)> = pending.iter().map(|p| (p.path.clone(), p.size)).collect();
    move |index| {
        let dir = batch_dir(&dest, index);
        let staged: u64 = pending
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir.as_path()))
            .map(|(_, size)| size)
            .sum();
        payload_size(&dir).saturating_sub(staged)
    }
}

/// Groups `parts` so that each `git push` carries at most `chunk_limit`
/// bytes. A part larger than the limit is pushed on its own.
pub fn plan_push_chunks(parts: &[Part], chunk_limit: ByteSize) -> Vec<Vec<Part>> {
    let mut chunks: Vec<Vec<Part>> = vec![];
    let mut used = 0;
    for part in parts {
        match chunks.last_mut() {
            Some(chunk) if used + part.size <= chunk_limit.bytes() => {
                used += part.size;
                chunk.push(part.clone());
            }
            _ => {
                used = part.size;
                chunks.push(vec![part.clone()]);
            }
        }
    }
    chunks
}

fn dir_name(dest: &Path) -> String {
    dest.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string())
}

/// Directory of repository `index`: the destination for 1, a sibling
/// `<dest>-batch-<index>` otherwise.
pub fn batch_dir(dest: &Path, index: usize) -> PathBuf {
    if index <= 1 {
        return dest.to_path_buf();
    }
    let name = format!("{}-batch-{index}", dir_name(dest));
    match dest.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Hosted repository name of batch `index`.
pub fn repo_name(base: &str, index: usize) -> String {
    if index <= 1 {
        base.to_string()
    } else {
        format!("{base}-batch-{index}")
    }
}

/// The destination and every existing batch sibling, in batch order.
pub fn discover_batch_dirs(dest: &Path) -> Result<Vec<(usize, PathBuf)>> {
    let mut dirs = vec![(1, dest.to_path_buf())];
    let Some(parent) = dest.parent() else {
        return Ok(dirs);
    };
    let prefix = format!("{}-batch-", dir_name(dest));
    let mut found = vec![];
    for entry in fs::read_dir(parent)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(index) = name
            .strip_prefix(&prefix)
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| *n > 1)
        {
            found.push((index, entry.path()));
        }
    }
    found.sort_by_key(|(index, _)| *index);
    dirs.extend(found);
    Ok(dirs)
}

/// Creates the batch repositories and moves each batch's parts into them.
///
/// Returns the batches with part paths updated to their new location.
pub fn materialize(dest: &Path, batches: &[Batch], git: Option<&Git>) -> Result<Vec<Batch>> {
    let mut placed = Vec::with_capacity(batches.len());
    for batch in batches {
        let dir = batch_dir(dest, batch.index);
        fs::create_dir_all(&dir)?;
        if let Some(git) = git {
            git.for_repo(&dir).ensure_init();
        }
        let mut parts = Vec::with_capacity(batch.parts.len());
        for part in &batch.parts {
            let target = dir.join(part.file_name());
            if part.path != target {
                log::debug!("Moving {} to {}", part.path.display(), target.display());
                fs::rename(&part.path, &target)?;
            }
            parts.push(Part::new(target, part.size));
        }
        if batch.index > 1 {
            log::info!(
                "Batch {} holds {} part(s) in {}",
                batch.index,
                parts.len(),
                dir.display()
            );
        }
        placed.push(Batch {
            index: batch.index,
            parts,
        });
    }
    Ok(placed)
}
