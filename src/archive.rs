//! Creating, testing and cleaning up split 7-Zip archives.
//!
//! Volumes follow 7-Zip's naming: `<name>.7z.001`, `<name>.7z.002`, ...

use crate::command::describe;
use crate::error::{Error, Result};
use crate::size::ByteSize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One archive volume on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub path: PathBuf,
    pub size: u64,
}

impl Part {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Archive file name for `source`: its last component plus `.7z`.
pub fn archive_name(source: &Path) -> String {
    let stem = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    format!("{stem}.7z")
}

/// Name of the n-th volume (1-based).
pub fn volume_name(archive_name: &str, index: u32) -> String {
    format!("{archive_name}.{index:03}")
}

/// Volume number of `file_name` when it belongs to `archive_name`.
/// The unsplit archive itself counts as volume 0.
fn volume_number(archive_name: &str, file_name: &str) -> Option<u32> {
    if file_name == archive_name {
        return Some(0);
    }
    let suffix = file_name.strip_prefix(archive_name)?.strip_prefix('.')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// The 7-Zip executable and the compression settings it is run with.
#[derive(Debug, Clone)]
pub struct SevenZip {
    program: PathBuf,
    level: u8,
    method: String,
    solid: bool,
}

impl SevenZip {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            level: 9,
            method: "lzma2".to_string(),
            solid: true,
        }
    }

    /// `-mx` level, 0 (store) to 9 (ultra).
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level.min(9);
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_solid(mut self, solid: bool) -> Self {
        self.solid = solid;
        self
    }

    pub fn compress_args(&self, output: &Path, source: &Path, split: ByteSize) -> Vec<OsString> {
        vec![
            "a".into(),
            output.into(),
            source.into(),
            "-t7z".into(),
            format!("-mx={}", self.level).into(),
            format!("-m0={}", self.method).into(),
            format!("-ms={}", if self.solid { "on" } else { "off" }).into(),
            split.to_7z_switch().into(),
        ]
    }

    /// The compression command as it would be typed in a shell.
    pub fn render_command(&self, output: &Path, source: &Path, split: ByteSize) -> String {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.compress_args(output, source, split));
        describe(&cmd)
    }

    /// Runs the compression, waiting for it while listening for Ctrl+C.
    ///
    /// # Errors
    /// [`Error::Interrupted`] when cancelled, [`Error::ArchiverFailed`] on a
    /// non-zero exit. Partial volumes are left for the caller to remove.
    pub fn compress(&self, output: &Path, source: &Path, split: ByteSize) -> Result<()> {
        let args = self.compress_args(output, source, split);
        log::debug!("Running: {}", self.render_command(output, source, split));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(async {
            let mut child = tokio::process::Command::new(&self.program)
                .args(&args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| Error::CommandFailed {
                    command: self.program.display().to_string(),
                    stderr: e.to_string(),
                })?;
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);
            tokio::select! {
                biased;
                _ = &mut ctrl_c => {
                    log::warn!("Process cancelled by user.");
                    if let Err(e) = child.kill().await {
                        log::debug!("Killing 7-Zip failed: {e}");
                    }
                    Err(Error::Interrupted)
                }
                status = child.wait() => {
                    let status = status?;
                    if status.success() {
                        return Ok(());
                    }
                    // Ctrl+C reaches 7-Zip as well and its exit can be seen first
                    tokio::select! {
                        biased;
                        _ = &mut ctrl_c => {
                            log::warn!("Process cancelled by user.");
                            Err(Error::Interrupted)
                        }
                        _ = tokio::task::yield_now() => Err(Error::ArchiverFailed(status.code())),
                    }
                }
            }
        })
    }

    /// Tests the archive starting at `first_volume`; 7-Zip follows the
    /// volume chain on its own.
    ///
    /// # Errors
    /// [`Error::VerifyFailed`] when the test does not pass.
    pub fn test(&self, first_volume: &Path) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("t")
            .arg(first_volume)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|e| Error::CommandFailed {
                command: self.program.display().to_string(),
                stderr: e.to_string(),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::VerifyFailed(first_volume.to_path_buf()))
        }
    }
}

/// The volume to hand to `7z t`: `.001`, or the unsplit archive when the
/// archiver did not split it.
///
/// # Errors
/// [`Error::ArchiveMissing`] when neither exists.
pub fn first_volume(dest: &Path, archive_name: &str) -> Result<PathBuf> {
    let first = dest.join(volume_name(archive_name, 1));
    if first.exists() {
        return Ok(first);
    }
    let whole = dest.join(archive_name);
    if whole.exists() {
        return Ok(whole);
    }
    Err(Error::ArchiveMissing)
}

/// All volumes of `archive_name` in `dest`, ordered by volume number.
pub fn list_parts(dest: &Path, archive_name: &str) -> Result<Vec<Part>> {
    let mut numbered = vec![];
    for entry in fs::read_dir(dest)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(number) = volume_number(archive_name, &name) {
            numbered.push((number, Part::new(entry.path(), entry.metadata()?.len())));
        }
    }
    numbered.sort_by_key(|(number, _)| *number);
    Ok(numbered.into_iter().map(|(_, part)| part).collect())
}

/// Removes the archive and every `<archive_name>.*` file from `dest`.
///
/// Returns the number of files deleted.
pub fn cleanup_partial_files(dest: &Path, archive_name: &str) -> usize {
    log::warn!("Cleaning up partial files...");
    let prefix = format!("{archive_name}.");
    let Ok(entries) = fs::read_dir(dest) else {
        return 0;
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name != archive_name && !name.starts_with(&prefix) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                log::info!(" - Deleted: {name}");
                removed += 1;
            }
            Err(e) => log::warn!(" - Failed to delete {name}: {e}"),
        }
    }
    removed
}
