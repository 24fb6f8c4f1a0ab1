//! Error type shared by every githubify operation.

use crate::sysexits;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Unified result type for the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("critical dependency missing: {tool}. Please install it from {hint}")]
    ToolMissing { tool: &'static str, hint: &'static str },

    #[error("source is not readable: {0}")]
    SourceUnreadable(PathBuf),

    #[error("destination path is not writable: {0}")]
    DestinationNotWritable(PathBuf),

    #[error("archive already exists in destination: {0}")]
    ArchiveExists(PathBuf),

    #[error("invalid size '{input}': {reason}")]
    InvalidSize { input: String, reason: String },

    #[error("operation cancelled by user due to disk space")]
    LowSpaceDeclined,

    #[error("7-Zip failed with error code {}", .0.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    ArchiverFailed(Option<i32>),

    #[error("created archive file not found for verification")]
    ArchiveMissing,

    #[error("integrity check failed: {0}")]
    VerifyFailed(PathBuf),

    #[error("process cancelled by user")]
    Interrupted,

    #[error("part {part} ({size} bytes) is larger than the limit of {limit} bytes")]
    PartExceedsLimit { part: String, size: u64, limit: u64 },

    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("push to '{remote}' failed after {attempts} attempts")]
    PushFailed { remote: String, attempts: u32 },

    #[error("gh is not authenticated; run `gh auth login` first")]
    HostingAuth,

    #[error("invalid configuration file {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Maps the error to the process exit status reported by the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ToolMissing { .. } => sysexits::EX_UNAVAILABLE,
            Error::SourceUnreadable(_) => sysexits::EX_NOINPUT,
            Error::DestinationNotWritable(_) | Error::ArchiveExists(_) => sysexits::EX_CANTCREAT,
            Error::InvalidSize { .. } => sysexits::EX_USAGE,
            Error::LowSpaceDeclined | Error::PushFailed { .. } => sysexits::EX_TEMPFAIL,
            Error::ArchiverFailed(_) | Error::CommandFailed { .. } => sysexits::EX_SOFTWARE,
            Error::ArchiveMissing | Error::VerifyFailed(_) | Error::PartExceedsLimit { .. } => {
                sysexits::EX_DATAERR
            }
            Error::Interrupted => sysexits::EX_INTERRUPTED,
            Error::HostingAuth => sysexits::EX_NOPERM,
            Error::Config { .. } => sysexits::EX_CONFIG,
            Error::Walk(_) | Error::Io(_) => sysexits::EX_IOERR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archiver_failed_message() {
        assert_eq!(
            Error::ArchiverFailed(Some(2)).to_string(),
            "7-Zip failed with error code 2"
        );
        assert_eq!(
            Error::ArchiverFailed(None).to_string(),
            "7-Zip failed with error code unknown"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::Interrupted.exit_code(), 130);
        assert_eq!(
            Error::SourceUnreadable(PathBuf::from("/nope")).exit_code(),
            sysexits::EX_NOINPUT
        );
        assert_eq!(
            Error::InvalidSize {
                input: "x".into(),
                reason: "bad".into()
            }
            .exit_code(),
            sysexits::EX_USAGE
        );
        assert_eq!(
            Error::PushFailed {
                remote: "origin".into(),
                attempts: 4
            }
            .exit_code(),
            sysexits::EX_TEMPFAIL
        );
    }
}
