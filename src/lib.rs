//! githubify: split large directories into size-limited 7-Zip volumes and
//! publish them to a hosted git service.
//!
//! This crate provides the archive, batching and push logic used by the
//! githubify CLI. Compression and version control are delegated to the
//! external `7z`, `git` and `gh` programs.

pub mod application;
pub mod archive;
pub mod batch;
pub mod command;
pub mod constants;
pub mod error;
pub mod git;
pub mod hosting;
pub mod manifest;
pub mod pipeline;
pub mod preflight;
pub mod push;
pub mod size;
pub mod sysexits;
pub mod tools;

pub use error::{Error, Result};
