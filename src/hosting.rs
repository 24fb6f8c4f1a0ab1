//! Repository creation on the hosting service through the `gh` CLI.

use crate::command::run_checked;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Visibility of created repositories.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    fn flag(self) -> &'static str {
        match self {
            Visibility::Private => "--private",
            Visibility::Public => "--public",
        }
    }
}

/// `owner/name` when an owner is set, otherwise the bare name (the
/// authenticated account).
pub fn qualified_name(owner: Option<&str>, name: &str) -> String {
    match owner {
        Some(owner) if !owner.is_empty() => format!("{owner}/{name}"),
        _ => name.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct GitHubCli {
    program: PathBuf,
}

impl GitHubCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// # Errors
    /// Returns [`Error::HostingAuth`] when `gh auth status` fails.
    pub fn ensure_authenticated(&self) -> Result<()> {
        run_checked(Command::new(&self.program).args(["auth", "status"]))
            .map(|_| ())
            .map_err(|e| {
                log::debug!("gh auth status: {e}");
                Error::HostingAuth
            })
    }

    /// Arguments of `gh repo create` for a local repository in `dir`.
    pub fn create_repo_args(
        name: &str,
        visibility: Visibility,
        dir: &Path,
        remote: &str,
    ) -> Vec<String> {
        vec![
            "repo".to_string(),
            "create".to_string(),
            name.to_string(),
            visibility.flag().to_string(),
            "--source".to_string(),
            dir.to_string_lossy().into_owned(),
            "--remote".to_string(),
            remote.to_string(),
        ]
    }

    /// Creates `name` on the service and registers it as `remote` of the
    /// repository in `dir`.
    pub fn create_repo(
        &self,
        name: &str,
        visibility: Visibility,
        dir: &Path,
        remote: &str,
    ) -> Result<()> {
        log::info!("Creating {visibility:?} repository {name}");
        run_checked(
            Command::new(&self.program).args(Self::create_repo_args(name, visibility, dir, remote)),
        )?;
        Ok(())
    }
}
