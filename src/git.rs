//! Thin wrapper over the `git` command line.
//!
//! Every method runs one git subcommand inside the repository directory
//! and turns a non-zero exit into [`Error::CommandFailed`].

use crate::command::{run_checked, stdout_lines};
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct Git {
    program: PathBuf,
    repo: PathBuf,
    identity: Option<(String, String)>,
}

impl Git {
    pub fn new(program: impl Into<PathBuf>, repo: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            repo: repo.into(),
            identity: None,
        }
    }

    /// Commit as `name <email>` instead of the user's git configuration.
    pub fn with_identity(mut self, identity: Option<(String, String)>) -> Self {
        self.identity = identity;
        self
    }

    /// The same program and identity, pointed at another repository.
    pub fn for_repo(&self, repo: impl Into<PathBuf>) -> Self {
        Self {
            program: self.program.clone(),
            repo: repo.into(),
            identity: self.identity.clone(),
        }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(&self.repo);
        if let Some((name, email)) = &self.identity {
            cmd.arg("-c")
                .arg(format!("user.name={name}"))
                .arg("-c")
                .arg(format!("user.email={email}"));
        }
        cmd
    }

    pub fn is_repo(&self) -> bool {
        self.repo.join(".git").exists()
    }

    pub fn init(&self) -> Result<()> {
        run_checked(self.command().arg("init").arg("--quiet"))?;
        Ok(())
    }

    /// Initializes the repository when needed. A failed init is only a
    /// warning: the archive can still be produced without git.
    pub fn ensure_init(&self) {
        if self.is_repo() {
            log::info!(
                "Destination is already a git repository: {}",
                self.repo.display()
            );
            return;
        }
        log::info!("Initializing new git repository in: {}", self.repo.display());
        if let Err(e) = self.init() {
            log::warn!("Failed to initialize git repository: {e}");
        }
    }

    pub fn add<P: AsRef<Path>>(&self, paths: &[P]) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("add").arg("--");
        for path in paths {
            cmd.arg(path.as_ref());
        }
        run_checked(&mut cmd)?;
        Ok(())
    }

    pub fn commit(&self, message: &str) -> Result<()> {
        run_checked(self.command().args(["commit", "--quiet", "-m", message]))?;
        Ok(())
    }

    pub fn has_commits(&self) -> bool {
        run_checked(self.command().args(["rev-parse", "--verify", "--quiet", "HEAD"])).is_ok()
    }

    pub fn remotes(&self) -> Result<Vec<String>> {
        let output = run_checked(self.command().arg("remote"))?;
        Ok(stdout_lines(&output))
    }

    pub fn has_remote(&self, name: &str) -> Result<bool> {
        Ok(self.remotes()?.iter().any(|r| r == name))
    }

    pub fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        run_checked(self.command().args(["remote", "add", name, url]))?;
        Ok(())
    }

    /// Files not yet tracked, relative to the repository root, honouring `.gitignore`.
    pub fn untracked_files(&self) -> Result<Vec<String>> {
        let output = run_checked(
            self.command()
                .args(["ls-files", "--others", "--exclude-standard"]),
        )?;
        Ok(stdout_lines(&output))
    }

    fn count(&self, args: &[&str]) -> Result<u64> {
        let output = run_checked(self.command().args(args))?;
        Ok(stdout_lines(&output)
            .first()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0))
    }

    /// Number of commits reachable from HEAD.
    pub fn commit_count(&self) -> Result<u64> {
        if !self.has_commits() {
            return Ok(0);
        }
        self.count(&["rev-list", "--count", "HEAD"])
    }

    /// Commits on HEAD that `remote/branch` does not have yet. Every commit
    /// counts when the remote branch has never been pushed.
    pub fn unpushed_count(&self, remote: &str, branch: &str) -> Result<u64> {
        if !self.has_commits() {
            return Ok(0);
        }
        let tracking = format!("refs/remotes/{remote}/{branch}");
        let tracked =
            run_checked(self.command().args(["rev-parse", "--verify", "--quiet", &tracking])).is_ok();
        if !tracked {
            return self.commit_count();
        }
        self.count(&["rev-list", "--count", &format!("{tracking}..HEAD")])
    }

    /// Pushes HEAD to `branch` on `remote`, setting the upstream.
    pub fn push(&self, remote: &str, branch: &str) -> Result<()> {
        run_checked(self.command().args([
            "push",
            "--quiet",
            "--set-upstream",
            remote,
            &format!("HEAD:{branch}"),
        ]))?;
        Ok(())
    }
}
