//! Discovery of the external programs githubify drives.

use crate::application::Application;
use crate::error::{Error, Result};
use std::path::PathBuf;

const SEVEN_ZIP_HINT: &str = "https://www.7-zip.org/ (ensure '7z' is in your PATH or in a standard install location)";
const GIT_HINT: &str = "https://git-scm.com/ (ensure 'git' is in your PATH)";
const GH_HINT: &str = "https://cli.github.com/ (ensure 'gh' is in your PATH)";

/// Locates the 7-Zip executable: `7z` or `7za` on PATH, then the standard
/// Windows install locations.
pub fn find_7z() -> Option<PathBuf> {
    if let Some(path) = ["7z", "7za"].iter().find_map(|name| which::which(name).ok()) {
        return Some(path);
    }
    if cfg!(windows) {
        return [
            r"C:\Program Files\7-Zip\7z.exe",
            r"C:\Program Files (x86)\7-Zip\7z.exe",
        ]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists());
    }
    None
}

pub fn find_git() -> Option<PathBuf> {
    which::which("git").ok()
}

pub fn find_gh() -> Option<PathBuf> {
    which::which("gh").ok()
}

/// Which tools an operation cannot run without.
#[derive(Debug, Clone, Copy, Default)]
pub struct Needs {
    pub seven_zip: bool,
    pub git: bool,
    pub gh: bool,
}

/// Resolved paths of the external programs.
#[derive(Debug, Clone, Default)]
pub struct Toolchain {
    pub seven_zip: Option<PathBuf>,
    pub git: Option<PathBuf>,
    pub gh: Option<PathBuf>,
}

impl Toolchain {
    /// Searches for every tool. A configured 7-Zip path wins when it exists.
    pub fn discover(settings: &Application) -> Self {
        let seven_zip = settings
            .archive
            .seven_zip
            .clone()
            .filter(|p| p.exists())
            .or_else(find_7z);
        Self {
            seven_zip,
            git: find_git(),
            gh: find_gh(),
        }
    }

    /// Fails with [`Error::ToolMissing`] for the first needed tool that was not found.
    pub fn require(&self, needs: Needs) -> Result<()> {
        if needs.seven_zip && self.seven_zip.is_none() {
            return Err(Error::ToolMissing {
                tool: "7-Zip",
                hint: SEVEN_ZIP_HINT,
            });
        }
        if needs.git && self.git.is_none() {
            return Err(Error::ToolMissing {
                tool: "git",
                hint: GIT_HINT,
            });
        }
        if needs.gh && self.gh.is_none() {
            return Err(Error::ToolMissing {
                tool: "gh",
                hint: GH_HINT,
            });
        }
        Ok(())
    }

    pub fn seven_zip(&self) -> Result<PathBuf> {
        self.seven_zip.clone().ok_or(Error::ToolMissing {
            tool: "7-Zip",
            hint: SEVEN_ZIP_HINT,
        })
    }

    pub fn git(&self) -> Result<PathBuf> {
        self.git.clone().ok_or(Error::ToolMissing {
            tool: "git",
            hint: GIT_HINT,
        })
    }

    pub fn gh(&self) -> Result<PathBuf> {
        self.gh.clone().ok_or(Error::ToolMissing {
            tool: "gh",
            hint: GH_HINT,
        })
    }

    /// `(name, path)` for every tool, for the `check` report.
    pub fn entries(&self) -> [(&'static str, Option<&PathBuf>); 3] {
        [
            ("7-Zip", self.seven_zip.as_ref()),
            ("git", self.git.as_ref()),
            ("gh", self.gh.as_ref()),
        ]
    }
}
