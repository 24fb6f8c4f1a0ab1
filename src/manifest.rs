//! `githubify-manifest.toml`: tells whoever clones one batch repository
//! which volumes it holds and how many repositories make up the archive.
//!
//! A repository can hold volumes of several archives, so the file keeps
//! one `[[archives]]` entry per archive name.

use crate::constants::MANIFEST_NAME;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Archive file name, e.g. `CFD_Case.7z`.
    pub archive: String,
    /// Name of the directory that was archived.
    pub source: String,
    pub split_size: String,
    pub total_parts: usize,
    pub total_bytes: u64,
    /// Index of the repository holding this manifest, 1-based.
    pub batch: usize,
    pub batch_count: usize,
    /// Volume file names stored alongside this manifest.
    pub parts: Vec<String>,
}

/// On-disk layout of the manifest file.
#[derive(Serialize, Deserialize, Debug, Default)]
struct ManifestFile {
    #[serde(default)]
    archives: Vec<Manifest>,
}

impl Manifest {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_NAME)
    }

    /// Records this entry in the manifest of `dir`, replacing an earlier
    /// entry for the same archive and keeping those of other archives.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = Self::path(dir);
        let mut file = ManifestFile {
            archives: Self::read_all(dir)?,
        };
        match file.archives.iter_mut().find(|m| m.archive == self.archive) {
            Some(entry) => *entry = self.clone(),
            None => file.archives.push(self.clone()),
        }
        let text = toml::to_string_pretty(&file).map_err(|e| Error::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, text)?;
        Ok(path)
    }

    /// Every entry of the manifest in `dir`; empty when there is none.
    pub fn read_all(dir: &Path) -> Result<Vec<Self>> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(vec![]);
        }
        let text = fs::read_to_string(&path)?;
        let file: ManifestFile = toml::from_str(&text).map_err(|e| Error::Config {
            path,
            reason: e.to_string(),
        })?;
        Ok(file.archives)
    }

    /// The entry for `archive` in the manifest of `dir`.
    pub fn read(dir: &Path, archive: &str) -> Result<Option<Self>> {
        Ok(Self::read_all(dir)?
            .into_iter()
            .find(|m| m.archive == archive))
    }

    /// Reassembly hint shown after a split.
    pub fn summary(&self) -> String {
        if self.batch_count > 1 {
            format!(
                "{}: batch {}/{} holds {} of {} parts",
                self.archive,
                self.batch,
                self.batch_count,
                self.parts.len(),
                self.total_parts
            )
        } else {
            format!("{}: {} parts", self.archive, self.total_parts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Manifest {
        Manifest {
            archive: "case.7z".to_string(),
            source: "case".to_string(),
            split_size: "40m".to_string(),
            total_parts: 3,
            total_bytes: 100,
            batch: 2,
            batch_count: 2,
            parts: vec!["case.7z.003".to_string()],
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let written = sample().write(dir.path()).unwrap();
        assert_eq!(written, dir.path().join(MANIFEST_NAME));
        assert_eq!(Manifest::read(dir.path(), "case.7z").unwrap(), Some(sample()));
        assert_eq!(Manifest::read(dir.path(), "other.7z").unwrap(), None);
    }

    #[test]
    fn test_read_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Manifest::read_all(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_entries_of_other_archives_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        sample().write(dir.path()).unwrap();
        let other = Manifest {
            archive: "beta.7z".to_string(),
            source: "beta".to_string(),
            parts: vec!["beta.7z.001".to_string()],
            ..sample()
        };
        other.write(dir.path()).unwrap();

        // rewriting an archive replaces only its own entry
        let updated = Manifest {
            parts: vec!["case.7z.002".to_string(), "case.7z.003".to_string()],
            ..sample()
        };
        updated.write(dir.path()).unwrap();

        let all = Manifest::read_all(dir.path()).unwrap();
        assert_eq!(all, vec![updated, other]);
    }

    #[test]
    fn test_invalid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(Manifest::path(dir.path()), "archives = 3").unwrap();
        assert!(matches!(
            Manifest::read_all(dir.path()),
            Err(Error::Config { .. })
        ));
        assert!(sample().write(dir.path()).is_err());
    }

    #[test]
    fn test_summary() {
        assert_eq!(sample().summary(), "case.7z: batch 2/2 holds 1 of 3 parts");
        let single = Manifest {
            batch: 1,
            batch_count: 1,
            ..sample()
        };
        assert_eq!(single.summary(), "case.7z: 3 parts");
    }
}
