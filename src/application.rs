//! Global configuration for this application.
//!
//! Settings live in a TOML file in the platform configuration directory.
//! Every section and field has a default so a partial or missing file
//! still yields a complete [`Application`]. Command-line flags override
//! what is loaded here.

use crate::constants::{CONFIG_BACKUP_NAME, CONFIG_NAME, PKG_NAME};
use crate::error::{Error, Result};
use crate::hosting::Visibility;
use crate::size::ByteSize;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

const CONFIG_VERSION: &str = "1.0";

/// The main application configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Application {
    /// Configuration file version.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub archive: ArchiveSettings,
    #[serde(default)]
    pub hosting: HostingSettings,
    #[serde(default)]
    pub push: PushSettings,
    #[serde(default)]
    pub git: GitSettings,
}

/// How 7-Zip is invoked.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ArchiveSettings {
    /// Volume size passed to `-v`.
    pub split_size: ByteSize,
    /// `-mx` level, 9 is ultra.
    pub level: u8,
    /// `-m0` method.
    pub method: String,
    /// Solid archive (`-ms=on`).
    pub solid: bool,
    /// Explicit path to the 7-Zip executable; searched on PATH when unset.
    pub seven_zip: Option<PathBuf>,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            split_size: ByteSize::new(40 * crate::size::MIB),
            level: 9,
            method: "lzma2".to_string(),
            solid: true,
            seven_zip: None,
        }
    }
}

/// Limits and naming on the hosting service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HostingSettings {
    /// Largest single file the service accepts.
    pub file_limit: ByteSize,
    /// Cumulative size at which a new batch repository is started.
    pub repo_limit: ByteSize,
    pub visibility: Visibility,
    /// Account or organisation owning created repositories.
    pub owner: Option<String>,
}

impl Default for HostingSettings {
    fn default() -> Self {
        Self {
            file_limit: ByteSize::new(100 * crate::size::MIB),
            repo_limit: ByteSize::new(crate::size::GIB),
            visibility: Visibility::Private,
            owner: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PushSettings {
    /// Upper bound of the bytes sent by one `git push`.
    pub chunk_size: ByteSize,
    /// Extra attempts after a failed push.
    pub retries: u32,
    /// Base delay between attempts, grows linearly.
    pub retry_delay_secs: u64,
    pub branch: String,
    pub remote: String,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            chunk_size: ByteSize::new(200 * crate::size::MIB),
            retries: 3,
            retry_delay_secs: 5,
            branch: "main".to_string(),
            remote: "origin".to_string(),
        }
    }
}

impl PushSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GitSettings {
    /// Initialise a git repository in the destination.
    pub init: bool,
    /// Commit identity, used when the global git config has none.
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            init: true,
            user_name: None,
            user_email: None,
        }
    }
}

impl GitSettings {
    /// The commit identity when both name and email are configured.
    pub fn identity(&self) -> Option<(String, String)> {
        match (&self.user_name, &self.user_email) {
            (Some(name), Some(email)) => Some((name.clone(), email.clone())),
            _ => None,
        }
    }
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            version: default_version(),
            archive: ArchiveSettings::default(),
            hosting: HostingSettings::default(),
            push: PushSettings::default(),
            git: GitSettings::default(),
        }
    }

    /// Loads configuration from the config file, or returns the defaults if not found.
    ///
    /// # Errors
    /// Returns [`Error::Config`] when the file exists but cannot be read or parsed.
    pub fn load_config() -> Result<Self> {
        let file = config_file()?;
        if file.exists() {
            read_config(&file)
        } else {
            Ok(Self::new())
        }
    }

    /// Writes the current configuration to the config file.
    pub fn write(&self) -> Result<()> {
        write_config(self, &config_file()?)
    }
}

/// Returns the absolute path to the configuration file.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_NAME))
}

/// Returns the absolute path to the backup configuration file.
pub fn backed_config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_BACKUP_NAME))
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(not(target_os = "macos"))]
fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| Error::Config {
        path: PathBuf::from(PKG_NAME),
        reason: "couldn't determine the configuration directory".to_string(),
    })?;
    Ok(config_dir.join(PKG_NAME))
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(target_os = "macos")]
fn config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| Error::Config {
        path: PathBuf::from(PKG_NAME),
        reason: "couldn't determine the home directory".to_string(),
    })?;
    Ok(home_dir.join(".config").join(PKG_NAME))
}

/// Writes the application configuration to `file_path` in TOML format.
///
/// Creates the parent directory if it does not exist.
pub(crate) fn write_config(data: &Application, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(data).map_err(|e| Error::Config {
        path: file_path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let file = fs::File::create(file_path)?;
    let mut writer = io::BufWriter::new(file);
    writer.write_all(toml_str.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Reads a configuration file in TOML format.
pub(crate) fn read_config(file_path: &Path) -> Result<Application> {
    let config_error = |reason: String| Error::Config {
        path: file_path.to_path_buf(),
        reason,
    };
    let toml_str = fs::read_to_string(file_path).map_err(|e| config_error(e.to_string()))?;
    toml::from_str(&toml_str).map_err(|e| config_error(e.to_string()))
}

/// Writes the default configuration file if it does not exist yet.
pub fn init_config() -> Result<PathBuf> {
    let file = config_file()?;
    if !file.exists() {
        write_config(&Application::new(), &file)?;
    }
    Ok(file)
}

/// Back up the configuration file, initializing it first if needed.
pub fn backup_config_file() -> Result<PathBuf> {
    let file = init_config()?;
    let backup = backed_config_file()?;
    fs::copy(file, &backup)?;
    Ok(backup)
}

/// Reset the configuration file and back up the file before resetting.
pub fn reset_config_file() -> Result<()> {
    let file = config_file()?;
    if file.exists() {
        fs::copy(&file, backed_config_file()?)?;
    }
    Application::new().write()
}

/// Rollback the last backed up configuration file.
pub fn rollback_config_file() -> Result<()> {
    let backup = backed_config_file()?;
    if !backup.exists() {
        return Err(Error::Config {
            path: backup,
            reason: "the backup configuration file does not exist".to_string(),
        });
    }
    read_config(&backup)?.write()
}
