/// Package name.
pub(crate) const PKG_NAME: &str = env!("CARGO_PKG_NAME");
/// Default configuration file name.
pub(crate) const CONFIG_NAME: &str = "config.toml";
/// Backup configuration file name.
pub(crate) const CONFIG_BACKUP_NAME: &str = "config_backup.toml";
/// Manifest written into every batch repository.
pub const MANIFEST_NAME: &str = "githubify-manifest.toml";
