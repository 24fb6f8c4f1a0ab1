use assert_cmd::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use std::process::Command;

#[cfg(target_os = "linux")]
#[test]
fn config_copy_reset_rollback_end_to_end() -> anyhow::Result<()> {
    // Set up temporary config dir
    let temp = TempDir::new()?;
    let bin = assert_cmd::cargo::cargo_bin!("githubify");
    let config_dir = temp.path().join("githubify");
    let config_file = config_dir.join("config.toml");

    let mut show = Command::new(&bin);
    show.env("XDG_CONFIG_HOME", temp.path()).arg("config");
    show.assert()
        .success()
        .stdout(predicate::str::contains(config_file.display().to_string()));

    // Rolling back before any backup exists fails with a config error
    let mut rollback = Command::new(&bin);
    rollback
        .env("XDG_CONFIG_HOME", temp.path())
        .args(["config", "--rollback"]);
    rollback
        .assert()
        .code(78)
        .stderr(predicate::str::contains("does not exist"));

    let mut copy = Command::new(&bin);
    copy.env("XDG_CONFIG_HOME", temp.path()).args(["config", "-c"]);
    copy.assert()
        .success()
        .stdout(predicate::str::contains("Backup successfully!"));
    assert!(config_file.exists());
    assert!(config_dir.join("config_backup.toml").exists());

    // Customize, then reset: the customized file becomes the backup
    let custom = std::fs::read_to_string(&config_file)?.replace("split_size = \"40m\"", "split_size = \"10m\"");
    assert!(custom.contains("split_size = \"10m\""));
    std::fs::write(&config_file, &custom)?;

    let mut reset = Command::new(&bin);
    reset.env("XDG_CONFIG_HOME", temp.path()).args(["config", "-r"]);
    reset
        .assert()
        .success()
        .stdout(predicate::str::contains("reset successfully"));
    assert!(std::fs::read_to_string(&config_file)?.contains("split_size = \"40m\""));

    let mut rollback = Command::new(&bin);
    rollback
        .env("XDG_CONFIG_HOME", temp.path())
        .args(["config", "-R"]);
    rollback
        .assert()
        .success()
        .stdout(predicate::str::contains("rolled back successfully"));
    assert!(std::fs::read_to_string(&config_file)?.contains("split_size = \"10m\""));

    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn configured_split_size_is_used() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let bin = assert_cmd::cargo::cargo_bin!("githubify");
    let config_dir = temp.path().join("githubify");
    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(
        config_dir.join("config.toml"),
        "[archive]\nsplit_size = \"25m\"\nlevel = 5\n",
    )?;
    let source = temp.path().join("data");
    std::fs::create_dir_all(&source)?;
    std::fs::write(source.join("a.txt"), b"hello")?;

    let mut cmd = Command::new(&bin);
    cmd.env("XDG_CONFIG_HOME", temp.path())
        .args(["split", "-n"])
        .arg(&source)
        .arg(temp.path().join("out"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("-v25m"))
        .stdout(predicate::str::contains("-mx=5"));
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn broken_config_is_reported() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let bin = assert_cmd::cargo::cargo_bin!("githubify");
    let config_dir = temp.path().join("githubify");
    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(config_dir.join("config.toml"), "[archive\nsplit_size = ")?;

    let mut cmd = Command::new(&bin);
    cmd.env("XDG_CONFIG_HOME", temp.path()).arg("check");
    cmd.assert()
        .code(78)
        .stderr(predicate::str::contains("invalid configuration file"));
    Ok(())
}
