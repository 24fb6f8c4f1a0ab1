use assert_cmd::prelude::*;
use assert_fs::TempDir;
use assert_fs::assert::PathAssert;
use assert_fs::fixture::*;
use predicates::prelude::*;
use std::process::Command;

fn githubify(config_home: &TempDir) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("githubify")?;
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("RUST_LOG", "info");
    Ok(cmd)
}

#[test]
fn no_command_is_a_usage_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    githubify(&temp)?
        .assert()
        .code(64)
        .stderr(predicate::str::contains("requires at least one command"));
    Ok(())
}

#[test]
fn dry_run_prints_plan_and_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let source = temp.child("source_data");
    source
        .child("test.txt")
        .write_str(&"This is a test file for githubify.\n".repeat(100))?;
    let dest = temp.child("output_data");

    githubify(&temp)?
        .arg("split")
        .arg(source.path())
        .arg(dest.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN]"))
        .stdout(predicate::str::contains("source_data.7z.001"))
        .stdout(predicate::str::contains("-v40m"))
        .stdout(predicate::str::contains("batch 1"));

    dest.assert(predicate::path::missing());
    Ok(())
}

#[test]
fn dry_run_clamps_split_size_to_file_limit() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let source = temp.child("data");
    source.child("a.bin").write_binary(&[7u8; 4096])?;

    githubify(&temp)?
        .args(["split", "-n", "-s", "2g"])
        .arg(source.path())
        .arg(temp.child("out").path())
        .assert()
        .success()
        .stdout(predicate::str::contains("-v95m"))
        .stderr(predicate::str::contains("exceeds the safe size"));
    Ok(())
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
#[test]
fn missing_source_exits_with_no_input() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    githubify(&temp)?
        .args(["split", "-n", "foo/bar/does-not-exist"])
        .arg(temp.child("out").path())
        .assert()
        .code(66)
        .stderr(predicate::str::contains("source is not readable"));
    Ok(())
}

#[test]
fn invalid_split_size_is_a_usage_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let source = temp.child("data");
    source.create_dir_all()?;
    githubify(&temp)?
        .args(["split", "-n", "-s", "forty"])
        .arg(source.path())
        .arg(temp.child("out").path())
        .assert()
        .code(64)
        .stderr(predicate::str::contains("invalid size 'forty'"));
    Ok(())
}

#[test]
fn existing_archive_is_not_overwritten() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let source = temp.child("data");
    source.create_dir_all()?;
    let dest = temp.child("out");
    dest.child("data.7z.001").write_str("previous run")?;

    githubify(&temp)?
        .args(["split", "-n"])
        .arg(source.path())
        .arg(dest.path())
        .assert()
        .code(73)
        .stderr(predicate::str::contains("archive already exists"));
    dest.child("data.7z.001").assert("previous run");
    Ok(())
}

#[test]
fn push_dry_run_lists_batch_repositories() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    temp.child("case/case.7z.001").write_str("one")?;
    temp.child("case-batch-2/case.7z.002").write_str("two")?;

    githubify(&temp)?
        .args(["push", "-n"])
        .arg(temp.child("case").path())
        .assert()
        .success()
        .stdout(predicate::str::contains("case.7z.001"))
        .stdout(predicate::str::contains("case-batch-2"));
    Ok(())
}

#[test]
fn push_of_missing_destination_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    githubify(&temp)?
        .args(["push", "-n"])
        .arg(temp.child("nowhere").path())
        .assert()
        .code(66);
    Ok(())
}

#[test]
fn check_lists_tools() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    githubify(&temp)?
        .arg("check")
        .assert()
        .stdout(predicate::str::contains("7-Zip"))
        .stdout(predicate::str::contains("git"))
        .stdout(predicate::str::contains("gh"));
    Ok(())
}
