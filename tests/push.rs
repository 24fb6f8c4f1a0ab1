use githubify::Error;
use githubify::application::Application;
use githubify::git::Git;
use githubify::pipeline::run_push;
use githubify::push::{PushOptions, push_repository};
use githubify::size::ByteSize;
use githubify::tools::{Toolchain, find_git};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

fn git_in(program: &Path, dir: &Path) -> Git {
    Git::new(program, dir).with_identity(Some((
        "githubify tests".to_string(),
        "tests@example.com".to_string(),
    )))
}

fn options(chunk: u64, retries: u32) -> PushOptions {
    PushOptions {
        remote: "origin".to_string(),
        branch: "main".to_string(),
        chunk_size: ByteSize::new(chunk),
        retries,
        retry_delay: Duration::ZERO,
    }
}

#[test]
fn pushes_pending_files_in_chunks() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let work = temp.path().join("case");
    let bare = temp.path().join("remote.git");
    std::fs::create_dir_all(&work)?;
    let Some(program) = find_git() else {
        return Ok(());
    };
    let git = git_in(&program, &work);
    let status = Command::new(&program)
        .args(["init", "--bare", "--quiet"])
        .arg(&bare)
        .status()?;
    assert!(status.success());

    git.init()?;
    git.add_remote("origin", &bare.to_string_lossy())?;
    for (i, size) in [600usize, 600, 600, 300].iter().enumerate() {
        std::fs::write(work.join(format!("case.7z.{:03}", i + 1)), vec![b'x'; *size])?;
    }
    std::fs::write(work.join("githubify-manifest.toml"), "archive = \"case.7z\"\n")?;

    let report = push_repository(&git, &options(1300, 0))?;

    // manifest + 001 + 002, then 003 + 004
    assert_eq!(report.chunks, 2);
    assert_eq!(report.files, 5);
    assert_eq!(git.commit_count()?, 2);
    assert!(git.untracked_files()?.is_empty());

    let output = Command::new(&program)
        .current_dir(&bare)
        .args(["rev-list", "--count", "main"])
        .output()?;
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "2");

    // nothing pending and nothing unpushed
    let again = push_repository(&git, &options(1300, 0))?;
    assert_eq!(again.chunks, 0);
    assert_eq!(git.commit_count()?, 2);
    Ok(())
}

#[test]
fn unreachable_remote_fails_after_retries() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let work = temp.path().join("case");
    std::fs::create_dir_all(&work)?;
    let Some(program) = find_git() else {
        return Ok(());
    };
    let git = git_in(&program, &work);
    git.init()?;
    git.add_remote("origin", &temp.path().join("missing.git").to_string_lossy())?;
    std::fs::write(work.join("case.7z.001"), b"data")?;

    let err = push_repository(&git, &options(1024, 1)).unwrap_err();
    assert!(matches!(err, Error::PushFailed { attempts: 2, .. }));
    // the chunk was committed locally and will be pushed by a later run
    assert_eq!(git.commit_count()?, 1);
    assert_eq!(git.unpushed_count("origin", "main")?, 1);
    Ok(())
}

#[test]
fn dry_run_reports_pending_files_and_unpushed_commits() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let work = temp.path().join("case");
    std::fs::create_dir_all(&work)?;
    let Some(program) = find_git() else {
        return Ok(());
    };
    let git = git_in(&program, &work);
    git.init()?;
    std::fs::write(work.join("case.7z.001"), b"committed earlier")?;
    git.add(&["case.7z.001"])?;
    git.commit("Add case.7z.001")?;
    std::fs::write(work.join("case.7z.002"), b"still untracked")?;

    let settings = Application::new();
    let reports = run_push(&work, None, true, &settings, &Toolchain::discover(&settings))?;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].unpushed, 1);
    assert_eq!(reports[0].parts.len(), 1);
    assert_eq!(reports[0].parts[0].file_name(), "case.7z.002");
    assert!(reports[0].push.is_none());
    Ok(())
}
