//! Integration tests for the `git` command-line backend.
//!
//! Each test works in a throwaway repository and is skipped when no `git`
//! executable is available.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use cairn::task::{
    adapters::{
        git::GitCliBackend,
        sqlite::{SqliteConfig, SqliteTaskRepository, open_in_memory},
    },
    domain::BookmarkName,
    ports::{CommitOutcome, RepoKind, VcsBackend, VcsError},
    services::{
        CompleteTaskRequest, CreateTaskRequest, TaskService, TaskServiceError, WorkflowConfig,
        WorkflowCoordinator,
    },
};
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest::rstest;
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

fn git(dir: &Path, args: &[&str]) -> Result<String, eyre::Report> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .wrap_err_with(|| format!("run git {}", args.join(" ")))?;
    eyre::ensure!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

fn init_repository() -> Result<TempDir, eyre::Report> {
    let dir = tempfile::tempdir()?;
    git(dir.path(), &["init", "--quiet"])?;
    git(dir.path(), &["config", "user.name", "Cairn Tests"])?;
    git(dir.path(), &["config", "user.email", "tests@example.com"])?;
    git(dir.path(), &["config", "commit.gpgsign", "false"])?;
    std::fs::write(dir.path().join("README.md"), "seed\n")?;
    git(dir.path(), &["add", "--all"])?;
    git(dir.path(), &["commit", "--quiet", "--message", "seed"])?;
    Ok(dir)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backend_manages_branches_and_commits() -> Result<(), eyre::Report> {
    if !git_available() {
        return Ok(());
    }
    let dir = init_repository()?;
    let backend = GitCliBackend::new(dir.path());
    let bookmark = BookmarkName::new("task/example")?;

    eyre::ensure!(
        backend.detect().await? == Some(RepoKind::Git),
        "repository should be detected"
    );
    eyre::ensure!(backend.is_clean().await?, "fresh repository is clean");
    let head = backend.current_position().await?;
    eyre::ensure!(
        backend.commit_all("noop").await? == CommitOutcome::NothingToCommit,
        "nothing to commit on a clean tree"
    );

    backend.create_bookmark(&bookmark, &head).await?;
    let duplicate = backend.create_bookmark(&bookmark, &head).await;
    eyre::ensure!(
        matches!(duplicate, Err(VcsError::BookmarkExists(_))),
        "duplicate branch should be reported, got {duplicate:?}"
    );

    std::fs::write(dir.path().join("notes.txt"), "work\n")?;
    eyre::ensure!(!backend.is_clean().await?, "untracked file makes the tree dirty");
    let CommitOutcome::Committed(position) = backend.commit_all("Add notes").await? else {
        return Err(eyre::eyre!("expected a commit"));
    };
    eyre::ensure!(position != head, "commit should move HEAD");
    eyre::ensure!(
        git(dir.path(), &["log", "-1", "--format=%s"])? == "Add notes",
        "commit message should be recorded"
    );

    backend.delete_bookmark(&bookmark).await?;
    let missing = backend.delete_bookmark(&bookmark).await;
    eyre::ensure!(
        matches!(missing, Err(VcsError::BookmarkNotFound(_))),
        "missing branch should be reported, got {missing:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn workflow_runs_against_git_and_sqlite() -> Result<(), eyre::Report> {
    if !git_available() {
        return Ok(());
    }
    let dir = init_repository()?;
    let repository = Arc::new(SqliteTaskRepository::new(open_in_memory(
        &SqliteConfig::default(),
    )?));
    let clock = Arc::new(DefaultClock);
    let tasks = TaskService::new(Arc::clone(&repository), Arc::clone(&clock));
    let workflow = WorkflowCoordinator::new(
        repository,
        Arc::new(GitCliBackend::new(dir.path())),
        clock,
        WorkflowConfig::default(),
    );
    let milestone = tasks.create(CreateTaskRequest::new("Ship v1")).await?.id;
    let work = tasks
        .create(CreateTaskRequest::new("Write notes").with_parent(milestone))
        .await?
        .id;

    let started = workflow.start(milestone).await?;
    let bookmark = started
        .bookmark
        .ok_or_else(|| eyre::eyre!("started task should record a bookmark"))?;
    eyre::ensure!(started.id == work, "the leaf should start");
    git(
        dir.path(),
        &["rev-parse", "--verify", &format!("refs/heads/{bookmark}")],
    )?;

    std::fs::write(dir.path().join("notes.txt"), "done\n")?;
    let completed = workflow
        .complete(CompleteTaskRequest::new(work).with_result("Notes written"))
        .await?;
    let head = git(dir.path(), &["rev-parse", "HEAD"])?;
    let subject = git(dir.path(), &["log", "-1", "--format=%s"])?;

    eyre::ensure!(
        completed.commit_sha.as_ref().map(|sha| sha.as_str()) == Some(head.as_str()),
        "completion records the new HEAD"
    );
    eyre::ensure!(subject == "Write notes", "commit uses the task description");
    eyre::ensure!(completed.bookmark.is_none(), "bookmark is released");
    eyre::ensure!(
        git(dir.path(), &["branch", "--list", bookmark.as_str()])?.is_empty(),
        "branch is deleted"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn workflow_refuses_to_run_outside_a_repository() -> Result<(), eyre::Report> {
    let dir = tempfile::tempdir()?;
    let backend = GitCliBackend::new(dir.path());
    if backend.detect().await?.is_some() {
        // The temporary directory sits inside some other checkout.
        return Ok(());
    }
    let repository = Arc::new(SqliteTaskRepository::new(open_in_memory(
        &SqliteConfig::default(),
    )?));
    let clock = Arc::new(DefaultClock);
    let tasks = TaskService::new(Arc::clone(&repository), Arc::clone(&clock));
    let workflow =
        WorkflowCoordinator::new(repository, Arc::new(backend), clock, WorkflowConfig::default());
    let task = tasks.create(CreateTaskRequest::new("Solo")).await?.id;

    let result = workflow.start(task).await;

    eyre::ensure!(
        matches!(result, Err(TaskServiceError::Vcs(VcsError::NotARepository))),
        "expected NotARepository, got {result:?}"
    );
    Ok(())
}
