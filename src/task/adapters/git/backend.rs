//! [`VcsBackend`] implementation that shells out to `git`.

use crate::task::{
    domain::{BookmarkName, PositionRef},
    ports::{CommitOutcome, RepoKind, VcsBackend, VcsError, VcsResult},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Drives a Git working copy with the `git` executable.
///
/// Bookmarks map to local branches. Branches are created without being
/// checked out, so the working copy never moves.
#[derive(Debug, Clone)]
pub struct GitCliBackend {
    workdir: PathBuf,
}

impl GitCliBackend {
    /// Creates a backend operating on `workdir`.
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Returns the working directory.
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    async fn output(&self, args: &[&str]) -> VcsResult<Output> {
        debug!(workdir = %self.workdir.display(), ?args, "running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(VcsError::backend)
    }

    /// Runs `git` and returns trimmed standard output.
    async fn run(&self, args: &[&str]) -> VcsResult<String> {
        let output = self.output(args).await?;
        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }

    async fn branch_exists(&self, name: &BookmarkName) -> VcsResult<bool> {
        let reference = format!("refs/heads/{name}");
        let output = self
            .output(&["rev-parse", "--verify", "--quiet", &reference])
            .await?;
        Ok(output.status.success())
    }
}

#[async_trait]
impl VcsBackend for GitCliBackend {
    async fn detect(&self) -> VcsResult<Option<RepoKind>> {
        for dir in self.workdir.ancestors() {
            if tokio::fs::try_exists(dir.join(".git"))
                .await
                .map_err(VcsError::backend)?
            {
                return Ok(Some(RepoKind::Git));
            }
        }
        Ok(None)
    }

    async fn is_clean(&self) -> VcsResult<bool> {
        let status = self.run(&["status", "--porcelain"]).await?;
        Ok(status.is_empty())
    }

    async fn current_position(&self) -> VcsResult<PositionRef> {
        let head = self.run(&["rev-parse", "HEAD"]).await?;
        PositionRef::new(head).map_err(VcsError::backend)
    }

    async fn create_bookmark(&self, name: &BookmarkName, at: &PositionRef) -> VcsResult<()> {
        if self.branch_exists(name).await? {
            return Err(VcsError::BookmarkExists(name.clone()));
        }
        self.run(&["branch", name.as_str(), at.as_str()]).await?;
        Ok(())
    }

    async fn delete_bookmark(&self, name: &BookmarkName) -> VcsResult<()> {
        if !self.branch_exists(name).await? {
            return Err(VcsError::BookmarkNotFound(name.clone()));
        }
        self.run(&["branch", "-D", name.as_str()]).await?;
        Ok(())
    }

    async fn commit_all(&self, message: &str) -> VcsResult<CommitOutcome> {
        if self.is_clean().await? {
            return Ok(CommitOutcome::NothingToCommit);
        }
        self.run(&["add", "--all"]).await?;
        self.run(&["commit", "--quiet", "--message", message]).await?;
        let position = self.current_position().await?;
        Ok(CommitOutcome::Committed(position))
    }
}
