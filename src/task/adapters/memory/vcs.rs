//! In-memory version-control adapter for workflow tests.

use crate::task::{
    domain::{BookmarkName, PositionRef},
    ports::{CommitOutcome, RepoKind, VcsBackend, VcsError, VcsResult},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory working copy.
///
/// Models a linear history, a set of bookmarks and a dirty flag without
/// touching the filesystem. Faults can be injected to exercise the
/// coordinator's error paths.
#[derive(Debug, Clone)]
pub struct InMemoryVcs {
    state: Arc<RwLock<InMemoryVcsState>>,
}

#[derive(Debug)]
struct InMemoryVcsState {
    kind: Option<RepoKind>,
    revision: u64,
    dirty: bool,
    bookmarks: BTreeMap<BookmarkName, PositionRef>,
    commit_messages: Vec<String>,
    delete_attempts: Vec<BookmarkName>,
    fail_bookmark_deletion: bool,
    fail_commits: bool,
}

impl Default for InMemoryVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVcs {
    /// Creates a clean Git working copy with a single revision.
    #[must_use]
    pub fn new() -> Self {
        Self::with_kind(Some(RepoKind::Git))
    }

    /// Creates a working directory that is not under version control.
    #[must_use]
    pub fn outside_repository() -> Self {
        Self::with_kind(None)
    }

    fn with_kind(kind: Option<RepoKind>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryVcsState {
                kind,
                revision: 1,
                dirty: false,
                bookmarks: BTreeMap::new(),
                commit_messages: Vec::new(),
                delete_attempts: Vec::new(),
                fail_bookmark_deletion: false,
                fail_commits: false,
            })),
        }
    }

    fn read(&self) -> VcsResult<RwLockReadGuard<'_, InMemoryVcsState>> {
        self.state
            .read()
            .map_err(|err| VcsError::backend(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> VcsResult<RwLockWriteGuard<'_, InMemoryVcsState>> {
        self.state
            .write()
            .map_err(|err| VcsError::backend(std::io::Error::other(err.to_string())))
    }

    /// Marks the working copy as having uncommitted changes, or clean.
    ///
    /// # Errors
    ///
    /// Returns backend errors when lock acquisition fails.
    pub fn set_dirty(&self, dirty: bool) -> VcsResult<()> {
        self.write()?.dirty = dirty;
        Ok(())
    }

    /// Makes every bookmark deletion fail until switched off again.
    ///
    /// # Errors
    ///
    /// Returns backend errors when lock acquisition fails.
    pub fn fail_bookmark_deletion(&self, fail: bool) -> VcsResult<()> {
        self.write()?.fail_bookmark_deletion = fail;
        Ok(())
    }

    /// Makes every commit fail until switched off again.
    ///
    /// # Errors
    ///
    /// Returns backend errors when lock acquisition fails.
    pub fn fail_commits(&self, fail: bool) -> VcsResult<()> {
        self.write()?.fail_commits = fail;
        Ok(())
    }

    /// Returns the existing bookmarks in name order.
    ///
    /// # Errors
    ///
    /// Returns backend errors when lock acquisition fails.
    pub fn bookmarks(&self) -> VcsResult<Vec<BookmarkName>> {
        Ok(self.read()?.bookmarks.keys().cloned().collect())
    }

    /// Returns the messages of every commit made so far.
    ///
    /// # Errors
    ///
    /// Returns backend errors when lock acquisition fails.
    pub fn commit_messages(&self) -> VcsResult<Vec<String>> {
        Ok(self.read()?.commit_messages.clone())
    }

    /// Returns every bookmark deletion attempted, successful or not.
    ///
    /// # Errors
    ///
    /// Returns backend errors when lock acquisition fails.
    pub fn delete_attempts(&self) -> VcsResult<Vec<BookmarkName>> {
        Ok(self.read()?.delete_attempts.clone())
    }
}

impl InMemoryVcsState {
    fn require_repository(&self) -> VcsResult<()> {
        if self.kind.is_some() {
            Ok(())
        } else {
            Err(VcsError::NotARepository)
        }
    }

    fn head(&self) -> VcsResult<PositionRef> {
        PositionRef::new(format!("{:040x}", self.revision)).map_err(VcsError::backend)
    }
}

#[async_trait]
impl VcsBackend for InMemoryVcs {
    async fn detect(&self) -> VcsResult<Option<RepoKind>> {
        Ok(self.read()?.kind)
    }

    async fn is_clean(&self) -> VcsResult<bool> {
        let state = self.read()?;
        state.require_repository()?;
        Ok(!state.dirty)
    }

    async fn current_position(&self) -> VcsResult<PositionRef> {
        let state = self.read()?;
        state.require_repository()?;
        state.head()
    }

    async fn create_bookmark(&self, name: &BookmarkName, at: &PositionRef) -> VcsResult<()> {
        let mut state = self.write()?;
        state.require_repository()?;
        if state.bookmarks.contains_key(name) {
            return Err(VcsError::BookmarkExists(name.clone()));
        }
        state.bookmarks.insert(name.clone(), at.clone());
        Ok(())
    }

    async fn delete_bookmark(&self, name: &BookmarkName) -> VcsResult<()> {
        let mut state = self.write()?;
        state.require_repository()?;
        state.delete_attempts.push(name.clone());
        if state.fail_bookmark_deletion {
            return Err(VcsError::CommandFailed {
                command: format!("bookmark delete {name}"),
                stderr: "injected failure".to_owned(),
            });
        }
        state
            .bookmarks
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| VcsError::BookmarkNotFound(name.clone()))
    }

    async fn commit_all(&self, message: &str) -> VcsResult<CommitOutcome> {
        let mut state = self.write()?;
        state.require_repository()?;
        if state.fail_commits {
            return Err(VcsError::CommandFailed {
                command: "commit".to_owned(),
                stderr: "injected failure".to_owned(),
            });
        }
        if !state.dirty {
            return Ok(CommitOutcome::NothingToCommit);
        }
        state.revision += 1;
        state.dirty = false;
        state.commit_messages.push(message.to_owned());
        Ok(CommitOutcome::Committed(state.head()?))
    }
}
