//! Workflow configuration: bookmark naming and commit messages.

use super::{TaskServiceError, TaskServiceResult};
use crate::task::domain::{BookmarkName, Task, TaskId};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default prefix for bookmarks created when work starts.
pub const DEFAULT_BOOKMARK_PREFIX: &str = "task/";

/// Default commit message for completing a task.
pub const DEFAULT_COMMIT_TEMPLATE: &str =
    "{{ description }}\n\nTask: {{ task_id }}{% if result %}\n\n{{ result }}{% endif %}";

/// Default commit message for completing a milestone.
pub const DEFAULT_MILESTONE_COMMIT_TEMPLATE: &str =
    "Milestone: {{ description }}\n\nTask: {{ task_id }}{% if result %}\n\n{{ result }}{% endif %}";

/// Configuration for the workflow coordinator.
///
/// Commit templates are `minijinja` templates rendered with `task_id`,
/// `description`, `result` and `depth`.
///
/// # Examples
///
/// ```
/// use cairn::task::services::WorkflowConfig;
///
/// let config = WorkflowConfig::default().with_bookmark_prefix("agent/");
/// assert_eq!(config.bookmark_prefix, "agent/");
/// assert!(config.require_clean_start);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Prefix prepended to the task identifier to name its bookmark.
    pub bookmark_prefix: String,
    /// Whether `start` refuses to run on a working copy with uncommitted
    /// changes.
    pub require_clean_start: bool,
    /// Commit message template for non-root tasks.
    pub commit_template: String,
    /// Commit message template for roots.
    pub milestone_commit_template: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            bookmark_prefix: DEFAULT_BOOKMARK_PREFIX.to_owned(),
            require_clean_start: true,
            commit_template: DEFAULT_COMMIT_TEMPLATE.to_owned(),
            milestone_commit_template: DEFAULT_MILESTONE_COMMIT_TEMPLATE.to_owned(),
        }
    }
}

impl WorkflowConfig {
    /// Creates a configuration that lets `start` run on a dirty working
    /// copy.
    ///
    /// Useful when agents keep scratch files in the working copy.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            require_clean_start: false,
            ..Self::default()
        }
    }

    /// Sets the bookmark prefix.
    #[must_use]
    pub fn with_bookmark_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.bookmark_prefix = prefix.into();
        self
    }

    /// Sets the commit message template for non-root tasks.
    #[must_use]
    pub fn with_commit_template(mut self, template: impl Into<String>) -> Self {
        self.commit_template = template.into();
        self
    }

    /// Sets the commit message template for roots.
    #[must_use]
    pub fn with_milestone_commit_template(mut self, template: impl Into<String>) -> Self {
        self.milestone_commit_template = template.into();
        self
    }

    /// Returns the bookmark name used for `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] when the prefix produces an
    /// invalid bookmark name.
    pub fn bookmark_for(&self, task_id: TaskId) -> TaskServiceResult<BookmarkName> {
        Ok(BookmarkName::new(format!(
            "{}{task_id}",
            self.bookmark_prefix
        ))?)
    }

    /// Renders the completion commit message for a task at `depth`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TemplateRender`] when the template is
    /// malformed.
    pub fn render_commit_message(
        &self,
        task: &Task,
        result: Option<&str>,
        depth: usize,
    ) -> TaskServiceResult<String> {
        let template = if depth == 0 {
            &self.milestone_commit_template
        } else {
            &self.commit_template
        };
        let environment = Environment::new();
        environment
            .render_str(template, build_template_context(task, result, depth))
            .map_err(|error| TaskServiceError::TemplateRender {
                reason: error.to_string(),
            })
    }
}

fn build_template_context(task: &Task, result: Option<&str>, depth: usize) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("task_id".to_owned(), Value::String(task.id().to_string()));
    context.insert(
        "description".to_owned(),
        Value::String(task.description().to_owned()),
    );
    context.insert(
        "result".to_owned(),
        result.map_or(Value::Null, |text| Value::String(text.to_owned())),
    );
    context.insert("depth".to_owned(), Value::from(depth));
    context
}
