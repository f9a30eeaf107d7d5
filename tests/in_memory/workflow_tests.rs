//! End-to-end work sessions over in-memory adapters.

use super::helpers::{Orchestrator, orchestrator};
use cairn::task::{
    domain::{LifecycleState, TransitionError},
    services::{CompleteTaskRequest, CreateTaskRequest, TaskServiceError},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_milestone_is_worked_through_leaf_by_leaf(
    orchestrator: Orchestrator,
) -> Result<(), eyre::Report> {
    let milestone = orchestrator
        .create(CreateTaskRequest::new("Ship v1").with_context("Release train"))
        .await?;
    let first = orchestrator
        .create(
            CreateTaskRequest::new("First")
                .with_parent(milestone)
                .with_priority(0),
        )
        .await?;
    let second = orchestrator
        .create(CreateTaskRequest::new("Second").with_parent(milestone))
        .await?;

    let started = orchestrator.workflow.start(milestone).await?;
    eyre::ensure!(started.id == first, "the urgent leaf starts first");
    orchestrator.vcs.set_dirty(true)?;
    orchestrator
        .workflow
        .complete(
            CompleteTaskRequest::new(first).with_learnings(["Reuse the fixtures".to_owned()]),
        )
        .await?;
    eyre::ensure!(
        orchestrator.learnings.list(first).await?.len() == 1,
        "the completed task keeps its own learning"
    );

    let next = orchestrator.workflow.start(milestone).await?;
    eyre::ensure!(next.id == second, "the remaining leaf starts next");
    let inherited = next
        .learnings
        .ok_or_else(|| eyre::eyre!("single retrieval should carry learnings"))?;
    eyre::ensure!(
        inherited.milestone.len() == 1,
        "the milestone holds the bubbled learning"
    );
    orchestrator
        .workflow
        .complete(CompleteTaskRequest::new(second))
        .await?;

    let ready = orchestrator.tasks.next_ready(Some(milestone)).await?;
    eyre::ensure!(
        ready.as_ref().map(|view| view.id) == Some(milestone),
        "the milestone itself is ready once its children finish"
    );
    let done = orchestrator
        .workflow
        .complete(CompleteTaskRequest::new(milestone).with_result("Released"))
        .await?;
    eyre::ensure!(done.state == LifecycleState::Completed, "milestone completes");
    eyre::ensure!(
        orchestrator.vcs.bookmarks()?.is_empty(),
        "no bookmark survives the milestone"
    );

    let archived = orchestrator.lifecycle.archive(milestone).await?;
    eyre::ensure!(archived.archived, "milestone is archived");
    let child = orchestrator.tasks.get(first).await?;
    eyre::ensure!(
        child.archived_at == archived.archived_at,
        "the subtree shares one archive timestamp"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reopened_tasks_can_be_completed_again(
    orchestrator: Orchestrator,
) -> Result<(), eyre::Report> {
    let task = orchestrator.create(CreateTaskRequest::new("Solo")).await?;
    orchestrator
        .workflow
        .complete(CompleteTaskRequest::new(task))
        .await?;

    let reopened = orchestrator.lifecycle.reopen(task).await?;
    eyre::ensure!(
        reopened.state == LifecycleState::InProgress,
        "reopened tasks return to active work"
    );
    let again = orchestrator
        .workflow
        .complete(CompleteTaskRequest::new(task).with_result("Second pass"))
        .await?;
    eyre::ensure!(
        again.result.as_deref() == Some("Second pass"),
        "the new result is recorded"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_tasks_cannot_be_completed(
    orchestrator: Orchestrator,
) -> Result<(), eyre::Report> {
    let task = orchestrator.create(CreateTaskRequest::new("Solo")).await?;
    orchestrator.lifecycle.cancel(task).await?;
    orchestrator.vcs.set_dirty(true)?;

    let result = orchestrator
        .workflow
        .complete(CompleteTaskRequest::new(task))
        .await;

    eyre::ensure!(
        matches!(
            result,
            Err(TaskServiceError::Transition(
                TransitionError::CannotCompleteCancelled { .. }
            ))
        ),
        "expected a transition error, got {result:?}"
    );
    eyre::ensure!(
        orchestrator.vcs.commit_messages()?.is_empty(),
        "nothing is committed for a rejected completion"
    );
    Ok(())
}
