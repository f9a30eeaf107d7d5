//! Hierarchy and blocker graph scenarios across services.

use super::helpers::{Orchestrator, orchestrator};
use cairn::task::{
    domain::{GraphViolation, HierarchyRelation, LifecycleState},
    ports::TaskFilter,
    services::{CreateTaskRequest, TaskServiceError, UpdateTaskRequest},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_fourth_level_is_rejected(orchestrator: Orchestrator) -> Result<(), eyre::Report> {
    let milestone = orchestrator.create(CreateTaskRequest::new("Ship v1")).await?;
    let work = orchestrator
        .create(CreateTaskRequest::new("Parser").with_parent(milestone))
        .await?;
    let subtask = orchestrator
        .create(CreateTaskRequest::new("Lexer").with_parent(work))
        .await?;

    let result = orchestrator
        .tasks
        .create(CreateTaskRequest::new("Too deep").with_parent(subtask))
        .await;

    eyre::ensure!(
        matches!(
            result,
            Err(TaskServiceError::Structural(GraphViolation::DepthExceeded { depth: 3, .. }))
        ),
        "expected depth violation, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn moving_a_subtree_respects_its_height(
    orchestrator: Orchestrator,
) -> Result<(), eyre::Report> {
    let target = orchestrator.create(CreateTaskRequest::new("Target")).await?;
    let mover = orchestrator.create(CreateTaskRequest::new("Mover")).await?;
    let middle = orchestrator
        .create(CreateTaskRequest::new("Middle").with_parent(mover))
        .await?;
    orchestrator
        .create(CreateTaskRequest::new("Leaf").with_parent(middle))
        .await?;

    let result = orchestrator
        .tasks
        .update(UpdateTaskRequest::new(mover).with_parent(target))
        .await;

    eyre::ensure!(
        matches!(
            result,
            Err(TaskServiceError::Structural(GraphViolation::DepthExceeded { .. }))
        ),
        "expected depth violation, got {result:?}"
    );
    let unchanged = orchestrator.tasks.get(mover).await?;
    eyre::ensure!(unchanged.parent_id.is_none(), "mover should stay a root");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_task_cannot_wait_for_its_own_descendant(
    orchestrator: Orchestrator,
) -> Result<(), eyre::Report> {
    let root = orchestrator.create(CreateTaskRequest::new("Root")).await?;
    let child = orchestrator
        .create(CreateTaskRequest::new("Child").with_parent(root))
        .await?;

    let result = orchestrator.tasks.add_blocker(root, child).await;

    eyre::ensure!(
        matches!(
            result,
            Err(TaskServiceError::Structural(GraphViolation::BlockerInHierarchy {
                relation: HierarchyRelation::Descendant,
                ..
            }))
        ),
        "expected hierarchy violation, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blocked_parents_block_their_children(
    orchestrator: Orchestrator,
) -> Result<(), eyre::Report> {
    let prerequisite = orchestrator.create(CreateTaskRequest::new("Schema")).await?;
    let parent = orchestrator
        .create(CreateTaskRequest::new("Queries").with_blockers([prerequisite]))
        .await?;
    let child = orchestrator
        .create(CreateTaskRequest::new("Select").with_parent(parent))
        .await?;

    let before = orchestrator.tasks.get(child).await?;
    orchestrator
        .workflow
        .complete(cairn::task::services::CompleteTaskRequest::new(prerequisite))
        .await?;
    let after = orchestrator.tasks.get(child).await?;

    eyre::ensure!(before.effectively_blocked, "child should inherit the block");
    eyre::ensure!(!after.effectively_blocked, "completion should unblock");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ready_listing_tracks_blocker_completion(
    orchestrator: Orchestrator,
) -> Result<(), eyre::Report> {
    let first = orchestrator.create(CreateTaskRequest::new("First")).await?;
    let second = orchestrator
        .create(CreateTaskRequest::new("Second").with_blockers([first]))
        .await?;
    let ready = TaskFilter::new().ready_only();

    let before: Vec<_> = orchestrator
        .tasks
        .list(&ready)
        .await?
        .into_iter()
        .map(|view| view.id)
        .collect();
    orchestrator.lifecycle.cancel(first).await?;
    let after_cancel: Vec<_> = orchestrator
        .tasks
        .list(&ready)
        .await?
        .into_iter()
        .map(|view| view.id)
        .collect();

    eyre::ensure!(before == vec![first], "only the blocker starts ready");
    eyre::ensure!(
        after_cancel.is_empty(),
        "a cancelled blocker never satisfies its dependants"
    );
    let waiting = orchestrator.tasks.get(second).await?;
    eyre::ensure!(
        waiting.state == LifecycleState::Pending && waiting.effectively_blocked,
        "second should still be waiting"
    );
    Ok(())
}
