//! Then steps for task workflow BDD scenarios.

use super::world::{TaskWorkflowWorld, run_async};
use cairn::task::domain::LifecycleState;
use rstest_bdd_macros::then;

#[then(r#"the change is rejected with code "{code}""#)]
fn rejected_with_code(world: &TaskWorkflowWorld, code: String) -> Result<(), eyre::Report> {
    let err = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected the change to be rejected"))?;
    eyre::ensure!(
        err.code() == code,
        "expected error code {code}, found {} ({err})",
        err.code()
    );
    Ok(())
}

#[then(r#""{name}" is in state "{state}""#)]
fn is_in_state(world: &TaskWorkflowWorld, name: String, state: String) -> Result<(), eyre::Report> {
    let expected = LifecycleState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected state in scenario: {err}"))?;
    let view = run_async(world.tasks.get(world.task(&name)?))?;
    eyre::ensure!(
        view.state == expected,
        "expected {name} to be {expected}, found {}",
        view.state
    );
    Ok(())
}

#[then(r#"the learning count of "{name}" is {count:usize}"#)]
fn learning_count(
    world: &TaskWorkflowWorld,
    name: String,
    count: usize,
) -> Result<(), eyre::Report> {
    let held = run_async(world.learnings.list(world.task(&name)?))?;
    eyre::ensure!(
        held.len() == count,
        "expected {count} learning(s) on {name}, found {}",
        held.len()
    );
    Ok(())
}

#[then(r#""{name}" still records its bookmark"#)]
fn still_records_bookmark(world: &TaskWorkflowWorld, name: String) -> Result<(), eyre::Report> {
    let view = run_async(world.tasks.get(world.task(&name)?))?;
    eyre::ensure!(
        view.bookmark.is_some(),
        "expected {name} to keep its bookmark"
    );
    eyre::ensure!(
        !world.vcs.bookmarks()?.is_empty(),
        "expected the bookmark to survive the failed deletion"
    );
    Ok(())
}

#[then(r#""{name}" still waits for "{blocker}""#)]
fn still_waits_for(
    world: &TaskWorkflowWorld,
    name: String,
    blocker: String,
) -> Result<(), eyre::Report> {
    let blocker_id = world.task(&blocker)?;
    let view = run_async(world.tasks.get(world.task(&name)?))?;
    eyre::ensure!(
        view.blocked_by.contains(&blocker_id),
        "expected {name} to keep waiting for {blocker}"
    );
    Ok(())
}

#[then(r#"every child of "{name}" shares its archive timestamp"#)]
fn children_share_archive_timestamp(
    world: &TaskWorkflowWorld,
    name: String,
) -> Result<(), eyre::Report> {
    let root = run_async(world.tasks.get(world.task(&name)?))?;
    let archived_at = root
        .archived_at
        .ok_or_else(|| eyre::eyre!("expected {name} to be archived"))?;
    for id in world.named.values() {
        let view = run_async(world.tasks.get(*id))?;
        if view.parent_id != Some(root.id) {
            continue;
        }
        eyre::ensure!(
            view.archived_at == Some(archived_at),
            "expected {} to share the archive timestamp of {name}",
            view.id
        );
    }
    Ok(())
}
