//! When steps for task workflow BDD scenarios.

use super::world::{TaskWorkflowWorld, run_async};
use cairn::task::services::CompleteTaskRequest;
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#""{name}" is made to wait for "{blocker}""#)]
fn made_to_wait(
    world: &mut TaskWorkflowWorld,
    name: String,
    blocker: String,
) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    let blocker_id = world.task(&blocker)?;
    world.last_error = run_async(world.tasks.add_blocker(id, blocker_id)).err();
    Ok(())
}

#[when(r#"work starts on "{name}""#)]
fn work_starts(world: &mut TaskWorkflowWorld, name: String) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    run_async(world.workflow.start(id)).wrap_err("start task")?;
    Ok(())
}

#[when(r#""{name}" is completed with the learning "{learning}""#)]
fn completed_with_learning(
    world: &mut TaskWorkflowWorld,
    name: String,
    learning: String,
) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    let request = CompleteTaskRequest::new(id).with_learnings([learning]);
    run_async(world.workflow.complete(request)).wrap_err("complete task")?;
    Ok(())
}

#[when(r#""{name}" is completed"#)]
fn completed(world: &mut TaskWorkflowWorld, name: String) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    run_async(world.workflow.complete(CompleteTaskRequest::new(id)))
        .wrap_err("complete task")?;
    Ok(())
}

#[when(r#""{name}" is archived"#)]
fn archived(world: &mut TaskWorkflowWorld, name: String) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    world.last_error = run_async(world.lifecycle.archive(id)).err();
    Ok(())
}
