//! Given steps for task workflow BDD scenarios.

use super::world::{TaskWorkflowWorld, run_async};
use cairn::task::services::{CompleteTaskRequest, CreateTaskRequest};
use eyre::WrapErr;
use rstest_bdd_macros::given;

fn create(
    world: &mut TaskWorkflowWorld,
    name: String,
    request: CreateTaskRequest,
) -> Result<(), eyre::Report> {
    let created = run_async(world.tasks.create(request))
        .wrap_err_with(|| format!("create task '{name}'"))?;
    world.named.insert(name, created.id);
    Ok(())
}

#[given(r#"a milestone "{name}""#)]
fn a_milestone(world: &mut TaskWorkflowWorld, name: String) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(name.clone());
    create(world, name, request)
}

#[given(r#"a blocked milestone "{name}" waiting on "{blocker}""#)]
fn a_blocked_milestone(
    world: &mut TaskWorkflowWorld,
    name: String,
    blocker: String,
) -> Result<(), eyre::Report> {
    let blocker_id = world.task(&blocker)?;
    let request = CreateTaskRequest::new(name.clone()).with_blockers([blocker_id]);
    create(world, name, request)
}

#[given(r#"a task "{name}" under "{parent}""#)]
fn a_child_task(
    world: &mut TaskWorkflowWorld,
    name: String,
    parent: String,
) -> Result<(), eyre::Report> {
    let parent_id = world.task(&parent)?;
    let request = CreateTaskRequest::new(name.clone()).with_parent(parent_id);
    create(world, name, request)
}

#[given(r#""{name}" has been cancelled"#)]
fn has_been_cancelled(world: &mut TaskWorkflowWorld, name: String) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    run_async(world.lifecycle.cancel(id)).wrap_err("cancel task")?;
    Ok(())
}

#[given(r#""{name}" has been completed"#)]
fn has_been_completed(world: &mut TaskWorkflowWorld, name: String) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    run_async(world.workflow.complete(CompleteTaskRequest::new(id)))
        .wrap_err("complete task")?;
    Ok(())
}

#[given(r#"work has started on "{name}""#)]
fn work_has_started(world: &mut TaskWorkflowWorld, name: String) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    run_async(world.workflow.start(id)).wrap_err("start task")?;
    Ok(())
}

#[given("bookmark deletion fails")]
fn bookmark_deletion_fails(world: &mut TaskWorkflowWorld) -> Result<(), eyre::Report> {
    world.vcs.fail_bookmark_deletion(true)?;
    Ok(())
}
