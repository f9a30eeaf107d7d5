//! Depth-gated context and learning inheritance tests.

use crate::task::domain::{
    ContextChain, InheritedLearnings, Learning, NewTaskData, Priority, Task, TaskId,
};
use mockable::DefaultClock;
use rstest::rstest;

fn with_context(parent_id: Option<TaskId>, context: &str) -> Task {
    Task::new(
        NewTaskData {
            parent_id,
            description: "work item".to_owned(),
            context: context.to_owned(),
            priority: Priority::DEFAULT,
        },
        &DefaultClock,
    )
    .expect("valid task")
}

fn note(holder: &Task, content: &str) -> Learning {
    Learning::new(holder.id(), content, &DefaultClock).expect("valid learning")
}

#[rstest]
fn root_sees_only_its_own_context() {
    let milestone = with_context(None, "Ship v1");

    let chain = ContextChain::build(&milestone, &[]);

    assert_eq!(chain.own, "Ship v1");
    assert_eq!(chain.parent, None);
    assert_eq!(chain.milestone, None);
}

#[rstest]
fn depth_one_task_reports_its_parent_as_the_milestone() {
    let milestone = with_context(None, "Ship v1");
    let work = with_context(Some(milestone.id()), "Write the parser");

    let chain = ContextChain::build(&work, std::slice::from_ref(&milestone));

    assert_eq!(chain.own, "Write the parser");
    assert_eq!(chain.parent, None);
    assert_eq!(chain.milestone.as_deref(), Some("Ship v1"));
}

#[rstest]
fn depth_two_task_sees_parent_and_milestone() {
    let milestone = with_context(None, "Ship v1");
    let work = with_context(Some(milestone.id()), "Write the parser");
    let subtask = with_context(Some(work.id()), "");

    let chain = ContextChain::build(&subtask, &[work, milestone]);

    assert_eq!(chain.own, "");
    assert_eq!(chain.parent.as_deref(), Some("Write the parser"));
    assert_eq!(chain.milestone.as_deref(), Some("Ship v1"));
}

#[rstest]
fn empty_ancestor_context_is_omitted() {
    let milestone = with_context(None, "");
    let work = with_context(Some(milestone.id()), "Write the parser");

    let chain = ContextChain::build(&work, std::slice::from_ref(&milestone));
    let json = serde_json::to_value(&chain).expect("chain serializes");

    assert_eq!(chain.milestone, None);
    assert!(json.get("milestone").is_none());
}

#[rstest]
fn whitespace_ancestor_context_is_passed_through() {
    let milestone = with_context(None, "  ");
    let work = with_context(Some(milestone.id()), "Write the parser");

    let chain = ContextChain::build(&work, std::slice::from_ref(&milestone));

    assert_eq!(chain.milestone.as_deref(), Some("  "));
}

#[rstest]
fn learnings_are_gated_like_context() {
    let milestone = with_context(None, "");
    let work = with_context(Some(milestone.id()), "");
    let subtask = with_context(Some(work.id()), "");
    let own = vec![note(&subtask, "own")];
    let from_work = vec![note(&work, "parent")];
    let from_milestone = vec![note(&milestone, "milestone")];

    let deep = InheritedLearnings::build(
        own.clone(),
        vec![from_work.clone(), from_milestone.clone()],
    );
    let shallow = InheritedLearnings::build(own.clone(), vec![from_milestone.clone()]);
    let root = InheritedLearnings::build(own.clone(), Vec::new());

    assert_eq!(deep.own, own);
    assert_eq!(deep.parent, from_work);
    assert_eq!(deep.milestone, from_milestone);
    assert!(shallow.parent.is_empty());
    assert_eq!(shallow.milestone, from_milestone);
    assert!(root.parent.is_empty() && root.milestone.is_empty());
}

#[rstest]
fn copied_learning_keeps_its_author() {
    let milestone = with_context(None, "");
    let work = with_context(Some(milestone.id()), "");
    let original = note(&work, "Cache the lexer tables");

    let copy = original.copied_to(milestone.id(), &DefaultClock);

    assert_ne!(copy.id(), original.id());
    assert_eq!(copy.task_id(), milestone.id());
    assert_eq!(copy.source_task_id(), work.id());
    assert!(copy.is_same_note(&original));
}
