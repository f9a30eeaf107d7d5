//! Value object, identifier and configuration tests.

use crate::task::{
    domain::{
        BookmarkName, LifecycleState, NewTaskData, PositionRef, Priority, Task, TaskDomainError,
        TaskId,
    },
    services::{TaskServiceError, WorkflowConfig},
};
use mockable::DefaultClock;
use rstest::rstest;

#[rstest]
#[case(0, true)]
#[case(1, true)]
#[case(2, true)]
#[case(3, false)]
#[case(-1, false)]
fn priority_accepts_only_zero_to_two(#[case] value: i64, #[case] valid: bool) {
    let result = Priority::new(value);
    assert_eq!(result.is_ok(), valid);
    if !valid {
        assert_eq!(result, Err(TaskDomainError::InvalidPriority(value)));
    }
}

#[rstest]
fn default_priority_is_the_middle_value() {
    assert_eq!(Priority::default(), Priority::DEFAULT);
    assert_eq!(Priority::DEFAULT.value(), 1);
}

#[rstest]
fn task_ids_round_trip_through_their_prefixed_form() {
    let id = TaskId::new();
    let rendered = id.to_string();

    assert!(rendered.starts_with("task_"));
    assert_eq!(rendered.parse::<TaskId>(), Ok(id));
    assert!("lrn_0000".parse::<TaskId>().is_err());
}

#[rstest]
#[case("task/alpha", true)]
#[case("feature/nested/name", true)]
#[case("", false)]
#[case("has space", false)]
#[case("a..b", false)]
#[case("-flag", false)]
#[case("what?", false)]
fn bookmark_names_follow_ref_rules(#[case] value: &str, #[case] valid: bool) {
    assert_eq!(BookmarkName::new(value).is_ok(), valid);
}

#[rstest]
fn deserialization_applies_the_same_validation() {
    let bookmark: BookmarkName =
        serde_json::from_str("\"task/alpha\"").expect("valid bookmark deserializes");
    let position: PositionRef =
        serde_json::from_str("\"abc123\"").expect("valid position deserializes");

    assert_eq!(bookmark.as_str(), "task/alpha");
    assert_eq!(
        serde_json::to_string(&position).expect("position serializes"),
        "\"abc123\""
    );
    assert!(serde_json::from_str::<BookmarkName>("\"a..b\"").is_err());
    assert!(serde_json::from_str::<BookmarkName>("\"-flag\"").is_err());
    assert!(serde_json::from_str::<PositionRef>("\" \"").is_err());
}

#[rstest]
fn position_refs_reject_blank_values() {
    assert!(PositionRef::new("  ").is_err());
    assert_eq!(
        PositionRef::new("abc").map(|position| position.as_str().to_owned()),
        Ok("abc".to_owned())
    );
}

#[rstest]
fn descriptions_are_trimmed_and_required() {
    let blank = Task::new(
        NewTaskData {
            parent_id: None,
            description: "   ".to_owned(),
            context: String::new(),
            priority: Priority::DEFAULT,
        },
        &DefaultClock,
    );
    let padded = Task::new(
        NewTaskData {
            parent_id: None,
            description: "  Write docs  ".to_owned(),
            context: String::new(),
            priority: Priority::DEFAULT,
        },
        &DefaultClock,
    )
    .expect("valid task");

    assert_eq!(blank, Err(TaskDomainError::EmptyDescription));
    assert_eq!(padded.description(), "Write docs");
    assert_eq!(padded.lifecycle_state(), LifecycleState::Pending);
}

#[rstest]
fn lifecycle_states_parse_from_their_canonical_names() {
    assert_eq!(
        LifecycleState::try_from("in_progress"),
        Ok(LifecycleState::InProgress)
    );
    assert!(LifecycleState::try_from("done").is_err());
}

#[rstest]
fn bookmark_names_use_the_configured_prefix() {
    let id = TaskId::new();
    let config = WorkflowConfig::default().with_bookmark_prefix("agent/");

    let name = config.bookmark_for(id).expect("valid bookmark");

    assert_eq!(name.as_str(), format!("agent/{id}"));
}

#[rstest]
fn milestones_use_the_milestone_commit_template() {
    let task = Task::new(
        NewTaskData {
            parent_id: None,
            description: "Release".to_owned(),
            context: String::new(),
            priority: Priority::DEFAULT,
        },
        &DefaultClock,
    )
    .expect("valid task");
    let config = WorkflowConfig::default()
        .with_commit_template("task {{ description }}")
        .with_milestone_commit_template("milestone {{ description }} at {{ depth }}");

    let root_message = config
        .render_commit_message(&task, None, 0)
        .expect("template renders");
    let child_message = config
        .render_commit_message(&task, Some("ok"), 1)
        .expect("template renders");

    assert_eq!(root_message, "milestone Release at 0");
    assert_eq!(child_message, "task Release");
}

#[rstest]
fn default_commit_template_includes_the_result() {
    let task = Task::new(
        NewTaskData {
            parent_id: None,
            description: "Release".to_owned(),
            context: String::new(),
            priority: Priority::DEFAULT,
        },
        &DefaultClock,
    )
    .expect("valid task");

    let message = WorkflowConfig::default()
        .render_commit_message(&task, Some("Tagged v1"), 1)
        .expect("template renders");

    assert!(message.starts_with("Release\n\nTask: task_"));
    assert!(message.ends_with("Tagged v1"));
}

#[rstest]
fn malformed_templates_surface_a_render_error() {
    let task = Task::new(
        NewTaskData {
            parent_id: None,
            description: "Release".to_owned(),
            context: String::new(),
            priority: Priority::DEFAULT,
        },
        &DefaultClock,
    )
    .expect("valid task");

    let result = WorkflowConfig::default()
        .with_commit_template("{% if %}")
        .render_commit_message(&task, None, 1);

    assert!(matches!(result, Err(TaskServiceError::TemplateRender { .. })));
}
