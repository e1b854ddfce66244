use std::path::Path;

use stepflow::draft::{definition_to_draft, draft_to_definition, submit};
use stepflow::edit::{
    MoveDirection, StepEdit, apply_edits, insert_step, move_step, remove_step, rename_step,
};
use stepflow::model::{
    Condition, DraftStep, END, Operator, StepDefinition, StepType, TriggerConfig,
    WorkflowDefinition, WorkflowDraft,
};
use stepflow::SubmitError;
use stepflow::parser::{parse_definition, parse_edits};

fn load_fixture(rel: &str) -> WorkflowDefinition {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    parse_definition(&input).expect("parse failed")
}

fn delay(next: &str) -> StepDefinition {
    StepDefinition::Delay {
        duration_seconds: 5,
        next: next.to_string(),
    }
}

fn keys(steps: &[DraftStep]) -> Vec<&str> {
    steps.iter().map(|step| step.key.as_str()).collect()
}

fn next_of(step: &DraftStep) -> &str {
    match &step.definition {
        StepDefinition::Action { next, .. }
        | StepDefinition::Delay { next, .. }
        | StepDefinition::WaitForEvent { next, .. } => next.as_str(),
        StepDefinition::Branch { .. } => panic!("branch has no next"),
    }
}

#[test]
fn acyclic_fixtures_round_trip() {
    for rel in ["linear.json", "branching.json", "converging.json"] {
        let definition = load_fixture(rel);
        let draft = definition_to_draft("fixture", &definition);
        assert_eq!(draft_to_definition(&draft), definition, "{rel}: round trip changed");
    }
}

#[test]
fn draft_follows_graph_order() {
    let draft = definition_to_draft("charges", &load_fixture("branching.json"));
    assert_eq!(
        keys(&draft.steps),
        vec!["check_amount", "alert_finance", "wait_for_refund", "log_charge"]
    );
}

#[test]
fn cycle_is_flattened_once() {
    let definition = WorkflowDefinition {
        description: None,
        trigger: TriggerConfig::default(),
        start_at: "A".to_string(),
        steps: [("A".to_string(), delay("B")), ("B".to_string(), delay("A"))]
            .into_iter()
            .collect(),
    };
    let draft = definition_to_draft("loop", &definition);
    assert_eq!(keys(&draft.steps), vec!["A", "B"]);

    let draft = definition_to_draft("poller", &load_fixture("cycle.json"));
    assert_eq!(keys(&draft.steps), vec!["poll", "is_ready", "backoff"]);
}

#[test]
fn disconnected_steps_follow_reachable_ones() {
    let draft = definition_to_draft("ci", &load_fixture("disconnected.json"));
    assert_eq!(keys(&draft.steps), vec!["build", "archived"]);
}

#[test]
fn disconnected_steps_keep_document_order() {
    let definition = parse_definition(
        r#"{
            "trigger": {"connector_id": "cron", "trigger_id": "tick", "config": {}},
            "start_at": "m",
            "steps": {
                "m": {"type": "delay", "duration_seconds": 1, "next": "end"},
                "z": {"type": "delay", "duration_seconds": 1, "next": "end"},
                "a": {"type": "delay", "duration_seconds": 1, "next": "end"}
            }
        }"#,
    )
    .unwrap();
    let draft = definition_to_draft("tick", &definition);
    assert_eq!(keys(&draft.steps), vec!["m", "z", "a"]);
}

#[test]
fn insert_auto_wires_previous_tail() {
    let steps = vec![DraftStep::new("A", delay(END))];
    let steps = insert_step(&steps);
    assert_eq!(keys(&steps), vec!["A", "step_2"]);
    assert_eq!(next_of(&steps[0]), "step_2");
    assert_eq!(next_of(&steps[1]), END);
    assert_eq!(steps[1].definition.step_type(), StepType::Action);
}

#[test]
fn rename_propagates_to_references() {
    let steps = vec![
        DraftStep::new("first", delay("A")),
        DraftStep::new("A", delay(END)),
    ];
    let steps = rename_step(&steps, 1, "A2");
    assert_eq!(keys(&steps), vec!["first", "A2"]);
    assert_eq!(next_of(&steps[0]), "A2");
}

#[test]
fn removal_repairs_branch_targets() {
    let branch = StepDefinition::Branch {
        condition: Condition {
            field: "ok".to_string(),
            operator: Operator::Eq,
            value: Some(true.into()),
        },
        on_true: "B".to_string(),
        on_false: "C".to_string(),
    };
    let steps = vec![
        DraftStep::new("check", branch),
        DraftStep::new("B", delay(END)),
        DraftStep::new("C", delay(END)),
    ];
    let steps = remove_step(&steps, 1);
    assert_eq!(keys(&steps), vec!["check", "C"]);
    match &steps[0].definition {
        StepDefinition::Branch {
            on_true, on_false, ..
        } => {
            assert_eq!(on_true, END);
            assert_eq!(on_false, "C");
        }
        other => panic!("expected branch, got {other:?}"),
    }
}

#[test]
fn move_changes_order_but_not_references() {
    let steps = vec![
        DraftStep::new("a", delay("b")),
        DraftStep::new("b", delay(END)),
    ];
    let moved = move_step(&steps, 1, MoveDirection::Up);
    assert_eq!(keys(&moved), vec!["b", "a"]);
    assert_eq!(next_of(&moved[1]), "b");

    let definition = draft_to_definition(&WorkflowDraft::empty().with_steps(moved));
    assert_eq!(definition.start_at, "b");
}

#[test]
fn edit_script_builds_a_workflow() {
    let script = parse_edits(
        r#"[
            {"op": "insert"},
            {"op": "rename", "index": 0, "key": "fetch"},
            {"op": "insert"},
            {"op": "change_type", "index": 1, "step_type": "delay"},
            {"op": "rename", "index": 1, "key": "cool_down"},
            {"op": "set_retry", "index": 0, "enabled": true}
        ]"#,
    )
    .unwrap();
    let steps = apply_edits(&[], &script);
    assert_eq!(keys(&steps), vec!["fetch", "cool_down"]);
    assert_eq!(next_of(&steps[0]), "cool_down");
    assert_eq!(steps[1].definition.step_type(), StepType::Delay);
    match &steps[0].definition {
        StepDefinition::Action { retry, .. } => assert!(retry.is_some()),
        other => panic!("expected action, got {other:?}"),
    }

    let mut draft = WorkflowDraft::empty().with_steps(steps);
    draft.name = "sync".to_string();
    draft.trigger = Some(TriggerConfig::default());
    let definition = submit(&draft).unwrap();
    assert_eq!(definition.start_at, "fetch");
    assert_eq!(definition.steps.len(), 2);
}

#[test]
fn submit_reports_first_problem() {
    let mut draft = WorkflowDraft::empty();
    assert_eq!(submit(&draft), Err(SubmitError::MissingName));
    draft.name = "nightly".to_string();
    assert_eq!(submit(&draft), Err(SubmitError::MissingTrigger));
    draft.trigger = Some(TriggerConfig::default());
    assert_eq!(submit(&draft), Err(SubmitError::NoSteps));
    draft.steps = apply_edits(&draft.steps, &[StepEdit::Insert]);
    assert!(submit(&draft).is_ok());
}
