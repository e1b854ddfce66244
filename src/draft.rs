//! Conversion between the graph-shaped [`WorkflowDefinition`] and the ordered
//! [`WorkflowDraft`] the editor works on.

use std::collections::HashSet;

use tracing::debug;

use crate::error::SubmitError;
use crate::model::{DraftStep, END, StepMap, WorkflowDefinition, WorkflowDraft, is_end};

/// Assembles a definition from the draft's steps. The first step becomes the
/// entry point; an empty draft starts at `end`.
pub fn draft_to_definition(draft: &WorkflowDraft) -> WorkflowDefinition {
    let mut steps = StepMap::new();
    for step in &draft.steps {
        steps.insert(step.key.clone(), step.definition.clone());
    }

    let start_at = draft
        .steps
        .first()
        .map(|step| step.key.clone())
        .unwrap_or_else(|| END.to_string());

    let description = if draft.description.is_empty() {
        None
    } else {
        Some(draft.description.clone())
    };

    WorkflowDefinition {
        description,
        trigger: draft.trigger.clone().unwrap_or_default(),
        start_at,
        steps,
    }
}

/// Rebuilds an ordered draft by walking the definition depth first from
/// `start_at` (`on_true` before `on_false`). Each key is emitted once, at its
/// first discovery, so cycles and reconverging branches terminate. Steps the
/// walk never reaches follow in the order they were declared.
pub fn definition_to_draft(name: &str, definition: &WorkflowDefinition) -> WorkflowDraft {
    let order = traversal_order(definition);
    let mut visited: HashSet<&str> = order.iter().copied().collect();
    let mut steps: Vec<DraftStep> = order
        .iter()
        .filter_map(|key| {
            definition
                .steps
                .get(*key)
                .map(|def| DraftStep::new(*key, def.clone()))
        })
        .collect();

    for (key, def) in &definition.steps {
        if visited.insert(key.as_str()) {
            debug!(step = %key, "step unreachable from start_at, appending");
            steps.push(DraftStep::new(key.clone(), def.clone()));
        }
    }

    WorkflowDraft {
        name: name.to_string(),
        description: definition.description.clone().unwrap_or_default(),
        trigger: Some(definition.trigger.clone()),
        steps,
    }
}

/// Keys reachable from `start_at` in first-discovery order.
pub fn traversal_order(definition: &WorkflowDefinition) -> Vec<&str> {
    let mut order = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![definition.start_at.as_str()];

    while let Some(key) = stack.pop() {
        if is_end(key) || visited.contains(key) {
            continue;
        }
        let Some(def) = definition.steps.get(key) else {
            continue;
        };
        visited.insert(key);
        order.push(key);
        // Reverse so the first reference is popped, and fully explored, first.
        for reference in def.references().into_iter().rev() {
            stack.push(reference.target);
        }
    }

    order
}

/// Save-time gate: a named draft with a trigger and at least one step.
pub fn submit(draft: &WorkflowDraft) -> Result<WorkflowDefinition, SubmitError> {
    if draft.name.trim().is_empty() {
        return Err(SubmitError::MissingName);
    }
    if draft.trigger.is_none() {
        return Err(SubmitError::MissingTrigger);
    }
    if draft.steps.is_empty() {
        return Err(SubmitError::NoSteps);
    }
    Ok(draft_to_definition(draft))
}
