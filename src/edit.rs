//! Editing operations over a draft's ordered step list.
//!
//! Every operation borrows the current list and returns a new one; invalid
//! input (bad index, empty or taken key) yields an unchanged copy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::model::{DraftStep, END, StepDefinition, StepKey, StepType, is_end};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// A single list edit, as replayed by hosts from JSON edit scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepEdit {
    Insert,
    Update {
        index: usize,
        definition: StepDefinition,
    },
    Rename {
        index: usize,
        key: StepKey,
    },
    Remove {
        index: usize,
    },
    Move {
        index: usize,
        direction: MoveDirection,
    },
    ChangeType {
        index: usize,
        step_type: StepType,
    },
    SetRetry {
        index: usize,
        enabled: bool,
    },
}

/// First unused key among `step_{seed}`, `step_{seed}_1`, `step_{seed}_2`, ...
pub fn fresh_step_key(existing: &BTreeSet<&str>, seed: usize) -> StepKey {
    let base = format!("step_{seed}");
    if !existing.contains(base.as_str()) {
        return base;
    }
    let mut counter = 1usize;
    loop {
        let candidate = format!("{base}_{counter}");
        if !existing.contains(candidate.as_str()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Appends a default action step under a fresh key. A non-branch tail is
/// rewired to the new step; a branch tail is left as is.
pub fn insert_step(steps: &[DraftStep]) -> Vec<DraftStep> {
    let existing: BTreeSet<&str> = steps.iter().map(|step| step.key.as_str()).collect();
    let key = fresh_step_key(&existing, steps.len() + 1);

    let mut updated = steps.to_vec();
    if let Some(last) = updated.last_mut() {
        if !last.definition.is_branch() {
            last.definition = last.definition.with_next(&key);
        }
    }
    debug!(step = %key, "inserting step");
    updated.push(DraftStep::new(
        key,
        StepDefinition::default_for(StepType::Action),
    ));
    updated
}

pub fn update_step(
    steps: &[DraftStep],
    index: usize,
    definition: StepDefinition,
) -> Vec<DraftStep> {
    let mut updated = steps.to_vec();
    if let Some(step) = updated.get_mut(index) {
        step.definition = definition;
    }
    updated
}

/// Renames the step at `index` and rewrites every reference to its old key.
/// Empty keys, `end`, unchanged keys and keys held by another step are ignored.
pub fn rename_step(steps: &[DraftStep], index: usize, new_key: &str) -> Vec<DraftStep> {
    let Some(old_key) = steps.get(index).map(|step| step.key.as_str()) else {
        return steps.to_vec();
    };
    if new_key.is_empty() || is_end(new_key) || new_key == old_key {
        return steps.to_vec();
    }
    if steps.iter().any(|step| step.key == new_key) {
        trace!(key = new_key, "rename rejected, key already in use");
        return steps.to_vec();
    }

    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let key = if i == index {
                new_key.to_string()
            } else {
                step.key.clone()
            };
            let definition = step
                .definition
                .map_references(|target| (target == old_key).then(|| new_key.to_string()));
            DraftStep { key, definition }
        })
        .collect()
}

/// Removes the step at `index`; references to it fall back to `end`.
pub fn remove_step(steps: &[DraftStep], index: usize) -> Vec<DraftStep> {
    let Some(removed) = steps.get(index) else {
        return steps.to_vec();
    };
    let removed_key = removed.key.as_str();

    steps
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, step)| DraftStep {
            key: step.key.clone(),
            definition: step
                .definition
                .map_references(|target| (target == removed_key).then(|| END.to_string())),
        })
        .collect()
}

/// Swaps the step with its neighbour. References are not touched, so list
/// order may no longer follow the graph afterwards.
pub fn move_step(steps: &[DraftStep], index: usize, direction: MoveDirection) -> Vec<DraftStep> {
    let mut updated = steps.to_vec();
    let target = match direction {
        MoveDirection::Up => index.checked_sub(1),
        MoveDirection::Down => index.checked_add(1),
    };
    if let Some(target) = target {
        if index < updated.len() && target < updated.len() {
            updated.swap(index, target);
        }
    }
    updated
}

/// Switches a step to another type, discarding its type-specific fields.
pub fn change_step_type(steps: &[DraftStep], index: usize, step_type: StepType) -> Vec<DraftStep> {
    match steps.get(index) {
        Some(step) if step.definition.step_type() != step_type => {
            update_step(steps, index, StepDefinition::default_for(step_type))
        }
        _ => steps.to_vec(),
    }
}

pub fn set_retry(steps: &[DraftStep], index: usize, enabled: bool) -> Vec<DraftStep> {
    match steps.get(index) {
        Some(step) => update_step(steps, index, step.definition.with_retry(enabled)),
        None => steps.to_vec(),
    }
}

/// Reference targets offered for the step at `index`: every other key in list
/// order, then `end`.
pub fn next_options(steps: &[DraftStep], index: usize) -> Vec<StepKey> {
    let own = steps.get(index).map(|step| step.key.as_str());
    steps
        .iter()
        .map(|step| step.key.as_str())
        .filter(|key| Some(*key) != own)
        .chain(std::iter::once(END))
        .map(str::to_string)
        .collect()
}

pub fn apply_edit(steps: &[DraftStep], edit: &StepEdit) -> Vec<DraftStep> {
    match edit {
        StepEdit::Insert => insert_step(steps),
        StepEdit::Update { index, definition } => update_step(steps, *index, definition.clone()),
        StepEdit::Rename { index, key } => rename_step(steps, *index, key),
        StepEdit::Remove { index } => remove_step(steps, *index),
        StepEdit::Move { index, direction } => move_step(steps, *index, *direction),
        StepEdit::ChangeType { index, step_type } => change_step_type(steps, *index, *step_type),
        StepEdit::SetRetry { index, enabled } => set_retry(steps, *index, *enabled),
    }
}

pub fn apply_edits<'a, I>(steps: &[DraftStep], edits: I) -> Vec<DraftStep>
where
    I: IntoIterator<Item = &'a StepEdit>,
{
    edits
        .into_iter()
        .fold(steps.to_vec(), |current, edit| apply_edit(&current, edit))
}
