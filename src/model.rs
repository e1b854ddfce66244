//! Workflow definition documents and the editable draft that mirrors them.
//!
//! A definition is graph shaped: a trigger, an entry key and a keyed mapping of
//! steps whose `next`/`on_true`/`on_false` fields name other steps or [`END`].
//! A draft holds the same steps as an ordered list for editing.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference target that terminates the workflow. Never a real step key.
pub const END: &str = "end";

pub type StepKey = String;

/// Steps keyed by name, iterated in the order they appeared on the wire.
pub type StepMap = IndexMap<StepKey, StepDefinition>;

pub fn is_end(key: &str) -> bool {
    key == END
}

fn end_key() -> StepKey {
    END.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub connector_id: String,
    pub trigger_id: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_seconds: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    Exists,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Contains => "contains",
            Self::Exists => "exists",
        }
    }

    /// Short form used in diagram sublabels.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Contains => "contains",
            Self::Exists => "exists",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Action,
    Branch,
    Delay,
    WaitForEvent,
}

impl StepType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Branch => "branch",
            Self::Delay => "delay",
            Self::WaitForEvent => "wait_for_event",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of a branch decision a reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeLabel {
    True,
    False,
}

impl EdgeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
        }
    }
}

/// One outgoing reference of a step. `label` is set only for branch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRef<'a> {
    pub label: Option<EdgeLabel>,
    pub target: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepDefinition {
    Action {
        connector_id: String,
        action_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connection_id: Option<String>,
        #[serde(default)]
        config: Map<String, Value>,
        #[serde(default = "end_key")]
        next: StepKey,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry: Option<RetryPolicy>,
    },
    Branch {
        condition: Condition,
        #[serde(default = "end_key")]
        on_true: StepKey,
        #[serde(default = "end_key")]
        on_false: StepKey,
    },
    Delay {
        duration_seconds: u64,
        #[serde(default = "end_key")]
        next: StepKey,
    },
    WaitForEvent {
        event_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_seconds: Option<u64>,
        #[serde(default = "end_key")]
        next: StepKey,
    },
}

impl StepDefinition {
    /// Fresh definition of the given type with every reference pointing at [`END`].
    pub fn default_for(step_type: StepType) -> Self {
        match step_type {
            StepType::Action => Self::Action {
                connector_id: String::new(),
                action_id: String::new(),
                connection_id: None,
                config: Map::new(),
                next: end_key(),
                retry: None,
            },
            StepType::Branch => Self::Branch {
                condition: Condition {
                    field: String::new(),
                    operator: Operator::Eq,
                    value: Some(Value::String(String::new())),
                },
                on_true: end_key(),
                on_false: end_key(),
            },
            StepType::Delay => Self::Delay {
                duration_seconds: 5,
                next: end_key(),
            },
            StepType::WaitForEvent => Self::WaitForEvent {
                event_name: String::new(),
                timeout_seconds: None,
                next: end_key(),
            },
        }
    }

    pub fn step_type(&self) -> StepType {
        match self {
            Self::Action { .. } => StepType::Action,
            Self::Branch { .. } => StepType::Branch,
            Self::Delay { .. } => StepType::Delay,
            Self::WaitForEvent { .. } => StepType::WaitForEvent,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Self::Branch { .. })
    }

    /// Outgoing references in a uniform shape: one unlabeled `next`, or the
    /// `true` target followed by the `false` target.
    pub fn references(&self) -> Vec<StepRef<'_>> {
        match self {
            Self::Branch {
                on_true, on_false, ..
            } => vec![
                StepRef {
                    label: Some(EdgeLabel::True),
                    target: on_true,
                },
                StepRef {
                    label: Some(EdgeLabel::False),
                    target: on_false,
                },
            ],
            Self::Action { next, .. }
            | Self::Delay { next, .. }
            | Self::WaitForEvent { next, .. } => {
                vec![StepRef {
                    label: None,
                    target: next,
                }]
            }
        }
    }

    /// Returns a copy whose references are passed through `f`. A `None` from
    /// `f` keeps the reference as it was.
    pub fn map_references<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&str) -> Option<StepKey>,
    {
        let mut out = self.clone();
        match &mut out {
            Self::Branch {
                on_true, on_false, ..
            } => {
                if let Some(target) = f(on_true.as_str()) {
                    *on_true = target;
                }
                if let Some(target) = f(on_false.as_str()) {
                    *on_false = target;
                }
            }
            Self::Action { next, .. }
            | Self::Delay { next, .. }
            | Self::WaitForEvent { next, .. } => {
                if let Some(target) = f(next.as_str()) {
                    *next = target;
                }
            }
        }
        out
    }

    /// Returns a copy with `next` set to `target`. Branches have no single
    /// successor and are returned unchanged.
    pub fn with_next(&self, target: &str) -> Self {
        let mut out = self.clone();
        match &mut out {
            Self::Action { next, .. }
            | Self::Delay { next, .. }
            | Self::WaitForEvent { next, .. } => {
                *next = target.to_string();
            }
            Self::Branch { .. } => {}
        }
        out
    }

    /// Toggles the retry block of an action step. Other variants are unchanged.
    pub fn with_retry(&self, enabled: bool) -> Self {
        let mut out = self.clone();
        if let Self::Action { retry, .. } = &mut out {
            match (enabled, retry.is_some()) {
                (true, false) => *retry = Some(RetryPolicy::default()),
                (false, true) => *retry = None,
                _ => {}
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub trigger: TriggerConfig,
    #[serde(default = "end_key")]
    pub start_at: StepKey,
    #[serde(default)]
    pub steps: StepMap,
}

impl WorkflowDefinition {
    /// Looks up a reference target. `end` and dangling keys both resolve to `None`.
    pub fn resolve(&self, key: &str) -> Option<&StepDefinition> {
        if is_end(key) {
            return None;
        }
        self.steps.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftStep {
    pub key: StepKey,
    pub definition: StepDefinition,
}

impl DraftStep {
    pub fn new(key: impl Into<StepKey>, definition: StepDefinition) -> Self {
        Self {
            key: key.into(),
            definition,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub trigger: Option<TriggerConfig>,
    #[serde(default)]
    pub steps: Vec<DraftStep>,
}

impl WorkflowDraft {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Same draft with its step list replaced.
    pub fn with_steps(&self, steps: Vec<DraftStep>) -> Self {
        Self {
            steps,
            ..self.clone()
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.key.as_str())
    }
}
