use std::collections::{HashMap, VecDeque};

use tracing::{trace, warn};

use crate::model::{EdgeLabel, StepDefinition, TriggerConfig, WorkflowDefinition, is_end};

/// Id of the synthetic trigger node.
pub const TRIGGER_ID: &str = "__trigger__";
/// Id of the shared terminal node.
pub const END_ID: &str = "end";

/// Keys taken by the synthetic nodes. A step stored under one is not drawn.
fn is_reserved(key: &str) -> bool {
    key == TRIGGER_ID || is_end(key)
}

/// Like [`WorkflowDefinition::resolve`], but reserved keys never resolve.
fn drawable<'a>(definition: &'a WorkflowDefinition, key: &str) -> Option<&'a StepDefinition> {
    if is_reserved(key) {
        return None;
    }
    definition.resolve(key)
}

#[derive(Debug, Clone, Copy)]
pub(super) enum FlowNodeKind<'a> {
    Trigger(&'a TriggerConfig),
    Step(&'a StepDefinition),
    End,
}

#[derive(Debug, Clone)]
pub(super) struct FlowNode<'a> {
    pub id: &'a str,
    pub kind: FlowNodeKind<'a>,
    pub layer: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct FlowEdge {
    pub from: usize,
    pub to: usize,
    pub label: Option<EdgeLabel>,
}

/// The workflow as an indexed graph. `nodes` is sorted by layer; within a
/// layer nodes keep their discovery order.
#[derive(Debug, Clone)]
pub(super) struct FlowGraph<'a> {
    pub nodes: Vec<FlowNode<'a>>,
    pub edges: Vec<FlowEdge>,
    pub layers: Vec<Vec<usize>>,
}

/// Layers every node by breadth-first distance from the trigger. Steps the
/// trigger cannot reach share one trailing layer in declaration order, and the
/// shared `end` node, when referenced, sits below everything else. References
/// to reserved or missing keys are drawn into `end`.
pub(super) fn build_flow_graph(definition: &WorkflowDefinition) -> FlowGraph<'_> {
    let mut layer_of: HashMap<&str, usize> = HashMap::new();
    let mut discovered: Vec<&str> = Vec::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    if drawable(definition, &definition.start_at).is_some() {
        layer_of.insert(definition.start_at.as_str(), 1);
        discovered.push(definition.start_at.as_str());
        queue.push_back(definition.start_at.as_str());
    }

    while let Some(key) = queue.pop_front() {
        let layer = layer_of[key];
        let Some(step) = definition.steps.get(key) else {
            continue;
        };
        for reference in step.references() {
            if drawable(definition, reference.target).is_none()
                || layer_of.contains_key(reference.target)
            {
                continue;
            }
            layer_of.insert(reference.target, layer + 1);
            discovered.push(reference.target);
            queue.push_back(reference.target);
        }
    }

    let mut last_layer = discovered
        .iter()
        .map(|key| layer_of[key])
        .max()
        .unwrap_or(0);

    let mut unreachable: Vec<&str> = Vec::new();
    for key in definition.steps.keys().map(String::as_str) {
        if is_reserved(key) {
            warn!(step = %key, "step key is reserved for a diagram node, not drawn");
        } else if !layer_of.contains_key(key) {
            unreachable.push(key);
        }
    }
    if !unreachable.is_empty() {
        last_layer += 1;
        for &key in &unreachable {
            trace!(step = %key, layer = last_layer, "placing unreachable step");
            layer_of.insert(key, last_layer);
        }
    }

    let mut nodes = Vec::with_capacity(definition.steps.len() + 2);
    nodes.push(FlowNode {
        id: TRIGGER_ID,
        kind: FlowNodeKind::Trigger(&definition.trigger),
        layer: 0,
    });
    let mut index_of: HashMap<&str, usize> = HashMap::new();
    for &key in discovered.iter().chain(unreachable.iter()) {
        index_of.insert(key, nodes.len());
        nodes.push(FlowNode {
            id: key,
            kind: FlowNodeKind::Step(&definition.steps[key]),
            layer: layer_of[key],
        });
    }

    let needs_end = drawable(definition, &definition.start_at).is_none()
        || discovered
            .iter()
            .chain(unreachable.iter())
            .flat_map(|&key| definition.steps[key].references())
            .any(|reference| drawable(definition, reference.target).is_none());
    let end_index = needs_end.then(|| {
        nodes.push(FlowNode {
            id: END_ID,
            kind: FlowNodeKind::End,
            layer: last_layer + 1,
        });
        nodes.len() - 1
    });

    let target_index = |target: &str| -> Option<usize> {
        match index_of.get(target) {
            Some(idx) => Some(*idx),
            None => {
                if !is_end(target) {
                    trace!(reference = target, "dangling reference drawn as end");
                }
                end_index
            }
        }
    };

    let mut edges = Vec::new();
    if let Some(to) = target_index(&definition.start_at) {
        edges.push(FlowEdge {
            from: 0,
            to,
            label: None,
        });
    }
    for (from, node) in nodes.iter().enumerate() {
        let FlowNodeKind::Step(step) = node.kind else {
            continue;
        };
        for reference in step.references() {
            if let Some(to) = target_index(reference.target) {
                edges.push(FlowEdge {
                    from,
                    to,
                    label: reference.label,
                });
            }
        }
    }

    let layer_count = nodes.iter().map(|node| node.layer + 1).max().unwrap_or(1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
    for (idx, node) in nodes.iter().enumerate() {
        layers[node.layer].push(idx);
    }

    FlowGraph {
        nodes,
        edges,
        layers,
    }
}
