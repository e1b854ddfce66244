mod ranking;
mod routing;
mod text;
pub(crate) mod types;
pub use types::*;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::debug;

use crate::config::LayoutConfig;
use crate::model::{StepDefinition, TriggerConfig, WorkflowDefinition};
use ranking::{FlowGraph, FlowNodeKind, build_flow_graph};
use routing::{RouteContext, path_midpoint};
use text::{text_width, truncate_label};

pub use ranking::{END_ID, TRIGGER_ID};

/// Geometry used by [`layout_workflow`].
pub static DEFAULT_LAYOUT_CONFIG: Lazy<LayoutConfig> = Lazy::new(LayoutConfig::default);

/// Lays out a workflow with the default geometry.
pub fn layout_workflow(definition: &WorkflowDefinition) -> LayoutResult {
    layout_workflow_with_config(definition, &DEFAULT_LAYOUT_CONFIG)
}

/// Lays out a workflow as a top-down layered graph: the trigger on top, one
/// row per breadth-first layer, and the shared `end` node at the bottom.
///
/// The result is a pure function of `definition` and `config`.
pub fn layout_workflow_with_config(
    definition: &WorkflowDefinition,
    config: &LayoutConfig,
) -> LayoutResult {
    let graph = build_flow_graph(definition);
    let mut nodes = size_nodes(&graph, config);
    position_nodes(&graph, &mut nodes, config);

    let router = RouteContext::new(&nodes, config);
    let mut lanes: HashMap<(usize, usize), usize> = HashMap::new();
    let mut edges: Vec<GraphEdge> = graph
        .edges
        .iter()
        .map(|edge| {
            let lane = lanes.entry((edge.from, edge.to)).or_insert(0);
            let points = router.route(edge.from, edge.to, edge.label.is_some(), *lane);
            *lane += 1;
            let label_anchor = edge.label.and_then(|_| path_midpoint(&points));
            GraphEdge {
                from: nodes[edge.from].id.clone(),
                to: nodes[edge.to].id.clone(),
                points,
                label: edge.label,
                label_anchor,
            }
        })
        .collect();

    let (width, height) = normalize(&mut nodes, &mut edges, config.margin);
    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        layers = graph.layers.len(),
        width,
        height,
        "workflow layout complete"
    );

    LayoutResult {
        width,
        height,
        nodes,
        edges,
    }
}

fn size_nodes(graph: &FlowGraph<'_>, config: &LayoutConfig) -> Vec<GraphNode> {
    graph
        .nodes
        .iter()
        .map(|node| {
            let (node_type, label, sublabel, base_height) = match node.kind {
                FlowNodeKind::Trigger(trigger) => (
                    NodeType::Trigger,
                    "Trigger".to_string(),
                    trigger_sublabel(trigger),
                    config.node_height,
                ),
                FlowNodeKind::Step(step) => {
                    let base = if step.is_branch() {
                        config.branch_height
                    } else {
                        config.node_height
                    };
                    (
                        NodeType::from(step.step_type()),
                        node.id.to_string(),
                        step_sublabel(step),
                        base,
                    )
                }
                FlowNodeKind::End => (NodeType::End, "End".to_string(), None, config.end_height),
            };
            let sublabel = sublabel
                .filter(|text| !text.is_empty())
                .map(|text| truncate_label(&text, config.max_sublabel_chars));

            let label_width = text_width(&label, config.font_size);
            let sublabel_width = sublabel
                .as_deref()
                .map(|text| text_width(text, config.sublabel_font_size))
                .unwrap_or(0.0);
            let width = (label_width.max(sublabel_width) + 2.0 * config.node_padding_x)
                .max(config.min_node_width);
            let height = if sublabel.is_some() {
                base_height + config.sublabel_height
            } else {
                base_height
            };

            GraphNode {
                id: node.id.to_string(),
                node_type,
                x: 0.0,
                y: 0.0,
                width,
                height,
                label,
                sublabel,
                layer: node.layer,
            }
        })
        .collect()
}

fn trigger_sublabel(trigger: &TriggerConfig) -> Option<String> {
    dotted(&trigger.connector_id, &trigger.trigger_id)
}

fn step_sublabel(step: &StepDefinition) -> Option<String> {
    match step {
        StepDefinition::Action {
            connector_id,
            action_id,
            ..
        } => dotted(connector_id, action_id),
        StepDefinition::Branch { condition, .. } => {
            if condition.field.is_empty() {
                return None;
            }
            let mut text = format!("{} {}", condition.field, condition.operator.symbol());
            if let Some(value) = condition.value.as_ref().and_then(display_value) {
                text.push(' ');
                text.push_str(&value);
            }
            Some(text)
        }
        StepDefinition::Delay {
            duration_seconds, ..
        } => Some(format!("{duration_seconds}s")),
        StepDefinition::WaitForEvent {
            event_name,
            timeout_seconds,
            ..
        } => match timeout_seconds {
            Some(timeout) => Some(format!("{event_name} (timeout {timeout}s)")),
            None => Some(event_name.clone()),
        },
    }
}

fn dotted(left: &str, right: &str) -> Option<String> {
    match (left.is_empty(), right.is_empty()) {
        (true, true) => None,
        (false, true) => Some(left.to_string()),
        (true, false) => Some(right.to_string()),
        (false, false) => Some(format!("{left}.{right}")),
    }
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Centers every layer on `x = 0` and stacks layers top to bottom.
fn position_nodes(graph: &FlowGraph<'_>, nodes: &mut [GraphNode], config: &LayoutConfig) {
    for (layer, members) in graph.layers.iter().enumerate() {
        if members.is_empty() {
            continue;
        }
        let y = layer as f32 * (config.row_height + config.row_gap);
        let total: f32 = members.iter().map(|&idx| nodes[idx].width).sum::<f32>()
            + config.node_gap * (members.len() - 1) as f32;
        let mut cursor = -total / 2.0;
        for &idx in members {
            let node = &mut nodes[idx];
            node.x = cursor + node.width / 2.0;
            node.y = y;
            cursor += node.width + config.node_gap;
        }
    }
}

/// Shifts everything so the bounding box starts at `margin` and returns the
/// canvas size including the trailing margin.
fn normalize(nodes: &mut [GraphNode], edges: &mut [GraphEdge], margin: f32) -> (f32, f32) {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for node in nodes.iter() {
        min_x = min_x.min(node.left());
        min_y = min_y.min(node.top());
        max_x = max_x.max(node.right());
        max_y = max_y.max(node.bottom());
    }
    for point in edges.iter().flat_map(|edge| edge.points.iter()) {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    if min_x > max_x {
        return (2.0 * margin, 2.0 * margin);
    }

    let dx = margin - min_x;
    let dy = margin - min_y;
    for node in nodes.iter_mut() {
        node.x += dx;
        node.y += dy;
    }
    for edge in edges.iter_mut() {
        for point in edge.points.iter_mut().chain(edge.label_anchor.iter_mut()) {
            point.x += dx;
            point.y += dy;
        }
    }
    (max_x + dx + margin, max_y + dy + margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, END, Operator, RetryPolicy, StepMap};
    use serde_json::Map;

    fn action(next: &str) -> StepDefinition {
        StepDefinition::Action {
            connector_id: "slack".to_string(),
            action_id: "post_message".to_string(),
            connection_id: None,
            config: Map::new(),
            next: next.to_string(),
            retry: Some(RetryPolicy::default()),
        }
    }

    fn branch(on_true: &str, on_false: &str) -> StepDefinition {
        StepDefinition::Branch {
            condition: Condition {
                field: "amount".to_string(),
                operator: Operator::Gt,
                value: Some(Value::from(100)),
            },
            on_true: on_true.to_string(),
            on_false: on_false.to_string(),
        }
    }

    fn definition(start_at: &str, steps: Vec<(&str, StepDefinition)>) -> WorkflowDefinition {
        WorkflowDefinition {
            description: None,
            trigger: TriggerConfig {
                connector_id: "stripe".to_string(),
                trigger_id: "payment_succeeded".to_string(),
                config: Map::new(),
            },
            start_at: start_at.to_string(),
            steps: steps
                .into_iter()
                .map(|(k, d)| (k.to_string(), d))
                .collect::<StepMap>(),
        }
    }

    #[test]
    fn chain_is_a_straight_column() {
        let def = definition("notify", vec![("notify", action(END))]);
        let layout = layout_workflow(&def);
        assert_eq!(layout.nodes.len(), 3);
        assert_eq!(layout.edges.len(), 2);
        for edge in &layout.edges {
            assert_eq!(edge.points.len(), 2);
            assert!(edge.label.is_none());
            assert!(edge.label_anchor.is_none());
        }
        let trigger = layout.node(TRIGGER_ID).unwrap();
        let notify = layout.node("notify").unwrap();
        let end = layout.node(END_ID).unwrap();
        assert!(trigger.y < notify.y && notify.y < end.y);
        assert_eq!(trigger.sublabel.as_deref(), Some("stripe.payment_succeeded"));
        assert_eq!(notify.sublabel.as_deref(), Some("slack.post_message"));
        assert_eq!(end.label, "End");
        assert!(end.sublabel.is_none());
    }

    #[test]
    fn branch_edges_are_labeled_and_curved() {
        let def = definition(
            "check",
            vec![
                ("check", branch("big", "small")),
                ("big", action(END)),
                ("small", action(END)),
            ],
        );
        let layout = layout_workflow(&def);
        let check = layout.node("check").unwrap();
        assert_eq!(check.sublabel.as_deref(), Some("amount > 100"));
        assert_eq!(check.node_type, NodeType::Branch);

        let outgoing: Vec<_> = layout.edges_from("check").collect();
        assert_eq!(outgoing.len(), 2);
        assert_eq!(outgoing[0].to, "big");
        assert_eq!(outgoing[0].label, Some(crate::model::EdgeLabel::True));
        assert_eq!(outgoing[1].label, Some(crate::model::EdgeLabel::False));
        for edge in outgoing {
            assert!(edge.is_curved());
            assert!(edge.label_anchor.is_some());
        }
    }

    #[test]
    fn converging_steps_keep_separate_edges() {
        let def = definition(
            "check",
            vec![
                ("check", branch("a", "b")),
                ("a", action(END)),
                ("b", action(END)),
            ],
        );
        let layout = layout_workflow(&def);
        let into_end = layout.edges.iter().filter(|e| e.to == END).count();
        assert_eq!(into_end, 2);
        assert_eq!(layout.nodes.iter().filter(|n| n.id == END).count(), 1);
    }

    #[test]
    fn branch_outcomes_to_one_step_get_distinct_anchors() {
        let def = definition(
            "check",
            vec![("check", branch("notify", "notify")), ("notify", action(END))],
        );
        let layout = layout_workflow(&def);
        let outgoing: Vec<_> = layout.edges_from("check").collect();
        assert_eq!(outgoing.len(), 2);
        assert_ne!(outgoing[0].points, outgoing[1].points);
        assert_ne!(outgoing[0].label_anchor, outgoing[1].label_anchor);
        let notify = layout.node("notify").unwrap();
        for edge in outgoing {
            let last = edge.points[edge.points.len() - 1];
            assert!(last.x > notify.left() && last.x < notify.right());
        }
    }

    #[test]
    fn nodes_in_a_layer_do_not_overlap() {
        let def = definition(
            "check",
            vec![
                ("check", branch("a_rather_long_step_name", "b")),
                ("a_rather_long_step_name", action(END)),
                ("b", action(END)),
            ],
        );
        let layout = layout_workflow(&def);
        let a = layout.node("a_rather_long_step_name").unwrap();
        let b = layout.node("b").unwrap();
        assert_eq!(a.y, b.y);
        assert!(a.right() <= b.left());
        assert!(a.width > b.width);
    }

    #[test]
    fn canvas_contains_everything_with_margin() {
        let def = definition("a", vec![("a", action("b")), ("b", action("a"))]);
        let layout = layout_workflow(&def);
        let margin = DEFAULT_LAYOUT_CONFIG.margin;
        for node in &layout.nodes {
            assert!(node.left() >= margin - 0.01);
            assert!(node.top() >= margin - 0.01);
            assert!(node.right() <= layout.width - margin + 0.01);
            assert!(node.bottom() <= layout.height - margin + 0.01);
        }
        for point in layout.edges.iter().flat_map(|e| e.points.iter()) {
            assert!(point.x <= layout.width - margin + 0.01);
            assert!(point.y <= layout.height - margin + 0.01);
        }
    }

    #[test]
    fn long_sublabels_are_truncated() {
        let mut step = action(END);
        if let StepDefinition::Action { action_id, .. } = &mut step {
            *action_id = "an_extremely_long_action_identifier".to_string();
        }
        let layout = layout_workflow(&definition("a", vec![("a", step)]));
        let sublabel = layout.node("a").unwrap().sublabel.clone().unwrap();
        assert_eq!(sublabel.chars().count(), 29);
        assert!(sublabel.ends_with("..."));
    }

    #[test]
    fn sublabel_adds_height() {
        let config = LayoutConfig::default();
        let mut def = definition(END, vec![]);
        def.trigger = TriggerConfig::default();
        let layout = layout_workflow_with_config(&def, &config);
        let trigger = layout.node(TRIGGER_ID).unwrap();
        assert!(trigger.sublabel.is_none());
        assert_eq!(trigger.height, config.node_height);

        let layout = layout_workflow_with_config(&definition(END, vec![]), &config);
        let trigger = layout.node(TRIGGER_ID).unwrap();
        assert_eq!(trigger.height, config.node_height + config.sublabel_height);
    }

    #[test]
    fn delay_and_wait_sublabels() {
        let def = definition(
            "pause",
            vec![
                (
                    "pause",
                    StepDefinition::Delay {
                        duration_seconds: 30,
                        next: "hold".to_string(),
                    },
                ),
                (
                    "hold",
                    StepDefinition::WaitForEvent {
                        event_name: "invoice.paid".to_string(),
                        timeout_seconds: Some(3600),
                        next: END.to_string(),
                    },
                ),
            ],
        );
        let layout = layout_workflow(&def);
        assert_eq!(layout.node("pause").unwrap().sublabel.as_deref(), Some("30s"));
        assert_eq!(
            layout.node("hold").unwrap().sublabel.as_deref(),
            Some("invoice.paid (timeout 3600s)")
        );
    }

    #[test]
    fn layout_is_deterministic() {
        let def = definition(
            "check",
            vec![
                ("check", branch("a", "check")),
                ("a", action("ghost")),
                ("orphan", action("a")),
            ],
        );
        assert_eq!(layout_workflow(&def), layout_workflow(&def));
    }
}
