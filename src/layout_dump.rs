use crate::layout::{LayoutResult, NodeType};
use crate::model::WorkflowDefinition;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub start_at: String,
    pub width: f32,
    pub height: f32,
    pub layers: Vec<LayerDump>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct LayerDump {
    pub index: usize,
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: NodeType,
    pub layer: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
    pub sublabel: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub curved: bool,
    pub points: Vec<[f32; 2]>,
    pub label_anchor: Option<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &LayoutResult, definition: &WorkflowDefinition) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                kind: node.node_type,
                layer: node.layer,
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                label: node.label.clone(),
                sublabel: node.sublabel.clone(),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                label: edge.label.map(|label| label.as_str().to_string()),
                curved: edge.is_curved(),
                points: edge.points.iter().map(|p| [p.x, p.y]).collect(),
                label_anchor: edge.label_anchor.map(|p| [p.x, p.y]),
            })
            .collect();

        let mut layers: Vec<LayerDump> = Vec::new();
        for node in &layout.nodes {
            while layers.len() <= node.layer {
                layers.push(LayerDump {
                    index: layers.len(),
                    nodes: Vec::new(),
                });
            }
            layers[node.layer].nodes.push(node.id.clone());
        }

        LayoutDump {
            start_at: definition.start_at.clone(),
            width: layout.width,
            height: layout.height,
            layers,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(
    path: &Path,
    layout: &LayoutResult,
    definition: &WorkflowDefinition,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, definition);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
