use serde::Deserialize;
use stepflow::config::LayoutConfig;
use stepflow::draft::{definition_to_draft, draft_to_definition, submit};
use stepflow::edit::{apply_edits, next_options};
use stepflow::layout::layout_workflow_with_config;
use stepflow::parser::{parse_definition, parse_draft, parse_edits};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOptions {
    node_gap: Option<f32>,
    row_gap: Option<f32>,
    margin: Option<f32>,
    font_size: Option<f32>,
}

fn build_layout_config(options: LayoutOptions) -> LayoutConfig {
    let mut config = LayoutConfig::default();
    if let Some(node_gap) = options.node_gap {
        config.node_gap = node_gap;
    }
    if let Some(row_gap) = options.row_gap {
        config.row_gap = row_gap;
    }
    if let Some(margin) = options.margin {
        config.margin = margin;
    }
    if let Some(font_size) = options.font_size {
        config.font_size = font_size;
    }
    config
}

fn js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_error)
}

fn layout_json(definition_json: &str, options_json: Option<String>) -> Result<String, String> {
    let options = match options_json {
        Some(raw) => serde_json::from_str::<LayoutOptions>(&raw).map_err(|e| e.to_string())?,
        None => LayoutOptions::default(),
    };
    let definition = parse_definition(definition_json).map_err(|e| e.to_string())?;
    let layout = layout_workflow_with_config(&definition, &build_layout_config(options));
    serde_json::to_string(&layout).map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn layout_workflow(
    definition_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    layout_json(definition_json, options_json).map_err(|error| JsValue::from_str(&error))
}

#[wasm_bindgen]
pub fn definition_to_draft_json(name: &str, definition_json: &str) -> Result<String, JsValue> {
    let definition = parse_definition(definition_json).map_err(js_error)?;
    to_json(&definition_to_draft(name, &definition))
}

/// With `strict`, the draft must pass the save-time checks first.
#[wasm_bindgen]
pub fn draft_to_definition_json(draft_json: &str, strict: bool) -> Result<String, JsValue> {
    let draft = parse_draft(draft_json).map_err(js_error)?;
    let definition = if strict {
        submit(&draft).map_err(js_error)?
    } else {
        draft_to_definition(&draft)
    };
    to_json(&definition)
}

#[wasm_bindgen]
pub fn apply_edits_json(draft_json: &str, edits_json: &str) -> Result<String, JsValue> {
    let draft = parse_draft(draft_json).map_err(js_error)?;
    let edits = parse_edits(edits_json).map_err(js_error)?;
    let steps = apply_edits(&draft.steps, &edits);
    to_json(&draft.with_steps(steps))
}

#[wasm_bindgen]
pub fn next_options_json(draft_json: &str, index: usize) -> Result<String, JsValue> {
    let draft = parse_draft(draft_json).map_err(js_error)?;
    to_json(&next_options(&draft.steps, index))
}
