use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Geometry used by the layout engine. All lengths are in canvas units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub font_size: f32,
    pub sublabel_font_size: f32,
    pub node_padding_x: f32,
    pub min_node_width: f32,
    pub node_height: f32,
    pub branch_height: f32,
    pub end_height: f32,
    /// Added to a node's height when it carries a sublabel line.
    pub sublabel_height: f32,
    pub max_sublabel_chars: usize,
    pub row_height: f32,
    pub row_gap: f32,
    pub node_gap: f32,
    pub margin: f32,
    /// Largest horizontal offset still drawn as a straight segment.
    pub straight_tolerance: f32,
    /// Horizontal divergence beyond which branch edges are curved.
    pub curve_threshold: f32,
    /// Distance back edges keep from the right side of the nodes they pass.
    pub back_edge_offset: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            sublabel_font_size: 9.0,
            node_padding_x: 16.0,
            min_node_width: 120.0,
            node_height: 36.0,
            branch_height: 44.0,
            end_height: 28.0,
            sublabel_height: 14.0,
            max_sublabel_chars: 28,
            row_height: 60.0,
            row_gap: 40.0,
            node_gap: 32.0,
            margin: 20.0,
            straight_tolerance: 4.0,
            curve_threshold: 24.0,
            back_edge_offset: 24.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub pretty: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    layout: Option<LayoutConfig>,
    output: Option<OutputConfig>,
}

/// Reads a JSON or JSON5 config file. Missing sections and fields keep their defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = json5::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    if let Some(layout) = parsed.layout {
        config.layout = layout;
    }
    if let Some(output) = parsed.output {
        config.output = output;
    }
    Ok(config)
}
