use crate::core::defs::{LayoutParams, LayoutQuality};
use crate::model::{DEFAULT_ASPECT_RATIO, DEFAULT_COMPONENT_SEPARATION, LayoutGraph};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layout defaults loaded from a JSON file. Missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub quality: i32,
    pub linear: bool,
    pub aspect_ratio: f64,
    pub component_separation: f64,
    pub seed: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            quality: LayoutQuality::Medium.value(),
            linear: false,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            component_separation: DEFAULT_COMPONENT_SEPARATION,
            seed: None,
        }
    }
}

impl LayoutConfig {
    pub fn to_params(&self) -> LayoutParams {
        LayoutParams {
            quality_level: self.quality,
            preserve_initial_positions: self.linear,
            aspect_ratio: self.aspect_ratio,
            component_separation: self.component_separation,
            seed: self.seed,
        }
    }
}

fn read_json_from_file<T: DeserializeOwned>(
    file_path: &Path,
) -> Result<T, Box<dyn std::error::Error>> {
    match std::fs::read_to_string(file_path) {
        Ok(json_data) => Ok(serde_json::from_str(&json_data)?),
        Err(err) => Err(Box::new(err)),
    }
}

pub fn load_layout_config(file_path: &Path) -> Result<LayoutConfig, String> {
    match read_json_from_file(file_path) {
        Ok(config) => Ok(config),
        Err(err) => Err(format!("Error reading from config file: {}", err)),
    }
}

pub fn load_graph(file_path: &Path) -> Result<LayoutGraph, String> {
    match read_json_from_file(file_path) {
        Ok(graph) => Ok(graph),
        Err(err) => Err(format!("Error reading graph file: {}", err)),
    }
}
