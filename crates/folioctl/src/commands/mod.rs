pub mod completion;
pub mod describe;
pub mod get;
pub mod render;
pub mod run;

use std::path::Path;

use anyhow::{bail, Context, Result};
use folio_core::{FlowDefinition, FlowError};
use folio_flows::forms;
use serde_json::Value;

/// Resource types understood by `get` and `describe`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Flow,
}

impl ResourceType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "flow" | "flows" => Some(ResourceType::Flow),
            _ => None,
        }
    }
}

pub fn resource_type(s: &str) -> Result<ResourceType> {
    ResourceType::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown resource type: {}", s))
}

/// Flow declarations, without a model client behind them
pub fn definitions() -> Result<Vec<FlowDefinition>> {
    folio_flows::definitions().context("Failed to load flow definitions")
}

pub fn find_definition(name: &str) -> Result<FlowDefinition> {
    let definitions = definitions()?;
    let available: Vec<String> = definitions.iter().map(|d| d.name.clone()).collect();
    match definitions.into_iter().find(|d| d.name == name) {
        Some(def) => Ok(def),
        None => bail!(
            "Flow '{}' not found. Available flows: {}",
            name,
            available.join(", ")
        ),
    }
}

/// Apply the flow's form rules, or its bare input shape when it has no form
pub fn check_form(def: &FlowDefinition, input: &Value) -> Result<()> {
    match forms::form_shape(&def.name) {
        Some(form) => form.validate(input),
        None => def.input.validate(input),
    }
    .map_err(FlowError::InvalidInput)?;
    Ok(())
}

/// Read the input record from `--input` or `--input-file`
pub fn load_input(inline: Option<&str>, file: Option<&str>) -> Result<Value> {
    match (inline, file) {
        (Some(json), _) => serde_json::from_str(json).context("Failed to parse --input as JSON"),
        (None, Some(path)) => {
            let file_path = Path::new(path);
            let content = std::fs::read_to_string(file_path)
                .with_context(|| format!("Failed to read input file {:?}", file_path))?;
            let is_yaml = file_path
                .extension()
                .map_or(false, |e| e == "yaml" || e == "yml");
            if is_yaml {
                serde_yaml::from_str(&content)
                    .with_context(|| format!("Failed to parse input file {:?}", file_path))
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse input file {:?}", file_path))
            }
        }
        (None, None) => bail!("Provide --input or --input-file"),
    }
}
