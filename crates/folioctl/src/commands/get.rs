use anyhow::Result;
use folio_core::{FlowDefinition, PromptSource, ResponseMode};
use serde_json::{json, Value};

use super::{definitions, resource_type, ResourceType};

/// List flows (kubectl-style: get flows [name])
pub fn execute(resource: &str, name: Option<&str>, output: &str) -> Result<()> {
    let ResourceType::Flow = resource_type(resource)?;

    let flows: Vec<FlowDefinition> = definitions()?
        .into_iter()
        .filter(|d| name.map_or(true, |n| d.name == n))
        .collect();
    if let Some(name) = name {
        if flows.is_empty() {
            anyhow::bail!("Flow '{}' not found", name);
        }
    }

    match output {
        "json" => {
            let items: Vec<Value> = flows.iter().map(summary).collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "items": items }))?);
        }
        "yaml" => {
            let items: Vec<Value> = flows.iter().map(summary).collect();
            println!("{}", serde_yaml::to_string(&json!({ "items": items }))?);
        }
        "name" => {
            for def in &flows {
                println!("flow/{}", def.name);
            }
        }
        _ => {
            println!(
                "{:<32} {:<12} {:<12} {}",
                "NAME", "PROMPT", "MODE", "MODEL"
            );
            for def in &flows {
                println!(
                    "{:<32} {:<12} {:<12} {}",
                    def.name,
                    prompt_kind(&def.prompt),
                    mode_kind(&def.mode),
                    def.model
                );
            }
        }
    }

    Ok(())
}

pub(crate) fn prompt_kind(prompt: &PromptSource) -> &'static str {
    match prompt {
        PromptSource::Template(_) => "template",
        PromptSource::Direct => "direct",
    }
}

pub(crate) fn mode_kind(mode: &ResponseMode) -> &'static str {
    match mode {
        ResponseMode::Structured => "structured",
        ResponseMode::MediaDataUri { .. } => "media",
    }
}

fn summary(def: &FlowDefinition) -> Value {
    json!({
        "name": def.name,
        "description": def.description,
        "model": def.model,
        "prompt": prompt_kind(&def.prompt),
        "mode": mode_kind(&def.mode),
    })
}
