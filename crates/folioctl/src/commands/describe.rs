//! Describe a flow in detail (kubectl describe style)

use anyhow::Result;
use folio_core::{FieldType, FlowDefinition, ResponseMode, Shape};
use folio_flows::forms;
use serde_json::{json, Value};

use super::get::{mode_kind, prompt_kind};
use super::{find_definition, resource_type, ResourceType};

pub fn execute(resource: &str, name: &str, output: &str) -> Result<()> {
    let ResourceType::Flow = resource_type(resource)?;
    let def = find_definition(name)?;
    let form = forms::form_shape(&def.name);

    match output {
        "json" => println!("{}", serde_json::to_string_pretty(&detail(&def, form.as_ref()))?),
        "yaml" => println!("{}", serde_yaml::to_string(&detail(&def, form.as_ref()))?),
        _ => print_text(&def, form.as_ref()),
    }
    Ok(())
}

fn detail(def: &FlowDefinition, form: Option<&Shape>) -> Value {
    json!({
        "name": def.name,
        "description": def.description,
        "model": def.model,
        "mode": def.mode,
        "config": def.config,
        "prompt": {
            "kind": prompt_kind(&def.prompt),
            "template": def.template().map(|t| t.source()),
        },
        "input": def.input.to_json_schema(),
        "form": form.map(Shape::to_json_schema),
        "output": def.output.to_json_schema(),
    })
}

fn print_text(def: &FlowDefinition, form: Option<&Shape>) {
    println!("Name:         {}", def.name);
    if let Some(desc) = &def.description {
        println!("Description:  {}", desc);
    }
    println!("Model:        {}", def.model);
    match &def.mode {
        ResponseMode::Structured => println!("Mode:         structured"),
        ResponseMode::MediaDataUri { field } => {
            println!("Mode:         {} (data URI in '{}')", mode_kind(&def.mode), field)
        }
    }
    println!("Prompt:       {}", prompt_kind(&def.prompt));

    println!("\nInput:");
    print_fields(form.unwrap_or(&def.input));

    println!("\nOutput:");
    print_fields(&def.output);

    if !def.config.is_empty() {
        println!("\nGeneration Config:");
        for (key, value) in &def.config {
            println!("  {}: {}", key, value);
        }
    }

    if let Some(template) = def.template() {
        println!("\nTemplate:");
        for line in template.source().lines() {
            println!("  {}", line);
        }
    }
}

fn print_fields(shape: &Shape) {
    for field in &shape.fields {
        let mut rules = Vec::new();
        if !field.required {
            rules.push("optional".to_string());
        }
        if let Some(min) = field.min_length {
            rules.push(format!("min {} chars", min));
        }
        if let FieldType::Enum(values) = &field.field_type {
            rules.push(format!("one of [{}]", values.join(", ")));
        }

        let rules = if rules.is_empty() {
            String::new()
        } else {
            format!(" ({})", rules.join(", "))
        };
        println!("  {:<20} {}{}", field.name, field.field_type.label(), rules);
        if let Some(desc) = &field.description {
            println!("  {:<20} {}", "", desc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_includes_form_constraints() {
        let def = find_definition("explainCode").unwrap();
        let form = forms::form_shape(&def.name);
        let detail = detail(&def, form.as_ref());

        assert_eq!(detail["model"], "googleai/gemini-1.5-flash-latest");
        assert_eq!(detail["prompt"]["kind"], "template");
        assert_eq!(detail["form"]["properties"]["codeSnippet"]["minLength"], 10);
        assert!(detail["input"]["properties"]["codeSnippet"].get("minLength").is_none());
    }

    #[test]
    fn test_detail_media_mode() {
        let def = find_definition("textToSpeech").unwrap();
        let detail = detail(&def, None);
        assert_eq!(detail["mode"]["mode"], "mediaDataUri");
        assert_eq!(detail["mode"]["field"], "audioDataUri");
        assert!(detail["prompt"]["template"].is_null());
    }
}
