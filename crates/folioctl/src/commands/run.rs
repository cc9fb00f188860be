use anyhow::{Context, Result};
use folio_core::ValidatedValue;
use folio_llm::ModelConfig;
use serde_json::{json, Value};
use tracing::info;

use super::{check_form, find_definition};

/// Run a flow once against the hosted model and print its output
///
/// The flow name and form rules are checked before the model client is
/// built, so bad input is reported even without an API key.
pub async fn execute(name: &str, input: &Value, output: &str, config: ModelConfig) -> Result<()> {
    check_form(&find_definition(name)?, input)?;

    let model = folio_llm::create_model(config).context("Failed to create model client")?;
    let registry = folio_flows::bootstrap(model)?;

    info!("Running flow {}", name);
    let result = folio_flows::submit(&registry, name, input)
        .await
        .with_context(|| format!("Flow '{}' failed", name))?;

    print_result(name, &result, output)
}

fn print_result(name: &str, result: &ValidatedValue, output: &str) -> Result<()> {
    match output {
        "json" => {
            let json_output = json!({
                "success": true,
                "flow": name,
                "output": result,
            });
            println!("{}", serde_json::to_string_pretty(&json_output)?);
        }
        "yaml" => {
            let yaml_output = serde_yaml::to_string(&json!({
                "success": true,
                "flow": name,
                "output": result,
            }))?;
            println!("{}", yaml_output);
        }
        _ => {
            println!("{}", text_output(result));
        }
    }
    Ok(())
}

/// A single-field output prints bare; otherwise one `key:` block per field
fn text_output(result: &ValidatedValue) -> String {
    let fields = result.as_map();
    if fields.len() == 1 {
        if let Some(Value::String(text)) = fields.values().next() {
            return text.clone();
        }
    }

    fields
        .iter()
        .map(|(key, value)| match value {
            Value::String(text) => format!("{}:\n{}", key, text),
            other => format!("{}: {}", key, other),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Field, Shape};

    #[test]
    fn test_text_output_single_field() {
        let shape = Shape::new("Out").field(Field::string("explanation"));
        let result = shape.validate(&json!({"explanation": "Rust is fast."})).unwrap();
        assert_eq!(text_output(&result), "Rust is fast.");
    }

    #[test]
    fn test_text_output_many_fields() {
        let shape = Shape::new("Out")
            .field(Field::string("summary"))
            .field(Field::boolean("safe"));
        let result = shape.validate(&json!({"summary": "ok", "safe": true})).unwrap();
        assert_eq!(text_output(&result), "safe: true\n\nsummary:\nok");
    }

    #[tokio::test]
    async fn test_run_fails_before_any_call_on_bad_config() {
        let mut config = ModelConfig::default();
        config.headers.insert("bad header".into(), "x".into());
        let input = json!({"codeSnippet": "fn main() { println!(\"hi\"); }"});
        let err = execute("explainCode", &input, "text", config).await.unwrap_err();
        assert!(err.to_string().contains("Failed to create model client"));
    }

    #[tokio::test]
    async fn test_run_reports_invalid_input_before_client() {
        let mut config = ModelConfig::default();
        config.headers.insert("bad header".into(), "x".into());
        let err = execute("explainCode", &json!({"codeSnippet": "short"}), "text", config)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("codeSnippet"), "{}", message);
        assert!(!message.contains("Failed to create model client"));
    }

    #[tokio::test]
    async fn test_run_unknown_flow() {
        let err = execute("summarize", &json!({}), "text", ModelConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Flow 'summarize' not found"));
    }
}
