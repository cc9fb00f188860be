use anyhow::Result;
use serde_json::Value;

use super::{check_form, find_definition};

/// Print the prompt a flow would send for `input`; the model is never called
pub fn execute(name: &str, input: &Value) -> Result<()> {
    println!("{}", render(name, input)?);
    Ok(())
}

fn render(name: &str, input: &Value) -> Result<String> {
    let def = find_definition(name)?;
    check_form(&def, input)?;
    Ok(def.render_prompt(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_tech_stack() {
        let prompt = render(
            "explainTechStack",
            &json!({"technologyName": "Tokio", "projectContext": "a web service"}),
        )
        .unwrap();
        assert!(prompt.contains("Technology to explain: Tokio"));
        assert!(prompt.contains("Project Context: a web service"));
    }

    #[test]
    fn test_render_direct_flow() {
        let prompt = render("textToSpeech", &json!({"text": "Hello"})).unwrap();
        assert_eq!(prompt, "Hello");
    }

    #[test]
    fn test_render_applies_form_rules() {
        let err = render("explainCode", &json!({"codeSnippet": "short"})).unwrap_err();
        assert!(err.to_string().contains("codeSnippet"));
    }
}
