//! Form-boundary checks
//!
//! The site's forms ask for more than the flows require (a project name of
//! at least three characters, a code snippet of at least ten). Callers that
//! sit at that boundary go through [`submit`], which applies the stricter
//! form shape before the flow ever runs.

use folio_core::{FlowError, FlowRegistry, FlowResult, Shape, ValidatedValue};
use serde_json::Value;
use tracing::debug;

use crate::{code, documentation, speech, tech_stack};

/// Form shape for a flow, if the flow has one
pub fn form_shape(name: &str) -> Option<Shape> {
    match name {
        documentation::NAME => Some(documentation::form_shape()),
        tech_stack::NAME => Some(tech_stack::form_shape()),
        code::NAME => Some(code::form_shape()),
        speech::NAME => Some(speech::form_shape()),
        _ => None,
    }
}

/// Check form rules, then run the flow
pub async fn submit(registry: &FlowRegistry, name: &str, raw_input: &Value) -> FlowResult<ValidatedValue> {
    let flow = registry.lookup(name)?;
    if let Some(shape) = form_shape(name) {
        shape.validate(raw_input).map_err(|e| {
            debug!("Form for {} rejected: {}", name, e);
            FlowError::InvalidInput(e)
        })?;
    }
    flow.run(raw_input).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_flow_has_a_form() {
        for def in crate::definitions().unwrap() {
            let form = form_shape(&def.name).unwrap();
            assert_eq!(form.without_constraints(), def.input);
        }
    }

    #[test]
    fn test_unknown_flow_has_no_form() {
        assert!(form_shape("summarize").is_none());
    }
}
