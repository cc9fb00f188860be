//! Prompt templates
//!
//! Templates are parsed once into a small node tree and rendered against a
//! validated input record. Supported tags:
//!
//! - `{{{field}}}` inserts the field verbatim (no escaping)
//! - `{{#if field}} ... {{else}} ... {{/if}}` picks a branch on whether the
//!   field is present and non-empty; `{{else}}` is optional and sections nest
//!
//! Any other `{{` text is kept as literal prompt text.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::TemplateError;

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(concat!(
            r"\{\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}\}",
            r"|\{\{\s*#if\s+([A-Za-z_][A-Za-z0-9_]*)\s*\}\}",
            r"|(\{\{\s*else\s*\}\})",
            r"|(\{\{\s*/if\s*\}\})",
        ))
        .expect("tag pattern is a valid regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Placeholder(String),
    Conditional {
        field: String,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// A parsed prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

struct OpenSection {
    field: String,
    offset: usize,
    then: Vec<Node>,
    otherwise: Option<Vec<Node>>,
}

impl OpenSection {
    fn current(&mut self) -> &mut Vec<Node> {
        match &mut self.otherwise {
            Some(otherwise) => otherwise,
            None => &mut self.then,
        }
    }
}

impl Template {
    /// Parse a template source string
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        let mut root: Vec<Node> = Vec::new();
        let mut stack: Vec<OpenSection> = Vec::new();
        let mut cursor = 0;

        for caps in tag_pattern().captures_iter(&source) {
            let whole = caps.get(0).expect("group 0 is always present");
            if whole.start() > cursor {
                let text = source[cursor..whole.start()].to_string();
                current(&mut root, &mut stack).push(Node::Text(text));
            }
            cursor = whole.end();

            if let Some(name) = caps.get(1) {
                current(&mut root, &mut stack).push(Node::Placeholder(name.as_str().to_string()));
            } else if let Some(name) = caps.get(2) {
                stack.push(OpenSection {
                    field: name.as_str().to_string(),
                    offset: whole.start(),
                    then: Vec::new(),
                    otherwise: None,
                });
            } else if caps.get(3).is_some() {
                let section = stack.last_mut().ok_or_else(|| TemplateError::Syntax {
                    offset: whole.start(),
                    message: "{{else}} outside of an {{#if}} section".to_string(),
                })?;
                if section.otherwise.is_some() {
                    return Err(TemplateError::Syntax {
                        offset: whole.start(),
                        message: format!("second {{{{else}}}} in section '{}'", section.field),
                    });
                }
                section.otherwise = Some(Vec::new());
            } else {
                let section = stack.pop().ok_or_else(|| TemplateError::Syntax {
                    offset: whole.start(),
                    message: "{{/if}} without a matching {{#if}}".to_string(),
                })?;
                let node = Node::Conditional {
                    field: section.field,
                    then: section.then,
                    otherwise: section.otherwise.unwrap_or_default(),
                };
                current(&mut root, &mut stack).push(node);
            }
        }

        if let Some(section) = stack.pop() {
            return Err(TemplateError::Syntax {
                offset: section.offset,
                message: format!("unclosed {{{{#if {}}}}}", section.field),
            });
        }

        if cursor < source.len() {
            root.push(Node::Text(source[cursor..].to_string()));
        }

        Ok(Self { source, nodes: root })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Every field name used by a placeholder or a section condition
    pub fn referenced_fields(&self) -> BTreeSet<&str> {
        let mut fields = BTreeSet::new();
        collect_fields(&self.nodes, &mut fields);
        fields
    }

    /// Render against an input record
    pub fn render(&self, input: &Map<String, Value>) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        render_nodes(&self.nodes, input, &mut out)?;
        Ok(out)
    }
}

fn current<'a>(root: &'a mut Vec<Node>, stack: &'a mut [OpenSection]) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(section) => section.current(),
        None => root,
    }
}

fn collect_fields<'a>(nodes: &'a [Node], fields: &mut BTreeSet<&'a str>) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Placeholder(name) => {
                fields.insert(name);
            }
            Node::Conditional { field, then, otherwise } => {
                fields.insert(field);
                collect_fields(then, fields);
                collect_fields(otherwise, fields);
            }
        }
    }
}

fn render_nodes(
    nodes: &[Node],
    input: &Map<String, Value>,
    out: &mut String,
) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Placeholder(name) => match input.get(name) {
                Some(Value::String(s)) => out.push_str(s),
                Some(Value::Null) | None => {
                    return Err(TemplateError::UnresolvedPlaceholder(name.clone()))
                }
                Some(other) => out.push_str(&other.to_string()),
            },
            Node::Conditional { field, then, otherwise } => {
                let branch = if is_truthy(input.get(field)) { then } else { otherwise };
                render_nodes(branch, input, out)?;
            }
        }
    }
    Ok(())
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn test_placeholder_verbatim() {
        let t = Template::parse("Code:\n{{{codeSnippet}}}\nEnd").unwrap();
        let out = t.render(&record(json!({"codeSnippet": "<b>&x</b>"}))).unwrap();
        assert_eq!(out, "Code:\n<b>&x</b>\nEnd");
    }

    #[test]
    fn test_conditional_branches() {
        let t = Template::parse("{{#if ctx}}A{{else}}B{{/if}}").unwrap();
        assert_eq!(t.render(&record(json!({"ctx": "present"}))).unwrap(), "A");
        assert_eq!(t.render(&Map::new()).unwrap(), "B");
        assert_eq!(t.render(&record(json!({"ctx": ""}))).unwrap(), "B");
    }

    #[test]
    fn test_conditional_without_else() {
        let t = Template::parse("x{{#if flag}}-on{{/if}}y").unwrap();
        assert_eq!(t.render(&record(json!({"flag": true}))).unwrap(), "x-ony");
        assert_eq!(t.render(&record(json!({"flag": false}))).unwrap(), "xy");
    }

    #[test]
    fn test_nested_sections() {
        let t = Template::parse("{{#if a}}[{{#if b}}{{{b}}}{{else}}no-b{{/if}}]{{/if}}").unwrap();
        assert_eq!(t.render(&record(json!({"a": "1", "b": "B"}))).unwrap(), "[B]");
        assert_eq!(t.render(&record(json!({"a": "1"}))).unwrap(), "[no-b]");
        assert_eq!(t.render(&Map::new()).unwrap(), "");
    }

    #[test]
    fn test_render_is_deterministic() {
        let t = Template::parse("Tech: {{{name}}}{{#if ctx}} in {{{ctx}}}{{else}}.{{/if}}").unwrap();
        let input = record(json!({"name": "Rust", "ctx": "a CLI"}));
        let first = t.render(&input).unwrap();
        let second = t.render(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "Tech: Rust in a CLI");
    }

    #[test]
    fn test_unresolved_placeholder() {
        let t = Template::parse("Hello {{{name}}}").unwrap();
        assert_eq!(
            t.render(&Map::new()).unwrap_err(),
            TemplateError::UnresolvedPlaceholder("name".into())
        );
    }

    #[test]
    fn test_placeholder_inside_untaken_branch_is_not_resolved() {
        let t = Template::parse("{{#if ctx}}{{{ctx}}}{{/if}}ok").unwrap();
        assert_eq!(t.render(&Map::new()).unwrap(), "ok");
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            Template::parse("{{#if a}}open"),
            Err(TemplateError::Syntax { offset: 0, .. })
        ));
        assert!(matches!(
            Template::parse("stray {{/if}}"),
            Err(TemplateError::Syntax { .. })
        ));
        assert!(matches!(
            Template::parse("{{else}}"),
            Err(TemplateError::Syntax { .. })
        ));
        assert!(matches!(
            Template::parse("{{#if a}}1{{else}}2{{else}}3{{/if}}"),
            Err(TemplateError::Syntax { .. })
        ));
    }

    #[test]
    fn test_double_braces_are_literal() {
        let t = Template::parse("json: {{ not a tag }}").unwrap();
        assert_eq!(t.render(&Map::new()).unwrap(), "json: {{ not a tag }}");
    }

    #[test]
    fn test_referenced_fields() {
        let t = Template::parse("{{{a}}}{{#if b}}{{{c}}}{{else}}{{{d}}}{{/if}}{{{a}}}").unwrap();
        let fields: Vec<&str> = t.referenced_fields().into_iter().collect();
        assert_eq!(fields, vec!["a", "b", "c", "d"]);
    }
}
