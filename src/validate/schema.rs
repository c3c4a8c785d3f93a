//! Schema validation: raw model output -> structurally valid ContentSpec.
//!
//! Generation capabilities wrap payloads in prose or markdown fences, so
//! extraction is tolerant: fences are stripped and the outermost JSON object
//! is located before any field-level check runs. Parsing never raises; an
//! unlocatable payload becomes a single `unparseable` violation.

use serde_json::Value;

use crate::domain::{ContentSpec, RuleId, Violation};

/// Result of structural validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// A structurally valid spec, ready for SEO rule checks.
    Parsed(ContentSpec),
    /// Structural violations; field checks collect all of them in one pass.
    Invalid(Vec<Violation>),
}

impl ParseOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }
}

/// Parse raw generated text into a ContentSpec or a violation set.
pub fn parse_content_spec(raw: &str) -> ParseOutcome {
    let payload = match extract_payload(raw) {
        Some(p) => p,
        None => return unparseable("no JSON object found in output"),
    };

    let value: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => return unparseable(format!("output is not valid JSON: {}", e)),
    };

    let obj = match value.as_object() {
        Some(o) => o,
        None => return unparseable("top-level JSON value is not an object"),
    };

    let mut violations = Vec::new();

    let title = get_string(obj, "title", &mut violations);
    let meta_description = get_string(obj, "meta_description", &mut violations);
    let heading = get_string(obj, "heading", &mut violations);
    let slug = get_string(obj, "slug", &mut violations);
    let body = get_string(obj, "body", &mut violations);
    let keywords = get_string_array(obj, "keywords", &mut violations);
    let jsonld = get_object(obj, "jsonld", &mut violations);
    let internal_links = get_string_array(obj, "internal_links", &mut violations);

    if !violations.is_empty() {
        return ParseOutcome::Invalid(violations);
    }

    // All extractors returned Some when no violations were recorded.
    ParseOutcome::Parsed(ContentSpec {
        title: title.unwrap(),
        meta_description: meta_description.unwrap(),
        heading: heading.unwrap(),
        slug: slug.unwrap(),
        body: body.unwrap(),
        keywords: keywords.unwrap(),
        jsonld: jsonld.unwrap(),
        internal_links: internal_links.unwrap(),
    })
}

/// Locate the structured payload inside possibly-noisy model output.
fn extract_payload(raw: &str) -> Option<&str> {
    let mut text = raw.trim();

    // Strip a leading markdown fence and its closing counterpart.
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest.strip_suffix("```").unwrap_or(rest).trim();
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_suffix("```").unwrap_or(rest).trim();
    }

    // Outermost object: first '{' through last '}'.
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn unparseable(message: impl Into<String>) -> ParseOutcome {
    ParseOutcome::Invalid(vec![Violation::new(RuleId::Unparseable, "raw", message)])
}

fn get_string(
    obj: &serde_json::Map<String, Value>,
    field: &str,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    match obj.get(field) {
        None => {
            violations.push(Violation::new(
                RuleId::MissingField,
                field,
                format!("missing field: {}", field),
            ));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            violations.push(Violation::new(
                RuleId::WrongType,
                field,
                format!("field {}: expected a string, got {}", field, type_name(other)),
            ));
            None
        }
    }
}

fn get_string_array(
    obj: &serde_json::Map<String, Value>,
    field: &str,
    violations: &mut Vec<Violation>,
) -> Option<Vec<String>> {
    match obj.get(field) {
        None => {
            violations.push(Violation::new(
                RuleId::MissingField,
                field,
                format!("missing field: {}", field),
            ));
            None
        }
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => out.push(s.clone()),
                    other => {
                        violations.push(Violation::new(
                            RuleId::WrongType,
                            field,
                            format!(
                                "field {}: expected an array of strings, found a {} element",
                                field,
                                type_name(other)
                            ),
                        ));
                        return None;
                    }
                }
            }
            Some(out)
        }
        Some(other) => {
            violations.push(Violation::new(
                RuleId::WrongType,
                field,
                format!(
                    "field {}: expected an array of strings, got {}",
                    field,
                    type_name(other)
                ),
            ));
            None
        }
    }
}

fn get_object(
    obj: &serde_json::Map<String, Value>,
    field: &str,
    violations: &mut Vec<Violation>,
) -> Option<serde_json::Map<String, Value>> {
    match obj.get(field) {
        None => {
            violations.push(Violation::new(
                RuleId::MissingField,
                field,
                format!("missing field: {}", field),
            ));
            None
        }
        Some(Value::Object(map)) => Some(map.clone()),
        Some(other) => {
            violations.push(Violation::new(
                RuleId::WrongType,
                field,
                format!("field {}: expected an object, got {}", field, type_name(other)),
            ));
            None
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
