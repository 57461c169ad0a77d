//! Endpoint template rendering
//!
//! Endpoint templates use `{{ name }}` placeholders, e.g.
//! `linode/instances/{{ id }}/disks`. Substituted values are path-escaped
//! so user input can never introduce extra path segments.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ name }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}").expect("endpoint template regex")
});

/// Render a template, escaping every substituted value
pub fn render(template: &str, vars: &HashMap<&str, String>) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match vars.get(name) {
            Some(value) => escape_path_segment(value),
            None => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all variable names from a template, in order of appearance
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Percent-encode a single path segment
pub fn escape_path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
