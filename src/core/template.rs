//! `{{key}}` substitution against configuration variables.
//!
//! Keys may be dotted (`{{api.host}}`) to reach into nested tables. Strings
//! are inserted verbatim, numbers and booleans in their display form.
//! Placeholders that don't resolve to a scalar are left as written.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, Copy)]
pub struct ConfigParser<'a> {
    variables: &'a Map<String, Value>,
}

impl<'a> ConfigParser<'a> {
    pub fn new(variables: &'a Map<String, Value>) -> Self {
        Self { variables }
    }

    /// Expands every placeholder in `input`.
    pub fn execute(&self, input: &str) -> String {
        if !input.contains("{{") {
            return input.to_string();
        }

        PLACEHOLDER
            .replace_all(input, |caps: &Captures<'_>| {
                self.lookup(caps[1].trim())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let mut segments = key.split('.');
        let mut value = self.variables.get(segments.next()?)?;
        for segment in segments {
            value = value.get(segment)?;
        }

        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
