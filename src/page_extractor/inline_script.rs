//! Fallback scan of inline script text for the embedded state assignment

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::extractors::has_populated_marker;

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:var\s+ytInitialData|window\s*\[\s*["']ytInitialData["']\s*\]|ytInitialData)\s*=\s*"#)
        .expect("static regex is valid")
});

/// Parse the first JSON object assigned to the state root in `script`
///
/// Only the leading JSON value after `=` is parsed, so trailing statements in
/// the same script are ignored.
pub fn parse_assignment(script: &str) -> Option<Value> {
    for found in ASSIGNMENT.find_iter(script) {
        let rest = &script[found.end()..];
        if !rest.trim_start().starts_with('{') {
            continue;
        }
        let mut stream = serde_json::Deserializer::from_str(rest.trim_start()).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) if value.is_object() => return Some(value),
            Some(Err(e)) => debug!("Inline state assignment did not parse: {}", e),
            _ => {}
        }
    }
    None
}

/// First populated state found across `scripts`
pub fn find_initial_data<S: AsRef<str>>(scripts: &[S]) -> Option<Value> {
    scripts
        .iter()
        .filter_map(|s| parse_assignment(s.as_ref()))
        .find(has_populated_marker)
}
