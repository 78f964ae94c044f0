//! Expression resolution for node configuration.
//!
//! Every string value found anywhere in a node's config (including inside
//! nested mappings and arrays) is rendered with a lightweight mustache-style
//! syntax (`{{path.to.value}}`) against a view built from the accumulated
//! run context. Rendering is best-effort: a malformed template or a missing
//! path keeps the original string and emits a warning instead of failing
//! the node.
//!
//! The view exposes prior node outputs under two names, `$node.<id>` and
//! `state.<id>`, both backed by the same results map. `input` is the value
//! feeding the current node and `previous` is an alias for it.

pub mod eval;

use indexmap::IndexMap;
use serde_json::Value;

/// Read-only view over the run state a template may address.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    /// Value feeding the current node (trigger payload or predecessor output)
    pub input: &'a Value,
    /// Completed node outputs keyed by node id
    pub results: &'a IndexMap<String, Value>,
}

impl<'a> View<'a> {
    pub fn new(input: &'a Value, results: &'a IndexMap<String, Value>) -> Self {
        Self { input, results }
    }

    /// Look up a dot-separated path against the view.
    ///
    /// The first segment selects the namespace: `$node` or `state` address
    /// node outputs by id, `input` and `previous` address the current input.
    /// Remaining segments descend into objects by key and arrays by index.
    fn lookup(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let head = segments.next()?;

        let mut current: &Value = match head {
            "input" | "previous" => self.input,
            "$node" | "state" => {
                let node_id = segments.next()?;
                self.results.get(node_id)?
            }
            _ => return None,
        };

        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(current.clone())
    }
}

/// Recursively render every string leaf in a config value.
///
/// Non-string leaves pass through untouched; arrays and objects are resolved
/// element-wise. Warnings collected here are appended to the run log by the
/// dispatcher.
pub fn render_config(config: &Value, view: &View<'_>, warnings: &mut Vec<String>) -> Value {
    match config {
        Value::String(s) => Value::String(render_str(s, view, warnings)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| render_config(item, view, warnings))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), render_config(value, view, warnings)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Render a single string. A no-op for strings without `{{`.
///
/// If any placeholder fails to resolve, or the template is malformed, the
/// original string is returned unchanged and a warning is recorded.
pub fn render_str(template: &str, view: &View<'_>, warnings: &mut Vec<String>) -> String {
    if !template.contains("{{") {
        return template.to_string();
    }

    match try_render(template, view) {
        Ok(rendered) => rendered,
        Err(reason) => {
            warnings.push(format!("failed to resolve \"{template}\": {reason}"));
            template.to_string()
        }
    }
}

fn try_render(template: &str, view: &View<'_>) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let close = after_open
            .find("}}")
            .ok_or_else(|| "unclosed template".to_string())?;
        let path = after_open[..close].trim();
        if path.is_empty() {
            return Err("empty template expression".to_string());
        }
        let value = view
            .lookup(path)
            .ok_or_else(|| format!("path not found: {path}"))?;
        out.push_str(&stringify(&value));
        rest = &after_open[close + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Substitute a resolved value into a string. Strings are inserted raw
/// (never quoted or escaped); everything else is compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results_with(entries: &[(&str, Value)]) -> IndexMap<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn render_is_identity_without_templates() {
        let results = IndexMap::new();
        let input = Value::Null;
        let view = View::new(&input, &results);
        let mut warnings = Vec::new();

        let s = "plain string, no placeholders";
        assert_eq!(render_str(s, &view, &mut warnings), s);
        assert!(warnings.is_empty());
    }

    #[test]
    fn renders_state_path() {
        // results.n1 = 42 and a message addressing state.n1
        let results = results_with(&[("n1", json!(42))]);
        let input = Value::Null;
        let view = View::new(&input, &results);
        let mut warnings = Vec::new();

        assert_eq!(
            render_str("Value: {{state.n1}}", &view, &mut warnings),
            "Value: 42"
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn node_and_state_namespaces_are_the_same_map() {
        // Both addressing conventions resolve against one results map; this
        // unification is a deliberate contract, not an accident.
        let results = results_with(&[("fetch", json!({ "status": 200 }))]);
        let input = Value::Null;
        let view = View::new(&input, &results);
        let mut warnings = Vec::new();

        let via_node = render_str("{{$node.fetch.status}}", &view, &mut warnings);
        let via_state = render_str("{{state.fetch.status}}", &view, &mut warnings);
        assert_eq!(via_node, "200");
        assert_eq!(via_node, via_state);
    }

    #[test]
    fn input_and_previous_are_aliases() {
        let results = IndexMap::new();
        let input = json!({ "user": "ada" });
        let view = View::new(&input, &results);
        let mut warnings = Vec::new();

        assert_eq!(render_str("{{input.user}}", &view, &mut warnings), "ada");
        assert_eq!(render_str("{{previous.user}}", &view, &mut warnings), "ada");
    }

    #[test]
    fn missing_path_keeps_original_and_warns() {
        let results = IndexMap::new();
        let input = Value::Null;
        let view = View::new(&input, &results);
        let mut warnings = Vec::new();

        let template = "hello {{state.nope}}";
        assert_eq!(render_str(template, &view, &mut warnings), template);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("state.nope"));
    }

    #[test]
    fn unclosed_template_keeps_original_and_warns() {
        let results = IndexMap::new();
        let input = Value::Null;
        let view = View::new(&input, &results);
        let mut warnings = Vec::new();

        let template = "broken {{input.x";
        assert_eq!(render_str(template, &view, &mut warnings), template);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn resolves_nested_config_element_wise() {
        let results = results_with(&[("n1", json!("world"))]);
        let input = json!(7);
        let view = View::new(&input, &results);
        let mut warnings = Vec::new();

        let config = json!({
            "message": "hello {{state.n1}}",
            "count": 3,
            "enabled": true,
            "items": ["{{input}}", "literal"],
            "nested": { "inner": "{{$node.n1}}" }
        });

        let resolved = render_config(&config, &view, &mut warnings);
        assert_eq!(
            resolved,
            json!({
                "message": "hello world",
                "count": 3,
                "enabled": true,
                "items": ["7", "literal"],
                "nested": { "inner": "world" }
            })
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn object_values_render_as_compact_json() {
        let results = results_with(&[("n1", json!({ "a": 1 }))]);
        let input = Value::Null;
        let view = View::new(&input, &results);
        let mut warnings = Vec::new();

        assert_eq!(
            render_str("{{state.n1}}", &view, &mut warnings),
            "{\"a\":1}"
        );
    }

    #[test]
    fn array_indexing_by_numeric_segment() {
        let results = results_with(&[("list", json!(["a", "b", "c"]))]);
        let input = Value::Null;
        let view = View::new(&input, &results);
        let mut warnings = Vec::new();

        assert_eq!(render_str("{{state.list.1}}", &view, &mut warnings), "b");
    }
}
