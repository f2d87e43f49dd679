//! Best-effort rendering of tool results as Markdown bullet lines.
//!
//! Tool payloads have no fixed schema. A few common shapes (web search hits,
//! `results` lists, flat records, lists of snippets) are recognized; anything
//! else renders nothing rather than failing.

use recon_wire::Fragment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::normalize::WEB_SEARCH_NAME;

/// Maximum search hits or list items shown per result
const MAX_ITEMS: usize = 3;
/// Maximum fields shown for a flat record
const MAX_FIELDS: usize = 5;
/// Longest string value shown inline
const MAX_INLINE_CHARS: usize = 100;

/// A tool result held until the end of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultEntry {
    /// Name of the tool that produced the result
    pub name: String,
    /// Result payload as returned by the tool, usually JSON text
    pub raw_content: String,
}

impl ToolResultEntry {
    pub fn new(name: impl Into<String>, raw_content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_content: raw_content.into(),
        }
    }
}

/// Render a tool result as display lines
pub fn render(entry: &ToolResultEntry) -> Vec<Fragment> {
    let Ok(parsed) = serde_json::from_str::<Value>(&entry.raw_content) else {
        return vec![Fragment::result_line(format!(
            "- {} returned complex data",
            entry.name
        ))];
    };

    render_lines(&entry.name, &parsed)
        .into_iter()
        .map(Fragment::result_line)
        .collect()
}

fn render_lines(tool_name: &str, value: &Value) -> Vec<String> {
    match value {
        Value::Object(obj) => {
            if tool_name == WEB_SEARCH_NAME {
                match obj.get("top_k") {
                    Some(Value::Array(hits)) => {
                        return hits.iter().take(MAX_ITEMS).filter_map(web_hit_line).collect();
                    }
                    Some(_) => return vec![],
                    None => {}
                }
            }
            match obj.get("results") {
                Some(Value::Array(results)) => {
                    results.iter().take(MAX_ITEMS).map(result_line).collect()
                }
                Some(_) => vec![],
                None => record_lines(obj),
            }
        }
        Value::Array(items) => items.iter().take(MAX_ITEMS).filter_map(list_item_line).collect(),
        _ => vec![],
    }
}

fn web_hit_line(hit: &Value) -> Option<String> {
    let hit = hit.as_object()?;
    Some(format!(
        "- **{}**\n  {}\n  [Source]({})",
        str_field(hit, "title"),
        str_field(hit, "content"),
        str_field(hit, "url")
    ))
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn result_line(result: &Value) -> String {
    let Value::Object(obj) = result else {
        return format!("- {}", inline_text(result));
    };
    let name = first_present(obj, &["name", "title"]);
    let description = first_present(obj, &["description", "content", "summary"]);
    match (name, description) {
        (Some(name), Some(description)) => format!("- **{name}**: {description}"),
        (Some(name), None) => format!("- **{name}**"),
        (None, Some(description)) => format!("- {description}"),
        (None, None) => format!("- {result}"),
    }
}

fn record_lines(obj: &Map<String, Value>) -> Vec<String> {
    obj.iter()
        .take(MAX_FIELDS)
        .map(|(key, value)| {
            let shown = short_string(value).unwrap_or("[Complex data]");
            format!("- **{key}**: {shown}")
        })
        .collect()
}

fn list_item_line(item: &Value) -> Option<String> {
    let text = match item {
        Value::String(s) => s.clone(),
        Value::Object(obj) => match obj.get("text") {
            Some(text) => inline_text(text),
            None => short_string(obj.values().next()?)?.to_string(),
        },
        _ => return None,
    };
    Some(format!("- {text}"))
}

/// First of `keys` holding a non-null value
fn first_present(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
        .map(inline_text)
}

fn short_string(value: &Value) -> Option<&str> {
    value
        .as_str()
        .filter(|s| s.chars().count() <= MAX_INLINE_CHARS)
}

fn inline_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lines(name: &str, payload: Value) -> Vec<String> {
        render(&ToolResultEntry::new(name, payload.to_string()))
            .into_iter()
            .map(|f| match f {
                Fragment::ResultLine { line } => line,
                other => panic!("unexpected fragment {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_web_search_hit() {
        let out = lines(
            "web_search",
            json!({"top_k": [{"title": "T", "url": "U", "content": "C"}]}),
        );
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("T"));
        assert!(out[0].contains("C"));
        assert!(out[0].contains("[Source](U)"));
    }

    #[test]
    fn test_web_search_limits_to_three_hits() {
        let hits: Vec<Value> = (0..5)
            .map(|i| json!({"title": format!("t{i}"), "url": "u", "content": "c"}))
            .collect();
        assert_eq!(lines("web_search", json!({"top_k": hits})).len(), 3);
    }

    #[test]
    fn test_web_search_top_k_not_a_list_renders_nothing() {
        assert!(lines("web_search", json!({"top_k": "none", "x": "y"})).is_empty());
    }

    #[test]
    fn test_top_k_from_other_tool_is_a_record() {
        let out = lines("other_tool", json!({"top_k": [1, 2]}));
        assert_eq!(out, ["- **top_k**: [Complex data]"]);
    }

    #[test]
    fn test_results_list() {
        let out = lines(
            "knowledge_search",
            json!({"results": [
                {"name": "Doc A", "description": "first"},
                {"title": "Doc B", "summary": "second"},
                {"id": 7},
                {"name": "Doc D", "content": "fourth"}
            ]}),
        );
        assert_eq!(
            out,
            [
                "- **Doc A**: first",
                "- **Doc B**: second",
                "- {\"id\":7}",
            ]
        );
    }

    #[test]
    fn test_results_not_a_list_renders_nothing() {
        assert!(lines("tool", json!({"results": "none"})).is_empty());
    }

    #[test]
    fn test_record_renders_first_five_keys() {
        let out = lines(
            "tool",
            json!({"a": "1", "b": "2", "c": "3", "d": "4", "e": "5", "f": "6"}),
        );
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], "- **a**: 1");
        assert_eq!(out[4], "- **e**: 5");
        assert!(out.iter().all(|l| !l.contains("**f**")));
    }

    #[test]
    fn test_record_keeps_insertion_order() {
        let out = lines("tool", json!({"zeta": "z", "alpha": "a"}));
        assert_eq!(out, ["- **zeta**: z", "- **alpha**: a"]);
    }

    #[test]
    fn test_record_complex_values() {
        let long = "x".repeat(150);
        let out = lines("tool", json!({"long": long, "nested": {"k": 1}, "n": 3}));
        assert_eq!(
            out,
            [
                "- **long**: [Complex data]",
                "- **nested**: [Complex data]",
                "- **n**: [Complex data]",
            ]
        );
    }

    #[test]
    fn test_list_items() {
        let out = lines(
            "tool",
            json!(["plain", {"text": "from text"}, {"label": "first value"}, "fourth"]),
        );
        assert_eq!(out, ["- plain", "- from text", "- first value"]);
    }

    #[test]
    fn test_list_skips_unrenderable_items() {
        let out = lines("tool", json!([42, {"data": {"deep": true}}, {"label": "ok"}]));
        assert_eq!(out, ["- ok"]);
    }

    #[test]
    fn test_unrenderable_shapes_produce_nothing() {
        assert!(lines("tool", json!({})).is_empty());
        assert!(lines("tool", json!([])).is_empty());
        assert!(lines("tool", json!("a string")).is_empty());
        assert!(lines("tool", json!(12)).is_empty());
    }

    #[test]
    fn test_non_json_is_complex_data() {
        let out = render(&ToolResultEntry::new("calc", "not json at all"));
        assert_eq!(out, vec![Fragment::result_line("- calc returned complex data")]);
    }
}
