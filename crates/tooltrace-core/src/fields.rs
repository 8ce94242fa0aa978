//! Total accessors over schema-less JSON records.
//!
//! Every function here treats a missing key and a value of the wrong type
//! the same way: as not present.

use serde_json::{Map, Value};

pub fn get_str<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    match record.get(key) {
        Some(Value::String(s)) => Some(s.as_str()),
        _ => None,
    }
}

pub fn get_owned_str(record: &Map<String, Value>, key: &str) -> Option<String> {
    get_str(record, key).map(str::to_string)
}

pub fn get_object<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    record.get(key).and_then(Value::as_object)
}

pub fn get_array<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a Vec<Value>> {
    record.get(key).and_then(Value::as_array)
}

/// Strict boolean: only a JSON `true` counts.
pub fn is_true(record: &Map<String, Value>, key: &str) -> bool {
    matches!(record.get(key), Some(Value::Bool(true)))
}

/// Loose boolean, for flags older log versions wrote as numbers or strings.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Items of an ordered list whose declared `type` matches `kind`.
pub fn typed_items<'a>(
    items: &'a [Value],
    kind: &'a str,
) -> impl Iterator<Item = &'a Map<String, Value>> + 'a {
    items
        .iter()
        .filter_map(Value::as_object)
        .filter(move |item| get_str(item, "type") == Some(kind))
}

/// Flatten a content value into plain text.
///
/// A string passes through untouched. A list contributes only its non-empty
/// `text` chunks, in order, joined by newlines. Anything else is empty.
pub fn flatten_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => typed_items(items, "text")
            .filter_map(|chunk| get_str(chunk, "text"))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_get_str_ignores_wrong_types() {
        let record = obj(json!({"a": "x", "b": 1, "c": null}));
        assert_eq!(get_str(&record, "a"), Some("x"));
        assert_eq!(get_str(&record, "b"), None);
        assert_eq!(get_str(&record, "c"), None);
        assert_eq!(get_str(&record, "missing"), None);
    }

    #[test]
    fn test_is_true_is_strict() {
        let record = obj(json!({"yes": true, "one": 1, "str": "true"}));
        assert!(is_true(&record, "yes"));
        assert!(!is_true(&record, "one"));
        assert!(!is_true(&record, "str"));
        assert!(!is_true(&record, "missing"));
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(Some(&json!(true))));
        assert!(is_truthy(Some(&json!(1))));
        assert!(is_truthy(Some(&json!("error"))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(None));
    }

    #[test]
    fn test_flatten_text_joins_text_chunks() {
        let content = json!([
            {"type": "text", "text": "first"},
            {"type": "image", "source": "..."},
            {"type": "text", "text": ""},
            {"type": "text"},
            "stray",
            {"type": "text", "text": "second"}
        ]);
        assert_eq!(flatten_text(Some(&content)), "first\nsecond");
    }

    #[test]
    fn test_flatten_text_passes_strings_through() {
        assert_eq!(flatten_text(Some(&json!("  hi  "))), "  hi  ");
        assert_eq!(flatten_text(Some(&json!(42))), "");
        assert_eq!(flatten_text(None), "");
    }
}
