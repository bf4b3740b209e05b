//! Free-form metadata attached to architecture and taskgraph items.
//!
//! Rule sets read metadata to decide legality and cost, so the map is kept
//! ordered for deterministic iteration and serialization.

use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered key/value store for user data on components, ports, links,
/// taskgraph nodes, and taskgraph edges.
pub type Metadata = BTreeMap<String, Value>;

/// Returns `true` if `metadata[key]` exists and `pred(value, metadata[key])`
/// holds.
///
/// Missing keys never match.
pub fn search_metadata<F>(metadata: &Metadata, key: &str, value: &Value, pred: F) -> bool
where
    F: Fn(&Value, &Value) -> bool,
{
    metadata.get(key).is_some_and(|stored| pred(value, stored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_key_is_false() {
        let meta = Metadata::new();
        assert!(!search_metadata(&meta, "kind", &json!("alu"), |a, b| a == b));
    }

    #[test]
    fn equality_match() {
        let mut meta = Metadata::new();
        meta.insert("kind".into(), json!("alu"));
        assert!(search_metadata(&meta, "kind", &json!("alu"), |a, b| a == b));
        assert!(!search_metadata(&meta, "kind", &json!("mem"), |a, b| a == b));
    }

    #[test]
    fn custom_predicate() {
        let mut meta = Metadata::new();
        meta.insert("kinds".into(), json!(["alu", "mem"]));
        let contains = |needle: &Value, hay: &Value| {
            hay.as_array().is_some_and(|items| items.contains(needle))
        };
        assert!(search_metadata(&meta, "kinds", &json!("mem"), contains));
    }
}
