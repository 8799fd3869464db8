//! Recursive key search over nested JSON structures.
//!
//! Walks maps and sequences collecting every occurrence of a target key with
//! its full path. Keys on an ignore list prune their whole subtree. A match
//! found inside an `extension` entry is suppressed when the entry's sibling
//! `url` contains any ignored key as a substring, so externally defined
//! extensions that reuse a generic key name do not leak into the results.

use serde_json::{Map, Value};

/// One step of a path into a nested JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A single occurrence of the target key.
#[derive(Debug, Clone, PartialEq)]
pub struct PathMatch<'a> {
    pub path: Vec<PathSegment>,
    pub value: &'a Value,
}

impl PathMatch<'_> {
    /// The first key of the path, typically the top-level field name.
    #[must_use]
    pub fn head_key(&self) -> Option<&str> {
        self.path.iter().find_map(|segment| match segment {
            PathSegment::Key(key) => Some(key.as_str()),
            PathSegment::Index(_) => None,
        })
    }
}

/// Find every occurrence of `target` in `root`, in document order.
#[must_use]
pub fn find_key<'a>(
    root: &'a Map<String, Value>,
    target: &str,
    ignored_keys: &[&str],
) -> Vec<PathMatch<'a>> {
    let mut matches = Vec::new();
    walk_map(root, root, target, ignored_keys, &mut Vec::new(), &mut matches);
    matches
}

/// Resolve a recorded path back to a value, `None` when the path no longer
/// exists.
#[must_use]
pub fn value_at_path<'a>(root: &'a Map<String, Value>, path: &[PathSegment]) -> Option<&'a Value> {
    let mut segments = path.iter();
    let first = match segments.next() {
        Some(PathSegment::Key(key)) => root.get(key)?,
        Some(PathSegment::Index(_)) => return None,
        None => return None,
    };
    segments.try_fold(first, |current, segment| match segment {
        PathSegment::Key(key) => current.get(key),
        PathSegment::Index(index) => current.get(index),
    })
}

fn walk_map<'a>(
    root: &'a Map<String, Value>,
    map: &'a Map<String, Value>,
    target: &str,
    ignored_keys: &[&str],
    path: &mut Vec<PathSegment>,
    matches: &mut Vec<PathMatch<'a>>,
) {
    for (key, value) in map {
        if ignored_keys.contains(&key.as_str()) {
            continue;
        }
        path.push(PathSegment::Key(key.clone()));
        if key == target && !suppressed_by_extension_url(root, path, ignored_keys) {
            matches.push(PathMatch {
                path: path.clone(),
                value,
            });
        }
        walk_value(root, value, target, ignored_keys, path, matches);
        path.pop();
    }
}

fn walk_value<'a>(
    root: &'a Map<String, Value>,
    value: &'a Value,
    target: &str,
    ignored_keys: &[&str],
    path: &mut Vec<PathSegment>,
    matches: &mut Vec<PathMatch<'a>>,
) {
    match value {
        Value::Object(map) => walk_map(root, map, target, ignored_keys, path, matches),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                walk_value(root, item, target, ignored_keys, path, matches);
                path.pop();
            }
        }
        _ => {}
    }
}

/// A match under an `extension` entry is dropped when the entry's `url`
/// contains any ignored key as a substring.
fn suppressed_by_extension_url(
    root: &Map<String, Value>,
    path: &[PathSegment],
    ignored_keys: &[&str],
) -> bool {
    if ignored_keys.is_empty()
        || !path
            .iter()
            .any(|segment| matches!(segment, PathSegment::Key(key) if key == "extension"))
    {
        return false;
    }
    let entry_len = path.len().saturating_sub(2);
    let mut url_path: Vec<PathSegment> = path[..entry_len].to_vec();
    url_path.push(PathSegment::Key("url".to_string()));
    let Some(url) = value_at_path(root, &url_path).and_then(Value::as_str) else {
        return false;
    };
    ignored_keys.iter().any(|key| url.contains(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn finds_nested_occurrences_with_paths() {
        let root = as_map(json!({
            "code": {"coding": [{"display": "a"}]},
            "category": [{"coding": [{"display": "b"}]}]
        }));
        let matches = find_key(&root, "coding", &[]);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].head_key(), Some("code"));
        assert_eq!(matches[1].head_key(), Some("category"));
        assert_eq!(
            matches[1].path,
            vec![
                PathSegment::Key("category".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("coding".to_string()),
            ]
        );
    }

    #[test]
    fn ignored_keys_prune_subtrees() {
        let root = as_map(json!({
            "extension": [{"url": "x", "valueCodeableConcept": {"coding": []}}],
            "code": {"coding": []}
        }));
        let matches = find_key(&root, "coding", &["extension"]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].head_key(), Some("code"));
    }

    #[test]
    fn extension_url_suppresses_reused_key_names() {
        let root = as_map(json!({
            "extension": [
                {
                    "url": "http://example.org/fhir/StructureDefinition/coding-helper",
                    "valueCodeableConcept": {"coding": [{"display": "x"}]}
                },
                {
                    "url": "http://example.org/fhir/StructureDefinition/race",
                    "valueCodeableConcept": {"coding": [{"display": "y"}]}
                }
            ]
        }));
        let matches = find_key(&root, "coding", &["coding-helper"]);
        assert_eq!(matches.len(), 1);
        let display = matches[0].value[0]["display"].as_str();
        assert_eq!(display, Some("y"));
    }

    #[test]
    fn value_at_path_resolves_and_rejects() {
        let root = as_map(json!({"a": [{"b": 1}]}));
        let path = vec![
            PathSegment::Key("a".to_string()),
            PathSegment::Index(0),
            PathSegment::Key("b".to_string()),
        ];
        assert_eq!(value_at_path(&root, &path), Some(&json!(1)));
        let missing = vec![PathSegment::Key("z".to_string())];
        assert_eq!(value_at_path(&root, &missing), None);
    }
}
