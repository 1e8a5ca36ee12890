//! JSON merge patch (RFC 7386) helpers.
//!
//! `merge_patch` computes the patch turning `base` into `target`;
//! `apply_patch` applies such a patch to a document. The kube store submits
//! computed patches to the API server; the in-memory store applies them to
//! the stored object, which keeps the "diff between two snapshots" contract
//! observable in tests.

use serde_json::{Map, Value};

/// Compute the JSON merge patch that turns `base` into `target`.
///
/// Keys equal on both sides are omitted, keys missing from `target` become
/// `null` (deletion), nested objects are diffed recursively, everything else
/// (including arrays) is replaced wholesale.
pub fn merge_patch(base: &Value, target: &Value) -> Value {
    match (base, target) {
        (Value::Object(base_map), Value::Object(target_map)) => {
            let mut patch = Map::new();
            for (key, target_value) in target_map {
                match base_map.get(key) {
                    Some(base_value) if base_value == target_value => {}
                    Some(base_value) if base_value.is_object() && target_value.is_object() => {
                        patch.insert(key.clone(), merge_patch(base_value, target_value));
                    }
                    _ => {
                        patch.insert(key.clone(), target_value.clone());
                    }
                }
            }
            for key in base_map.keys() {
                if !target_map.contains_key(key) {
                    patch.insert(key.clone(), Value::Null);
                }
            }
            Value::Object(patch)
        }
        _ => target.clone(),
    }
}

/// Apply a JSON merge patch to `doc`, returning the patched document.
pub fn apply_patch(doc: &Value, patch: &Value) -> Value {
    match patch {
        Value::Object(patch_map) => {
            let mut out = match doc {
                Value::Object(doc_map) => doc_map.clone(),
                _ => Map::new(),
            };
            for (key, patch_value) in patch_map {
                if patch_value.is_null() {
                    out.remove(key);
                } else {
                    let current = out.get(key).cloned().unwrap_or(Value::Null);
                    out.insert(key.clone(), apply_patch(&current, patch_value));
                }
            }
            Value::Object(out)
        }
        _ => patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_patch_only_contains_changed_fields() {
        let base = json!({"metadata": {"name": "c1", "finalizers": []}, "spec": {"region": "eu-west-1"}});
        let target =
            json!({"metadata": {"name": "c1", "finalizers": ["f1"]}, "spec": {"region": "eu-west-1"}});

        let patch = merge_patch(&base, &target);
        assert_eq!(patch, json!({"metadata": {"finalizers": ["f1"]}}));
    }

    #[test]
    fn test_merge_patch_identical_documents_is_empty() {
        let doc = json!({"a": 1, "b": {"c": true}});
        assert_eq!(merge_patch(&doc, &doc), json!({}));
    }

    #[test]
    fn test_merge_patch_removed_key_becomes_null() {
        let base = json!({"a": 1, "b": 2});
        let target = json!({"a": 1});
        assert_eq!(merge_patch(&base, &target), json!({"b": null}));
    }

    #[test]
    fn test_apply_patch_preserves_unrelated_fields() {
        // The stored document gained a label between snapshot and patch; the
        // patch only touches finalizers, so the label must survive.
        let stored = json!({"metadata": {"labels": {"team": "phoenix"}, "finalizers": []}});
        let patch = json!({"metadata": {"finalizers": ["f1"]}});

        let patched = apply_patch(&stored, &patch);
        assert_eq!(
            patched,
            json!({"metadata": {"labels": {"team": "phoenix"}, "finalizers": ["f1"]}})
        );
    }

    #[test]
    fn test_apply_patch_null_deletes_key() {
        let stored = json!({"a": 1, "b": 2});
        assert_eq!(apply_patch(&stored, &json!({"b": null})), json!({"a": 1}));
    }

    #[test]
    fn test_patch_round_trip() {
        let base = json!({"spec": {"region": "eu-west-1", "network": {"vpc": {"id": "vpc-1"}}}});
        let target = json!({"spec": {"region": "cn-north-1", "network": {"vpc": {"id": "vpc-1"}}}});

        let patch = merge_patch(&base, &target);
        assert_eq!(apply_patch(&base, &patch), target);
    }
}
