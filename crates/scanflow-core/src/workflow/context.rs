//! Context merging.
//!
//! The workflow context is the ever-growing JSON value carried across a
//! run: each step's parsed output is shallow-merged onto it, later keys
//! overwriting earlier ones of the same name. The context lives only for
//! the duration of one run and is never persisted.

use serde_json::{Map, Value};

/// Shallow-merge a step's parsed output onto the accumulated context.
///
/// Top-level keys from `overlay` overwrite equal keys in `base`; nested
/// values are replaced wholesale, not merged. A non-object `base`
/// contributes nothing and the result is just the overlay's keys.
pub fn shallow_merge(base: Value, overlay: &Map<String, Value>) -> Value {
    let mut merged = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_later_keys_overwrite_earlier() {
        let merged = shallow_merge(
            json!({"status": "pending", "barcode": "123"}),
            &obj(json!({"status": "ok"})),
        );
        assert_eq!(merged, json!({"status": "ok", "barcode": "123"}));
    }

    #[test]
    fn test_merge_is_shallow() {
        let merged = shallow_merge(
            json!({"nested": {"a": 1, "b": 2}}),
            &obj(json!({"nested": {"a": 9}})),
        );
        // Nested objects are replaced, not merged
        assert_eq!(merged, json!({"nested": {"a": 9}}));
    }

    #[test]
    fn test_sequential_merges_accumulate_left_to_right() {
        let step1 = obj(json!({"a": 1}));
        let step2 = obj(json!({"b": 2}));
        let step3 = obj(json!({"a": 3}));

        let mut context = json!({"input": true});
        for step in [&step1, &step2, &step3] {
            context = shallow_merge(context, step);
        }
        assert_eq!(context, json!({"input": true, "a": 3, "b": 2}));
    }

    #[test]
    fn test_non_object_base_yields_overlay_only() {
        let merged = shallow_merge(json!("scalar input"), &obj(json!({"a": 1})));
        assert_eq!(merged, json!({"a": 1}));
    }
}
