//! JSON Patch apply logic.

use serde_json::Value;

use crate::pointer::format_json_pointer;
use crate::types::{Op, PatchError};

// ── Path navigation ───────────────────────────────────────────────────────

fn get_mut_at<'a>(doc: &'a mut Value, path: &[String]) -> Result<&'a mut Value, PatchError> {
    let ptr = format_json_pointer(path);
    doc.pointer_mut(&ptr).ok_or(PatchError::NotFound(ptr))
}

fn parse_index(key: &str) -> Result<usize, PatchError> {
    key.parse().map_err(|_| PatchError::InvalidIndex(key.to_string()))
}

// ── Individual operation applicators ─────────────────────────────────────

fn apply_add(doc: &mut Value, path: &[String], value: Value) -> Result<(), PatchError> {
    let Some((key, parent_path)) = path.split_last() else {
        *doc = value;
        return Ok(());
    };
    match get_mut_at(doc, parent_path)? {
        Value::Object(map) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        Value::Array(arr) if key == "-" => {
            arr.push(value);
            Ok(())
        }
        Value::Array(arr) => {
            let idx = parse_index(key)?;
            if idx > arr.len() {
                return Err(PatchError::InvalidIndex(key.clone()));
            }
            arr.insert(idx, value);
            Ok(())
        }
        _ => Err(PatchError::InvalidTarget(format_json_pointer(parent_path))),
    }
}

fn apply_remove(doc: &mut Value, path: &[String]) -> Result<(), PatchError> {
    let Some((key, parent_path)) = path.split_last() else {
        return Err(PatchError::InvalidTarget("cannot remove the root".into()));
    };
    match get_mut_at(doc, parent_path)? {
        Value::Object(map) => map
            .shift_remove(key)
            .map(|_| ())
            .ok_or_else(|| PatchError::NotFound(format_json_pointer(path))),
        Value::Array(arr) => {
            let idx = parse_index(key)?;
            if idx >= arr.len() {
                return Err(PatchError::NotFound(format_json_pointer(path)));
            }
            arr.remove(idx);
            Ok(())
        }
        _ => Err(PatchError::InvalidTarget(format_json_pointer(parent_path))),
    }
}

fn apply_replace(doc: &mut Value, path: &[String], value: Value) -> Result<(), PatchError> {
    let target = get_mut_at(doc, path)?;
    *target = value;
    Ok(())
}

// ── Public API ────────────────────────────────────────────────────────────

/// Apply a single operation to `doc` in place.
///
/// On error the document is left unchanged.
pub fn apply_op(doc: &mut Value, op: &Op) -> Result<(), PatchError> {
    match op {
        Op::Add { path, value } => apply_add(doc, path, value.clone()),
        Op::Remove { path } => apply_remove(doc, path),
        Op::Replace { path, value } => apply_replace(doc, path, value.clone()),
    }
}

/// Apply operations in order, stopping at the first failure.
pub fn apply_ops(doc: &mut Value, ops: &[Op]) -> Result<(), PatchError> {
    for op in ops {
        apply_op(doc, op)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_into_array_shifts_elements() {
        let mut doc = json!({"content": [1, 3]});
        apply_op(&mut doc, &Op::Add { path: p(&["content", "1"]), value: json!(2) }).unwrap();
        assert_eq!(doc, json!({"content": [1, 2, 3]}));
    }

    #[test]
    fn add_past_end_is_invalid() {
        let mut doc = json!([1]);
        let err = apply_op(&mut doc, &Op::Add { path: p(&["3"]), value: json!(2) }).unwrap_err();
        assert!(matches!(err, PatchError::InvalidIndex(_)));
        assert_eq!(doc, json!([1]));
    }

    #[test]
    fn remove_keeps_key_order() {
        let mut doc = json!({"a": 1, "b": 2, "c": 3});
        apply_op(&mut doc, &Op::Remove { path: p(&["b"]) }).unwrap();
        let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn replace_requires_existing_target() {
        let mut doc = json!({"a": 1});
        let err = apply_op(&mut doc, &Op::Replace { path: p(&["b"]), value: json!(1) }).unwrap_err();
        assert!(matches!(err, PatchError::NotFound(_)));
    }

    #[test]
    fn replace_root() {
        let mut doc = json!({"a": 1});
        apply_op(&mut doc, &Op::Replace { path: vec![], value: json!([]) }).unwrap();
        assert_eq!(doc, json!([]));
    }
}
