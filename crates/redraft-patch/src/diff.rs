//! JSON Patch diff: generate a JSON Patch from two document values.
//!
//! Operations are emitted in depth-first order and each one assumes all
//! earlier ones have already been applied, so array indices are always
//! relative to the partially patched array.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::myers::{self, PatchOpType};
use crate::types::Op;

// ── Public API ────────────────────────────────────────────────────────────

/// Generate a JSON Patch (list of operations) that transforms `src` into `dst`.
pub fn diff(src: &Value, dst: &Value) -> Vec<Op> {
    let mut ops = Vec::new();
    diff_at_path(&mut ops, &[], src, dst);
    ops
}

// ── Core recursive differ ─────────────────────────────────────────────────

fn child_path(path: &[String], key: impl Into<String>) -> Vec<String> {
    let mut p = Vec::with_capacity(path.len() + 1);
    p.extend_from_slice(path);
    p.push(key.into());
    p
}

fn diff_at_path(ops: &mut Vec<Op>, path: &[String], src: &Value, dst: &Value) {
    if src == dst {
        return;
    }
    match (src, dst) {
        (Value::Object(s), Value::Object(d)) => diff_obj(ops, path, s, d),
        (Value::Array(s), Value::Array(d)) => diff_arr(ops, path, s, d),
        // Strings are replaced whole; text-level refinement happens later,
        // where document positions are known.
        _ => ops.push(Op::Replace {
            path: path.to_vec(),
            value: dst.clone(),
        }),
    }
}

fn diff_obj(ops: &mut Vec<Op>, path: &[String], src: &Map<String, Value>, dst: &Map<String, Value>) {
    for key in src.keys() {
        if !dst.contains_key(key) {
            ops.push(Op::Remove {
                path: child_path(path, key.as_str()),
            });
        }
    }
    for (key, dst_val) in dst {
        let p = child_path(path, key.as_str());
        match src.get(key) {
            None => ops.push(Op::Add {
                path: p,
                value: dst_val.clone(),
            }),
            Some(src_val) => diff_at_path(ops, &p, src_val, dst_val),
        }
    }
}

/// Diff two arrays element-wise.
///
/// Elements are interned by their serialized form and diffed as a
/// sequence. Inside each change hunk, deleted and inserted elements are
/// paired up front to back and diffed recursively; the surplus on either
/// side becomes plain `remove` or `add` operations.
fn diff_arr(ops: &mut Vec<Op>, path: &[String], src: &[Value], dst: &[Value]) {
    let mut ids: HashMap<String, usize> = HashMap::new();
    let mut intern = |v: &Value| {
        let key = v.to_string();
        let next = ids.len();
        *ids.entry(key).or_insert(next)
    };
    let src_ids: Vec<usize> = src.iter().map(&mut intern).collect();
    let dst_ids: Vec<usize> = dst.iter().map(&mut intern).collect();

    let chunks = myers::diff(&src_ids, &dst_ids);

    // `at` is the index in the array as patched so far.
    let (mut at, mut si, mut di) = (0usize, 0usize, 0usize);
    let mut i = 0;
    while i < chunks.len() {
        let (kind, len) = chunks[i];
        if kind == PatchOpType::Eql {
            at += len;
            si += len;
            di += len;
            i += 1;
            continue;
        }

        let (mut del, mut ins) = (0usize, 0usize);
        while i < chunks.len() && chunks[i].0 != PatchOpType::Eql {
            match chunks[i].0 {
                PatchOpType::Del => del += chunks[i].1,
                _ => ins += chunks[i].1,
            }
            i += 1;
        }

        let paired = del.min(ins);
        for k in 0..paired {
            diff_at_path(ops, &child_path(path, (at + k).to_string()), &src[si + k], &dst[di + k]);
        }
        at += paired;
        for _ in paired..del {
            ops.push(Op::Remove {
                path: child_path(path, at.to_string()),
            });
        }
        for k in paired..ins {
            ops.push(Op::Add {
                path: child_path(path, at.to_string()),
                value: dst[di + k].clone(),
            });
            at += 1;
        }
        si += del;
        di += ins;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_ops;
    use serde_json::json;

    fn apply_patch(mut doc: Value, ops: &[Op]) -> Value {
        apply_ops(&mut doc, ops).expect("apply failed");
        doc
    }

    #[test]
    fn diff_equal_docs() {
        assert!(diff(&json!({"a": 1}), &json!({"a": 1})).is_empty());
    }

    #[test]
    fn diff_replace_scalar() {
        let ops = diff(&json!(1), &json!(2));
        assert_eq!(ops, vec![Op::Replace { path: vec![], value: json!(2) }]);
    }

    #[test]
    fn strings_are_replaced_whole() {
        let ops = diff(&json!({"text": "cat"}), &json!({"text": "cats"}));
        assert_eq!(
            ops,
            vec![Op::Replace { path: vec!["text".into()], value: json!("cats") }]
        );
    }

    #[test]
    fn removals_come_before_additions() {
        let ops = diff(&json!({"a": 1, "b": 2}), &json!({"c": 3, "a": 1}));
        let names: Vec<_> = ops.iter().map(Op::op_name).collect();
        assert_eq!(names, vec!["remove", "add"]);
    }

    #[test]
    fn diff_object_roundtrip() {
        let src = json!({"name": "Alice", "age": 30});
        let dst = json!({"name": "Bob", "age": 30, "city": "NYC"});
        let ops = diff(&src, &dst);
        assert_eq!(apply_patch(src, &ops), dst);
    }

    #[test]
    fn diff_array_insert() {
        let src = json!([1, 2, 3]);
        let dst = json!([1, 99, 2, 3]);
        let ops = diff(&src, &dst);
        assert_eq!(ops, vec![Op::Add { path: vec!["1".into()], value: json!(99) }]);
    }

    #[test]
    fn diff_array_delete() {
        let src = json!([1, 2, 3]);
        let dst = json!([1, 3]);
        let ops = diff(&src, &dst);
        assert_eq!(ops, vec![Op::Remove { path: vec!["1".into()] }]);
    }

    #[test]
    fn changed_element_recurses() {
        let src = json!([{"type": "p", "text": "a"}, {"type": "p", "text": "b"}]);
        let dst = json!([{"type": "p", "text": "a"}, {"type": "p", "text": "c"}]);
        let ops = diff(&src, &dst);
        assert_eq!(
            ops,
            vec![Op::Replace { path: vec!["1".into(), "text".into()], value: json!("c") }]
        );
    }

    #[test]
    fn mixed_hunk_roundtrips() {
        let src = json!([{"k": 1}, {"k": 2}, {"k": 3}, "x", {"k": 4}]);
        let dst = json!([{"k": 9}, "x", {"k": 4}, {"k": 5}, [1, 2]]);
        let ops = diff(&src, &dst);
        assert_eq!(apply_patch(src, &ops), dst);
    }

    #[test]
    fn nested_documents_roundtrip() {
        let src = json!({"type": "doc", "content": [
            {"type": "paragraph", "content": [{"type": "text", "text": "one"}]},
            {"type": "heading", "attrs": {"level": 1}, "content": [{"type": "text", "text": "two"}]}
        ]});
        let dst = json!({"type": "doc", "content": [
            {"type": "heading", "attrs": {"level": 2}, "content": [{"type": "text", "text": "two!"}]},
            {"type": "paragraph"}
        ]});
        let ops = diff(&src, &dst);
        assert_eq!(apply_patch(src, &ops), dst);
    }
}
