use redraft_model::Node;
use redraft_patch::Op;
use serde_json::Value;
use tracing::trace;

/// Serialized forms of two documents and the patch between them.
#[derive(Debug, Clone)]
pub(crate) struct StructuralPatch {
    pub source: Value,
    pub target: Value,
    pub ops: Vec<Op>,
}

/// Diff the JSON forms of `from` and `to`, optionally with every inline
/// mark stripped first.
pub(crate) fn structural_patch(from: &Node, to: &Node, strip_marks: bool) -> StructuralPatch {
    let (source, target) = if strip_marks {
        (from.strip_marks().to_json(), to.strip_marks().to_json())
    } else {
        (from.to_json(), to.to_json())
    };
    let ops = redraft_patch::diff(&source, &target);
    trace!(ops = ops.len(), strip_marks, "structural patch");
    StructuralPatch { source, target, ops }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraft_model::Schema;
    use serde_json::json;

    #[test]
    fn mark_changes_vanish_when_stripped() {
        let s = Schema::basic();
        let plain = s
            .node_from_json(&json!({"type": "doc", "content": [{"type": "paragraph", "content": [
                {"type": "text", "text": "bold move"}
            ]}]}))
            .unwrap();
        let marked = s
            .node_from_json(&json!({"type": "doc", "content": [{"type": "paragraph", "content": [
                {"type": "text", "text": "bold", "marks": [{"type": "strong"}]},
                {"type": "text", "text": " move"}
            ]}]}))
            .unwrap();
        assert!(structural_patch(&plain, &marked, true).ops.is_empty());
        let full = structural_patch(&plain, &marked, false);
        assert!(!full.ops.is_empty());
        let mut json = full.source.clone();
        redraft_patch::apply_ops(&mut json, &full.ops).unwrap();
        assert_eq!(json, full.target);
    }
}
