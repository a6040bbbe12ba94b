//! Reconciling inline marks once content has converged.

use redraft_model::{Mark, Node};
use redraft_transform::Transform;
use tracing::trace;

use crate::error::DiffError;

/// A current and target document known to differ only in their marks.
#[derive(Debug, Clone)]
pub struct AlignedPair {
    current: Node,
    target: Node,
}

impl AlignedPair {
    pub fn new(current: &Node, target: &Node) -> Result<Self, DiffError> {
        if current.strip_marks() != target.strip_marks() {
            return Err(DiffError::Misaligned);
        }
        Ok(Self {
            current: current.clone(),
            target: target.clone(),
        })
    }

    pub fn current(&self) -> &Node {
        &self.current
    }

    pub fn target(&self) -> &Node {
        &self.target
    }
}

/// Add and remove marks on `tr` until its document carries the target's
/// marks. `pair.current()` must be `tr.doc()`.
pub(crate) fn reconcile_marks(tr: &mut Transform, pair: &AlignedPair) -> Result<(), DiffError> {
    let mut spans: Vec<(usize, Node)> = Vec::new();
    pair.target().descendants(|node, pos, _| {
        if node.is_inline() {
            spans.push((pos, node.clone()));
        }
        true
    });
    let before = tr.steps().len();
    for (from, target) in spans {
        let to = from + target.node_size();
        let mut overlapping: Vec<(usize, usize, Vec<Mark>)> = Vec::new();
        tr.doc().nodes_between(from, to, |node, pos, _| {
            if node.is_inline() {
                overlapping.push((pos, pos + node.node_size(), node.marks().to_vec()));
            }
            true
        });
        for (pos, node_end, marks) in overlapping {
            let start = pos.max(from);
            let end = node_end.min(to);
            for mark in marks.iter().filter(|m| !m.is_in_set(target.marks())) {
                tr.remove_mark(start, end, mark)?;
            }
            for mark in target.marks().iter().filter(|m| !m.is_in_set(&marks)) {
                tr.add_mark(start, end, mark)?;
            }
        }
    }
    trace!(steps = tr.steps().len() - before, "mark steps");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraft_model::Schema;
    use serde_json::{json, Value};

    fn para(schema: &Schema, content: Value) -> Node {
        schema
            .node_from_json(&json!({"type": "doc", "content": [{"type": "paragraph", "content": content}]}))
            .unwrap()
    }

    #[test]
    fn content_differences_are_misaligned() {
        let s = Schema::basic();
        let a = para(&s, json!([{"type": "text", "text": "one"}]));
        let b = para(&s, json!([{"type": "text", "text": "two"}]));
        assert_eq!(AlignedPair::new(&a, &b).unwrap_err(), DiffError::Misaligned);
    }

    #[test]
    fn link_target_change_swaps_the_mark() {
        let s = Schema::basic();
        let link = |href: &str| json!([{"type": "text", "text": "site", "marks": [{"type": "link", "attrs": {"href": href}}]}]);
        let a = para(&s, link("a.example"));
        let b = para(&s, link("b.example"));
        let pair = AlignedPair::new(&a, &b).unwrap();
        let mut tr = Transform::new(a);
        reconcile_marks(&mut tr, &pair).unwrap();
        assert_eq!(tr.doc(), &b);
        assert_eq!(tr.steps().len(), 2);
        assert!(tr.steps().iter().all(|s| s.is_mark_step()));
    }

    #[test]
    fn partial_overlaps_touch_only_the_overlap() {
        let s = Schema::basic();
        let a = para(
            &s,
            json!([
                {"type": "text", "text": "ab", "marks": [{"type": "em"}]},
                {"type": "text", "text": "cd"}
            ]),
        );
        let b = para(
            &s,
            json!([
                {"type": "text", "text": "a"},
                {"type": "text", "text": "bcd", "marks": [{"type": "strong"}]}
            ]),
        );
        let pair = AlignedPair::new(&a, &b).unwrap();
        let mut tr = Transform::new(a);
        reconcile_marks(&mut tr, &pair).unwrap();
        assert_eq!(tr.doc(), &b);
    }
}
