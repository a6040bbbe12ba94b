use redraft_model::Node;
use redraft_transform::Step;

/// The single replace step covering every difference between `from` and
/// `to`, or `None` when their content is identical.
///
/// When the changed region is ambiguous (a repeated run at the boundary)
/// the shallower side wins, so the step replaces whole nodes rather than
/// splitting them.
pub fn minimal_replace_step(from: &Node, to: &Node) -> Option<Step> {
    let mut start = to.content().find_diff_start(from.content())?;
    let (mut end_to, mut end_from) = to.content().find_diff_end(from.content())?;
    let overlap = start.saturating_sub(end_to.min(end_from));
    if overlap > 0 {
        let from_depth = from.resolve(start - overlap).ok()?.depth();
        let to_depth = to.resolve(end_to + overlap).ok()?.depth();
        if from_depth < to_depth {
            start -= overlap;
        } else {
            end_to += overlap;
            end_from += overlap;
        }
    }
    let slice = to.slice(start, end_to).ok()?;
    Some(Step::replace(start, end_from, slice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraft_model::Schema;
    use serde_json::{json, Value};

    fn doc(schema: &Schema, paragraphs: &[&str]) -> Node {
        let content: Vec<Value> = paragraphs
            .iter()
            .map(|t| json!({"type": "paragraph", "content": [{"type": "text", "text": t}]}))
            .collect();
        schema.node_from_json(&json!({"type": "doc", "content": content})).unwrap()
    }

    #[test]
    fn identical_content_has_no_step() {
        let s = Schema::basic();
        assert_eq!(minimal_replace_step(&doc(&s, &["a"]), &doc(&s, &["a"])), None);
    }

    #[test]
    fn covers_only_the_changed_text() {
        let s = Schema::basic();
        let from = doc(&s, &["hello world"]);
        let to = doc(&s, &["hello there world"]);
        let step = minimal_replace_step(&from, &to).unwrap();
        let Step::Replace(r) = &step else {
            panic!("expected a replace step");
        };
        assert_eq!((r.from, r.to), (7, 7));
        assert_eq!(r.slice.content().text_content(), "there ");
        assert_eq!(step.apply(&from).unwrap(), to);
    }

    #[test]
    fn repeated_run_prefers_whole_nodes() {
        let s = Schema::basic();
        let from = doc(&s, &["a", "a"]);
        let to = doc(&s, &["a", "a", "a"]);
        let step = minimal_replace_step(&from, &to).unwrap();
        let Step::Replace(r) = &step else {
            panic!("expected a replace step");
        };
        assert_eq!(r.slice.open_start(), 0);
        assert_eq!(r.slice.open_end(), 0);
        assert_eq!(r.slice.content().child_count(), 1);
        assert_eq!(step.apply(&from).unwrap(), to);
    }
}
