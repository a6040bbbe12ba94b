//! Text-level refinement of a changed text node.
//!
//! A [`TextDiffer`] produces the edit script between the old and new text;
//! [`refine_text`] walks it and emits insert, delete and replace steps
//! anchored at the text node's document position.

use redraft_model::{Mark, Schema};
use redraft_patch::myers::PatchOpType;
use redraft_patch::str_diff;
use redraft_transform::Transform;
use similar::{ChangeTag, TextDiff};
use tracing::trace;

use crate::error::DiffError;

/// One run of an edit script between two strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextChange {
    Equal(String),
    Insert(String),
    Delete(String),
}

impl TextChange {
    fn text(&self) -> &str {
        match self {
            TextChange::Equal(s) | TextChange::Insert(s) | TextChange::Delete(s) => s,
        }
    }

    /// Length in document positions.
    pub fn len(&self) -> usize {
        self.text().chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// Strategy computing the edit script between two strings.
pub trait TextDiffer {
    fn diff(&self, old: &str, new: &str) -> Vec<TextChange>;
}

/// Character granularity: Myers over `char`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharDiff;

impl TextDiffer for CharDiff {
    fn diff(&self, old: &str, new: &str) -> Vec<TextChange> {
        str_diff::diff(old, new)
            .into_iter()
            .map(|(op, text)| match op {
                PatchOpType::Eql => TextChange::Equal(text),
                PatchOpType::Ins => TextChange::Insert(text),
                PatchOpType::Del => TextChange::Delete(text),
            })
            .collect()
    }
}

/// Word granularity: words and the whitespace between them are tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordDiff;

impl TextDiffer for WordDiff {
    fn diff(&self, old: &str, new: &str) -> Vec<TextChange> {
        let diff = TextDiff::from_words(old, new);
        let mut out: Vec<TextChange> = Vec::new();
        for change in diff.iter_all_changes() {
            let value = change.value();
            match (out.last_mut(), change.tag()) {
                (Some(TextChange::Equal(run)), ChangeTag::Equal)
                | (Some(TextChange::Insert(run)), ChangeTag::Insert)
                | (Some(TextChange::Delete(run)), ChangeTag::Delete) => run.push_str(value),
                (_, ChangeTag::Equal) => out.push(TextChange::Equal(value.to_string())),
                (_, ChangeTag::Insert) => out.push(TextChange::Insert(value.to_string())),
                (_, ChangeTag::Delete) => out.push(TextChange::Delete(value.to_string())),
            }
        }
        out
    }
}

/// Emit the steps turning `old` into `new`, for a text node starting at
/// `base`. Inserted text carries `marks`.
pub(crate) fn refine_text(
    tr: &mut Transform,
    schema: &Schema,
    old: &str,
    new: &str,
    marks: &[Mark],
    base: usize,
    differ: &dyn TextDiffer,
) -> Result<(), DiffError> {
    let script = differ.diff(old, new);
    let mut changes = script.iter().filter(|c| !c.is_empty()).peekable();
    let mut offset = base;
    while let Some(change) = changes.next() {
        match change {
            TextChange::Equal(_) => offset += change.len(),
            TextChange::Insert(text) => {
                let node = schema.text(text, marks.to_vec())?;
                match changes.next_if(|c| matches!(c, TextChange::Delete(_))) {
                    Some(removed) => tr.replace_with(offset, offset + removed.len(), node)?,
                    None => tr.insert(offset, node)?,
                };
                trace!(offset, inserted = change.len(), "text insertion");
                offset += change.len();
            }
            TextChange::Delete(_) => match changes.next_if(|c| matches!(c, TextChange::Insert(_))) {
                Some(TextChange::Insert(text)) => {
                    let node = schema.text(text, marks.to_vec())?;
                    tr.replace_with(offset, offset + change.len(), node)?;
                    let added = text.chars().count();
                    trace!(offset, removed = change.len(), inserted = added, "text replacement");
                    offset += added;
                }
                _ => {
                    tr.delete(offset, offset + change.len())?;
                    trace!(offset, removed = change.len(), "text deletion");
                }
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraft_model::Node;
    use serde_json::json;

    fn paragraph(schema: &Schema, text: &str) -> Node {
        schema
            .node_from_json(&json!({"type": "doc", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": text}]}
            ]}))
            .unwrap()
    }

    fn refine(old: &str, new: &str, differ: &dyn TextDiffer) -> Transform {
        let schema = Schema::basic();
        let mut tr = Transform::new(paragraph(&schema, old));
        refine_text(&mut tr, &schema, old, new, &[], 1, differ).unwrap();
        assert_eq!(tr.doc(), &paragraph(&schema, new));
        tr
    }

    #[test]
    fn char_diff_script() {
        assert_eq!(
            CharDiff.diff("cat", "cats"),
            vec![TextChange::Equal("cat".into()), TextChange::Insert("s".into())]
        );
    }

    #[test]
    fn word_diff_groups_tokens() {
        let script = WordDiff.diff("hello world", "hello brave world");
        let old: String = script
            .iter()
            .filter(|c| !matches!(c, TextChange::Insert(_)))
            .map(TextChange::text)
            .collect();
        let new: String = script
            .iter()
            .filter(|c| !matches!(c, TextChange::Delete(_)))
            .map(TextChange::text)
            .collect();
        assert_eq!(old, "hello world");
        assert_eq!(new, "hello brave world");
        assert!(script.iter().all(|c| !matches!(c, TextChange::Delete(_))));
    }

    #[test]
    fn insertion_lands_after_common_prefix() {
        let tr = refine("cat", "cats", &CharDiff);
        assert_eq!(tr.steps().len(), 1);
        assert_eq!(
            tr.steps()[0].to_json(),
            json!({"stepType": "replace", "from": 4, "to": 4, "slice": {"content": [{"type": "text", "text": "s"}]}})
        );
    }

    #[test]
    fn replacement_is_one_step() {
        let tr = refine("a cat sat", "a dog sat", &WordDiff);
        assert_eq!(tr.steps().len(), 1);
        let step = tr.steps()[0].to_json();
        assert_eq!((step["from"].clone(), step["to"].clone()), (json!(3), json!(6)));
    }

    #[test]
    fn deletions_and_offsets_across_runs() {
        refine("abcdef", "xbcf", &CharDiff);
        refine("one two three", "two three four", &WordDiff);
        refine("héllo wörld", "hello world!", &CharDiff);
    }

    #[test]
    fn inserted_text_keeps_marks() {
        let schema = Schema::basic();
        let em = schema.mark("em", None).unwrap();
        let doc = schema
            .node_from_json(&json!({"type": "doc", "content": [{"type": "paragraph", "content": [
                {"type": "text", "text": "hi", "marks": [{"type": "em"}]}
            ]}]}))
            .unwrap();
        let mut tr = Transform::new(doc);
        refine_text(&mut tr, &schema, "hi", "him", &[em.clone()], 1, &CharDiff).unwrap();
        let text = tr.doc().child(0).child(0).clone();
        assert_eq!(text.text(), Some("him"));
        assert_eq!(text.marks(), &[em]);
    }
}
