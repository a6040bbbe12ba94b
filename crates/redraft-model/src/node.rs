use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::replace::replace;
use crate::resolved_pos::ResolvedPos;
use crate::schema::{Attrs, MarkType, NodeType};
use crate::slice::Slice;

struct NodeInner {
    node_type: NodeType,
    attrs: Attrs,
    content: Fragment,
    marks: Vec<Mark>,
    text: Option<String>,
    text_len: usize,
}

/// An immutable document node. Clones share the same allocation.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

/// Substring of `s` between two char offsets.
pub(crate) fn char_slice(s: &str, from: usize, to: usize) -> &str {
    let mut indices = s.char_indices().map(|(i, _)| i).chain(std::iter::once(s.len()));
    let start = indices.nth(from).unwrap_or(s.len());
    let end = if to > from {
        indices.nth(to - from - 1).unwrap_or(s.len())
    } else {
        start
    };
    &s[start..end]
}

impl Node {
    pub(crate) fn new_element(node_type: NodeType, attrs: Attrs, content: Fragment, marks: Vec<Mark>) -> Self {
        Node(Arc::new(NodeInner {
            node_type,
            attrs,
            content,
            marks,
            text: None,
            text_len: 0,
        }))
    }

    pub(crate) fn new_text(node_type: NodeType, text: String, marks: Vec<Mark>) -> Self {
        let text_len = text.chars().count();
        let attrs = Attrs::new();
        Node(Arc::new(NodeInner {
            node_type,
            attrs,
            content: Fragment::empty(),
            marks,
            text: Some(text),
            text_len,
        }))
    }

    pub fn node_type(&self) -> &NodeType {
        &self.0.node_type
    }

    pub fn type_name(&self) -> &str {
        self.0.node_type.name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.0.attrs.get(name)
    }

    pub fn content(&self) -> &Fragment {
        &self.0.content
    }

    pub fn marks(&self) -> &[Mark] {
        &self.0.marks
    }

    /// Text of a text node.
    pub fn text(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    /// Length of a text node's text in chars; 0 for other nodes.
    pub fn text_len(&self) -> usize {
        self.0.text_len
    }

    pub fn is_text(&self) -> bool {
        self.0.text.is_some()
    }

    pub fn is_inline(&self) -> bool {
        self.0.node_type.is_inline()
    }

    pub fn is_block(&self) -> bool {
        self.0.node_type.is_block()
    }

    pub fn is_textblock(&self) -> bool {
        self.0.node_type.is_textblock()
    }

    pub fn inline_content(&self) -> bool {
        self.0.node_type.inline_content()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.node_type.is_leaf()
    }

    pub fn is_atom(&self) -> bool {
        self.0.node_type.is_atom()
    }

    /// Size of the node in the position model.
    pub fn node_size(&self) -> usize {
        if self.is_text() {
            self.0.text_len
        } else if self.is_leaf() {
            1
        } else {
            self.0.content.size() + 2
        }
    }

    pub fn child_count(&self) -> usize {
        self.0.content.child_count()
    }

    /// The child at `index`. Panics when out of range.
    pub fn child(&self, index: usize) -> &Node {
        self.0.content.child(index)
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.0.content.maybe_child(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.0.content.first_child()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.0.content.last_child()
    }

    /// Same allocation.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Same type, attributes and marks.
    pub fn same_markup(&self, other: &Node) -> bool {
        self.has_markup(other.node_type(), other.attrs(), other.marks())
    }

    pub fn has_markup(&self, node_type: &NodeType, attrs: &Attrs, marks: &[Mark]) -> bool {
        self.node_type() == node_type && self.attrs() == attrs && Mark::same_set(self.marks(), marks)
    }

    /// Same markup with different content.
    pub fn copy(&self, content: Fragment) -> Node {
        if self.is_text() {
            return self.clone();
        }
        Node::new_element(self.0.node_type.clone(), self.0.attrs.clone(), content, self.0.marks.clone())
    }

    /// Same node with a different mark set.
    pub fn mark(&self, marks: Vec<Mark>) -> Node {
        if Mark::same_set(&marks, self.marks()) {
            return self.clone();
        }
        match &self.0.text {
            Some(text) => Node::new_text(self.0.node_type.clone(), text.clone(), marks),
            None => Node::new_element(
                self.0.node_type.clone(),
                self.0.attrs.clone(),
                self.0.content.clone(),
                marks,
            ),
        }
    }

    /// Same text node with other text; ignored for non-text nodes.
    pub fn with_text(&self, text: String) -> Node {
        if !self.is_text() || self.text() == Some(text.as_str()) {
            return self.clone();
        }
        Node::new_text(self.0.node_type.clone(), text, self.0.marks.clone())
    }

    /// The part of this node between two of its content positions.
    pub fn cut(&self, from: usize, to: usize) -> Node {
        match &self.0.text {
            Some(text) => {
                if from == 0 && to == self.0.text_len {
                    return self.clone();
                }
                self.with_text(char_slice(text, from, to).to_string())
            }
            None => {
                if from == 0 && to == self.0.content.size() {
                    return self.clone();
                }
                self.copy(self.0.content.cut(from, to))
            }
        }
    }

    /// The slice of this node's content between two positions.
    pub fn slice(&self, from: usize, to: usize) -> ModelResult<Slice> {
        if from > to {
            return Err(ModelError::InvalidRange { from, to });
        }
        if from == to {
            return Ok(Slice::empty());
        }
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        let depth = rfrom.shared_depth(to);
        let start = rfrom.start(depth);
        let content = rfrom.node(depth).content().cut(rfrom.pos() - start, rto.pos() - start);
        Ok(Slice::new(content, rfrom.depth() - depth, rto.depth() - depth))
    }

    /// Replace `from..to` with `slice`, checking that the open sides of
    /// the slice fit and that the result is valid.
    pub fn replace(&self, from: usize, to: usize, slice: &Slice) -> ModelResult<Node> {
        if from > to {
            return Err(ModelError::InvalidRange { from, to });
        }
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        replace(&rfrom, &rto, slice)
    }

    pub fn resolve(&self, pos: usize) -> ModelResult<ResolvedPos> {
        ResolvedPos::resolve(self, pos)
    }

    /// The node directly after `pos`.
    pub fn node_at(&self, pos: usize) -> Option<Node> {
        let mut node = self.clone();
        let mut pos = pos;
        loop {
            let (index, offset) = node.content().find_index(pos).ok()?;
            let child = node.maybe_child(index)?.clone();
            if offset == pos || child.is_text() {
                return Some(child);
            }
            pos -= offset + 1;
            node = child;
        }
    }

    /// Call `f(node, pos, parent)` for every descendant overlapping
    /// `from..to`. Returning false skips the node's children.
    pub fn nodes_between<F>(&self, from: usize, to: usize, mut f: F)
    where
        F: FnMut(&Node, usize, &Node) -> bool,
    {
        self.0.content.nodes_between(from, to, &mut f, 0, self);
    }

    /// Call `f` for every descendant.
    pub fn descendants<F>(&self, f: F)
    where
        F: FnMut(&Node, usize, &Node) -> bool,
    {
        self.nodes_between(0, self.0.content.size(), f);
    }

    /// Check the whole subtree against the schema.
    pub fn check(&self) -> ModelResult<()> {
        if self.is_text() && self.0.text_len == 0 {
            return Err(ModelError::EmptyText);
        }
        self.0.node_type.check_content(&self.0.content)?;
        let mut normalized: Vec<Mark> = Vec::new();
        for mark in self.marks() {
            normalized = mark.add_to_set(&normalized);
        }
        if !Mark::same_set(&normalized, self.marks()) {
            return Err(ModelError::InvalidMarks(self.type_name().to_string()));
        }
        for child in &self.0.content {
            child.check()?;
        }
        Ok(())
    }

    /// Copy of the subtree with every inline mark removed and adjacent
    /// text nodes joined.
    pub fn strip_marks(&self) -> Node {
        let mut node = if self.child_count() > 0 {
            let children = self.0.content.iter().map(Node::strip_marks).collect();
            self.copy(Fragment::from_array(children))
        } else {
            self.clone()
        };
        if node.is_inline() && !node.marks().is_empty() {
            node = node.mark(Vec::new());
        }
        node
    }

    /// Whether some inline node in `from..to` carries a mark of `mark_type`.
    pub fn range_has_mark(&self, from: usize, to: usize, mark_type: &MarkType) -> bool {
        let mut found = false;
        if to > from {
            self.nodes_between(from, to, |node, _, _| {
                if mark_type.is_in_set(node.marks()).is_some() {
                    found = true;
                }
                !found
            });
        }
        found
    }

    pub fn text_content(&self) -> String {
        match &self.0.text {
            Some(text) => text.clone(),
            None => self.0.content.text_content(),
        }
    }

    /// Whether this type may hold `marks`.
    pub fn allows_marks(&self, marks: &[Mark]) -> bool {
        self.0.node_type.allows_marks(marks)
    }

    /// Whether replacing children `from..to` with `replacement` keeps the
    /// content valid.
    pub fn can_replace(&self, from: usize, to: usize, replacement: &Fragment) -> bool {
        let mut children: Vec<Node> = self.0.content.children()[..from].to_vec();
        children.extend(replacement.iter().cloned());
        children.extend(self.0.content.children()[to..].iter().cloned());
        self.0.node_type.valid_content(&Fragment::from_vec(children))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.same_markup(other) && self.0.text == other.0.text && self.0.content == other.0.content
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = match &self.0.text {
            Some(text) => format!("{text:?}"),
            None if self.child_count() > 0 => {
                let inner = self.0.content.to_string();
                format!("{}({})", self.type_name(), &inner[1..inner.len() - 1])
            }
            None => self.type_name().to_string(),
        };
        for mark in self.marks().iter().rev() {
            out = format!("{}({out})", mark.mark_type().name());
        }
        f.write_str(&out)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::test_util::*;

    #[test]
    fn char_slice_respects_multibyte() {
        assert_eq!(char_slice("naïve", 1, 4), "aïv");
        assert_eq!(char_slice("abc", 3, 3), "");
        assert_eq!(char_slice("abc", 0, 3), "abc");
    }

    #[test]
    fn sizes() {
        let s = Schema::basic();
        let d = doc(&s, vec![p(&s, vec![txt(&s, "hello")]), hr(&s)]);
        assert_eq!(d.content().size(), 8);
        assert_eq!(d.node_size(), 10);
        assert_eq!(txt(&s, "naïve").node_size(), 5);
    }

    #[test]
    fn node_at_and_nodes_between() {
        let s = Schema::basic();
        let d = doc(&s, vec![p(&s, vec![txt(&s, "ab")]), p(&s, vec![txt(&s, "cd")])]);
        assert_eq!(d.node_at(0).map(|n| n.type_name().to_string()), Some("paragraph".into()));
        assert_eq!(d.node_at(1).and_then(|n| n.text().map(str::to_string)), Some("ab".into()));
        assert_eq!(d.node_at(5).and_then(|n| n.text().map(str::to_string)), Some("cd".into()));
        assert!(d.node_at(8).is_none());

        let mut seen = Vec::new();
        d.nodes_between(2, 6, |node, pos, _| {
            seen.push((node.type_name().to_string(), pos));
            true
        });
        assert_eq!(
            seen,
            vec![
                ("paragraph".to_string(), 0),
                ("text".to_string(), 1),
                ("paragraph".to_string(), 4),
                ("text".to_string(), 5),
            ]
        );
    }

    #[test]
    fn strip_marks_joins_text() {
        let s = Schema::basic();
        let em = s.mark("em", None).unwrap();
        let d = doc(
            &s,
            vec![p(&s, vec![txt(&s, "a"), s.text("b", vec![em]).unwrap(), txt(&s, "c")])],
        );
        let stripped = d.strip_marks();
        assert_eq!(stripped.child(0).child_count(), 1);
        assert_eq!(stripped.child(0).child(0).text(), Some("abc"));
        assert_eq!(stripped, doc(&s, vec![p(&s, vec![txt(&s, "abc")])]));
    }

    #[test]
    fn check_rejects_invalid_content() {
        let s = Schema::basic();
        assert!(doc(&s, vec![p(&s, vec![])]).check().is_ok());
        let empty_doc = s.node("doc", None, Fragment::empty(), vec![]).unwrap();
        assert!(matches!(empty_doc.check(), Err(ModelError::InvalidContent(_))));
    }

    #[test]
    fn display_form() {
        let s = Schema::basic();
        let em = s.mark("em", None).unwrap();
        let d = doc(&s, vec![p(&s, vec![s.text("hi", vec![em]).unwrap()]), hr(&s)]);
        assert_eq!(d.to_string(), "doc(paragraph(em(\"hi\")), horizontal_rule)");
    }

    #[test]
    fn slice_and_replace() {
        let s = Schema::basic();
        let d = doc(&s, vec![p(&s, vec![txt(&s, "hello")]), p(&s, vec![txt(&s, "world")])]);
        let slice = d.slice(3, 10).unwrap();
        assert_eq!((slice.open_start(), slice.open_end()), (1, 1));
        assert_eq!(slice.size(), 9);

        let joined = d.replace(6, 8, &Slice::empty()).unwrap();
        assert_eq!(joined, doc(&s, vec![p(&s, vec![txt(&s, "helloworld")])]));
    }
}
