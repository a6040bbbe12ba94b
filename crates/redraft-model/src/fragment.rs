use std::fmt;

use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::node::Node;

/// An ordered sequence of child nodes with a cached total size.
#[derive(Clone, Default, PartialEq)]
pub struct Fragment {
    content: Vec<Node>,
    size: usize,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a fragment from nodes taken as is.
    pub(crate) fn from_vec(content: Vec<Node>) -> Self {
        let size = content.iter().map(Node::node_size).sum();
        Self { content, size }
    }

    /// Build a fragment, joining adjacent text nodes with the same marks.
    pub fn from_array(nodes: Vec<Node>) -> Self {
        let mut joined: Vec<Node> = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Some(last) = joined.last_mut() {
                if node.is_text() && last.same_markup(&node) {
                    let text = format!("{}{}", last.text().unwrap_or(""), node.text().unwrap_or(""));
                    *last = last.with_text(text);
                    continue;
                }
            }
            joined.push(node);
        }
        Self::from_vec(joined)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The child at `index`. Panics when out of range.
    pub fn child(&self, index: usize) -> &Node {
        &self.content[index]
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.content.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.content.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.content.iter()
    }

    pub fn children(&self) -> &[Node] {
        &self.content
    }

    /// Cut out the part between `from` and `to`, cutting into children
    /// that straddle either boundary.
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        if from == 0 && to == self.size {
            return self.clone();
        }
        let mut result = Vec::new();
        let mut size = 0;
        if to > from {
            let mut pos = 0;
            for child in &self.content {
                if pos >= to {
                    break;
                }
                let end = pos + child.node_size();
                if end > from {
                    let mut child = child.clone();
                    if pos < from || end > to {
                        child = if child.is_text() {
                            child.cut(from.saturating_sub(pos), child.text_len().min(to - pos))
                        } else {
                            child.cut(
                                from.saturating_sub(pos + 1),
                                (to - pos - 1).min(child.content().size()),
                            )
                        };
                    }
                    size += child.node_size();
                    result.push(child);
                }
                pos = end;
            }
        }
        Fragment {
            content: result,
            size,
        }
    }

    /// Concatenate, joining the boundary text nodes when they match.
    pub fn append(&self, other: &Fragment) -> Fragment {
        if other.size == 0 {
            return self.clone();
        }
        if self.size == 0 {
            return other.clone();
        }
        let mut content = self.content.clone();
        let mut rest = other.content.iter();
        if let (Some(last), Some(first)) = (content.last_mut(), other.content.first()) {
            if last.is_text() && last.same_markup(first) {
                let text = format!("{}{}", last.text().unwrap_or(""), first.text().unwrap_or(""));
                *last = last.with_text(text);
                rest.next();
            }
        }
        content.extend(rest.cloned());
        Fragment {
            content,
            size: self.size + other.size,
        }
    }

    /// Replace the child at `index`.
    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut content = self.content.clone();
        let size = self.size - content[index].node_size() + node.node_size();
        content[index] = node;
        Fragment { content, size }
    }

    pub fn add_to_start(&self, node: Node) -> Fragment {
        let mut content = Vec::with_capacity(self.content.len() + 1);
        let size = self.size + node.node_size();
        content.push(node);
        content.extend(self.content.iter().cloned());
        Fragment { content, size }
    }

    pub fn add_to_end(&self, node: Node) -> Fragment {
        let mut content = self.content.clone();
        let size = self.size + node.node_size();
        content.push(node);
        Fragment { content, size }
    }

    /// Index and start offset of the child containing `pos`. A position at
    /// a child boundary resolves to the child after it.
    pub fn find_index(&self, pos: usize) -> ModelResult<(usize, usize)> {
        if pos == 0 {
            return Ok((0, 0));
        }
        if pos == self.size {
            return Ok((self.content.len(), pos));
        }
        if pos > self.size {
            return Err(ModelError::PositionOutOfRange {
                pos,
                size: self.size,
            });
        }
        let mut cur = 0;
        for (i, child) in self.content.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= pos {
                if end == pos {
                    return Ok((i + 1, end));
                }
                return Ok((i, cur));
            }
            cur = end;
        }
        Err(ModelError::PositionOutOfRange {
            pos,
            size: self.size,
        })
    }

    /// Call `f(node, pos, parent)` for every node overlapping `from..to`,
    /// descending into a node's children unless `f` returns false.
    pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F, node_start: usize, parent: &Node)
    where
        F: FnMut(&Node, usize, &Node) -> bool,
    {
        let mut pos = 0;
        for child in &self.content {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, node_start + pos, parent) && child.content().size() > 0 {
                let start = pos + 1;
                child.content().nodes_between(
                    from.saturating_sub(start),
                    child.content().size().min(to - start),
                    f,
                    node_start + start,
                    child,
                );
            }
            pos = end;
        }
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.content {
            out.push_str(&child.text_content());
        }
        out
    }

    /// First position at which this fragment and `other` differ.
    pub fn find_diff_start(&self, other: &Fragment) -> Option<usize> {
        find_diff_start(self, other, 0)
    }

    /// Last positions (in this fragment and in `other`) at which the two
    /// differ, scanning from the end.
    pub fn find_diff_end(&self, other: &Fragment) -> Option<(usize, usize)> {
        find_diff_end(self, other, self.size, other.size)
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.content.iter().map(Node::to_json).collect())
    }
}

impl From<Node> for Fragment {
    fn from(node: Node) -> Self {
        Fragment::from_vec(vec![node])
    }
}

impl From<Vec<Node>> for Fragment {
    fn from(nodes: Vec<Node>) -> Self {
        Fragment::from_array(nodes)
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.iter()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        for (i, child) in self.content.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{child}")?;
        }
        write!(f, ">")
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

fn find_diff_start(a: &Fragment, b: &Fragment, mut pos: usize) -> Option<usize> {
    let mut i = 0;
    loop {
        if i == a.child_count() || i == b.child_count() {
            return if a.child_count() == b.child_count() {
                None
            } else {
                Some(pos)
            };
        }
        let (child_a, child_b) = (a.child(i), b.child(i));
        if child_a == child_b {
            pos += child_a.node_size();
            i += 1;
            continue;
        }
        if !child_a.same_markup(child_b) {
            return Some(pos);
        }
        if let (Some(ta), Some(tb)) = (child_a.text(), child_b.text()) {
            if ta != tb {
                let common = ta.chars().zip(tb.chars()).take_while(|(x, y)| x == y).count();
                return Some(pos + common);
            }
        }
        if child_a.content().size() > 0 || child_b.content().size() > 0 {
            if let Some(inner) = find_diff_start(child_a.content(), child_b.content(), pos + 1) {
                return Some(inner);
            }
        }
        pos += child_a.node_size();
        i += 1;
    }
}

fn find_diff_end(a: &Fragment, b: &Fragment, mut pos_a: usize, mut pos_b: usize) -> Option<(usize, usize)> {
    let (mut i_a, mut i_b) = (a.child_count(), b.child_count());
    loop {
        if i_a == 0 || i_b == 0 {
            return if i_a == i_b { None } else { Some((pos_a, pos_b)) };
        }
        i_a -= 1;
        i_b -= 1;
        let (child_a, child_b) = (a.child(i_a), b.child(i_b));
        let size = child_a.node_size();
        if child_a == child_b {
            pos_a -= size;
            pos_b -= size;
            continue;
        }
        if !child_a.same_markup(child_b) {
            return Some((pos_a, pos_b));
        }
        if let (Some(ta), Some(tb)) = (child_a.text(), child_b.text()) {
            if ta != tb {
                let (la, lb) = (child_a.text_len(), child_b.text_len());
                let common = ta
                    .chars()
                    .rev()
                    .zip(tb.chars().rev())
                    .take_while(|(x, y)| x == y)
                    .count()
                    .min(la.min(lb));
                return Some((pos_a - common, pos_b - common));
            }
        }
        if child_a.content().size() > 0 || child_b.content().size() > 0 {
            if let Some(inner) = find_diff_end(child_a.content(), child_b.content(), pos_a - 1, pos_b - 1) {
                return Some(inner);
            }
        }
        pos_a -= size;
        pos_b -= child_b.node_size();
    }
}
