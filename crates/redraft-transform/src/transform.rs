use redraft_model::{Attrs, Fragment, Mark, MarkType, Node, NodeType, Slice};

use crate::map::Mapping;
use crate::step::{Step, StepError};

/// An accumulator of steps applied to a document.
///
/// Keeps the starting document, every intermediate document and the
/// combined position mapping.
#[derive(Debug, Clone)]
pub struct Transform {
    before: Node,
    doc: Node,
    steps: Vec<Step>,
    docs: Vec<Node>,
    mapping: Mapping,
}

impl Transform {
    pub fn new(doc: Node) -> Self {
        Self {
            before: doc.clone(),
            doc,
            steps: Vec::new(),
            docs: Vec::new(),
            mapping: Mapping::new(),
        }
    }

    /// The document before any step.
    pub fn before(&self) -> &Node {
        &self.before
    }

    /// The current document.
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The document each step was applied to.
    pub fn docs(&self) -> &[Node] {
        &self.docs
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Apply a step. On failure the transform is left untouched.
    pub fn step(&mut self, step: Step) -> Result<&mut Self, StepError> {
        self.maybe_step(step)?;
        Ok(self)
    }

    /// Apply a step, returning the error instead of chaining.
    pub fn maybe_step(&mut self, step: Step) -> Result<(), StepError> {
        let doc = step.apply(&self.doc)?;
        self.add_step(step, doc);
        Ok(())
    }

    fn add_step(&mut self, step: Step, doc: Node) {
        self.docs.push(std::mem::replace(&mut self.doc, doc));
        self.mapping.append_map(step.get_map());
        self.steps.push(step);
    }

    /// Steps that undo this transform, in application order.
    pub fn inverted_steps(&self) -> Result<Vec<Step>, StepError> {
        let mut out = Vec::with_capacity(self.steps.len());
        for (step, doc) in self.steps.iter().zip(&self.docs).rev() {
            out.push(step.invert(doc)?);
        }
        Ok(out)
    }

    pub fn replace(&mut self, from: usize, to: usize, slice: Slice) -> Result<&mut Self, StepError> {
        if from == to && slice.size() == 0 {
            return Ok(self);
        }
        self.step(Step::replace(from, to, slice))
    }

    pub fn replace_with(
        &mut self,
        from: usize,
        to: usize,
        content: impl Into<Fragment>,
    ) -> Result<&mut Self, StepError> {
        self.replace(from, to, Slice::closed(content.into()))
    }

    pub fn insert(&mut self, pos: usize, content: impl Into<Fragment>) -> Result<&mut Self, StepError> {
        self.replace_with(pos, pos, content)
    }

    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self, StepError> {
        self.replace(from, to, Slice::empty())
    }

    /// Add `mark` to the inline content in `from..to`, removing marks it
    /// excludes. Emits one step per contiguous run.
    pub fn add_mark(&mut self, from: usize, to: usize, mark: &Mark) -> Result<&mut Self, StepError> {
        let mut removed: Vec<(usize, usize, Mark)> = Vec::new();
        let mut added: Vec<(usize, usize)> = Vec::new();
        let mut removing: Option<usize> = None;
        self.doc.nodes_between(from, to, |node, pos, parent| {
            if !node.is_inline() {
                return true;
            }
            let marks = node.marks();
            if !mark.is_in_set(marks) && parent.node_type().allows_mark_type(mark.mark_type()) {
                let start = pos.max(from);
                let end = (pos + node.node_size()).min(to);
                let new_set = mark.add_to_set(marks);
                for m in marks {
                    if m.is_in_set(&new_set) {
                        continue;
                    }
                    match removing {
                        Some(i) if removed[i].1 == start && removed[i].2 == *m => removed[i].1 = end,
                        _ => {
                            removed.push((start, end, m.clone()));
                            removing = Some(removed.len() - 1);
                        }
                    }
                }
                match added.last_mut() {
                    Some(last) if last.1 == start => last.1 = end,
                    _ => added.push((start, end)),
                }
            }
            true
        });
        for (from, to, m) in removed {
            self.step(Step::remove_mark(from, to, m))?;
        }
        for (from, to) in added {
            self.step(Step::add_mark(from, to, mark.clone()))?;
        }
        Ok(self)
    }

    /// Remove `mark` from the inline content in `from..to`.
    pub fn remove_mark(&mut self, from: usize, to: usize, mark: &Mark) -> Result<&mut Self, StepError> {
        self.remove_marks_where(from, to, |marks| {
            if mark.is_in_set(marks) {
                vec![mark.clone()]
            } else {
                Vec::new()
            }
        })
    }

    /// Remove every mark of `mark_type` from the inline content in `from..to`.
    pub fn remove_mark_type(&mut self, from: usize, to: usize, mark_type: &MarkType) -> Result<&mut Self, StepError> {
        self.remove_marks_where(from, to, |marks| {
            marks.iter().filter(|m| m.mark_type() == mark_type).cloned().collect()
        })
    }

    fn remove_marks_where<F>(&mut self, from: usize, to: usize, mut select: F) -> Result<&mut Self, StepError>
    where
        F: FnMut(&[Mark]) -> Vec<Mark>,
    {
        struct Matched {
            mark: Mark,
            from: usize,
            to: usize,
            step: usize,
        }
        let mut matched: Vec<Matched> = Vec::new();
        let mut step = 0;
        self.doc.nodes_between(from, to, |node, pos, _| {
            if !node.is_inline() {
                return true;
            }
            step += 1;
            let end = (pos + node.node_size()).min(to);
            for mark in select(node.marks()) {
                match matched.iter_mut().rev().find(|m| m.step + 1 == step && m.mark == mark) {
                    Some(found) => {
                        found.to = end;
                        found.step = step;
                    }
                    None => matched.push(Matched {
                        mark,
                        from: pos.max(from),
                        to: end,
                        step,
                    }),
                }
            }
            true
        });
        for m in matched {
            self.step(Step::remove_mark(m.from, m.to, m.mark))?;
        }
        Ok(self)
    }

    /// Change the type, attributes or marks of the node at `pos`.
    pub fn set_node_markup(
        &mut self,
        pos: usize,
        node_type: Option<NodeType>,
        attrs: Attrs,
        marks: Vec<Mark>,
    ) -> Result<&mut Self, StepError> {
        self.step(Step::set_node_markup(pos, node_type, attrs, marks))
    }
}
