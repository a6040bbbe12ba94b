//! Edit steps: atomic, invertible document changes.

use redraft_model::{Attrs, Fragment, Mark, ModelError, Node, NodeType, Slice};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::map::{Mapping, StepMap};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StepError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("no node at position {0}")]
    NoNodeAt(usize),
    #[error("cannot set the markup of the text node at {0}")]
    TextNode(usize),
    #[error("markup change at {0} would turn a leaf into a non-leaf or back")]
    LeafChange(usize),
}

/// Replace `from..to` with a slice.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceStep {
    pub from: usize,
    pub to: usize,
    pub slice: Slice,
}

/// Add a mark to every inline node in `from..to` whose parent allows it.
#[derive(Debug, Clone, PartialEq)]
pub struct AddMarkStep {
    pub from: usize,
    pub to: usize,
    pub mark: Mark,
}

/// Remove a mark from every inline node in `from..to`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveMarkStep {
    pub from: usize,
    pub to: usize,
    pub mark: Mark,
}

/// Change the type, attributes and marks of the node starting at `pos`,
/// keeping its content. `node_type: None` keeps the current type.
#[derive(Debug, Clone, PartialEq)]
pub struct SetNodeMarkupStep {
    pub pos: usize,
    pub node_type: Option<NodeType>,
    pub attrs: Attrs,
    pub marks: Vec<Mark>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Replace(ReplaceStep),
    AddMark(AddMarkStep),
    RemoveMark(RemoveMarkStep),
    SetNodeMarkup(SetNodeMarkupStep),
}

impl Step {
    pub fn replace(from: usize, to: usize, slice: Slice) -> Step {
        Step::Replace(ReplaceStep { from, to, slice })
    }

    pub fn add_mark(from: usize, to: usize, mark: Mark) -> Step {
        Step::AddMark(AddMarkStep { from, to, mark })
    }

    pub fn remove_mark(from: usize, to: usize, mark: Mark) -> Step {
        Step::RemoveMark(RemoveMarkStep { from, to, mark })
    }

    pub fn set_node_markup(pos: usize, node_type: Option<NodeType>, attrs: Attrs, marks: Vec<Mark>) -> Step {
        Step::SetNodeMarkup(SetNodeMarkupStep {
            pos,
            node_type,
            attrs,
            marks,
        })
    }

    pub fn is_replace(&self) -> bool {
        matches!(self, Step::Replace(_))
    }

    pub fn is_mark_step(&self) -> bool {
        matches!(self, Step::AddMark(_) | Step::RemoveMark(_))
    }

    /// Apply to `doc`, producing the new document.
    pub fn apply(&self, doc: &Node) -> Result<Node, StepError> {
        match self {
            Step::Replace(s) => Ok(doc.replace(s.from, s.to, &s.slice)?),
            Step::AddMark(s) => {
                let mark = &s.mark;
                map_marked_range(doc, s.from, s.to, |node, parent| {
                    if !node.is_atom() || !parent.node_type().allows_mark_type(mark.mark_type()) {
                        return node.clone();
                    }
                    node.mark(mark.add_to_set(node.marks()))
                })
            }
            Step::RemoveMark(s) => map_marked_range(doc, s.from, s.to, |node, _| {
                node.mark(s.mark.remove_from_set(node.marks()))
            }),
            Step::SetNodeMarkup(s) => apply_markup(doc, s),
        }
    }

    /// The position changes this step makes.
    pub fn get_map(&self) -> StepMap {
        match self {
            Step::Replace(s) => StepMap::new(vec![(s.from, s.to - s.from, s.slice.size())]),
            _ => StepMap::empty(),
        }
    }

    /// The step that undoes this one, given the document it was applied to.
    pub fn invert(&self, doc: &Node) -> Result<Step, StepError> {
        Ok(match self {
            Step::Replace(s) => Step::replace(s.from, s.from + s.slice.size(), doc.slice(s.from, s.to)?),
            Step::AddMark(s) => Step::remove_mark(s.from, s.to, s.mark.clone()),
            Step::RemoveMark(s) => Step::add_mark(s.from, s.to, s.mark.clone()),
            Step::SetNodeMarkup(s) => {
                let node = doc.node_at(s.pos).ok_or(StepError::NoNodeAt(s.pos))?;
                Step::set_node_markup(
                    s.pos,
                    Some(node.node_type().clone()),
                    node.attrs().clone(),
                    node.marks().to_vec(),
                )
            }
        })
    }

    /// Map through `mapping`; `None` when the step's range was deleted.
    pub fn map(&self, mapping: &Mapping) -> Option<Step> {
        match self {
            Step::Replace(s) => {
                let from = mapping.map_result(s.from, 1);
                let to = mapping.map_result(s.to, -1);
                if from.deleted_across() && to.deleted_across() {
                    return None;
                }
                Some(Step::replace(from.pos, from.pos.max(to.pos), s.slice.clone()))
            }
            Step::AddMark(AddMarkStep { from, to, mark }) | Step::RemoveMark(RemoveMarkStep { from, to, mark }) => {
                let from = mapping.map_result(*from, 1);
                let to = mapping.map_result(*to, -1);
                if (from.deleted() && to.deleted()) || from.pos >= to.pos {
                    return None;
                }
                Some(match self {
                    Step::AddMark(_) => Step::add_mark(from.pos, to.pos, mark.clone()),
                    _ => Step::remove_mark(from.pos, to.pos, mark.clone()),
                })
            }
            Step::SetNodeMarkup(s) => {
                let pos = mapping.map_result(s.pos, 1);
                if pos.deleted_after() {
                    return None;
                }
                Some(Step::set_node_markup(pos.pos, s.node_type.clone(), s.attrs.clone(), s.marks.clone()))
            }
        }
    }

    /// Combine with a step applied directly after this one, when the two
    /// can be expressed as a single step.
    pub fn merge(&self, other: &Step) -> Option<Step> {
        match (self, other) {
            (Step::Replace(a), Step::Replace(b)) => merge_replace(a, b),
            (Step::AddMark(a), Step::AddMark(b)) if a.mark == b.mark && a.from <= b.to && a.to >= b.from => {
                Some(Step::add_mark(a.from.min(b.from), a.to.max(b.to), a.mark.clone()))
            }
            (Step::RemoveMark(a), Step::RemoveMark(b)) if a.mark == b.mark && a.from <= b.to && a.to >= b.from => {
                Some(Step::remove_mark(a.from.min(b.from), a.to.max(b.to), a.mark.clone()))
            }
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Step::Replace(s) => {
                let mut out = json!({"stepType": "replace", "from": s.from, "to": s.to});
                if s.slice.content().size() > 0 {
                    out["slice"] = s.slice.to_json();
                }
                out
            }
            Step::AddMark(s) => json!({"stepType": "addMark", "mark": s.mark.to_json(), "from": s.from, "to": s.to}),
            Step::RemoveMark(s) => {
                json!({"stepType": "removeMark", "mark": s.mark.to_json(), "from": s.from, "to": s.to})
            }
            Step::SetNodeMarkup(s) => {
                let mut out = Map::new();
                out.insert("stepType".into(), json!("setNodeMarkup"));
                out.insert("pos".into(), json!(s.pos));
                if let Some(t) = &s.node_type {
                    out.insert("type".into(), json!(t.name()));
                }
                out.insert("attrs".into(), Value::Object(s.attrs.clone()));
                if !s.marks.is_empty() {
                    out.insert("marks".into(), Value::Array(s.marks.iter().map(Mark::to_json).collect()));
                }
                Value::Object(out)
            }
        }
    }
}

fn merge_replace(a: &ReplaceStep, b: &ReplaceStep) -> Option<Step> {
    let joined_size = a.slice.size() + b.slice.size();
    if a.from + a.slice.size() == b.from && a.slice.open_end() == 0 && b.slice.open_start() == 0 {
        let slice = if joined_size == 0 {
            Slice::empty()
        } else {
            Slice::new(
                a.slice.content().append(b.slice.content()),
                a.slice.open_start(),
                b.slice.open_end(),
            )
        };
        return Some(Step::replace(a.from, a.to + (b.to - b.from), slice));
    }
    if b.to == a.from && a.slice.open_start() == 0 && b.slice.open_end() == 0 {
        let slice = if joined_size == 0 {
            Slice::empty()
        } else {
            Slice::new(
                b.slice.content().append(a.slice.content()),
                b.slice.open_start(),
                a.slice.open_end(),
            )
        };
        return Some(Step::replace(b.from, a.to, slice));
    }
    None
}

/// Rebuild `from..to` with `f` applied to every inline node in it.
fn map_marked_range<F>(doc: &Node, from: usize, to: usize, mut f: F) -> Result<Node, StepError>
where
    F: FnMut(&Node, &Node) -> Node,
{
    let old = doc.slice(from, to)?;
    let rfrom = doc.resolve(from)?;
    let parent = rfrom.node(rfrom.shared_depth(to)).clone();
    let content = map_fragment(old.content(), &mut f, &parent);
    let slice = Slice::new(content, old.open_start(), old.open_end());
    Ok(doc.replace(from, to, &slice)?)
}

fn map_fragment<F>(fragment: &Fragment, f: &mut F, parent: &Node) -> Fragment
where
    F: FnMut(&Node, &Node) -> Node,
{
    let mapped = fragment
        .iter()
        .map(|child| {
            let mut child = child.clone();
            if child.content().size() > 0 {
                child = child.copy(map_fragment(child.content(), f, &child));
            }
            if child.is_inline() {
                child = f(&child, parent);
            }
            child
        })
        .collect();
    Fragment::from_array(mapped)
}

fn apply_markup(doc: &Node, step: &SetNodeMarkupStep) -> Result<Node, StepError> {
    let node = doc.node_at(step.pos).ok_or(StepError::NoNodeAt(step.pos))?;
    if node.is_text() {
        return Err(StepError::TextNode(step.pos));
    }
    let node_type = step.node_type.clone().unwrap_or_else(|| node.node_type().clone());
    if node_type.is_leaf() != node.is_leaf() {
        return Err(StepError::LeafChange(step.pos));
    }
    node_type.check_content(node.content())?;
    let updated = node_type.create(Some(&step.attrs), node.content().clone(), step.marks.clone())?;
    Ok(doc.replace(
        step.pos,
        step.pos + node.node_size(),
        &Slice::closed(Fragment::from(updated)),
    )?)
}
