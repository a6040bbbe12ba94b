//! Turning a structural JSON patch into content steps.
//!
//! The patch queue is drained in batches: operations are replayed onto a
//! scratch copy of the working snapshot until the scratch document decodes
//! and validates against the schema. Each valid batch becomes one markup
//! step, a refined set of text steps, or one covering replace step.

use std::collections::VecDeque;

use redraft_model::{Mark, Node, Schema};
use redraft_patch::{apply_op, Op};
use redraft_transform::{Step, Transform};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::DiffError;
use crate::patch_gen::StructuralPatch;
use crate::replace::minimal_replace_step;
use crate::text_diff::{refine_text, TextDiffer};

/// Outcome of decoding a scratch document.
enum Validation {
    Valid(Node),
    Invalid,
}

fn validate(schema: &Schema, json: &Value) -> Validation {
    match schema.node_from_json(json) {
        Ok(doc) if doc.check().is_ok() => Validation::Valid(doc),
        _ => Validation::Invalid,
    }
}

/// The document as transformed so far, in both forms.
struct Snapshot {
    json: Value,
    doc: Node,
}

/// Operations whose combined result validates.
struct ValidBatch {
    ops: Vec<Op>,
    json: Value,
    doc: Node,
}

/// How a valid batch is turned into steps.
enum Emission {
    Markup,
    Text {
        pos: usize,
        old: String,
        new: String,
        marks: Vec<Mark>,
    },
    Replace,
}

pub(crate) struct ContentSynthesizer<'a> {
    schema: Schema,
    differ: &'a dyn TextDiffer,
    structural: bool,
    target_json: Value,
    target: Node,
    queue: VecDeque<Op>,
    snapshot: Snapshot,
    tr: Transform,
}

impl<'a> ContentSynthesizer<'a> {
    /// `tr` starts at the original document; `patch` is its (possibly
    /// mark-stripped) structural patch to the target.
    pub(crate) fn new(
        tr: Transform,
        patch: StructuralPatch,
        structural: bool,
        differ: &'a dyn TextDiffer,
    ) -> Result<Self, DiffError> {
        let schema = tr.doc().node_type().schema().clone();
        let doc = schema.node_from_json(&patch.source)?;
        let target = schema.node_from_json(&patch.target)?;
        Ok(Self {
            schema,
            differ,
            structural,
            target_json: patch.target,
            target,
            queue: patch.ops.into(),
            snapshot: Snapshot {
                json: patch.source,
                doc,
            },
            tr,
        })
    }

    pub(crate) fn run(mut self) -> Result<Transform, DiffError> {
        while let Some(batch) = self.next_batch()? {
            match self.plan(&batch) {
                Emission::Markup => {
                    if self.emit_markup() {
                        continue;
                    }
                    self.emit_replace(batch)?;
                }
                Emission::Text { pos, old, new, marks } => {
                    trace!(pos, "refining text change");
                    refine_text(&mut self.tr, &self.schema, &old, &new, &marks, pos, self.differ)?;
                    self.commit(batch);
                }
                Emission::Replace => self.emit_replace(batch)?,
            }
        }
        Ok(self.tr)
    }

    /// Pull operations until the scratch document validates.
    fn next_batch(&mut self) -> Result<Option<ValidBatch>, DiffError> {
        let Some(mut pending) = self.queue.pop_front() else {
            return Ok(None);
        };
        let mut json = self.snapshot.json.clone();
        let mut ops = Vec::new();
        loop {
            apply_op(&mut json, &pending)?;
            ops.push(pending);
            match validate(&self.schema, &json) {
                Validation::Valid(doc) => {
                    trace!(ops = ops.len(), "validated patch batch");
                    return Ok(Some(ValidBatch { ops, json, doc }));
                }
                Validation::Invalid => pending = self.queue.pop_front().ok_or(DiffError::NoValidDiff)?,
            }
        }
    }

    fn plan(&self, batch: &ValidBatch) -> Emission {
        let [op] = batch.ops.as_slice() else {
            return Emission::Replace;
        };
        if self.structural && (op.touches_key("attrs") || op.touches_key("type")) {
            return Emission::Markup;
        }
        let new = match op {
            Op::Replace { value: Value::String(text), .. } if op.last_key() == Some("text") => text,
            _ => return Emission::Replace,
        };
        match locate_text(&self.schema, &self.snapshot.json, op.path()) {
            Some((pos, old, marks)) => Emission::Text {
                pos,
                old,
                new: new.clone(),
                marks,
            },
            None => Emission::Replace,
        }
    }

    /// Change the markup of the first node differing from the target.
    /// Returns false when no such step applies.
    fn emit_markup(&mut self) -> bool {
        let current = &self.snapshot.doc;
        let Some(pos) = self.target.content().find_diff_start(current.content()) else {
            return false;
        };
        let (Some(old), Some(new)) = (current.node_at(pos), self.target.node_at(pos)) else {
            return false;
        };
        let node_type = (old.node_type() != new.node_type()).then(|| new.node_type().clone());
        let step = Step::set_node_markup(pos, node_type, new.attrs().clone(), new.marks().to_vec());
        if let Err(err) = self.tr.maybe_step(step) {
            debug!(pos, error = %err, "markup step rejected, covering with a replace");
            return false;
        }
        trace!(pos, node = new.type_name(), "markup step");
        let doc = self.tr.doc().strip_marks();
        let json = doc.to_json();
        self.queue = redraft_patch::diff(&json, &self.target_json).into();
        self.snapshot = Snapshot { json, doc };
        true
    }

    fn emit_replace(&mut self, batch: ValidBatch) -> Result<(), DiffError> {
        let Some(step) = minimal_replace_step(&self.snapshot.doc, &batch.doc) else {
            // Edits the schema normalizes away, like dropping a default attribute.
            trace!(ops = batch.ops.len(), "batch without effect");
            self.commit(batch);
            return Ok(());
        };
        if let Err(err) = self.tr.maybe_step(step) {
            debug!(error = %err, "covering replace step rejected");
            return Err(DiffError::NoValidStep);
        }
        trace!(ops = batch.ops.len(), "replace step");
        self.commit(batch);
        Ok(())
    }

    fn commit(&mut self, batch: ValidBatch) {
        self.snapshot = Snapshot {
            json: batch.json,
            doc: batch.doc,
        };
    }
}

/// Document position, text and marks of the text node a `.../text` path
/// points at in a serialized document.
fn locate_text(schema: &Schema, root: &Value, path: &[String]) -> Option<(usize, String, Vec<Mark>)> {
    let (last, parents) = path.split_last()?;
    if last != "text" || parents.is_empty() || parents.len() % 2 != 0 {
        return None;
    }
    let mut node = root;
    let mut content_start = 0;
    let mut node_start = 0;
    for pair in parents.chunks(2) {
        let [key, index] = pair else {
            return None;
        };
        if key != "content" {
            return None;
        }
        let index: usize = index.parse().ok()?;
        let children = node.get("content")?.as_array()?;
        let before = children
            .get(..index)?
            .iter()
            .map(|child| json_node_size(schema, child))
            .sum::<Option<usize>>()?;
        node = children.get(index)?;
        node_start = content_start + before;
        content_start = node_start + 1;
    }
    let text = node.get("text")?.as_str()?.to_string();
    let marks = match node.get("marks") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|m| schema.mark_from_json(m).ok())
            .collect::<Option<Vec<_>>>()?,
        _ => Vec::new(),
    };
    Some((node_start, text, marks))
}

fn json_node_size(schema: &Schema, node: &Value) -> Option<usize> {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        return Some(text.chars().count());
    }
    let node_type = schema.node_type(node.get("type")?.as_str()?)?;
    if node_type.is_leaf() {
        return Some(1);
    }
    let inner = match node.get("content") {
        Some(Value::Array(children)) => children
            .iter()
            .map(|child| json_node_size(schema, child))
            .sum::<Option<usize>>()?,
        _ => 0,
    };
    Some(inner + 2)
}
