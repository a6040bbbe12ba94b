//! Recreate the edit steps between two document snapshots.
//!
//! Given an old and a new version of a document, [`diff`] produces a
//! [`Transform`] of position-addressed steps that turns one into the other.
//! Every intermediate document it passes through is valid under the
//! schema, so the result can be applied, inverted and mapped like a
//! transaction recorded from a live editor.
//!
//! The work happens in phases: a structural JSON patch between the two
//! documents is replayed in schema-valid batches and turned into content
//! steps (with text changes refined to character or word edits), inline
//! marks are reconciled once content matches, and adjacent steps are
//! merged.
//!
//! [`compute_transform`] wraps [`diff`] with a coarse fallback for callers
//! that always need some transform.
//!
//! # Example
//!
//! ```
//! use redraft::{compute_transform, Schema, Step};
//! use serde_json::json;
//!
//! let schema = Schema::basic();
//! let a = schema
//!     .node_from_json(&json!({"type": "doc", "content": [
//!         {"type": "paragraph", "content": [{"type": "text", "text": "hello world"}]}
//!     ]}))
//!     .unwrap();
//! let b = schema
//!     .node_from_json(&json!({"type": "doc", "content": [
//!         {"type": "paragraph", "content": [{"type": "text", "text": "hello brave world"}]}
//!     ]}))
//!     .unwrap();
//!
//! let tr = compute_transform(&a, &b, |err| panic!("{err}"));
//! assert_eq!(tr.doc(), &b);
//! assert!(matches!(&tr.steps()[..], [Step::Replace(step)] if step.from == 7 && step.to == 7));
//! ```

mod compact;
mod error;
mod marks;
mod options;
mod patch_gen;
mod replace;
mod synthesize;
mod text_diff;

use tracing::{debug, error, warn};

pub use error::DiffError;
pub use marks::AlignedPair;
pub use options::{DiffOptions, Granularity};
pub use redraft_model::{Node, Schema};
pub use redraft_transform::{Step, Transform};
pub use replace::minimal_replace_step;
pub use text_diff::{CharDiff, TextChange, TextDiffer, WordDiff};

use crate::compact::compact;
use crate::marks::reconcile_marks;
use crate::patch_gen::structural_patch;
use crate::synthesize::ContentSynthesizer;

/// Compute the steps turning `from` into `to`.
///
/// Both documents must belong to the same schema. Fails without a partial
/// result when no schema-valid step sequence is found.
pub fn diff(from: &Node, to: &Node, options: &DiffOptions) -> Result<Transform, DiffError> {
    let structural = options.structural_steps;
    let differ = options.granularity.differ();
    let patch = structural_patch(from, to, structural);
    debug!(ops = patch.ops.len(), structural, "diffing documents");

    let mut tr = ContentSynthesizer::new(Transform::new(from.clone()), patch, structural, differ.as_ref())?.run()?;
    debug!(steps = tr.steps().len(), "content phase done");

    if structural {
        let pair = AlignedPair::new(tr.doc(), to)?;
        reconcile_marks(&mut tr, &pair)?;
        debug!(steps = tr.steps().len(), "mark phase done");
    }

    let tr = compact(&tr)?;
    debug!(steps = tr.steps().len(), "compaction done");
    if tr.doc() != to {
        return Err(DiffError::ResultMismatch);
    }
    Ok(tr)
}

/// [`diff`] with default options, falling back to replacing top-level
/// nodes when it fails.
///
/// `on_error` is called once with the failure before the fallback is
/// built. The fallback replaces each top-level child of `from` with the
/// child of `to` at the same index; when the child counts differ, or a
/// per-child replacement is rejected, the whole content is replaced in one
/// step. If even that is rejected an empty transform is returned.
pub fn compute_transform<F>(from: &Node, to: &Node, mut on_error: F) -> Transform
where
    F: FnMut(&DiffError),
{
    match diff(from, to, &DiffOptions::default()) {
        Ok(tr) => tr,
        Err(err) => {
            warn!(error = %err, "step recreation failed, replacing top-level nodes");
            on_error(&err);
            fallback(from, to)
        }
    }
}

fn fallback(from: &Node, to: &Node) -> Transform {
    if from.child_count() == to.child_count() {
        match replace_children(from, to) {
            Ok(tr) => return tr,
            Err(err) => debug!(error = %err, "per-child replacement rejected"),
        }
    }
    let mut tr = Transform::new(from.clone());
    if let Err(err) = tr.replace_with(0, from.content().size(), to.content().clone()) {
        error!(error = %err, "content replacement rejected");
        return Transform::new(from.clone());
    }
    tr
}

fn replace_children(from: &Node, to: &Node) -> Result<Transform, DiffError> {
    let mut tr = Transform::new(from.clone());
    let mut pos = 0;
    for (child, replacement) in from.content().iter().zip(to.content().iter()) {
        let start = tr.mapping().map(pos, 1);
        tr.replace_with(start, start + child.node_size(), replacement.clone())?;
        pos += child.node_size();
    }
    Ok(tr)
}
