use redraft_model::Node;
use redraft_transform::{Step, Transform};
use tracing::trace;

use crate::error::DiffError;
use crate::replace::minimal_replace_step;

/// Rebuild `tr` from its starting document, merging adjacent compatible
/// steps. Merged replace steps are recomputed as the minimal step between
/// the documents around the pair; a pair with no net effect disappears.
///
/// The kept steps form a stack: every step is offered to the one below it
/// until it no longer merges, so no two neighbours in the output merge.
pub(crate) fn compact(tr: &Transform) -> Result<Transform, DiffError> {
    let start = tr.before();
    // Each kept step with the document after it.
    let mut kept: Vec<(Step, Node)> = Vec::new();
    for step in tr.steps() {
        let mut incoming = Some(step.clone());
        while let Some(step) = incoming.take() {
            let top = kept.pop();
            let merged = top.as_ref().and_then(|(prev, _)| prev.merge(&step));
            match (top, merged) {
                (Some((prev, after_prev)), Some(merged)) => {
                    incoming = if prev.is_replace() && step.is_replace() {
                        let after = step.apply(&after_prev)?;
                        minimal_replace_step(doc_after(&kept, start), &after)
                    } else {
                        Some(merged)
                    };
                    if incoming.is_none() {
                        trace!(at = kept.len(), "merged steps cancel out");
                    }
                }
                (top, _) => {
                    kept.extend(top);
                    let after = step.apply(doc_after(&kept, start))?;
                    kept.push((step, after));
                }
            }
        }
    }

    let mut out = Transform::new(start.clone());
    for (step, _) in kept {
        out.step(step)?;
    }
    trace!(before = tr.steps().len(), after = out.steps().len(), "compacted steps");
    Ok(out)
}

fn doc_after<'a>(kept: &'a [(Step, Node)], start: &'a Node) -> &'a Node {
    kept.last().map_or(start, |(_, doc)| doc)
}
