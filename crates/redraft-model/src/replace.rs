//! Structural replace: substitute a range of a document with a slice,
//! joining open nodes on both sides and validating every node it touches.

use crate::error::{ModelResult, ReplaceError};
use crate::fragment::Fragment;
use crate::node::Node;
use crate::resolved_pos::ResolvedPos;
use crate::slice::Slice;

pub(crate) fn replace(from: &ResolvedPos, to: &ResolvedPos, slice: &Slice) -> ModelResult<Node> {
    if slice.open_start() > from.depth() {
        return Err(ReplaceError::TooDeep.into());
    }
    if from.depth() + slice.open_end() != to.depth() + slice.open_start() {
        return Err(ReplaceError::InconsistentDepths.into());
    }
    replace_outer(from, to, slice, 0)
}

fn replace_outer(from: &ResolvedPos, to: &ResolvedPos, slice: &Slice, depth: usize) -> ModelResult<Node> {
    let index = from.index(depth);
    let node = from.node(depth);
    if index == to.index(depth) && depth < from.depth() - slice.open_start() {
        let inner = replace_outer(from, to, slice, depth + 1)?;
        return Ok(node.copy(node.content().replace_child(index, inner)));
    }
    if slice.content().size() == 0 {
        return close(node, replace_two_way(from, to, depth)?);
    }
    if slice.open_start() == 0 && slice.open_end() == 0 && from.depth() == depth && to.depth() == depth {
        let parent = from.parent();
        let content = parent.content();
        let joined = content
            .cut(0, from.parent_offset())
            .append(slice.content())
            .append(&content.cut(to.parent_offset(), content.size()));
        return close(parent, joined);
    }
    let (start, end) = prepare_slice_for_replace(slice, from)?;
    close(node, replace_three_way(from, &start, &end, to, depth)?)
}

fn check_join(main: &Node, sub: &Node) -> Result<(), ReplaceError> {
    if sub.node_type().compatible_content(main.node_type()) {
        Ok(())
    } else {
        Err(ReplaceError::CannotJoin {
            sub: sub.type_name().to_string(),
            main: main.type_name().to_string(),
        })
    }
}

fn joinable(before: &ResolvedPos, after: &ResolvedPos, depth: usize) -> Result<Node, ReplaceError> {
    let node = before.node(depth);
    check_join(node, after.node(depth))?;
    Ok(node.clone())
}

fn add_node(child: Node, target: &mut Vec<Node>) {
    if let Some(last) = target.last_mut() {
        if child.is_text() && child.same_markup(last) {
            let text = format!("{}{}", last.text().unwrap_or(""), child.text().unwrap_or(""));
            *last = child.with_text(text);
            return;
        }
    }
    target.push(child);
}

fn add_range(start: Option<&ResolvedPos>, end: Option<&ResolvedPos>, depth: usize, target: &mut Vec<Node>) {
    let Some(node) = end.or(start).map(|r| r.node(depth)) else {
        return;
    };
    let mut start_index = 0;
    let end_index = end.map_or(node.child_count(), |e| e.index(depth));
    if let Some(start) = start {
        start_index = start.index(depth);
        if start.depth() > depth {
            start_index += 1;
        } else if start.text_offset() > 0 {
            if let Some(after) = start.node_after() {
                add_node(after, target);
            }
            start_index += 1;
        }
    }
    for i in start_index..end_index {
        add_node(node.child(i).clone(), target);
    }
    if let Some(end) = end {
        if end.depth() == depth && end.text_offset() > 0 {
            if let Some(before) = end.node_before() {
                add_node(before, target);
            }
        }
    }
}

fn close(node: &Node, content: Fragment) -> ModelResult<Node> {
    if !node.node_type().valid_content(&content) {
        return Err(ReplaceError::InvalidContent(node.type_name().to_string()).into());
    }
    Ok(node.copy(content))
}

fn replace_three_way(
    from: &ResolvedPos,
    start: &ResolvedPos,
    end: &ResolvedPos,
    to: &ResolvedPos,
    depth: usize,
) -> ModelResult<Fragment> {
    let open_start = if from.depth() > depth {
        Some(joinable(from, start, depth + 1)?)
    } else {
        None
    };
    let open_end = if to.depth() > depth {
        Some(joinable(end, to, depth + 1)?)
    } else {
        None
    };

    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    match (&open_start, &open_end) {
        (Some(os), Some(oe)) if start.index(depth) == end.index(depth) => {
            check_join(os, oe)?;
            let inner = replace_three_way(from, start, end, to, depth + 1)?;
            add_node(close(os, inner)?, &mut content);
        }
        _ => {
            if let Some(os) = &open_start {
                add_node(close(os, replace_two_way(from, start, depth + 1)?)?, &mut content);
            }
            add_range(Some(start), Some(end), depth, &mut content);
            if let Some(oe) = &open_end {
                add_node(close(oe, replace_two_way(end, to, depth + 1)?)?, &mut content);
            }
        }
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_vec(content))
}

fn replace_two_way(from: &ResolvedPos, to: &ResolvedPos, depth: usize) -> ModelResult<Fragment> {
    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    if from.depth() > depth {
        let joined = joinable(from, to, depth + 1)?;
        add_node(close(&joined, replace_two_way(from, to, depth + 1)?)?, &mut content);
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_vec(content))
}

/// Wrap the slice in copies of the ancestors of `along` so that its open
/// sides can be resolved at the same depths as the replaced range.
fn prepare_slice_for_replace(slice: &Slice, along: &ResolvedPos) -> ModelResult<(ResolvedPos, ResolvedPos)> {
    let extra = along.depth() - slice.open_start();
    let parent = along.node(extra);
    let mut node = parent.copy(slice.content().clone());
    for i in (0..extra).rev() {
        node = along.node(i).copy(Fragment::from(node));
    }
    let start = node.resolve(slice.open_start() + extra)?;
    let end = node.resolve(node.content().size() - slice.open_end() - extra)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use crate::error::{ModelError, ReplaceError};
    use crate::schema::Schema;
    use crate::slice::Slice;
    use crate::test_util::*;
    use crate::Fragment;

    #[test]
    fn flat_insert() {
        let s = Schema::basic();
        let d = doc(&s, vec![p(&s, vec![txt(&s, "hello world")])]);
        let slice = Slice::closed(Fragment::from(txt(&s, "brave ")));
        let out = d.replace(7, 7, &slice).unwrap();
        assert_eq!(out, doc(&s, vec![p(&s, vec![txt(&s, "hello brave world")])]));
    }

    #[test]
    fn delete_across_paragraphs_joins() {
        let s = Schema::basic();
        let d = doc(&s, vec![p(&s, vec![txt(&s, "one")]), p(&s, vec![txt(&s, "two")])]);
        let out = d.replace(3, 7, &Slice::empty()).unwrap();
        assert_eq!(out, doc(&s, vec![p(&s, vec![txt(&s, "onwo")])]));
    }

    #[test]
    fn open_slice_splits_and_joins() {
        let s = Schema::basic();
        let d = doc(&s, vec![p(&s, vec![txt(&s, "abcd")])]);
        let src = doc(&s, vec![p(&s, vec![txt(&s, "xy")]), p(&s, vec![txt(&s, "zw")])]);
        let slice = src.slice(2, 6).unwrap();
        assert_eq!((slice.open_start(), slice.open_end()), (1, 1));
        let out = d.replace(3, 3, &slice).unwrap();
        assert_eq!(
            out,
            doc(&s, vec![p(&s, vec![txt(&s, "aby")]), p(&s, vec![txt(&s, "zcd")])])
        );
    }

    #[test]
    fn replacing_whole_blocks() {
        let s = Schema::basic();
        let d = doc(&s, vec![p(&s, vec![txt(&s, "a")]), hr(&s)]);
        let slice = Slice::closed(Fragment::from(h(&s, 2, vec![txt(&s, "b")])));
        let out = d.replace(3, 4, &slice).unwrap();
        assert_eq!(out, doc(&s, vec![p(&s, vec![txt(&s, "a")]), h(&s, 2, vec![txt(&s, "b")])]));
    }

    #[test]
    fn invalid_results_are_rejected() {
        let s = Schema::basic();
        let d = doc(&s, vec![p(&s, vec![txt(&s, "a")])]);
        let err = d.replace(0, 3, &Slice::empty()).unwrap_err();
        assert_eq!(err, ModelError::Replace(ReplaceError::InvalidContent("doc".into())));

        let slice = Slice::closed(Fragment::from(p(&s, vec![])));
        assert!(d.replace(1, 1, &slice).is_err());
    }

    #[test]
    fn depth_checks() {
        let s = Schema::basic();
        let d = doc(&s, vec![p(&s, vec![txt(&s, "a")])]);
        let deep = Slice::new(Fragment::from(p(&s, vec![txt(&s, "x")])), 1, 0);
        assert_eq!(
            d.replace(0, 0, &deep).unwrap_err(),
            ModelError::Replace(ReplaceError::TooDeep)
        );
        let uneven = Slice::new(Fragment::from(p(&s, vec![txt(&s, "x")])), 1, 0);
        assert_eq!(
            d.replace(1, 2, &uneven).unwrap_err(),
            ModelError::Replace(ReplaceError::InconsistentDepths)
        );
    }
}
