//! String diff at character granularity.
//!
//! All lengths are in Unicode scalar values (Rust `char`s), not bytes, which
//! matches how document positions count text.

pub use crate::myers::PatchOpType;
use crate::myers;

pub type PatchOperation = (PatchOpType, String);
pub type Patch = Vec<PatchOperation>;

/// Compute the diff between `src` and `dst`.
///
/// Equal runs are included so the patch reconstructs both strings.
pub fn diff(src: &str, dst: &str) -> Patch {
    let src_chars: Vec<char> = src.chars().collect();
    let dst_chars: Vec<char> = dst.chars().collect();
    let chunks = myers::diff(&src_chars, &dst_chars);

    let (mut si, mut di) = (0usize, 0usize);
    let mut patch = Vec::with_capacity(chunks.len());
    for (kind, len) in chunks {
        let text: String = match kind {
            PatchOpType::Eql | PatchOpType::Del => src_chars[si..si + len].iter().collect(),
            PatchOpType::Ins => dst_chars[di..di + len].iter().collect(),
        };
        if kind != PatchOpType::Ins {
            si += len;
        }
        if kind != PatchOpType::Del {
            di += len;
        }
        patch.push((kind, text));
    }
    patch
}

/// Merge consecutive operations of the same type; discard empty operations.
pub fn normalize(patch: Patch) -> Patch {
    let mut result: Patch = Vec::with_capacity(patch.len());
    for (op_type, text) in patch {
        if text.is_empty() {
            continue;
        }
        match result.last_mut() {
            Some(last) if last.0 == op_type => last.1.push_str(&text),
            _ => result.push((op_type, text)),
        }
    }
    result
}

/// Reconstruct the source string from a patch.
pub fn patch_src(patch: &Patch) -> String {
    patch
        .iter()
        .filter(|(op_type, _)| *op_type != PatchOpType::Ins)
        .map(|(_, text)| text.as_str())
        .collect()
}

/// Reconstruct the destination string from a patch.
pub fn patch_dst(patch: &Patch) -> String {
    patch
        .iter()
        .filter(|(op_type, _)| *op_type != PatchOpType::Del)
        .map(|(_, text)| text.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings() {
        assert_eq!(diff("hello", "hello"), vec![(PatchOpType::Eql, "hello".to_string())]);
    }

    #[test]
    fn empty_sides() {
        assert_eq!(diff("", "hello"), vec![(PatchOpType::Ins, "hello".to_string())]);
        assert_eq!(diff("hello", ""), vec![(PatchOpType::Del, "hello".to_string())]);
        assert!(diff("", "").is_empty());
    }

    #[test]
    fn single_char_append() {
        assert_eq!(
            diff("cat", "cats"),
            vec![(PatchOpType::Eql, "cat".to_string()), (PatchOpType::Ins, "s".to_string())]
        );
    }

    #[test]
    fn multibyte_text_counts_chars() {
        let p = diff("naïve café", "naïve cafés");
        assert_eq!(p.last(), Some(&(PatchOpType::Ins, "s".to_string())));
        assert_eq!(patch_dst(&p), "naïve cafés");
    }

    #[test]
    fn roundtrip_src_dst() {
        let s = "the quick brown fox";
        let d = "the slow green fox";
        let p = diff(s, d);
        assert_eq!(patch_src(&p), s);
        assert_eq!(patch_dst(&p), d);
    }

    #[test]
    fn normalize_merges_and_drops_empty() {
        let patch = vec![
            (PatchOpType::Eql, String::new()),
            (PatchOpType::Ins, "hello".to_string()),
            (PatchOpType::Ins, " world".to_string()),
        ];
        assert_eq!(normalize(patch), vec![(PatchOpType::Ins, "hello world".to_string())]);
    }
}
