//! Sequence diff — Myers O(ND) difference algorithm over arbitrary slices.
//!
//! The output is a list of `(PatchOpType, len)` chunks: runs of equal,
//! deleted (present only in `src`) or inserted (present only in `dst`)
//! elements. Both [`crate::str_diff`] (over `char`s) and the structural
//! array diff (over interned element ids) are built on it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOpType {
    Del = -1,
    Eql = 0,
    Ins = 1,
}

/// A run of `len` elements of one kind.
pub type Chunk = (PatchOpType, usize);

/// Diff `src` against `dst`.
///
/// Consecutive chunks of the same kind are merged, and every change hunk
/// (the chunks between two equal runs) is emitted as at most one deletion
/// followed by at most one insertion, with any common prefix or suffix of
/// the two sides factored out into the surrounding equal runs.
pub fn diff<T: PartialEq>(src: &[T], dst: &[T]) -> Vec<Chunk> {
    let mut raw = Vec::new();
    diff_into(src, dst, &mut raw);
    compact(src, dst, raw)
}

/// Count of elements taken from `src` by the chunks.
pub fn src_len(chunks: &[Chunk]) -> usize {
    chunks
        .iter()
        .filter(|(kind, _)| *kind != PatchOpType::Ins)
        .map(|(_, len)| len)
        .sum()
}

/// Count of elements taken from `dst` by the chunks.
pub fn dst_len(chunks: &[Chunk]) -> usize {
    chunks
        .iter()
        .filter(|(kind, _)| *kind != PatchOpType::Del)
        .map(|(_, len)| len)
        .sum()
}

// ── Internal helpers ──────────────────────────────────────────────────────

fn push(out: &mut Vec<Chunk>, kind: PatchOpType, len: usize) {
    if len == 0 {
        return;
    }
    match out.last_mut() {
        Some(last) if last.0 == kind => last.1 += len,
        _ => out.push((kind, len)),
    }
}

fn common_prefix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

fn find_slice<T: PartialEq>(haystack: &[T], needle: &[T]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ── Core diff algorithm ───────────────────────────────────────────────────

fn diff_into<T: PartialEq>(src: &[T], dst: &[T], out: &mut Vec<Chunk>) {
    let prefix = common_prefix(src, dst);
    push(out, PatchOpType::Eql, prefix);
    let (src, dst) = (&src[prefix..], &dst[prefix..]);

    let suffix = common_suffix(src, dst);
    let src_mid = &src[..src.len() - suffix];
    let dst_mid = &dst[..dst.len() - suffix];
    diff_middle(src_mid, dst_mid, out);
    push(out, PatchOpType::Eql, suffix);
}

/// Diff two slices that share no common prefix or suffix.
fn diff_middle<T: PartialEq>(src: &[T], dst: &[T], out: &mut Vec<Chunk>) {
    if src.is_empty() {
        push(out, PatchOpType::Ins, dst.len());
        return;
    }
    if dst.is_empty() {
        push(out, PatchOpType::Del, src.len());
        return;
    }

    // Shorter side embedded in the longer one.
    if src.len() > dst.len() {
        if let Some(idx) = find_slice(src, dst) {
            push(out, PatchOpType::Del, idx);
            push(out, PatchOpType::Eql, dst.len());
            push(out, PatchOpType::Del, src.len() - idx - dst.len());
            return;
        }
    } else if let Some(idx) = find_slice(dst, src) {
        push(out, PatchOpType::Ins, idx);
        push(out, PatchOpType::Eql, src.len());
        push(out, PatchOpType::Ins, dst.len() - idx - src.len());
        return;
    }

    if src.len().min(dst.len()) == 1 {
        push(out, PatchOpType::Del, src.len());
        push(out, PatchOpType::Ins, dst.len());
        return;
    }

    match middle_snake(src, dst) {
        Some((x, y)) if (x, y) != (0, 0) && (x, y) != (src.len(), dst.len()) => {
            diff_into(&src[..x], &dst[..y], out);
            diff_into(&src[x..], &dst[y..], out);
        }
        _ => {
            push(out, PatchOpType::Del, src.len());
            push(out, PatchOpType::Ins, dst.len());
        }
    }
}

/// Find the middle snake of the shortest edit path, walking forward from
/// the start and backward from the end until the two frontiers overlap.
fn middle_snake<T: PartialEq>(a: &[T], b: &[T]) -> Option<(usize, usize)> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max_d = (n + m + 1) / 2 + 1;
    let v_offset = max_d;
    let v_len = 2 * max_d;

    let mut v1 = vec![-1isize; v_len as usize];
    let mut v2 = vec![-1isize; v_len as usize];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;

    let delta = n - m;
    // With an odd delta the forward frontier detects the overlap,
    // otherwise the reverse one does.
    let front = delta % 2 != 0;

    let (mut k1_start, mut k1_end, mut k2_start, mut k2_end) = (0isize, 0isize, 0isize, 0isize);

    for d in 0..max_d {
        let mut k1 = -d + k1_start;
        while k1 <= d - k1_end {
            let k1_off = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_off - 1] < v1[k1_off + 1]) {
                v1[k1_off + 1]
            } else {
                v1[k1_off - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < n && y1 < m && a[x1 as usize] == b[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_off] = x1;
            if x1 > n {
                k1_end += 2;
            } else if y1 > m {
                k1_start += 2;
            } else if front {
                let k2_off = v_offset + delta - k1;
                if (0..v_len).contains(&k2_off) && v2[k2_off as usize] != -1 {
                    let x2 = n - v2[k2_off as usize];
                    if x1 >= x2 {
                        return Some((x1 as usize, y1 as usize));
                    }
                }
            }
            k1 += 2;
        }

        let mut k2 = -d + k2_start;
        while k2 <= d - k2_end {
            let k2_off = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_off - 1] < v2[k2_off + 1]) {
                v2[k2_off + 1]
            } else {
                v2[k2_off - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < n && y2 < m && a[(n - x2 - 1) as usize] == b[(m - y2 - 1) as usize] {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_off] = x2;
            if x2 > n {
                k2_end += 2;
            } else if y2 > m {
                k2_start += 2;
            } else if !front {
                let k1_off = v_offset + delta - k2;
                if (0..v_len).contains(&k1_off) && v1[k1_off as usize] != -1 {
                    let x1 = v1[k1_off as usize];
                    let y1 = v_offset + x1 - k1_off;
                    if x1 >= n - x2 {
                        return Some((x1 as usize, y1 as usize));
                    }
                }
            }
            k2 += 2;
        }
    }
    None
}

// ── Compaction ────────────────────────────────────────────────────────────

/// Regroup raw chunks into `Eql (Del? Ins?)*` form, sliding any common
/// edges of a hunk's deleted and inserted runs into the equal runs.
fn compact<T: PartialEq>(src: &[T], dst: &[T], raw: Vec<Chunk>) -> Vec<Chunk> {
    let mut out = Vec::with_capacity(raw.len());
    let (mut si, mut di) = (0usize, 0usize);
    let (mut del, mut ins) = (0usize, 0usize);

    let flush = |out: &mut Vec<Chunk>, si: usize, di: usize, del: usize, ins: usize| {
        let old = &src[si..si + del];
        let new = &dst[di..di + ins];
        let pfx = common_prefix(old, new);
        let sfx = common_suffix(&old[pfx..], &new[pfx..]);
        push(out, PatchOpType::Eql, pfx);
        push(out, PatchOpType::Del, del - pfx - sfx);
        push(out, PatchOpType::Ins, ins - pfx - sfx);
        push(out, PatchOpType::Eql, sfx);
    };

    for (kind, len) in raw {
        match kind {
            PatchOpType::Del => del += len,
            PatchOpType::Ins => ins += len,
            PatchOpType::Eql => {
                flush(&mut out, si, di, del, ins);
                si += del;
                di += ins;
                del = 0;
                ins = 0;
                push(&mut out, PatchOpType::Eql, len);
                si += len;
                di += len;
            }
        }
    }
    flush(&mut out, si, di, del, ins);
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn replay(src: &[char], dst: &[char], chunks: &[Chunk]) -> (String, String) {
        let (mut si, mut di) = (0, 0);
        let (mut a, mut b) = (String::new(), String::new());
        for (kind, len) in chunks {
            match kind {
                PatchOpType::Eql => {
                    assert_eq!(&src[si..si + len], &dst[di..di + len]);
                    a.extend(&src[si..si + len]);
                    b.extend(&dst[di..di + len]);
                    si += len;
                    di += len;
                }
                PatchOpType::Del => {
                    a.extend(&src[si..si + len]);
                    si += len;
                }
                PatchOpType::Ins => {
                    b.extend(&dst[di..di + len]);
                    di += len;
                }
            }
        }
        (a, b)
    }

    #[test]
    fn equal_inputs() {
        assert_eq!(diff(&chars("abc"), &chars("abc")), vec![(PatchOpType::Eql, 3)]);
        assert!(diff::<char>(&[], &[]).is_empty());
    }

    #[test]
    fn pure_insert_in_middle() {
        let out = diff(&chars("hello world"), &chars("hello brave world"));
        assert_eq!(
            out,
            vec![(PatchOpType::Eql, 6), (PatchOpType::Ins, 6), (PatchOpType::Eql, 5)]
        );
    }

    #[test]
    fn replacement_is_delete_then_insert() {
        let out = diff(&chars("abXd"), &chars("abYd"));
        assert_eq!(
            out,
            vec![
                (PatchOpType::Eql, 2),
                (PatchOpType::Del, 1),
                (PatchOpType::Ins, 1),
                (PatchOpType::Eql, 1)
            ]
        );
    }

    #[test]
    fn bisect_paths_reconstruct_both_sides() {
        let cases = [
            ("the quick brown fox", "the slow green fox"),
            ("kitten sitting", "sitting kitten"),
            ("abcdefgh", "hgfedcba"),
            ("xaxbxcx", "yaybycy"),
        ];
        for (a, b) in cases {
            let (ca, cb) = (chars(a), chars(b));
            let out = diff(&ca, &cb);
            assert_eq!(replay(&ca, &cb, &out), (a.to_string(), b.to_string()));
            assert_eq!(src_len(&out), ca.len());
            assert_eq!(dst_len(&out), cb.len());
        }
    }

    #[test]
    fn works_on_non_char_elements() {
        let out = diff(&[1, 2, 3, 4], &[1, 3, 4, 5]);
        assert_eq!(
            out,
            vec![
                (PatchOpType::Eql, 1),
                (PatchOpType::Del, 1),
                (PatchOpType::Eql, 2),
                (PatchOpType::Ins, 1)
            ]
        );
    }
}
