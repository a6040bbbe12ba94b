//! Position mapping through steps.

const DEL_BEFORE: u8 = 1;
const DEL_AFTER: u8 = 2;
const DEL_ACROSS: u8 = 4;
const DEL_SIDE: u8 = 8;

/// Result of mapping a position, with information about deletions
/// around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    del_info: u8,
}

impl MapResult {
    /// The position's surrounding content (on the side it associates with)
    /// was deleted.
    pub fn deleted(&self) -> bool {
        self.del_info & DEL_SIDE > 0
    }

    pub fn deleted_before(&self) -> bool {
        self.del_info & (DEL_BEFORE | DEL_ACROSS) > 0
    }

    pub fn deleted_after(&self) -> bool {
        self.del_info & (DEL_AFTER | DEL_ACROSS) > 0
    }

    /// A range strictly around the position was deleted.
    pub fn deleted_across(&self) -> bool {
        self.del_info & DEL_ACROSS > 0
    }
}

/// The changed ranges of one step, as `(start, old_size, new_size)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<(usize, usize, usize)>,
    inverted: bool,
}

impl StepMap {
    pub fn new(ranges: Vec<(usize, usize, usize)>) -> Self {
        Self {
            ranges,
            inverted: false,
        }
    }

    /// A map that changes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[(usize, usize, usize)] {
        &self.ranges
    }

    pub fn invert(&self) -> StepMap {
        Self {
            ranges: self.ranges.clone(),
            inverted: !self.inverted,
        }
    }

    /// Map `pos`; `assoc` < 0 sticks to the content before it.
    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.map_inner(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: i8) -> MapResult {
        self.map_inner(pos, assoc)
    }

    fn sizes(&self, range: &(usize, usize, usize)) -> (usize, usize) {
        if self.inverted {
            (range.2, range.1)
        } else {
            (range.1, range.2)
        }
    }

    fn map_inner(&self, pos: usize, assoc: i8) -> MapResult {
        let mut diff: isize = 0;
        for range in &self.ranges {
            let start = if self.inverted {
                (range.0 as isize - diff) as usize
            } else {
                range.0
            };
            if start > pos {
                break;
            }
            let (old_size, new_size) = self.sizes(range);
            let end = start + old_size;
            if pos <= end {
                let side = if old_size == 0 {
                    assoc
                } else if pos == start {
                    -1
                } else if pos == end {
                    1
                } else {
                    assoc
                };
                let mapped = (start as isize + diff) as usize + if side < 0 { 0 } else { new_size };
                let mut del_info = if pos == start {
                    DEL_AFTER
                } else if pos == end {
                    DEL_BEFORE
                } else {
                    DEL_ACROSS
                };
                let sticks_to_edge = if assoc < 0 { pos == start } else { pos == end };
                if !sticks_to_edge {
                    del_info |= DEL_SIDE;
                }
                return MapResult {
                    pos: mapped,
                    del_info,
                };
            }
            diff += new_size as isize - old_size as isize;
        }
        MapResult {
            pos: (pos as isize + diff) as usize,
            del_info: 0,
        }
    }

    /// Call `f(old_start, old_end, new_start, new_end)` for each range.
    pub fn for_each<F: FnMut(usize, usize, usize, usize)>(&self, mut f: F) {
        let mut diff: isize = 0;
        for range in &self.ranges {
            let start = range.0;
            let (old_size, new_size) = self.sizes(range);
            let old_start = if self.inverted {
                (start as isize - diff) as usize
            } else {
                start
            };
            let new_start = (old_start as isize + diff) as usize;
            f(old_start, old_start + old_size, new_start, new_start + new_size);
            diff += new_size as isize - old_size as isize;
        }
    }
}

/// A sequence of step maps applied in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn append_map(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    /// The mapping through maps `from..` of this one.
    pub fn slice(&self, from: usize) -> Mapping {
        Mapping {
            maps: self.maps[from.min(self.maps.len())..].to_vec(),
        }
    }

    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.maps.iter().fold(pos, |pos, m| m.map(pos, assoc))
    }

    pub fn map_result(&self, pos: usize, assoc: i8) -> MapResult {
        let mut del_info = 0;
        let mut pos = pos;
        for map in &self.maps {
            let result = map.map_result(pos, assoc);
            del_info |= result.del_info;
            pos = result.pos;
        }
        MapResult { pos, del_info }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_shifts_positions() {
        let map = StepMap::new(vec![(2, 0, 4)]);
        assert_eq!(map.map(0, 1), 0);
        assert_eq!(map.map(2, -1), 2);
        assert_eq!(map.map(2, 1), 6);
        assert_eq!(map.map(5, 1), 9);
    }

    #[test]
    fn deletion_reports_deleted_positions() {
        let map = StepMap::new(vec![(2, 4, 0)]);
        let inside = map.map_result(4, 1);
        assert_eq!(inside.pos, 2);
        assert!(inside.deleted() && inside.deleted_across());
        let edge = map.map_result(2, -1);
        assert!(!edge.deleted());
        assert!(edge.deleted_after());
        assert_eq!(map.map(10, 1), 6);
    }

    #[test]
    fn inverted_map_undoes() {
        let map = StepMap::new(vec![(2, 1, 3)]);
        let back = map.invert();
        assert_eq!(back.map(map.map(8, 1), 1), 8);
        let mut ranges = Vec::new();
        back.for_each(|a, b, c, d| ranges.push((a, b, c, d)));
        assert_eq!(ranges, vec![(2, 5, 2, 3)]);
    }

    #[test]
    fn mapping_composes() {
        let mut mapping = Mapping::new();
        mapping.append_map(StepMap::new(vec![(0, 0, 2)]));
        mapping.append_map(StepMap::new(vec![(4, 2, 0)]));
        assert_eq!(mapping.map(1, 1), 3);
        assert_eq!(mapping.map(6, 1), 6);
        assert!(mapping.map_result(3, 1).deleted());
        assert_eq!(mapping.slice(1).map(1, 1), 1);
    }
}
