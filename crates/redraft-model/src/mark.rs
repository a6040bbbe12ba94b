use std::fmt;

use serde_json::{Map, Value};

use crate::schema::{Attrs, MarkType};

/// A mark: inline formatting attached to inline nodes.
///
/// Two marks are equal when their type and attributes are equal. Mark
/// sets are plain slices kept sorted by [`MarkType::rank`].
#[derive(Clone, PartialEq)]
pub struct Mark {
    mark_type: MarkType,
    attrs: Attrs,
}

impl Mark {
    pub(crate) fn new(mark_type: MarkType, attrs: Attrs) -> Self {
        Self { mark_type, attrs }
    }

    pub fn mark_type(&self) -> &MarkType {
        &self.mark_type
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Add this mark to `set`, keeping rank order. Marks it excludes are
    /// dropped; if a mark in the set excludes this one, the set is
    /// returned unchanged.
    pub fn add_to_set(&self, set: &[Mark]) -> Vec<Mark> {
        let mut copy: Option<Vec<Mark>> = None;
        let mut placed = false;
        for (i, other) in set.iter().enumerate() {
            if self == other {
                return set.to_vec();
            }
            if self.mark_type.excludes(&other.mark_type) {
                if copy.is_none() {
                    copy = Some(set[..i].to_vec());
                }
            } else if other.mark_type.excludes(&self.mark_type) {
                return set.to_vec();
            } else {
                let out = copy.get_or_insert_with(|| set[..i].to_vec());
                if !placed && other.mark_type.rank() > self.mark_type.rank() {
                    out.push(self.clone());
                    placed = true;
                }
                out.push(other.clone());
            }
        }
        let mut out = copy.unwrap_or_else(|| set.to_vec());
        if !placed {
            out.push(self.clone());
        }
        out
    }

    /// Remove this exact mark from `set`.
    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter().filter(|m| *m != self).cloned().collect()
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.contains(self)
    }

    /// Whether two mark sets hold the same marks.
    pub fn same_set(a: &[Mark], b: &[Mark]) -> bool {
        a == b
    }

    /// Sort arbitrary marks into a mark set.
    pub fn set_from(mut marks: Vec<Mark>) -> Vec<Mark> {
        marks.sort_by_key(|m| m.mark_type.rank());
        marks
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::String(self.mark_type.name().to_string()));
        if !self.attrs.is_empty() {
            obj.insert("attrs".into(), Value::Object(self.attrs.clone()));
        }
        Value::Object(obj)
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attrs.is_empty() {
            write!(f, "{}", self.mark_type.name())
        } else {
            write!(f, "{}{}", self.mark_type.name(), Value::Object(self.attrs.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;

    fn mark(schema: &Schema, name: &str) -> Mark {
        schema.mark(name, None).unwrap()
    }

    fn link(schema: &Schema, href: &str) -> Mark {
        let mut attrs = Map::new();
        attrs.insert("href".into(), json!(href));
        schema.mark("link", Some(&attrs)).unwrap()
    }

    #[test]
    fn add_keeps_rank_order() {
        let schema = Schema::basic();
        let (em, strong, code) = (mark(&schema, "em"), mark(&schema, "strong"), mark(&schema, "code"));
        let set = code.add_to_set(&[]);
        let set = em.add_to_set(&set);
        let set = strong.add_to_set(&set);
        assert_eq!(set, vec![em.clone(), strong.clone(), code.clone()]);
        assert_eq!(em.add_to_set(&set), set);
    }

    #[test]
    fn add_replaces_same_type() {
        let schema = Schema::basic();
        let a = link(&schema, "https://a");
        let b = link(&schema, "https://b");
        let em = mark(&schema, "em");
        let set = b.add_to_set(&[a, em.clone()]);
        assert_eq!(set, vec![b, em]);
    }

    #[test]
    fn remove_and_membership() {
        let schema = Schema::basic();
        let (em, strong) = (mark(&schema, "em"), mark(&schema, "strong"));
        let set = vec![em.clone(), strong.clone()];
        assert!(em.is_in_set(&set));
        assert_eq!(em.remove_from_set(&set), vec![strong.clone()]);
        assert!(Mark::same_set(&set, &Mark::set_from(vec![strong, em])));
    }

    #[test]
    fn json_omits_empty_attrs() {
        let schema = Schema::basic();
        assert_eq!(mark(&schema, "em").to_json(), json!({"type": "em"}));
        assert_eq!(
            link(&schema, "x").to_json(),
            json!({"type": "link", "attrs": {"href": "x", "title": null}})
        );
    }
}
