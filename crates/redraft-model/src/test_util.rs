//! Shorthand builders for basic-schema documents in unit tests.

use serde_json::{json, Map};

use crate::{Fragment, Node, Schema};

pub fn doc(s: &Schema, children: Vec<Node>) -> Node {
    s.node("doc", None, Fragment::from(children), vec![]).unwrap()
}

pub fn p(s: &Schema, children: Vec<Node>) -> Node {
    s.node("paragraph", None, Fragment::from(children), vec![]).unwrap()
}

pub fn h(s: &Schema, level: u64, children: Vec<Node>) -> Node {
    let mut attrs = Map::new();
    attrs.insert("level".into(), json!(level));
    s.node("heading", Some(&attrs), Fragment::from(children), vec![]).unwrap()
}

pub fn bq(s: &Schema, children: Vec<Node>) -> Node {
    s.node("blockquote", None, Fragment::from(children), vec![]).unwrap()
}

pub fn hr(s: &Schema) -> Node {
    s.node("horizontal_rule", None, Fragment::empty(), vec![]).unwrap()
}

pub fn txt(s: &Schema, text: &str) -> Node {
    s.text(text, vec![]).unwrap()
}
