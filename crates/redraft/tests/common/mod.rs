#![allow(dead_code)]

use redraft::{Node, Schema};
use redraft_model::{MarkSpec, NodeSpec, SchemaSpec};
use serde_json::{json, Value};

/// Paragraphs carry a `level` attribute so markup changes can be tested
/// without changing node types.
pub fn schema() -> Schema {
    Schema::new(
        SchemaSpec::new()
            .node("doc", NodeSpec::new("block+"))
            .node("paragraph", NodeSpec::new("inline*").group("block").attr("level", json!(1)))
            .node("blockquote", NodeSpec::new("block+").group("block"))
            .node("horizontal_rule", NodeSpec::new("").group("block"))
            .node("text", NodeSpec::new("").group("inline"))
            .node(
                "image",
                NodeSpec::new("").group("inline").inline().required_attr("src"),
            )
            .mark("em", MarkSpec::new())
            .mark("strong", MarkSpec::new())
            .mark("link", MarkSpec::new().required_attr("href").inclusive(false)),
    )
    .unwrap()
}

/// Decode and check a document.
pub fn doc(schema: &Schema, value: Value) -> Node {
    let node = schema.node_from_json(&value).unwrap();
    node.check().unwrap();
    node
}

pub fn text(text: &str) -> Value {
    json!({"type": "text", "text": text})
}

pub fn marked(text: &str, marks: &[&str]) -> Value {
    let marks: Vec<Value> = marks.iter().map(|m| json!({"type": m})).collect();
    json!({"type": "text", "text": text, "marks": marks})
}

pub fn paragraph(content: Vec<Value>) -> Value {
    leveled(1, content)
}

pub fn leveled(level: u64, content: Vec<Value>) -> Value {
    if content.is_empty() {
        json!({"type": "paragraph", "attrs": {"level": level}})
    } else {
        json!({"type": "paragraph", "attrs": {"level": level}, "content": content})
    }
}

pub fn root(blocks: Vec<Value>) -> Value {
    json!({"type": "doc", "content": blocks})
}

/// Replay `steps` on `from` one by one.
pub fn replay(from: &Node, steps: &[redraft::Step]) -> Node {
    steps
        .iter()
        .fold(from.clone(), |doc, step| step.apply(&doc).unwrap())
}
