//! JSON form of nodes and marks.
//!
//! ```json
//! {"type": "heading", "attrs": {"level": 2}, "content": [
//!   {"type": "text", "text": "Hi", "marks": [{"type": "em"}]}
//! ]}
//! ```

use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::node::Node;
use crate::schema::Schema;

fn invalid(msg: impl Into<String>) -> ModelError {
    ModelError::InvalidJson(msg.into())
}

impl Node {
    /// Serialize to the JSON form. `attrs` is present whenever the type
    /// declares attributes; `content` and `marks` only when non-empty.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::String(self.type_name().to_string()));
        if self.node_type().declares_attrs() {
            obj.insert("attrs".into(), Value::Object(self.attrs().clone()));
        }
        if self.content().size() > 0 {
            obj.insert("content".into(), self.content().to_json());
        }
        if !self.marks().is_empty() {
            obj.insert(
                "marks".into(),
                Value::Array(self.marks().iter().map(Mark::to_json).collect()),
            );
        }
        if let Some(text) = self.text() {
            obj.insert("text".into(), Value::String(text.to_string()));
        }
        Value::Object(obj)
    }
}

impl Schema {
    /// Decode a node from its JSON form. Content is not validated; call
    /// [`Node::check`] on the result for that.
    pub fn node_from_json(&self, value: &Value) -> ModelResult<Node> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid("node must be an object"))?;
        let type_name = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("node is missing its type"))?;
        let node_type = self.expect_node_type(type_name)?;

        let marks = match obj.get("marks") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|m| self.mark_from_json(m))
                .collect::<ModelResult<Vec<_>>>()?,
            Some(_) => return Err(invalid("marks must be an array")),
        };

        if node_type.is_text() {
            let text = obj
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid("text node is missing its text"))?;
            return self.text(text, marks);
        }

        let attrs = match obj.get("attrs") {
            None | Some(Value::Null) => None,
            Some(Value::Object(attrs)) => Some(attrs),
            Some(_) => return Err(invalid("attrs must be an object")),
        };
        let content = match obj.get("content") {
            None | Some(Value::Null) => Fragment::empty(),
            Some(Value::Array(items)) => Fragment::from_array(
                items
                    .iter()
                    .map(|c| self.node_from_json(c))
                    .collect::<ModelResult<Vec<_>>>()?,
            ),
            Some(_) => return Err(invalid("content must be an array")),
        };
        node_type.create(attrs, content, marks)
    }

    pub fn mark_from_json(&self, value: &Value) -> ModelResult<Mark> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid("mark must be an object"))?;
        let type_name = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("mark is missing its type"))?;
        let attrs = match obj.get("attrs") {
            None | Some(Value::Null) => None,
            Some(Value::Object(attrs)) => Some(attrs),
            Some(_) => return Err(invalid("attrs must be an object")),
        };
        self.mark(type_name, attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_encode_keeps_shape() {
        let schema = Schema::basic();
        let value = json!({"type": "doc", "content": [
            {"type": "heading", "attrs": {"level": 2}, "content": [
                {"type": "text", "text": "Hi ", "marks": [{"type": "em"}]},
                {"type": "text", "text": "there"}
            ]},
            {"type": "paragraph"},
            {"type": "horizontal_rule"}
        ]});
        let doc = schema.node_from_json(&value).unwrap();
        doc.check().unwrap();
        assert_eq!(doc.to_json(), value);
    }

    #[test]
    fn defaults_are_filled_and_unknown_attrs_dropped() {
        let schema = Schema::basic();
        let node = schema
            .node_from_json(&json!({"type": "heading", "attrs": {"bogus": 1}}))
            .unwrap();
        assert_eq!(node.to_json(), json!({"type": "heading", "attrs": {"level": 1}}));
    }

    #[test]
    fn adjacent_text_is_joined() {
        let schema = Schema::basic();
        let node = schema
            .node_from_json(&json!({"type": "paragraph", "content": [
                {"type": "text", "text": "a"}, {"type": "text", "text": "b"}
            ]}))
            .unwrap();
        assert_eq!(node.child_count(), 1);
        assert_eq!(node.text_content(), "ab");
    }

    #[test]
    fn decode_errors() {
        let schema = Schema::basic();
        assert!(matches!(
            schema.node_from_json(&json!({"type": "table"})),
            Err(ModelError::UnknownNodeType(_))
        ));
        assert!(matches!(
            schema.node_from_json(&json!({"type": "text", "text": ""})),
            Err(ModelError::EmptyText)
        ));
        assert!(matches!(
            schema.node_from_json(&json!({"type": "image"})),
            Err(ModelError::MissingAttr { .. })
        ));
        assert!(matches!(
            schema.node_from_json(&json!([1])),
            Err(ModelError::InvalidJson(_))
        ));
        assert!(matches!(
            schema.mark_from_json(&json!({"type": "underline"})),
            Err(ModelError::UnknownMarkType(_))
        ));
    }
}
