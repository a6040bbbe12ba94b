//! Immutable document trees for rich text.
//!
//! A [`Schema`] declares node and mark types; documents are trees of
//! [`Node`]s addressed by integer positions. Structural edits go through
//! [`Node::replace`], which only ever produces schema-valid trees.
//!
//! ```
//! use redraft_model::{Fragment, Schema, Slice};
//! use serde_json::json;
//!
//! let schema = Schema::basic();
//! let doc = schema
//!     .node_from_json(&json!({"type": "doc", "content": [
//!         {"type": "paragraph", "content": [{"type": "text", "text": "cat"}]}
//!     ]}))
//!     .unwrap();
//! let s = schema.text("s", vec![]).unwrap();
//! let doc = doc.replace(4, 4, &Slice::closed(Fragment::from(s))).unwrap();
//! assert_eq!(doc.text_content(), "cats");
//! ```

mod codec;
mod content;
pub mod error;
mod fragment;
mod mark;
mod node;
mod replace;
mod resolved_pos;
mod schema;
mod slice;

#[cfg(test)]
mod test_util;

pub use error::{ModelError, ModelResult, ReplaceError};
pub use fragment::Fragment;
pub use mark::Mark;
pub use node::Node;
pub use resolved_pos::ResolvedPos;
pub use schema::{AttrSpec, Attrs, MarkSpec, MarkType, NodeSpec, NodeType, Schema, SchemaSpec};
pub use slice::Slice;
