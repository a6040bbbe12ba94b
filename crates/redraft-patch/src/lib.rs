//! JSON Patch generation and application for document snapshots.
//!
//! Only the three structural RFC 6902 operations are supported
//! (`add`, `remove`, `replace`); that is all a structural document diff
//! ever needs.
//!
//! # Example
//!
//! ```
//! use redraft_patch::{apply_ops, diff};
//! use serde_json::json;
//!
//! let src = json!({"type": "doc", "content": [{"type": "text", "text": "cat"}]});
//! let dst = json!({"type": "doc", "content": [{"type": "text", "text": "cats"}]});
//!
//! let ops = diff(&src, &dst);
//! let mut doc = src.clone();
//! apply_ops(&mut doc, &ops).unwrap();
//! assert_eq!(doc, dst);
//! ```

pub mod apply;
pub mod diff;
pub mod myers;
pub mod pointer;
pub mod str_diff;
pub mod types;

pub use apply::{apply_op, apply_ops};
pub use diff::diff;
pub use pointer::{format_json_pointer, parse_json_pointer};
pub use types::{Op, PatchError, Path};
