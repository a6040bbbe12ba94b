//! Core types for the JSON Patch module.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::pointer::{format_json_pointer, parse_json_pointer};

/// A path into a JSON value: one component per object key or array index.
pub type Path = Vec<String>;

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("INVALID_INDEX: {0}")]
    InvalidIndex(String),
    #[error("INVALID_TARGET: {0}")]
    InvalidTarget(String),
    #[error("INVALID_OP: {0}")]
    InvalidOp(String),
}

// ── Op enum ───────────────────────────────────────────────────────────────

/// A structural JSON Patch operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Add { path: Path, value: Value },
    Remove { path: Path },
    Replace { path: Path, value: Value },
}

impl Op {
    /// The RFC 6902 operation name.
    pub fn op_name(&self) -> &'static str {
        match self {
            Op::Add { .. } => "add",
            Op::Remove { .. } => "remove",
            Op::Replace { .. } => "replace",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Op::Add { path, .. } | Op::Remove { path } | Op::Replace { path, .. } => path,
        }
    }

    /// The value carried by `add` and `replace`.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Op::Add { value, .. } | Op::Replace { value, .. } => Some(value),
            Op::Remove { .. } => None,
        }
    }

    /// The last path component, if the op does not target the root.
    pub fn last_key(&self) -> Option<&str> {
        self.path().last().map(String::as_str)
    }

    /// Whether any component of the path equals `key`.
    pub fn touches_key(&self, key: &str) -> bool {
        self.path().iter().any(|part| part == key)
    }

    pub fn is_replace(&self) -> bool {
        matches!(self, Op::Replace { .. })
    }

    /// Serialize to the RFC 6902 object form.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("op".into(), Value::String(self.op_name().into()));
        obj.insert("path".into(), Value::String(format_json_pointer(self.path())));
        if let Some(value) = self.value() {
            obj.insert("value".into(), value.clone());
        }
        Value::Object(obj)
    }

    /// Parse the RFC 6902 object form.
    pub fn from_json(value: &Value) -> Result<Op, PatchError> {
        let obj = value
            .as_object()
            .ok_or_else(|| PatchError::InvalidOp("operation must be an object".into()))?;
        let path = obj
            .get("path")
            .and_then(Value::as_str)
            .map(parse_json_pointer)
            .ok_or_else(|| PatchError::InvalidOp("missing path".into()))?;
        let take_value = || {
            obj.get("value")
                .cloned()
                .ok_or_else(|| PatchError::InvalidOp("missing value".into()))
        };
        match obj.get("op").and_then(Value::as_str) {
            Some("add") => Ok(Op::Add { path, value: take_value()? }),
            Some("remove") => Ok(Op::Remove { path }),
            Some("replace") => Ok(Op::Replace { path, value: take_value()? }),
            Some(other) => Err(PatchError::InvalidOp(format!("unsupported op: {other}"))),
            None => Err(PatchError::InvalidOp("missing op".into())),
        }
    }
}

/// Serialize a whole patch into a JSON array.
pub fn to_json_patch(ops: &[Op]) -> Value {
    Value::Array(ops.iter().map(Op::to_json).collect())
}

/// Parse a JSON array of operations.
pub fn from_json_patch(value: &Value) -> Result<Vec<Op>, PatchError> {
    value
        .as_array()
        .ok_or_else(|| PatchError::InvalidOp("patch must be an array".into()))?
        .iter()
        .map(Op::from_json)
        .collect()
}
