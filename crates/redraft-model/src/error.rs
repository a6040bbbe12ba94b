use thiserror::Error;

/// Errors raised while building schemas, decoding or checking documents.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),
    #[error("unknown mark type: {0}")]
    UnknownMarkType(String),
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("no value supplied for attribute {attr} of {owner}")]
    MissingAttr { owner: String, attr: String },
    #[error("empty text nodes are not allowed")]
    EmptyText,
    #[error("invalid content for node {0}")]
    InvalidContent(String),
    #[error("invalid marks on node {0}")]
    InvalidMarks(String),
    #[error("position {pos} out of range (size {size})")]
    PositionOutOfRange { pos: usize, size: usize },
    #[error("invalid range {from}..{to}")]
    InvalidRange { from: usize, to: usize },
    #[error(transparent)]
    Replace(#[from] ReplaceError),
}

/// Errors raised by the structural replace algorithm.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReplaceError {
    #[error("inserted content deeper than insertion position")]
    TooDeep,
    #[error("inconsistent open depths")]
    InconsistentDepths,
    #[error("cannot join {sub} onto {main}")]
    CannotJoin { sub: String, main: String },
    #[error("invalid content for node {0}")]
    InvalidContent(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
