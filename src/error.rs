//! Error types for the typed layer.

use serde::de::{Expected, Unexpected};
use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while mapping values to and from store commands.
///
/// `Shape` and `DuplicateKey` are raised before any remote command is
/// issued; `Store` passes a remote failure through verbatim.
#[derive(Debug, Error)]
pub enum Error {
    #[error("key {key:?} not found")]
    Missing { key: String },

    #[error("cannot parse {text:?} as {target}")]
    Parse { text: String, target: String },

    #[error("expected a {expected} value, found {actual}")]
    Shape {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("requested {requested} values, store returned {returned}")]
    Arity { requested: usize, returned: usize },

    #[error("duplicate storage key {key:?}")]
    DuplicateKey { key: String },

    #[error("JSON fallback error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Message(String),
}

impl Error {
    pub(crate) fn parse(text: impl Into<String>, target: impl Into<String>) -> Self {
        Error::Parse {
            text: text.into(),
            target: target.into(),
        }
    }

    pub(crate) fn shape(expected: &'static str, actual: &'static str) -> Self {
        Error::Shape { expected, actual }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }

    // Text that fails to decode keeps its structure instead of collapsing
    // into `Message`, so callers can still match on `Parse`.
    fn invalid_value(unexp: Unexpected, exp: &dyn Expected) -> Self {
        match unexp {
            Unexpected::Str(text) => Error::Parse {
                text: text.to_owned(),
                target: exp.to_string(),
            },
            other => Error::Message(format!("invalid value: {other}, expected {exp}")),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
