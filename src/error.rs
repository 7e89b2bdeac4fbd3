//! Error type shared by the weight readers and the engines.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {kind} weight file: {message}")]
    Parse { kind: &'static str, message: String },

    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    #[error("too many nodes: {got} (at most {max} supported)")]
    TooManyNodes { got: usize, max: usize },

    #[error("the weights give zero total mass to every DAG")]
    NoDag,
}

impl Error {
    pub(crate) fn parse(kind: &'static str, message: impl Into<String>) -> Self {
        Error::Parse {
            kind,
            message: message.into(),
        }
    }
}
