//! Error taxonomy for the database codec

use std::path::PathBuf;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad magic in {path:?}: expected {expected:#010x}, got {got:#010x}")]
    MagicMismatch {
        path: PathBuf,
        expected: u32,
        got: u32,
    },

    #[error("missing {tag} tag file: expected {expected_path:?}")]
    MissingSibling {
        tag: &'static str,
        expected_path: PathBuf,
    },

    #[error("short read in {path:?}: expected {expected} bytes, got {got}")]
    ShortRead {
        path: PathBuf,
        expected: usize,
        got: usize,
    },

    #[error("record {record} still holds an unresolved {tag} reference")]
    UnresolvedReference { record: usize, tag: &'static str },

    #[error("unknown tag: {0}")]
    UnknownTag(String),

    #[error("undecodable {tag} payload ({len} bytes)")]
    DecodeError { tag: &'static str, len: usize },
}

impl DbError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DbError::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach a path to a low-level read failure.
    pub(crate) fn from_read(path: impl Into<PathBuf>, failure: super::io::ReadFailure) -> Self {
        match failure {
            super::io::ReadFailure::Io(source) => DbError::Io {
                path: path.into(),
                source,
            },
            super::io::ReadFailure::Short { expected, got } => DbError::ShortRead {
                path: path.into(),
                expected,
                got,
            },
        }
    }
}
