use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for container decoding, document parsing, and file I/O.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("declared uncompressed size {expected} does not match actual size {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("payload of {size} bytes exceeds the 4 GiB container limit")]
    FileTooLarge { size: u64 },

    #[error("failed to decompress lz4 block: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),

    #[error("session payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("session document root is not a JSON object")]
    NotAMapping,

    #[error("no known session node key found in document root")]
    UnrecognizedDocument,

    #[error("not a {node} record - missing '{key}' key")]
    MissingKey {
        node: &'static str,
        key: &'static str,
    },

    #[error("failed to parse session JSON: {source}")]
    JsonParse {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize session JSON: {source}")]
    JsonSerialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("no path associated with this session")]
    PathNotSet,

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read profiles.ini at {path}: {source}")]
    Ini {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("no session store file found under {dir}")]
    NoSessionFile { dir: PathBuf },
}

impl SessionError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn missing_key(node: &'static str, key: &'static str) -> Self {
        Self::MissingKey { node, key }
    }
}
