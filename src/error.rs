//! Error types for loading artifacts and running predictions.

use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Failure to produce a [`crate::ModelHandle`] from the configured path.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no model artifact at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("model artifact at {} is not readable", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("model artifact at {} could not be decoded: {reason}", path.display())]
    Deserialization {
        path: PathBuf,
        #[source]
        reason: DecodeError,
    },

    #[error("failed to read model artifact at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    /// Sort a read failure into the loader's taxonomy.
    pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound { path },
            io::ErrorKind::PermissionDenied => LoadError::PermissionDenied { path },
            _ => LoadError::Io { path, source: err },
        }
    }

    pub fn decode(path: impl Into<PathBuf>, reason: DecodeError) -> Self {
        LoadError::Deserialization {
            path: path.into(),
            reason,
        }
    }
}

/// Why a byte buffer is not a valid artifact.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("artifact is empty")]
    Empty,

    #[error("header is truncated ({actual} of {expected} bytes)")]
    TruncatedHeader { expected: usize, actual: usize },

    #[error("not a fare model artifact (magic {found:02x?})")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported artifact version {found} (supported: {supported})")]
    UnsupportedVersion { found: u16, supported: u16 },

    #[error("payload length mismatch: header says {expected} bytes, found {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("payload checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("payload is not a fare model: {0}")]
    Payload(#[from] bincode::Error),

    #[error("model shape is invalid: {0}")]
    Shape(String),
}

impl DecodeError {
    pub fn shape(message: impl Into<String>) -> Self {
        DecodeError::Shape(message.into())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("departure date {departure} is before {as_of}")]
    DepartureInPast { departure: NaiveDate, as_of: NaiveDate },

    #[error("source and destination are both {0}")]
    SameCity(String),

    #[error("model produced a non-finite fare ({0})")]
    NonFinite(f64),
}
