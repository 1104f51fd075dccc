use thiserror::Error;

use crate::format::MAGIC_LEN;

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;
pub type DeserializationResult<T> = std::result::Result<T, DeserializationError>;
pub type SerializationResult<T> = std::result::Result<T, SerializationError>;

/// Errors related to reading a resource out of a byte stream.
///
/// Every variant carries the name of the region that was being read, so a failure
/// deep inside a multi-pass decode still points at the structure that broke it.
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("Offset {offset}: An I/O error has occurred while trying to read {t} ({region}): {source}")]
    FailedToRead {
        t: &'static str,
        region: &'static str,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Failed to seek to offset {offset} for {region}: {source}")]
    FailedToSeek {
        region: &'static str,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Offset {offset}: {region} is truncated (need {need} bytes, have {have})")]
    Truncated {
        region: &'static str,
        offset: u64,
        need: u64,
        have: u64,
    },

    #[error("An I/O error has occurred: {0}")]
    Io(#[from] io::Error),
}

impl DeserializationError {
    /// The region the decoder was working on, if the error is tied to one.
    pub fn region(&self) -> Option<&'static str> {
        match self {
            DeserializationError::FailedToRead { region, .. }
            | DeserializationError::FailedToSeek { region, .. }
            | DeserializationError::Truncated { region, .. } => Some(region),
            DeserializationError::Io(_) => None,
        }
    }
}

/// Errors related to rendering a decoded resource.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("`serde_json` failed with error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Writing output failed with: {0}")]
    Io(#[from] io::Error),
}

/// A magic pattern parsed from a string of the wrong length.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("magic patterns must be exactly {len} bytes, got {0}", len = MAGIC_LEN)]
pub struct InvalidMagicLength(pub usize);

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown resource format, no registered signature matches the stream")]
    UnrecognizedFormat,

    #[error("Failed to decode resource, caused by:\n\t {0}")]
    Deserialization(#[from] DeserializationError),

    #[error("Failed to open file {}: {source}", path.display())]
    FailedToOpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
