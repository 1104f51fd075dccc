//! Format registry: maps a stream's leading signature to the decoder that handles it.
//!
//! Formats are registered with an 8-byte magic pattern in which `?` matches any
//! byte. Dispatch is a linear scan in registration order, so when two patterns
//! overlap the one registered first wins.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::str::FromStr;

use log::{debug, trace};

use crate::err::{DeserializationResult, Error, InvalidMagicLength, Result, SerializationResult};
use crate::settings::ParserSettings;
use crate::utils::ReadSeek;
use crate::wed;

pub const MAGIC_LEN: usize = 8;

/// Byte in a [`Magic`] pattern that matches anything.
pub const WILDCARD: u8 = b'?';

/// An 8-byte signature pattern.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Magic([u8; MAGIC_LEN]);

impl Magic {
    pub const fn new(pattern: &[u8; MAGIC_LEN]) -> Magic {
        Magic(*pattern)
    }

    pub fn matches(&self, leading: &[u8; MAGIC_LEN]) -> bool {
        self.0
            .iter()
            .zip(leading.iter())
            .all(|(&p, &b)| p == WILDCARD || p == b)
    }
}

impl fmt::Debug for Magic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Magic({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl FromStr for Magic {
    type Err = InvalidMagicLength;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let pattern: [u8; MAGIC_LEN] = s
            .as_bytes()
            .try_into()
            .map_err(|_| InvalidMagicLength(s.len()))?;
        Ok(Magic(pattern))
    }
}

/// A decoded resource, ready to be exported.
pub trait Resource: fmt::Debug + Send {
    /// Name of the format this resource was decoded as.
    fn format_name(&self) -> &'static str;

    fn to_json_value(&self) -> SerializationResult<serde_json::Value>;

    /// Renders the whole resource as JSON into `writer`, followed by a newline.
    fn write_json(&self, writer: &mut dyn Write, settings: &ParserSettings) -> SerializationResult<()>;
}

pub type DecodeFn = fn(&mut dyn ReadSeek) -> DeserializationResult<Box<dyn Resource>>;

#[derive(Clone)]
pub struct RegisteredFormat {
    name: String,
    magic: Magic,
    decode: DecodeFn,
}

impl RegisteredFormat {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn magic(&self) -> &Magic {
        &self.magic
    }

    pub fn decode(&self, stream: &mut dyn ReadSeek) -> DeserializationResult<Box<dyn Resource>> {
        (self.decode)(stream)
    }
}

impl fmt::Debug for RegisteredFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RegisteredFormat")
            .field("name", &self.name)
            .field("magic", &self.magic)
            .finish()
    }
}

/// Ordered, append-only table of known formats.
///
/// Build it once (usually with [`FormatRegistry::with_builtin_formats`]) and
/// share it by reference; it is never mutated by [`FormatRegistry::open`].
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: Vec<RegisteredFormat>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        FormatRegistry::default()
    }

    /// A registry with every decoder shipped by this crate.
    pub fn with_builtin_formats() -> Self {
        let mut registry = FormatRegistry::new();
        registry.register_format(wed::FORMAT_NAME, wed::WED_MAGIC, wed::decode_wed);
        registry
    }

    /// Appends a format. Duplicates are kept; earlier entries take priority.
    pub fn register_format(&mut self, name: impl Into<String>, magic: Magic, decode: DecodeFn) {
        let name = name.into();
        debug!("Registering format `{}` with magic {:?}", name, magic);
        self.formats.push(RegisteredFormat {
            name,
            magic,
            decode,
        });
    }

    pub fn formats(&self) -> impl Iterator<Item = &RegisteredFormat> {
        self.formats.iter()
    }

    /// Peeks at the first 8 bytes from the current position and returns the
    /// first matching format.
    ///
    /// The stream position is restored whatever the outcome. A stream too short
    /// to peek, or any I/O failure, is reported as no match.
    pub fn sniff(&self, stream: &mut dyn ReadSeek) -> Option<&RegisteredFormat> {
        let start = match stream.tell() {
            Ok(position) => position,
            Err(e) => {
                debug!("Failed to get stream position while sniffing: {}", e);
                return None;
            }
        };

        let mut leading = [0_u8; MAGIC_LEN];
        let peeked = stream.read_exact(&mut leading);

        if let Err(e) = stream.seek(SeekFrom::Start(start)) {
            debug!("Failed to restore stream position {} after sniffing: {}", start, e);
            return None;
        }

        if let Err(e) = peeked {
            debug!("Failed to peek {} signature bytes: {}", MAGIC_LEN, e);
            return None;
        }

        let found = self.formats.iter().find(|f| f.magic.matches(&leading));
        trace!(
            "Sniffed {:?} -> {:?}",
            String::from_utf8_lossy(&leading),
            found.map(|f| f.name())
        );
        found
    }

    /// Sniffs the stream and hands it to the matching decoder.
    pub fn open(&self, stream: &mut dyn ReadSeek) -> Result<Box<dyn Resource>> {
        let format = self.sniff(stream).ok_or(Error::UnrecognizedFormat)?;
        debug!("Decoding stream as `{}`", format.name());
        Ok(format.decode(stream)?)
    }

    /// Opens the file at `path` and decodes it with [`FormatRegistry::open`].
    pub fn open_path(&self, path: impl AsRef<Path>) -> Result<Box<dyn Resource>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::FailedToOpenFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!("Opened `{}`", path.display());
        self.open(&mut BufReader::new(file))
    }
}
