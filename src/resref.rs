use std::borrow::Cow;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

use crate::err::DeserializationResult;
use crate::utils::{ReadExt, ReadSeek};

pub const RESREF_LEN: usize = 8;

/// A reference to another game resource, stored as 8 nul-padded bytes.
///
/// Only the bytes before the first nul are meaningful; anything after it is
/// ignored for comparison and display.
#[derive(Clone, Copy, Default)]
pub struct ResRef {
    raw: [u8; RESREF_LEN],
}

impl ResRef {
    pub fn new(raw: [u8; RESREF_LEN]) -> ResRef {
        ResRef { raw }
    }

    pub fn from_stream<T: ReadSeek>(stream: &mut T, region: &'static str) -> DeserializationResult<ResRef> {
        Ok(ResRef::new(stream.try_bytes_named::<RESREF_LEN>(region)?))
    }

    /// The significant bytes, up to (not including) the first nul.
    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .raw
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(RESREF_LEN);
        &self.raw[..end]
    }

    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name_bytes())
    }

    pub fn raw(&self) -> &[u8; RESREF_LEN] {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.name_bytes().is_empty()
    }
}

impl From<&str> for ResRef {
    /// Truncates to 8 bytes and nul-pads shorter names.
    fn from(name: &str) -> Self {
        let mut raw = [0_u8; RESREF_LEN];
        let len = name.len().min(RESREF_LEN);
        raw[..len].copy_from_slice(&name.as_bytes()[..len]);
        ResRef { raw }
    }
}

impl PartialEq for ResRef {
    fn eq(&self, other: &Self) -> bool {
        self.name_bytes() == other.name_bytes()
    }
}

impl Eq for ResRef {}

impl Hash for ResRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name_bytes().hash(state)
    }
}

impl Display for ResRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Debug for ResRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ResRef({:?})", self.as_str())
    }
}

impl Serialize for ResRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}
