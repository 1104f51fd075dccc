use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::err::{DeserializationError, DeserializationResult};

pub trait ReadSeek: Read + Seek {
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }
}

impl<T: Read + Seek> ReadSeek for T {}

/// Position to report in an error raised while reading.
///
/// Only evaluated on the error path, so the happy path never pays for a `tell`.
#[inline]
fn failure_offset<T: ReadSeek + ?Sized>(stream: &mut T) -> u64 {
    stream.tell().unwrap_or(u64::MAX)
}

pub(crate) trait ReadExt: ReadSeek {
    #[inline]
    fn try_seek_abs_named(&mut self, offset: u64, region: &'static str) -> DeserializationResult<u64> {
        self.seek(SeekFrom::Start(offset))
            .map_err(|e| DeserializationError::FailedToSeek {
                region,
                offset,
                source: e,
            })
    }

    #[inline]
    fn try_u8_named(&mut self, region: &'static str) -> DeserializationResult<u8> {
        self.read_u8().map_err(|e| DeserializationError::FailedToRead {
            t: "u8",
            region,
            offset: failure_offset(self),
            source: e,
        })
    }

    #[inline]
    fn try_u16_named(&mut self, region: &'static str) -> DeserializationResult<u16> {
        self.read_u16::<LittleEndian>()
            .map_err(|e| DeserializationError::FailedToRead {
                t: "u16",
                region,
                offset: failure_offset(self),
                source: e,
            })
    }

    #[inline]
    fn try_u32_named(&mut self, region: &'static str) -> DeserializationResult<u32> {
        self.read_u32::<LittleEndian>()
            .map_err(|e| DeserializationError::FailedToRead {
                t: "u32",
                region,
                offset: failure_offset(self),
                source: e,
            })
    }

    #[inline]
    fn try_bytes_named<const N: usize>(&mut self, region: &'static str) -> DeserializationResult<[u8; N]> {
        let mut buf = [0_u8; N];
        self.read_exact(&mut buf)
            .map_err(|e| DeserializationError::FailedToRead {
                t: "bytes",
                region,
                offset: failure_offset(self),
                source: e,
            })?;
        Ok(buf)
    }

    /// Total length of the stream. The cursor is left where it was.
    fn try_stream_len_named(&mut self, region: &'static str) -> DeserializationResult<u64> {
        let current = self.tell().map_err(|e| DeserializationError::FailedToSeek {
            region,
            offset: 0,
            source: e,
        })?;
        let end = self
            .seek(SeekFrom::End(0))
            .map_err(|e| DeserializationError::FailedToSeek {
                region,
                offset: current,
                source: e,
            })?;
        self.try_seek_abs_named(current, region)?;
        Ok(end)
    }

    /// Fails with [`DeserializationError::Truncated`] unless `count` records of
    /// `record_size` bytes fit between the cursor and the end of the stream.
    fn ensure_available(
        &mut self,
        region: &'static str,
        count: u64,
        record_size: u64,
    ) -> DeserializationResult<()> {
        let len = self.try_stream_len_named(region)?;
        let offset = self.tell().map_err(|e| DeserializationError::FailedToSeek {
            region,
            offset: 0,
            source: e,
        })?;

        let have = len.saturating_sub(offset);
        let need = count.saturating_mul(record_size);
        if need > have {
            return Err(DeserializationError::Truncated {
                region,
                offset,
                need,
                have,
            });
        }
        Ok(())
    }

    /// Reads exactly `count` elements using `read_one`, after checking the stream holds them.
    fn try_read_counted_array<T, F>(
        &mut self,
        region: &'static str,
        count: u64,
        record_size: u64,
        mut read_one: F,
    ) -> DeserializationResult<Vec<T>>
    where
        Self: Sized,
        F: FnMut(&mut Self) -> DeserializationResult<T>,
    {
        self.ensure_available(region, count, record_size)?;

        // `ensure_available` bounded `count` by the stream length, so this cannot blow up.
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            out.push(read_one(self)?);
        }

        Ok(out)
    }

    #[inline]
    fn try_read_counted_u16_array(&mut self, region: &'static str, count: u64) -> DeserializationResult<Vec<u16>>
    where
        Self: Sized,
    {
        self.try_read_counted_array(region, count, 2, |s| s.try_u16_named(region))
    }

    #[inline]
    fn try_read_counted_u32_array(&mut self, region: &'static str, count: u64) -> DeserializationResult<Vec<u32>>
    where
        Self: Sized,
    {
        self.try_read_counted_array(region, count, 4, |s| s.try_u32_named(region))
    }
}

impl<T: ReadSeek + ?Sized> ReadExt for T {}
