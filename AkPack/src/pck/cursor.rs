//! Endian-aware binary cursor over a container
//!
//! The byte order of an AKPK package is decided once, before any
//! data-dependent read, and every later read goes through the same
//! [`BinaryCursor`]. Both implementations share [`EndianCursor`]; the byte
//! order type parameter carries the integer layout and the folder-name
//! character width.

use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};

use super::types::Endianness;
use crate::error::Result;

/// Byte orders an AKPK package can be stored in.
pub trait PckByteOrder: ByteOrder + Send + 'static {
    /// The matching [`Endianness`] value.
    const ENDIANNESS: Endianness;
    /// Zero bytes stored after every character of a folder name.
    const NAME_CHAR_PADDING: usize;
}

impl PckByteOrder for LittleEndian {
    const ENDIANNESS: Endianness = Endianness::Little;
    const NAME_CHAR_PADDING: usize = 1;
}

impl PckByteOrder for BigEndian {
    const ENDIANNESS: Endianness = Endianness::Big;
    const NAME_CHAR_PADDING: usize = 0;
}

/// Random-access reads used by the table readers.
pub trait BinaryCursor {
    /// Byte order this cursor decodes with.
    fn endianness(&self) -> Endianness;

    /// Current absolute position.
    fn position(&mut self) -> Result<u64>;

    /// Move to an absolute position.
    fn seek_to(&mut self, pos: u64) -> Result<()>;

    /// Move forward by `count` bytes.
    fn skip(&mut self, count: u64) -> Result<()>;

    /// Read one `u32` in the cursor's byte order.
    fn read_u32(&mut self) -> Result<u32>;

    /// Read a raw four-byte section tag (tags are never byte-swapped).
    fn read_tag(&mut self) -> Result<[u8; 4]>;

    /// Read a null-terminated folder name.
    ///
    /// Little-endian packages store each character followed by one padding
    /// byte; big-endian packages store characters tightly packed.
    fn read_name(&mut self) -> Result<String>;
}

/// [`BinaryCursor`] over any `Read + Seek` source.
pub struct EndianCursor<R, B> {
    inner: R,
    order: PhantomData<B>,
}

impl<R: Read + Seek, B: PckByteOrder> EndianCursor<R, B> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            order: PhantomData,
        }
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek, B: PckByteOrder> BinaryCursor for EndianCursor<R, B> {
    fn endianness(&self) -> Endianness {
        B::ENDIANNESS
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn skip(&mut self, count: u64) -> Result<()> {
        let count = i64::try_from(count).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "skip distance too large")
        })?;
        self.inner.seek(SeekFrom::Current(count))?;
        Ok(())
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(self.inner.read_u32::<B>()?)
    }

    fn read_tag(&mut self) -> Result<[u8; 4]> {
        let mut tag = [0u8; 4];
        self.inner.read_exact(&mut tag)?;
        Ok(tag)
    }

    fn read_name(&mut self) -> Result<String> {
        let mut name = String::new();
        loop {
            let byte = self.inner.read_u8()?;
            if byte == 0 {
                break;
            }
            name.push(char::from(byte));
            // Consumed with reads; a seek would drop a BufReader's buffer
            for _ in 0..B::NAME_CHAR_PADDING {
                self.inner.read_u8()?;
            }
        }
        Ok(name)
    }
}

/// Wrap `reader` in the cursor implementation for `endianness`.
pub fn open_cursor<'a, R>(reader: R, endianness: Endianness) -> Box<dyn BinaryCursor + 'a>
where
    R: Read + Seek + 'a,
{
    match endianness {
        Endianness::Little => Box::new(EndianCursor::<R, LittleEndian>::new(reader)),
        Endianness::Big => Box::new(EndianCursor::<R, BigEndian>::new(reader)),
    }
}

/// Scoped positional detour.
///
/// Records the cursor position, seeks elsewhere, and puts the cursor back
/// when the guard is restored or dropped. Dropping covers early returns
/// through `?`; [`Detour::restore`] is the success path and reports a failed
/// seek back.
pub struct Detour<'c, C: BinaryCursor + ?Sized> {
    cursor: &'c mut C,
    saved: u64,
    restored: bool,
}

impl<'c, C: BinaryCursor + ?Sized> Detour<'c, C> {
    /// Save the current position and seek to `target`.
    pub fn to(cursor: &'c mut C, target: u64) -> Result<Self> {
        let saved = cursor.position()?;
        let mut detour = Self {
            cursor,
            saved,
            restored: false,
        };
        detour.cursor.seek_to(target)?;
        Ok(detour)
    }

    /// Position the cursor will return to.
    pub fn saved_position(&self) -> u64 {
        self.saved
    }

    /// Seek back to the saved position.
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.cursor.seek_to(self.saved)
    }
}

impl<C: BinaryCursor + ?Sized> Deref for Detour<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.cursor
    }
}

impl<C: BinaryCursor + ?Sized> DerefMut for Detour<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.cursor
    }
}

impl<C: BinaryCursor + ?Sized> Drop for Detour<'_, C> {
    fn drop(&mut self) {
        if !self.restored
            && let Err(e) = self.cursor.seek_to(self.saved)
        {
            tracing::warn!("Failed to restore cursor to {:#X}: {}", self.saved, e);
        }
    }
}
