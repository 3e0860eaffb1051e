//! Bit-granular cursors over descriptor payloads.
//!
//! Fields are big-endian and packed in declaration order. Both cursors wrap
//! `bitstream_io` and add a sticky error flag: once an operation fails, every
//! later operation is a no-op (reads return zero) until [`BitReader::reset`]
//! is called. Bounds are checked before delegating, so a failed read never
//! moves the cursor. This lets a codec decode a whole entry as straight-line
//! code and check the flag once.

use std::fmt;

use bitstream_io::{BigEndian, BitRead, BitWrite};
use bytes::Bytes;

/// Read cursor over a borrowed byte buffer.
pub struct BitReader<'a> {
    data: &'a [u8],
    inner: bitstream_io::BitReader<&'a [u8], BigEndian>,
    /// Current position in bits.
    pos: usize,
    /// End of readable area in bits.
    end: usize,
    error: bool,
}

impl fmt::Debug for BitReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitReader")
            .field("len", &self.data.len())
            .field("pos", &self.pos)
            .field("error", &self.error)
            .finish()
    }
}

impl<'a> BitReader<'a> {
    /// Create a reader over the whole buffer.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            inner: bitstream_io::BitReader::endian(data, BigEndian),
            pos: 0,
            end: data.len() * 8,
            error: false,
        }
    }

    /// Read the next `n` bits (`n <= 64`) as an unsigned value.
    ///
    /// On underrun the error flag is set, zero is returned and the cursor
    /// does not move.
    pub fn read_bits(&mut self, n: u32) -> u64 {
        debug_assert!(n <= 64, "cannot read {} bits at once", n);
        if self.error || n > 64 || self.remaining_bits() < n as usize {
            self.error = true;
            return 0;
        }
        if n == 0 {
            return 0;
        }
        match self.inner.read_var::<u64>(n) {
            Ok(value) => {
                self.pos += n as usize;
                value
            }
            Err(_) => {
                self.error = true;
                0
            }
        }
    }

    pub fn read_bool(&mut self) -> bool {
        self.read_bits(1) != 0
    }

    pub fn read_u8(&mut self) -> u8 {
        self.read_bits(8) as u8
    }

    pub fn read_u16(&mut self) -> u16 {
        self.read_bits(16) as u16
    }

    pub fn read_u24(&mut self) -> u32 {
        self.read_bits(24) as u32
    }

    pub fn read_u32(&mut self) -> u32 {
        self.read_bits(32) as u32
    }

    /// Read `n` whole bytes. The cursor must be byte-aligned.
    ///
    /// Returns an empty slice and sets the error flag on underrun or
    /// misalignment.
    pub fn read_bytes(&mut self, n: usize) -> &'a [u8] {
        if self.error || !self.is_byte_aligned() || self.remaining_bits() < n * 8 {
            self.error = true;
            return &[];
        }
        let start = self.pos / 8;
        self.skip_bits(n * 8);
        if self.error {
            return &[];
        }
        &self.data[start..start + n]
    }

    /// Skip `n` bits, typically reserved fields.
    pub fn skip_bits(&mut self, n: usize) {
        if self.error || self.remaining_bits() < n {
            self.error = true;
            return;
        }
        if n == 0 {
            return;
        }
        match self.inner.skip(n as u32) {
            Ok(()) => self.pos += n,
            Err(_) => self.error = true,
        }
    }

    pub fn skip_bytes(&mut self, n: usize) {
        self.skip_bits(n * 8);
    }

    pub fn remaining_bits(&self) -> usize {
        self.end - self.pos
    }

    pub fn remaining_bytes(&self) -> usize {
        self.remaining_bits() / 8
    }

    /// Unread bytes from the current (aligned) position.
    pub fn remaining_slice(&self) -> &'a [u8] {
        let start = (self.pos + 7) / 8;
        &self.data[start.min(self.end / 8)..self.end / 8]
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.end
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Flag the cursor as failed, e.g. on a semantic inconsistency.
    pub fn set_error(&mut self) {
        self.error = true;
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.pos % 8 == 0
    }

    pub fn position_bits(&self) -> usize {
        self.pos
    }

    /// Rewind to the start and clear the error flag.
    pub fn reset(&mut self) {
        self.inner = bitstream_io::BitReader::endian(self.data, BigEndian);
        self.pos = 0;
        self.error = false;
    }
}

/// Write cursor appending bit fields into an owned buffer.
pub struct BitWriter {
    inner: bitstream_io::BitWriter<Vec<u8>, BigEndian>,
    /// Maximum size in bytes, `None` for unbounded.
    capacity: Option<usize>,
    bits: usize,
    error: bool,
}

impl fmt::Debug for BitWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitWriter")
            .field("bits", &self.bits)
            .field("capacity", &self.capacity)
            .field("error", &self.error)
            .finish()
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWriter {
    /// Unbounded writer.
    pub fn new() -> Self {
        Self {
            inner: bitstream_io::BitWriter::endian(Vec::new(), BigEndian),
            capacity: None,
            bits: 0,
            error: false,
        }
    }

    /// Writer limited to `capacity` bytes.
    ///
    /// Writing past the limit is a caller bug: it panics in debug builds and
    /// sets the error flag in release builds.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: bitstream_io::BitWriter::endian(Vec::with_capacity(capacity), BigEndian),
            capacity: Some(capacity),
            bits: 0,
            error: false,
        }
    }

    /// Append the low `n` bits of `value` (`n <= 64`).
    pub fn put_bits(&mut self, value: u64, n: u32) {
        debug_assert!(n <= 64, "cannot write {} bits at once", n);
        if self.error {
            return;
        }
        if n > 64 {
            self.error = true;
            return;
        }
        if let Some(cap) = self.capacity {
            if self.bits + n as usize > cap * 8 {
                debug_assert!(
                    false,
                    "write of {} bits exceeds writer capacity of {} bytes",
                    n, cap
                );
                self.error = true;
                return;
            }
        }
        if n == 0 {
            return;
        }

        let masked = if n == 64 { value } else { value & ((1u64 << n) - 1) };
        match self.inner.write_var::<u64>(n, masked) {
            Ok(()) => self.bits += n as usize,
            Err(_) => self.error = true,
        }
    }

    pub fn put_bool(&mut self, value: bool) {
        self.put_bits(value as u64, 1);
    }

    pub fn put_u8(&mut self, value: u8) {
        self.put_bits(value as u64, 8);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.put_bits(value as u64, 16);
    }

    pub fn put_u24(&mut self, value: u32) {
        self.put_bits(value as u64, 24);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.put_bits(value as u64, 32);
    }

    /// Reserved field: `n` bits all set to one.
    pub fn put_reserved(&mut self, n: u32) {
        let mut remaining = n;
        while remaining > 0 && !self.error {
            let chunk = remaining.min(64);
            self.put_bits(u64::MAX, chunk);
            remaining -= chunk;
        }
    }

    pub fn put_bytes(&mut self, data: &[u8]) {
        for &b in data {
            self.put_u8(b);
        }
    }

    pub fn bits_written(&self) -> usize {
        self.bits
    }

    /// Whole bytes written so far.
    pub fn len(&self) -> usize {
        self.bits / 8
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.bits % 8 == 0
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Finish writing. A trailing partial byte is padded with ones.
    pub fn into_bytes(mut self) -> Bytes {
        let pad = (8 - self.bits % 8) % 8;
        if pad > 0 && self.inner.write_var::<u8>(pad as u32, (1u8 << pad) - 1).is_err() {
            self.error = true;
        }
        Bytes::from(self.inner.into_writer())
    }
}
