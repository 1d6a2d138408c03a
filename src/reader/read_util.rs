//! Bounds-checked little-endian cursor over document bytes.

use byteorder::{ByteOrder, LittleEndian};

use crate::format::{ABSENT, PRESENT};
use crate::util::{Error, Result, Vec2, Vec3, Vec4};

/// Read cursor over a byte slice. `base` is the absolute offset of the slice in the document.
pub struct IStream<'a> {
    data: &'a [u8],
    pos: usize,
    base: u64,
}

impl<'a> IStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, base: 0 }
    }

    fn with_base(data: &'a [u8], base: u64) -> Self {
        Self { data, pos: 0, base }
    }

    /// Absolute position in the document.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.base + self.pos as u64
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Take the next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::UnexpectedEof(self.pos() + len as u64));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Split off a sub-stream of `len` bytes.
    pub fn sub(&mut self, len: usize) -> Result<IStream<'a>> {
        let base = self.pos();
        let bytes = self.take(len)?;
        Ok(IStream::with_base(bytes, base))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(Error::invalid(format!("invalid bool {v} at {}", self.pos() - 1))),
        }
    }

    /// Read a presence byte.
    pub fn read_present(&mut self) -> Result<bool> {
        match self.read_u8()? {
            ABSENT => Ok(false),
            PRESENT => Ok(true),
            v => Err(Error::invalid(format!("invalid presence byte {v} at {}", self.pos() - 1))),
        }
    }

    /// Read a u32 element count, checking that `elem_size * count` bytes remain.
    pub fn read_count(&mut self, elem_size: usize) -> Result<usize> {
        let count = self.read_u32()? as usize;
        let needed = count.saturating_mul(elem_size);
        if needed > self.remaining() {
            return Err(Error::UnexpectedEof(self.pos() + needed as u64));
        }
        Ok(count)
    }

    pub fn read_str(&mut self) -> Result<String> {
        let len = self.read_count(1)?;
        Ok(String::from_utf8(self.take(len)?.to_vec())?)
    }

    pub fn read_opt_str(&mut self) -> Result<Option<String>> {
        if self.read_present()? {
            Ok(Some(self.read_str()?))
        } else {
            Ok(None)
        }
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec4(&mut self) -> Result<Vec4> {
        Ok(Vec4::new(self.read_f32()?, self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }
}
