//! Position-tracking little-endian output stream.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::format::{ABSENT, PRESENT};
use crate::util::{Error, Result, Vec2, Vec3, Vec4};

/// Output stream for writing fus data.
pub struct OStream<W: Write> {
    writer: W,
    pos: u64,
}

impl OStream<BufWriter<File>> {
    /// Create a new output stream for the given file path.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(BufWriter::with_capacity(1024 * 1024, file)))
    }
}

impl<W: Write> OStream<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, pos: 0 }
    }

    /// Get the current write position.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Consume the stream, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write bytes and advance position.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    /// Write a u32 value (little-endian).
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    /// Write a u16 value (little-endian).
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.writer.write_u16::<LittleEndian>(value)?;
        self.pos += 2;
        Ok(())
    }

    /// Write a u8 value.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.writer.write_i32::<LittleEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.writer.write_f32::<LittleEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    /// Write a length as u32.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| Error::other(format!("length {len} exceeds u32")))?;
        self.write_u32(len)
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_len(s.len())?;
        self.write_bytes(s.as_bytes())
    }

    /// Write a presence byte followed by the string when present.
    pub fn write_opt_str(&mut self, s: Option<&str>) -> Result<()> {
        match s {
            Some(s) => {
                self.write_u8(PRESENT)?;
                self.write_str(s)
            }
            None => self.write_u8(ABSENT),
        }
    }

    pub fn write_vec2(&mut self, v: Vec2) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)
    }

    pub fn write_vec3(&mut self, v: Vec3) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)?;
        self.write_f32(v.z)
    }

    pub fn write_vec4(&mut self, v: Vec4) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)?;
        self.write_f32(v.z)?;
        self.write_f32(v.w)
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
