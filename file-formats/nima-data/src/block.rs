//! Bounds-checked reader over one block of an actor file

use byteorder::{ByteOrder, LittleEndian};
use glam::{Affine2, Vec2};

use crate::error::{DataError, Result};

/// Reader scoped to a single block's payload.
///
/// Every read is checked against the block bound, so a sub-reader returned by
/// [`BlockReader::read_next_block`] can never consume bytes that belong to
/// its parent's next sibling.
#[derive(Debug, Clone)]
pub struct BlockReader<'a> {
    data: &'a [u8],
    position: usize,
    block_type: u8,
}

impl<'a> BlockReader<'a> {
    /// Create a reader over a whole buffer. Its block type is 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            block_type: 0,
        }
    }

    /// Type tag this block was introduced with
    pub fn block_type(&self) -> u8 {
        self.block_type
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// True once the cursor has reached the block bound
    pub fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let overflow = DataError::Overflow {
            offset: self.position,
            requested: count,
            available: self.remaining(),
        };
        let end = self
            .position
            .checked_add(count)
            .filter(|end| *end <= self.data.len())
            .ok_or(overflow)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    fn element_bytes(&self, count: usize, size: usize) -> Result<usize> {
        count.checked_mul(size).ok_or(DataError::Overflow {
            offset: self.position,
            requested: usize::MAX,
            available: self.remaining(),
        })
    }

    /// Advance the cursor without decoding anything
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    /// Single byte flag; only the value 1 counts as true
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? == 1)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    /// Read a `u32` length followed by that many bytes of UTF-8.
    ///
    /// Invalid sequences are replaced rather than rejected; names are only
    /// used for lookup and display.
    pub fn read_string(&mut self) -> Result<String> {
        let length = self.read_u32()? as usize;
        let bytes = self.take(length)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn read_f32_array(&mut self, count: usize) -> Result<Vec<f32>> {
        let size = self.element_bytes(count, 4)?;
        let bytes = self.take(size)?;
        Ok(bytes.chunks_exact(4).map(LittleEndian::read_f32).collect())
    }

    pub fn read_u16_array(&mut self, count: usize) -> Result<Vec<u16>> {
        let size = self.element_bytes(count, 2)?;
        let bytes = self.take(size)?;
        Ok(bytes.chunks_exact(2).map(LittleEndian::read_u16).collect())
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        Ok(Vec2::new(x, y))
    }

    /// Read a 2x3 affine matrix stored as `[a, b, c, d, tx, ty]`
    pub fn read_affine2(&mut self) -> Result<Affine2> {
        let mut values = [0.0f32; 6];
        for value in &mut values {
            *value = self.read_f32()?;
        }
        Ok(Affine2::from_cols_array(&values))
    }

    /// Read the next child block.
    ///
    /// Returns `Ok(None)` when the cursor sits exactly at the end of this
    /// block. Otherwise reads the type tag and length, checks the payload
    /// fits, moves this reader past it and returns a reader bounded to it.
    pub fn read_next_block(&mut self) -> Result<Option<BlockReader<'a>>> {
        if self.is_empty() {
            return Ok(None);
        }
        let block_type = self.read_u8()?;
        let length = self.read_u32()? as usize;
        let payload = self.take(length)?;
        log::trace!("Block type {block_type} with {length} bytes at offset {}", self.position - length);
        Ok(Some(BlockReader {
            data: payload,
            position: 0,
            block_type,
        }))
    }
}
