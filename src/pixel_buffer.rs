//! Densely packed pixel storage

use alloc::vec::Vec;

use crate::color::{ColorFormat, Pixel};
use crate::error::{Error, Result};

/// Allocate `len` zeroed bytes, reporting allocation failure instead of
/// aborting
pub(crate) fn try_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory)?;
    bytes.resize(len, 0);
    Ok(bytes)
}

/// Pixel records of one strip, in wire byte order
///
/// The color format is fixed at construction. Records start zeroed (off).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    format: ColorFormat,
    pixel_count: usize,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer of `pixel_count` records
    pub fn new(format: ColorFormat, pixel_count: usize) -> Result<Self> {
        let len = pixel_count
            .checked_mul(format.record_size())
            .ok_or(Error::OutOfMemory)?;
        Ok(Self {
            format,
            pixel_count,
            bytes: try_zeroed(len)?,
        })
    }

    pub const fn format(&self) -> ColorFormat {
        self.format
    }

    /// Number of pixel records
    pub const fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// All records, in the order they go out on the wire
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encoded record of the pixel at `index`
    pub fn pixel(&self, index: usize) -> Option<&[u8]> {
        let size = self.format.record_size();
        self.bytes.chunks_exact(size).nth(index)
    }

    /// Overwrite the pixel at `index`
    pub fn set_pixel<P: Pixel>(&mut self, index: usize, color: P) -> Result<()> {
        if index >= self.pixel_count {
            return Err(Error::IndexOutOfRange {
                index,
                count: self.pixel_count,
            });
        }
        if !P::fits(self.format) {
            return Err(Error::UnsupportedColorFormat);
        }

        let size = self.format.record_size();
        if let Some(record) = self.bytes.chunks_exact_mut(size).nth(index) {
            color.encode(self.format, record);
        }
        Ok(())
    }

    /// Overwrite pixels `start..end` with the first `end - start` colors
    ///
    /// Nothing is written unless the whole range is valid.
    pub fn set_pixels<P: Pixel>(&mut self, start: usize, end: usize, colors: &[P]) -> Result<()> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        if end > self.pixel_count {
            return Err(Error::IndexOutOfRange {
                index: end,
                count: self.pixel_count,
            });
        }
        if colors.len() < end - start {
            return Err(Error::InvalidRange { start, end });
        }
        if !P::fits(self.format) {
            return Err(Error::UnsupportedColorFormat);
        }

        let size = self.format.record_size();
        let records = self
            .bytes
            .chunks_exact_mut(size)
            .skip(start)
            .take(end - start);
        for (record, &color) in records.zip(colors) {
            color.encode(self.format, record);
        }
        Ok(())
    }

    /// Turn every pixel off
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}
