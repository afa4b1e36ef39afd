//! Pixel record layouts
//!
//! A strip stores each pixel as a fixed-size record in the byte order the
//! LEDs expect on the wire.

use super::{Rgb, Rgbw};
use crate::error::Error;

const COLOR_FORMAT_RGB: u8 = 0;
const COLOR_FORMAT_GRB: u8 = 1;
const COLOR_FORMAT_RGBW: u8 = 2;

/// Byte layout of a pixel record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ColorFormat {
    /// Red, green, blue
    Rgb = COLOR_FORMAT_RGB,
    /// Green, red, blue (WS2812 family)
    Grb = COLOR_FORMAT_GRB,
    /// Red, green, blue, white (SK6812RGBW)
    Rgbw = COLOR_FORMAT_RGBW,
}

impl ColorFormat {
    pub const fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            COLOR_FORMAT_RGB => Self::Rgb,
            COLOR_FORMAT_GRB => Self::Grb,
            COLOR_FORMAT_RGBW => Self::Rgbw,
            _ => return None,
        })
    }

    /// Bytes per pixel record
    pub const fn record_size(self) -> usize {
        match self {
            Self::Rgb | Self::Grb => 3,
            Self::Rgbw => 4,
        }
    }
}

impl TryFrom<u8> for ColorFormat {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_raw(value).ok_or(Error::UnsupportedColorFormat)
    }
}

/// A color that can be stored in a pixel record
pub trait Pixel: Copy {
    /// Whether a strip of `format` can hold this color
    fn fits(format: ColorFormat) -> bool;

    /// Write the color into `record` in the wire order of `format`
    ///
    /// Only called when [`Pixel::fits`] holds for `format`.
    fn encode(self, format: ColorFormat, record: &mut [u8]);
}

impl Pixel for Rgb {
    fn fits(format: ColorFormat) -> bool {
        matches!(format, ColorFormat::Rgb | ColorFormat::Grb)
    }

    fn encode(self, format: ColorFormat, record: &mut [u8]) {
        let bytes = match format {
            ColorFormat::Grb => [self.g, self.r, self.b],
            ColorFormat::Rgb | ColorFormat::Rgbw => [self.r, self.g, self.b],
        };
        for (dst, src) in record.iter_mut().zip(bytes) {
            *dst = src;
        }
    }
}

impl Pixel for Rgbw {
    fn fits(format: ColorFormat) -> bool {
        format == ColorFormat::Rgbw
    }

    fn encode(self, _format: ColorFormat, record: &mut [u8]) {
        for (dst, src) in record.iter_mut().zip([self.r, self.g, self.b, self.a.0]) {
            *dst = src;
        }
    }
}
