//! Bit-banged one-wire LED strip driver
//!
//! Drives WS281x-style addressable LEDs from a plain output pin and a
//! periodic hardware counter, without a dedicated peripheral. The counter
//! overflow interrupt calls [`LedStrip::on_overflow`], and each call advances
//! the waveform by one tick.
//!
//! ```ignore
//! static STRIP: LedStrip<DataPin, TimingCounter> = LedStrip::new(DataPin::new(), TimingCounter::new());
//!
//! STRIP.init(&StripConfig::new(ColorFormat::Grb, 8, ProtocolTiming::WS2812))?;
//! STRIP.set_pixel(0, Rgb::new(255, 0, 0))?;
//! STRIP.update()?;
//!
//! // in the counter interrupt handler
//! STRIP.on_overflow();
//! ```

#![no_std]

extern crate alloc;

mod log;

pub mod color;
pub mod error;
pub mod pixel_buffer;
pub mod strip;
pub mod timing;
pub mod transmitter;

pub use color::{ColorFormat, Pixel, Rgb, Rgbw, White};
pub use error::{DeviceError, Error, Result};
pub use pixel_buffer::PixelBuffer;
pub use strip::{LedStrip, StripConfig};
pub use timing::{ProtocolTiming, ResolvedTiming, TimingError, Tolerance, resolve};
pub use transmitter::{Cursor, Tick, TransmitState, Transmitter};

pub use embassy_time::Duration;

/// Abstract periodic hardware counter
///
/// Implement this trait to support different hardware platforms. After
/// [`TickCounter::set_top`] the counter must raise an overflow interrupt
/// every `ticks` counts while it is running, and the interrupt handler must
/// call [`LedStrip::on_overflow`].
pub trait TickCounter {
    type Error: core::fmt::Debug;

    /// Prepare the counter for use
    fn init(&mut self) -> core::result::Result<(), Self::Error>;

    /// Counting frequency in Hz
    fn frequency_hz(&self) -> u32;

    /// Set the number of counts between two overflows
    fn set_top(&mut self, ticks: u32) -> core::result::Result<(), Self::Error>;

    fn start(&mut self) -> core::result::Result<(), Self::Error>;

    fn stop(&mut self) -> core::result::Result<(), Self::Error>;
}
