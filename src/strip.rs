//! Strip controller
//!
//! Ties the timing resolver, the pixel buffer and the transmitter to one
//! data line and one tick counter.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_time::Duration;
use embedded_hal::digital::OutputPin;
use smart_leds::SmartLedsWrite;

use crate::TickCounter;
use crate::color::{ColorFormat, Pixel, Rgb};
use crate::error::{DeviceError, Error, Result};
use crate::log::{device_failure, log_debug, log_error, log_warn};
use crate::pixel_buffer::PixelBuffer;
use crate::timing::{ProtocolTiming, ResolvedTiming, Tolerance, resolve_with_tolerance};
use crate::transmitter::{Tick, TransmitState, Transmitter};

/// Configuration for a strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StripConfig {
    pub format: ColorFormat,
    pub pixel_count: usize,
    pub timing: ProtocolTiming,
    pub tolerance: Tolerance,
}

impl StripConfig {
    pub const fn new(format: ColorFormat, pixel_count: usize, timing: ProtocolTiming) -> Self {
        Self {
            format,
            pixel_count,
            timing,
            tolerance: Tolerance::DEFAULT,
        }
    }

    /// Set the timing tolerance
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Buffers that exist between a successful init and deinit
#[derive(Debug)]
struct Session {
    pixels: PixelBuffer,
    transmitter: Transmitter,
}

struct Hardware<L, C> {
    line: L,
    counter: C,
    counter_running: bool,
    session: Option<Session>,
}

/// Bit-banged LED strip on one output line
///
/// All operations take `&self`, so a strip can be kept in a `static` and
/// shared between application code and the counter interrupt. The
/// interrupt handler must call [`LedStrip::on_overflow`] once per counter
/// overflow.
///
/// Pixels written while a frame is on the wire go to a pending buffer and
/// are sent by the next [`LedStrip::update`].
pub struct LedStrip<L, C> {
    inner: Mutex<RefCell<Hardware<L, C>>>,
}

impl<L, C> LedStrip<L, C>
where
    L: OutputPin,
    C: TickCounter,
{
    /// Wrap a data line and a tick counter. The strip is unusable until
    /// [`LedStrip::init`] succeeds.
    pub const fn new(line: L, counter: C) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Hardware {
                line,
                counter,
                counter_running: false,
                session: None,
            })),
        }
    }

    fn with_hardware<R>(&self, f: impl FnOnce(&mut Hardware<L, C>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow(cs).borrow_mut()))
    }

    /// Resolve the timing, allocate the pixel buffers, drive the line low
    /// and arm the counter
    ///
    /// Any previous configuration is released first. On failure the strip is
    /// left uninitialized.
    pub fn init(&self, config: &StripConfig) -> Result<()> {
        self.with_hardware(|hardware| hardware.init(config))
    }

    /// Abort any frame in flight and release the pixel buffers
    pub fn deinit(&self) -> Result<()> {
        self.with_hardware(|hardware| {
            let result = if hardware.session.is_some() {
                hardware.abort()
            } else {
                Ok(())
            };
            hardware.session = None;
            result
        })
    }

    /// Set the color of one pixel
    pub fn set_pixel<P: Pixel>(&self, index: usize, color: P) -> Result<()> {
        self.with_pixels_mut("set_pixel", |pixels| pixels.set_pixel(index, color))
    }

    /// Set the colors of pixels `start..end`
    pub fn set_pixels<P: Pixel>(&self, start: usize, end: usize, colors: &[P]) -> Result<()> {
        self.with_pixels_mut("set_pixels", |pixels| pixels.set_pixels(start, end, colors))
    }

    /// Turn every pixel off (takes effect at the next update)
    pub fn clear(&self) -> Result<()> {
        self.with_pixels_mut("clear", |pixels| {
            pixels.clear();
            Ok(())
        })
    }

    /// Read the pending pixel buffer
    pub fn with_pixels<R>(&self, f: impl FnOnce(&PixelBuffer) -> R) -> Result<R> {
        self.with_hardware(|hardware| {
            let session = hardware.session()?;
            Ok(f(&session.pixels))
        })
    }

    fn with_pixels_mut(
        &self,
        method: &str,
        f: impl FnOnce(&mut PixelBuffer) -> Result<()>,
    ) -> Result<()> {
        self.with_hardware(|hardware| {
            let session = hardware.session()?;
            f(&mut session.pixels).inspect_err(|error| {
                log_error!("[LedStrip.{}] {}", method, error);
            })
        })
    }

    /// Start sending the pending pixels
    ///
    /// Returns as soon as the counter is running; the frame is sent from
    /// [`LedStrip::on_overflow`].
    pub fn update(&self) -> Result<()> {
        self.with_hardware(Hardware::update)
    }

    /// Stop the frame in flight, if any, and drive the line low
    pub fn abort(&self) -> Result<()> {
        self.with_hardware(|hardware| {
            hardware.session()?;
            hardware.abort()
        })
    }

    /// Counter overflow entry point, called from the counter interrupt
    pub fn on_overflow(&self) {
        self.with_hardware(Hardware::on_overflow);
    }

    /// Number of pixels, 0 before init
    pub fn pixel_count(&self) -> usize {
        self.with_hardware(|hardware| {
            hardware
                .session
                .as_ref()
                .map_or(0, |session| session.pixels.pixel_count())
        })
    }

    pub fn color_format(&self) -> Option<ColorFormat> {
        self.with_hardware(|hardware| {
            hardware
                .session
                .as_ref()
                .map(|session| session.pixels.format())
        })
    }

    pub fn timing(&self) -> Option<ResolvedTiming> {
        self.with_hardware(|hardware| {
            hardware
                .session
                .as_ref()
                .map(|session| *session.transmitter.timing())
        })
    }

    pub fn state(&self) -> TransmitState {
        self.with_hardware(|hardware| {
            hardware
                .session
                .as_ref()
                .map_or(TransmitState::Idle, |session| session.transmitter.state())
        })
    }

    /// Whether a frame is on the wire
    pub fn is_busy(&self) -> bool {
        self.state() != TransmitState::Idle
    }

    /// Time one full frame takes on the wire, including the reset
    pub fn frame_duration(&self) -> Option<Duration> {
        self.with_hardware(|hardware| {
            hardware.session.as_ref().map(|session| {
                session
                    .transmitter
                    .timing()
                    .frame_duration(session.pixels.as_bytes())
            })
        })
    }

    /// Give back the data line and the counter
    pub fn into_parts(self) -> (L, C) {
        let hardware = self.inner.into_inner().into_inner();
        (hardware.line, hardware.counter)
    }
}

impl<L, C> Hardware<L, C>
where
    L: OutputPin,
    C: TickCounter,
{
    fn session(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or_else(|| {
            log_error!("[LedStrip] LED strip not yet initialized");
            Error::NotInitialized
        })
    }

    fn is_busy(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.transmitter.is_busy())
    }

    fn init(&mut self, config: &StripConfig) -> Result<()> {
        if self.is_busy() {
            log_error!("[LedStrip.init] cannot reconfigure while a frame is in flight");
            return Err(Error::DeviceBusy);
        }
        if self.session.take().is_some() {
            log_warn!("[LedStrip.init] releasing the previous configuration");
        }

        self.counter
            .init()
            .map_err(|error| device_failure(DeviceError::Counter, "init the timing counter", error))?;

        let frequency_hz = self.counter.frequency_hz();
        let timing = resolve_with_tolerance(&config.timing, frequency_hz, config.tolerance)
            .inspect_err(|error| {
                log_error!("[LedStrip.init] timing rejected at {} Hz: {}", frequency_hz, error);
            })?;

        let pixels = PixelBuffer::new(config.format, config.pixel_count).inspect_err(|_| {
            log_error!("[LedStrip.init] unable to allocate the pixel buffer");
        })?;
        let transmitter = Transmitter::new(timing, pixels.as_bytes().len()).inspect_err(|_| {
            log_error!("[LedStrip.init] unable to allocate the frame buffer");
        })?;

        self.line
            .set_low()
            .map_err(|error| device_failure(DeviceError::Line, "clear the data line", error))?;
        self.counter.set_top(timing.top()).map_err(|error| {
            device_failure(DeviceError::Counter, "set the timing counter top", error)
        })?;

        log_debug!(
            "[LedStrip.init] {} pixels, {} counter ticks per tick",
            config.pixel_count,
            timing.top()
        );
        self.session = Some(Session {
            pixels,
            transmitter,
        });
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        let session = self.session()?;
        session
            .transmitter
            .arm(session.pixels.as_bytes())
            .inspect_err(|error| {
                log_error!("[LedStrip.update] {}", error);
            })?;

        if let Err(error) = self.counter.start() {
            if let Some(session) = self.session.as_mut() {
                session.transmitter.abort();
            }
            return Err(device_failure(
                DeviceError::Counter,
                "start the timing counter",
                error,
            ));
        }
        self.counter_running = true;
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        if let Some(session) = self.session.as_mut() {
            session.transmitter.abort();
        }
        let stopped = self.stop_counter();
        let cleared = self
            .line
            .set_low()
            .map_err(|error| device_failure(DeviceError::Line, "clear the data line", error));
        stopped.and(cleared)
    }

    fn on_overflow(&mut self) {
        let tick = match self.session.as_mut() {
            Some(session) => session.transmitter.on_tick(&mut self.line),
            None => Tick::Idle,
        };
        match tick {
            Tick::Running => {}
            // a failed stop is already logged and retried on the next idle overflow
            Tick::Finished => {
                self.stop_counter().ok();
            }
            Tick::Idle => {
                if self.counter_running {
                    self.stop_counter().ok();
                }
            }
        }
    }

    fn stop_counter(&mut self) -> Result<()> {
        if !self.counter_running {
            return Ok(());
        }
        self.counter
            .stop()
            .map_err(|error| device_failure(DeviceError::Counter, "stop the timing counter", error))?;
        self.counter_running = false;
        Ok(())
    }
}

impl<L, C> SmartLedsWrite for LedStrip<L, C>
where
    L: OutputPin,
    C: TickCounter,
{
    type Error = Error;
    type Color = Rgb;

    /// Write colors from the first pixel on and start an update
    ///
    /// Colors past the last pixel are ignored.
    fn write<T, I>(&mut self, iterator: T) -> Result<()>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        self.with_hardware(|hardware| {
            let session = hardware.session()?;
            let count = session.pixels.pixel_count();
            for (index, color) in iterator.into_iter().take(count).enumerate() {
                session.pixels.set_pixel(index, color.into())?;
            }
            hardware.update()
        })
    }
}
