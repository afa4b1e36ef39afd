//! Tick-driven one-wire encoder
//!
//! The transmitter has no loop of its own. Each counter overflow calls
//! [`Transmitter::on_tick`] once, which advances the waveform by exactly one
//! tick: a bit is sent high-then-low, most significant bit first, and the
//! frame ends with the line held low for the reset period.

use alloc::vec::Vec;

use embedded_hal::digital::OutputPin;

use crate::error::{DeviceError, Error, Result};
use crate::log::{device_failure, log_debug};
use crate::pixel_buffer::try_zeroed;
use crate::timing::ResolvedTiming;

/// Phase of the transmitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitState {
    /// Nothing to send; overflows are ignored
    Idle,
    /// Sending frame bits
    Transmitting,
    /// Holding the line low to latch the frame
    Resetting,
}

/// Position inside the frame being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cursor {
    /// Byte currently on the wire
    pub byte_index: usize,
    /// Bit currently on the wire, 8 (MSB) down to 1 (LSB)
    pub bit_index: u8,
    /// Ticks elapsed in the current bit or reset slot
    pub tick_counter: u32,
}

impl Cursor {
    pub const START: Self = Self {
        byte_index: 0,
        bit_index: 8,
        tick_counter: 0,
    };
}

impl Default for Cursor {
    fn default() -> Self {
        Self::START
    }
}

/// What the owner of the counter has to do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    /// The overflow arrived while idle
    Idle,
    /// The frame is still being sent
    Running,
    /// The reset period just elapsed; the counter should be stopped
    Finished,
}

/// Frame encoder driven by counter overflows
///
/// Sends from its own copy of the pixel bytes, taken by [`Transmitter::arm`],
/// so the application can keep writing pixels while a frame is on the wire.
#[derive(Debug)]
pub struct Transmitter {
    timing: ResolvedTiming,
    frame: Vec<u8>,
    cursor: Cursor,
    state: TransmitState,
}

impl Transmitter {
    /// Create an idle transmitter with room for `frame_len` bytes
    pub fn new(timing: ResolvedTiming, frame_len: usize) -> Result<Self> {
        Ok(Self {
            timing,
            frame: try_zeroed(frame_len)?,
            cursor: Cursor::START,
            state: TransmitState::Idle,
        })
    }

    pub const fn state(&self) -> TransmitState {
        self.state
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub const fn timing(&self) -> &ResolvedTiming {
        &self.timing
    }

    /// Bytes of the frame being (or last) sent
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn is_busy(&self) -> bool {
        self.state != TransmitState::Idle
    }

    /// Snapshot `pixels` and start a new frame from the first bit
    ///
    /// Fails with [`Error::DeviceBusy`] while a frame is in flight.
    pub fn arm(&mut self, pixels: &[u8]) -> Result<()> {
        if self.is_busy() {
            return Err(Error::DeviceBusy);
        }
        if self.frame.len() != pixels.len() {
            self.frame = try_zeroed(pixels.len())?;
        }
        self.frame.copy_from_slice(pixels);
        self.cursor = Cursor::START;
        self.state = if self.frame.is_empty() {
            TransmitState::Resetting
        } else {
            TransmitState::Transmitting
        };
        Ok(())
    }

    /// Drop the frame in flight
    pub fn abort(&mut self) {
        self.cursor = Cursor::START;
        self.state = TransmitState::Idle;
    }

    /// Advance the waveform by one tick
    ///
    /// A failure to drive the line is logged and the tick is not counted,
    /// so the next overflow retries it.
    pub fn on_tick<L: OutputPin>(&mut self, line: &mut L) -> Tick {
        match self.state {
            TransmitState::Idle => Tick::Idle,
            TransmitState::Transmitting => {
                self.transmit_bit(line);
                Tick::Running
            }
            TransmitState::Resetting => self.process_reset(line),
        }
    }

    fn transmit_bit<L: OutputPin>(&mut self, line: &mut L) {
        let Some(&byte) = self.frame.get(self.cursor.byte_index) else {
            self.enter_reset();
            return;
        };
        let bit = (byte >> self.cursor.bit_index.saturating_sub(1)) & 1 == 1;
        let ticks = self.timing.bit(bit);

        let driven = if self.cursor.tick_counter < ticks.high {
            line.set_high()
        } else {
            line.set_low()
        };
        if let Err(error) = driven {
            device_failure(DeviceError::Line, "drive the data line", error);
            return;
        }

        self.cursor.tick_counter += 1;
        if self.cursor.tick_counter < ticks.total {
            return;
        }
        self.cursor.tick_counter = 0;
        self.cursor.bit_index -= 1;
        if self.cursor.bit_index == 0 {
            self.cursor.bit_index = 8;
            self.cursor.byte_index += 1;
            if self.cursor.byte_index >= self.frame.len() {
                self.enter_reset();
            }
        }
    }

    fn enter_reset(&mut self) {
        self.cursor.tick_counter = 0;
        self.state = TransmitState::Resetting;
    }

    fn process_reset<L: OutputPin>(&mut self, line: &mut L) -> Tick {
        if let Err(error) = line.set_low() {
            device_failure(DeviceError::Line, "clear the data line for reset", error);
            return Tick::Running;
        }

        self.cursor.tick_counter += 1;
        if self.cursor.tick_counter < self.timing.reset_ticks() {
            return Tick::Running;
        }
        log_debug!("[Transmitter.on_tick] frame of {} bytes sent", self.frame.len());
        self.abort();
        Tick::Finished
    }
}
