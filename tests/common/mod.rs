//! Host doubles for the data line and the tick counter
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use bitbang_strip::{LedStrip, TickCounter};
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

/// 10 MHz gives a 400 ns tick for WS2812 timing: 0 bits are 1 high + 2 low
/// ticks, 1 bits are 2 high + 1 low, and the reset is 125 ticks.
pub const COUNTER_HZ: u32 = 10_000_000;
pub const TICKS_PER_BIT: usize = 3;
pub const RESET_TICKS: usize = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFault;

impl embedded_hal::digital::Error for LineFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
struct LineLog {
    levels: Vec<Level>,
    failures_left: usize,
    failures: usize,
}

/// Output pin that records every level it is driven to
#[derive(Debug, Clone, Default)]
pub struct RecordingLine {
    log: Arc<Mutex<LineLog>>,
}

impl RecordingLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levels(&self) -> Vec<Level> {
        self.log.lock().unwrap().levels.clone()
    }

    pub fn take_levels(&self) -> Vec<Level> {
        std::mem::take(&mut self.log.lock().unwrap().levels)
    }

    /// Make the next `count` drives fail
    pub fn fail_next(&self, count: usize) {
        self.log.lock().unwrap().failures_left = count;
    }

    pub fn failures(&self) -> usize {
        self.log.lock().unwrap().failures
    }

    fn drive(&mut self, level: Level) -> Result<(), LineFault> {
        let mut log = self.log.lock().unwrap();
        if log.failures_left > 0 {
            log.failures_left -= 1;
            log.failures += 1;
            return Err(LineFault);
        }
        log.levels.push(level);
        Ok(())
    }
}

impl ErrorType for RecordingLine {
    type Error = LineFault;
}

impl OutputPin for RecordingLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(Level::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(Level::High)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterFault;

#[derive(Debug, Default)]
struct CounterLog {
    inits: usize,
    top: Option<u32>,
    starts: usize,
    stops: usize,
    running: bool,
    fail_set_top: bool,
    fail_start: bool,
    stop_failures_left: usize,
}

/// Counter that only tracks calls; overflows are fired by the test
#[derive(Debug, Clone)]
pub struct SimCounter {
    frequency_hz: u32,
    log: Arc<Mutex<CounterLog>>,
}

impl SimCounter {
    pub fn new(frequency_hz: u32) -> Self {
        Self {
            frequency_hz,
            log: Arc::default(),
        }
    }

    pub fn inits(&self) -> usize {
        self.log.lock().unwrap().inits
    }

    pub fn top(&self) -> Option<u32> {
        self.log.lock().unwrap().top
    }

    pub fn starts(&self) -> usize {
        self.log.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.log.lock().unwrap().stops
    }

    pub fn is_running(&self) -> bool {
        self.log.lock().unwrap().running
    }

    pub fn fail_set_top(&self) {
        self.log.lock().unwrap().fail_set_top = true;
    }

    pub fn fail_start(&self) {
        self.log.lock().unwrap().fail_start = true;
    }

    pub fn fail_next_stops(&self, count: usize) {
        self.log.lock().unwrap().stop_failures_left = count;
    }
}

impl TickCounter for SimCounter {
    type Error = CounterFault;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.log.lock().unwrap().inits += 1;
        Ok(())
    }

    fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    fn set_top(&mut self, ticks: u32) -> Result<(), Self::Error> {
        let mut log = self.log.lock().unwrap();
        if log.fail_set_top {
            return Err(CounterFault);
        }
        log.top = Some(ticks);
        Ok(())
    }

    fn start(&mut self) -> Result<(), Self::Error> {
        let mut log = self.log.lock().unwrap();
        if log.fail_start {
            return Err(CounterFault);
        }
        log.starts += 1;
        log.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        let mut log = self.log.lock().unwrap();
        if log.stop_failures_left > 0 {
            log.stop_failures_left -= 1;
            return Err(CounterFault);
        }
        log.stops += 1;
        log.running = false;
        Ok(())
    }
}

/// Fire overflows while the simulated counter runs; returns how many fired
pub fn run_until_stopped(strip: &LedStrip<RecordingLine, SimCounter>, counter: &SimCounter) -> usize {
    let mut overflows = 0;
    while counter.is_running() {
        strip.on_overflow();
        overflows += 1;
        assert!(overflows < 1_000_000, "counter never stopped");
    }
    overflows
}

/// Expected levels for `bytes` at 10 MHz WS2812 timing, reset included
pub fn ws2812_waveform(bytes: &[u8]) -> Vec<Level> {
    let mut levels = Vec::new();
    for byte in bytes {
        for bit in (0..8).rev() {
            let high = if byte >> bit & 1 == 1 { 2 } else { 1 };
            for tick in 0..TICKS_PER_BIT {
                levels.push(if tick < high { Level::High } else { Level::Low });
            }
        }
    }
    levels.extend(std::iter::repeat_n(Level::Low, RESET_TICKS));
    levels
}

/// Rebuild the data bytes from a recorded 10 MHz WS2812 waveform
pub fn decode_ws2812(levels: &[Level], byte_count: usize) -> Vec<u8> {
    levels
        .chunks(TICKS_PER_BIT)
        .take(byte_count * 8)
        .map(|bit| bit.iter().filter(|level| **level == Level::High).count() == 2)
        .collect::<Vec<_>>()
        .chunks(8)
        .map(|bits| bits.iter().fold(0u8, |byte, bit| byte << 1 | u8::from(*bit)))
        .collect()
}
