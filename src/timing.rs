//! Protocol timing and tick resolution
//!
//! One-wire LED protocols describe every bit as a high pulse followed by a
//! low pulse. The transmitter produces those pulses from a periodic counter
//! overflow, so every duration has to be expressed as a whole number of
//! ticks. [`resolve`] picks the coarsest tick that still represents all four
//! bit durations within tolerance.

use derive_more::{Display, Error};
use embassy_time::Duration;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Absorbs float noise when a duration is an exact multiple of the tick.
const TICK_EPSILON: f64 = 1e-6;

/// Bit and reset durations of a one-wire LED protocol, in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProtocolTiming {
    /// High time of a 0 bit
    pub t0h_ns: u32,
    /// Low time of a 0 bit
    pub t0l_ns: u32,
    /// High time of a 1 bit
    pub t1h_ns: u32,
    /// Low time of a 1 bit
    pub t1l_ns: u32,
    /// Minimum idle (low) time that latches a frame
    pub reset_ns: u32,
}

impl ProtocolTiming {
    /// WS2812, first-generation part
    pub const WS2812: Self = Self::new(400, 850, 800, 450, 50_000);
    /// WS2812B, which needs a much longer latch
    pub const WS2812B: Self = Self::new(400, 850, 800, 450, 280_000);
    /// SK6812 / SK6812RGBW
    pub const SK6812: Self = Self::new(300, 900, 600, 600, 80_000);
    /// WS2811 in low-speed (400 kHz) mode
    ///
    /// Only resolves with a tick of about 400 ns, e.g. a 2.5 MHz or 5 MHz
    /// counter. Faster counters round the tick up to 500 ns, which cannot
    /// represent the 1200 ns high time of a 1 bit.
    pub const WS2811: Self = Self::new(500, 2_000, 1_200, 1_300, 50_000);

    pub const fn new(t0h_ns: u32, t0l_ns: u32, t1h_ns: u32, t1l_ns: u32, reset_ns: u32) -> Self {
        Self {
            t0h_ns,
            t0l_ns,
            t1h_ns,
            t1l_ns,
            reset_ns,
        }
    }

    /// Shortest of the four bit durations
    pub fn shortest_ns(&self) -> u32 {
        self.bit_durations()
            .iter()
            .map(|(_, duration)| *duration)
            .min()
            .unwrap_or(0)
    }

    fn bit_durations(&self) -> [(TimingParam, u32); 4] {
        [
            (TimingParam::T0h, self.t0h_ns),
            (TimingParam::T0l, self.t0l_ns),
            (TimingParam::T1h, self.t1h_ns),
            (TimingParam::T1l, self.t1l_ns),
        ]
    }
}

/// Allowed deviation between a requested duration and the produced one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tolerance {
    /// Maximum absolute error of each bit pulse
    pub bit_ns: u32,
    /// Maximum time the reset may run past `reset_ns`
    ///
    /// The reset is rounded up to whole ticks, so it is never shorter than
    /// requested (up to float rounding of the tick period).
    pub reset_ns: u32,
}

impl Tolerance {
    pub const DEFAULT: Self = Self {
        bit_ns: 150,
        reset_ns: 1_000,
    };
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Names one of the protocol durations
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingParam {
    #[display("t0h")]
    T0h,
    #[display("t0l")]
    T0l,
    #[display("t1h")]
    T1h,
    #[display("t1l")]
    T1l,
    #[display("reset")]
    Reset,
}

/// Reasons a protocol timing cannot be resolved
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingError {
    /// The counter reports a frequency of 0 Hz
    #[display("counter frequency is zero")]
    ZeroFrequency,
    /// The counter is too slow to resolve the narrowest pulse
    #[display("counter cannot resolve a {shortest_ns} ns pulse")]
    Unrepresentable { shortest_ns: u32 },
    /// A duration is not reproduced within tolerance
    #[display("{param} of {required_ns} ns would be produced as {produced_ns} ns")]
    OutOfTolerance {
        param: TimingParam,
        required_ns: u32,
        produced_ns: u32,
    },
}

/// Tick counts that drive the transmitter
///
/// Created once at strip init and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTiming {
    tick_period_ns: f64,
    top: u32,
    zero: BitTicks,
    one: BitTicks,
    reset_ticks: u32,
}

/// High and whole-bit tick counts for one bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTicks {
    /// Ticks the line is held high
    pub high: u32,
    /// Ticks for the whole bit, high then low
    pub total: u32,
}

impl ResolvedTiming {
    /// Period of one transmitter tick in nanoseconds
    pub const fn tick_period_ns(&self) -> f64 {
        self.tick_period_ns
    }

    /// Counter ticks between two overflows
    pub const fn top(&self) -> u32 {
        self.top
    }

    /// Tick counts for a bit value
    pub const fn bit(&self, value: bool) -> BitTicks {
        if value { self.one } else { self.zero }
    }

    /// Ticks the line is held low after the last bit
    pub const fn reset_ticks(&self) -> u32 {
        self.reset_ticks
    }

    /// Number of overflows needed to send `bytes` followed by the reset
    pub fn frame_ticks(&self, bytes: &[u8]) -> u64 {
        let data: u64 = bytes
            .iter()
            .map(|byte| {
                let ones = u64::from(byte.count_ones());
                let zeros = 8 - ones;
                ones * u64::from(self.one.total) + zeros * u64::from(self.zero.total)
            })
            .sum();
        data + u64::from(self.reset_ticks)
    }

    /// Wall time needed to send `bytes` followed by the reset
    ///
    /// Rounded up to whole microseconds.
    pub fn frame_duration(&self, bytes: &[u8]) -> Duration {
        #[allow(clippy::cast_precision_loss)]
        let nanos = self.frame_ticks(bytes) as f64 * self.tick_period_ns;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let micros = libm::ceil(nanos / 1_000.0) as u64;
        Duration::from_micros(micros)
    }
}

/// Resolve `timing` against a counter running at `counter_frequency_hz`
/// with the default [`Tolerance`]
pub fn resolve(
    timing: &ProtocolTiming,
    counter_frequency_hz: u32,
) -> Result<ResolvedTiming, TimingError> {
    resolve_with_tolerance(timing, counter_frequency_hz, Tolerance::DEFAULT)
}

/// Resolve `timing` against a counter running at `counter_frequency_hz`
///
/// The tick is the largest multiple of the counter period that fits in the
/// shortest bit duration. Every bit duration is then rebuilt from whole
/// ticks (rounding down, as the transmitter does) and compared with the
/// requested value.
pub fn resolve_with_tolerance(
    timing: &ProtocolTiming,
    counter_frequency_hz: u32,
    tolerance: Tolerance,
) -> Result<ResolvedTiming, TimingError> {
    if counter_frequency_hz == 0 {
        return Err(TimingError::ZeroFrequency);
    }
    let counter_period = NANOS_PER_SECOND / f64::from(counter_frequency_hz);

    let shortest_ns = timing.shortest_ns();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let top = libm::floor(f64::from(shortest_ns) / counter_period + TICK_EPSILON) as u32;
    if top == 0 {
        return Err(TimingError::Unrepresentable { shortest_ns });
    }
    let tick_period_ns = counter_period * f64::from(top);

    for (param, duration) in timing.bit_durations() {
        let produced = f64::from(whole_ticks(duration, tick_period_ns)) * tick_period_ns;
        if libm::fabs(produced - f64::from(duration)) > f64::from(tolerance.bit_ns) {
            return Err(TimingError::OutOfTolerance {
                param,
                required_ns: duration,
                produced_ns: round_ns(produced),
            });
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let reset_ticks =
        (libm::ceil(f64::from(timing.reset_ns) / tick_period_ns - TICK_EPSILON) as u32).max(1);
    let produced_reset = f64::from(reset_ticks) * tick_period_ns;
    if produced_reset - f64::from(timing.reset_ns) > f64::from(tolerance.reset_ns) {
        return Err(TimingError::OutOfTolerance {
            param: TimingParam::Reset,
            required_ns: timing.reset_ns,
            produced_ns: round_ns(produced_reset),
        });
    }

    Ok(ResolvedTiming {
        tick_period_ns,
        top,
        zero: BitTicks {
            high: whole_ticks(timing.t0h_ns, tick_period_ns),
            total: whole_ticks(timing.t0h_ns.saturating_add(timing.t0l_ns), tick_period_ns),
        },
        one: BitTicks {
            high: whole_ticks(timing.t1h_ns, tick_period_ns),
            total: whole_ticks(timing.t1h_ns.saturating_add(timing.t1l_ns), tick_period_ns),
        },
        reset_ticks,
    })
}

/// Whole ticks in `duration_ns`, rounding down
fn whole_ticks(duration_ns: u32, tick_period_ns: f64) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ticks = libm::floor(f64::from(duration_ns) / tick_period_ns + TICK_EPSILON) as u32;
    ticks
}

fn round_ns(nanos: f64) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = libm::round(nanos) as u32;
    rounded
}
