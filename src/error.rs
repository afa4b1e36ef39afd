use derive_more::{Display, Error};

use crate::timing::TimingError;

/// Crate result type
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Hardware collaborator that reported a failure
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    /// The data line could not be driven
    #[display("data line driver failure")]
    Line,
    /// The tick counter rejected an operation
    #[display("tick counter driver failure")]
    Counter,
}

/// Errors reported by the strip controller and its pixel buffer
///
/// None of these are retried by the crate; they are local to the strip
/// instance that reported them.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The protocol timing cannot be produced with the available counter
    #[display("{_0}")]
    Timing(#[error(not(source))] TimingError),
    /// The pixel buffers could not be allocated
    #[display("unable to allocate the pixel buffer")]
    OutOfMemory,
    /// The color format or color type is not supported by this strip
    #[display("unsupported color format")]
    UnsupportedColorFormat,
    /// The strip has not been initialized
    #[display("LED strip not yet initialized")]
    NotInitialized,
    /// A pixel index is outside of the strip
    #[display("pixel index {index} is out of range ({count})")]
    IndexOutOfRange { index: usize, count: usize },
    /// A pixel range is reversed or not backed by enough colors
    #[display("invalid pixel range {start}..{end}")]
    InvalidRange { start: usize, end: usize },
    /// A transmission is already in flight
    #[display("a transmission is already in progress")]
    DeviceBusy,
    /// A hardware driver failed
    #[display("{_0}")]
    Device(#[error(not(source))] DeviceError),
}

impl From<TimingError> for Error {
    fn from(error: TimingError) -> Self {
        Self::Timing(error)
    }
}

impl From<DeviceError> for Error {
    fn from(error: DeviceError) -> Self {
        Self::Device(error)
    }
}
