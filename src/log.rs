//! Feature-gated diagnostics
//!
//! Messages go to `defmt` with the `defmt` feature and to `esp_println` with
//! the `esp32-log` feature. Without either, the arguments are only
//! type-checked.

macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::error!($($arg)*);
        #[cfg(feature = "esp32-log")]
        esp_println::println!($($arg)*);
        #[cfg(not(any(feature = "defmt", feature = "esp32-log")))]
        let _ = format_args!($($arg)*);
    }};
}

macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)*);
        #[cfg(feature = "esp32-log")]
        esp_println::println!($($arg)*);
        #[cfg(not(any(feature = "defmt", feature = "esp32-log")))]
        let _ = format_args!($($arg)*);
    }};
}

macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
        #[cfg(feature = "esp32-log")]
        esp_println::println!($($arg)*);
        #[cfg(not(any(feature = "defmt", feature = "esp32-log")))]
        let _ = format_args!($($arg)*);
    }};
}

pub(crate) use {log_debug, log_error, log_warn};

/// Log a driver failure and turn it into a crate error
pub(crate) fn device_failure<E: core::fmt::Debug>(
    device: crate::error::DeviceError,
    action: &str,
    error: E,
) -> crate::error::Error {
    #[cfg(feature = "defmt")]
    defmt::error!("unable to {}: {}", action, defmt::Debug2Format(&error));
    #[cfg(feature = "esp32-log")]
    esp_println::println!("unable to {}: {:?}", action, error);
    let _ = (action, error);
    device.into()
}
