mod format;

pub use format::{ColorFormat, Pixel};
use smart_leds::{RGB8, RGBW};
pub use smart_leds::White;

pub type Rgb = RGB8;
pub type Rgbw = RGBW<u8>;
