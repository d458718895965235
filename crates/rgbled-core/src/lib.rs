//! Color driver for three-channel PWM RGB LEDs.
//!
//! Maps a color, given either as an `(r, g, b)` tuple or a packed `0xRRGGBB`
//! value, onto the duty cycles of three PWM channels, inverting them for
//! common-anode LEDs. Channels can be plain PWM outputs (anything
//! implementing `embedded_hal::pwm::SetDutyCycle` via [`channel::HalPwm`]),
//! outputs of an external PWM controller, or an auxiliary peripheral that
//! takes normalized analog writes.

pub mod channel;
pub mod color;
pub mod config;
pub mod driver;
pub mod error;

pub use channel::{ChannelDescriptor, ChannelKind, Controller, HalPwm, Resolver};
pub use color::{ColorValue, Component, Polarity, Rgb};
pub use driver::ColorDriver;
pub use error::{ChannelError, ColorError, Error, Result};
