use thiserror::Error;

use crate::color::Component;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid {channel} channel descriptor: {reason}")]
    InvalidChannelDescriptor {
        channel: Component,
        reason: &'static str,
    },

    #[error("packed color {0:#x} uses bits above 23")]
    OutOfRange(u32),

    #[error("{channel} component {value} outside 0..=255")]
    InvalidComponent { channel: Component, value: i32 },

    #[error("{channel} channel write failed: {source}")]
    ChannelWriteFailure {
        channel: Component,
        #[source]
        source: ChannelError,
    },
}

/// Transport-level failure reported by a channel backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    #[error("bus error: {0}")]
    Bus(String),

    #[error("channel disconnected")]
    Disconnected,

    #[error("channel handle is borrowed elsewhere")]
    Busy,

    #[error("channel already released")]
    Released,

    #[error("PWM peripheral error: {0:?}")]
    Hal(embedded_hal::pwm::ErrorKind),
}

/// Public name for the driver's error type.
pub type ColorError = Error;

pub type Result<T> = std::result::Result<T, Error>;
