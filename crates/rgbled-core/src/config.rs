use serde::Deserialize;

use crate::channel::{ChannelDescriptor, DEFAULT_FREQUENCY_HZ};
use crate::color::{ColorValue, Polarity, Rgb};
use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub led: LedConfig,
}

#[derive(Debug, Deserialize)]
pub struct LedConfig {
    pub red: ChannelSpec,
    pub green: ChannelSpec,
    pub blue: ChannelSpec,
    #[serde(default)]
    pub common_anode: bool,
    #[serde(default = "default_frequency")]
    pub frequency_hz: u32,
    #[serde(default)]
    pub initial_color: Option<u32>,
}

/// A channel as written in the config: a bare pin number, or
/// `{ channel = N }` for an output on the external controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChannelSpec {
    Pin(u32),
    Controller { channel: u8 },
}

impl From<ChannelSpec> for ChannelDescriptor {
    fn from(spec: ChannelSpec) -> Self {
        match spec {
            ChannelSpec::Pin(pin) => Self::Pin(pin),
            ChannelSpec::Controller { channel } => Self::Index(channel),
        }
    }
}

fn default_frequency() -> u32 {
    DEFAULT_FREQUENCY_HZ
}

const MIN_FREQUENCY_HZ: u32 = 1;
const MAX_FREQUENCY_HZ: u32 = 40_000_000;

impl Config {
    pub fn from_toml(s: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Descriptors in [red, green, blue] order.
    pub fn descriptors(&self) -> [ChannelDescriptor; 3] {
        [self.led.red, self.led.green, self.led.blue].map(ChannelDescriptor::from)
    }

    pub fn polarity(&self) -> Polarity {
        Polarity::from(self.led.common_anode)
    }

    pub fn frequency_hz(&self) -> u32 {
        self.led.frequency_hz
    }

    /// The color to show after start-up, if one is configured.
    pub fn initial_color(&self) -> Option<ColorValue> {
        self.led.initial_color.map(ColorValue::Packed24)
    }

    fn validate(&mut self) -> Result<()> {
        self.led.frequency_hz = self
            .led
            .frequency_hz
            .clamp(MIN_FREQUENCY_HZ, MAX_FREQUENCY_HZ);
        if let Some(value) = self.led.initial_color {
            Rgb::from_packed(value)?;
        }
        Ok(())
    }
}
