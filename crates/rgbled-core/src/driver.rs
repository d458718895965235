use log::{debug, info, warn};

use crate::channel::{Channel, ChannelDescriptor, ChannelKind, Resolver};
use crate::color::{ColorValue, Component, Polarity};
use crate::error::{Error, Result};

/// Drives a three-channel RGB LED.
///
/// The last color applied is cached and returned by [`ColorDriver::color`];
/// the hardware is never read back. Dropping the driver runs
/// [`ColorDriver::deinit`].
#[derive(Debug)]
pub struct ColorDriver {
    channels: [Channel; 3],
    polarity: Polarity,
    current: ColorValue,
}

impl ColorDriver {
    /// Resolve the [red, green, blue] descriptors and switch the LED off.
    ///
    /// Each channel is zeroed as it is resolved, then the off color is applied
    /// under the configured polarity (a common-anode LED ends at full duty).
    /// Channels resolved before a failing descriptor are released again, so
    /// no half-built driver is left holding hardware.
    pub fn new(
        descriptors: [ChannelDescriptor; 3],
        polarity: Polarity,
        resolver: &mut Resolver<'_>,
    ) -> Result<Self> {
        let mut resolved: Vec<Channel> = Vec::with_capacity(3);
        for (component, descriptor) in Component::ALL.into_iter().zip(descriptors) {
            match resolver.resolve(component, descriptor) {
                Ok(channel) => resolved.push(channel),
                Err(e) => {
                    for channel in &mut resolved {
                        channel.release();
                    }
                    return Err(e);
                }
            }
        }
        let channels: [Channel; 3] = match resolved.try_into() {
            Ok(channels) => channels,
            Err(_) => unreachable!("one channel is resolved per component"),
        };

        info!(
            "RGB LED ready: {:?}/{:?}/{:?}, {:?}",
            channels[0].kind(),
            channels[1].kind(),
            channels[2].kind(),
            polarity
        );

        let mut driver = Self {
            channels,
            polarity,
            current: ColorValue::OFF,
        };
        driver.set_color(ColorValue::OFF)?;
        Ok(driver)
    }

    /// Apply a color to the LED.
    ///
    /// The value is validated before any channel is touched. Channels are
    /// written red, green, blue; if a write fails the earlier channels keep
    /// their new duty, the later ones keep their old one, and the cached
    /// color is left unchanged.
    pub fn set_color(&mut self, value: impl Into<ColorValue>) -> Result<()> {
        let value = value.into();
        let duties = value.to_rgb()?.duty_cycles(self.polarity);

        for (component, duty) in Component::ALL.into_iter().zip(duties) {
            self.channels[component.index()]
                .write(duty)
                .map_err(|source| {
                    warn!("{component} channel write failed: {source}");
                    Error::ChannelWriteFailure {
                        channel: component,
                        source,
                    }
                })?;
        }

        debug!("color set to {value:?} (duty {duties:?})");
        self.current = value;
        Ok(())
    }

    /// The last successfully applied color, in the form it was given.
    pub fn color(&self) -> ColorValue {
        self.current
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn channel_kinds(&self) -> [ChannelKind; 3] {
        [
            self.channels[0].kind(),
            self.channels[1].kind(),
            self.channels[2].kind(),
        ]
    }

    /// True once every channel has been released.
    pub fn is_released(&self) -> bool {
        self.channels.iter().all(Channel::is_released)
    }

    /// Switch the LED off and release the hardware. Safe to call repeatedly;
    /// channels that were already released are skipped.
    pub fn deinit(&mut self) {
        let released = self
            .channels
            .iter_mut()
            .map(Channel::release)
            .filter(|&did_release| did_release)
            .count();
        self.current = ColorValue::OFF;
        if released > 0 {
            info!("RGB LED released ({released} channels)");
        } else {
            debug!("RGB LED already released");
        }
    }
}

impl Drop for ColorDriver {
    fn drop(&mut self) {
        self.deinit();
    }
}
