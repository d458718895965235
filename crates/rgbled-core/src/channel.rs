//! Output channels and their construction-time resolution.
//!
//! A channel is one of three backends:
//! - a PWM output driven directly (owned by the driver, or shared with the
//!   caller when it was handed in already built),
//! - one output of an external PWM controller such as a PCA9685,
//! - one output of an auxiliary peripheral that only understands normalized
//!   analog writes (for example an ESP32 co-processor reached over SPI).
//!
//! The backend is picked once, when a [`ChannelDescriptor`] is resolved, so
//! writes never have to inspect what they are talking to.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use embedded_hal::pwm::{Error as _, SetDutyCycle};
use log::{debug, warn};

use crate::color::{self, Component, DUTY_MAX};
use crate::error::{ChannelError, Error, Result};

/// PWM frequency used when a raw pin has to be turned into an output.
pub const DEFAULT_FREQUENCY_HZ: u32 = 500;

/// A PWM output taking a full-scale 16-bit duty cycle.
pub trait PwmOutput {
    fn set_duty_cycle(&mut self, duty: u16) -> std::result::Result<(), ChannelError>;

    /// Free the underlying hardware. Called at most once per channel.
    fn release(&mut self);
}

/// External PWM controller multiplexing several outputs (e.g. an I2C
/// expander).
pub trait PwmController {
    fn has_channel(&self, index: u8) -> bool;

    fn set_duty_cycle(&mut self, index: u8, duty: u16) -> std::result::Result<(), ChannelError>;

    fn release(&mut self, _index: u8) {}
}

/// External peripheral exposing an analog write taking a level in
/// `[0.0, 1.0]`.
pub trait AnalogController {
    fn has_channel(&self, _index: u8) -> bool {
        true
    }

    fn write(&mut self, index: u8, level: f64) -> std::result::Result<(), ChannelError>;

    fn release(&mut self, _index: u8) {}
}

/// Builds PWM outputs over raw pins.
pub trait PwmPins {
    fn open(
        &mut self,
        pin: u32,
        frequency_hz: u32,
    ) -> std::result::Result<Box<dyn PwmOutput>, ChannelError>;
}

pub type SharedOutput = Rc<RefCell<dyn PwmOutput>>;
pub type SharedPwmController = Rc<RefCell<dyn PwmController>>;
pub type SharedAnalogController = Rc<RefCell<dyn AnalogController>>;

/// External controller that bare channel indices are bound through.
#[derive(Clone)]
pub enum Controller {
    Pwm(SharedPwmController),
    Analog(SharedAnalogController),
}

/// What the caller hands in for each of the three colors.
#[derive(Clone)]
pub enum ChannelDescriptor {
    /// An output the caller already built. Shared: the caller keeps a handle.
    Output(SharedOutput),
    /// A raw pin that still needs a PWM output built over it.
    Pin(u32),
    /// A channel index on the external [`Controller`].
    Index(u8),
}

impl fmt::Debug for ChannelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output(_) => write!(f, "Output(..)"),
            Self::Pin(pin) => write!(f, "Pin({pin})"),
            Self::Index(index) => write!(f, "Index({index})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    DirectPwm,
    MultiplexedPwm,
    AuxiliaryAnalog,
}

enum Backend {
    Owned(Box<dyn PwmOutput>),
    Shared(SharedOutput),
    Multiplexed {
        controller: SharedPwmController,
        index: u8,
    },
    Analog {
        controller: SharedAnalogController,
        index: u8,
    },
}

/// One resolved output channel.
pub struct Channel {
    backend: Backend,
    released: bool,
}

impl Channel {
    fn new(backend: Backend) -> Self {
        Self {
            backend,
            released: false,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        match self.backend {
            Backend::Owned(_) | Backend::Shared(_) => ChannelKind::DirectPwm,
            Backend::Multiplexed { .. } => ChannelKind::MultiplexedPwm,
            Backend::Analog { .. } => ChannelKind::AuxiliaryAnalog,
        }
    }

    /// True when the caller holds another handle to the same output.
    pub fn is_shared(&self) -> bool {
        matches!(self.backend, Backend::Shared(_))
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Write a full-scale duty cycle. Analog backends receive it normalized.
    pub fn write(&mut self, duty: u16) -> std::result::Result<(), ChannelError> {
        if self.released {
            return Err(ChannelError::Released);
        }
        match &mut self.backend {
            Backend::Owned(output) => output.set_duty_cycle(duty),
            Backend::Shared(output) => output
                .try_borrow_mut()
                .map_err(|_| ChannelError::Busy)?
                .set_duty_cycle(duty),
            Backend::Multiplexed { controller, index } => controller
                .try_borrow_mut()
                .map_err(|_| ChannelError::Busy)?
                .set_duty_cycle(*index, duty),
            Backend::Analog { controller, index } => controller
                .try_borrow_mut()
                .map_err(|_| ChannelError::Busy)?
                .write(*index, color::duty_to_level(duty)),
        }
    }

    /// Drive the output to zero and free the hardware.
    ///
    /// Returns `false` if the channel had already been released. Errors while
    /// zeroing are logged and otherwise ignored so teardown always completes.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        if let Err(e) = self.write(0) {
            warn!("failed to zero {:?} channel before release: {e}", self.kind());
        }
        match &mut self.backend {
            Backend::Owned(output) => output.release(),
            Backend::Shared(output) => match output.try_borrow_mut() {
                Ok(mut output) => output.release(),
                Err(_) => warn!("shared output busy, skipping release"),
            },
            Backend::Multiplexed { controller, index } => match controller.try_borrow_mut() {
                Ok(mut controller) => controller.release(*index),
                Err(_) => warn!("PWM controller busy, skipping release of channel {index}"),
            },
            Backend::Analog { controller, index } => match controller.try_borrow_mut() {
                Ok(mut controller) => controller.release(*index),
                Err(_) => warn!("analog controller busy, skipping release of channel {index}"),
            },
        }
        self.released = true;
        true
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("kind", &self.kind())
            .field("shared", &self.is_shared())
            .field("released", &self.released)
            .finish()
    }
}

/// Collaborators used to turn descriptors into channels.
pub struct Resolver<'a> {
    pins: Option<&'a mut dyn PwmPins>,
    controller: Option<Controller>,
    frequency_hz: u32,
}

impl Default for Resolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        Self {
            pins: None,
            controller: None,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
        }
    }

    pub fn with_pins(mut self, pins: &'a mut dyn PwmPins) -> Self {
        self.pins = Some(pins);
        self
    }

    pub fn with_controller(mut self, controller: Controller) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn frequency(mut self, frequency_hz: u32) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }

    /// Resolve a descriptor and switch the resulting channel off.
    pub fn resolve(&mut self, component: Component, descriptor: ChannelDescriptor) -> Result<Channel> {
        let invalid = |reason| Error::InvalidChannelDescriptor {
            channel: component,
            reason,
        };

        let backend = match descriptor {
            ChannelDescriptor::Output(output) => Backend::Shared(output),
            ChannelDescriptor::Pin(pin) => {
                let pins = self
                    .pins
                    .as_deref_mut()
                    .ok_or(invalid("raw pin given without a pin provider"))?;
                let output = pins.open(pin, self.frequency_hz).map_err(|e| {
                    warn!("cannot open PWM on pin {pin} for {component}: {e}");
                    invalid("pin does not support PWM output")
                })?;
                Backend::Owned(output)
            }
            ChannelDescriptor::Index(index) => match &self.controller {
                None => return Err(invalid("channel index given without a controller")),
                Some(Controller::Pwm(controller)) => {
                    let controller_ref = controller
                        .try_borrow()
                        .map_err(|_| invalid("PWM controller is borrowed elsewhere"))?;
                    if !controller_ref.has_channel(index) {
                        return Err(invalid("PWM controller has no such channel"));
                    }
                    drop(controller_ref);
                    Backend::Multiplexed {
                        controller: Rc::clone(controller),
                        index,
                    }
                }
                Some(Controller::Analog(controller)) => {
                    let controller_ref = controller
                        .try_borrow()
                        .map_err(|_| invalid("analog controller is borrowed elsewhere"))?;
                    if !controller_ref.has_channel(index) {
                        return Err(invalid("analog controller has no such channel"));
                    }
                    drop(controller_ref);
                    Backend::Analog {
                        controller: Rc::clone(controller),
                        index,
                    }
                }
            },
        };

        let mut channel = Channel::new(backend);
        debug!("resolved {component} channel as {:?}", channel.kind());
        if let Err(source) = channel.write(0) {
            channel.release();
            return Err(Error::ChannelWriteFailure {
                channel: component,
                source,
            });
        }
        Ok(channel)
    }
}

/// Adapts any `embedded-hal` PWM peripheral into a [`PwmOutput`], scaling
/// the full-scale duty onto the peripheral's own resolution.
pub struct HalPwm<P> {
    pwm: P,
}

impl<P: SetDutyCycle> HalPwm<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm }
    }

    pub fn into_inner(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> PwmOutput for HalPwm<P> {
    fn set_duty_cycle(&mut self, duty: u16) -> std::result::Result<(), ChannelError> {
        let scaled = scale_duty(duty, self.pwm.max_duty_cycle());
        self.pwm
            .set_duty_cycle(scaled)
            .map_err(|e| ChannelError::Hal(e.kind()))
    }

    fn release(&mut self) {
        if let Err(e) = self.pwm.set_duty_cycle_fully_off() {
            warn!("failed to switch PWM off on release: {:?}", e.kind());
        }
    }
}

/// Rescale a full-scale duty onto `0..=max`, rounding to nearest.
pub fn scale_duty(duty: u16, max: u16) -> u16 {
    if max == DUTY_MAX {
        return duty;
    }
    let full = u32::from(DUTY_MAX);
    ((u32::from(duty) * u32::from(max) + full / 2) / full) as u16
}
