use esp_idf_svc::hal::gpio::AnyOutputPin;
use esp_idf_svc::hal::ledc::config::TimerConfig;
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, CHANNEL0, CHANNEL1, CHANNEL2, TIMER0};
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::sys::EspError;
use log::{info, warn};
use rgbled_core::channel::{PwmOutput, PwmPins};
use rgbled_core::{ChannelError, HalPwm};

/// Opens LEDC PWM outputs on GPIO numbers, one LEDC channel per pin, all
/// sharing a single timer. Only GPIOs handed over in `gpios` can be opened.
pub struct LedcPins {
    timer: LedcTimerDriver<'static, TIMER0>,
    frequency_hz: u32,
    gpios: Vec<(u32, AnyOutputPin)>,
    ch0: Option<CHANNEL0>,
    ch1: Option<CHANNEL1>,
    ch2: Option<CHANNEL2>,
}

impl LedcPins {
    pub fn new(
        timer: TIMER0,
        channels: (CHANNEL0, CHANNEL1, CHANNEL2),
        gpios: Vec<(u32, AnyOutputPin)>,
        frequency_hz: u32,
    ) -> Result<Self, EspError> {
        let config = TimerConfig::default().frequency(frequency_hz.Hz());
        let timer = LedcTimerDriver::new(timer, &config)?;
        info!("LEDC timer running at {} Hz", frequency_hz);
        Ok(Self {
            timer,
            frequency_hz,
            gpios,
            ch0: Some(channels.0),
            ch1: Some(channels.1),
            ch2: Some(channels.2),
        })
    }

    fn driver(&mut self, pin: AnyOutputPin) -> Result<LedcDriver<'static>, ChannelError> {
        let result = if let Some(ch) = self.ch0.take() {
            LedcDriver::new(ch, &self.timer, pin)
        } else if let Some(ch) = self.ch1.take() {
            LedcDriver::new(ch, &self.timer, pin)
        } else if let Some(ch) = self.ch2.take() {
            LedcDriver::new(ch, &self.timer, pin)
        } else {
            return Err(ChannelError::Bus("no free LEDC channel".to_string()));
        };
        result.map_err(|e| ChannelError::Bus(format!("{e:?}")))
    }
}

impl PwmPins for LedcPins {
    fn open(&mut self, pin: u32, frequency_hz: u32) -> Result<Box<dyn PwmOutput>, ChannelError> {
        if frequency_hz != self.frequency_hz {
            warn!(
                "GPIO{} asked for {} Hz, LEDC timer is fixed at {} Hz",
                pin, frequency_hz, self.frequency_hz
            );
        }
        let slot = self
            .gpios
            .iter()
            .position(|(n, _)| *n == pin)
            .ok_or_else(|| ChannelError::Bus(format!("GPIO{pin} is not available for PWM")))?;
        let (_, gpio) = self.gpios.swap_remove(slot);
        let driver = self.driver(gpio)?;
        info!("LEDC output opened on GPIO{}", pin);
        Ok(Box::new(HalPwm::new(driver)))
    }
}
