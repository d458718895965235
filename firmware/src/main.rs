mod demo;
mod ledc;

use esp_idf_svc::hal::gpio::OutputPin;
use esp_idf_svc::hal::prelude::*;
use log::{error, info};
use rgbled_core::config::Config;
use rgbled_core::{ColorDriver, Resolver};

use crate::ledc::LedcPins;

const BOARD_CONFIG: &str = include_str!("../rgbled.toml");

fn main() {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("RGB LED demo booting...");

    if let Err(e) = run() {
        error!("RGB LED demo stopped: {e}");
    }

    loop {
        std::thread::sleep(std::time::Duration::from_secs(5));
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_toml(BOARD_CONFIG)?;
    let peripherals = Peripherals::take()?;
    let ledc = peripherals.ledc;
    let gpio = peripherals.pins;
    let gpios = vec![
        (4, gpio.gpio4.downgrade_output()),
        (5, gpio.gpio5.downgrade_output()),
        (6, gpio.gpio6.downgrade_output()),
        (7, gpio.gpio7.downgrade_output()),
    ];

    let mut pins = LedcPins::new(
        ledc.timer0,
        (ledc.channel0, ledc.channel1, ledc.channel2),
        gpios,
        config.frequency_hz(),
    )?;
    let mut resolver = Resolver::new()
        .with_pins(&mut pins)
        .frequency(config.frequency_hz());
    let mut led = ColorDriver::new(config.descriptors(), config.polarity(), &mut resolver)?;

    if let Some(color) = config.initial_color() {
        led.set_color(color)?;
    }

    info!("Initialization complete");

    loop {
        demo::cycle(&mut led);
    }
}
