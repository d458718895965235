use std::thread::sleep;
use std::time::Duration;

use log::{info, warn};
use rgbled_core::{ColorDriver, ColorValue, Rgb};

const HOLD: Duration = Duration::from_secs(1);
const RAINBOW_STEP: Duration = Duration::from_millis(100);

/// Color wheel: red to green to blue and back to red as `pos` goes 0..=255.
pub fn wheel(pos: u8) -> Rgb {
    match pos {
        0..=84 => Rgb::new(255 - pos * 3, pos * 3, 0),
        85..=169 => {
            let pos = pos - 85;
            Rgb::new(0, 255 - pos * 3, pos * 3)
        }
        _ => {
            let pos = pos - 170;
            Rgb::new(pos * 3, 0, 255 - pos * 3)
        }
    }
}

fn show(led: &mut ColorDriver, color: impl Into<ColorValue>) {
    let color = color.into();
    if let Err(e) = led.set_color(color) {
        warn!("failed to show {:?}: {}", color, e);
    }
}

/// One pass through the primaries (as tuples, then packed) and a rainbow.
pub fn cycle(led: &mut ColorDriver) {
    for (i, color) in [Rgb::RED, Rgb::GREEN, Rgb::BLUE].into_iter().enumerate() {
        info!("setting color {}", i + 1);
        show(led, color);
        sleep(HOLD);
    }

    for packed in [0xFF0000u32, 0x00FF00, 0x0000FF] {
        show(led, packed);
        sleep(HOLD);
    }

    for pos in 0..=u8::MAX {
        show(led, wheel(pos));
        sleep(RAINBOW_STEP);
    }
}
