use std::fmt;

use crate::error::{Error, Result};

/// Largest value representable by a packed 24-bit color.
pub const PACKED_MAX: u32 = 0xFF_FFFF;

/// Full-scale duty cycle.
pub const DUTY_MAX: u16 = u16::MAX;

/// 65535 / 255, exactly.
const DUTY_PER_STEP: u16 = 257;

/// Position of a channel within the [red, green, blue] triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Red,
    Green,
    Blue,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::Red, Component::Green, Component::Blue];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
            Self::Blue => write!(f, "blue"),
        }
    }
}

/// LED wiring. Common-anode LEDs light when the pin is pulled low, so their
/// duty cycle is inverted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Polarity {
    #[default]
    CommonCathode,
    CommonAnode,
}

impl Polarity {
    pub const fn is_inverted(self) -> bool {
        matches!(self, Self::CommonAnode)
    }
}

impl From<bool> for Polarity {
    /// `true` selects common-anode (inverted PWM).
    fn from(inverted: bool) -> Self {
        if inverted {
            Self::CommonAnode
        } else {
            Self::CommonCathode
        }
    }
}

/// A color as supplied by the caller, before validation.
///
/// Tuple components are wider than `u8` so that out-of-range input can be
/// reported instead of silently truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorValue {
    Tuple(i32, i32, i32),
    Packed24(u32),
}

impl ColorValue {
    pub const OFF: ColorValue = ColorValue::Tuple(0, 0, 0);

    /// Validate and split into 8-bit components. Has no side effects, so
    /// callers may use it to pre-check a value before handing it to a driver.
    pub fn to_rgb(self) -> Result<Rgb> {
        match self {
            Self::Packed24(value) => Rgb::from_packed(value),
            Self::Tuple(r, g, b) => Ok(Rgb::new(
                checked_component(Component::Red, r)?,
                checked_component(Component::Green, g)?,
                checked_component(Component::Blue, b)?,
            )),
        }
    }

    pub fn validate(self) -> Result<()> {
        self.to_rgb().map(|_| ())
    }
}

impl From<(u8, u8, u8)> for ColorValue {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::Tuple(r.into(), g.into(), b.into())
    }
}

impl From<u32> for ColorValue {
    fn from(value: u32) -> Self {
        Self::Packed24(value)
    }
}

impl From<Rgb> for ColorValue {
    fn from(c: Rgb) -> Self {
        Self::Tuple(c.r.into(), c.g.into(), c.b.into())
    }
}

fn checked_component(channel: Component, value: i32) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::InvalidComponent { channel, value })
}

/// Validated 8-bit RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Split a packed `0xRRGGBB` value. Bits above 23 are rejected.
    pub fn from_packed(value: u32) -> Result<Self> {
        if value > PACKED_MAX {
            return Err(Error::OutOfRange(value));
        }
        Ok(Self::new(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        ))
    }

    pub const fn to_packed(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub const fn components(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Duty cycles for [red, green, blue] under the given wiring.
    pub fn duty_cycles(self, polarity: Polarity) -> [u16; 3] {
        self.components().map(|c| apply_polarity(to_duty(c), polarity))
    }
}

/// Scale an 8-bit component onto the full 16-bit duty range.
///
/// `c * 257` is exact: 0 maps to 0 and 255 maps to 65535.
pub const fn to_duty(c: u8) -> u16 {
    c as u16 * DUTY_PER_STEP
}

/// Invert the duty cycle for common-anode wiring.
pub fn apply_polarity(duty: u16, polarity: Polarity) -> u16 {
    if !polarity.is_inverted() {
        return duty;
    }
    // Signed difference so a duty from another conversion path can never
    // wrap; the magnitude always fits back into u16.
    (i32::from(DUTY_MAX) - i32::from(duty)).unsigned_abs() as u16
}

/// Normalize a duty cycle onto `[0.0, 1.0]` for analog-write backends.
pub fn duty_to_level(duty: u16) -> f64 {
    f64::from(duty) / f64::from(DUTY_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_duty_endpoints_are_exact() {
        assert_eq!(to_duty(0), 0);
        assert_eq!(to_duty(1), 257);
        assert_eq!(to_duty(128), 32896);
        assert_eq!(to_duty(255), 65535);
    }

    #[test]
    fn to_duty_matches_rounded_linear_map() {
        for c in 0..=255u8 {
            let rounded = (f64::from(c) * 65535.0 / 255.0).round() as u16;
            assert_eq!(to_duty(c), rounded, "component {c}");
        }
    }

    #[test]
    fn polarity_inverts_only_common_anode() {
        assert_eq!(apply_polarity(0, Polarity::CommonCathode), 0);
        assert_eq!(apply_polarity(65535, Polarity::CommonCathode), 65535);
        assert_eq!(apply_polarity(0, Polarity::CommonAnode), 65535);
        assert_eq!(apply_polarity(65535, Polarity::CommonAnode), 0);
        assert_eq!(apply_polarity(257, Polarity::CommonAnode), 65278);
    }

    #[test]
    fn polarity_from_bool() {
        assert_eq!(Polarity::from(false), Polarity::CommonCathode);
        assert_eq!(Polarity::from(true), Polarity::CommonAnode);
    }

    #[test]
    fn packed_decomposition() {
        let c = Rgb::from_packed(0xFF4023).unwrap();
        assert_eq!(c, Rgb::new(0xFF, 0x40, 0x23));
        assert_eq!(c.to_packed(), 0xFF4023);
    }

    #[test]
    fn packed_above_24_bits_is_out_of_range() {
        assert!(matches!(
            Rgb::from_packed(0x100_0000),
            Err(Error::OutOfRange(0x100_0000))
        ));
        assert!(Rgb::from_packed(PACKED_MAX).is_ok());
    }

    #[test]
    fn tuple_and_packed_forms_agree() {
        let tuple = ColorValue::Tuple(255, 64, 35).to_rgb().unwrap();
        let packed = ColorValue::Packed24(0xff4023).to_rgb().unwrap();
        assert_eq!(tuple, packed);
    }

    #[test]
    fn tuple_component_out_of_range() {
        let err = ColorValue::Tuple(256, 0, 0).validate().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidComponent {
                channel: Component::Red,
                value: 256
            }
        ));

        let err = ColorValue::Tuple(0, 0, -1).validate().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidComponent {
                channel: Component::Blue,
                value: -1
            }
        ));
    }

    #[test]
    fn duty_cycles_for_green_common_anode() {
        let duties = Rgb::GREEN.duty_cycles(Polarity::CommonAnode);
        assert_eq!(duties, [65535, 0, 65535]);
    }

    #[test]
    fn duty_to_level_bounds() {
        assert_eq!(duty_to_level(0), 0.0);
        assert_eq!(duty_to_level(65535), 1.0);
        assert!((duty_to_level(32896) - 0.50196).abs() < 1e-4);
    }

    #[test]
    fn component_display() {
        assert_eq!(Component::Green.to_string(), "green");
        assert_eq!(Component::Blue.index(), 2);
    }
}
