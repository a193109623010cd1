//! Validated color values accepted by the rendering core.
//!
//! All components are straight (non-premultiplied) floats in `[0, 1]`.
//! Constructors reject NaN and out-of-range input instead of clamping, so a
//! value of these types is always safe to hand to the GPU.

use std::fmt;

/// Rejected color component.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ColorError {
    OutOfRange { channel: char, value: f32 },
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::OutOfRange { channel, value } => {
                write!(f, "color channel '{channel}' = {value} is outside [0, 1]")
            }
        }
    }
}

impl std::error::Error for ColorError {}

#[inline]
const fn check(channel: char, value: f32) -> Result<f32, ColorError> {
    // NaN fails both comparisons.
    if value >= 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(ColorError::OutOfRange { channel, value })
    }
}

/// RGB triple used for the triangle fill uniform.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rgb {
    r: f32,
    g: f32,
    b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Result<Self, ColorError> {
        match (check('r', r), check('g', g), check('b', b)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self { r, g, b }),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => Err(e),
        }
    }

    /// Creates a color from 8-bit channels (`0`–`255`), as produced by color pickers.
    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// RGBA value used to reset the color buffer before drawing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearColor {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
}

impl ClearColor {
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Result<Self, ColorError> {
        match (check('r', r), check('g', g), check('b', b), check('a', a)) {
            (Ok(r), Ok(g), Ok(b), Ok(a)) => Ok(Self { r, g, b, a }),
            (Err(e), _, _, _) | (_, Err(e), _, _) | (_, _, Err(e), _) | (_, _, _, Err(e)) => Err(e),
        }
    }

    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<ClearColor> for wgpu::Color {
    fn from(c: ClearColor) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_accepts_boundaries() {
        let black = Rgb::new(0.0, 0.0, 0.0).unwrap();
        let white = Rgb::new(1.0, 1.0, 1.0).unwrap();
        assert_eq!(black.to_array(), [0.0, 0.0, 0.0]);
        assert_eq!(white.to_array(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn rgb_rejects_out_of_range() {
        assert_eq!(
            Rgb::new(0.5, 1.5, 0.0),
            Err(ColorError::OutOfRange { channel: 'g', value: 1.5 })
        );
        assert!(Rgb::new(-0.01, 0.0, 0.0).is_err());
    }

    #[test]
    fn rgb_rejects_nan() {
        assert!(Rgb::new(0.0, 0.0, f32::NAN).is_err());
    }

    #[test]
    fn clear_color_accepts_boundaries() {
        let c = ClearColor::new(0.0, 1.0, 0.0, 1.0).unwrap();
        assert_eq!(c.to_array(), [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn clear_color_checks_alpha() {
        let err = ClearColor::new(0.2, 0.2, 0.2, 2.0).unwrap_err();
        assert_eq!(err, ColorError::OutOfRange { channel: 'a', value: 2.0 });
    }

    #[test]
    fn from_u8_maps_full_range() {
        assert_eq!(Rgb::from_u8(0, 255, 0).to_array(), [0.0, 1.0, 0.0]);
        assert_eq!(ClearColor::from_u8(255, 255, 255, 255).to_array(), [1.0; 4]);
    }
}
