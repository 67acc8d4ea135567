//! Scanned samples and their colors.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// RGB color with 8-bit components.
///
/// Scanner buffers carry colors as floats in `[0, 1]`; this type is the
/// display-range form every cloud stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanColor {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
}

impl ScanColor {
    /// Create a new color from RGB components.
    ///
    /// # Example
    ///
    /// ```
    /// use scan_types::ScanColor;
    ///
    /// let red = ScanColor::new(255, 0, 0);
    /// assert_eq!(red.r, 255);
    /// ```
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from normalized channels in `[0, 1]`.
    ///
    /// Each channel is multiplied by 255 and rounded to the nearest integer,
    /// ties away from zero. Out-of-range input is clamped; NaN maps to 0.
    ///
    /// # Example
    ///
    /// ```
    /// use scan_types::ScanColor;
    ///
    /// let color = ScanColor::from_unit(1.0, 0.5, 0.0);
    /// assert_eq!(color, ScanColor::new(255, 128, 0));
    /// ```
    #[inline]
    #[must_use]
    pub fn from_unit(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: unit_to_channel(r),
            g: unit_to_channel(g),
            b: unit_to_channel(b),
        }
    }

    /// Convert to normalized channels in `[0, 1]`.
    ///
    /// `ScanColor::from_unit` applied to the result returns `self` exactly.
    ///
    /// # Example
    ///
    /// ```
    /// use scan_types::ScanColor;
    ///
    /// let color = ScanColor::new(255, 51, 0);
    /// let (r, g, b) = color.to_unit();
    /// assert_eq!(ScanColor::from_unit(r, g, b), color);
    /// ```
    #[inline]
    #[must_use]
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }

    /// Pack into a `0x00RRGGBB` integer.
    ///
    /// # Example
    ///
    /// ```
    /// use scan_types::ScanColor;
    ///
    /// assert_eq!(ScanColor::RED.packed(), 255 << 16);
    /// ```
    #[inline]
    #[must_use]
    pub const fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Unpack from a `0x00RRGGBB` integer. The top byte is ignored.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_packed(packed: u32) -> Self {
        Self {
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }

    /// Black color (0, 0, 0).
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// White color (255, 255, 255).
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Red color (255, 0, 0).
    pub const RED: Self = Self::new(255, 0, 0);
}

impl Default for ScanColor {
    fn default() -> Self {
        Self::BLACK
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
// Truncation and sign loss are safe: value is clamped to [0, 255] first
fn unit_to_channel(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// One scanned sample: a position and a color.
///
/// # Example
///
/// ```
/// use scan_types::{Point, ScanColor};
///
/// let p = Point::new(1.0, 2.0, 3.0, ScanColor::WHITE);
/// assert_eq!(p.y(), 2.0);
/// assert_eq!(p.color.g, 255);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    /// Position in real-world units.
    pub position: Point3<f32>,
    /// Display-range color.
    pub color: ScanColor,
}

impl Point {
    /// Create a point from coordinates and a color.
    #[inline]
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32, color: ScanColor) -> Self {
        Self {
            position: Point3::new(x, y, z),
            color,
        }
    }

    /// Create a black point from coordinates.
    #[inline]
    #[must_use]
    pub fn from_coords(x: f32, y: f32, z: f32) -> Self {
        Self::new(x, y, z, ScanColor::BLACK)
    }

    /// X coordinate.
    #[inline]
    #[must_use]
    pub fn x(&self) -> f32 {
        self.position.x
    }

    /// Y coordinate.
    #[inline]
    #[must_use]
    pub fn y(&self) -> f32 {
        self.position.y
    }

    /// Z coordinate.
    #[inline]
    #[must_use]
    pub fn z(&self) -> f32 {
        self.position.z
    }

    /// Returns a copy of this point with a different color.
    #[inline]
    #[must_use]
    pub const fn with_color(mut self, color: ScanColor) -> Self {
        self.color = color;
        self
    }
}

/// Which scanner camera a sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    /// Left camera.
    Left,
    /// Right camera.
    Right,
}

impl Side {
    /// Both sides in emission order.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    /// Position of this side in emission order (left = 0, right = 1).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    /// The other side.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn from_unit_rounds_to_nearest() {
        assert_eq!(ScanColor::from_unit(0.0, 1.0, 0.5), ScanColor::new(0, 255, 128));
        // 0.1 * 255 = 25.5 rounds away from zero
        assert_eq!(ScanColor::from_unit(0.1, 0.0, 0.0).r, 26);
        assert_eq!(ScanColor::from_unit(0.098, 0.0, 0.0).r, 25);
    }

    #[test]
    fn from_unit_clamps() {
        let c = ScanColor::from_unit(-0.5, 2.0, f32::NAN);
        assert_eq!(c, ScanColor::new(0, 255, 0));
    }

    #[test]
    fn unit_roundtrip_is_exact_for_every_channel_value() {
        for v in 0..=255u8 {
            let c = ScanColor::new(v, 255 - v, v / 2);
            let (r, g, b) = c.to_unit();
            assert_eq!(ScanColor::from_unit(r, g, b), c);
        }
    }

    #[test]
    fn packed_layout() {
        let c = ScanColor::new(0x12, 0x34, 0x56);
        assert_eq!(c.packed(), 0x0012_3456);
        assert_eq!(ScanColor::from_packed(0xff12_3456), c);
    }

    #[test]
    fn point_accessors() {
        let p = Point::new(1.5, -2.0, 3.25, ScanColor::RED);
        assert_relative_eq!(p.x(), 1.5);
        assert_relative_eq!(p.y(), -2.0);
        assert_relative_eq!(p.z(), 3.25);
        assert_eq!(p.with_color(ScanColor::WHITE).color, ScanColor::WHITE);
    }

    #[test]
    fn side_index_and_opposite() {
        assert_eq!(Side::Left.index(), 0);
        assert_eq!(Side::Right.index(), 1);
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Side::ALL, [Side::Left, Side::Right]);
    }
}
