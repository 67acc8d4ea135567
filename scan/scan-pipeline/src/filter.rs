//! Geometric cropping.
//!
//! A [`Cut`] keeps the points on one side of an axis-aligned plane or of a
//! cylinder around the Z axis. The radial test compares `x² + y²` against
//! `threshold²`, ignoring z.

use std::fmt;
use std::str::FromStr;

use scan_types::{PairedCloud, Point};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::store::{CloudEntry, DenseCloud};

/// The quantity a cut compares against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// The x coordinate.
    X,
    /// The y coordinate.
    Y,
    /// The z coordinate.
    Z,
    /// Squared distance from the Z axis.
    Radial,
}

impl Axis {
    /// The token this axis is parsed from.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::Radial => "r",
        }
    }
}

impl FromStr for Axis {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "z" => Ok(Self::Z),
            "r" => Ok(Self::Radial),
            _ => Err(PipelineError::InvalidFilterMode {
                mode: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Which side of the threshold is kept. Both include the threshold itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Keep values `>=` the threshold.
    GreaterOrEqual,
    /// Keep values `<=` the threshold.
    LessOrEqual,
}

impl Direction {
    fn accepts(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterOrEqual => value >= threshold,
            Self::LessOrEqual => value <= threshold,
        }
    }
}

/// `true` selects `>=`, `false` selects `<=`.
impl From<bool> for Direction {
    fn from(greater: bool) -> Self {
        if greater {
            Self::GreaterOrEqual
        } else {
            Self::LessOrEqual
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
        })
    }
}

/// A crop predicate.
///
/// # Example
///
/// ```
/// use scan_pipeline::{Axis, Cut, Direction};
/// use scan_types::Point;
///
/// let cut = Cut::new(Axis::Radial, Direction::LessOrEqual, 2.0);
///
/// // 1² + 1² = 2 <= 2² = 4
/// assert!(cut.keeps(&Point::from_coords(1.0, 1.0, 50.0)));
/// assert!(!cut.keeps(&Point::from_coords(2.0, 1.0, 0.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cut {
    /// Compared quantity.
    pub axis: Axis,
    /// Kept side.
    pub direction: Direction,
    /// Threshold, in scanner units.
    pub threshold: f64,
}

impl Cut {
    /// Creates a cut.
    #[must_use]
    pub const fn new(axis: Axis, direction: Direction, threshold: f64) -> Self {
        Self {
            axis,
            direction,
            threshold,
        }
    }

    /// Returns true if `point` passes the cut.
    #[must_use]
    pub fn keeps(&self, point: &Point) -> bool {
        let (value, threshold) = match self.axis {
            Axis::X => (f64::from(point.x()), self.threshold),
            Axis::Y => (f64::from(point.y()), self.threshold),
            Axis::Z => (f64::from(point.z()), self.threshold),
            Axis::Radial => {
                let x = f64::from(point.x());
                let y = f64::from(point.y());
                (x * x + y * y, self.threshold * self.threshold)
            }
        };
        self.direction.accepts(value, threshold)
    }

    /// Keeps the passing points, in order.
    #[must_use]
    pub fn apply(&self, points: &[Point]) -> Vec<Point> {
        points.iter().copied().filter(|p| self.keeps(p)).collect()
    }

    /// Applies the cut to each side independently.
    #[must_use]
    pub fn apply_paired(&self, cloud: &PairedCloud) -> PairedCloud {
        cloud.map_sides(|_, points| self.apply(points))
    }

    /// Applies the cut to a dense cloud, producing an in-memory cloud.
    #[must_use]
    pub fn apply_dense(&self, cloud: &DenseCloud) -> DenseCloud {
        DenseCloud::Points(cloud.iter().filter(|p| self.keeps(p)).collect())
    }

    /// Applies the cut to an entry, keeping its shape.
    #[must_use]
    pub fn apply_entry(&self, entry: &CloudEntry) -> CloudEntry {
        match entry {
            CloudEntry::Paired(cloud) => CloudEntry::Paired(self.apply_paired(cloud)),
            CloudEntry::Dense(cloud) => CloudEntry::Dense(self.apply_dense(cloud)),
        }
    }
}

impl fmt::Display for Cut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.axis == Axis::Radial {
            write!(f, "x²+y² {} {}²", self.direction, self.threshold)
        } else {
            write!(f, "{} {} {}", self.axis, self.direction, self.threshold)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use scan_types::Side;

    #[test]
    fn axis_tokens() {
        for axis in [Axis::X, Axis::Y, Axis::Z, Axis::Radial] {
            assert_eq!(axis.token().parse::<Axis>().unwrap(), axis);
        }
    }

    #[test]
    fn unknown_axis_token() {
        let err = "q".parse::<Axis>().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFilterMode { mode } if mode == "q"));
        assert!("X".parse::<Axis>().is_err());
    }

    #[test]
    fn direction_from_bool() {
        assert_eq!(Direction::from(true), Direction::GreaterOrEqual);
        assert_eq!(Direction::from(false), Direction::LessOrEqual);
    }

    #[test]
    fn boundary_point_kept_both_ways() {
        let p = Point::from_coords(0.0, 3.0, 0.0);
        assert!(Cut::new(Axis::Y, Direction::GreaterOrEqual, 3.0).keeps(&p));
        assert!(Cut::new(Axis::Y, Direction::LessOrEqual, 3.0).keeps(&p));
    }

    #[test]
    fn radial_compares_squares() {
        // x²+y² = 0.5 against T = -1: the radius is >= -1 but 0.5 < (-1)²
        let p = Point::from_coords(0.5, 0.5, 0.0);
        assert!(!Cut::new(Axis::Radial, Direction::GreaterOrEqual, -1.0).keeps(&p));
        assert!(Cut::new(Axis::Radial, Direction::LessOrEqual, -1.0).keeps(&p));

        let q = Point::from_coords(3.0, 4.0, 0.0);
        assert!(Cut::new(Axis::Radial, Direction::GreaterOrEqual, 5.0).keeps(&q));
        assert!(Cut::new(Axis::Radial, Direction::LessOrEqual, 5.0).keeps(&q));
    }

    #[test]
    fn radial_ignores_z() {
        let cut = Cut::new(Axis::Radial, Direction::LessOrEqual, 1.0);
        assert!(cut.keeps(&Point::from_coords(0.0, 0.0, 1000.0)));
    }

    #[test]
    fn paired_cut_keeps_sides_apart() {
        let cloud = PairedCloud::from_sides(
            vec![
                Point::from_coords(-1.0, 0.0, 0.0),
                Point::from_coords(2.0, 0.0, 0.0),
                Point::from_coords(1.0, 0.0, 0.0),
            ],
            vec![Point::from_coords(-5.0, 0.0, 0.0)],
        );
        let out = Cut::new(Axis::X, Direction::GreaterOrEqual, 0.0).apply_paired(&cloud);

        let xs: Vec<f32> = out.side(Side::Left).iter().map(Point::x).collect();
        assert_eq!(xs, vec![2.0, 1.0]);
        assert!(out.side(Side::Right).is_empty());
    }

    #[test]
    fn dense_cut_stays_dense() {
        let entry = CloudEntry::Dense(DenseCloud::Points(vec![
            Point::from_coords(0.0, 0.0, 1.0),
            Point::from_coords(0.0, 0.0, -1.0),
        ]));
        let out = Cut::new(Axis::Z, Direction::LessOrEqual, 0.0).apply_entry(&entry);
        let dense = out.as_dense().unwrap();
        assert_eq!(dense.len(), 1);
        assert!(dense.get(0).unwrap().z() < 0.0);
    }

    #[test]
    fn display() {
        let cut = Cut::new(Axis::X, Direction::GreaterOrEqual, 1.5);
        assert_eq!(cut.to_string(), "x >= 1.5");
    }
}
