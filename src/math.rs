//! Mathy related things
//!
//! Angles, sexagesimal conversion and the pixel point type shared by the
//! alignment stages.

use std::fmt;

use derive_more::{Deref, From, Into};
use glam::DVec2;

/// The base angle type used in the crate
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Degree(f64);
impl Default for Degree {
    fn default() -> Self {
        Self(0.0)
    }
}
impl Degree {
    pub fn new(deg: f64) -> Self {
        Self(deg)
    }
    pub fn from_radians(rad: f64) -> Self {
        Self(rad.to_degrees())
    }
    pub fn degrees(&self) -> f64 {
        self.0
    }
    pub fn radians(&self) -> f64 {
        self.0.to_radians()
    }
    pub fn arcminutes(&self) -> f64 {
        self.0 * 60.0
    }
    pub fn arcseconds(&self) -> f64 {
        self.0 * 3600.0
    }
    /// Wrap into `[0, 360)`
    pub fn normalized(&self) -> Self {
        Self(self.0.rem_euclid(360.0))
    }
}

/// A point in one image's pixel frame
///
/// Points from different frames must not be mixed in distance math without
/// going through a [crate::wcs::CoordinateTransform].
#[derive(Debug, Default, Clone, Copy, PartialEq, Deref, From, Into)]
pub struct PixelPoint(DVec2);
impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(DVec2::new(x, y))
    }
    pub fn distance(&self, other: &PixelPoint) -> f64 {
        self.0.distance(other.0)
    }
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}
impl fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1},{:.1}", self.0.x, self.0.y)
    }
}

/// Degrees, minutes and seconds of a non-negative angle
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Dms {
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
}
impl Dms {
    /// Split decimal degrees by floored division of the total arcseconds.
    ///
    /// `Dms::from_degrees(1.5) == Dms { degrees: 1.0, minutes: 30.0, seconds: 0.0 }`
    pub fn from_degrees(deg: f64) -> Self {
        let total = deg * 3600.0;
        let (minutes, seconds) = divmod(total, 60.0);
        let (degrees, minutes) = divmod(minutes, 60.0);
        Self {
            degrees,
            minutes,
            seconds,
        }
    }

    pub fn to_degrees(&self) -> f64 {
        self.degrees + self.minutes / 60.0 + self.seconds / 3600.0
    }
}

/// Prints `dd:mm:ss`, each field truncated to a whole number
impl fmt::Display for Dms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.degrees as i64, self.minutes as i64, self.seconds as i64
        )
    }
}

/// Floored quotient and remainder, the remainder taking the divisor's sign
fn divmod(a: f64, b: f64) -> (f64, f64) {
    let mut rem = a % b;
    if rem != 0.0 && (rem < 0.0) != (b < 0.0) {
        rem += b;
    }
    (((a - rem) / b).round(), rem)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_dms_split() {
        assert_eq!(
            Dms::from_degrees(1.5),
            Dms {
                degrees: 1.0,
                minutes: 30.0,
                seconds: 0.0
            }
        );
        assert_eq!(Dms::from_degrees(0.0), Dms::default());
    }

    #[test]
    fn test_dms_recombines() {
        // Deterministic spread over [0, 10)
        let mut x = 0.123_456_789_f64;
        for _ in 0..200 {
            x = (x * 7.3 + 0.61).fract();
            let deg = x * 10.0;
            let dms = Dms::from_degrees(deg);
            assert!(dms.minutes >= 0.0 && dms.minutes < 60.0);
            assert!(dms.seconds >= 0.0 && dms.seconds < 60.0);
            assert_abs_diff_eq!(dms.to_degrees(), deg, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_dms_display() {
        assert_eq!(Dms::from_degrees(24.0 / 3600.0).to_string(), "00:00:24");
        assert_eq!(Dms::from_degrees(40.0 / 3600.0).to_string(), "00:00:40");
        assert_eq!(Dms::from_degrees(1.5).to_string(), "01:30:00");
        // Fractional seconds are dropped, never rounded up
        assert_eq!(Dms::from_degrees(59.6 / 3600.0).to_string(), "00:00:59");
        assert_eq!(Dms::from_degrees(119.6 / 3600.0).to_string(), "00:01:59");
    }

    #[test]
    fn test_degree_normalized() {
        assert_abs_diff_eq!(Degree::new(-0.5).normalized().degrees(), 359.5);
        assert_abs_diff_eq!(Degree::new(725.0).normalized().degrees(), 5.0);
    }
}
