//! Turns the axis / pole offset into an error and a correction to make
//!
//! The offset is split along the image's pixel axes, on the assumption that
//! they line up with the mount's azimuth and altitude directions. Nothing
//! corrects for the camera's rotation relative to the horizon.

use std::fmt;

use crate::math::{Dms, PixelPoint};

/// Which way to move along x
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Right,
}

/// Which way to move along y
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Up,
    Down,
}

impl fmt::Display for Horizontal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Horizontal::Left => "Left",
            Horizontal::Right => "Right",
        })
    }
}

impl fmt::Display for Vertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Vertical::Up => "Up",
            Vertical::Down => "Down",
        })
    }
}

/// Per pixel axis correction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub horizontal: Horizontal,
    pub horizontal_amount: Dms,
    pub vertical: Vertical,
    pub vertical_amount: Dms,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.horizontal, self.horizontal_amount, self.vertical, self.vertical_amount
        )
    }
}

/// Outcome of one "find axis" or "show improvement" run
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    pub axis_px: PixelPoint,
    pub pole_px: PixelPoint,
    pub error_arcmin: f64,
    pub correction: Correction,
    pub correction_text: String,
}

/// Angular error and correction for an axis and pole in the same pixel frame
///
/// `scale` is in arcseconds per pixel.
pub fn compute_error(axis_px: PixelPoint, pole_px: PixelPoint, scale: f64) -> AlignmentResult {
    let error_arcmin = scale * axis_px.distance(&pole_px) / 60.0;

    let delta = *axis_px - *pole_px;
    let horizontal = if delta.x > 0.0 {
        Horizontal::Right
    } else {
        Horizontal::Left
    };
    let vertical = if delta.y > 0.0 {
        Vertical::Down
    } else {
        Vertical::Up
    };
    let correction = Correction {
        horizontal,
        horizontal_amount: Dms::from_degrees(delta.x.abs() * scale / 3600.0),
        vertical,
        vertical_amount: Dms::from_degrees(delta.y.abs() * scale / 3600.0),
    };

    AlignmentResult {
        axis_px,
        pole_px,
        error_arcmin,
        correction_text: correction.to_string(),
        correction,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_compute_error() {
        let result = compute_error(PixelPoint::new(512.0, 400.0), PixelPoint::new(500.0, 380.0), 2.0);
        assert_abs_diff_eq!(result.error_arcmin, 2.0 * (12.0_f64.powi(2) + 20.0_f64.powi(2)).sqrt() / 60.0);
        assert_abs_diff_eq!(result.error_arcmin, 0.777, epsilon = 1e-3);
        assert_eq!(result.correction.horizontal, Horizontal::Right);
        assert_eq!(result.correction.vertical, Vertical::Down);
        assert_eq!(result.correction_text, "Right 00:00:24 Down 00:00:40");
    }

    #[test]
    fn test_directions_flip() {
        let result = compute_error(PixelPoint::new(100.0, 100.0), PixelPoint::new(1900.0, 2900.0), 2.0);
        assert_eq!(result.correction_text, "Left 01:00:00 Up 01:33:20");
        assert_abs_diff_eq!(result.error_arcmin, 2.0 * 1800.0_f64.hypot(2800.0) / 60.0);
    }

    #[test]
    fn test_aligned() {
        let p = PixelPoint::new(640.0, 480.0);
        let result = compute_error(p, p, 1.85);
        assert_eq!(result.error_arcmin, 0.0);
        assert_eq!(result.correction_text, "Left 00:00:00 Up 00:00:00");
    }
}
