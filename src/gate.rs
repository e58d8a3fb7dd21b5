//! Checks that two solutions can be compared

use std::fmt;

use crate::config::GateConfig;
use crate::error::{AlignError, Result};
use crate::solution::PlateSolution;

/// Celestial hemisphere both images point into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}
impl Hemisphere {
    /// Declination of this hemisphere's pole
    pub fn pole_dec(&self) -> f64 {
        match self {
            Hemisphere::North => 90.0,
            Hemisphere::South => -90.0,
        }
    }
}
impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hemisphere::North => f.write_str("Northern"),
            Hemisphere::South => f.write_str("Southern"),
        }
    }
}

/// Validate a solution pair and find the hemisphere they share
///
/// Fails on differing or unknown dimensions, a zero parity on either image,
/// or declinations not both beyond the configured threshold on the same side.
pub fn check_pair(a: &PlateSolution, b: &PlateSolution, config: &GateConfig) -> Result<Hemisphere> {
    check_dimensions(a, b)?;
    if a.parity().is_bad() || b.parity().is_bad() {
        return Err(AlignError::BadParity);
    }
    hemisphere(
        a.declination().degrees(),
        b.declination().degrees(),
        config.pole_threshold_deg,
    )
}

/// Validate an improvement image against the image the axis was found in
pub fn check_improvement(reference: &PlateSolution, image: &PlateSolution) -> Result<()> {
    check_dimensions(reference, image)?;
    if image.parity().is_bad() {
        return Err(AlignError::BadParity);
    }
    Ok(())
}

pub fn hemisphere(a_dec: f64, b_dec: f64, threshold: f64) -> Result<Hemisphere> {
    if a_dec > threshold && b_dec > threshold {
        Ok(Hemisphere::North)
    } else if a_dec < -threshold && b_dec < -threshold {
        Ok(Hemisphere::South)
    } else {
        Err(AlignError::NotNearPole { a_dec, b_dec })
    }
}

fn check_dimensions(a: &PlateSolution, b: &PlateSolution) -> Result<()> {
    let (sa, sb) = (a.size(), b.size());
    if sa != sb || !sa.is_known() {
        return Err(AlignError::IncompatibleDimensions {
            a_width: sa.width,
            a_height: sa.height,
            b_width: sb.width,
            b_height: sb.height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::AstroCoord;
    use crate::solution::{Declination, ImageSize, Parity, PixelScale, ScaleSource, SolutionMetadata};
    use crate::wcs::TanTransform;

    fn solution(size: (u32, u32), parity: Parity, dec: f64) -> PlateSolution {
        let metadata = SolutionMetadata {
            scale: PixelScale::new(2.0, ScaleSource::Comment),
            parity,
            size: ImageSize::new(size.0, size.1),
            declination: Declination::new(dec),
        };
        let s = 2.0 / 3600.0;
        let wcs = TanTransform::new(AstroCoord::j2000(0.0, dec), (512.0, 400.0), [-s, 0.0, 0.0, s]).unwrap();
        PlateSolution::new(metadata, wcs)
    }

    #[test]
    fn test_hemisphere() {
        let cfg = GateConfig::default();
        let north = check_pair(
            &solution((1024, 800), Parity::Known(1), 80.0),
            &solution((1024, 800), Parity::Known(1), 82.0),
            &cfg,
        );
        assert_eq!(north, Ok(Hemisphere::North));

        let south = check_pair(
            &solution((1024, 800), Parity::Unknown, -70.0),
            &solution((1024, 800), Parity::Unknown, -75.0),
            &cfg,
        );
        assert_eq!(south, Ok(Hemisphere::South));

        assert_eq!(
            hemisphere(10.0, 82.0, cfg.pole_threshold_deg),
            Err(AlignError::NotNearPole { a_dec: 10.0, b_dec: 82.0 })
        );
        // One image per pole is no good either
        assert!(hemisphere(80.0, -80.0, 65.0).is_err());
        // Threshold is exclusive
        assert!(hemisphere(65.0, 80.0, 65.0).is_err());
    }

    #[test]
    fn test_dimensions() {
        let cfg = GateConfig::default();
        let err = check_pair(
            &solution((1024, 800), Parity::Known(1), 80.0),
            &solution((1280, 800), Parity::Known(1), 82.0),
            &cfg,
        );
        assert_eq!(
            err,
            Err(AlignError::IncompatibleDimensions {
                a_width: 1024,
                a_height: 800,
                b_width: 1280,
                b_height: 800
            })
        );

        let err = check_pair(
            &solution((0, 0), Parity::Known(1), 80.0),
            &solution((0, 0), Parity::Known(1), 82.0),
            &cfg,
        );
        assert!(matches!(err, Err(AlignError::IncompatibleDimensions { .. })));
    }

    #[test]
    fn test_parity() {
        let cfg = GateConfig::default();
        let err = check_pair(
            &solution((1024, 800), Parity::Known(1), 80.0),
            &solution((1024, 800), Parity::Known(0), 82.0),
            &cfg,
        );
        assert_eq!(err, Err(AlignError::BadParity));

        // Dimensions are checked first
        let err = check_pair(
            &solution((1024, 800), Parity::Known(0), 10.0),
            &solution((640, 480), Parity::Known(1), 82.0),
            &cfg,
        );
        assert!(matches!(err, Err(AlignError::IncompatibleDimensions { .. })));
    }

    #[test]
    fn test_improvement() {
        let reference = solution((1024, 800), Parity::Known(1), 80.0);
        assert_eq!(
            check_improvement(&reference, &solution((1024, 800), Parity::Known(-1), 88.0)),
            Ok(())
        );
        assert_eq!(
            check_improvement(&reference, &solution((1024, 800), Parity::Known(0), 88.0)),
            Err(AlignError::BadParity)
        );
        assert!(check_improvement(&reference, &solution((800, 1024), Parity::Known(1), 88.0)).is_err());
    }
}
