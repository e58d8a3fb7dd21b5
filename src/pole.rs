//! Position of the celestial pole of date in J2000 coordinates
//!
//! Plate solutions are referred to J2000, but the mount has to point at the
//! pole of the current epoch. The pole of date is precessed back to J2000
//! with the IAU 1976 precession angles (Lieske et al. 1977).

use std::time::SystemTime;

use glam::{DMat3, DVec3};
use log::debug;

use crate::common::{AstroCoord, JulianDate};
use crate::gate::Hemisphere;
use crate::math::Degree;

/// Source of the epoch the pole is computed for
pub trait EpochSource {
    fn now(&self) -> JulianDate;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;
impl EpochSource for SystemClock {
    fn now(&self) -> JulianDate {
        JulianDate::from_system_time(SystemTime::now())
    }
}

/// A pinned epoch, for tests and for reprocessing old images
#[derive(Debug, Clone, Copy)]
pub struct FixedEpoch(pub JulianDate);
impl EpochSource for FixedEpoch {
    fn now(&self) -> JulianDate {
        self.0
    }
}

/// J2000 position of `hemisphere`'s pole of the epoch given by `clock`
pub fn project_pole(hemisphere: Hemisphere, clock: &dyn EpochSource) -> AstroCoord {
    let date = clock.now();
    let pole = AstroCoord::from_ra_dec_date(Degree::new(0.0), Degree::new(hemisphere.pole_dec()), date);
    let j2000 = precess_to_j2000(&pole);
    debug!(
        "{} pole of JD {:.3} at J2000 RA {:.5} Dec {:.5}",
        hemisphere,
        *date,
        j2000.ra().degrees(),
        j2000.dec().degrees()
    );
    j2000
}

/// Move a mean position of date to the J2000 mean equator and equinox
pub fn precess_to_j2000(coord: &AstroCoord) -> AstroCoord {
    let p = precession_matrix(coord.date());
    // P maps J2000 -> date, it is orthogonal so the inverse is its transpose
    let v = p.transpose() * coord.to_unit_vector();
    AstroCoord::from_unit_vector(v, JulianDate::J2000)
}

/// Rotation from the J2000 mean frame to the mean frame of `date`,
/// `R3(-z) R2(theta) R3(-zeta)`
fn precession_matrix(date: JulianDate) -> DMat3 {
    let t = date.centuries_since_j2000();
    let arcsec = |a: f64| Degree::new(a / 3600.0).radians();

    let zeta = arcsec(2306.2181 * t + 0.30188 * t * t + 0.017998 * t * t * t);
    let z = arcsec(2306.2181 * t + 1.09468 * t * t + 0.018203 * t * t * t);
    let theta = arcsec(2004.3109 * t - 0.42665 * t * t - 0.041833 * t * t * t);

    rot_z(-z) * rot_y(theta) * rot_z(-zeta)
}

/// Frame rotation about z, rows `[c, s, 0], [-s, c, 0], [0, 0, 1]`
fn rot_z(phi: f64) -> DMat3 {
    let (s, c) = phi.sin_cos();
    DMat3::from_cols(DVec3::new(c, -s, 0.0), DVec3::new(s, c, 0.0), DVec3::Z)
}

/// Frame rotation about y, rows `[c, 0, -s], [0, 1, 0], [s, 0, c]`
fn rot_y(phi: f64) -> DMat3 {
    let (s, c) = phi.sin_cos();
    DMat3::from_cols(DVec3::new(c, 0.0, s), DVec3::Y, DVec3::new(-s, 0.0, c))
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_no_precession_at_j2000() {
        let pole = project_pole(Hemisphere::North, &FixedEpoch(JulianDate::J2000));
        assert_abs_diff_eq!(pole.dec().degrees(), 90.0, epsilon = 1e-9);
        assert_eq!(pole.date(), JulianDate::J2000);
    }

    #[test]
    fn test_pole_of_date() {
        // 2026.0, a quarter century after J2000
        let date = JulianDate::new(*JulianDate::J2000 + 0.26 * JulianDate::CENTURY);
        let t: f64 = 0.26;
        let theta = (2004.3109 * t - 0.42665 * t * t - 0.041833 * t * t * t) / 3600.0;
        let zeta = (2306.2181 * t + 0.30188 * t * t + 0.017998 * t * t * t) / 3600.0;

        let north = project_pole(Hemisphere::North, &FixedEpoch(date));
        assert_abs_diff_eq!(north.dec().degrees(), 90.0 - theta, epsilon = 1e-9);
        assert_abs_diff_eq!(north.ra().degrees(), 360.0 - zeta, epsilon = 1e-6);

        let south = project_pole(Hemisphere::South, &FixedEpoch(date));
        assert_abs_diff_eq!(south.dec().degrees(), -90.0 + theta, epsilon = 1e-9);
        assert_abs_diff_eq!(south.ra().degrees(), 180.0 - zeta, epsilon = 1e-6);
    }

    #[test]
    fn test_precession_matrix_is_rotation() {
        let p = precession_matrix(JulianDate::new(2461000.5));
        let identity = p * p.transpose();
        assert!(identity.abs_diff_eq(DMat3::IDENTITY, 1e-12));
        assert_abs_diff_eq!(p.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_system_clock_is_after_j2000() {
        assert!(*SystemClock.now() > *JulianDate::J2000);
    }
}
