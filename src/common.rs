use std::ops::Deref;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::DVec3;

use crate::math::Degree;

/// Equatorial sky position referred to the mean equator and equinox of `date`
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AstroCoord {
    ra: Degree,
    dec: Degree,
    date: JulianDate,
}
impl AstroCoord {
    pub fn from_ra_dec(ra: Degree, dec: Degree) -> Self {
        Self {
            ra,
            dec,
            date: JulianDate::J2000,
        }
    }

    pub fn from_ra_dec_date(ra: Degree, dec: Degree, date: JulianDate) -> Self {
        Self { ra, dec, date }
    }

    /// Shorthand for a J2000 position given in decimal degrees
    pub fn j2000(ra_deg: f64, dec_deg: f64) -> Self {
        Self::from_ra_dec(Degree::new(ra_deg), Degree::new(dec_deg))
    }

    pub fn ra(&self) -> Degree {
        self.ra
    }
    pub fn dec(&self) -> Degree {
        self.dec
    }
    pub fn date(&self) -> JulianDate {
        self.date
    }

    /// Unit vector on the celestial sphere
    pub fn to_unit_vector(&self) -> DVec3 {
        let (ra, dec) = (self.ra.radians(), self.dec.radians());
        DVec3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin())
    }

    /// `v` need not be normalized
    pub fn from_unit_vector(v: DVec3, date: JulianDate) -> Self {
        // atan2 keeps full precision next to the poles where asin does not
        let dec = v.z.atan2(v.x.hypot(v.y));
        let ra = v.y.atan2(v.x);
        Self {
            ra: Degree::from_radians(ra).normalized(),
            dec: Degree::from_radians(dec),
            date,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
pub struct JulianDate(f64);
impl JulianDate {
    pub const J2000: Self = Self(2451545.0);
    /// Days in a Julian century
    pub const CENTURY: f64 = 36525.0;
    const UNIX_EPOCH: f64 = 2440587.5;
    const SECONDS_PER_DAY: f64 = 86400.0;

    pub fn new(jd: f64) -> Self {
        Self(jd)
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        let seconds = match time.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs_f64(),
            Err(e) => -e.duration().as_secs_f64(),
        };
        Self(Self::UNIX_EPOCH + seconds / Self::SECONDS_PER_DAY)
    }

    /// Julian centuries elapsed since J2000.0
    pub fn centuries_since_j2000(&self) -> f64 {
        (self.0 - Self::J2000.0) / Self::CENTURY
    }
}
impl Deref for JulianDate {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
