//! Pixel <-> sky mapping of one solved image
//!
//! The alignment core only talks to [CoordinateTransform]. [TanTransform] is
//! the bundled implementation for gnomonic solutions described by the linear
//! FITS WCS keywords (`CRVAL`, `CRPIX` and `CD`, `PC + CDELT` or
//! `CDELT + CROTA2`). SIP distortion terms are ignored.

use glam::{DMat2, DVec2, DVec3};
use log::debug;
use thiserror::Error;

use crate::common::{AstroCoord, JulianDate};
use crate::header::Header;
use crate::math::{Degree, PixelPoint};

/// Maps pixels of one image to J2000 sky positions and back
///
/// Pixels follow the FITS convention, the centre of the first pixel is (1, 1).
/// Both directions return `None` outside the projection's domain.
pub trait CoordinateTransform {
    fn pixel_to_sky(&self, pixel: PixelPoint) -> Option<AstroCoord>;
    fn sky_to_pixel(&self, coord: &AstroCoord) -> Option<PixelPoint>;
}

impl<T: CoordinateTransform + ?Sized> CoordinateTransform for &T {
    fn pixel_to_sky(&self, pixel: PixelPoint) -> Option<AstroCoord> {
        (**self).pixel_to_sky(pixel)
    }
    fn sky_to_pixel(&self, coord: &AstroCoord) -> Option<PixelPoint> {
        (**self).sky_to_pixel(coord)
    }
}

impl<T: CoordinateTransform + ?Sized> CoordinateTransform for Box<T> {
    fn pixel_to_sky(&self, pixel: PixelPoint) -> Option<AstroCoord> {
        (**self).pixel_to_sky(pixel)
    }
    fn sky_to_pixel(&self, coord: &AstroCoord) -> Option<PixelPoint> {
        (**self).sky_to_pixel(coord)
    }
}

/// Gnomonic projection with a linear pixel -> intermediate world mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TanTransform {
    /// Reference point on the sky, radians
    crval: DVec2,
    /// Reference pixel
    crpix: DVec2,
    /// Pixel offset -> intermediate world coordinates, degrees per pixel
    cd: DMat2,
    cd_inv: DMat2,
}

impl TanTransform {
    /// `cd` is given row major: `[CD1_1, CD1_2, CD2_1, CD2_2]`
    pub fn new(crval: AstroCoord, crpix: (f64, f64), cd: [f64; 4]) -> Result<Self, WcsError> {
        let cd = DMat2::from_cols(DVec2::new(cd[0], cd[2]), DVec2::new(cd[1], cd[3]));
        let largest = cd
            .to_cols_array()
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let det = cd.determinant();
        if !det.is_finite() || det.abs() <= 1e-12 * largest * largest {
            return Err(WcsError::SingularMatrix);
        }
        Ok(Self {
            crval: DVec2::new(crval.ra().radians(), crval.dec().radians()),
            crpix: DVec2::new(crpix.0, crpix.1),
            cd,
            cd_inv: cd.inverse(),
        })
    }

    pub fn from_header(header: &Header) -> Result<Self, WcsError> {
        if let Some(ctype) = header.get_str("CTYPE1") {
            if !ctype.starts_with("RA---TAN") {
                return Err(WcsError::UnsupportedProjection(ctype.to_string()));
            }
            if ctype.ends_with("SIP") {
                debug!("Ignoring SIP distortion terms");
            }
        }

        let required = |key: &'static str| header.get_float(key).ok_or(WcsError::MissingKeyword(key));
        let crval = AstroCoord::j2000(required("CRVAL1")?, required("CRVAL2")?);
        let crpix = (required("CRPIX1")?, required("CRPIX2")?);

        let cd_keys = ["CD1_1", "CD1_2", "CD2_1", "CD2_2"];
        let pc_keys = ["PC1_1", "PC1_2", "PC2_1", "PC2_2"];
        let cd = if cd_keys.iter().any(|k| header.get(k).is_some()) {
            matrix_or_identity(header, cd_keys)
        } else {
            let cdelt1 = required("CDELT1")?;
            let cdelt2 = header.get_float("CDELT2").unwrap_or(cdelt1.abs());
            if pc_keys.iter().any(|k| header.get(k).is_some()) {
                let pc = matrix_or_identity(header, pc_keys);
                [cdelt1 * pc[0], cdelt1 * pc[1], cdelt2 * pc[2], cdelt2 * pc[3]]
            } else {
                let rho = Degree::new(header.get_float("CROTA2").unwrap_or(0.0)).radians();
                let (sin, cos) = rho.sin_cos();
                [cdelt1 * cos, -cdelt2 * sin, cdelt1 * sin, cdelt2 * cos]
            }
        };

        Self::new(crval, crpix, cd)
    }

    pub fn crval(&self) -> AstroCoord {
        AstroCoord::from_ra_dec(
            Degree::from_radians(self.crval.x),
            Degree::from_radians(self.crval.y),
        )
    }

    pub fn crpix(&self) -> PixelPoint {
        self.crpix.into()
    }
}

impl CoordinateTransform for TanTransform {
    fn pixel_to_sky(&self, pixel: PixelPoint) -> Option<AstroCoord> {
        let offset = *pixel - self.crpix;
        let xi_eta = (self.cd * offset) * std::f64::consts::PI / 180.0;
        if !xi_eta.is_finite() {
            return None;
        }
        let v = inverse_tan_project(xi_eta, self.crval);
        Some(AstroCoord::from_unit_vector(v, JulianDate::J2000))
    }

    fn sky_to_pixel(&self, coord: &AstroCoord) -> Option<PixelPoint> {
        let xi_eta = tan_project(coord.ra().radians(), coord.dec().radians(), self.crval)?;
        let offset = self.cd_inv * (xi_eta * 180.0 / std::f64::consts::PI);
        Some((self.crpix + offset).into())
    }
}

/// Missing entries default to the identity matrix
fn matrix_or_identity(header: &Header, keys: [&str; 4]) -> [f64; 4] {
    let identity = [1.0, 0.0, 0.0, 1.0];
    let mut m = identity;
    for (i, key) in keys.iter().enumerate() {
        m[i] = header.get_float(key).unwrap_or(identity[i]);
    }
    m
}

/// Forward gnomonic projection of `(ra, dec)` onto the plane tangent at `crval`.
/// `None` on or behind the tangent plane.
fn tan_project(ra: f64, dec: f64, crval: DVec2) -> Option<DVec2> {
    let da = ra - crval.x;
    let (sin_dec, cos_dec) = dec.sin_cos();
    let (sin_dec0, cos_dec0) = crval.y.sin_cos();
    let cos_da = da.cos();

    let denom = sin_dec * sin_dec0 + cos_dec * cos_dec0 * cos_da;
    if denom <= 1e-12 {
        return None;
    }

    Some(DVec2::new(
        cos_dec * da.sin() / denom,
        (sin_dec * cos_dec0 - cos_dec * sin_dec0 * cos_da) / denom,
    ))
}

/// Inverse gnomonic projection, tangent plane radians to a direction on the sky
///
/// Goes through the unit vector so positions next to a pole keep full
/// precision.
fn inverse_tan_project(xi_eta: DVec2, crval: DVec2) -> DVec3 {
    let (sin_ra0, cos_ra0) = crval.x.sin_cos();
    let (sin_dec0, cos_dec0) = crval.y.sin_cos();
    let center = DVec3::new(cos_dec0 * cos_ra0, cos_dec0 * sin_ra0, sin_dec0);
    let east = DVec3::new(-sin_ra0, cos_ra0, 0.0);
    let north = DVec3::new(-sin_dec0 * cos_ra0, -sin_dec0 * sin_ra0, cos_dec0);
    center + east * xi_eta.x + north * xi_eta.y
}

/// Errors from building a transform out of a header
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WcsError {
    #[error("Missing WCS keyword {0}")]
    MissingKeyword(&'static str),
    #[error("Unsupported projection {0}")]
    UnsupportedProjection(String),
    #[error("Singular pixel to sky matrix")]
    SingularMatrix,
}
