//! Plate solution metadata
//!
//! Provides [PlateSolution], the immutable record of one solved image, and
//! [extract_metadata] which reads its scalar fields out of a [Header].
//!
//! Each field is looked up through an ordered list of rules, the first rule
//! that yields a value wins. Only the declination is mandatory.

use std::fmt;

use derive_more::Deref;
use log::warn;
use thiserror::Error;

use crate::error::AlignError;
use crate::header::Header;
use crate::math::{Degree, PixelPoint};
use crate::wcs::{CoordinateTransform, TanTransform, WcsError};

/// Where the pixel scale came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleSource {
    /// `scale` comment line written by astrometry.net
    Comment,
    /// `CDELT1` keyword
    Cdelt,
    /// Nothing in the header, assumed 1"/px
    Default,
}

/// Pixel Scale
///
/// units: arcseconds per pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelScale {
    arcsec_per_pixel: f64,
    source: ScaleSource,
}
impl PixelScale {
    pub const DEFAULT: f64 = 1.0;

    pub fn new(arcsec_per_pixel: f64, source: ScaleSource) -> Self {
        Self {
            arcsec_per_pixel: arcsec_per_pixel.abs(),
            source,
        }
    }
    pub fn arcsec_per_pixel(&self) -> f64 {
        self.arcsec_per_pixel
    }
    pub fn source(&self) -> ScaleSource {
        self.source
    }
    /// False when the value is the fallback default
    pub fn is_reliable(&self) -> bool {
        self.source != ScaleSource::Default
    }
}

/// Image parity as reported by the solver
///
/// 0 marks a flipped or unusable solution. A header without parity
/// information is [Parity::Unknown] and treated like 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Known(i64),
    Unknown,
}
impl Parity {
    pub fn value(&self) -> i64 {
        match self {
            Parity::Known(p) => *p,
            Parity::Unknown => 1,
        }
    }
    pub fn is_bad(&self) -> bool {
        self.value() == 0
    }
}

/// Image dimensions in pixels, 0 x 0 when the header does not say
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}
impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
    pub fn is_known(&self) -> bool {
        self.width > 0 && self.height > 0
    }
    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}
impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Declination of the reference point
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd, Deref)]
pub struct Declination(Degree);
impl Declination {
    pub fn new(deg: f64) -> Self {
        Self(Degree::new(deg))
    }
}

/// Scalar fields of a plate solution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolutionMetadata {
    pub scale: PixelScale,
    pub parity: Parity,
    pub size: ImageSize,
    pub declination: Declination,
}

type Rule<T> = fn(&Header) -> Option<T>;

const SCALE_RULES: [(ScaleSource, Rule<f64>); 2] = [
    (ScaleSource::Comment, scale_from_comment),
    (ScaleSource::Cdelt, scale_from_cdelt),
];
const PARITY_RULES: [Rule<i64>; 1] = [parity_from_comment];
const SIZE_RULES: [Rule<ImageSize>; 2] = [size_from_imagew, size_from_naxis];
const DECLINATION_RULES: [Rule<f64>; 1] = [declination_from_crval];

/// Read a solution's scale, parity, size and declination
pub fn extract_metadata(header: &Header) -> Result<SolutionMetadata, AlignError> {
    let scale = SCALE_RULES
        .iter()
        .find_map(|(source, rule)| rule(header).map(|s| PixelScale::new(s, *source)))
        .unwrap_or_else(|| {
            warn!("No pixel scale in header, assuming {}\"/px", PixelScale::DEFAULT);
            PixelScale::new(PixelScale::DEFAULT, ScaleSource::Default)
        });

    let parity = PARITY_RULES
        .iter()
        .find_map(|rule| rule(header))
        .map_or(Parity::Unknown, Parity::Known);

    let size = SIZE_RULES
        .iter()
        .find_map(|rule| rule(header))
        .unwrap_or_else(|| {
            warn!("No image dimensions in header");
            ImageSize::default()
        });

    let declination = DECLINATION_RULES
        .iter()
        .find_map(|rule| rule(header))
        .map(Declination::new)
        .ok_or(AlignError::MissingMetadata("CRVAL2"))?;

    Ok(SolutionMetadata {
        scale,
        parity,
        size,
        declination,
    })
}

/// Second whitespace separated token of the first comment starting with `prefix`
fn comment_token<'a>(header: &'a Header, prefix: &str) -> Option<&'a str> {
    header
        .comments()
        .iter()
        .find(|c| c.starts_with(prefix))
        .and_then(|c| c.split_whitespace().nth(1))
}

fn scale_from_comment(header: &Header) -> Option<f64> {
    comment_token(header, "scale")?.parse().ok()
}

/// `CDELT1` is degrees per pixel
fn scale_from_cdelt(header: &Header) -> Option<f64> {
    header.get_float("CDELT1").map(|d| d * 3600.0)
}

fn declination_from_crval(header: &Header) -> Option<f64> {
    header.get_float("CRVAL2")
}

fn parity_from_comment(header: &Header) -> Option<i64> {
    comment_token(header, "parity")?.parse().ok()
}

fn size_from_keys(header: &Header, w: &str, h: &str) -> Option<ImageSize> {
    let width = u32::try_from(header.get_int(w)?).ok()?;
    let height = u32::try_from(header.get_int(h)?).ok()?;
    Some(ImageSize::new(width, height))
}

fn size_from_imagew(header: &Header) -> Option<ImageSize> {
    size_from_keys(header, "IMAGEW", "IMAGEH")
}

fn size_from_naxis(header: &Header) -> Option<ImageSize> {
    size_from_keys(header, "NAXIS1", "NAXIS2")
}

/// One solved image: metadata plus its pixel <-> sky mapping
pub struct PlateSolution {
    metadata: SolutionMetadata,
    transform: Box<dyn CoordinateTransform + Send + Sync>,
}

impl PlateSolution {
    pub fn new(
        metadata: SolutionMetadata,
        transform: impl CoordinateTransform + Send + Sync + 'static,
    ) -> Self {
        Self {
            metadata,
            transform: Box::new(transform),
        }
    }

    /// Build both the metadata and a [TanTransform] from the same header
    pub fn from_header(header: &Header) -> Result<Self, SolutionError> {
        let metadata = extract_metadata(header)?;
        let transform = TanTransform::from_header(header)?;
        Ok(Self::new(metadata, transform))
    }

    pub fn metadata(&self) -> &SolutionMetadata {
        &self.metadata
    }
    pub fn scale(&self) -> PixelScale {
        self.metadata.scale
    }
    pub fn parity(&self) -> Parity {
        self.metadata.parity
    }
    pub fn size(&self) -> ImageSize {
        self.metadata.size
    }
    pub fn declination(&self) -> Declination {
        self.metadata.declination
    }
    pub fn transform(&self) -> &dyn CoordinateTransform {
        self.transform.as_ref()
    }
}

impl fmt::Debug for PlateSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlateSolution")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Errors from building a [PlateSolution] out of a header
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolutionError {
    #[error(transparent)]
    Metadata(#[from] AlignError),
    #[error(transparent)]
    Wcs(#[from] WcsError),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::header::HeaderValue;
    use approx::assert_abs_diff_eq;

    fn with_dec(dec: f64) -> Header {
        let mut header = Header::new();
        header.insert("CRVAL2", HeaderValue::Float(dec));
        header
    }

    #[test]
    fn test_scale_from_comment() {
        let mut header = with_dec(85.0);
        header.push_comment("index id: 4107");
        header.push_comment("scale 1.85 arcsec/pix");
        header.insert("CDELT1", HeaderValue::Float(-0.001));
        let meta = extract_metadata(&header).unwrap();
        assert_eq!(meta.scale, PixelScale::new(1.85, ScaleSource::Comment));
        assert!(meta.scale.is_reliable());
    }

    #[test]
    fn test_scale_from_cdelt() {
        let mut header = with_dec(85.0);
        header.insert("CDELT1", HeaderValue::Float(-0.00051389));
        let meta = extract_metadata(&header).unwrap();
        assert_abs_diff_eq!(meta.scale.arcsec_per_pixel(), 1.85, epsilon = 1e-3);
        assert_eq!(meta.scale.source(), ScaleSource::Cdelt);
    }

    #[test]
    fn test_unparsable_scale_comment_falls_through() {
        let mut header = with_dec(85.0);
        header.push_comment("scale unknown");
        header.insert("CDELT1", HeaderValue::Float(0.0005));
        let meta = extract_metadata(&header).unwrap();
        assert_eq!(meta.scale.source(), ScaleSource::Cdelt);
    }

    #[test]
    fn test_scale_default() {
        let meta = extract_metadata(&with_dec(85.0)).unwrap();
        assert_eq!(meta.scale.arcsec_per_pixel(), 1.0);
        assert!(!meta.scale.is_reliable());
    }

    #[test]
    fn test_parity() {
        let mut header = with_dec(85.0);
        header.push_comment("parity 1");
        assert_eq!(extract_metadata(&header).unwrap().parity, Parity::Known(1));

        let meta = extract_metadata(&with_dec(85.0)).unwrap();
        assert_eq!(meta.parity, Parity::Unknown);
        assert_eq!(meta.parity.value(), 1);
        assert!(!meta.parity.is_bad());

        let mut header = with_dec(85.0);
        header.push_comment("parity 0");
        let meta = extract_metadata(&header).unwrap();
        assert_eq!(meta.parity.value(), 0);
        assert!(meta.parity.is_bad());
    }

    #[test]
    fn test_size_fallbacks() {
        let mut header = with_dec(85.0);
        header.insert("NAXIS1", HeaderValue::Int(1024));
        header.insert("NAXIS2", HeaderValue::Int(768));
        assert_eq!(extract_metadata(&header).unwrap().size, ImageSize::new(1024, 768));

        header.insert("IMAGEW", HeaderValue::Int(1280));
        header.insert("IMAGEH", HeaderValue::Int(960));
        assert_eq!(extract_metadata(&header).unwrap().size, ImageSize::new(1280, 960));

        let size = extract_metadata(&with_dec(85.0)).unwrap().size;
        assert_eq!(size, ImageSize::default());
        assert!(!size.is_known());
    }

    #[test]
    fn test_missing_declination() {
        assert_eq!(
            extract_metadata(&Header::new()),
            Err(AlignError::MissingMetadata("CRVAL2"))
        );
    }

    #[test]
    fn test_from_header_without_wcs() {
        assert!(matches!(
            PlateSolution::from_header(&with_dec(85.0)),
            Err(SolutionError::Wcs(WcsError::MissingKeyword("CRVAL1")))
        ));
    }
}
