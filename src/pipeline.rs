//! The two user facing runs
//!
//! * [AlignmentPipeline::find_axis] locates the RA axis from a pair of images
//!   taken before and after rotating the mount, and measures it against the
//!   pole.
//! * [AlignmentPipeline::show_improvement] measures the same axis against the
//!   pole in an image taken after adjusting altitude and azimuth.
//!
//! Either returns a complete report or an error, never a partial result.

use log::info;

use crate::alignment::{compute_error, AlignmentResult};
use crate::axis::{locate_axis, locate_axis_single, AxisFix, Broyden, RootFinder};
use crate::config::AlignConfig;
use crate::error::{AlignError, Result};
use crate::gate::{self, Hemisphere};
use crate::math::PixelPoint;
use crate::pole::{project_pole, EpochSource, SystemClock};
use crate::region::{annotation_region, reference_stars, target_ring_radii, Region};
use crate::solution::{PixelScale, PlateSolution};

/// A reference star placed in the image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub name: &'static str,
    pub label: &'static str,
    pub pixel: PixelPoint,
}

/// Everything the host needs to display one run
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentReport {
    pub hemisphere: Hemisphere,
    pub scale: PixelScale,
    pub result: AlignmentResult,
    pub markers: Vec<Marker>,
    /// `(arcminutes, radius px)` rings centred on the pole
    pub rings: [(u32, f64); 4],
    pub region: Region,
}

pub struct AlignmentPipeline {
    config: AlignConfig,
    clock: Box<dyn EpochSource>,
    finder: Box<dyn RootFinder>,
}

impl AlignmentPipeline {
    pub fn new(config: AlignConfig) -> Self {
        Self {
            config,
            clock: Box::new(SystemClock),
            finder: Box::new(Broyden::new(config.locator)),
        }
    }

    pub fn with_clock(mut self, clock: impl EpochSource + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_root_finder(mut self, finder: impl RootFinder + 'static) -> Self {
        self.finder = Box::new(finder);
        self
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    /// Locate the RA axis from images `a` (before) and `b` (after rotating
    /// about RA). All pixel results are in `a`'s frame.
    pub fn find_axis(
        &self,
        a: &PlateSolution,
        b: &PlateSolution,
    ) -> Result<(AxisFix, AlignmentReport)> {
        let hemisphere = gate::check_pair(a, b, &self.config.gate)?;
        info!("{hemisphere} celestial pole, dec {:.3}", a.declination().degrees());

        info!("Finding RA axis...");
        let axis = locate_axis(a, b, self.finder.as_ref())?;
        let fix = AxisFix { axis, hemisphere };

        let report = self.report(&fix, a)?;
        Ok((fix, report))
    }

    /// Measure a previously found axis against the pole in `image`.
    /// `reference` is the image the axis was found in.
    pub fn show_improvement(
        &self,
        fix: &AxisFix,
        reference: &PlateSolution,
        image: &PlateSolution,
    ) -> Result<AlignmentReport> {
        locate_axis_single(fix, reference, image)?;
        self.report(fix, image)
    }

    fn report(&self, fix: &AxisFix, image: &PlateSolution) -> Result<AlignmentReport> {
        let transform = image.transform();
        let pole = project_pole(fix.hemisphere, self.clock.as_ref());
        let pole_px = transform
            .sky_to_pixel(&pole)
            .ok_or(AlignError::PoleOffImage {
                dec: image.declination().degrees(),
            })?;

        let scale = image.scale();
        let result = compute_error(fix.axis, pole_px, scale.arcsec_per_pixel());
        info!(
            "Axis {} pole {} error {:.2}' -> {}",
            result.axis_px, result.pole_px, result.error_arcmin, result.correction_text
        );

        let mut points = vec![fix.axis, pole_px];
        let mut markers = Vec::new();
        for star in reference_stars(fix.hemisphere) {
            let Some(pixel) = transform.sky_to_pixel(&star.coord()) else {
                continue;
            };
            if star.frames_region {
                points.push(pixel);
            }
            markers.push(Marker {
                name: star.name,
                label: star.label,
                pixel,
            });
        }
        let region = annotation_region(
            &points,
            scale.arcsec_per_pixel(),
            image.size(),
            &self.config.region,
        );

        Ok(AlignmentReport {
            hemisphere: fix.hemisphere,
            scale,
            result,
            markers,
            rings: target_ring_radii(scale.arcsec_per_pixel()),
            region,
        })
    }
}
