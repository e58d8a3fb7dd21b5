//! What to show around the pole: crop box, reference stars and target rings

use crate::common::AstroCoord;
use crate::config::RegionConfig;
use crate::gate::Hemisphere;
use crate::math::PixelPoint;
use crate::solution::ImageSize;

/// A bright star near the pole drawn to help orient the view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceStar {
    pub name: &'static str,
    /// Short marker label
    pub label: &'static str,
    pub ra: f64,
    pub dec: f64,
    /// Whether the crop box is grown to include it
    pub frames_region: bool,
}
impl ReferenceStar {
    pub fn coord(&self) -> AstroCoord {
        AstroCoord::j2000(self.ra, self.dec)
    }
}

const NORTH_STARS: [ReferenceStar; 2] = [
    // F8Ib, 2.0 mag
    ReferenceStar {
        name: "Polaris",
        label: "a",
        ra: 37.954561,
        dec: 89.264109,
        frames_region: true,
    },
    // M1III, 6.4 mag
    ReferenceStar {
        name: "Lambda UMi",
        label: "l",
        ra: 259.235229,
        dec: 89.037706,
        frames_region: true,
    },
];

const SOUTH_STARS: [ReferenceStar; 3] = [
    // F0III, 5.4 mag
    ReferenceStar {
        name: "Sigma Oct",
        label: "s",
        ra: 317.195164,
        dec: -88.956499,
        frames_region: true,
    },
    // K3IIICN, 5.3 mag
    ReferenceStar {
        name: "Chi Oct",
        label: "c",
        ra: 283.696388,
        dec: -87.605843,
        frames_region: true,
    },
    // M1III, 7.2 mag
    ReferenceStar {
        name: "HD 90104",
        label: "!",
        ra: 130.522862,
        dec: -89.460536,
        frames_region: false,
    },
];

pub fn reference_stars(hemisphere: Hemisphere) -> &'static [ReferenceStar] {
    match hemisphere {
        Hemisphere::North => &NORTH_STARS,
        Hemisphere::South => &SOUTH_STARS,
    }
}

/// Rings drawn around the pole, arcminutes
pub const TARGET_RINGS_ARCMIN: [u32; 4] = [5, 10, 20, 40];

/// `(arcminutes, radius in pixels)` of each target ring
pub fn target_ring_radii(scale: f64) -> [(u32, f64); 4] {
    TARGET_RINGS_ARCMIN.map(|arcmin| (arcmin, arcmin as f64 * 60.0 / scale))
}

/// Crop box in pixels, inclusive, within `[1, width] x [1, height]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}
impl Region {
    pub fn full(size: ImageSize) -> Self {
        Self {
            x0: 1,
            y0: 1,
            x1: size.width.max(1) as i64,
            y1: size.height.max(1) as i64,
        }
    }
    pub fn width(&self) -> i64 {
        self.x1 - self.x0
    }
    pub fn height(&self) -> i64 {
        self.y1 - self.y0
    }
}

/// Bounding box of `points` grown by the configured margin and clamped to the image
///
/// Non-finite points are skipped. Without any usable point the whole image
/// is returned.
pub fn annotation_region(
    points: &[PixelPoint],
    scale: f64,
    size: ImageSize,
    config: &RegionConfig,
) -> Region {
    let full = Region::full(size);
    let margin = if scale > 0.0 {
        (config.margin_arcsec / scale).trunc()
    } else {
        0.0
    };

    let mut finite = points.iter().filter(|p| p.is_finite());
    let Some(first) = finite.next() else {
        return full;
    };
    let (min, max) = finite.fold((**first, **first), |(min, max), p| (min.min(**p), max.max(**p)));

    let clamp_x = |v: f64| (v as i64).clamp(full.x0, full.x1);
    let clamp_y = |v: f64| (v as i64).clamp(full.y0, full.y1);
    Region {
        x0: clamp_x(min.x.trunc() - margin),
        y0: clamp_y(min.y.trunc() - margin),
        x1: clamp_x(max.x.trunc() + margin),
        y1: clamp_y(max.y.trunc() + margin),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_region_margin() {
        let size = ImageSize::new(4000, 3000);
        let points = [
            PixelPoint::new(2000.4, 1500.0),
            PixelPoint::new(2100.0, 1400.7),
            PixelPoint::new(1950.0, 1600.0),
        ];
        // 2500" at 2.5"/px is 1000 px
        let region = annotation_region(&points, 2.5, size, &RegionConfig::default());
        assert_eq!(
            region,
            Region {
                x0: 950,
                y0: 400,
                x1: 3100,
                y1: 2600
            }
        );
    }

    #[test]
    fn test_region_clamped() {
        let size = ImageSize::new(1024, 800);
        let points = [PixelPoint::new(10.0, 790.0), PixelPoint::new(1000.0, 20.0)];
        let region = annotation_region(&points, 2.0, size, &RegionConfig::default());
        assert_eq!(region, Region::full(size));
    }

    #[test]
    fn test_region_always_inside() {
        let size = ImageSize::new(1280, 960);
        let cases: [&[PixelPoint]; 4] = [
            &[PixelPoint::new(-5000.0, -5000.0)],
            &[PixelPoint::new(9000.0, 12000.0), PixelPoint::new(8000.0, 11000.0)],
            &[PixelPoint::new(f64::NAN, 1.0), PixelPoint::new(640.0, 480.0)],
            &[],
        ];
        for points in cases {
            for scale in [0.5, 1.85, 40.0, 3000.0] {
                let r = annotation_region(points, scale, size, &RegionConfig::default());
                assert!(1 <= r.x0 && r.x0 <= r.x1 && r.x1 <= 1280, "{r:?}");
                assert!(1 <= r.y0 && r.y0 <= r.y1 && r.y1 <= 960, "{r:?}");
            }
        }
    }

    #[test]
    fn test_reference_stars() {
        assert_eq!(reference_stars(Hemisphere::North).len(), 2);
        assert!(reference_stars(Hemisphere::North).iter().all(|s| s.dec > 89.0));
        let south = reference_stars(Hemisphere::South);
        assert!(south.iter().all(|s| s.dec < -87.0));
        assert_eq!(south.iter().filter(|s| s.frames_region).count(), 2);
    }

    #[test]
    fn test_target_rings() {
        assert_eq!(
            target_ring_radii(2.0),
            [(5, 150.0), (10, 300.0), (20, 600.0), (40, 1200.0)]
        );
    }
}
